//! Database access layer for birdclub-api

mod roles;

pub use roles::SqliteRoleStore;
