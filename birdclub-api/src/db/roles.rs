//! SQLite-backed officer and member stores

use async_trait::async_trait;
use birdclub_common::db::{email_key, Member, MemberRow, Officer, OfficerRow};
use birdclub_common::{Error, Result};
use sqlx::SqlitePool;

use crate::services::{IdentityKey, RoleStore};

// Email match is preferred over an external-id match when both hit
// different rows.
const FIND_OFFICER: &str = r#"
    SELECT id, name, email, position, role, is_admin, external_id
    FROM officers
    WHERE email_key = ?1 OR (?2 IS NOT NULL AND external_id = ?2)
    ORDER BY CASE WHEN email_key = ?1 THEN 0 ELSE 1 END, created_at
    LIMIT 1
"#;

const FIND_MEMBER: &str = r#"
    SELECT id, name, email, external_id, member_since, status, auto_enrolled
    FROM members
    WHERE email_key = ?1 OR (?2 IS NOT NULL AND external_id = ?2)
    ORDER BY CASE WHEN email_key = ?1 THEN 0 ELSE 1 END, created_at
    LIMIT 1
"#;

/// Role store over the `officers` and `members` tables
#[derive(Clone)]
pub struct SqliteRoleStore {
    pool: SqlitePool,
}

impl SqliteRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Add an officer record
    pub async fn insert_officer(&self, officer: &Officer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO officers (id, name, email, email_key, position, role, is_admin, external_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&officer.id)
        .bind(&officer.name)
        .bind(&officer.email)
        .bind(email_key(&officer.email))
        .bind(&officer.position)
        .bind(&officer.role)
        .bind(officer.is_admin)
        .bind(&officer.external_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Add a member record; fails if the email is already enrolled
    pub async fn insert_member(&self, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (id, name, email, email_key, external_id, member_since, status, auto_enrolled)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(email_key(&member.email))
        .bind(&member.external_id)
        .bind(member.member_since)
        .bind(member.status.as_str())
        .bind(member.auto_enrolled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_members(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn member_by_email_key(&self, key: &str) -> Result<Option<Member>> {
        sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, name, email, external_id, member_since, status, auto_enrolled
            FROM members
            WHERE email_key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .map(Member::try_from)
        .transpose()
    }
}

#[async_trait]
impl RoleStore for SqliteRoleStore {
    async fn find_officer(&self, identity: &IdentityKey) -> Result<Option<Officer>> {
        sqlx::query_as::<_, OfficerRow>(FIND_OFFICER)
            .bind(identity.email_key())
            .bind(identity.external_id.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .map(Officer::try_from)
            .transpose()
    }

    async fn find_member(&self, identity: &IdentityKey) -> Result<Option<Member>> {
        sqlx::query_as::<_, MemberRow>(FIND_MEMBER)
            .bind(identity.email_key())
            .bind(identity.external_id.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    async fn backfill_officer_external_id(&self, officer_id: &str, external_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE officers
            SET external_id = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND (external_id IS NULL OR external_id = '')
            "#,
        )
        .bind(external_id)
        .bind(officer_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn backfill_member_external_id(&self, member_id: &str, external_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET external_id = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND (external_id IS NULL OR external_id = '')
            "#,
        )
        .bind(external_id)
        .bind(member_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn enroll_member(&self, member: &Member) -> Result<Member> {
        let key = email_key(&member.email);

        // Unique email_key turns a concurrent duplicate into a no-op
        sqlx::query(
            r#"
            INSERT INTO members (id, name, email, email_key, external_id, member_since, status, auto_enrolled)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email_key) DO NOTHING
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&key)
        .bind(&member.external_id)
        .bind(member.member_since)
        .bind(member.status.as_str())
        .bind(member.auto_enrolled)
        .execute(&self.pool)
        .await?;

        self.member_by_email_key(&key)
            .await?
            .ok_or_else(|| Error::Internal(format!("member {} missing after enrollment", key)))
    }
}
