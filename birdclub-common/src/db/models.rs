//! Role record models
//!
//! Rows are read into `*Row` structs and converted into the public record
//! types, so malformed stored data is rejected at the store boundary rather
//! than leaking into role decisions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Normalized email used for matching: trimmed and lower-cased
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Club officer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Officer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Active,
    Lapsed,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::Active => "active",
            MemberStatus::Lapsed => "lapsed",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MemberStatus::Pending),
            "active" => Ok(MemberStatus::Active),
            "lapsed" => Ok(MemberStatus::Lapsed),
            other => Err(Error::InvalidInput(format!("unknown member status: {:?}", other))),
        }
    }
}

/// Club member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub member_since: DateTime<Utc>,
    pub status: MemberStatus,
    pub auto_enrolled: bool,
}

/// Raw `officers` row
#[derive(Debug, sqlx::FromRow)]
pub struct OfficerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: String,
    pub role: Option<String>,
    pub is_admin: bool,
    pub external_id: Option<String>,
}

impl TryFrom<OfficerRow> for Officer {
    type Error = Error;

    fn try_from(row: OfficerRow) -> Result<Self> {
        if row.email.trim().is_empty() {
            return Err(Error::InvalidInput(format!("officer {} has no email", row.id)));
        }
        Ok(Officer {
            id: row.id,
            name: row.name,
            email: row.email,
            position: row.position,
            role: row.role.filter(|r| !r.trim().is_empty()),
            is_admin: row.is_admin,
            external_id: row.external_id.filter(|x| !x.is_empty()),
        })
    }
}

/// Raw `members` row
#[derive(Debug, sqlx::FromRow)]
pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub external_id: Option<String>,
    pub member_since: DateTime<Utc>,
    pub status: String,
    pub auto_enrolled: bool,
}

impl TryFrom<MemberRow> for Member {
    type Error = Error;

    fn try_from(row: MemberRow) -> Result<Self> {
        if row.email.trim().is_empty() {
            return Err(Error::InvalidInput(format!("member {} has no email", row.id)));
        }
        Ok(Member {
            status: row.status.parse()?,
            id: row.id,
            name: row.name,
            email: row.email,
            external_id: row.external_id.filter(|x| !x.is_empty()),
            member_since: row.member_since,
            auto_enrolled: row.auto_enrolled,
        })
    }
}
