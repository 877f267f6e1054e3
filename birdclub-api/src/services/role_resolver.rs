//! Membership role resolution
//!
//! Lookup order:
//! 1. Officer store (email or external id) → `officer`, upgraded to `admin`
//! 2. Member store (same match rule) → `member`
//! 3. Nobody matched → auto-enroll a pending member → `member`
//!
//! Each call mutates at most one record: either an external-id backfill on
//! the matched record or the insert of a new member, never both.

use std::sync::Arc;

use async_trait::async_trait;
use birdclub_common::db::{email_key, Member, MemberStatus, Officer};
use birdclub_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Who is asking: email plus the identity provider's subject id, if any
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityKey {
    pub email: String,
    pub external_id: Option<String>,
}

impl IdentityKey {
    /// Validate and normalize; a blank email is rejected before any lookup
    pub fn new(email: &str, external_id: Option<&str>) -> Result<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidInput("email is required".to_string()));
        }
        Ok(Self {
            email: email.to_string(),
            external_id: external_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        })
    }

    /// Case-folded email used for matching
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }

    /// Local part of the email, used as the display name on enrollment
    pub fn display_name(&self) -> String {
        self.email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or(self.email.as_str())
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Officer,
    Member,
}

/// Matched record, serialized as the bare record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoleProfile {
    Officer(Officer),
    Member(Member),
}

/// Result of a role lookup: `{ "role": ..., "user": {...} }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRole {
    pub role: Role,
    pub user: RoleProfile,
}

/// Persistence behind role resolution
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_officer(&self, identity: &IdentityKey) -> Result<Option<Officer>>;

    async fn find_member(&self, identity: &IdentityKey) -> Result<Option<Member>>;

    /// Set the external id only if the record has none; true if a row changed
    async fn backfill_officer_external_id(&self, officer_id: &str, external_id: &str) -> Result<bool>;

    /// Set the external id only if the record has none; true if a row changed
    async fn backfill_member_external_id(&self, member_id: &str, external_id: &str) -> Result<bool>;

    /// Insert unless a member with the same email already exists; returns
    /// the stored record either way
    async fn enroll_member(&self, member: &Member) -> Result<Member>;
}

/// Admin if flagged, if the role field says so, or if the position is a
/// president or chair
pub fn officer_is_admin(officer: &Officer) -> bool {
    if officer.is_admin {
        return true;
    }
    if officer
        .role
        .as_deref()
        .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"))
    {
        return true;
    }
    let position = officer.position.to_lowercase();
    position.contains("president") || position.contains("chair")
}

pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_role(&self, identity: &IdentityKey) -> Result<ResolvedRole> {
        if let Some(mut officer) = self.store.find_officer(identity).await? {
            let role = if officer_is_admin(&officer) {
                Role::Admin
            } else {
                Role::Officer
            };

            if let Some(external_id) = backfill_needed(officer.external_id.as_deref(), identity) {
                let outcome = self
                    .store
                    .backfill_officer_external_id(&officer.id, external_id)
                    .await;
                if record_backfill("officer", &officer.id, outcome) {
                    officer.external_id = Some(external_id.to_string());
                }
            }

            debug!(officer_id = %officer.id, ?role, "Resolved officer role");
            return Ok(ResolvedRole {
                role,
                user: RoleProfile::Officer(officer),
            });
        }

        if let Some(mut member) = self.store.find_member(identity).await? {
            if let Some(external_id) = backfill_needed(member.external_id.as_deref(), identity) {
                let outcome = self
                    .store
                    .backfill_member_external_id(&member.id, external_id)
                    .await;
                if record_backfill("member", &member.id, outcome) {
                    member.external_id = Some(external_id.to_string());
                }
            }

            debug!(member_id = %member.id, status = %member.status, "Resolved member role");
            return Ok(ResolvedRole {
                role: Role::Member,
                user: RoleProfile::Member(member),
            });
        }

        let candidate = Member {
            id: Uuid::new_v4().to_string(),
            name: identity.display_name(),
            email: identity.email.clone(),
            external_id: identity.external_id.clone(),
            member_since: birdclub_common::time::now(),
            status: MemberStatus::Pending,
            auto_enrolled: true,
        };
        let member = self.store.enroll_member(&candidate).await?;

        if member.id == candidate.id {
            info!(member_id = %member.id, email = %member.email, "Auto-enrolled new pending member");
        } else {
            // Lost the race to a concurrent enrollment of the same email
            debug!(member_id = %member.id, "Enrollment converged on existing member");
        }

        Ok(ResolvedRole {
            role: Role::Member,
            user: RoleProfile::Member(member),
        })
    }
}

/// External id to write back, if the caller supplied one and the record lacks it
fn backfill_needed<'a>(stored: Option<&str>, identity: &'a IdentityKey) -> Option<&'a str> {
    match (stored, identity.external_id.as_deref()) {
        (None, Some(supplied)) => Some(supplied),
        _ => None,
    }
}

/// Log the write-back outcome; returns true if the row was updated
///
/// Write-back is best effort, so a failure never fails the lookup.
fn record_backfill(kind: &str, id: &str, outcome: Result<bool>) -> bool {
    match outcome {
        Ok(true) => {
            info!(kind, id, "Backfilled external id");
            true
        }
        Ok(false) => false,
        Err(e) => {
            warn!(kind, id, "External id backfill failed: {}", e);
            false
        }
    }
}
