//! Audit log: the write model carried inside every mutating transaction,
//! and the read model exposed to org members.

use std::sync::Arc;

use async_trait::async_trait;

use rotaplan_core::{AppResult, OrgId};

use crate::access::require_member;
use crate::org_service::OrgRepository;

/// An audit entry written in the same transaction as the mutation it
/// records. Timestamps are assigned by the store at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Organization the entry belongs to.
    pub org_id: OrgId,
    /// Subject of the acting user.
    pub actor_user_id: String,
    /// Dotted action name, e.g. `org.create`.
    pub action: String,
    /// Reference to the touched entity, e.g. `schedules/<id>`.
    pub entity_ref: String,
    /// Structured context for the action.
    pub metadata: serde_json::Value,
}

/// Audit entry as returned by list queries.
#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub entry_id: String,
    /// Subject of the acting user.
    pub actor_user_id: String,
    /// Dotted action name.
    pub action: String,
    /// Reference to the touched entity.
    pub entity_ref: String,
    /// Structured context for the action.
    pub metadata: serde_json::Value,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Filter and paging options for audit listing.
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    /// Only entries with this action.
    pub action: Option<String>,
    /// Only entries by this actor subject.
    pub actor_user_id: Option<String>,
    /// Page size; clamped by the repository.
    pub limit: usize,
    /// Offset into the result set.
    pub offset: usize,
}

/// Repository port for the audit log read model.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists recent audit entries for an organization, newest first.
    async fn list_recent_entries(
        &self,
        org_id: OrgId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>>;
}

/// Application service exposing the audit log to org members.
#[derive(Clone)]
pub struct AuditLogService {
    audit_log_repository: Arc<dyn AuditLogRepository>,
    org_repository: Arc<dyn OrgRepository>,
}

impl AuditLogService {
    /// Creates a new audit log service.
    #[must_use]
    pub fn new(
        audit_log_repository: Arc<dyn AuditLogRepository>,
        org_repository: Arc<dyn OrgRepository>,
    ) -> Self {
        Self {
            audit_log_repository,
            org_repository,
        }
    }

    /// Lists recent audit entries for an organization the actor belongs to.
    pub async fn list_entries(
        &self,
        actor: &rotaplan_core::ActorIdentity,
        org_id: OrgId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        require_member(self.org_repository.as_ref(), actor, org_id).await?;
        self.audit_log_repository
            .list_recent_entries(org_id, query)
            .await
    }
}
