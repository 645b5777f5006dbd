use uuid::Uuid;

use super::Actor;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Decides whether an actor may touch a resource owned by a branch.
///
/// Actors attached to a regular branch only see their own branch. Actors
/// attached to a head-office branch, and actors with no branch at all, are
/// unrestricted.
#[derive(Debug, Clone)]
pub struct BranchAccessPolicy {
    head_office_prefix: String,
}

impl BranchAccessPolicy {
    pub fn new(head_office_prefix: impl Into<String>) -> Self {
        Self {
            head_office_prefix: head_office_prefix.into(),
        }
    }

    /// `true` when the actor is limited to its own branch.
    pub fn is_restricted(&self, actor: &Actor) -> bool {
        match actor.branch_name.as_deref() {
            Some(name) => !name.starts_with(&self.head_office_prefix),
            None => false,
        }
    }

    /// Branch every query must be filtered to, if any.
    pub fn scope(&self, actor: &Actor) -> Option<Uuid> {
        if self.is_restricted(actor) {
            actor.branch_id
        } else {
            None
        }
    }

    pub fn decide(&self, actor: &Actor, resource_branch_id: Uuid) -> AccessDecision {
        if !self.is_restricted(actor) || actor.branch_id == Some(resource_branch_id) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny
        }
    }

    /// Maps a deny into `Forbidden` without exposing anything about the resource.
    pub fn enforce(&self, actor: &Actor, resource_branch_id: Uuid) -> Result<(), ServiceError> {
        match self.decide(actor, resource_branch_id) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny => {
                crate::metrics::BRANCH_ACCESS_DENIALS.inc();
                tracing::warn!(
                    user_id = %actor.user_id,
                    "cross-branch access denied"
                );
                Err(ServiceError::Forbidden(
                    "resource belongs to another branch".to_string(),
                ))
            }
        }
    }
}

impl Default for BranchAccessPolicy {
    fn default() -> Self {
        Self::new("HQ")
    }
}
