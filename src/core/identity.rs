//! Acting user identity and capability checks.
//!
//! Authentication happens in Discord; by the time a command reaches the core
//! layer the caller has been reduced to an [`Actor`]: a user id plus the
//! capability resolved from configuration.

use crate::config::users::ApproverList;

/// What an actor is allowed to do beyond owning their own proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Regular community member
    Member,
    /// May review, activate and archive any request
    Approver,
}

/// The authenticated user invoking an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Discord user ID
    pub user_id: String,
    /// Resolved capability
    pub capability: Capability,
}

impl Actor {
    /// A regular member.
    pub fn member(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            capability: Capability::Member,
        }
    }

    /// An approval-capable user.
    pub fn approver(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            capability: Capability::Approver,
        }
    }

    /// Resolves the capability of `user_id` against the configured approvers.
    #[must_use]
    pub fn resolve(user_id: String, approvers: &ApproverList) -> Self {
        let capability = if approvers.contains(&user_id) {
            Capability::Approver
        } else {
            Capability::Member
        };
        Self {
            user_id,
            capability,
        }
    }

    /// Whether this actor is the given user.
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Whether the actor may take review decisions.
#[must_use]
pub const fn is_approval_user(actor: &Actor) -> bool {
    matches!(actor.capability, Capability::Approver)
}
