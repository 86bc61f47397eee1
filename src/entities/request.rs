//! Request entity - the generic proposal workflow record.
//!
//! A request tracks one proposal (today always a campaign) from drafting through
//! review to publication. Its `status` is only changed by the guarded transitions
//! in [`crate::core::request`], and `version` is bumped on every change so that
//! concurrent reviewers cannot both win.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequestStatus {
    /// Being written by the proposer
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    /// Waiting for an approver
    #[sea_orm(string_value = "PENDING_REVIEW")]
    PendingReview,
    /// Accepted by an approver but not yet published
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Turned down by an approver
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    /// Published and accepting donations
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Withdrawn before a decision
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
    /// Closed after publication
    #[sea_orm(string_value = "ARCHIVED")]
    Archived,
}

impl RequestStatus {
    /// Stored representation, also used in audit messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingReview => "PENDING_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Active => "ACTIVE",
            Self::Canceled => "CANCELED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// No further transition leaves these states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Canceled | Self::Archived)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of proposal a request governs
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProposalKind {
    /// A fundraising campaign
    #[sea_orm(string_value = "CAMPAIGN")]
    Campaign,
}

/// Request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID of the proposer
    pub proposed_by: String,
    /// Discord user ID of the approver who last decided on the request
    pub reviewed_by: Option<String>,
    /// What kind of proposal this request is for
    pub requested_for: ProposalKind,
    /// Current lifecycle status
    pub status: RequestStatus,
    /// Incremented on every status change
    pub version: i32,
    /// When the request was created
    pub created_at: DateTimeUtc,
    /// When the request last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Request and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One request has many messages
    #[sea_orm(has_many = "super::request_message::Entity")]
    Messages,
    /// One request governs one campaign
    #[sea_orm(has_one = "super::campaign::Entity")]
    Campaign,
}

impl Related<super::request_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
