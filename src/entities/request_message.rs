//! Request message entity - append-only thread attached to a request.
//!
//! Every status change writes an `AUDIT` message recording the old and new status.
//! Proposers and approvers may also post `CHAT` messages while the request is open.

use super::request::RequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Origin of a thread entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum MessageKind {
    /// Written by the workflow engine on a transition
    #[sea_orm(string_value = "AUDIT")]
    Audit,
    /// Free text from a participant
    #[sea_orm(string_value = "CHAT")]
    Chat,
}

/// Request message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request_messages")]
pub struct Model {
    /// Unique identifier for the message
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Request this message belongs to
    pub request_id: i64,
    /// Discord user ID of the author (the acting user for audit entries)
    pub sender_id: String,
    /// Audit or chat
    pub kind: MessageKind,
    /// Message text
    pub body: String,
    /// Status before the transition, audit entries only
    pub from_status: Option<RequestStatus>,
    /// Status after the transition, audit entries only
    pub to_status: Option<RequestStatus>,
    /// When the message was written
    pub sent_at: DateTimeUtc,
}

/// Defines relationships between `RequestMessage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each message belongs to one request
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::RequestId",
        to = "super::request::Column::Id"
    )]
    Request,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
