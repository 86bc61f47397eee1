//! Request lifecycle engine - the guarded approval workflow shared by proposals.
//!
//! Every status change goes through [`transition`]: the action is checked against
//! the request's current status and the acting user, an audit message recording
//! `OLD -> NEW` is written, and the status is swapped in with a version check.
//! The message and the status update commit together or not at all, and nothing
//! is written when a check fails.

use crate::{
    core::identity::{Actor, is_approval_user},
    core::notify::{Notification, Notifier},
    entities::{
        Request, RequestMessage,
        request::{self, ProposalKind, RequestStatus},
        request_message::{self, MessageKind},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::fmt;
use tracing::{info, instrument, warn};

/// Longest chat message accepted in a request thread
pub const MAX_MESSAGE_LENGTH: usize = 200;

/// A user-initiated change to a request's status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestAction {
    /// DRAFT -> `PENDING_REVIEW`, proposer only
    SendForReview,
    /// `PENDING_REVIEW` -> APPROVED, approvers only
    Approve,
    /// `PENDING_REVIEW` -> REJECTED, approvers only
    Reject,
    /// DRAFT or `PENDING_REVIEW` -> CANCELED, proposer or approver
    Cancel,
    /// `PENDING_REVIEW` -> DRAFT, proposer only
    SendForDraft,
    /// APPROVED -> ACTIVE, approvers only
    Activate,
    /// APPROVED or ACTIVE -> ARCHIVED, approvers only
    Archive,
}

impl RequestAction {
    /// Every action, in workflow order.
    pub const ALL: [Self; 7] = [
        Self::SendForReview,
        Self::Approve,
        Self::Reject,
        Self::Cancel,
        Self::SendForDraft,
        Self::Activate,
        Self::Archive,
    ];

    /// Status the request ends up in after this action.
    #[must_use]
    pub const fn target(self) -> RequestStatus {
        match self {
            Self::SendForReview => RequestStatus::PendingReview,
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
            Self::Cancel => RequestStatus::Canceled,
            Self::SendForDraft => RequestStatus::Draft,
            Self::Activate => RequestStatus::Active,
            Self::Archive => RequestStatus::Archived,
        }
    }

    /// Whether the action may start from `status`.
    #[must_use]
    pub const fn allowed_from(self, status: RequestStatus) -> bool {
        match self {
            Self::SendForReview => matches!(status, RequestStatus::Draft),
            Self::Approve | Self::Reject | Self::SendForDraft => {
                matches!(status, RequestStatus::PendingReview)
            }
            Self::Cancel => matches!(status, RequestStatus::Draft | RequestStatus::PendingReview),
            Self::Activate => matches!(status, RequestStatus::Approved),
            Self::Archive => matches!(status, RequestStatus::Approved | RequestStatus::Active),
        }
    }

    /// Guard predicate: whether `actor` may perform this action on `request`.
    #[must_use]
    pub fn is_permitted(self, request: &request::Model, actor: &Actor) -> bool {
        let is_proposer = actor.is(&request.proposed_by);
        match self {
            Self::SendForReview | Self::SendForDraft => is_proposer,
            Self::Approve | Self::Reject | Self::Activate | Self::Archive => {
                is_approval_user(actor)
            }
            Self::Cancel => is_proposer || is_approval_user(actor),
        }
    }

    /// Whether this action records a review decision on the request.
    #[must_use]
    pub const fn is_review_decision(self) -> bool {
        matches!(self, Self::Approve | Self::Reject)
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::SendForReview => "send for review",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::SendForDraft => "send back to draft",
            Self::Activate => "activate",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Checks `action` against the request's status and the actor without touching the database.
///
/// Returns the target status on success.
pub fn check_transition(
    request: &request::Model,
    actor: &Actor,
    action: RequestAction,
) -> Result<RequestStatus> {
    if !action.allowed_from(request.status) {
        return Err(Error::InvalidStateTransition {
            from: request.status,
            action,
        });
    }
    if !action.is_permitted(request, actor) {
        return Err(Error::PermissionDenied);
    }
    Ok(action.target())
}

/// The proposer and approvers may see a request and its thread.
#[must_use]
pub fn can_view(request: &request::Model, actor: &Actor) -> bool {
    actor.is(&request.proposed_by) || is_approval_user(actor)
}

/// Whether the actor may read and post in the request thread.
///
/// Chat is open to the proposer and approvers while the request is still a
/// draft or under review.
#[must_use]
pub fn can_chat(request: &request::Model, actor: &Actor) -> bool {
    can_view(request, actor)
        && matches!(
            request.status,
            RequestStatus::Draft | RequestStatus::PendingReview
        )
}

/// Creates a new DRAFT request owned by `proposer`.
///
/// Takes any connection so it can run inside the caller's transaction.
pub async fn create_request<C>(
    db: &C,
    proposer: &Actor,
    kind: ProposalKind,
) -> Result<request::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let model = request::ActiveModel {
        proposed_by: Set(proposer.user_id.clone()),
        reviewed_by: Set(None),
        requested_for: Set(kind),
        status: Set(RequestStatus::Draft),
        version: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Finds a request by ID regardless of who is asking.
pub async fn get_request_by_id<C>(db: &C, request_id: i64) -> Result<Option<request::Model>>
where
    C: ConnectionTrait,
{
    Request::find_by_id(request_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a request the actor is allowed to see.
///
/// Missing and hidden requests both come back as [`Error::NotFound`].
pub async fn get_request_for_actor(
    db: &DatabaseConnection,
    actor: &Actor,
    request_id: i64,
) -> Result<request::Model> {
    get_request_by_id(db, request_id)
        .await?
        .filter(|r| can_view(r, actor))
        .ok_or(Error::NotFound { entity: "Request" })
}

/// Lists requests visible to the actor, newest first, optionally filtered by status.
///
/// Approvers see every request; everyone else sees only their own proposals.
pub async fn list_requests(
    db: &DatabaseConnection,
    actor: &Actor,
    status: Option<RequestStatus>,
) -> Result<Vec<request::Model>> {
    let mut query = Request::find();
    if !is_approval_user(actor) {
        query = query.filter(request::Column::ProposedBy.eq(actor.user_id.as_str()));
    }
    if let Some(status) = status {
        query = query.filter(request::Column::Status.eq(status));
    }
    query
        .order_by_desc(request::Column::CreatedAt)
        .order_by_desc(request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a guarded transition to a request.
///
/// Reads the current status inside a database transaction, checks the action,
/// writes the audit message and swaps the status in atomically. On any error
/// nothing is persisted.
///
/// # Errors
/// * [`Error::NotFound`] if the request does not exist
/// * [`Error::InvalidStateTransition`] if the current status does not allow the action
/// * [`Error::PermissionDenied`] if the actor fails the guard
/// * [`Error::ConcurrentModification`] if another transition committed first
pub async fn transition(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    request_id: i64,
    actor: &Actor,
    action: RequestAction,
) -> Result<request::Model> {
    transition_chain(db, notifier, request_id, actor, &[action]).await
}

/// Applies `actions` in order inside a single database transaction.
///
/// Each step is checked against the status left by the previous one. Either
/// every step commits or none does; notifications for each step go out only
/// after the commit. An empty chain returns the request unchanged.
#[instrument(skip(db, notifier, actor), fields(actor = %actor.user_id))]
pub async fn transition_chain(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    request_id: i64,
    actor: &Actor,
    actions: &[RequestAction],
) -> Result<request::Model> {
    let txn = db.begin().await?;

    let mut current = get_request_by_id(&txn, request_id)
        .await?
        .ok_or(Error::NotFound { entity: "Request" })?;

    let mut changes = Vec::with_capacity(actions.len());
    for &action in actions {
        let updated = match apply_transition(&txn, &current, actor, action).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(request_id, %action, status = %current.status, "transition refused: {e}");
                return Err(e);
            }
        };
        changes.push((current.status, updated.status));
        current = updated;
    }

    txn.commit().await?;

    for (from, to) in changes {
        info!(request_id, from = %from, to = %to, "request transitioned");
        notifier.notify(&Notification::StatusChanged {
            request_id,
            proposer_id: current.proposed_by.clone(),
            actor_id: actor.user_id.clone(),
            from,
            to,
        });
    }

    Ok(current)
}

/// Checks and applies `action` to the `snapshot` of a request on an open transaction.
///
/// The status update only succeeds if the stored version still matches the
/// snapshot, so a stale read can never overwrite a newer decision.
async fn apply_transition<C>(
    db: &C,
    snapshot: &request::Model,
    actor: &Actor,
    action: RequestAction,
) -> Result<request::Model>
where
    C: ConnectionTrait,
{
    let target = check_transition(snapshot, actor, action)?;
    let now = chrono::Utc::now();

    let audit = request_message::ActiveModel {
        request_id: Set(snapshot.id),
        sender_id: Set(actor.user_id.clone()),
        kind: Set(MessageKind::Audit),
        body: Set(format!("{} -> {}", snapshot.status, target)),
        from_status: Set(Some(snapshot.status)),
        to_status: Set(Some(target)),
        sent_at: Set(now),
        ..Default::default()
    };
    audit.insert(db).await?;

    let mut update = Request::update_many()
        .col_expr(request::Column::Status, Expr::value(target))
        .col_expr(
            request::Column::Version,
            Expr::col(request::Column::Version).add(1),
        )
        .col_expr(request::Column::UpdatedAt, Expr::value(now));
    if action.is_review_decision() {
        update = update.col_expr(
            request::Column::ReviewedBy,
            Expr::value(Some(actor.user_id.clone())),
        );
    }
    let result = update
        .filter(request::Column::Id.eq(snapshot.id))
        .filter(request::Column::Version.eq(snapshot.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ConcurrentModification);
    }

    get_request_by_id(db, snapshot.id)
        .await?
        .ok_or(Error::NotFound { entity: "Request" })
}

/// Returns the request thread, oldest first, if the actor may chat on it.
pub async fn list_messages(
    db: &DatabaseConnection,
    actor: &Actor,
    request_id: i64,
) -> Result<Vec<request_message::Model>> {
    let request = get_request_for_actor(db, actor, request_id).await?;
    if !can_chat(&request, actor) {
        return Err(Error::PermissionDenied);
    }

    RequestMessage::find()
        .filter(request_message::Column::RequestId.eq(request_id))
        .order_by_asc(request_message::Column::SentAt)
        .order_by_asc(request_message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Posts a chat message to the request thread.
pub async fn post_message(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    actor: &Actor,
    request_id: i64,
    body: &str,
) -> Result<request_message::Model> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::validation("message", "cannot be empty"));
    }
    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(Error::validation(
            "message",
            format!("must be at most {MAX_MESSAGE_LENGTH} characters"),
        ));
    }

    let request = get_request_for_actor(db, actor, request_id).await?;
    if !can_chat(&request, actor) {
        return Err(Error::PermissionDenied);
    }

    let message = request_message::ActiveModel {
        request_id: Set(request_id),
        sender_id: Set(actor.user_id.clone()),
        kind: Set(MessageKind::Chat),
        body: Set(body.to_string()),
        from_status: Set(None),
        to_status: Set(None),
        sent_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    notifier.notify(&Notification::MessagePosted {
        request_id,
        sender_id: actor.user_id.clone(),
    });

    Ok(message)
}
