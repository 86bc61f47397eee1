//! Fire-and-forget notifications emitted at lifecycle points.
//!
//! The core layer never waits on delivery and never fails an operation because
//! a notification could not be sent. [`LogNotifier`] records events through
//! `tracing`; the bot can swap in anything implementing [`Notifier`].

use crate::entities::request::RequestStatus;
use rust_decimal::Decimal;
use tracing::info;

/// An event worth telling someone about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A campaign draft was created
    CampaignCreated {
        /// Proposer to notify
        proposer_id: String,
        /// Campaign slug
        slug: String,
    },
    /// A request moved between statuses
    StatusChanged {
        /// Request that changed
        request_id: i64,
        /// Proposer to notify
        proposer_id: String,
        /// User who made the change
        actor_id: String,
        /// Previous status
        from: RequestStatus,
        /// New status
        to: RequestStatus,
    },
    /// Someone posted in a request thread
    MessagePosted {
        /// Request the thread belongs to
        request_id: i64,
        /// Author of the message
        sender_id: String,
    },
    /// A donation was recorded
    DonationReceived {
        /// Campaign slug
        slug: String,
        /// Proposer to notify
        proposer_id: String,
        /// Donated amount
        amount: Decimal,
    },
}

/// Delivery hook for [`Notification`]s
pub trait Notifier: Send + Sync {
    /// Hands the event off for delivery. Must not block or fail.
    fn notify(&self, notification: &Notification);
}

/// Writes every notification as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match notification {
            Notification::CampaignCreated { proposer_id, slug } => {
                info!(proposer_id, slug, "notify: campaign created");
            }
            Notification::StatusChanged {
                request_id,
                proposer_id,
                actor_id,
                from,
                to,
            } => {
                info!(
                    request_id,
                    proposer_id,
                    actor_id,
                    from = %from,
                    to = %to,
                    "notify: request status changed"
                );
            }
            Notification::MessagePosted {
                request_id,
                sender_id,
            } => {
                info!(request_id, sender_id, "notify: message posted");
            }
            Notification::DonationReceived {
                slug,
                proposer_id,
                amount,
            } => {
                info!(slug, proposer_id, amount = %amount, "notify: donation received");
            }
        }
    }
}
