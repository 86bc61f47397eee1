//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases, standard actors, and campaigns
//! in a given lifecycle state with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        campaign::{self, CampaignDetails, NewCampaign},
        donation::NewDonation,
        identity::Actor,
        notify::{Notification, Notifier},
        request::{RequestAction, create_request, transition},
        storage::FileStorage,
    },
    entities::{
        self,
        campaign::Visibility,
        donation::Currency,
        request::{ProposalKind, RequestStatus},
    },
    errors::Result,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The member who proposes campaigns in tests.
pub fn proposer() -> Actor {
    Actor::member("1001")
}

/// An approval-capable user.
pub fn approver() -> Actor {
    Actor::approver("9001")
}

/// A member unrelated to any test request.
pub fn stranger() -> Actor {
    Actor::member("2002")
}

/// Parses a decimal literal.
pub fn money(amount: &str) -> Decimal {
    Decimal::from_str(amount).unwrap()
}

/// A donation from a known donor in INR.
pub fn donation_of(amount: &str) -> NewDonation {
    NewDonation {
        donor_id: Some("3003".to_string()),
        amount: money(amount),
        currency: Currency::Inr,
        display_name: None,
        message: None,
    }
}

/// Records notifications instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Every notification received so far.
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }

    /// Whether nothing was sent.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// `(from, to)` of every status change, in order.
    pub fn status_changes(&self) -> Vec<(RequestStatus, RequestStatus)> {
        self.events()
            .into_iter()
            .filter_map(|n| match n {
                Notification::StatusChanged { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Amounts of every donation notification, in order.
    pub fn donations(&self) -> Vec<Decimal> {
        self.events()
            .into_iter()
            .filter_map(|n| match n {
                Notification::DonationReceived { amount, .. } => Some(amount),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.events.lock().unwrap().push(notification.clone());
    }
}

/// File storage kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Contents stored at `path`.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl FileStorage for MemoryStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<String> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(path.to_string())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

/// File storage that accepts writes but fails every delete.
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
}

impl FailingStorage {
    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.inner.paths()
    }
}

impl FileStorage for FailingStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<String> {
        self.inner.save(path, bytes).await
    }

    async fn delete(&self, _path: &str) -> Result<()> {
        Err(std::io::Error::other("disk unavailable").into())
    }
}

/// Creates a request and sends it for review.
pub async fn create_pending_request(
    db: &DatabaseConnection,
    proposer: &Actor,
) -> Result<entities::request::Model> {
    let request = create_request(db, proposer, ProposalKind::Campaign).await?;
    transition(
        db,
        &RecordingNotifier::default(),
        request.id,
        proposer,
        RequestAction::SendForReview,
    )
    .await
}

/// Campaign details that pass validation.
///
/// # Defaults
/// * public, started yesterday, ends in 30 days
/// * minimum donation 10.00, no maximum, no goal
pub fn campaign_details(title: &str) -> CampaignDetails {
    let now = Utc::now();
    CampaignDetails {
        title: title.to_string(),
        short_description: format!("{title} summary"),
        description: format!("All about {title}"),
        category: None,
        tags: String::new(),
        visibility: Visibility::Public,
        start_date: now - Duration::days(1),
        end_date: Some(now + Duration::days(30)),
        timezone_name: "UTC".to_string(),
        goal_amount: None,
        minimum_donation_amount: money("10.00"),
        maximum_donation_amount: None,
    }
}

/// Creates a DRAFT campaign owned by [`proposer`].
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    title: &str,
) -> Result<entities::campaign::Model> {
    create_custom_campaign(db, campaign_details(title)).await
}

/// Creates a DRAFT campaign with custom details.
pub async fn create_custom_campaign(
    db: &DatabaseConnection,
    details: CampaignDetails,
) -> Result<entities::campaign::Model> {
    campaign::create_campaign(
        db,
        &MemoryStorage::default(),
        &RecordingNotifier::default(),
        &proposer(),
        NewCampaign {
            details,
            slug: None,
            cover_image: None,
            gallery: Vec::new(),
        },
    )
    .await
}

/// Drives a draft campaign through review and approval.
pub async fn publish_campaign(
    db: &DatabaseConnection,
    campaign: &entities::campaign::Model,
) -> Result<entities::request::Model> {
    let notifier = RecordingNotifier::default();
    let now = Utc::now();
    campaign::transition_campaign(
        db,
        &notifier,
        now,
        &proposer(),
        &campaign.slug,
        RequestAction::SendForReview,
    )
    .await?;
    campaign::transition_campaign(
        db,
        &notifier,
        now,
        &approver(),
        &campaign.slug,
        RequestAction::Approve,
    )
    .await
}

/// Creates a public campaign that is ACTIVE and inside its window.
pub async fn create_active_campaign(
    db: &DatabaseConnection,
    title: &str,
) -> Result<entities::campaign::Model> {
    let campaign = create_test_campaign(db, title).await?;
    let request = publish_campaign(db, &campaign).await?;
    assert_eq!(request.status, RequestStatus::Active);
    Ok(campaign)
}
