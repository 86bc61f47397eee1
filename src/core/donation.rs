//! Donation business logic - the acceptance rule, recording donations and campaign totals.
//!
//! A donation is accepted only while its campaign is listable (active request,
//! public, inside its date window) and the amount is within the campaign's
//! bounds. Totals are summed from donation rows on read.

use crate::{
    core::campaign::is_currently_listable,
    core::notify::{Notification, Notifier},
    entities::{
        Campaign, Donation, Request, campaign,
        donation::{self, Currency},
        request::RequestStatus,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Longest display name or message attached to a donation
pub const MAX_DONATION_TEXT: usize = 100;

/// Input for recording a donation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    /// Donor's user ID, `None` to donate anonymously
    pub donor_id: Option<String>,
    /// Amount to donate
    pub amount: Decimal,
    /// Currency of the amount
    pub currency: Currency,
    /// Public name shown with the donation
    pub display_name: Option<String>,
    /// Optional note to the campaign
    pub message: Option<String>,
}

/// Aggregates computed from a campaign's donations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CampaignStats {
    /// Sum of all donation amounts
    pub amount_raised: Decimal,
    /// Number of distinct identified donors
    pub donor_count: usize,
    /// Number of donations, anonymous ones included
    pub donation_count: usize,
}

/// Checks whether `amount` may be donated to `campaign` at `now`.
///
/// `status` is the owning request's current status. A campaign that is not
/// currently listable is reported as not found, the same as a missing one.
pub fn check_donation(
    campaign: &campaign::Model,
    status: RequestStatus,
    amount: Decimal,
    now: DateTimeUtc,
) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("amount", "must be greater than 0"));
    }
    if amount.normalize().scale() > 2 {
        return Err(Error::validation("amount", "must have at most 2 decimal places"));
    }

    if !is_currently_listable(campaign, status, now) {
        return Err(Error::NotFound { entity: "Campaign" });
    }

    let minimum = campaign.minimum_donation_amount;
    if amount < minimum {
        return Err(Error::validation("amount", format!("must be at least {minimum}")));
    }
    if let Some(maximum) = campaign
        .maximum_donation_amount
        .filter(|maximum| amount > *maximum)
    {
        return Err(Error::validation("amount", format!("must be at most {maximum}")));
    }

    Ok(())
}

fn clean_optional_text(field: &'static str, value: Option<String>) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_DONATION_TEXT {
        return Err(Error::validation(
            field,
            format!("must be at most {MAX_DONATION_TEXT} characters"),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Records a donation to the campaign identified by `slug`.
///
/// Donations are plain inserts; concurrent donations to one campaign do not
/// contend on any shared row.
pub async fn submit_donation(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    now: DateTimeUtc,
    slug: &str,
    input: NewDonation,
) -> Result<donation::Model> {
    let display_name = clean_optional_text("display_name", input.display_name)?;
    let message = clean_optional_text("message", input.message)?;

    let (campaign, request) = Campaign::find()
        .filter(campaign::Column::Slug.eq(slug))
        .find_also_related(Request)
        .one(db)
        .await?
        .and_then(|(c, r)| r.map(|r| (c, r)))
        .ok_or(Error::NotFound { entity: "Campaign" })?;

    if let Err(e) = check_donation(&campaign, request.status, input.amount, now) {
        debug!(slug, amount = %input.amount, "donation refused: {e}");
        return Err(e);
    }

    let donation = donation::ActiveModel {
        campaign_id: Set(campaign.id),
        donor_id: Set(input.donor_id),
        amount: Set(input.amount),
        currency: Set(input.currency),
        display_name: Set(display_name),
        message: Set(message),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(slug, donation_id = donation.id, amount = %donation.amount, "donation recorded");
    notifier.notify(&Notification::DonationReceived {
        slug: campaign.slug,
        proposer_id: request.proposed_by,
        amount: donation.amount,
    });

    Ok(donation)
}

/// Lists a campaign's donations, newest first.
pub async fn list_donations(
    db: &DatabaseConnection,
    campaign_id: i64,
) -> Result<Vec<donation::Model>> {
    Donation::find()
        .filter(donation::Column::CampaignId.eq(campaign_id))
        .order_by_desc(donation::Column::CreatedAt)
        .order_by_desc(donation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Computes totals for one campaign.
pub async fn campaign_stats<C>(db: &C, campaign_id: i64) -> Result<CampaignStats>
where
    C: ConnectionTrait,
{
    Ok(stats_for_campaigns(db, &[campaign_id])
        .await?
        .remove(&campaign_id)
        .unwrap_or_default())
}

/// Computes totals for several campaigns with a single query.
///
/// Campaigns without donations are absent from the map.
pub async fn stats_for_campaigns<C>(
    db: &C,
    campaign_ids: &[i64],
) -> Result<HashMap<i64, CampaignStats>>
where
    C: ConnectionTrait,
{
    if campaign_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let donations = Donation::find()
        .filter(donation::Column::CampaignId.is_in(campaign_ids.iter().copied()))
        .all(db)
        .await?;

    let mut stats: HashMap<i64, CampaignStats> = HashMap::new();
    let mut donors: HashMap<i64, HashSet<String>> = HashMap::new();
    for donation in donations {
        let entry = stats.entry(donation.campaign_id).or_default();
        entry.amount_raised += donation.amount;
        entry.donation_count += 1;
        if let Some(donor) = donation.donor_id {
            donors.entry(donation.campaign_id).or_default().insert(donor);
        }
    }
    for (campaign_id, set) in donors {
        if let Some(entry) = stats.get_mut(&campaign_id) {
            entry.donor_count = set.len();
        }
    }

    Ok(stats)
}
