//! Campaign business logic - drafting, editing, reviewing, listing and deleting campaigns.
//!
//! Each campaign is paired with a workflow request created alongside it. The
//! campaign's status is always read from that request; this module adds the
//! campaign-specific rules on top: field validation, slug generation, image
//! handling, the public listing window, and auto-publishing on approval.

use crate::{
    core::{
        category,
        donation::{self, CampaignStats},
        identity::{Actor, is_approval_user},
        notify::{Notification, Notifier},
        request::{self as workflow, RequestAction, can_view},
        storage::{FileStorage, Upload, cover_image_path, gallery_image_path},
    },
    entities::{
        Campaign, CampaignCategory, CampaignImage, Donation, DonationColumn, Request, campaign,
        campaign::Visibility,
        campaign_category, campaign_image,
        request::{self, ProposalKind, RequestStatus},
    },
    errors::{Error, Result},
};
use chrono::TimeZone;
use rust_decimal::Decimal;
use sea_orm::{
    Condition, JoinType, Order, PaginatorTrait, QueryOrder, QuerySelect, RelationTrait, Set,
    SqlErr, TransactionTrait, prelude::*,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Timezones a campaign's dates may be entered in
pub const ALLOWED_TIMEZONES: [&str; 5] = [
    "Asia/Kolkata",
    "UTC",
    "Asia/Dubai",
    "Europe/London",
    "America/New_York",
];

/// Timezone used when none is configured
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Longest allowed slug
pub const MAX_SLUG_LENGTH: usize = 220;

/// Campaigns shown per page in the public listing
pub const PUBLIC_PAGE_SIZE: u64 = 12;

/// Largest accepted image upload in bytes
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_SHORT_DESCRIPTION_LENGTH: usize = 500;
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Minimum donation applied when a proposer does not set one.
#[must_use]
pub fn default_minimum_donation() -> Decimal {
    Decimal::new(1000, 2)
}

/// Editable campaign fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDetails {
    /// Campaign title
    pub title: String,
    /// One-line summary
    pub short_description: String,
    /// Full description
    pub description: String,
    /// Category name, must already exist
    pub category: Option<String>,
    /// Comma-separated tags
    pub tags: String,
    /// Whether donors will see the campaign once active
    pub visibility: Visibility,
    /// Start of the donation window
    pub start_date: DateTimeUtc,
    /// Optional end of the donation window
    pub end_date: Option<DateTimeUtc>,
    /// Timezone the dates were entered in
    pub timezone_name: String,
    /// Fundraising goal
    pub goal_amount: Option<Decimal>,
    /// Smallest accepted donation
    pub minimum_donation_amount: Decimal,
    /// Largest accepted donation
    pub maximum_donation_amount: Option<Decimal>,
}

/// Input for drafting a new campaign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
    /// Campaign fields
    pub details: CampaignDetails,
    /// Explicit slug; generated from the title when absent or blank
    pub slug: Option<String>,
    /// Optional cover image
    pub cover_image: Option<Upload>,
    /// Gallery images in display order
    pub gallery: Vec<Upload>,
}

/// Partial update to a draft campaign. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct CampaignChanges {
    /// New title
    pub title: Option<String>,
    /// New summary
    pub short_description: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category, `Some(None)` clears it
    pub category: Option<Option<String>>,
    /// New tag list
    pub tags: Option<String>,
    /// New visibility
    pub visibility: Option<Visibility>,
    /// New start date
    pub start_date: Option<DateTimeUtc>,
    /// New end date, `Some(None)` removes it
    pub end_date: Option<Option<DateTimeUtc>>,
    /// New timezone
    pub timezone_name: Option<String>,
    /// New goal, `Some(None)` removes it
    pub goal_amount: Option<Option<Decimal>>,
    /// New minimum donation
    pub minimum_donation_amount: Option<Decimal>,
    /// New maximum donation, `Some(None)` removes it
    pub maximum_donation_amount: Option<Option<Decimal>>,
}

impl CampaignChanges {
    fn apply(self, mut details: CampaignDetails) -> CampaignDetails {
        if let Some(v) = self.title {
            details.title = v;
        }
        if let Some(v) = self.short_description {
            details.short_description = v;
        }
        if let Some(v) = self.description {
            details.description = v;
        }
        if let Some(v) = self.category {
            details.category = v;
        }
        if let Some(v) = self.tags {
            details.tags = v;
        }
        if let Some(v) = self.visibility {
            details.visibility = v;
        }
        if let Some(v) = self.start_date {
            details.start_date = v;
        }
        if let Some(v) = self.end_date {
            details.end_date = v;
        }
        if let Some(v) = self.timezone_name {
            details.timezone_name = v;
        }
        if let Some(v) = self.goal_amount {
            details.goal_amount = v;
        }
        if let Some(v) = self.minimum_donation_amount {
            details.minimum_donation_amount = v;
        }
        if let Some(v) = self.maximum_donation_amount {
            details.maximum_donation_amount = v;
        }
        details
    }
}

/// A campaign together with the status of its owning request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSummary {
    /// The campaign row
    pub campaign: campaign::Model,
    /// Status read from the owning request
    pub status: RequestStatus,
    /// Category name, if any
    pub category: Option<String>,
}

/// Everything shown on a campaign's detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDetail {
    /// The campaign row
    pub campaign: campaign::Model,
    /// The owning request
    pub request: request::Model,
    /// Category name, if any
    pub category: Option<String>,
    /// Gallery image paths in order
    pub gallery: Vec<String>,
    /// Donation totals
    pub stats: CampaignStats,
}

impl CampaignDetail {
    /// Lifecycle status, taken from the owning request.
    #[must_use]
    pub const fn status(&self) -> RequestStatus {
        self.request.status
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number actually returned
    pub page: u64,
    /// Requested page size after clamping
    pub page_size: u64,
    /// Number of matching items across all pages
    pub total_items: u64,
    /// Number of pages, at least 1
    pub total_pages: u64,
}

/// Sort keys for the proposer/approver campaign list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CampaignSort {
    /// Alphabetical by title
    #[default]
    Title,
    /// By category name
    Category,
    /// By request status
    Status,
    /// By start date
    StartDate,
    /// By end date
    EndDate,
    /// By goal amount
    GoalAmount,
}

impl CampaignSort {
    /// Parses a sort key, falling back to [`CampaignSort::Title`].
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "category" => Self::Category,
            "status" => Self::Status,
            "start_date" => Self::StartDate,
            "end_date" => Self::EndDate,
            "goal_amount" => Self::GoalAmount,
            _ => Self::Title,
        }
    }
}

/// Filters for the proposer/approver campaign list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignQuery {
    /// Free-text search
    pub q: Option<String>,
    /// Only campaigns whose request has this status
    pub status: Option<RequestStatus>,
    /// Sort key
    pub sort: CampaignSort,
    /// Sort descending instead of ascending
    pub descending: bool,
    /// 1-based page number
    pub page: u64,
    /// Items per page, clamped to 1..=100
    pub page_size: u64,
}

impl Default for CampaignQuery {
    fn default() -> Self {
        Self {
            q: None,
            status: None,
            sort: CampaignSort::Title,
            descending: false,
            page: 1,
            page_size: 10,
        }
    }
}

/// Sort keys for the public listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublicSort {
    /// Most recently started first
    #[default]
    New,
    /// Soonest ending first, open-ended last
    EndSoon,
    /// Largest goal first
    GoalHigh,
    /// Smallest goal first
    GoalLow,
    /// Most raised first
    RaisedHigh,
    /// Least raised first
    RaisedLow,
    /// Most donations first
    Popular,
    /// Title A to Z
    TitleAz,
    /// Title Z to A
    TitleZa,
}

impl PublicSort {
    /// Parses a sort key, falling back to [`PublicSort::New`].
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "end_soon" => Self::EndSoon,
            "goal_high" => Self::GoalHigh,
            "goal_low" => Self::GoalLow,
            "raised_high" => Self::RaisedHigh,
            "raised_low" => Self::RaisedLow,
            "popular" => Self::Popular,
            "title_az" => Self::TitleAz,
            "title_za" => Self::TitleZa,
            _ => Self::New,
        }
    }
}

/// Filters for the public listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicQuery {
    /// Whitespace-separated terms, all of which must match
    pub q: Option<String>,
    /// Only campaigns in this category
    pub category: Option<String>,
    /// Sort order
    pub sort: PublicSort,
    /// 1-based page number
    pub page: u64,
}

/// A listable campaign with its donation totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicCampaign {
    /// The campaign row
    pub campaign: campaign::Model,
    /// Category name, if any
    pub category: Option<String>,
    /// Donation totals
    pub stats: CampaignStats,
}

/// Whether a campaign is live for donors at `now`.
///
/// Requires an ACTIVE request, public visibility, and `now` inside the
/// campaign's date window. Status alone is not enough.
#[must_use]
pub fn is_currently_listable(
    campaign: &campaign::Model,
    status: RequestStatus,
    now: DateTimeUtc,
) -> bool {
    status == RequestStatus::Active
        && campaign.visibility == Visibility::Public
        && campaign.is_in_active_window(now)
}

/// Builds a URL-safe slug from a title.
///
/// Keeps ASCII letters, digits and underscores, lowercases them, and turns runs
/// of whitespace and hyphens into a single hyphen. Other characters are dropped.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
    }
    slug.chars().take(MAX_SLUG_LENGTH).collect::<String>().trim_end_matches('-').to_string()
}

/// Parses `YYYY-MM-DD` or `YYYY-MM-DD HH:MM` as a wall-clock time in `timezone`.
///
/// Ambiguous local times (clocks going back) resolve to the earlier instant.
pub fn parse_local_datetime(
    field: &'static str,
    input: &str,
    timezone: &str,
) -> Result<DateTimeUtc> {
    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| Error::validation("timezone_name", format!("unknown timezone '{timezone}'")))?;
    let input = input.trim();
    let naive = chrono::NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| Error::validation(field, format!("'{input}' is not YYYY-MM-DD [HH:MM]")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&chrono::Utc))
        .ok_or_else(|| Error::validation(field, format!("'{input}' does not exist in {timezone}")))
}

/// Trims, de-duplicates and re-joins a comma-separated tag list, keeping first occurrences.
#[must_use]
pub fn normalize_tags(input: &str) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen.join(",")
}

fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => {
            let slug = slug.to_lowercase();
            if slug.chars().count() > MAX_SLUG_LENGTH {
                return Err(Error::validation(
                    "slug",
                    format!("must be at most {MAX_SLUG_LENGTH} characters"),
                ));
            }
            if !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(Error::validation(
                    "slug",
                    "may only contain letters, numbers, hyphens and underscores",
                ));
            }
            Ok(slug)
        }
        None => {
            let slug = slugify(title);
            if slug.is_empty() {
                return Err(Error::validation(
                    "slug",
                    "cannot be empty. Please provide a title",
                ));
            }
            Ok(slug)
        }
    }
}

fn validate_amount(field: &'static str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::validation(field, "cannot be negative"));
    }
    if amount.normalize().scale() > 2 {
        return Err(Error::validation(field, "must have at most 2 decimal places"));
    }
    // Amounts are stored with 12 digits, 2 of them decimals.
    if amount >= Decimal::new(10_000_000_000, 0) {
        return Err(Error::validation(field, "is too large"));
    }
    Ok(())
}

/// Checks the campaign invariants on a set of details.
pub fn validate_details(details: &CampaignDetails) -> Result<()> {
    let title = details.title.trim();
    if title.is_empty() {
        return Err(Error::validation("title", "cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::validation(
            "title",
            format!("must be at most {MAX_TITLE_LENGTH} characters"),
        ));
    }
    if details.short_description.trim().chars().count() > MAX_SHORT_DESCRIPTION_LENGTH {
        return Err(Error::validation(
            "short_description",
            format!("must be at most {MAX_SHORT_DESCRIPTION_LENGTH} characters"),
        ));
    }
    if !ALLOWED_TIMEZONES.contains(&details.timezone_name.as_str()) {
        return Err(Error::validation(
            "timezone_name",
            format!("must be one of {}", ALLOWED_TIMEZONES.join(", ")),
        ));
    }
    if let Some(end) = details.end_date.filter(|end| *end < details.start_date) {
        return Err(Error::validation(
            "end_date",
            format!("{end} is before the start date"),
        ));
    }

    if let Some(goal) = details.goal_amount {
        validate_amount("goal_amount", goal)?;
    }
    validate_amount("minimum_donation_amount", details.minimum_donation_amount)?;
    if let Some(maximum) = details.maximum_donation_amount {
        validate_amount("maximum_donation_amount", maximum)?;
        if maximum < details.minimum_donation_amount {
            return Err(Error::validation(
                "maximum_donation_amount",
                "must be greater than or equal to the minimum donation",
            ));
        }
    }
    Ok(())
}

fn validate_upload(upload: &Upload) -> Result<()> {
    if upload.bytes.is_empty() {
        return Err(Error::validation("image", format!("'{}' is empty", upload.filename)));
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::validation(
            "image",
            format!("'{}' is larger than {MAX_IMAGE_BYTES} bytes", upload.filename),
        ));
    }
    let ext = std::path::Path::new(&upload.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::validation(
            "image",
            format!("'{}' is not a supported image type", upload.filename),
        ));
    }
    Ok(())
}

async fn resolve_category<C>(db: &C, name: Option<&str>) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    category::get_category_by_name(db, name)
        .await?
        .map(|c| Some(c.id))
        .ok_or_else(|| Error::validation("category", format!("unknown category '{name}'")))
}

async fn category_name<C>(db: &C, category_id: Option<i64>) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let Some(id) = category_id else {
        return Ok(None);
    };
    Ok(CampaignCategory::find_by_id(id).one(db).await?.map(|c| c.name))
}

fn map_unique_violation(err: DbErr) -> Error {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        Error::validation(
            "slug",
            "This slug is already in use. Please choose a different slug",
        )
    } else {
        err.into()
    }
}

/// Finds a campaign by slug regardless of who is asking.
pub async fn get_campaign_by_slug<C>(db: &C, slug: &str) -> Result<Option<campaign::Model>>
where
    C: ConnectionTrait,
{
    Campaign::find()
        .filter(campaign::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_with_request<C>(
    db: &C,
    slug: &str,
) -> Result<Option<(campaign::Model, request::Model)>>
where
    C: ConnectionTrait,
{
    Ok(Campaign::find()
        .filter(campaign::Column::Slug.eq(slug))
        .find_also_related(Request)
        .one(db)
        .await?
        .and_then(|(c, r)| r.map(|r| (c, r))))
}

/// Loads a campaign and its request if the actor is its proposer or an approver.
async fn find_visible<C>(
    db: &C,
    actor: &Actor,
    slug: &str,
) -> Result<(campaign::Model, request::Model)>
where
    C: ConnectionTrait,
{
    find_with_request(db, slug)
        .await?
        .filter(|(_, r)| can_view(r, actor))
        .ok_or(Error::NotFound { entity: "Campaign" })
}

/// Loads a campaign for editing: proposer only, request still in DRAFT.
async fn find_editable<C>(
    db: &C,
    actor: &Actor,
    slug: &str,
) -> Result<(campaign::Model, request::Model)>
where
    C: ConnectionTrait,
{
    let (campaign, request) = find_visible(db, actor, slug).await?;
    if !actor.is(&request.proposed_by) || request.status != RequestStatus::Draft {
        return Err(Error::PermissionDenied);
    }
    Ok((campaign, request))
}

/// Drafts a new campaign together with its DRAFT request.
///
/// The request and campaign rows are written in one transaction; images are
/// stored once the campaign has an id.
#[instrument(skip(db, storage, notifier, actor, input), fields(actor = %actor.user_id))]
pub async fn create_campaign<S>(
    db: &DatabaseConnection,
    storage: &S,
    notifier: &dyn Notifier,
    actor: &Actor,
    input: NewCampaign,
) -> Result<campaign::Model>
where
    S: FileStorage,
{
    let NewCampaign {
        details,
        slug,
        cover_image,
        gallery,
    } = input;

    validate_details(&details)?;
    let slug = resolve_slug(slug.as_deref(), &details.title)?;
    if let Some(upload) = &cover_image {
        validate_upload(upload)?;
    }
    for upload in &gallery {
        validate_upload(upload)?;
    }
    if get_campaign_by_slug(db, &slug).await?.is_some() {
        return Err(Error::validation(
            "slug",
            "This slug is already in use. Please choose a different slug",
        ));
    }

    let category_id = resolve_category(db, details.category.as_deref()).await?;

    let txn = db.begin().await?;
    let request = workflow::create_request(&txn, actor, ProposalKind::Campaign).await?;

    let now = chrono::Utc::now();
    let mut campaign = campaign::ActiveModel {
        request_id: Set(request.id),
        title: Set(details.title.trim().to_string()),
        slug: Set(slug),
        short_description: Set(details.short_description.trim().to_string()),
        description: Set(details.description.trim().to_string()),
        category_id: Set(category_id),
        tags: Set(normalize_tags(&details.tags)),
        cover_image: Set(None),
        visibility: Set(details.visibility),
        start_date: Set(details.start_date),
        end_date: Set(details.end_date),
        timezone_name: Set(details.timezone_name),
        goal_amount: Set(details.goal_amount),
        minimum_donation_amount: Set(details.minimum_donation_amount),
        maximum_donation_amount: Set(details.maximum_donation_amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(map_unique_violation)?;
    txn.commit().await?;

    if let Some(upload) = cover_image {
        let path = storage
            .save(&cover_image_path(&campaign.slug, &upload.filename), &upload.bytes)
            .await?;
        let mut active: campaign::ActiveModel = campaign.into();
        active.cover_image = Set(Some(path));
        campaign = active.update(db).await?;
    }
    for (position, upload) in gallery.into_iter().enumerate() {
        let position = i32::try_from(position).unwrap_or(i32::MAX);
        store_gallery_image(db, storage, campaign.id, position, &upload).await?;
    }

    info!(slug = %campaign.slug, request_id = request.id, "campaign drafted");
    notifier.notify(&Notification::CampaignCreated {
        proposer_id: actor.user_id.clone(),
        slug: campaign.slug.clone(),
    });

    Ok(campaign)
}

async fn store_gallery_image<S>(
    db: &DatabaseConnection,
    storage: &S,
    campaign_id: i64,
    position: i32,
    upload: &Upload,
) -> Result<campaign_image::Model>
where
    S: FileStorage,
{
    let path = storage
        .save(&gallery_image_path(campaign_id, &upload.filename), &upload.bytes)
        .await?;

    // Same filename replaces the earlier entry instead of duplicating it.
    if let Some(existing) = CampaignImage::find()
        .filter(campaign_image::Column::CampaignId.eq(campaign_id))
        .filter(campaign_image::Column::Path.eq(path.as_str()))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    campaign_image::ActiveModel {
        campaign_id: Set(campaign_id),
        path: Set(path),
        position: Set(position),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Edits a draft campaign. Only the proposer may edit, and only while in DRAFT.
pub async fn update_campaign(
    db: &DatabaseConnection,
    actor: &Actor,
    slug: &str,
    changes: CampaignChanges,
) -> Result<campaign::Model> {
    let (campaign, _) = find_editable(db, actor, slug).await?;

    let current = CampaignDetails {
        title: campaign.title.clone(),
        short_description: campaign.short_description.clone(),
        description: campaign.description.clone(),
        category: category_name(db, campaign.category_id).await?,
        tags: campaign.tags.clone(),
        visibility: campaign.visibility,
        start_date: campaign.start_date,
        end_date: campaign.end_date,
        timezone_name: campaign.timezone_name.clone(),
        goal_amount: campaign.goal_amount,
        minimum_donation_amount: campaign.minimum_donation_amount,
        maximum_donation_amount: campaign.maximum_donation_amount,
    };
    let details = changes.apply(current);
    validate_details(&details)?;
    let category_id = resolve_category(db, details.category.as_deref()).await?;

    let mut active: campaign::ActiveModel = campaign.into();
    active.title = Set(details.title.trim().to_string());
    active.short_description = Set(details.short_description.trim().to_string());
    active.description = Set(details.description.trim().to_string());
    active.category_id = Set(category_id);
    active.tags = Set(normalize_tags(&details.tags));
    active.visibility = Set(details.visibility);
    active.start_date = Set(details.start_date);
    active.end_date = Set(details.end_date);
    active.timezone_name = Set(details.timezone_name);
    active.goal_amount = Set(details.goal_amount);
    active.minimum_donation_amount = Set(details.minimum_donation_amount);
    active.maximum_donation_amount = Set(details.maximum_donation_amount);
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(db).await?;
    info!(slug = %updated.slug, "campaign updated");
    Ok(updated)
}

/// Replaces a draft campaign's cover image.
pub async fn set_cover_image<S>(
    db: &DatabaseConnection,
    storage: &S,
    actor: &Actor,
    slug: &str,
    upload: Upload,
) -> Result<campaign::Model>
where
    S: FileStorage,
{
    validate_upload(&upload)?;
    let (campaign, _) = find_editable(db, actor, slug).await?;

    let path = storage
        .save(&cover_image_path(&campaign.slug, &upload.filename), &upload.bytes)
        .await?;
    let previous = campaign.cover_image.clone();

    let mut active: campaign::ActiveModel = campaign.into();
    active.cover_image = Set(Some(path.clone()));
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(db).await?;

    // A different extension leaves the old file behind under another name.
    if let Some(old) = previous.filter(|old| *old != path) {
        if let Err(e) = storage.delete(&old).await {
            warn!(path = %old, "failed to delete replaced cover image: {e}");
        }
    }

    Ok(updated)
}

/// Appends an image to a draft campaign's gallery.
pub async fn add_gallery_image<S>(
    db: &DatabaseConnection,
    storage: &S,
    actor: &Actor,
    slug: &str,
    upload: Upload,
) -> Result<campaign_image::Model>
where
    S: FileStorage,
{
    validate_upload(&upload)?;
    let (campaign, _) = find_editable(db, actor, slug).await?;

    let position = CampaignImage::find()
        .filter(campaign_image::Column::CampaignId.eq(campaign.id))
        .count(db)
        .await?;
    store_gallery_image(
        db,
        storage,
        campaign.id,
        i32::try_from(position).unwrap_or(i32::MAX),
        &upload,
    )
    .await
}

/// Deletes a campaign and its gallery, then removes its files best-effort.
///
/// Approvers may delete any campaign; proposers only while the request is in
/// DRAFT, CANCELED or REJECTED. Campaigns with donations cannot be deleted.
/// The owning request is kept.
#[instrument(skip(db, storage, actor), fields(actor = %actor.user_id))]
pub async fn delete_campaign<S>(
    db: &DatabaseConnection,
    storage: &S,
    actor: &Actor,
    slug: &str,
) -> Result<()>
where
    S: FileStorage,
{
    let (campaign, request) = find_visible(db, actor, slug).await?;
    let proposer_may_delete = actor.is(&request.proposed_by)
        && matches!(
            request.status,
            RequestStatus::Draft | RequestStatus::Canceled | RequestStatus::Rejected
        );
    if !(is_approval_user(actor) || proposer_may_delete) {
        return Err(Error::PermissionDenied);
    }

    let donations = Donation::find()
        .filter(DonationColumn::CampaignId.eq(campaign.id))
        .count(db)
        .await?;
    if donations > 0 {
        return Err(Error::validation(
            "campaign",
            "has received donations and cannot be deleted",
        ));
    }

    let txn = db.begin().await?;
    let images = CampaignImage::find()
        .filter(campaign_image::Column::CampaignId.eq(campaign.id))
        .all(&txn)
        .await?;
    CampaignImage::delete_many()
        .filter(campaign_image::Column::CampaignId.eq(campaign.id))
        .exec(&txn)
        .await?;
    Campaign::delete_by_id(campaign.id).exec(&txn).await?;
    txn.commit().await?;

    // Files go after the rows; a failed file delete never restores the rows.
    let paths = campaign
        .cover_image
        .iter()
        .cloned()
        .chain(images.into_iter().map(|i| i.path));
    for path in paths {
        if let Err(e) = storage.delete(&path).await {
            warn!(%path, "failed to delete campaign file: {e}");
        }
    }

    info!(slug, request_id = request.id, "campaign deleted");
    Ok(())
}

async fn load_detail(
    db: &DatabaseConnection,
    campaign: campaign::Model,
    request: request::Model,
) -> Result<CampaignDetail> {
    let category = category_name(db, campaign.category_id).await?;
    let gallery = CampaignImage::find()
        .filter(campaign_image::Column::CampaignId.eq(campaign.id))
        .order_by_asc(campaign_image::Column::Position)
        .order_by_asc(campaign_image::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.path)
        .collect();
    let stats = donation::campaign_stats(db, campaign.id).await?;
    Ok(CampaignDetail {
        campaign,
        request,
        category,
        gallery,
        stats,
    })
}

/// Full campaign view for its proposer or an approver.
pub async fn get_campaign_for_actor(
    db: &DatabaseConnection,
    actor: &Actor,
    slug: &str,
) -> Result<CampaignDetail> {
    let (campaign, request) = find_visible(db, actor, slug).await?;
    load_detail(db, campaign, request).await
}

/// Public campaign view; only listable campaigns are found.
pub async fn get_public_campaign(
    db: &DatabaseConnection,
    now: DateTimeUtc,
    slug: &str,
) -> Result<CampaignDetail> {
    let (campaign, request) = find_with_request(db, slug)
        .await?
        .filter(|(c, r)| is_currently_listable(c, r.status, now))
        .ok_or(Error::NotFound { entity: "Campaign" })?;
    load_detail(db, campaign, request).await
}

/// Resolves a campaign slug to its request id for the proposer or an approver.
pub async fn request_id_for_slug(
    db: &DatabaseConnection,
    actor: &Actor,
    slug: &str,
) -> Result<i64> {
    Ok(find_visible(db, actor, slug).await?.1.id)
}

/// Applies a workflow action to the campaign's request.
///
/// Approving a campaign that is public and inside its date window publishes it
/// straight away: APPROVED and ACTIVE are committed together, so a failure in
/// either step leaves the request under review.
pub async fn transition_campaign(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    now: DateTimeUtc,
    actor: &Actor,
    slug: &str,
    action: RequestAction,
) -> Result<request::Model> {
    let (campaign, request) = find_visible(db, actor, slug).await?;

    let publish_now = action == RequestAction::Approve
        && campaign.visibility == Visibility::Public
        && campaign.is_in_active_window(now);
    let actions = if publish_now {
        vec![RequestAction::Approve, RequestAction::Activate]
    } else {
        vec![action]
    };

    workflow::transition_chain(db, notifier, request.id, actor, &actions).await
}

/// Activates every approved public campaign whose window has opened.
///
/// Returns the slugs that were activated. Campaigns that lose a race with a
/// concurrent transition are skipped.
pub async fn activate_ready_campaigns(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    now: DateTimeUtc,
    actor: &Actor,
) -> Result<Vec<String>> {
    if !is_approval_user(actor) {
        return Err(Error::PermissionDenied);
    }

    let candidates = Campaign::find()
        .filter(campaign::Column::Visibility.eq(Visibility::Public))
        .find_also_related(Request)
        .filter(request::Column::Status.eq(RequestStatus::Approved))
        .all(db)
        .await?;

    let mut activated = Vec::new();
    for (campaign, request) in candidates {
        let Some(request) = request else { continue };
        if !campaign.is_in_active_window(now) {
            continue;
        }
        match workflow::transition(db, notifier, request.id, actor, RequestAction::Activate).await {
            Ok(_) => activated.push(campaign.slug),
            Err(Error::ConcurrentModification | Error::InvalidStateTransition { .. }) => {
                warn!(slug = %campaign.slug, "skipped activation, request changed concurrently");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(activated)
}

/// Lists campaigns for management: approvers see all, others only their own.
pub async fn list_campaign_requests(
    db: &DatabaseConnection,
    actor: &Actor,
    query: &CampaignQuery,
) -> Result<Page<CampaignSummary>> {
    let page_size = query.page_size.clamp(1, 100);

    let mut select = Campaign::find()
        .join(JoinType::InnerJoin, campaign::Relation::Request.def())
        .join(JoinType::LeftJoin, campaign::Relation::Category.def());

    if !is_approval_user(actor) {
        select = select.filter(request::Column::ProposedBy.eq(actor.user_id.as_str()));
    }

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let status_term = q.to_uppercase().replace(' ', "_");
        let statuses: Vec<RequestStatus> = <RequestStatus as sea_orm::Iterable>::iter()
            .filter(|s| s.as_str().contains(&status_term))
            .collect();

        let mut condition = Condition::any()
            .add(campaign::Column::Slug.contains(q))
            .add(campaign::Column::Title.contains(q))
            .add(campaign::Column::ShortDescription.contains(q))
            .add(campaign::Column::Description.contains(q))
            .add(campaign_category::Column::Name.contains(q));
        if !statuses.is_empty() {
            condition = condition.add(request::Column::Status.is_in(statuses));
        }
        select = select.filter(condition);
    }

    if let Some(status) = query.status {
        select = select.filter(request::Column::Status.eq(status));
    }

    let order = if query.descending {
        Order::Desc
    } else {
        Order::Asc
    };
    select = match query.sort {
        CampaignSort::Title => select.order_by(campaign::Column::Title, order),
        CampaignSort::Category => select.order_by(campaign_category::Column::Name, order),
        CampaignSort::Status => select.order_by(request::Column::Status, order),
        CampaignSort::StartDate => select.order_by(campaign::Column::StartDate, order),
        CampaignSort::EndDate => select.order_by(campaign::Column::EndDate, order),
        CampaignSort::GoalAmount => select.order_by(campaign::Column::GoalAmount, order),
    }
    .order_by_asc(campaign::Column::Id);

    let paginator = select.paginate(db, page_size);
    let counts = paginator.num_items_and_pages().await?;
    let total_pages = counts.number_of_pages.max(1);
    let page = query.page.clamp(1, total_pages);
    let campaigns = paginator.fetch_page(page - 1).await?;

    let request_ids: Vec<i64> = campaigns.iter().map(|c| c.request_id).collect();
    let statuses: HashMap<i64, RequestStatus> = Request::find()
        .filter(request::Column::Id.is_in(request_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r.status))
        .collect();
    let category_ids: Vec<i64> = campaigns.iter().filter_map(|c| c.category_id).collect();
    let categories = category_names(db, category_ids).await?;

    let items = campaigns
        .into_iter()
        .filter_map(|campaign| {
            let status = *statuses.get(&campaign.request_id)?;
            let category = campaign
                .category_id
                .and_then(|id| categories.get(&id).cloned());
            Some(CampaignSummary {
                campaign,
                status,
                category,
            })
        })
        .collect();

    Ok(Page {
        items,
        page,
        page_size,
        total_items: counts.number_of_items,
        total_pages,
    })
}

async fn category_names(db: &DatabaseConnection, ids: Vec<i64>) -> Result<HashMap<i64, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(CampaignCategory::find()
        .filter(campaign_category::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn matches_term(campaign: &campaign::Model, category: Option<&str>, term: &str) -> bool {
    let term = term.to_lowercase();
    [
        campaign.title.as_str(),
        campaign.short_description.as_str(),
        campaign.description.as_str(),
        category.unwrap_or_default(),
        campaign.tags.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Puts `None` after every `Some`, whichever direction the values sort.
fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_public(a: &PublicCampaign, b: &PublicCampaign, sort: PublicSort) -> Ordering {
    let (ca, cb) = (&a.campaign, &b.campaign);
    match sort {
        PublicSort::New => cb.start_date.cmp(&ca.start_date),
        PublicSort::EndSoon => nulls_last(ca.end_date, cb.end_date, false),
        PublicSort::GoalHigh => nulls_last(ca.goal_amount, cb.goal_amount, true),
        PublicSort::GoalLow => nulls_last(ca.goal_amount, cb.goal_amount, false),
        PublicSort::RaisedHigh => b.stats.amount_raised.cmp(&a.stats.amount_raised),
        PublicSort::RaisedLow => a.stats.amount_raised.cmp(&b.stats.amount_raised),
        PublicSort::Popular => b.stats.donation_count.cmp(&a.stats.donation_count),
        PublicSort::TitleAz => ca.title.cmp(&cb.title),
        PublicSort::TitleZa => cb.title.cmp(&ca.title),
    }
    .then_with(|| ca.id.cmp(&cb.id))
}

/// Lists campaigns open to donors at `now`.
///
/// Only campaigns that are ACTIVE, public and inside their date window appear.
pub async fn list_public_campaigns(
    db: &DatabaseConnection,
    now: DateTimeUtc,
    query: &PublicQuery,
) -> Result<Page<PublicCampaign>> {
    let mut select = Campaign::find()
        .join(JoinType::InnerJoin, campaign::Relation::Request.def())
        .filter(request::Column::Status.eq(RequestStatus::Active))
        .filter(campaign::Column::Visibility.eq(Visibility::Public));

    if let Some(name) = query.category.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        match category::get_category_by_name(db, name).await? {
            Some(category) => {
                select = select.filter(campaign::Column::CategoryId.eq(category.id));
            }
            None => {
                return Ok(Page {
                    items: Vec::new(),
                    page: 1,
                    page_size: PUBLIC_PAGE_SIZE,
                    total_items: 0,
                    total_pages: 1,
                });
            }
        }
    }

    let rows = select
        .find_also_related(CampaignCategory)
        .all(db)
        .await?;

    let terms: Vec<&str> = query
        .q
        .as_deref()
        .map(|q| q.split_whitespace().collect())
        .unwrap_or_default();

    let listable: Vec<(campaign::Model, Option<String>)> = rows
        .into_iter()
        .filter(|(c, _)| c.is_in_active_window(now))
        .map(|(c, cat)| (c, cat.map(|cat| cat.name)))
        .filter(|(c, cat)| terms.iter().all(|t| matches_term(c, cat.as_deref(), t)))
        .collect();

    let ids: Vec<i64> = listable.iter().map(|(c, _)| c.id).collect();
    let mut stats = donation::stats_for_campaigns(db, &ids).await?;

    let mut items: Vec<PublicCampaign> = listable
        .into_iter()
        .map(|(campaign, category)| PublicCampaign {
            stats: stats.remove(&campaign.id).unwrap_or_default(),
            campaign,
            category,
        })
        .collect();
    items.sort_by(|a, b| compare_public(a, b, query.sort));

    let total_items = items.len() as u64;
    let total_pages = total_items.div_ceil(PUBLIC_PAGE_SIZE).max(1);
    let page = query.page.clamp(1, total_pages);
    let skip = usize::try_from((page - 1) * PUBLIC_PAGE_SIZE).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(skip)
        .take(usize::try_from(PUBLIC_PAGE_SIZE).unwrap_or(usize::MAX))
        .collect();

    Ok(Page {
        items,
        page,
        page_size: PUBLIC_PAGE_SIZE,
        total_items,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::donation::submit_donation;
    use crate::core::request::list_messages;
    use crate::test_utils::*;
    use chrono::{Duration, Utc};

    fn upload(filename: &str) -> Upload {
        Upload {
            filename: filename.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    async fn seed_category(db: &DatabaseConnection, name: &str) -> Result<()> {
        category::create_category(db, &approver(), name, "").await?;
        Ok(())
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Clean Water"), "clean-water");
        assert_eq!(slugify("  Help -- the   Library! "), "help-the-library");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("¡¿!!"), "");
        assert_eq!(slugify(&"a".repeat(300)).len(), MAX_SLUG_LENGTH);
    }

    #[test]
    fn test_normalize_tags() {
        assert_eq!(normalize_tags(" water, health ,,water,  "), "water,health");
        assert_eq!(normalize_tags(""), "");
    }

    #[test]
    fn test_parse_local_datetime() {
        let kolkata =
            parse_local_datetime("start_date", "2025-01-15 09:30", "Asia/Kolkata").unwrap();
        assert_eq!(kolkata.to_rfc3339(), "2025-01-15T04:00:00+00:00");

        let midnight = parse_local_datetime("start_date", "2025-07-01", "Europe/London").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2025-06-30T23:00:00+00:00");

        let bad = parse_local_datetime("end_date", "tomorrow", "UTC");
        assert!(matches!(bad, Err(Error::Validation { field: "end_date", .. })));

        // Skipped by the spring-forward gap
        let gap = parse_local_datetime("start_date", "2025-03-09 02:30", "America/New_York");
        assert!(matches!(gap, Err(Error::Validation { field: "start_date", .. })));
    }

    #[test]
    fn test_validate_details() {
        assert!(validate_details(&campaign_details("Ok")).is_ok());

        let mut details = campaign_details("Dates");
        details.end_date = Some(details.start_date - Duration::days(1));
        assert!(matches!(
            validate_details(&details),
            Err(Error::Validation { field: "end_date", .. })
        ));

        let mut details = campaign_details("Bounds");
        details.maximum_donation_amount = Some(money("5.00"));
        assert!(matches!(
            validate_details(&details),
            Err(Error::Validation { field: "maximum_donation_amount", .. })
        ));

        let mut details = campaign_details("Zone");
        details.timezone_name = "Mars/Olympus".to_string();
        assert!(matches!(
            validate_details(&details),
            Err(Error::Validation { field: "timezone_name", .. })
        ));

        let mut details = campaign_details("Precision");
        details.goal_amount = Some(money("100.001"));
        assert!(matches!(
            validate_details(&details),
            Err(Error::Validation { field: "goal_amount", .. })
        ));

        let mut details = campaign_details("   ");
        details.title = "   ".to_string();
        assert!(matches!(
            validate_details(&details),
            Err(Error::Validation { field: "title", .. })
        ));
    }

    #[test]
    fn test_listable_needs_status_visibility_and_window() {
        let now = Utc::now();
        let campaign = campaign::Model {
            id: 1,
            request_id: 1,
            title: "T".to_string(),
            slug: "t".to_string(),
            short_description: String::new(),
            description: String::new(),
            category_id: None,
            tags: String::new(),
            cover_image: None,
            visibility: Visibility::Public,
            start_date: now - Duration::hours(1),
            end_date: None,
            timezone_name: "UTC".to_string(),
            goal_amount: None,
            minimum_donation_amount: money("10"),
            maximum_donation_amount: None,
            created_at: now,
            updated_at: now,
        };
        assert!(is_currently_listable(&campaign, RequestStatus::Active, now));
        assert!(!is_currently_listable(&campaign, RequestStatus::Approved, now));
        assert!(!is_currently_listable(
            &campaign,
            RequestStatus::Active,
            now - Duration::hours(2)
        ));

        let mut private = campaign;
        private.visibility = Visibility::Private;
        assert!(!is_currently_listable(&private, RequestStatus::Active, now));
    }

    #[tokio::test]
    async fn test_create_campaign_drafts_request_and_stores_images() -> Result<()> {
        let db = setup_test_db().await?;
        let storage = MemoryStorage::default();
        let notifier = RecordingNotifier::default();
        seed_category(&db, "Water").await?;

        let mut details = campaign_details("Clean Water");
        details.category = Some("Water".to_string());
        details.tags = "water, health, water".to_string();
        let campaign = create_campaign(&db, &storage, &notifier, &proposer(), NewCampaign {
            details,
            slug: None,
            cover_image: Some(upload("Cover.PNG")),
            gallery: vec![upload("well site.jpg"), upload("pump.jpg")],
        })
        .await?;

        assert_eq!(campaign.slug, "clean-water");
        assert_eq!(campaign.tags, "water,health");
        assert_eq!(campaign.cover_image.as_deref(), Some("campaign/cover_image/clean-water.png"));
        assert_eq!(storage.paths(), vec![
            "campaign/cover_image/clean-water.png".to_string(),
            format!("campaign/gallery/{}/pump.jpg", campaign.id),
            format!("campaign/gallery/{}/well_site.jpg", campaign.id),
        ]);

        let detail = get_campaign_for_actor(&db, &proposer(), "clean-water").await?;
        assert_eq!(detail.status(), RequestStatus::Draft);
        assert_eq!(detail.category.as_deref(), Some("Water"));
        assert_eq!(detail.gallery, vec![
            format!("campaign/gallery/{}/well_site.jpg", campaign.id),
            format!("campaign/gallery/{}/pump.jpg", campaign.id),
        ]);
        assert_eq!(detail.request.proposed_by, proposer().user_id);

        assert_eq!(notifier.events(), vec![Notification::CampaignCreated {
            proposer_id: proposer().user_id,
            slug: "clean-water".to_string(),
        }]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_campaign_rejects_bad_input_without_writing() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_campaign(&db, "Clean Water").await?;

        let duplicate = create_test_campaign(&db, "Clean  water").await;
        assert!(matches!(duplicate, Err(Error::Validation { field: "slug", .. })));

        let mut details = campaign_details("Unknown Category");
        details.category = Some("Nope".to_string());
        let result = create_custom_campaign(&db, details).await;
        assert!(matches!(result, Err(Error::Validation { field: "category", .. })));

        let unsluggable = create_test_campaign(&db, "!!!").await;
        assert!(matches!(unsluggable, Err(Error::Validation { field: "slug", .. })));

        let bad_image = create_campaign(
            &db,
            &MemoryStorage::default(),
            &RecordingNotifier::default(),
            &proposer(),
            NewCampaign {
                details: campaign_details("With Image"),
                slug: None,
                cover_image: Some(upload("notes.txt")),
                gallery: Vec::new(),
            },
        )
        .await;
        assert!(matches!(bad_image, Err(Error::Validation { field: "image", .. })));

        assert_eq!(Campaign::find().count(&db).await?, 1);
        assert_eq!(Request::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_slug_is_validated() -> Result<()> {
        let db = setup_test_db().await?;
        let create = |slug: &str| NewCampaign {
            details: campaign_details("Custom"),
            slug: Some(slug.to_string()),
            cover_image: None,
            gallery: Vec::new(),
        };
        let storage = MemoryStorage::default();
        let notifier = RecordingNotifier::default();

        let campaign =
            create_campaign(&db, &storage, &notifier, &proposer(), create("My-Slug")).await?;
        assert_eq!(campaign.slug, "my-slug");

        let bad = create_campaign(&db, &storage, &notifier, &proposer(), create("has space")).await;
        assert!(matches!(bad, Err(Error::Validation { field: "slug", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_only_by_proposer_while_draft() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        let campaign = create_test_campaign(&db, "Library").await?;

        let changes = CampaignChanges {
            title: Some("Library Books".to_string()),
            goal_amount: Some(Some(money("5000.00"))),
            end_date: Some(None),
            ..Default::default()
        };
        let result = update_campaign(&db, &stranger(), "library", changes.clone()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        let result = update_campaign(&db, &approver(), "library", changes.clone()).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));

        let updated = update_campaign(&db, &proposer(), "library", changes).await?;
        assert_eq!(updated.title, "Library Books");
        assert_eq!(updated.slug, "library");
        assert_eq!(updated.goal_amount, Some(money("5000.00")));
        assert!(updated.end_date.is_none());

        let invalid = CampaignChanges {
            minimum_donation_amount: Some(money("-1")),
            ..Default::default()
        };
        let result = update_campaign(&db, &proposer(), "library", invalid).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        transition_campaign(
            &db,
            &notifier,
            Utc::now(),
            &proposer(),
            &campaign.slug,
            RequestAction::SendForReview,
        )
        .await?;
        let result = update_campaign(&db, &proposer(), "library", CampaignChanges::default()).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
        Ok(())
    }

    #[tokio::test]
    async fn test_gallery_upload_with_same_name_replaces() -> Result<()> {
        let db = setup_test_db().await?;
        let storage = MemoryStorage::default();
        let campaign = create_test_campaign(&db, "Garden").await?;

        add_gallery_image(&db, &storage, &proposer(), "garden", upload("bed.jpg")).await?;
        let replacement = Upload {
            filename: "bed.jpg".to_string(),
            bytes: vec![9, 9],
        };
        add_gallery_image(&db, &storage, &proposer(), "garden", replacement).await?;

        let path = format!("campaign/gallery/{}/bed.jpg", campaign.id);
        assert_eq!(storage.read(&path), Some(vec![9, 9]));
        let detail = get_campaign_for_actor(&db, &proposer(), "garden").await?;
        assert_eq!(detail.gallery, vec![path]);

        let cover = set_cover_image(&db, &storage, &proposer(), "garden", upload("a.png")).await?;
        assert_eq!(cover.cover_image.as_deref(), Some("campaign/cover_image/garden.png"));
        let cover = set_cover_image(&db, &storage, &proposer(), "garden", upload("b.jpg")).await?;
        assert_eq!(cover.cover_image.as_deref(), Some("campaign/cover_image/garden.jpg"));
        assert!(storage.read("campaign/cover_image/garden.png").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_clean_water_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        let now = Utc::now();
        let campaign = create_test_campaign(&db, "Clean Water").await?;

        let public = list_public_campaigns(&db, now, &PublicQuery::default()).await?;
        assert!(public.items.is_empty());

        transition_campaign(
            &db,
            &notifier,
            now,
            &proposer(),
            "clean-water",
            RequestAction::SendForReview,
        )
        .await?;
        let request = transition_campaign(
            &db,
            &notifier,
            now,
            &approver(),
            "clean-water",
            RequestAction::Approve,
        )
        .await?;
        assert_eq!(request.status, RequestStatus::Active);
        assert_eq!(request.reviewed_by, Some(approver().user_id));
        assert_eq!(notifier.status_changes(), vec![
            (RequestStatus::Draft, RequestStatus::PendingReview),
            (RequestStatus::PendingReview, RequestStatus::Approved),
            (RequestStatus::Approved, RequestStatus::Active),
        ]);

        // Chat closes once approved; the audit trail is still recorded.
        let result = list_messages(&db, &approver(), request.id).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
        let trail = crate::entities::RequestMessage::find()
            .filter(crate::entities::request_message::Column::RequestId.eq(request.id))
            .count(&db)
            .await?;
        assert_eq!(trail, 3);

        let public = list_public_campaigns(&db, now, &PublicQuery::default()).await?;
        assert_eq!(public.items.len(), 1);
        assert_eq!(public.items[0].campaign.id, campaign.id);

        submit_donation(&db, &notifier, now, "clean-water", donation_of("100.00")).await?;
        let detail = get_public_campaign(&db, now, "clean-water").await?;
        assert_eq!(detail.stats.amount_raised, money("100.00"));
        assert_eq!(detail.stats.donation_count, 1);

        let request = transition_campaign(
            &db,
            &notifier,
            now,
            &approver(),
            "clean-water",
            RequestAction::Archive,
        )
        .await?;
        assert_eq!(request.status, RequestStatus::Archived);
        let result = get_public_campaign(&db, now, "clean-water").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_approval_of_private_or_future_campaign_stays_approved() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let mut details = campaign_details("Members Only");
        details.visibility = Visibility::Private;
        let private = create_custom_campaign(&db, details).await?;
        assert_eq!(publish_campaign(&db, &private).await?.status, RequestStatus::Approved);

        let mut details = campaign_details("Next Month");
        details.start_date = now + Duration::days(30);
        details.end_date = None;
        let future = create_custom_campaign(&db, details).await?;
        assert_eq!(publish_campaign(&db, &future).await?.status, RequestStatus::Approved);

        let notifier = RecordingNotifier::default();
        let result = activate_ready_campaigns(&db, &notifier, now, &proposer()).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
        assert!(activate_ready_campaigns(&db, &notifier, now, &approver()).await?.is_empty());

        let later = now + Duration::days(31);
        let activated = activate_ready_campaigns(&db, &notifier, later, &approver()).await?;
        assert_eq!(activated, vec!["next-month".to_string()]);

        let listed = list_public_campaigns(&db, later, &PublicQuery::default()).await?;
        let slugs: Vec<&str> = listed.items.iter().map(|c| c.campaign.slug.as_str()).collect();
        assert_eq!(slugs, vec!["next-month"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_campaign_requests_scoping_search_and_paging() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        for title in ["Alpha", "Bravo", "Charlie"] {
            create_test_campaign(&db, title).await?;
        }
        transition_campaign(
            &db,
            &notifier,
            Utc::now(),
            &proposer(),
            "bravo",
            RequestAction::SendForReview,
        )
        .await?;

        let stranger_view =
            list_campaign_requests(&db, &stranger(), &CampaignQuery::default()).await?;
        assert_eq!(stranger_view.total_items, 0);
        assert_eq!(stranger_view.total_pages, 1);

        let all = list_campaign_requests(&db, &approver(), &CampaignQuery::default()).await?;
        let titles: Vec<&str> = all.items.iter().map(|s| s.campaign.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);

        let query = CampaignQuery {
            q: Some("pending".to_string()),
            ..Default::default()
        };
        let pending = list_campaign_requests(&db, &proposer(), &query).await?;
        assert_eq!(pending.items.len(), 1);
        assert_eq!(pending.items[0].status, RequestStatus::PendingReview);

        let query = CampaignQuery {
            sort: CampaignSort::parse("title"),
            descending: true,
            page: 5,
            page_size: 2,
            ..Default::default()
        };
        let page = list_campaign_requests(&db, &proposer(), &query).await?;
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 2);
        let titles: Vec<&str> = page.items.iter().map(|s| s.campaign.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha"]);

        let query = CampaignQuery {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(list_campaign_requests(&db, &proposer(), &query).await?.page_size, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_public_listing_search_filter_and_sort() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::default();
        let now = Utc::now();
        seed_category(&db, "Water").await?;

        let mut details = campaign_details("Clean Water");
        details.category = Some("Water".to_string());
        details.goal_amount = Some(money("1000"));
        let water = create_custom_campaign(&db, details).await?;
        publish_campaign(&db, &water).await?;

        let mut details = campaign_details("School Books");
        details.tags = "education".to_string();
        details.goal_amount = Some(money("5000"));
        let books = create_custom_campaign(&db, details).await?;
        publish_campaign(&db, &books).await?;

        submit_donation(&db, &notifier, now, "school-books", donation_of("20.00")).await?;
        submit_donation(&db, &notifier, now, "school-books", donation_of("30.00")).await?;
        submit_donation(&db, &notifier, now, "clean-water", donation_of("500.00")).await?;

        let slugs = |page: Page<PublicCampaign>| -> Vec<String> {
            page.items.into_iter().map(|c| c.campaign.slug).collect()
        };
        let query = |q: Option<&str>, category: Option<&str>, sort: &str| PublicQuery {
            q: q.map(str::to_string),
            category: category.map(str::to_string),
            sort: PublicSort::parse(sort),
            page: 1,
        };

        let result =
            list_public_campaigns(&db, now, &query(Some("clean WATER"), None, "new")).await?;
        assert_eq!(slugs(result), vec!["clean-water"]);
        let result = list_public_campaigns(&db, now, &query(Some("education"), None, "new")).await?;
        assert_eq!(slugs(result), vec!["school-books"]);
        let result = list_public_campaigns(&db, now, &query(None, Some("Water"), "new")).await?;
        assert_eq!(slugs(result), vec!["clean-water"]);
        let result = list_public_campaigns(&db, now, &query(None, Some("Unknown"), "new")).await?;
        assert_eq!(result.total_items, 0);

        let result = list_public_campaigns(&db, now, &query(None, None, "goal_high")).await?;
        assert_eq!(slugs(result), vec!["school-books", "clean-water"]);
        let result = list_public_campaigns(&db, now, &query(None, None, "raised_high")).await?;
        assert_eq!(slugs(result), vec!["clean-water", "school-books"]);
        let result = list_public_campaigns(&db, now, &query(None, None, "popular")).await?;
        assert_eq!(slugs(result), vec!["school-books", "clean-water"]);
        let result = list_public_campaigns(&db, now, &query(None, None, "title_za")).await?;
        assert_eq!(slugs(result), vec!["school-books", "clean-water"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_campaign_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let storage = MemoryStorage::default();
        let notifier = RecordingNotifier::default();
        let now = Utc::now();

        let draft = create_test_campaign(&db, "Draft One").await?;
        add_gallery_image(&db, &storage, &proposer(), "draft-one", upload("x.png")).await?;
        let result = delete_campaign(&db, &storage, &stranger(), "draft-one").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        delete_campaign(&db, &storage, &proposer(), "draft-one").await?;
        assert!(storage.paths().is_empty());
        assert!(get_campaign_by_slug(&db, "draft-one").await?.is_none());
        assert!(workflow::get_request_by_id(&db, draft.request_id).await?.is_some());

        let live = create_active_campaign(&db, "Live One").await?;
        let result = delete_campaign(&db, &storage, &proposer(), &live.slug).await;
        assert!(matches!(result, Err(Error::PermissionDenied)));

        submit_donation(&db, &notifier, now, &live.slug, donation_of("15.00")).await?;
        let result = delete_campaign(&db, &storage, &approver(), &live.slug).await;
        assert!(matches!(result, Err(Error::Validation { field: "campaign", .. })));

        let other = create_active_campaign(&db, "Quiet One").await?;
        delete_campaign(&db, &storage, &approver(), &other.slug).await?;
        assert!(get_campaign_by_slug(&db, &other.slug).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_campaign_survives_file_delete_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let storage = FailingStorage::default();

        let draft = create_test_campaign(&db, "Stuck Files").await?;
        set_cover_image(&db, &storage, &proposer(), "stuck-files", upload("cover.png")).await?;
        add_gallery_image(&db, &storage, &proposer(), "stuck-files", upload("a.png")).await?;
        add_gallery_image(&db, &storage, &proposer(), "stuck-files", upload("b.png")).await?;
        assert_eq!(storage.paths().len(), 3);

        delete_campaign(&db, &storage, &proposer(), "stuck-files").await?;

        assert!(get_campaign_by_slug(&db, "stuck-files").await?.is_none());
        let images = CampaignImage::find()
            .filter(campaign_image::Column::CampaignId.eq(draft.id))
            .count(&db)
            .await?;
        assert_eq!(images, 0);
        let request = workflow::get_request_by_id(&db, draft.request_id).await?;
        assert_eq!(request.map(|r| r.status), Some(RequestStatus::Draft));
        // The files could not be removed and are left behind
        assert_eq!(storage.paths().len(), 3);
        Ok(())
    }
}
