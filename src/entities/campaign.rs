//! Campaign entity - a fundraising proposal governed by a request.
//!
//! A campaign owns no status of its own. Whether it is a draft, under review or
//! live is read from the owning request, so the two can never disagree.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who can see a campaign once it is live
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Visibility {
    /// Only the proposer and approvers
    #[default]
    #[sea_orm(string_value = "PRIVATE")]
    Private,
    /// Listed for donors
    #[sea_orm(string_value = "PUBLIC")]
    Public,
}

/// Campaign database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    /// Unique identifier for the campaign
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning workflow request
    #[sea_orm(unique)]
    pub request_id: i64,
    /// Campaign title
    pub title: String,
    /// URL-safe unique identifier derived from the title by default
    #[sea_orm(unique)]
    pub slug: String,
    /// One-line summary
    pub short_description: String,
    /// Full description
    pub description: String,
    /// Optional category
    pub category_id: Option<i64>,
    /// Normalized, comma-separated tag list
    pub tags: String,
    /// Storage path of the cover image
    pub cover_image: Option<String>,
    /// Whether donors can see the campaign
    pub visibility: Visibility,
    /// Start of the donation window
    pub start_date: DateTimeUtc,
    /// Optional end of the donation window
    pub end_date: Option<DateTimeUtc>,
    /// IANA timezone the proposer entered dates in
    pub timezone_name: String,
    /// Fundraising goal
    pub goal_amount: Option<Decimal>,
    /// Smallest accepted donation
    pub minimum_donation_amount: Decimal,
    /// Largest accepted donation, unbounded when absent
    pub maximum_donation_amount: Option<Decimal>,
    /// When the campaign was created
    pub created_at: DateTimeUtc,
    /// When the campaign was last edited
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Tags split back into a list.
    #[must_use]
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(',').filter(|t| !t.is_empty()).collect()
    }

    /// Whether `now` falls inside `[start_date, end_date]`.
    #[must_use]
    pub fn is_in_active_window(&self, now: DateTimeUtc) -> bool {
        self.start_date <= now && self.end_date.is_none_or(|end| now <= end)
    }
}

/// Defines relationships between Campaign and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each campaign is governed by one request
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::RequestId",
        to = "super::request::Column::Id"
    )]
    Request,
    /// Each campaign may belong to one category
    #[sea_orm(
        belongs_to = "super::campaign_category::Entity",
        from = "Column::CategoryId",
        to = "super::campaign_category::Column::Id"
    )]
    Category,
    /// One campaign has many gallery images
    #[sea_orm(has_many = "super::campaign_image::Entity")]
    Gallery,
    /// One campaign has many donations
    #[sea_orm(has_many = "super::donation::Entity")]
    Donations,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl Related<super::campaign_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::campaign_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gallery.def()
    }
}

impl Related<super::donation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
