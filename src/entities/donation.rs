//! Donation entity - a single contribution to a campaign.
//!
//! Donations are written once and never edited. Campaign totals are summed from
//! these rows on read rather than kept in a running counter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies a donation can be pledged in
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Currency {
    /// Indian rupee
    #[default]
    #[sea_orm(string_value = "INR")]
    Inr,
    /// US dollar
    #[sea_orm(string_value = "USD")]
    Usd,
    /// Euro
    #[sea_orm(string_value = "EUR")]
    Eur,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        })
    }
}

/// Donation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    /// Unique identifier for the donation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Campaign receiving the donation
    pub campaign_id: i64,
    /// Discord user ID of the donor, `None` for anonymous donations
    pub donor_id: Option<String>,
    /// Donated amount, always positive
    pub amount: Decimal,
    /// Currency of `amount`
    pub currency: Currency,
    /// Name shown publicly next to the donation
    pub display_name: Option<String>,
    /// Optional note from the donor
    pub message: Option<String>,
    /// When the donation was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Donation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each donation belongs to one campaign
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
