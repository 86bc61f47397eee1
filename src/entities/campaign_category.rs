//! Campaign category entity - taxonomy used to group campaigns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Campaign category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaign_categories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across categories
    #[sea_orm(unique)]
    pub name: String,
    /// Optional longer description
    pub description: String,
}

/// Defines relationships between `CampaignCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category groups many campaigns
    #[sea_orm(has_many = "super::campaign::Entity")]
    Campaigns,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
