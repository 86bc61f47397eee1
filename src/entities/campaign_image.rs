//! Campaign image entity - ordered gallery entries for a campaign.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gallery image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaign_images")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Campaign the image belongs to
    pub campaign_id: i64,
    /// Storage path relative to the media root
    pub path: String,
    /// Position in the gallery, starting at 0
    pub position: i32,
}

/// Defines relationships between `CampaignImage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each image belongs to one campaign
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
