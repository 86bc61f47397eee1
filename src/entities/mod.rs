//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod campaign;
pub mod campaign_category;
pub mod campaign_image;
pub mod donation;
pub mod request;
pub mod request_message;

// Re-export specific types to avoid conflicts
pub use campaign::{Column as CampaignColumn, Entity as Campaign, Model as CampaignModel};
pub use campaign_category::{
    Column as CampaignCategoryColumn, Entity as CampaignCategory, Model as CampaignCategoryModel,
};
pub use campaign_image::{
    Column as CampaignImageColumn, Entity as CampaignImage, Model as CampaignImageModel,
};
pub use donation::{Column as DonationColumn, Entity as Donation, Model as DonationModel};
pub use request::{Column as RequestColumn, Entity as Request, Model as RequestModel};
pub use request_message::{
    Column as RequestMessageColumn, Entity as RequestMessage, Model as RequestMessageModel,
};
