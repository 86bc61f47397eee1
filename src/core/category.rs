//! Campaign category business logic - lookup, creation and seeding from config.

use crate::{
    config::settings::CategoryConfig,
    core::identity::{Actor, is_approval_user},
    entities::{CampaignCategory, campaign_category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Returns all categories ordered alphabetically by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<campaign_category::Model>> {
    CampaignCategory::find()
        .order_by_asc(campaign_category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by its exact name.
pub async fn get_category_by_name<C>(db: &C, name: &str) -> Result<Option<campaign_category::Model>>
where
    C: ConnectionTrait,
{
    CampaignCategory::find()
        .filter(campaign_category::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new category. Only approvers may extend the taxonomy.
pub async fn create_category(
    db: &DatabaseConnection,
    actor: &Actor,
    name: &str,
    description: &str,
) -> Result<campaign_category::Model> {
    if !is_approval_user(actor) {
        return Err(Error::PermissionDenied);
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "cannot be empty"));
    }
    if name.chars().count() > 100 {
        return Err(Error::validation("name", "must be at most 100 characters"));
    }
    if get_category_by_name(db, name).await?.is_some() {
        return Err(Error::validation("name", format!("category '{name}' already exists")));
    }

    let category = campaign_category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(category = %category.name, "created campaign category");
    Ok(category)
}

/// Inserts any configured categories that do not exist yet.
///
/// Returns the number of categories created.
pub async fn seed_categories(
    db: &DatabaseConnection,
    categories: &[CategoryConfig],
) -> Result<usize> {
    let mut created = 0;
    for config in categories {
        if get_category_by_name(db, &config.name).await?.is_some() {
            continue;
        }
        campaign_category::ActiveModel {
            name: Set(config.name.trim().to_string()),
            description: Set(config.description.clone().unwrap_or_default()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created += 1;
    }
    if created > 0 {
        info!(created, "seeded campaign categories");
    }
    Ok(created)
}
