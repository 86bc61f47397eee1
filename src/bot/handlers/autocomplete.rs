//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are best-effort: a failed lookup yields no suggestions rather
//! than an error.

use crate::{
    bot::Context,
    core::{
        campaign::{self, ALLOWED_TIMEZONES, CampaignQuery, PublicQuery},
        category,
    },
};

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

fn filter_matching(candidates: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = candidates
        .into_iter()
        .filter(|c| c.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect();
    matching.sort();
    matching
}

/// Suggests slugs of campaigns the invoking user can manage.
///
/// Approvers get every campaign; members get their own.
pub async fn autocomplete_own_campaign(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let data = ctx.data();
    let actor = data.actor(ctx.author());
    let query = CampaignQuery {
        q: Some(partial.to_string()).filter(|p| !p.trim().is_empty()),
        page_size: MAX_SUGGESTIONS as u64,
        ..Default::default()
    };

    let Ok(page) = campaign::list_campaign_requests(&data.database, &actor, &query).await else {
        return Vec::new();
    };
    filter_matching(page.items.into_iter().map(|s| s.campaign.slug), "")
}

/// Suggests slugs of campaigns currently open to donors.
pub async fn autocomplete_public_campaign(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let query = PublicQuery {
        q: Some(partial.to_string()).filter(|p| !p.trim().is_empty()),
        page: 1,
        ..Default::default()
    };
    let Ok(page) =
        campaign::list_public_campaigns(&ctx.data().database, chrono::Utc::now(), &query).await
    else {
        return Vec::new();
    };
    filter_matching(page.items.into_iter().map(|c| c.campaign.slug), "")
}

/// Suggests existing category names.
pub async fn autocomplete_category(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(categories) = category::list_categories(&ctx.data().database).await else {
        return Vec::new();
    };
    filter_matching(categories.into_iter().map(|c| c.name), partial)
}

/// Suggests supported timezones.
pub async fn autocomplete_timezone(_ctx: Context<'_>, partial: &str) -> Vec<String> {
    filter_matching(ALLOWED_TIMEZONES.iter().map(|tz| (*tz).to_string()), partial)
}
