//! Campaign Discord commands - drafting, editing, review decisions and the request thread.
//!
//! Everything lives under `/campaign`. Proposers draft and edit their campaigns,
//! approvers review and publish them, and both can talk in the request thread
//! while the campaign is being written or reviewed.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::autocomplete, parse_amount},
        core::{
            campaign::{
                self, CampaignChanges, CampaignDetails, CampaignDetail, CampaignQuery,
                CampaignSort, NewCampaign, default_minimum_donation, parse_local_datetime,
            },
            request::{self, RequestAction},
            storage::Upload,
        },
        entities::{campaign::Visibility, request::RequestStatus},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Visibility choice offered in Discord
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum VisibilityChoice {
        #[name = "Private"]
        Private,
        #[name = "Public"]
        Public,
    }

    impl From<VisibilityChoice> for Visibility {
        fn from(value: VisibilityChoice) -> Self {
            match value {
                VisibilityChoice::Private => Self::Private,
                VisibilityChoice::Public => Self::Public,
            }
        }
    }

    /// Status filter offered in Discord
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum StatusChoice {
        #[name = "Draft"]
        Draft,
        #[name = "Pending review"]
        PendingReview,
        #[name = "Approved"]
        Approved,
        #[name = "Rejected"]
        Rejected,
        #[name = "Active"]
        Active,
        #[name = "Canceled"]
        Canceled,
        #[name = "Archived"]
        Archived,
    }

    impl From<StatusChoice> for RequestStatus {
        fn from(value: StatusChoice) -> Self {
            match value {
                StatusChoice::Draft => Self::Draft,
                StatusChoice::PendingReview => Self::PendingReview,
                StatusChoice::Approved => Self::Approved,
                StatusChoice::Rejected => Self::Rejected,
                StatusChoice::Active => Self::Active,
                StatusChoice::Canceled => Self::Canceled,
                StatusChoice::Archived => Self::Archived,
            }
        }
    }

    async fn download(attachment: &serenity::Attachment) -> Result<Upload> {
        let size = usize::try_from(attachment.size).unwrap_or(usize::MAX);
        if size > campaign::MAX_IMAGE_BYTES {
            return Err(Error::validation(
                "image",
                format!("'{}' is too large", attachment.filename),
            ));
        }
        Ok(Upload {
            filename: attachment.filename.clone(),
            bytes: attachment.download().await?,
        })
    }

    fn optional_amount(
        field: &'static str,
        input: Option<&str>,
    ) -> Result<Option<rust_decimal::Decimal>> {
        input
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_amount(field, s))
            .transpose()
    }

    fn money(amount: Option<rust_decimal::Decimal>) -> String {
        amount.map_or_else(|| "-".to_string(), |a| format!("{a:.2}"))
    }

    fn format_detail(detail: &CampaignDetail) -> Result<String> {
        let c = &detail.campaign;
        let mut out = format!("📋 **{}** (`{}`)\n", c.title, c.slug);
        writeln!(out, "📌 Status: **{}**", detail.status())?;
        if !c.short_description.is_empty() {
            writeln!(out, "_{}_", c.short_description)?;
        }
        writeln!(out, "🗂️ Category: {}", detail.category.as_deref().unwrap_or("-"))?;
        if !c.tags.is_empty() {
            writeln!(out, "🏷️ Tags: {}", c.tag_list().join(", "))?;
        }
        writeln!(
            out,
            "👁️ Visibility: {}",
            match c.visibility {
                Visibility::Private => "Private",
                Visibility::Public => "Public",
            }
        )?;
        writeln!(
            out,
            "📅 {} → {} ({})",
            c.start_date.format("%Y-%m-%d %H:%M UTC"),
            c.end_date.map_or_else(
                || "open-ended".to_string(),
                |d| d.format("%Y-%m-%d %H:%M UTC").to_string()
            ),
            c.timezone_name
        )?;
        writeln!(
            out,
            "🎯 Goal: {} | Min: {} | Max: {}",
            money(c.goal_amount),
            money(Some(c.minimum_donation_amount)),
            money(c.maximum_donation_amount)
        )?;
        writeln!(
            out,
            "💰 Raised: {:.2} from {} donation(s), {} donor(s)",
            detail.stats.amount_raised, detail.stats.donation_count, detail.stats.donor_count
        )?;
        if let Some(cover) = &c.cover_image {
            writeln!(out, "🖼️ Cover: `{cover}`")?;
        }
        if !detail.gallery.is_empty() {
            writeln!(out, "🖼️ Gallery: {} image(s)", detail.gallery.len())?;
        }
        if !c.description.is_empty() {
            write!(out, "\n{}", c.description)?;
        }
        Ok(out)
    }

    /// Campaign management. Use the subcommands to draft, review and publish campaigns.
    #[poise::command(
        slash_command,
        subcommands(
            "campaign_create",
            "campaign_edit",
            "campaign_cover",
            "campaign_gallery",
            "campaign_submit",
            "campaign_withdraw",
            "campaign_cancel",
            "campaign_approve",
            "campaign_reject",
            "campaign_activate",
            "campaign_archive",
            "campaign_publish_ready",
            "campaign_delete",
            "campaign_show",
            "campaign_list",
            "campaign_thread",
            "campaign_message"
        )
    )]
    pub async fn campaign(ctx: Context<'_>) -> Result<()> {
        ctx.say("Use a subcommand, e.g. `/campaign create` or `/campaign list`.")
            .await?;
        Ok(())
    }

    /// Drafts a new campaign. Dates are YYYY-MM-DD or YYYY-MM-DD HH:MM in the chosen timezone.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, rename = "create")]
    pub async fn campaign_create(
        ctx: Context<'_>,
        #[description = "Campaign title"] title: String,
        #[description = "One-line summary"] short_description: String,
        #[description = "Start date (YYYY-MM-DD [HH:MM])"] start: String,
        #[description = "End date (YYYY-MM-DD [HH:MM])"] end: Option<String>,
        #[description = "Full description"] description: Option<String>,
        #[description = "Category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Comma-separated tags"] tags: Option<String>,
        #[description = "Who can see it once live (default Private)"] visibility: Option<
            VisibilityChoice,
        >,
        #[description = "Timezone the dates are in"]
        #[autocomplete = "autocomplete::autocomplete_timezone"]
        timezone: Option<String>,
        #[description = "Fundraising goal"] goal: Option<String>,
        #[description = "Smallest donation (default 10.00)"] minimum: Option<String>,
        #[description = "Largest donation"] maximum: Option<String>,
        #[description = "Custom slug (generated from the title if empty)"] slug: Option<String>,
        #[description = "Cover image"] cover: Option<serenity::Attachment>,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let timezone_name = timezone.unwrap_or_else(|| data.config.default_timezone.clone());

        let details = CampaignDetails {
            title,
            short_description,
            description: description.unwrap_or_default(),
            category,
            tags: tags.unwrap_or_default(),
            visibility: visibility.map_or_else(Visibility::default, Into::into),
            start_date: parse_local_datetime("start_date", &start, &timezone_name)?,
            end_date: end
                .as_deref()
                .map(|e| parse_local_datetime("end_date", e, &timezone_name))
                .transpose()?,
            timezone_name,
            goal_amount: optional_amount("goal_amount", goal.as_deref())?,
            minimum_donation_amount: optional_amount(
                "minimum_donation_amount",
                minimum.as_deref(),
            )?
            .unwrap_or_else(default_minimum_donation),
            maximum_donation_amount: optional_amount(
                "maximum_donation_amount",
                maximum.as_deref(),
            )?,
        };

        ctx.defer().await?;
        let cover_image = match &cover {
            Some(attachment) => Some(download(attachment).await?),
            None => None,
        };

        let created = campaign::create_campaign(
            &data.database,
            &data.storage,
            data.notifier.as_ref(),
            &actor,
            NewCampaign {
                details,
                slug,
                cover_image,
                gallery: Vec::new(),
            },
        )
        .await?;

        ctx.say(format!(
            "✅ Drafted campaign **{}** (`{}`). Submit it with `/campaign submit` when it's ready.",
            created.title, created.slug
        ))
        .await?;
        Ok(())
    }

    /// Edits a draft campaign. Only the given fields change.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, rename = "edit")]
    pub async fn campaign_edit(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
        #[description = "New title"] title: Option<String>,
        #[description = "New summary"] short_description: Option<String>,
        #[description = "New description"] description: Option<String>,
        #[description = "New category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "New comma-separated tags"] tags: Option<String>,
        #[description = "New visibility"] visibility: Option<VisibilityChoice>,
        #[description = "New timezone (dates below are read in it)"]
        #[autocomplete = "autocomplete::autocomplete_timezone"]
        timezone: Option<String>,
        #[description = "New start date (YYYY-MM-DD [HH:MM])"] start: Option<String>,
        #[description = "New end date, or 'none' to remove it"] end: Option<String>,
        #[description = "New goal, or 'none' to remove it"] goal: Option<String>,
        #[description = "New minimum donation"] minimum: Option<String>,
        #[description = "New maximum donation, or 'none' to remove it"] maximum: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());

        let current = campaign::get_campaign_for_actor(&data.database, &actor, &slug).await?;
        let zone = timezone
            .clone()
            .unwrap_or_else(|| current.campaign.timezone_name.clone());
        let is_none = |s: &str| s.trim().eq_ignore_ascii_case("none");

        let changes = CampaignChanges {
            title,
            short_description,
            description,
            category: category.map(|c| Some(c).filter(|c| !is_none(c))),
            tags,
            visibility: visibility.map(Into::into),
            start_date: start
                .as_deref()
                .map(|s| parse_local_datetime("start_date", s, &zone))
                .transpose()?,
            end_date: match end.as_deref() {
                Some(e) if is_none(e) => Some(None),
                Some(e) => Some(Some(parse_local_datetime("end_date", e, &zone)?)),
                None => None,
            },
            timezone_name: timezone,
            goal_amount: match goal.as_deref() {
                Some(g) if is_none(g) => Some(None),
                Some(g) => Some(Some(parse_amount("goal_amount", g)?)),
                None => None,
            },
            minimum_donation_amount: optional_amount(
                "minimum_donation_amount",
                minimum.as_deref(),
            )?,
            maximum_donation_amount: match maximum.as_deref() {
                Some(m) if is_none(m) => Some(None),
                Some(m) => Some(Some(parse_amount("maximum_donation_amount", m)?)),
                None => None,
            },
        };

        let updated = campaign::update_campaign(&data.database, &actor, &slug, changes).await?;
        ctx.say(format!("✅ Updated **{}**.", updated.title)).await?;
        Ok(())
    }

    /// Replaces a draft campaign's cover image.
    #[poise::command(slash_command, rename = "cover")]
    pub async fn campaign_cover(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
        #[description = "Image file"] image: serenity::Attachment,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        ctx.defer().await?;
        let upload = download(&image).await?;
        campaign::set_cover_image(&data.database, &data.storage, &actor, &slug, upload).await?;
        ctx.say(format!("🖼️ Cover image updated for `{slug}`.")).await?;
        Ok(())
    }

    /// Adds an image to a draft campaign's gallery. Re-uploading a filename replaces it.
    #[poise::command(slash_command, rename = "gallery")]
    pub async fn campaign_gallery(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
        #[description = "Image file"] image: serenity::Attachment,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        ctx.defer().await?;
        let upload = download(&image).await?;
        campaign::add_gallery_image(&data.database, &data.storage, &actor, &slug, upload).await?;
        ctx.say(format!("🖼️ Added `{}` to the gallery of `{slug}`.", image.filename))
            .await?;
        Ok(())
    }

    async fn apply(ctx: Context<'_>, slug: &str, action: RequestAction) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let request = campaign::transition_campaign(
            &data.database,
            data.notifier.as_ref(),
            chrono::Utc::now(),
            &actor,
            slug,
            action,
        )
        .await?;
        ctx.say(format!("✅ `{slug}` is now **{}**.", request.status))
            .await?;
        Ok(())
    }

    /// Sends your draft campaign for review.
    #[poise::command(slash_command, rename = "submit")]
    pub async fn campaign_submit(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::SendForReview).await
    }

    /// Takes your campaign back from review into draft.
    #[poise::command(slash_command, rename = "withdraw")]
    pub async fn campaign_withdraw(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::SendForDraft).await
    }

    /// Cancels a campaign that is still in draft or review.
    #[poise::command(slash_command, rename = "cancel")]
    pub async fn campaign_cancel(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::Cancel).await
    }

    /// Approves a campaign under review. Public campaigns inside their dates go live at once.
    #[poise::command(slash_command, rename = "approve")]
    pub async fn campaign_approve(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::Approve).await
    }

    /// Rejects a campaign under review.
    #[poise::command(slash_command, rename = "reject")]
    pub async fn campaign_reject(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::Reject).await
    }

    /// Publishes an approved campaign.
    #[poise::command(slash_command, rename = "activate")]
    pub async fn campaign_activate(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::Activate).await
    }

    /// Closes an approved or active campaign.
    #[poise::command(slash_command, rename = "archive")]
    pub async fn campaign_archive(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        apply(ctx, &slug, RequestAction::Archive).await
    }

    /// Publishes every approved public campaign whose start date has passed.
    #[poise::command(slash_command, rename = "publish_ready")]
    pub async fn campaign_publish_ready(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let activated = campaign::activate_ready_campaigns(
            &data.database,
            data.notifier.as_ref(),
            chrono::Utc::now(),
            &actor,
        )
        .await?;

        if activated.is_empty() {
            ctx.say("ℹ️ No approved campaigns are ready to go live.").await?;
        } else {
            ctx.say(format!(
                "✅ Published {} campaign(s): {}",
                activated.len(),
                activated.iter().map(|s| format!("`{s}`")).collect::<Vec<_>>().join(", ")
            ))
            .await?;
        }
        Ok(())
    }

    /// Deletes a campaign and its images. Campaigns with donations are kept.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn campaign_delete(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        campaign::delete_campaign(&data.database, &data.storage, &actor, &slug).await?;
        ctx.say(format!("🗑️ Deleted campaign `{slug}`.")).await?;
        Ok(())
    }

    /// Shows a campaign you proposed, or any campaign if you are an approver.
    #[poise::command(slash_command, rename = "show")]
    pub async fn campaign_show(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let detail = campaign::get_campaign_for_actor(&data.database, &actor, &slug).await?;
        ctx.say(format_detail(&detail)?).await?;
        Ok(())
    }

    /// Lists your campaigns, or every campaign for approvers.
    #[poise::command(slash_command, rename = "list")]
    pub async fn campaign_list(
        ctx: Context<'_>,
        #[description = "Search title, description, category or status"] search: Option<String>,
        #[description = "Only this status"] status: Option<StatusChoice>,
        #[description = "Sort by title, category, status, start_date, end_date or goal_amount"]
        sort: Option<String>,
        #[description = "Sort descending"] descending: Option<bool>,
        #[description = "Page number"] page: Option<u64>,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let query = CampaignQuery {
            q: search,
            status: status.map(Into::into),
            sort: sort.as_deref().map_or_else(CampaignSort::default, CampaignSort::parse),
            descending: descending.unwrap_or(false),
            page: page.unwrap_or(1),
            ..Default::default()
        };

        let result = campaign::list_campaign_requests(&data.database, &actor, &query).await?;
        if result.items.is_empty() {
            ctx.say("📭 No campaigns found. Draft one with `/campaign create`.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("📋 **Campaigns:**\n\n");
        for summary in &result.items {
            writeln!(
                response,
                "• **{}** (`{}`) - {} | {} | goal {}",
                summary.campaign.title,
                summary.campaign.slug,
                summary.status,
                summary.category.as_deref().unwrap_or("uncategorized"),
                money(summary.campaign.goal_amount)
            )?;
        }
        write!(
            response,
            "\nPage {}/{} ({} total)",
            result.page, result.total_pages, result.total_items
        )?;
        ctx.say(response).await?;
        Ok(())
    }

    /// Shows the request thread, audit entries included.
    #[poise::command(slash_command, rename = "thread")]
    pub async fn campaign_thread(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let request_id = campaign::request_id_for_slug(&data.database, &actor, &slug).await?;
        let messages = request::list_messages(&data.database, &actor, request_id).await?;

        let mut response = format!("💬 **Thread for `{slug}`**\n\n");
        if messages.is_empty() {
            response.push_str("No messages yet.");
        }
        for message in &messages {
            writeln!(
                response,
                "`{}` <@{}>: {}",
                message.sent_at.format("%Y-%m-%d %H:%M"),
                message.sender_id,
                message.body
            )?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Posts a message in the request thread.
    #[poise::command(slash_command, rename = "message")]
    pub async fn campaign_message(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_own_campaign"]
        slug: String,
        #[description = "Message (up to 200 characters)"] text: String,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let request_id = campaign::request_id_for_slug(&data.database, &actor, &slug).await?;
        request::post_message(
            &data.database,
            data.notifier.as_ref(),
            &actor,
            request_id,
            &text,
        )
        .await?;
        ctx.say("💬 Message posted.").await?;
        Ok(())
    }
}

pub use inner::*;
