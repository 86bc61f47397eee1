//! Public Discord commands - browsing live campaigns and donating.
//!
//! Only campaigns that are active, public and inside their date window are
//! visible here.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::autocomplete, parse_amount},
        core::{
            campaign::{self, PublicQuery, PublicSort},
            donation::{self, NewDonation},
        },
        entities::donation::Currency,
        errors::Result,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Sort order offered in Discord
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum SortChoice {
        #[name = "Newest"]
        New,
        #[name = "Ending soon"]
        EndSoon,
        #[name = "Highest goal"]
        GoalHigh,
        #[name = "Lowest goal"]
        GoalLow,
        #[name = "Most raised"]
        RaisedHigh,
        #[name = "Least raised"]
        RaisedLow,
        #[name = "Most donations"]
        Popular,
        #[name = "Title A-Z"]
        TitleAz,
        #[name = "Title Z-A"]
        TitleZa,
    }

    impl From<SortChoice> for PublicSort {
        fn from(value: SortChoice) -> Self {
            match value {
                SortChoice::New => Self::New,
                SortChoice::EndSoon => Self::EndSoon,
                SortChoice::GoalHigh => Self::GoalHigh,
                SortChoice::GoalLow => Self::GoalLow,
                SortChoice::RaisedHigh => Self::RaisedHigh,
                SortChoice::RaisedLow => Self::RaisedLow,
                SortChoice::Popular => Self::Popular,
                SortChoice::TitleAz => Self::TitleAz,
                SortChoice::TitleZa => Self::TitleZa,
            }
        }
    }

    /// Currency offered in Discord
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum CurrencyChoice {
        #[name = "INR"]
        Inr,
        #[name = "USD"]
        Usd,
        #[name = "EUR"]
        Eur,
    }

    impl From<CurrencyChoice> for Currency {
        fn from(value: CurrencyChoice) -> Self {
            match value {
                CurrencyChoice::Inr => Self::Inr,
                CurrencyChoice::Usd => Self::Usd,
                CurrencyChoice::Eur => Self::Eur,
            }
        }
    }

    /// Browses campaigns that are open for donations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn browse(
        ctx: Context<'_>,
        #[description = "Search words"] search: Option<String>,
        #[description = "Category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "Sort order"] sort: Option<SortChoice>,
        #[description = "Page number"] page: Option<u64>,
    ) -> Result<()> {
        let query = PublicQuery {
            q: search,
            category,
            sort: sort.map(Into::into).unwrap_or_default(),
            page: page.unwrap_or(1),
        };
        let result =
            campaign::list_public_campaigns(&ctx.data().database, chrono::Utc::now(), &query)
                .await?;

        if result.items.is_empty() {
            ctx.say("📭 No campaigns are open for donations right now.")
                .await?;
            return Ok(());
        }

        let fields: Vec<(String, String, bool)> = result
            .items
            .iter()
            .map(|item| {
                let c = &item.campaign;
                let goal = c
                    .goal_amount
                    .map_or_else(String::new, |g| format!(" of {g:.2}"));
                let ends = c.end_date.map_or_else(
                    || "no end date".to_string(),
                    |d| format!("ends {}", d.format("%Y-%m-%d")),
                );
                (
                    format!("{} (`{}`)", c.title, c.slug),
                    format!(
                        "{}\n💰 {:.2}{goal} raised · {} donation(s) · {ends}",
                        c.short_description, item.stats.amount_raised, item.stats.donation_count
                    ),
                    false,
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("🌱 Open campaigns")
            .color(0x0034_98DB)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{} · {} campaign(s)",
                result.page, result.total_pages, result.total_items
            )));
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows a campaign that is open for donations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn view(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_public_campaign"]
        slug: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let detail = campaign::get_public_campaign(db, chrono::Utc::now(), &slug).await?;
        let c = &detail.campaign;

        let mut body = String::new();
        if !c.short_description.is_empty() {
            writeln!(body, "_{}_\n", c.short_description)?;
        }
        writeln!(body, "{}", c.description)?;
        writeln!(
            body,
            "\n💰 Raised **{:.2}**{} from {} donor(s)",
            detail.stats.amount_raised,
            c.goal_amount.map_or_else(String::new, |g| format!(" of {g:.2}")),
            detail.stats.donor_count
        )?;
        writeln!(
            body,
            "💸 Donations from {:.2}{}",
            c.minimum_donation_amount,
            c.maximum_donation_amount
                .map_or_else(String::new, |m| format!(" up to {m:.2}"))
        )?;
        if let Some(category) = &detail.category {
            writeln!(body, "🗂️ {category}")?;
        }

        let recent = donation::list_donations(db, c.id).await?;
        if !recent.is_empty() {
            body.push_str("\n**Recent supporters**\n");
            for d in recent.iter().take(5) {
                writeln!(
                    body,
                    "• {}: {:.2} {}{}",
                    d.display_name.as_deref().unwrap_or("Anonymous"),
                    d.amount,
                    d.currency,
                    d.message
                        .as_deref()
                        .map_or_else(String::new, |m| format!(" - \"{m}\""))
                )?;
            }
        }

        let embed = serenity::CreateEmbed::default()
            .title(format!("{} (`{}`)", c.title, c.slug))
            .description(body)
            .color(0x0034_98DB);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Donates to a campaign that is open for donations.
    #[poise::command(slash_command)]
    pub async fn donate(
        ctx: Context<'_>,
        #[description = "Campaign slug"]
        #[autocomplete = "autocomplete::autocomplete_public_campaign"]
        slug: String,
        #[description = "Amount, e.g. 500 or 99.50"] amount: String,
        #[description = "Currency (default INR)"] currency: Option<CurrencyChoice>,
        #[description = "Name to show with your donation"] display_name: Option<String>,
        #[description = "A note for the campaign"] message: Option<String>,
        #[description = "Hide your Discord account from the campaign"] anonymous: Option<bool>,
    ) -> Result<()> {
        let data = ctx.data();
        let input = NewDonation {
            donor_id: Some(ctx.author().id.to_string()).filter(|_| !anonymous.unwrap_or(false)),
            amount: parse_amount("amount", &amount)?,
            currency: currency.map(Into::into).unwrap_or_default(),
            display_name,
            message,
        };

        let recorded = donation::submit_donation(
            &data.database,
            data.notifier.as_ref(),
            chrono::Utc::now(),
            &slug,
            input,
        )
        .await?;

        ctx.say(format!(
            "💚 Thank you! Your donation of **{:.2} {}** to `{slug}` was recorded.",
            recorded.amount, recorded.currency
        ))
        .await?;
        Ok(())
    }
}

pub use inner::*;
