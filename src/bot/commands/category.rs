//! Category Discord commands - listing and adding campaign categories.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        core::category,
        errors::Result,
    };
    use std::fmt::Write;

    /// Campaign categories. Use the subcommands to list or add categories.
    #[poise::command(slash_command, subcommands("category_list", "category_add"))]
    pub async fn category(ctx: Context<'_>) -> Result<()> {
        ctx.say("Category commands: `/category list`, `/category add`.")
            .await?;
        Ok(())
    }

    /// Lists all campaign categories.
    #[poise::command(slash_command, rename = "list")]
    pub async fn category_list(ctx: Context<'_>) -> Result<()> {
        let categories = category::list_categories(&ctx.data().database).await?;
        if categories.is_empty() {
            ctx.say("📭 No categories defined yet.").await?;
            return Ok(());
        }

        let mut response = String::from("🗂️ **Categories:**\n");
        for c in &categories {
            if c.description.is_empty() {
                writeln!(response, "• {}", c.name)?;
            } else {
                writeln!(response, "• **{}** - {}", c.name, c.description)?;
            }
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Adds a campaign category. Approvers only.
    #[poise::command(slash_command, rename = "add")]
    pub async fn category_add(
        ctx: Context<'_>,
        #[description = "Category name"] name: String,
        #[description = "Short description"] description: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let actor = data.actor(ctx.author());
        let created = category::create_category(
            &data.database,
            &actor,
            &name,
            description.as_deref().unwrap_or_default(),
        )
        .await?;
        ctx.say(format!("✅ Added category **{}**.", created.name))
            .await?;
        Ok(())
    }
}

pub use inner::*;
