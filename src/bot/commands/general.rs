//! General Discord commands - ping, help, and other utility commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**CampaignBuddy Help**\n\
        Fundraising campaigns go through review before they are published.\n\n\
        **Donors**\n\
        • `/browse [search] [category] [sort] [page]` - Lists campaigns open for donations.\n\
        • `/view <slug>` - Shows one campaign.\n\
        • `/donate <slug> <amount> [currency] [display_name] [message]` - Donates.\n\n\
        **Proposers**\n\
        • `/campaign create` - Drafts a campaign.\n\
        • `/campaign edit`, `cover`, `gallery` - Changes a draft.\n\
        • `/campaign submit`, `withdraw`, `cancel` - Moves it through review.\n\
        • `/campaign list`, `show` - Your campaigns.\n\
        • `/campaign thread`, `message` - Talk with approvers while drafting or in review.\n\n\
        **Approvers**\n\
        • `/campaign approve`, `reject`, `activate`, `archive` - Review decisions.\n\
        • `/campaign publish_ready` - Publishes approved campaigns whose start date has passed.\n\
        • `/category add` - Adds a category.\n\n\
        **Utility**\n\
        • `/category list` - Shows categories.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
