//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the campaign workflow into Discord: slash commands,
//! autocomplete handlers, the shared bot context and the framework setup.

/// Discord command implementations (campaigns, browsing, donations, categories, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::{settings::Config, users::ApproverList},
    core::{identity::Actor, notify::Notifier, storage::LocalStorage},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use tracing::{error, info, instrument, warn};

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Where lifecycle notifications go
    pub notifier: Box<dyn Notifier>,
    /// Image storage for covers and galleries
    pub storage: LocalStorage,
    /// Users allowed to review campaigns
    pub approvers: ApproverList,
    /// Loaded application settings
    pub config: Config,
}

impl BotData {
    /// Creates the bot context from its parts.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        notifier: Box<dyn Notifier>,
        approvers: ApproverList,
        config: Config,
    ) -> Self {
        Self {
            database,
            notifier,
            storage: LocalStorage::new(&config.media_root),
            approvers,
            config,
        }
    }

    /// The invoking user with their resolved capability.
    #[must_use]
    pub fn actor(&self, user: &serenity::User) -> Actor {
        Actor::resolve(user.id.to_string(), &self.approvers)
    }
}

/// Parses a user-entered amount such as `1500` or `99.50`.
pub fn parse_amount(field: &'static str, input: &str) -> Result<Decimal> {
    let cleaned = input.trim().replace(',', "");
    Decimal::from_str(&cleaned)
        .map_err(|_| Error::validation(field, format!("'{}' is not a number", input.trim())))
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            match &error {
                Error::Validation { .. }
                | Error::PermissionDenied
                | Error::InvalidStateTransition { .. }
                | Error::NotFound { .. }
                | Error::ConcurrentModification => {
                    warn!("Command `{}` refused: {error}", ctx.command().name);
                }
                _ => error!("Error in command `{}`: {error:?}", ctx.command().name),
            }
            let reply = poise::CreateReply::default()
                .content(format!("❌ {}", error.user_message()))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::campaign(),
                commands::browse(),
                commands::view(),
                commands::donate(),
                commands::category(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}
