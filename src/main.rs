use campaign_buddy::{
    bot::{self, BotData},
    config::{self, users::ApproverList},
    core::{category, notify::LogNotifier},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml, falling back to defaults when it is missing
    let mut app_config = match config::settings::load_default_config() {
        Ok(config) => config,
        Err(e) if std::path::Path::new("config.toml").exists() => {
            error!("Invalid config.toml: {e}");
            return Err(e);
        }
        Err(_) => {
            info!("No config.toml found, using defaults.");
            config::settings::Config::default()
        }
    };

    if let Ok(root) = env::var("MEDIA_ROOT") {
        app_config.media_root = root;
    }

    let approvers = ApproverList::from_env(&app_config.approvers);
    if approvers.is_empty() {
        info!("No approvers configured; campaigns cannot be reviewed until some are added.");
    }

    // 4. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed categories from config
    category::seed_categories(&db, &app_config.categories)
        .await
        .inspect_err(|e| error!("Failed to seed categories: {e}"))?;

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(db, Box::new(LogNotifier), approvers, app_config);
    bot::run_bot(token, data).await
}
