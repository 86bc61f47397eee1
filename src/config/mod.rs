/// Database configuration and connection management
pub mod database;

/// Application settings and category seeds loaded from config.toml
pub mod settings;

/// Approver configuration from config.toml and environment variables
pub mod users;
