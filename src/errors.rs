//! Unified error type for campaign workflow operations.
//!
//! Validation and lookup failures carry enough detail for logs, while
//! [`Error::user_message`] gives the text that is safe to show in Discord.

use crate::core::request::RequestAction;
use crate::entities::request::RequestStatus;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Entity data rejected at construction or save time
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// Guard predicate failed for the acting user
    #[error("Permission denied")]
    PermissionDenied,

    /// Action attempted from a status outside its valid source states
    #[error("Cannot {action} a request in {from} status")]
    InvalidStateTransition {
        /// Status the request was in
        from: RequestStatus,
        /// Attempted action
        action: RequestAction,
    },

    /// Entity is absent or not visible to the caller
    #[error("{entity} not found")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
    },

    /// Another operation changed the request first
    #[error("Request was modified concurrently")]
    ConcurrentModification,

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting into a reply buffer failed
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// Serenity/Poise framework error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Text shown to Discord users.
    ///
    /// Permission and state failures collapse into one message so callers
    /// cannot probe which check failed. Infrastructure errors are not leaked.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => format!("Invalid {field}: {message}"),
            Self::PermissionDenied | Self::InvalidStateTransition { .. } => {
                "This action is not allowed.".to_string()
            }
            Self::NotFound { entity } => format!("{entity} not found."),
            Self::ConcurrentModification => {
                "Someone else updated this request at the same time. Please try again.".to_string()
            }
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Format(_)
            | Self::Framework(_) => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_and_state_errors_share_message() {
        let denied = Error::PermissionDenied;
        let wrong_state = Error::InvalidStateTransition {
            from: RequestStatus::Approved,
            action: RequestAction::SendForReview,
        };
        assert_eq!(denied.user_message(), wrong_state.user_message());
    }

    #[test]
    fn test_infrastructure_errors_are_not_leaked() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk I/O".to_string()));
        assert!(!err.user_message().contains("disk"));
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = Error::validation("slug", "already in use");
        assert_eq!(err.user_message(), "Invalid slug: already in use");
    }
}
