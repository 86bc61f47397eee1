//! Discord interaction handlers
//!
//! Handlers for Discord interactions that are not commands themselves.

/// Autocomplete handlers for campaign slugs, categories and timezones
pub mod autocomplete;
