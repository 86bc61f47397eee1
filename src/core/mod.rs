/// Campaign drafting, editing, listing and publication
pub mod campaign;

/// Campaign category lookup and seeding
pub mod category;

/// Donation recording and campaign totals
pub mod donation;

/// Acting users and their capabilities
pub mod identity;

/// Lifecycle notifications
pub mod notify;

/// Generic request workflow: guarded transitions, audit trail and chat
pub mod request;

/// Image storage for campaign covers and galleries
pub mod storage;
