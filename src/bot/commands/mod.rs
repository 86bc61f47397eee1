//! Discord command implementations organized by audience.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Public browsing and donation commands
pub mod browse;

/// Campaign drafting, review and thread commands
pub mod campaign;

/// Category commands
pub mod category;

/// General utility commands
pub mod general;

pub use browse::*;
pub use campaign::*;
pub use category::*;
pub use general::*;
