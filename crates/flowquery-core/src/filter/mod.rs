//! Saved filters.
//!
//! - [`json`] - Converting queries to and from their stored JSON form
//! - [`service`] - Storage and execution of saved filters

pub mod json;
pub mod service;

pub use json::{from_json, to_json};
pub use service::{FilterService, SavedFilter};
