//! Spott Feed - event discovery feed service for the Spott app
//!
//! This library provides the listing queries behind the explore page:
//! featured, popular, nearby and per-category upcoming events plus
//! category counts, personalized by the caller's stored interests.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{EventFeed, FeedError, FeedOutcome, personalize, sort_by_popularity};
pub use models::{Event, UserProfile, CategoryCounts, FeedLimits, ListingRequest, EventDraft};
