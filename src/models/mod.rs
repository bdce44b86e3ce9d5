// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Event, UserProfile, CategoryCounts, FeedLimits};
pub use requests::{ListingRequest, LimitQuery, LocationQuery, CategoryQuery, EventDraft};
pub use responses::{EventListResponse, CategoryCountsResponse, DraftValidationResponse, HealthResponse, ErrorResponse};
