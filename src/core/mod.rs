// Core feed exports
pub mod counts;
pub mod feed;
pub mod filters;
pub mod ranking;

pub use counts::count_by_category;
pub use feed::{EventFeed, FeedError, FeedOutcome};
pub use filters::{retain_upcoming, LocationFilter};
pub use ranking::{apply_limit, interest_rank, personalize, sort_by_popularity};
