use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{Validate, ValidationError, ValidationErrors};

/// 24-hour `HH:MM`
static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid time regex"));

/// A listing to compute, with an optional result size
///
/// `None` limits fall back to the configured default for the variant;
/// `Some(0)` always yields an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingRequest {
    Featured {
        limit: Option<usize>,
    },
    Popular {
        limit: Option<usize>,
    },
    ByLocation {
        city: Option<String>,
        state: Option<String>,
        limit: Option<usize>,
    },
    ByCategory {
        category: String,
        limit: Option<usize>,
    },
    CategoryCounts,
}

impl ListingRequest {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ListingRequest::Featured { .. } => "featured",
            ListingRequest::Popular { .. } => "popular",
            ListingRequest::ByLocation { .. } => "by_location",
            ListingRequest::ByCategory { .. } => "by_category",
            ListingRequest::CategoryCounts => "category_counts",
        }
    }

    /// Whether the listing is reordered by the caller's interests
    pub fn is_personalized(&self) -> bool {
        matches!(
            self,
            ListingRequest::Popular { .. } | ListingRequest::ByLocation { .. }
        )
    }
}

/// `?limit=` for featured and popular listings
///
/// Any non-negative size is accepted; non-numeric values fail to deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// `?city=&state=&limit=` for the nearby listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub limit: Option<u32>,
}

/// `?category=&limit=` for the per-category listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryQuery {
    #[validate(length(min = 1))]
    pub category: String,
    pub limit: Option<u32>,
}

impl LimitQuery {
    pub fn limit(&self) -> Option<usize> {
        self.limit.map(|l| l as usize)
    }
}

impl From<LocationQuery> for ListingRequest {
    fn from(query: LocationQuery) -> Self {
        ListingRequest::ByLocation {
            city: query.city,
            state: query.state,
            limit: query.limit.map(|l| l as usize),
        }
    }
}

impl From<CategoryQuery> for ListingRequest {
    fn from(query: CategoryQuery) -> Self {
        ListingRequest::ByCategory {
            category: query.category,
            limit: query.limit.map(|l| l as usize),
        }
    }
}

/// Event as submitted from the create-event form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventDraft {
    #[validate(length(min = 5, message = "Title must be at least 5 characters long"))]
    pub title: String,
    #[validate(length(min = 20, message = "Description must be at least 20 characters long"))]
    pub description: String,
    #[validate(length(min = 1, message = "Please select a category"))]
    pub category: String,
    #[serde(rename = "startDate", default)]
    #[validate(required(message = "Start date is required"))]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "endDate", default)]
    #[validate(required(message = "End date is required"))]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "startTime", default)]
    pub start_time: String,
    #[serde(rename = "endTime", default)]
    pub end_time: String,
}

impl EventDraft {
    /// Run the derived field rules plus the `HH:MM` checks on both times
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if !is_time_of_day(&self.start_time) {
            errors.add("start_time", time_error("Start time must be HH:MM"));
        }
        if !is_time_of_day(&self.end_time) {
            errors.add("end_time", time_error("End time must be HH:MM"));
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Whether `value` is a 24-hour `HH:MM` time
pub fn is_time_of_day(value: &str) -> bool {
    TIME_OF_DAY.is_match(value)
}

fn time_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("time_of_day");
    error.message = Some(Cow::Borrowed(message));
    error
}
