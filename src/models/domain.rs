use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event as stored in the `events` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "$id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
    #[serde(rename = "registrationCount", default)]
    pub registration_count: u32,
}

impl Event {
    /// Whether the event starts at or after `now`
    #[inline]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_date >= now
    }
}

/// Signed-in user profile from the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "$id", alias = "id")]
    pub id: String,
    #[serde(rename = "tokenIdentifier")]
    pub token_identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Preferred categories, most preferred first
    #[serde(default)]
    pub interests: Option<Vec<String>>,
}

impl UserProfile {
    /// Interest list, empty when the user never picked any
    pub fn interests(&self) -> &[String] {
        self.interests.as_deref().unwrap_or(&[])
    }
}

/// Number of upcoming events per category
pub type CategoryCounts = BTreeMap<String, usize>;

/// Default result sizes for each listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLimits {
    pub featured: usize,
    pub popular: usize,
    pub by_location: usize,
    pub by_category: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            featured: 3,
            popular: 6,
            by_location: 4,
            by_category: 12,
        }
    }
}
