use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::core::{
    counts::count_by_category,
    filters::{retain_upcoming, LocationFilter},
    ranking::{apply_limit, personalize, sort_by_popularity},
};
use crate::models::{CategoryCounts, Event, FeedLimits, ListingRequest};
use crate::services::{EventStore, IdentityResolver, StoreError};

/// Errors returned by the feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FeedError {
    /// Whether the caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Validation(_) => false,
            FeedError::Store(e) => e.is_retryable(),
        }
    }
}

/// Result of a listing
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    Events(Vec<Event>),
    Counts(CategoryCounts),
}

/// Event feed query service
///
/// Every listing only ever contains events starting at or after the moment
/// the request is handled.
///
/// # Listings
/// - Featured: date-descending fetch, then most registrations first
/// - Popular: most registrations first, truncated, then personalized
/// - ByLocation: city or state filter, personalized, then truncated
/// - ByCategory: exact category match, truncated
/// - CategoryCounts: upcoming events per category
#[derive(Clone)]
pub struct EventFeed {
    events: Arc<dyn EventStore>,
    identity: Arc<dyn IdentityResolver>,
    limits: FeedLimits,
}

impl EventFeed {
    pub fn new(
        events: Arc<dyn EventStore>,
        identity: Arc<dyn IdentityResolver>,
        limits: FeedLimits,
    ) -> Self {
        Self {
            events,
            identity,
            limits,
        }
    }

    pub fn limits(&self) -> FeedLimits {
        self.limits
    }

    pub fn event_store(&self) -> &Arc<dyn EventStore> {
        &self.events
    }

    /// Run a listing as of the current instant
    pub async fn execute(
        &self,
        request: ListingRequest,
        caller_token: Option<&str>,
    ) -> Result<FeedOutcome, FeedError> {
        self.execute_at(request, caller_token, Utc::now()).await
    }

    /// Run a listing as of `now`
    pub async fn execute_at(
        &self,
        request: ListingRequest,
        caller_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FeedOutcome, FeedError> {
        let kind = request.kind();

        let outcome = match request {
            ListingRequest::Featured { limit } => FeedOutcome::Events(self.featured(limit, now).await?),
            ListingRequest::Popular { limit } => {
                FeedOutcome::Events(self.popular(limit, caller_token, now).await?)
            }
            ListingRequest::ByLocation { city, state, limit } => FeedOutcome::Events(
                self.by_location(city.as_deref(), state.as_deref(), limit, caller_token, now)
                    .await?,
            ),
            ListingRequest::ByCategory { category, limit } => {
                FeedOutcome::Events(self.by_category(&category, limit, now).await?)
            }
            ListingRequest::CategoryCounts => FeedOutcome::Counts(self.category_counts(now).await?),
        };

        match &outcome {
            FeedOutcome::Events(events) => {
                tracing::debug!("Listing {} returned {} events", kind, events.len());
            }
            FeedOutcome::Counts(counts) => {
                tracing::debug!("Listing {} returned {} categories", kind, counts.len());
            }
        }

        Ok(outcome)
    }

    async fn featured(
        &self,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, FeedError> {
        let mut events = self.events.query_by_date_descending(now).await?;
        retain_upcoming(&mut events, now);
        sort_by_popularity(&mut events);
        apply_limit(&mut events, limit.unwrap_or(self.limits.featured));
        Ok(events)
    }

    /// Truncated before personalizing
    async fn popular(
        &self,
        limit: Option<usize>,
        caller_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, FeedError> {
        let mut events = self.events.query_all(now).await?;
        retain_upcoming(&mut events, now);
        sort_by_popularity(&mut events);
        apply_limit(&mut events, limit.unwrap_or(self.limits.popular));
        if !events.is_empty() {
            let interests = self.caller_interests(caller_token).await?;
            personalize(&mut events, &interests);
        }
        Ok(events)
    }

    /// Personalized before truncating
    async fn by_location(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        limit: Option<usize>,
        caller_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, FeedError> {
        let mut events = self.events.query_all(now).await?;
        retain_upcoming(&mut events, now);
        LocationFilter::new(city, state).apply(&mut events);
        if !events.is_empty() {
            let interests = self.caller_interests(caller_token).await?;
            personalize(&mut events, &interests);
        }
        apply_limit(&mut events, limit.unwrap_or(self.limits.by_location));
        Ok(events)
    }

    async fn by_category(
        &self,
        category: &str,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, FeedError> {
        if category.is_empty() {
            return Err(FeedError::Validation("category must not be empty".into()));
        }
        let mut events = self.events.query_by_category(category, now).await?;
        retain_upcoming(&mut events, now);
        events.retain(|e| e.category == category);
        apply_limit(&mut events, limit.unwrap_or(self.limits.by_category));
        Ok(events)
    }

    async fn category_counts(&self, now: DateTime<Utc>) -> Result<CategoryCounts, FeedError> {
        let mut events = self.events.query_all(now).await?;
        retain_upcoming(&mut events, now);
        Ok(count_by_category(&events))
    }

    /// Interest list of the caller, empty when anonymous
    async fn caller_interests(&self, caller_token: Option<&str>) -> Result<Vec<String>, FeedError> {
        let token = match caller_token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return Ok(Vec::new()),
        };

        let interests = self
            .identity
            .resolve_identity(token)
            .await?
            .and_then(|profile| profile.interests)
            .unwrap_or_default();

        Ok(interests)
    }

    pub async fn get_featured_events(&self, limit: Option<usize>) -> Result<Vec<Event>, FeedError> {
        self.featured(limit, Utc::now()).await
    }

    pub async fn get_popular_events(
        &self,
        limit: Option<usize>,
        caller_token: Option<&str>,
    ) -> Result<Vec<Event>, FeedError> {
        self.popular(limit, caller_token, Utc::now()).await
    }

    pub async fn get_events_by_location(
        &self,
        city: Option<String>,
        state: Option<String>,
        limit: Option<usize>,
        caller_token: Option<&str>,
    ) -> Result<Vec<Event>, FeedError> {
        self.by_location(city.as_deref(), state.as_deref(), limit, caller_token, Utc::now())
            .await
    }

    pub async fn get_events_by_category(
        &self,
        category: String,
        limit: Option<usize>,
    ) -> Result<Vec<Event>, FeedError> {
        self.by_category(&category, limit, Utc::now()).await
    }

    pub async fn get_category_counts(&self) -> Result<CategoryCounts, FeedError> {
        self.category_counts(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::services::MemoryEventStore;
    use async_trait::async_trait;
    use chrono::Duration;

    /// Treats the raw token as the profile id
    struct FixedIdentity(Vec<UserProfile>);

    #[async_trait]
    impl IdentityResolver for FixedIdentity {
        async fn resolve_identity(&self, token: &str) -> Result<Option<UserProfile>, StoreError> {
            Ok(self.0.iter().find(|p| p.id == token).cloned())
        }
    }

    fn create_event(id: &str, category: &str, city: &str, registrations: u32, days: i64) -> Event {
        let start = Utc::now() + Duration::days(days);
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: None,
            category: category.to_string(),
            city: city.to_string(),
            state: "TX".to_string(),
            start_date: start,
            end_date: start + Duration::hours(2),
            registration_count: registrations,
        }
    }

    fn feed(events: Vec<Event>) -> EventFeed {
        let music_fan = UserProfile {
            id: "music-fan".to_string(),
            token_identifier: "test|music-fan".to_string(),
            name: None,
            interests: Some(vec!["music".to_string()]),
        };
        EventFeed::new(
            Arc::new(MemoryEventStore::new(events)),
            Arc::new(FixedIdentity(vec![music_fan])),
            FeedLimits::default(),
        )
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_popular_personalized_after_truncation() {
        let feed = feed(vec![
            create_event("E1", "music", "Austin", 10, 1),
            create_event("E2", "tech", "Austin", 50, 2),
            create_event("E3", "music", "Austin", 5, 3),
            create_event("E4", "music", "Austin", 1, 4),
        ]);

        let anonymous = feed.get_popular_events(Some(3), None).await.unwrap();
        assert_eq!(ids(&anonymous), vec!["E2", "E1", "E3"]);

        let personal = feed
            .get_popular_events(Some(3), Some("music-fan"))
            .await
            .unwrap();
        assert_eq!(ids(&personal), vec!["E1", "E3", "E2"]);
    }

    #[tokio::test]
    async fn test_by_location_personalized_before_truncation() {
        let feed = feed(vec![
            create_event("T1", "tech", "Austin", 0, 1),
            create_event("T2", "tech", "Austin", 0, 2),
            create_event("M1", "music", "Austin", 0, 3),
        ]);

        let events = feed
            .get_events_by_location(Some("austin".into()), None, Some(1), Some("music-fan"))
            .await
            .unwrap();
        assert_eq!(ids(&events), vec!["M1"]);
    }

    #[tokio::test]
    async fn test_empty_category_rejected() {
        let feed = feed(vec![]);
        let err = feed.get_events_by_category(String::new(), None).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_store_failure_is_retryable() {
        let store = Arc::new(MemoryEventStore::new(vec![]));
        store.set_offline(true);
        let feed = EventFeed::new(store, Arc::new(FixedIdentity(vec![])), FeedLimits::default());

        let err = feed.get_category_counts().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_wrappers_match_dispatch() {
        let feed = feed(vec![
            create_event("E1", "music", "Austin", 10, 1),
            create_event("E2", "tech", "Dallas", 50, 2),
        ]);

        let counts = feed.get_category_counts().await.unwrap();
        let featured = feed.get_featured_events(None).await.unwrap();

        assert_eq!(
            feed.execute(ListingRequest::CategoryCounts, None).await.unwrap(),
            FeedOutcome::Counts(counts)
        );
        assert_eq!(
            feed.execute(ListingRequest::Featured { limit: None }, None)
                .await
                .unwrap(),
            FeedOutcome::Events(featured)
        );
    }

    #[tokio::test]
    async fn test_execute_at_uses_given_instant() {
        let feed = feed(vec![
            create_event("soon", "music", "Austin", 0, 1),
            create_event("later", "music", "Austin", 0, 10),
        ]);

        let outcome = feed
            .execute_at(
                ListingRequest::CategoryCounts,
                None,
                Utc::now() + Duration::days(5),
            )
            .await
            .unwrap();

        match outcome {
            FeedOutcome::Counts(counts) => assert_eq!(counts["music"], 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
