//! In-process stores backed by plain vectors.
//!
//! Used by the test suites and benches, and handy for running the service
//! locally against a seed file without an Appwrite project.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::{Event, UserProfile};
use crate::services::store::{EventStore, ProfileStore, StoreError};

/// Event store holding a fixed set of events
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: Vec<Event>,
    offline: AtomicBool,
}

impl MemoryEventStore {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            offline: AtomicBool::new(false),
        }
    }

    /// Load events from a JSON array on disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::Unavailable(format!("{}: {}", path.as_ref().display(), e))
        })?;
        let events: Vec<Event> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Integrity(format!("invalid seed file: {}", e)))?;
        tracing::info!("Loaded {} events from {}", events.len(), path.as_ref().display());
        Ok(Self::new(events))
    }

    /// Make every subsequent query fail with `StoreError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn upcoming(&self, floor: DateTime<Utc>) -> Result<Vec<Event>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(self
            .events
            .iter()
            .filter(|e| e.start_date >= floor)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn query_by_date_descending(
        &self,
        floor: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let mut events = self.upcoming(floor)?;
        events.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(events)
    }

    async fn query_by_category(
        &self,
        category: &str,
        floor: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let mut events = self.upcoming(floor)?;
        events.retain(|e| e.category == category);
        Ok(events)
    }

    async fn query_all(&self, floor: DateTime<Utc>) -> Result<Vec<Event>, StoreError> {
        self.upcoming(floor)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.offline.load(Ordering::SeqCst))
    }
}

/// Profile store holding a fixed set of users
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Vec<UserProfile>,
}

impl MemoryProfileStore {
    pub fn new(profiles: Vec<UserProfile>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_token_identifier(
        &self,
        token_identifier: &str,
    ) -> Result<Option<UserProfile>, StoreError> {
        let mut matches = self
            .profiles
            .iter()
            .filter(|p| p.token_identifier == token_identifier);

        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(StoreError::Integrity(format!(
                "multiple users for token {}",
                token_identifier
            )));
        }
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(id: &str, category: &str, start: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: None,
            category: category.to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            start_date: start,
            end_date: start + Duration::hours(2),
            registration_count: 0,
        }
    }

    #[tokio::test]
    async fn test_floor_excludes_past_events() {
        let now = Utc::now();
        let store = MemoryEventStore::new(vec![
            event("past", "music", now - Duration::days(1)),
            event("soon", "music", now + Duration::days(1)),
        ]);

        let events = store.query_all(now).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "soon");
    }

    #[tokio::test]
    async fn test_date_descending_order() {
        let now = Utc::now();
        let store = MemoryEventStore::new(vec![
            event("a", "music", now + Duration::days(1)),
            event("b", "music", now + Duration::days(3)),
            event("c", "music", now + Duration::days(2)),
        ]);

        let ids: Vec<_> = store
            .query_by_date_descending(now)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_category_is_case_sensitive() {
        let now = Utc::now();
        let store = MemoryEventStore::new(vec![
            event("a", "music", now + Duration::days(1)),
            event("b", "Music", now + Duration::days(1)),
        ]);

        let events = store.query_by_category("music", now).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "a");
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryEventStore::new(vec![]);
        store.set_offline(true);

        assert!(matches!(
            store.query_all(Utc::now()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(!store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_profiles_rejected() {
        let profile = UserProfile {
            id: "u1".to_string(),
            token_identifier: "issuer|user".to_string(),
            name: None,
            interests: None,
        };
        let mut twin = profile.clone();
        twin.id = "u2".to_string();

        let store = MemoryProfileStore::new(vec![profile, twin]);
        assert!(store.find_by_token_identifier("issuer|user").await.is_err());
        assert!(store.find_by_token_identifier("other").await.unwrap().is_none());
    }
}
