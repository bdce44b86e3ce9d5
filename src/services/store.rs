use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Event, UserProfile};
use crate::services::appwrite::AppwriteError;

/// Errors surfaced by any backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Appwrite error: {0}")]
    Appwrite(#[from] AppwriteError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl StoreError {
    /// Transient failures: the store could not be reached or failed on its side.
    /// Rejected credentials and malformed or inconsistent data are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Appwrite(AppwriteError::RequestError(_) | AppwriteError::ApiError(_)) => {
                true
            }
            StoreError::Appwrite(AppwriteError::Unauthorized | AppwriteError::InvalidResponse(_)) => {
                false
            }
            StoreError::Integrity(_) => false,
        }
    }
}

/// Read access to the `events` collection
///
/// Every method only returns events whose start date is at or after `floor`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Upcoming events, newest start date first
    async fn query_by_date_descending(
        &self,
        floor: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError>;

    /// Upcoming events with exactly this category
    async fn query_by_category(
        &self,
        category: &str,
        floor: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError>;

    /// Upcoming events in no particular order
    async fn query_all(&self, floor: DateTime<Utc>) -> Result<Vec<Event>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Read access to the `users` collection
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_token_identifier(
        &self,
        token_identifier: &str,
    ) -> Result<Option<UserProfile>, StoreError>;
}

/// Maps an opaque caller token to a stored profile
///
/// `Ok(None)` means the caller is anonymous for ranking purposes.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(
        &self,
        caller_token: &str,
    ) -> Result<Option<UserProfile>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_failures_are_retryable() {
        assert!(StoreError::Unavailable("down".into()).is_retryable());
        assert!(StoreError::from(AppwriteError::ApiError("502".into())).is_retryable());

        assert!(!StoreError::from(AppwriteError::Unauthorized).is_retryable());
        assert!(!StoreError::from(AppwriteError::InvalidResponse("no documents".into())).is_retryable());
        assert!(!StoreError::Integrity("two users".into()).is_retryable());
    }
}
