use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Event, UserProfile};
use crate::services::store::{EventStore, ProfileStore, StoreError};

/// Largest page Appwrite will return for a list call
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or project")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub events: String,
    pub users: String,
}

/// Appwrite API client
///
/// Reads the `events` and `users` collections through the documents list
/// endpoint, following `cursorAfter` until every matching document is fetched.
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
    page_size: usize,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the page size used when listing documents
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn documents_url(&self, collection: &str, queries: &[String]) -> String {
        let url = format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        );

        if queries.is_empty() {
            return url;
        }

        let params = queries
            .iter()
            .map(|q| format!("queries%5B%5D={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", url, params)
    }

    /// Fetch one page of raw documents
    async fn fetch_page(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<Value>, AppwriteError> {
        let url = self.documents_url(collection, queries);
        tracing::debug!("Listing documents: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppwriteError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to list {}: {} - {}", collection, status, body);
            return Err(AppwriteError::ApiError(format!(
                "Failed to list {}: {}",
                collection, status
            )));
        }

        let mut json: Value = response.json().await?;

        match json.get_mut("documents").map(Value::take) {
            Some(Value::Array(documents)) => Ok(documents),
            _ => Err(AppwriteError::InvalidResponse("Missing documents array".into())),
        }
    }

    /// Fetch every document matching `queries`, page by page
    async fn list_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: Vec<String>,
    ) -> Result<Vec<T>, AppwriteError> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut page_queries = queries.clone();
            page_queries.push(query_limit(self.page_size));
            if let Some(after) = &cursor {
                page_queries.push(query_cursor_after(after));
            }

            let documents = self.fetch_page(collection, &page_queries).await?;
            let page_len = documents.len();

            let last_id = documents
                .last()
                .and_then(|d| d.get("$id"))
                .and_then(Value::as_str)
                .map(str::to_string);

            for doc in documents {
                results.push(parse_document(doc)?);
            }

            if page_len < self.page_size || last_id.is_none() || last_id == cursor {
                break;
            }
            cursor = last_id;
        }

        tracing::debug!("Fetched {} documents from {}", results.len(), collection);
        Ok(results)
    }
}

#[async_trait]
impl EventStore for AppwriteClient {
    async fn query_by_date_descending(
        &self,
        floor: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let queries = vec![
            query_start_date_floor(floor),
            query_order_desc("startDate"),
        ];
        Ok(self.list_all(&self.collections.events, queries).await?)
    }

    async fn query_by_category(
        &self,
        category: &str,
        floor: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let queries = vec![
            query_equal("category", category),
            query_start_date_floor(floor),
        ];
        Ok(self.list_all(&self.collections.events, queries).await?)
    }

    async fn query_all(&self, floor: DateTime<Utc>) -> Result<Vec<Event>, StoreError> {
        let queries = vec![query_start_date_floor(floor)];
        Ok(self.list_all(&self.collections.events, queries).await?)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let queries = vec![query_limit(1)];
        match self.fetch_page(&self.collections.events, &queries).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Appwrite health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl ProfileStore for AppwriteClient {
    async fn find_by_token_identifier(
        &self,
        token_identifier: &str,
    ) -> Result<Option<UserProfile>, StoreError> {
        let queries = vec![
            query_equal("tokenIdentifier", token_identifier),
            query_limit(2),
        ];

        let documents = self.fetch_page(&self.collections.users, &queries).await?;
        if documents.len() > 1 {
            return Err(StoreError::Integrity(format!(
                "multiple users for token {}",
                token_identifier
            )));
        }

        match documents.into_iter().next() {
            Some(doc) => Ok(Some(parse_document(doc)?)),
            None => Ok(None),
        }
    }
}

fn parse_document<T: DeserializeOwned>(mut doc: Value) -> Result<T, AppwriteError> {
    let data = match doc.get_mut("data").map(Value::take) {
        Some(data) => data,
        None => doc,
    };
    serde_json::from_value(data)
        .map_err(|e| AppwriteError::InvalidResponse(format!("Failed to parse document: {}", e)))
}

// Appwrite JSON query syntax

fn query_equal(attribute: &str, value: &str) -> String {
    format!(
        r#"{{"method":"equal","attribute":{},"values":[{}]}}"#,
        Value::from(attribute),
        Value::from(value)
    )
}

fn query_start_date_floor(floor: DateTime<Utc>) -> String {
    format!(
        r#"{{"method":"greaterThanEqual","attribute":"startDate","values":[{}]}}"#,
        Value::from(floor.to_rfc3339_opts(SecondsFormat::Millis, true))
    )
}

fn query_order_desc(attribute: &str) -> String {
    format!(
        r#"{{"method":"orderDesc","attribute":{}}}"#,
        Value::from(attribute)
    )
}

fn query_limit(limit: usize) -> String {
    format!(r#"{{"method":"limit","values":[{}]}}"#, limit)
}

fn query_cursor_after(document_id: &str) -> String {
    format!(
        r#"{{"method":"cursorAfter","values":[{}]}}"#,
        Value::from(document_id)
    )
}
