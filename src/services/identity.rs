use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::UserProfile;
use crate::services::store::{IdentityResolver, ProfileStore, StoreError};

/// Errors raised while verifying a caller token
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("No verification key configured")]
    MissingKey,
}

/// Claims read from the identity provider's session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub iss: Option<String>,
    pub exp: usize,
}

impl Claims {
    /// Stable key for a signed-in user: `"{issuer}|{subject}"`
    pub fn token_identifier(&self) -> String {
        format!("{}|{}", self.iss.as_deref().unwrap_or_default(), self.sub)
    }
}

/// Verifies caller JWTs and derives their token identifier
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Shared-secret (HS256) verifier
    pub fn hs256(secret: &[u8], issuer: Option<&str>) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256, issuer)
    }

    /// Public-key (RS256) verifier from a PEM document
    pub fn rs256_pem(pem: &[u8], issuer: Option<&str>) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem)?;
        Ok(Self::with_key(key, Algorithm::RS256, issuer))
    }

    /// Build from optional config values, preferring the public key
    pub fn from_settings(
        public_key_pem: Option<&str>,
        secret: Option<&str>,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> Result<Self, AuthError> {
        let verifier = match (public_key_pem, secret) {
            (Some(pem), _) => Self::rs256_pem(pem.as_bytes(), issuer)?,
            (None, Some(secret)) => Self::hs256(secret.as_bytes(), issuer),
            (None, None) => return Err(AuthError::MissingKey),
        };

        Ok(match audience {
            Some(aud) => verifier.with_audience(aud),
            None => verifier,
        })
    }

    /// Only accept tokens whose `aud` claim names `audience`
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self.validation.required_spec_claims.insert("aud".to_string());
        self
    }

    /// The `aud` claim is ignored unless an audience is configured.
    fn with_key(key: DecodingKey, algorithm: Algorithm, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_aud = false;
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        Self { key, validation }
    }

    /// Verify `token` and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Resolves bearer tokens to profiles through a [`ProfileStore`]
///
/// Tokens that fail verification resolve to no profile. Found profiles are
/// cached per token identifier.
pub struct TokenIdentityResolver {
    verifier: TokenVerifier,
    profiles: Arc<dyn ProfileStore>,
    cache: moka::future::Cache<String, UserProfile>,
}

impl TokenIdentityResolver {
    pub fn new(
        verifier: TokenVerifier,
        profiles: Arc<dyn ProfileStore>,
        cache_size: u64,
        cache_ttl_secs: u64,
    ) -> Self {
        let cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        Self {
            verifier,
            profiles,
            cache,
        }
    }
}

#[async_trait]
impl IdentityResolver for TokenIdentityResolver {
    async fn resolve_identity(
        &self,
        caller_token: &str,
    ) -> Result<Option<UserProfile>, StoreError> {
        let claims = match self.verifier.verify(caller_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Ignoring caller token: {}", e);
                return Ok(None);
            }
        };

        let token_identifier = claims.token_identifier();

        if let Some(profile) = self.cache.get(&token_identifier).await {
            tracing::trace!("Profile cache hit: {}", token_identifier);
            return Ok(Some(profile));
        }

        let profile = self
            .profiles
            .find_by_token_identifier(&token_identifier)
            .await?;

        match &profile {
            Some(p) => {
                self.cache.insert(token_identifier, p.clone()).await;
            }
            None => {
                tracing::debug!("No profile stored for {}", token_identifier);
            }
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryProfileStore;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";
    const ISSUER: &str = "https://clerk.spott.test";

    fn token(sub: &str, iss: &str, exp_offset_secs: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            iss: Some(iss.to_string()),
            exp: (chrono::Utc::now().timestamp() + exp_offset_secs) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    /// Session token as minted for a backend audience
    fn token_with_audience(sub: &str, aud: &str) -> String {
        let claims = serde_json::json!({
            "sub": sub,
            "iss": ISSUER,
            "aud": aud,
            "exp": chrono::Utc::now().timestamp() + 3600,
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn profile_store() -> MemoryProfileStore {
        MemoryProfileStore::new(vec![UserProfile {
            id: "u1".to_string(),
            token_identifier: format!("{}|user_1", ISSUER),
            name: Some("Ada".to_string()),
            interests: Some(vec!["music".to_string(), "tech".to_string()]),
        }])
    }

    fn resolver() -> TokenIdentityResolver {
        TokenIdentityResolver::new(
            TokenVerifier::hs256(SECRET, Some(ISSUER)),
            Arc::new(profile_store()),
            100,
            60,
        )
    }

    #[test]
    fn test_token_identifier_format() {
        let claims = Claims {
            sub: "user_1".to_string(),
            iss: Some(ISSUER.to_string()),
            exp: 0,
        };
        assert_eq!(claims.token_identifier(), "https://clerk.spott.test|user_1");
    }

    #[test]
    fn test_from_settings_requires_key() {
        assert!(matches!(
            TokenVerifier::from_settings(None, None, None, None),
            Err(AuthError::MissingKey)
        ));
        assert!(TokenVerifier::from_settings(None, Some("secret"), None, Some("convex")).is_ok());
    }

    #[tokio::test]
    async fn test_resolves_known_user() {
        let profile = resolver()
            .resolve_identity(&token("user_1", ISSUER, 3600))
            .await
            .unwrap()
            .expect("profile");
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.interests(), ["music".to_string(), "tech".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_anonymous() {
        let profile = resolver()
            .resolve_identity(&token("user_2", ISSUER, 3600))
            .await
            .unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_bad_tokens_are_anonymous() {
        let resolver = resolver();

        let expired = token("user_1", ISSUER, -3600);
        let wrong_issuer = token("user_1", "https://evil.test", 3600);

        assert!(resolver.resolve_identity(&expired).await.unwrap().is_none());
        assert!(resolver.resolve_identity(&wrong_issuer).await.unwrap().is_none());
        assert!(resolver.resolve_identity("not-a-jwt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_audience_ignored_when_not_configured() {
        let profile = resolver()
            .resolve_identity(&token_with_audience("user_1", "convex"))
            .await
            .unwrap()
            .expect("profile");
        assert_eq!(profile.id, "u1");
    }

    #[tokio::test]
    async fn test_configured_audience_is_enforced() {
        let verifier = TokenVerifier::from_settings(
            None,
            Some(std::str::from_utf8(SECRET).unwrap()),
            Some(ISSUER),
            Some("convex"),
        )
        .unwrap();
        let resolver = TokenIdentityResolver::new(verifier, Arc::new(profile_store()), 100, 60);

        let matching = token_with_audience("user_1", "convex");
        let other = token_with_audience("user_1", "dashboard");
        let missing = token("user_1", ISSUER, 3600);

        assert!(resolver.resolve_identity(&matching).await.unwrap().is_some());
        assert!(resolver.resolve_identity(&other).await.unwrap().is_none());
        assert!(resolver.resolve_identity(&missing).await.unwrap().is_none());
    }
}
