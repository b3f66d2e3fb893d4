//! Token acquisition and caching.

use std::fmt;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use firescan_core::Result;
use firescan_core::error::AuthError;

use super::credentials::{AuthorizedUser, Credentials, ServiceAccountKey};
use super::tokens::AccessToken;
use crate::client::map_reqwest;

/// OAuth scope granting access to Firestore.
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Grant type for the service account JWT flow.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for self-signed assertions.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are renewed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Default metadata server host on Google Cloud.
pub(crate) const METADATA_HOST: &str = "metadata.google.internal";

/// Response from an OAuth token endpoint or the metadata server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Claims of a service account assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Where tokens come from.
enum Source {
    /// No token is sent (emulator).
    Anonymous,
    ServiceAccount {
        key: ServiceAccountKey,
        signing_key: EncodingKey,
    },
    AuthorizedUser(AuthorizedUser),
    Metadata {
        url: String,
    },
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Anonymous => f.write_str("Anonymous"),
            Source::ServiceAccount { key, .. } => {
                f.debug_tuple("ServiceAccount").field(&key.client_email).finish()
            }
            Source::AuthorizedUser(user) => {
                f.debug_tuple("AuthorizedUser").field(&user.client_id).finish()
            }
            Source::Metadata { url } => f.debug_struct("Metadata").field("url", url).finish(),
        }
    }
}

#[derive(Debug)]
struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Supplies bearer tokens, fetching a new one only when the cached token
/// is about to expire.
///
/// Safe to share across concurrent requests; refreshes are serialized
/// behind a write lock so a burst of requests triggers one exchange.
#[derive(Debug)]
pub struct TokenProvider {
    source: Source,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    fn with_source(source: Source, http: reqwest::Client) -> Self {
        Self {
            source,
            http,
            cached: RwLock::new(None),
        }
    }

    /// A provider that never yields a token.
    pub fn anonymous(http: reqwest::Client) -> Self {
        Self::with_source(Source::Anonymous, http)
    }

    /// A provider backed by a credentials file.
    ///
    /// # Errors
    ///
    /// Returns an error if a service account private key is not valid PEM.
    pub fn from_credentials(credentials: Credentials, http: reqwest::Client) -> Result<Self> {
        let source = match credentials {
            Credentials::ServiceAccount(key) => {
                let signing_key =
                    EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
                        AuthError::InvalidCredentials(format!(
                            "private key for {}: {}",
                            key.client_email, e
                        ))
                    })?;
                Source::ServiceAccount { key, signing_key }
            }
            Credentials::AuthorizedUser(user) => Source::AuthorizedUser(user),
        };
        Ok(Self::with_source(source, http))
    }

    /// A provider that asks the GCE metadata server at `host`.
    pub fn metadata_server(host: &str, http: reqwest::Client) -> Self {
        let url = format!(
            "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
            host
        );
        Self::with_source(Source::Metadata { url }, http)
    }

    /// Returns true if no token is ever sent.
    pub fn is_anonymous(&self) -> bool {
        matches!(self.source, Source::Anonymous)
    }

    /// Return a valid access token, or `None` for anonymous access.
    pub async fn token(&self) -> Result<Option<AccessToken>> {
        if self.is_anonymous() {
            return Ok(None);
        }

        if let Some(cached) = self.cached.read().await.as_ref()
            && cached.is_fresh()
        {
            return Ok(Some(cached.token.clone()));
        }

        let mut cached = self.cached.write().await;
        if let Some(existing) = cached.as_ref()
            && existing.is_fresh()
        {
            return Ok(Some(existing.token.clone()));
        }

        let response = self.request_token().await?;
        let lifetime = Duration::from_secs(response.expires_in.unwrap_or(3600));
        let token = AccessToken::new(response.access_token);

        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(Some(token))
    }

    #[instrument(skip(self), fields(source = ?self.source))]
    async fn request_token(&self) -> Result<TokenResponse> {
        debug!("Requesting access token");

        let request = match &self.source {
            Source::Anonymous => {
                return Err(
                    AuthError::InvalidCredentials("no credentials configured".to_string()).into(),
                );
            }
            Source::ServiceAccount { key, signing_key } => {
                let assertion = Self::sign_assertion(key, signing_key)?;
                self.http.post(&key.token_uri).form(&[
                    ("grant_type", JWT_BEARER_GRANT),
                    ("assertion", assertion.as_str()),
                ])
            }
            Source::AuthorizedUser(user) => self.http.post(&user.token_uri).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ]),
            Source::Metadata { url } => self.http.get(url).header("Metadata-Flavor", "Google"),
        };

        let response = request.send().await.map_err(map_reqwest)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let token: TokenResponse = response.json().await.map_err(map_reqwest)?;
        debug!(expires_in = ?token.expires_in, "Access token issued");
        Ok(token)
    }

    fn sign_assertion(key: &ServiceAccountKey, signing_key: &EncodingKey) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, signing_key)
            .map_err(|e| AuthError::InvalidCredentials(format!("signing assertion: {}", e)).into())
    }
}
