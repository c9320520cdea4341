//! Credential cookie, the authentication gate, and login/signup form handling.
//!
//! The credential is an opaque token with an expiry; nothing validates it
//! beyond presence and age. Signup goes through [`SignupClient`], a thin seam
//! for a real authentication service.

use crate::storage::{SharedStore, StorageError};
use crate::types::{SCHEMA_VERSION, UserRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("signup is not available: no auth endpoint configured")]
    NotConfigured,

    #[error("signup failed: {0}")]
    Backend(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Backend(err.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Credential {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

#[derive(Serialize, Deserialize)]
struct CredentialRecord {
    version: u32,
    #[serde(flatten)]
    credential: Credential,
}

/// Answers whether a usable credential is present.
#[derive(Clone)]
pub struct AuthGate {
    store: SharedStore,
}

impl AuthGate {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(OffsetDateTime::now_utc())
    }

    pub fn is_authenticated_at(&self, now: OffsetDateTime) -> bool {
        self.credential()
            .is_some_and(|credential| !credential.is_expired_at(now))
    }

    pub fn credential(&self) -> Option<Credential> {
        let raw = self.store.get(AUTH_COOKIE)?;
        serde_json::from_str::<CredentialRecord>(&raw)
            .ok()
            .filter(|record| record.version == SCHEMA_VERSION)
            .map(|record| record.credential)
    }

    pub fn issue_credential(
        &self,
        token: impl Into<String>,
        lifetime: time::Duration,
    ) -> Result<Credential, AuthError> {
        let credential = Credential {
            token: token.into(),
            expires_at: OffsetDateTime::now_utc() + lifetime,
        };
        let record = CredentialRecord {
            version: SCHEMA_VERSION,
            credential: credential.clone(),
        };
        self.store
            .set(AUTH_COOKIE, &serde_json::to_string(&record).map_err(StorageError::from)?)?;
        Ok(credential)
    }

    pub fn revoke_credential(&self) -> Result<(), AuthError> {
        self.store.remove(AUTH_COOKIE)?;
        Ok(())
    }
}

/// Locally generated token used when signing in without a backend.
pub fn local_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ============================================
// Forms
// ============================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginForm {
    pub identifier: String,
    pub role: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, UserRole), AuthError> {
        let identifier = self.identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::Validation("Please enter your email".into()));
        }
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| AuthError::Validation("Please select a role".into()))?;
        Ok((identifier.to_string(), role))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

impl SignupForm {
    pub fn validate(&self) -> Result<SignupRequest, AuthError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AuthError::Validation("Please enter your email".into()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("Please enter a password".into()));
        }
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| AuthError::Validation("Please select a role".into()))?;
        Ok(SignupRequest {
            email: email.to_string(),
            password: self.password.clone(),
            role,
        })
    }
}

// ============================================
// Signup backend
// ============================================

#[derive(Deserialize)]
struct SignupResponse {
    token: String,
}

pub struct SignupClient {
    endpoint: Option<String>,
    client: Client,
}

impl SignupClient {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    /// POSTs the request and returns the issued token. Nothing is stored here;
    /// callers commit state only after this succeeds.
    pub async fn register(&self, request: &SignupRequest) -> Result<String, AuthError> {
        let endpoint = self.endpoint.as_deref().ok_or(AuthError::NotConfigured)?;
        tracing::debug!(%endpoint, email = %request.email, "submitting signup");

        let response = self.client.post(endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Backend(format!("{status}: {body}")));
        }
        parse_signup_response(&body)
    }
}

fn parse_signup_response(body: &str) -> Result<String, AuthError> {
    let data: SignupResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::Backend(format!("unexpected response: {e}")))?;
    if data.token.trim().is_empty() {
        return Err(AuthError::Backend("empty token in response".into()));
    }
    Ok(data.token)
}
