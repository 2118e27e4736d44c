//! External identity verification.

use async_trait::async_trait;
use serde::Deserialize;

use crate::db::profiles::ExternalIdentity;
use crate::error::AppError;

/// Turns an opaque provider token into a verified identity, or fails with
/// `AppError::InvalidToken`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, AppError>;
}

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    sub: String,
    aud: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies Google ID tokens against the `tokeninfo` endpoint.
pub struct GoogleIdentityVerifier {
    client: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleIdentityVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, AppError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AppError::InvalidToken("Google sign-in is not configured".to_string()))?;

        if token.trim().is_empty() {
            return Err(AppError::InvalidToken("Missing token".to_string()));
        }

        let response = self
            .client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await?;

        if response.status().is_server_error() {
            return Err(AppError::Internal(format!(
                "Identity provider failed ({})",
                response.status()
            )));
        }
        if !response.status().is_success() {
            return Err(AppError::InvalidToken(format!(
                "Token rejected by provider ({})",
                response.status()
            )));
        }

        let info: GoogleTokenInfo = response.json().await?;
        if info.aud != client_id {
            return Err(AppError::InvalidToken("Token audience mismatch".to_string()));
        }

        Ok(ExternalIdentity {
            provider: "google".to_string(),
            external_id: info.sub,
            email: info.email,
            display_name: info.name,
            avatar_url: info.picture,
        })
    }
}
