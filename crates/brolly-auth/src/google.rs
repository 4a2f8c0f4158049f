//! Google sign-in via OAuth2 authorization code with PKCE.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::oauth::{OAuth2Config, OAuth2Provider};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Profile returned by the user-info endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default, alias = "email_verified")]
    pub verified_email: Option<bool>,
    /// Any other claims, kept so the profile page can show them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

pub struct GoogleOAuth2Provider {
    config: OAuth2Config,
    userinfo_url: String,
    http: Client,
}

impl GoogleOAuth2Provider {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            config: OAuth2Config {
                client_id,
                client_secret,
                auth_url: GOOGLE_AUTH_URL.to_string(),
                token_url: GOOGLE_TOKEN_URL.to_string(),
                redirect_uri,
                scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            },
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at other endpoints (test servers, proxies)
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.config.auth_url = auth_url.into();
        self.config.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    /// Fetch the signed-in user's profile.
    #[tracing::instrument(skip(self, access_token), level = "info")]
    pub async fn user_info(&self, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to fetch user info")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("User info request failed: {}", error_text);
        }

        response
            .json::<UserProfile>()
            .await
            .context("Failed to parse user info")
    }
}

impl OAuth2Provider for GoogleOAuth2Provider {
    fn service_id(&self) -> &str {
        "google"
    }

    fn config(&self) -> &OAuth2Config {
        &self.config
    }
}
