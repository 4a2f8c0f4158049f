use anyhow::{Context, Result};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};

/// OAuth2 configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Client ID from OAuth provider
    pub client_id: String,

    /// Client secret from OAuth provider
    pub client_secret: String,

    /// Authorization endpoint URL
    pub auth_url: String,

    /// Token endpoint URL
    pub token_url: String,

    /// Redirect URI for OAuth callback
    pub redirect_uri: String,

    /// Scopes to request
    pub scopes: Vec<String>,
}

/// Everything needed to send a browser to the consent screen and later
/// check the callback.
///
/// `csrf_state` and `pkce_verifier` must be kept (in the session) until the
/// provider redirects back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Tokens returned by the code exchange
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,
}

/// OAuth2 provider trait
pub trait OAuth2Provider: Send + Sync {
    /// Get the service identifier (e.g., "google")
    fn service_id(&self) -> &str;

    /// Get the OAuth2 configuration
    fn config(&self) -> &OAuth2Config;

    /// Build the oauth2 client for this provider
    fn client(&self) -> Result<BasicClient> {
        let config = self.config();

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).context("Invalid auth URL")?,
            Some(TokenUrl::new(config.token_url.clone()).context("Invalid token URL")?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_uri.clone()).context("Invalid redirect URI")?,
        );

        Ok(client)
    }

    /// Start the authorization-code flow
    fn authorization_request(&self) -> Result<AuthorizationRequest> {
        let client = self.client()?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client.authorize_url(CsrfToken::new_random);
        for scope in &self.config().scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        Ok(AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_state: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        })
    }

    /// Complete the flow with the authorization code from the callback
    ///
    /// # Arguments
    /// * `code` - Authorization code from callback
    /// * `pkce_verifier` - Verifier produced by [`Self::authorization_request`]
    async fn exchange_code(&self, code: String, pkce_verifier: String) -> Result<TokenSet> {
        let client = self.client()?;

        let token_result = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(async_http_client)
            .await
            .context("Failed to exchange authorization code")?;

        tracing::info!("OAuth2 code exchange completed for {}", self.service_id());

        Ok(TokenSet {
            access_token: token_result.access_token().secret().clone(),
        })
    }
}
