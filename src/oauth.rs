use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

use crate::error::Error;
use crate::pkce::{self, PkcePair};
use crate::types::{Session, SignInOptions};

/// Ppoppo Accounts `OAuth2` configuration for the mobile shell.
///
/// Required fields are constructor parameters, so there are no runtime "missing field" errors.
///
/// ```rust,ignore
/// use ppoppo_shell::OAuthConfig;
///
/// let config = OAuthConfig::new("ppoppo-ios", "ppoppo://auth/callback".parse()?)
///     .with_scopes(vec!["openid".into(), "offline_access".into()]);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
}

impl OAuthConfig {
    /// `redirect_uri` is the app's deep-link callback.
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            auth_url: "https://accounts.ppoppo.com/oauth/authorize"
                .parse()
                .expect("valid default URL"),
            token_url: "https://accounts.ppoppo.com/oauth/token"
                .parse()
                .expect("valid default URL"),
            scopes: vec!["openid".into(), "profile".into(), "offline_access".into()],
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Authorize URL plus the secrets needed to finish the flow.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    pub pkce: PkcePair,
}

/// Token endpoint reply.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Builds a session, keeping `previous_refresh` when the server does not
    /// rotate the refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFlow`] if neither side has a refresh token.
    pub fn into_session(self, previous_refresh: Option<&str>) -> Result<Session, Error> {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| Error::AuthFlow("token response has no refresh token".into()))?;

        let mut session = Session::new(self.access_token, refresh_token);
        if let Some(expires_in) = self.expires_in {
            let ttl = time::Duration::seconds(i64::try_from(expires_in).unwrap_or(i64::MAX));
            session = session.with_expires_at(OffsetDateTime::now_utc().saturating_add(ttl));
        }
        Ok(session)
    }
}

/// `OAuth2` client for the Ppoppo Accounts token endpoint.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Generates an authorize URL with fresh PKCE and state values.
    #[must_use]
    pub fn authorization_url(&self, options: &SignInOptions) -> AuthorizationRequest {
        let state = pkce::generate_state();
        let pkce = PkcePair::generate();
        let scope = options
            .scopes
            .as_deref()
            .unwrap_or(&self.config.scopes)
            .join(" ");

        let mut url = self.config.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("state", &state)
                .append_pair("code_challenge", pkce.challenge())
                .append_pair("code_challenge_method", "S256")
                .append_pair("scope", &scope);
            if let Some(hint) = &options.login_hint {
                query.append_pair("login_hint", hint);
            }
        }

        AuthorizationRequest { url, state, pkce }
    }

    /// Exchanges an authorization code for tokens using PKCE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the token endpoint returns an error.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        self.token_request(&params, "token exchange").await
    }

    /// Trades a refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the token endpoint rejects the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        self.token_request(&params, "token refresh").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        operation: &'static str,
    ) -> Result<TokenResponse, Error> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(params)
            .send()
            .await?;

        let response = Self::ensure_success(response, operation).await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::OAuth {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}
