//! Credential provider backed by the system browser and Ppoppo Accounts.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use crate::deep_link::{self, CallbackPayload};
use crate::error::Error;
use crate::oauth::AuthClient;
use crate::shell::{CredentialProvider, StoreError};
use crate::types::{Session, SessionChange, SignInOptions, SignInOutcome};

const SESSION_KEY: &str = "ppoppo.session";

/// External authorization surface (ASWebAuthenticationSession, Custom Tabs).
pub trait AuthSurface: Send + Sync + 'static {
    /// Opens `url` and waits for a redirect to `redirect_uri`.
    ///
    /// Returns the full callback URL, or `None` if the user closed the
    /// surface without finishing.
    fn open(
        &self,
        url: &Url,
        redirect_uri: &Url,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// Platform secure key-value storage (Keychain, Keystore).
pub trait SecureStore: Send + Sync + 'static {
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn save(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// [`CredentialProvider`] running a PKCE authorization-code flow.
pub struct BrowserProvider<A, K> {
    client: AuthClient,
    surface: A,
    store: K,
    session: Mutex<Option<Session>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SessionChange>>>,
}

impl<A: AuthSurface, K: SecureStore> BrowserProvider<A, K> {
    #[must_use]
    pub fn new(client: AuthClient, surface: A, store: K) -> Self {
        Self {
            client,
            surface,
            store,
            session: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn broadcast(&self, change: &SessionChange) {
        // Closed receivers have unsubscribed.
        self.subscribers
            .lock()
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    async fn persist(&self, session: &Session) -> Result<(), Error> {
        let value = serde_json::to_string(session)?;
        self.store
            .save(SESSION_KEY, &value)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    async fn establish(&self, session: Session) -> Result<Session, Error> {
        self.persist(&session).await?;
        *self.session.lock() = Some(session.clone());
        self.broadcast(&SessionChange::signed_in(session.clone()));
        Ok(session)
    }
}

impl<A: AuthSurface, K: SecureStore> CredentialProvider for BrowserProvider<A, K> {
    async fn current_session(&self) -> Result<Option<Session>, Error> {
        let cached = self.session.lock().clone();
        if cached.is_some() {
            return Ok(cached);
        }

        let stored = self
            .store
            .load(SESSION_KEY)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        let Some(raw) = stored else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                *self.session.lock() = Some(session.clone());
                Ok(Some(session))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored session");
                if let Err(e) = self.store.remove(SESSION_KEY).await {
                    tracing::warn!(error = %e, "Failed to remove unreadable session");
                }
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    async fn sign_in_interactive(&self, options: &SignInOptions) -> Result<SignInOutcome, Error> {
        let request = self.client.authorization_url(options);
        let redirect_uri = self.client.config().redirect_uri();

        let callback = self
            .surface
            .open(&request.url, redirect_uri)
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;
        let Some(callback) = callback else {
            return Ok(SignInOutcome::Cancelled);
        };

        let session = match deep_link::parse_callback(&callback)? {
            CallbackPayload::Tokens {
                access_token,
                refresh_token,
            } => Session::new(access_token, refresh_token),
            CallbackPayload::Code { code, state } => {
                if state.as_deref() != Some(request.state.as_str()) {
                    tracing::warn!("OAuth state mismatch");
                    return Err(Error::AuthFlow("state_mismatch".into()));
                }
                self.client
                    .exchange_code(&code, request.pkce.verifier())
                    .await?
                    .into_session(None)?
            }
        };

        let session = self.establish(session).await?;
        tracing::info!("Browser sign-in completed");
        Ok(SignInOutcome::SignedIn(session))
    }

    async fn refresh_session(&self) -> Result<Session, Error> {
        let current = self
            .session
            .lock()
            .clone()
            .ok_or_else(|| Error::Provider("no session to refresh".into()))?;

        let session = self
            .client
            .refresh(&current.refresh_token)
            .await?
            .into_session(Some(&current.refresh_token))?;

        self.persist(&session).await?;
        *self.session.lock() = Some(session.clone());
        self.broadcast(&SessionChange::refreshed(session.clone()));
        Ok(session)
    }

    async fn invalidate_session(&self) -> Result<(), Error> {
        *self.session.lock() = None;
        self.broadcast(&SessionChange::signed_out());
        self.store
            .remove(SESSION_KEY)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }
}
