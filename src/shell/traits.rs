use std::future::Future;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::types::{Session, SessionChange, SignInOptions, SignInOutcome};

/// Boxed error returned by consumer-implemented platform stores.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// The embedded web content surface (the WebView).
///
/// Injection is fire-and-forget: the content acknowledges through its own
/// messages, never through this trait.
pub trait ContentSurface: Send + Sync + 'static {
    /// Whether the surface is mounted and can run scripts.
    fn is_attached(&self) -> bool;

    /// Runs `script` inside the content runtime.
    fn inject_script(&self, script: &str);

    /// Steps back in the surface's own history.
    fn go_back(&self);
}

/// Owner of the native session (OAuth, secure storage, refresh).
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialProvider for MyProvider {
///     async fn current_session(&self) -> Result<Option<Session>, Error> {
///         self.keychain.load_session().await
///     }
///     // ...
/// }
/// ```
pub trait CredentialProvider: Send + Sync + 'static {
    /// Looks up the session restored at app start, if any.
    fn current_session(&self) -> impl Future<Output = Result<Option<Session>, Error>> + Send;

    /// Registers a change subscription. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionChange>;

    /// Runs the interactive sign-in flow (external browser session).
    fn sign_in_interactive(
        &self,
        options: &SignInOptions,
    ) -> impl Future<Output = Result<SignInOutcome, Error>> + Send;

    /// Exchanges the current refresh token for a new session.
    fn refresh_session(&self) -> impl Future<Output = Result<Session, Error>> + Send;

    /// Revokes and forgets the current session.
    fn invalidate_session(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Platform cookie jar shared with the content surface.
pub trait CookieStore: Send + Sync + 'static {
    fn clear_all(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
