//! Session synchronization between the native provider and the content.
//!
//! The synchronizer caches the provider's session and pushes it into the
//! content through the [`CommandChannel`]. The content acknowledges with
//! `TOKEN_RECEIVED` / `SESSION_SET`, which resolves the single outstanding
//! confirmation waiter.
//!
//! ```text
//! provider ── SessionChange ──► Synchronizer ── SET_SESSION ──► content
//!                                    ▲                             │
//!                                    └──── WEB_READY / SESSION_SET ┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::oneshot;

use super::channel::CommandChannel;
use super::config::DeliveryMode;
use super::traits::{ContentSurface, CredentialProvider};
use crate::error::Error;
use crate::protocol::Command;
use crate::types::{
    Session, SessionChange, SessionEvent, SignInOptions, SignInOutcome, TokenFingerprint,
};

/// Lifecycle of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// The initial session lookup has not resolved yet.
    Uninitialized,
    Authenticated,
    Unauthenticated,
}

/// What [`Synchronizer::sync_to_content`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Sent,
    /// Same token as the last push; nothing sent.
    Skipped,
    /// The content surface is detached.
    Undelivered,
}

struct PendingConfirmation {
    id: u64,
    reply: oneshot::Sender<bool>,
}

#[derive(Default)]
struct SyncState {
    initialized: bool,
    session: Option<Session>,
    web_ready: bool,
    last_sent: Option<TokenFingerprint>,
    pending: Option<PendingConfirmation>,
    next_request_id: u64,
    // Bumped on every credential change; stale provider results compare against it.
    epoch: u64,
    // Token this synchronizer already pushed after a content-requested refresh.
    // The provider's matching TokenRefreshed notification must not push it again.
    own_refresh: Option<TokenFingerprint>,
}

pub struct Synchronizer<P, S> {
    provider: Arc<P>,
    channel: CommandChannel<S>,
    delivery: DeliveryMode,
    confirm_timeout: Duration,
    state: Mutex<SyncState>,
}

impl<P: CredentialProvider, S: ContentSurface> Synchronizer<P, S> {
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        channel: CommandChannel<S>,
        delivery: DeliveryMode,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            channel,
            delivery,
            confirm_timeout,
            state: Mutex::new(SyncState::default()),
        }
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        let state = self.state.lock();
        match (state.initialized, state.session.is_some()) {
            (false, _) => AuthStatus::Uninitialized,
            (true, true) => AuthStatus::Authenticated,
            (true, false) => AuthStatus::Unauthenticated,
        }
    }

    /// Cached copy of the provider's session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    #[must_use]
    pub fn is_web_ready(&self) -> bool {
        self.state.lock().web_ready
    }

    /// Resolves the stored session and leaves `Uninitialized`.
    ///
    /// A lookup failure counts as signed out. Later calls return the current
    /// status without touching the provider.
    pub async fn initialize(&self) -> AuthStatus {
        let epoch = {
            let state = self.state.lock();
            if state.initialized {
                drop(state);
                return self.status();
            }
            state.epoch
        };

        let restored = match self.provider.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Initial session lookup failed");
                None
            }
        };

        {
            let mut state = self.state.lock();
            if !state.initialized {
                state.initialized = true;
                // A change notification that raced the lookup is newer.
                if state.epoch == epoch {
                    state.session = restored;
                }
            }
        }

        let status = self.status();
        tracing::info!(?status, "Session synchronizer ready");
        status
    }

    /// Runs the provider's interactive sign-in.
    ///
    /// The cache is updated by the provider's change notification, not here.
    ///
    /// # Errors
    ///
    /// Propagates provider errors. Returns [`Error::AuthFlow`] if the provider
    /// reports success without an access token.
    pub async fn sign_in(&self, options: &SignInOptions) -> Result<SignInOutcome, Error> {
        let outcome = self.provider.sign_in_interactive(options).await?;
        match &outcome {
            SignInOutcome::SignedIn(session) if session.access_token.is_empty() => {
                return Err(Error::AuthFlow("provider returned no access token".into()));
            }
            SignInOutcome::SignedIn(session) => {
                tracing::info!(user_id = ?session.user_id, "Interactive sign-in completed");
            }
            SignInOutcome::Cancelled => {
                tracing::info!("Interactive sign-in cancelled by user");
            }
        }
        Ok(outcome)
    }

    /// Clears the content, then local state, then the provider session.
    ///
    /// # Errors
    ///
    /// Returns the provider's invalidation error. Local state and the content
    /// are already cleared when that happens.
    pub async fn sign_out(&self) -> Result<(), Error> {
        if self.sync_to_content(None, true) == SyncOutcome::Undelivered {
            tracing::debug!("Content detached during sign-out, clear not delivered");
        }

        {
            let mut state = self.state.lock();
            state.last_sent = None;
            state.web_ready = false;
            state.session = None;
            state.epoch += 1;
            state.own_refresh = None;
            if let Some(pending) = state.pending.take() {
                let _ = pending.reply.send(false);
            }
        }
        tracing::info!("Signed out locally, invalidating provider session");

        self.provider.invalidate_session().await
    }

    /// Pushes `session` into the content, or clears it when `None`.
    ///
    /// Clears are never deduplicated. Pushes of the same access token as the
    /// last successful push are skipped unless `force` is set.
    pub fn sync_to_content(&self, session: Option<&Session>, force: bool) -> SyncOutcome {
        let Some(session) = session else {
            return if self.channel.send(&self.clear_command()) {
                SyncOutcome::Sent
            } else {
                SyncOutcome::Undelivered
            };
        };

        let fingerprint = session.fingerprint();
        {
            let mut state = self.state.lock();
            if !force && state.last_sent.as_ref() == Some(&fingerprint) {
                tracing::debug!("Token unchanged since last push, skipping");
                return SyncOutcome::Skipped;
            }
            state.last_sent = Some(fingerprint.clone());
        }

        if self.channel.send(&self.set_command(session)) {
            return SyncOutcome::Sent;
        }

        // Let a later unforced sync retry the undelivered token.
        let mut state = self.state.lock();
        if state.last_sent.as_ref() == Some(&fingerprint) {
            state.last_sent = None;
        }
        SyncOutcome::Undelivered
    }

    /// Force-pushes `session` and waits for the content to acknowledge it.
    ///
    /// Resolves `false` on timeout, on an explicit failure acknowledgment,
    /// when the surface is detached, or as soon as a newer call supersedes
    /// this one.
    pub async fn sync_and_await_confirmation(
        &self,
        session: Option<&Session>,
        timeout: Duration,
    ) -> bool {
        let (reply, confirmed) = oneshot::channel();
        let id = {
            let mut state = self.state.lock();
            state.next_request_id += 1;
            let id = state.next_request_id;
            if let Some(previous) = state.pending.replace(PendingConfirmation { id, reply }) {
                tracing::debug!(request_id = previous.id, "Confirmation superseded");
                let _ = previous.reply.send(false);
            }
            id
        };

        if self.sync_to_content(session, true) == SyncOutcome::Undelivered {
            self.release_pending(id);
            return false;
        }

        match tokio::time::timeout(timeout, confirmed).await {
            Ok(Ok(success)) => success,
            Ok(Err(_)) => false,
            Err(_) => {
                self.release_pending(id);
                tracing::warn!(request_id = id, ?timeout, "Content did not confirm session in time");
                false
            }
        }
    }

    /// [`sync_and_await_confirmation`](Self::sync_and_await_confirmation)
    /// with the cached session and the configured timeout.
    pub async fn confirm_delivery(&self) -> bool {
        let session = self.session();
        self.sync_and_await_confirmation(session.as_ref(), self.confirm_timeout)
            .await
    }

    /// Resolves the outstanding confirmation waiter, if any.
    pub fn on_confirmation(&self, success: bool) {
        match self.state.lock().pending.take() {
            Some(pending) => {
                tracing::debug!(request_id = pending.id, success, "Content confirmed session");
                let _ = pending.reply.send(success);
            }
            None => tracing::debug!(success, "Confirmation without a pending request"),
        }
    }

    /// Applies a provider change notification.
    ///
    /// Returns `None` when delivery is deferred until the content is ready.
    pub fn on_credential_changed(&self, change: &SessionChange) -> Option<SyncOutcome> {
        let (web_ready, already_pushed) = {
            let mut state = self.state.lock();
            state.epoch += 1;
            state.session = change.session.clone();
            let own_refresh = state.own_refresh.take();
            let already_pushed = change.event == SessionEvent::TokenRefreshed
                && own_refresh.is_some()
                && change.session.as_ref().map(Session::fingerprint) == own_refresh;
            if change.resets_dedup() && !already_pushed {
                state.last_sent = None;
            }
            (state.web_ready, already_pushed)
        };
        tracing::info!(event = ?change.event, authenticated = change.session.is_some(), "Credential change");

        if already_pushed {
            tracing::debug!("Refreshed token already pushed to content, skipping");
            return web_ready.then_some(SyncOutcome::Skipped);
        }

        if !web_ready {
            tracing::debug!("Content not ready, deferring session delivery");
            return None;
        }
        Some(self.sync_to_content(change.session.as_ref(), true))
    }

    /// Marks the content ready and force-delivers the cached session.
    pub fn on_web_ready(&self) -> Option<SyncOutcome> {
        let session = {
            let mut state = self.state.lock();
            state.web_ready = true;
            state.session.clone()
        };
        session.map(|session| self.sync_to_content(Some(&session), true))
    }

    /// [`on_web_ready`](Self::on_web_ready), refreshing first when the cached
    /// session has expired by `now`.
    ///
    /// A failed refresh falls back to delivering the cached session.
    pub async fn on_web_ready_refreshing(&self, now: OffsetDateTime) -> Option<SyncOutcome> {
        let expired = {
            let mut state = self.state.lock();
            state.web_ready = true;
            state.session.as_ref().is_some_and(|s| s.is_expired_at(now))
        };

        if expired {
            tracing::info!("Cached session expired, refreshing before delivery");
            if let Some(outcome) = self.on_refresh_requested().await {
                return Some(outcome);
            }
        }
        self.on_web_ready()
    }

    /// Content-initiated refresh.
    ///
    /// Failures are logged and swallowed: the content keeps its last token.
    /// A result that arrives after a newer credential change is discarded.
    pub async fn on_refresh_requested(&self) -> Option<SyncOutcome> {
        let epoch = self.state.lock().epoch;

        let session = match self.provider.refresh_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed, keeping current token");
                return None;
            }
        };

        {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                tracing::debug!("Discarding stale refresh result");
                return None;
            }
            state.epoch += 1;
            state.session = Some(session.clone());
            state.own_refresh = Some(session.fingerprint());
        }
        Some(self.sync_to_content(Some(&session), true))
    }

    fn release_pending(&self, id: u64) {
        let mut state = self.state.lock();
        if state.pending.as_ref().is_some_and(|p| p.id == id) {
            state.pending = None;
        }
    }

    fn set_command(&self, session: &Session) -> Command {
        match self.delivery {
            DeliveryMode::Session => Command::SetSession {
                access_token: session.access_token.clone(),
                refresh_token: session.refresh_token.clone(),
            },
            DeliveryMode::Token => Command::SetToken {
                token: Some(session.access_token.clone()),
            },
        }
    }

    fn clear_command(&self) -> Command {
        match self.delivery {
            DeliveryMode::Session => Command::ClearSession,
            DeliveryMode::Token => Command::SetToken { token: None },
        }
    }
}
