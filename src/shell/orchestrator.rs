use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use url::Url;

use super::back::{BackDecision, BackNavigator};
use super::channel::{CommandChannel, parse_message};
use super::config::ShellConfig;
use super::sync::{AuthStatus, Synchronizer};
use super::traits::{ContentSurface, CookieStore, CredentialProvider};
use crate::error::Error;
use crate::protocol::{Command, Message};
use crate::route::{RouteClassifier, RouteInfo};
use crate::types::{SessionChange, SignInOptions, SignInOutcome};

/// Which content entry point the surface should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Home,
    Login,
}

/// Composes the synchronizer, the back navigator and the content surface.
pub struct Shell<P, S, C> {
    config: ShellConfig,
    classifier: RouteClassifier,
    surface: Arc<S>,
    commands: CommandChannel<S>,
    sync: Synchronizer<P, S>,
    cookies: Arc<C>,
    back: Mutex<BackNavigator>,
    destination: Mutex<Option<Destination>>,
}

impl<P, S, C> Shell<P, S, C>
where
    P: CredentialProvider,
    S: ContentSurface,
    C: CookieStore,
{
    #[must_use]
    pub fn new(config: ShellConfig, provider: Arc<P>, surface: Arc<S>, cookies: Arc<C>) -> Self {
        let commands = CommandChannel::new(surface.clone(), config.command_event.clone());
        let sync = Synchronizer::new(
            provider,
            commands.clone(),
            config.delivery,
            config.confirm_timeout,
        );
        Self {
            classifier: RouteClassifier::new(&config.tab_routes),
            back: Mutex::new(BackNavigator::new(
                config.back_handler_enabled,
                config.exit_window,
            )),
            destination: Mutex::new(None),
            config,
            surface,
            commands,
            sync,
            cookies,
        }
    }

    #[must_use]
    pub fn synchronizer(&self) -> &Synchronizer<P, S> {
        &self.sync
    }

    /// `None` until [`start`](Self::start) has resolved.
    #[must_use]
    pub fn destination(&self) -> Option<Destination> {
        *self.destination.lock()
    }

    #[must_use]
    pub fn destination_url(&self, destination: Destination) -> &Url {
        match destination {
            Destination::Home => self.config.home_url(),
            Destination::Login => self.config.login_url(),
        }
    }

    #[must_use]
    pub fn current_route(&self) -> RouteInfo {
        self.back.lock().route().clone()
    }

    /// Waits for the stored session and picks the first destination.
    pub async fn start(&self) -> Destination {
        let destination = match self.sync.initialize().await {
            AuthStatus::Authenticated => Destination::Home,
            AuthStatus::Unauthenticated | AuthStatus::Uninitialized => Destination::Login,
        };
        *self.destination.lock() = Some(destination);
        tracing::info!(?destination, "Initial destination resolved");
        destination
    }

    /// Pumps the provider's change subscription until it closes.
    pub async fn run_session_changes(&self, mut changes: mpsc::UnboundedReceiver<SessionChange>) {
        while let Some(change) = changes.recv().await {
            self.on_session_change(&change);
        }
        tracing::debug!("Session change subscription closed");
    }

    /// Applies one provider notification and returns the new destination.
    pub fn on_session_change(&self, change: &SessionChange) -> Option<Destination> {
        self.sync.on_credential_changed(change);
        self.follow_session(change.session.is_some())
    }

    /// Parses and routes a Content→Host payload.
    ///
    /// # Errors
    ///
    /// Only a content-requested sign-in propagates errors, so the host UI can
    /// report them. Everything else is absorbed.
    pub async fn handle_message(&self, raw: &str) -> Result<(), Error> {
        let Some(message) = parse_message(raw) else {
            return Ok(());
        };

        if let Some(success) = message.confirmation() {
            self.sync.on_confirmation(success);
            return Ok(());
        }

        match message {
            Message::RouteInfo { payload } => {
                let route = self.classifier.reclassify(payload);
                self.back.lock().set_route(route);
            }
            Message::WebReady => {
                self.sync
                    .on_web_ready_refreshing(OffsetDateTime::now_utc())
                    .await;
            }
            Message::RequestTokenRefresh | Message::RequestSessionRefresh => {
                self.sync.on_refresh_requested().await;
            }
            Message::Logout | Message::SessionExpired => {
                self.logout().await;
            }
            Message::RequestLogin => {
                self.sign_in(&SignInOptions::default()).await?;
            }
            Message::TokenReceived { .. } | Message::SessionSet { .. } => {}
        }
        Ok(())
    }

    /// Records a navigation event from the content surface.
    pub fn handle_navigation(&self, url: &str, can_go_back: bool) -> RouteInfo {
        let route = self.classifier.classify(url, can_go_back);
        tracing::debug!(path = %route.path, tab = route.is_tab_route, "Content navigated");
        self.back.lock().set_route(route.clone());
        route
    }

    /// Asks the content to report its route (answered with `ROUTE_INFO`).
    pub fn request_route_info(&self) -> bool {
        self.commands.send(&Command::GetRouteInfo)
    }

    /// Navigates the content to `path` without reloading the surface.
    pub fn navigate_to(&self, path: impl Into<String>) -> bool {
        self.commands.send(&Command::NavigateTo { path: path.into() })
    }

    /// Resolves a hardware back press and performs the content-side effect.
    ///
    /// `ShowExitNotice`, `ExitApp` and `PlatformDefault` are left to the host.
    pub fn handle_back_press(&self, now: Instant) -> BackDecision {
        let decision = self.back.lock().on_back_press(now);
        match decision {
            BackDecision::DelegateToContent => self.surface.go_back(),
            BackDecision::NavigateHome => {
                if !self.commands.send(&Command::NavigateHome) {
                    tracing::warn!("Back press could not reset content to home");
                }
            }
            BackDecision::ShowExitNotice | BackDecision::ExitApp | BackDecision::PlatformDefault => {}
        }
        decision
    }

    /// Native sign-in entry point.
    ///
    /// # Errors
    ///
    /// Propagates provider and auth flow errors.
    pub async fn sign_in(&self, options: &SignInOptions) -> Result<SignInOutcome, Error> {
        let outcome = self.sync.sign_in(options).await?;
        if matches!(outcome, SignInOutcome::SignedIn(_)) {
            self.follow_session(true);
        }
        Ok(outcome)
    }

    /// Sign-out, best-effort cookie cleanup, then the login destination.
    pub async fn logout(&self) -> Destination {
        if let Err(e) = self.sync.sign_out().await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
        if let Err(e) = self.cookies.clear_all().await {
            tracing::warn!(error = %e, "Cookie cleanup failed during logout");
        }
        self.set_destination(Destination::Login);
        Destination::Login
    }

    fn follow_session(&self, authenticated: bool) -> Option<Destination> {
        let current = self.destination();
        match (current, authenticated) {
            // Startup has not resolved yet.
            (None, _) => None,
            (Some(Destination::Login), true) => {
                self.set_destination(Destination::Home);
                Some(Destination::Home)
            }
            (Some(_), false) => {
                self.set_destination(Destination::Login);
                Some(Destination::Login)
            }
            (Some(Destination::Home), true) => Some(Destination::Home),
        }
    }

    fn set_destination(&self, destination: Destination) {
        let previous = self.destination.lock().replace(destination);
        if previous != Some(destination) {
            tracing::info!(?destination, "Destination changed");
        }
    }
}
