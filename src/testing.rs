//! In-memory fakes for the platform traits.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tokio::sync::{Notify, mpsc};

use crate::error::Error;
use crate::shell::{ContentSurface, CookieStore, CredentialProvider, StoreError};
use crate::types::{Session, SessionChange, SignInOptions, SignInOutcome};

type Probe = Box<dyn Fn() -> bool + Send + Sync>;

/// Records injected scripts instead of running them.
pub(crate) struct FakeSurface {
    attached: Mutex<bool>,
    scripts: Mutex<Vec<String>>,
    back_count: Mutex<usize>,
    probe: Mutex<Option<Probe>>,
    probe_log: Mutex<Vec<bool>>,
}

impl FakeSurface {
    pub(crate) fn attached() -> Self {
        Self {
            attached: Mutex::new(true),
            scripts: Mutex::new(Vec::new()),
            back_count: Mutex::new(0),
            probe: Mutex::new(None),
            probe_log: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn detached() -> Self {
        let surface = Self::attached();
        surface.set_attached(false);
        surface
    }

    pub(crate) fn set_attached(&self, attached: bool) {
        *self.attached.lock() = attached;
    }

    /// Evaluated on every injection; results land in [`probe_log`](Self::probe_log).
    pub(crate) fn set_probe(&self, probe: impl Fn() -> bool + Send + Sync + 'static) {
        *self.probe.lock() = Some(Box::new(probe));
    }

    pub(crate) fn probe_log(&self) -> Vec<bool> {
        self.probe_log.lock().clone()
    }

    pub(crate) fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }

    /// Command payloads recovered from the injected scripts.
    pub(crate) fn commands(&self) -> Vec<JsonValue> {
        self.scripts()
            .iter()
            .filter_map(|script| {
                let start = script.find("detail: ")? + "detail: ".len();
                let end = script.rfind(" }));true;")?;
                serde_json::from_str(&script[start..end]).ok()
            })
            .collect()
    }

    pub(crate) fn command_types(&self) -> Vec<String> {
        self.commands()
            .iter()
            .filter_map(|c| c["type"].as_str().map(str::to_string))
            .collect()
    }

    pub(crate) fn back_count(&self) -> usize {
        *self.back_count.lock()
    }
}

impl ContentSurface for FakeSurface {
    fn is_attached(&self) -> bool {
        *self.attached.lock()
    }

    fn inject_script(&self, script: &str) {
        let observed = self.probe.lock().as_ref().is_some_and(|probe| probe());
        self.probe_log.lock().push(observed);
        self.scripts.lock().push(script.to_string());
    }

    fn go_back(&self) {
        *self.back_count.lock() += 1;
    }
}

/// Scripted credential provider.
#[derive(Default)]
pub(crate) struct FakeProvider {
    stored: Mutex<Option<Session>>,
    lookup_fails: Mutex<bool>,
    invalidate_fails: Mutex<bool>,
    sign_in_result: Mutex<Option<Result<SignInOutcome, Error>>>,
    refresh_result: Mutex<Option<Result<Session, Error>>>,
    refresh_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SessionChange>>>,
}

impl FakeProvider {
    pub(crate) fn set_stored(&self, session: Option<Session>) {
        *self.stored.lock() = session;
    }

    pub(crate) fn fail_lookup(&self) {
        *self.lookup_fails.lock() = true;
    }

    pub(crate) fn fail_invalidate(&self) {
        *self.invalidate_fails.lock() = true;
    }

    pub(crate) fn set_sign_in_result(&self, result: Result<SignInOutcome, Error>) {
        *self.sign_in_result.lock() = Some(result);
    }

    pub(crate) fn set_refresh_result(&self, result: Result<Session, Error>) {
        *self.refresh_result.lock() = Some(result);
    }

    /// Makes the next refresh wait until the returned gate is notified.
    pub(crate) fn hold_refresh(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.refresh_gate.lock() = Some(gate.clone());
        gate
    }

    pub(crate) fn calls(&self, name: &str) -> usize {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }

    fn record(&self, name: &'static str) {
        *self.calls.lock().entry(name).or_default() += 1;
    }
}

impl CredentialProvider for FakeProvider {
    async fn current_session(&self) -> Result<Option<Session>, Error> {
        self.record("current_session");
        if *self.lookup_fails.lock() {
            return Err(Error::Store("keychain locked".into()));
        }
        Ok(self.stored.lock().clone())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    async fn sign_in_interactive(&self, _options: &SignInOptions) -> Result<SignInOutcome, Error> {
        self.record("sign_in_interactive");
        self.sign_in_result
            .lock()
            .take()
            .unwrap_or(Ok(SignInOutcome::Cancelled))
    }

    async fn refresh_session(&self) -> Result<Session, Error> {
        self.record("refresh_session");
        let gate = self.refresh_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.refresh_result
            .lock()
            .take()
            .unwrap_or_else(|| Err(Error::Provider("no refresh scripted".into())))
    }

    async fn invalidate_session(&self) -> Result<(), Error> {
        self.record("invalidate_session");
        *self.stored.lock() = None;
        if *self.invalidate_fails.lock() {
            return Err(Error::Provider("revocation failed".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeCookies {
    cleared: Mutex<usize>,
    fails: Mutex<bool>,
}

impl FakeCookies {
    pub(crate) fn fail(&self) {
        *self.fails.lock() = true;
    }

    pub(crate) fn cleared(&self) -> usize {
        *self.cleared.lock()
    }
}

impl CookieStore for FakeCookies {
    async fn clear_all(&self) -> Result<(), StoreError> {
        if *self.fails.lock() {
            return Err("cookie manager unavailable".into());
        }
        *self.cleared.lock() += 1;
        Ok(())
    }
}
