use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_TAB_ROUTES: &[&str] = &["/", "/chat", "/friends", "/settings"];
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_millis(4000);
const DEFAULT_EXIT_WINDOW: Duration = Duration::from_millis(2000);
const DEFAULT_COMMAND_EVENT: &str = "nativeCommand";

/// How the session is pushed into the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// `SET_SESSION` with both tokens, `CLEAR_SESSION` to clear.
    #[default]
    Session,
    /// `SET_TOKEN` with the access token, `SET_TOKEN{null}` to clear.
    Token,
}

impl std::str::FromStr for DeliveryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "token" => Ok(Self::Token),
            other => Err(Error::Config(format!(
                "SHELL_DELIVERY: expected 'session' or 'token', got '{other}'"
            ))),
        }
    }
}

/// Shell configuration.
///
/// Required entry URLs are constructor parameters. Everything else has a
/// default and a `with_*` override.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub(crate) home_url: Url,
    pub(crate) login_url: Url,
    pub(crate) tab_routes: Vec<String>,
    pub(crate) confirm_timeout: Duration,
    pub(crate) exit_window: Duration,
    pub(crate) command_event: String,
    pub(crate) delivery: DeliveryMode,
    pub(crate) back_handler_enabled: bool,
}

impl ShellConfig {
    #[must_use]
    pub fn new(home_url: Url, login_url: Url) -> Self {
        Self {
            home_url,
            login_url,
            tab_routes: DEFAULT_TAB_ROUTES.iter().map(|r| (*r).to_string()).collect(),
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            exit_window: DEFAULT_EXIT_WINDOW,
            command_event: DEFAULT_COMMAND_EVENT.into(),
            delivery: DeliveryMode::default(),
            back_handler_enabled: true,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `SHELL_HOME_URL`: content entry URL for signed-in users
    /// - `SHELL_LOGIN_URL`: content entry URL for signed-out users
    ///
    /// # Optional env vars
    /// - `SHELL_TAB_ROUTES`: Comma-separated tab-root paths
    /// - `SHELL_CONFIRM_TIMEOUT_MS`: Session confirmation timeout
    /// - `SHELL_EXIT_WINDOW_MS`: Double-press-to-exit window
    /// - `SHELL_COMMAND_EVENT`: DOM event name used for commands
    /// - `SHELL_DELIVERY`: `session` or `token`
    /// - `SHELL_BACK_HANDLER`: `0` or `false` leaves back presses to the platform
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let home_url = required_url(&lookup, "SHELL_HOME_URL")?;
        let login_url = required_url(&lookup, "SHELL_LOGIN_URL")?;
        let mut config = Self::new(home_url, login_url);

        if let Some(routes) = lookup("SHELL_TAB_ROUTES") {
            config = config.with_tab_routes(
                routes
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(ms) = lookup("SHELL_CONFIRM_TIMEOUT_MS") {
            config = config.with_confirm_timeout(millis("SHELL_CONFIRM_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("SHELL_EXIT_WINDOW_MS") {
            config = config.with_exit_window(millis("SHELL_EXIT_WINDOW_MS", &ms)?);
        }
        if let Some(event) = lookup("SHELL_COMMAND_EVENT") {
            config = config.with_command_event(event);
        }
        if let Some(mode) = lookup("SHELL_DELIVERY") {
            config = config.with_delivery(mode.parse()?);
        }
        if let Some(flag) = lookup("SHELL_BACK_HANDLER") {
            config = config.with_back_handler(!matches!(flag.as_str(), "0" | "false"));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_tab_routes(mut self, routes: Vec<String>) -> Self {
        self.tab_routes = routes;
        self
    }

    #[must_use]
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_exit_window(mut self, window: Duration) -> Self {
        self.exit_window = window;
        self
    }

    #[must_use]
    pub fn with_command_event(mut self, name: impl Into<String>) -> Self {
        self.command_event = name.into();
        self
    }

    #[must_use]
    pub fn with_delivery(mut self, mode: DeliveryMode) -> Self {
        self.delivery = mode;
        self
    }

    /// Disables the back handler on platforms without a hardware back button.
    #[must_use]
    pub fn with_back_handler(mut self, enabled: bool) -> Self {
        self.back_handler_enabled = enabled;
        self
    }

    #[must_use]
    pub fn home_url(&self) -> &Url {
        &self.home_url
    }

    #[must_use]
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    #[must_use]
    pub fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }
}

fn required_url(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Url, Error> {
    let raw = lookup(key).ok_or_else(|| Error::Config(format!("{key} is required")))?;
    raw.parse().map_err(|e| Error::Config(format!("{key}: {e}")))
}

fn millis(key: &str, raw: &str) -> Result<Duration, Error> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("SHELL_HOME_URL", "https://app.ppoppo.com/"),
        ("SHELL_LOGIN_URL", "https://app.ppoppo.com/login"),
    ];

    #[test]
    fn defaults_from_required_vars() {
        let config = ShellConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.home_url().as_str(), "https://app.ppoppo.com/");
        assert_eq!(config.login_url().as_str(), "https://app.ppoppo.com/login");
        assert_eq!(config.confirm_timeout(), Duration::from_secs(4));
        assert_eq!(config.exit_window, Duration::from_secs(2));
        assert_eq!(config.delivery, DeliveryMode::Session);
        assert_eq!(config.command_event, "nativeCommand");
        assert!(config.back_handler_enabled);
    }

    #[test]
    fn missing_login_url_is_config_error() {
        let err = ShellConfig::from_lookup(lookup(&REQUIRED[..1])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("SHELL_LOGIN_URL")));
    }

    #[test]
    fn invalid_url_is_config_error() {
        let vars = [
            ("SHELL_HOME_URL", "not a url"),
            ("SHELL_LOGIN_URL", "https://app.ppoppo.com/login"),
        ];
        assert!(matches!(
            ShellConfig::from_lookup(lookup(&vars)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn optional_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SHELL_TAB_ROUTES", "/, /feed ,,/me"),
            ("SHELL_CONFIRM_TIMEOUT_MS", "3000"),
            ("SHELL_EXIT_WINDOW_MS", "1500"),
            ("SHELL_COMMAND_EVENT", "hostCommand"),
            ("SHELL_DELIVERY", "Token"),
            ("SHELL_BACK_HANDLER", "false"),
        ]);
        let config = ShellConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.tab_routes, vec!["/", "/feed", "/me"]);
        assert_eq!(config.confirm_timeout(), Duration::from_millis(3000));
        assert_eq!(config.exit_window, Duration::from_millis(1500));
        assert_eq!(config.command_event, "hostCommand");
        assert_eq!(config.delivery, DeliveryMode::Token);
        assert!(!config.back_handler_enabled);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SHELL_CONFIRM_TIMEOUT_MS", "soon"));
        assert!(matches!(
            ShellConfig::from_lookup(lookup(&vars)),
            Err(Error::Config(msg)) if msg.contains("SHELL_CONFIRM_TIMEOUT_MS")
        ));
    }
}
