//! Wire payloads exchanged with the web content.
//!
//! Both directions use a JSON object tagged by `type`:
//!
//! ```text
//! host ── Command ──► window CustomEvent(detail)
//! host ◄── Message ── postMessage(JSON string)
//! ```

use serde::{Deserialize, Serialize};

use crate::route::RouteInfo;

/// Host→Content command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    NavigateHome,
    NavigateTo {
        path: String,
    },
    GetRouteInfo,
    SetSession {
        access_token: String,
        refresh_token: String,
    },
    /// Single-token delivery; `None` clears the token.
    SetToken {
        token: Option<String>,
    },
    ClearSession,
}

impl Command {
    /// Wire tag, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NavigateHome => "NAVIGATE_HOME",
            Self::NavigateTo { .. } => "NAVIGATE_TO",
            Self::GetRouteInfo => "GET_ROUTE_INFO",
            Self::SetSession { .. } => "SET_SESSION",
            Self::SetToken { .. } => "SET_TOKEN",
            Self::ClearSession => "CLEAR_SESSION",
        }
    }
}

/// Content→Host message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    RouteInfo { payload: RouteInfo },
    Logout,
    RequestLogin,
    WebReady,
    TokenReceived { success: bool },
    SessionSet { success: bool },
    RequestTokenRefresh,
    RequestSessionRefresh,
    SessionExpired,
}

impl Message {
    pub(crate) const KNOWN_TYPES: &'static [&'static str] = &[
        "ROUTE_INFO",
        "LOGOUT",
        "REQUEST_LOGIN",
        "WEB_READY",
        "TOKEN_RECEIVED",
        "SESSION_SET",
        "REQUEST_TOKEN_REFRESH",
        "REQUEST_SESSION_REFRESH",
        "SESSION_EXPIRED",
    ];

    /// Acknowledgment of a pushed token or session, if this is one.
    #[must_use]
    pub fn confirmation(&self) -> Option<bool> {
        match self {
            Self::TokenReceived { success } | Self::SessionSet { success } => Some(*success),
            _ => None,
        }
    }
}
