#![doc = include_str!("../README.md")]

pub mod deep_link;
pub mod error;
#[cfg(feature = "oauth")]
pub mod oauth;
#[cfg(feature = "oauth")]
pub mod pkce;
pub mod protocol;
#[cfg(feature = "oauth")]
pub mod provider;
pub mod route;
pub mod shell;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use deep_link::{CallbackPayload, parse_callback};
pub use error::Error;
#[cfg(feature = "oauth")]
pub use oauth::{AuthClient, AuthorizationRequest, OAuthConfig, TokenResponse};
#[cfg(feature = "oauth")]
pub use pkce::{PkcePair, generate_state};
pub use protocol::{Command, Message};
#[cfg(feature = "oauth")]
pub use provider::{AuthSurface, BrowserProvider, SecureStore};
pub use route::{RouteClassifier, RouteInfo};
pub use shell::{
    AuthStatus, BackDecision, ContentSurface, CookieStore, CredentialProvider, DeliveryMode,
    Destination, Shell, ShellConfig, SyncOutcome, Synchronizer,
};
pub use types::{Session, SessionChange, SessionEvent, SignInOptions, SignInOutcome, UserId};
