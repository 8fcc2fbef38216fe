//! Native side of the WebView shell.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ppoppo_shell::shell::{Shell, ShellConfig};
//!
//! // 1. Implement CredentialProvider, ContentSurface and CookieStore for your platform
//! // 2. Configure from environment
//! let config = ShellConfig::from_env()?;
//! let shell = Arc::new(Shell::new(config, provider.clone(), webview, cookies));
//!
//! // 3. Keep the session subscription alive for the shell's lifetime
//! let changes = provider.subscribe();
//! tokio::spawn({
//!     let shell = shell.clone();
//!     async move { shell.run_session_changes(changes).await }
//! });
//!
//! // 4. Load the first page once the stored session is known
//! let destination = shell.start().await;
//! ```

mod back;
mod channel;
mod config;
mod orchestrator;
mod sync;
mod traits;

pub use back::{BackDecision, BackNavigator};
pub use channel::{CommandChannel, parse_message};
pub use config::{DeliveryMode, ShellConfig};
pub use orchestrator::{Destination, Shell};
pub use sync::{AuthStatus, SyncOutcome, Synchronizer};
pub use traits::{ContentSurface, CookieStore, CredentialProvider, StoreError};
