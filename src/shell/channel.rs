use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::traits::ContentSurface;
use crate::error::Error;
use crate::protocol::{Command, Message};

/// Host→Content command injection.
///
/// A command becomes a `CustomEvent` dispatched on `window` with the JSON
/// payload as `detail`. Delivery is not acknowledged.
pub struct CommandChannel<S> {
    surface: Arc<S>,
    event_name: String,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for CommandChannel<S> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            event_name: self.event_name.clone(),
        }
    }
}

impl<S: ContentSurface> CommandChannel<S> {
    #[must_use]
    pub fn new(surface: Arc<S>, event_name: impl Into<String>) -> Self {
        Self {
            surface,
            event_name: event_name.into(),
        }
    }

    /// Injects `command` into the content.
    ///
    /// Returns `false` when the surface is not attached; the caller decides
    /// whether to retry.
    pub fn send(&self, command: &Command) -> bool {
        if !self.surface.is_attached() {
            tracing::warn!(command = command.kind(), "Content surface not attached, command dropped");
            return false;
        }
        match self.script_for(command) {
            Ok(script) => {
                self.surface.inject_script(&script);
                tracing::debug!(command = command.kind(), "Command injected");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, command = command.kind(), "Command serialization failed");
                false
            }
        }
    }

    /// Renders the script that dispatches `command` inside the content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the payload cannot be serialized.
    pub fn script_for(&self, command: &Command) -> Result<String, Error> {
        let detail = serde_json::to_string(command)?;
        let event = serde_json::to_string(&self.event_name)?;
        Ok(format!(
            "window.dispatchEvent(new CustomEvent({event}, {{ detail: {detail} }}));true;"
        ))
    }
}

/// Parses a raw Content→Host payload.
///
/// Malformed JSON, a missing `type` or an unknown `type` all yield `None`:
/// content noise never reaches the host as an error.
#[must_use]
pub fn parse_message(raw: &str) -> Option<Message> {
    let value: JsonValue = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed content message");
            return None;
        }
    };

    let Some(kind) = value.get("type").and_then(JsonValue::as_str) else {
        tracing::debug!("Ignoring content message without type");
        return None;
    };
    if !Message::KNOWN_TYPES.contains(&kind) {
        tracing::debug!(message_type = %kind, "Ignoring unknown content message");
        return None;
    }
    let kind = kind.to_string();

    match serde_json::from_value(value) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::debug!(error = %e, message_type = %kind, "Ignoring invalid content message");
            None
        }
    }
}
