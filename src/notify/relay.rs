//! Chat client glue: decides which chat messages become notifications

use super::client;
use super::error::RelayError;
use super::protocol::{encode, MessageType, NotificationEvent, SEPARATOR};
use crate::app::SenderConfig;

/// Channel name used for private conversations
pub const PRIVATE_CHANNEL: &str = "me";

/// Where a chat message arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// Channel or other shared buffer
    Message,
    /// One-to-one conversation
    Private,
}

/// A message as reported by the chat client's print hook
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub kind: ChatKind,
    pub buffer_name: String,
    pub is_highlight: bool,
    pub sender: String,
    pub body: String,
}

/// Build the notification for `message`, if it warrants one
pub fn event_for(config: &SenderConfig, message: &ChatMessage) -> Option<NotificationEvent> {
    let private = message.kind == ChatKind::Private;
    let message_type = match (private, message.is_highlight) {
        (true, true) => MessageType::PrivateHighlight,
        (true, false) => MessageType::Private,
        (false, true) => MessageType::Highlight,
        (false, false) => return None,
    };

    let icon = if private && !config.pm_icon.is_empty() {
        &config.pm_icon
    } else {
        &config.icon
    };
    let channel = if private {
        PRIVATE_CHANNEL
    } else {
        message.buffer_name.as_str()
    };
    let display_time_ms = if private {
        config.private_display_time_ms
    } else {
        config.highlight_display_time_ms
    };

    Some(NotificationEvent {
        message_type,
        urgency: config.urgency,
        icon: single_line(icon),
        display_time_ms,
        sender: single_line(&message.sender),
        channel: single_line(channel),
        body: message.body.clone(),
    })
}

/// Relay one chat message; `Ok(false)` when it did not qualify
pub async fn relay(config: &SenderConfig, message: &ChatMessage) -> Result<bool, RelayError> {
    let Some(event) = event_for(config, message) else {
        return Ok(false);
    };

    let payload = encode(&event)?;
    client::send(&payload, config).await?;

    tracing::info!("Relayed {} from {}", event.message_type, event.title());
    Ok(true)
}

fn single_line(value: &str) -> String {
    value.replace(SEPARATOR, " ")
}
