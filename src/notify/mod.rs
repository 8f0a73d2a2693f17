//! Notification relay between a chat client and a remote desktop
//!
//! The sending side encodes chat highlights and private messages into a small
//! newline-separated frame and ships it over TCP or through a shell command
//! (typically `ssh`). The receiving side decodes the frame and launches the
//! desktop notification tool and a sound player.

pub mod client;
pub mod error;
pub mod notifier;
pub mod protocol;
pub mod relay;
pub mod server;

pub use client::{send, Transport};
pub use error::{DeliveryError, NotifierError, ParseError, RelayError, ValidationError};
pub use notifier::{DesktopNotifier, Notifier};
pub use protocol::{decode, encode, MessageType, NotificationEvent, Urgency};
pub use relay::{relay, ChatKind, ChatMessage};
pub use server::{run_listener, run_stdin};
