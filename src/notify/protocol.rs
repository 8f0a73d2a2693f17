//! Wire format for notification events
//!
//! A frame is six newline-separated fields:
//!
//! ```text
//! message_type \n urgency \n icon \n display_time_ms \n <sender> to <channel> \n body
//! ```
//!
//! The body is the remainder of the payload and may itself contain newlines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{ParseError, ValidationError};

/// Field separator on the wire
pub const SEPARATOR: char = '\n';

/// Word joining sender and channel in the title field
pub const TITLE_JOINER: &str = " to ";

/// Number of separator-delimited fields in a frame
pub const FIELD_COUNT: usize = 6;

/// What triggered the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Private,
    Highlight,
    PrivateHighlight,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Private => "private",
            MessageType::Highlight => "highlight",
            MessageType::PrivateHighlight => "private_highlight",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(MessageType::Private),
            "highlight" => Ok(MessageType::Highlight),
            "private_highlight" => Ok(MessageType::PrivateHighlight),
            other => Err(ParseError::UnknownMessageType(other.to_string())),
        }
    }
}

/// Desktop notification urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Urgency::Low),
            "normal" => Ok(Urgency::Normal),
            "critical" => Ok(Urgency::Critical),
            other => Err(ParseError::UnknownUrgency(other.to_string())),
        }
    }
}

/// A single chat notification as it travels between hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub message_type: MessageType,
    pub urgency: Urgency,
    pub icon: String,
    /// 0 keeps the notification until it is dismissed
    pub display_time_ms: u32,
    pub sender: String,
    pub channel: String,
    pub body: String,
}

impl NotificationEvent {
    /// Title shown by the desktop notifier, e.g. `alice to #dev`
    pub fn title(&self) -> String {
        format!("{}{}{}", self.sender, TITLE_JOINER, self.channel)
    }

    /// Check that the event can be framed without ambiguity
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("icon", self.icon.as_str()),
            ("sender", self.sender.as_str()),
            ("channel", self.channel.as_str()),
        ];
        for (field, value) in fields {
            if value.contains(SEPARATOR) {
                return Err(ValidationError::SeparatorInField { field });
            }
        }
        // The decoder splits at the first joiner, which must follow the sender
        if self.title().find(TITLE_JOINER) != Some(self.sender.len()) {
            return Err(ValidationError::AmbiguousSender(self.sender.clone()));
        }
        Ok(())
    }
}

/// Serialize an event into a wire frame
pub fn encode(event: &NotificationEvent) -> Result<Vec<u8>, ValidationError> {
    event.validate()?;

    let display_time = event.display_time_ms.to_string();
    let title = event.title();
    let frame = [
        event.message_type.as_str(),
        event.urgency.as_str(),
        event.icon.as_str(),
        display_time.as_str(),
        title.as_str(),
        event.body.as_str(),
    ]
    .join("\n");

    Ok(frame.into_bytes())
}

/// Parse a wire frame back into an event
pub fn decode(bytes: &[u8]) -> Result<NotificationEvent, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;

    let parts: Vec<&str> = text.splitn(FIELD_COUNT, SEPARATOR).collect();
    if parts.len() < FIELD_COUNT {
        return Err(ParseError::MissingFields {
            expected: FIELD_COUNT,
            found: parts.len(),
        });
    }

    let message_type = parts[0].parse()?;
    let urgency = parts[1].parse()?;
    let display_time_ms = parts[3]
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidDisplayTime(parts[3].to_string()))?;

    // Nicknames never contain the joiner, so the first occurrence splits the title
    let (sender, channel) = parts[4]
        .split_once(TITLE_JOINER)
        .unwrap_or((parts[4], ""));

    Ok(NotificationEvent {
        message_type,
        urgency,
        icon: parts[2].to_string(),
        display_time_ms,
        sender: sender.to_string(),
        channel: channel.to_string(),
        body: parts[5].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NotificationEvent {
        NotificationEvent {
            message_type: MessageType::Highlight,
            urgency: Urgency::Normal,
            icon: "utilities-terminal".to_string(),
            display_time_ms: 30000,
            sender: "alice".to_string(),
            channel: "#dev".to_string(),
            body: "hello there".to_string(),
        }
    }

    #[test]
    fn test_encode_example() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "highlight\nnormal\nutilities-terminal\n30000\nalice to #dev\nhello there"
        );
    }

    #[test]
    fn test_decode_example() {
        let event =
            decode(b"highlight\nnormal\nutilities-terminal\n30000\nalice to #dev\nhello there")
                .unwrap();
        assert_eq!(event, sample());
        assert_eq!(event.title(), "alice to #dev");
    }

    #[test]
    fn test_round_trip_private() {
        let event = NotificationEvent {
            message_type: MessageType::PrivateHighlight,
            urgency: Urgency::Critical,
            icon: "emblem-favorite".to_string(),
            display_time_ms: 0,
            sender: "bob".to_string(),
            channel: "me".to_string(),
            body: String::new(),
        };
        assert_eq!(decode(&encode(&event).unwrap()).unwrap(), event);
    }

    #[test]
    fn test_body_keeps_newlines() {
        let mut event = sample();
        event.body = "line one\nline two\n\nline four\n".to_string();
        let decoded = decode(&encode(&event).unwrap()).unwrap();
        assert_eq!(decoded.body, event.body);
    }

    #[test]
    fn test_channel_may_contain_joiner() {
        let mut event = sample();
        event.channel = "#talk to me".to_string();
        let decoded = decode(&encode(&event).unwrap()).unwrap();
        assert_eq!(decoded.channel, "#talk to me");
        assert_eq!(decoded.sender, "alice");
    }

    #[test]
    fn test_encode_rejects_newline_in_header_fields() {
        let mut event = sample();
        event.icon = "bad\nicon".to_string();
        assert_eq!(
            encode(&event),
            Err(ValidationError::SeparatorInField { field: "icon" })
        );

        let mut event = sample();
        event.channel = "#dev\n".to_string();
        assert_eq!(
            encode(&event),
            Err(ValidationError::SeparatorInField { field: "channel" })
        );
    }

    #[test]
    fn test_encode_rejects_ambiguous_sender() {
        let mut event = sample();
        event.sender = "alice to bob".to_string();
        assert!(matches!(
            encode(&event),
            Err(ValidationError::AmbiguousSender(_))
        ));
    }

    #[test]
    fn test_encode_rejects_sender_ending_in_joiner_word() {
        let mut event = sample();
        event.sender = "x to".to_string();
        assert_eq!(
            encode(&event),
            Err(ValidationError::AmbiguousSender("x to".to_string()))
        );

        event.sender = "to".to_string();
        let decoded = decode(&encode(&event).unwrap()).unwrap();
        assert_eq!(decoded, event);

        event.sender = "tomato".to_string();
        event.channel = "to #dev".to_string();
        let decoded = decode(&encode(&event).unwrap()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_decode_missing_fields() {
        assert_eq!(
            decode(b"highlight\nnormal\nicon\n100\nalice to #dev"),
            Err(ParseError::MissingFields {
                expected: 6,
                found: 5
            })
        );
        assert!(matches!(
            decode(b""),
            Err(ParseError::MissingFields { found: 1, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        assert_eq!(
            decode(b"shout\nnormal\nicon\n100\na to b\nbody"),
            Err(ParseError::UnknownMessageType("shout".to_string()))
        );
        assert_eq!(
            decode(b"private\nurgent\nicon\n100\na to b\nbody"),
            Err(ParseError::UnknownUrgency("urgent".to_string()))
        );
        assert_eq!(
            decode(b"private\nlow\nicon\n-5\na to b\nbody"),
            Err(ParseError::InvalidDisplayTime("-5".to_string()))
        );
        assert_eq!(
            decode(&[0xff, b'\n', 0xfe]),
            Err(ParseError::InvalidUtf8)
        );
    }

    #[test]
    fn test_decode_title_without_joiner() {
        let event = decode(b"private\nlow\nicon\n10\nsomebody\nhi").unwrap();
        assert_eq!(event.sender, "somebody");
        assert_eq!(event.channel, "");
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(
            "private_highlight".parse::<MessageType>().unwrap(),
            MessageType::PrivateHighlight
        );
        assert_eq!(Urgency::Critical.to_string(), "critical");
        assert_eq!(Urgency::default(), Urgency::Normal);
    }
}
