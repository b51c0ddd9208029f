//! Outbound relay messages
//!
//! Builds the feedback the agent hands to the external relay: a plain
//! text notice over instant messaging, or a base64 file attachment with a
//! subject over email. Construction never fails; recipients pass through
//! unvalidated — addressing is the relay's concern.

use crate::bus::wire;
use crate::store::StoredFile;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// Delivery channel for outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Instant message, text only
    Jabber,
    /// Email, text or attachment with subject
    Mail,
}

impl Channel {
    /// Wire value of the channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Jabber => "jabber",
            Channel::Mail => "mail",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A base64-encoded file attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Media type inferred from the filename extension
    pub media_type: String,
    /// Original filename
    pub filename: String,
    payload: String,
}

impl Attachment {
    /// Encode raw bytes as an attachment
    pub fn from_bytes(
        bytes: &[u8],
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            media_type: media_type.into(),
            filename: filename.into(),
            payload: STANDARD.encode(bytes),
        }
    }

    /// Encode a file retrieved from the document store
    pub fn from_stored(file: &StoredFile) -> Self {
        Self::from_bytes(&file.bytes, &file.media_type, &file.filename)
    }

    /// The base64 payload
    pub fn payload_b64(&self) -> &str {
        &self.payload
    }

    /// Wire serialization: `<media type>;<filename>;<base64>`
    pub fn to_field(&self) -> String {
        format!("{};{};{}", self.media_type, self.filename, self.payload)
    }
}

/// Message payload: plain text or an attachment with subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Attachment {
        attachment: Attachment,
        subject: String,
    },
}

/// One outbound relay message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient, passed through to the relay unvalidated
    pub to: String,
    /// Delivery channel
    pub channel: Channel,
    /// Text or attachment payload
    pub payload: Payload,
}

impl OutboundMessage {
    /// A plain text notice over instant messaging
    ///
    /// All failure notices use this form regardless of the channel the
    /// triggering request asked for.
    pub fn notice(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            channel: Channel::Jabber,
            payload: Payload::Text(text.into()),
        }
    }

    /// A file attachment over email
    pub fn attachment(
        to: impl Into<String>,
        attachment: Attachment,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            channel: Channel::Mail,
            payload: Payload::Attachment {
                attachment,
                subject: subject.into(),
            },
        }
    }

    /// Serialize to one relay wire line
    pub fn to_wire(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = vec![
            ("dst", "relay"),
            ("tag", "relay"),
            ("relayto", self.channel.as_str()),
            ("to", &self.to),
        ];

        match &self.payload {
            Payload::Text(msg) => {
                pairs.push(("msg", msg));
                wire::encode(pairs)
            }
            Payload::Attachment {
                attachment,
                subject,
            } => {
                let field = attachment.to_field();
                pairs.push(("subject", subject));
                pairs.push(("att", &field));
                wire::encode(pairs)
            }
        }
    }
}
