//! Bus message handling
//!
//! The host bus delivers inbound commands and accepts outbound relay
//! messages as single `key=value&...` lines. This module owns the wire
//! codec, the closed inbound command set, and the outbound relay
//! formatter.
//!
//! # Inbound tags
//!
//! - `docs` - list all document names
//! - `versions` - list version labels for a document
//! - `files` - list filenames for a version
//! - `send` - offer the files of a version as pending choices
//! - `docfile` - deliver one file
//! - `store` - persist a staged upload
//!
//! Any other tag may be a pending-choice keyword; the agent resolves it
//! against the sender's registered batch.

pub mod command;
pub mod relay;
pub mod wire;

pub use command::Command;
pub use relay::{Attachment, Channel, OutboundMessage, Payload};
pub use wire::InboundMessage;
