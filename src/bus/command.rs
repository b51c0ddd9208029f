//! Inbound command set
//!
//! A closed enum, one variant per bus tag, dispatched through a single
//! exhaustive match in the agent. Parameters are typed up front here so
//! the handlers never touch the raw parameter map.

use crate::bus::wire::{InboundMessage, WireError};
use std::path::PathBuf;

/// One inbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all document names
    Docs { sender: String },

    /// List the version labels of a document
    Versions { document: String, sender: String },

    /// List the filenames in a version
    Files {
        name: String,
        version: String,
        sender: String,
    },

    /// Offer the files of a version as pending choices
    Send {
        name: String,
        version: String,
        sender: String,
        to: Option<String>,
    },

    /// Deliver one file, optionally to an alternate recipient
    DocFile {
        name: String,
        version: String,
        filename: String,
        sender: String,
        to: Option<String>,
    },

    /// Persist a staged upload under (name, version)
    Store {
        name: String,
        version: String,
        att: PathBuf,
        sender: String,
        docname: Option<String>,
    },
}

impl Command {
    /// Build a command from a wire message
    ///
    /// Returns `Ok(None)` for tags outside the command set; those may be
    /// pending-choice keywords and are the agent's problem.
    pub fn from_wire(msg: &InboundMessage) -> Result<Option<Self>, WireError> {
        let command = match msg.tag.as_str() {
            "docs" => Command::Docs {
                sender: msg.require("sender")?.to_string(),
            },
            "versions" => Command::Versions {
                document: msg.require("document")?.to_string(),
                sender: msg.require("sender")?.to_string(),
            },
            "files" => Command::Files {
                name: msg.require("name")?.to_string(),
                version: msg.require("version")?.to_string(),
                sender: msg.require("sender")?.to_string(),
            },
            "send" => Command::Send {
                name: msg.require("name")?.to_string(),
                version: msg.require("version")?.to_string(),
                sender: msg.require("sender")?.to_string(),
                to: msg.get("to").map(str::to_string),
            },
            "docfile" => Command::DocFile {
                name: msg.require("name")?.to_string(),
                version: msg.require("version")?.to_string(),
                filename: msg.require("filename")?.to_string(),
                sender: msg.require("sender")?.to_string(),
                to: msg.get("to").map(str::to_string),
            },
            "store" => Command::Store {
                name: msg.require("name")?.to_string(),
                version: msg.require("version")?.to_string(),
                att: PathBuf::from(msg.require("att")?),
                sender: msg.require("sender")?.to_string(),
                docname: msg.get("docname").map(str::to_string),
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// The requesting user
    pub fn sender(&self) -> &str {
        match self {
            Command::Docs { sender }
            | Command::Versions { sender, .. }
            | Command::Files { sender, .. }
            | Command::Send { sender, .. }
            | Command::DocFile { sender, .. }
            | Command::Store { sender, .. } => sender,
        }
    }
}
