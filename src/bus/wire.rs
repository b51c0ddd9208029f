//! Bus wire codec
//!
//! Messages travel as one line of `key=value` pairs joined by `&`;
//! outbound lines carry a leading `message ` marker for the relay. Values
//! are passed through verbatim — the bus performs no escaping.

use std::collections::BTreeMap;
use thiserror::Error;

/// Marker prefix on outbound wire lines
pub const OUTBOUND_PREFIX: &str = "message ";

/// Wire codec errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("empty message")]
    Empty,

    #[error("malformed pair '{0}': expected key=value")]
    MalformedPair(String),

    #[error("message has no tag")]
    MissingTag,

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),
}

/// One inbound bus message: a tag plus its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Dispatch tag
    pub tag: String,
    params: BTreeMap<String, String>,
}

impl InboundMessage {
    /// Parse one wire line
    ///
    /// Accepts lines with or without the `message ` marker, so relayed
    /// output can be fed back in unchanged.
    pub fn parse(line: &str) -> Result<Self, WireError> {
        let params = parse_pairs(line)?;
        let tag = params.get("tag").cloned().ok_or(WireError::MissingTag)?;
        Ok(Self { tag, params })
    }

    /// Get an optional parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a required parameter
    pub fn require(&self, key: &str) -> Result<&str, WireError> {
        self.get(key)
            .ok_or_else(|| WireError::MissingParameter(key.to_string()))
    }
}

/// Parse a wire line into its key=value pairs
pub fn parse_pairs(line: &str) -> Result<BTreeMap<String, String>, WireError> {
    let line = line.trim();
    let line = line.strip_prefix(OUTBOUND_PREFIX).unwrap_or(line);

    if line.is_empty() {
        return Err(WireError::Empty);
    }

    let mut pairs = BTreeMap::new();
    for pair in line.split('&') {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| WireError::MalformedPair(pair.to_string()))?;
        pairs.insert(key.to_string(), value.to_string());
    }
    Ok(pairs)
}

/// Encode ordered pairs as one outbound wire line
pub fn encode<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let body = pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{OUTBOUND_PREFIX}{body}")
}
