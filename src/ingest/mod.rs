//! Mail ingestion
//!
//! Turns one locally-stored email into a single `store` bus command line
//! on stdout. The gate is deliberately narrow: the subject must equal the
//! trigger phrase (case-insensitively) and the message must be multipart;
//! anything else is a silent no-op, not an error.
//!
//! Attachments are staged under the configured staging directory with
//! their declared filenames; the body is every `text/plain` part
//! concatenated, searched for `doc:`/`version:` lines. An unmatched
//! pattern yields empty name/version values — downstream rejection is the
//! host's concern.

pub mod mime;

use crate::bus::wire;
use crate::config::Settings;
use crate::error::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The `doc:`/`version:` body pattern
fn doc_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)doc:(.*)\nversion:(.*)").expect("hard-coded pattern")
    })
}

/// Ingest one email file
///
/// Returns the `store` command line to emit, or `None` for the silent
/// no-op cases.
pub fn ingest_file(path: &Path, settings: &Settings) -> Result<Option<String>> {
    let raw = fs::read_to_string(path)?;
    ingest(&raw, settings)
}

/// Ingest one raw email
pub fn ingest(raw: &str, settings: &Settings) -> Result<Option<String>> {
    let message = mime::Message::parse(raw)?;

    let Some(subject) = message.subject() else {
        return Ok(None);
    };
    if !subject.eq_ignore_ascii_case(&settings.trigger_subject) {
        return Ok(None);
    }
    if !message.is_multipart()? {
        return Ok(None);
    }

    let sender = message.from().unwrap_or("").to_string();

    fs::create_dir_all(&settings.staging)?;

    let mut body = String::new();
    let mut staged: Option<PathBuf> = None;

    for part in &message.parts {
        let content_type = part.content_type()?;
        if content_type.main_type == "text" && content_type.sub_type == "plain" {
            body.push_str(&part.body_text()?);
            body.push('\n');
        }

        if !part.is_attachment() {
            continue;
        }
        let Some(filename) = part.filename() else {
            continue;
        };

        let dest = settings.staging.join(&filename);
        fs::write(&dest, part.decode_body()?)?;
        tracing::info!(file = %dest.display(), "staged attachment");
        // When several parts carry attachments, the last staged path is
        // the one the store command references
        staged = Some(dest);
    }

    let (doc, version) = match doc_version_pattern().captures(&body) {
        Some(captures) => (
            captures[1].trim().to_string(),
            captures[2].trim().to_string(),
        ),
        None => (String::new(), String::new()),
    };

    let att = staged
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let line = wire::encode([
        ("dst", "docshelf"),
        ("tag", "store"),
        ("sender", sender.as_str()),
        ("att", att.as_str()),
        ("name", doc.as_str()),
        ("version", version.as_str()),
    ]);
    Ok(Some(line))
}
