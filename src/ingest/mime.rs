//! Minimal MIME reading
//!
//! Header parsing with continuation lines, content types with parameters,
//! transfer decoding, and multipart splitting. Covers the reading half of
//! MIME that mail ingestion needs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// MIME parsing errors
#[derive(Debug, Error)]
pub enum MimeError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid UTF-8 in text part: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for MIME operations
pub type Result<T> = std::result::Result<T, MimeError>;

/// Collection of message headers, name-insensitive
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Create an empty header collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header value
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Get the first value for a header
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Parse headers from raw text with continuation-line folding
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();
        let mut current_name: Option<String> = None;
        let mut current_value = String::new();

        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                // Folded continuation of the previous header
                if current_name.is_some() {
                    current_value.push(' ');
                    current_value.push_str(line.trim());
                }
                continue;
            }

            if let Some(name) = current_name.take() {
                headers.add(name, current_value.trim());
                current_value.clear();
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    current_name = Some(name.trim().to_string());
                    current_value = value.trim().to_string();
                }
                None => {
                    return Err(MimeError::Parse(format!("malformed header line: {line}")));
                }
            }
        }

        if let Some(name) = current_name {
            headers.add(name, current_value.trim());
        }

        Ok(headers)
    }
}

/// A parsed content type with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type, lowercased (e.g. `text`, `multipart`)
    pub main_type: String,
    /// Sub type, lowercased (e.g. `plain`, `mixed`)
    pub sub_type: String,
    /// Parameters with lowercased names, quotes stripped from values
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// The default `text/plain`
    pub fn text_plain() -> Self {
        Self {
            main_type: "text".to_string(),
            sub_type: "plain".to_string(),
            parameters: HashMap::new(),
        }
    }

    /// Parse a Content-Type header value
    pub fn parse(value: &str) -> Result<Self> {
        let mut segments = value.split(';');
        let mime = segments
            .next()
            .ok_or_else(|| MimeError::Parse("empty content type".to_string()))?;

        let (main_type, sub_type) = mime
            .trim()
            .split_once('/')
            .ok_or_else(|| MimeError::Parse(format!("invalid content type: {mime}")))?;

        Ok(Self {
            main_type: main_type.trim().to_lowercase(),
            sub_type: sub_type.trim().to_lowercase(),
            parameters: parse_parameters(segments),
        })
    }

    /// Whether this is any multipart type
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// The boundary parameter, for multipart types
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)
    }
}

/// Parse `name=value` segments of a structured header value
fn parse_parameters<'a>(segments: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
    let mut parameters = HashMap::new();
    for segment in segments {
        if let Some((name, value)) = segment.split_once('=') {
            let value = value.trim().trim_matches('"');
            parameters.insert(name.trim().to_lowercase(), value.to_string());
        }
    }
    parameters
}

/// Transfer encoding of a part body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    SevenBit,
    EightBit,
    Base64,
    QuotedPrintable,
    Binary,
}

impl TransferEncoding {
    /// Parse a Content-Transfer-Encoding value; unknown values fall back
    /// to 7bit
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

/// One part of a message: headers plus raw body
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers
    pub headers: Headers,
    /// Raw body, still transfer-encoded
    pub body: Vec<u8>,
}

impl Part {
    /// Create a part
    pub fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parse one multipart section
    pub fn parse(text: &str) -> Result<Self> {
        let (head, body) = split_head_body(text);
        let headers = Headers::parse(&head)?;
        Ok(Self::new(headers, body.into_bytes()))
    }

    /// The part's content type, defaulting to `text/plain`
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// The part's transfer encoding
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Whether the part carries a Content-Disposition header
    ///
    /// Any disposition counts as an attachment, inline included.
    pub fn is_attachment(&self) -> bool {
        self.headers.get("content-disposition").is_some()
    }

    /// The declared filename, from the disposition or the content type
    pub fn filename(&self) -> Option<String> {
        if let Some(disposition) = self.headers.get("content-disposition") {
            let parameters = parse_parameters(disposition.split(';').skip(1));
            if let Some(filename) = parameters.get("filename") {
                return Some(filename.clone());
            }
        }
        self.content_type()
            .ok()
            .and_then(|ct| ct.parameters.get("name").cloned())
    }

    /// Decode the body according to the transfer encoding
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                let text = String::from_utf8_lossy(&self.body);
                let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                Ok(STANDARD.decode(cleaned)?)
            }
            TransferEncoding::QuotedPrintable => {
                let text = String::from_utf8_lossy(&self.body);
                Ok(decode_quoted_printable(&text))
            }
            _ => Ok(self.body.clone()),
        }
    }

    /// The decoded body as UTF-8 text
    pub fn body_text(&self) -> Result<String> {
        Ok(String::from_utf8(self.decode_body()?)?)
    }
}

/// A parsed MIME message
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers
    pub headers: Headers,
    /// Parts of a multipart message, empty otherwise
    pub parts: Vec<Part>,
    /// Body of a single-part message
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Parse a complete raw message
    pub fn parse(raw: &str) -> Result<Self> {
        let (head, body) = split_head_body(raw);
        let headers = Headers::parse(&head)?;

        let content_type = headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;

        if content_type.is_multipart() {
            let boundary = content_type
                .boundary()
                .ok_or_else(|| MimeError::Parse("multipart message without boundary".to_string()))?
                .to_string();
            let parts = split_multipart(&body, &boundary)
                .iter()
                .map(|section| Part::parse(section))
                .collect::<Result<Vec<_>>>()?;
            Ok(Self {
                headers,
                parts,
                body: None,
            })
        } else {
            Ok(Self {
                headers,
                parts: Vec::new(),
                body: Some(body.into_bytes()),
            })
        }
    }

    /// The From header
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// The Subject header
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Whether the message declares a multipart content type
    pub fn is_multipart(&self) -> Result<bool> {
        let content_type = self
            .headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;
        Ok(content_type.is_multipart())
    }
}

/// Split raw message text into header text and body text at the first
/// blank line
///
/// Line endings are normalized to `\n`; the line break preceding a
/// multipart boundary belongs to the boundary, so the body carries no
/// trailing newline.
fn split_head_body(text: &str) -> (String, String) {
    let mut head = String::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if in_body {
            body_lines.push(line);
        } else if line.is_empty() {
            in_body = true;
        } else {
            head.push_str(line);
            head.push('\n');
        }
    }

    (head, body_lines.join("\n"))
}

/// Split a multipart body into its sections
fn split_multipart(body: &str, boundary: &str) -> Vec<String> {
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut sections = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in body.lines() {
        let trimmed = line.trim_end();
        if trimmed == close {
            if let Some(section) = current.take() {
                sections.push(section.join("\n"));
            }
            break;
        }
        if trimmed == open {
            if let Some(section) = current.take() {
                sections.push(section.join("\n"));
            }
            current = Some(Vec::new());
            continue;
        }
        if let Some(section) = current.as_mut() {
            section.push(line);
        }
    }

    if let Some(section) = current.take() {
        sections.push(section.join("\n"));
    }

    sections
}

/// Decode quoted-printable text, tolerating malformed escapes by passing
/// them through
fn decode_quoted_printable(input: &str) -> Vec<u8> {
    let mut out = Vec::new();

    for line in input.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (content, soft_break) = match line.strip_suffix('=') {
            Some(rest) => (rest, true),
            None => (line, false),
        };

        let bytes = content.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'=' && i + 3 <= bytes.len() {
                if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                    if let Ok(byte) = u8::from_str_radix(hex, 16) {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                }
            }
            out.push(bytes[i]);
            i += 1;
        }

        if !soft_break {
            out.push(b'\n');
        }
    }

    if out.last() == Some(&b'\n') {
        out.pop();
    }
    out
}
