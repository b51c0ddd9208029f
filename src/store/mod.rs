//! Versioned document storage
//!
//! Durable mapping from (document, version, filename) to byte content,
//! backed by a plain directory tree:
//!
//! ```text
//! <root>/
//!   <document>/
//!     <version>/
//!       <filename>
//! ```
//!
//! The root path comes from the one-line `<home>/etc/docshelf.conf` file;
//! every successful store appends one line to the audit log.

mod documents;

pub use documents::{DocumentStore, StoredFile};
