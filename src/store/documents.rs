//! Filesystem-backed document store

use crate::config::Settings;
use crate::error::{DocshelfError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A retrieved file with its inferred media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Original filename within the version
    pub filename: String,
    /// Media type inferred from the extension, `application/octet-stream`
    /// when unknown
    pub media_type: String,
    /// Raw file content
    pub bytes: Vec<u8>,
}

/// Filesystem document store
///
/// The root is loaded once at construction; `reload` re-reads the conf
/// file when the host rewrites it.
///
/// Document, version, and filename tokens are joined into paths with
/// existence checks only — callers own any sanitization policy.
pub struct DocumentStore {
    root: PathBuf,
    log_file: PathBuf,
}

impl DocumentStore {
    /// Open the store described by the settings, reading the root from the
    /// one-line conf file
    pub fn open(settings: &Settings) -> Result<Self> {
        let root = read_root(&settings.conf_file())?;
        Ok(Self {
            root,
            log_file: settings.log_file(),
        })
    }

    /// Create a store over an explicit root and audit log path
    pub fn with_root(root: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            log_file: log_file.into(),
        }
    }

    /// Re-read the root from the conf file
    pub fn reload(&mut self, settings: &Settings) -> Result<()> {
        self.root = read_root(&settings.conf_file())?;
        self.log_file = settings.log_file();
        Ok(())
    }

    /// The document tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all document names, sorted lexicographically
    pub fn list_documents(&self) -> Result<Vec<String>> {
        Ok(sorted_entries(&self.root)?)
    }

    /// List the version labels of a document, sorted lexicographically
    pub fn list_versions(&self, document: &str) -> Result<Vec<String>> {
        let dir = self.root.join(document);
        if !dir.is_dir() {
            return Err(DocshelfError::DocumentNotFound(document.to_string()));
        }
        Ok(sorted_entries(&dir)?)
    }

    /// List the filenames in a version, sorted lexicographically
    ///
    /// Subdirectories are excluded. An existing version with zero files
    /// yields `Ok(vec![])`, which callers must render distinctly from the
    /// version-not-found error.
    pub fn list_files(&self, document: &str, version: &str) -> Result<Vec<String>> {
        let dir = self.root.join(document).join(version);
        if !dir.is_dir() {
            return Err(DocshelfError::VersionNotFound {
                document: document.to_string(),
                version: version.to_string(),
            });
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read one file and infer its media type from the extension
    pub fn get_file(&self, document: &str, version: &str, filename: &str) -> Result<StoredFile> {
        let path = self.root.join(document).join(version).join(filename);
        if !path.is_file() {
            return Err(DocshelfError::FileNotFound {
                document: document.to_string(),
                version: version.to_string(),
                filename: filename.to_string(),
            });
        }

        let bytes = fs::read(&path)?;
        let media_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(StoredFile {
            filename: filename.to_string(),
            media_type,
            bytes,
        })
    }

    /// Move `source` into the store as `dest_name` under (document, version)
    ///
    /// Creates the version directory when absent and overwrites any
    /// existing file at the destination. Appends one audit line; a failed
    /// audit append is logged and swallowed, every other I/O error
    /// propagates.
    pub fn put_file(
        &self,
        document: &str,
        version: &str,
        source: &Path,
        dest_name: &str,
        actor: &str,
    ) -> Result<PathBuf> {
        let dir = self.root.join(document).join(version);
        fs::create_dir_all(&dir)?;

        let dest = dir.join(dest_name);
        move_file(source, &dest)?;

        tracing::info!(
            document,
            version,
            file = dest_name,
            actor,
            "stored document file"
        );
        self.append_audit(version, document, dest_name, actor);

        Ok(dest)
    }

    fn append_audit(&self, version: &str, document: &str, filename: &str, actor: &str) {
        let line = format!("Added version {version} of {document} ({filename}) - by {actor}\n");
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .and_then(|mut log| log.write_all(line.as_bytes()));

        if let Err(e) = result {
            tracing::warn!(path = %self.log_file.display(), error = %e, "audit log append failed");
        }
    }
}

/// Read the store root from the one-line conf file
fn read_root(conf_file: &Path) -> Result<PathBuf> {
    let content = fs::read_to_string(conf_file).map_err(|e| {
        DocshelfError::Config(format!("cannot read {}: {}", conf_file.display(), e))
    })?;

    let line = content.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(DocshelfError::Config(format!(
            "store root file {} is empty",
            conf_file.display()
        )));
    }

    Ok(PathBuf::from(line))
}

/// Move a file, falling back to copy+unlink when rename crosses devices
fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, dest)?;
            fs::remove_file(source)
        }
    }
}

/// Sorted directory entry names
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
