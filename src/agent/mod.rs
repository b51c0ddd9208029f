//! Command handlers
//!
//! The agent owns the document store, the pending-choice registry, and
//! the settings, and turns each inbound command into outbound relay
//! messages. Not-found and empty-version conditions become user notices;
//! storage faults propagate and terminate the command.

use crate::bus::{Attachment, Command, InboundMessage, OutboundMessage};
use crate::config::Settings;
use crate::error::{DocshelfError, Result};
use crate::registry::ChoiceRegistry;
use crate::store::DocumentStore;
use std::path::Path;

/// The docshelf bus agent
pub struct Agent {
    store: DocumentStore,
    registry: ChoiceRegistry,
    settings: Settings,
}

impl Agent {
    /// Create an agent from settings, opening the store
    pub fn new(settings: Settings) -> Result<Self> {
        let store = DocumentStore::open(&settings)?;
        let registry = ChoiceRegistry::new(settings.choice_ttl());
        Ok(Self {
            store,
            registry,
            settings,
        })
    }

    /// Create an agent over an already-opened store (used by tests)
    pub fn with_store(store: DocumentStore, settings: Settings) -> Self {
        let registry = ChoiceRegistry::new(settings.choice_ttl());
        Self {
            store,
            registry,
            settings,
        }
    }

    /// Handle one inbound bus message
    ///
    /// Known tags dispatch to their handler. An unknown tag is checked
    /// against the sender's pending choices; a miss produces no output.
    pub fn dispatch(&mut self, msg: &InboundMessage) -> Result<Vec<OutboundMessage>> {
        if let Some(command) = Command::from_wire(msg)? {
            return self.handle(command);
        }

        let Some(sender) = msg.get("sender") else {
            tracing::debug!(tag = %msg.tag, "ignoring message without sender");
            return Ok(Vec::new());
        };
        let sender = sender.to_string();

        match self.registry.resolve(&sender, &msg.tag) {
            Some(command) => self.handle(command),
            None => {
                tracing::debug!(tag = %msg.tag, sender = %sender, "ignoring unknown tag");
                Ok(Vec::new())
            }
        }
    }

    /// Handle one typed command
    pub fn handle(&mut self, command: Command) -> Result<Vec<OutboundMessage>> {
        match command {
            Command::Docs { sender } => self.docs(&sender),
            Command::Versions { document, sender } => self.versions(&document, &sender),
            Command::Files {
                name,
                version,
                sender,
            } => self.files(&name, &version, &sender),
            Command::Send {
                name,
                version,
                sender,
                to,
            } => self.send(&name, &version, &sender, to),
            Command::DocFile {
                name,
                version,
                filename,
                sender,
                to,
            } => self.doc_file(&name, &version, &filename, &sender, to),
            Command::Store {
                name,
                version,
                att,
                sender,
                docname,
            } => self.store_file(&name, &version, &att, &sender, docname),
        }
    }

    fn docs(&self, sender: &str) -> Result<Vec<OutboundMessage>> {
        let documents = self.store.list_documents()?;
        if documents.is_empty() {
            return Ok(vec![OutboundMessage::notice(sender, "No documents stored")]);
        }
        Ok(documents
            .into_iter()
            .map(|name| OutboundMessage::notice(sender, name))
            .collect())
    }

    fn versions(&self, document: &str, sender: &str) -> Result<Vec<OutboundMessage>> {
        let versions = match self.store.list_versions(document) {
            Ok(versions) => versions,
            Err(err) => return not_found_notice(err, sender),
        };

        if versions.is_empty() {
            return Ok(vec![OutboundMessage::notice(
                sender,
                format!("No versions for document {document}"),
            )]);
        }
        Ok(versions
            .into_iter()
            .map(|label| OutboundMessage::notice(sender, label))
            .collect())
    }

    fn files(&self, name: &str, version: &str, sender: &str) -> Result<Vec<OutboundMessage>> {
        let files = match self.store.list_files(name, version) {
            Ok(files) => files,
            Err(err) => return not_found_notice(err, sender),
        };

        if files.is_empty() {
            return Ok(vec![OutboundMessage::notice(
                sender,
                format!("No files in version {version} of document {name}"),
            )]);
        }
        Ok(files
            .into_iter()
            .map(|file| OutboundMessage::notice(sender, file))
            .collect())
    }

    /// List a version's files and register one pending choice per file,
    /// so the sender's next keyword resolves to a `docfile`
    fn send(
        &mut self,
        name: &str,
        version: &str,
        sender: &str,
        to: Option<String>,
    ) -> Result<Vec<OutboundMessage>> {
        let files = match self.store.list_files(name, version) {
            Ok(files) => files,
            Err(err) => return not_found_notice(err, sender),
        };

        if files.is_empty() {
            return Ok(vec![OutboundMessage::notice(
                sender,
                format!("No files in version {version} of document {name}"),
            )]);
        }

        let choices = files.iter().map(|file| {
            (
                file.clone(),
                Command::DocFile {
                    name: name.to_string(),
                    version: version.to_string(),
                    filename: file.clone(),
                    sender: sender.to_string(),
                    to: to.clone(),
                },
            )
        });
        self.registry.register(sender, choices.collect::<Vec<_>>());

        Ok(files
            .into_iter()
            .map(|file| OutboundMessage::notice(sender, file))
            .collect())
    }

    fn doc_file(
        &mut self,
        name: &str,
        version: &str,
        filename: &str,
        sender: &str,
        to: Option<String>,
    ) -> Result<Vec<OutboundMessage>> {
        let file = match self.store.get_file(name, version, filename) {
            Ok(file) => file,
            Err(err) => return not_found_notice(err, sender),
        };

        self.registry.clear(sender);

        let subject = format!("[{version}] {name}");
        let attachment = Attachment::from_stored(&file);

        match to {
            None => Ok(vec![
                OutboundMessage::notice(sender, "Sending document..."),
                OutboundMessage::attachment(sender, attachment, subject),
            ]),
            Some(to) => Ok(vec![
                OutboundMessage::notice(sender, format!("Sending document to {to}")),
                OutboundMessage::attachment(to, attachment, subject),
            ]),
        }
    }

    fn store_file(
        &mut self,
        name: &str,
        version: &str,
        att: &Path,
        sender: &str,
        docname: Option<String>,
    ) -> Result<Vec<OutboundMessage>> {
        let dest_name = match docname {
            Some(dest_name) => dest_name,
            None => att
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    DocshelfError::InvalidCommand(format!(
                        "attachment path {} has no file name",
                        att.display()
                    ))
                })?,
        };

        self.store.put_file(name, version, att, &dest_name, sender)?;

        Ok(vec![OutboundMessage::notice(
            &self.settings.admin,
            format!("Added version {version} of {name} ({dest_name}) - by {sender}"),
        )])
    }
}

/// Render a not-found error as a user notice; anything else propagates
fn not_found_notice(err: DocshelfError, sender: &str) -> Result<Vec<OutboundMessage>> {
    let text = match err {
        DocshelfError::DocumentNotFound(document) => {
            format!("Cannot find document {document}")
        }
        DocshelfError::VersionNotFound { document, version } => {
            format!("Didn't find version {version} for document {document}")
        }
        DocshelfError::FileNotFound {
            document,
            version,
            filename,
        } => {
            format!("Didn't find file {filename} in version {version} of document {document}")
        }
        other => return Err(other),
    };
    Ok(vec![OutboundMessage::notice(sender, text)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Channel, Payload};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_agent() -> (Agent, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let docs = temp_dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();

        let settings = Settings {
            home: temp_dir.path().to_path_buf(),
            staging: temp_dir.path().join("var"),
            admin: "admin".to_string(),
            choice_ttl_secs: 300,
            trigger_subject: "version this".to_string(),
        };
        let store = DocumentStore::with_root(docs, temp_dir.path().join("changes"));
        (Agent::with_store(store, settings), temp_dir)
    }

    fn seed_file(dir: &TempDir, document: &str, version: &str, filename: &str, content: &[u8]) {
        let path = dir.path().join("docs").join(document).join(version);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(filename), content).unwrap();
    }

    fn texts(messages: &[OutboundMessage]) -> Vec<&str> {
        messages
            .iter()
            .filter_map(|m| match &m.payload {
                Payload::Text(text) => Some(text.as_str()),
                Payload::Attachment { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_docs_lists_documents() {
        let (mut agent, dir) = create_test_agent();
        seed_file(&dir, "beta", "1.0", "b.txt", b"b");
        seed_file(&dir, "alpha", "1.0", "a.txt", b"a");

        let out = agent
            .handle(Command::Docs {
                sender: "alice".to_string(),
            })
            .unwrap();
        assert_eq!(texts(&out), vec!["alpha", "beta"]);
        assert!(out.iter().all(|m| m.to == "alice" && m.channel == Channel::Jabber));
    }

    #[test]
    fn test_versions_unknown_document() {
        let (mut agent, _dir) = create_test_agent();

        let out = agent
            .handle(Command::Versions {
                document: "ghost".to_string(),
                sender: "alice".to_string(),
            })
            .unwrap();
        assert_eq!(texts(&out), vec!["Cannot find document ghost"]);
    }

    #[test]
    fn test_send_unknown_version() {
        let (mut agent, dir) = create_test_agent();
        seed_file(&dir, "spec", "1.0", "spec.txt", b"hello");

        let out = agent
            .handle(Command::Send {
                name: "spec".to_string(),
                version: "2.0".to_string(),
                sender: "alice".to_string(),
                to: None,
            })
            .unwrap();
        assert_eq!(
            texts(&out),
            vec!["Didn't find version 2.0 for document spec"]
        );
    }

    #[test]
    fn test_send_empty_version_distinct_message() {
        let (mut agent, dir) = create_test_agent();
        fs::create_dir_all(dir.path().join("docs").join("spec").join("1.0")).unwrap();

        let out = agent
            .handle(Command::Send {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                sender: "alice".to_string(),
                to: None,
            })
            .unwrap();
        assert_eq!(
            texts(&out),
            vec!["No files in version 1.0 of document spec"]
        );
    }

    #[test]
    fn test_send_registers_choices_and_lists_files() {
        let (mut agent, dir) = create_test_agent();
        seed_file(&dir, "spec", "1.0", "b.txt", b"b");
        seed_file(&dir, "spec", "1.0", "a.txt", b"a");

        let out = agent
            .handle(Command::Send {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                sender: "alice".to_string(),
                to: None,
            })
            .unwrap();
        assert_eq!(texts(&out), vec!["a.txt", "b.txt"]);

        // The follow-up keyword resolves to the file delivery
        let followup = InboundMessage::parse("tag=a.txt&sender=alice").unwrap();
        let out = agent.dispatch(&followup).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(texts(&out), vec!["Sending document..."]);
        match &out[1].payload {
            Payload::Attachment {
                attachment,
                subject,
            } => {
                assert_eq!(subject, "[1.0] spec");
                assert_eq!(attachment.filename, "a.txt");
            }
            other => panic!("expected attachment, got {other:?}"),
        }
    }

    #[test]
    fn test_choice_is_cleared_after_fulfillment() {
        let (mut agent, dir) = create_test_agent();
        seed_file(&dir, "spec", "1.0", "a.txt", b"a");

        agent
            .handle(Command::Send {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                sender: "alice".to_string(),
                to: None,
            })
            .unwrap();

        let followup = InboundMessage::parse("tag=a.txt&sender=alice").unwrap();
        assert_eq!(agent.dispatch(&followup).unwrap().len(), 2);
        // Second attempt finds no pending batch
        assert!(agent.dispatch(&followup).unwrap().is_empty());
    }

    #[test]
    fn test_docfile_with_alternate_recipient() {
        let (mut agent, dir) = create_test_agent();
        seed_file(&dir, "spec", "1.0", "a.txt", b"a");

        let out = agent
            .handle(Command::DocFile {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                filename: "a.txt".to_string(),
                sender: "alice".to_string(),
                to: Some("bob@example.com".to_string()),
            })
            .unwrap();

        assert_eq!(out[0].to, "alice");
        assert_eq!(texts(&out), vec!["Sending document to bob@example.com"]);
        assert_eq!(out[1].to, "bob@example.com");
        assert_eq!(out[1].channel, Channel::Mail);
    }

    #[test]
    fn test_docfile_missing_file_notice() {
        let (mut agent, dir) = create_test_agent();
        fs::create_dir_all(dir.path().join("docs").join("spec").join("1.0")).unwrap();

        let out = agent
            .handle(Command::DocFile {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                filename: "ghost.txt".to_string(),
                sender: "alice".to_string(),
                to: None,
            })
            .unwrap();
        assert_eq!(
            texts(&out),
            vec!["Didn't find file ghost.txt in version 1.0 of document spec"]
        );
    }

    #[test]
    fn test_store_notifies_admin_and_persists() {
        let (mut agent, dir) = create_test_agent();
        let upload = dir.path().join("upload.pdf");
        fs::write(&upload, b"pdf").unwrap();

        let out = agent
            .handle(Command::Store {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                att: upload,
                sender: "bob".to_string(),
                docname: None,
            })
            .unwrap();

        assert_eq!(out[0].to, "admin");
        assert_eq!(
            texts(&out),
            vec!["Added version 1.0 of spec (upload.pdf) - by bob"]
        );
        assert!(dir
            .path()
            .join("docs")
            .join("spec")
            .join("1.0")
            .join("upload.pdf")
            .is_file());
    }

    #[test]
    fn test_store_with_docname_override() {
        let (mut agent, dir) = create_test_agent();
        let upload = dir.path().join("stage.bin");
        fs::write(&upload, b"data").unwrap();

        let out = agent
            .handle(Command::Store {
                name: "spec".to_string(),
                version: "1.0".to_string(),
                att: upload,
                sender: "bob".to_string(),
                docname: Some("manual.pdf".to_string()),
            })
            .unwrap();

        assert_eq!(
            texts(&out),
            vec!["Added version 1.0 of spec (manual.pdf) - by bob"]
        );
        assert!(dir
            .path()
            .join("docs")
            .join("spec")
            .join("1.0")
            .join("manual.pdf")
            .is_file());
    }

    #[test]
    fn test_unknown_tag_without_pending_is_ignored() {
        let (mut agent, _dir) = create_test_agent();
        let msg = InboundMessage::parse("tag=random&sender=alice").unwrap();
        assert!(agent.dispatch(&msg).unwrap().is_empty());
    }
}
