//! docshelf settings file handling

use crate::error::{DocshelfError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// docshelf settings
///
/// Every field has an environment or built-in default, so the agent runs
/// without a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Agent home directory, holding `etc/docshelf.conf` and the audit log
    #[serde(default = "default_home")]
    pub home: PathBuf,

    /// Staging directory for mail attachments
    #[serde(default = "default_staging")]
    pub staging: PathBuf,

    /// User notified about every successful store
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Seconds a pending file choice stays valid; 0 disables expiry
    #[serde(default = "default_choice_ttl")]
    pub choice_ttl_secs: u64,

    /// Subject line that triggers mail ingestion (matched case-insensitively)
    #[serde(default = "default_trigger_subject")]
    pub trigger_subject: String,
}

fn default_home() -> PathBuf {
    if let Some(home) = std::env::var_os("DOCSHELF_HOME") {
        return PathBuf::from(home);
    }
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".docshelf");
    path
}

fn default_staging() -> PathBuf {
    if let Some(var) = std::env::var_os("DOCSHELF_VAR") {
        return PathBuf::from(var);
    }
    default_home().join("var")
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_choice_ttl() -> u64 {
    300
}

fn default_trigger_subject() -> String {
    "version this".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: default_home(),
            staging: default_staging(),
            admin: default_admin(),
            choice_ttl_secs: default_choice_ttl(),
            trigger_subject: default_trigger_subject(),
        }
    }
}

impl Settings {
    /// Load settings from the default path, falling back to defaults when
    /// no config file exists
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load settings from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DocshelfError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "loading docshelf configuration");

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;

        Ok(settings)
    }

    /// Save settings to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/docshelf/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("docshelf");
        path.push("config.yaml");
        path
    }

    /// Path of the one-line file holding the document tree root
    pub fn conf_file(&self) -> PathBuf {
        self.home.join("etc").join("docshelf.conf")
    }

    /// Path of the append-only audit log
    pub fn log_file(&self) -> PathBuf {
        self.home.join("etc").join("docshelf.changes")
    }

    /// Pending-choice TTL, or None when expiry is disabled
    pub fn choice_ttl(&self) -> Option<Duration> {
        if self.choice_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.choice_ttl_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_settings(home: &Path) -> Settings {
        Settings {
            home: home.to_path_buf(),
            staging: home.join("var"),
            admin: "ops".to_string(),
            choice_ttl_secs: 60,
            trigger_subject: "version this".to_string(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let settings = test_settings(temp_dir.path());
        settings.save(&config_path).unwrap();

        let loaded = Settings::load(&config_path).unwrap();
        assert_eq!(loaded.home, temp_dir.path());
        assert_eq!(loaded.admin, "ops");
        assert_eq!(loaded.choice_ttl_secs, 60);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Settings::load(temp_dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(DocshelfError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "admin: rafa\n").unwrap();

        let loaded = Settings::load(&config_path).unwrap();
        assert_eq!(loaded.admin, "rafa");
        assert_eq!(loaded.choice_ttl_secs, 300);
        assert_eq!(loaded.trigger_subject, "version this");
    }

    #[test]
    fn test_derived_paths() {
        let settings = test_settings(Path::new("/srv/docshelf"));
        assert_eq!(
            settings.conf_file(),
            PathBuf::from("/srv/docshelf/etc/docshelf.conf")
        );
        assert_eq!(
            settings.log_file(),
            PathBuf::from("/srv/docshelf/etc/docshelf.changes")
        );
    }

    #[test]
    fn test_choice_ttl() {
        let mut settings = test_settings(Path::new("/tmp"));
        assert_eq!(settings.choice_ttl(), Some(Duration::from_secs(60)));

        settings.choice_ttl_secs = 0;
        assert_eq!(settings.choice_ttl(), None);
    }
}
