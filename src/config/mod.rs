//! Configuration system
//!
//! Settings for the agent: home directory, attachment staging, the admin
//! user, choice expiry, and the mail trigger subject. Loaded from
//! ~/.config/docshelf/config.yaml with environment fallbacks.
//!
//! The document tree root itself is not part of the YAML file: it lives in
//! the one-line `<home>/etc/docshelf.conf` the host writes, which the store
//! reads at startup.

mod settings;

pub use settings::Settings;
