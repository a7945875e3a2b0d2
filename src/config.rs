//! YAML configuration for the export pipeline.
//!
//! Every section is optional; an absent file or section means the defaults
//! for a stock Phabricator dump.
//!
//! ```yaml
//! placeholders:
//!   single_quote: "@SINGLE_placeholder"
//!   double_quote: "@DOUBLE_placeholder"
//! tables:
//!   user: { name: user, index: phid }
//!   credential: passphrase_credential
//!   secret: { name: passphrase_secret, index: id }
//! converter:
//!   enabled: true
//!   program: perl
//!   script: convert.pl
//!   workdir: mrc-converter-suite
//! ```

use crate::convert::ConverterConfig;
use crate::escape::Placeholders;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A table loaded as a map keyed by one of its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTable {
    pub name: String,
    pub index: String,
}

impl IndexedTable {
    pub fn new(name: &str, index: &str) -> Self {
        Self {
            name: name.to_string(),
            index: index.to_string(),
        }
    }
}

/// Which tables hold users, credentials and secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub user: IndexedTable,
    pub credential: String,
    pub secret: IndexedTable,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            user: IndexedTable::new("user", "phid"),
            credential: "passphrase_credential".to_string(),
            secret: IndexedTable::new("passphrase_secret", "id"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub placeholders: Placeholders,
    pub tables: TablesConfig,
    pub converter: ConverterConfig,
}

impl ExportConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: ExportConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the given file when present.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.placeholders.validate()?;

        for (role, name) in [
            ("user", &self.tables.user.name),
            ("credential", &self.tables.credential),
            ("secret", &self.tables.secret.name),
        ] {
            if name.trim().is_empty() {
                anyhow::bail!("{} table name must not be empty", role);
            }
        }

        Ok(())
    }
}
