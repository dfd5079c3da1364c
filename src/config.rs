//! Monitor configuration parser
//!
//! Parses `servers.toml` into a typed configuration: one `[global]` section
//! and one `[[server]]` table per database server to poll.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// Label used for a server whose `display_name` is itself missing.
pub const UNNAMED_SERVER: &str = "<unnamed>";

/// Global configuration shared across all servers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Prefix prepended to every published metric path
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,
    /// Seconds between polling cycles (default: 60)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Number of executor workers draining the task queue (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_metric_prefix() -> String {
    "Custom Metrics|SQL".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    60
}

const fn default_workers() -> usize {
    4
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            metric_prefix: default_metric_prefix(),
            poll_interval_secs: default_poll_interval_secs(),
            workers: default_workers(),
        }
    }
}

/// One declared connection property, order-preserving.
///
/// A `password` key is special: its value is routed through credential
/// resolution before it reaches the connection descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyEntry {
    /// Property name as handed to the driver
    pub key: String,
    /// Property value as declared (possibly empty for `password`)
    pub value: String,
}

/// A single database server declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSpec {
    /// Unique name for this server, used as task identity
    #[serde(default)]
    pub display_name: String,
    /// Driver-specific connection URI
    #[serde(default)]
    pub connection_url: String,
    /// Driver identifier
    #[serde(default)]
    pub driver: String,
    /// Ciphertext of the password, when stored encrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_password: Option<String>,
    /// Key for decrypting `encrypted_password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
    /// Declared connection properties, in order. Absent means
    /// "use driver defaults" and is distinct from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_properties: Option<Vec<PropertyEntry>>,
}

impl ServerSpec {
    /// The name to use for this server in errors and reports.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            UNNAMED_SERVER
        } else {
            &self.display_name
        }
    }

    /// Check the required-field invariants for this server.
    ///
    /// `display_name`, `connection_url` and `driver` are checked in that
    /// fixed order and the first missing one is reported. This runs at
    /// scheduling time, not config-load time: a broken server must only
    /// fail its own cycle, never the whole configuration.
    pub fn validate(&self) -> Result<(), TargetError> {
        for (field, value) in [
            ("display_name", &self.display_name),
            ("connection_url", &self.connection_url),
            ("driver", &self.driver),
        ] {
            if value.is_empty() {
                return Err(TargetError::MissingField {
                    server: self.label().to_string(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Top-level monitor configuration parsed from servers.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Server declarations
    #[serde(rename = "server", default)]
    pub servers: Vec<ServerSpec>,
}

impl MonitorConfig {
    /// Parse a servers.toml file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse servers.toml content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse servers.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration as a whole.
    ///
    /// Required per-server fields are intentionally not checked here; see
    /// [`ServerSpec::validate`].
    fn validate(&self) -> Result<()> {
        // Duplicate display names would make task identities collide
        let mut seen = HashSet::new();
        for server in &self.servers {
            if !server.display_name.is_empty() && !seen.insert(&server.display_name) {
                bail!("Duplicate server display_name: '{}'", server.display_name);
            }
        }

        if self.global.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.global.workers == 0 {
            bail!("workers must be greater than zero");
        }

        Ok(())
    }
}
