//! Target-scoped error taxonomy
//!
//! Every error raised while preparing a single server's poll task is
//! attributable to exactly that server. The scheduler captures these at the
//! per-target boundary; none of them may abort a cycle.

use thiserror::Error;

/// An error scoped to a single configured server.
#[derive(Debug, Error)]
pub enum TargetError {
    /// A required configuration field is missing or empty.
    #[error("server '{server}': required field '{field}' is missing or empty")]
    MissingField {
        /// Display name of the server (or `<unnamed>` when that is the
        /// missing field).
        server: String,
        /// Name of the missing field, as written in the config file.
        field: &'static str,
    },

    /// The connection descriptor could not be constructed.
    #[error("server '{server}': cannot build connection: {reason}")]
    ConnectionBuild {
        /// Display name of the server.
        server: String,
        /// What went wrong.
        reason: String,
    },

    /// The encrypted password could not be resolved to plaintext.
    #[error("server '{server}': password decryption failed: {reason}")]
    Credential {
        /// Display name of the server.
        server: String,
        /// What went wrong.
        reason: String,
    },
}

impl TargetError {
    /// The display name of the server this error belongs to.
    #[must_use]
    pub fn server(&self) -> &str {
        match self {
            Self::MissingField { server, .. }
            | Self::ConnectionBuild { server, .. }
            | Self::Credential { server, .. } => server,
        }
    }
}
