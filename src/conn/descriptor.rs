//! Connection descriptor builder
//!
//! Assembles the connection URL and outbound property map for one server,
//! with the `password` property routed through credential resolution.

use crate::config::ServerSpec;
use crate::conn::credentials::{resolve_password, Decryptor};
use crate::error::TargetError;

/// Everything a task needs to open a connection to one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Driver-specific connection URI
    pub url: String,
    /// Resolved properties in declared order. `None` means the server
    /// declared no properties at all ("use driver defaults") and is
    /// distinct from an empty list.
    pub properties: Option<Vec<(String, String)>>,
}

/// Build the connection descriptor for one server.
///
/// Declared properties pass through in order; each `password` entry is
/// replaced by the resolver's output. A connection URL without a scheme is a
/// build error scoped to this server.
pub fn build_descriptor(
    server: &ServerSpec,
    decryptor: &dyn Decryptor,
) -> Result<ConnectionDescriptor, TargetError> {
    check_url_scheme(&server.connection_url).map_err(|reason| TargetError::ConnectionBuild {
        server: server.label().to_string(),
        reason,
    })?;

    let properties = match &server.connection_properties {
        None => None,
        Some(entries) => {
            let mut resolved = Vec::with_capacity(entries.len());
            for entry in entries {
                let value = if entry.key == "password" {
                    resolve_password(server, &entry.value, decryptor)?
                } else {
                    entry.value.clone()
                };
                resolved.push((entry.key.clone(), value));
            }
            Some(resolved)
        }
    };

    Ok(ConnectionDescriptor {
        url: server.connection_url.clone(),
        properties,
    })
}

/// Check that a connection URL starts with a `scheme:` prefix.
///
/// Scheme characters follow RFC 3986: a leading ASCII letter, then letters,
/// digits, `+`, `-` or `.`.
fn check_url_scheme(url: &str) -> Result<(), String> {
    let Some(colon) = url.find(':') else {
        return Err(format!("connection URL '{url}' has no scheme"));
    };

    let scheme = &url[..colon];
    let mut chars = scheme.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(format!("connection URL '{url}' has a malformed scheme"))
    }
}
