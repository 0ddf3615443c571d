//! Connection configuration
//!
//! Options arrive as a string map (shell flags), a JSON file, or both. Every
//! field is optional so layers can be merged; defaults are applied when the
//! connection is built.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SCHEME: &str = "http";

/// Caller-supplied connection options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub scheme: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "pw", alias = "password")]
    pub password: Option<String>,
    /// Shared secret handed to the shell layer; the core only carries it.
    pub secret: Option<String>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub commit: Option<String>,
}

impl ConnectionOptions {
    /// Build options from `key=value` style pairs.
    ///
    /// Recognized keys are `host`, `port`, `scheme`, `username`, `pw`,
    /// `secret`, `branch`, `tag` and `commit`. Anything else is ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "host" => options.host = Some(value),
                "port" => {
                    let port = value.parse::<u16>().map_err(|e| {
                        Error::Configuration(format!("invalid port '{}': {}", value, e))
                    })?;
                    options.port = Some(port);
                }
                "scheme" => options.scheme = Some(value),
                "username" => options.username = Some(value),
                "pw" | "password" => options.password = Some(value),
                "secret" => options.secret = Some(value),
                "branch" => options.branch = Some(value),
                "tag" => options.tag = Some(value),
                "commit" => options.commit = Some(value),
                other => tracing::debug!("ignoring unrecognized connection option '{}'", other),
            }
        }
        Ok(options)
    }

    /// Load options from a JSON file. A missing file yields empty options.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| {
            Error::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Layer `overlay` on top of `self`; set fields in `overlay` win.
    ///
    /// Revision pins are replaced as a group: if `overlay` names any pin,
    /// none of the pins in `self` survive.
    pub fn merge(self, overlay: ConnectionOptions) -> Self {
        let overlay_pins = overlay.branch.is_some() || overlay.tag.is_some() || overlay.commit.is_some();
        let (branch, tag, commit) = if overlay_pins {
            (overlay.branch, overlay.tag, overlay.commit)
        } else {
            (self.branch, self.tag, self.commit)
        };
        Self {
            host: overlay.host.or(self.host),
            port: overlay.port.or(self.port),
            scheme: overlay.scheme.or(self.scheme),
            username: overlay.username.or(self.username),
            password: overlay.password.or(self.password),
            secret: overlay.secret.or(self.secret),
            branch,
            tag,
            commit,
        }
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or(DEFAULT_SCHEME)
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}
