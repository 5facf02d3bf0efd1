//! Configuration file loading.
//!
//! The configuration is a TOML document with a `[defaults]` table and one
//! `[servers.<name>]` table per indexer:
//!
//! ```toml
//! [defaults]
//! destination_directory = "~/Downloads/nzbs"
//! max_results = 300
//!
//! [servers.example]
//! url = "https://indexer.example"
//! api_key = "0123456789abcdef"
//! page_size = 100
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// File name looked up in the working directory before the user config dir.
pub const LOCAL_CONFIG_FILE: &str = "getnzbs.toml";

const TEMPLATE: &str = r#"# getnzbs configuration

[defaults]
# Where retrieved .nzb files are written.
destination_directory = "~/Downloads/nzbs"
# Number of results requested when --limit is not given.
max_results = 300
# Server used when --server is not given (defaults to the first by name).
# default_server = "example"
request_timeout_secs = 30

# One table per indexer.
# [servers.example]
# url = "https://indexer.example"
# api_key = ""
# page_size = 100
"#;

/// Settings shared by every server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Directory where retrieved files are saved. A leading `~/` is expanded.
    pub destination_directory: String,
    /// Result limit used when the command line does not give one.
    pub max_results: u64,
    /// Server used when the command line does not name one.
    pub default_server: Option<String>,
    /// Timeout applied to every HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            destination_directory: "~/Downloads/nzbs".to_string(),
            max_results: 300,
            default_server: None,
            request_timeout_secs: 30,
        }
    }
}

const fn default_page_size() -> u64 {
    100
}

/// One Newznab-compatible indexer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Base URL; `/api` is appended for queries.
    pub url: String,
    /// API key sent as the `apikey` parameter.
    #[serde(default)]
    pub api_key: String,
    /// Results per page. Not every server uses the same page size.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Shared settings.
    #[serde(default)]
    pub defaults: Defaults,
    /// Configured indexers by name.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
}

impl AppConfig {
    /// Path of the per-user configuration file.
    #[must_use]
    pub fn user_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("getnzbs")
            .join("config.toml")
    }

    /// Locations searched in order when no explicit path is given.
    #[must_use]
    pub fn candidate_paths() -> Vec<PathBuf> {
        vec![PathBuf::from(LOCAL_CONFIG_FILE), Self::user_path()]
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is not valid TOML or does
    /// not match the expected layout.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Loads the explicit file, or the first candidate that exists.
    ///
    /// When nothing is found a commented template is written to `create_at`
    /// and a [`Error::Config`] asks the user to fill it in.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or no configuration exists yet.
    pub fn discover(explicit: Option<&Path>, create_at: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = Self::candidate_paths().iter().find(|p| p.is_file()) {
            log::info!("Loading config from {}", path.display());
            return Self::load(path);
        }
        Self::write_template(create_at)?;
        Err(Error::Config(format!(
            "no servers are defined; a template was written to {}, add a [servers.<name>] table and run again",
            create_at.display()
        )))
    }

    /// Writes the commented template, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, TEMPLATE)?;
        log::info!("Wrote config template to {}", path.display());
        Ok(())
    }

    /// Resolves the server to query: the named one, the configured default,
    /// or the first by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no servers are configured or the name is
    /// unknown.
    pub fn server<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a ServerConfig)> {
        let wanted = name.or(self.defaults.default_server.as_deref());
        match wanted {
            Some(wanted) => self
                .servers
                .get_key_value(wanted)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| {
                    let known: Vec<&str> = self.servers.keys().map(String::as_str).collect();
                    Error::Config(format!(
                        "unknown server {wanted:?} (configured: {})",
                        known.join(", ")
                    ))
                }),
            None => self
                .servers
                .iter()
                .next()
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| Error::Config("no servers are defined".to_string())),
        }
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.request_timeout_secs)
    }

    /// The destination directory with `~/` expanded.
    #[must_use]
    pub fn destination_dir(&self) -> PathBuf {
        expand_home(&self.defaults.destination_directory)
    }

    /// Ensures the destination directory exists, falling back to the current
    /// directory when it cannot be created.
    #[must_use]
    pub fn prepare_destination(&self) -> PathBuf {
        let dir = self.destination_dir();
        if dir.is_dir() {
            return dir;
        }
        match std::fs::create_dir_all(&dir) {
            Ok(()) => dir,
            Err(e) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                log::warn!(
                    "Directory {} does not exist and cannot be created ({e}); using {}",
                    dir.display(),
                    cwd.display()
                );
                cwd
            }
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
