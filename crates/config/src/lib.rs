//! Layered configuration for storefront.
//!
//! Values are merged in order, later sources winning:
//! 1. built-in defaults ([`Config::default()`]),
//! 2. a TOML file (`--config PATH`, or `storefront/config.toml` in the
//!    platform configuration directory when it exists),
//! 3. environment variables prefixed with `STOREFRONT_`, nested keys separated
//!    by a double underscore (`STOREFRONT_SERVER__PORT=8080`).

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "STOREFRONT_";
const ENV_SEPARATOR: &str = "__";
const APPLICATION: &str = "storefront";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub images: ImagesConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Browser origins allowed to call the API.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body, which bounds a single upload.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, created if missing.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Directory uploaded files are written to.
    pub directory: PathBuf,
    /// Prefix of every public image reference; stored names are appended.
    pub public_prefix: String,
    pub retention: Retention,
}

/// What happens to a product's previous upload when a new one replaces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    /// Leave the superseded file on disk.
    #[default]
    Keep,
    /// Delete the superseded file once the new association is committed.
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 9090,
                cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:5174".to_string()],
                max_upload_bytes: 10 * 1024 * 1024,
            },
            database: DatabaseConfig { path: PathBuf::from("storefront.db") },
            images: ImagesConfig {
                directory: PathBuf::from("uploads/images"),
                public_prefix: "/api/images/".to_string(),
                retention: Retention::default(),
            },
            log: LogConfig { level: "info".to_string(), format: LogFormat::default() },
        }
    }
}

impl Config {
    /// Location of the configuration file used when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load, merge and validate configuration.
    ///
    /// An explicit `path` must exist. Without one, the default file is used
    /// only if it is present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::MissingFile(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), present = file.is_file(), "configuration file");
        }
        Self::from_figment(Self::figment(file.as_deref()))
    }

    /// The merged providers, before extraction.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            // Missing files are skipped by the provider.
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            exn::bail!(ErrorKind::Invalid("server.port must not be zero".to_string()));
        }
        if self.server.max_upload_bytes == 0 {
            exn::bail!(ErrorKind::Invalid("server.max_upload_bytes must not be zero".to_string()));
        }
        let prefix = &self.images.public_prefix;
        if !prefix.starts_with('/') || !prefix.ends_with('/') {
            exn::bail!(ErrorKind::Invalid(format!("images.public_prefix must start and end with '/': {prefix:?}")));
        }
        if self.images.directory.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("images.directory must not be empty".to_string()));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve relative paths against the current working directory.
    pub fn absolutize(mut self) -> Result<Self> {
        for path in [&mut self.database.path, &mut self.images.directory] {
            let absolute = std::path::absolute(&*path)
                .or_raise(|| ErrorKind::Invalid(format!("cannot resolve {}", path.display())))?;
            *path = absolute;
        }
        Ok(self)
    }
}
