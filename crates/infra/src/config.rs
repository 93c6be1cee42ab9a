//! Engine configuration from the environment.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SCREENGATE_DATABASE_URL` | Postgres connection string | none (in-memory) |
//! | `SCREENGATE_REGISTRY_PATH` | JSON screen registry | built-in registry |
//! | `SCREENGATE_TEMPLATES_PATH` | JSON role templates | built-in templates |
//! | `SCREENGATE_MAX_CONNECTIONS` | pool size | `5` |

use std::path::{Path, PathBuf};

use thiserror::Error;

use screengate_auth::{ScreenRegistry, TemplateCatalog};
use screengate_core::DomainError;

pub const DATABASE_URL: &str = "SCREENGATE_DATABASE_URL";
pub const REGISTRY_PATH: &str = "SCREENGATE_REGISTRY_PATH";
pub const TEMPLATES_PATH: &str = "SCREENGATE_TEMPLATES_PATH";
pub const MAX_CONNECTIONS: &str = "SCREENGATE_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid definition in {path}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub database_url: Option<String>,
    pub registry_path: Option<PathBuf>,
    pub templates_path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            registry_path: None,
            templates_path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_connections = match get(MAX_CONNECTIONS) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: MAX_CONNECTIONS,
                        message: "must be at least 1".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: MAX_CONNECTIONS,
                        message: e.to_string(),
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: get(DATABASE_URL),
            registry_path: get(REGISTRY_PATH).map(PathBuf::from),
            templates_path: get(TEMPLATES_PATH).map(PathBuf::from),
            max_connections,
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL))
    }

    /// The configured registry, or the built-in one.
    pub fn load_registry(&self) -> Result<ScreenRegistry, ConfigError> {
        match &self.registry_path {
            Some(path) => {
                let json = read(path)?;
                ScreenRegistry::from_json(&json).map_err(|source| ConfigError::Definition {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(ScreenRegistry::builtin()),
        }
    }

    /// The configured templates, or the built-in ones for `registry`.
    pub fn load_templates(&self, registry: &ScreenRegistry) -> Result<TemplateCatalog, ConfigError> {
        match &self.templates_path {
            Some(path) => {
                let json = read(path)?;
                TemplateCatalog::from_json(&json).map_err(|source| ConfigError::Definition {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(TemplateCatalog::builtin(registry)),
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
