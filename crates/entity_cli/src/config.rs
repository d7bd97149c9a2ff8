//! Runtime configuration.
//!
//! Values come from `ENTITY_*` environment variables first; command-line
//! flags override them.

use crate::cli::GlobalArgs;
use entity_core::{default_log_level, LogTarget};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DEFAULT_ENV: &str = "development";
const DEFAULT_DB_PATH: &str = "entities.sqlite3";

/// Backing store selected for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Operating environment label, e.g. `development` or `production`.
    pub env: String,
    pub storage: StorageBackend,
    pub log_level: String,
    pub log_target: LogTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownStorage(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStorage(value) => write!(
                f,
                "unsupported ENTITY_STORAGE `{value}`; expected memory|sqlite"
            ),
            Self::RelativeLogDir(dir) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                dir.display()
            ),
        }
    }
}

impl Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = get("ENTITY_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let storage = match get("ENTITY_STORAGE").as_deref() {
            None | Some("sqlite") => StorageBackend::Sqlite(PathBuf::from(db_path)),
            Some("memory") => StorageBackend::Memory,
            Some(other) => return Err(ConfigError::UnknownStorage(other.to_string())),
        };

        let log_target = match get("ENTITY_LOG_DIR") {
            Some(dir) => log_dir_target(PathBuf::from(dir))?,
            None => LogTarget::Stderr,
        };

        Ok(Self {
            env: get("ENTITY_ENV").unwrap_or_else(|| DEFAULT_ENV.to_string()),
            storage,
            log_level: get("ENTITY_LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            log_target,
        })
    }

    /// Applies command-line overrides on top of environment values.
    pub fn apply_args(mut self, args: &GlobalArgs) -> Result<Self, ConfigError> {
        if args.memory {
            self.storage = StorageBackend::Memory;
        } else if let Some(path) = &args.db {
            self.storage = StorageBackend::Sqlite(path.clone());
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
        if let Some(dir) = &args.log_dir {
            self.log_target = log_dir_target(dir.clone())?;
        }
        Ok(self)
    }
}

fn log_dir_target(dir: PathBuf) -> Result<LogTarget, ConfigError> {
    if !dir.is_absolute() {
        return Err(ConfigError::RelativeLogDir(dir));
    }
    Ok(LogTarget::Directory(dir))
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, StorageBackend};
    use crate::cli::GlobalArgs;
    use entity_core::{default_log_level, LogTarget};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.env, "development");
        assert_eq!(
            config.storage,
            StorageBackend::Sqlite(PathBuf::from("entities.sqlite3"))
        );
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_target, LogTarget::Stderr);
    }

    #[test]
    fn environment_values_are_read_and_blank_values_ignored() {
        let config = config_from(&[
            ("ENTITY_ENV", "production"),
            ("ENTITY_STORAGE", "memory"),
            ("ENTITY_LOG_LEVEL", "warn"),
            ("ENTITY_DB_PATH", "   "),
        ])
        .unwrap();

        assert_eq!(config.env, "production");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn unknown_storage_and_relative_log_dir_are_rejected() {
        assert_eq!(
            config_from(&[("ENTITY_STORAGE", "postgres")]).unwrap_err(),
            ConfigError::UnknownStorage("postgres".to_string())
        );
        assert!(matches!(
            config_from(&[("ENTITY_LOG_DIR", "logs")]),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }

    #[test]
    fn flags_override_environment() {
        let base = config_from(&[("ENTITY_STORAGE", "memory")]).unwrap();
        let args = GlobalArgs {
            db: Some(PathBuf::from("/tmp/override.db")),
            log_level: Some("error".to_string()),
            ..GlobalArgs::default()
        };

        let config = base.apply_args(&args).unwrap();

        assert_eq!(
            config.storage,
            StorageBackend::Sqlite(PathBuf::from("/tmp/override.db"))
        );
        assert_eq!(config.log_level, "error");
    }
}
