//! Runtime configuration loaded from a TOML file.
//!
//! # Responsibility
//! - Read `config.toml` from the platform config directory or an explicit path.
//! - Resolve data/log directories and the quote overlay policy.
//!
//! # Invariants
//! - A missing or empty file yields defaults; a malformed file is an error.
//! - Unset keys fall back to platform defaults resolved with `dirs`.

use crate::quotes::{Activation, ExitStyle, QuotePolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "moments";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration loading error.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    /// A key holds a value outside its accepted range.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// `[quotes]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotesConfig {
    pub activation: Option<Activation>,
    pub exit: Option<ExitStyle>,
    pub spawn_interval_ms: Option<u64>,
    pub dwell_ms: Option<u64>,
}

impl QuotesConfig {
    /// Builds the overlay policy; explicit timings override the exit style's stock ones.
    pub fn policy(&self) -> Result<QuotePolicy, ConfigError> {
        let defaults = QuotePolicy::default();
        let mut policy = QuotePolicy::new(
            self.activation.unwrap_or(defaults.activation),
            self.exit.unwrap_or(defaults.exit),
        );
        if let Some(ms) = self.spawn_interval_ms {
            if ms == 0 {
                return Err(ConfigError::Invalid(
                    "quotes.spawn_interval_ms must be greater than zero".to_string(),
                ));
            }
            policy.spawn_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.dwell_ms {
            policy.dwell = Duration::from_millis(ms);
        }
        Ok(policy)
    }
}

/// Top-level `config.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MomentsConfig {
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub quotes: QuotesConfig,
}

impl MomentsConfig {
    /// Data directory: configured value, else `<data_dir>/moments`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME)
        })
    }

    /// Log directory: configured value, else `<resolved data dir>/logs`.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.resolved_data_dir().join("logs"))
    }
}

/// Default config path: `<config_dir>/moments/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Parses config text; blank text yields defaults.
pub fn parse_config(raw: &str, path: &Path) -> Result<MomentsConfig, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(MomentsConfig::default());
    }
    let config: MomentsConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.quotes.policy()?;
    Ok(config)
}

/// Loads `path`, or the default path when `None`. A missing file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<MomentsConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(MomentsConfig::default()),
        },
    };
    if !path.exists() {
        return Ok(MomentsConfig::default());
    }
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&raw, &path)
}

#[cfg(test)]
mod tests {
    use super::{load_config, parse_config, ConfigError, MomentsConfig};
    use crate::motion::timings::{QUOTE_DWELL, QUOTE_SPAWN_FIFO};
    use crate::quotes::{Activation, ExitStyle};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn blank_and_missing_files_yield_defaults() {
        let path = Path::new("config.toml");
        assert_eq!(parse_config("  \n", path).unwrap(), MomentsConfig::default());
        let missing = PathBuf::from("/definitely/not/here/moments.toml");
        assert_eq!(load_config(Some(&missing)).unwrap(), MomentsConfig::default());
    }

    #[test]
    fn quotes_table_maps_to_policy() {
        let raw = r#"
log_level = "debug"

[quotes]
activation = "automatic"
exit = "fifo"
dwell_ms = 3000
"#;
        let config = parse_config(raw, Path::new("config.toml")).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        let policy = config.quotes.policy().unwrap();
        assert_eq!(policy.activation, Activation::Automatic);
        assert_eq!(policy.exit, ExitStyle::Fifo);
        assert_eq!(policy.spawn_interval, QUOTE_SPAWN_FIFO);
        assert_eq!(policy.dwell, Duration::from_millis(3000));
        assert_ne!(policy.dwell, QUOTE_DWELL);
    }

    #[test]
    fn malformed_values_are_errors() {
        let unknown = parse_config("colour = \"blue\"", Path::new("c.toml")).unwrap_err();
        assert!(matches!(unknown, ConfigError::Parse { .. }));

        let bad_mode = parse_config("[quotes]\nexit = \"vanish\"", Path::new("c.toml"));
        assert!(matches!(bad_mode, Err(ConfigError::Parse { .. })));

        let zero = parse_config("[quotes]\nspawn_interval_ms = 0", Path::new("c.toml"));
        assert!(matches!(zero, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn explicit_directories_win_over_platform_defaults() {
        let config = MomentsConfig {
            data_dir: Some(PathBuf::from("/srv/moments")),
            ..MomentsConfig::default()
        };
        assert_eq!(config.resolved_data_dir(), PathBuf::from("/srv/moments"));
        assert_eq!(config.resolved_log_dir(), PathBuf::from("/srv/moments/logs"));
    }
}
