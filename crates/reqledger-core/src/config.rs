use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the per-directory config.
pub const PROJECT_CONFIG_FILE: &str = "reqledger.toml";

/// Env var overriding `database.path`.
pub const DB_PATH_ENV: &str = "REQLEDGER_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub append: AppendConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_size: default_pool_size(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".reqledger/requests.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_pool_size() -> usize {
    8
}

const fn default_max_attempts() -> u32 {
    8
}

const fn default_backoff_base_ms() -> u64 {
    2
}

const fn default_backoff_max_ms() -> u64 {
    50
}

/// Parse a config file body.
///
/// # Errors
///
/// Returns an error if `content` is not valid TOML for [`LedgerConfig`].
pub fn parse_config(content: &str) -> Result<LedgerConfig> {
    toml::from_str::<LedgerConfig>(content).context("parse ledger config")
}

fn load_file(path: &Path) -> Result<Option<LedgerConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<LedgerConfig>(&content)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `reqledger.toml` from `root`, falling back to the user config
/// (`<config dir>/reqledger/config.toml`) and then to defaults.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> Result<LedgerConfig> {
    if let Some(config) = load_file(&root.join(PROJECT_CONFIG_FILE))? {
        return Ok(config);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(LedgerConfig::default());
    };

    Ok(load_file(&config_dir.join("reqledger/config.toml"))?.unwrap_or_default())
}

/// Apply database path overrides and anchor a relative path at `root`.
///
/// Precedence (highest wins): `cli_db`, `env_db`, the config file value.
#[must_use]
pub fn resolve_config(
    mut config: LedgerConfig,
    root: &Path,
    cli_db: Option<PathBuf>,
    env_db: Option<String>,
) -> LedgerConfig {
    let env_db = env_db
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from);

    if let Some(path) = cli_db.or(env_db) {
        config.database.path = path;
    }

    if config.database.path.is_relative() {
        config.database.path = root.join(&config.database.path);
    }

    config
}
