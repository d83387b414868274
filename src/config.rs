//! User configuration.
//!
//! Read from an optional TOML file. Every field has a default, so a missing
//! file is the same as an empty one.

use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use secrecy::SecretString;
use serde::Deserialize;

pub const CONFIG_ENV_VAR: &str = "SHELP_CONFIG";
pub const MYSQL_PASSWORD_ENV_VAR: &str = "SHELP_MYSQL_PASSWORD";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote used for ahead/behind counts and for pushing.
    pub remote: String,
    /// Primary branch candidates, highest priority first.
    pub primary_branches: Vec<String>,
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            primary_branches: ["main", "master", "staging"]
                .map(String::from)
                .to_vec(),
            database: DatabaseConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(deserialize_with = "deserialize_password")]
    pub password: Option<SecretString>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
        }
    }
}

fn deserialize_password<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let password = Option::<String>::deserialize(deserializer)?;
    Ok(password.map(SecretString::from))
}

impl Config {
    /// Load the config file at `path`, or the default location when `path` is
    /// `None`. Only an explicitly requested file must exist.
    pub fn load(path: Option<&Utf8Path>) -> anyhow::Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path(env) {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Utf8Path) -> anyhow::Result<Self> {
        tracing::debug!("loading config from {path}");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {path}"))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(password) = env(MYSQL_PASSWORD_ENV_VAR) {
            self.database.password = Some(SecretString::from(password));
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.remote.trim().is_empty(), "`remote` must not be empty");
        anyhow::ensure!(
            !self.primary_branches.is_empty(),
            "`primary_branches` must list at least one branch"
        );
        anyhow::ensure!(
            self.primary_branches.iter().all(|b| !b.trim().is_empty()),
            "`primary_branches` must not contain empty names"
        );
        Ok(())
    }
}

/// `$SHELP_CONFIG`, else `$HOME/.config/shelp/config.toml`.
fn default_config_path(env: impl Fn(&str) -> Option<String>) -> Option<Utf8PathBuf> {
    if let Some(path) = env(CONFIG_ENV_VAR) {
        return Some(Utf8PathBuf::from(path));
    }
    let home = env("HOME")?;
    Some(
        Utf8PathBuf::from(home)
            .join(".config")
            .join("shelp")
            .join("config.toml"),
    )
}
