//! Configuration for rallyctl
//!
//! Two sources:
//! - warehouse credentials from `SNOWFLAKE_*` environment variables
//!   (a `.env` file in the working directory is loaded first)
//! - optional TOML file for the server bind address, race defaults and tracks
//!
//! Config file lookup order: `--config PATH`, `./rallyctl.toml`,
//! `~/.rallyctl/config.toml`, built-in defaults.

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::simulation::{DEFAULT_DISTANCE_KM, DEFAULT_VARIABILITY};
use crate::track::TrackCatalog;

/// Database used when `SNOWFLAKE_DATABASE` is unset
pub const DEFAULT_DATABASE: &str = "BOOTCAMP_RALLY";

/// Account identifiers end up in a hostname, so keep them to URL-safe characters.
static ACCOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("invalid account regex")
});

/// The database name is spliced into DDL, so only plain identifiers are accepted.
static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("invalid identifier regex"));

/// Snowflake connection settings
#[derive(Clone)]
pub struct SnowflakeConfig {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub role: String,
    pub database: String,
    /// Overrides `https://<account>.snowflakecomputing.com` (emulators, tests)
    pub base_url: Option<String>,
}

impl fmt::Debug for SnowflakeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("database", &self.database)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SnowflakeConfig {
    /// Load from the process environment, reading `./.env` first.
    ///
    /// Variables already set in the environment take precedence over `.env`.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| CoreError::missing_env(name));

        let account = require("SNOWFLAKE_ACCOUNT")?;
        if !ACCOUNT_RE.is_match(&account) {
            return Err(CoreError::invalid_env(
                "SNOWFLAKE_ACCOUNT",
                "must contain only letters, digits, '_', '.' or '-'",
            ));
        }

        let base_url = get("SNOWFLAKE_BASE_URL").map(|url| url.trim_end_matches('/').to_owned());
        if let Some(url) = &base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CoreError::invalid_env(
                    "SNOWFLAKE_BASE_URL",
                    "must start with http:// or https://",
                ));
            }
        }

        let database = get("SNOWFLAKE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        if !IDENTIFIER_RE.is_match(&database) {
            return Err(CoreError::invalid_env(
                "SNOWFLAKE_DATABASE",
                "must be an unquoted identifier (letters, digits, '_' or '$')",
            ));
        }

        Ok(Self {
            user: require("SNOWFLAKE_USER")?,
            password: require("SNOWFLAKE_PASSWORD")?,
            account,
            warehouse: require("SNOWFLAKE_WAREHOUSE")?,
            role: require("SNOWFLAKE_ROLE")?,
            database,
            base_url,
        })
    }

    /// Root URL of the account's REST endpoints, without trailing slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://{}.snowflakecomputing.com", self.account),
        }
    }
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8501))
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Defaults offered by the race form and used by `rallyctl race`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceDefaults {
    #[serde(default = "default_fee")]
    pub fee: f64,
    #[serde(default = "default_prize")]
    pub prize: f64,
    #[serde(default = "default_distance_km")]
    pub distance_km: f64,
    /// Random speed factor range `[lo, hi]`
    #[serde(default = "default_variability")]
    pub variability: (f64, f64),
}

fn default_fee() -> f64 {
    1000.0
}

fn default_prize() -> f64 {
    5000.0
}

fn default_distance_km() -> f64 {
    DEFAULT_DISTANCE_KM
}

fn default_variability() -> (f64, f64) {
    DEFAULT_VARIABILITY
}

impl Default for RaceDefaults {
    fn default() -> Self {
        Self {
            fee: default_fee(),
            prize: default_prize(),
            distance_km: default_distance_km(),
            variability: default_variability(),
        }
    }
}

/// Application configuration (TOML file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RallyConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub race: RaceDefaults,
    #[serde(default)]
    pub tracks: TrackCatalog,
}

impl RallyConfig {
    /// Load config from an explicit path, or from the default locations.
    ///
    /// An explicit path must exist; default locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in Self::default_paths() {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using config file");
                return Self::from_file(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Candidate config locations in priority order
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("rallyctl.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rallyctl").join("config.toml"));
        }
        paths
    }

    /// Parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CoreError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| CoreError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = self.race.variability;
        if !(lo.is_finite() && hi.is_finite()) || lo <= 0.0 || lo > hi {
            return Err(CoreError::config(format!(
                "race.variability must satisfy 0 < lo <= hi, got ({lo}, {hi})"
            )));
        }
        if !self.race.distance_km.is_finite() || self.race.distance_km <= 0.0 {
            return Err(CoreError::config("race.distance_km must be positive"));
        }
        let money_ok = |v: f64| v.is_finite() && v >= 0.0;
        if !money_ok(self.race.fee) || !money_ok(self.race.prize) {
            return Err(CoreError::config(
                "race.fee and race.prize must be finite and not negative",
            ));
        }
        if self.tracks.is_empty() {
            return Err(CoreError::config("at least one track is required"));
        }
        if let Some(track) = self.tracks.iter().find(|t| !t.factor.is_finite() || t.factor <= 0.0) {
            return Err(CoreError::config(format!(
                "track '{}' needs a positive factor",
                track.name
            )));
        }
        Ok(())
    }
}
