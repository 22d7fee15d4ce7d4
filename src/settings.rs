//! Settings for the dashboard binaries.
//!
//! Read from an optional `settings.toml`, then overridden by `SALES__*`
//! environment variables (e.g. `SALES__DATA__CSV_PATH=sales.csv`).

use crate::dashboard::DashboardOptions;
use crate::records::RegionScope;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    State,
    Country,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Data {
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardSettings {
    pub default_year: Option<i32>,
    pub fallback_region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub bind: String,
    /// Idle viewer sessions are dropped after this many seconds
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data: Data,
    pub scope: Scope,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    pub server: Server,
    pub log: Log,
}

impl Settings {
    /// `path` is the settings file without extension; a missing file is fine.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("data.csv_path", "sales_data_sample.csv")?
            .set_default("scope.kind", "state")?
            .set_default("scope.country", "USA")?
            .set_default("server.bind", "0.0.0.0:3000")?
            .set_default("server.session_ttl_secs", 1800)?
            .set_default("log.level", "info")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("SALES").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn region_scope(&self) -> RegionScope {
        match self.scope.kind {
            ScopeKind::State => RegionScope::State {
                country: self.scope.country.clone(),
            },
            ScopeKind::Country => RegionScope::Country,
        }
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            scope: self.region_scope(),
            default_year: self.dashboard.default_year,
            fallback_region: self.dashboard.fallback_region.clone(),
        }
    }
}

/// Default filter: the library and both binaries at `level`
pub fn default_log_filter(level: &str) -> String {
    format!("sales_crossfilter={level},sales_server={level}")
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_filter(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
