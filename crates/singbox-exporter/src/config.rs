//! Exporter configuration.
//!
//! Values come from an optional TOML file, then command-line flags, then
//! built-in defaults. The result is validated once at startup and never
//! changes afterwards.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use singbox_metrics::{EntityFilter, Strategy};

/// How the collector queries the stats API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Enumerate when no users or inbounds are listed, target them otherwise.
    #[default]
    Auto,
    /// Always enumerate; lists act as filters.
    Enumerate,
    /// Always query the listed identifiers one by one.
    Targeted,
}

impl QueryMode {
    pub fn strategy(self, filter: &EntityFilter) -> Strategy {
        match self {
            Self::Auto => Strategy::auto(filter),
            Self::Enumerate => Strategy::Enumerate,
            Self::Targeted => Strategy::Targeted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Frozen exporter settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExporterConfig {
    /// Address of the sing-box V2Ray stats API.
    pub upstream: String,
    /// Bound for connection setup and each stats call.
    pub timeout_secs: u64,
    pub users: Vec<String>,
    pub inbounds: Vec<String>,
    pub listen: SocketAddr,
    pub metrics_path: String,
    pub query_mode: QueryMode,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            upstream: "127.0.0.1:19998".to_string(),
            timeout_secs: singbox_stats::DEFAULT_TIMEOUT.as_secs(),
            users: Vec::new(),
            inbounds: Vec::new(),
            listen: SocketAddr::from(([0, 0, 0, 0], 9091)),
            metrics_path: "/metrics".to_string(),
            query_mode: QueryMode::Auto,
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn filter(&self) -> EntityFilter {
        EntityFilter::new(&self.users, &self.inbounds)
    }

    pub fn strategy(&self) -> Strategy {
        self.query_mode.strategy(&self.filter())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upstream.trim().is_empty() {
            bail!("upstream address must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }
        if !self.metrics_path.starts_with('/') {
            bail!("telemetry path {:?} must start with '/'", self.metrics_path);
        }
        if self.metrics_path == "/" {
            bail!("telemetry path must not be '/', which serves the landing page");
        }
        // The router would read these as captures or wildcards.
        if let Some(segment) = self.metrics_path.split('/').find(|segment| {
            segment.starts_with(':') || segment.starts_with('*') || segment.contains(['{', '}'])
        }) {
            bail!(
                "telemetry path {:?} has segment {segment:?}, which is not a literal path",
                self.metrics_path
            );
        }
        Ok(())
    }
}

/// Command-line flags. Anything given here overrides the config file.
#[derive(Debug, Parser)]
#[command(
    name = "singbox-exporter",
    version,
    about = "Prometheus exporter for sing-box traffic statistics"
)]
pub struct Args {
    /// TOML config file.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address of the sing-box V2Ray stats API.
    #[arg(long = "singbox", visible_alias = "upstream", value_name = "ADDR")]
    pub upstream: Option<String>,

    /// Per-call timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Comma-separated list of users to monitor (e.g. 'user1,user2').
    #[arg(long, value_name = "LIST")]
    pub users: Option<String>,

    /// Comma-separated list of inbounds to monitor.
    #[arg(long, value_name = "LIST")]
    pub inbounds: Option<String>,

    /// Address to listen on for web interface and telemetry.
    #[arg(long, value_name = "ADDR", value_parser = parse_listen)]
    pub listen: Option<SocketAddr>,

    /// Path under which to expose metrics.
    #[arg(long = "telemetry-path", value_name = "PATH")]
    pub metrics_path: Option<String>,

    /// Query strategy.
    #[arg(long, value_enum)]
    pub query_mode: Option<QueryMode>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Args {
    /// Resolve the final configuration.
    pub fn into_config(self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(upstream) = self.upstream {
            config.upstream = upstream;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(users) = self.users {
            config.users = parse_list(&users);
        }
        if let Some(inbounds) = self.inbounds {
            config.inbounds = parse_list(&inbounds);
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(path) = self.metrics_path {
            config.metrics_path = path;
        }
        if let Some(mode) = self.query_mode {
            config.query_mode = mode;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accept `host:port` as well as the `:port` shorthand for all interfaces.
fn parse_listen(s: &str) -> Result<SocketAddr, String> {
    let addr = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };
    addr.parse()
        .map_err(|e| format!("invalid listen address {s:?}: {e}"))
}
