//! Logging bootstrap from `logger.yaml`.
//!
//! ```yaml
//! level: info
//! directives:
//!   - topyield_core=debug
//!   - reqwest=warn
//! format: compact   # full | compact | pretty
//! ansi: true
//! with_target: false
//! ```
//!
//! `RUST_LOG`, when set, replaces the file's filter.

use anyhow::Context;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub directives: Vec<String>,
    pub format: LogFormat,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::Full,
            ansi: true,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Reads the YAML file at `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = File::from(path).format(FileFormat::Yaml).required(false);
        Self::from_config(Config::builder().add_source(source))
            .with_context(|| format!("invalid logging config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        Self::from_config(Config::builder().add_source(File::from_str(text, FileFormat::Yaml)))
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let cfg = builder.build()?.try_deserialize::<Self>()?;
        Ok(cfg)
    }

    pub fn filter_directives(&self) -> String {
        std::iter::once(self.level.trim())
            .chain(self.directives.iter().map(|d| d.trim()))
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return EnvFilter::try_from_default_env().context("invalid RUST_LOG filter");
        }
        let directives = self.filter_directives();
        EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid log filter in config: {directives}"))
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout stays the menu.
pub fn init(cfg: &LogConfig) -> anyhow::Result<()> {
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg.ansi)
        .with_target(cfg.with_target);

    let registry = tracing_subscriber::registry()
        .with(cfg.env_filter()?)
        .with(sentry_tracing::layer());

    match cfg.format {
        LogFormat::Full => registry.with(fmt).try_init(),
        LogFormat::Compact => registry.with(fmt.compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt.pretty()).try_init(),
    }
    .context("failed to install tracing subscriber")
}
