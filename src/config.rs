// ABOUTME: Configuration for a pruning run, loaded from an optional TOML file and overridden by CLI flags
// ABOUTME: Resolves everything into a RunConfig that is passed explicitly through the scan and report

use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_LOOKUP_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub hosts: HostsConfig,
    pub report: ReportConfig,
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostsConfig {
    pub known_hosts_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub duplicates: bool,
    pub non_resolving: bool,
    pub split_sed: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// 0 means lookups block without a deadline.
    pub lookup_timeout_ms: u64,
}

/// Everything a run needs, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub hostsfile: PathBuf,
    pub verbose: bool,
    pub duplicates: bool,
    pub non_resolving: bool,
    pub split_sed: bool,
    pub lookup_timeout: Option<Duration>,
}

impl Config {
    pub fn load_from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::load_from_str(&content)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
        Ok(config_dir.join("prune-known-hosts").join("config.toml"))
    }

    /// Load the explicitly named file, or the default one if it exists, or built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match Self::default_config_path() {
            Ok(path) if path.is_file() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load_from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Expand `~/` in paths read from the file. Call before `merge_cli`.
    pub fn expand_path(&mut self) -> Result<()> {
        if let Some(path) = &self.hosts.known_hosts_path {
            self.hosts.known_hosts_path = Some(expand_tilde(path)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolver.lookup_timeout_ms > MAX_LOOKUP_TIMEOUT_MS {
            anyhow::bail!(
                "lookup_timeout_ms must be at most {} (got {})",
                MAX_LOOKUP_TIMEOUT_MS,
                self.resolver.lookup_timeout_ms
            );
        }

        if let Some(path) = &self.hosts.known_hosts_path {
            if path.as_os_str().is_empty() {
                anyhow::bail!("known_hosts_path cannot be empty");
            }
        }

        Ok(())
    }

    /// Apply command-line overrides. Boolean flags can only switch options on.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.hostsfile {
            self.hosts.known_hosts_path = Some(path.clone());
        }
        if let Some(ms) = cli.timeout {
            self.resolver.lookup_timeout_ms = ms;
        }

        self.report.verbose |= cli.verbose;
        self.report.duplicates |= cli.duplicates;
        self.report.non_resolving |= cli.non_resolving;
        self.report.split_sed |= cli.split_sed;
    }

    pub fn run_config(&self) -> RunConfig {
        let hostsfile = match &self.hosts.known_hosts_path {
            Some(path) => path.clone(),
            None => default_hostsfile(std::env::var_os("HOME")),
        };

        let lookup_timeout = match self.resolver.lookup_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        RunConfig {
            hostsfile,
            verbose: self.report.verbose,
            duplicates: self.report.duplicates,
            non_resolving: self.report.non_resolving,
            split_sed: self.report.split_sed,
            lookup_timeout,
        }
    }
}

/// `$HOME/.ssh/known_hosts`, or `.ssh/known_hosts` relative to the working directory without `HOME`.
fn default_hostsfile(home: Option<OsString>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(".ssh").join("known_hosts"),
        None => PathBuf::from(".ssh").join("known_hosts"),
    }
}

fn expand_tilde(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().context("Failed to determine home directory")?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}
