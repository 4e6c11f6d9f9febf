use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use typeahead_core::{DEFAULT_MAX_RESULTS, DEFAULT_TERMINATOR};

/// Upper bound for `completion.max_results` and for a client's `suggest` limit.
pub const MAX_RESULTS_CAP: usize = 1024;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

impl DaemonConfig {
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path();
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config file {}", config_path.display()))?;
            let parsed = Self::from_toml(&raw)
                .with_context(|| format!("invalid config in {}", config_path.display()))?;
            return Ok(parsed);
        }

        Ok(DaemonConfig::default())
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let parsed: DaemonConfig = toml::from_str(raw).context("failed to parse TOML")?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_sessions == 0 {
            bail!("server.max_sessions must be at least 1");
        }
        if self.server.max_line_bytes == 0 {
            bail!("server.max_line_bytes must be at least 1");
        }
        if self.completion.max_results > MAX_RESULTS_CAP {
            bail!(
                "completion.max_results is {}, the maximum is {}",
                self.completion.max_results,
                MAX_RESULTS_CAP
            );
        }
        let terminator = self.completion.terminator;
        if let Some(seed) = self
            .completion
            .seed
            .iter()
            .find(|seed| seed.text.contains(terminator))
        {
            bail!(
                "seed entry {:?} contains the terminator {:?} and could never be typed",
                seed.text,
                terminator
            );
        }
        Ok(())
    }
}

fn resolve_config_path() -> PathBuf {
    if let Ok(path) = env::var("TYPEAHEAD_CONFIG") {
        return Path::new(&path).to_path_buf();
    }

    if let Some(base) = dirs::config_dir() {
        return base.join("typeahead").join("config.toml");
    }

    Path::new("/tmp/typeahead.toml").to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            max_sessions: default_max_sessions(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    Path::new("/tmp/typeahead.sock").to_path_buf()
}

fn default_max_sessions() -> u32 {
    64
}

fn default_max_line_bytes() -> usize {
    64 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_terminator")]
    pub terminator: char,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub seed: Vec<SeedEntry>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            terminator: default_terminator(),
            max_results: default_max_results(),
            seed: Vec::new(),
        }
    }
}

impl CompletionConfig {
    pub fn seed_pairs(&self) -> impl Iterator<Item = (&str, u64)> {
        self.seed.iter().map(|s| (s.text.as_str(), s.weight))
    }
}

fn default_terminator() -> char {
    DEFAULT_TERMINATOR
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub text: String,
    #[serde(default = "default_seed_weight")]
    pub weight: u64,
}

fn default_seed_weight() -> u64 {
    1
}
