use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Profile ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Base URL of the QuickNews backend
    pub endpoint: String,
    /// Anti-forgery token to seed the cookie store with. Normally issued by the
    /// backend on the first request.
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Per-request timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Delay between revealed characters of an assistant reply
    #[serde(default = "default_typewriter_delay_ms")]
    pub typewriter_delay_ms: u64,
    /// How often the typing indicator changes state
    #[serde(default = "default_indicator_interval_ms")]
    pub indicator_interval_ms: u64,
    /// Length of the history entry removal transition
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8000/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_typewriter_delay_ms() -> u64 {
    5
}

fn default_indicator_interval_ms() -> u64 {
    2000
}

fn default_fade_ms() -> u64 {
    300
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            csrf_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            typewriter_delay_ms: default_typewriter_delay_ms(),
            indicator_interval_ms: default_indicator_interval_ms(),
            fade_ms: default_fade_ms(),
        }
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Which profile to use when none is specified
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            profiles: HashMap::new(),
        }
    }
}

impl ConfigFile {
    /// Load from disk, or return a default config if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    /// Write a starter config file to disk (only if it doesn't exist).
    pub fn write_default_if_missing() -> Result<PathBuf> {
        let path = config_path();
        write_default_to(&path)?;
        Ok(path)
    }

    /// Resolve the active profile given an optional override name.
    pub fn resolve_profile(&self, name: Option<&str>) -> Option<&Profile> {
        let key = name.unwrap_or(&self.default_profile);
        self.profiles.get(key)
    }
}

fn write_default_to(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write config file at {}", path.display()))
}

// ── Resolved runtime config (after merging file + CLI overrides) ──────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub csrf_token: Option<String>,
    /// Profile name that was resolved (for display)
    pub profile_name: String,
    pub request_timeout: Option<Duration>,
    pub typewriter_delay: Duration,
    pub indicator_interval: Duration,
    pub fade: Duration,
}

impl ResolvedConfig {
    /// Merge config file profile with CLI overrides.
    /// Priority: CLI args > env vars (handled by clap) > config file profile > built-in defaults
    pub fn resolve(
        file: &ConfigFile,
        profile_override: Option<&str>,
        endpoint_override: Option<&str>,
        csrf_override: Option<&str>,
    ) -> Self {
        let profile_name = profile_override
            .unwrap_or(&file.default_profile)
            .to_string();

        let base = file
            .resolve_profile(profile_override)
            .cloned()
            .unwrap_or_default();

        Self {
            endpoint: endpoint_override
                .map(str::to_string)
                .unwrap_or(base.endpoint),
            csrf_token: csrf_override
                .map(str::to_string)
                .or(base.csrf_token),
            profile_name,
            request_timeout: (base.request_timeout_secs > 0)
                .then(|| Duration::from_secs(base.request_timeout_secs)),
            typewriter_delay: Duration::from_millis(base.typewriter_delay_ms),
            // A zero period would spin the tokio interval
            indicator_interval: Duration::from_millis(base.indicator_interval_ms.max(1)),
            fade: Duration::from_millis(base.fade_ms),
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    dirs_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quicknews")
        .join("config.toml")
}

/// Directory for the log file.
pub fn state_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local").join("state"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quicknews")
}

fn dirs_config_dir() -> Option<PathBuf> {
    // XDG_CONFIG_HOME or ~/.config
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

// ── Default config template written on first run ──────────────────────────────

const DEFAULT_CONFIG_TOML: &str = r#"# QuickNews configuration
# Run `quicknews --init` to regenerate this file.

default_profile = "local"

# ── Local development server (default) ───────────────────────────────────────
[profiles.local]
endpoint             = "http://localhost:8000/"
request_timeout_secs = 120     # 0 = wait forever

# ── Hosted instance ──────────────────────────────────────────────────────────
# [profiles.hosted]
# endpoint   = "https://news.example.com/"
# csrf_token = "..."           # only if the server does not issue one on GET /

# ── Animation timing (optional, per-profile) ─────────────────────────────────
# typewriter_delay_ms   = 5    # per revealed character; 0 shows replies at once
# indicator_interval_ms = 2000 # typing indicator state change
# fade_ms               = 300  # history entry removal transition
"#;
