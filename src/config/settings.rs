//! Settings structures for Tube Remote configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub limits: LimitSettings,
    pub events: EventSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("YOUTUBE_API_KEY") {
            self.upstream.api_key = val;
        }
        if let Some(val) = var("PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("TUBE_REMOTE_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("TUBE_REMOTE_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(val);
        }
        if let Some(val) = var("TUBE_REMOTE_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, rule) in [
            ("default", &self.limits.default),
            ("search", &self.limits.search),
            ("control", &self.limits.control),
        ] {
            if rule.requests == 0 {
                bail!("limits.{}.requests must be greater than zero", name);
            }
            if rule.window_seconds == 0 {
                bail!("limits.{}.window_seconds must be greater than zero", name);
            }
        }
        if self.events.channel_capacity == 0 {
            bail!("events.channel_capacity must be greater than zero");
        }
        if self.events.keep_alive_seconds == 0 {
            bail!("events.keep_alive_seconds must be greater than zero");
        }
        if self.upstream.request_timeout <= 0.0 {
            bail!("upstream.request_timeout must be positive");
        }
        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Root directory for static assets
    pub static_dir: PathBuf,
    /// File served for `/`
    pub index_file: String,
    /// Method to determine real IP
    pub real_ip_method: RealIpMethod,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
            static_dir: PathBuf::from("."),
            index_file: "remote.html".to_string(),
            real_ip_method: RealIpMethod::default(),
        }
    }
}

/// Method to determine real client IP
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealIpMethod {
    /// Use X-Forwarded-For header
    XForwardedFor,
    /// Use X-Real-IP header
    XRealIp,
    /// Use connection IP directly
    #[default]
    Connection,
}

/// Upstream video search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// API key sent with every upstream call
    pub api_key: String,
    /// Search endpoint URL
    pub base_url: String,
    /// Value of the `part` parameter
    pub part: String,
    /// Value of the `type` parameter
    pub result_type: String,
    /// Request timeout in seconds
    pub request_timeout: f64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.googleapis.com/youtube/v3/search".to_string(),
            part: "snippet".to_string(),
            result_type: "video".to_string(),
            request_timeout: 10.0,
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }
}

/// Search result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Time to live of a cached result in seconds
    pub ttl_seconds: u64,
    /// Maximum number of cached queries
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 604_800,
            max_capacity: 100_000,
        }
    }
}

/// A request allowance: `requests` admitted per `window_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRule {
    pub requests: u32,
    pub window_seconds: u64,
}

impl LimitRule {
    pub const fn per_minute(requests: u32) -> Self {
        Self {
            requests,
            window_seconds: 60,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Rate limit settings per route class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Applied to every route without an override
    pub default: LimitRule,
    /// Search proxy route
    pub search: LimitRule,
    /// Playback control routes
    pub control: LimitRule,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            default: LimitRule::per_minute(10),
            search: LimitRule::per_minute(30),
            control: LimitRule::per_minute(60),
        }
    }
}

/// Event stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Idle time before a keep-alive frame is sent
    pub keep_alive_seconds: u64,
    /// Pending messages buffered per viewer before drops start
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            keep_alive_seconds: 30,
            channel_capacity: 16,
        }
    }
}

impl EventSettings {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_seconds)
    }
}
