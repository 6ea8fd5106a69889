//! Configuration for blindctl.
//!
//! Read from `~/.blindctl/config.yaml`. Every field has a default, so a
//! missing file or a partial file both work:
//!
//! ```yaml
//! base_url: http://192.168.4.1/api/v1
//! # ws_url: ws://192.168.4.1/ws   (derived from base_url when absent)
//! request_timeout_secs: 5
//! log_capacity: 1000
//! reconnect:
//!   max_retries: 5
//!   initial_delay_ms: 500
//!   max_delay_ms: 30000
//!   multiplier: 2.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use blindctl_core::{PanelError, Result, RetryConfig, logging};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Default device API root (the device's access-point address).
pub const DEFAULT_BASE_URL: &str = "http://192.168.4.1/api/v1";

/// Default number of device log lines kept in memory.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Panel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// REST API root; endpoint paths such as `/remotes` are appended to it
    pub base_url: String,

    /// Log socket URL; derived from `base_url` when unset
    pub ws_url: Option<String>,

    /// Deadline applied to every HTTP request
    pub request_timeout_secs: u64,

    /// Ring buffer size for the device log view
    pub log_capacity: usize,

    /// Log socket reconnect policy
    pub reconnect: ReconnectSettings,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            ws_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_capacity: DEFAULT_LOG_CAPACITY,
            reconnect: ReconnectSettings::default(),
        }
    }
}

/// Reconnect policy as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    /// Reconnect attempts after a drop; 0 disables reconnecting
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        let policy = RetryConfig::for_reconnect();
        Self {
            max_retries: policy.max_retries,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

impl ReconnectSettings {
    /// Convert into the backoff policy used by the log socket.
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

impl PanelConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// `~/.blindctl/config.yaml` is used if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if required {
                    return Err(PanelError::config_not_found_with_source(&path, e));
                }
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(PanelError::io("reading config", &path, e)),
        };

        let config = Self::from_yaml_str(&contents).map_err(|e| match e {
            PanelError::ConfigInvalid { message, .. } => PanelError::ConfigInvalid {
                path: path.clone(),
                message,
            },
            other => other,
        })?;
        debug!(path = %path.display(), base_url = %config.base_url, "config loaded");
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| PanelError::ConfigInvalid {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges and URL shapes.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| PanelError::validation(format!("invalid base_url '{}': {e}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(PanelError::validation(format!(
                "base_url must use http or https, got '{}'",
                base.scheme()
            )));
        }
        if let Some(ws_url) = &self.ws_url {
            let ws = Url::parse(ws_url)
                .map_err(|e| PanelError::validation(format!("invalid ws_url '{ws_url}': {e}")))?;
            if !matches!(ws.scheme(), "ws" | "wss") {
                return Err(PanelError::validation(format!(
                    "ws_url must use ws or wss, got '{}'",
                    ws.scheme()
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(PanelError::validation("request_timeout_secs must be > 0"));
        }
        if self.log_capacity == 0 {
            return Err(PanelError::validation("log_capacity must be > 0"));
        }
        if self.reconnect.multiplier < 1.0 {
            return Err(PanelError::validation("reconnect.multiplier must be >= 1.0"));
        }
        Ok(())
    }

    /// Override the API root (from `--url`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the log socket URL (from `--ws-url`).
    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    /// Deadline applied to each HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reconnect policy for the log socket.
    pub fn reconnect_policy(&self) -> RetryConfig {
        self.reconnect.to_retry_config()
    }

    /// Log socket URL: the configured one, or `ws(s)://<base host>/ws`.
    pub fn resolved_ws_url(&self) -> Result<String> {
        if let Some(ws_url) = &self.ws_url {
            return Ok(ws_url.clone());
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PanelError::validation(format!("invalid base_url '{}': {e}", self.base_url)))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| PanelError::validation(format!("cannot derive ws_url from '{}'", self.base_url)))?;
        url.set_path("/ws");
        url.set_query(None);
        url.set_fragment(None);
        Ok(url.to_string())
    }
}

/// Returns `~/.blindctl/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(logging::default_home_dir()?.join("config.yaml"))
}
