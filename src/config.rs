//! Session manager configuration.
//!
//! The cache freshness window, the durable session lifetime and the
//! network-failure grace period are deliberately separate knobs: they live on
//! different timescales (minutes, days, hours) and must not be conflated.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Backend base URL.
    /// Example: "https://console.example.com/api"
    #[serde(default)]
    pub base_url: String,

    /// Path of the login-status operation, relative to `base_url`.
    #[serde(default = "default_login_status_path")]
    pub login_status_path: String,

    /// Path of the login operation.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Path of the logout operation.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    /// How long a server-confirmed answer is trusted without re-checking,
    /// in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Durable session lifetime in seconds.
    #[serde(default = "default_persisted_ttl")]
    pub persisted_ttl_secs: u64,

    /// Window after the last backend confirmation during which a network
    /// failure does not force logout, in seconds.
    #[serde(default = "default_grace")]
    pub grace_secs: u64,

    /// Background revalidation interval in seconds.
    #[serde(default = "default_revalidate_interval")]
    pub revalidate_interval_secs: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Path of the durable session database.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Operations allowed to carry credentials (cookies). Operations not
    /// listed here are called without a cookie jar.
    #[serde(default = "default_credentialed_operations")]
    pub credentialed_operations: Vec<String>,
}

fn default_login_status_path() -> String {
    "isLoggedIn".to_string()
}

fn default_login_path() -> String {
    "login".to_string()
}

fn default_logout_path() -> String {
    "logout".to_string()
}

fn default_cache_ttl() -> u64 {
    120 // 2 minutes
}

fn default_persisted_ttl() -> u64 {
    259_200 // 3 days
}

fn default_grace() -> u64 {
    86_400 // 24 hours
}

fn default_revalidate_interval() -> u64 {
    1_800 // 30 minutes
}

fn default_request_timeout() -> u64 {
    10
}

fn default_store_path() -> PathBuf {
    PathBuf::from("adconsole_session.redb")
}

fn default_credentialed_operations() -> Vec<String> {
    vec![
        "isLoggedIn".to_string(),
        "login".to_string(),
        "logout".to_string(),
    ]
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            login_status_path: default_login_status_path(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            cache_ttl_secs: default_cache_ttl(),
            persisted_ttl_secs: default_persisted_ttl(),
            grace_secs: default_grace(),
            revalidate_interval_secs: default_revalidate_interval(),
            request_timeout_secs: default_request_timeout(),
            store_path: default_store_path(),
            credentialed_operations: default_credentialed_operations(),
        }
    }
}

impl SessionConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("backend base_url is required".to_string());
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err("backend base_url must be a valid HTTP(S) URL".to_string());
        }

        if self.grace_secs > self.persisted_ttl_secs {
            return Err("grace_secs cannot exceed persisted_ttl_secs".to_string());
        }

        if self.cache_ttl_secs > self.grace_secs {
            return Err("cache_ttl_secs cannot exceed grace_secs".to_string());
        }

        if self.revalidate_interval_secs == 0 {
            return Err("revalidate_interval_secs must be positive".to_string());
        }

        Ok(())
    }

    /// Cache freshness window.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Durable session lifetime.
    pub fn persisted_ttl(&self) -> Duration {
        Duration::from_secs(self.persisted_ttl_secs)
    }

    /// Network-failure grace window.
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    /// Background revalidation interval.
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate_interval_secs)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// JSON configuration for dynamic reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfigJson {
    pub base_url: Option<String>,
    pub login_status_path: Option<String>,
    pub login_path: Option<String>,
    pub logout_path: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub persisted_ttl_secs: Option<u64>,
    pub grace_secs: Option<u64>,
    pub revalidate_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub credentialed_operations: Vec<String>,
}

impl SessionConfigJson {
    /// Apply JSON config to existing config.
    pub fn apply_to(&self, config: &mut SessionConfig) {
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ref path) = self.login_status_path {
            config.login_status_path = path.clone();
        }
        if let Some(ref path) = self.login_path {
            config.login_path = path.clone();
        }
        if let Some(ref path) = self.logout_path {
            config.logout_path = path.clone();
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache_ttl_secs = ttl;
        }
        if let Some(ttl) = self.persisted_ttl_secs {
            config.persisted_ttl_secs = ttl;
        }
        if let Some(grace) = self.grace_secs {
            config.grace_secs = grace;
        }
        if let Some(interval) = self.revalidate_interval_secs {
            config.revalidate_interval_secs = interval;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(ref path) = self.store_path {
            config.store_path = path.clone();
        }
        if !self.credentialed_operations.is_empty() {
            config.credentialed_operations = self.credentialed_operations.clone();
        }
    }
}
