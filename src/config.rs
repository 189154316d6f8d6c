//! Configuration management for ipwatch.
//!
//! Configuration comes from a TOML file, or from environment variables when
//! no file is present. Either way it is resolved and validated once and never
//! changes afterwards.

use crate::error::{DdnsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Record names used by DNS-O-Matic when none are configured.
pub const DNSOMATIC_ALL_RECORDS: &str = "all.dnsomatic.com";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL returning the caller's public IP as plain text.
    #[serde(default = "default_ip_source")]
    pub ip_source: String,

    /// Check interval in seconds (default: 300 = 5 minutes).
    #[serde(default = "default_interval")]
    pub check_interval_secs: u64,

    /// Where the last applied IP is kept between runs.
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Label prefixed to every notification.
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Comma-separated record names to keep updated.
    #[serde(default)]
    pub records: String,

    /// Timeout for IP lookups and provider calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Upper bound on a single notification send.
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,

    /// DNS backend.
    pub provider: ProviderConfig,

    /// Notification channels.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_ip_source() -> String {
    "https://ipv4.icanhazip.com/".to_string()
}

fn default_interval() -> u64 {
    300
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("/config/ip.cache.txt")
}

fn default_site_name() -> String {
    "mysite".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_notify_timeout() -> u64 {
    15
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "cloudflare")]
    Cloudflare {
        /// API token (or environment variable name if prefixed with $).
        api_token: String,
        /// Zone ID.
        zone_id: String,
        /// TTL in seconds, 1 means automatic (default: 1).
        #[serde(default = "default_cloudflare_ttl")]
        ttl: u32,
        /// Whether to proxy through Cloudflare (default: false).
        #[serde(default)]
        proxied: bool,
    },

    #[serde(rename = "dnsmadeeasy")]
    DnsMadeEasy {
        /// API key.
        api_key: String,
        /// Secret key used to sign requests.
        secret_key: String,
        /// Managed domain ID.
        zone_id: String,
        /// TTL in seconds (default: 1800).
        #[serde(default = "default_dnsmadeeasy_ttl")]
        ttl: u32,
    },

    #[serde(rename = "dnsomatic")]
    DnsOMatic {
        username: String,
        password: String,
        #[serde(default = "default_nochg")]
        wildcard: String,
        #[serde(default = "default_nochg")]
        mx: String,
        #[serde(default = "default_nochg")]
        backup_mx: String,
    },
}

fn default_cloudflare_ttl() -> u32 {
    1
}

fn default_dnsmadeeasy_ttl() -> u32 {
    1800
}

fn default_nochg() -> String {
    "NOCHG".to_string()
}

/// Notification channel settings. A channel is used only when present and enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub pushover: Option<PushoverConfig>,
    #[serde(default)]
    pub pushbullet: Option<PushbulletConfig>,
    #[serde(default)]
    pub notify_me: Option<NotifyMeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushoverConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Application token.
    pub token: String,
    pub user_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushbulletConfig {
    #[serde(default)]
    pub enabled: bool,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyMeConfig {
    #[serde(default)]
    pub enabled: bool,
    pub access_code: String,
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("ipwatch").join("config.toml"))
    }

    /// Places a config file is looked for, in order.
    pub fn candidate_paths() -> Vec<PathBuf> {
        [
            Self::default_path().ok(),
            Some(PathBuf::from("/etc/ipwatch/config.toml")),
            Some(PathBuf::from("config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from an explicit path, else the first existing candidate file,
    /// else the environment.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::candidate_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config file found, reading configuration from environment");
                Self::from_env()
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DdnsError::Config(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse, resolve and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.finish()
    }

    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| DdnsError::Config(format!("{} is not set", key)))
        };

        let provider = match var("PROVIDER").as_deref() {
            Some("cf") => ProviderConfig::Cloudflare {
                api_token: required("APITOKEN")?,
                zone_id: required("CFZONEID")?,
                ttl: parse_var(&var, "TTL", default_cloudflare_ttl())?,
                proxied: parse_var(&var, "PROXIED", false)?,
            },
            Some("dme") => ProviderConfig::DnsMadeEasy {
                api_key: required("APIKEY")?,
                secret_key: required("SECRETKEY")?,
                zone_id: required("DMEZONEID")?,
                ttl: parse_var(&var, "TTL", default_dnsmadeeasy_ttl())?,
            },
            Some("dnsomatic") => ProviderConfig::DnsOMatic {
                username: required("DOMUSER")?,
                password: required("DOMPASSWD")?,
                wildcard: var("WILDCARD").unwrap_or_else(default_nochg),
                mx: var("MX").unwrap_or_else(default_nochg),
                backup_mx: var("BACKUPMX").unwrap_or_else(default_nochg),
            },
            Some(other) => {
                return Err(DdnsError::Config(format!(
                    "Unknown PROVIDER '{}' (expected cf, dme or dnsomatic)",
                    other
                )))
            }
            None => return Err(DdnsError::Config("PROVIDER is not set".to_string())),
        };

        let enabled = |key: &str| parse_var(&var, key, 0u8).map(|v| v != 0);

        let mut notifications = NotificationsConfig::default();
        if enabled("USETELEGRAM")? {
            notifications.telegram = Some(TelegramConfig {
                enabled: true,
                bot_token: required("MYTOKEN")?,
                chat_id: parse_var(&var, "CHATID", 0)?,
            });
        }
        if enabled("USEPUSHOVER")? {
            notifications.pushover = Some(PushoverConfig {
                enabled: true,
                token: required("PUSHOVER_TOKEN")?,
                user_key: required("PUSHOVER_USER")?,
            });
        }
        if enabled("USEPUSHBULLET")? {
            notifications.pushbullet = Some(PushbulletConfig {
                enabled: true,
                api_key: required("PUSHBULLET_KEY")?,
            });
        }
        if enabled("USENOTIFYME")? {
            notifications.notify_me = Some(NotifyMeConfig {
                enabled: true,
                access_code: required("NOTIFYME_CODE")?,
            });
        }

        let config = Config {
            ip_source: var("IPADDR_SRC").unwrap_or_else(default_ip_source),
            check_interval_secs: parse_var(&var, "INTERVAL", default_interval())?,
            cache_file: var("CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_file),
            site_name: var("SITENAME").unwrap_or_else(default_site_name),
            records: var("RECORDS").unwrap_or_default(),
            http_timeout_secs: default_http_timeout(),
            notify_timeout_secs: default_notify_timeout(),
            provider,
            notifications,
        };

        config.finish()
    }

    fn finish(mut self) -> Result<Self> {
        if self.records.trim().is_empty() {
            if let ProviderConfig::DnsOMatic { .. } = self.provider {
                self.records = DNSOMATIC_ALL_RECORDS.to_string();
            }
        }
        self.resolve_secrets()?;
        self.validate()?;
        Ok(self)
    }

    /// Replace `$VAR` references in secret fields with their values.
    fn resolve_secrets(&mut self) -> Result<()> {
        match &mut self.provider {
            ProviderConfig::Cloudflare { api_token, .. } => {
                *api_token = resolve_env(api_token)?;
            }
            ProviderConfig::DnsMadeEasy {
                api_key,
                secret_key,
                ..
            } => {
                *api_key = resolve_env(api_key)?;
                *secret_key = resolve_env(secret_key)?;
            }
            ProviderConfig::DnsOMatic {
                username, password, ..
            } => {
                *username = resolve_env(username)?;
                *password = resolve_env(password)?;
            }
        }

        let n = &mut self.notifications;
        if let Some(t) = n.telegram.as_mut() {
            t.bot_token = resolve_env(&t.bot_token)?;
        }
        if let Some(p) = n.pushover.as_mut() {
            p.token = resolve_env(&p.token)?;
            p.user_key = resolve_env(&p.user_key)?;
        }
        if let Some(p) = n.pushbullet.as_mut() {
            p.api_key = resolve_env(&p.api_key)?;
        }
        if let Some(m) = n.notify_me.as_mut() {
            m.access_code = resolve_env(&m.access_code)?;
        }
        Ok(())
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.ip_source.starts_with("http://") || self.ip_source.starts_with("https://")) {
            return Err(DdnsError::Config(format!(
                "ip_source must be an http(s) URL, got '{}'",
                self.ip_source
            )));
        }
        if self.check_interval_secs == 0 {
            return Err(DdnsError::Config(
                "check_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 || self.notify_timeout_secs == 0 {
            return Err(DdnsError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.record_names().is_empty() {
            return Err(DdnsError::Config("No records configured".to_string()));
        }

        let provider = self.provider.name();
        let credentials: Vec<(&str, &str)> = match &self.provider {
            ProviderConfig::Cloudflare {
                api_token, zone_id, ..
            } => vec![("api_token", api_token.as_str()), ("zone_id", zone_id.as_str())],
            ProviderConfig::DnsMadeEasy {
                api_key,
                secret_key,
                zone_id,
                ..
            } => vec![
                ("api_key", api_key.as_str()),
                ("secret_key", secret_key.as_str()),
                ("zone_id", zone_id.as_str()),
            ],
            ProviderConfig::DnsOMatic {
                username, password, ..
            } => vec![("username", username.as_str()), ("password", password.as_str())],
        };
        for (field, value) in credentials {
            if value.trim().is_empty() {
                return Err(DdnsError::Config(format!(
                    "{} provider requires {}",
                    provider, field
                )));
            }
        }

        let n = &self.notifications;
        let mut missing = Vec::new();
        if let Some(t) = n.telegram.as_ref().filter(|t| t.enabled) {
            if t.bot_token.is_empty() || t.chat_id == 0 {
                missing.push("telegram (bot_token, chat_id)");
            }
        }
        if let Some(p) = n.pushover.as_ref().filter(|p| p.enabled) {
            if p.token.is_empty() || p.user_key.is_empty() {
                missing.push("pushover (token, user_key)");
            }
        }
        if let Some(p) = n.pushbullet.as_ref().filter(|p| p.enabled) {
            if p.api_key.is_empty() {
                missing.push("pushbullet (api_key)");
            }
        }
        if let Some(m) = n.notify_me.as_ref().filter(|m| m.enabled) {
            if m.access_code.is_empty() {
                missing.push("notify_me (access_code)");
            }
        }
        if !missing.is_empty() {
            return Err(DdnsError::Config(format!(
                "Enabled notification channels missing credentials: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    /// Record names in configured order, trimmed, without blanks or repeats.
    pub fn record_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.records.split(',').map(str::trim) {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        Self {
            ip_source: default_ip_source(),
            check_interval_secs: 300,
            cache_file: default_cache_file(),
            site_name: "home".to_string(),
            records: "vpn, nas".to_string(),
            http_timeout_secs: default_http_timeout(),
            notify_timeout_secs: default_notify_timeout(),
            provider: ProviderConfig::Cloudflare {
                api_token: "$CF_API_TOKEN".to_string(),
                zone_id: "your-zone-id".to_string(),
                ttl: 1,
                proxied: false,
            },
            notifications: NotificationsConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    bot_token: "$TELEGRAM_TOKEN".to_string(),
                    chat_id: -1001234567890,
                }),
                pushover: None,
                pushbullet: None,
                notify_me: None,
            },
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl ProviderConfig {
    /// Get the provider name.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::DnsMadeEasy { .. } => "dnsmadeeasy",
            ProviderConfig::DnsOMatic { .. } => "dnsomatic",
        }
    }
}

/// Resolve environment variable references (values starting with $).
pub(crate) fn resolve_env(value: &str) -> Result<String> {
    match value.strip_prefix('$') {
        Some(var_name) => std::env::var(var_name).map_err(|_| {
            DdnsError::Config(format!("Environment variable {} not set", var_name))
        }),
        None => Ok(value.to_string()),
    }
}

fn parse_var<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            DdnsError::Config(format!("Invalid value '{}' for {}: {}", raw, key, e))
        }),
        None => Ok(default),
    }
}
