mod defaults;
mod prompts;

#[cfg(test)]
mod tests;

pub use prompts::*;

use std::str::FromStr;

use crate::error::AideError;
use crate::model::DeliveryMatch;
use defaults::*;

/// Top-level aide configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub memory: MemoryConfig,
    pub provider: ProviderConfig,
    pub channel: TwilioConfig,
    pub api: ApiConfig,
    pub scheduler: SchedulerConfig,
    /// Directory for daily rolling log files. `None` = stderr only.
    pub log_dir: Option<String>,
}

/// Persistent store config.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Store connection string (`sqlite:<path>`, a bare path, or `sqlite::memory:`).
    pub db_url: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_url: default_db_url(),
        }
    }
}

/// OpenAI-compatible completion provider config.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Upper bound for a single oracle call, in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Twilio WhatsApp outbound channel config.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    pub from: String,
    pub base_url: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from: default_twilio_from(),
            base_url: default_twilio_base_url(),
        }
    }
}

/// Webhook server config.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// Reminder dispatcher config.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval_secs: u64,
    pub delivery_match: DeliveryMatch,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            delivery_match: DeliveryMatch::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, AideError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AideError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let delivery_match = match get("AIDE_DISPATCH_MATCH") {
            Some(raw) => DeliveryMatch::parse(&raw).ok_or_else(|| {
                AideError::Config(format!(
                    "AIDE_DISPATCH_MATCH must be 'exact' or 'catch-up', got '{raw}'"
                ))
            })?,
            None => DeliveryMatch::default(),
        };

        let poll_interval_secs = parse_var(&get, "AIDE_POLL_SECS", default_poll_interval())?;
        if poll_interval_secs == 0 {
            return Err(AideError::Config(
                "AIDE_POLL_SECS must be greater than zero".into(),
            ));
        }

        Ok(Self {
            memory: MemoryConfig {
                db_url: get("DATABASE_URL").unwrap_or_else(default_db_url),
            },
            provider: ProviderConfig {
                api_key: get("OPENAI_API_KEY").unwrap_or_default(),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(default_openai_base_url),
                model: get("OPENAI_MODEL").unwrap_or_else(default_openai_model),
                timeout_secs: parse_var(
                    &get,
                    "AIDE_ORACLE_TIMEOUT_SECS",
                    default_timeout_secs(),
                )?,
            },
            channel: TwilioConfig {
                account_sid: get("TWILIO_SID").unwrap_or_default(),
                auth_token: get("TWILIO_TOKEN").unwrap_or_default(),
                from: get("TWILIO_FROM").unwrap_or_else(default_twilio_from),
                base_url: get("TWILIO_API_URL").unwrap_or_else(default_twilio_base_url),
            },
            api: ApiConfig {
                host: get("AIDE_HOST").unwrap_or_else(default_api_host),
                port: parse_var(&get, "AIDE_PORT", default_api_port())?,
            },
            scheduler: SchedulerConfig {
                poll_interval_secs,
                delivery_match,
            },
            log_dir: get("AIDE_LOG_DIR"),
        })
    }

    /// Fail unless the completion provider credential is set.
    pub fn require_provider(&self) -> Result<(), AideError> {
        if self.provider.api_key.is_empty() {
            return Err(AideError::Config(
                "OPENAI_API_KEY is not set; the assistant cannot classify messages".into(),
            ));
        }
        Ok(())
    }

    /// Fail unless the outbound channel credentials are set.
    pub fn require_channel(&self) -> Result<(), AideError> {
        let mut missing = Vec::new();
        if self.channel.account_sid.is_empty() {
            missing.push("TWILIO_SID");
        }
        if self.channel.auth_token.is_empty() {
            missing.push("TWILIO_TOKEN");
        }
        if !missing.is_empty() {
            return Err(AideError::Config(format!(
                "{} not set; reminders cannot be delivered",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T, AideError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AideError::Config(format!("invalid {key} '{raw}': {e}"))),
        None => Ok(default),
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}
