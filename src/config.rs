//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::intake::Language;

/// Default model for conversational fallback replies.
pub const DEFAULT_REPLY_MODEL: &str = "claude-3-5-haiku-latest";

/// Intake configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Failed KYC submissions allowed before the session locks.
    pub max_kyc_attempts: u32,
    /// Failed one-time codes allowed before the session locks. `None` keeps
    /// code entry unlimited.
    pub max_otp_attempts: Option<u32>,
    /// Upper bound on any single verification call. Exceeding it counts as a
    /// failed verification.
    pub verification_timeout: Duration,
    /// Language of a fresh session.
    pub default_language: Language,
    /// Port for the REST surface; `None` disables it.
    pub http_port: Option<u16>,
    /// Model used for conversational fallback replies.
    pub reply_model: String,
    /// Without a key, fallback replies come from a static text.
    pub anthropic_api_key: Option<SecretString>,
    /// Whether the mock verification backend simulates network delay.
    pub simulate_latency: bool,
    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_kyc_attempts: 3,
            max_otp_attempts: None,
            verification_timeout: Duration::from_secs(10),
            default_language: Language::En,
            http_port: None,
            reply_model: DEFAULT_REPLY_MODEL.to_string(),
            anthropic_api_key: None,
            simulate_latency: true,
            log_level: "info".to_string(),
        }
    }
}

impl IntakeConfig {
    /// Build a config from `LOAN_ASSIST_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_kyc_attempts = match lookup("LOAN_ASSIST_MAX_KYC_ATTEMPTS") {
            Some(raw) => parse_attempts("LOAN_ASSIST_MAX_KYC_ATTEMPTS", &raw)?,
            None => defaults.max_kyc_attempts,
        };

        let max_otp_attempts = lookup("LOAN_ASSIST_MAX_OTP_ATTEMPTS")
            .map(|raw| parse_attempts("LOAN_ASSIST_MAX_OTP_ATTEMPTS", &raw))
            .transpose()?;

        let verification_timeout = match lookup("LOAN_ASSIST_VERIFY_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("LOAN_ASSIST_VERIFY_TIMEOUT_SECS", &raw)?),
            None => defaults.verification_timeout,
        };

        let default_language = match lookup("LOAN_ASSIST_LANGUAGE") {
            Some(raw) => raw.parse::<Language>().map_err(|message| ConfigError::InvalidValue {
                key: "LOAN_ASSIST_LANGUAGE".to_string(),
                message,
            })?,
            None => defaults.default_language,
        };

        let http_port = lookup("LOAN_ASSIST_HTTP_PORT")
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: "LOAN_ASSIST_HTTP_PORT".to_string(),
                        message: e.to_string(),
                    })
            })
            .transpose()?;

        let simulate_latency = match lookup("LOAN_ASSIST_SIMULATE_LATENCY") {
            Some(raw) => !matches!(raw.trim(), "0" | "false" | "no" | "off"),
            None => defaults.simulate_latency,
        };

        Ok(Self {
            max_kyc_attempts,
            max_otp_attempts,
            verification_timeout,
            default_language,
            http_port,
            reply_model: lookup("LOAN_ASSIST_MODEL").unwrap_or(defaults.reply_model),
            anthropic_api_key: lookup("ANTHROPIC_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            simulate_latency,
            log_level: lookup("LOAN_ASSIST_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_attempts(key: &str, raw: &str) -> Result<u32, ConfigError> {
    let value: u32 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}
