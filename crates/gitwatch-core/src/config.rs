//! Configuration loaded from environment-style key/value pairs.
//!
//! All required keys are checked up front and reported together, so a
//! misconfigured deployment fails once with the full list instead of one
//! key per restart.

use std::path::PathBuf;
use std::time::Duration;

use crate::app::scheduler::TickSchedule;
use crate::domain::{ConfigError, Watermark};

pub const DEFAULT_SCHEDULE: &str = "*/5 * * * *";
pub const DEFAULT_WATERMARK_FILE: &str = "since_time.data";
pub const DEFAULT_SUBJECT: &str = "GIT File Change Notification";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Remote history API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabConfig {
    pub base_url: String,
    pub repository: String,
    pub token: String,
}

/// SMTP settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise.
    pub secure: bool,
    pub user: String,
    pub pass: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub gitlab: GitLabConfig,
    pub tracked_path: String,
    pub email: EmailConfig,
    pub email_subject: String,
    pub chat_webhook_url: Option<String>,
    pub initial_since: Option<Watermark>,
    pub schedule: String,
    pub watermark_file: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup function. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |key: &str| {
            get(key).unwrap_or_else(|| {
                missing.push(key.to_string());
                String::new()
            })
        };

        let base_url = required("GITLAB_URL");
        let tracked_path = required("FILE_PATH");
        let repository = required("REPOSITORY");
        let token = required("PRIVATE_TOKEN");
        let host = required("EMAIL_HOST");
        let port = required("PORT");
        let user = required("AUTH_USER");
        let pass = required("AUTH_PASS");
        let recipients = required("RECIPIENTS");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let port = port.parse::<u16>().map_err(|e| invalid("PORT", e))?;
        let secure = match get("SECURE") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid("SECURE", format!("{raw:?} is not a boolean"))
            })?,
            None => false,
        };
        let recipients: Vec<String> = recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        if recipients.is_empty() {
            return Err(invalid("RECIPIENTS", "no recipient addresses"));
        }

        let initial_since = get("SINCE")
            .map(|raw| raw.parse::<Watermark>().map_err(|e| invalid("SINCE", e)))
            .transpose()?;

        let schedule = get("SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
        TickSchedule::parse(&schedule)?;

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|e| invalid("HTTP_TIMEOUT_SECS", e))?;
                if secs == 0 {
                    return Err(invalid("HTTP_TIMEOUT_SECS", "must be greater than zero"));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            gitlab: GitLabConfig {
                base_url,
                repository,
                token,
            },
            tracked_path,
            email: EmailConfig {
                host,
                port,
                secure,
                user,
                pass,
                recipients,
            },
            email_subject: get("EMAIL_SUBJECT").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            chat_webhook_url: get("CHAT_WEBHOOK_URL"),
            initial_since,
            schedule,
            watermark_file: get("WATERMARK_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WATERMARK_FILE)),
            http_timeout,
        })
    }
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
