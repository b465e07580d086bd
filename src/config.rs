//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honoured for local
//! development.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use chrono_tz::Tz;

/// How outgoing mail is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// Deliver through the configured SMTP relay.
    Smtp,
    /// Log messages instead of sending them.
    Log,
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Root directory for uploaded files
    pub media_root: PathBuf,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Local time zone used for dates, reminders and diaries
    pub time_zone: Tz,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Whether session cookies carry the `Secure` attribute
    pub secure_cookies: bool,

    pub mail_backend: MailBackend,
    pub smtp: SmtpSettings,
    /// Sender for reminders and diary notifications
    pub default_from_email: String,
    /// Sender for prefix-list update letters
    pub telecom_from_email: String,
    /// Recipient address identifying the HiNet contact
    pub hinet_mail: String,

    /// Local hour at which daily reminders go out
    pub reminder_daily_hour: u32,
    /// Calendar colors keyed by username
    pub calendar_user_colors: HashMap<String, String>,
    /// Authors whose pinned news appear on the diary page (empty = everyone)
    pub pinned_news_authors: Vec<i64>,
}

impl Config {
    /// Config for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            database_path: PathBuf::from(":memory:"),
            media_root: env::temp_dir().join("ctdb-test-uploads"),
            frontend_url: "http://localhost:5173".to_string(),
            time_zone: chrono_tz::Asia::Taipei,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            secure_cookies: false,
            mail_backend: MailBackend::Log,
            smtp: SmtpSettings {
                host: "localhost".to_string(),
                port: 25,
                username: None,
                password: None,
                starttls: false,
            },
            default_from_email: "TDB <TDB@chief.com.tw>".to_string(),
            telecom_from_email: "T21 <t21@chief.com.tw>".to_string(),
            hinet_mail: "unicom@cht.com.tw".to_string(),
            reminder_daily_hour: 9,
            calendar_user_colors: HashMap::new(),
            pinned_news_authors: Vec::new(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mail_backend = match env::var("MAIL_BACKEND")
            .unwrap_or_else(|_| "smtp".to_string())
            .as_str()
        {
            "smtp" => MailBackend::Smtp,
            "log" | "console" => MailBackend::Log,
            _ => return Err(ConfigError::Invalid("MAIL_BACKEND")),
        };

        let time_zone = env::var("TIME_ZONE")
            .unwrap_or_else(|_| "Asia/Taipei".to_string())
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid("TIME_ZONE"))?;

        let reminder_daily_hour = parse_or("REMINDER_DAILY_HOUR", 9)?;
        if reminder_daily_hour > 23 {
            return Err(ConfigError::Invalid("REMINDER_DAILY_HOUR"));
        }

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "ctdb.sqlite3".to_string())
                .into(),
            media_root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            time_zone,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            secure_cookies: parse_or("SECURE_COOKIES", true)?,
            mail_backend,
            smtp: SmtpSettings {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: parse_or("SMTP_PORT", 25)?,
                username: env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty()),
                password: env::var("SMTP_PASSWORD")
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
                starttls: parse_or("SMTP_STARTTLS", false)?,
            },
            default_from_email: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|_| "TDB <TDB@chief.com.tw>".to_string()),
            telecom_from_email: env::var("TELECOM_FROM_EMAIL")
                .map_err(|_| ConfigError::Missing("TELECOM_FROM_EMAIL"))?,
            hinet_mail: env::var("HINET_MAIL").unwrap_or_else(|_| "unicom@cht.com.tw".to_string()),
            reminder_daily_hour,
            calendar_user_colors: parse_colors(
                &env::var("CALENDAR_USER_COLORS").unwrap_or_default(),
            ),
            pinned_news_authors: parse_ids(&env::var("PINNED_NEWS_AUTHORS").unwrap_or_default())
                .ok_or(ConfigError::Invalid("PINNED_NEWS_AUTHORS"))?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(name))
        }
        _ => Ok(default),
    }
}

/// Parse `user=#hex,user2=#hex`.
fn parse_colors(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(user, color)| (user.trim().to_string(), color.trim().to_string()))
        .filter(|(user, color)| !user.is_empty() && !color.is_empty())
        .collect()
}

fn parse_ids(raw: &str) -> Option<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.parse().ok())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("TELECOM_FROM_EMAIL", "T21 <t21@chief.com.tw>");
        env::set_var("CALENDAR_USER_COLORS", "domo_lin=#FF0000, rico_hu=#00FF00");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.time_zone, chrono_tz::Asia::Taipei);
        assert_eq!(config.reminder_daily_hour, 9);
        assert_eq!(
            config.calendar_user_colors.get("rico_hu").map(String::as_str),
            Some("#00FF00")
        );
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids("10, 1003,1004"), Some(vec![10, 1003, 1004]));
        assert_eq!(parse_ids(""), Some(vec![]));
        assert_eq!(parse_ids("10,x"), None);
    }
}
