//! Runtime configuration loaded from environment variables.
//!
//! `AppConfig::from_env` loads a `.env` file when one is present, then reads
//! every setting with a default where one makes sense. A missing `.env` is
//! ignored; one that cannot be read or parsed is an error. `ADMIN_EMAIL` is the
//! only required variable and, like `MAIL_FROM`, must be a valid address. Any
//! value that fails to parse is reported as a `ConfigError` and aborts start-up
//! in `main.rs`.

use crate::pdf::{Orientation, PageSize};
use crate::signature::SignatureRetention;
use lettre::Address;
use log::info;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("could not load .env: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// SMTP transport settings. Present only when `SMTP_HOST` is set.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("tls", &self.tls)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root directory holding the sqlite database, signatures and contracts.
    pub data_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub admin_email: String,
    pub mail_from: String,
    pub smtp: Option<SmtpSettings>,
    pub signature_retention: SignatureRetention,
    pub default_template: String,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub admin_token: Option<String>,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(path) = env_file(dotenvy::dotenv())? {
            info!("Loaded settings from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let admin_email = get("ADMIN_EMAIL").ok_or(ConfigError::Missing("ADMIN_EMAIL"))?;
        let admin_email = address("ADMIN_EMAIL", admin_email)?;
        let mail_from = match get("MAIL_FROM") {
            Some(from) => address("MAIL_FROM", from)?,
            None => admin_email.clone(),
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
                tls: parse_bool("SMTP_TLS", get("SMTP_TLS"), true)?,
            }),
            None => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", get("PORT"), 8080)?,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            fonts_dir: PathBuf::from(get("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string())),
            font_family: get("FONT_FAMILY").unwrap_or_else(|| "DejaVuSans".to_string()),
            admin_email,
            mail_from,
            smtp,
            signature_retention: parse_or(
                "SIGNATURE_RETENTION",
                get("SIGNATURE_RETENTION"),
                SignatureRetention::Delete,
            )?,
            default_template: get("DEFAULT_TEMPLATE").unwrap_or_else(|| "default".to_string()),
            page_size: parse_or("PAGE_SIZE", get("PAGE_SIZE"), PageSize::A4)?,
            orientation: parse_or("PAGE_ORIENTATION", get("PAGE_ORIENTATION"), Orientation::Portrait)?,
            admin_token: get("ADMIN_TOKEN"),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), 5 * 1024 * 1024)?,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("contracts.sqlite")
    }

    pub fn signatures_dir(&self) -> PathBuf {
        self.data_dir.join("signatures")
    }

    pub fn contracts_dir(&self) -> PathBuf {
        self.data_dir.join("contracts")
    }
}

/// A missing `.env` is not an error; an unreadable or malformed one is.
fn env_file<T>(result: Result<T, dotenvy::Error>) -> Result<Option<T>, ConfigError> {
    match result {
        Ok(loaded) => Ok(Some(loaded)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn address(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    match trimmed.parse::<Address>() {
        Ok(_) => Ok(trimmed.to_string()),
        Err(_) => Err(ConfigError::Invalid { name, value }),
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

fn parse_bool(name: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                value: value.unwrap_or_default(),
            }),
        },
    }
}
