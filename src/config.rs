use std::{env, fmt::Display, str::FromStr};

use anyhow::{anyhow, bail, Result};
use tracing::{info, warn};

use crate::upload::{ConvertOptions, MAX_UPLOAD_BYTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    S3,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "s3" => Ok(Self::S3),
            other => Err(format!("unknown storage backend {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
    pub bucket: String,
    pub s3_endpoint: Option<String>,
    pub public_base_url: Option<String>,
    /// When set, records are read and written through this API instead of memory
    pub records_url: Option<String>,
    pub webp_quality: f32,
    pub webp_effort: u8,
    pub max_upload_bytes: usize,
    pub password_pepper: Option<String>,
    pub max_failed_logins: u32,
    pub lockout_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            storage: StorageBackend::Memory,
            bucket: "estate-hub-images".to_string(),
            s3_endpoint: None,
            public_base_url: None,
            records_url: None,
            webp_quality: 80.0,
            webp_effort: 4,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            password_pepper: None,
            max_failed_logins: 5,
            lockout_minutes: 15,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            port: try_load("ESTATE_PORT", "8080")?,
            storage: try_load("ESTATE_STORAGE", "memory")?,
            bucket: try_load("ESTATE_BUCKET", "estate-hub-images")?,
            s3_endpoint: optional("ESTATE_S3_ENDPOINT"),
            public_base_url: optional("ESTATE_PUBLIC_BASE_URL"),
            records_url: optional("ESTATE_RECORDS_URL"),
            webp_quality: try_load("ESTATE_WEBP_QUALITY", "80")?,
            webp_effort: try_load("ESTATE_WEBP_EFFORT", "4")?,
            max_upload_bytes: try_load("ESTATE_MAX_UPLOAD_BYTES", "5242880")?,
            password_pepper: optional("ESTATE_PASSWORD_PEPPER"),
            max_failed_logins: try_load("ESTATE_MAX_FAILED_LOGINS", "5")?,
            lockout_minutes: try_load("ESTATE_LOCKOUT_MINUTES", "15")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.webp_quality) {
            bail!("ESTATE_WEBP_QUALITY must be between 0 and 100");
        }
        if self.webp_effort > 6 {
            bail!("ESTATE_WEBP_EFFORT must be between 0 and 6");
        }
        if self.max_upload_bytes == 0 {
            bail!("ESTATE_MAX_UPLOAD_BYTES must be positive");
        }
        Ok(())
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            quality: self.webp_quality,
            effort: self.webp_effort,
            ..ConvertOptions::default()
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("invalid {key} value {raw:?}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("ftp".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let config = AppConfig {
            webp_quality: 120.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn convert_options_keep_fallback_enabled() {
        let config = AppConfig {
            webp_quality: 65.0,
            webp_effort: 2,
            ..AppConfig::default()
        };
        let options = config.convert_options();
        assert_eq!(options.quality, 65.0);
        assert_eq!(options.effort, 2);
        assert!(options.fallback_to_original);
    }
}
