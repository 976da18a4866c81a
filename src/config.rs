use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error opening configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Whether a fresh registration counts as verified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum EmailVerification {
    #[serde(rename = "NO")]
    No,
    #[default]
    #[serde(rename = "BEFORE")]
    Before,
    #[serde(rename = "AFTER")]
    After,
}

impl EmailVerification {
    pub fn verified_on_signup(self) -> bool {
        matches!(self, EmailVerification::No | EmailVerification::Before)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Vendor {
    pub name: String,
    pub url: String,
}

impl Default for Vendor {
    fn default() -> Self {
        Vendor {
            name: "iMediaPORT Limited".to_string(),
            url: "https://imediaport.com".to_string(),
        }
    }
}

/// Per-kind size ceilings of the file endpoint, in megabytes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub audio_mb: u64,
    pub cover_mb: u64,
    pub document_mb: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            audio_mb: 100,
            cover_mb: 10,
            document_mb: 20,
        }
    }
}

impl Limits {
    pub fn largest_bytes(&self) -> u64 {
        self.audio_mb.max(self.cover_mb).max(self.document_mb).saturating_mul(MB)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,
    #[serde(default = "default_public_url")]
    pub public_url: String,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default)]
    pub email_verification: EmailVerification,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub vendor: Vendor,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default = "default_job_ttl_days")]
    pub job_ttl_days: i64,
    #[serde(default = "default_job_purge_interval_secs")]
    pub job_purge_interval_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_port() -> u16 {
    3000
}

fn default_upload_root() -> PathBuf {
    PathBuf::from("public/uploads")
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_job_ttl_days() -> i64 {
    30
}

fn default_job_purge_interval_secs() -> u64 {
    3600
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Config for a given database with every other field defaulted.
    pub fn with_database(database: impl Into<String>) -> Self {
        Config {
            port: default_port(),
            database: database.into(),
            upload_root: default_upload_root(),
            public_url: default_public_url(),
            jwt_secret: String::new(),
            email_verification: EmailVerification::default(),
            tenant: None,
            vendor: Vendor::default(),
            limits: Limits::default(),
            job_ttl_days: default_job_ttl_days(),
            job_purge_interval_secs: default_job_purge_interval_secs(),
            max_connections: default_max_connections(),
        }
    }
}
