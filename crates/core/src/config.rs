use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::{
    assets::{config_file_path, get_default_config},
    session::{Credential, Role},
};

#[derive(Error, Debug)]
pub enum ProbeConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CredentialConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProbeConfig {
    pub base_url: String,
    pub verbose: bool,
    pub timeout_secs: u64,
    pub admin: CredentialConfig,
    pub student: CredentialConfig,
}

impl ProbeConfig {
    /// The built-in configuration shipped in `data/config.yml`.
    pub fn defaults() -> Result<Self, ProbeConfigError> {
        let config: ProbeConfig = serde_yaml::from_str(get_default_config())?;
        config.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn credential(&self, role: Role) -> Credential {
        let creds = match role {
            Role::Admin => &self.admin,
            Role::Student => &self.student,
        };
        Credential {
            email: creds.email.clone(),
            password: creds.password.clone(),
            role,
        }
    }

    /// Checks the values a run cannot work without and normalizes the base URL.
    pub fn validate(mut self) -> Result<Self, ProbeConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ProbeConfigError::Config(format!("Invalid base_url '{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProbeConfigError::Config(format!(
                "Unsupported scheme in base_url: {}",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ProbeConfigError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

// Partial view of a config file; absent keys keep the embedded defaults.
#[derive(Deserialize, Debug, Default)]
struct RawConfig {
    base_url: Option<String>,
    verbose: Option<bool>,
    timeout_secs: Option<u64>,
    admin: Option<RawCredential>,
    student: Option<RawCredential>,
}

#[derive(Deserialize, Debug, Default)]
struct RawCredential {
    email: Option<String>,
    password: Option<String>,
}

impl RawCredential {
    fn merge_into(self, base: CredentialConfig) -> CredentialConfig {
        CredentialConfig {
            email: self.email.unwrap_or(base.email),
            password: self.password.unwrap_or(base.password),
        }
    }
}

impl RawConfig {
    fn merge_into(self, base: ProbeConfig) -> ProbeConfig {
        ProbeConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            verbose: self.verbose.unwrap_or(base.verbose),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            admin: self.admin.unwrap_or_default().merge_into(base.admin),
            student: self.student.unwrap_or_default().merge_into(base.student),
        }
    }
}

fn parse_config(content: &str) -> Result<ProbeConfig, ProbeConfigError> {
    // An empty file is the same as no overrides.
    let raw: Option<RawConfig> = if content.trim().is_empty() {
        None
    } else {
        serde_yaml::from_str(content)?
    };
    raw.unwrap_or_default()
        .merge_into(ProbeConfig::defaults()?)
        .validate()
}

fn load_optional(config_file: Option<&Path>) -> Result<ProbeConfig, ProbeConfigError> {
    match config_file {
        Some(path) if path.exists() => parse_config(&fs::read_to_string(path)?),
        _ => ProbeConfig::defaults(),
    }
}

/// Loads the run configuration.
///
/// An explicit `config_path` must exist. Without one, `cbtprobe.yml` in the
/// config directory is used when present, otherwise the built-in defaults.
#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<ProbeConfig, ProbeConfigError> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ProbeConfigError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let content = fs::read_to_string(&path)?;
            parse_config(&content)
        }
        None => load_optional(config_file_path().as_deref()),
    }
}
