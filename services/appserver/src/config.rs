use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_EXCLUDE_FILE: &str = ".api.exclude";

// Application server configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub api_prefix: String,
    pub exclude_file: PathBuf,
    pub principals_file: Option<PathBuf>,
    pub route_files: Vec<PathBuf>,
    pub permission_files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct AppConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    api_prefix: Option<String>,
    exclude_file: Option<PathBuf>,
    principals_file: Option<PathBuf>,
    #[serde(default)]
    route_files: Vec<PathBuf>,
    #[serde(default)]
    permission_files: Vec<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("WARDEN_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8443".to_string())
            .parse()
            .with_context(|| "parse WARDEN_BIND")?;
        let metrics_bind = std::env::var("WARDEN_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse WARDEN_METRICS_BIND")?;
        let api_prefix = std::env::var("WARDEN_API_PREFIX")
            .unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string());
        let exclude_file: PathBuf = std::env::var("WARDEN_EXCLUDE_FILE")
            .unwrap_or_else(|_| DEFAULT_EXCLUDE_FILE.to_string())
            .into();
        let principals_file = std::env::var("WARDEN_PRINCIPALS_FILE").ok().map(PathBuf::from);
        Ok(Self {
            bind_addr,
            metrics_bind,
            api_prefix: normalize_prefix(&api_prefix)?,
            exclude_file,
            principals_file,
            route_files: Vec::new(),
            permission_files: Vec::new(),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read WARDEN_CONFIG: {path}"))?;
            let override_cfg: AppConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse appserver config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.api_prefix {
                config.api_prefix = normalize_prefix(&value)?;
            }
            if let Some(value) = override_cfg.exclude_file {
                config.exclude_file = value;
            }
            if let Some(value) = override_cfg.principals_file {
                config.principals_file = Some(value);
            }
            config.route_files = override_cfg.route_files;
            config.permission_files = override_cfg.permission_files;
        }
        Ok(config)
    }
}

// "" and "/" both mean "no prefix"; anything else must be absolute.
fn normalize_prefix(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') {
        anyhow::bail!("api prefix {value:?} must start with '/'");
    }
    Ok(trimmed.to_string())
}
