//! Configuration loader
//!
//! Loads [`ApiSettings`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `APSIS_API_URL`: API host, with or without an `http(s)://` scheme
//!   (required)
//! - `APSIS_API_KEY`: API key (required)
//! - `APSIS_API_SSL`: Force HTTPS (true/false)
//! - `APSIS_API_PORT`: Port, only honoured with SSL
//! - `APSIS_MAILING_LISTS`: Comma-separated allowed mailing list ids
//! - `APSIS_HTTP_TIMEOUT_SECS`: Request timeout in seconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./apsis.toml`, `./apsis.json`, `./config.toml`, `./config.json`
//!    (current working directory)
//! 2. The same names one directory up
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use apsis_domain::{ApiSettings, ApsisError, Result};
use url::Url;

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["apsis.toml", "apsis.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ApsisError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<ApiSettings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!(host = %settings.host, ssl = settings.ssl, "Configuration loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ApsisError::Config` if `APSIS_API_URL` or `APSIS_API_KEY` is
/// missing, or an optional variable has an invalid value.
pub fn load_from_env() -> Result<ApiSettings> {
    let (url_ssl, host, url_port) = parse_api_url(&env_var("APSIS_API_URL")?)?;
    let api_key = env_var("APSIS_API_KEY")?;

    let mut settings = ApiSettings {
        ssl: env_bool("APSIS_API_SSL", url_ssl),
        host,
        port: url_port,
        api_key,
        ..ApiSettings::default()
    };

    if let Some(port) = optional_env("APSIS_API_PORT") {
        settings.port = Some(
            port.parse::<u16>().map_err(|e| ApsisError::Config(format!("Invalid APSIS_API_PORT: {e}")))?,
        );
    }

    if let Some(lists) = optional_env("APSIS_MAILING_LISTS") {
        settings.allowed_mailing_lists =
            lists.split(',').map(str::trim).filter(|id| !id.is_empty()).map(str::to_string).collect();
    }

    if let Some(timeout) = optional_env("APSIS_HTTP_TIMEOUT_SECS") {
        settings.request_timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| ApsisError::Config(format!("Invalid APSIS_HTTP_TIMEOUT_SECS: {e}")))?;
    }

    Ok(settings)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ApsisError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ApiSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ApsisError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths()
            .ok_or_else(|| ApsisError::Config("No config file found in any of the standard locations".to_string()))?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ApsisError::from(InfraError::from(e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ApiSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| ApsisError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApsisError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ApsisError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Split an API URL into (ssl, host-with-path, port).
///
/// A bare host keeps SSL off; `https://` turns it on.
fn parse_api_url(raw: &str) -> Result<(bool, String, Option<u16>)> {
    let raw = raw.trim();
    if !raw.contains("://") {
        return Ok((false, raw.trim_end_matches('/').to_string(), None));
    }

    let url = Url::parse(raw).map_err(|e| ApsisError::Config(format!("Invalid APSIS_API_URL: {e}")))?;
    let ssl = match url.scheme() {
        "https" => true,
        "http" => false,
        other => return Err(ApsisError::Config(format!("Unsupported APSIS_API_URL scheme: {other}"))),
    };
    let host = url.host_str().ok_or_else(|| ApsisError::Config("APSIS_API_URL has no host".to_string()))?;
    let path = url.path().trim_end_matches('/');

    Ok((ssl, format!("{host}{path}"), url.port()))
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| ApsisError::Config(format!("Missing required environment variable: {key}")))
}

/// Non-empty environment variable, if set.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
