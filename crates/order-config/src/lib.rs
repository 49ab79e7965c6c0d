//! Configuration for the order processing service.
//!
//! Configuration is read from TOML. `${VAR}` and `${VAR:-default}` references
//! are substituted from the environment before parsing, and the parsed result
//! is validated before it is handed to the builder.
//!
//! ## Modular configuration
//!
//! A file may pull in others with `include = ["storage.toml", ...]`. Each
//! top-level section must appear in exactly one file.

mod loader;

#[cfg(feature = "testing")]
pub mod builders;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub use loader::ConfigLoader;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the default rendering echoes the whole input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub service: ServiceConfig,
	pub storage: StorageConfig,
	pub notification: NotificationConfig,
	/// HTTP server settings. The server runs with defaults when omitted.
	pub api: Option<ApiConfig>,
}

/// Identity of the running service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	pub id: String,
	#[serde(default = "default_environment")]
	pub environment: String,
}

fn default_environment() -> String {
	"local".to_string()
}

/// Storage backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Key into `implementations` naming the backend to use.
	pub primary: String,
	/// Raw per-backend tables, validated by each backend's schema.
	pub implementations: HashMap<String, toml::Value>,
	/// Upper bound on a single store call.
	#[serde(default = "default_storage_timeout")]
	pub timeout_seconds: u64,
}

fn default_storage_timeout() -> u64 {
	5
}

/// Notification sinks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
	/// Upper bound on a single sink call, in milliseconds.
	#[serde(default = "default_notification_timeout")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

fn default_notification_timeout() -> u64 {
	2000
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request body size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	pub cors: Option<CorsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: default_api_enabled(),
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			max_request_size: default_max_request_size(),
			cors: None,
		}
	}
}

/// CORS configuration. Origins of `"*"` allow any origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	pub allowed_origins: Vec<String>,
	#[serde(default)]
	pub allowed_headers: Vec<String>,
	#[serde(default)]
	pub allowed_methods: Vec<String>,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024
}

const MAX_CONFIG_SIZE: usize = 1024 * 1024;

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.expect("environment variable pattern is valid")
});

/// Replaces `${VAR}` and `${VAR:-default}` with values from the environment.
///
/// A reference to an unset variable without a default is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	if input.len() > MAX_CONFIG_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_CONFIG_SIZE
		)));
	}

	let mut missing = None;
	let resolved = ENV_VAR_PATTERN.replace_all(input, |caps: &regex::Captures| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads, resolves and validates a configuration file and its includes.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;

		ConfigLoader::new(base_dir).load_config(file_name).await
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}
		if !(1..=300).contains(&self.storage.timeout_seconds) {
			return Err(ConfigError::Validation(
				"Storage timeout_seconds must be between 1 and 300".into(),
			));
		}

		if self.notification.timeout_ms == 0 {
			return Err(ConfigError::Validation(
				"Notification timeout_ms must be greater than 0".into(),
			));
		}

		if let Some(api) = &self.api {
			if api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"API timeout_seconds must be greater than 0".into(),
				));
			}
			if api.max_request_size == 0 {
				return Err(ConfigError::Validation(
					"API max_request_size must be greater than 0".into(),
				));
			}
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[service]
id = "order-processing-service"

[storage]
primary = "memory"
[storage.implementations.memory]

[notification]
[notification.implementations.log]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("ORDER_TEST_HOST", "localhost");
		std::env::set_var("ORDER_TEST_PORT", "8080");

		let result = resolve_env_vars("host = \"${ORDER_TEST_HOST}:${ORDER_TEST_PORT}\"").unwrap();
		assert_eq!(result, "host = \"localhost:8080\"");

		std::env::remove_var("ORDER_TEST_HOST");
		std::env::remove_var("ORDER_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let result = resolve_env_vars("value = \"${ORDER_MISSING_VAR:-fallback}\"").unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let err = resolve_env_vars("value = \"${ORDER_MISSING_VAR}\"").unwrap_err();
		assert!(err.to_string().contains("ORDER_MISSING_VAR"));
	}

	#[test]
	fn test_oversized_input_rejected() {
		let input = "#".repeat(MAX_CONFIG_SIZE + 1);
		assert!(matches!(
			resolve_env_vars(&input),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.service.environment, "local");
		assert_eq!(config.storage.timeout_seconds, 5);
		assert_eq!(config.notification.timeout_ms, 2000);
		assert!(config.api.is_none());

		let api = ApiConfig::default();
		assert_eq!(api.port, 8000);
		assert!(api.enabled);
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("ORDER_TEST_SERVICE_ID", "orders-from-env");
		let config: Config = MINIMAL
			.replace("order-processing-service", "${ORDER_TEST_SERVICE_ID}")
			.parse()
			.unwrap();
		assert_eq!(config.service.id, "orders-from-env");
		std::env::remove_var("ORDER_TEST_SERVICE_ID");
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let err = MINIMAL
			.replace("primary = \"memory\"", "primary = \"file\"")
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file'"));
	}

	#[test]
	fn test_storage_timeout_bounds() {
		for bad in ["0", "301"] {
			let src = MINIMAL.replace(
				"primary = \"memory\"",
				&format!("primary = \"memory\"\ntimeout_seconds = {}", bad),
			);
			assert!(matches!(
				src.parse::<Config>(),
				Err(ConfigError::Validation(_))
			));
		}
	}

	#[test]
	fn test_empty_service_id_rejected() {
		let err = MINIMAL
			.replace("order-processing-service", " ")
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("Service ID"));
	}

	#[test]
	fn test_parse_error_is_reported() {
		assert!(matches!(
			"[service".parse::<Config>(),
			Err(ConfigError::Parse(_))
		));
	}
}
