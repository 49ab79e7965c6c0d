//! Fluent construction of [`Config`] values for tests.

use crate::{ApiConfig, Config, NotificationConfig, ServiceConfig, StorageConfig};
use std::collections::HashMap;

/// Builds a valid configuration backed by in-memory storage and the log notifier.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	storage_timeout_seconds: u64,
	notification_timeout_ms: u64,
	notification_implementations: HashMap<String, toml::Value>,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			service_id: "test-orders".to_string(),
			storage_primary: "memory".to_string(),
			storage_implementations: HashMap::from([("memory".to_string(), empty_table())]),
			storage_timeout_seconds: 5,
			notification_timeout_ms: 2000,
			notification_implementations: HashMap::from([("log".to_string(), empty_table())]),
			api: None,
		}
	}

	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Adds a storage implementation and makes it the primary one.
	pub fn storage(mut self, name: impl Into<String>, table: toml::Value) -> Self {
		let name = name.into();
		self.storage_implementations.insert(name.clone(), table);
		self.storage_primary = name;
		self
	}

	pub fn storage_timeout_seconds(mut self, seconds: u64) -> Self {
		self.storage_timeout_seconds = seconds;
		self
	}

	pub fn notification_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.notification_timeout_ms = timeout_ms;
		self
	}

	/// Replaces the notifier set. An empty map disables notifications.
	pub fn notifiers(mut self, implementations: HashMap<String, toml::Value>) -> Self {
		self.notification_implementations = implementations;
		self
	}

	pub fn api(mut self, api: ApiConfig) -> Self {
		self.api = Some(api);
		self
	}

	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
				environment: "test".to_string(),
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
				timeout_seconds: self.storage_timeout_seconds,
			},
			notification: NotificationConfig {
				timeout_ms: self.notification_timeout_ms,
				implementations: self.notification_implementations,
			},
			api: self.api,
		}
	}
}
