//! Registry of every storage backend and notifier compiled into the binary.
//!
//! The configuration names implementations by key; this module resolves
//! those keys to factories and hands them to the [`OrderServiceBuilder`].

use order_config::Config;
use order_core::{OrderFactories, OrderService, OrderServiceBuilder};
use order_notify::NotificationFactory;
use order_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub notification: HashMap<String, NotificationFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			notification: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_notification(&mut self, name: impl Into<String>, factory: NotificationFactory) {
		self.notification.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in order_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in order_notify::get_all_implementations() {
			tracing::debug!("Registering notification implementation: {}", name);
			registry.register_notification(name, factory);
		}

		registry
	})
}

/// Picks the factories named in `$config_impls` out of a registry field.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the order service from configuration using the global registry.
pub fn build_service_from_config(config: Config) -> Result<OrderService, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let notification_factories = build_factories!(
		registry,
		config.notification.implementations,
		notification,
		"notification"
	);

	let factories = OrderFactories {
		storage_factories,
		notification_factories,
	};

	Ok(OrderServiceBuilder::new(config).build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_config::builders::ConfigBuilder;

	#[test]
	fn test_registry_contains_all_implementations() {
		let registry = get_registry();
		assert!(registry.storage.contains_key("memory"));
		assert!(registry.storage.contains_key("file"));
		assert!(registry.notification.contains_key("log"));
	}

	#[tokio::test]
	async fn test_build_from_default_config() {
		let service = build_service_from_config(ConfigBuilder::new().build()).unwrap();
		assert!(service.get_order("nope").await.is_err());
	}

	#[test]
	fn test_unknown_implementation_lists_available() {
		let config = ConfigBuilder::new()
			.storage("redis", toml::Value::Table(Default::default()))
			.build();
		let err = build_service_from_config(config).err().unwrap();
		assert_eq!(
			err.to_string(),
			"Unknown storage implementation 'redis'. Available: [file, memory]"
		);
	}

	#[tokio::test]
	async fn test_build_from_file_config() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			format!(
				r#"
[service]
id = "orders-file-test"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "{}"

[notification]
[notification.implementations.log]
bucket = "test-bucket"
"#,
				dir.path().join("orders").display()
			),
		)
		.unwrap();

		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		let service = build_service_from_config(config).unwrap();
		let created = service
			.create_order("cust-1", vec![order_types::OrderItem::new("SKU", 1, 3.0)])
			.await
			.unwrap();
		assert!(dir.path().join("orders").exists());
		assert_eq!(created.status, order_types::OrderStatus::Pending);
	}
}
