//! Construction of an [`OrderService`] from configuration.
//!
//! Implementations are looked up by the names used in the configuration
//! tables. The binary supplies every registered factory; tests can pass
//! their own.

use crate::engine::OrderService;
use order_config::Config;
use order_notify::{NotificationError, NotificationInterface, NotificationService};
use order_storage::{DocumentStore, StorageError, StorageInterface};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions keyed by implementation name.
pub struct OrderFactories<SF, NF> {
	pub storage_factories: HashMap<String, SF>,
	pub notification_factories: HashMap<String, NF>,
}

pub struct OrderServiceBuilder {
	config: Config,
}

impl OrderServiceBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, NF>(self, factories: OrderFactories<SF, NF>) -> Result<OrderService, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		NF: Fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotificationError>,
	{
		let backend = self.build_storage(&factories.storage_factories)?;
		let notifiers = self.build_notifiers(&factories.notification_factories)?;

		let notifications = NotificationService::new(
			notifiers,
			Duration::from_millis(self.config.notification.timeout_ms),
		);

		Ok(OrderService::new(
			Arc::new(DocumentStore::new(backend)),
			Arc::new(notifications),
			Duration::from_secs(self.config.storage.timeout_seconds),
		))
	}

	fn build_storage<SF>(
		&self,
		factories: &HashMap<String, SF>,
	) -> Result<Box<dyn StorageInterface>, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut backends = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let factory = factories.get(name).ok_or_else(|| {
				BuilderError::Config(format!("Unknown storage implementation '{}'", name))
			})?;

			match factory(config) {
				Ok(backend) => {
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					backends.insert(name.clone(), backend);
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		backends
			.remove(&self.config.storage.primary)
			.ok_or_else(|| BuilderError::MissingComponent(format!(
				"primary storage '{}'",
				self.config.storage.primary
			)))
	}

	fn build_notifiers<NF>(
		&self,
		factories: &HashMap<String, NF>,
	) -> Result<HashMap<String, Box<dyn NotificationInterface>>, BuilderError>
	where
		NF: Fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotificationError>,
	{
		let mut notifiers = HashMap::new();
		for (name, config) in &self.config.notification.implementations {
			let factory = factories.get(name).ok_or_else(|| {
				BuilderError::Config(format!("Unknown notification implementation '{}'", name))
			})?;

			let notifier = factory(config).map_err(|e| {
				tracing::error!(
					component = "notification",
					implementation = %name,
					error = %e,
					"Failed to create notifier"
				);
				BuilderError::Config(format!(
					"Failed to create notification implementation '{}': {}",
					name, e
				))
			})?;
			tracing::info!(component = "notification", implementation = %name, "Loaded");
			notifiers.insert(name.clone(), notifier);
		}

		if notifiers.is_empty() {
			tracing::warn!(component = "notification", "No notifiers configured");
		}
		Ok(notifiers)
	}
}
