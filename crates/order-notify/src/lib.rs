//! Best-effort notifications for order lifecycle changes.
//!
//! Sinks implement [`NotificationInterface`] and may fail. The
//! [`NotificationService`] used by the lifecycle fans each call out to every
//! configured sink, bounds it with a timeout and only logs failures, so
//! callers never observe a notification outcome.

use async_trait::async_trait;
use futures::future::join_all;
use order_types::{truncate_id, ImplementationRegistry, OrderEvent, OrderManifest};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod log;
}

/// Errors a notification sink can report.
#[derive(Debug, Error)]
pub enum NotificationError {
	#[error("Publish failed: {0}")]
	Publish(String),
	#[error("Upload failed: {0}")]
	Upload(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A destination for domain events and order manifests.
#[async_trait]
pub trait NotificationInterface: Send + Sync {
	/// Publishes `detail` under `event_type`.
	async fn publish_event(
		&self,
		event_type: &str,
		detail: &serde_json::Value,
	) -> Result<(), NotificationError>;

	/// Uploads the manifest of a newly created order.
	async fn upload_manifest(
		&self,
		order_id: &str,
		content: &serde_json::Value,
	) -> Result<(), NotificationError>;
}

pub type NotificationFactory =
	fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotificationError>;

pub trait NotificationRegistry: ImplementationRegistry<Factory = NotificationFactory> {}

/// Returns `(name, factory)` for every available sink.
pub fn get_all_implementations() -> Vec<(&'static str, NotificationFactory)> {
	use implementations::log;

	vec![(log::Registry::NAME, log::Registry::factory())]
}

/// Fire-and-forget fan-out over the configured sinks.
pub struct NotificationService {
	notifiers: HashMap<String, Box<dyn NotificationInterface>>,
	timeout: Duration,
}

impl NotificationService {
	pub fn new(notifiers: HashMap<String, Box<dyn NotificationInterface>>, timeout: Duration) -> Self {
		Self { notifiers, timeout }
	}

	/// Service without sinks; every call is a no-op.
	pub fn disabled() -> Self {
		Self::new(HashMap::new(), Duration::from_secs(1))
	}

	pub async fn publish_event(&self, event: &OrderEvent) {
		let event_type = event.event_type();
		let detail = event.detail();

		self.fan_out("publish_event", event.order_id(), |notifier| {
			notifier.publish_event(event_type, &detail)
		})
		.await;
	}

	pub async fn upload_manifest(&self, manifest: &OrderManifest) {
		let content = manifest.content();

		self.fan_out("upload_manifest", &manifest.order_id, |notifier| {
			notifier.upload_manifest(&manifest.order_id, &content)
		})
		.await;
	}

	async fn fan_out<'a, F, Fut>(&'a self, action: &str, order_id: &str, call: F)
	where
		F: Fn(&'a dyn NotificationInterface) -> Fut,
		Fut: Future<Output = Result<(), NotificationError>> + Send + 'a,
	{
		let timeout = self.timeout;
		let mut calls = Vec::with_capacity(self.notifiers.len());
		for (name, notifier) in &self.notifiers {
			let call = call(notifier.as_ref());
			calls.push(async move { (name.as_str(), tokio::time::timeout(timeout, call).await) });
		}

		for (name, outcome) in join_all(calls).await {
			match outcome {
				Ok(Ok(())) => {},
				Ok(Err(e)) => tracing::warn!(
					implementation = %name,
					action,
					order_id = %truncate_id(order_id),
					error = %e,
					"Notification failed"
				),
				Err(_) => tracing::warn!(
					implementation = %name,
					action,
					order_id = %truncate_id(order_id),
					timeout_ms = self.timeout.as_millis() as u64,
					"Notification timed out"
				),
			}
		}
	}
}
