//! Notification sink that logs simulated cloud calls.
//!
//! Events are shaped like an EventBridge `PutEvents` entry and manifests like
//! an S3 `PutObject` request. Nothing leaves the process.

use crate::{NotificationError, NotificationInterface};
use async_trait::async_trait;
use chrono::Utc;
use order_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use serde_json::{json, Value};

const DEFAULT_BUCKET: &str = "orders-manifest";
const DEFAULT_EVENT_BUS: &str = "default";
const DEFAULT_SOURCE: &str = "order-processing-service";

pub struct LogNotifier {
	bucket: String,
	event_bus: String,
	source: String,
}

impl LogNotifier {
	pub fn new(
		bucket: impl Into<String>,
		event_bus: impl Into<String>,
		source: impl Into<String>,
	) -> Self {
		Self {
			bucket: bucket.into(),
			event_bus: event_bus.into(),
			source: source.into(),
		}
	}

	fn event_payload(&self, event_type: &str, detail: &Value) -> Value {
		json!({
			"detail-type": event_type,
			"detail": detail,
			"time": Utc::now().to_rfc3339(),
			"source": self.source,
			"event-bus-name": self.event_bus,
		})
	}

	fn manifest_payload(&self, order_id: &str, content: &Value) -> Value {
		json!({
			"bucket": self.bucket,
			"key": format!("{}.json", order_id),
			"body": content,
		})
	}
}

impl Default for LogNotifier {
	fn default() -> Self {
		Self::new(DEFAULT_BUCKET, DEFAULT_EVENT_BUS, DEFAULT_SOURCE)
	}
}

#[async_trait]
impl NotificationInterface for LogNotifier {
	async fn publish_event(&self, event_type: &str, detail: &Value) -> Result<(), NotificationError> {
		let payload = self.event_payload(event_type, detail);
		tracing::info!(
			service = "eventbridge",
			action = "put_events",
			payload = %payload,
			"Simulated cloud call"
		);
		Ok(())
	}

	async fn upload_manifest(&self, order_id: &str, content: &Value) -> Result<(), NotificationError> {
		let payload = self.manifest_payload(order_id, content);
		tracing::info!(
			service = "s3",
			action = "put_object",
			payload = %payload,
			"Simulated cloud call"
		);
		Ok(())
	}
}

pub struct LogNotifierSchema;

impl ConfigSchema for LogNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("bucket", FieldType::String),
				Field::new("event_bus", FieldType::String),
				Field::new("source", FieldType::String),
			],
		);
		schema.validate(config)
	}
}

/// Creates a log notifier.
///
/// Configuration parameters:
/// - `bucket`: manifest bucket name (default: "orders-manifest")
/// - `event_bus`: event bus name (default: "default")
/// - `source`: event source (default: "order-processing-service")
pub fn create_notifier(
	config: &toml::Value,
) -> Result<Box<dyn NotificationInterface>, NotificationError> {
	LogNotifierSchema
		.validate(config)
		.map_err(|e| NotificationError::Configuration(e.to_string()))?;

	let get = |key: &str, default: &str| {
		config
			.get(key)
			.and_then(|v| v.as_str())
			.unwrap_or(default)
			.to_string()
	};

	Ok(Box::new(LogNotifier::new(
		get("bucket", DEFAULT_BUCKET),
		get("event_bus", DEFAULT_EVENT_BUS),
		get("source", DEFAULT_SOURCE),
	)))
}

pub struct Registry;

impl order_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = crate::NotificationFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl crate::NotificationRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_payload_shape() {
		let payload = LogNotifier::default()
			.event_payload("OrderCreated", &json!({ "orderId": "abc", "status": "PENDING" }));

		assert_eq!(payload["detail-type"], "OrderCreated");
		assert_eq!(payload["detail"]["orderId"], "abc");
		assert_eq!(payload["source"], "order-processing-service");
		assert_eq!(payload["event-bus-name"], "default");
		assert!(payload["time"].is_string());
	}

	#[test]
	fn test_manifest_payload_shape() {
		let notifier = LogNotifier::new("archive", "bus", "src");
		let payload = notifier.manifest_payload("abc", &json!({ "order_id": "abc" }));

		assert_eq!(
			payload,
			json!({ "bucket": "archive", "key": "abc.json", "body": { "order_id": "abc" } })
		);
	}

	#[tokio::test]
	async fn test_calls_succeed() {
		let notifier = LogNotifier::default();
		assert!(notifier.publish_event("OrderCreated", &json!({})).await.is_ok());
		assert!(notifier.upload_manifest("abc", &json!({})).await.is_ok());
	}

	#[test]
	fn test_factory_validates_config() {
		let config: toml::Value = toml::from_str("bucket = \"b\"").unwrap();
		assert!(create_notifier(&config).is_ok());

		let config: toml::Value = toml::from_str("region = \"eu\"").unwrap();
		assert!(matches!(
			create_notifier(&config),
			Err(NotificationError::Configuration(_))
		));
	}
}
