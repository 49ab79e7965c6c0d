//! Order lifecycle use-cases.
//!
//! [`OrderService`] validates input, drives the [`OrderStore`] and hands
//! successful outcomes to the notification service. Every store call is
//! bounded by a timeout, and any storage fault surfaces as
//! [`DomainError::StoreUnavailable`]. Notifications run on a spawned task, so
//! a slow sink never delays the response.

pub mod lifecycle;

use chrono::Utc;
use order_notify::NotificationService;
use order_storage::{OrderStore, StorageError};
use order_types::{
	truncate_id, DomainError, Order, OrderEvent, OrderItem, OrderManifest, OrderStatus,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{instrument, Instrument};

const EMPTY_ORDER: &str = "Order must contain at least one item";
const NOT_FOUND: &str = "Order not found";
const INVALID_STATUS: &str = "Invalid status value";
const STORE_UNAVAILABLE: &str = "Database unavailable";

/// Errors raised by startup and shutdown hooks.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Service error: {0}")]
	Service(String),
}

/// Entry point for creating, reading and updating orders.
///
/// Holds no state besides its handles, so one instance can serve any number
/// of concurrent requests.
pub struct OrderService {
	store: Arc<dyn OrderStore>,
	notifications: Arc<NotificationService>,
	store_timeout: Duration,
}

impl OrderService {
	pub fn new(
		store: Arc<dyn OrderStore>,
		notifications: Arc<NotificationService>,
		store_timeout: Duration,
	) -> Self {
		Self {
			store,
			notifications,
			store_timeout,
		}
	}

	/// Creates a pending order, then uploads its manifest and publishes
	/// `OrderCreated`.
	#[instrument(skip_all, fields(customer_id = %customer_id))]
	pub async fn create_order(
		&self,
		customer_id: &str,
		items: Vec<OrderItem>,
	) -> Result<Order, DomainError> {
		tracing::info!(items = items.len(), "Creating order");
		if items.is_empty() {
			tracing::error!("Attempted to create order without items");
			return Err(DomainError::InvalidInput(EMPTY_ORDER.to_string()));
		}
		validate_order_input(customer_id, &items)?;

		let order = Order::new(customer_id, items, Utc::now());
		let created = self.call_store("create", self.store.create(order)).await?;

		let order_id = created.id.map(|id| id.to_string()).unwrap_or_default();
		tracing::info!(order_id = %truncate_id(&order_id), "Order created");

		let notifications = Arc::clone(&self.notifications);
		let manifest = OrderManifest::from_order(&created);
		let event = OrderEvent::created(&created);
		tokio::spawn(
			async move {
				notifications.upload_manifest(&manifest).await;
				notifications.publish_event(&event).await;
			}
			.in_current_span(),
		);

		Ok(created)
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn get_order(&self, order_id: &str) -> Result<Order, DomainError> {
		tracing::debug!("Fetching order");
		match self.call_store("get_by_id", self.store.get_by_id(order_id)).await? {
			Some(order) => Ok(order),
			None => {
				tracing::warn!("Order not found");
				Err(DomainError::NotFound(NOT_FOUND.to_string()))
			},
		}
	}

	/// Overwrites the status of an order and publishes `OrderStatusChanged`.
	///
	/// Any status may replace any other.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), status = %status))]
	pub async fn update_order_status(
		&self,
		order_id: &str,
		status: &str,
	) -> Result<Order, DomainError> {
		tracing::info!("Updating order status");
		let status: OrderStatus = status.parse().map_err(|_| {
			tracing::error!("Invalid status supplied");
			DomainError::InvalidInput(INVALID_STATUS.to_string())
		})?;

		let updated = self
			.call_store("update_status", self.store.update_status(order_id, status))
			.await?
			.ok_or_else(|| {
				tracing::warn!("Order not found for status update");
				DomainError::NotFound(NOT_FOUND.to_string())
			})?;

		tracing::info!("Order status updated");
		let notifications = Arc::clone(&self.notifications);
		let event = OrderEvent::status_changed(&updated);
		tokio::spawn(
			async move {
				notifications.publish_event(&event).await;
			}
			.in_current_span(),
		);

		Ok(updated)
	}

	/// Awaits a store call under the store timeout.
	async fn call_store<T>(
		&self,
		operation: &'static str,
		call: impl Future<Output = Result<T, StorageError>>,
	) -> Result<T, DomainError> {
		match tokio::time::timeout(self.store_timeout, call).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(e)) => {
				tracing::error!(operation, error = %e, "Store call failed");
				Err(DomainError::StoreUnavailable(STORE_UNAVAILABLE.to_string()))
			},
			Err(_) => {
				tracing::error!(
					operation,
					timeout_ms = self.store_timeout.as_millis() as u64,
					"Store call timed out"
				);
				Err(DomainError::StoreUnavailable(STORE_UNAVAILABLE.to_string()))
			},
		}
	}
}

fn validate_order_input(customer_id: &str, items: &[OrderItem]) -> Result<(), DomainError> {
	if customer_id.trim().is_empty() {
		return Err(DomainError::InvalidInput(
			"customer_id must not be empty".to_string(),
		));
	}

	for item in items {
		if item.sku.trim().is_empty() {
			return Err(DomainError::InvalidInput("sku must not be empty".to_string()));
		}
		if item.quantity <= 0 {
			return Err(DomainError::InvalidInput(
				"quantity must be greater than 0".to_string(),
			));
		}
		if !item.unit_price.is_finite() || item.unit_price <= 0.0 {
			return Err(DomainError::InvalidInput(
				"unit_price must be greater than 0".to_string(),
			));
		}
	}

	Ok(())
}
