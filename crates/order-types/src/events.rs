//! Payloads handed to notification sinks.
//!
//! Sinks receive an event type plus a JSON detail mapping, or an order id
//! plus a manifest mapping. These types build those mappings from an
//! [`Order`] so the shape is defined once.

use serde::{Deserialize, Serialize};

use crate::{Order, OrderItem, OrderStatus};

/// Domain events published after a successful use-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderEvent {
	/// A new order was persisted.
	Created {
		#[serde(rename = "orderId")]
		order_id: String,
		#[serde(rename = "customerId")]
		customer_id: String,
		status: OrderStatus,
	},
	/// An order's status was overwritten.
	StatusChanged {
		#[serde(rename = "orderId")]
		order_id: String,
		status: OrderStatus,
	},
}

impl OrderEvent {
	pub fn created(order: &Order) -> Self {
		OrderEvent::Created {
			order_id: order_id_of(order),
			customer_id: order.customer_id.clone(),
			status: order.status,
		}
	}

	pub fn status_changed(order: &Order) -> Self {
		OrderEvent::StatusChanged {
			order_id: order_id_of(order),
			status: order.status,
		}
	}

	/// Name under which the event is published.
	pub fn event_type(&self) -> &'static str {
		match self {
			OrderEvent::Created { .. } => "OrderCreated",
			OrderEvent::StatusChanged { .. } => "OrderStatusChanged",
		}
	}

	pub fn order_id(&self) -> &str {
		match self {
			OrderEvent::Created { order_id, .. } | OrderEvent::StatusChanged { order_id, .. } => {
				order_id
			}
		}
	}

	/// Detail mapping sent alongside the event type.
	pub fn detail(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
	}
}

/// Snapshot of an order uploaded as a manifest after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderManifest {
	pub order_id: String,
	pub customer_id: String,
	pub items: Vec<OrderItem>,
}

impl OrderManifest {
	pub fn from_order(order: &Order) -> Self {
		Self {
			order_id: order_id_of(order),
			customer_id: order.customer_id.clone(),
			items: order.items.clone(),
		}
	}

	pub fn content(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
	}
}

fn order_id_of(order: &Order) -> String {
	order
		.id
		.map(|id| id.to_string())
		.unwrap_or_else(|| "unknown".to_string())
}
