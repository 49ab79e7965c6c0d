//! Mapping between [`Order`] and its stored document form.
//!
//! This is the only code that knows the storage layout. Timestamps are kept
//! as epoch milliseconds, so every order leaving a store is truncated to
//! millisecond precision.

use chrono::{DateTime, TimeZone, Utc};
use order_types::{Order, OrderId, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::StorageError;

/// Stored representation of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
	#[serde(rename = "_id")]
	pub id: String,
	pub customer_id: String,
	pub items: Vec<OrderItem>,
	pub status: String,
	/// Epoch milliseconds.
	pub created_at: i64,
	/// Epoch milliseconds.
	pub updated_at: i64,
}

impl OrderDocument {
	/// Overwrites the status and moves `updated_at` forward.
	///
	/// `updated_at` becomes `now`, or one millisecond past its previous value
	/// when the clock has not moved beyond it.
	pub fn apply_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
		self.status = status.as_str().to_string();
		self.updated_at = now.timestamp_millis().max(self.updated_at + 1);
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
		serde_json::to_vec(self).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
		serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}
}

/// Builds the document for `order` under the store-assigned `id`.
pub fn to_document(order: &Order, id: OrderId) -> OrderDocument {
	OrderDocument {
		id: id.to_string(),
		customer_id: order.customer_id.clone(),
		items: order.items.clone(),
		status: order.status.as_str().to_string(),
		created_at: order.created_at.timestamp_millis(),
		updated_at: order.updated_at.timestamp_millis(),
	}
}

/// Rebuilds the domain order from a stored document.
pub fn to_domain(doc: OrderDocument) -> Result<Order, StorageError> {
	let id = OrderId::parse(&doc.id)
		.ok_or_else(|| StorageError::Serialization(format!("invalid stored id '{}'", doc.id)))?;
	let status = doc
		.status
		.parse::<OrderStatus>()
		.map_err(|e| StorageError::Serialization(e.to_string()))?;

	Ok(Order {
		id: Some(id),
		customer_id: doc.customer_id,
		items: doc.items,
		status,
		created_at: from_millis(doc.created_at)?,
		updated_at: from_millis(doc.updated_at)?,
	})
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, StorageError> {
	Utc.timestamp_millis_opt(millis)
		.single()
		.ok_or_else(|| StorageError::Serialization(format!("timestamp out of range: {}", millis)))
}
