//! Order entity and its value types.
//!
//! An [`Order`] is built in memory by the lifecycle service, handed to a store
//! which assigns its [`OrderId`], and from then on addressed only by that id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Store-assigned order identifier.
///
/// Twelve bytes rendered as 24 lowercase hex characters: a 4-byte big-endian
/// unix timestamp, 5 random bytes and a 3-byte process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId([u8; 12]);

/// Counter mixed into every generated id so ids minted in the same second differ.
static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

impl OrderId {
	/// Length of the textual form.
	pub const ENCODED_LEN: usize = 24;

	/// Mints a fresh identifier.
	pub fn generate() -> Self {
		let secs = Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
		let random = uuid::Uuid::new_v4();
		let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

		let mut bytes = [0u8; 12];
		bytes[0..4].copy_from_slice(&secs.to_be_bytes());
		bytes[4..9].copy_from_slice(&random.as_bytes()[0..5]);
		bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
		Self(bytes)
	}

	/// Parses the textual form.
	///
	/// Returns `None` for anything that is not exactly 24 hex characters.
	/// Callers treat such ids as referring to no order at all.
	pub fn parse(value: &str) -> Option<Self> {
		if value.len() != Self::ENCODED_LEN {
			return None;
		}
		let mut bytes = [0u8; 12];
		hex::decode_to_slice(value, &mut bytes).ok()?;
		Some(Self(bytes))
	}
}

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&hex::encode(self.0))
	}
}

impl TryFrom<String> for OrderId {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value).ok_or_else(|| format!("malformed order id: {}", value))
	}
}

impl From<OrderId> for String {
	fn from(id: OrderId) -> Self {
		id.to_string()
	}
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
	/// Stock keeping unit, never empty.
	pub sku: String,
	/// Number of units, always positive.
	pub quantity: i64,
	/// Price per unit, always positive.
	pub unit_price: f64,
}

impl OrderItem {
	pub fn new(sku: impl Into<String>, quantity: i64, unit_price: f64) -> Self {
		Self {
			sku: sku.into(),
			quantity,
			unit_price,
		}
	}
}

/// Lifecycle stage of an order.
///
/// There is no transition graph: any status may replace any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	Pending,
	Paid,
	Shipped,
	Delivered,
	Canceled,
}

impl OrderStatus {
	/// Wire and storage representation.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "PENDING",
			OrderStatus::Paid => "PAID",
			OrderStatus::Shipped => "SHIPPED",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Canceled => "CANCELED",
		}
	}

	/// Returns an iterator over every status.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Paid,
			Self::Shipped,
			Self::Delivered,
			Self::Canceled,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a string names no known status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| UnknownStatus(s.to_string()))
	}
}

/// A customer purchase request and its fulfilment status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Assigned by the store on creation, `None` before that.
	pub id: Option<OrderId>,
	pub customer_id: String,
	pub items: Vec<OrderItem>,
	pub status: OrderStatus,
	pub created_at: DateTime<Utc>,
	/// Refreshed on every status change, never earlier than `created_at`.
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Builds a new, not yet persisted, pending order stamped with `now`.
	pub fn new(customer_id: impl Into<String>, items: Vec<OrderItem>, now: DateTime<Utc>) -> Self {
		Self {
			id: None,
			customer_id: customer_id.into(),
			items,
			status: OrderStatus::Pending,
			created_at: now,
			updated_at: now,
		}
	}
}
