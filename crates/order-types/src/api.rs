//! API types for the order HTTP endpoints.
//!
//! Request bodies derive [`Validate`] so the transport can reject malformed
//! values before they reach the lifecycle service. An empty `items` list is
//! rejected by the service itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Order, OrderItem, OrderStatus};

/// One line of a `POST /orders` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
	#[validate(length(min = 1, message = "sku must not be empty"))]
	pub sku: String,
	#[validate(range(min = 1, message = "quantity must be greater than 0"))]
	pub quantity: i64,
	#[validate(range(exclusive_min = 0.0, message = "unit_price must be greater than 0"))]
	pub unit_price: f64,
}

impl From<OrderItemRequest> for OrderItem {
	fn from(item: OrderItemRequest) -> Self {
		OrderItem::new(item.sku, item.quantity, item.unit_price)
	}
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
	#[validate(length(min = 1, message = "customer_id must not be empty"))]
	pub customer_id: String,
	#[validate(nested)]
	pub items: Vec<OrderItemRequest>,
}

/// Body of `PATCH /orders/{id}`.
///
/// The status stays a raw string here; parsing it against the closed set is
/// part of the use-case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
	pub status: String,
}

/// Order representation returned by every order endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
	pub id: String,
	pub customer_id: String,
	pub items: Vec<OrderItem>,
	pub status: OrderStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
	fn from(order: Order) -> Self {
		Self {
			id: order.id.map(|id| id.to_string()).unwrap_or_default(),
			customer_id: order.customer_id,
			items: order.items,
			status: order.status,
			created_at: order.created_at,
			updated_at: order.updated_at,
		}
	}
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>) -> Self {
		Self {
			error: error.into(),
		}
	}
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: String,
}

impl HealthResponse {
	pub fn ok() -> Self {
		Self {
			status: "ok".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::OrderId;

	fn item(sku: &str, quantity: i64, unit_price: f64) -> OrderItemRequest {
		OrderItemRequest {
			sku: sku.to_string(),
			quantity,
			unit_price,
		}
	}

	#[test]
	fn test_valid_request_passes() {
		let request = CreateOrderRequest {
			customer_id: "cust-1".into(),
			items: vec![item("SKU-1", 1, 10.0)],
		};
		assert!(request.validate().is_ok());
	}

	#[test]
	fn test_empty_items_pass_structural_validation() {
		let request = CreateOrderRequest {
			customer_id: "cust-1".into(),
			items: vec![],
		};
		assert!(request.validate().is_ok());
	}

	#[test]
	fn test_bad_item_values_are_rejected() {
		for bad in [item("", 1, 1.0), item("SKU", 0, 1.0), item("SKU", 1, 0.0), item("SKU", -3, 1.0)] {
			let request = CreateOrderRequest {
				customer_id: "cust-1".into(),
				items: vec![bad],
			};
			assert!(request.validate().is_err());
		}
	}

	#[test]
	fn test_empty_customer_is_rejected() {
		let request = CreateOrderRequest {
			customer_id: String::new(),
			items: vec![item("SKU-1", 1, 1.0)],
		};
		let errors = request.validate().unwrap_err();
		assert!(errors.to_string().contains("customer_id"));
	}

	#[test]
	fn test_order_response_shape() {
		let mut order = Order::new("cust-1", vec![OrderItem::new("SKU-1", 2, 5.5)], Utc::now());
		order.id = OrderId::parse("64b7f0c2a1b2c3d4e5f6a7b8");

		let json = serde_json::to_value(OrderResponse::from(order)).unwrap();
		assert_eq!(json["id"], "64b7f0c2a1b2c3d4e5f6a7b8");
		assert_eq!(json["status"], "PENDING");
		assert_eq!(json["items"][0]["sku"], "SKU-1");
		assert_eq!(json["items"][0]["quantity"], 2);
		assert!(json["created_at"].is_string());
	}
}
