//! Handlers for the `/orders` endpoints.
//!
//! Bodies are taken as `Result<Json<_>, JsonRejection>` so malformed JSON is
//! reported in the same `{"error": ...}` shape as every other failure.

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	response::Json,
};
use order_types::{truncate_id, CreateOrderRequest, OrderItem, OrderResponse, UpdateOrderStatusRequest};
use validator::Validate;

use crate::apis::error::ApiError;
use crate::server::AppState;

/// Handles POST /orders.
pub async fn create_order(
	State(state): State<AppState>,
	payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
	let Json(request) = payload?;
	request.validate()?;

	let items: Vec<OrderItem> = request.items.into_iter().map(OrderItem::from).collect();
	let order = state
		.orders
		.create_order(&request.customer_id, items)
		.await?;

	Ok((StatusCode::CREATED, Json(order.into())))
}

/// Handles GET /orders/{id}.
pub async fn get_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
	let order = state.orders.get_order(&id).await?;
	Ok(Json(order.into()))
}

/// Handles PATCH /orders/{id}.
pub async fn update_order_status(
	State(state): State<AppState>,
	Path(id): Path<String>,
	payload: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
	let Json(request) = payload?;
	tracing::debug!(order_id = %truncate_id(&id), status = %request.status, "Status update requested");

	let order = state
		.orders
		.update_order_status(&id, &request.status)
		.await?;
	Ok(Json(order.into()))
}
