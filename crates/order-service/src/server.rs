//! HTTP server for the order API.

use axum::{
	extract::DefaultBodyLimit,
	http::{HeaderName, HeaderValue, Method},
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use order_config::{ApiConfig, CorsConfig};
use order_core::OrderService;
use order_types::HealthResponse;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	catch_panic::CatchPanicLayer,
	cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

use crate::apis::{self, error::ApiError};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub orders: Arc<OrderService>,
}

/// Builds the router with all routes and middleware.
pub fn build_router(api_config: &ApiConfig, orders: Arc<OrderService>) -> Router {
	Router::new()
		.route("/orders", post(apis::order::create_order))
		.route(
			"/orders/{id}",
			get(apis::order::get_order).patch(apis::order::update_order_status),
		)
		.route("/health", get(health))
		.layer(
			ServiceBuilder::new()
				.layer(CatchPanicLayer::custom(panic_response))
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(api_config.timeout_seconds)))
				.layer(cors_layer(api_config.cors.as_ref())),
		)
		.layer(DefaultBodyLimit::max(api_config.max_request_size))
		.with_state(AppState { orders })
}

/// Serves the API until `shutdown` resolves, then drains open connections.
pub async fn start_server(
	api_config: ApiConfig,
	orders: Arc<OrderService>,
	shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(&api_config, orders);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;
	tracing::info!(address = %bind_address, "Order API server starting");

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown)
		.await?;

	tracing::info!("Order API server stopped");
	Ok(())
}

/// Handles GET /health. Reports liveness only.
async fn health() -> Json<HealthResponse> {
	Json(HealthResponse::ok())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
	let detail = panic
		.downcast_ref::<String>()
		.cloned()
		.or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
		.unwrap_or_else(|| "handler panicked".to_string());
	ApiError::Internal(detail).into_response()
}

fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	let Some(cors) = cors else {
		return CorsLayer::permissive();
	};

	let origins = if cors.allowed_origins.iter().any(|o| o == "*") {
		AllowOrigin::from(AnyOrigin)
	} else {
		AllowOrigin::list(
			cors.allowed_origins
				.iter()
				.filter_map(|o| HeaderValue::from_str(o).ok()),
		)
	};

	let methods: Vec<Method> = if cors.allowed_methods.is_empty() {
		vec![Method::GET, Method::POST, Method::PATCH]
	} else {
		cors.allowed_methods
			.iter()
			.filter_map(|m| m.parse().ok())
			.collect()
	};

	let headers: Vec<HeaderName> = cors
		.allowed_headers
		.iter()
		.filter_map(|h| h.parse().ok())
		.collect();

	CorsLayer::new()
		.allow_origin(origins)
		.allow_methods(methods)
		.allow_headers(headers)
}
