//! Startup and shutdown hooks for the order service.

use order_types::OrderId;

use super::{EngineError, OrderService};

impl OrderService {
	/// Probes the store with a lookup of a fresh id.
	///
	/// An unreachable store is reported but does not abort startup; requests
	/// answer `StoreUnavailable` until it recovers.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		tracing::info!("Initializing order service");

		let probe_id = OrderId::generate().to_string();
		match self.call_store("probe", self.store.get_by_id(&probe_id)).await {
			Ok(_) => tracing::info!("Store reachable"),
			Err(_) => tracing::warn!("Store unreachable at startup"),
		}
		Ok(())
	}

	/// Releases the store. Called once the transport has drained.
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down order service");

		self.store
			.shutdown()
			.await
			.map_err(|e| EngineError::Service(e.to_string()))
	}
}
