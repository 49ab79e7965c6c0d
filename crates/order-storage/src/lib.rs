//! Persistence for orders.
//!
//! Two layers:
//! - [`StorageInterface`]: a byte-oriented key/value backend (memory, file).
//! - [`OrderStore`]: the port the lifecycle service depends on, implemented
//!   by [`DocumentStore`] on top of any backend.

use async_trait::async_trait;
use chrono::Utc;
use order_types::{truncate_id, ImplementationRegistry, Order, OrderId, OrderStatus};
use thiserror::Error;

pub mod document;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

use document::{to_document, to_domain, OrderDocument};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Read-modify-write step passed to [`StorageInterface::update_bytes`].
pub type UpdateFn = Box<dyn FnOnce(Vec<u8>) -> Result<Vec<u8>, StorageError> + Send>;

/// Low-level key/value backend.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Returns the value for `key`, or [`StorageError::NotFound`].
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Replaces the value for an existing `key` with `update(current)` and
	/// returns the new value.
	///
	/// No other writer may touch `key` between the read and the write.
	/// Missing keys yield [`StorageError::NotFound`] without calling `update`.
	async fn update_bytes(&self, key: &str, update: UpdateFn) -> Result<Vec<u8>, StorageError>;

	/// Releases backend resources.
	async fn shutdown(&self) -> Result<(), StorageError> {
		Ok(())
	}
}

/// Factory signature every storage backend exposes.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Returns `(name, factory)` for every available backend.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Persistence port of the order lifecycle.
///
/// Absence is `Ok(None)`. `Err` always means the medium itself failed.
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Persists a new order under a freshly generated id and returns the
	/// stored copy.
	async fn create(&self, order: Order) -> Result<Order, StorageError>;

	/// Looks an order up. Malformed ids are reported as absent.
	async fn get_by_id(&self, id: &str) -> Result<Option<Order>, StorageError>;

	/// Overwrites the status and refreshes `updated_at` atomically.
	/// Malformed ids are reported as absent.
	async fn update_status(
		&self,
		id: &str,
		status: OrderStatus,
	) -> Result<Option<Order>, StorageError>;

	async fn shutdown(&self) -> Result<(), StorageError> {
		Ok(())
	}
}

/// [`OrderStore`] that keeps one JSON document per order in a backend.
pub struct DocumentStore {
	backend: Box<dyn StorageInterface>,
}

impl DocumentStore {
	const NAMESPACE: &'static str = "orders";

	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(id: &OrderId) -> String {
		format!("{}:{}", Self::NAMESPACE, id)
	}
}

#[async_trait]
impl OrderStore for DocumentStore {
	async fn create(&self, order: Order) -> Result<Order, StorageError> {
		let id = OrderId::generate();
		let doc = to_document(&order, id);
		self.backend.set_bytes(&Self::key(&id), doc.to_bytes()?).await?;

		tracing::debug!(order_id = %truncate_id(&id.to_string()), "Stored order document");
		to_domain(doc)
	}

	async fn get_by_id(&self, id: &str) -> Result<Option<Order>, StorageError> {
		let Some(id) = OrderId::parse(id) else {
			tracing::warn!(order_id = %truncate_id(id), "Malformed order id");
			return Ok(None);
		};

		match self.backend.get_bytes(&Self::key(&id)).await {
			Ok(bytes) => to_domain(OrderDocument::from_bytes(&bytes)?).map(Some),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	async fn update_status(
		&self,
		id: &str,
		status: OrderStatus,
	) -> Result<Option<Order>, StorageError> {
		let Some(id) = OrderId::parse(id) else {
			tracing::warn!(order_id = %truncate_id(id), "Malformed order id");
			return Ok(None);
		};

		let now = Utc::now();
		let update: UpdateFn = Box::new(move |bytes| {
			let mut doc = OrderDocument::from_bytes(&bytes)?;
			doc.apply_status(status, now);
			doc.to_bytes()
		});

		match self.backend.update_bytes(&Self::key(&id), update).await {
			Ok(bytes) => to_domain(OrderDocument::from_bytes(&bytes)?).map(Some),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	async fn shutdown(&self) -> Result<(), StorageError> {
		self.backend.shutdown().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use order_types::OrderItem;

	fn store() -> DocumentStore {
		DocumentStore::new(Box::new(MemoryStorage::new()))
	}

	fn new_order() -> Order {
		Order::new("cust-1", vec![OrderItem::new("SKU-1", 1, 10.0)], Utc::now())
	}

	/// Backend whose every call fails as if the server were unreachable.
	struct UnreachableStorage;

	#[async_trait]
	impl StorageInterface for UnreachableStorage {
		async fn get_bytes(&self, _key: &str) -> Result<Vec<u8>, StorageError> {
			Err(StorageError::Backend("connection refused".into()))
		}

		async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
			Err(StorageError::Backend("connection refused".into()))
		}

		async fn update_bytes(&self, _key: &str, _update: UpdateFn) -> Result<Vec<u8>, StorageError> {
			Err(StorageError::Backend("connection refused".into()))
		}
	}

	#[tokio::test]
	async fn test_create_assigns_id_and_round_trips() {
		let store = store();
		let created = store.create(new_order()).await.unwrap();

		let id = created.id.expect("id assigned");
		assert_eq!(id.to_string().len(), OrderId::ENCODED_LEN);
		assert_eq!(created.status, OrderStatus::Pending);
		assert_eq!(created.created_at, created.updated_at);

		let fetched = store.get_by_id(&id.to_string()).await.unwrap();
		assert_eq!(fetched, Some(created));
	}

	#[tokio::test]
	async fn test_ids_are_unique() {
		let store = store();
		let a = store.create(new_order()).await.unwrap();
		let b = store.create(new_order()).await.unwrap();
		assert_ne!(a.id, b.id);
	}

	#[tokio::test]
	async fn test_missing_and_malformed_ids_are_absent() {
		let store = store();
		assert_eq!(store.get_by_id("not-an-id").await.unwrap(), None);
		assert_eq!(store.get_by_id("000000000000000000000000").await.unwrap(), None);
		assert_eq!(
			store
				.update_status("not-an-id", OrderStatus::Paid)
				.await
				.unwrap(),
			None
		);
		assert_eq!(
			store
				.update_status("000000000000000000000000", OrderStatus::Paid)
				.await
				.unwrap(),
			None
		);
	}

	#[tokio::test]
	async fn test_update_status_refreshes_updated_at() {
		let store = store();
		let created = store.create(new_order()).await.unwrap();
		let id = created.id.unwrap().to_string();

		let updated = store
			.update_status(&id, OrderStatus::Paid)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Paid);
		assert!(updated.updated_at > created.updated_at);
		assert_eq!(updated.created_at, created.created_at);

		let again = store
			.update_status(&id, OrderStatus::Paid)
			.await
			.unwrap()
			.unwrap();
		assert!(again.updated_at > updated.updated_at);
		assert_eq!(store.get_by_id(&id).await.unwrap(), Some(again));
	}

	#[tokio::test]
	async fn test_backend_failures_are_errors() {
		let store = DocumentStore::new(Box::new(UnreachableStorage));
		assert!(matches!(
			store.create(new_order()).await,
			Err(StorageError::Backend(_))
		));
		assert!(matches!(
			store.get_by_id("000000000000000000000000").await,
			Err(StorageError::Backend(_))
		));
		assert!(matches!(
			store
				.update_status("000000000000000000000000", OrderStatus::Paid)
				.await,
			Err(StorageError::Backend(_))
		));
		// Malformed ids never reach the backend.
		assert!(matches!(store.get_by_id("nope").await, Ok(None)));
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations().into_iter().map(|(n, _)| n).collect();
		assert_eq!(names, vec!["file", "memory"]);
	}
}
