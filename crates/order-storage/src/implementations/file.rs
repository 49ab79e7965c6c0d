//! File-based storage backend.
//!
//! Each key is one JSON file under the configured directory. Writes go to a
//! temporary file that is renamed into place, and read-modify-write cycles
//! hold an exclusive advisory lock on `.lock` in the same directory, so
//! several processes may share one directory.

use crate::{StorageError, StorageInterface, UpdateFn};
use async_trait::async_trait;
use fs2::FileExt;
use order_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const DEFAULT_STORAGE_PATH: &str = "./data/orders";
const LOCK_FILE: &str = ".lock";

pub struct FileStorage {
	base_path: PathBuf,
	/// Serializes updates within this process before taking the file lock.
	update_lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			update_lock: Mutex::new(()),
		}
	}

	/// Maps a key to a filesystem-safe path.
	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}
}

fn backend_err(e: std::io::Error) -> StorageError {
	StorageError::Backend(e.to_string())
}

fn write_atomic_blocking(path: &Path, value: &[u8]) -> Result<(), StorageError> {
	let temp_path = path.with_extension("tmp");
	std::fs::write(&temp_path, value).map_err(backend_err)?;
	std::fs::rename(&temp_path, path).map_err(backend_err)
}

fn update_blocking(
	base_path: &Path,
	path: &Path,
	update: UpdateFn,
) -> Result<Vec<u8>, StorageError> {
	std::fs::create_dir_all(base_path).map_err(backend_err)?;
	let lock = std::fs::OpenOptions::new()
		.create(true)
		.truncate(false)
		.write(true)
		.open(base_path.join(LOCK_FILE))
		.map_err(backend_err)?;
	lock.lock_exclusive().map_err(backend_err)?;

	let result = match std::fs::read(path) {
		Ok(current) => {
			update(current).and_then(|next| write_atomic_blocking(path, &next).map(|_| next))
		},
		Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
		Err(e) => Err(backend_err(e)),
	};

	if let Err(e) = FileExt::unlock(&lock) {
		tracing::warn!(error = %e, "Failed to release storage lock");
	}
	result
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		match fs::read(self.file_path(key)).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(backend_err(e)),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.file_path(key);
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(backend_err)?;

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value).await.map_err(backend_err)?;
		fs::rename(&temp_path, &path).await.map_err(backend_err)
	}

	async fn update_bytes(&self, key: &str, update: UpdateFn) -> Result<Vec<u8>, StorageError> {
		let _guard = self.update_lock.lock().await;
		let base_path = self.base_path.clone();
		let path = self.file_path(key);

		tokio::task::spawn_blocking(move || update_blocking(&base_path, &path, update))
			.await
			.map_err(|e| StorageError::Backend(format!("update task failed: {}", e)))?
	}
}

/// Accepts an optional `storage_path` string.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("storage_path", FieldType::String)]).validate(config)
	}
}

/// Creates a file backend.
///
/// Configuration parameters:
/// - `storage_path`: directory holding the documents (default: "./data/orders")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

pub struct Registry;

impl order_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{DocumentStore, OrderStore};
	use chrono::Utc;
	use order_types::{Order, OrderItem, OrderStatus};
	use std::sync::Arc;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_set_and_get() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().join("nested"));

		storage.set_bytes("orders:a", b"{}".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("orders:a").await.unwrap(), b"{}");
		assert!(dir.path().join("nested/orders_a.json").exists());
		assert!(!dir.path().join("nested/orders_a.tmp").exists());
	}

	#[tokio::test]
	async fn test_missing_key() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		assert!(matches!(
			storage.get_bytes("orders:none").await,
			Err(StorageError::NotFound)
		));
		assert!(matches!(
			storage
				.update_bytes("orders:none", Box::new(|_| panic!("must not run")))
				.await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_concurrent_updates_are_serialized() {
		let dir = TempDir::new().unwrap();
		let storage = Arc::new(FileStorage::new(dir.path().to_path_buf()));
		storage.set_bytes("counter", b"0".to_vec()).await.unwrap();

		let tasks: Vec<_> = (0..20)
			.map(|_| {
				let storage = storage.clone();
				tokio::spawn(async move {
					storage
						.update_bytes(
							"counter",
							Box::new(|bytes| {
								let n: u32 = String::from_utf8(bytes).unwrap().parse().unwrap();
								Ok((n + 1).to_string().into_bytes())
							}),
						)
						.await
						.unwrap();
				})
			})
			.collect();
		for task in tasks {
			task.await.unwrap();
		}

		assert_eq!(storage.get_bytes("counter").await.unwrap(), b"20");
	}

	#[tokio::test]
	async fn test_orders_survive_reopen() {
		let dir = TempDir::new().unwrap();
		let mut table = toml::map::Map::new();
		table.insert(
			"storage_path".into(),
			toml::Value::String(dir.path().to_string_lossy().into_owned()),
		);
		let config = toml::Value::Table(table);

		let created = DocumentStore::new(create_storage(&config).unwrap())
			.create(Order::new(
				"cust-1",
				vec![OrderItem::new("SKU-1", 3, 1.5)],
				Utc::now(),
			))
			.await
			.unwrap();
		let id = created.id.unwrap().to_string();

		let reopened = DocumentStore::new(create_storage(&config).unwrap());
		assert_eq!(reopened.get_by_id(&id).await.unwrap(), Some(created));

		let updated = reopened
			.update_status(&id, OrderStatus::Delivered)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Delivered);
	}

	#[test]
	fn test_schema() {
		let mut table = toml::map::Map::new();
		table.insert("storage_path".into(), toml::Value::Integer(1));
		assert!(FileStorageSchema
			.validate(&toml::Value::Table(table))
			.is_err());
	}
}
