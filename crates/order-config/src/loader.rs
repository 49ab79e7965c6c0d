//! Loading of configuration split across several files.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a root configuration file together with the files it includes.
pub struct ConfigLoader {
	base_path: PathBuf,
	/// Canonical paths already read, used to detect include cycles.
	loaded_files: HashSet<PathBuf>,
	/// File each top-level section came from.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads `config_path` relative to the base path, merges its includes
	/// and validates the result.
	pub async fn load_config(&mut self, config_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;
		let main_content = self.load_file(&config_path).await?;
		let main_toml: toml::Value = toml::from_str(&main_content)?;

		let includes = extract_includes(&main_toml)?;
		let merged = if includes.is_empty() {
			main_toml
		} else {
			self.combine(main_toml, includes, config_path).await?
		};

		// Already env-resolved; resolving again would expand substituted values.
		let config = toml::Value::try_into::<Config>(merged)?;
		config.validate()?;
		Ok(config)
	}

	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	async fn combine(
		&mut self,
		mut main_toml: toml::Value,
		includes: Vec<PathBuf>,
		main_path: PathBuf,
	) -> Result<toml::Value, ConfigError> {
		let main_table = main_toml
			.as_table_mut()
			.ok_or_else(|| ConfigError::Validation("Configuration root must be a table".into()))?;
		main_table.remove("include");
		for key in main_table.keys() {
			self.section_sources.insert(key.clone(), main_path.clone());
		}

		for include in includes {
			let path = self.resolve_path(&include)?;
			let content = self.load_file(&path).await?;
			let included: toml::Value = toml::from_str(&content)?;

			let Some(included) = included.as_table() else {
				continue;
			};
			if included.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested includes are not supported ({})",
					path.display()
				)));
			}

			for (key, value) in included {
				if let Some(existing) = self.section_sources.get(key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						existing.display(),
						path.display()
					)));
				}
				self.section_sources.insert(key.clone(), path.clone());
				main_table.insert(key.clone(), value.clone());
			}
		}

		Ok(main_toml)
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

fn extract_includes(toml: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match toml.get("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const SERVICE: &str = "[service]\nid = \"orders\"\n";
	const STORAGE: &str = "[storage]\nprimary = \"memory\"\n[storage.implementations.memory]\n";
	const NOTIFICATION: &str = "[notification]\n[notification.implementations.log]\n";

	#[tokio::test]
	async fn test_single_file_config() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("config.toml"),
			format!("{}{}{}", SERVICE, STORAGE, NOTIFICATION),
		)
		.unwrap();

		let config = ConfigLoader::new(dir.path())
			.load_config("config.toml")
			.await
			.unwrap();
		assert_eq!(config.service.id, "orders");
	}

	#[tokio::test]
	async fn test_includes_are_merged() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("config.toml"),
			format!("include = [\"storage.toml\", \"notification.toml\"]\n{}", SERVICE),
		)
		.unwrap();
		fs::write(dir.path().join("storage.toml"), STORAGE).unwrap();
		fs::write(dir.path().join("notification.toml"), NOTIFICATION).unwrap();

		let config = Config::from_file(dir.path().join("config.toml").to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.storage.primary, "memory");
		assert!(config.notification.implementations.contains_key("log"));
	}

	#[tokio::test]
	async fn test_duplicate_section_rejected() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("config.toml"),
			format!("include = \"more.toml\"\n{}{}{}", SERVICE, STORAGE, NOTIFICATION),
		)
		.unwrap();
		fs::write(dir.path().join("more.toml"), STORAGE).unwrap();

		let err = ConfigLoader::new(dir.path())
			.load_config("config.toml")
			.await
			.unwrap_err();
		assert!(err.to_string().contains("Duplicate section 'storage'"));
	}

	#[tokio::test]
	async fn test_self_include_is_circular() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("config.toml"),
			format!("include = [\"config.toml\"]\n{}{}{}", SERVICE, STORAGE, NOTIFICATION),
		)
		.unwrap();

		let err = ConfigLoader::new(dir.path())
			.load_config("config.toml")
			.await
			.unwrap_err();
		assert!(err.to_string().contains("Circular include"));
	}

	#[tokio::test]
	async fn test_env_values_are_substituted_once() {
		std::env::set_var("ORDER_LOADER_BUCKET", "literal-${ORDER_LOADER_UNSET}");
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("config.toml"),
			format!(
				"{}{}[notification]\n[notification.implementations.log]\nbucket = \"${{ORDER_LOADER_BUCKET}}\"\n",
				SERVICE, STORAGE
			),
		)
		.unwrap();

		let config = ConfigLoader::new(dir.path())
			.load_config("config.toml")
			.await
			.unwrap();
		std::env::remove_var("ORDER_LOADER_BUCKET");

		assert_eq!(
			config.notification.implementations["log"]["bucket"].as_str(),
			Some("literal-${ORDER_LOADER_UNSET}")
		);
	}

	#[tokio::test]
	async fn test_missing_file() {
		let dir = TempDir::new().unwrap();
		let result = ConfigLoader::new(dir.path()).load_config("absent.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}
