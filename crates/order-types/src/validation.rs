//! Validation of implementation-specific configuration tables.
//!
//! Storage backends and notifiers take a raw `toml::Value` table from the
//! service configuration. Each one publishes a [`ConfigSchema`] describing
//! the keys it understands so typos and wrong types fail at startup instead
//! of being silently ignored.

use thiserror::Error;

/// Errors that can occur while validating a configuration table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Unknown field: {0}")]
	UnknownField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug, Clone)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
	Boolean,
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Boolean => "boolean",
		}
	}
}

/// A named field with its type.
#[derive(Debug, Clone)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// Set of required and optional fields for one configuration table.
///
/// Keys outside both lists are rejected.
#[derive(Debug, Clone, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates `config`, which must be a table.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table",
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_type(&field.name, value, &field.field_type)?;
		}

		for (key, value) in table {
			if self.required.iter().any(|f| &f.name == key) {
				continue;
			}
			let field = self
				.optional
				.iter()
				.find(|f| &f.name == key)
				.ok_or_else(|| ValidationError::UnknownField(key.clone()))?;
			check_type(key, value, &field.field_type)?;
		}

		Ok(())
	}
}

fn check_type(name: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	let mismatch = || ValidationError::TypeMismatch {
		field: name.to_string(),
		expected: expected.name(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String => value.as_str().map(|_| ()).ok_or_else(mismatch),
		FieldType::Boolean => value.as_bool().map(|_| ()).ok_or_else(mismatch),
		FieldType::Integer { min, max } => {
			let n = value.as_integer().ok_or_else(mismatch)?;
			if let Some(min) = min.filter(|min| n < *min) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("{} is less than minimum {}", n, min),
				});
			}
			if let Some(max) = max.filter(|max| n > *max) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("{} is greater than maximum {}", n, max),
				});
			}
			Ok(())
		},
	}
}

/// Implemented by every pluggable component that accepts a configuration table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("path", FieldType::String)],
			vec![Field::new(
				"retries",
				FieldType::Integer {
					min: Some(0),
					max: Some(10),
				},
			)],
		)
	}

	fn table(src: &str) -> toml::Value {
		toml::from_str(src).unwrap()
	}

	#[test]
	fn test_accepts_valid_table() {
		assert!(schema().validate(&table("path = \"/tmp\"\nretries = 3")).is_ok());
		assert!(schema().validate(&table("path = \"/tmp\"")).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		assert_eq!(
			schema().validate(&table("retries = 1")),
			Err(ValidationError::MissingField("path".into()))
		);
	}

	#[test]
	fn test_unknown_field() {
		assert_eq!(
			schema().validate(&table("path = \"/tmp\"\nretires = 1")),
			Err(ValidationError::UnknownField("retires".into()))
		);
	}

	#[test]
	fn test_type_and_bounds() {
		assert!(matches!(
			schema().validate(&table("path = 5")),
			Err(ValidationError::TypeMismatch { .. })
		));
		assert!(matches!(
			schema().validate(&table("path = \"/tmp\"\nretries = 11")),
			Err(ValidationError::InvalidValue { .. })
		));
	}
}
