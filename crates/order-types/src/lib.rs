//! Common types for the order processing service.
//!
//! This crate defines the domain model, the error taxonomy and the wire
//! types shared by every other crate in the workspace. It performs no I/O.

/// API request and response types for the HTTP endpoints.
pub mod api;
/// Domain error taxonomy shared across the service boundary.
pub mod errors;
/// Payloads handed to notification sinks.
pub mod events;
/// Order entity, items, identifiers and status.
pub mod order;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Small helpers shared by several crates.
pub mod utils;
/// Configuration validation types for implementation-specific TOML tables.
pub mod validation;

pub use api::*;
pub use errors::*;
pub use events::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use utils::truncate_id;
pub use validation::*;
