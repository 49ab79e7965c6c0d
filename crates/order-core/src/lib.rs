//! Order lifecycle service.
//!
//! Ties the order store and the notification sinks together behind the three
//! use-cases exposed by the HTTP API: create, get and update status.

pub mod builder;
pub mod engine;

pub use builder::{BuilderError, OrderFactories, OrderServiceBuilder};
pub use engine::{EngineError, OrderService};
