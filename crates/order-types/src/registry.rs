//! Registry trait for self-registering implementations.

/// Implemented by a marker type in every pluggable implementation module.
///
/// `NAME` is the key used under `implementations` in the configuration file,
/// for example `[storage.implementations.memory]` or
/// `[notification.implementations.log]`.
pub trait ImplementationRegistry {
	const NAME: &'static str;

	/// Factory function type of the component family.
	type Factory;

	fn factory() -> Self::Factory;
}
