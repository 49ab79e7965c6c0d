//! Entry point for the order processing service.
//!
//! Loads configuration, builds the order service from the registered storage
//! backends and notifiers, and serves the HTTP API until interrupted.

use clap::{Parser, ValueEnum};
use order_config::Config;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
	Json,
	Text,
}

/// Command-line arguments for the order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "CONFIG_PATH", default_value = "config.toml")]
	config: String,

	/// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
	#[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
	log_level: String,

	/// Log output format
	#[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
	log_format: LogFormat,
}

fn init_tracing(log_level: &str, format: LogFormat) {
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
	let builder = fmt().with_env_filter(env_filter).with_target(true);

	match format {
		LogFormat::Json => builder.json().init(),
		LogFormat::Text => builder.with_thread_ids(true).init(),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	init_tracing(&args.log_level, args.log_format);

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		service_id = %config.service.id,
		environment = %config.service.environment,
		"Loaded configuration"
	);

	let api_config = config.api.clone().unwrap_or_default();
	let orders = Arc::new(factory_registry::build_service_from_config(config)?);
	orders.initialize().await?;

	if api_config.enabled {
		server::start_server(api_config, Arc::clone(&orders), shutdown_signal()).await?;
	} else {
		tracing::warn!("API server disabled, waiting for shutdown signal");
		shutdown_signal().await;
	}

	orders.shutdown().await?;
	tracing::info!("Stopped order service");
	Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		use tokio::signal::unix::{signal, SignalKind};
		match signal(SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
	tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_defaults() {
		let args = Args::try_parse_from(["order-service"]).unwrap();
		assert_eq!(args.log_format, LogFormat::Json);
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::try_parse_from([
			"order-service",
			"--config",
			"custom.toml",
			"--log-level",
			"debug",
			"--log-format",
			"text",
		])
		.unwrap();

		assert_eq!(args.config, "custom.toml");
		assert_eq!(args.log_level, "debug");
		assert_eq!(args.log_format, LogFormat::Text);
	}

	#[test]
	fn test_args_reject_unknown_format() {
		assert!(Args::try_parse_from(["order-service", "--log-format", "xml"]).is_err());
	}
}
