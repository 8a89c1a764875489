// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Sweep client.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SWEEP_*`)
//! - XDG-compliant path resolution for the offline queue database
//!
//! # Usage
//!
//! ```ignore
//! use sweep_client_config::load_config;
//!
//! let config = load_config()?;
//! println!("API at {}", config.server.base_url);
//! ```

pub mod error;
pub mod layer;
pub mod paths;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::SweepConfigLayer;
pub use paths::{resolve_xdg_paths, PathsConfig};
pub use sections::{DatabaseConfig, DrainConfig, LiveConfig, LoggingConfig, ServerConfig};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::debug;

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
	pub server: ServerConfig,
	pub database: DatabaseConfig,
	pub live: LiveConfig,
	pub drain: DrainConfig,
	pub logging: LoggingConfig,
	pub paths: PathsConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SWEEP_*`)
/// 2. Config file (`~/.config/sweep/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<SweepConfig, ConfigError> {
	let paths = resolve_xdg_paths()?;
	let file = paths.user_config_file.clone();
	load_with_sources(
		paths,
		vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file)),
			Box::new(EnvSource),
		],
	)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<SweepConfig, ConfigError> {
	let paths = resolve_xdg_paths()?;
	load_with_sources(
		paths,
		vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(config_path)),
			Box::new(EnvSource),
		],
	)
}

fn load_with_sources(
	paths: PathsConfig,
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<SweepConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = SweepConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(finalize(merged, paths))
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: SweepConfigLayer, paths: PathsConfig) -> SweepConfig {
	SweepConfig {
		server: layer.server.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(&paths),
		live: layer.live.unwrap_or_default().finalize(),
		drain: layer.drain.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		paths,
	}
}
