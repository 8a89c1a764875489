// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::SweepConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, DrainConfigLayer, LiveConfigLayer, LoggingConfigLayer, ServerConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<SweepConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<SweepConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(SweepConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<SweepConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(SweepConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: SweepConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: SWEEP_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<SweepConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(SweepConfigLayer {
			server: Some(ServerConfigLayer {
				base_url: env_var("SWEEP_SERVER_BASE_URL"),
				request_timeout_secs: env_u64("SWEEP_SERVER_REQUEST_TIMEOUT_SECS")?,
			}),
			database: Some(DatabaseConfigLayer {
				url: env_var("SWEEP_DATABASE_URL"),
			}),
			live: Some(LiveConfigLayer {
				connect_timeout_secs: env_u64("SWEEP_LIVE_CONNECT_TIMEOUT_SECS")?,
				initial_reconnect_delay_ms: env_u64("SWEEP_LIVE_INITIAL_RECONNECT_DELAY_MS")?,
				max_reconnect_delay_ms: env_u64("SWEEP_LIVE_MAX_RECONNECT_DELAY_MS")?,
			}),
			drain: Some(DrainConfigLayer {
				item_delay_ms: env_u64("SWEEP_DRAIN_ITEM_DELAY_MS")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("SWEEP_LOGGING_LEVEL"),
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("expected an integer, got '{v}'"),
		}),
		None => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_missing_toml_file_yields_empty_layer() {
		let source = TomlSource::new("/nonexistent/sweep/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.server.is_none());
		assert!(layer.database.is_none());
	}

	#[test]
	fn test_toml_file_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[server]\nbase_url = \"https://staging.sweephq.com\"\n\n[drain]\nitem_delay_ms = 250"
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.server.unwrap().base_url.as_deref(),
			Some("https://staging.sweephq.com")
		);
		assert_eq!(layer.drain.unwrap().item_delay_ms, Some(250));
	}

	#[test]
	fn test_invalid_toml_is_an_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[server\nbase_url = oops").unwrap();

		let result = TomlSource::new(file.path()).load();
		assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}
}
