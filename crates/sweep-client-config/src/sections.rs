// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections: runtime structs and their mergeable layers.

use serde::Deserialize;

use crate::paths::PathsConfig;

const DEFAULT_BASE_URL: &str = "https://app.sweephq.com";

/// Remote server configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct ServerConfig {
	/// Base URL for the HTTP API, e.g. `https://app.sweephq.com`.
	pub base_url: String,
	/// Per-request timeout for API calls, in seconds.
	pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
	fn default() -> Self {
		ServerConfigLayer::default().finalize()
	}
}

/// Remote server configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> ServerConfig {
		ServerConfig {
			base_url: self
				.base_url
				.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
			request_timeout_secs: self.request_timeout_secs.unwrap_or(30),
		}
	}
}

/// Queue database configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// SQLite connection string, e.g. `sqlite:/home/x/.local/share/sweep/offline_queue.db`.
	pub url: String,
}

/// Queue database configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self, paths: &PathsConfig) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| {
				format!("sqlite:{}", paths.queue_database_file().display())
			}),
		}
	}
}

/// Live channel configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct LiveConfig {
	/// Bound on a single connection attempt, in seconds.
	pub connect_timeout_secs: u64,
	/// First reconnect delay, in milliseconds.
	pub initial_reconnect_delay_ms: u64,
	/// Reconnect delay ceiling, in milliseconds.
	pub max_reconnect_delay_ms: u64,
}

impl Default for LiveConfig {
	fn default() -> Self {
		LiveConfigLayer::default().finalize()
	}
}

/// Live channel configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveConfigLayer {
	#[serde(default)]
	pub connect_timeout_secs: Option<u64>,
	#[serde(default)]
	pub initial_reconnect_delay_ms: Option<u64>,
	#[serde(default)]
	pub max_reconnect_delay_ms: Option<u64>,
}

impl LiveConfigLayer {
	pub fn merge(&mut self, other: LiveConfigLayer) {
		if other.connect_timeout_secs.is_some() {
			self.connect_timeout_secs = other.connect_timeout_secs;
		}
		if other.initial_reconnect_delay_ms.is_some() {
			self.initial_reconnect_delay_ms = other.initial_reconnect_delay_ms;
		}
		if other.max_reconnect_delay_ms.is_some() {
			self.max_reconnect_delay_ms = other.max_reconnect_delay_ms;
		}
	}

	pub fn finalize(self) -> LiveConfig {
		LiveConfig {
			connect_timeout_secs: self.connect_timeout_secs.unwrap_or(10),
			initial_reconnect_delay_ms: self.initial_reconnect_delay_ms.unwrap_or(1_000),
			max_reconnect_delay_ms: self.max_reconnect_delay_ms.unwrap_or(30_000),
		}
	}
}

/// Queue drain configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct DrainConfig {
	/// Pause between replayed items, in milliseconds.
	pub item_delay_ms: u64,
}

impl Default for DrainConfig {
	fn default() -> Self {
		DrainConfigLayer::default().finalize()
	}
}

/// Queue drain configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrainConfigLayer {
	#[serde(default)]
	pub item_delay_ms: Option<u64>,
}

impl DrainConfigLayer {
	pub fn merge(&mut self, other: DrainConfigLayer) {
		if other.item_delay_ms.is_some() {
			self.item_delay_ms = other.item_delay_ms;
		}
	}

	pub fn finalize(self) -> DrainConfig {
		DrainConfig {
			item_delay_ms: self.item_delay_ms.unwrap_or(100),
		}
	}
}

/// Logging configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct LoggingConfig {
	/// Default tracing filter when RUST_LOG is unset, e.g. `info`.
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		LoggingConfigLayer::default().finalize()
	}
}

/// Logging configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfigLayer {
	#[serde(default)]
	pub level: Option<String>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: LoggingConfigLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| "info".to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_paths() -> PathsConfig {
		PathsConfig {
			user_config_file: "/home/x/.config/sweep/config.toml".into(),
			data_dir: "/home/x/.local/share/sweep".into(),
			state_dir: "/home/x/.local/state/sweep".into(),
		}
	}

	#[test]
	fn test_server_defaults() {
		let config = ServerConfigLayer::default().finalize();
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
		assert_eq!(config.request_timeout_secs, 30);
	}

	#[test]
	fn test_database_default_url_uses_data_dir() {
		let config = DatabaseConfigLayer::default().finalize(&test_paths());
		assert_eq!(
			config.url,
			"sqlite:/home/x/.local/share/sweep/offline_queue.db"
		);
	}

	#[test]
	fn test_database_explicit_url_wins() {
		let layer = DatabaseConfigLayer {
			url: Some("sqlite::memory:".to_string()),
		};
		assert_eq!(layer.finalize(&test_paths()).url, "sqlite::memory:");
	}

	#[test]
	fn test_live_defaults() {
		let config = LiveConfigLayer::default().finalize();
		assert_eq!(config.connect_timeout_secs, 10);
		assert_eq!(config.initial_reconnect_delay_ms, 1_000);
		assert_eq!(config.max_reconnect_delay_ms, 30_000);
	}

	#[test]
	fn test_merge_overrides_only_set_fields() {
		let mut base = LiveConfigLayer {
			connect_timeout_secs: Some(10),
			initial_reconnect_delay_ms: Some(1_000),
			max_reconnect_delay_ms: None,
		};
		base.merge(LiveConfigLayer {
			connect_timeout_secs: None,
			initial_reconnect_delay_ms: Some(500),
			max_reconnect_delay_ms: None,
		});
		let config = base.finalize();
		assert_eq!(config.connect_timeout_secs, 10);
		assert_eq!(config.initial_reconnect_delay_ms, 500);
		assert_eq!(config.max_reconnect_delay_ms, 30_000);
	}
}
