// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

/// Resolved XDG paths for Sweep.
#[derive(Debug, Clone)]
pub struct PathsConfig {
	/// User config file: ~/.config/sweep/config.toml
	pub user_config_file: PathBuf,
	/// Data directory: ~/.local/share/sweep/
	///
	/// App-private; survives restarts, removed on uninstall. The offline
	/// queue database lives here.
	pub data_dir: PathBuf,
	/// State directory: ~/.local/state/sweep/
	pub state_dir: PathBuf,
}

impl PathsConfig {
	/// Get the config directory (parent of user_config_file)
	pub fn config_dir(&self) -> PathBuf {
		self
			.user_config_file
			.parent()
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|| self.user_config_file.clone())
	}

	/// Default location of the offline queue database.
	pub fn queue_database_file(&self) -> PathBuf {
		self.data_dir.join("offline_queue.db")
	}
}

/// Resolve XDG paths according to the Base Directory Specification.
///
/// Uses environment variables if set, otherwise falls back to defaults:
/// - XDG_CONFIG_HOME or ~/.config
/// - XDG_DATA_HOME or ~/.local/share
/// - XDG_STATE_HOME or ~/.local/state
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;

	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".config"));

	let data_home = std::env::var_os("XDG_DATA_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/share"));

	let state_home = std::env::var_os("XDG_STATE_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/state"));

	tracing::debug!(
			config_home = %config_home.display(),
			data_home = %data_home.display(),
			state_home = %state_home.display(),
			"resolved XDG paths"
	);

	Ok(PathsConfig {
		user_config_file: config_home.join("sweep/config.toml"),
		data_dir: data_home.join("sweep"),
		state_dir: state_home.join("sweep"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_resolve_xdg_paths_succeeds() {
		let result = resolve_xdg_paths();
		assert!(result.is_ok());

		let paths = result.unwrap();
		assert!(paths.user_config_file.to_string_lossy().contains("sweep"));
		assert!(paths.data_dir.to_string_lossy().contains("sweep"));
		assert!(paths.state_dir.to_string_lossy().contains("sweep"));
	}

	#[test]
	fn test_queue_database_file_in_data_dir() {
		let paths = resolve_xdg_paths().unwrap();
		let db = paths.queue_database_file();
		assert!(db.starts_with(&paths.data_dir));
		assert!(db.to_string_lossy().ends_with("offline_queue.db"));
	}

	#[test]
	fn test_config_dir_returns_parent() {
		let paths = resolve_xdg_paths().unwrap();
		let config_dir = paths.config_dir();
		assert!(config_dir.to_string_lossy().ends_with("sweep"));
	}
}
