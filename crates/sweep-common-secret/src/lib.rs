// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret value wrappers for Sweep.
//!
//! [`SecretString`] holds session credentials (cookies, tokens) in a wrapper
//! that redacts the value from `Debug`/`Display` output and zeroizes the
//! backing memory on drop. Call [`SecretString::expose`] at the single point
//! where the raw value is attached to a request.

use serde::Deserialize;
use zeroize::Zeroize;

/// Placeholder emitted wherever a secret would otherwise be printed.
pub const REDACTED: &str = "[REDACTED]";

/// A string whose value must not leak through logs or error messages.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Access the underlying value.
	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl std::fmt::Debug for SecretString {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(REDACTED)
	}
}

impl std::fmt::Display for SecretString {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Drop for SecretString {
	fn drop(&mut self) {
		self.0.zeroize();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_is_redacted() {
		let secret = SecretString::new("sessionid=abc123");
		assert_eq!(format!("{secret:?}"), REDACTED);
		assert_eq!(format!("{secret}"), REDACTED);
	}

	#[test]
	fn expose_returns_value() {
		let secret = SecretString::new("sessionid=abc123");
		assert_eq!(secret.expose(), "sessionid=abc123");
	}

	#[test]
	fn deserializes_transparently() {
		let secret: SecretString = serde_json::from_str("\"tok\"").unwrap();
		assert_eq!(secret.expose(), "tok");
	}
}
