// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a new HTTP client with the standard Sweep User-Agent header.
///
/// The User-Agent format is: `sweep/{platform}/{version}`
/// Example: `sweep/linux-x86_64/0.1.0`
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Creates a new HTTP client builder with the standard Sweep User-Agent header.
///
/// Use this when you need to customize the client (e.g., enable cookies).
///
/// # Example
/// ```ignore
/// let client = sweep_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a custom timeout and the standard User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> Client {
	builder()
		.timeout(timeout)
		.build()
		.expect("failed to build HTTP client")
}

/// Returns the standard Sweep User-Agent string.
///
/// Format: `sweep/{platform}/{version}`
pub fn user_agent() -> String {
	format!(
		"sweep/{}-{}/{}",
		std::env::consts::OS,
		std::env::consts::ARCH,
		env!("CARGO_PKG_VERSION")
	)
}
