// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Failures from the remote API.
///
/// `Transport` covers everything network-shaped (timeout, refused
/// connection, DNS) and is retryable; `Rejected` is a declared failure from
/// the server and will fail identically on an unchanged replay.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("network error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("server rejected request ({status}): {detail}")]
	Rejected { status: u16, detail: String },

	#[error("invalid URL: {0}")]
	Url(#[from] url::ParseError),
}

impl ApiError {
	/// Whether a later replay with the same payload could plausibly succeed.
	pub fn is_transient(&self) -> bool {
		matches!(self, ApiError::Transport(_))
	}
}

pub type Result<T> = std::result::Result<T, ApiError>;
