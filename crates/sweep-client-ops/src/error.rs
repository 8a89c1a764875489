// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Encode/decode failures at the persistence seam.
///
/// Decode errors mark an item as poison: it can never replay successfully,
/// so callers discard it instead of retrying.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
	#[error("unknown operation kind: {0}")]
	UnknownKind(String),

	#[error("malformed {kind} payload: {source}")]
	Payload {
		kind: String,
		#[source]
		source: serde_json::Error,
	},
}

pub type Result<T> = std::result::Result<T, OpsError>;
