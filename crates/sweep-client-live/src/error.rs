// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
	#[error("invalid live channel URL: {0}")]
	Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, LiveError>;
