// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error(transparent)]
	Db(#[from] sweep_client_db::DbError),

	#[error(transparent)]
	Ops(#[from] sweep_client_ops::OpsError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
