// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline queue drain coordination for the Sweep client.
//!
//! While connectivity is down (or an online attempt fails with a transient
//! error), user actions are buffered in the durable queue. When the live
//! channel reports an offline→online transition, the drain coordinator
//! replays the queue against the remote API in `(priority, created_at, id)`
//! order: removing items on success, recording retry metadata on failure,
//! and discarding poison items that can never decode.

pub mod error;
pub mod service;
pub mod types;

pub use error::{Result, SyncError};
pub use service::{spawn_drain_on_reconnect, spawn_drain_on_status, SyncService};
pub use types::{DrainOutcome, DrainTrigger, SyncEvent};
