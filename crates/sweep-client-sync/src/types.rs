// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sweep_client_db::QueueItem;

/// What woke the drain coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainTrigger {
	/// The live channel reported an offline→online transition.
	Reconnect,
	/// A user-initiated "retry now".
	Manual,
}

/// Result of a single drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
	Completed {
		synced: usize,
		failed: usize,
		discarded: usize,
	},
	/// Another pass was already running; this call did nothing.
	AlreadyDraining,
}

/// Per-item notifications emitted while draining.
#[derive(Debug, Clone)]
pub enum SyncEvent {
	/// The item was replayed successfully and removed from the queue.
	ItemSynced(QueueItem),
	/// Replay failed; the item stays queued with updated retry metadata.
	ItemSyncFailed { item: QueueItem, error: String },
	/// The item could not be decoded and was dropped without replay.
	ItemDiscarded { item: QueueItem, reason: String },
}
