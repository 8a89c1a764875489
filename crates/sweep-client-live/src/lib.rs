// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistent live channel for the Sweep client.
//!
//! One WebSocket connection carries push notifications (chat messages, task
//! updates) and doubles as the online/offline signal. A supervisor task
//! cycles Disconnected → Connecting → Connected with exponential reconnect
//! backoff (capped, reset on success) and emits edge-triggered status
//! events — one per offline→online or online→offline transition.

pub mod backoff;
pub mod channel;
pub mod error;

pub use backoff::reconnect_delay;
pub use channel::{events_url, ChannelState, LiveChannel, LiveOptions, PushMessage};
pub use error::{LiveError, Result};
