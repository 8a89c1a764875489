// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Delay before reconnect attempt `attempt` (1-based):
/// `min(initial * 2^(attempt-1), max)`.
///
/// The caller resets `attempt` to zero on a successful connection, so a
/// single success brings the next failure's delay back to `initial`.
pub fn reconnect_delay(attempt: u32, initial: Duration, max: Duration) -> Duration {
	let exponent = attempt.saturating_sub(1).min(31);
	let delay = initial.saturating_mul(2u32.saturating_pow(exponent));
	delay.min(max)
}
