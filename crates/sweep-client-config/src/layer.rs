// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The mergeable configuration layer.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, DrainConfigLayer, LiveConfigLayer, LoggingConfigLayer, ServerConfigLayer,
};

/// Partial configuration as read from one source; later sources override
/// earlier ones field-by-field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SweepConfigLayer {
	#[serde(default)]
	pub server: Option<ServerConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub live: Option<LiveConfigLayer>,
	#[serde(default)]
	pub drain: Option<DrainConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl SweepConfigLayer {
	pub fn merge(&mut self, other: SweepConfigLayer) {
		merge_section(&mut self.server, other.server, ServerConfigLayer::merge);
		merge_section(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_section(&mut self.live, other.live, LiveConfigLayer::merge);
		merge_section(&mut self.drain, other.drain, DrainConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(target: &mut Option<T>, incoming: Option<T>, merge: impl Fn(&mut T, T)) {
	match (target.as_mut(), incoming) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_takes_incoming_when_empty() {
		let mut base = SweepConfigLayer::default();
		base.merge(SweepConfigLayer {
			server: Some(ServerConfigLayer {
				base_url: Some("https://staging.sweephq.com".to_string()),
				request_timeout_secs: None,
			}),
			..Default::default()
		});
		assert_eq!(
			base.server.unwrap().base_url.as_deref(),
			Some("https://staging.sweephq.com")
		);
	}

	#[test]
	fn test_merge_is_field_wise() {
		let mut base = SweepConfigLayer {
			server: Some(ServerConfigLayer {
				base_url: Some("https://app.sweephq.com".to_string()),
				request_timeout_secs: Some(30),
			}),
			..Default::default()
		};
		base.merge(SweepConfigLayer {
			server: Some(ServerConfigLayer {
				base_url: None,
				request_timeout_secs: Some(5),
			}),
			..Default::default()
		});
		let server = base.server.unwrap();
		assert_eq!(server.base_url.as_deref(), Some("https://app.sweephq.com"));
		assert_eq!(server.request_timeout_secs, Some(5));
	}
}
