// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, Result};

/// The fixed vocabulary of replayable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	ChatSend,
	StatusChange,
	ImageUpload,
	ChecklistToggle,
	NotesUpdate,
	ProblemReport,
	TaskCreate,
	TaskUpdate,
}

impl OperationKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			OperationKind::ChatSend => "chat_send",
			OperationKind::StatusChange => "status_change",
			OperationKind::ImageUpload => "image_upload",
			OperationKind::ChecklistToggle => "checklist_toggle",
			OperationKind::NotesUpdate => "notes_update",
			OperationKind::ProblemReport => "problem_report",
			OperationKind::TaskCreate => "task_create",
			OperationKind::TaskUpdate => "task_update",
		}
	}

	/// Drain priority class: lower drains first. Chat goes ahead of
	/// everything; bulky image uploads go last.
	pub fn priority(&self) -> i64 {
		match self {
			OperationKind::ChatSend => 1,
			OperationKind::ImageUpload => 3,
			_ => 2,
		}
	}
}

impl std::str::FromStr for OperationKind {
	type Err = OpsError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"chat_send" => Ok(OperationKind::ChatSend),
			"status_change" => Ok(OperationKind::StatusChange),
			"image_upload" => Ok(OperationKind::ImageUpload),
			"checklist_toggle" => Ok(OperationKind::ChecklistToggle),
			"notes_update" => Ok(OperationKind::NotesUpdate),
			"problem_report" => Ok(OperationKind::ProblemReport),
			"task_create" => Ok(OperationKind::TaskCreate),
			"task_update" => Ok(OperationKind::TaskUpdate),
			_ => Err(OpsError::UnknownKind(s.to_string())),
		}
	}
}

impl std::fmt::Display for OperationKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Task start/stop, mapped onto the server's task-state endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
	Start,
	Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSendPayload {
	pub text: String,
	pub receiver_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link_photo_video: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangePayload {
	pub task_id: i64,
	pub action: StatusAction,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUploadPayload {
	pub task_id: i64,
	#[serde(with = "base64_bytes")]
	pub image: Vec<u8>,
	pub file_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistTogglePayload {
	pub task_id: i64,
	pub item_index: i64,
	pub completed: bool,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesUpdatePayload {
	pub task_id: i64,
	pub notes: String,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemReportPayload {
	pub task_id: i64,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(with = "base64_bytes_list")]
	pub photos: Vec<Vec<u8>>,
	pub timestamp: DateTime<Utc>,
}

/// Shared field set for creating and updating tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
	pub name: String,
	pub planned_date: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub apartment_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
	pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdatePayload {
	pub task_id: i64,
	#[serde(flatten)]
	pub draft: TaskDraft,
}

/// A strongly-typed user action. Serialization happens only at the
/// persistence edge, through [`Operation::encode`] and
/// [`Operation::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
	ChatSend(ChatSendPayload),
	StatusChange(StatusChangePayload),
	ImageUpload(ImageUploadPayload),
	ChecklistToggle(ChecklistTogglePayload),
	NotesUpdate(NotesUpdatePayload),
	ProblemReport(ProblemReportPayload),
	TaskCreate(TaskDraft),
	TaskUpdate(TaskUpdatePayload),
}

impl Operation {
	pub fn kind(&self) -> OperationKind {
		match self {
			Operation::ChatSend(_) => OperationKind::ChatSend,
			Operation::StatusChange(_) => OperationKind::StatusChange,
			Operation::ImageUpload(_) => OperationKind::ImageUpload,
			Operation::ChecklistToggle(_) => OperationKind::ChecklistToggle,
			Operation::NotesUpdate(_) => OperationKind::NotesUpdate,
			Operation::ProblemReport(_) => OperationKind::ProblemReport,
			Operation::TaskCreate(_) => OperationKind::TaskCreate,
			Operation::TaskUpdate(_) => OperationKind::TaskUpdate,
		}
	}

	pub fn priority(&self) -> i64 {
		self.kind().priority()
	}

	/// Serialize into the store's `(kind, payload)` envelope.
	pub fn encode(&self) -> Result<(OperationKind, String)> {
		let kind = self.kind();
		let payload = match self {
			Operation::ChatSend(p) => serde_json::to_string(p),
			Operation::StatusChange(p) => serde_json::to_string(p),
			Operation::ImageUpload(p) => serde_json::to_string(p),
			Operation::ChecklistToggle(p) => serde_json::to_string(p),
			Operation::NotesUpdate(p) => serde_json::to_string(p),
			Operation::ProblemReport(p) => serde_json::to_string(p),
			Operation::TaskCreate(p) => serde_json::to_string(p),
			Operation::TaskUpdate(p) => serde_json::to_string(p),
		}
		.map_err(|source| OpsError::Payload {
			kind: kind.as_str().to_string(),
			source,
		})?;
		Ok((kind, payload))
	}

	/// Deserialize from the store's envelope. Any failure here is poison:
	/// the item will never replay and must be discarded.
	pub fn decode(kind: &str, payload: &str) -> Result<Operation> {
		let kind: OperationKind = kind.parse()?;
		let malformed = |source| OpsError::Payload {
			kind: kind.as_str().to_string(),
			source,
		};
		match kind {
			OperationKind::ChatSend => serde_json::from_str(payload)
				.map(Operation::ChatSend)
				.map_err(malformed),
			OperationKind::StatusChange => serde_json::from_str(payload)
				.map(Operation::StatusChange)
				.map_err(malformed),
			OperationKind::ImageUpload => serde_json::from_str(payload)
				.map(Operation::ImageUpload)
				.map_err(malformed),
			OperationKind::ChecklistToggle => serde_json::from_str(payload)
				.map(Operation::ChecklistToggle)
				.map_err(malformed),
			OperationKind::NotesUpdate => serde_json::from_str(payload)
				.map(Operation::NotesUpdate)
				.map_err(malformed),
			OperationKind::ProblemReport => serde_json::from_str(payload)
				.map(Operation::ProblemReport)
				.map_err(malformed),
			OperationKind::TaskCreate => serde_json::from_str(payload)
				.map(Operation::TaskCreate)
				.map_err(malformed),
			OperationKind::TaskUpdate => serde_json::from_str(payload)
				.map(Operation::TaskUpdate)
				.map_err(malformed),
		}
	}
}

/// Binary content is carried base64-encoded so payloads stay text-safe.
mod base64_bytes {
	use base64::engine::general_purpose::STANDARD;
	use base64::Engine;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&STANDARD.encode(bytes))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let encoded = String::deserialize(deserializer)?;
		STANDARD
			.decode(encoded.as_bytes())
			.map_err(serde::de::Error::custom)
	}
}

mod base64_bytes_list {
	use base64::engine::general_purpose::STANDARD;
	use base64::Engine;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(list: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
		let encoded: Vec<String> = list.iter().map(|b| STANDARD.encode(b)).collect();
		serde::Serialize::serialize(&encoded, serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Vec<Vec<u8>>, D::Error> {
		let encoded = Vec::<String>::deserialize(deserializer)?;
		encoded
			.into_iter()
			.map(|s| STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kind_round_trips_through_str() {
		for kind in [
			OperationKind::ChatSend,
			OperationKind::StatusChange,
			OperationKind::ImageUpload,
			OperationKind::ChecklistToggle,
			OperationKind::NotesUpdate,
			OperationKind::ProblemReport,
			OperationKind::TaskCreate,
			OperationKind::TaskUpdate,
		] {
			assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
		}
	}

	#[test]
	fn test_priority_classes() {
		assert_eq!(OperationKind::ChatSend.priority(), 1);
		assert_eq!(OperationKind::StatusChange.priority(), 2);
		assert_eq!(OperationKind::ChecklistToggle.priority(), 2);
		assert_eq!(OperationKind::NotesUpdate.priority(), 2);
		assert_eq!(OperationKind::ProblemReport.priority(), 2);
		assert_eq!(OperationKind::TaskCreate.priority(), 2);
		assert_eq!(OperationKind::ImageUpload.priority(), 3);
	}

	#[test]
	fn test_chat_send_encodes_to_expected_wire_shape() {
		let op = Operation::ChatSend(ChatSendPayload {
			text: "hello".to_string(),
			receiver_id: "admin".to_string(),
			link_photo_video: None,
		});

		let (kind, payload) = op.encode().unwrap();
		assert_eq!(kind, OperationKind::ChatSend);
		assert_eq!(payload, r#"{"text":"hello","receiver_id":"admin"}"#);
	}

	#[test]
	fn test_image_upload_payload_is_text_safe() {
		let op = Operation::ImageUpload(ImageUploadPayload {
			task_id: 42,
			image: vec![0xff, 0xd8, 0xff, 0xe0],
			file_name: "offline_image.jpg".to_string(),
			notes: None,
			timestamp: Utc::now(),
		});

		let (kind, payload) = op.encode().unwrap();
		assert!(payload.contains("/9j/4A==")); // base64 of the JPEG magic
		let decoded = Operation::decode(kind.as_str(), &payload).unwrap();
		assert_eq!(decoded, op);
	}

	#[test]
	fn test_status_change_decode() {
		let decoded = Operation::decode(
			"status_change",
			r#"{"task_id":42,"action":"start","timestamp":"2025-06-01T08:00:00Z"}"#,
		)
		.unwrap();
		match decoded {
			Operation::StatusChange(p) => {
				assert_eq!(p.task_id, 42);
				assert_eq!(p.action, StatusAction::Start);
				assert!(p.notes.is_none());
			}
			other => panic!("expected status change, got {other:?}"),
		}
	}

	#[test]
	fn test_unknown_kind_is_poison() {
		let result = Operation::decode("telemetry_flush", "{}");
		assert!(matches!(result, Err(OpsError::UnknownKind(k)) if k == "telemetry_flush"));
	}

	#[test]
	fn test_malformed_json_is_poison() {
		let result = Operation::decode("chat_send", "{not json");
		assert!(matches!(result, Err(OpsError::Payload { .. })));
	}

	#[test]
	fn test_corrupted_base64_is_poison() {
		let payload = r#"{"task_id":1,"image":"!!!not-base64!!!","file_name":"a.jpg","timestamp":"2025-06-01T08:00:00Z"}"#;
		let result = Operation::decode("image_upload", payload);
		assert!(matches!(result, Err(OpsError::Payload { .. })));
	}

	#[test]
	fn test_problem_report_with_photos() {
		let op = Operation::ProblemReport(ProblemReportPayload {
			task_id: 7,
			name: "Broken window".to_string(),
			description: Some("Kitchen, left pane".to_string()),
			photos: vec![vec![1, 2, 3], vec![4, 5]],
			timestamp: Utc::now(),
		});

		let (kind, payload) = op.encode().unwrap();
		let decoded = Operation::decode(kind.as_str(), &payload).unwrap();
		assert_eq!(decoded, op);
	}

	#[test]
	fn test_task_update_flattens_draft() {
		let op = Operation::TaskUpdate(TaskUpdatePayload {
			task_id: 9,
			draft: TaskDraft {
				name: "Stairwell".to_string(),
				planned_date: "2025-06-02".to_string(),
				apartment_id: Some(3),
				category_id: None,
				note: None,
				status: "open".to_string(),
			},
		});

		let (_, payload) = op.encode().unwrap();
		let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
		assert_eq!(value["task_id"], 9);
		assert_eq!(value["name"], "Stairwell");
	}
}
