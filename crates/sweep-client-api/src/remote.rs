// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sweep_client_ops::TaskDraft;

use crate::client::{ApiClient, TaskState};
use crate::error::Result;

/// The seam the drain coordinator replays through: one method per
/// replayable operation kind, each with the uniform success/failure
/// contract of [`crate::ApiError`].
#[async_trait]
pub trait RemoteApi: Send + Sync {
	async fn send_chat_message(
		&self,
		text: &str,
		receiver_id: &str,
		link_photo_video: Option<&str>,
	) -> Result<()>;

	async fn set_task_state(&self, task_id: i64, state: TaskState) -> Result<()>;

	async fn toggle_checklist_item(&self, task_id: i64, item_index: i64) -> Result<()>;

	async fn update_task_notes(&self, task_id: i64, notes: &str) -> Result<()>;

	async fn upload_task_image(
		&self,
		task_id: i64,
		image: &[u8],
		file_name: &str,
		note: Option<&str>,
	) -> Result<()>;

	async fn report_problem(
		&self,
		task_id: i64,
		name: &str,
		description: Option<&str>,
		photos: &[Vec<u8>],
	) -> Result<()>;

	async fn create_task(&self, draft: &TaskDraft) -> Result<()>;

	async fn update_task(&self, task_id: i64, draft: &TaskDraft) -> Result<()>;
}

#[async_trait]
impl RemoteApi for ApiClient {
	async fn send_chat_message(
		&self,
		text: &str,
		receiver_id: &str,
		link_photo_video: Option<&str>,
	) -> Result<()> {
		self
			.send_chat_message(text, receiver_id, link_photo_video)
			.await
	}

	async fn set_task_state(&self, task_id: i64, state: TaskState) -> Result<()> {
		self.set_task_state(task_id, state).await
	}

	async fn toggle_checklist_item(&self, task_id: i64, item_index: i64) -> Result<()> {
		self.toggle_checklist_item(task_id, item_index).await
	}

	async fn update_task_notes(&self, task_id: i64, notes: &str) -> Result<()> {
		self.update_task_notes(task_id, notes).await
	}

	async fn upload_task_image(
		&self,
		task_id: i64,
		image: &[u8],
		file_name: &str,
		note: Option<&str>,
	) -> Result<()> {
		self
			.upload_task_image(task_id, image, file_name, note)
			.await
	}

	async fn report_problem(
		&self,
		task_id: i64,
		name: &str,
		description: Option<&str>,
		photos: &[Vec<u8>],
	) -> Result<()> {
		self
			.report_problem(task_id, name, description, photos)
			.await
	}

	async fn create_task(&self, draft: &TaskDraft) -> Result<()> {
		self.create_task(draft).await
	}

	async fn update_task(&self, task_id: i64, draft: &TaskDraft) -> Result<()> {
		self.update_task(task_id, draft).await
	}
}
