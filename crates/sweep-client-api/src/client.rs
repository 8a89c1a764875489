// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use reqwest::header::COOKIE;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use sweep_client_ops::TaskDraft;
use sweep_common_secret::SecretString;
use url::Url;

use crate::error::{ApiError, Result};

/// Uniform response body shape shared by all mutating endpoints.
///
/// `success` is optional: some endpoints answer with richer documents that
/// omit the flag, and a missing flag on a 2xx means success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
	#[serde(default)]
	pub success: Option<bool>,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub error: Option<String>,
}

impl ApiResponse {
	pub fn error_detail(&self) -> String {
		self
			.error
			.clone()
			.or_else(|| self.message.clone())
			.unwrap_or_else(|| "request failed".to_string())
	}
}

/// Desired task state on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
	Started,
	Completed,
}

impl TaskState {
	pub fn as_str(&self) -> &'static str {
		match self {
			TaskState::Started => "started",
			TaskState::Completed => "completed",
		}
	}
}

/// Stateless-per-call client for the field-service API.
///
/// The server authenticates with a session cookie; attach it once with
/// [`ApiClient::with_session`] and every request carries it.
pub struct ApiClient {
	base_url: Url,
	http: reqwest::Client,
	session: Option<SecretString>,
}

impl ApiClient {
	pub fn new(base_url: &str) -> Result<Self> {
		let base_url = Url::parse(base_url)?;
		let http = sweep_common_http::new_client();
		Ok(Self {
			base_url,
			http,
			session: None,
		})
	}

	pub fn with_http(mut self, http: reqwest::Client) -> Self {
		self.http = http;
		self
	}

	pub fn with_session(mut self, session: SecretString) -> Self {
		self.session = Some(session);
		self
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn session(&self) -> Option<&SecretString> {
		self.session.as_ref()
	}

	#[tracing::instrument(skip(self, text, link_photo_video))]
	pub async fn send_chat_message(
		&self,
		text: &str,
		receiver_id: &str,
		link_photo_video: Option<&str>,
	) -> Result<()> {
		let url = self.base_url.join("mobile/api/chat/send/")?;
		let body = json!({
			"text": text,
			"receiver_id": receiver_id,
			"link_photo_video": link_photo_video.unwrap_or(""),
		});
		let response = self.post(url).json(&body).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self))]
	pub async fn set_task_state(&self, task_id: i64, state: TaskState) -> Result<()> {
		let url = self.base_url.join(&format!("api/task/{task_id}/state/"))?;
		let body = json!({ "state_completed": state.as_str() });
		let response = self.post(url).json(&body).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self))]
	pub async fn toggle_checklist_item(&self, task_id: i64, item_index: i64) -> Result<()> {
		let url = self
			.base_url
			.join(&format!("mobile/api/task/{task_id}/checklist/{item_index}/toggle/"))?;
		let response = self.post(url).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self, notes))]
	pub async fn update_task_notes(&self, task_id: i64, notes: &str) -> Result<()> {
		let url = self.base_url.join(&format!("mobile/api/task/{task_id}/notiz/"))?;
		let body = json!({ "note": notes });
		let response = self.post(url).json(&body).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self, image, note), fields(bytes = image.len()))]
	pub async fn upload_task_image(
		&self,
		task_id: i64,
		image: &[u8],
		file_name: &str,
		note: Option<&str>,
	) -> Result<()> {
		let url = self
			.base_url
			.join(&format!("api/task/{task_id}/items/bild_status/create/"))?;

		let part = multipart::Part::bytes(image.to_vec())
			.file_name(file_name.to_string())
			.mime_str("image/jpeg")
			.map_err(ApiError::Transport)?;
		let mut form = multipart::Form::new().part("image", part);
		if let Some(note) = note {
			form = form.text("note", note.to_string());
		}

		let response = self.post(url).multipart(form).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self, name, description, photos), fields(photo_count = photos.len()))]
	pub async fn report_problem(
		&self,
		task_id: i64,
		name: &str,
		description: Option<&str>,
		photos: &[Vec<u8>],
	) -> Result<()> {
		let url = self
			.base_url
			.join(&format!("api/task/{task_id}/items/anmerkung/create/"))?;

		let mut form = multipart::Form::new()
			.text("name", name.to_string())
			.text("description", description.unwrap_or("").to_string());
		for (index, photo) in photos.iter().enumerate() {
			let part = multipart::Part::bytes(photo.clone())
				.file_name(format!("photo_{index}.jpg"))
				.mime_str("image/jpeg")
				.map_err(ApiError::Transport)?;
			form = form.part(format!("photo_{index}"), part);
		}

		let response = self.post(url).multipart(form).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
	pub async fn create_task(&self, draft: &TaskDraft) -> Result<()> {
		let url = self.base_url.join("mobile/api/task/create/")?;
		let response = self.post(url).json(draft).send().await?;
		outcome(response).await
	}

	#[tracing::instrument(skip(self, draft))]
	pub async fn update_task(&self, task_id: i64, draft: &TaskDraft) -> Result<()> {
		let url = self.base_url.join(&format!("mobile/api/task/{task_id}/update/"))?;
		let response = self.post(url).json(draft).send().await?;
		outcome(response).await
	}

	fn post(&self, url: Url) -> reqwest::RequestBuilder {
		let mut request = self.http.post(url);
		if let Some(session) = &self.session {
			request = request.header(COOKIE, session.expose());
		}
		request
	}
}

/// Fold an HTTP response into the uniform success/failure contract.
async fn outcome(response: reqwest::Response) -> Result<()> {
	let status = response.status();
	let body = response.text().await.unwrap_or_default();
	evaluate(status, &body)
}

/// A 2xx with a parseable body is judged by its `success` flag; a 2xx whose
/// body is not the uniform shape counts as success (some endpoints return
/// richer documents). Anything else is a declared rejection.
fn evaluate(status: StatusCode, body: &str) -> Result<()> {
	if !status.is_success() {
		return Err(ApiError::Rejected {
			status: status.as_u16(),
			detail: if body.is_empty() {
				status.to_string()
			} else {
				body.to_string()
			},
		});
	}

	match serde_json::from_str::<ApiResponse>(body) {
		Ok(parsed) if parsed.success == Some(false) => Err(ApiError::Rejected {
			status: status.as_u16(),
			detail: parsed.error_detail(),
		}),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_success_body_is_ok() {
		assert!(evaluate(StatusCode::OK, r#"{"success":true}"#).is_ok());
	}

	#[test]
	fn test_declared_failure_is_rejected() {
		let result = evaluate(
			StatusCode::OK,
			r#"{"success":false,"error":"task already completed"}"#,
		);
		match result {
			Err(ApiError::Rejected { status, detail }) => {
				assert_eq!(status, 200);
				assert_eq!(detail, "task already completed");
			}
			other => panic!("expected rejection, got {other:?}"),
		}
	}

	#[test]
	fn test_http_error_is_rejected_with_body() {
		let result = evaluate(StatusCode::FORBIDDEN, "permission denied");
		match result {
			Err(ApiError::Rejected { status, detail }) => {
				assert_eq!(status, 403);
				assert_eq!(detail, "permission denied");
			}
			other => panic!("expected rejection, got {other:?}"),
		}
	}

	#[test]
	fn test_non_uniform_success_body_counts_as_success() {
		assert!(evaluate(StatusCode::OK, r#"{"id":17,"text":"hello"}"#).is_ok());
	}

	#[test]
	fn test_rejection_is_not_transient() {
		let error = ApiError::Rejected {
			status: 422,
			detail: "validation".to_string(),
		};
		assert!(!error.is_transient());
	}

	#[test]
	fn test_error_detail_falls_back_to_message() {
		let response = ApiResponse {
			success: Some(false),
			message: Some("nope".to_string()),
			error: None,
		};
		assert_eq!(response.error_detail(), "nope");
	}
}
