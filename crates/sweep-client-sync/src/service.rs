// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sweep_client_api::{RemoteApi, TaskState};
use sweep_client_db::QueueStore;
use sweep_client_live::LiveChannel;
use sweep_client_ops::{
	ChatSendPayload, ChecklistTogglePayload, ImageUploadPayload, NotesUpdatePayload, Operation,
	ProblemReportPayload, StatusAction, StatusChangePayload, TaskDraft, TaskUpdatePayload,
};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::types::{DrainOutcome, DrainTrigger, SyncEvent};

/// Facade over the offline queue: enqueue entry points per operation kind,
/// the drain coordinator, and the events the surrounding UI subscribes to.
///
/// Constructed explicitly by the composition root; collaborators come in
/// through their seams so tests can substitute stubs.
pub struct SyncService {
	store: Arc<dyn QueueStore>,
	api: Arc<dyn RemoteApi>,
	item_delay: Duration,
	drain_gate: Mutex<()>,
	events_tx: broadcast::Sender<SyncEvent>,
}

impl SyncService {
	pub fn new(store: Arc<dyn QueueStore>, api: Arc<dyn RemoteApi>) -> Self {
		let (events_tx, _) = broadcast::channel(256);
		Self {
			store,
			api,
			item_delay: Duration::from_millis(100),
			drain_gate: Mutex::new(()),
			events_tx,
		}
	}

	/// Override the pause between replayed items.
	pub fn with_item_delay(mut self, delay: Duration) -> Self {
		self.item_delay = delay;
		self
	}

	pub async fn enqueue_chat_message(&self, text: &str, receiver_id: &str) -> Result<i64> {
		self
			.enqueue_operation(&Operation::ChatSend(ChatSendPayload {
				text: text.to_string(),
				receiver_id: receiver_id.to_string(),
				link_photo_video: None,
			}))
			.await
	}

	pub async fn enqueue_status_change(
		&self,
		task_id: i64,
		action: StatusAction,
		notes: Option<&str>,
	) -> Result<i64> {
		self
			.enqueue_operation(&Operation::StatusChange(StatusChangePayload {
				task_id,
				action,
				notes: notes.map(str::to_string),
				timestamp: Utc::now(),
			}))
			.await
	}

	pub async fn enqueue_image_upload(
		&self,
		task_id: i64,
		image: Vec<u8>,
		file_name: &str,
		notes: Option<&str>,
	) -> Result<i64> {
		self
			.enqueue_operation(&Operation::ImageUpload(ImageUploadPayload {
				task_id,
				image,
				file_name: file_name.to_string(),
				notes: notes.map(str::to_string),
				timestamp: Utc::now(),
			}))
			.await
	}

	pub async fn enqueue_checklist_toggle(
		&self,
		task_id: i64,
		item_index: i64,
		completed: bool,
	) -> Result<i64> {
		self
			.enqueue_operation(&Operation::ChecklistToggle(ChecklistTogglePayload {
				task_id,
				item_index,
				completed,
				timestamp: Utc::now(),
			}))
			.await
	}

	pub async fn enqueue_notes_update(&self, task_id: i64, notes: &str) -> Result<i64> {
		self
			.enqueue_operation(&Operation::NotesUpdate(NotesUpdatePayload {
				task_id,
				notes: notes.to_string(),
				timestamp: Utc::now(),
			}))
			.await
	}

	pub async fn enqueue_problem_report(
		&self,
		task_id: i64,
		name: &str,
		description: Option<&str>,
		photos: Vec<Vec<u8>>,
	) -> Result<i64> {
		self
			.enqueue_operation(&Operation::ProblemReport(ProblemReportPayload {
				task_id,
				name: name.to_string(),
				description: description.map(str::to_string),
				photos,
				timestamp: Utc::now(),
			}))
			.await
	}

	pub async fn enqueue_task_create(&self, draft: TaskDraft) -> Result<i64> {
		self.enqueue_operation(&Operation::TaskCreate(draft)).await
	}

	pub async fn enqueue_task_update(&self, task_id: i64, draft: TaskDraft) -> Result<i64> {
		self
			.enqueue_operation(&Operation::TaskUpdate(TaskUpdatePayload { task_id, draft }))
			.await
	}

	/// Encode and persist one operation; returns the assigned queue id.
	#[instrument(skip(self, operation), fields(kind = %operation.kind()))]
	pub async fn enqueue_operation(&self, operation: &Operation) -> Result<i64> {
		let (kind, payload) = operation.encode()?;
		let id = self
			.store
			.enqueue(kind.as_str(), &payload, kind.priority())
			.await?;
		debug!(item_id = id, "operation queued for replay");
		Ok(id)
	}

	pub async fn pending_count(&self) -> Result<i64> {
		Ok(self.store.count().await?)
	}

	/// Drop every pending item (user-initiated discard).
	pub async fn clear_all(&self) -> Result<u64> {
		Ok(self.store.clear().await?)
	}

	/// Per-item sync notifications.
	pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
		self.events_tx.subscribe()
	}

	/// Pending-count updates, forwarded from the store.
	pub fn subscribe_count(&self) -> broadcast::Receiver<i64> {
		self.store.subscribe_count()
	}

	/// Manual "retry now".
	pub async fn drain_now(&self) -> Result<DrainOutcome> {
		self.drain(DrainTrigger::Manual).await
	}

	/// Replay the pending queue against the remote API.
	///
	/// At most one pass runs at a time; a concurrent call returns
	/// [`DrainOutcome::AlreadyDraining`] without touching the queue. The
	/// pass works on a snapshot, so items enqueued while it runs wait for
	/// the next trigger. A failing item is recorded and skipped — it never
	/// blocks the rest of the queue.
	#[instrument(skip(self))]
	pub async fn drain(&self, trigger: DrainTrigger) -> Result<DrainOutcome> {
		let _gate = match self.drain_gate.try_lock() {
			Ok(gate) => gate,
			Err(_) => {
				debug!("drain already in progress, skipping");
				return Ok(DrainOutcome::AlreadyDraining);
			}
		};

		let items = self.store.list_pending().await?;
		info!(pending = items.len(), "draining offline queue");

		let mut synced = 0;
		let mut failed = 0;
		let mut discarded = 0;

		for (index, item) in items.iter().enumerate() {
			if index > 0 && !self.item_delay.is_zero() {
				tokio::time::sleep(self.item_delay).await;
			}

			let operation = match Operation::decode(&item.operation_kind, &item.payload) {
				Ok(operation) => operation,
				Err(e) => {
					// poison: a malformed record can never replay, so it is
					// dropped instead of retried forever
					warn!(item_id = item.id, error = %e, "discarding undecodable queue item");
					self.store.remove(item.id).await?;
					let _ = self.events_tx.send(SyncEvent::ItemDiscarded {
						item: item.clone(),
						reason: e.to_string(),
					});
					discarded += 1;
					continue;
				}
			};

			match dispatch(self.api.as_ref(), &operation).await {
				Ok(()) => {
					self.store.remove(item.id).await?;
					debug!(item_id = item.id, kind = %item.operation_kind, "item synced");
					let _ = self.events_tx.send(SyncEvent::ItemSynced(item.clone()));
					synced += 1;
				}
				Err(e) => {
					let detail = e.to_string();
					warn!(
						item_id = item.id,
						kind = %item.operation_kind,
						transient = e.is_transient(),
						error = %detail,
						"item replay failed"
					);
					self.store.record_failure(item.id, &detail).await?;
					let _ = self.events_tx.send(SyncEvent::ItemSyncFailed {
						item: item.clone(),
						error: detail,
					});
					failed += 1;
				}
			}
		}

		info!(synced, failed, discarded, "drain pass finished");
		Ok(DrainOutcome::Completed {
			synced,
			failed,
			discarded,
		})
	}
}

/// Route one decoded operation to its remote API method.
async fn dispatch(api: &dyn RemoteApi, operation: &Operation) -> sweep_client_api::Result<()> {
	match operation {
		Operation::ChatSend(p) => {
			api
				.send_chat_message(&p.text, &p.receiver_id, p.link_photo_video.as_deref())
				.await
		}
		Operation::StatusChange(p) => {
			let state = match p.action {
				StatusAction::Start => TaskState::Started,
				StatusAction::Stop => TaskState::Completed,
			};
			api.set_task_state(p.task_id, state).await
		}
		Operation::ImageUpload(p) => {
			api
				.upload_task_image(p.task_id, &p.image, &p.file_name, p.notes.as_deref())
				.await
		}
		Operation::ChecklistToggle(p) => api.toggle_checklist_item(p.task_id, p.item_index).await,
		Operation::NotesUpdate(p) => api.update_task_notes(p.task_id, &p.notes).await,
		Operation::ProblemReport(p) => {
			api
				.report_problem(p.task_id, &p.name, p.description.as_deref(), &p.photos)
				.await
		}
		Operation::TaskCreate(draft) => api.create_task(draft).await,
		Operation::TaskUpdate(p) => api.update_task(p.task_id, &p.draft).await,
	}
}

/// Drain whenever the live channel reports an offline→online transition.
///
/// The channel emits edges only, so the queue drains exactly once per
/// reconnect; the drain gate absorbs any racing manual trigger.
pub fn spawn_drain_on_reconnect(service: Arc<SyncService>, live: &LiveChannel) -> JoinHandle<()> {
	spawn_drain_on_status(service, live.subscribe_status())
}

/// Like [`spawn_drain_on_reconnect`], but over a raw status subscription.
pub fn spawn_drain_on_status(
	service: Arc<SyncService>,
	mut status: broadcast::Receiver<bool>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			match status.recv().await {
				Ok(true) => {
					info!("connectivity restored, draining offline queue");
					if let Err(e) = service.drain(DrainTrigger::Reconnect).await {
						warn!(error = %e, "reconnect drain failed");
					}
				}
				Ok(false) => debug!("connectivity lost"),
				Err(broadcast::error::RecvError::Lagged(missed)) => {
					warn!(missed, "status events lagged");
				}
				Err(broadcast::error::RecvError::Closed) => break,
			}
		}
	})
}
