// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::error::Result;

/// One buffered user action awaiting transmission to the server.
///
/// `operation_kind` is stored as the raw wire string so the store stays
/// agnostic of the operation vocabulary; parsing happens at the
/// encode/decode boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
	pub id: i64,
	pub operation_kind: String,
	pub payload: String,
	pub priority: i64,
	pub created_at: DateTime<Utc>,
	pub retry_count: u32,
	pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct QueueRepository {
	pool: SqlitePool,
	count_tx: broadcast::Sender<i64>,
}

impl QueueRepository {
	pub fn new(pool: SqlitePool) -> Self {
		let (count_tx, _) = broadcast::channel(64);
		Self { pool, count_tx }
	}

	/// Create the backing table and index. Idempotent; must complete before
	/// any other call.
	///
	/// `AUTOINCREMENT` guarantees ids are never reused within the store's
	/// lifetime, even after deletes.
	#[tracing::instrument(skip(self))]
	pub async fn initialize(&self) -> Result<()> {
		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS queue_items (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				operation_kind TEXT NOT NULL,
				payload TEXT NOT NULL,
				priority INTEGER NOT NULL,
				created_at TEXT NOT NULL,
				retry_count INTEGER NOT NULL DEFAULT 0,
				last_error TEXT
			)
			"#,
		)
		.execute(&self.pool)
		.await?;

		sqlx::query(
			"CREATE INDEX IF NOT EXISTS idx_queue_items_drain_order ON queue_items(priority, created_at, id)",
		)
		.execute(&self.pool)
		.await?;

		tracing::debug!("queue store initialized");
		Ok(())
	}

	/// Append a new pending operation; returns the assigned id.
	#[tracing::instrument(skip(self, payload))]
	pub async fn enqueue(&self, operation_kind: &str, payload: &str, priority: i64) -> Result<i64> {
		let result = sqlx::query(
			r#"
			INSERT INTO queue_items (operation_kind, payload, priority, created_at, retry_count)
			VALUES (?, ?, ?, ?, 0)
			"#,
		)
		.bind(operation_kind)
		.bind(payload)
		.bind(priority)
		.bind(Utc::now())
		.execute(&self.pool)
		.await?;

		let id = result.last_insert_rowid();
		tracing::debug!(item_id = id, operation_kind, priority, "enqueued operation");

		self.notify_count().await;
		Ok(id)
	}

	pub async fn count(&self) -> Result<i64> {
		let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM queue_items")
			.fetch_one(&self.pool)
			.await?;
		Ok(row.0)
	}

	/// Snapshot of all pending items in drain order: ascending
	/// `(priority, created_at, id)`.
	#[tracing::instrument(skip(self))]
	pub async fn list_pending(&self) -> Result<Vec<QueueItem>> {
		let rows = sqlx::query_as::<_, (i64, String, String, i64, DateTime<Utc>, i64, Option<String>)>(
			r#"
			SELECT id, operation_kind, payload, priority, created_at, retry_count, last_error
			FROM queue_items
			ORDER BY priority ASC, created_at ASC, id ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(
			rows
				.into_iter()
				.map(
					|(id, operation_kind, payload, priority, created_at, retry_count, last_error)| {
						QueueItem {
							id,
							operation_kind,
							payload,
							priority,
							created_at,
							retry_count: retry_count as u32,
							last_error,
						}
					},
				)
				.collect(),
		)
	}

	/// Delete one item. A missing id is not an error; the item may already
	/// have been cleared.
	#[tracing::instrument(skip(self))]
	pub async fn remove(&self, id: i64) -> Result<()> {
		sqlx::query("DELETE FROM queue_items WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		self.notify_count().await;
		Ok(())
	}

	/// Record a failed replay attempt: bump `retry_count`, overwrite
	/// `last_error`.
	#[tracing::instrument(skip(self, error_detail))]
	pub async fn record_failure(&self, id: i64, error_detail: &str) -> Result<()> {
		sqlx::query(
			"UPDATE queue_items SET retry_count = retry_count + 1, last_error = ? WHERE id = ?",
		)
		.bind(error_detail)
		.bind(id)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	/// Remove all items (user-triggered discard); returns how many were
	/// dropped.
	#[tracing::instrument(skip(self))]
	pub async fn clear(&self) -> Result<u64> {
		let result = sqlx::query("DELETE FROM queue_items")
			.execute(&self.pool)
			.await?;

		self.notify_count().await;
		Ok(result.rows_affected())
	}

	/// Subscribe to pending-count updates published after every mutating
	/// call.
	pub fn subscribe_count(&self) -> broadcast::Receiver<i64> {
		self.count_tx.subscribe()
	}

	async fn notify_count(&self) {
		match self.count().await {
			Ok(n) => {
				let _ = self.count_tx.send(n);
			}
			Err(e) => tracing::warn!(error = %e, "failed to read queue count for notification"),
		}
	}
}

#[async_trait]
pub trait QueueStore: Send + Sync {
	async fn initialize(&self) -> Result<()>;
	async fn enqueue(&self, operation_kind: &str, payload: &str, priority: i64) -> Result<i64>;
	async fn count(&self) -> Result<i64>;
	async fn list_pending(&self) -> Result<Vec<QueueItem>>;
	async fn remove(&self, id: i64) -> Result<()>;
	async fn record_failure(&self, id: i64, error_detail: &str) -> Result<()>;
	async fn clear(&self) -> Result<u64>;
	fn subscribe_count(&self) -> broadcast::Receiver<i64>;
}

#[async_trait]
impl QueueStore for QueueRepository {
	async fn initialize(&self) -> Result<()> {
		self.initialize().await
	}

	async fn enqueue(&self, operation_kind: &str, payload: &str, priority: i64) -> Result<i64> {
		self.enqueue(operation_kind, payload, priority).await
	}

	async fn count(&self) -> Result<i64> {
		self.count().await
	}

	async fn list_pending(&self) -> Result<Vec<QueueItem>> {
		self.list_pending().await
	}

	async fn remove(&self, id: i64) -> Result<()> {
		self.remove(id).await
	}

	async fn record_failure(&self, id: i64, error_detail: &str) -> Result<()> {
		self.record_failure(id, error_detail).await
	}

	async fn clear(&self) -> Result<u64> {
		self.clear().await
	}

	fn subscribe_count(&self) -> broadcast::Receiver<i64> {
		self.subscribe_count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pool::create_pool;
	use crate::testing::create_queue_test_pool;

	#[tokio::test]
	async fn test_initialize_is_idempotent() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		repo.initialize().await.unwrap();
		repo.initialize().await.unwrap();
		assert_eq!(repo.count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_enqueue_assigns_increasing_ids() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		let a = repo.enqueue("chat_send", "{}", 1).await.unwrap();
		let b = repo.enqueue("chat_send", "{}", 1).await.unwrap();
		let c = repo.enqueue("notes_update", "{}", 2).await.unwrap();

		assert!(a < b);
		assert!(b < c);
		assert_eq!(repo.count().await.unwrap(), 3);
	}

	#[tokio::test]
	async fn test_list_pending_orders_by_priority_then_age() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		let image = repo.enqueue("image_upload", "{}", 3).await.unwrap();
		let status = repo.enqueue("status_change", "{}", 2).await.unwrap();
		let chat = repo.enqueue("chat_send", "{}", 1).await.unwrap();
		let notes = repo.enqueue("notes_update", "{}", 2).await.unwrap();

		let items = repo.list_pending().await.unwrap();
		let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
		assert_eq!(ids, vec![chat, status, notes, image]);
	}

	#[tokio::test]
	async fn test_same_priority_is_fifo() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		let mut expected = Vec::new();
		for _ in 0..5 {
			expected.push(repo.enqueue("status_change", "{}", 2).await.unwrap());
		}

		let items = repo.list_pending().await.unwrap();
		let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
		assert_eq!(ids, expected);
	}

	#[tokio::test]
	async fn test_enqueue_sets_fresh_retry_state() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		repo.enqueue("chat_send", r#"{"text":"hi"}"#, 1).await.unwrap();

		let items = repo.list_pending().await.unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].retry_count, 0);
		assert!(items[0].last_error.is_none());
		assert_eq!(items[0].payload, r#"{"text":"hi"}"#);
	}

	#[tokio::test]
	async fn test_remove_missing_id_is_ok() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		repo.remove(12345).await.unwrap();
	}

	#[tokio::test]
	async fn test_record_failure_bumps_retry_count() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		let id = repo.enqueue("chat_send", "{}", 1).await.unwrap();
		repo.record_failure(id, "connection refused").await.unwrap();
		repo.record_failure(id, "timeout").await.unwrap();

		let items = repo.list_pending().await.unwrap();
		assert_eq!(items[0].retry_count, 2);
		assert_eq!(items[0].last_error.as_deref(), Some("timeout"));
	}

	#[tokio::test]
	async fn test_clear_empties_queue() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		repo.enqueue("chat_send", "{}", 1).await.unwrap();
		repo.enqueue("image_upload", "{}", 3).await.unwrap();

		let removed = repo.clear().await.unwrap();
		assert_eq!(removed, 2);
		assert_eq!(repo.count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_mutations_notify_count() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);
		let mut counts = repo.subscribe_count();

		let id = repo.enqueue("chat_send", "{}", 1).await.unwrap();
		assert_eq!(counts.recv().await.unwrap(), 1);

		repo.enqueue("chat_send", "{}", 1).await.unwrap();
		assert_eq!(counts.recv().await.unwrap(), 2);

		repo.remove(id).await.unwrap();
		assert_eq!(counts.recv().await.unwrap(), 1);

		repo.clear().await.unwrap();
		assert_eq!(counts.recv().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_ids_are_not_reused_after_delete() {
		let pool = create_queue_test_pool().await;
		let repo = QueueRepository::new(pool);

		let first = repo.enqueue("chat_send", "{}", 1).await.unwrap();
		repo.remove(first).await.unwrap();
		let second = repo.enqueue("chat_send", "{}", 1).await.unwrap();

		assert!(second > first);
	}

	#[tokio::test]
	async fn test_items_survive_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("offline_queue.db").display());

		let pool = create_pool(&url).await.unwrap();
		let repo = QueueRepository::new(pool.clone());
		repo.initialize().await.unwrap();
		let id = repo
			.enqueue("chat_send", r#"{"text":"hello"}"#, 1)
			.await
			.unwrap();
		pool.close().await;

		let pool = create_pool(&url).await.unwrap();
		let repo = QueueRepository::new(pool);
		repo.initialize().await.unwrap();

		let items = repo.list_pending().await.unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].id, id);
		assert_eq!(items[0].payload, r#"{"text":"hello"}"#);
	}

	mod ordering_property {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#![proptest_config(ProptestConfig::with_cases(32))]

			/// For any insertion order across priority classes, the snapshot
			/// comes back sorted by (priority, created_at, id).
			#[test]
			fn prop_list_pending_is_totally_ordered(priorities in proptest::collection::vec(1i64..=3, 1..24)) {
				tokio_test::block_on(async {
					let pool = create_queue_test_pool().await;
					let repo = QueueRepository::new(pool);

					for p in &priorities {
						repo.enqueue("status_change", "{}", *p).await.unwrap();
					}

					let items = repo.list_pending().await.unwrap();
					assert_eq!(items.len(), priorities.len());
					for pair in items.windows(2) {
						let a = (pair[0].priority, pair[0].created_at, pair[0].id);
						let b = (pair[1].priority, pair[1].created_at, pair[1].id);
						assert!(a <= b);
					}
				});
			}
		}
	}
}
