// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

pub async fn create_test_pool() -> SqlitePool {
	SqlitePool::connect(":memory:").await.unwrap()
}

pub async fn create_queue_items_table(pool: &SqlitePool) {
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
	.execute(pool)
	.await
	.unwrap();

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_queue_items_drain_order ON queue_items(priority, created_at, id)",
	)
	.execute(pool)
	.await
	.unwrap();
}

pub async fn create_queue_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_queue_items_table(&pool).await;
	pool
}
