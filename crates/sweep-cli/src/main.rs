// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Diagnostic CLI for the Sweep sync core.
//!
//! Composition root for development and field debugging: inspect and drain
//! the offline queue, enqueue test operations, and watch the live channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sweep_client_api::ApiClient;
use sweep_client_db::{create_pool, QueueRepository};
use sweep_client_live::{events_url, LiveChannel, LiveOptions};
use sweep_client_ops::StatusAction;
use sweep_client_sync::{spawn_drain_on_reconnect, SyncEvent, SyncService};
use sweep_common_secret::SecretString;

/// Sweep sync core - offline queue and live channel diagnostics.
#[derive(Parser, Debug)]
#[command(name = "sweep", about = "Sweep sync core diagnostics", version)]
struct Args {
	/// Path to an alternate config file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Session cookie used to authenticate against the server
	#[arg(long, global = true, env = "SWEEP_SESSION")]
	session: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Inspect the offline queue
	Queue {
		#[command(subcommand)]
		command: QueueCommand,
	},
	/// Replay all pending operations now
	Drain,
	/// Enqueue a test operation
	Enqueue {
		#[command(subcommand)]
		command: EnqueueCommand,
	},
	/// Connect the live channel, drain on reconnect, and log events
	Watch,
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
	/// List pending items in drain order
	List,
	/// Print the number of pending items
	Count,
	/// Discard all pending items
	Clear,
}

#[derive(Subcommand, Debug)]
enum EnqueueCommand {
	/// Queue a chat message
	Chat {
		text: String,
		#[arg(long, default_value = "admin")]
		to: String,
	},
	/// Queue a task status change
	Status {
		#[arg(long)]
		task: i64,
		#[arg(long, value_enum)]
		action: StatusActionArg,
	},
	/// Queue a checklist toggle
	Checklist {
		#[arg(long)]
		task: i64,
		#[arg(long)]
		item: i64,
		#[arg(long)]
		completed: bool,
	},
	/// Queue a notes update
	Notes {
		#[arg(long)]
		task: i64,
		notes: String,
	},
	/// Queue an image upload from a file
	Image {
		#[arg(long)]
		task: i64,
		file: PathBuf,
		#[arg(long)]
		note: Option<String>,
	},
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusActionArg {
	Start,
	Stop,
}

impl From<StatusActionArg> for StatusAction {
	fn from(value: StatusActionArg) -> Self {
		match value {
			StatusActionArg::Start => StatusAction::Start,
			StatusActionArg::Stop => StatusAction::Stop,
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => sweep_client_config::load_config_with_file(path)?,
		None => sweep_client_config::load_config()?,
	};

	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.init();

	tracing::info!(
			server = %config.server.base_url,
			database = %config.database.url,
			"starting sweep"
	);

	std::fs::create_dir_all(&config.paths.data_dir)
		.with_context(|| format!("creating data dir {}", config.paths.data_dir.display()))?;

	let pool = create_pool(&config.database.url).await?;
	let repo = Arc::new(QueueRepository::new(pool));
	repo.initialize().await?;

	let session = args.session.map(SecretString::new);
	let mut api = ApiClient::new(&config.server.base_url)?;
	if let Some(session) = session.clone() {
		api = api.with_session(session);
	}

	let service = Arc::new(
		SyncService::new(repo.clone(), Arc::new(api))
			.with_item_delay(Duration::from_millis(config.drain.item_delay_ms)),
	);

	match args.command {
		Command::Queue { command } => match command {
			QueueCommand::List => {
				let items = repo.list_pending().await?;
				if items.is_empty() {
					println!("queue is empty");
				}
				for item in items {
					println!(
						"#{} {} priority={} retries={} created={}{}",
						item.id,
						item.operation_kind,
						item.priority,
						item.retry_count,
						item.created_at.to_rfc3339(),
						item
							.last_error
							.map(|e| format!(" last_error={e}"))
							.unwrap_or_default()
					);
				}
			}
			QueueCommand::Count => {
				println!("{}", service.pending_count().await?);
			}
			QueueCommand::Clear => {
				let removed = service.clear_all().await?;
				println!("discarded {removed} pending item(s)");
			}
		},
		Command::Drain => {
			let outcome = service.drain_now().await?;
			println!("{outcome:?}");
		}
		Command::Enqueue { command } => {
			let id = match command {
				EnqueueCommand::Chat { text, to } => {
					service.enqueue_chat_message(&text, &to).await?
				}
				EnqueueCommand::Status { task, action } => {
					service
						.enqueue_status_change(task, action.into(), None)
						.await?
				}
				EnqueueCommand::Checklist {
					task,
					item,
					completed,
				} => {
					service
						.enqueue_checklist_toggle(task, item, completed)
						.await?
				}
				EnqueueCommand::Notes { task, notes } => {
					service.enqueue_notes_update(task, &notes).await?
				}
				EnqueueCommand::Image { task, file, note } => {
					let image = tokio::fs::read(&file)
						.await
						.with_context(|| format!("reading {}", file.display()))?;
					let file_name = file
						.file_name()
						.map(|n| n.to_string_lossy().into_owned())
						.unwrap_or_else(|| "offline_image.jpg".to_string());
					service
						.enqueue_image_upload(task, image, &file_name, note.as_deref())
						.await?
				}
			};
			println!("queued as #{id}");
		}
		Command::Watch => watch(&config, session, service).await?,
	}

	Ok(())
}

/// Run the live channel until Ctrl-C, draining the queue on every
/// reconnect and logging push messages and sync events.
async fn watch(
	config: &sweep_client_config::SweepConfig,
	session: Option<SecretString>,
	service: Arc<SyncService>,
) -> anyhow::Result<()> {
	let options = LiveOptions {
		url: events_url(&config.server.base_url)?,
		connect_timeout: Duration::from_secs(config.live.connect_timeout_secs),
		initial_reconnect_delay: Duration::from_millis(config.live.initial_reconnect_delay_ms),
		max_reconnect_delay: Duration::from_millis(config.live.max_reconnect_delay_ms),
	};

	let live = LiveChannel::new(options, session);
	let mut messages = live.subscribe_messages();
	let mut events = service.subscribe_events();
	let mut counts = service.subscribe_count();

	let drain_task = spawn_drain_on_reconnect(service, &live);
	live.connect().await;

	loop {
		tokio::select! {
			message = messages.recv() => {
				if let Ok(message) = message {
					println!("push {} {}", message.kind, message.data);
				}
			}
			event = events.recv() => {
				match event {
					Ok(SyncEvent::ItemSynced(item)) => {
						println!("synced #{} {}", item.id, item.operation_kind);
					}
					Ok(SyncEvent::ItemSyncFailed { item, error }) => {
						println!("failed #{} {}: {error}", item.id, item.operation_kind);
					}
					Ok(SyncEvent::ItemDiscarded { item, reason }) => {
						println!("discarded #{} {}: {reason}", item.id, item.operation_kind);
					}
					Err(_) => {}
				}
			}
			count = counts.recv() => {
				if let Ok(count) = count {
					println!("pending: {count}");
				}
			}
			_ = tokio::signal::ctrl_c() => {
				println!("shutting down");
				break;
			}
		}
	}

	drain_task.abort();
	live.disconnect().await;
	Ok(())
}
