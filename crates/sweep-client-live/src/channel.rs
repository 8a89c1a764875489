// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use sweep_common_secret::SecretString;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::backoff::reconnect_delay;
use crate::error::Result;

/// Connection lifecycle of the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
	Disconnected,
	Connecting,
	Connected,
	ShuttingDown,
}

impl ChannelState {
	fn as_u8(self) -> u8 {
		match self {
			ChannelState::Disconnected => 0,
			ChannelState::Connecting => 1,
			ChannelState::Connected => 2,
			ChannelState::ShuttingDown => 3,
		}
	}

	fn from_u8(value: u8) -> Self {
		match value {
			1 => ChannelState::Connecting,
			2 => ChannelState::Connected,
			3 => ChannelState::ShuttingDown,
			_ => ChannelState::Disconnected,
		}
	}
}

/// A push notification received over the live channel.
///
/// `kind` is the server's `type` discriminator (`chat_message`,
/// `task_update`, ...); `data` is the full message document.
#[derive(Debug, Clone)]
pub struct PushMessage {
	pub kind: String,
	pub data: serde_json::Value,
}

/// Tunables for the live channel.
#[derive(Debug, Clone)]
pub struct LiveOptions {
	/// WebSocket endpoint, e.g. `wss://app.sweephq.com/ws/events/`.
	pub url: Url,
	/// Bound on a single connection attempt.
	pub connect_timeout: Duration,
	/// First reconnect delay.
	pub initial_reconnect_delay: Duration,
	/// Reconnect delay ceiling.
	pub max_reconnect_delay: Duration,
}

impl LiveOptions {
	/// Derive the live channel endpoint from the API base URL.
	pub fn from_base_url(base_url: &str) -> Result<Self> {
		Ok(Self {
			url: events_url(base_url)?,
			connect_timeout: Duration::from_secs(10),
			initial_reconnect_delay: Duration::from_secs(1),
			max_reconnect_delay: Duration::from_secs(30),
		})
	}
}

/// Map the HTTP base URL onto the WebSocket endpoint.
pub fn events_url(base_url: &str) -> Result<Url> {
	let mut url = Url::parse(base_url)?.join("ws/events/")?;
	match url.scheme() {
		"http" => url.set_scheme("ws").unwrap(),
		"https" => url.set_scheme("wss").unwrap(),
		_ => {}
	}
	Ok(url)
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

enum ConnectOutcome {
	Connected(Box<WsStream>),
	Failed,
	Shutdown,
}

struct Inner {
	options: LiveOptions,
	session: Option<SecretString>,
	state: AtomicU8,
	online: AtomicBool,
	// durable shutdown flag: the broadcast signal only wakes await points,
	// this is what the supervisor consults between them
	shutdown: AtomicBool,
	message_tx: broadcast::Sender<PushMessage>,
	status_tx: broadcast::Sender<bool>,
	shutdown_tx: broadcast::Sender<()>,
	background_tx: watch::Sender<bool>,
}

impl Inner {
	fn set_state(&self, state: ChannelState) {
		self.state.store(state.as_u8(), Ordering::SeqCst);
	}

	fn state(&self) -> ChannelState {
		ChannelState::from_u8(self.state.load(Ordering::SeqCst))
	}

	fn is_shutting_down(&self) -> bool {
		self.shutdown.load(Ordering::SeqCst)
	}

	/// Publish the online flag, emitting a status event only on edges.
	/// Duplicate signals in the same direction are suppressed, so
	/// subscribers see exactly one event per transition.
	fn set_online(&self, online: bool) {
		let was = self.online.swap(online, Ordering::SeqCst);
		if was != online {
			let _ = self.status_tx.send(online);
		}
	}
}

/// The persistent connection to the server.
///
/// One socket carries push notifications and doubles as the online/offline
/// signal: the channel is "online" exactly while the socket is connected.
pub struct LiveChannel {
	inner: Arc<Inner>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl LiveChannel {
	pub fn new(options: LiveOptions, session: Option<SecretString>) -> Self {
		let (message_tx, _) = broadcast::channel(256);
		let (status_tx, _) = broadcast::channel(16);
		let (shutdown_tx, _) = broadcast::channel(1);
		let (background_tx, _) = watch::channel(false);
		Self {
			inner: Arc::new(Inner {
				options,
				session,
				state: AtomicU8::new(ChannelState::Disconnected.as_u8()),
				online: AtomicBool::new(false),
				shutdown: AtomicBool::new(false),
				message_tx,
				status_tx,
				shutdown_tx,
				background_tx,
			}),
			handle: Mutex::new(None),
		}
	}

	/// Start the connection supervisor. A second call while it is running is
	/// a no-op. A channel that was shut down stays down.
	pub async fn connect(&self) {
		if self.inner.is_shutting_down() {
			warn!("live channel already shut down, refusing to reconnect");
			return;
		}

		let mut handle = self.handle.lock().await;
		if handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
			debug!("live channel supervisor already running");
			return;
		}

		let inner = Arc::clone(&self.inner);
		*handle = Some(tokio::spawn(run_supervisor(inner)));
	}

	/// Shut the channel down: cancel any in-flight connect attempt and the
	/// read loop, close the socket, and do not reconnect.
	pub async fn disconnect(&self) {
		self.inner.shutdown.store(true, Ordering::SeqCst);
		self.inner.set_state(ChannelState::ShuttingDown);
		let _ = self.inner.shutdown_tx.send(());

		let mut handle = self.handle.lock().await;
		if let Some(handle) = handle.take() {
			let _ = handle.await;
		}
		self.inner.set_online(false);
		info!("live channel shut down");
	}

	/// Defer reconnection while the app is backgrounded. Reconnection (and
	/// the online signal) resumes when the flag clears.
	pub fn set_background(&self, background: bool) {
		let _ = self.inner.background_tx.send(background);
	}

	pub fn is_online(&self) -> bool {
		self.inner.online.load(Ordering::SeqCst)
	}

	pub fn state(&self) -> ChannelState {
		self.inner.state()
	}

	/// Incoming push messages, in arrival order.
	pub fn subscribe_messages(&self) -> broadcast::Receiver<PushMessage> {
		self.inner.message_tx.subscribe()
	}

	/// Online/offline transitions. Edges only: one event per transition.
	pub fn subscribe_status(&self) -> broadcast::Receiver<bool> {
		self.inner.status_tx.subscribe()
	}
}

async fn run_supervisor(inner: Arc<Inner>) {
	let mut shutdown_rx = inner.shutdown_tx.subscribe();
	let mut attempt: u32 = 0;

	loop {
		if inner.is_shutting_down() {
			break;
		}

		inner.set_state(ChannelState::Connecting);
		match connect_once(&inner, &mut shutdown_rx).await {
			ConnectOutcome::Connected(stream) => {
				attempt = 0;
				inner.set_state(ChannelState::Connected);
				inner.set_online(true);
				info!(url = %inner.options.url, "live channel connected");

				read_loop(&inner, *stream, &mut shutdown_rx).await;

				if !inner.is_shutting_down() {
					inner.set_state(ChannelState::Disconnected);
				}
				inner.set_online(false);
			}
			ConnectOutcome::Failed => {
				inner.set_state(ChannelState::Disconnected);
			}
			ConnectOutcome::Shutdown => break,
		}

		if inner.is_shutting_down() {
			break;
		}

		if wait_while_backgrounded(&inner, &mut shutdown_rx).await.is_err() {
			break;
		}

		attempt += 1;
		let delay = reconnect_delay(
			attempt,
			inner.options.initial_reconnect_delay,
			inner.options.max_reconnect_delay,
		);
		debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");

		tokio::select! {
			_ = tokio::time::sleep(delay) => {}
			_ = shutdown_rx.recv() => break,
		}
	}

	inner.set_state(ChannelState::ShuttingDown);
	inner.set_online(false);
}

async fn connect_once(
	inner: &Arc<Inner>,
	shutdown_rx: &mut broadcast::Receiver<()>,
) -> ConnectOutcome {
	let mut request = match inner.options.url.as_str().into_client_request() {
		Ok(request) => request,
		Err(e) => {
			warn!(error = %e, "failed to build live channel request");
			return ConnectOutcome::Failed;
		}
	};
	if let Some(session) = &inner.session {
		match session.expose().parse() {
			Ok(value) => {
				request.headers_mut().insert("Cookie", value);
			}
			Err(_) => warn!("session cookie is not a valid header value"),
		}
	}

	tokio::select! {
		result = timeout(inner.options.connect_timeout, connect_async(request)) => {
			match result {
				Ok(Ok((stream, _))) => ConnectOutcome::Connected(Box::new(stream)),
				Ok(Err(e)) => {
					warn!(error = %e, "live channel connection failed");
					ConnectOutcome::Failed
				}
				Err(_) => {
					warn!(
						timeout_secs = inner.options.connect_timeout.as_secs(),
						"live channel connection timed out"
					);
					ConnectOutcome::Failed
				}
			}
		}
		_ = shutdown_rx.recv() => ConnectOutcome::Shutdown,
	}
}

/// Single reader: incoming frames are processed strictly in arrival order.
async fn read_loop(
	inner: &Arc<Inner>,
	stream: WsStream,
	shutdown_rx: &mut broadcast::Receiver<()>,
) {
	let (mut write, mut read) = stream.split();

	loop {
		tokio::select! {
			message = read.next() => {
				match message {
					Some(Ok(Message::Text(text))) => dispatch_message(inner, &text),
					Some(Ok(Message::Ping(data))) => {
						if write.send(Message::Pong(data)).await.is_err() {
							break;
						}
					}
					Some(Ok(Message::Close(_))) => {
						debug!("live channel closed by server");
						break;
					}
					Some(Ok(_)) => {}
					Some(Err(e)) => {
						warn!(error = %e, "live channel read error");
						break;
					}
					None => {
						debug!("live channel stream ended");
						break;
					}
				}
			}
			_ = shutdown_rx.recv() => {
				let _ = write.send(Message::Close(None)).await;
				break;
			}
		}
	}
}

fn dispatch_message(inner: &Arc<Inner>, text: &str) {
	let value: serde_json::Value = match serde_json::from_str(text) {
		Ok(value) => value,
		Err(e) => {
			warn!(error = %e, "discarding unparseable push message");
			return;
		}
	};

	let kind = value
		.get("type")
		.and_then(|t| t.as_str())
		.unwrap_or("update")
		.to_string();

	debug!(kind = %kind, "push message received");
	let _ = inner.message_tx.send(PushMessage { kind, data: value });
}

/// Block while the app is backgrounded; reconnection is deferred, not
/// abandoned. Returns `Err` on shutdown.
async fn wait_while_backgrounded(
	inner: &Arc<Inner>,
	shutdown_rx: &mut broadcast::Receiver<()>,
) -> std::result::Result<(), ()> {
	let mut background_rx = inner.background_tx.subscribe();
	while *background_rx.borrow() {
		debug!("app backgrounded, deferring reconnect");
		tokio::select! {
			changed = background_rx.changed() => {
				if changed.is_err() {
					return Ok(());
				}
			}
			_ = shutdown_rx.recv() => return Err(()),
		}
	}
	Ok(())
}
