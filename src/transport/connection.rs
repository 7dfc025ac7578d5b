//! WebSocket connection and event loop.
//!
//! Owns the client side of the WebDriver BiDi socket, correlating
//! responses to requests by integer id.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from Firefox (responses, events)
//! - Outgoing commands from the Rust API
//! - Request/response correlation by id
//! - Failing every pending request once the socket goes away

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Command, Event, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending requests before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

/// Timeout for the WebSocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Response>>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for response.
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a Firefox BiDi endpoint.
///
/// Cloning is cheap; all clones feed the same event loop. The loop stops
/// on [`Connection::shutdown`] or when the remote end closes the socket.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
        }
    }
}

impl Connection {
    /// Connects to a BiDi session endpoint such as `ws://127.0.0.1:9222/session`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake does not finish in time
    /// - [`Error::WebSocket`] if the handshake is rejected
    pub async fn connect(ws_url: &str) -> Result<Self> {
        debug!(url = %ws_url, "Connecting to BiDi endpoint");

        let (ws_stream, _) = timeout(CONNECT_TIMEOUT, connect_async(ws_url))
            .await
            .map_err(|_| Error::connection_timeout(CONNECT_TIMEOUT.as_millis() as u64))??;

        Ok(Self::new(ws_stream))
    }

    /// Wraps an established stream and spawns the event loop.
    fn new(ws_stream: WsStream) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
        ));

        Self {
            command_tx,
            correlation,
        }
    }

    /// Sends a command and waits for its result with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    /// - [`Error::Remote`] if Firefox answered with an error
    pub async fn send(&self, command: Command) -> Result<serde_json::Value> {
        self.send_with_timeout(command, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a command and waits for its result with a custom timeout.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`], plus [`Error::Protocol`] when too many
    /// requests are already in flight.
    pub async fn send_with_timeout(
        &self,
        command: Command,
        request_timeout: Duration,
    ) -> Result<serde_json::Value> {
        let method = command.method();
        let request = Request::new(command);
        let request_id = request.id;

        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_REQUESTS {
                warn!(
                    pending = correlation.len(),
                    max = MAX_PENDING_REQUESTS,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    MAX_PENDING_REQUESTS
                )));
            }
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        trace!(%request_id, method, "Awaiting response");

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result?.into_result(),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Closes the socket and stops the event loop.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, response_tx }) => {
                            Self::handle_send_command(
                                request,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Routes an incoming text frame to its waiting caller.
    fn handle_incoming_message(text: &str, correlation: &Arc<Mutex<CorrelationMap>>) {
        if let Ok(response) = from_str::<Response>(text) {
            let Some(id) = response.id else {
                warn!(
                    error = response.error.as_deref().unwrap_or_default(),
                    message = response.message.as_deref().unwrap_or_default(),
                    "Unattributed error from remote end"
                );
                return;
            };

            match correlation.lock().remove(&id) {
                Some(tx) => {
                    let _ = tx.send(Ok(response));
                }
                None => warn!(%id, "Response for unknown request"),
            }
            return;
        }

        if let Ok(event) = from_str::<Event>(text) {
            trace!(method = %event.method, "Ignoring event");
            return;
        }

        warn!(len = text.len(), "Failed to parse incoming message");
    }

    /// Serializes and writes a request, registering its correlation first.
    async fn handle_send_command(
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
        ws_write: &mut SplitSink<WsStream, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        correlation.lock().insert(request_id, response_tx);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await
            && let Some(tx) = correlation.lock().remove(&request_id)
        {
            let _ = tx.send(Err(Error::connection(e.to_string())));
        }

        trace!(%request_id, "Request sent");
    }

    /// Fails all pending requests with ConnectionClosed error.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
