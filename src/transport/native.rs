//! Host backed by a real WebSocket client.
//!
//! [`NativeHost`] gives the adapter a platform-style global socket API on
//! top of `tokio-tungstenite`. It keeps one socket at a time; each socket
//! runs in its own event loop task and reports through the registered
//! global callbacks.
//!
//! # Event Loop
//!
//! | Socket activity | Callback |
//! |-----------------|----------|
//! | Handshake completed | open |
//! | Text/Binary frame | message |
//! | Close frame | close (clean) |
//! | Socket error | error, then close 1006 |
//! | Stream ended | close 1006 |
//!
//! Only `ws://` is supported out of the box: the crate enables no TLS
//! backend, so `wss://` handshakes fail and are reported via `on_failure`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{
    ConnectRequest, HostCloseEvent, HostErrorEvent, HostMessageEvent, MessageData,
};

use super::{
    CloseHandler, ErrorHandler, FailureCallback, HostHandlers, HostTransport, MessageHandler,
    OpenHandler,
};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the opening handshake.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Close code reported when the socket went away without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported when a close frame carried no status.
const NO_STATUS_RECEIVED: u16 = 1005;

/// Prefix for host error descriptions of failed connects.
const CONNECT_FAIL: &str = "connectSocket:fail";

// ============================================================================
// NativeHostOptions
// ============================================================================

/// Configuration for [`NativeHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeHostOptions {
    /// Maximum time for the opening handshake.
    pub connect_timeout: Duration,

    /// Answer to the subprotocol capability query.
    pub supports_protocols: bool,
}

impl Default for NativeHostOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeHostOptions {
    /// Creates options with a 30s connect timeout and subprotocol support.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            supports_protocols: true,
        }
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets whether subprotocols are advertised.
    #[inline]
    #[must_use]
    pub fn with_protocol_support(mut self, supported: bool) -> Self {
        self.supports_protocols = supported;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::invalid_argument(
                "connect timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SocketCommand
// ============================================================================

/// Internal commands for a socket's event loop.
enum SocketCommand {
    /// Send a frame.
    Send(MessageData),
    /// Start the closing handshake.
    Close,
    /// Drop the socket without reporting anything.
    Shutdown,
}

// ============================================================================
// Callbacks
// ============================================================================

/// Routes socket activity to the global handlers.
///
/// A socket reports only while its generation is the host's current one,
/// so a replaced socket cannot fire callbacks meant for its successor.
#[derive(Clone)]
struct Callbacks {
    handlers: Arc<Mutex<HostHandlers>>,
    current_generation: Arc<AtomicU64>,
    generation: u64,
}

impl Callbacks {
    fn is_current(&self) -> bool {
        self.current_generation.load(Ordering::SeqCst) == self.generation
    }

    fn open(&self) {
        let handler = self.handlers.lock().open.clone();
        if self.is_current()
            && let Some(handler) = handler
        {
            handler();
        }
    }

    fn error(&self, event: HostErrorEvent) {
        let handler = self.handlers.lock().error.clone();
        if self.is_current()
            && let Some(handler) = handler
        {
            handler(event);
        }
    }

    fn message(&self, event: HostMessageEvent) {
        let handler = self.handlers.lock().message.clone();
        if self.is_current()
            && let Some(handler) = handler
        {
            handler(event);
        }
    }

    fn close(&self, event: HostCloseEvent) {
        let handler = self.handlers.lock().close.clone();
        if self.is_current()
            && let Some(handler) = handler
        {
            handler(event);
        }
    }
}

// ============================================================================
// NativeHost
// ============================================================================

/// Host transport performing real WebSocket I/O.
///
/// Must be used from within a tokio runtime; connects made outside one are
/// reported through `on_failure`.
pub struct NativeHost {
    /// Host configuration.
    options: NativeHostOptions,
    /// Registered global handlers (shared with socket loops).
    handlers: Arc<Mutex<HostHandlers>>,
    /// Generation of the current socket.
    generation: Arc<AtomicU64>,
    /// Command channel of the current socket.
    current: Mutex<Option<mpsc::UnboundedSender<SocketCommand>>>,
}

impl Default for NativeHost {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// NativeHost - Constructors
// ============================================================================

impl NativeHost {
    /// Creates a host with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::build(NativeHostOptions::new())
    }

    /// Creates a host with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the options are invalid.
    pub fn with_options(options: NativeHostOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: NativeHostOptions) -> Self {
        Self {
            options,
            handlers: Arc::new(Mutex::new(HostHandlers::default())),
            generation: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
        }
    }

    /// Returns the host options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &NativeHostOptions {
        &self.options
    }
}

// ============================================================================
// NativeHost - Socket Loop
// ============================================================================

impl NativeHost {
    /// Parses and checks a socket URL.
    fn parse_url(raw: &str) -> Result<Url> {
        let url = Url::parse(raw)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(Error::invalid_argument(format!(
                "unsupported url scheme: {other}"
            ))),
        }
    }

    /// Builds the handshake request, listing subprotocols if any.
    fn build_request(url: &Url, protocols: &[String]) -> Result<Request> {
        let mut request = url.as_str().into_client_request()?;
        if !protocols.is_empty() {
            let value = HeaderValue::from_str(&protocols.join(", "))
                .map_err(|e| Error::invalid_argument(format!("invalid subprotocol: {e}")))?;
            request
                .headers_mut()
                .insert("Sec-WebSocket-Protocol", value);
        }
        Ok(request)
    }

    /// Converts a payload into a frame.
    fn to_frame(data: MessageData) -> Message {
        match data {
            MessageData::Text(text) => Message::Text(text.into()),
            MessageData::Binary(bytes) => Message::Binary(bytes.into()),
        }
    }

    /// Connects and runs the socket until it closes or is replaced.
    async fn run_socket(
        url: Url,
        protocols: Vec<String>,
        connect_timeout: Duration,
        callbacks: Callbacks,
        mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
        on_failure: FailureCallback,
    ) {
        let request = match Self::build_request(&url, &protocols) {
            Ok(request) => request,
            Err(e) => {
                on_failure(HostErrorEvent::new(CONNECT_FAIL, e.to_string()));
                return;
            }
        };

        let ws_stream = match timeout(connect_timeout, connect_async(request)).await {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => {
                debug!(url = %url, error = %e, "Handshake failed");
                on_failure(HostErrorEvent::new(CONNECT_FAIL, e.to_string()));
                return;
            }
            Err(_) => {
                debug!(url = %url, "Handshake timed out");
                let error = Error::transport(format!(
                    "handshake timed out after {}ms",
                    connect_timeout.as_millis()
                ));
                on_failure(HostErrorEvent::new(CONNECT_FAIL, error.to_string()));
                return;
            }
        };

        info!(url = %url, generation = callbacks.generation, "Native socket connected");
        callbacks.open();

        let origin = url.origin().ascii_serialization();
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Text frame received");
                            callbacks.message(
                                HostMessageEvent::new(text.to_string()).with_origin(origin.clone()),
                            );
                        }

                        Some(Ok(Message::Binary(bytes))) => {
                            trace!(len = bytes.len(), "Binary frame received");
                            callbacks.message(
                                HostMessageEvent::new(bytes.to_vec()).with_origin(origin.clone()),
                            );
                        }

                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (u16::from(f.code), f.reason.to_string()))
                                .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                            debug!(code, reason = %reason, "Close frame received");
                            callbacks.close(HostCloseEvent::new(code, reason, true));
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            callbacks.error(HostErrorEvent::new("onSocketError", e.to_string()));
                            callbacks.close(HostCloseEvent::new(ABNORMAL_CLOSURE, e.to_string(), false));
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            callbacks.close(HostCloseEvent::new(ABNORMAL_CLOSURE, "", false));
                            break;
                        }

                        // Ignore Ping, Pong, raw frames
                        _ => {}
                    }
                }

                // Commands from the host API
                command = command_rx.recv() => {
                    match command {
                        Some(SocketCommand::Send(data)) => {
                            if let Err(e) = ws_write.send(Self::to_frame(data)).await {
                                warn!(error = %e, "Failed to send frame");
                            }
                        }

                        Some(SocketCommand::Close) => {
                            let frame = CloseFrame {
                                code: CloseCode::Normal,
                                reason: String::new().into(),
                            };
                            if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
                                warn!(error = %e, "Failed to send close frame");
                            }
                        }

                        Some(SocketCommand::Shutdown) | None => {
                            debug!(generation = callbacks.generation, "Socket replaced, shutting down");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!(generation = callbacks.generation, "Socket loop terminated");
    }
}

// ============================================================================
// HostTransport Implementation
// ============================================================================

impl HostTransport for NativeHost {
    fn supports_protocols(&self) -> bool {
        self.options.supports_protocols
    }

    fn connect_socket(&self, request: ConnectRequest, on_failure: FailureCallback) {
        let url = match Self::parse_url(&request.url) {
            Ok(url) => url,
            Err(e) => {
                on_failure(HostErrorEvent::new(CONNECT_FAIL, e.to_string()));
                return;
            }
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = Error::transport(format!("no async runtime: {e}"));
                on_failure(HostErrorEvent::new(CONNECT_FAIL, error.to_string()));
                return;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        if let Some(previous) = self.current.lock().replace(command_tx) {
            let _ = previous.send(SocketCommand::Shutdown);
        }

        let callbacks = Callbacks {
            handlers: Arc::clone(&self.handlers),
            current_generation: Arc::clone(&self.generation),
            generation,
        };

        debug!(url = %url, generation, "Native socket connecting");

        runtime.spawn(Self::run_socket(
            url,
            request.protocols,
            self.options.connect_timeout,
            callbacks,
            command_rx,
            on_failure,
        ));
    }

    fn send_socket_message(&self, data: MessageData) {
        let current = self.current.lock();
        match current.as_ref() {
            Some(tx) => {
                if tx.send(SocketCommand::Send(data)).is_err() {
                    warn!("Send on a socket that already terminated");
                }
            }
            None => warn!("Send with no socket connected"),
        }
    }

    fn close_socket(&self) {
        let current = self.current.lock();
        match current.as_ref() {
            Some(tx) => {
                if tx.send(SocketCommand::Close).is_err() {
                    debug!("Close on a socket that already terminated");
                }
            }
            None => debug!("Close with no socket connected"),
        }
    }

    fn on_socket_open(&self, handler: OpenHandler) {
        self.handlers.lock().open = Some(handler);
    }

    fn on_socket_error(&self, handler: ErrorHandler) {
        self.handlers.lock().error = Some(handler);
    }

    fn on_socket_message(&self, handler: MessageHandler) {
        self.handlers.lock().message = Some(handler);
    }

    fn on_socket_close(&self, handler: CloseHandler) {
        self.handlers.lock().close = Some(handler);
    }
}

// ============================================================================
// Tests
// ============================================================================
