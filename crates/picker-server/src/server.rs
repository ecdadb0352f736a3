//! Picker channel server.
//!
//! Listens on a TCP port, upgrades HTTP GET `/channel` to WebSocket, and
//! keeps a single surface connection at a time. Upgrades must carry the
//! session token and come from the page's origin.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};

use ezupload_protocol::constants::{CHANNEL_PATH, WS_MAX_MESSAGE_SIZE};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::connection::{self, PickerConnection};
use crate::handler::Handler;
use crate::token::{SessionToken, authorize_upgrade};

/// Listener configuration shared by the page and channel servers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: IpAddr,
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }
}

/// The picker WebSocket server.
///
/// Manages a single surface connection at a time and dispatches messages
/// to the provided [`Handler`].
pub struct PickerServer<H: Handler> {
    handler: Arc<H>,
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    conn: Mutex<Option<PickerConnection>>,
    cancel: CancellationToken,
    token: SessionToken,
    page_port: OnceLock<u16>,
}

impl<H: Handler> PickerServer<H> {
    /// Binds the listening socket.
    ///
    /// The address is known as soon as this returns, so the page can be
    /// rendered before [`run`](Self::run) starts accepting.
    pub async fn bind(config: ServerConfig, handler: H) -> Result<Arc<Self>, ServerError> {
        let listener = TcpListener::bind(SocketAddr::new(config.bind, config.port)).await?;
        let local_addr = listener.local_addr()?;
        tracing::debug!("picker channel bound on {local_addr}");

        Ok(Arc::new(Self {
            handler: Arc::new(handler),
            listener: Mutex::new(Some(listener)),
            local_addr,
            conn: Mutex::new(None),
            cancel: CancellationToken::new(),
            token: SessionToken::generate(),
            page_port: OnceLock::new(),
        }))
    }

    /// Returns the local address the server listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the listening port.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the token the page must present when it connects.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    /// Accepts upgrades whose `Origin` is the page served on `port`.
    ///
    /// Until this is called every upgrade is refused. Later calls are
    /// ignored.
    pub fn allow_page_port(&self, port: u16) {
        if self.page_port.set(port).is_err() {
            tracing::warn!(port, "page port already set, ignoring");
        }
    }

    /// Returns the handler shared with every connection.
    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    /// Returns `true` if a surface is currently connected.
    pub async fn has_picker(&self) -> bool {
        let lock = self.conn.lock().await;
        match lock.as_ref() {
            Some(conn) => conn.sender().is_connected(),
            None => false,
        }
    }

    /// Returns the sender for the current surface connection, if any.
    pub async fn picker_sender(&self) -> Option<connection::Sender> {
        self.conn.lock().await.as_ref().map(|c| c.sender())
    }

    /// Closes the current surface connection (if any) after flushing
    /// queued replies.
    pub async fn disconnect_picker(&self) {
        let old = self.conn.lock().await.take();
        if let Some(conn) = old {
            conn.close_and_wait().await;
        }
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Accepts connections until [`shutdown`](Self::shutdown).
    ///
    /// Can only be called once per bound server.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .ok_or(ServerError::AlreadyRunning)?;
        tracing::info!("picker channel listening on {}", self.local_addr);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("picker channel shutting down");
                    self.disconnect_picker().await;
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    tracing::error!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Upgrades one TCP connection and installs it as the surface session.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let page_port = self.page_port.get().copied();
        let check = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            check_channel_path(req)?;
            authorize_upgrade(req, &self.token, page_port)
                .map_err(|status| error_response(status, status.canonical_reason().unwrap_or("rejected")))?;
            Ok(resp)
        };
        let ws_stream = accept_hdr_async_with_config(stream, check, Some(ws_config)).await?;
        tracing::info!(%peer_addr, "surface connected");

        // Wait for the old session's disconnect callback before the new
        // one starts, so it cannot clobber state the new session set up.
        {
            let old = self.conn.lock().await.take();
            if let Some(conn) = old {
                if conn.sender().is_connected() {
                    tracing::info!(%peer_addr, "replacing active surface connection");
                } else {
                    tracing::debug!("clearing stale surface connection");
                }
                conn.close_and_wait().await;
            }
        }

        let conn = connection::spawn_connection(
            ws_stream,
            peer_addr,
            Arc::clone(&self.handler),
            self.cancel.clone(),
        );

        let mut lock = self.conn.lock().await;
        // Another task may have connected between the take above and now.
        if lock.as_ref().is_some_and(|c| c.sender().is_connected()) {
            conn.close();
            return Err(ServerError::PickerAlreadyConnected);
        }
        *lock = Some(conn);

        Ok(())
    }
}

fn check_channel_path(req: &Request) -> Result<(), ErrorResponse> {
    if req.uri().path() == CHANNEL_PATH {
        return Ok(());
    }
    tracing::warn!(path = %req.uri().path(), "rejecting upgrade on unknown path");
    Err(error_response(StatusCode::NOT_FOUND, "not found"))
}

fn error_response(status: StatusCode, body: &str) -> ErrorResponse {
    let mut err = ErrorResponse::new(Some(body.to_string()));
    *err.status_mut() = status;
    err
}
