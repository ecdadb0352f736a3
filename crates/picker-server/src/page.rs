//! HTTP server for the picker page.

use std::net::SocketAddr;

use axum::Router;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use ezupload_protocol::constants::{CHANNEL_PATH, SUCCESS_INDICATOR};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::server::ServerConfig;
use crate::token::TOKEN_PARAM;

const PAGE_TEMPLATE: &str = include_str!("../assets/picker.html");

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; connect-src 'self' ws: wss:; img-src 'self' data:; object-src 'none'; base-uri 'none'; frame-ancestors 'none'";

fn hardening_headers() -> [(header::HeaderName, &'static str); 4] {
    [
        (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::REFERRER_POLICY, "no-referrer"),
    ]
}

/// Renders the page pointing its channel at `channel_port`, authenticated
/// with `token`.
pub fn render_page(channel_port: u16, token: &str) -> String {
    PAGE_TEMPLATE
        .replace("__CHANNEL_PORT__", &channel_port.to_string())
        .replace("__CHANNEL_PATH__", CHANNEL_PATH)
        .replace("__TOKEN_PARAM__", TOKEN_PARAM)
        .replace("__CHANNEL_TOKEN__", token)
        .replace(
            "__SUCCESS_INDICATOR_MS__",
            &SUCCESS_INDICATOR.as_millis().to_string(),
        )
}

fn router(page: String) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(
            "/",
            get(move || {
                let page = page.clone();
                async move { (hardening_headers(), Html(page)).into_response() }
            }),
        )
}

/// Serves the picker page until cancelled.
pub struct PageServer {
    listener: TcpListener,
    page: String,
}

impl PageServer {
    /// Binds the page listener. `channel_port` and `token` come from the
    /// [`PickerServer`](crate::PickerServer) the page connects to.
    pub async fn bind(
        config: &ServerConfig,
        channel_port: u16,
        token: &str,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(SocketAddr::new(config.bind, config.port)).await?;
        Ok(Self {
            listener,
            page: render_page(channel_port, token),
        })
    }

    /// Returns the local address the page is served on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let addr = self.listener.local_addr()?;
        tracing::info!("picker page listening on http://{addr}/");
        axum::serve(self.listener, router(self.page))
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;
        tracing::debug!("picker page stopped");
        Ok(())
    }
}
