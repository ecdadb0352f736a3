use std::time::Duration;

/// Time to wait for a pong response (or any incoming frame).
///
/// Reading a large batch on the surface side can keep the socket quiet
/// for a while, so this is generous.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How often the engine pings the surface.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(5);

/// Maximum message size in bytes (512 MiB).
///
/// File content travels as a JSON array of numbers, roughly four bytes of
/// text per byte of payload.
pub const WS_MAX_MESSAGE_SIZE: usize = 512 * 1024 * 1024;

/// How long the surface shows its success indicator after `uploadComplete`.
pub const SUCCESS_INDICATOR: Duration = Duration::from_secs(2);

/// Default port for the HTTP page that hosts the surface.
pub const DEFAULT_PAGE_PORT: u16 = 8765;

/// Default port for the WebSocket message channel.
pub const DEFAULT_CHANNEL_PORT: u16 = 8766;

/// Path the surface connects to for the message channel.
pub const CHANNEL_PATH: &str = "/channel";
