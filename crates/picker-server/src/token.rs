//! Per-session channel token and upgrade authorization.

use rand::Rng;
use tokio_tungstenite::tungstenite::handshake::server::Request;
use tokio_tungstenite::tungstenite::http::{StatusCode, header};

/// Random bytes behind a token (32 hex characters).
const TOKEN_BYTES: usize = 16;

/// Query parameter carrying the token on the upgrade request.
pub const TOKEN_PARAM: &str = "token";

/// Secret shared between the served page and the channel.
///
/// Only the page knows it, so only the page can open the channel.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh token from the thread CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a presented value.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Checks an upgrade request against the session token and page origin.
///
/// The browser sets `Origin` to the page's `scheme://host:port`; the page
/// reaches the channel on the same host, so the origin host must equal the
/// `Host` header's host and the origin port must be `page_port`.
pub fn authorize_upgrade(
    req: &Request,
    token: &SessionToken,
    page_port: Option<u16>,
) -> Result<(), StatusCode> {
    let presented = req.uri().query().and_then(query_token);
    if !presented.is_some_and(|t| token.matches(t)) {
        tracing::warn!("rejecting upgrade without a valid session token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let host = req.headers().get(header::HOST).and_then(|v| v.to_str().ok());
    let allowed = match (origin, host, page_port) {
        (Some(origin), Some(host), Some(page_port)) => {
            origin_matches(origin, host, page_port)
        }
        _ => false,
    };
    if !allowed {
        tracing::warn!(origin = origin.unwrap_or("<none>"), "rejecting upgrade from foreign origin");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

fn query_token(query: &str) -> Option<&str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find_map(|(key, value)| (key == TOKEN_PARAM).then_some(value))
}

fn origin_matches(origin: &str, host_header: &str, page_port: u16) -> bool {
    let (default_port, authority) = if let Some(rest) = origin.strip_prefix("http://") {
        (80, rest)
    } else if let Some(rest) = origin.strip_prefix("https://") {
        (443, rest)
    } else {
        return false;
    };
    let authority = authority.trim_end_matches('/');

    let (origin_host, origin_port) = split_authority(authority);
    let origin_port = match origin_port {
        Some(port) => port.parse::<u16>().ok(),
        None => Some(default_port),
    };
    let (request_host, _) = split_authority(host_header);

    origin_port == Some(page_port) && origin_host.eq_ignore_ascii_case(request_host)
}

/// Splits `host[:port]`, keeping bracketed IPv6 hosts intact.
fn split_authority(authority: &str) -> (&str, Option<&str>) {
    if authority.starts_with('[') {
        return match authority.split_once("]:") {
            Some((host, port)) => (&authority[..host.len() + 1], Some(port)),
            None => (authority, None),
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    }
}
