//! Client address extractor.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::state::AppState;

/// Address the rate limiter keys on when nothing better is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The address of the client that sent the request.
///
/// Forwarding headers are only honoured when `TRUST_PROXY_HEADERS` is set,
/// since any client can send them. Otherwise the socket peer address is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let forwarded = state
            .config
            .trust_proxy_headers
            .then(|| forwarded_ip(&parts.headers))
            .flatten();
        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Ok(ClientIp(ip))
    }
}

/// First `X-Forwarded-For` hop, else `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    header("x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(forwarded_ip(&map).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn real_ip_is_fallback() {
        let map = headers(&[("x-real-ip", " 198.51.100.4 ")]);
        assert_eq!(forwarded_ip(&map).as_deref(), Some("198.51.100.4"));
        assert_eq!(forwarded_ip(&headers(&[("x-forwarded-for", " ")])), None);
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }
}
