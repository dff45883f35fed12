//! Header inspection shared by the gates.
//!
//! # Responsibilities
//! - Derive the client address from X-Forwarded-For or the transport peer
//! - Extract the bearer credential from the Authorization header

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::error::GateError;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Client identity used for rate limiting.
///
/// The first address in `X-Forwarded-For` when present, else the peer
/// address recorded by the listener, else `"unknown"`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// [`client_ip`] for a request head.
pub fn client_ip_of(parts: &Parts) -> String {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(&parts.headers, peer)
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GateError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let rest = value.strip_prefix("Bearer ").ok_or(GateError::NoToken)?;
    match rest.split(' ').next() {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(GateError::MalformedToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(client_ip(&h, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "10.0.0.9");
        assert_eq!(client_ip(&headers(&[("x-forwarded-for", " ")]), Some(peer)), "10.0.0.9");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer abc.def")])), Ok("abc.def"));
        assert_eq!(bearer_token(&HeaderMap::new()), Err(GateError::NoToken));
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Basic dXNlcg==")])),
            Err(GateError::NoToken)
        );
        assert_eq!(
            bearer_token(&headers(&[("authorization", "bearer abc")])),
            Err(GateError::NoToken)
        );
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Bearer ")])),
            Err(GateError::MalformedToken)
        );
    }
}
