//! Client identity used for rate limiting

use super::state::AppState;
use crate::config::RealIpMethod;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Identity of the requesting client: its IP address, or `unknown`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self(resolve_identity(
            state.settings.server.real_ip_method,
            &parts.headers,
            peer,
        )))
    }
}

/// Resolve the client address according to `method`, falling back to the
/// socket peer and then to `unknown`
pub fn resolve_identity(method: RealIpMethod, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = match method {
        RealIpMethod::XForwardedFor => Some("x-forwarded-for"),
        RealIpMethod::XRealIp => Some("x-real-ip"),
        RealIpMethod::Connection => None,
    };

    header
        .and_then(|name| headers.get(name))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
