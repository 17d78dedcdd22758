//! Client address and user agent for audit entries.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts},
};
use paylink_service::RequestContext;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Where the request came from. Never rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo(pub RequestContext);

impl ClientInfo {
    fn from_parts(parts: &Parts) -> Self {
        let ip_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self(RequestContext::new(ip_address, user_agent))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_reads_peer_and_user_agent() {
        let (mut parts, _) = Request::builder()
            .header(USER_AGENT, "curl/8.5")
            .body(())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5000))));

        let ClientInfo(ctx) = ClientInfo::from_parts(&parts);
        assert_eq!(ctx.ip_address.as_deref(), Some("10.1.2.3"));
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.5"));
    }

    #[test]
    fn test_missing_details_are_empty() {
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(ClientInfo::from_parts(&parts), ClientInfo::default());
    }
}
