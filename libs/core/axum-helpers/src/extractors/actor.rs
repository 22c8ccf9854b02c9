use crate::audit::{extract_ip_from_headers, extract_ip_from_socket};
use crate::errors::AppError;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Response},
};
use chrono_tz::Tz;
use core_model::RequestContext;
use std::net::SocketAddr;

/// Numeric id of the acting user, set by the upstream gateway
pub const USER_ID_HEADER: &str = "x-user-id";
/// IANA timezone used to present timestamps, e.g. `Europe/London`
pub const TIMEZONE_HEADER: &str = "x-timezone";

/// Acting user, client IP and display timezone of the request.
///
/// Absent headers leave the field empty; malformed ones are rejected with 400
/// `INVALID_HEADER` rather than silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor(pub RequestContext);

impl Actor {
    pub fn context(&self) -> &RequestContext {
        &self.0
    }

    pub fn from_headers(
        headers: &HeaderMap,
        socket: Option<SocketAddr>,
    ) -> Result<Self, AppError> {
        let mut ctx = RequestContext::default();

        if let Some(raw) = header_str(headers, USER_ID_HEADER)? {
            let user_id = raw
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| {
                    AppError::InvalidHeader(format!("{} must be a positive integer", USER_ID_HEADER))
                })?;
            ctx = ctx.with_user(user_id);
        }

        if let Some(raw) = header_str(headers, TIMEZONE_HEADER)? {
            let tz: Tz = raw.parse().map_err(|_| {
                AppError::InvalidHeader(format!("{} '{}' is not a known timezone", TIMEZONE_HEADER, raw))
            })?;
            ctx = ctx.with_timezone(tz);
        }

        ctx.ip = extract_ip_from_headers(headers).or_else(|| extract_ip_from_socket(socket));
        Ok(Actor(ctx))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::InvalidHeader(format!("{} is not valid ASCII", name)))?
                .trim();
            Ok((!value.is_empty()).then_some(value))
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Actor::from_headers(&parts.headers, socket).map_err(IntoResponse::into_response)
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
    fn reads_user_timezone_and_forwarded_ip() {
        let actor = Actor::from_headers(
            &headers(&[
                ("x-user-id", "42"),
                ("x-timezone", "Europe/London"),
                ("x-forwarded-for", "203.0.113.7"),
            ]),
            None,
        )
        .unwrap();

        let ctx = actor.context();
        assert_eq!(ctx.user_id, Some(42));
        assert_eq!(ctx.timezone, Some(chrono_tz::Europe::London));
        assert_eq!(ctx.ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn anonymous_request_falls_back_to_socket_ip() {
        let socket: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let actor = Actor::from_headers(&HeaderMap::new(), Some(socket)).unwrap();
        assert_eq!(actor.0.user_id, None);
        assert_eq!(actor.0.ip.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(Actor::from_headers(&headers(&[("x-user-id", "abc")]), None).is_err());
        assert!(Actor::from_headers(&headers(&[("x-user-id", "-3")]), None).is_err());
        assert!(Actor::from_headers(&headers(&[("x-timezone", "Mars/Olympus")]), None).is_err());
    }
}
