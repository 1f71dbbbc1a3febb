//! Client identity extraction.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use http::Request;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A source for a client's identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityStrategy {
    /// The connection's peer address with the port stripped.
    ///
    /// Read from the [`ConnectInfo`] request extension, which axum
    /// populates when the router is served with
    /// `into_make_service_with_connect_info`.
    RemoteAddr,
    /// The first comma-separated entry of the `X-Forwarded-For` header,
    /// trimmed.
    XForwardedFor,
    /// The `X-Real-IP` header value, verbatim.
    XRealIp,
}

impl IdentityStrategy {
    /// The default preference order: peer address first, then the proxy
    /// headers.
    pub fn default_order() -> [IdentityStrategy; 3] {
        [Self::RemoteAddr, Self::XForwardedFor, Self::XRealIp]
    }
}

/// Error returned when parsing an unrecognized strategy name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized identity strategy: {0}")]
pub struct UnknownStrategy(String);

impl FromStr for IdentityStrategy {
    type Err = UnknownStrategy;

    /// Accepts both the kebab-case names and the header-style spellings
    /// (`RemoteAddr`, `X-Forwarded-For`, `X-Real-IP`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RemoteAddr" | "remote-addr" => Ok(Self::RemoteAddr),
            "X-Forwarded-For" | "x-forwarded-for" => Ok(Self::XForwardedFor),
            "X-Real-IP" | "x-real-ip" => Ok(Self::XRealIp),
            other => Err(UnknownStrategy(other.to_owned())),
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RemoteAddr => "RemoteAddr",
            Self::XForwardedFor => "X-Forwarded-For",
            Self::XRealIp => "X-Real-IP",
        })
    }
}

/// Turns a request into the key its rate limit is tracked under.
///
/// The resolver runs synchronously on every limited request, so
/// implementations should be cheap. Closures of the shape
/// `Fn(&Request<Body>) -> String` implement this automatically.
pub trait IdentityResolver: Send + Sync {
    /// Extract the identity key for `req`.
    fn resolve(&self, req: &Request<Body>) -> String;
}

impl<F> IdentityResolver for F
where
    F: Fn(&Request<Body>) -> String + Send + Sync,
{
    fn resolve(&self, req: &Request<Body>) -> String {
        self(req)
    }
}

/// The built-in resolver: tries a list of [`IdentityStrategy`]s in order
/// and returns the first non-empty value.
///
/// When no strategy yields a value the key is the empty string, and every
/// such client shares a single ring.
#[derive(Debug, Clone)]
pub struct IpResolver {
    strategies: Vec<IdentityStrategy>,
}

impl IpResolver {
    /// A resolver trying the given strategies in order.
    pub fn new(strategies: impl Into<Vec<IdentityStrategy>>) -> Self {
        Self {
            strategies: strategies.into(),
        }
    }

    fn extract(strategy: IdentityStrategy, req: &Request<Body>) -> Option<String> {
        match strategy {
            IdentityStrategy::RemoteAddr => req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
            IdentityStrategy::XForwardedFor => header_str(req, "x-forwarded-for")
                .and_then(|value| value.split(',').next())
                .map(|first| first.trim().to_owned()),
            IdentityStrategy::XRealIp => header_str(req, "x-real-ip").map(str::to_owned),
        }
    }
}

impl Default for IpResolver {
    fn default() -> Self {
        Self::new(IdentityStrategy::default_order())
    }
}

impl IdentityResolver for IpResolver {
    fn resolve(&self, req: &Request<Body>) -> String {
        self.strategies
            .iter()
            .find_map(|&strategy| Self::extract(strategy, req).filter(|key| !key.is_empty()))
            .unwrap_or_default()
    }
}

fn header_str<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}
