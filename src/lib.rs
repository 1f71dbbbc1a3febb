//! Ringlimit - Per-Client Request Rate Limiting Middleware
//!
//! This crate limits how often each client may hit an HTTP service. Every
//! client gets a fixed-size ring of admission timestamps, which answers the
//! sliding-window question in constant time: a request is admitted when the
//! admission a full ring ago is already older than the window. The
//! middleware wraps any tower service speaking axum's request and response
//! types; over-limit requests are answered by a rejection handler without
//! reaching the wrapped service.
//!
//! ```
//! use std::time::Duration;
//! use axum::{routing::get, Router};
//! use ringlimit::RateLimitLayer;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(RateLimitLayer::new(3, Duration::from_secs(1)));
//! ```
//!
//! Method filtering, identity resolution, and the rejection response can
//! all be swapped out:
//!
//! ```
//! use std::time::Duration;
//! use axum::response::IntoResponse;
//! use http::{Method, StatusCode};
//! use ringlimit::RateLimitLayer;
//!
//! let layer = RateLimitLayer::new(3, Duration::from_secs(1))
//!     .methods([Method::GET, Method::POST])
//!     .rejection_handler(|_req: axum::extract::Request| {
//!         (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response()
//!     });
//! ```

pub mod config;
pub mod middleware;
pub mod ratelimit;

pub use crate::config::RateLimitConfig;
pub use crate::middleware::{
    IdentityResolver, IdentityStrategy, IpResolver, RateLimitLayer, RateLimitService,
    RejectionHandler, TooManyRequests,
};
pub use crate::ratelimit::{RateLimiter, RequestRing, Verdict};
