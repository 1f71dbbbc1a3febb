//! Middleware configuration.

use std::time::Duration;

use http::Method;

use crate::middleware::IdentityStrategy;

/// Default number of admissions per window when none is configured.
const DEFAULT_MAX_REQUESTS: usize = 60;
/// Default window length when none is configured.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Configuration for the rate limiting middleware.
///
/// Every field has a working default and invalid values are clamped when
/// the limiter is built, so constructing middleware from any configuration
/// succeeds.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Admissions each client gets per window. Values below 1 are treated
    /// as 1.
    pub max_requests: usize,

    /// Length of the sliding window.
    pub window: Duration,

    /// HTTP methods subject to limiting. An empty list limits every
    /// method.
    pub methods: Vec<Method>,

    /// Identity sources for the built-in resolver, tried in order.
    pub strategies: Vec<IdentityStrategy>,
}

impl RateLimitConfig {
    /// Configuration limiting each client to `max_requests` admissions per
    /// `window`, with the default method filter and identity strategies.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            ..Self::default()
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            methods: Vec::new(),
            strategies: IdentityStrategy::default_order().to_vec(),
        }
    }
}
