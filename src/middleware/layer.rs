//! Tower middleware wiring the limiter into a request path.

use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::response::Response;
use futures::future::Either;
use http::{Method, Request};
use tower::{Layer, Service};
use tracing::trace;

use crate::config::RateLimitConfig;
use crate::ratelimit::{RateLimiter, Verdict};

use super::identity::{IdentityResolver, IpResolver};
use super::reject::{RejectionHandler, TooManyRequests};

/// Tower layer applying a per-client sliding-window rate limit.
///
/// Every service produced by one layer shares one [`RateLimiter`], so a
/// limit spans all the routes the layer is applied to. Construction never
/// fails; out-of-range values are clamped.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
    methods: Arc<[Method]>,
    resolver: Arc<dyn IdentityResolver>,
    rejection: Arc<dyn RejectionHandler>,
}

impl RateLimitLayer {
    /// Layer limiting each client to `max_requests` admissions per
    /// `window`, with the default identity resolution and rejection.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self::with_config(RateLimitConfig::new(max_requests, window))
    }

    /// Layer built from an explicit configuration.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(config.max_requests, config.window)),
            methods: config.methods.into(),
            resolver: Arc::new(IpResolver::new(config.strategies)),
            rejection: Arc::new(TooManyRequests),
        }
    }

    /// Limit only the given methods; every other method passes through
    /// without touching the limiter.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect::<Vec<_>>().into();
        self
    }

    /// Replace the resolver deciding which key a request counts against.
    pub fn identity_resolver(mut self, resolver: impl IdentityResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Replace the handler answering denied requests.
    pub fn rejection_handler(mut self, handler: impl RejectionHandler + 'static) -> Self {
        self.rejection = Arc::new(handler);
        self
    }

    /// The limiter behind this layer, for sweeping or inspection.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            methods: self.methods.clone(),
            resolver: self.resolver.clone(),
            rejection: self.rejection.clone(),
        }
    }
}

/// Service produced by [`RateLimitLayer`].
///
/// Allowed and unlimited requests are forwarded to the inner service;
/// denied requests are answered by the rejection handler without the
/// inner service ever seeing them.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
    methods: Arc<[Method]>,
    resolver: Arc<dyn IdentityResolver>,
    rejection: Arc<dyn RejectionHandler>,
}

impl<S> RateLimitService<S> {
    /// Whether requests with `method` are subject to limiting.
    fn is_limited(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<S::Future, Ready<Result<Response, S::Error>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if !self.is_limited(req.method()) {
            trace!(method = %req.method(), "method not limited, passing through");
            return Either::Left(self.inner.call(req));
        }

        let key = self.resolver.resolve(&req);
        match self.limiter.admit(&key, Instant::now()) {
            Verdict::Allow => Either::Left(self.inner.call(req)),
            Verdict::Deny => Either::Right(ready(Ok(self.rejection.reject(req)))),
        }
    }
}
