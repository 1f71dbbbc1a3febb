//! Client registry and admission decisions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::ring::RequestRing;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The request fits in the client's window and has been recorded.
    Allow,
    /// The client has exhausted its window; nothing was recorded.
    Deny,
}

impl Verdict {
    /// Whether this verdict admits the request.
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// Per-client sliding-window rate limiter.
///
/// Maps identity keys to [`RequestRing`]s, creating a ring the first time a
/// key is seen. [`admit`](Self::admit) runs the whole check-and-record
/// sequence while holding the key's shard guard, so concurrent requests
/// from the same client are serialized against each other while distinct
/// clients proceed in parallel.
pub struct RateLimiter {
    /// One ring per identity key, created lazily.
    rings: DashMap<String, RequestRing>,
    /// Admissions allowed per window; the capacity of every ring.
    max_requests: usize,
    /// Length of the sliding window.
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing each client `max_requests` admissions per
    /// `window`.
    ///
    /// A `max_requests` below 1 is treated as 1, so a limiter never admits
    /// unconditionally by accident.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            rings: DashMap::new(),
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Admissions allowed per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether a request from `key` arriving at `now` may proceed.
    ///
    /// An allowed request is recorded into the client's ring before the
    /// guard is released. A denied request records nothing, so a client
    /// hammering a closed window does not push its reopening further out.
    pub fn admit(&self, key: &str, now: Instant) -> Verdict {
        trace!(client = %key, "checking rate limit");

        let mut ring = self.rings.entry(key.to_owned()).or_insert_with(|| {
            debug!(
                client = %key,
                capacity = self.max_requests,
                "tracking new client"
            );
            RequestRing::new(self.max_requests)
        });

        if ring.is_within_limit(now, self.window) {
            ring.record(now);
            Verdict::Allow
        } else {
            debug!(client = %key, "rate limit exceeded");
            Verdict::Deny
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.rings.len()
    }

    /// Forget every tracked client.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.rings.clear();
    }

    /// Drop clients whose most recent admission is older than `idle_for`,
    /// returning how many were removed.
    ///
    /// `idle_for` is raised to at least the window length: a client that
    /// is mid-denial still has admissions inside the window, and evicting
    /// it would hand it a fresh quota early.
    pub fn sweep_idle(&self, now: Instant, idle_for: Duration) -> usize {
        let threshold = idle_for.max(self.window);
        let mut removed = 0;

        self.rings.retain(|_, ring| {
            let keep = match ring.newest() {
                Some(at) => now.duration_since(at) <= threshold,
                None => true,
            };
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            debug!(removed, remaining = self.rings.len(), "swept idle clients");
        }
        removed
    }

    /// Spawn a background task that sweeps idle clients every `every`.
    ///
    /// The task holds only a weak handle and exits on its next tick after
    /// the last strong reference to the limiter is dropped. Must be called
    /// from within a tokio runtime.
    ///
    /// Sweeping is opt-in; without it the registry grows with the number
    /// of distinct identities seen.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration, idle_for: Duration) -> JoinHandle<()> {
        let limiter = Arc::downgrade(&self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                match limiter.upgrade() {
                    Some(limiter) => {
                        limiter.sweep_idle(Instant::now(), idle_for);
                    }
                    None => break,
                }
            }
        })
    }
}
