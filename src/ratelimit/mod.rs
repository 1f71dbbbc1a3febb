//! Rate limiting logic and state management.

mod limiter;
mod ring;

pub use limiter::{RateLimiter, Verdict};
pub use ring::RequestRing;
