//! HTTP middleware: identity extraction, rejection handling, tower layer.

mod identity;
mod layer;
mod reject;

pub use identity::{IdentityResolver, IdentityStrategy, IpResolver, UnknownStrategy};
pub use layer::{RateLimitLayer, RateLimitService};
pub use reject::{RejectionHandler, TooManyRequests};
