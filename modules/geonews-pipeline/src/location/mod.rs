//! Location resolution: pick one canonical place string per article, then
//! turn it into coordinates through a throttled, cached geocoder.

pub mod policy;
pub mod rate_limit;
pub mod resolver;

pub use policy::{LocationPolicy, PositionalLocationPolicy};
pub use rate_limit::RateLimiter;
pub use resolver::{GeocodeOutcome, LocationResolver, Resolution};
