pub mod classifier;
pub mod filter;
pub mod location;
pub mod pipeline;
pub mod places;
pub mod run_log;
pub mod sink;
pub mod source;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
