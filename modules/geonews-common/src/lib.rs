pub mod config;
pub mod error;
pub mod file_config;
pub mod types;

pub use config::{AppConfig, SinkTarget};
pub use error::GeoNewsError;
pub use file_config::FileConfig;
pub use types::*;
