use thiserror::Error;

/// Typed failures callers match on. Everything else travels as `anyhow::Error`.
#[derive(Error, Debug)]
pub enum GeoNewsError {
    #[error("Run lock conflict: another pipeline run is swapping the collection")]
    RunLockConflict,
}
