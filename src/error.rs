use thiserror::Error;

/// Failure of `ProgressiveHashMap::insert`. The map is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    /// Admitting another key would need a table larger than the
    /// configured maximum capacity.
    #[error("growing to {requested} slots would exceed the maximum capacity of {max}")]
    CapacityExceeded { requested: usize, max: usize },
}
