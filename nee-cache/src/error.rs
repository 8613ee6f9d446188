use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("NEE cache must have at least one cell")]
    NoCells,

    #[error("invalid config: `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("buffer `{name}` has {actual} items, but {expected} are required")]
    BufferSizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}
