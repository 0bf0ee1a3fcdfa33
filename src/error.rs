use thiserror::Error;

/// Errors returned by tensor, layer, network and trainer operations.
///
/// A call that returns `Err` has not mutated its target, with the single
/// exception of `Network::init`, which initialises layers in order and stops
/// at the first failure.
#[derive(Debug, Error)]
pub enum NnError {
    /// Non-positive dimension, shape mismatch or inconsistent parameters.
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    /// A buffer could not be reserved.
    #[error("failed to allocate {requested} elements")]
    AllocationFailure { requested: usize },

    /// A required layer, tensor or network is absent (not initialised, empty).
    #[error("missing argument: {what}")]
    NullArgument { what: &'static str },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NnError {
    pub(crate) fn invalid(reason: impl Into<String>) -> NnError {
        NnError::InvalidParameter { reason: reason.into() }
    }

    pub(crate) fn null(what: &'static str) -> NnError {
        NnError::NullArgument { what }
    }
}

pub type Result<T> = std::result::Result<T, NnError>;
