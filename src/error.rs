use thiserror::Error;

use crate::network::LayerId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A hyperparameter or topology value outside of its domain.
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Two vectors that must share a length do not.
    #[error("size of {what} must be {expected} but is {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Malformed dataset text. `line` is 1-based.
    #[error("malformed dataset at line {line}: {reason}")]
    DataFormat { line: usize, reason: String },

    #[error("dataset has no examples")]
    EmptyDataset,

    #[error("no neuron {index} in {layer}")]
    NeuronOutOfRange { layer: LayerId, index: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn out_of_unit_range(name: &'static str, value: f64) -> Self {
        Error::InvalidParameter {
            name,
            reason: format!("must be between 0 and 1, got {}", value),
        }
    }
}
