use thiserror::Error;

use crate::tag::Field;

#[derive(Error, Debug)]
pub enum IlstError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no metadata list to patch into; creating one is unsupported.
    #[error("no existing metadata list to patch")]
    UnsupportedRegion,

    #[error("not enough padding: size change of {needed} bytes, room for {available}")]
    PaddingInsufficient { needed: i64, available: i64 },

    #[error("{field} value {value:?} cannot be encoded")]
    Unrepresentable { field: Field, value: String },

    #[error("Format error: {0}")]
    Format(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, IlstError>;
