use std::io;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Missing element: {0}")]
    MissingElement(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error(
        "Total size of property {property} ({property_count}) is not equal to size of {element} ({element_count})"
    )]
    CardinalityMismatch {
        property: String,
        element: String,
        property_count: usize,
        element_count: usize,
    },
    #[error("Truncated stream: {0}")]
    TruncatedStream(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Point cloud has 0 points")]
    EmptyPointCloud,
    #[error("Points ({expected}) and {attribute} ({actual}) have different lengths")]
    LengthMismatch {
        attribute: String,
        expected: usize,
        actual: usize,
    },
    #[error("Attribute {attribute} has unsupported shape: expected {expected:?} but got {actual:?}")]
    UnsupportedAttribute {
        attribute: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Attribute {attribute} has unsupported datatype {dtype}")]
    UnsupportedDataType { attribute: String, dtype: String },
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl PlyError {
    /// Structural corruption: the stream disagrees with its own header.
    ///
    /// Fatal errors abort the whole call; everything else is a
    /// warn-and-fail condition scoped to the current read or write.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlyError::CardinalityMismatch { .. } | PlyError::TruncatedStream(_)
        )
    }
}

impl From<io::Error> for PlyError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => PlyError::TruncatedStream(err.to_string()),
            _ => PlyError::Io(err.to_string()),
        }
    }
}

pub type Status = Result<()>;

pub type Result<T> = std::result::Result<T, PlyError>;
