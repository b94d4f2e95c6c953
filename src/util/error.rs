//! Error types for slidedet.

use thiserror::Error;

/// Result alias for slidedet operations.
pub type SlideDetResult<T> = std::result::Result<T, SlideDetError>;

/// Errors that can occur when running slidedet algorithms.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SlideDetError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A buffer was requested with dimensions that cannot hold data.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The backing buffer length does not match the declared shape.
    #[error("buffer length mismatch: needed {needed}, got {got}")]
    BufferLength { needed: usize, got: usize },
    /// Image and filter disagree on the number of channels.
    #[error("channel mismatch: image has {image} channels, filter has {filter}")]
    ChannelMismatch { image: usize, filter: usize },
    /// A filter in a bank does not share the shape of the first filter.
    #[error("bank filter {index} has shape {got:?}, expected {expected:?}")]
    BankShapeMismatch {
        index: usize,
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },
    /// An index exceeded the valid range.
    #[error("index out of bounds: {index} >= {len} ({context})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// An input list that must be ordered by descending score was not.
    #[error("not sorted by descending score: {context}")]
    NotSorted { context: &'static str },
    /// A score was NaN where a total order is required.
    #[error("score at index {index} is NaN")]
    NanScore { index: usize },
    /// Too few images to resolve the requested false positives per image.
    #[error("not enough images ({images}) to resolve {fppi} false positives per image")]
    NotEnoughImages { fppi: f64, images: usize },
    /// Image decoding failed (only with `image-io`).
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
