// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the predict-and-annotate pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The model file does not exist.
    #[error("Model not found at {0}")]
    ModelNotFound(PathBuf),
    /// The input image file does not exist.
    #[error("Image not found at {0}")]
    ImageNotFound(PathBuf),
    /// Inference returned no results and the policy is `fail`.
    #[error("No results returned from model")]
    EmptyResults,
    /// The requested result index is outside the returned collection.
    #[error("Result index {index} out of range (got {len} results)")]
    ResultIndex {
        /// Requested index.
        index: usize,
        /// Number of results returned.
        len: usize,
    },
    /// Error loading the ONNX model.
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// Error parsing model metadata.
    #[error("Metadata error: {0}")]
    Metadata(String),
    /// Error during model inference.
    #[error("Inference error: {0}")]
    Inference(String),
    /// Error decoding, encoding, or processing images.
    #[error("Image error: {0}")]
    Image(String),
    /// Wrapped `std::io::Error`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ModelNotFound(PathBuf::from("missing.onnx"));
        assert_eq!(err.to_string(), "Model not found at missing.onnx");

        let err = Error::ImageNotFound(PathBuf::from("missing.jpg"));
        assert_eq!(err.to_string(), "Image not found at missing.jpg");

        let err = Error::ResultIndex { index: 1, len: 1 };
        assert_eq!(
            err.to_string(),
            "Result index 1 out of range (got 1 results)"
        );
    }
}
