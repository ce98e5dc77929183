// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! # yolo-annotate
//!
//! Run a YOLO detection model on a single image, draw the predicted
//! bounding boxes (with class labels and confidence scores), and save the
//! annotated image.
//!
//! Model loading and inference are delegated to ONNX Runtime via [`ort`];
//! both `.onnx` and precompiled `.ort` model files load through the same
//! call. Image decode/encode is delegated to the [`image`] crate, with the
//! output format chosen by the output path's extension.
//!
//! ## Library usage
//!
//! ```no_run
//! use yolo_annotate::DetectionModel;
//!
//! let mut model = DetectionModel::load("yolo11n.onnx")?;
//! let results = model.predict("bus.jpg")?;
//! results[0].save("output.jpg")?;
//! # Ok::<(), yolo_annotate::Error>(())
//! ```
//!
//! ## CLI usage
//!
//! ```bash
//! yolo-annotate --model yolo11n.onnx --image bus.jpg --output output.jpg
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | [`DetectionModel`] for loading models and running inference |
//! | [`results`] | Output types ([`Results`], [`Boxes`]) |
//! | [`annotate`] | Bounding box and label rendering |
//! | [`inference`] | [`InferenceConfig`] thresholds and sizing |
//! | [`metadata`] | ONNX model metadata parsing |
//! | [`preprocessing`] | Letterbox resize and tensor conversion |
//! | [`postprocessing`] | Output decoding and NMS |
//! | [`cli`] | Argument parsing and the predict-and-annotate routine |
//! | [`error`] | Error types ([`Error`], [`Result`]) |
//! | [`utils`] | `IoU`, NMS, and array/image conversion helpers |

// Modules
pub mod annotate;
pub mod cli;
pub mod error;
pub mod inference;
pub mod metadata;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;
pub mod results;
pub mod utils;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use inference::InferenceConfig;
pub use metadata::ModelMetadata;
pub use model::DetectionModel;
pub use results::{Boxes, Results, Speed};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
