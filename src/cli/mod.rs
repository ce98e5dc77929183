// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface: argument parsing and the predict-and-annotate
//! routine behind it.

/// CLI arguments.
pub mod args;

/// Prediction and annotation logic.
pub mod predict;

pub use args::Cli;
pub use predict::{EmptyPolicy, predict_and_annotate};
