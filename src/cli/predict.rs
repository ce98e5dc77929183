// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The predict-and-annotate routine.
//!
//! Strictly linear: validate inputs, load the model, run inference, select
//! one result, render it, write the annotated image. Each major step is
//! logged; every failure propagates except the empty-result case, which is
//! governed by [`EmptyPolicy`].

use std::path::Path;

use clap::ValueEnum;
use tracing::{error, info};

use crate::cli::args::Cli;
use crate::error::{Error, Result};
use crate::model::DetectionModel;

/// Policy for handling an empty inference result collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmptyPolicy {
    /// Return an error (non-zero exit).
    Fail,
    /// Log an error and write nothing; the process still exits 0.
    Skip,
    /// Write the original image to the output path unannotated.
    Copy,
}

impl std::fmt::Display for EmptyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Copy => "copy",
        })
    }
}

/// Run inference on one image and write the annotated result.
///
/// Both paths are checked for existence before any model loading happens,
/// each with its own error. The output file is overwritten silently; its
/// parent directory is assumed to exist.
///
/// # Errors
///
/// Returns [`Error::ModelNotFound`] / [`Error::ImageNotFound`] for missing
/// inputs, [`Error::ResultIndex`] for an out-of-range `--result-index`, and
/// propagates model, inference, and image encoding failures. An empty
/// result collection is an error only under `--on-empty fail`.
pub fn predict_and_annotate(args: &Cli) -> Result<()> {
    if !args.model.exists() {
        return Err(Error::ModelNotFound(args.model.clone()));
    }
    if !args.image.exists() {
        return Err(Error::ImageNotFound(args.image.clone()));
    }

    info!("Loading model from {}...", args.model.display());
    let mut model = DetectionModel::load(&args.model)?;

    info!("Running inference on {}...", args.image.display());
    let results = model.predict(&args.image)?;

    if results.is_empty() {
        return handle_empty(args.on_empty, &args.image, &args.output);
    }

    let result = results.get(args.result_index).ok_or(Error::ResultIndex {
        index: args.result_index,
        len: results.len(),
    })?;

    info!(
        "{} ({:.1}ms inference)",
        result.verbose(),
        result.speed.inference.unwrap_or(0.0)
    );

    info!("Saving annotated image to {}...", args.output.display());
    result.save(&args.output)?;

    info!("Done.");
    Ok(())
}

/// Apply the configured empty-result policy.
fn handle_empty(policy: EmptyPolicy, image_path: &Path, output_path: &Path) -> Result<()> {
    match policy {
        EmptyPolicy::Fail => Err(Error::EmptyResults),
        EmptyPolicy::Skip => {
            error!(
                "No results returned from model; not writing {}",
                output_path.display()
            );
            Ok(())
        }
        EmptyPolicy::Copy => {
            error!("No results returned from model; writing original image unannotated");
            let img = image::open(image_path)?;
            img.save(output_path)?;
            Ok(())
        }
    }
}
