// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use clap::Parser;

use yolo_annotate::cli::{Cli, predict_and_annotate};

fn main() -> Result<()> {
    // Process-wide logger: timestamped INFO/ERROR lines until process exit
    tracing_subscriber::fmt().with_target(false).init();

    let args = Cli::parse();
    predict_and_annotate(&args)?;

    Ok(())
}
