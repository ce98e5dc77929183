// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::Parser;

use crate::cli::predict::EmptyPolicy;

/// Default model path, pointing into the Ultralytics training output tree.
pub const DEFAULT_MODEL: &str = "runs/detect/train/weights/best.onnx";

/// Default output path for the annotated image.
pub const DEFAULT_OUTPUT: &str = "output.jpg";

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about = "Run YOLO inference on one image and save the annotated result", long_about = None)]
#[command(after_help = r"Examples:
    yolo-annotate --image bus.jpg
    yolo-annotate --model yolo11n.onnx --image bus.jpg --output annotated.jpg
    yolo-annotate --model best.ort --image bus.jpg --on-empty copy")]
pub struct Cli {
    /// Path to the detection model (.onnx or .ort file)
    #[arg(short, long, default_value = DEFAULT_MODEL, value_name = "PATH")]
    pub model: PathBuf,

    /// Path to the input image
    #[arg(short, long, value_name = "PATH")]
    pub image: PathBuf,

    /// Path to save the annotated output image
    #[arg(short, long, default_value = DEFAULT_OUTPUT, value_name = "PATH")]
    pub output: PathBuf,

    /// What to do when inference returns no results
    #[arg(long, value_enum, default_value_t = EmptyPolicy::Skip)]
    pub on_empty: EmptyPolicy,

    /// Which entry of the result collection to render
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub result_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Cli::parse_from(["yolo-annotate", "--image", "bus.jpg"]);
        assert_eq!(args.model, PathBuf::from(DEFAULT_MODEL));
        assert_eq!(args.image, PathBuf::from("bus.jpg"));
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(args.on_empty, EmptyPolicy::Skip);
        assert_eq!(args.result_index, 0);
    }

    #[test]
    fn test_custom_args() {
        let args = Cli::parse_from([
            "yolo-annotate",
            "--model",
            "custom.ort",
            "--image",
            "test.png",
            "--output",
            "out.png",
            "--on-empty",
            "fail",
            "--result-index",
            "2",
        ]);
        assert_eq!(args.model, PathBuf::from("custom.ort"));
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.on_empty, EmptyPolicy::Fail);
        assert_eq!(args.result_index, 2);
    }

    #[test]
    fn test_image_is_required() {
        assert!(Cli::try_parse_from(["yolo-annotate"]).is_err());
    }
}
