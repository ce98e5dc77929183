// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Detection model loading and inference.
//!
//! [`DetectionModel`] wraps an ONNX Runtime session. The runtime accepts
//! both the native serialized model format (`.onnx`) and the compiled
//! runtime format (`.ort`) through the same loading call; no extension
//! dispatch happens here.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::{Error, Result};
use crate::inference::InferenceConfig;
use crate::metadata::ModelMetadata;
use crate::postprocessing::postprocess_detect;
use crate::preprocessing::preprocess_image;
use crate::results::{Results, Speed};
use crate::utils::image_to_array;

/// A loaded detection model.
///
/// # Example
///
/// ```no_run
/// use yolo_annotate::DetectionModel;
///
/// let mut model = DetectionModel::load("yolo11n.onnx")?;
/// let results = model.predict("image.jpg")?;
/// println!("{} detections", results[0].len());
/// # Ok::<(), yolo_annotate::Error>(())
/// ```
pub struct DetectionModel {
    /// ONNX Runtime session.
    session: Session,
    /// Model metadata (class names, input size, stride).
    metadata: ModelMetadata,
    /// Input tensor name.
    input_name: String,
    /// Output tensor names.
    output_names: Vec<String>,
    /// Inference configuration.
    config: InferenceConfig,
}

impl DetectionModel {
    /// Load a detection model from a `.onnx` or `.ort` file.
    ///
    /// Model metadata (class names, input size) is read from the model's
    /// custom metadata properties when present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] if the file does not exist, or
    /// [`Error::ModelLoad`] if the runtime rejects it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, InferenceConfig::default())
    }

    /// Load a detection model with a custom inference configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::ModelNotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| Error::ModelLoad(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| Error::ModelLoad(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| Error::ModelLoad(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| Error::ModelLoad(format!("Failed to load model: {e}")))?;

        let metadata = Self::extract_metadata(&session)?;

        if metadata.task != "detect" {
            return Err(Error::Metadata(format!(
                "Unsupported task '{}' (only detect models are supported)",
                metadata.task
            )));
        }

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "images".to_string());

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();

        // Metadata input size applies unless the config overrides it
        let config = InferenceConfig {
            imgsz: config.imgsz.or(Some(metadata.imgsz)),
            ..config
        };

        Ok(Self {
            session,
            metadata,
            input_name,
            output_names,
            config,
        })
    }

    /// Read the Ultralytics custom metadata properties from the session.
    fn extract_metadata(session: &Session) -> Result<ModelMetadata> {
        let model_metadata = session
            .metadata()
            .map_err(|e| Error::ModelLoad(format!("Failed to get model metadata: {e}")))?;

        let mut props: HashMap<String, String> = HashMap::new();
        for key in ModelMetadata::KEYS {
            if let Some(value) = model_metadata.custom(key) {
                props.insert(key.to_string(), value);
            }
        }

        ModelMetadata::from_custom_properties(&props)
    }

    /// Run inference on an image file.
    ///
    /// Returns one [`Results`] entry per image; a single path yields a
    /// single-entry collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the image can't be decoded or inference fails.
    pub fn predict<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<Results>> {
        let path = path.as_ref();

        let img = image::open(path).map_err(|e| {
            Error::Image(format!("Failed to load image {}: {e}", path.display()))
        })?;

        self.predict_image(&img, path.to_string_lossy().to_string())
    }

    /// Run inference on a decoded image.
    ///
    /// # Errors
    ///
    /// Returns an error if the inference session fails.
    pub fn predict_image(&mut self, image: &DynamicImage, path: String) -> Result<Vec<Results>> {
        let target_size = self.config.imgsz.unwrap_or(self.metadata.imgsz);

        let start_preprocess = Instant::now();
        let preprocess_result = preprocess_image(image, target_size);
        let preprocess_time = start_preprocess.elapsed().as_secs_f64() * 1000.0;

        let orig_img = image_to_array(image);

        let start_inference = Instant::now();
        let (output_data, output_shape) = self.run_inference(&preprocess_result.tensor)?;
        let inference_time = start_inference.elapsed().as_secs_f64() * 1000.0;

        let speed = Speed::new(preprocess_time, inference_time, 0.0);

        let start_postprocess = Instant::now();
        let mut result = postprocess_detect(
            &output_data,
            &output_shape,
            &preprocess_result,
            &self.config,
            &self.metadata.names,
            orig_img,
            path,
            speed,
        );
        result.speed.postprocess = Some(start_postprocess.elapsed().as_secs_f64() * 1000.0);

        Ok(vec![result])
    }

    /// Run the ONNX session on a preprocessed NCHW tensor.
    fn run_inference(&mut self, input: &ndarray::Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        // Ensure input is contiguous in memory
        let input_contiguous = input.as_standard_layout();

        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| Error::Inference(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![&self.input_name => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| Error::Inference(format!("Inference failed: {e}")))?;

        let output_name = self
            .output_names
            .first()
            .ok_or_else(|| Error::Inference("Model has no outputs".to_string()))?;
        let output = outputs
            .get(output_name.as_str())
            .ok_or_else(|| Error::Inference(format!("Output '{output_name}' not found")))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shape_vec: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        Ok((data.to_vec(), shape_vec))
    }

    /// The model's class names.
    #[must_use]
    pub fn names(&self) -> &HashMap<usize, String> {
        &self.metadata.names
    }

    /// The number of classes.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.metadata.num_classes()
    }

    /// The model's input size as (height, width).
    #[must_use]
    pub const fn imgsz(&self) -> (usize, usize) {
        self.metadata.imgsz
    }

    /// The model metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for DetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionModel")
            .field("num_classes", &self.metadata.num_classes())
            .field("imgsz", &self.metadata.imgsz)
            .field("input_name", &self.input_name)
            .finish()
    }
}
