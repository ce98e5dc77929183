// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Result types for detection inference output.
//!
//! [`Results`] mirrors the Ultralytics Python `Results` API: it owns the
//! original image, the detected boxes, and the class-name map, and it knows
//! how to render itself into an annotated image.

use std::collections::HashMap;

use image::DynamicImage;
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, s};

use crate::error::Result;

/// Timing information for inference operations (in milliseconds).
#[derive(Debug, Clone, Default)]
pub struct Speed {
    /// Time spent on preprocessing.
    pub preprocess: Option<f64>,
    /// Time spent on model inference.
    pub inference: Option<f64>,
    /// Time spent on postprocessing.
    pub postprocess: Option<f64>,
}

impl Speed {
    /// Create a new `Speed` with all timings, in milliseconds.
    #[must_use]
    pub const fn new(preprocess: f64, inference: f64, postprocess: f64) -> Self {
        Self {
            preprocess: Some(preprocess),
            inference: Some(inference),
            postprocess: Some(postprocess),
        }
    }

    /// Total time across all recorded stages.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.preprocess.unwrap_or(0.0)
            + self.inference.unwrap_or(0.0)
            + self.postprocess.unwrap_or(0.0)
    }
}

/// Per-image result container for detection inference.
#[derive(Debug, Clone)]
pub struct Results {
    /// Original image as HWC array (height, width, channels).
    pub orig_img: Array3<u8>,
    /// Original image shape (height, width).
    pub orig_shape: (u32, u32),
    /// Detected bounding boxes. `None` when the model produced no usable
    /// detection output for this image.
    pub boxes: Option<Boxes>,
    /// Inference timing information.
    pub speed: Speed,
    /// Class ID to name mapping.
    pub names: HashMap<usize, String>,
    /// Path to the source image.
    pub path: String,
}

impl Results {
    /// Create a new result with no detections attached yet.
    #[must_use]
    pub fn new(
        orig_img: Array3<u8>,
        path: String,
        names: HashMap<usize, String>,
        speed: Speed,
    ) -> Self {
        let shape = orig_img.shape();
        #[allow(clippy::cast_possible_truncation)]
        let orig_shape = (shape[0] as u32, shape[1] as u32);

        Self {
            orig_img,
            orig_shape,
            boxes: None,
            speed,
            names,
            path,
        }
    }

    /// Number of detections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.as_ref().map_or(0, Boxes::len)
    }

    /// `true` if no objects were detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Original image shape (height, width).
    #[must_use]
    pub const fn orig_shape(&self) -> (u32, u32) {
        self.orig_shape
    }

    /// Summary string of the detections, e.g. "2 persons, 1 car".
    #[must_use]
    pub fn verbose(&self) -> String {
        let Some(ref boxes) = self.boxes else {
            return "(no detections)".to_string();
        };
        if boxes.is_empty() {
            return "(no detections)".to_string();
        }

        let cls = boxes.cls();
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for &c in cls {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let c = c as usize;
            *counts.entry(c).or_insert(0) += 1;
        }

        let mut sorted: Vec<(usize, usize)> = counts.into_iter().collect();
        sorted.sort_by_key(|(class_id, _)| *class_id);

        let parts: Vec<String> = sorted
            .iter()
            .map(|(class_id, count)| {
                let name = self.names.get(class_id).map_or("object", String::as_str);
                let suffix = if *count > 1 { "s" } else { "" };
                format!("{count} {name}{suffix}")
            })
            .collect();

        parts.join(", ")
    }

    /// Render the detections onto a copy of the original image.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored image array cannot be converted back
    /// to a raster image.
    pub fn plot(&self) -> Result<DynamicImage> {
        let img = crate::utils::array_to_image(&self.orig_img)?;
        Ok(crate::annotate::annotate_image(&img, self))
    }

    /// Render the detections and write the annotated image to `path`.
    ///
    /// The output format is chosen by the path's extension. Any existing
    /// file is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let annotated = self.plot()?;
        annotated.save(path)?;
        Ok(())
    }
}

/// Detection bounding boxes.
///
/// Stores box data in a (N, 6) array of `[x1, y1, x2, y2, conf, cls]` rows,
/// matching the Ultralytics Python `Boxes` layout.
#[derive(Debug, Clone)]
pub struct Boxes {
    /// Raw data array with shape (N, 6).
    pub data: Array2<f32>,
    /// Original image shape (height, width) for normalization.
    pub orig_shape: (u32, u32),
}

impl Boxes {
    /// Create a new `Boxes` from a (N, 6) data array.
    #[must_use]
    pub const fn new(data: Array2<f32>, orig_shape: (u32, u32)) -> Self {
        Self { data, orig_shape }
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// `true` if the boxes array is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Boxes in xyxy format `[x1, y1, x2, y2]`.
    #[must_use]
    pub fn xyxy(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., 0..4])
    }

    /// Confidence scores (0.0 to 1.0).
    #[must_use]
    pub fn conf(&self) -> ArrayView1<'_, f32> {
        self.data.slice(s![.., 4])
    }

    /// Class IDs.
    #[must_use]
    pub fn cls(&self) -> ArrayView1<'_, f32> {
        self.data.slice(s![.., 5])
    }

    /// Boxes in xyxy format normalized by image size to `[0.0, 1.0]`.
    #[must_use]
    pub fn xyxyn(&self) -> Array2<f32> {
        let mut xyxyn = self.xyxy().to_owned();
        #[allow(clippy::cast_precision_loss)]
        let (h, w) = (self.orig_shape.0 as f32, self.orig_shape.1 as f32);

        for mut row in xyxyn.rows_mut() {
            row[0] /= w;
            row[1] /= h;
            row[2] /= w;
            row[3] /= h;
        }

        xyxyn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names() -> HashMap<usize, String> {
        HashMap::from([(0, "person".to_string()), (1, "car".to_string())])
    }

    #[test]
    fn test_boxes_accessors() {
        let data = array![[10.0, 20.0, 100.0, 200.0, 0.95, 0.0]];
        let boxes = Boxes::new(data, (480, 640));

        assert_eq!(boxes.len(), 1);
        assert!((boxes.conf()[0] - 0.95).abs() < 1e-6);
        assert!((boxes.cls()[0] - 0.0).abs() < 1e-6);
        assert!((boxes.xyxy()[[0, 2]] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_boxes_normalized() {
        let data = array![[0.0, 0.0, 320.0, 240.0, 0.9, 0.0]];
        let boxes = Boxes::new(data, (480, 640));
        let xyxyn = boxes.xyxyn();

        assert!((xyxyn[[0, 2]] - 0.5).abs() < 1e-6); // 320/640
        assert!((xyxyn[[0, 3]] - 0.5).abs() < 1e-6); // 240/480
    }

    #[test]
    fn test_results_verbose() {
        let mut result = Results::new(
            Array3::zeros((100, 100, 3)),
            "test.jpg".to_string(),
            names(),
            Speed::default(),
        );
        assert!(result.is_empty());
        assert_eq!(result.verbose(), "(no detections)");

        let data = array![
            [10.0, 10.0, 50.0, 50.0, 0.9, 0.0],
            [20.0, 20.0, 60.0, 60.0, 0.8, 0.0],
            [30.0, 30.0, 70.0, 70.0, 0.7, 1.0],
        ];
        result.boxes = Some(Boxes::new(data, (100, 100)));
        assert_eq!(result.len(), 3);
        assert_eq!(result.verbose(), "2 persons, 1 car");
    }

    #[test]
    fn test_speed_total() {
        let speed = Speed::new(10.0, 20.0, 5.0);
        assert!((speed.total() - 35.0).abs() < 1e-6);
    }
}
