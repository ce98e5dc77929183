// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Post-processing of raw detection model output.
//!
//! Decodes the detect head tensor, filters by confidence, applies per-class
//! NMS, maps coordinates back through the letterbox transform, and builds
//! the final [`Results`].

use std::collections::HashMap;

use ndarray::{Array2, Array3, ArrayView2, s};

use crate::inference::InferenceConfig;
use crate::preprocessing::{PreprocessResult, clip_coords, scale_coords};
use crate::results::{Boxes, Results, Speed};
use crate::utils::nms_per_class;

/// Post-process a raw detection output tensor into a [`Results`].
///
/// YOLO detect heads output `[1, 4 + nc, N]` (or the transposed
/// `[1, N, 4 + nc]`), where each prediction is a box in xywh model space
/// followed by per-class scores.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn postprocess_detect(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
    names: &HashMap<usize, String>,
    orig_img: Array3<u8>,
    path: String,
    speed: Speed,
) -> Results {
    let mut results = Results::new(orig_img, path, names.clone(), speed);

    let (num_classes, num_predictions, is_transposed) =
        parse_detect_shape(output_shape, names.len());

    if output.is_empty() || num_predictions == 0 {
        return results;
    }

    let num_features = 4 + num_classes;
    if output.len() != num_features * num_predictions {
        return results;
    }

    let output_2d = if is_transposed {
        // [1, num_preds, num_features] is already row-per-prediction
        Array2::from_shape_vec((num_predictions, num_features), output.to_vec())
            .unwrap_or_else(|_| Array2::zeros((0, 0)))
    } else {
        // [1, num_features, num_preds] needs a transpose
        let arr = Array2::from_shape_vec((num_features, num_predictions), output.to_vec())
            .unwrap_or_else(|_| Array2::zeros((0, 0)));
        arr.t().to_owned()
    };

    if output_2d.is_empty() {
        return results;
    }

    let boxes_data = extract_detect_boxes(output_2d.view(), preprocess, config);

    if !boxes_data.is_empty() {
        results.boxes = Some(Boxes::new(boxes_data, preprocess.orig_shape));
    }

    results
}

/// Determine `(num_classes, num_predictions, is_transposed)` from the output
/// tensor shape.
///
/// When metadata carried no class names (`expected_classes == 0`), the class
/// count is inferred from the shape: the smaller dimension is the feature
/// axis (e.g. 84 < 8400).
fn parse_detect_shape(shape: &[usize], expected_classes: usize) -> (usize, usize, bool) {
    let (a, b) = match shape.len() {
        2 => (shape[0], shape[1]),
        3 => (shape[1], shape[2]),
        _ => return (expected_classes.max(1), 0, false),
    };

    if a < 5 && b < 5 {
        return (expected_classes.max(1), 0, false);
    }

    if expected_classes == 0 {
        let (num_features, num_preds, transposed) =
            if a < b { (a, b, false) } else { (b, a, true) };
        return (num_features.saturating_sub(4).max(1), num_preds, transposed);
    }

    if a == 4 + expected_classes {
        // [num_features, num_preds]
        (expected_classes, b, false)
    } else if b == 4 + expected_classes {
        // [num_preds, num_features]
        (expected_classes, a, true)
    } else if a < b {
        (a.saturating_sub(4).max(1), b, false)
    } else {
        (b.saturating_sub(4).max(1), a, true)
    }
}

/// Extract detection boxes from a row-per-prediction output view.
///
/// Returns a (N, 6) array of `[x1, y1, x2, y2, conf, cls]` rows in original
/// image coordinates, confidence-filtered, NMS-suppressed, and truncated to
/// the configured maximum.
fn extract_detect_boxes(
    output: ArrayView2<f32>,
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
) -> Array2<f32> {
    let mut candidates = Vec::new();

    for i in 0..output.nrows() {
        let class_scores = output.slice(s![i, 4..]);

        // Best class; NaN scores sort lowest instead of panicking
        let (best_class, best_score) = class_scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less))
            .map(|(idx, &score)| (idx, if score.is_nan() { 0.0 } else { score }))
            .unwrap_or((0, 0.0));

        if best_score < config.confidence_threshold {
            continue;
        }

        // Model outputs xywh; convert to xyxy
        let cx = output[[i, 0]];
        let cy = output[[i, 1]];
        let w = output[[i, 2]];
        let h = output[[i, 3]];

        let xyxy = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];

        let scaled = scale_coords(&xyxy, preprocess.scale, preprocess.padding);
        let clipped = clip_coords(&scaled, preprocess.orig_shape);

        candidates.push((clipped, best_score, best_class));
    }

    if candidates.is_empty() {
        return Array2::zeros((0, 6));
    }

    let keep_indices = nms_per_class(&candidates, config.iou_threshold);

    let num_kept = keep_indices.len().min(config.max_detections);
    let mut result = Array2::zeros((num_kept, 6));

    for (out_idx, &keep_idx) in keep_indices.iter().take(num_kept).enumerate() {
        let (bbox, score, class) = &candidates[keep_idx];
        result[[out_idx, 0]] = bbox[0];
        result[[out_idx, 1]] = bbox[1];
        result[[out_idx, 2]] = bbox[2];
        result[[out_idx, 3]] = bbox[3];
        result[[out_idx, 4]] = *score;
        #[allow(clippy::cast_precision_loss)]
        {
            result[[out_idx, 5]] = *class as f32;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn identity_preprocess(height: u32, width: u32) -> PreprocessResult {
        PreprocessResult {
            tensor: Array4::zeros((1, 3, height as usize, width as usize)),
            orig_shape: (height, width),
            scale: (1.0, 1.0),
            padding: (0.0, 0.0),
        }
    }

    fn names(n: usize) -> HashMap<usize, String> {
        (0..n).map(|i| (i, format!("class{i}"))).collect()
    }

    #[test]
    fn test_parse_detect_shape() {
        // [1, 84, 8400]: feature axis first
        assert_eq!(parse_detect_shape(&[1, 84, 8400], 80), (80, 8400, false));
        // [1, 8400, 84]: prediction axis first
        assert_eq!(parse_detect_shape(&[1, 8400, 84], 80), (80, 8400, true));
    }

    #[test]
    fn test_parse_detect_shape_no_metadata() {
        // Without names, class count is inferred from the smaller axis
        assert_eq!(parse_detect_shape(&[1, 84, 8400], 0), (80, 8400, false));
        assert_eq!(parse_detect_shape(&[1, 8400, 84], 0), (80, 8400, true));
    }

    #[test]
    fn test_empty_output() {
        let preprocess = identity_preprocess(640, 640);
        let config = InferenceConfig::default();

        let results = postprocess_detect(
            &[],
            &[1, 84, 0],
            &preprocess,
            &config,
            &names(80),
            Array3::zeros((640, 640, 3)),
            "test.jpg".to_string(),
            Speed::default(),
        );

        assert!(results.is_empty());
        assert!(results.boxes.is_none());
    }

    #[test]
    fn test_single_detection_decoded() {
        // One class, two predictions: [1, 5, 2] layout, columns are predictions.
        // Prediction 0: center (100, 100), 40x40, score 0.9.
        // Prediction 1: score below threshold.
        let output = [
            100.0, 300.0, // cx
            100.0, 300.0, // cy
            40.0, 40.0, // w
            40.0, 40.0, // h
            0.9, 0.1, // class 0 score
        ];
        let preprocess = identity_preprocess(640, 640);
        let config = InferenceConfig::default();

        let results = postprocess_detect(
            &output,
            &[1, 5, 2],
            &preprocess,
            &config,
            &names(1),
            Array3::zeros((640, 640, 3)),
            "test.jpg".to_string(),
            Speed::default(),
        );

        assert_eq!(results.len(), 1);
        let boxes = results.boxes.unwrap();
        let xyxy = boxes.xyxy();
        assert!((xyxy[[0, 0]] - 80.0).abs() < 1e-4);
        assert!((xyxy[[0, 1]] - 80.0).abs() < 1e-4);
        assert!((xyxy[[0, 2]] - 120.0).abs() < 1e-4);
        assert!((xyxy[[0, 3]] - 120.0).abs() < 1e-4);
        assert!((boxes.conf()[0] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nan_scores_handled() {
        let output = [
            100.0, // cx
            100.0, // cy
            40.0,  // w
            40.0,  // h
            f32::NAN,
        ];
        let preprocess = identity_preprocess(640, 640);
        let config = InferenceConfig::default();

        let results = postprocess_detect(
            &output,
            &[1, 5, 1],
            &preprocess,
            &config,
            &names(1),
            Array3::zeros((640, 640, 3)),
            "test.jpg".to_string(),
            Speed::default(),
        );

        // NaN score never clears the confidence threshold
        assert!(results.is_empty());
    }

    #[test]
    fn test_mismatched_buffer_rejected() {
        // Shape claims 2 predictions but the buffer holds only one
        let output = [100.0, 100.0, 40.0, 40.0, 0.9];
        let preprocess = identity_preprocess(640, 640);
        let config = InferenceConfig::default();

        let results = postprocess_detect(
            &output,
            &[1, 5, 2],
            &preprocess,
            &config,
            &names(1),
            Array3::zeros((640, 640, 3)),
            "test.jpg".to_string(),
            Speed::default(),
        );

        assert!(results.is_empty());
    }
}
