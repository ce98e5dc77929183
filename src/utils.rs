// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Shared helpers: box overlap math, NMS, and array/image conversion.

use image::DynamicImage;
use ndarray::Array3;

use crate::error::{Error, Result};

/// Calculate `IoU` (Intersection over Union) between two bounding boxes.
///
/// Boxes are `[x1, y1, x2, y2]`; the returned value is in `[0.0, 1.0]`.
#[must_use]
pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = ((x2 - x1).max(0.0)) * ((y2 - y1).max(0.0));

    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Per-class Non-Maximum Suppression.
///
/// Only suppresses boxes within the same class. Input is
/// `[(bbox, score, class_id)]`; returns indices of boxes to keep,
/// sorted by descending score.
#[must_use]
pub fn nms_per_class(boxes: &[([f32; 4], f32, usize)], iou_threshold: f32) -> Vec<usize> {
    if boxes.is_empty() {
        return vec![];
    }

    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| {
        boxes[b]
            .1
            .partial_cmp(&boxes[a].1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![];
    let mut suppressed = vec![false; boxes.len()];

    for &i in &indices {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        let class_i = boxes[i].2;

        for &j in &indices {
            if !suppressed[j] && i != j && boxes[j].2 == class_i {
                let iou = calculate_iou(&boxes[i].0, &boxes[j].0);
                if iou > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
    }

    keep
}

/// Convert an HWC u8 array with shape (H, W, 3) to a `DynamicImage`.
///
/// # Errors
///
/// Returns an error if the dimensions exceed `u32::MAX` or the buffer
/// cannot be reassembled into an image.
pub fn array_to_image(arr: &Array3<u8>) -> Result<DynamicImage> {
    let shape = arr.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| Error::Image("Image height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| Error::Image("Image width exceeds u32::MAX".to_string()))?;

    let mut rgb_data = Vec::with_capacity(shape[0] * shape[1] * 3);
    for y in 0..shape[0] {
        for x in 0..shape[1] {
            rgb_data.push(arr[[y, x, 0]]);
            rgb_data.push(arr[[y, x, 1]]);
            rgb_data.push(arr[[y, x, 2]]);
        }
    }

    let img_buffer = image::RgbImage::from_raw(width, height, rgb_data)
        .ok_or_else(|| Error::Image("Failed to create image from array".to_string()))?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

/// Convert a `DynamicImage` to an HWC u8 ndarray with shape (H, W, 3).
///
/// # Panics
///
/// Panics if the pixel buffer does not match the image dimensions, which
/// cannot happen for buffers produced by `to_rgb8`.
#[must_use]
pub fn image_to_array(image: &DynamicImage) -> Array3<u8> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let pixels = rgb.into_raw();

    Array3::from_shape_vec((height as usize, width as usize, 3), pixels)
        .expect("pixel buffer matches image dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_iou() {
        let box1 = [0.0, 0.0, 10.0, 10.0];
        let box2 = [5.0, 5.0, 15.0, 15.0];
        let iou = calculate_iou(&box1, &box2);
        assert!((iou - 0.142_857).abs() < 0.001); // 25 / (100 + 100 - 25)
    }

    #[test]
    fn test_iou_disjoint() {
        let box1 = [0.0, 0.0, 10.0, 10.0];
        let box2 = [20.0, 20.0, 30.0, 30.0];
        assert!(calculate_iou(&box1, &box2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nms_per_class_keeps_different_classes() {
        // Two overlapping boxes of different classes should both be kept
        let boxes = vec![
            ([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            ([1.0, 1.0, 11.0, 11.0], 0.8, 1),
            ([100.0, 100.0, 110.0, 110.0], 0.95, 0),
        ];
        let keep = nms_per_class(&boxes, 0.5);
        assert_eq!(keep.len(), 3);
    }

    #[test]
    fn test_nms_per_class_suppression() {
        // Same class, heavy overlap: lower score is suppressed
        let boxes = vec![
            ([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            ([1.0, 1.0, 11.0, 11.0], 0.8, 0),
        ];
        let keep = nms_per_class(&boxes, 0.5);
        assert_eq!(keep, vec![0]);
    }

    #[test]
    fn test_array_image_roundtrip() {
        let mut arr = Array3::<u8>::zeros((4, 6, 3));
        arr[[0, 0, 0]] = 255;
        arr[[3, 5, 2]] = 128;

        let img = array_to_image(&arr).unwrap();
        assert_eq!(img.width(), 6);
        assert_eq!(img.height(), 4);

        let back = image_to_array(&img);
        assert_eq!(back, arr);
    }
}
