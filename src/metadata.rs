// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX model metadata parsing.
//!
//! Ultralytics exports store configuration (class names, input size, task)
//! as custom metadata properties on the ONNX model. This module parses those
//! properties into a [`ModelMetadata`], falling back to sensible defaults
//! for models exported without metadata.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Metadata extracted from a detection model.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model description (e.g. "Ultralytics YOLO11n model trained on coco.yaml").
    pub description: String,
    /// The task the model performs. Only "detect" is supported here.
    pub task: String,
    /// Model stride (typically 32).
    pub stride: u32,
    /// Input image size as (height, width).
    pub imgsz: (usize, usize),
    /// Class ID to class name mapping.
    pub names: HashMap<usize, String>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            task: "detect".to_string(),
            stride: 32,
            imgsz: (640, 640),
            names: HashMap::new(),
        }
    }
}

impl ModelMetadata {
    /// Metadata property keys written by Ultralytics exports.
    pub const KEYS: [&'static str; 5] = ["description", "task", "stride", "imgsz", "names"];

    /// Build metadata from the model's custom properties.
    ///
    /// Missing keys keep their defaults; malformed values for the keys that
    /// do exist are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if a present `stride`, `imgsz`, or `names` value
    /// cannot be parsed.
    pub fn from_custom_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut metadata = Self::default();

        if let Some(description) = props.get("description") {
            metadata.description = description.clone();
        }
        if let Some(task) = props.get("task") {
            metadata.task = task.trim().to_string();
        }
        if let Some(stride) = props.get("stride") {
            metadata.stride = stride
                .trim()
                .parse()
                .map_err(|_| Error::Metadata(format!("Invalid stride value: {stride}")))?;
        }
        if let Some(imgsz) = props.get("imgsz") {
            metadata.imgsz = parse_imgsz(imgsz)?;
        }
        if let Some(names) = props.get("names") {
            metadata.names = parse_names(names)?;
        }

        Ok(metadata)
    }

    /// Number of classes the model predicts. `0` when the model carried no
    /// name map; the output decoder then infers the count from the output
    /// tensor shape.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Look up a class name by ID.
    #[must_use]
    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }
}

/// Parse an image size value: either a single integer ("640") or a list
/// ("[640, 640]"), returned as (height, width).
fn parse_imgsz(value: &str) -> Result<(usize, usize)> {
    let trimmed = value.trim().trim_start_matches('[').trim_end_matches(']');

    let parts: Vec<usize> = trimmed
        .split(',')
        .map(|p| p.trim().parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::Metadata(format!("Invalid imgsz value: {value}")))?;

    match parts.as_slice() {
        [size] => Ok((*size, *size)),
        [height, width] => Ok((*height, *width)),
        _ => Err(Error::Metadata(format!("Invalid imgsz value: {value}"))),
    }
}

/// Parse a class-name map in the Python dict form Ultralytics writes:
/// `{0: 'person', 1: 'bicycle', ...}`.
fn parse_names(value: &str) -> Result<HashMap<usize, String>> {
    let trimmed = value.trim().trim_start_matches('{').trim_end_matches('}');
    let mut names = HashMap::new();

    if trimmed.trim().is_empty() {
        return Ok(names);
    }

    for entry in trimmed.split(',') {
        let (id, name) = entry
            .split_once(':')
            .ok_or_else(|| Error::Metadata(format!("Invalid names entry: {entry}")))?;

        let id: usize = id
            .trim()
            .parse()
            .map_err(|_| Error::Metadata(format!("Invalid class id in names: {id}")))?;
        let name = name.trim().trim_matches('\'').trim_matches('"').to_string();

        names.insert(id, name);
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_properties() {
        let mut props = HashMap::new();
        props.insert("task".to_string(), "detect".to_string());
        props.insert("stride".to_string(), "32".to_string());
        props.insert("imgsz".to_string(), "[640, 640]".to_string());
        props.insert(
            "names".to_string(),
            "{0: 'person', 1: 'bicycle'}".to_string(),
        );

        let metadata = ModelMetadata::from_custom_properties(&props).unwrap();
        assert_eq!(metadata.task, "detect");
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.num_classes(), 2);
        assert_eq!(metadata.class_name(0), Some("person"));
        assert_eq!(metadata.class_name(1), Some("bicycle"));
        assert_eq!(metadata.class_name(2), None);
    }

    #[test]
    fn test_parse_scalar_imgsz() {
        let mut props = HashMap::new();
        props.insert("imgsz".to_string(), "320".to_string());

        let metadata = ModelMetadata::from_custom_properties(&props).unwrap();
        assert_eq!(metadata.imgsz, (320, 320));
    }

    #[test]
    fn test_defaults_when_missing() {
        let metadata = ModelMetadata::from_custom_properties(&HashMap::new()).unwrap();
        assert_eq!(metadata.task, "detect");
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.num_classes(), 0);
    }

    #[test]
    fn test_invalid_stride_rejected() {
        let mut props = HashMap::new();
        props.insert("stride".to_string(), "thirty-two".to_string());
        assert!(ModelMetadata::from_custom_properties(&props).is_err());
    }
}
