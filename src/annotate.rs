// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Annotation rendering: bounding boxes, class labels, confidence scores.

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::fs;
use std::path::Path;

use crate::results::Results;

/// Color palette for class boxes, cycled by class ID.
pub const COLORS: [[u8; 3]; 10] = [
    [56, 56, 255],   // red-ish blue
    [151, 157, 255], // light blue
    [31, 112, 255],  // azure
    [29, 178, 255],  // sky
    [49, 210, 207],  // teal
    [10, 249, 72],   // green
    [23, 204, 146],  // sea green
    [134, 219, 61],  // lime
    [52, 147, 26],   // dark green
    [187, 212, 0],   // olive
];

/// Box outline thickness in pixels.
const BOX_THICKNESS: i32 = 3;

/// Label text scale in pixels.
const LABEL_SCALE: f32 = 16.0;

/// Label background height in pixels.
const LABEL_HEIGHT: i32 = 20;

/// Rough per-character label width at `LABEL_SCALE`.
const LABEL_CHAR_WIDTH: f32 = 9.0;

/// Candidate label-font locations. The first readable entry wins; when none
/// exists, boxes are drawn without text labels.
const FONT_PATHS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Get the color for a class ID.
#[must_use]
pub fn get_class_color(class_id: usize) -> Rgb<u8> {
    Rgb(COLORS[class_id % COLORS.len()])
}

/// Load a label font from the first available system location.
#[must_use]
pub fn load_font() -> Option<FontArc> {
    FONT_PATHS
        .iter()
        .filter(|path| Path::new(path).exists())
        .find_map(|path| {
            let data = fs::read(path).ok()?;
            FontArc::try_from_vec(data).ok()
        })
}

/// Annotate an image with detection boxes, labels, and confidence scores.
///
/// Draws onto a copy of `image`; the input is never modified. Boxes are
/// clamped to the image bounds; degenerate boxes are skipped.
#[must_use]
pub fn annotate_image(image: &DynamicImage, result: &Results) -> DynamicImage {
    let mut img = image.to_rgb8();
    let (width, height) = img.dimensions();
    #[allow(clippy::cast_possible_wrap)]
    let (w, h) = (width as i32, height as i32);

    let font = load_font();

    if let Some(ref boxes) = result.boxes {
        let xyxy = boxes.xyxy();
        let conf = boxes.conf();
        let cls = boxes.cls();

        for i in 0..boxes.len() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let class_id = cls[i] as usize;
            let confidence = conf[i];

            #[allow(clippy::cast_possible_truncation)]
            let mut x1 = xyxy[[i, 0]].round() as i32;
            #[allow(clippy::cast_possible_truncation)]
            let mut y1 = xyxy[[i, 1]].round() as i32;
            #[allow(clippy::cast_possible_truncation)]
            let mut x2 = xyxy[[i, 2]].round() as i32;
            #[allow(clippy::cast_possible_truncation)]
            let mut y2 = xyxy[[i, 3]].round() as i32;

            if x1 > x2 {
                std::mem::swap(&mut x1, &mut x2);
            }
            if y1 > y2 {
                std::mem::swap(&mut y1, &mut y2);
            }

            x1 = x1.clamp(0, w - 1);
            y1 = y1.clamp(0, h - 1);
            x2 = x2.clamp(0, w - 1);
            y2 = y2.clamp(0, h - 1);

            if x2 <= x1 || y2 <= y1 {
                continue;
            }

            let color = get_class_color(class_id);

            // Outline, inset one pixel per thickness step
            for t in 0..BOX_THICKNESS {
                let tx1 = (x1 + t).min(x2);
                let ty1 = (y1 + t).min(y2);
                let tx2 = (x2 - t).max(tx1);
                let ty2 = (y2 - t).max(ty1);
                if tx2 > tx1 && ty2 > ty1 {
                    #[allow(clippy::cast_sign_loss)]
                    let rect = Rect::at(tx1, ty1).of_size((tx2 - tx1) as u32, (ty2 - ty1) as u32);
                    draw_hollow_rect_mut(&mut img, rect, color);
                }
            }

            let class_name = result.names.get(&class_id).map_or("object", String::as_str);
            let label = format!("{class_name} {confidence:.2}");

            if let Some(ref f) = font {
                // Label above the box when there is room, inside it otherwise
                let label_y = if y1 >= LABEL_HEIGHT {
                    y1 - LABEL_HEIGHT
                } else {
                    y1
                };
                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                let label_w = ((label.len() as f32 * LABEL_CHAR_WIDTH) as i32).min(w - x1);

                if label_w > 0 {
                    #[allow(clippy::cast_sign_loss)]
                    let bg = Rect::at(x1, label_y).of_size(label_w as u32, LABEL_HEIGHT as u32);
                    draw_filled_rect_mut(&mut img, bg, color);
                    draw_text_mut(
                        &mut img,
                        Rgb([255, 255, 255]),
                        x1 + 2,
                        label_y + 2,
                        PxScale::from(LABEL_SCALE),
                        f,
                        &label,
                    );
                }
            }
        }
    }

    DynamicImage::ImageRgb8(img)
}
