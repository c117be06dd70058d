//! Annotated debug output for scans.

use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};

use super::region::PixelRect;

/// File name of the annotated scan image.
pub const DEBUG_IMAGE_NAME: &str = "debug_template_boxes.png";

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Draw a rectangle outline.
pub fn draw_rect(img: &mut RgbImage, rect: &PixelRect, color: Rgb<u8>, thickness: u32) {
    let (img_w, img_h) = img.dimensions();
    let PixelRect {
        x,
        y,
        width: w,
        height: h,
    } = *rect;

    let mut put = |px: u32, py: u32| {
        if px < img_w && py < img_h {
            img.put_pixel(px, py, color);
        }
    };

    for t in 0..thickness.min(h) {
        for dx in 0..w {
            // Top and bottom edges
            put(x + dx, y + t);
            put(x + dx, y + h - 1 - t);
        }
    }
    for t in 0..thickness.min(w) {
        for dy in 0..h {
            // Left and right edges
            put(x + t, y + dy);
            put(x + w - 1 - t, y + dy);
        }
    }
}

/// Copy of `image` with every value-search box outlined in green.
pub fn annotate(image: &DynamicImage, boxes: &[PixelRect]) -> RgbImage {
    let mut out = image.to_rgb8();
    for rect in boxes {
        draw_rect(&mut out, rect, BOX_COLOR, 2);
    }
    out
}

/// Write the annotated image into `dir`, returning its path.
pub fn save_debug_image(image: &DynamicImage, boxes: &[PixelRect], dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create debug directory: {}", dir.display()))?;
    let path = dir.join(DEBUG_IMAGE_NAME);
    annotate(image, boxes)
        .save(&path)
        .with_context(|| format!("Failed to save debug image: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_draw_rect_outline_only() {
        let mut img = RgbImage::new(20, 20);
        let rect = PixelRect {
            x: 2,
            y: 3,
            width: 10,
            height: 8,
        };
        draw_rect(&mut img, &rect, BOX_COLOR, 1);

        assert_eq!(*img.get_pixel(2, 3), BOX_COLOR);
        assert_eq!(*img.get_pixel(11, 10), BOX_COLOR);
        assert_eq!(*img.get_pixel(6, 6), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(12, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_rect_clips_at_edges() {
        let mut img = RgbImage::new(10, 10);
        let rect = PixelRect {
            x: 5,
            y: 5,
            width: 20,
            height: 20,
        };
        draw_rect(&mut img, &rect, BOX_COLOR, 2);
        assert_eq!(*img.get_pixel(9, 5), BOX_COLOR);
    }

    #[test]
    fn test_save_debug_image() {
        let dir = tempdir().unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(30, 30));
        let rect = PixelRect {
            x: 1,
            y: 1,
            width: 5,
            height: 5,
        };
        let path = save_debug_image(&image, &[rect], dir.path()).unwrap();
        assert!(path.ends_with(DEBUG_IMAGE_NAME));
        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*saved.get_pixel(1, 1), BOX_COLOR);
    }
}
