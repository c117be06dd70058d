//! Value-region geometry relative to a matched stat label.

use crate::config::ValueRegion;

/// Axis-aligned rectangle in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Region below a label at `(x, y)` of size `(w, h)` where its number is drawn.
///
/// Offsets are floored fractions of the label size, then the region is clipped
/// to the image. `None` when nothing of it lies inside the image.
pub fn value_region(
    label_x: u32,
    label_y: u32,
    label_w: u32,
    label_h: u32,
    geometry: &ValueRegion,
    image_w: u32,
    image_h: u32,
) -> Option<PixelRect> {
    let (x, y) = (label_x as i64, label_y as i64);
    let (w, h) = (label_w as f64, label_h as f64);

    let y1 = y + label_h as i64 + (geometry.top_gap * h).floor() as i64;
    let mut y2 = y1 + (geometry.height * h).floor() as i64;
    let x1 = x + (geometry.left_inset * w).floor() as i64;
    let x2 = x + label_w as i64 - (geometry.right_inset * w).floor() as i64;
    y2 -= (geometry.bottom_trim * (y2 - y1) as f64).floor() as i64;

    let x1 = x1.clamp(0, image_w as i64);
    let x2 = x2.clamp(0, image_w as i64);
    let y1 = y1.clamp(0, image_h as i64);
    let y2 = y2.clamp(0, image_h as i64);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(PixelRect {
        x: x1 as u32,
        y: y1 as u32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets() {
        let geometry = ValueRegion::default();
        let rect = value_region(10, 10, 100, 20, &geometry, 800, 200).unwrap();
        // y1 = 10 + 20 + 2, y2 = 32 + 30 = 62 then trimmed by floor(0.3 * 30) = 9
        assert_eq!(
            rect,
            PixelRect {
                x: 55,
                y: 32,
                width: 50,
                height: 21
            }
        );
    }

    #[test]
    fn test_clipped_to_image() {
        let geometry = ValueRegion::default();
        let rect = value_region(10, 10, 100, 20, &geometry, 80, 40).unwrap();
        assert_eq!(rect.x + rect.width, 80);
        assert_eq!(rect.y + rect.height, 40);
    }

    #[test]
    fn test_outside_image() {
        let geometry = ValueRegion::default();
        assert!(value_region(10, 10, 100, 20, &geometry, 200, 30).is_none());
    }
}
