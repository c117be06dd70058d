//! Stat readout recognition from game screenshots.
//!
//! Labels are located left to right by template correlation, each label fixes
//! a value region below it, and the digits inside are decoded by matching the
//! ten digit templates. A read either yields all five values or nothing.

pub mod debug;
pub mod digits;
pub mod matching;
pub mod region;
pub mod templates;

pub use region::PixelRect;
pub use templates::TemplateSet;

use image::imageops;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::equalize_histogram;
use std::fmt;
use std::path::PathBuf;

use crate::config::RecognitionConfig;
use crate::model::{Stat, StatMap, StatSnapshot};

/// Why a read produced no snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadFailure {
    /// Best label correlation was below the label threshold.
    LabelNotFound { stat: Stat, score: f32 },
    /// No room left to search for the label, or its value region lies outside the image.
    LabelOutOfRange { stat: Stat },
    /// No digit matched inside the value region.
    NoDigits { stat: Stat },
    /// Digits decoded to something above the stat ceiling.
    Implausible { stat: Stat, digits: String },
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailure::LabelNotFound { stat, score } => {
                write!(f, "{} label not found (best score {:.3})", stat.label(), score)
            }
            ReadFailure::LabelOutOfRange { stat } => {
                write!(f, "{} label or value region outside the image", stat.label())
            }
            ReadFailure::NoDigits { stat } => write!(f, "no digits found for {}", stat.label()),
            ReadFailure::Implausible { stat, digits } => {
                write!(f, "{} read as '{}', which is not a valid stat", stat.label(), digits)
            }
        }
    }
}

/// Full result of a read, including the value boxes searched so far.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub snapshot: Option<StatSnapshot>,
    pub boxes: Vec<PixelRect>,
    pub failure: Option<ReadFailure>,
}

/// Reads the five stat values off a screenshot.
pub struct StatReader {
    templates: TemplateSet,
    config: RecognitionConfig,
    debug_dir: Option<PathBuf>,
}

impl StatReader {
    pub fn new(templates: TemplateSet, config: RecognitionConfig) -> Self {
        Self {
            templates,
            config,
            debug_dir: None,
        }
    }

    /// Write `debug_template_boxes.png` into `dir` after every read.
    pub fn with_debug_dir(mut self, dir: PathBuf) -> Self {
        self.debug_dir = Some(dir);
        self
    }

    /// All five values, or `None` if any label or value could not be read.
    pub fn read_stats(&self, image: &DynamicImage) -> Option<StatSnapshot> {
        self.read_detailed(image).snapshot
    }

    pub fn read_detailed(&self, image: &DynamicImage) -> ReadOutcome {
        let gray = equalize_histogram(&image.to_luma8());
        let mut boxes = Vec::with_capacity(Stat::ALL.len());
        let result = self.read_all(&gray, &mut boxes);

        if let Some(dir) = &self.debug_dir {
            match debug::save_debug_image(image, &boxes, dir) {
                Ok(path) => crate::log(&format!("Saved debug image: {}", path.display())),
                Err(e) => crate::log(&format!("Failed to save debug image: {:#}", e)),
            }
        }

        match result {
            Ok(snapshot) => ReadOutcome {
                snapshot: Some(snapshot),
                boxes,
                failure: None,
            },
            Err(failure) => {
                crate::log(&format!("Stat read failed: {}", failure));
                ReadOutcome {
                    snapshot: None,
                    boxes,
                    failure: Some(failure),
                }
            }
        }
    }

    fn read_all(
        &self,
        gray: &GrayImage,
        boxes: &mut Vec<PixelRect>,
    ) -> Result<StatSnapshot, ReadFailure> {
        let (img_w, img_h) = gray.dimensions();
        let mut values = StatMap::<u32>::default();
        let mut search_from = 0u32;

        for stat in Stat::ALL {
            let label = &self.templates.labels[stat];
            let (label_w, label_h) = label.dimensions();
            if search_from >= img_w {
                return Err(ReadFailure::LabelOutOfRange { stat });
            }

            let strip = imageops::crop_imm(gray, search_from, 0, img_w - search_from, img_h).to_image();
            let (mx, my, score) = matching::match_template(&strip, label)
                .and_then(|map| map.best())
                .ok_or(ReadFailure::LabelOutOfRange { stat })?;
            if score < self.config.label_threshold {
                return Err(ReadFailure::LabelNotFound { stat, score });
            }
            let x = search_from + mx;
            search_from = x + 1;

            let rect = region::value_region(
                x,
                my,
                label_w,
                label_h,
                &self.config.value_region,
                img_w,
                img_h,
            )
            .ok_or(ReadFailure::LabelOutOfRange { stat })?;
            boxes.push(rect);

            let value_img = imageops::crop_imm(gray, rect.x, rect.y, rect.width, rect.height).to_image();
            let decoded = digits::read_digits(
                &value_img,
                &self.templates.digits,
                self.config.digit_threshold,
                self.config.dedup_distance_px,
            );
            if decoded.is_empty() {
                return Err(ReadFailure::NoDigits { stat });
            }
            values[stat] = digits::parse_value(&decoded, self.config.max_value).ok_or(
                ReadFailure::Implausible {
                    stat,
                    digits: decoded,
                },
            )?;
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use tempfile::tempdir;

    fn pattern(w: u32, h: u32, seed: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(97);
        GrayImage::from_fn(w, h, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([if state % 2 == 0 { 40 } else { 220 }])
        })
    }

    fn templates() -> TemplateSet {
        let labels = StatMap::from_fn(|stat| pattern(100, 20, 100 + stat.index() as u32));
        let digits = std::array::from_fn(|d| pattern(8, 16, 200 + d as u32));
        TemplateSet::new(labels, digits)
    }

    fn paste(dst: &mut GrayImage, src: &GrayImage, x: u32, y: u32) {
        for (sx, sy, p) in src.enumerate_pixels() {
            dst.put_pixel(x + sx, y + sy, *p);
        }
    }

    /// Screen with labels at x = 10 + 140 i, y = 10 and each value drawn
    /// at the top-left of its value region (x + 45, y + 32).
    fn screen(set: &TemplateSet, values: [&str; 5]) -> DynamicImage {
        let mut img = GrayImage::new(720, 80);
        for (i, stat) in Stat::ALL.into_iter().enumerate() {
            let x = 10 + 140 * i as u32;
            paste(&mut img, &set.labels[stat], x, 10);
            for (j, c) in values[i].bytes().enumerate() {
                let digit = &set.digits[(c - b'0') as usize];
                paste(&mut img, digit, x + 47 + 10 * j as u32, 34);
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_reads_all_five_values() {
        let set = templates();
        let image = screen(&set, ["412", "305", "1200", "98", "7"]);
        let reader = StatReader::new(set, RecognitionConfig::default());

        let outcome = reader.read_detailed(&image);
        assert_eq!(outcome.failure, None);
        assert_eq!(outcome.snapshot, Some(StatMap::new([412, 305, 1200, 98, 7])));
        assert_eq!(outcome.boxes.len(), 5);
        assert_eq!(
            outcome.boxes[0],
            PixelRect {
                x: 55,
                y: 32,
                width: 50,
                height: 21
            }
        );
    }

    #[test]
    fn test_value_above_ceiling_fails_whole_read() {
        let set = templates();
        let image = screen(&set, ["412", "305", "1201", "98", "7"]);
        let reader = StatReader::new(set, RecognitionConfig::default());

        let outcome = reader.read_detailed(&image);
        assert!(outcome.snapshot.is_none());
        assert_eq!(
            outcome.failure,
            Some(ReadFailure::Implausible {
                stat: Stat::Power,
                digits: "1201".to_string()
            })
        );
    }

    #[test]
    fn test_missing_digits_fails() {
        let set = templates();
        let image = screen(&set, ["412", "305", "", "98", "7"]);
        let reader = StatReader::new(set, RecognitionConfig::default());
        assert_eq!(
            reader.read_detailed(&image).failure,
            Some(ReadFailure::NoDigits { stat: Stat::Power })
        );
    }

    #[test]
    fn test_blank_screen_reads_nothing() {
        let reader = StatReader::new(templates(), RecognitionConfig::default());
        let image = DynamicImage::ImageLuma8(GrayImage::new(720, 80));
        let outcome = reader.read_detailed(&image);
        assert!(outcome.snapshot.is_none());
        assert!(matches!(
            outcome.failure,
            Some(ReadFailure::LabelNotFound {
                stat: Stat::Speed,
                ..
            })
        ));
        assert!(outcome.boxes.is_empty());
    }

    #[test]
    fn test_labels_must_appear_left_to_right() {
        let set = templates();
        let mut img = GrayImage::new(720, 80);
        // Stamina placed left of Speed cannot be found after it.
        paste(&mut img, &set.labels[Stat::Stamina], 10, 10);
        paste(&mut img, &set.labels[Stat::Speed], 300, 10);
        paste(&mut img, &set.digits[5], 347, 34);
        let reader = StatReader::new(set, RecognitionConfig::default());

        let outcome = reader.read_detailed(&DynamicImage::ImageLuma8(img));
        assert!(matches!(
            outcome.failure,
            Some(ReadFailure::LabelNotFound {
                stat: Stat::Stamina,
                ..
            }) | Some(ReadFailure::LabelOutOfRange { stat: Stat::Stamina })
        ));
    }

    #[test]
    fn test_debug_image_written() {
        let dir = tempdir().unwrap();
        let set = templates();
        let image = screen(&set, ["1", "2", "3", "4", "5"]);
        let reader = StatReader::new(set, RecognitionConfig::default())
            .with_debug_dir(dir.path().to_path_buf());

        assert!(reader.read_stats(&image).is_some());
        assert!(dir.path().join(debug::DEBUG_IMAGE_NAME).exists());
    }
}
