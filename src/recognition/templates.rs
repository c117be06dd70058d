//! Reference glyph images for stat labels and digits.

use anyhow::{Context, Result};
use image::GrayImage;
use std::path::Path;

use crate::model::{Stat, StatMap};

/// Grayscale label template per stat and one template per digit 0-9.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub labels: StatMap<GrayImage>,
    pub digits: [GrayImage; 10],
}

impl TemplateSet {
    pub fn new(labels: StatMap<GrayImage>, digits: [GrayImage; 10]) -> Self {
        Self { labels, digits }
    }

    /// Load `<label_dir>/<stat>.png` and `<digit_dir>/<d>.png`.
    pub fn load(label_dir: &Path, digit_dir: &Path) -> Result<Self> {
        let mut labels = Vec::with_capacity(Stat::ALL.len());
        for stat in Stat::ALL {
            labels.push(load_gray(&label_dir.join(format!("{}.png", stat.name())))?);
        }
        let mut digits = Vec::with_capacity(10);
        for d in 0..10 {
            digits.push(load_gray(&digit_dir.join(format!("{}.png", d)))?);
        }

        let labels: [GrayImage; 5] = labels
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected five label templates"))?;
        let digits: [GrayImage; 10] = digits
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected ten digit templates"))?;

        crate::log(&format!(
            "Loaded templates from {} and {}",
            label_dir.display(),
            digit_dir.display()
        ));
        Ok(Self::new(StatMap::new(labels), digits))
    }
}

fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to load template: {}", path.display()))?;
    Ok(img.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_directories() {
        let dir = tempdir().unwrap();
        let labels = dir.path().join("templates");
        let digits = dir.path().join("digits");
        std::fs::create_dir_all(&labels).unwrap();
        std::fs::create_dir_all(&digits).unwrap();

        for (i, stat) in Stat::ALL.iter().enumerate() {
            let img = GrayImage::from_pixel(20 + i as u32, 8, Luma([i as u8 * 10]));
            img.save(labels.join(format!("{}.png", stat.name()))).unwrap();
        }
        for d in 0..10u32 {
            let img = GrayImage::from_pixel(6, 10 + d, Luma([200]));
            img.save(digits.join(format!("{}.png", d))).unwrap();
        }

        let set = TemplateSet::load(&labels, &digits).unwrap();
        assert_eq!(set.labels[Stat::Guts].width(), 23);
        assert_eq!(set.digits[7].height(), 17);
    }

    #[test]
    fn test_missing_template_names_path() {
        let dir = tempdir().unwrap();
        let err = TemplateSet::load(dir.path(), dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("speed.png"));
    }
}
