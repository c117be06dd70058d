//! Template matching by zero-mean normalized cross-correlation.
//!
//! Scores follow OpenCV's `TM_CCOEFF_NORMED`: 1.0 is a perfect match, 0.0 is
//! no correlation, and flat windows (zero variance) score 0.0. Window sums
//! come from integral images so only the cross term costs `w * h` per
//! position.

use image::GrayImage;

/// Correlation score for every placement of a template inside an image.
///
/// Dimensions are `(image_w - template_w + 1, image_h - template_h + 1)`.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl ScoreMap {
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.scores[(x + y * self.width) as usize]
    }

    /// Highest score and its location. Ties go to the first in row-major order.
    pub fn best(&self) -> Option<(u32, u32, f32)> {
        let mut best: Option<(u32, u32, f32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let score = self.get(x, y);
                match best {
                    Some((_, _, b)) if score <= b => {}
                    _ => best = Some((x, y, score)),
                }
            }
        }
        best
    }

    /// All placements scoring at least `threshold`, in row-major order.
    pub fn above(&self, threshold: f32) -> Vec<(u32, u32, f32)> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let score = self.get(x, y);
                if score >= threshold {
                    out.push((x, y, score));
                }
            }
        }
        out
    }
}

/// Summed-area table with one extra leading row and column of zeros.
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Integral {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = image.dimensions();
        let stride = w as usize + 1;
        let mut sum = vec![0.0f64; stride * (h as usize + 1)];
        let mut sum_sq = vec![0.0f64; stride * (h as usize + 1)];

        for y in 0..h as usize {
            let mut row = 0.0f64;
            let mut row_sq = 0.0f64;
            for x in 0..w as usize {
                let v = image.get_pixel(x as u32, y as u32)[0] as f64;
                row += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = sum[idx - stride] + row;
                sum_sq[idx] = sum_sq[idx - stride] + row_sq;
            }
        }

        Self { stride, sum, sum_sq }
    }

    /// Sum and sum of squares over the `w x h` window at `(x, y)`.
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let a = y * s + x;
        let b = y * s + x + w;
        let c = (y + h) * s + x;
        let d = (y + h) * s + x + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sum_sq[d] - self.sum_sq[b] - self.sum_sq[c] + self.sum_sq[a],
        )
    }
}

/// Correlate `template` against every placement inside `image`.
///
/// Returns `None` when the template is empty or larger than the image.
pub fn match_template(image: &GrayImage, template: &GrayImage) -> Option<ScoreMap> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let n = (tw * th) as f64;
    let t_mean = template.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let t_centered: Vec<f64> = template.pixels().map(|p| p[0] as f64 - t_mean).collect();
    let t_energy: f64 = t_centered.iter().map(|v| v * v).sum();

    let width = iw - tw + 1;
    let height = ih - th + 1;
    let mut scores = vec![0.0f32; (width * height) as usize];

    // A flat template correlates with nothing.
    if t_energy <= f64::EPSILON {
        return Some(ScoreMap { width, height, scores });
    }

    let integral = Integral::new(image);
    let raw = image.as_raw();
    let row_stride = iw as usize;
    let (tw, th) = (tw as usize, th as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let (sum, sum_sq) = integral.window(x, y, tw, th);
            let variance = sum_sq - sum * sum / n;
            let denom = (t_energy * variance).sqrt();
            if denom <= 1e-6 {
                continue;
            }

            // The template is zero-mean, so the window mean drops out.
            let mut cross = 0.0f64;
            for ty in 0..th {
                let img_row = (y + ty) * row_stride + x;
                let tpl_row = ty * tw;
                for tx in 0..tw {
                    cross += t_centered[tpl_row + tx] * raw[img_row + tx] as f64;
                }
            }

            let score = (cross / denom).clamp(-1.0, 1.0);
            scores[y * width as usize + x] = score as f32;
        }
    }

    Some(ScoreMap { width, height, scores })
}
