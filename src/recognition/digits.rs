//! Digit decoding inside a value region.

use image::GrayImage;

use super::matching::match_template;

/// One digit template placement scoring above threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitHit {
    pub x: u32,
    pub score: f32,
    pub digit: u8,
}

/// Every placement of every digit template scoring at least `threshold`.
pub fn find_digit_candidates(
    region: &GrayImage,
    digits: &[GrayImage; 10],
    threshold: f32,
) -> Vec<DigitHit> {
    let mut hits = Vec::new();
    for (digit, template) in digits.iter().enumerate() {
        let Some(map) = match_template(region, template) else {
            continue;
        };
        for (x, _y, score) in map.above(threshold) {
            hits.push(DigitHit {
                x,
                score,
                digit: digit as u8,
            });
        }
    }
    hits
}

/// Greedy horizontal non-maximum suppression.
///
/// Best score first (ties by smaller x); a hit is kept only if no kept hit is
/// closer than `min_distance` px horizontally. Survivors come back sorted by x.
pub fn dedup_hits(mut hits: Vec<DigitHit>, min_distance: u32) -> Vec<DigitHit> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.x.cmp(&b.x)));

    let mut kept: Vec<DigitHit> = Vec::new();
    for hit in hits {
        if kept.iter().all(|k| k.x.abs_diff(hit.x) >= min_distance) {
            kept.push(hit);
        }
    }
    kept.sort_by_key(|h| h.x);
    kept
}

/// Decode the digit string drawn in `region`, left to right.
pub fn read_digits(
    region: &GrayImage,
    digits: &[GrayImage; 10],
    threshold: f32,
    min_distance: u32,
) -> String {
    let hits = find_digit_candidates(region, digits, threshold);
    dedup_hits(hits, min_distance)
        .iter()
        .map(|h| char::from(b'0' + h.digit))
        .collect()
}

/// Parse a decoded digit string, rejecting empty input and values above `max`.
pub fn parse_value(digits: &str, max: u32) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    if value > max as u64 {
        return None;
    }
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn hit(x: u32, score: f32, digit: u8) -> DigitHit {
        DigitHit { x, score, digit }
    }

    fn glyph(seed: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(747796405).wrapping_add(2891336453);
        GrayImage::from_fn(8, 16, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([if state % 2 == 0 { 40 } else { 220 }])
        })
    }

    fn glyphs() -> [GrayImage; 10] {
        std::array::from_fn(|d| glyph(d as u32 + 1))
    }

    fn render(digits: &[GrayImage; 10], text: &str, pitch: u32) -> GrayImage {
        let mut img = GrayImage::new(4 + pitch * text.len() as u32 + 8, 20);
        for (i, c) in text.bytes().enumerate() {
            let tpl = &digits[(c - b'0') as usize];
            let x0 = 2 + i as u32 * pitch;
            for (sx, sy, p) in tpl.enumerate_pixels() {
                img.put_pixel(x0 + sx, 2 + sy, *p);
            }
        }
        img
    }

    #[test]
    fn test_dedup_keeps_best_and_sorts_by_x() {
        let hits = vec![
            hit(30, 0.7, 1),
            hit(3, 0.9, 4),
            hit(5, 0.95, 9),
            hit(18, 0.8, 2),
        ];
        let kept = dedup_hits(hits, 10);
        let digits: Vec<u8> = kept.iter().map(|h| h.digit).collect();
        assert_eq!(digits, vec![9, 2, 1]);
    }

    #[test]
    fn test_dedup_boundary_distance_is_kept() {
        let kept = dedup_hits(vec![hit(0, 0.9, 1), hit(10, 0.8, 2)], 10);
        assert_eq!(kept.len(), 2);
        let kept = dedup_hits(vec![hit(0, 0.9, 1), hit(9, 0.8, 2)], 10);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_dedup_equal_scores_prefer_left() {
        let kept = dedup_hits(vec![hit(6, 0.8, 2), hit(2, 0.8, 7)], 10);
        assert_eq!(kept, vec![hit(2, 0.8, 7)]);
    }

    #[test]
    fn test_all_digits_decode_in_order() {
        let digits = glyphs();
        let img = render(&digits, "0123456789", 10);
        assert_eq!(read_digits(&img, &digits, 0.6, 10), "0123456789");
    }

    #[test]
    fn test_narrow_spacing_collapses() {
        let digits = glyphs();
        let img = render(&digits, "0123456789", 6);
        let decoded = read_digits(&img, &digits, 0.6, 10);
        assert!(decoded.len() < 10, "decoded {}", decoded);
    }

    #[test]
    fn test_empty_region_reads_nothing() {
        let digits = glyphs();
        let img = GrayImage::new(60, 20);
        assert_eq!(read_digits(&img, &digits, 0.6, 10), "");
    }

    #[test]
    fn test_parse_value_ceiling() {
        assert_eq!(parse_value("1200", 1200), Some(1200));
        assert_eq!(parse_value("1201", 1200), None);
        assert_eq!(parse_value("0042", 1200), Some(42));
        assert_eq!(parse_value("", 1200), None);
        assert_eq!(parse_value("99999999999999999999999", 1200), None);
    }
}
