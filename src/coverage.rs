// Coverage scoring: what fraction of the reference glyph has the user inked over?
// Pure function of the two buffers' alpha channels.

use log::warn;

use crate::raster::RasterBuffer;

/// Minimum coverage (percent, inclusive) for a trace to pass.
pub const PASS_THRESHOLD: f64 = 90.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverageResult {
    /// Pixels with nonzero alpha in the reference mask.
    pub total_reference_pixels: u64,
    /// Of those, pixels the user also inked. Never exceeds the total.
    pub covered_pixels: u64,
    /// covered / total * 100, or 0 when there is no reference ink.
    pub percentage: f64,
    pub passed: bool,
}

impl CoverageResult {
    pub fn from_counts(total_reference_pixels: u64, covered_pixels: u64, threshold: f64) -> Self {
        let covered_pixels = covered_pixels.min(total_reference_pixels);
        // Multiply before dividing so whole percentages come out exact.
        let percentage = if total_reference_pixels == 0 {
            0.0
        } else {
            covered_pixels as f64 * 100.0 / total_reference_pixels as f64
        };
        Self { total_reference_pixels, covered_pixels, percentage, passed: percentage >= threshold }
    }

    /// Percentage as shown to the user.
    pub fn rounded_percent(&self) -> u32 {
        self.percentage.round() as u32
    }

    pub fn message(&self) -> String {
        if self.passed {
            format!("Excellent! You covered {}% of the word.", self.rounded_percent())
        } else {
            format!("Try again. You only covered {}%.", self.rounded_percent())
        }
    }
}

/// Score with the standard 90% threshold.
pub fn score(reference: &RasterBuffer, ink: &RasterBuffer) -> CoverageResult {
    score_with_threshold(reference, ink, PASS_THRESHOLD)
}

/// Walk both alpha channels in lockstep. Color is ignored; any nonzero alpha counts.
/// Buffers of different sizes cannot be aligned, so such ink covers nothing.
pub fn score_with_threshold(reference: &RasterBuffer, ink: &RasterBuffer, threshold: f64) -> CoverageResult {
    if reference.dimensions() != ink.dimensions() {
        warn!(
            "coverage: reference {:?} and ink {:?} differ in size; counting no coverage",
            reference.dimensions(),
            ink.dimensions()
        );
        let total = reference.inked_pixels() as u64;
        return CoverageResult::from_counts(total, 0, threshold);
    }

    let mut total = 0u64;
    let mut covered = 0u64;
    for (r, i) in reference.alpha_channel().zip(ink.alpha_channel()) {
        if r == 0 {
            continue;
        }
        total += 1;
        if i > 0 {
            covered += 1;
        }
    }
    CoverageResult::from_counts(total, covered, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{GlyphRenderer, PANEL_HEIGHT};
    use crate::types::{Point, Rgba};
    use proptest::prelude::*;

    const BLACK: Rgba = Rgba::opaque(0x000000);

    /// Copy `reference`'s alpha footprint into a fresh buffer, in a different color.
    fn trace_exactly(reference: &RasterBuffer) -> RasterBuffer {
        let (w, h) = reference.dimensions();
        let mut ink = RasterBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                if reference.alpha_at(x, y) > 0 {
                    ink.fill_rect(x as i32, y as i32, 1, 1, Rgba::opaque(0xE5E7EB));
                }
            }
        }
        ink
    }

    #[test_log::test]
    fn perfect_trace_scores_100() {
        let reference = GlyphRenderer::default().render("cat", 300, PANEL_HEIGHT);
        let ink = trace_exactly(&reference);
        let result = score(&reference, &ink);
        assert_eq!(result.percentage, 100.0);
        assert!(result.passed);
        assert_eq!(result.covered_pixels, result.total_reference_pixels);
    }

    #[test_log::test]
    fn empty_ink_scores_zero() {
        let reference = GlyphRenderer::default().render("cat", 300, PANEL_HEIGHT);
        let ink = RasterBuffer::new(300, PANEL_HEIGHT);
        let result = score(&reference, &ink);
        assert!(result.total_reference_pixels > 0);
        assert_eq!(result.covered_pixels, 0);
        assert_eq!(result.percentage, 0.0);
        assert!(!result.passed);
    }

    #[test_log::test]
    fn empty_reference_is_zero_percent_not_nan() {
        let reference = RasterBuffer::new(50, 50);
        let mut ink = RasterBuffer::new(50, 50);
        ink.fill_rect(0, 0, 50, 50, BLACK);
        let result = score(&reference, &ink);
        assert_eq!(result.total_reference_pixels, 0);
        assert_eq!(result.percentage, 0.0);
        assert!(!result.passed);
    }

    #[test_log::test]
    fn ink_outside_the_glyph_does_not_count() {
        let mut reference = RasterBuffer::new(100, 100);
        reference.fill_rect(10, 10, 10, 10, BLACK);
        let mut ink = RasterBuffer::new(100, 100);
        ink.fill_rect(50, 50, 40, 40, BLACK);
        let result = score(&reference, &ink);
        assert_eq!(result.total_reference_pixels, 100);
        assert_eq!(result.covered_pixels, 0);
    }

    #[test_log::test]
    fn only_alpha_matters() {
        let mut reference = RasterBuffer::new(10, 10);
        reference.fill_rect(0, 0, 10, 1, Rgba::new(255, 0, 0, 1));
        let mut ink = RasterBuffer::new(10, 10);
        ink.fill_rect(0, 0, 5, 1, Rgba::new(0, 255, 0, 3));
        let result = score(&reference, &ink);
        assert_eq!(result.total_reference_pixels, 10);
        assert_eq!(result.covered_pixels, 5);
        assert_eq!(result.percentage, 50.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let exact = CoverageResult::from_counts(10, 9, PASS_THRESHOLD);
        assert_eq!(exact.percentage, 90.0);
        assert!(exact.passed);

        let just_under = CoverageResult::from_counts(100_000, 89_999, PASS_THRESHOLD);
        assert!((just_under.percentage - 89.999).abs() < 1e-9);
        assert!(!just_under.passed);
    }

    #[test]
    fn covered_is_clamped_to_total() {
        let result = CoverageResult::from_counts(5, 9, PASS_THRESHOLD);
        assert_eq!(result.covered_pixels, 5);
        assert_eq!(result.percentage, 100.0);
    }

    #[test]
    fn messages_round_the_percentage() {
        let pass = CoverageResult::from_counts(1000, 954, PASS_THRESHOLD);
        assert_eq!(pass.message(), "Excellent! You covered 95% of the word.");
        let fail = CoverageResult::from_counts(1000, 104, PASS_THRESHOLD);
        assert_eq!(fail.message(), "Try again. You only covered 10%.");
    }

    #[test_log::test]
    fn mismatched_sizes_count_no_coverage() {
        let mut reference = RasterBuffer::new(20, 20);
        reference.fill_rect(0, 0, 20, 20, BLACK);
        let mut ink = RasterBuffer::new(10, 10);
        ink.fill_rect(0, 0, 10, 10, BLACK);
        let result = score(&reference, &ink);
        assert_eq!(result.total_reference_pixels, 400);
        assert_eq!(result.covered_pixels, 0);
    }

    #[test_log::test]
    fn a_short_unrelated_mark_fails() {
        let reference = GlyphRenderer::default().render("cat", 300, PANEL_HEIGHT);
        let mut ink = RasterBuffer::new(300, PANEL_HEIGHT);
        ink.draw_line(Point::new(100.0, 100.0), Point::new(110.0, 100.0), 5.0, BLACK);
        let result = score(&reference, &ink);
        assert!(!result.passed);
        assert!(result.percentage < 90.0);
    }

    proptest! {
        #[test]
        fn adding_ink_never_lowers_coverage(
            glyph in prop::collection::vec((0i32..40, 0i32..40, 1i32..10, 1i32..10), 1..6),
            first in prop::collection::vec((0i32..40, 0i32..40, 1i32..10, 1i32..10), 0..6),
            more in prop::collection::vec((0i32..40, 0i32..40, 1i32..10, 1i32..10), 1..6),
        ) {
            let mut reference = RasterBuffer::new(40, 40);
            for (x, y, w, h) in glyph {
                reference.fill_rect(x, y, w, h, BLACK);
            }
            let mut ink = RasterBuffer::new(40, 40);
            for (x, y, w, h) in first {
                ink.fill_rect(x, y, w, h, BLACK);
            }
            let before = score(&reference, &ink);
            for (x, y, w, h) in more {
                ink.fill_rect(x, y, w, h, Rgba::new(9, 9, 9, 40));
            }
            let after = score(&reference, &ink);

            prop_assert!(after.covered_pixels >= before.covered_pixels);
            prop_assert!(after.covered_pixels <= after.total_reference_pixels);
            prop_assert_eq!(after.total_reference_pixels, before.total_reference_pixels);
        }

        #[test]
        fn pass_iff_percentage_reaches_threshold(total in 1u64..10_000, frac in 0.0f64..=1.0) {
            let covered = (total as f64 * frac).floor() as u64;
            let result = CoverageResult::from_counts(total, covered, PASS_THRESHOLD);
            prop_assert!((0.0..=100.0).contains(&result.percentage));
            prop_assert_eq!(result.passed, covered * 100 >= 90 * total);
        }
    }
}
