//! Unit conversions shared by the layout planner and the PDF assembler.
//!
//! Layout arithmetic happens in device pixels at the configured DPI; the PDF
//! is written in points. Both sides go through these helpers so the two never
//! drift apart.

/// Millimetres per inch.
pub const MM_PER_INCH: f32 = 25.4;

/// PDF points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Converts a physical length to whole pixels at `dpi`, rounding to nearest.
pub fn mm_to_px(mm: f32, dpi: u32) -> u32 {
    (mm * dpi as f32 / MM_PER_INCH).round() as u32
}

/// Scale factor from pixels at `dpi` to PDF points.
pub fn px_to_pt_factor(dpi: u32) -> f32 {
    POINTS_PER_INCH / dpi as f32
}

pub fn px_to_pt(px: f32, dpi: u32) -> f32 {
    px * px_to_pt_factor(dpi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_width_at_150_dpi() {
        assert_eq!(mm_to_px(210.0, 150), 1240);
        assert_eq!(mm_to_px(297.0, 150), 1754);
    }

    #[test]
    fn a4_width_at_300_dpi_matches_common_print_size() {
        assert_eq!(mm_to_px(210.0, 300), 2480);
        assert_eq!(mm_to_px(297.0, 300), 3508);
    }

    #[test]
    fn one_inch_of_pixels_is_72_points() {
        assert!((px_to_pt(150.0, 150) - 72.0).abs() < 1e-4);
        assert!((px_to_pt(300.0, 300) - 72.0).abs() < 1e-4);
    }
}
