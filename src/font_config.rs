// src/font_config.rs

// Font sizes are given in points and converted to pixels with the figure DPI,
// so a chart rendered at 300 DPI keeps the proportions of the 150 DPI one.

/// Font family handed to plotters for every text element.
pub const FONT_FAMILY: &str = "sans-serif";

pub const FONT_PT_TITLE: f64 = 13.0;
pub const FONT_PT_AXIS_DESC: f64 = 12.0;
pub const FONT_PT_TICK_LABEL: f64 = 10.0;
pub const FONT_PT_LEGEND: f64 = 11.0;

const POINTS_PER_INCH: f64 = 72.0;

/// Pixel size of a font given in points at `dpi`.
pub fn font_px(points: f64, dpi: u32) -> f64 {
    (points * dpi as f64 / POINTS_PER_INCH).max(1.0)
}

/// Font tuples for plotters' `IntoFont`/`TextStyle` conversions at a given DPI.
#[derive(Debug, Clone, Copy)]
pub struct ChartFonts {
    pub title: (&'static str, f64),
    pub axis_desc: (&'static str, f64),
    pub tick_label: (&'static str, f64),
    pub legend: (&'static str, f64),
}

impl ChartFonts {
    pub fn for_dpi(dpi: u32) -> Self {
        Self {
            title: (FONT_FAMILY, font_px(FONT_PT_TITLE, dpi)),
            axis_desc: (FONT_FAMILY, font_px(FONT_PT_AXIS_DESC, dpi)),
            tick_label: (FONT_FAMILY, font_px(FONT_PT_TICK_LABEL, dpi)),
            legend: (FONT_FAMILY, font_px(FONT_PT_LEGEND, dpi)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_px_scales_with_dpi() {
        assert!((font_px(12.0, 72) - 12.0).abs() < 1e-9);
        assert!((font_px(12.0, 144) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_font_px_never_below_one_pixel() {
        assert_eq!(font_px(0.0, 150), 1.0);
    }
}

// src/font_config.rs
