// src/font_safe_backend.rs

// Drawing backend wrapper that keeps rendering when no usable font exists.
// plotters resolves "sans-serif" through the system font stack; on headless
// hosts without fonts that lookup errors (or panics inside the font loader).
// Text is then dropped and sized by estimate, lines and grid still render.

use std::panic::{self, AssertUnwindSafe};

use log::warn;
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};

// Average glyph advance relative to the font size, used when measuring fails.
const FALLBACK_CHAR_WIDTH_RATIO: f64 = 0.6;

pub struct FontSafeBackend<DB> {
    inner: DB,
    text_disabled: bool,
}

impl<DB> FontSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self {
            inner,
            text_disabled: false,
        }
    }

    /// True once a font failure caused text to be skipped.
    pub fn text_disabled(&self) -> bool {
        self.text_disabled
    }

    fn disable_text(&mut self, reason: &str) {
        if !self.text_disabled {
            warn!("Text rendering unavailable ({reason}); drawing chart without labels.");
            self.text_disabled = true;
        }
    }
}

fn estimated_text_size<TStyle: BackendTextStyle>(text: &str, style: &TStyle) -> (u32, u32) {
    let size = style.size().max(1.0);
    let width = text.chars().count() as f64 * size * FALLBACK_CHAR_WIDTH_RATIO;
    (width.ceil() as u32, size.ceil() as u32)
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if self.text_disabled {
            return Ok(());
        }
        let inner = &mut self.inner;
        match panic::catch_unwind(AssertUnwindSafe(|| inner.draw_text(text, style, pos))) {
            Ok(Err(DrawingErrorKind::FontError(e))) => {
                self.disable_text(&e.to_string());
                Ok(())
            }
            Ok(result) => result,
            Err(_) => {
                self.disable_text("font loader panicked");
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        if self.text_disabled {
            return Ok(estimated_text_size(text, style));
        }
        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                Ok(estimated_text_size(text, style))
            }
            Ok(result) => result,
        }
    }
}
