//! Read-only view of the engine's drawing state for one callback.

use crate::ffi::{pGEcontext, GEcontext};
use crate::raster::Color;

/// Line end cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Round,
    Butt,
    Square,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Round,
    Mitre,
    Bevel,
}

/// Font face requested for text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Plain,
    Bold,
    Italic,
    BoldItalic,
    Symbol,
}

/// Borrowed view over the engine's graphics context record.
///
/// Valid only for the duration of the callback that received the underlying
/// pointer; backends must copy anything they want to keep.
pub struct GraphicsContext<'a> {
    raw: &'a GEcontext,
}

impl<'a> GraphicsContext<'a> {
    /// Wrap the raw context pointer a callback received. Returns `None` for
    /// a null pointer.
    ///
    /// # Safety
    ///
    /// A non-null `gc` must point to a live `GEcontext` that stays valid and
    /// unmodified for `'a`.
    pub unsafe fn from_raw(gc: pGEcontext) -> Option<Self> {
        if gc.is_null() {
            None
        } else {
            Some(Self { raw: &*gc })
        }
    }

    /// Wrap an owned record, mainly for backends under test.
    pub fn from_ref(raw: &'a GEcontext) -> Self {
        Self { raw }
    }

    /// Stroke colour.
    pub fn foreground(&self) -> Color {
        Color::from_packed(self.raw.col as u32)
    }

    /// Fill colour.
    pub fn fill(&self) -> Color {
        Color::from_packed(self.raw.fill as u32)
    }

    pub fn gamma(&self) -> f64 {
        self.raw.gamma
    }

    /// Line width in 1/96 inch multiples.
    pub fn line_width(&self) -> f64 {
        self.raw.lwd
    }

    /// Raw dash pattern bits; zero is a solid line.
    pub fn line_type(&self) -> i32 {
        self.raw.lty
    }

    pub fn line_end(&self) -> LineEnd {
        match self.raw.lend {
            2 => LineEnd::Butt,
            3 => LineEnd::Square,
            _ => LineEnd::Round,
        }
    }

    pub fn line_join(&self) -> LineJoin {
        match self.raw.ljoin {
            2 => LineJoin::Mitre,
            3 => LineJoin::Bevel,
            _ => LineJoin::Round,
        }
    }

    pub fn mitre_limit(&self) -> f64 {
        self.raw.lmitre
    }

    /// Character expansion factor; multiply by [`Self::point_size`] for the
    /// effective font size.
    pub fn char_expansion(&self) -> f64 {
        self.raw.cex
    }

    /// Base font size in points.
    pub fn point_size(&self) -> f64 {
        self.raw.ps
    }

    pub fn line_height(&self) -> f64 {
        self.raw.lineheight
    }

    pub fn font_face(&self) -> FontFace {
        match self.raw.fontface {
            2 => FontFace::Bold,
            3 => FontFace::Italic,
            4 => FontFace::BoldItalic,
            5 => FontFace::Symbol,
            _ => FontFace::Plain,
        }
    }

    /// Requested font family; empty means the device default.
    pub fn font_family(&self) -> String {
        let bytes: Vec<u8> = self
            .raw
            .fontfamily
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> GEcontext {
        let mut raw = GEcontext::zeroed();
        raw.col = Color::rgb(255, 0, 0).to_packed() as i32;
        raw.fill = Color::rgb(0, 0, 255).to_packed() as i32;
        raw.lwd = 2.0;
        raw.lend = 2;
        raw.ljoin = 3;
        raw.cex = 1.5;
        raw.ps = 11.0;
        raw.fontface = 4;
        for (slot, byte) in raw.fontfamily.iter_mut().zip(b"serif") {
            *slot = *byte as _;
        }
        raw
    }

    #[test]
    fn derived_fields_decode_the_record() {
        let raw = sample_context();
        let ctx = GraphicsContext::from_ref(&raw);
        assert_eq!(ctx.foreground(), Color::rgb(255, 0, 0));
        assert_eq!(ctx.fill(), Color::rgb(0, 0, 255));
        assert_eq!(ctx.line_width(), 2.0);
        assert_eq!(ctx.line_end(), LineEnd::Butt);
        assert_eq!(ctx.line_join(), LineJoin::Bevel);
        assert_eq!(ctx.font_face(), FontFace::BoldItalic);
        assert_eq!(ctx.font_family(), "serif");
    }

    #[test]
    fn unknown_enum_codes_fall_back_to_round_and_plain() {
        let mut raw = GEcontext::zeroed();
        raw.lend = 99;
        raw.ljoin = 0;
        raw.fontface = 0;
        let ctx = GraphicsContext::from_ref(&raw);
        assert_eq!(ctx.line_end(), LineEnd::Round);
        assert_eq!(ctx.line_join(), LineJoin::Round);
        assert_eq!(ctx.font_face(), FontFace::Plain);
    }

    #[test]
    fn null_pointer_yields_no_view() {
        assert!(unsafe { GraphicsContext::from_raw(std::ptr::null_mut()) }.is_none());
    }
}
