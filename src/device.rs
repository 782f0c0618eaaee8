//! The pluggable rendering backend seam.
//!
//! A [`RenderingBackend`] is the full capability set the engine's device
//! protocol can exercise. The bridge owns exactly one backend per adapter
//! and dispatches every native callback to it; the backend never talks to
//! the engine directly.
//!
//! Drawing methods return `anyhow::Result` so a backend can report surface
//! or I/O failures. Errors cannot cross the native callback boundary, so the
//! adapter logs them and carries on.

use crate::config::DeviceConfig;
use crate::context::GraphicsContext;
use crate::geometry::{Point, Points, Rectangle, Subpaths};
use crate::raster::Raster;

bitflags::bitflags! {
    /// Optional abilities a backend advertises at registration time. They
    /// are written into the description block so the engine knows what it
    /// may ask of the device.
    pub struct DeviceCapabilities: u32 {
        /// The device clips to [`RenderingBackend::clip`] regions itself.
        const CLIP = 1 << 0;
        /// Semi-transparent colours are honoured.
        const TRANSPARENCY = 1 << 1;
        /// A semi-transparent canvas background is honoured.
        const TRANSPARENT_BACKGROUND = 1 << 2;
        /// `raster` draws are supported.
        const RASTER = 1 << 3;
        /// `cap` captures are supported.
        const CAPTURE = 1 << 4;
        /// `locator` requests can produce a point.
        const LOCATOR = 1 << 5;
        /// Text arrives as UTF-8 through the dedicated protocol slots.
        const UTF8_TEXT = 1 << 6;
    }
}

impl DeviceCapabilities {
    /// What a typical screen backend supports.
    pub fn standard() -> Self {
        DeviceCapabilities::CLIP
            | DeviceCapabilities::TRANSPARENCY
            | DeviceCapabilities::RASTER
            | DeviceCapabilities::UTF8_TEXT
    }
}

/// Text measurement result for a single character.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metric {
    pub ascent: f64,
    pub descent: f64,
    pub width: f64,
}

pub trait RenderingBackend {
    /// Device name shown in the engine's device list.
    fn name(&self) -> &str;

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities::standard()
    }

    fn config(&self) -> DeviceConfig {
        DeviceConfig::default()
    }

    // Lifecycle.

    fn on_activated(&mut self) {}

    fn on_deactivated(&mut self) {}

    fn on_closed(&mut self) {}

    fn on_draw_started(&mut self) {}

    fn on_draw_stopped(&mut self) {}

    fn on_new_page(&mut self, context: &GraphicsContext<'_>) -> anyhow::Result<()>;

    /// Current surface extent. The adapter forwards the edges verbatim, so
    /// the rectangle's own normalization is what guarantees ordered edges.
    fn on_resized(&mut self) -> Rectangle;

    fn confirm_new_frame(&mut self) -> bool {
        true
    }

    // State.

    fn clip(&mut self, region: Rectangle);

    /// A user-chosen location, or `None` when the device cannot provide one.
    fn get_location(&mut self) -> Option<Point> {
        None
    }

    // Drawing.

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    fn draw_circle(
        &mut self,
        center: Point,
        radius: f64,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    fn draw_rectangle(
        &mut self,
        region: Rectangle,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    fn draw_polygon(
        &mut self,
        vertices: Points<'_>,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    fn draw_polyline(
        &mut self,
        vertices: Points<'_>,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    /// Draw a multi-contour path. `winding` selects the winding fill rule
    /// over even-odd; it is passed through from the engine unchanged.
    fn draw_path(
        &mut self,
        subpaths: Subpaths<'_>,
        winding: bool,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    fn draw_raster(
        &mut self,
        pixels: Raster,
        target: Rectangle,
        rotation: f64,
        interpolate: bool,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        rotation: f64,
        adjustment: f64,
        context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()>;

    // Queries.

    /// Snapshot the current surface as a pixel grid.
    fn capture(&mut self) -> anyhow::Result<Raster> {
        anyhow::bail!("device '{}' does not support capture", self.name())
    }

    fn measure_width(&mut self, text: &str, context: &GraphicsContext<'_>) -> f64;

    /// Metrics for a single character. Negative code points are the
    /// engine's convention for Unicode values on non-UTF-8 slots.
    fn metric_info(&mut self, character: i32, context: &GraphicsContext<'_>) -> Metric;
}
