use crate::raster::Color;

/// How the device handles horizontal text adjustment requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TextAdjustment {
    /// Adjustment is ignored.
    None = 0,
    /// Only 0, 0.5 and 1 are honoured.
    Halves = 1,
    /// Any value in [0, 1] is honoured.
    Continuous = 2,
}

/// Startup parameters written into the device description block when a
/// device is registered.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Initial surface width in points.
    pub width: f64,
    /// Initial surface height in points.
    pub height: f64,
    /// Initial font size in points.
    pub point_size: f64,
    /// Inches per raster unit, horizontal and vertical.
    pub inches_per_unit: (f64, f64),
    /// Character offsets as a fraction of character size, used by the engine
    /// to centre and justify text.
    pub x_char_offset: f64,
    pub y_char_offset: f64,
    pub y_line_bias: f64,
    pub gamma: f64,
    pub foreground: Color,
    pub background: Color,
    pub text_adjustment: TextAdjustment,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // 7x7 inches at 72 points per inch.
            width: 504.0,
            height: 504.0,
            point_size: 12.0,
            inches_per_unit: (1.0 / 72.0, 1.0 / 72.0),
            x_char_offset: 0.4900,
            y_char_offset: 0.3333,
            y_line_bias: 0.2,
            gamma: 1.0,
            foreground: Color::BLACK,
            background: Color::WHITE,
            text_adjustment: TextAdjustment::Continuous,
        }
    }
}
