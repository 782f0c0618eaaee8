//! Ownership of the native device description block.
//!
//! [`DeviceDescription`] boxes the `#[repr(C)]` record so its address stays
//! stable for the whole device lifetime; the engine keeps the raw pointer
//! and reads through it on every callback. The block is valid only between
//! registration and teardown, and there is exactly one per adapter.

use std::ffi::c_void;

use crate::config::DeviceConfig;
use crate::device::DeviceCapabilities;
use crate::ffi::{pDevDesc, DevDesc, RBOOL_FALSE, RBOOL_TRUE};

// R encodes "have" capabilities as 1 = no, 2 = yes.
const HAVE_NO: i32 = 1;
const HAVE_YES: i32 = 2;

pub struct DeviceDescription {
    raw: Box<DevDesc>,
}

impl DeviceDescription {
    /// Allocate a block populated with the device's startup state. Callback
    /// slots start empty; the registry fills them in.
    pub fn new(config: &DeviceConfig, capabilities: DeviceCapabilities) -> Self {
        let mut raw = Box::new(DevDesc::zeroed());

        raw.left = 0.0;
        raw.right = config.width;
        raw.bottom = config.height;
        raw.top = 0.0;
        raw.clipLeft = raw.left;
        raw.clipRight = raw.right;
        raw.clipBottom = raw.bottom;
        raw.clipTop = raw.top;

        raw.xCharOffset = config.x_char_offset;
        raw.yCharOffset = config.y_char_offset;
        raw.yLineBias = config.y_line_bias;
        raw.ipr = [config.inches_per_unit.0, config.inches_per_unit.1];
        // Nominal character size in raster units; the conventional guess of
        // 0.9 x / 1.2 x the start font size.
        raw.cra = [0.9 * config.point_size, 1.2 * config.point_size];
        raw.gamma = config.gamma;

        raw.canClip = bool_flag(capabilities.contains(DeviceCapabilities::CLIP));
        raw.canChangeGamma = RBOOL_FALSE;
        raw.canHAdj = config.text_adjustment as i32;

        raw.startps = config.point_size;
        raw.startcol = config.foreground.to_packed() as i32;
        raw.startfill = config.background.to_packed() as i32;
        raw.startlty = 0;
        raw.startfont = 1;
        raw.startgamma = config.gamma;

        raw.displayListOn = RBOOL_TRUE;

        raw.hasTextUTF8 = bool_flag(capabilities.contains(DeviceCapabilities::UTF8_TEXT));
        raw.wantSymbolUTF8 = raw.hasTextUTF8;
        raw.useRotatedTextInContour = RBOOL_FALSE;

        raw.haveTransparency =
            have_flag(capabilities.contains(DeviceCapabilities::TRANSPARENCY));
        raw.haveTransparentBg =
            have_flag(capabilities.contains(DeviceCapabilities::TRANSPARENT_BACKGROUND));
        raw.haveRaster = have_flag(capabilities.contains(DeviceCapabilities::RASTER));
        raw.haveCapture = have_flag(capabilities.contains(DeviceCapabilities::CAPTURE));
        raw.haveLocator = have_flag(capabilities.contains(DeviceCapabilities::LOCATOR));

        Self { raw }
    }

    /// Stable address of the block. Valid until this value is dropped.
    pub fn as_mut_ptr(&mut self) -> pDevDesc {
        self.raw.as_mut() as *mut DevDesc
    }

    pub fn raw(&self) -> &DevDesc {
        &self.raw
    }

    pub fn raw_mut(&mut self) -> &mut DevDesc {
        &mut self.raw
    }

    /// Point the block's device-local state at the adapter's dispatch state.
    pub fn set_device_data(&mut self, data: *mut c_void) {
        self.raw.deviceSpecific = data;
    }
}

fn bool_flag(value: bool) -> i32 {
    if value {
        RBOOL_TRUE
    } else {
        RBOOL_FALSE
    }
}

fn have_flag(value: bool) -> i32 {
    if value {
        HAVE_YES
    } else {
        HAVE_NO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Color;

    #[test]
    fn startup_state_reflects_config() {
        let config = DeviceConfig {
            width: 640.0,
            height: 480.0,
            point_size: 10.0,
            foreground: Color::rgb(1, 2, 3),
            ..DeviceConfig::default()
        };
        let description = DeviceDescription::new(&config, DeviceCapabilities::standard());
        let raw = description.raw();

        assert_eq!(raw.right, 640.0);
        assert_eq!(raw.bottom, 480.0);
        assert_eq!(raw.clipRight, 640.0);
        assert_eq!(raw.startps, 10.0);
        assert_eq!(raw.startcol as u32, Color::rgb(1, 2, 3).to_packed());
        assert_eq!(raw.cra, [9.0, 12.0]);
    }

    #[test]
    fn capability_flags_round_trip_into_block_fields() {
        let caps = DeviceCapabilities::CAPTURE | DeviceCapabilities::LOCATOR;
        let description = DeviceDescription::new(&DeviceConfig::default(), caps);
        let raw = description.raw();

        assert_eq!(raw.canClip, RBOOL_FALSE);
        assert_eq!(raw.haveCapture, HAVE_YES);
        assert_eq!(raw.haveLocator, HAVE_YES);
        assert_eq!(raw.haveRaster, HAVE_NO);
        assert_eq!(raw.haveTransparency, HAVE_NO);
        assert_eq!(raw.hasTextUTF8, RBOOL_FALSE);
    }

    #[test]
    fn block_address_is_stable_across_moves() {
        let mut description =
            DeviceDescription::new(&DeviceConfig::default(), DeviceCapabilities::standard());
        let before = description.as_mut_ptr();
        let mut moved = description;
        assert_eq!(before, moved.as_mut_ptr());
    }
}
