//! Native layout of the R graphics engine's device protocol.
//!
//! Everything in this module mirrors structs from R's `R_ext/GraphicsDevice.h`
//! and `R_ext/GraphicsEngine.h` at graphics engine version 13 (R 4.0.x), the
//! version this bridge targets. Field order and types must match the C
//! definitions exactly; the engine reads this memory directly.
//!
//! Opaque handles use the zero-sized-struct idiom from the Nomicon so they can
//! only ever be passed around by pointer.

#![allow(non_snake_case)]
#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::marker::{PhantomData, PhantomPinned};

/// R's C boolean. Zero is false, anything else is true.
pub type Rboolean = c_int;

pub const RBOOL_FALSE: Rboolean = 0;
pub const RBOOL_TRUE: Rboolean = 1;

/// The graphics engine version these struct layouts correspond to.
pub const GE_VERSION: c_int = 13;

/// Opaque R value handle. Only produced by the host engine (the `cap`
/// callback returns one); the bridge never looks inside.
#[repr(C)]
pub struct SexpRec {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

pub type SEXP = *mut SexpRec;

/// Opaque per-graphics-system state owned by the engine.
#[repr(C)]
pub struct GESystemDesc {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

pub type pDevDesc = *mut DevDesc;
pub type pGEDevDesc = *mut GEDevDesc;
pub type pGEcontext = *mut GEcontext;

// Callback slot signatures. One alias per protocol slot that carries its own
// shape; slots that share a C signature still get their own alias so the
// `DevDesc` fields read like the header.

pub type ActivateFn = unsafe extern "C-unwind" fn(dd: pDevDesc);
pub type DeactivateFn = unsafe extern "C-unwind" fn(dd: pDevDesc);
pub type CloseFn = unsafe extern "C-unwind" fn(dd: pDevDesc);
pub type OnExitFn = unsafe extern "C-unwind" fn(dd: pDevDesc);
pub type NewFrameConfirmFn = unsafe extern "C-unwind" fn(dd: pDevDesc) -> Rboolean;
pub type CapFn = unsafe extern "C-unwind" fn(dd: pDevDesc) -> SEXP;
pub type ModeFn = unsafe extern "C-unwind" fn(mode: c_int, dd: pDevDesc);
pub type NewPageFn = unsafe extern "C-unwind" fn(gc: pGEcontext, dd: pDevDesc);
pub type ClipFn = unsafe extern "C-unwind" fn(x0: f64, x1: f64, y0: f64, y1: f64, dd: pDevDesc);
pub type SizeFn = unsafe extern "C-unwind" fn(
    left: *mut f64,
    right: *mut f64,
    bottom: *mut f64,
    top: *mut f64,
    dd: pDevDesc,
);
pub type LocatorFn =
    unsafe extern "C-unwind" fn(x: *mut f64, y: *mut f64, dd: pDevDesc) -> Rboolean;
pub type CircleFn =
    unsafe extern "C-unwind" fn(x: f64, y: f64, r: f64, gc: pGEcontext, dd: pDevDesc);
pub type LineFn =
    unsafe extern "C-unwind" fn(x1: f64, y1: f64, x2: f64, y2: f64, gc: pGEcontext, dd: pDevDesc);
pub type RectFn =
    unsafe extern "C-unwind" fn(x0: f64, y0: f64, x1: f64, y1: f64, gc: pGEcontext, dd: pDevDesc);
pub type PolygonFn = unsafe extern "C-unwind" fn(
    n: c_int,
    x: *mut f64,
    y: *mut f64,
    gc: pGEcontext,
    dd: pDevDesc,
);
pub type PolylineFn = unsafe extern "C-unwind" fn(
    n: c_int,
    x: *mut f64,
    y: *mut f64,
    gc: pGEcontext,
    dd: pDevDesc,
);
pub type PathFn = unsafe extern "C-unwind" fn(
    x: *mut f64,
    y: *mut f64,
    npoly: c_int,
    nper: *mut c_int,
    winding: Rboolean,
    gc: pGEcontext,
    dd: pDevDesc,
);
pub type RasterFn = unsafe extern "C-unwind" fn(
    raster: *mut c_uint,
    w: c_int,
    h: c_int,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rot: f64,
    interpolate: Rboolean,
    gc: pGEcontext,
    dd: pDevDesc,
);
pub type MetricInfoFn = unsafe extern "C-unwind" fn(
    c: c_int,
    gc: pGEcontext,
    ascent: *mut f64,
    descent: *mut f64,
    width: *mut f64,
    dd: pDevDesc,
);
pub type StrWidthFn =
    unsafe extern "C-unwind" fn(str: *const c_char, gc: pGEcontext, dd: pDevDesc) -> f64;
pub type TextFn = unsafe extern "C-unwind" fn(
    x: f64,
    y: f64,
    str: *const c_char,
    rot: f64,
    hadj: f64,
    gc: pGEcontext,
    dd: pDevDesc,
);
pub type GetEventFn = unsafe extern "C-unwind" fn(env: SEXP, prompt: *const c_char) -> SEXP;
pub type EventHelperFn = unsafe extern "C-unwind" fn(dd: pDevDesc, code: c_int);
pub type HoldflushFn = unsafe extern "C-unwind" fn(dd: pDevDesc, level: c_int) -> c_int;

/// The device description block: the record the engine reads for every device
/// operation. The bridge owns exactly one per adapter and must keep its
/// address stable from registration to teardown.
#[repr(C)]
pub struct DevDesc {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub clipLeft: f64,
    pub clipRight: f64,
    pub clipBottom: f64,
    pub clipTop: f64,
    pub xCharOffset: f64,
    pub yCharOffset: f64,
    pub yLineBias: f64,
    pub ipr: [f64; 2],
    pub cra: [f64; 2],
    pub gamma: f64,
    pub canClip: Rboolean,
    pub canChangeGamma: Rboolean,
    pub canHAdj: c_int,
    pub startps: f64,
    pub startcol: c_int,
    pub startfill: c_int,
    pub startlty: c_int,
    pub startfont: c_int,
    pub startgamma: f64,
    /// Device-local state. The bridge points this at its pinned dispatch
    /// state so callbacks can find their adapter again.
    pub deviceSpecific: *mut c_void,
    pub displayListOn: Rboolean,
    pub canGenMouseDown: Rboolean,
    pub canGenMouseMove: Rboolean,
    pub canGenMouseUp: Rboolean,
    pub canGenKeybd: Rboolean,
    pub canGenIdle: Rboolean,
    pub gettingEvent: Rboolean,
    pub activate: Option<ActivateFn>,
    pub circle: Option<CircleFn>,
    pub clip: Option<ClipFn>,
    pub close: Option<CloseFn>,
    pub deactivate: Option<DeactivateFn>,
    pub locator: Option<LocatorFn>,
    pub line: Option<LineFn>,
    pub metricInfo: Option<MetricInfoFn>,
    pub mode: Option<ModeFn>,
    pub newPage: Option<NewPageFn>,
    pub polygon: Option<PolygonFn>,
    pub polyline: Option<PolylineFn>,
    pub rect: Option<RectFn>,
    pub path: Option<PathFn>,
    pub raster: Option<RasterFn>,
    pub cap: Option<CapFn>,
    pub size: Option<SizeFn>,
    pub strWidth: Option<StrWidthFn>,
    pub text: Option<TextFn>,
    pub onExit: Option<OnExitFn>,
    pub getEvent: Option<GetEventFn>,
    pub newFrameConfirm: Option<NewFrameConfirmFn>,
    pub hasTextUTF8: Rboolean,
    pub textUTF8: Option<TextFn>,
    pub strWidthUTF8: Option<StrWidthFn>,
    pub wantSymbolUTF8: Rboolean,
    pub useRotatedTextInContour: Rboolean,
    pub eventEnv: SEXP,
    pub eventHelper: Option<EventHelperFn>,
    pub holdflush: Option<HoldflushFn>,
    pub haveTransparency: c_int,
    pub haveTransparentBg: c_int,
    pub haveRaster: c_int,
    pub haveCapture: c_int,
    pub haveLocator: c_int,
    pub reserved: [c_char; 64],
}

impl DevDesc {
    /// An all-zero block: every callback slot empty (`None`), every flag
    /// false, every pointer null. All-zero is a valid state for this layout.
    pub fn zeroed() -> Self {
        // Option<fn> is null-pointer-optimized, so zeroed bytes are `None`.
        unsafe { std::mem::zeroed() }
    }
}

/// The engine-level wrapper around a [`DevDesc`]. The engine allocates this
/// when the device is created; the bridge only ever touches `dev`, to sever
/// the back-reference when the device closes.
#[repr(C)]
pub struct GEDevDesc {
    pub dev: pDevDesc,
    pub displayListOn: Rboolean,
    pub displayList: SEXP,
    pub DLlastElt: SEXP,
    pub savedSnapshot: SEXP,
    pub dirty: Rboolean,
    pub recordGraphics: Rboolean,
    pub gesd: [*mut GESystemDesc; 24],
    pub ask: Rboolean,
}

impl GEDevDesc {
    pub fn zeroed() -> Self {
        unsafe { std::mem::zeroed() }
    }
}

/// Snapshot of the engine's drawing state passed to most drawing callbacks
/// (`R_GE_gcontext`). Borrowed for the duration of one callback only.
#[repr(C)]
pub struct GEcontext {
    /// Packed stroke colour.
    pub col: c_int,
    /// Packed fill colour.
    pub fill: c_int,
    pub gamma: f64,
    /// Line width in 1/96 inch multiples.
    pub lwd: f64,
    /// Line type bit pattern.
    pub lty: c_int,
    /// Line end cap: 1 round, 2 butt, 3 square.
    pub lend: c_int,
    /// Line join: 1 round, 2 mitre, 3 bevel.
    pub ljoin: c_int,
    pub lmitre: f64,
    /// Character expansion factor.
    pub cex: f64,
    /// Font size in points.
    pub ps: f64,
    pub lineheight: f64,
    /// 1 plain, 2 bold, 3 italic, 4 bold italic, 5 symbol.
    pub fontface: c_int,
    /// NUL-terminated font family name.
    pub fontfamily: [c_char; 201],
}

impl GEcontext {
    pub fn zeroed() -> Self {
        unsafe { std::mem::zeroed() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_block_has_empty_slots() {
        let dd = DevDesc::zeroed();
        assert!(dd.activate.is_none());
        assert!(dd.raster.is_none());
        assert!(dd.eventHelper.is_none());
        assert!(dd.deviceSpecific.is_null());
        assert_eq!(dd.canClip, RBOOL_FALSE);
    }

    #[test]
    fn ge_block_back_reference_starts_null() {
        let ge = GEDevDesc::zeroed();
        assert!(ge.dev.is_null());
    }
}
