//! The graphics device adapter.
//!
//! [`GraphicsDeviceAdapter`] owns one rendering backend and one device
//! description block, registers the block with a host engine, and routes
//! every native callback the engine issues back to the backend. The engine
//! keeps raw pointers into the adapter for the whole device lifetime, so the
//! dispatch state is pinned: its address never moves between `bind` and
//! disposal.
//!
//! All of this runs on the single thread that owns the engine's evaluation
//! context. Callbacks arrive in engine order and are dispatched in that
//! order; nothing here reorders, batches or blocks.

use std::ffi::c_void;
use std::marker::PhantomPinned;
use std::pin::Pin;
use std::ptr;
use std::sync::Arc;

use crate::context::GraphicsContext;
use crate::description::DeviceDescription;
use crate::device::{Metric, RenderingBackend};
use crate::engine::GraphicsEngine;
use crate::errors::DeviceError;
use crate::ffi::{pGEDevDesc, SEXP};
use crate::geometry::{Point, Points, Rectangle, Subpaths};
use crate::interrupts::InterruptGuard;
use crate::raster::Raster;
use crate::registry::CallbackRegistry;

pub struct GraphicsDeviceAdapter {
    state: Pin<Box<AdapterState>>,
}

impl GraphicsDeviceAdapter {
    pub fn new(backend: Box<dyn RenderingBackend>) -> Self {
        Self {
            state: Box::pin(AdapterState {
                backend,
                engine: None,
                description: None,
                registry: CallbackRegistry::new(),
                device: ptr::null_mut(),
                _pin: PhantomPinned,
            }),
        }
    }

    /// The engine this adapter is bound to, if any.
    pub fn engine(&self) -> Option<&Arc<dyn GraphicsEngine>> {
        self.state.engine.as_ref()
    }

    /// Whether a device is currently registered with the engine.
    pub fn is_registered(&self) -> bool {
        !self.state.device.is_null()
    }

    /// Register this adapter's backend as a graphics device on `engine`.
    ///
    /// Fails if a device is already registered, if the adapter is already
    /// bound, if the engine is not running, or if the engine has no free
    /// device slot. Registration can make the engine allocate and evaluate,
    /// which must not be interrupted halfway, so the whole setup runs with
    /// interrupt delivery suspended; an interrupt that arrives meanwhile is
    /// replayed once registration completes.
    pub fn bind(&mut self, engine: Arc<dyn GraphicsEngine>) -> Result<(), DeviceError> {
        let state_ptr = self.state_ptr();
        let state = unsafe { &mut *state_ptr };

        if !state.device.is_null() {
            return Err(DeviceError::AlreadyRegistered);
        }
        if state.engine.is_some() {
            return Err(DeviceError::AlreadyBound);
        }
        if !engine.is_running() {
            return Err(DeviceError::EngineNotRunning);
        }
        engine.check_device_available()?;

        state.engine = Some(Arc::clone(&engine));

        let guard = InterruptGuard::new(engine.as_ref());
        let registered = guard.with_suspended(|| -> Result<pGEDevDesc, DeviceError> {
            let mut description =
                DeviceDescription::new(&state.backend.config(), state.backend.capabilities());
            state.registry.install(&mut description);
            description.set_device_data(state_ptr as *mut c_void);
            // The block is boxed, so its address survives the move into the
            // adapter state.
            let block = description.as_mut_ptr();
            state.description = Some(description);

            let device = unsafe { engine.create_device(block) };
            if device.is_null() {
                return Err(DeviceError::DeviceCreationFailed);
            }
            unsafe { engine.add_device(device, state.backend.name()) };
            Ok(device)
        });

        match registered {
            Ok(device) => {
                state.device = device;
                log::debug!(
                    "graphics device '{}' registered with the host engine",
                    state.backend.name()
                );
                Ok(())
            }
            Err(err) => {
                // Nothing partial may stay registered: release the block and
                // the slot bindings, and unbind again, before reporting.
                state.description = None;
                state.registry.release_all();
                state.engine = None;
                Err(err)
            }
        }
    }

    /// Remove the device from the engine. No-op when nothing is registered.
    pub fn kill(&mut self) {
        let state = unsafe { &mut *self.state_ptr() };
        if state.device.is_null() {
            return;
        }
        if let (Some(engine), Some(description)) =
            (state.engine.as_ref(), state.description.as_mut())
        {
            unsafe { engine.kill_device(description.as_mut_ptr()) };
            log::debug!(
                "graphics device '{}' removed from the host engine",
                state.backend.name()
            );
        }
        state.device = ptr::null_mut();
    }

    /// Tear the device down. Removes it from the engine if it is still
    /// registered, then releases the description block and every callback
    /// registration together. Safe to call repeatedly; teardown happens
    /// once.
    pub fn dispose(&mut self) {
        if self.is_registered() {
            self.kill();
        }
        let state = unsafe { &mut *self.state_ptr() };
        state.description = None;
        state.registry.release_all();
    }

    fn state_ptr(&mut self) -> *mut AdapterState {
        // The state is pinned; the pointer handed out here is what the
        // engine dereferences on every callback.
        unsafe { self.state.as_mut().get_unchecked_mut() as *mut AdapterState }
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &CallbackRegistry {
        &self.state.registry
    }

    #[cfg(test)]
    pub(crate) fn block_ptr(&mut self) -> crate::ffi::pDevDesc {
        let state = unsafe { &mut *self.state_ptr() };
        state
            .description
            .as_mut()
            .expect("no device registered")
            .as_mut_ptr()
    }
}

impl Drop for GraphicsDeviceAdapter {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Dispatch state shared between the adapter handle and the native
/// trampolines. Pinned behind the adapter; `DevDesc.deviceSpecific` points
/// here.
pub(crate) struct AdapterState {
    backend: Box<dyn RenderingBackend>,
    engine: Option<Arc<dyn GraphicsEngine>>,
    description: Option<DeviceDescription>,
    registry: CallbackRegistry,
    device: pGEDevDesc,
    _pin: PhantomPinned,
}

impl AdapterState {
    /// Recover the dispatch state a callback belongs to.
    ///
    /// # Safety
    ///
    /// `dd` must be null or a block created by this crate whose adapter is
    /// still alive.
    unsafe fn from_dev<'a>(dd: crate::ffi::pDevDesc) -> Option<&'a mut AdapterState> {
        if dd.is_null() {
            return None;
        }
        ((*dd).deviceSpecific as *mut AdapterState).as_mut()
    }

    fn activate(&mut self) {
        self.backend.on_activated();
    }

    fn deactivate(&mut self) {
        self.backend.on_deactivated();
    }

    fn close(&mut self) {
        self.backend.on_closed();
        self.sever_native_device();
    }

    /// Clear the engine-side record's back-reference to this device so a
    /// stale reference can never reach freed state. Safe whenever, even
    /// after teardown began.
    fn sever_native_device(&mut self) {
        if self.device.is_null() {
            return;
        }
        unsafe {
            (*self.device).dev = ptr::null_mut();
        }
    }

    fn new_page(&mut self, context: &GraphicsContext<'_>) {
        if let Err(err) = self.backend.on_new_page(context) {
            self.report("newPage", &err);
        }
    }

    fn resize(&mut self) -> Rectangle {
        self.backend.on_resized()
    }

    fn confirm_new_frame(&mut self) -> bool {
        self.backend.confirm_new_frame()
    }

    fn change_mode(&mut self, code: i32) {
        match code {
            0 => self.backend.on_draw_started(),
            1 => self.backend.on_draw_stopped(),
            // Codes this bridge does not interpret are ignored so newer
            // protocol revisions keep working.
            _ => {}
        }
    }

    fn clip(&mut self, x0: f64, x1: f64, y0: f64, y1: f64) {
        self.backend.clip(Rectangle::from_corners(x0, y0, x1, y1));
    }

    fn locate(&mut self) -> Option<Point> {
        self.backend.get_location()
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, ctx: &GraphicsContext<'_>) {
        if let Err(err) =
            self.backend
                .draw_line(Point::new(x1, y1), Point::new(x2, y2), ctx)
        {
            self.report("line", &err);
        }
    }

    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, ctx: &GraphicsContext<'_>) {
        if let Err(err) = self.backend.draw_circle(Point::new(x, y), radius, ctx) {
            self.report("circle", &err);
        }
    }

    fn draw_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, ctx: &GraphicsContext<'_>) {
        if let Err(err) = self
            .backend
            .draw_rectangle(Rectangle::from_corners(x0, y0, x1, y1), ctx)
        {
            self.report("rect", &err);
        }
    }

    unsafe fn draw_polygon(
        &mut self,
        count: usize,
        xs: *const f64,
        ys: *const f64,
        ctx: &GraphicsContext<'_>,
    ) {
        let vertices = Points::new(count, xs, ys);
        if let Err(err) = self.backend.draw_polygon(vertices, ctx) {
            self.report("polygon", &err);
        }
    }

    unsafe fn draw_polyline(
        &mut self,
        count: usize,
        xs: *const f64,
        ys: *const f64,
        ctx: &GraphicsContext<'_>,
    ) {
        let vertices = Points::new(count, xs, ys);
        if let Err(err) = self.backend.draw_polyline(vertices, ctx) {
            self.report("polyline", &err);
        }
    }

    unsafe fn draw_path(
        &mut self,
        xs: *const f64,
        ys: *const f64,
        subpath_count: usize,
        per_subpath: *const std::ffi::c_int,
        winding: bool,
        ctx: &GraphicsContext<'_>,
    ) {
        let Some(engine) = self.engine.clone() else {
            log::error!("path callback arrived on an unbound adapter");
            return;
        };
        match Subpaths::new(engine.as_ref(), subpath_count, xs, ys, per_subpath) {
            Ok(subpaths) => {
                if let Err(err) = self.backend.draw_path(subpaths, winding, ctx) {
                    self.report("path", &err);
                }
            }
            Err(err) => {
                log::error!("path decode rejected: {err}");
            }
        }
    }

    unsafe fn draw_raster(
        &mut self,
        pixels: *const u32,
        width: usize,
        height: usize,
        target: Rectangle,
        rotation: f64,
        interpolate: bool,
        ctx: &GraphicsContext<'_>,
    ) {
        let packed = std::slice::from_raw_parts(pixels, width * height);
        match Raster::from_packed(width, height, packed) {
            Ok(raster) => {
                if let Err(err) =
                    self.backend
                        .draw_raster(raster, target, rotation, interpolate, ctx)
                {
                    self.report("raster", &err);
                }
            }
            Err(err) => {
                log::error!("raster decode rejected: {err}");
            }
        }
    }

    fn capture(&mut self) -> SEXP {
        let Some(engine) = self.engine.clone() else {
            return ptr::null_mut();
        };
        match self.backend.capture() {
            Ok(raster) => engine.create_integer_matrix(&raster),
            Err(err) => {
                self.report("cap", &err);
                engine.nil_value()
            }
        }
    }

    fn measure_width(&mut self, text: &str, ctx: &GraphicsContext<'_>) -> f64 {
        self.backend.measure_width(text, ctx)
    }

    fn metric_info(&mut self, character: i32, ctx: &GraphicsContext<'_>) -> Metric {
        self.backend.metric_info(character, ctx)
    }

    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        rotation: f64,
        adjustment: f64,
        ctx: &GraphicsContext<'_>,
    ) {
        if let Err(err) =
            self.backend
                .draw_text(text, Point::new(x, y), rotation, adjustment, ctx)
        {
            self.report("text", &err);
        }
    }

    fn report(&self, slot: &str, err: &anyhow::Error) {
        log::error!("{slot} failed on device '{}': {err:#}", self.backend.name());
    }
}

/// The native callback implementations written into the description block.
///
/// Each trampoline recovers the adapter's dispatch state from the block's
/// device-local pointer, decodes its raw arguments into the typed model, and
/// forwards to one backend capability. A callback arriving with a null block
/// or missing state is ignored.
pub(crate) mod trampoline {
    use std::ffi::{c_char, c_int, c_uint, CStr};

    use super::AdapterState;
    use crate::context::GraphicsContext;
    use crate::ffi::{pDevDesc, pGEcontext, Rboolean, RBOOL_FALSE, RBOOL_TRUE, SEXP};
    use crate::geometry::Rectangle;

    unsafe fn decode_text(text: *const c_char) -> String {
        if text.is_null() {
            String::new()
        } else {
            CStr::from_ptr(text).to_string_lossy().into_owned()
        }
    }

    pub(crate) unsafe extern "C-unwind" fn activate(dd: pDevDesc) {
        if let Some(state) = AdapterState::from_dev(dd) {
            state.activate();
        }
    }

    pub(crate) unsafe extern "C-unwind" fn deactivate(dd: pDevDesc) {
        if let Some(state) = AdapterState::from_dev(dd) {
            state.deactivate();
        }
    }

    pub(crate) unsafe extern "C-unwind" fn close(dd: pDevDesc) {
        if let Some(state) = AdapterState::from_dev(dd) {
            state.close();
        }
    }

    pub(crate) unsafe extern "C-unwind" fn new_page(gc: pGEcontext, dd: pDevDesc) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.new_page(&ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn size(
        left: *mut f64,
        right: *mut f64,
        bottom: *mut f64,
        top: *mut f64,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        // No return value of its own; all four edges travel through the
        // output fields.
        let extent = state.resize();
        *left = extent.left();
        *right = extent.right();
        *bottom = extent.bottom();
        *top = extent.top();
    }

    pub(crate) unsafe extern "C-unwind" fn new_frame_confirm(dd: pDevDesc) -> Rboolean {
        match AdapterState::from_dev(dd) {
            Some(state) => {
                if state.confirm_new_frame() {
                    RBOOL_TRUE
                } else {
                    RBOOL_FALSE
                }
            }
            None => RBOOL_FALSE,
        }
    }

    pub(crate) unsafe extern "C-unwind" fn mode(mode: c_int, dd: pDevDesc) {
        if let Some(state) = AdapterState::from_dev(dd) {
            state.change_mode(mode);
        }
    }

    pub(crate) unsafe extern "C-unwind" fn clip(x0: f64, x1: f64, y0: f64, y1: f64, dd: pDevDesc) {
        if let Some(state) = AdapterState::from_dev(dd) {
            state.clip(x0, x1, y0, y1);
        }
    }

    pub(crate) unsafe extern "C-unwind" fn locator(
        x: *mut f64,
        y: *mut f64,
        dd: pDevDesc,
    ) -> Rboolean {
        let Some(state) = AdapterState::from_dev(dd) else {
            return RBOOL_FALSE;
        };
        match state.locate() {
            Some(point) => {
                *x = point.x;
                *y = point.y;
                RBOOL_TRUE
            }
            None => {
                // The boolean result is authoritative; the zeroes just give
                // the outputs defined values.
                *x = 0.0;
                *y = 0.0;
                RBOOL_FALSE
            }
        }
    }

    pub(crate) unsafe extern "C-unwind" fn line(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_line(x1, y1, x2, y2, &ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn circle(
        x: f64,
        y: f64,
        r: f64,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_circle(x, y, r, &ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn rect(
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_rect(x0, y0, x1, y1, &ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn polygon(
        n: c_int,
        x: *mut f64,
        y: *mut f64,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_polygon(n.max(0) as usize, x, y, &ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn polyline(
        n: c_int,
        x: *mut f64,
        y: *mut f64,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_polyline(n.max(0) as usize, x, y, &ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn path(
        x: *mut f64,
        y: *mut f64,
        npoly: c_int,
        nper: *mut c_int,
        winding: Rboolean,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_path(x, y, npoly.max(0) as usize, nper, winding != RBOOL_FALSE, &ctx);
    }

    pub(crate) unsafe extern "C-unwind" fn raster(
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
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        if w < 0 || h < 0 || raster.is_null() {
            return;
        }
        state.draw_raster(
            raster as *const u32,
            w as usize,
            h as usize,
            Rectangle::new(x, y, width, height),
            rot,
            interpolate != RBOOL_FALSE,
            &ctx,
        );
    }

    pub(crate) unsafe extern "C-unwind" fn cap(dd: pDevDesc) -> SEXP {
        match AdapterState::from_dev(dd) {
            Some(state) => state.capture(),
            None => std::ptr::null_mut(),
        }
    }

    pub(crate) unsafe extern "C-unwind" fn metric_info(
        c: c_int,
        gc: pGEcontext,
        ascent: *mut f64,
        descent: *mut f64,
        width: *mut f64,
        dd: pDevDesc,
    ) {
        *ascent = 0.0;
        *descent = 0.0;
        *width = 0.0;
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        let metric = state.metric_info(c, &ctx);
        *ascent = metric.ascent;
        *descent = metric.descent;
        *width = metric.width;
    }

    pub(crate) unsafe extern "C-unwind" fn str_width(
        str: *const c_char,
        gc: pGEcontext,
        dd: pDevDesc,
    ) -> f64 {
        let Some(state) = AdapterState::from_dev(dd) else {
            return 0.0;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return 0.0;
        };
        state.measure_width(&decode_text(str), &ctx)
    }

    pub(crate) unsafe extern "C-unwind" fn text(
        x: f64,
        y: f64,
        str: *const c_char,
        rot: f64,
        hadj: f64,
        gc: pGEcontext,
        dd: pDevDesc,
    ) {
        let Some(state) = AdapterState::from_dev(dd) else {
            return;
        };
        let Some(ctx) = GraphicsContext::from_raw(gc) else {
            return;
        };
        state.draw_text(x, y, &decode_text(str), rot, hadj, &ctx);
    }

    // Protocol slots that must exist but carry no behaviour in this bridge.

    pub(crate) unsafe extern "C-unwind" fn get_event(_env: SEXP, _prompt: *const c_char) -> SEXP {
        std::ptr::null_mut()
    }

    pub(crate) unsafe extern "C-unwind" fn event_helper(_dd: pDevDesc, _code: c_int) {}
}
