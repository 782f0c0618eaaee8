//! In-process test doubles.
//!
//! [`MockEngine`] stands in for the host engine: it tracks the interrupt
//! flags, hands out real heap-allocated device records, and records every
//! lifecycle call so tests can assert ordering and argument fidelity.
//! [`RecordingBackend`] is a [`RenderingBackend`] that appends a readable
//! line per call to a shared probe.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::DeviceConfig;
use crate::context::GraphicsContext;
use crate::device::{DeviceCapabilities, Metric, RenderingBackend};
use crate::engine::GraphicsEngine;
use crate::errors::DeviceError;
use crate::ffi::{pDevDesc, pGEDevDesc, GEDevDesc, SEXP};
use crate::geometry::{Point, Points, Rectangle, Subpaths};
use crate::raster::Raster;

/// Route `log` output through the test harness. Safe to call from every
/// test; only the first call installs the logger.
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) struct MockEngine {
    running: Cell<bool>,
    suspended: Cell<bool>,
    pending: Cell<bool>,
    interrupts_run: Cell<usize>,
    device_available: Cell<bool>,
    fail_creation: Cell<bool>,
    suspended_during_create: Cell<bool>,
    created_with: Cell<pDevDesc>,
    created: RefCell<Vec<pGEDevDesc>>,
    added: RefCell<Vec<String>>,
    killed: RefCell<Vec<pDevDesc>>,
    matrix_dims: Cell<Option<(usize, usize)>>,
    matrices: RefCell<Vec<*mut u64>>,
}

impl MockEngine {
    pub(crate) fn running() -> Self {
        Self {
            running: Cell::new(true),
            suspended: Cell::new(false),
            pending: Cell::new(false),
            interrupts_run: Cell::new(0),
            device_available: Cell::new(true),
            fail_creation: Cell::new(false),
            suspended_during_create: Cell::new(false),
            created_with: Cell::new(std::ptr::null_mut()),
            created: RefCell::new(Vec::new()),
            added: RefCell::new(Vec::new()),
            killed: RefCell::new(Vec::new()),
            matrix_dims: Cell::new(None),
            matrices: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn stopped() -> Self {
        let engine = Self::running();
        engine.running.set(false);
        engine
    }

    pub(crate) fn set_pending(&self, pending: bool) {
        self.pending.set(pending);
    }

    pub(crate) fn set_device_available(&self, available: bool) {
        self.device_available.set(available);
    }

    pub(crate) fn fail_device_creation(&self) {
        self.fail_creation.set(true);
    }

    pub(crate) fn interrupts_run(&self) -> usize {
        self.interrupts_run.get()
    }

    pub(crate) fn suspended_during_create(&self) -> bool {
        self.suspended_during_create.get()
    }

    pub(crate) fn created_with(&self) -> pDevDesc {
        self.created_with.get()
    }

    pub(crate) fn created_device(&self) -> pGEDevDesc {
        *self.created.borrow().last().expect("no device was created")
    }

    pub(crate) fn create_count(&self) -> usize {
        self.created.borrow().len()
    }

    pub(crate) fn added_names(&self) -> Vec<String> {
        self.added.borrow().clone()
    }

    pub(crate) fn kill_count(&self) -> usize {
        self.killed.borrow().len()
    }

    pub(crate) fn killed_with(&self) -> Vec<pDevDesc> {
        self.killed.borrow().clone()
    }

    pub(crate) fn matrix_dims(&self) -> Option<(usize, usize)> {
        self.matrix_dims.get()
    }
}

impl GraphicsEngine for MockEngine {
    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn interrupts_suspended(&self) -> bool {
        self.suspended.get()
    }

    fn set_interrupts_suspended(&self, suspended: bool) {
        self.suspended.set(suspended);
    }

    fn interrupts_pending(&self) -> bool {
        self.pending.get()
    }

    fn run_pending_interrupt(&self) {
        self.pending.set(false);
        self.interrupts_run.set(self.interrupts_run.get() + 1);
    }

    fn check_device_available(&self) -> Result<(), DeviceError> {
        if self.device_available.get() {
            Ok(())
        } else {
            Err(DeviceError::NoDeviceSlot)
        }
    }

    unsafe fn create_device(&self, description: pDevDesc) -> pGEDevDesc {
        self.suspended_during_create.set(self.suspended.get());
        self.created_with.set(description);
        if self.fail_creation.get() {
            return std::ptr::null_mut();
        }
        let mut device = Box::new(GEDevDesc::zeroed());
        device.dev = description;
        let device = Box::into_raw(device);
        self.created.borrow_mut().push(device);
        device
    }

    unsafe fn add_device(&self, device: pGEDevDesc, name: &str) {
        assert!(!device.is_null(), "null device attached");
        self.added.borrow_mut().push(name.to_string());
    }

    unsafe fn kill_device(&self, description: pDevDesc) {
        self.killed.borrow_mut().push(description);
    }

    fn create_integer_matrix(&self, raster: &Raster) -> SEXP {
        self.matrix_dims.set(Some((raster.width(), raster.height())));
        let token = Box::into_raw(Box::new(0u64));
        self.matrices.borrow_mut().push(token);
        token as SEXP
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        for device in self.created.borrow_mut().drain(..) {
            drop(unsafe { Box::from_raw(device) });
        }
        for token in self.matrices.borrow_mut().drain(..) {
            drop(unsafe { Box::from_raw(token) });
        }
    }
}

pub(crate) mod probe {
    use super::*;

    /// Shared handle into a [`RecordingBackend`]: reads the call log and
    /// scripts the backend's answers.
    #[derive(Clone)]
    pub(crate) struct Calls {
        inner: Rc<Inner>,
    }

    pub(super) struct Inner {
        pub(super) events: RefCell<Vec<String>>,
        pub(super) resize_result: Cell<Rectangle>,
        pub(super) location: Cell<Option<Point>>,
        pub(super) metric: Cell<Metric>,
        pub(super) confirm: Cell<bool>,
        pub(super) capture: RefCell<Option<Raster>>,
        pub(super) fail_drawing: Cell<bool>,
    }

    impl Calls {
        pub(super) fn new() -> Self {
            Self {
                inner: Rc::new(Inner {
                    events: RefCell::new(Vec::new()),
                    resize_result: Cell::new(Rectangle::from_corners(0.0, 0.0, 0.0, 0.0)),
                    location: Cell::new(None),
                    metric: Cell::new(Metric::default()),
                    confirm: Cell::new(true),
                    capture: RefCell::new(None),
                    fail_drawing: Cell::new(false),
                }),
            }
        }

        /// Drain and return the recorded calls.
        pub(crate) fn take(&self) -> Vec<String> {
            self.inner.events.borrow_mut().drain(..).collect()
        }

        pub(crate) fn set_resize_result(&self, extent: Rectangle) {
            self.inner.resize_result.set(extent);
        }

        pub(crate) fn set_location(&self, location: Option<Point>) {
            self.inner.location.set(location);
        }

        pub(crate) fn set_metric(&self, metric: Metric) {
            self.inner.metric.set(metric);
        }

        pub(crate) fn set_confirm(&self, confirm: bool) {
            self.inner.confirm.set(confirm);
        }

        pub(crate) fn set_capture(&self, raster: Raster) {
            *self.inner.capture.borrow_mut() = Some(raster);
        }

        pub(crate) fn fail_drawing(&self, fail: bool) {
            self.inner.fail_drawing.set(fail);
        }

        pub(super) fn push(&self, event: String) {
            self.inner.events.borrow_mut().push(event);
        }

        pub(super) fn inner(&self) -> &Inner {
            &self.inner
        }
    }
}

pub(crate) struct RecordingBackend {
    calls: probe::Calls,
}

impl RecordingBackend {
    pub(crate) fn new() -> (Self, probe::Calls) {
        let calls = probe::Calls::new();
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }

    fn check_drawing(&self) -> anyhow::Result<()> {
        if self.calls.inner().fail_drawing.get() {
            anyhow::bail!("scripted drawing failure");
        }
        Ok(())
    }
}

fn format_points(points: Points<'_>) -> String {
    let parts: Vec<String> = points.map(|p| format!("({}, {})", p.x, p.y)).collect();
    format!("[{}]", parts.join(", "))
}

impl RenderingBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities::standard() | DeviceCapabilities::CAPTURE | DeviceCapabilities::LOCATOR
    }

    fn config(&self) -> DeviceConfig {
        DeviceConfig::default()
    }

    fn on_activated(&mut self) {
        self.calls.push("activated".into());
    }

    fn on_deactivated(&mut self) {
        self.calls.push("deactivated".into());
    }

    fn on_closed(&mut self) {
        self.calls.push("closed".into());
    }

    fn on_draw_started(&mut self) {
        self.calls.push("draw started".into());
    }

    fn on_draw_stopped(&mut self) {
        self.calls.push("draw stopped".into());
    }

    fn on_new_page(&mut self, _context: &GraphicsContext<'_>) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls.push("new page".into());
        Ok(())
    }

    fn on_resized(&mut self) -> Rectangle {
        self.calls.push("resized".into());
        self.calls.inner().resize_result.get()
    }

    fn confirm_new_frame(&mut self) -> bool {
        self.calls.inner().confirm.get()
    }

    fn clip(&mut self, region: Rectangle) {
        self.calls.push(format!(
            "clip left={} right={} bottom={} top={}",
            region.left(),
            region.right(),
            region.bottom(),
            region.top()
        ));
    }

    fn get_location(&mut self) -> Option<Point> {
        self.calls.inner().location.get()
    }

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls.push(format!(
            "line ({}, {})->({}, {})",
            from.x, from.y, to.x, to.y
        ));
        Ok(())
    }

    fn draw_circle(
        &mut self,
        center: Point,
        radius: f64,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls
            .push(format!("circle ({}, {}) r={radius}", center.x, center.y));
        Ok(())
    }

    fn draw_rectangle(
        &mut self,
        region: Rectangle,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls.push(format!(
            "rect left={} right={} bottom={} top={}",
            region.left(),
            region.right(),
            region.bottom(),
            region.top()
        ));
        Ok(())
    }

    fn draw_polygon(
        &mut self,
        vertices: Points<'_>,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls
            .push(format!("polygon {}", format_points(vertices)));
        Ok(())
    }

    fn draw_polyline(
        &mut self,
        vertices: Points<'_>,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls
            .push(format!("polyline {}", format_points(vertices)));
        Ok(())
    }

    fn draw_path(
        &mut self,
        subpaths: Subpaths<'_>,
        winding: bool,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        let parts: Vec<String> = subpaths.map(format_points).collect();
        self.calls.push(format!(
            "path winding={winding} [{}]",
            parts.join(", ")
        ));
        Ok(())
    }

    fn draw_raster(
        &mut self,
        pixels: Raster,
        target: Rectangle,
        _rotation: f64,
        interpolate: bool,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        let first_column: Vec<String> = (0..pixels.height())
            .map(|row| pixels.get(0, row).red.to_string())
            .collect();
        self.calls.push(format!(
            "raster {}x{} first-col=[{}] target {}x{} interpolate={interpolate}",
            pixels.width(),
            pixels.height(),
            first_column.join(", "),
            target.width(),
            target.height(),
        ));
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        rotation: f64,
        adjustment: f64,
        _context: &GraphicsContext<'_>,
    ) -> anyhow::Result<()> {
        self.check_drawing()?;
        self.calls.push(format!(
            "text '{text}' at ({}, {}) rot={rotation} hadj={adjustment}",
            at.x, at.y
        ));
        Ok(())
    }

    fn capture(&mut self) -> anyhow::Result<Raster> {
        self.calls
            .inner()
            .capture
            .borrow()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no capture scripted"))
    }

    fn measure_width(&mut self, text: &str, _context: &GraphicsContext<'_>) -> f64 {
        text.len() as f64 * 7.0
    }

    fn metric_info(&mut self, _character: i32, _context: &GraphicsContext<'_>) -> Metric {
        self.calls.inner().metric.get()
    }
}
