//! Binding of [`GraphicsEngine`] against an embedded R.
//!
//! Links directly against the R shared library's graphics engine entry
//! points and interrupt flags. Only compiled with the `host-r` feature, so
//! the rest of the crate builds and tests without an R installation.

use std::cell::Cell;
use std::ffi::{c_char, c_int, CString};
use std::marker::PhantomData;
use std::ptr;

use crate::engine::GraphicsEngine;
use crate::errors::DeviceError;
use crate::ffi::{pDevDesc, pGEDevDesc, Rboolean, RBOOL_FALSE, SEXP};
use crate::raster::Raster;

// R's SEXPTYPE tag for integer vectors.
const INTSXP: c_int = 13;

extern "C-unwind" {
    static mut R_interrupts_suspended: Rboolean;
    static mut R_interrupts_pending: c_int;
    static R_NilValue: SEXP;

    fn R_CheckDeviceAvailableBool() -> Rboolean;
    fn Rf_onintr();

    fn GEcreateDevDesc(dev: pDevDesc) -> pGEDevDesc;
    fn GEaddDevice2(gdd: pGEDevDesc, name: *const c_char);
    fn GEkillDevice(gdd: pGEDevDesc);
    fn desc2GEDesc(dd: pDevDesc) -> pGEDevDesc;

    fn Rf_allocMatrix(kind: c_int, nrow: c_int, ncol: c_int) -> SEXP;
    fn Rf_protect(value: SEXP) -> SEXP;
    fn Rf_unprotect(count: c_int);
    fn INTEGER(vector: SEXP) -> *mut c_int;
}

/// The embedded R instance this process is linked against.
///
/// R is single-threaded; the handle is neither `Send` nor `Sync` and must
/// stay on the thread that initialized R.
pub struct RHostEngine {
    running: Cell<bool>,
    _single_threaded: PhantomData<*mut ()>,
}

impl RHostEngine {
    /// Handle to the already-initialized embedded R.
    ///
    /// # Safety
    ///
    /// The R runtime must have been initialized on the current thread before
    /// this is called, and must outlive every device bound through the
    /// returned handle.
    pub unsafe fn new() -> Self {
        Self {
            running: Cell::new(true),
            _single_threaded: PhantomData,
        }
    }

    /// Mark the runtime as shut down. Subsequent registrations are refused.
    pub fn mark_stopped(&self) {
        self.running.set(false);
    }
}

impl GraphicsEngine for RHostEngine {
    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn interrupts_suspended(&self) -> bool {
        unsafe { ptr::read(ptr::addr_of!(R_interrupts_suspended)) != RBOOL_FALSE }
    }

    fn set_interrupts_suspended(&self, suspended: bool) {
        let value = if suspended { 1 } else { 0 };
        unsafe {
            ptr::write(ptr::addr_of_mut!(R_interrupts_suspended), value);
        }
    }

    fn interrupts_pending(&self) -> bool {
        unsafe { ptr::read(ptr::addr_of!(R_interrupts_pending)) != 0 }
    }

    fn run_pending_interrupt(&self) {
        unsafe {
            Rf_onintr();
        }
    }

    fn check_device_available(&self) -> Result<(), DeviceError> {
        // The non-Bool variant raises an R error instead of reporting.
        if unsafe { R_CheckDeviceAvailableBool() } == RBOOL_FALSE {
            Err(DeviceError::NoDeviceSlot)
        } else {
            Ok(())
        }
    }

    unsafe fn create_device(&self, description: pDevDesc) -> pGEDevDesc {
        GEcreateDevDesc(description)
    }

    unsafe fn add_device(&self, device: pGEDevDesc, name: &str) {
        // An interior NUL cannot reach R; fall back to an anonymous entry.
        let name = CString::new(name).unwrap_or_default();
        GEaddDevice2(device, name.as_ptr());
    }

    unsafe fn kill_device(&self, description: pDevDesc) {
        let device = desc2GEDesc(description);
        if !device.is_null() {
            GEkillDevice(device);
        }
    }

    fn create_integer_matrix(&self, raster: &Raster) -> SEXP {
        let height = raster.height() as c_int;
        let width = raster.width() as c_int;
        unsafe {
            // R matrices are column-major with `height` rows, the same order
            // the packed encoding produces.
            let matrix = Rf_protect(Rf_allocMatrix(INTSXP, height, width));
            let cells = INTEGER(matrix);
            for (offset, packed) in raster.to_packed().into_iter().enumerate() {
                *cells.add(offset) = packed as c_int;
            }
            Rf_unprotect(1);
            matrix
        }
    }

    fn nil_value(&self) -> SEXP {
        unsafe { ptr::read(ptr::addr_of!(R_NilValue)) }
    }
}
