//! The seam between the bridge and the host engine.
//!
//! [`GraphicsEngine`] is the narrow surface of the host this crate consumes:
//! a running-state query, the process-wide interrupt flags, the device
//! creation/attachment/removal entry points, and matrix construction for
//! `cap` captures. The concrete binding against an embedded R lives behind
//! the `host-r` feature (see [`crate::host`]); tests substitute a mock.
//!
//! The host engine is single-threaded and not reentrant-safe. Nothing here
//! may be called concurrently against the same engine instance, and an
//! adapter stays bound to one engine for its whole lifetime.

use crate::errors::DeviceError;
use crate::ffi::{pDevDesc, pGEDevDesc, SEXP};
use crate::raster::Raster;

pub trait GraphicsEngine {
    /// Whether the engine is initialized and able to evaluate.
    fn is_running(&self) -> bool;

    /// Read the engine's interrupt-suspension flag.
    fn interrupts_suspended(&self) -> bool;

    /// Write the engine's interrupt-suspension flag.
    fn set_interrupts_suspended(&self, suspended: bool);

    /// Whether an interrupt arrived while delivery was suspended.
    fn interrupts_pending(&self) -> bool;

    /// Run the engine's pending-interrupt entry point. Only meaningful when
    /// an interrupt is pending and delivery is not suspended.
    fn run_pending_interrupt(&self);

    /// Check that the engine has a free device slot.
    fn check_device_available(&self) -> Result<(), DeviceError>;

    /// Instantiate an engine-level device around a description block.
    ///
    /// # Safety
    ///
    /// `description` must point to a fully populated block that outlives the
    /// returned device.
    unsafe fn create_device(&self, description: pDevDesc) -> pGEDevDesc;

    /// Attach a created device to the engine's device list under `name`.
    ///
    /// # Safety
    ///
    /// `device` must have been returned by [`GraphicsEngine::create_device`]
    /// on this engine and not yet killed.
    unsafe fn add_device(&self, device: pGEDevDesc, name: &str);

    /// Remove the device whose description block is at `description`.
    ///
    /// # Safety
    ///
    /// `description` must be the block address this device was created with.
    unsafe fn kill_device(&self, description: pDevDesc);

    /// Build the engine's native integer-matrix representation of a raster.
    /// Used to hand `cap` captures back to the engine.
    fn create_integer_matrix(&self, raster: &Raster) -> SEXP;

    /// The engine's "no value" object, returned from `cap` when a capture
    /// is unavailable.
    fn nil_value(&self) -> SEXP {
        std::ptr::null_mut()
    }
}
