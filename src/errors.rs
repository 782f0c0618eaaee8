#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("adapter is already bound to a host engine")]
    AlreadyBound,

    #[error("a graphics device is already registered for this adapter")]
    AlreadyRegistered,

    #[error("host engine is not running")]
    EngineNotRunning,

    #[error("no device slot is available in the host engine")]
    NoDeviceSlot,

    #[error("host engine failed to create the graphics device")]
    DeviceCreationFailed,

    #[error("raster buffer holds {actual} pixels, expected {width}x{height}")]
    RasterSizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },
}
