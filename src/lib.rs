//! Bridge between a pluggable rendering backend and the R graphics engine's
//! native device protocol.
//!
//! The engine drives graphics devices through a C callback table: a device
//! description block whose slots it invokes for every page, shape, text run
//! and query. This crate owns that block, installs a trampoline in every
//! slot, and dispatches each callback to a [`RenderingBackend`]
//! implementation, translating the raw buffers and packed values into a
//! typed model on the way.
//!
//! A device comes to life by handing a backend to a
//! [`GraphicsDeviceAdapter`] and binding it to a [`GraphicsEngine`]:
//!
//! ```ignore
//! let mut adapter = GraphicsDeviceAdapter::new(Box::new(MyBackend::new()));
//! adapter.bind(engine)?;
//! ```
//!
//! The concrete binding against an embedded R lives in [`host`] behind the
//! `host-r` feature; everything else builds and tests without R.

pub mod adapter;
pub mod config;
pub mod context;
pub mod description;
pub mod device;
pub mod engine;
pub mod errors;
pub mod ffi;
pub mod geometry;
pub mod interrupts;
pub mod raster;
pub mod registry;

#[cfg(feature = "host-r")]
pub mod host;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::GraphicsDeviceAdapter;
pub use config::{DeviceConfig, TextAdjustment};
pub use context::{FontFace, GraphicsContext, LineEnd, LineJoin};
pub use device::{DeviceCapabilities, Metric, RenderingBackend};
pub use engine::GraphicsEngine;
pub use errors::DeviceError;
pub use geometry::{Point, Points, Rectangle, Subpaths};
pub use raster::{Color, Raster};

#[cfg(feature = "host-r")]
pub use host::RHostEngine;
