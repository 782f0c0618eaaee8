//! Typed geometry over the engine's raw coordinate buffers.
//!
//! The engine hands polygon, polyline and path callbacks flat arrays of
//! 8-byte floats (x and y in separate buffers, same index alignment) plus,
//! for paths, an array of 4-byte per-subpath vertex counts. [`Points`] and
//! [`Subpaths`] decode those buffers lazily: values are read as they are
//! consumed, and nothing is retained past the originating callback.

use std::ffi::c_int;
use std::marker::PhantomData;

use crate::engine::GraphicsEngine;
use crate::errors::DeviceError;

/// A 2-D coordinate in device units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box. Always normalized: `left <= right` and
/// `bottom <= top`, whichever way the corners were supplied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
}

impl Rectangle {
    /// Rectangle from its bottom-left corner plus extents.
    pub fn new(left: f64, bottom: f64, width: f64, height: f64) -> Self {
        Self::from_corners(left, bottom, left + width, bottom + height)
    }

    /// Rectangle spanning two opposite corners, in either order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            left: x0.min(x1),
            right: x0.max(x1),
            bottom: y0.min(y1),
            top: y0.max(y1),
        }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Lazy sequence of [`Point`]s over a pair of raw coordinate buffers.
///
/// Each step reads one 8-byte float from each buffer at matching offsets.
/// The lifetime ties the iterator to the callback borrow that produced the
/// buffers; the engine guarantees them only until that callback returns.
pub struct Points<'a> {
    xs: *const f64,
    ys: *const f64,
    index: usize,
    len: usize,
    _buffers: PhantomData<&'a [f64]>,
}

impl<'a> Points<'a> {
    /// # Safety
    ///
    /// `xs` and `ys` must each point to at least `count` readable `f64`
    /// values that stay valid for `'a`.
    pub unsafe fn new(count: usize, xs: *const f64, ys: *const f64) -> Self {
        Self {
            xs,
            ys,
            index: 0,
            len: count,
            _buffers: PhantomData,
        }
    }

    /// Safe constructor over slices, for backends and tests.
    ///
    /// Panics if the slices differ in length.
    pub fn from_slices(xs: &'a [f64], ys: &'a [f64]) -> Self {
        assert_eq!(xs.len(), ys.len(), "coordinate buffers differ in length");
        unsafe { Self::new(xs.len(), xs.as_ptr(), ys.as_ptr()) }
    }
}

impl Iterator for Points<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.index >= self.len {
            return None;
        }
        let point = unsafe {
            Point::new(
                *self.xs.add(self.index),
                *self.ys.add(self.index),
            )
        };
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}

/// Lazy sequence of subpaths for a `path` callback.
///
/// For each subpath this reads the next 4-byte vertex count, yields a
/// [`Points`] over that many coordinates, then advances both coordinate
/// cursors past them. The cursors move whether or not the caller drains the
/// yielded subpath, so concatenating all subpaths reproduces the flat
/// coordinate buffers in order.
pub struct Subpaths<'a> {
    xs: *const f64,
    ys: *const f64,
    counts: *const c_int,
    remaining: usize,
    _buffers: PhantomData<&'a [f64]>,
}

impl<'a> Subpaths<'a> {
    /// Decode `count` subpaths from the engine's buffers.
    ///
    /// Fails with [`DeviceError::EngineNotRunning`] when the host engine is
    /// not running; the buffers are only meaningful while it is.
    ///
    /// # Safety
    ///
    /// `per_subpath` must point to `count` readable `c_int` values, and
    /// `xs`/`ys` must each hold at least the sum of those counts in `f64`
    /// values, all valid for `'a`.
    pub unsafe fn new(
        engine: &dyn GraphicsEngine,
        count: usize,
        xs: *const f64,
        ys: *const f64,
        per_subpath: *const c_int,
    ) -> Result<Self, DeviceError> {
        if !engine.is_running() {
            return Err(DeviceError::EngineNotRunning);
        }
        Ok(Self {
            xs,
            ys,
            counts: per_subpath,
            remaining: count,
            _buffers: PhantomData,
        })
    }
}

impl<'a> Iterator for Subpaths<'a> {
    type Item = Points<'a>;

    fn next(&mut self) -> Option<Points<'a>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        unsafe {
            let vertices = (*self.counts).max(0) as usize;
            self.counts = self.counts.add(1);
            let subpath = Points::new(vertices, self.xs, self.ys);
            self.xs = self.xs.add(vertices);
            self.ys = self.ys.add(vertices);
            Some(subpath)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Subpaths<'_> {}
