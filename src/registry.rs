//! Callback slot bookkeeping.
//!
//! The registry installs the bridge's trampoline for every protocol slot
//! into a description block and records what it installed. Trampolines are
//! `extern "C-unwind"` function items, so their addresses are pinned for the
//! program's lifetime; what the registry tracks is which slots the engine
//! may still call through, and it releases them all together on teardown;
//! entries are never retired one at a time.

use crate::adapter::trampoline;
use crate::description::DeviceDescription;

/// One populated protocol slot.
#[derive(Debug, Clone, Copy)]
pub struct CallbackSlot {
    /// The engine's fixed slot name.
    pub name: &'static str,
    /// Address written into the block.
    pub address: usize,
}

#[derive(Default)]
pub struct CallbackRegistry {
    slots: Vec<CallbackSlot>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate every protocol slot of `description` and record the
    /// bindings. Slot names are the engine's fixed contract.
    pub fn install(&mut self, description: &mut DeviceDescription) {
        let raw = description.raw_mut();

        raw.activate = Some(trampoline::activate);
        self.record("activate", trampoline::activate as usize);
        raw.cap = Some(trampoline::cap);
        self.record("cap", trampoline::cap as usize);
        raw.circle = Some(trampoline::circle);
        self.record("circle", trampoline::circle as usize);
        raw.clip = Some(trampoline::clip);
        self.record("clip", trampoline::clip as usize);
        raw.close = Some(trampoline::close);
        self.record("close", trampoline::close as usize);
        raw.deactivate = Some(trampoline::deactivate);
        self.record("deactivate", trampoline::deactivate as usize);
        raw.line = Some(trampoline::line);
        self.record("line", trampoline::line as usize);
        raw.locator = Some(trampoline::locator);
        self.record("locator", trampoline::locator as usize);
        raw.metricInfo = Some(trampoline::metric_info);
        self.record("metricInfo", trampoline::metric_info as usize);
        raw.mode = Some(trampoline::mode);
        self.record("mode", trampoline::mode as usize);
        raw.newPage = Some(trampoline::new_page);
        self.record("newPage", trampoline::new_page as usize);
        raw.path = Some(trampoline::path);
        self.record("path", trampoline::path as usize);
        raw.polygon = Some(trampoline::polygon);
        self.record("polygon", trampoline::polygon as usize);
        raw.polyline = Some(trampoline::polyline);
        self.record("polyline", trampoline::polyline as usize);
        raw.raster = Some(trampoline::raster);
        self.record("raster", trampoline::raster as usize);
        raw.rect = Some(trampoline::rect);
        self.record("rect", trampoline::rect as usize);
        raw.size = Some(trampoline::size);
        self.record("size", trampoline::size as usize);
        raw.strWidth = Some(trampoline::str_width);
        self.record("strWidth", trampoline::str_width as usize);
        raw.text = Some(trampoline::text);
        self.record("text", trampoline::text as usize);
        // The UTF-8 variants dispatch identically; upstream decoding is
        // assumed already normalized.
        raw.strWidthUTF8 = Some(trampoline::str_width);
        self.record("strWidthUTF8", trampoline::str_width as usize);
        raw.textUTF8 = Some(trampoline::text);
        self.record("textUTF8", trampoline::text as usize);
        raw.newFrameConfirm = Some(trampoline::new_frame_confirm);
        self.record("newFrameConfirm", trampoline::new_frame_confirm as usize);
        raw.getEvent = Some(trampoline::get_event);
        self.record("getEvent", trampoline::get_event as usize);
        raw.eventHelper = Some(trampoline::event_helper);
        self.record("eventHelper", trampoline::event_helper as usize);
    }

    /// Forget every binding at once. Called on teardown, after the engine
    /// can no longer invoke the device.
    pub fn release_all(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| slot.name == name)
    }

    pub fn slots(&self) -> &[CallbackSlot] {
        &self.slots
    }

    fn record(&mut self, name: &'static str, address: usize) {
        self.slots.push(CallbackSlot { name, address });
    }
}
