//! Mock raw-input collaborators for unit and integration tests.
//!
//! [`ScriptedMotionSource`] replays a fixed list of [`SourceEvent`]s and
//! [`MockDevicePathQuery`] answers handle → path lookups from a table, so the
//! whole switching pipeline runs without a Windows message loop.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::ops::ControlFlow;

use pointer_core::{DeviceHandle, RawMotion};

use super::{MotionSource, RawInputError, SourceEvent};
use crate::application::resolve_device::DevicePathQuery;

/// A [`MotionSource`] that replays scripted events.
#[derive(Debug, Default)]
pub struct ScriptedMotionSource {
    events: VecDeque<SourceEvent>,
    delivered: usize,
}

impl ScriptedMotionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mouse report from `device`.
    pub fn with_motion(mut self, device: isize, last_x: i32, last_y: i32) -> Self {
        self.events
            .push_back(SourceEvent::Motion(RawMotion::mouse(DeviceHandle(device), last_x, last_y)));
        self
    }

    /// Appends an arbitrary event.
    pub fn with_event(mut self, event: SourceEvent) -> Self {
        self.events.push_back(event);
        self
    }

    /// Appends a removal notification for `device`.
    pub fn with_removal(mut self, device: isize) -> Self {
        self.events
            .push_back(SourceEvent::DeviceRemoved(DeviceHandle(device)));
        self
    }

    /// Number of events handed to a handler so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl MotionSource for ScriptedMotionSource {
    fn run(
        &mut self,
        handler: &mut dyn FnMut(SourceEvent) -> ControlFlow<()>,
    ) -> Result<(), RawInputError> {
        while let Some(event) = self.events.pop_front() {
            self.delivered += 1;
            if handler(event).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// A [`DevicePathQuery`] backed by a handle → path table.
#[derive(Debug, Default)]
pub struct MockDevicePathQuery {
    paths: HashMap<DeviceHandle, String>,
    lookups: Cell<usize>,
    forgotten: RefCell<Vec<DeviceHandle>>,
}

impl MockDevicePathQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, handle: isize, path: &str) -> Self {
        self.paths.insert(DeviceHandle(handle), path.to_string());
        self
    }

    /// Number of [`DevicePathQuery::device_path`] calls received.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    /// Handles passed to [`DevicePathQuery::forget`], in order.
    pub fn forgotten(&self) -> Vec<DeviceHandle> {
        self.forgotten.borrow().clone()
    }
}

impl DevicePathQuery for MockDevicePathQuery {
    fn device_path(&self, device: DeviceHandle) -> Option<String> {
        self.lookups.set(self.lookups.get() + 1);
        self.paths.get(&device).cloned()
    }

    fn forget(&self, device: DeviceHandle) {
        self.forgotten.borrow_mut().push(device);
    }
}
