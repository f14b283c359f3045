//! Test doubles for the host side of the overlay.

use std::cell::Cell;

use chrono::{DateTime, Utc};

use crate::mask::{OverlaySurface, RasterBuffer, Viewport};
use crate::scheduler::Clock;

/// Viewport backed by a closure, counting inverse projections.
pub struct FnViewport {
    width: i32,
    height: i32,
    project: Box<dyn Fn(u32, u32) -> (f64, f64)>,
    calls: Cell<u32>,
}

impl FnViewport {
    pub fn new(width: i32, height: i32, project: impl Fn(u32, u32) -> (f64, f64) + 'static) -> Self {
        Self {
            width,
            height,
            project: Box::new(project),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl Viewport for FnViewport {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn pixel_to_geo(&self, x: u32, y: u32) -> (f64, f64) {
        self.calls.set(self.calls.get() + 1);
        (self.project)(x, y)
    }
}

/// Surface that keeps a copy of the last blit.
#[derive(Default)]
pub struct RecordingSurface {
    pub blits: u32,
    pub releases: u32,
    pub last: Option<RasterBuffer>,
}

impl OverlaySurface for RecordingSurface {
    fn blit(&mut self, buffer: &RasterBuffer) {
        self.blits += 1;
        self.last = Some(buffer.clone());
    }

    fn release(&mut self) {
        self.releases += 1;
        self.last = None;
    }
}

/// Clock the test moves by hand.
pub struct ManualClock(Cell<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Cell::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.0.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}
