//! Overlay lifecycle: render on attach, on a fixed interval, and whenever
//! the host reports a viewport change.
//!
//! The host owns an [`OverlayHandle`] and forwards its triggers to it. The
//! handle holds the periodic timer, so dropping or detaching it is the one
//! place where the subscription ends. The surface is lent per call and is
//! never stored.

use std::time::Duration;

use bevy::log::{debug, info};
use bevy::time::{Timer, TimerMode};
use chrono::{DateTime, Utc};

use crate::mask::{MaskRenderer, MaskStyle, OverlaySurface, RenderStats, Viewport};
use crate::solar::{subsolar_point, SubsolarPoint};

/// Default periodic refresh (one minute).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(60_000);

/// Source of "now" for each render.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// How often the overlay refreshes without any viewport activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
    periodic_interval: Duration,
}

impl RefreshPolicy {
    /// Zero is bumped to one millisecond.
    pub fn from_millis(ms: u64) -> Self {
        Self {
            periodic_interval: Duration::from_millis(ms.max(1)),
        }
    }

    pub fn periodic_interval(&self) -> Duration {
        self.periodic_interval
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            periodic_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// What caused a render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Attach,
    Periodic,
    ViewportChanged,
    Manual,
}

/// Outcome of the most recent completed render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderReport {
    pub trigger: Trigger,
    pub instant: DateTime<Utc>,
    pub subsolar: SubsolarPoint,
    pub stats: RenderStats,
}

/// Builds overlay handles with a fixed policy and style.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayRefreshScheduler {
    policy: RefreshPolicy,
    style: MaskStyle,
}

impl OverlayRefreshScheduler {
    pub fn new(policy: RefreshPolicy, style: MaskStyle) -> Self {
        Self { policy, style }
    }

    /// Attach to a host viewport: render once right away and arm the
    /// periodic timer.
    pub fn attach<V, S, C>(&self, viewport: &V, surface: &mut S, clock: &C) -> OverlayHandle
    where
        V: Viewport + ?Sized,
        S: OverlaySurface + ?Sized,
        C: Clock + ?Sized,
    {
        info!(
            "Day/night overlay attached (refresh every {:?}, stride {}, night alpha {})",
            self.policy.periodic_interval,
            self.style.stride(),
            self.style.night_alpha()
        );

        let mut handle = OverlayHandle {
            attachment: Some(Attachment {
                renderer: MaskRenderer::new(self.style),
                timer: Timer::new(self.policy.periodic_interval, TimerMode::Repeating),
            }),
            render_count: 0,
            last_render: None,
        };
        handle.render(Trigger::Attach, viewport, surface, clock);
        handle
    }
}

#[derive(Debug)]
struct Attachment {
    renderer: MaskRenderer,
    timer: Timer,
}

/// Live overlay. Every trigger is a no-op once detached.
#[derive(Debug)]
pub struct OverlayHandle {
    attachment: Option<Attachment>,
    render_count: u64,
    last_render: Option<RenderReport>,
}

impl OverlayHandle {
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Completed renders since attach. Skipped (zero-area) renders do not count.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn last_render(&self) -> Option<&RenderReport> {
        self.last_render.as_ref()
    }

    /// Advance the periodic timer by `elapsed`; renders once if at least one
    /// interval boundary was crossed.
    pub fn advance<V, S, C>(
        &mut self,
        elapsed: Duration,
        viewport: &V,
        surface: &mut S,
        clock: &C,
    ) -> Option<RenderStats>
    where
        V: Viewport + ?Sized,
        S: OverlaySurface + ?Sized,
        C: Clock + ?Sized,
    {
        let attachment = self.attachment.as_mut()?;
        attachment.timer.tick(elapsed);
        if !attachment.timer.just_finished() {
            return None;
        }
        self.render(Trigger::Periodic, viewport, surface, clock)
    }

    /// Host reported a pan, zoom or resize.
    pub fn viewport_changed<V, S, C>(&mut self, viewport: &V, surface: &mut S, clock: &C) -> Option<RenderStats>
    where
        V: Viewport + ?Sized,
        S: OverlaySurface + ?Sized,
        C: Clock + ?Sized,
    {
        self.render(Trigger::ViewportChanged, viewport, surface, clock)
    }

    /// Render immediately, outside the timer cadence.
    pub fn render_now<V, S, C>(&mut self, viewport: &V, surface: &mut S, clock: &C) -> Option<RenderStats>
    where
        V: Viewport + ?Sized,
        S: OverlaySurface + ?Sized,
        C: Clock + ?Sized,
    {
        self.render(Trigger::Manual, viewport, surface, clock)
    }

    /// Cancel the timer and release the buffer and surface. Calling it
    /// again does nothing.
    pub fn detach<S>(&mut self, surface: &mut S)
    where
        S: OverlaySurface + ?Sized,
    {
        let Some(mut attachment) = self.attachment.take() else {
            return;
        };
        attachment.renderer.release();
        surface.release();
        info!("Day/night overlay detached after {} renders", self.render_count);
    }

    fn render<V, S, C>(&mut self, trigger: Trigger, viewport: &V, surface: &mut S, clock: &C) -> Option<RenderStats>
    where
        V: Viewport + ?Sized,
        S: OverlaySurface + ?Sized,
        C: Clock + ?Sized,
    {
        let attachment = self.attachment.as_mut()?;

        let instant = clock.now();
        let subsolar = subsolar_point(instant);
        let stats = attachment.renderer.render(viewport, &subsolar, surface)?;

        self.render_count += 1;
        self.last_render = Some(RenderReport {
            trigger,
            instant,
            subsolar,
            stats,
        });
        debug!(
            "Day/night render ({:?}): {}x{} px, {} samples, {} night, sun at {:.2}, {:.2}",
            trigger,
            stats.width,
            stats.height,
            stats.samples,
            stats.night_samples,
            subsolar.latitude,
            subsolar.longitude
        );
        Some(stats)
    }
}
