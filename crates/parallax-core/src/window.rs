//! Scroll trigger windows.
//!
//! A window says "start moving this element once the page has scrolled
//! `start_fraction` viewports, and freeze it at `stop_fraction`". Fractions are
//! stored, pixels are resolved per viewport height, so a resize only needs a
//! re-resolve.

use crate::error::{ConfigError, ConfigResult};

/// Immutable once built; `degenerate` is decided at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerWindow {
    start_fraction: f64,
    stop_fraction: f64,
    speed_multiplier: f64,
    base_offset: f64,
    degenerate: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementAnimationState {
    pub offset: f64,
    pub clamped: bool,
}

/// Which of the three regions a scroll position falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowPhase {
    Idle,
    Tracking,
    Clamped,
}

impl TriggerWindow {
    /// Build a window. Bad configuration does not fail here; the window is
    /// kept but never leaves the idle state.
    pub fn new(start_fraction: f64, stop_fraction: f64, speed_multiplier: f64) -> Self {
        let mut w = Self {
            start_fraction,
            stop_fraction,
            speed_multiplier,
            base_offset: 0.0,
            degenerate: false,
        };
        if let Err(e) = w.validate() {
            log::warn!("[window] {}; element will stay idle", e);
            w.degenerate = true;
        }
        w
    }

    pub fn try_new(start_fraction: f64, stop_fraction: f64, speed_multiplier: f64) -> ConfigResult<Self> {
        let w = Self {
            start_fraction,
            stop_fraction,
            speed_multiplier,
            base_offset: 0.0,
            degenerate: false,
        };
        w.validate()?;
        Ok(w)
    }

    pub fn with_base_offset(mut self, base_offset: f64) -> Self {
        if base_offset.is_finite() {
            self.base_offset = base_offset;
        } else {
            log::warn!("[window] ignoring non-finite base offset");
        }
        self
    }

    fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_finite("start_fraction", self.start_fraction)?;
        ConfigError::check_finite("stop_fraction", self.stop_fraction)?;
        ConfigError::check_finite("speed_multiplier", self.speed_multiplier)?;
        if self.stop_fraction <= self.start_fraction {
            return Err(ConfigError::EmptyWindow {
                start: self.start_fraction,
                stop: self.stop_fraction,
            });
        }
        Ok(())
    }

    pub fn start_fraction(&self) -> f64 {
        self.start_fraction
    }

    pub fn stop_fraction(&self) -> f64 {
        self.stop_fraction
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn base_offset(&self) -> f64 {
        self.base_offset
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn resolve(&self, viewport_height: f64) -> ResolvedWindow {
        let vh = if viewport_height.is_finite() {
            viewport_height.max(0.0)
        } else {
            0.0
        };
        ResolvedWindow {
            window: *self,
            start_px: self.start_fraction * vh,
            stop_px: self.stop_fraction * vh,
        }
    }

    /// Largest displacement this window can produce at `viewport_height`.
    pub fn max_travel(&self, viewport_height: f64) -> f64 {
        self.resolve(viewport_height).max_travel()
    }
}

/// Map a scroll position through `window` at the given viewport height.
pub fn map_offset(
    scroll_position: f64,
    window: &TriggerWindow,
    viewport_height: f64,
) -> ElementAnimationState {
    window.resolve(viewport_height).map(scroll_position)
}

/// A window with its pixel thresholds computed for one viewport height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedWindow {
    window: TriggerWindow,
    start_px: f64,
    stop_px: f64,
}

impl ResolvedWindow {
    pub fn window(&self) -> &TriggerWindow {
        &self.window
    }

    pub fn start_px(&self) -> f64 {
        self.start_px
    }

    pub fn stop_px(&self) -> f64 {
        self.stop_px
    }

    pub fn max_travel(&self) -> f64 {
        if self.window.degenerate {
            return 0.0;
        }
        (self.stop_px - self.start_px) * self.window.speed_multiplier
    }

    pub fn phase(&self, scroll_position: f64) -> WindowPhase {
        if self.window.degenerate || scroll_position.is_nan() || scroll_position < self.start_px {
            WindowPhase::Idle
        } else if scroll_position <= self.stop_px {
            WindowPhase::Tracking
        } else {
            WindowPhase::Clamped
        }
    }

    pub fn map(&self, scroll_position: f64) -> ElementAnimationState {
        let base = self.window.base_offset;
        match self.phase(scroll_position) {
            WindowPhase::Idle => ElementAnimationState {
                offset: base,
                clamped: false,
            },
            WindowPhase::Tracking => ElementAnimationState {
                offset: base + (scroll_position - self.start_px) * self.window.speed_multiplier,
                clamped: false,
            },
            WindowPhase::Clamped => ElementAnimationState {
                offset: base + self.max_travel(),
                clamped: true,
            },
        }
    }

    /// Normalized progress through the window in `[0, 1]`.
    pub fn progress(&self, scroll_position: f64) -> f64 {
        match self.phase(scroll_position) {
            WindowPhase::Idle => 0.0,
            WindowPhase::Clamped => 1.0,
            WindowPhase::Tracking => {
                let span = self.stop_px - self.start_px;
                if span > 0.0 {
                    ((scroll_position - self.start_px) / span).clamp(0.0, 1.0)
                } else {
                    1.0
                }
            }
        }
    }
}
