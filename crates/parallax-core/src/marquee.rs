use crate::constants::{MARQUEE_BASE_SPEED, MARQUEE_EASE_PER_SEC, MARQUEE_PX_PER_SECOND};
use crate::coordinator::ScrollDirection;

/// Endless horizontal card loop that follows scroll direction.
///
/// Playback speed is a signed `time_scale`. Scrolling down targets
/// `+base_speed`, scrolling up targets `-base_speed`, hovering targets `0`.
/// The actual scale eases toward the target so reversals never snap.
#[derive(Clone, Debug)]
pub struct MarqueeLoop {
    loop_width: f64,
    base_speed: f64,
    offset: f64,
    time_scale: f64,
    direction: ScrollDirection,
    hovered: bool,
    playing: bool,
}

impl MarqueeLoop {
    /// `lane` staggers lanes: lane `i` runs at `base + 0.25 * i`.
    pub fn new(loop_width: f64, lane: usize) -> Self {
        let base_speed = MARQUEE_BASE_SPEED + lane as f64 * 0.25;
        Self {
            loop_width: loop_width.max(0.0),
            base_speed,
            offset: 0.0,
            time_scale: 0.0,
            direction: ScrollDirection::Down,
            hovered: false,
            playing: false,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Pause while off-screen; resume where it left off.
    pub fn set_visible(&mut self, visible: bool) {
        self.playing = visible;
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn set_direction(&mut self, direction: ScrollDirection) {
        self.direction = direction;
    }

    pub fn set_loop_width(&mut self, loop_width: f64) {
        self.loop_width = loop_width.max(0.0);
        self.offset = self.wrap(self.offset);
    }

    pub fn target_time_scale(&self) -> f64 {
        if self.hovered {
            0.0
        } else {
            self.direction.sign() * self.base_speed
        }
    }

    /// Advance by `dt_sec`. Paused loops do not move.
    pub fn step(&mut self, dt_sec: f64) -> f64 {
        if !self.playing || dt_sec.is_nan() || dt_sec <= 0.0 {
            return self.offset;
        }
        let target = self.target_time_scale();
        let alpha = 1.0 - (-dt_sec * MARQUEE_EASE_PER_SEC).exp();
        self.time_scale += (target - self.time_scale) * alpha;
        self.offset = self.wrap(self.offset + self.time_scale * MARQUEE_PX_PER_SECOND * dt_sec);
        self.offset
    }

    fn wrap(&self, x: f64) -> f64 {
        if self.loop_width <= 0.0 {
            return 0.0;
        }
        // rem_euclid can round up to the width itself for tiny negatives.
        let r = x.rem_euclid(self.loop_width);
        if r >= self.loop_width {
            0.0
        } else {
            r
        }
    }
}
