use crate::constants::{DEFAULT_LERP_FACTOR, SETTLE_EPSILON};
use crate::error::{ConfigError, ConfigResult};

/// Which input path the page is running on. Decided once per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Touch,
    Pointer,
}

impl DeviceClass {
    /// Classify from a user agent string and whether touch events exist.
    pub fn detect(user_agent: &str, has_touch: bool) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if has_touch || ua.contains("mobi") || ua.contains("android") {
            Self::Touch
        } else {
            Self::Pointer
        }
    }

    /// Touch scrolling is jittery and gets lerped; pointers pass straight through.
    pub fn smoothing_mode(self) -> SmoothingMode {
        match self {
            Self::Touch => SmoothingMode::Lerp(DEFAULT_LERP_FACTOR),
            Self::Pointer => SmoothingMode::PassThrough,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SmoothingMode {
    Lerp(f64),
    PassThrough,
}

impl SmoothingMode {
    pub fn factor(self) -> f64 {
        match self {
            Self::Lerp(a) => a,
            Self::PassThrough => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothedValue {
    pub current: f64,
    pub target: f64,
}

/// Exponential smoothing toward a moving target.
#[derive(Clone, Debug)]
pub struct Smoother {
    value: SmoothedValue,
    factor: f64,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmoothingMode::Lerp(DEFAULT_LERP_FACTOR))
    }
}

impl Smoother {
    /// Factors outside `(0, 1]` are clamped; a zero or negative factor would
    /// never converge.
    pub fn new(mode: SmoothingMode) -> Self {
        let raw = mode.factor();
        let factor = if raw.is_finite() {
            raw.clamp(f64::EPSILON, 1.0)
        } else {
            1.0
        };
        if factor != raw {
            log::warn!("[smoother] factor {} clamped to {}", raw, factor);
        }
        Self {
            value: SmoothedValue::default(),
            factor,
        }
    }

    pub fn try_new(mode: SmoothingMode) -> ConfigResult<Self> {
        let f = mode.factor();
        if !(f > 0.0 && f <= 1.0) {
            return Err(ConfigError::SmoothingFactor(f));
        }
        Ok(Self::new(mode))
    }

    pub fn pass_through() -> Self {
        Self::new(SmoothingMode::PassThrough)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn value(&self) -> SmoothedValue {
        self.value
    }

    pub fn current(&self) -> f64 {
        self.value.current
    }

    /// Jump to `v` with no easing. Used on mount.
    pub fn snap(&mut self, v: f64) {
        self.value = SmoothedValue {
            current: v,
            target: v,
        };
    }

    /// Advance one frame toward `target` and return the new current value.
    pub fn update(&mut self, target: f64) -> f64 {
        self.value.target = target;
        let a = self.factor;
        let next = self.value.current * (1.0 - a) + target * a;
        // Lerp can't cross the target in exact arithmetic; rounding can.
        self.value.current = if (target - self.value.current) >= 0.0 {
            next.min(target)
        } else {
            next.max(target)
        };
        self.value.current
    }

    /// True when the remaining distance is below the settle epsilon.
    pub fn is_settled(&self) -> bool {
        (self.value.target - self.value.current).abs() < SETTLE_EPSILON
    }
}
