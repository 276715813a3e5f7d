// Tuning defaults for the scroll and counter engines.
//
// These were dialed in by eye for visual feel. Treat them as configuration,
// not as values derived from any deeper invariant.

// Smoothing
pub const DEFAULT_LERP_FACTOR: f64 = 0.1; // touch devices
pub const SETTLE_EPSILON: f64 = 0.5; // px, below this the smoother is idle

// Visibility defaults
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.1;

// Counter seed and momentum
pub const COUNTER_SEED: u64 = 3508;
pub const MOMENTUM_INITIAL: f64 = 0.5;
pub const MOMENTUM_FLOOR: f64 = 0.1;
pub const MOMENTUM_CEIL: f64 = 1.0;
pub const MOMENTUM_DECAY: f64 = 0.02;

// (increment threshold, momentum gain), checked top to bottom
pub const MOMENTUM_STEPS: [(u64, f64); 3] = [(50, 0.3), (20, 0.15), (8, 0.05)];

// Increments at or above this restart the cooldown clock
pub const BIG_INCREMENT: u64 = 20;
pub const BIG_INCREMENT_COOLDOWN_MS: f64 = 30_000.0;

// Base tick: +1..=4 every 1..3 s
pub const BASE_TICK_MIN: u64 = 1;
pub const BASE_TICK_MAX: u64 = 4;
pub const BASE_INTERVAL_MIN_MS: f64 = 1_000.0;
pub const BASE_INTERVAL_MAX_MS: f64 = 3_000.0;

// Bonus scheduling
pub const BURST_PROBABILITY: f64 = 0.15;
pub const BONUS_INTERVAL_FLOOR_MS: f64 = 300.0;
pub const BONUS_INTERVAL_JITTER_MS: f64 = 400.0;
pub const MOMENTUM_INTERVAL_SPEEDUP: f64 = 0.4; // up to 40% shorter gaps when hot

// Peak-hour multiplier for larger bonus tiers
pub const PEAK_HOUR_MULTIPLIER: f64 = 1.2;
pub const OFF_PEAK_MULTIPLIER: f64 = 0.9;

// Display ramp for large increments
pub const DISPLAY_IMMEDIATE_BELOW: u64 = 8;
pub const DISPLAY_RAMP_MAX_STEPS: u64 = 8;
pub const DISPLAY_RAMP_STEP_MS: f64 = 40.0;

// Persistence
pub const STORAGE_KEY_COUNT: &str = "count";
pub const STORAGE_KEY_TIMESTAMP: &str = "count-timestamp";
pub const CATCH_UP_MIN_PER_MINUTE: f64 = 1.0;
pub const CATCH_UP_MAX_PER_MINUTE: f64 = 3.0;

// Marquee
pub const MARQUEE_BASE_SPEED: f64 = 0.625;
pub const MARQUEE_PX_PER_SECOND: f64 = 100.0; // at time_scale 1
pub const MARQUEE_EASE_PER_SEC: f64 = 6.0;

// Text scramble
pub const SCRAMBLE_DURATION_MS: f64 = 800.0;
pub const SCRAMBLE_FRAME_MS: f64 = 1000.0 / 60.0;

// Frame stats
pub const FPS_WINDOW_MS: f64 = 1000.0;
pub const FPS_HISTORY_LEN: usize = 10;

// Hover debounce
pub const DEBOUNCE_RELEASE_MS: f64 = 100.0;
