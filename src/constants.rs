// Page wiring: DOM hooks, observer options and the parallax layer layout.

/// One scroll-linked layer. Fractions are of the viewport height.
#[derive(Clone, Copy, Debug)]
pub struct LayerSpec {
    pub name: &'static str,
    pub start: f64,
    pub stop: f64,
    pub speed: f64,
}

// Desktop reads the raw position, so stops sit a little later.
pub const POINTER_LAYERS: &[LayerSpec] = &[
    LayerSpec { name: "robot", start: 0.41, stop: 1.625, speed: 1.0 },
    LayerSpec { name: "capsule", start: 1.189, stop: 2.40, speed: 1.0 },
];

pub const TOUCH_LAYERS: &[LayerSpec] = &[
    LayerSpec { name: "robot", start: 0.41, stop: 1.45, speed: 1.0 },
    LayerSpec { name: "capsule", start: 1.189, stop: 2.39, speed: 1.0 },
];

// DOM hooks
pub const ATTR_PARALLAX: &str = "data-parallax"; // value: layer name
pub const ATTR_PARALLAX_ROOT: &str = "data-parallax-root";
pub const ATTR_REVEAL: &str = "data-reveal"; // value: trigger id
pub const ATTR_REVEAL_DELAY: &str = "data-reveal-delay"; // ms
pub const ATTR_REVEAL_SEQUENCE: &str = "data-reveal-sequence";
pub const ATTR_MARQUEE: &str = "data-marquee";
pub const ATTR_SCRAMBLE: &str = "data-scramble";
pub const ATTR_SCRAMBLE_DISABLED: &str = "data-scramble-disabled"; // static text
pub const ATTR_REVEALED: &str = "data-revealed"; // set once a reveal fires
pub const COUNTER_ELEMENT_ID: &str = "live-counter";

// Observer options
pub const REVEAL_THRESHOLD: f64 = parallax_core::constants::DEFAULT_VISIBILITY_THRESHOLD;
pub const REVEAL_ROOT_MARGIN: &str = "-30% 0px -30% 0px";
pub const SECTION_ROOT_MARGIN: &str = "0px";
pub const COUNTER_ROOT_MARGIN: &str = "50px 0px 50px 0px";
pub const MARQUEE_ROOT_MARGIN: &str = "100px 0px 100px 0px";

// Staged reveals
pub const SEQUENCE_STEP_MS: f64 = 150.0;

// Timers due within this are served by the next animation frame
pub const TIMER_SLACK_MS: f64 = 20.0;

// Persistence
pub const COUNTER_KEY_PREFIX: &str = "wallet-";
