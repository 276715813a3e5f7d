//! Scroll-driven animation state for the landing page.
//!
//! Nothing in here touches a browser API. The web front-end feeds scroll
//! positions, visibility reports and timestamps in, and applies the resulting
//! offsets and counter values to the DOM.

pub mod constants;
pub mod coordinator;
pub mod counter;
pub mod debounce;
pub mod error;
pub mod lifecycle;
pub mod marquee;
pub mod sampler;
pub mod scramble;
pub mod smoother;
pub mod stats;
pub mod timers;
pub mod trigger;
pub mod window;

pub use coordinator::*;
pub use counter::{
    base_interval_ms, bonus_increment, bonus_interval_ms, format_count, is_peak_hour, next_momentum,
    CounterEngine, CounterParams, CounterState, KeyValueStore, MemoryStore,
};
pub use debounce::DebouncedTrigger;
pub use error::{ConfigError, ConfigResult};
pub use lifecycle::Completion;
pub use marquee::MarqueeLoop;
pub use sampler::*;
pub use scramble::TextScramble;
pub use smoother::*;
pub use stats::{FpsReading, FrameStats};
pub use timers::{earliest, TimerId, TimerQueue, Wake};
pub use trigger::*;
pub use window::*;
