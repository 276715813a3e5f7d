//! Simulated live-activity counter.
//!
//! Two schedules feed one value: a steady base tick (+1..=4 every 1–3 s) and
//! a bursty bonus tick whose size and spacing depend on a "momentum" score.
//! Big bonus increments raise momentum, which makes the next bonus more
//! likely to be big and to arrive sooner. Small ones let it cool off.
//!
//! The counter only runs while visible. Its value survives reloads through a
//! key-value store and catches up by an estimate of what it "missed".

use fnv::FnvHashMap;
use rand::prelude::*;

use crate::constants::*;
use crate::timers::{earliest, TimerId, TimerQueue};

/// Durable string storage, e.g. `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: FnvHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

#[derive(Clone, Debug)]
pub struct CounterParams {
    pub seed_value: u64,
    /// Prepended to the `count` and `count-timestamp` keys.
    pub key_prefix: String,
}

impl Default for CounterParams {
    fn default() -> Self {
        Self {
            seed_value: COUNTER_SEED,
            key_prefix: String::new(),
        }
    }
}

impl CounterParams {
    pub fn count_key(&self) -> String {
        format!("{}{}", self.key_prefix, STORAGE_KEY_COUNT)
    }

    pub fn timestamp_key(&self) -> String {
        format!("{}{}", self.key_prefix, STORAGE_KEY_TIMESTAMP)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CounterState {
    pub value: u64,
    pub display_value: u64,
    pub momentum: f64,
    pub last_big_increment_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tick {
    Base,
    Bonus,
}

/// Stepwise display catch-up for large increments.
#[derive(Clone, Copy, Debug)]
struct DisplayRamp {
    from: u64,
    to: u64,
    steps: u64,
    done: u64,
    next_at_ms: f64,
}

impl DisplayRamp {
    fn value_at(&self, step: u64) -> u64 {
        if step >= self.steps {
            return self.to;
        }
        let span = (self.to - self.from) as f64;
        let v = self.from as f64 + span * step as f64 / self.steps as f64;
        (v.round() as u64).min(self.to)
    }
}

pub struct CounterEngine<S: KeyValueStore> {
    params: CounterParams,
    state: CounterState,
    store: S,
    rng: StdRng,
    timers: TimerQueue<Tick>,
    base_timer: Option<TimerId>,
    bonus_timer: Option<TimerId>,
    ramp: Option<DisplayRamp>,
    visible: bool,
}

impl<S: KeyValueStore> CounterEngine<S> {
    /// Build an engine and rehydrate from `store`.
    pub fn new(params: CounterParams, store: S, seed: u64, now_ms: f64) -> Self {
        Self::with_rng(params, store, StdRng::seed_from_u64(seed), now_ms)
    }

    pub fn from_entropy(params: CounterParams, store: S, now_ms: f64) -> Self {
        Self::with_rng(params, store, StdRng::from_entropy(), now_ms)
    }

    fn with_rng(params: CounterParams, store: S, rng: StdRng, now_ms: f64) -> Self {
        let mut engine = Self {
            state: CounterState {
                value: params.seed_value,
                display_value: params.seed_value,
                momentum: MOMENTUM_INITIAL,
                last_big_increment_ms: 0.0,
            },
            params,
            store,
            rng,
            timers: TimerQueue::new(),
            base_timer: None,
            bonus_timer: None,
            ramp: None,
            visible: false,
        };
        engine.rehydrate(now_ms);
        engine
    }

    fn rehydrate(&mut self, now_ms: f64) {
        let saved = self.store.get(&self.params.count_key());
        let saved_at = self.store.get(&self.params.timestamp_key());
        let (Some(saved), Some(saved_at)) = (saved, saved_at) else {
            return;
        };
        let Ok(count) = saved.trim().parse::<u64>() else {
            log::warn!("[counter] stored count {:?} is not a number, using seed", saved);
            return;
        };
        let minutes = saved_at
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .map(|t| ((now_ms - t) / 60_000.0).floor().max(0.0))
            .unwrap_or(0.0);
        let per_minute = self
            .rng
            .gen_range(CATCH_UP_MIN_PER_MINUTE..CATCH_UP_MAX_PER_MINUTE);
        let catch_up = (minutes * per_minute).floor() as u64;
        let restored = count.saturating_add(catch_up);
        log::debug!(
            "[counter] restored {} (+{} for {} min away)",
            restored,
            catch_up,
            minutes
        );
        self.state.value = restored;
        self.state.display_value = restored;
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Start or stop both schedules. Hidden counters keep no timers.
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.schedule_base(now_ms);
            self.schedule_bonus(now_ms);
        } else {
            self.cancel_schedules();
        }
    }

    fn cancel_schedules(&mut self) {
        if let Some(id) = self.base_timer.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.bonus_timer.take() {
            self.timers.cancel(id);
        }
    }

    /// Cancel every timer and ramp. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.cancel_schedules();
        self.timers.clear();
        self.visible = false;
        if let Some(r) = self.ramp.take() {
            self.state.display_value = r.to;
        }
    }

    fn schedule_base(&mut self, now_ms: f64) {
        let delay = base_interval_ms(&mut self.rng);
        self.base_timer = Some(self.timers.schedule(now_ms + delay, Tick::Base));
    }

    fn schedule_bonus(&mut self, now_ms: f64) {
        let delay = bonus_interval_ms(&mut self.rng, self.state.momentum);
        self.bonus_timer = Some(self.timers.schedule(now_ms + delay, Tick::Bonus));
    }

    /// Earliest time `poll` has something to do.
    pub fn next_due_ms(&self) -> Option<f64> {
        earliest(self.timers.next_due_ms(), self.ramp.map(|r| r.next_at_ms))
    }

    /// Whether the display is still catching up to the value.
    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }

    /// Run whatever is due. Returns the new state when anything changed.
    pub fn poll(&mut self, now_ms: f64, hour: u32) -> Option<CounterState> {
        let mut changed = self.advance_display(now_ms);
        if !self.visible {
            return changed.then_some(self.state);
        }
        for (id, tick) in self.timers.drain_due(now_ms) {
            match tick {
                Tick::Base if self.base_timer == Some(id) => {
                    self.tick_base(now_ms);
                    self.schedule_base(now_ms);
                    changed = true;
                }
                Tick::Bonus if self.bonus_timer == Some(id) => {
                    self.tick_bonus(now_ms, hour);
                    self.schedule_bonus(now_ms);
                    changed = true;
                }
                _ => {}
            }
        }
        changed.then_some(self.state)
    }

    pub fn tick_base(&mut self, now_ms: f64) -> CounterState {
        let n = self.rng.gen_range(BASE_TICK_MIN..=BASE_TICK_MAX);
        self.apply_base(n, now_ms)
    }

    pub fn tick_bonus(&mut self, now_ms: f64, hour: u32) -> CounterState {
        let since_big = now_ms - self.state.last_big_increment_ms;
        let n = bonus_increment(&mut self.rng, self.state.momentum, since_big, hour);
        self.apply_bonus(n, now_ms)
    }

    /// Base increments do not touch momentum.
    pub fn apply_base(&mut self, n: u64, now_ms: f64) -> CounterState {
        self.add(n, now_ms);
        self.state
    }

    pub fn apply_bonus(&mut self, n: u64, now_ms: f64) -> CounterState {
        self.state.momentum = next_momentum(self.state.momentum, n);
        if n >= BIG_INCREMENT {
            self.state.last_big_increment_ms = now_ms;
        }
        self.add(n, now_ms);
        self.state
    }

    fn add(&mut self, n: u64, now_ms: f64) {
        self.state.value = self.state.value.saturating_add(n);
        self.persist(now_ms);
        if n < DISPLAY_IMMEDIATE_BELOW {
            self.ramp = None;
            self.state.display_value = self.state.value;
        } else {
            // Restart from whatever is on screen now.
            let steps = n.min(DISPLAY_RAMP_MAX_STEPS);
            self.ramp = Some(DisplayRamp {
                from: self.state.display_value,
                to: self.state.value,
                steps,
                done: 0,
                next_at_ms: now_ms + DISPLAY_RAMP_STEP_MS,
            });
        }
    }

    /// Step the display ramp up to `now_ms`. Returns true if the display moved.
    pub fn advance_display(&mut self, now_ms: f64) -> bool {
        let Some(mut ramp) = self.ramp else {
            return false;
        };
        let before = self.state.display_value;
        while ramp.done < ramp.steps && ramp.next_at_ms <= now_ms {
            ramp.done += 1;
            ramp.next_at_ms += DISPLAY_RAMP_STEP_MS;
            self.state.display_value = ramp.value_at(ramp.done);
        }
        self.ramp = (ramp.done < ramp.steps).then_some(ramp);
        self.state.display_value != before
    }

    fn persist(&mut self, now_ms: f64) {
        let count_key = self.params.count_key();
        let ts_key = self.params.timestamp_key();
        self.store.set(&count_key, &self.state.value.to_string());
        self.store.set(&ts_key, &format!("{}", now_ms.floor() as i64));
    }
}

/// Momentum after an increment of `n`.
pub fn next_momentum(momentum: f64, n: u64) -> f64 {
    for (threshold, gain) in MOMENTUM_STEPS {
        if n >= threshold {
            return (momentum + gain).min(MOMENTUM_CEIL);
        }
    }
    (momentum - MOMENTUM_DECAY).max(MOMENTUM_FLOOR)
}

pub fn is_peak_hour(hour: u32) -> bool {
    (9..=11).contains(&hour) || (15..=17).contains(&hour)
}

pub fn base_interval_ms(rng: &mut impl Rng) -> f64 {
    rng.gen_range(BASE_INTERVAL_MIN_MS..BASE_INTERVAL_MAX_MS).floor()
}

/// Pick a bonus increment size.
///
/// Tiers, in order: small, medium, large, very large, massive, epic. Momentum
/// shifts mass toward the bigger tiers. While a recent big increment is still
/// cooling down, anything above "large" is demoted to "large" with
/// probability `1 - cooldown`.
pub fn bonus_increment(rng: &mut impl Rng, momentum: f64, since_big_ms: f64, hour: u32) -> u64 {
    let momentum = momentum.clamp(0.0, 1.0);
    let boost = momentum * 0.3;
    let cooldown = (since_big_ms / BIG_INCREMENT_COOLDOWN_MS).clamp(0.0, 1.0);
    let hour_mult = if is_peak_hour(hour) {
        PEAK_HOUR_MULTIPLIER
    } else {
        OFF_PEAK_MULTIPLIER
    };

    let small = 0.45 - boost * 0.2;
    let medium = 0.70 - boost * 0.1;
    let large = 0.87 + boost * 0.05;
    let very_large = 0.96 + boost * 0.02;
    let massive = 0.995 + boost * 0.003;

    let mut r: f64 = rng.gen();
    if r >= large && cooldown < 1.0 && rng.gen::<f64>() >= cooldown {
        r = medium;
    }

    let scaled = |base: u64, extra: f64| (base as f64 * hour_mult * extra).floor() as u64;
    if r < small {
        rng.gen_range(1..=5)
    } else if r < medium {
        rng.gen_range(3..=14)
    } else if r < large {
        scaled(rng.gen_range(8..=32), 1.0)
    } else if r < very_large {
        scaled(rng.gen_range(20..=79), 1.0 + momentum * 0.5)
    } else if r < massive {
        scaled(rng.gen_range(50..=199), 1.0 + momentum * 0.3)
    } else {
        scaled(rng.gen_range(100..=399), 1.0 + momentum * 0.8)
    }
}

/// Gap until the next bonus tick. Hot momentum shortens every tier.
pub fn bonus_interval_ms(rng: &mut impl Rng, momentum: f64) -> f64 {
    let r: f64 = rng.gen();
    let base = if r < BURST_PROBABILITY {
        rng.gen_range(300.0..1800.0)
    } else if r < 0.35 {
        rng.gen_range(1000.0..3500.0)
    } else if r < 0.60 {
        rng.gen_range(2000.0..6000.0)
    } else if r < 0.80 {
        rng.gen_range(4000.0..10000.0)
    } else {
        rng.gen_range(6000.0..16000.0)
    };
    let speedup = 1.0 - momentum.clamp(0.0, 1.0) * MOMENTUM_INTERVAL_SPEEDUP;
    let jitter = rng.gen_range(-BONUS_INTERVAL_JITTER_MS..BONUS_INTERVAL_JITTER_MS);
    ((base * speedup).floor() + jitter.floor()).max(BONUS_INTERVAL_FLOOR_MS)
}

/// `3508` → `"3,508"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
