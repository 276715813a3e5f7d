//! One-shot "entered view" triggers.
//!
//! Each visual element registers a callback under an id. The first time the
//! element is seen at or above its threshold the callback runs, optionally
//! after a delay, and never again. Delayed callbacks live in a timer queue so
//! that unregistering an element cancels them.

use fnv::FnvHashMap;

use crate::constants::DEFAULT_VISIBILITY_THRESHOLD;
use crate::error::{ConfigError, ConfigResult};
use crate::timers::{TimerId, TimerQueue};

pub type TriggerCallback = Box<dyn FnOnce()>;

/// One crossing report from the visibility observer.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityEvent {
    pub element_id: String,
    pub is_intersecting: bool,
    pub visible_fraction: f64,
    pub root_margin_px: f64,
}

impl VisibilityEvent {
    pub fn new(element_id: impl Into<String>, visible_fraction: f64) -> Self {
        let visible_fraction = if visible_fraction.is_finite() {
            visible_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            element_id: element_id.into(),
            is_intersecting: visible_fraction > 0.0,
            visible_fraction,
            root_margin_px: 0.0,
        }
    }

    pub fn hidden(element_id: impl Into<String>) -> Self {
        Self::new(element_id, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerState {
    Armed,
    Scheduled(TimerId),
    Fired,
}

struct Trigger {
    threshold: f64,
    delay_ms: f64,
    state: TriggerState,
    callback: Option<TriggerCallback>,
}

impl Trigger {
    fn crosses(&self, ev: &VisibilityEvent) -> bool {
        ev.is_intersecting && ev.visible_fraction >= self.threshold
    }
}

/// A trigger whose callback is due but has not been invoked yet.
pub struct ReadyTrigger {
    pub id: String,
    callback: TriggerCallback,
}

impl ReadyTrigger {
    pub fn fire(self) {
        (self.callback)()
    }
}

#[derive(Default)]
pub struct ViewTriggerRegistry {
    triggers: FnvHashMap<String, Trigger>,
    timers: TimerQueue<String>,
    disposed: bool,
}

impl ViewTriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn register(&mut self, id: impl Into<String>, threshold_fraction: f64, callback: impl FnOnce() + 'static) {
        self.register_delayed(id, threshold_fraction, 0.0, callback);
    }

    /// Register or replace a trigger. A replaced trigger's pending callback is
    /// cancelled and the new one is armed in its place. An id that has already
    /// fired stays fired, so re-registering never fires it twice.
    pub fn register_delayed(
        &mut self,
        id: impl Into<String>,
        threshold_fraction: f64,
        delay_ms: f64,
        callback: impl FnOnce() + 'static,
    ) {
        let id = id.into();
        if self.disposed {
            log::warn!("[triggers] register '{}' after dispose ignored", id);
            return;
        }
        let threshold = if threshold_fraction.is_finite() {
            threshold_fraction.clamp(0.0, 1.0)
        } else {
            log::warn!(
                "[triggers] '{}' has a non-finite threshold, using {}",
                id,
                DEFAULT_VISIBILITY_THRESHOLD
            );
            DEFAULT_VISIBILITY_THRESHOLD
        };
        let delay_ms = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        let previous = self.triggers.get(&id).map(|t| t.state);
        if let Some(TriggerState::Scheduled(timer)) = previous {
            self.timers.cancel(timer);
            log::debug!("[triggers] '{}' replaced while pending", id);
        }
        let trigger = if previous == Some(TriggerState::Fired) {
            log::debug!("[triggers] '{}' already fired, keeping it fired", id);
            Trigger {
                threshold,
                delay_ms,
                state: TriggerState::Fired,
                callback: None,
            }
        } else {
            Trigger {
                threshold,
                delay_ms,
                state: TriggerState::Armed,
                callback: Some(Box::new(callback)),
            }
        };
        self.triggers.insert(id, trigger);
    }

    /// Like `register_delayed`, but rejects a threshold outside `[0, 1]`
    /// instead of clamping it.
    pub fn try_register_delayed(
        &mut self,
        id: impl Into<String>,
        threshold_fraction: f64,
        delay_ms: f64,
        callback: impl FnOnce() + 'static,
    ) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&threshold_fraction) {
            return Err(ConfigError::Threshold(threshold_fraction));
        }
        ConfigError::check_finite("delay_ms", delay_ms)?;
        self.register_delayed(id, threshold_fraction, delay_ms, callback);
        Ok(())
    }

    /// Register `ids.len()` delayed triggers for a staged reveal; item `i`
    /// waits `base_delay_ms + i * step_ms` after the shared start signal.
    pub fn register_sequence<S, F>(
        &mut self,
        ids: &[S],
        threshold_fraction: f64,
        base_delay_ms: f64,
        step_ms: f64,
        mut make_callback: F,
    ) where
        S: AsRef<str>,
        F: FnMut(usize) -> TriggerCallback,
    {
        for (i, id) in ids.iter().enumerate() {
            let cb = make_callback(i);
            self.register_delayed(
                id.as_ref(),
                threshold_fraction,
                base_delay_ms + i as f64 * step_ms,
                cb,
            );
        }
    }

    pub fn unregister(&mut self, id: &str) {
        if let Some(t) = self.triggers.remove(id) {
            if let TriggerState::Scheduled(timer) = t.state {
                self.timers.cancel(timer);
                log::debug!("[triggers] '{}' unmounted before its delay elapsed", id);
            }
        }
    }

    /// Drop every trigger and pending callback. Safe to call more than once.
    pub fn dispose(&mut self) {
        if !self.disposed {
            log::debug!("[triggers] dispose ({} registered)", self.triggers.len());
        }
        self.triggers.clear();
        self.timers.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn has_fired(&self, id: &str) -> bool {
        matches!(
            self.triggers.get(id).map(|t| t.state),
            Some(TriggerState::Fired)
        )
    }

    pub fn is_pending(&self, id: &str) -> bool {
        matches!(
            self.triggers.get(id).map(|t| t.state),
            Some(TriggerState::Scheduled(_))
        )
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.timers.next_due_ms()
    }

    /// Treat `id` as having crossed its threshold at `now_ms`.
    fn arm(&mut self, id: &str, now_ms: f64, ready: &mut Vec<ReadyTrigger>) {
        let Some(t) = self.triggers.get_mut(id) else {
            return;
        };
        if t.state != TriggerState::Armed {
            return;
        }
        if t.delay_ms <= 0.0 {
            t.state = TriggerState::Fired;
            if let Some(callback) = t.callback.take() {
                ready.push(ReadyTrigger {
                    id: id.to_string(),
                    callback,
                });
            }
        } else {
            let timer = self.timers.schedule(now_ms + t.delay_ms, id.to_string());
            t.state = TriggerState::Scheduled(timer);
        }
    }

    /// Apply visibility events and return the callbacks that became due
    /// immediately, without invoking them.
    ///
    /// Hosts that keep the registry in a `RefCell` should use this and fire
    /// after releasing the borrow, so callbacks may touch the registry.
    pub fn observe_collect<I>(&mut self, events: I, now_ms: f64) -> Vec<ReadyTrigger>
    where
        I: IntoIterator<Item = VisibilityEvent>,
    {
        let mut ready = Vec::new();
        for ev in events {
            let crossed = self
                .triggers
                .get(&ev.element_id)
                .map(|t| t.state == TriggerState::Armed && t.crosses(&ev))
                .unwrap_or(false);
            if crossed {
                self.arm(&ev.element_id, now_ms, &mut ready);
            }
        }
        ready
    }

    pub fn observe<I>(&mut self, events: I, now_ms: f64) -> usize
    where
        I: IntoIterator<Item = VisibilityEvent>,
    {
        fire_all(self.observe_collect(events, now_ms))
    }

    /// Start every id in `ids` from one shared signal, regardless of
    /// visibility. Each keeps its own delay.
    pub fn start_collect<S: AsRef<str>>(&mut self, ids: &[S], now_ms: f64) -> Vec<ReadyTrigger> {
        let mut ready = Vec::new();
        for id in ids {
            self.arm(id.as_ref(), now_ms, &mut ready);
        }
        ready
    }

    pub fn fire_sequence<S: AsRef<str>>(&mut self, ids: &[S], now_ms: f64) -> usize {
        fire_all(self.start_collect(ids, now_ms))
    }

    /// Collect delayed callbacks due at `now_ms`, earliest first.
    pub fn poll_collect(&mut self, now_ms: f64) -> Vec<ReadyTrigger> {
        let mut ready = Vec::new();
        for (_, id) in self.timers.drain_due(now_ms) {
            if let Some(t) = self.triggers.get_mut(&id) {
                t.state = TriggerState::Fired;
                if let Some(callback) = t.callback.take() {
                    ready.push(ReadyTrigger { id, callback });
                }
            }
        }
        ready
    }

    pub fn poll(&mut self, now_ms: f64) -> usize {
        fire_all(self.poll_collect(now_ms))
    }
}

pub fn fire_all(ready: Vec<ReadyTrigger>) -> usize {
    let n = ready.len();
    for r in ready {
        log::debug!("[triggers] fire '{}'", r.id);
        r.fire();
    }
    n
}
