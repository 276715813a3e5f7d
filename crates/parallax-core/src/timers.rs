//! One-shot timer queue on an explicit millisecond clock.
//!
//! The engine never reads the wall clock itself. Callers schedule with a due
//! time and later call [`TimerQueue::drain_due`] with the current time; the
//! host decides how often that happens (animation frame, `setTimeout`, or a
//! test loop).

use std::collections::BTreeMap;

use fnv::FnvHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Ordering key: due time in whole microseconds, then insertion sequence.
type Slot = (i64, u64);

#[derive(Debug)]
pub struct TimerQueue<T> {
    seq: u64,
    by_due: BTreeMap<Slot, (TimerId, T)>,
    slots: FnvHashMap<TimerId, Slot>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            seq: 0,
            by_due: BTreeMap::new(),
            slots: FnvHashMap::default(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn schedule(&mut self, due_ms: f64, payload: T) -> TimerId {
        self.seq += 1;
        let id = TimerId(self.seq);
        let slot = (to_key(due_ms), self.seq);
        self.by_due.insert(slot, (id, payload));
        self.slots.insert(id, slot);
        id
    }

    /// Remove a pending timer. Returns its payload if it had not fired yet;
    /// cancelling a fired or unknown timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let slot = self.slots.remove(&id)?;
        self.by_due.remove(&slot).map(|(_, p)| p)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.by_due.keys().next().map(|(k, _)| *k as f64 / 1000.0)
    }

    /// Pop every timer due at or before `now_ms`, earliest first. Timers with
    /// the same due time come out in scheduling order.
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<(TimerId, T)> {
        let limit = to_key(now_ms);
        let mut out = Vec::new();
        while let Some(entry) = self.by_due.first_entry() {
            if entry.key().0 > limit {
                break;
            }
            let (id, payload) = entry.remove();
            self.slots.remove(&id);
            out.push((id, payload));
        }
        out
    }

    pub fn clear(&mut self) {
        self.by_due.clear();
        self.slots.clear();
    }
}

/// What a host loop should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Wake {
    /// Run again on the next animation frame.
    NextFrame,
    /// Sleep, then run again after this many milliseconds.
    After(f64),
    /// Nothing left to do until an external event arrives.
    Idle,
}

impl Wake {
    /// Frames are only requested while something animates or a timer is
    /// due within `slack_ms`; later timers get a single delayed wake.
    pub fn plan(animating: bool, now_ms: f64, next_due_ms: Option<f64>, slack_ms: f64) -> Self {
        if animating {
            return Wake::NextFrame;
        }
        match next_due_ms.filter(|d| !d.is_nan()) {
            None => Wake::Idle,
            Some(due) if due - now_ms <= slack_ms => Wake::NextFrame,
            Some(due) => Wake::After(due - now_ms),
        }
    }
}

/// Earlier of two optional due times.
pub fn earliest(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[inline]
fn to_key(ms: f64) -> i64 {
    if ms.is_nan() {
        return i64::MAX;
    }
    (ms * 1000.0).round().clamp(i64::MIN as f64, i64::MAX as f64) as i64
}
