use crate::constants::DEBOUNCE_RELEASE_MS;

/// Hover-style retrigger guard.
///
/// `try_trigger` lets one activation through and then refuses until
/// `cooldown_ms` has passed. Leaving the element (`release`) re-arms after a
/// short grace period instead.
#[derive(Clone, Debug)]
pub struct DebouncedTrigger {
    cooldown_ms: f64,
    release_ms: f64,
    hovering: bool,
    ready_at_ms: f64,
}

impl DebouncedTrigger {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            cooldown_ms: cooldown_ms.max(0.0),
            release_ms: DEBOUNCE_RELEASE_MS,
            hovering: false,
            ready_at_ms: f64::NEG_INFINITY,
        }
    }

    pub fn with_release_ms(mut self, release_ms: f64) -> Self {
        self.release_ms = release_ms.max(0.0);
        self
    }

    pub fn can_trigger(&self, now_ms: f64) -> bool {
        !self.hovering && now_ms >= self.ready_at_ms
    }

    pub fn try_trigger(&mut self, now_ms: f64) -> bool {
        if !self.can_trigger(now_ms) {
            return false;
        }
        self.hovering = true;
        self.ready_at_ms = now_ms + self.cooldown_ms;
        true
    }

    pub fn release(&mut self, now_ms: f64) {
        self.hovering = false;
        self.ready_at_ms = now_ms + self.release_ms;
    }

    pub fn cancel(&mut self) {
        self.hovering = false;
        self.ready_at_ms = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_while_hovering_and_rearms_after_release() {
        let mut d = DebouncedTrigger::new(800.0);
        assert!(d.try_trigger(0.0));
        assert!(!d.try_trigger(10.0));
        d.release(50.0);
        assert!(!d.try_trigger(100.0));
        assert!(d.try_trigger(150.0));
    }

    #[test]
    fn cancel_resets() {
        let mut d = DebouncedTrigger::new(1000.0);
        assert!(d.try_trigger(0.0));
        d.cancel();
        assert!(d.try_trigger(1.0));
    }
}
