// Host-side tests for one-shot view triggers and the timer queue behind them.

use parallax_core::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let n = Rc::new(Cell::new(0));
    let c = n.clone();
    (n, move || c.set(c.get() + 1))
}

fn seen(id: &str) -> VisibilityEvent {
    VisibilityEvent::new(id, 0.6)
}

#[test]
fn fires_once_for_a_thousand_crossings() {
    let mut reg = ViewTriggerRegistry::new();
    let (hits, cb) = counter();
    reg.register("hero", 0.1, cb);
    for i in 0..1000 {
        reg.observe([seen("hero")], i as f64);
    }
    assert_eq!(hits.get(), 1);
    assert!(reg.has_fired("hero"));
}

#[test]
fn below_threshold_or_not_intersecting_does_not_fire() {
    let mut reg = ViewTriggerRegistry::new();
    let (hits, cb) = counter();
    reg.register("card", 0.5, cb);
    reg.observe([VisibilityEvent::new("card", 0.3)], 0.0);
    reg.observe([VisibilityEvent::hidden("card")], 1.0);
    assert_eq!(hits.get(), 0);
    reg.observe([VisibilityEvent::new("card", 0.5)], 2.0);
    assert_eq!(hits.get(), 1);
}

#[test]
fn zero_threshold_fires_on_first_intersection() {
    let mut reg = ViewTriggerRegistry::new();
    let (hits, cb) = counter();
    reg.register("edge", 0.0, cb);
    let mut touching = VisibilityEvent::new("edge", 0.0);
    touching.is_intersecting = true;
    reg.observe([touching], 0.0);
    assert_eq!(hits.get(), 1);
}

#[test]
fn dispose_before_delay_cancels() {
    let mut reg = ViewTriggerRegistry::new();
    let (hits, cb) = counter();
    reg.register_delayed("late", 0.1, 500.0, cb);
    reg.observe([seen("late")], 0.0);
    assert!(reg.is_pending("late"));
    reg.dispose();
    reg.dispose();
    assert_eq!(reg.poll(10_000.0), 0);
    assert_eq!(hits.get(), 0);
    assert!(reg.next_due_ms().is_none());
}

#[test]
fn unregister_cancels_only_that_trigger() {
    let mut reg = ViewTriggerRegistry::new();
    let (a_hits, a) = counter();
    let (b_hits, b) = counter();
    reg.register_delayed("a", 0.1, 100.0, a);
    reg.register_delayed("b", 0.1, 100.0, b);
    reg.observe([seen("a"), seen("b")], 0.0);
    reg.unregister("a");
    reg.unregister("a");
    reg.unregister("never-registered");
    reg.poll(200.0);
    assert_eq!(a_hits.get(), 0);
    assert_eq!(b_hits.get(), 1);
}

#[test]
fn staggered_delays_from_one_crossing() {
    let mut reg = ViewTriggerRegistry::new();
    let (_, a) = counter();
    let (_, b) = counter();
    reg.register_delayed("A", 0.1, 100.0, a);
    reg.register_delayed("B", 0.1, 300.0, b);
    reg.observe([seen("A"), seen("B")], 0.0);

    reg.poll(150.0);
    assert!(reg.has_fired("A"));
    assert!(!reg.has_fired("B"));

    reg.poll(350.0);
    assert!(reg.has_fired("A"));
    assert!(reg.has_fired("B"));
}

#[test]
fn equal_due_times_fire_in_scheduling_order() {
    let mut reg = ViewTriggerRegistry::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    for id in ["x", "y", "z"] {
        let o = order.clone();
        reg.register_delayed(id, 0.1, 50.0, move || o.borrow_mut().push(id));
    }
    reg.observe([seen("y"), seen("x"), seen("z")], 0.0);
    reg.poll(50.0);
    assert_eq!(*order.borrow(), vec!["y", "x", "z"]);
}

#[test]
fn replacing_a_pending_trigger_never_double_fires() {
    let mut reg = ViewTriggerRegistry::new();
    let (old_hits, old) = counter();
    let (new_hits, new) = counter();
    reg.register_delayed("swap", 0.1, 100.0, old);
    reg.observe([seen("swap")], 0.0);
    assert!(reg.is_pending("swap"));

    reg.register_delayed("swap", 0.1, 100.0, new);
    assert!(!reg.is_pending("swap"));
    reg.poll(500.0);
    assert_eq!(old_hits.get(), 0);
    assert_eq!(new_hits.get(), 0);

    reg.observe([seen("swap")], 500.0);
    reg.poll(600.0);
    assert_eq!(old_hits.get(), 0);
    assert_eq!(new_hits.get(), 1);
}

#[test]
fn re_registering_a_fired_trigger_keeps_it_fired() {
    let mut reg = ViewTriggerRegistry::new();
    let (first_hits, first) = counter();
    let (second_hits, second) = counter();
    reg.register("hero", 0.1, first);
    reg.observe([seen("hero")], 0.0);
    assert_eq!(first_hits.get(), 1);

    reg.register("hero", 0.1, second);
    assert!(reg.has_fired("hero"));
    reg.observe([seen("hero")], 16.0);
    reg.poll(1000.0);
    assert_eq!(first_hits.get() + second_hits.get(), 1);
    assert_eq!(second_hits.get(), 0);
}

#[test]
fn sequence_starts_from_one_signal() {
    let mut reg = ViewTriggerRegistry::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let ids = ["intro-0", "intro-1", "intro-2"];
    reg.register_sequence(&ids, 0.1, 0.0, 150.0, |i| {
        let o = order.clone();
        Box::new(move || o.borrow_mut().push(i))
    });

    assert_eq!(reg.fire_sequence(&ids, 1000.0), 1);
    assert_eq!(*order.borrow(), vec![0]);
    reg.poll(1149.0);
    assert_eq!(order.borrow().len(), 1);
    reg.poll(1150.0);
    reg.poll(1300.0);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);

    // Already started; a second signal is ignored.
    assert_eq!(reg.fire_sequence(&ids, 2000.0), 0);
}

#[test]
fn callbacks_may_touch_the_registry_when_fired_outside_the_borrow() {
    let reg = Rc::new(RefCell::new(ViewTriggerRegistry::new()));
    let r = reg.clone();
    reg.borrow_mut()
        .register("first", 0.1, move || r.borrow_mut().unregister("second"));
    let (hits, cb) = counter();
    reg.borrow_mut().register_delayed("second", 0.1, 100.0, cb);

    let ready = reg
        .borrow_mut()
        .observe_collect([seen("second"), seen("first")], 0.0);
    assert_eq!(ready.len(), 1);
    fire_all(ready);

    assert!(!reg.borrow().is_pending("second"));
    reg.borrow_mut().poll(1000.0);
    assert_eq!(hits.get(), 0);
}

#[test]
fn registering_after_dispose_is_ignored() {
    let mut reg = ViewTriggerRegistry::new();
    reg.dispose();
    let (hits, cb) = counter();
    reg.register("late", 0.1, cb);
    assert!(reg.is_empty());
    reg.observe([seen("late")], 0.0);
    assert_eq!(hits.get(), 0);
}

#[test]
fn strict_registration_rejects_bad_thresholds() {
    let mut reg = ViewTriggerRegistry::new();
    assert_eq!(
        reg.try_register_delayed("x", 1.5, 0.0, || {}),
        Err(ConfigError::Threshold(1.5))
    );
    assert!(reg.try_register_delayed("x", 0.25, f64::INFINITY, || {}).is_err());
    assert!(reg.is_empty());
    assert!(reg.try_register_delayed("x", 0.25, 10.0, || {}).is_ok());
    assert_eq!(reg.len(), 1);
}

#[test]
fn timer_queue_orders_and_cancels() {
    let mut q = TimerQueue::new();
    let late = q.schedule(300.0, "late");
    let early = q.schedule(100.0, "early");
    let tie = q.schedule(100.0, "tie");
    assert_eq!(q.next_due_ms(), Some(100.0));

    assert_eq!(q.cancel(tie), Some("tie"));
    assert_eq!(q.cancel(tie), None);

    let due: Vec<_> = q.drain_due(150.0).into_iter().map(|(_, p)| p).collect();
    assert_eq!(due, vec!["early"]);
    assert!(!q.is_pending(early));
    assert!(q.is_pending(late));
    // Cancelling a fired timer is a no-op.
    assert_eq!(q.cancel(early), None);
    assert_eq!(q.len(), 1);
}
