// Host-side tests for the live-activity counter.

use parallax_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn engine() -> CounterEngine<MemoryStore> {
    CounterEngine::new(CounterParams::default(), MemoryStore::new(), 7, 0.0)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn starts_from_the_seed() {
    let e = engine();
    let s = e.state();
    assert_eq!(s.value, 3508);
    assert_eq!(s.display_value, 3508);
    assert_eq!(s.momentum, 0.5);
    assert!(!e.is_visible());
}

#[test]
fn small_base_tick_shows_immediately() {
    let mut e = engine();
    let s = e.apply_base(3, 1000.0);
    assert_eq!(s.value, 3511);
    assert_eq!(s.display_value, 3511);
    // Base ticks leave momentum alone.
    assert_eq!(s.momentum, 0.5);
    assert_eq!(e.store().get("count").as_deref(), Some("3511"));
    assert_eq!(e.store().get("count-timestamp").as_deref(), Some("1000"));
}

#[test]
fn large_increment_ramps_the_display() {
    let mut e = engine();
    let s = e.apply_bonus(40, 0.0);
    assert_eq!(s.value, 3548);
    assert_eq!(s.display_value, 3508);
    assert!(e.is_ramping());

    assert!(e.advance_display(40.0));
    let first = e.state().display_value;
    assert!(first > 3508 && first < 3548, "first step {}", first);

    let mut now = 40.0;
    while e.state().display_value < e.state().value {
        now += 40.0;
        e.advance_display(now);
        assert!(e.state().display_value <= e.state().value);
        assert!(now < 1000.0, "ramp did not finish");
    }
    assert_eq!(e.state().display_value, 3548);
    assert!(!e.is_ramping());
    assert!(!e.advance_display(now + 1000.0));
}

#[test]
fn idle_visible_counter_sleeps_between_ticks() {
    let mut e = engine();
    e.set_visible(true, 0.0);
    assert!(!e.is_ramping());
    let due = e.next_due_ms().expect("scheduled once visible");
    // No frames are needed until the first tick is close.
    assert_eq!(Wake::plan(e.is_ramping(), 0.0, e.next_due_ms(), 20.0), Wake::After(due));
    assert_eq!(Wake::plan(e.is_ramping(), due - 5.0, e.next_due_ms(), 20.0), Wake::NextFrame);

    e.apply_bonus(40, 10.0);
    assert_eq!(Wake::plan(e.is_ramping(), 10.0, e.next_due_ms(), 20.0), Wake::NextFrame);
}

#[test]
fn bonus_updates_momentum_and_big_time() {
    let mut e = engine();
    let s = e.apply_bonus(25, 5_000.0);
    assert!(approx(s.momentum, 0.65));
    assert_eq!(s.last_big_increment_ms, 5_000.0);

    let s = e.apply_bonus(3, 6_000.0);
    assert!(approx(s.momentum, 0.63));
    assert_eq!(s.last_big_increment_ms, 5_000.0);
}

#[test]
fn momentum_steps() {
    assert!(approx(next_momentum(0.5, 50), 0.8));
    assert!(approx(next_momentum(0.5, 20), 0.65));
    assert!(approx(next_momentum(0.5, 8), 0.55));
    assert!(approx(next_momentum(0.5, 7), 0.48));
    assert_eq!(next_momentum(0.9, 60), 1.0);
    assert_eq!(next_momentum(0.1, 1), 0.1);
    assert_eq!(next_momentum(0.11, 1), 0.1);
}

#[test]
fn value_never_decreases_and_display_never_leads() {
    let mut e = engine();
    e.set_visible(true, 0.0);
    let mut prev = e.state().value;
    let mut now = 0.0;
    for i in 0..2000 {
        now += 37.0;
        let s = if i % 3 == 0 {
            e.tick_bonus(now, (i % 24) as u32)
        } else {
            e.tick_base(now)
        };
        assert!(s.value >= prev);
        assert!(s.display_value <= s.value);
        assert!((0.1..=1.0).contains(&s.momentum));
        e.advance_display(now + 20.0);
        assert!(e.state().display_value <= e.state().value);
        prev = s.value;
    }
}

#[test]
fn hidden_counter_keeps_no_timers() {
    let mut e = engine();
    assert!(e.next_due_ms().is_none());
    assert!(e.poll(100_000.0, 12).is_none());
    assert_eq!(e.state().value, 3508);

    e.set_visible(true, 0.0);
    let due = e.next_due_ms().expect("scheduled once visible");
    assert!(due >= 300.0 && due <= 3000.0, "first due {}", due);

    let before = e.state().value;
    e.poll(20_000.0, 12);
    assert!(e.state().value > before);

    e.set_visible(false, 20_000.0);
    let after_hide = e.state().value;
    for t in [30_000.0, 60_000.0, 600_000.0] {
        e.poll(t, 12);
    }
    assert_eq!(e.state().value, after_hide);
    assert_eq!(e.state().display_value, after_hide);
    assert!(e.next_due_ms().is_none());
}

#[test]
fn dispose_settles_the_display_and_stops() {
    let mut e = engine();
    e.set_visible(true, 0.0);
    e.apply_bonus(100, 10.0);
    e.dispose();
    e.dispose();
    let s = e.state();
    assert_eq!(s.display_value, s.value);
    assert!(e.next_due_ms().is_none());
    assert!(!e.is_visible());
}

#[test]
fn rehydrates_with_catch_up() {
    let mut store = MemoryStore::new();
    store.set("count", "5000");
    store.set("count-timestamp", "0");
    let ten_minutes = 10.0 * 60_000.0;
    let e = CounterEngine::new(CounterParams::default(), store, 3, ten_minutes);
    let v = e.state().value;
    assert!((5010..=5030).contains(&v), "restored {}", v);
    assert_eq!(e.state().display_value, v);
}

#[test]
fn corrupt_storage_uses_the_seed() {
    let mut store = MemoryStore::new();
    store.set("count", "not-a-number");
    store.set("count-timestamp", "0");
    let e = CounterEngine::new(CounterParams::default(), store, 3, 60_000.0);
    assert_eq!(e.state().value, 3508);
}

#[test]
fn clock_skew_never_subtracts() {
    let mut store = MemoryStore::new();
    store.set("count", "9000");
    store.set("count-timestamp", "999999999");
    let e = CounterEngine::new(CounterParams::default(), store, 3, 0.0);
    assert_eq!(e.state().value, 9000);
}

#[test]
fn keys_use_the_prefix() {
    let params = CounterParams {
        key_prefix: "wallet-".to_string(),
        ..CounterParams::default()
    };
    assert_eq!(params.count_key(), "wallet-count");
    assert_eq!(params.timestamp_key(), "wallet-count-timestamp");
    let mut e = CounterEngine::new(params, MemoryStore::new(), 1, 0.0);
    e.apply_base(1, 42.0);
    assert_eq!(e.store().get("wallet-count").as_deref(), Some("3509"));
    assert!(e.store().get("count").is_none());
}

#[test]
fn schedules_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..5000 {
        let b = base_interval_ms(&mut rng);
        assert!((1000.0..3000.0).contains(&b));
        let g = bonus_interval_ms(&mut rng, 0.8);
        assert!(g >= 300.0 && g < 16_400.0, "gap {}", g);
    }
}

#[test]
fn bonus_sizes_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut max = 0;
    for i in 0..20_000 {
        let n = bonus_increment(&mut rng, 1.0, 60_000.0, (i % 24) as u32);
        assert!(n >= 1);
        max = max.max(n);
    }
    // Epic tier at full momentum during peak hours.
    assert!(max <= (399.0_f64 * 1.2 * 1.8).floor() as u64);
    assert!(max >= 50, "no large increments in 20k draws");
}

#[test]
fn peak_hours() {
    assert!(is_peak_hour(9));
    assert!(is_peak_hour(17));
    assert!(!is_peak_hour(13));
    assert!(!is_peak_hour(3));
}

#[test]
fn formats_with_grouping() {
    assert_eq!(format_count(0), "0");
    assert_eq!(format_count(999), "999");
    assert_eq!(format_count(3508), "3,508");
    assert_eq!(format_count(1_234_567), "1,234,567");
}
