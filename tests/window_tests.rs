// Host-side tests for trigger window mapping.

use parallax_core::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn robot_window_below_inside_and_past_stop() {
    let w = TriggerWindow::new(0.41, 1.45, 1.0);
    let vh = 1000.0;

    let idle = map_offset(0.0, &w, vh);
    assert_eq!(idle.offset, 0.0);
    assert!(!idle.clamped);

    let mid = map_offset(700.0, &w, vh);
    assert!(approx(mid.offset, 290.0), "got {}", mid.offset);
    assert!(!mid.clamped);

    let past = map_offset(2000.0, &w, vh);
    assert!(approx(past.offset, 1040.0), "got {}", past.offset);
    assert!(past.clamped);
}

#[test]
fn mapping_is_non_decreasing_for_positive_speed() {
    for speed in [0.25, 1.0, 2.5] {
        let w = TriggerWindow::new(0.41, 1.625, speed).with_base_offset(-40.0);
        let mut prev = f64::NEG_INFINITY;
        let mut x = -200.0;
        while x < 3000.0 {
            let o = map_offset(x, &w, 900.0).offset;
            assert!(o >= prev, "offset fell at x={} speed={}", x, speed);
            prev = o;
            x += 7.0;
        }
    }
}

#[test]
fn mapping_is_bit_identical_on_repeat() {
    let w = TriggerWindow::new(1.189, 2.40, 1.3);
    for x in [0.0, 1234.5, 1500.25, 9999.0] {
        let a = map_offset(x, &w, 844.0);
        let b = map_offset(x, &w, 844.0);
        assert_eq!(a.offset.to_bits(), b.offset.to_bits());
        assert_eq!(a.clamped, b.clamped);
    }
}

#[test]
fn anything_past_stop_equals_the_stop_value() {
    let w = TriggerWindow::new(0.41, 1.45, 1.0);
    let r = w.resolve(1000.0);
    let at_stop = r.map(r.stop_px());
    for k in [0.001, 1.0, 250.0, 1e7] {
        let past = r.map(r.stop_px() + k);
        assert_eq!(past.offset, at_stop.offset);
        assert!(past.clamped);
    }
}

#[test]
fn phases_follow_position() {
    let r = TriggerWindow::new(0.5, 1.0, 1.0).resolve(1000.0);
    assert_eq!(r.phase(0.0), WindowPhase::Idle);
    assert_eq!(r.phase(499.0), WindowPhase::Idle);
    assert_eq!(r.phase(500.0), WindowPhase::Tracking);
    assert_eq!(r.phase(1000.0), WindowPhase::Tracking);
    assert_eq!(r.phase(1000.5), WindowPhase::Clamped);
    assert_eq!(r.phase(f64::NAN), WindowPhase::Idle);
    assert_eq!(r.progress(750.0), 0.5);
    assert_eq!(r.progress(5000.0), 1.0);
}

#[test]
fn base_offset_is_added_in_every_phase() {
    let w = TriggerWindow::new(0.0, 1.0, 1.0).with_base_offset(12.0);
    assert_eq!(map_offset(-5.0, &w, 100.0).offset, 12.0);
    assert_eq!(map_offset(50.0, &w, 100.0).offset, 62.0);
    assert_eq!(map_offset(500.0, &w, 100.0).offset, 112.0);
}

#[test]
fn degenerate_window_always_idles() {
    let w = TriggerWindow::new(1.0, 0.5, 1.0);
    assert!(w.is_degenerate());
    for x in [0.0, 600.0, 5000.0] {
        let s = map_offset(x, &w, 1000.0);
        assert_eq!(s.offset, 0.0);
        assert!(!s.clamped);
    }
    assert_eq!(w.max_travel(1000.0), 0.0);

    let equal = TriggerWindow::new(0.7, 0.7, 1.0);
    assert!(equal.is_degenerate());
}

#[test]
fn try_new_reports_bad_configuration() {
    assert_eq!(
        TriggerWindow::try_new(1.0, 0.5, 1.0),
        Err(ConfigError::EmptyWindow {
            start: 1.0,
            stop: 0.5
        })
    );
    assert!(matches!(
        TriggerWindow::try_new(f64::NAN, 0.5, 1.0),
        Err(ConfigError::NonFinite {
            field: "start_fraction",
            ..
        })
    ));
    assert!(TriggerWindow::try_new(0.41, 1.45, 1.0).is_ok());
}

#[test]
fn resize_moves_pixel_thresholds() {
    let w = TriggerWindow::new(0.41, 1.45, 1.0);
    assert!(approx(map_offset(700.0, &w, 1000.0).offset, 290.0));
    // Twice as tall: start is now 820px, so 700 is idle.
    assert_eq!(map_offset(700.0, &w, 2000.0).offset, 0.0);
    assert!(approx(w.max_travel(2000.0), 2080.0));
}

#[test]
fn inverted_window_stays_idle_far_past_its_stop() {
    let w = TriggerWindow::new(0.41, 0.2, 1.0).with_base_offset(5.0);
    assert!(w.is_degenerate());
    assert_eq!(w.start_fraction(), 0.41);
    assert_eq!(w.stop_fraction(), 0.2);
    assert_eq!(w.speed_multiplier(), 1.0);
    assert_eq!(w.base_offset(), 5.0);

    let state = map_offset(2000.0, &w, 1000.0);
    assert_eq!(state.offset, 5.0);
    assert!(!state.clamped);

    // The resolved copy carries the same verdict.
    let resolved = w.resolve(1000.0);
    assert!(resolved.window().is_degenerate());
    assert_eq!(resolved.phase(1e6), WindowPhase::Idle);
}
