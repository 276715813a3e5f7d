// Host-side tests for scroll sampling and smoothing.

use parallax_core::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn fixed_clock(ms: f64) -> Clock {
    Rc::new(move || ms)
}

#[test]
fn prefers_the_smooth_source() {
    let native = Rc::new(ManualSource::new(100.0));
    let smooth = Rc::new(ManualSource::new(420.0));
    let sampler = ScrollSampler::new(fixed_clock(5.0))
        .with_native_source(native.clone())
        .with_smooth_source(smooth.clone());
    assert_eq!(sampler.source_kind(), SourceKind::Smooth);
    assert_eq!(
        sampler.sample(),
        ScrollSample {
            position: 420.0,
            timestamp_ms: 5.0
        }
    );
}

#[test]
fn falls_back_to_native_then_zero() {
    let native = Rc::new(ManualSource::new(250.0));
    let sampler = ScrollSampler::new(fixed_clock(0.0)).with_native_source(native.clone());
    assert_eq!(sampler.source_kind(), SourceKind::Native);
    assert_eq!(sampler.sample().position, 250.0);

    native.make_unreadable();
    assert_eq!(sampler.sample().position, 0.0);

    let bare = ScrollSampler::new(fixed_clock(0.0));
    assert_eq!(bare.source_kind(), SourceKind::Unavailable);
    assert_eq!(bare.sample().position, 0.0);
}

#[test]
fn negative_and_nan_positions_read_as_zero() {
    let src = Rc::new(ManualSource::new(-30.0));
    let sampler = ScrollSampler::new(fixed_clock(0.0)).with_native_source(src.clone());
    assert_eq!(sampler.sample().position, 0.0);
    src.scroll_to(f64::NAN);
    assert_eq!(sampler.sample().position, 0.0);
}

#[test]
fn subscription_delivers_and_tears_down() {
    let src = Rc::new(ManualSource::new(0.0));
    let sampler = ScrollSampler::new(fixed_clock(9.0)).with_native_source(src.clone());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let mut sub = sampler.on_sample(move |sample| s.borrow_mut().push(sample));
    assert!(sub.is_active());
    assert_eq!(src.listener_count(), 1);

    src.scroll_to(10.0);
    src.scroll_to(35.5);
    assert_eq!(
        *seen.borrow(),
        vec![
            ScrollSample {
                position: 10.0,
                timestamp_ms: 9.0
            },
            ScrollSample {
                position: 35.5,
                timestamp_ms: 9.0
            },
        ]
    );

    sub.unsubscribe();
    sub.unsubscribe();
    assert!(!sub.is_active());
    assert_eq!(src.listener_count(), 0);
    src.scroll_to(80.0);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn dropping_a_subscription_removes_its_listener() {
    let src = Rc::new(ManualSource::new(0.0));
    let sampler = ScrollSampler::new(fixed_clock(0.0)).with_native_source(src.clone());
    {
        let _a = sampler.on_sample(|_| {});
        let _b = sampler.on_sample(|_| {});
        assert_eq!(src.listener_count(), 2);
    }
    assert_eq!(src.listener_count(), 0);
}

#[test]
fn a_handler_may_drop_subscriptions_while_notified() {
    let src = Rc::new(ManualSource::new(0.0));
    let sampler = ScrollSampler::new(fixed_clock(0.0)).with_native_source(src.clone());
    let subs: Rc<RefCell<Vec<Subscription>>> = Rc::default();
    let first_hits = Rc::new(Cell::new(0));
    let second_hits = Rc::new(Cell::new(0));

    let (h, slot) = (first_hits.clone(), subs.clone());
    let first = sampler.on_sample(move |_| {
        h.set(h.get() + 1);
        // Drops this listener and the one registered after it.
        slot.borrow_mut().clear();
    });
    let h = second_hits.clone();
    let second = sampler.on_sample(move |_| h.set(h.get() + 1));
    subs.borrow_mut().extend([first, second]);
    assert_eq!(src.listener_count(), 2);

    src.scroll_to(40.0);
    assert_eq!(first_hits.get(), 1);
    assert_eq!(second_hits.get(), 0);
    assert_eq!(src.listener_count(), 0);

    src.scroll_to(80.0);
    assert_eq!(first_hits.get(), 1);
}

#[test]
fn subscribing_without_a_source_is_inert() {
    let sampler = ScrollSampler::new(fixed_clock(0.0));
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let sub = sampler.on_sample(move |_| h.set(h.get() + 1));
    assert!(!sub.is_active());
    assert_eq!(hits.get(), 0);
}

#[test]
fn smoother_converges_without_overshoot() {
    let mut s = Smoother::new(SmoothingMode::Lerp(0.1));
    let mut steps = 0;
    while !s.is_settled() || steps == 0 {
        let v = s.update(100.0);
        assert!(v <= 100.0, "overshot to {}", v);
        steps += 1;
        assert!(steps <= 60, "not settled after 60 steps");
    }
    assert!((100.0 - s.current()).abs() < 0.5);
}

#[test]
fn smoother_approaches_from_above_too() {
    let mut s = Smoother::new(SmoothingMode::Lerp(0.1));
    s.snap(500.0);
    for _ in 0..200 {
        let v = s.update(100.0);
        assert!(v >= 100.0);
    }
    assert!(s.is_settled());
}

#[test]
fn pass_through_tracks_exactly() {
    let mut s = Smoother::pass_through();
    assert_eq!(s.update(123.25), 123.25);
    assert_eq!(s.update(7.0), 7.0);
    assert!(s.is_settled());
}

#[test]
fn device_class_picks_smoothing() {
    let phone = DeviceClass::detect("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile/15E148", false);
    assert_eq!(phone, DeviceClass::Touch);
    assert_eq!(phone.smoothing_mode(), SmoothingMode::Lerp(0.1));

    let desktop = DeviceClass::detect("Mozilla/5.0 (X11; Linux x86_64) Firefox/129.0", false);
    assert_eq!(desktop, DeviceClass::Pointer);
    assert_eq!(desktop.smoothing_mode(), SmoothingMode::PassThrough);

    assert_eq!(DeviceClass::detect("", true), DeviceClass::Touch);
}

#[test]
fn try_new_rejects_out_of_range_factor() {
    assert_eq!(
        Smoother::try_new(SmoothingMode::Lerp(0.0)).err(),
        Some(ConfigError::SmoothingFactor(0.0))
    );
    assert!(Smoother::try_new(SmoothingMode::Lerp(1.5)).is_err());
    assert!(Smoother::try_new(SmoothingMode::Lerp(0.2)).is_ok());
    // The lenient constructor clamps instead.
    assert_eq!(Smoother::new(SmoothingMode::Lerp(3.0)).factor(), 1.0);
}

#[test]
fn metrics_round_and_clamp() {
    let m = ScrollMetrics::compute(1000.0, 800.0, 4000.0);
    assert_eq!(m.scroll_vh, 125.0);
    assert_eq!(m.scroll_percentage, 31.3);

    let end = ScrollMetrics::compute(5000.0, 800.0, 4000.0);
    assert_eq!(end.scroll_percentage, 100.0);

    let short = ScrollMetrics::compute(10.0, 800.0, 600.0);
    assert_eq!(short.scroll_percentage, 0.0);

    assert_eq!(ScrollMetrics::compute(10.0, 0.0, 600.0), ScrollMetrics::default());
}
