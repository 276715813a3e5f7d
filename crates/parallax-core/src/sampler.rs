//! Scroll position sampling.
//!
//! The sampler hides where the scroll position comes from. A smooth-scroll
//! engine is preferred when one was injected, otherwise the native source is
//! used. Both report absolute pixels scrolled from the top of the page.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Monotonic-ish millisecond clock supplied by the host.
pub type Clock = Rc<dyn Fn() -> f64>;

pub type ListenerId = u64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSample {
    pub position: f64,
    pub timestamp_ms: f64,
}

/// Anything that can report and broadcast a scroll position.
///
/// Implementations are single-threaded and use interior mutability, so the
/// same source can be shared by several samplers.
pub trait ScrollSource {
    /// Current position in pixels, or `None` when it cannot be read.
    fn position(&self) -> Option<f64>;
    fn on(&self, handler: Box<dyn FnMut(f64)>) -> ListenerId;
    fn off(&self, id: ListenerId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Smooth,
    Native,
    Unavailable,
}

pub struct ScrollSampler {
    clock: Clock,
    smooth: Option<Rc<dyn ScrollSource>>,
    native: Option<Rc<dyn ScrollSource>>,
}

impl ScrollSampler {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            smooth: None,
            native: None,
        }
    }

    pub fn with_smooth_source(mut self, source: Rc<dyn ScrollSource>) -> Self {
        self.smooth = Some(source);
        self
    }

    pub fn with_native_source(mut self, source: Rc<dyn ScrollSource>) -> Self {
        self.native = Some(source);
        self
    }

    pub fn source_kind(&self) -> SourceKind {
        if self.smooth.is_some() {
            SourceKind::Smooth
        } else if self.native.is_some() {
            SourceKind::Native
        } else {
            SourceKind::Unavailable
        }
    }

    fn active(&self) -> Option<&Rc<dyn ScrollSource>> {
        self.smooth.as_ref().or(self.native.as_ref())
    }

    /// Read the current position. Never fails; an unreadable source yields 0.
    pub fn sample(&self) -> ScrollSample {
        let position = self
            .active()
            .and_then(|s| s.position())
            .map(sanitize_position)
            .unwrap_or(0.0);
        ScrollSample {
            position,
            timestamp_ms: (self.clock)(),
        }
    }

    /// Attach `handler` to the source selected right now.
    ///
    /// The choice is not revisited if another source shows up later.
    pub fn on_sample(&self, mut handler: impl FnMut(ScrollSample) + 'static) -> Subscription {
        let Some(source) = self.active().cloned() else {
            log::warn!("[sampler] no scroll source available, subscription is inert");
            return Subscription::inert();
        };
        let clock = self.clock.clone();
        let id = source.on(Box::new(move |raw| {
            handler(ScrollSample {
                position: sanitize_position(raw),
                timestamp_ms: clock(),
            })
        }));
        log::debug!("[sampler] subscribed to {:?} source", self.source_kind());
        Subscription {
            inner: Some((source, id)),
        }
    }
}

/// Owns one listener on a scroll source. Dropping it removes the listener.
pub struct Subscription {
    inner: Option<(Rc<dyn ScrollSource>, ListenerId)>,
}

impl Subscription {
    pub fn inert() -> Self {
        Self { inner: None }
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some((source, id)) = self.inner.take() {
            source.off(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[inline]
fn sanitize_position(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.max(0.0)
    } else {
        0.0
    }
}

/// A scroll source driven by hand. Used on hosts without a real page and in
/// tests.
#[derive(Default)]
pub struct ManualSource {
    position: Cell<Option<f64>>,
    next_id: Cell<ListenerId>,
    listeners: RefCell<BTreeMap<ListenerId, Rc<RefCell<Box<dyn FnMut(f64)>>>>>,
}

impl ManualSource {
    pub fn new(position: f64) -> Self {
        let s = Self::default();
        s.position.set(Some(position));
        s
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Move to `position` and notify every listener in subscription order.
    ///
    /// Handlers may subscribe or unsubscribe while being notified. A listener
    /// removed mid-notification is not called afterwards.
    pub fn scroll_to(&self, position: f64) {
        self.position.set(Some(position));
        let snapshot: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect();
        for (id, handler) in snapshot {
            if !self.listeners.borrow().contains_key(&id) {
                continue;
            }
            if let Ok(mut h) = handler.try_borrow_mut() {
                h(position);
            }
        }
    }

    pub fn make_unreadable(&self) {
        self.position.set(None);
    }
}

impl ScrollSource for ManualSource {
    fn position(&self) -> Option<f64> {
        self.position.get()
    }

    fn on(&self, handler: Box<dyn FnMut(f64)>) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.listeners
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(handler)));
        id
    }

    fn off(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }
}

/// Page-level scroll readouts used by debug overlays and progress bars.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Scroll distance in viewport-height units (100 = one screen).
    pub scroll_vh: f64,
    /// Percentage of the scrollable distance covered, in `[0, 100]`.
    pub scroll_percentage: f64,
}

impl ScrollMetrics {
    pub fn compute(position: f64, viewport_height: f64, page_height: f64) -> Self {
        if viewport_height <= 0.0 || !viewport_height.is_finite() {
            return Self::default();
        }
        let position = sanitize_position(position);
        let scroll_vh = round_tenth(position / viewport_height * 100.0);
        let max_scroll = page_height - viewport_height;
        let scroll_percentage = if max_scroll > 0.0 {
            round_tenth(position / max_scroll * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            scroll_vh,
            scroll_percentage,
        }
    }
}

#[inline]
fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
