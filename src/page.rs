use std::cell::{Cell, OnceCell, RefCell};
use std::rc::{Rc, Weak};

use anyhow::anyhow;
use instant::Instant;
use parallax_core::constants::{DEBOUNCE_RELEASE_MS, SCRAMBLE_DURATION_MS};
use parallax_core::{
    earliest, fire_all, format_count, AnimationCoordinator, Completion, CounterEngine, CounterParams,
    DebouncedTrigger, DeviceClass, ElementId, FrameStats, MarqueeLoop, ReadyTrigger,
    ScrollMetrics, ScrollSampler, ScrollSource, Subscription, TextScramble, TriggerCallback,
    TriggerWindow, ViewTriggerRegistry, VisibilityEvent, Wake,
};
use smallvec::SmallVec;
use wasm_bindgen::JsValue;
use web_sys as web;

use crate::constants::*;
use crate::dom::{self, Listener};
use crate::frame::{FrameLoop, Waker};
use crate::scroll::{NativeScroll, SmoothScrollEngine};
use crate::storage::PageStore;
use crate::visibility::VisibilityWatch;

#[derive(Default)]
pub struct PageConfig {
    /// Smooth-scroll engine instance, if the page runs one.
    pub smooth_scroll: Option<JsValue>,
    /// Hold reveals and parallax until `loading_complete` is called.
    pub wait_for_loader: bool,
}

struct MarqueeTrack {
    key: String,
    element: web::Element,
    anim: MarqueeLoop,
    hovered: Rc<Cell<bool>>,
    _hover: Vec<Listener>,
}

struct ScrambleTarget {
    element: web::Element,
    effect: TextScramble,
    debounce: DebouncedTrigger,
    /// Set by a reveal callback.
    requested: Rc<Cell<bool>>,
    entered: Rc<Cell<bool>>,
    left: Rc<Cell<bool>>,
    _hover: Vec<Listener>,
}

struct CounterView {
    key: String,
    element: web::Element,
    engine: CounterEngine<PageStore>,
}

/// Reveals sharing one start signal, staggered by `SEQUENCE_STEP_MS`.
struct RevealGroup {
    name: String,
    ids: Vec<String>,
    started: bool,
}

/// Everything bound to one mounted page.
struct Page {
    sampler: ScrollSampler,
    scroll_sub: Subscription,
    coordinator: AnimationCoordinator,
    registry: ViewTriggerRegistry,
    groups: Vec<RevealGroup>,
    held_reveals: Vec<VisibilityEvent>,
    reveal_watch: VisibilityWatch,
    section_watch: Option<VisibilityWatch>,
    counter: Option<CounterView>,
    counter_watch: Option<VisibilityWatch>,
    marquees: Vec<MarqueeTrack>,
    marquee_watch: Option<VisibilityWatch>,
    scrambles: Vec<ScrambleTarget>,
    loading: Completion,
    loaded: Rc<Cell<bool>>,
    stats: FrameStats,
    last_instant: Option<Instant>,
    resize: Option<Listener>,
    disposed: bool,
}

/// A mounted page plus the frame loop that drives it.
pub struct PageHandle {
    page: Rc<RefCell<Page>>,
    frame: FrameLoop,
}

impl PageHandle {
    pub fn mount(config: PageConfig) -> anyhow::Result<Self> {
        let slot: Rc<OnceCell<Weak<RefCell<Page>>>> = Rc::default();
        let frame = {
            let slot = slot.clone();
            FrameLoop::new(move |ts| {
                let Some(page) = slot.get().and_then(Weak::upgrade) else {
                    return Wake::Idle;
                };
                Page::tick(&page, ts)
            })
        };
        let page = Rc::new(RefCell::new(Page::build(config, frame.waker())?));
        _ = slot.set(Rc::downgrade(&page));
        Page::listen_for_resize(&page, frame.waker());
        frame.wake();
        Ok(Self { page, frame })
    }

    pub fn loading_complete(&self) {
        if let Ok(mut p) = self.page.try_borrow_mut() {
            p.loading.complete();
        }
        self.frame.wake();
    }

    pub fn scroll_metrics(&self) -> ScrollMetrics {
        let position = self
            .page
            .try_borrow()
            .map(|p| p.sampler.sample().position)
            .unwrap_or(0.0);
        ScrollMetrics::compute(position, dom::viewport_height(), dom::page_height())
    }

    pub fn dispose(&self) {
        self.frame.cancel();
        if let Ok(mut p) = self.page.try_borrow_mut() {
            p.dispose();
        }
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Page {
    fn build(config: PageConfig, waker: Waker) -> anyhow::Result<Self> {
        let document = dom::window_document().ok_or_else(|| anyhow!("no document"))?;
        let now = dom::now_ms();

        // Decided once; switching mid-session is not supported.
        let device = DeviceClass::detect(&dom::user_agent(), dom::has_touch());
        log::info!("[page] device={:?}", device);

        let mut sampler = ScrollSampler::new(Rc::new(dom::now_ms))
            .with_native_source(Rc::new(NativeScroll::new(device)) as Rc<dyn ScrollSource>);
        if let Some(engine) = config.smooth_scroll.and_then(SmoothScrollEngine::from_js) {
            sampler = sampler.with_smooth_source(Rc::new(engine) as Rc<dyn ScrollSource>);
        }
        let scroll_sub = {
            let waker = waker.clone();
            sampler.on_sample(move |_| waker.wake())
        };
        let wake: Rc<dyn Fn()> = {
            let waker = waker.clone();
            Rc::new(move || waker.wake())
        };

        let mut coordinator =
            AnimationCoordinator::new(device.smoothing_mode(), dom::viewport_height());
        bind_layers(&document, device, &mut coordinator);

        let section_watch = dom::query_all(&document, &format!("[{}]", ATTR_PARALLAX_ROOT))
            .first()
            .map(|root| {
                let mut w = VisibilityWatch::new(ATTR_PARALLAX_ROOT, SECTION_ROOT_MARGIN, 0.0, wake.clone());
                w.observe(root);
                w
            });

        let scrambles = bind_scrambles(&document, now, &waker);
        let mut registry = ViewTriggerRegistry::new();
        let mut reveal_watch = VisibilityWatch::new(ATTR_REVEAL, REVEAL_ROOT_MARGIN, REVEAL_THRESHOLD, wake.clone());
        let groups = bind_reveals(&document, &mut registry, &mut reveal_watch, &scrambles);

        let (counter, counter_watch) = match document.get_element_by_id(COUNTER_ELEMENT_ID) {
            Some(element) => {
                let params = CounterParams {
                    key_prefix: COUNTER_KEY_PREFIX.to_string(),
                    ..CounterParams::default()
                };
                let engine = CounterEngine::from_entropy(params, PageStore::open(), now);
                element.set_text_content(Some(&format_count(engine.state().display_value)));
                let mut w = VisibilityWatch::new("id", COUNTER_ROOT_MARGIN, 0.0, wake.clone());
                w.observe(&element);
                let key = w.key_of(&element);
                (Some(CounterView { key, element, engine }), Some(w))
            }
            None => (None, None),
        };

        let mut marquee_watch: Option<VisibilityWatch> = None;
        let mut marquees = Vec::new();
        for (lane, element) in dom::query_all(&document, &format!("[{}]", ATTR_MARQUEE))
            .into_iter()
            .enumerate()
        {
            let w = marquee_watch.get_or_insert_with(|| {
                VisibilityWatch::new(ATTR_MARQUEE, MARQUEE_ROOT_MARGIN, 0.0, wake.clone())
            });
            // Visibility events are matched back by key, so every track needs one.
            if w.key_of(&element).is_empty() {
                _ = element.set_attribute(ATTR_MARQUEE, &format!("marquee-{}", lane));
            }
            w.observe(&element);
            let hovered = Rc::new(Cell::new(false));
            let hover = hover_listeners(&element, hovered.clone(), None, &waker);
            marquees.push(MarqueeTrack {
                key: w.key_of(&element),
                anim: MarqueeLoop::new(loop_width(&element), lane),
                element,
                hovered,
                _hover: hover,
            });
        }

        let loaded = Rc::new(Cell::new(false));
        let mut loading = Completion::new();
        {
            let loaded = loaded.clone();
            loading.on_complete(move || loaded.set(true));
        }
        if !config.wait_for_loader {
            loading.complete();
        }

        log::info!(
            "[page] mounted: {} layers, {} reveals, {} marquees, counter={}",
            coordinator.element_count(),
            registry.len(),
            marquees.len(),
            counter.is_some()
        );

        Ok(Self {
            sampler,
            scroll_sub,
            coordinator,
            registry,
            groups,
            held_reveals: Vec::new(),
            reveal_watch,
            section_watch,
            counter,
            counter_watch,
            marquees,
            marquee_watch,
            scrambles,
            loading,
            loaded,
            stats: FrameStats::new(),
            last_instant: None,
            resize: None,
            disposed: false,
        })
    }

    fn listen_for_resize(page: &Rc<RefCell<Page>>, waker: Waker) {
        let weak = Rc::downgrade(page);
        let listener = Listener::on_window("resize", move |_| {
            let Some(page) = weak.upgrade() else {
                return;
            };
            if let Ok(mut p) = page.try_borrow_mut() {
                p.resized();
            }
            waker.wake();
        });
        if let Ok(mut p) = page.try_borrow_mut() {
            p.resize = listener;
        }
    }

    fn resized(&mut self) {
        self.coordinator.set_viewport_height(dom::viewport_height());
        for m in &mut self.marquees {
            m.anim.set_loop_width(loop_width(&m.element));
        }
    }

    /// One animation frame. Returns when the loop should run next.
    fn tick(page: &Rc<RefCell<Page>>, _ts: f64) -> Wake {
        let (next, ready) = match page.try_borrow_mut() {
            Ok(mut p) => p.frame(),
            Err(_) => return Wake::NextFrame,
        };
        // Reveal callbacks run with the page released.
        fire_all(ready);
        next
    }

    fn frame(&mut self) -> (Wake, Vec<ReadyTrigger>) {
        if self.disposed {
            return (Wake::Idle, Vec::new());
        }
        let now = dom::now_ms();
        let instant = Instant::now();
        let dt_sec = self
            .last_instant
            .map(|t| (instant - t).as_secs_f64())
            .unwrap_or(0.0);
        self.last_instant = Some(instant);
        if let Some(fps) = self.stats.record(now) {
            log::trace!("[page] fps {:.0} (avg {:.0})", fps.current, fps.average);
        }

        if self.loaded.get() && !self.coordinator.is_running() {
            self.coordinator.start();
        }
        if let Some(w) = self.section_watch.as_mut() {
            if let Some(last) = w.drain().last() {
                self.coordinator.set_visible(last.is_intersecting);
            }
        }
        let sample = self.sampler.sample();
        self.coordinator.frame(sample);

        let ready = self.reveals(now);
        let scrambling = self.step_scrambles(now);
        let marquee_moving = self.step_marquees(dt_sec);
        let counter_ramping = self.step_counter(now);

        let animating = self.coordinator.wants_frame(sample.position)
            || scrambling
            || marquee_moving
            || counter_ramping;
        let next_due = earliest(
            self.registry.next_due_ms(),
            self.counter.as_ref().and_then(|c| c.engine.next_due_ms()),
        );
        let next = Wake::plan(animating, now, next_due, TIMER_SLACK_MS);
        if next != Wake::NextFrame {
            self.last_instant = None;
        }
        (next, ready)
    }

    fn reveals(&mut self, now: f64) -> Vec<ReadyTrigger> {
        let mut events = std::mem::take(&mut self.held_reveals);
        events.extend(self.reveal_watch.drain());
        if !self.loaded.get() {
            self.held_reveals = events;
            return Vec::new();
        }

        let mut ready = Vec::new();
        let mut singles = Vec::with_capacity(events.len());
        for ev in events {
            let group = self
                .groups
                .iter_mut()
                .find(|g| g.ids.iter().any(|id| *id == ev.element_id));
            match group {
                Some(g) => {
                    let crossed = ev.is_intersecting && ev.visible_fraction >= REVEAL_THRESHOLD;
                    if crossed && !g.started {
                        g.started = true;
                        log::debug!("[page] sequence '{}' started", g.name);
                        ready.extend(self.registry.start_collect(&g.ids, now));
                    }
                }
                None => singles.push(ev),
            }
        }
        ready.extend(self.registry.observe_collect(singles, now));
        ready.extend(self.registry.poll_collect(now));
        ready
    }

    fn step_scrambles(&mut self, now: f64) -> bool {
        let mut any = false;
        for s in &mut self.scrambles {
            if s.requested.take() {
                s.effect.start(now);
            }
            if s.entered.take() && s.debounce.try_trigger(now) {
                s.effect.start(now);
            }
            if s.left.take() {
                s.debounce.release(now);
            }
            if let Some(text) = s.effect.frame(now) {
                s.element.set_text_content(Some(text));
            }
            any |= s.effect.is_animating();
        }
        any
    }

    fn step_marquees(&mut self, dt_sec: f64) -> bool {
        if let Some(w) = self.marquee_watch.as_mut() {
            for ev in w.drain() {
                if let Some(m) = self.marquees.iter_mut().find(|m| m.key == ev.element_id) {
                    m.anim.set_visible(ev.is_intersecting);
                }
            }
        }
        let direction = self.coordinator.direction();
        let mut any = false;
        for m in &mut self.marquees {
            m.anim.set_direction(direction);
            m.anim.set_hovered(m.hovered.get());
            if m.anim.is_playing() {
                dom::set_translate_x(&m.element, -m.anim.step(dt_sec));
                any = true;
            }
        }
        any
    }

    fn step_counter(&mut self, now: f64) -> bool {
        let (Some(c), Some(w)) = (self.counter.as_mut(), self.counter_watch.as_mut()) else {
            return false;
        };
        for ev in w.drain() {
            if ev.element_id == c.key {
                c.engine.set_visible(ev.is_intersecting, now);
            }
        }
        if let Some(state) = c.engine.poll(now, dom::local_hour()) {
            c.element
                .set_text_content(Some(&format_count(state.display_value)));
        }
        c.engine.is_ramping()
    }

    /// Tear everything down. Safe to call repeatedly.
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.scroll_sub.unsubscribe();
        self.coordinator.stop();
        self.registry.dispose();
        if let Some(c) = self.counter.as_mut() {
            c.engine.dispose();
        }
        self.reveal_watch.disconnect();
        for w in [
            self.section_watch.as_mut(),
            self.counter_watch.as_mut(),
            self.marquee_watch.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            w.disconnect();
        }
        self.resize = None;
        self.marquees.clear();
        self.scrambles.clear();
        self.held_reveals.clear();
        log::info!("[page] disposed");
    }
}

fn bind_layers(document: &web::Document, device: DeviceClass, coordinator: &mut AnimationCoordinator) {
    let layout = match device {
        DeviceClass::Touch => TOUCH_LAYERS,
        DeviceClass::Pointer => POINTER_LAYERS,
    };
    let mut bound: SmallVec<[(ElementId, web::Element); 4]> = SmallVec::new();
    for el in dom::query_all(document, &format!("[{}]", ATTR_PARALLAX)) {
        let name = el.get_attribute(ATTR_PARALLAX).unwrap_or_default();
        let Some(layer) = layout.iter().find(|l| l.name == name) else {
            log::warn!("[page] no layer layout named '{}'", name);
            continue;
        };
        let id = coordinator.add_element(layer.name, TriggerWindow::new(layer.start, layer.stop, layer.speed));
        bound.push((id, el));
    }
    if bound.is_empty() {
        return;
    }
    coordinator.subscribe(move |snapshot| {
        for (id, el) in &bound {
            if let Some(state) = snapshot.element(*id) {
                dom::set_translate_y(el, state.offset);
            }
        }
    });
}

fn bind_scrambles(document: &web::Document, now: f64, waker: &Waker) -> Vec<ScrambleTarget> {
    dom::query_all(document, &format!("[{}]", ATTR_SCRAMBLE))
        .into_iter()
        .enumerate()
        .map(|(i, element)| {
            let text = element.text_content().unwrap_or_default();
            let seed = (now as u64).wrapping_add(i as u64);
            let entered = Rc::new(Cell::new(false));
            let left = Rc::new(Cell::new(false));
            let hover = hover_listeners(&element, entered.clone(), Some(left.clone()), waker);
            ScrambleTarget {
                effect: TextScramble::new(&text, seed)
                    .with_disabled(element.has_attribute(ATTR_SCRAMBLE_DISABLED)),
                debounce: DebouncedTrigger::new(SCRAMBLE_DURATION_MS).with_release_ms(DEBOUNCE_RELEASE_MS),
                requested: Rc::new(Cell::new(false)),
                entered,
                left,
                _hover: hover,
                element,
            }
        })
        .collect()
}

/// Register reveal triggers and return the staged groups.
fn bind_reveals(
    document: &web::Document,
    registry: &mut ViewTriggerRegistry,
    watch: &mut VisibilityWatch,
    scrambles: &[ScrambleTarget],
) -> Vec<RevealGroup> {
    let mut staged: Vec<(String, Vec<(String, web::Element)>)> = Vec::new();
    for el in dom::query_all(document, &format!("[{}]", ATTR_REVEAL)) {
        let id = watch.key_of(&el);
        if id.is_empty() {
            log::warn!("[page] reveal element without an id skipped");
            continue;
        }
        watch.observe(&el);
        match el.get_attribute(ATTR_REVEAL_SEQUENCE) {
            Some(name) => match staged.iter_mut().find(|(n, _)| *n == name) {
                Some((_, members)) => members.push((id, el)),
                None => staged.push((name, vec![(id, el)])),
            },
            None => {
                let delay = el
                    .get_attribute(ATTR_REVEAL_DELAY)
                    .and_then(|d| d.trim().parse::<f64>().ok())
                    .unwrap_or(0.0);
                registry.register_delayed(id, REVEAL_THRESHOLD, delay, reveal_callback(&el, scrambles));
            }
        }
    }

    staged
        .into_iter()
        .map(|(name, members)| {
            let ids: Vec<String> = members.iter().map(|(id, _)| id.clone()).collect();
            registry.register_sequence(&ids, REVEAL_THRESHOLD, 0.0, SEQUENCE_STEP_MS, |i| {
                Box::new(reveal_callback(&members[i].1, scrambles)) as TriggerCallback
            });
            RevealGroup {
                name,
                ids,
                started: false,
            }
        })
        .collect()
}

fn reveal_callback(el: &web::Element, scrambles: &[ScrambleTarget]) -> impl FnOnce() + 'static {
    let el = el.clone();
    let scramble = scrambles
        .iter()
        .find(|s| s.element == el)
        .map(|s| s.requested.clone());
    move || {
        _ = el.set_attribute(ATTR_REVEALED, "true");
        if let Some(flag) = scramble {
            flag.set(true);
        }
    }
}

fn hover_listeners(
    el: &web::Element,
    entered: Rc<Cell<bool>>,
    left: Option<Rc<Cell<bool>>>,
    waker: &Waker,
) -> Vec<Listener> {
    let mut out = Vec::with_capacity(2);
    let enter_flag = entered.clone();
    let w = waker.clone();
    out.extend(Listener::new(el, "mouseenter", move |_| {
        enter_flag.set(true);
        w.wake();
    }));
    let w = waker.clone();
    out.extend(Listener::new(el, "mouseleave", move |_| {
        match &left {
            Some(l) => l.set(true),
            None => entered.set(false),
        }
        w.wake();
    }));
    out
}

/// Marquee content is duplicated once, so one loop is half the track.
fn loop_width(el: &web::Element) -> f64 {
    el.scroll_width() as f64 / 2.0
}
