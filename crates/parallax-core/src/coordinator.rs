//! Per-frame orchestration: sample → smooth → map every window → publish.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::sampler::ScrollSample;
use crate::smoother::{Smoother, SmoothingMode};
use crate::window::{ElementAnimationState, ResolvedWindow, TriggerWindow};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Down,
    Up,
}

impl ScrollDirection {
    /// +1 when scrolling down the page, -1 when scrolling up.
    pub fn sign(self) -> f64 {
        match self {
            Self::Down => 1.0,
            Self::Up => -1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementFrame {
    pub id: ElementId,
    pub name: Rc<str>,
    pub state: ElementAnimationState,
}

/// Everything the renderer needs for one frame. Never mutated after publish.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub sample: ScrollSample,
    pub smoothed_position: f64,
    pub direction: ScrollDirection,
    pub elements: SmallVec<[ElementFrame; 4]>,
}

impl FrameSnapshot {
    pub fn element(&self, id: ElementId) -> Option<&ElementAnimationState> {
        self.elements.iter().find(|e| e.id == id).map(|e| &e.state)
    }

    pub fn by_name(&self, name: &str) -> Option<&ElementAnimationState> {
        self.elements
            .iter()
            .find(|e| &*e.name == name)
            .map(|e| &e.state)
    }
}

struct Element {
    id: ElementId,
    name: Rc<str>,
    resolved: ResolvedWindow,
}

type Subscriber = Box<dyn FnMut(&FrameSnapshot)>;

pub struct AnimationCoordinator {
    smoother: Smoother,
    elements: Vec<Element>,
    viewport_height: f64,
    running: bool,
    visible: bool,
    primed: bool,
    last_raw: Option<f64>,
    direction: ScrollDirection,
    frame: u64,
    next_element: u32,
    next_subscriber: u32,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    last_snapshot: Option<Rc<FrameSnapshot>>,
}

impl AnimationCoordinator {
    pub fn new(mode: SmoothingMode, viewport_height: f64) -> Self {
        Self {
            smoother: Smoother::new(mode),
            elements: Vec::new(),
            viewport_height,
            running: false,
            visible: true,
            primed: false,
            last_raw: None,
            direction: ScrollDirection::Down,
            frame: 0,
            next_element: 0,
            next_subscriber: 0,
            subscribers: Vec::new(),
            last_snapshot: None,
        }
    }

    pub fn add_element(&mut self, name: &str, window: TriggerWindow) -> ElementId {
        self.next_element += 1;
        let id = ElementId(self.next_element);
        self.elements.push(Element {
            id,
            name: Rc::from(name),
            resolved: window.resolve(self.viewport_height),
        });
        id
    }

    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        before != self.elements.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    /// Re-resolve every window's pixel thresholds. Smoothing and direction
    /// state are kept.
    pub fn set_viewport_height(&mut self, viewport_height: f64) {
        if viewport_height == self.viewport_height {
            return;
        }
        log::debug!(
            "[coordinator] viewport {} -> {}",
            self.viewport_height,
            viewport_height
        );
        self.viewport_height = viewport_height;
        for e in &mut self.elements {
            e.resolved = e.resolved.window().resolve(viewport_height);
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("[coordinator] start");
        }
        self.running = true;
    }

    /// Idempotent; calling without a prior `start` is fine.
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("[coordinator] stop after {} frames", self.frame);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Off-screen coordinators do no work but keep their smoothed state.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_active(&self) -> bool {
        self.running && self.visible
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn smoothed_position(&self) -> f64 {
        self.smoother.current()
    }

    /// Whether the host should keep requesting frames for `latest_raw`.
    pub fn wants_frame(&self, latest_raw: f64) -> bool {
        if !self.is_active() {
            return false;
        }
        !self.primed || !self.smoother.is_settled() || self.smoother.value().target != latest_raw
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&FrameSnapshot) + 'static) -> SubscriberId {
        self.next_subscriber += 1;
        let id = SubscriberId(self.next_subscriber);
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    pub fn snapshot(&self) -> Option<Rc<FrameSnapshot>> {
        self.last_snapshot.clone()
    }

    fn track_direction(&mut self, raw: f64) {
        if let Some(prev) = self.last_raw {
            if raw > prev {
                self.direction = ScrollDirection::Down;
            } else if raw < prev {
                self.direction = ScrollDirection::Up;
            }
        }
        self.last_raw = Some(raw);
    }

    /// Run one frame. Returns `None` while stopped or hidden.
    pub fn frame(&mut self, sample: ScrollSample) -> Option<Rc<FrameSnapshot>> {
        if !self.is_active() {
            return None;
        }
        if !self.primed {
            self.smoother.snap(sample.position);
            self.primed = true;
        }
        self.track_direction(sample.position);
        let smoothed = self.smoother.update(sample.position);

        // Every element reads the same smoothed value, in registration order.
        let elements = self
            .elements
            .iter()
            .map(|e| ElementFrame {
                id: e.id,
                name: e.name.clone(),
                state: e.resolved.map(smoothed),
            })
            .collect();

        self.frame += 1;
        let snapshot = Rc::new(FrameSnapshot {
            frame: self.frame,
            sample,
            smoothed_position: smoothed,
            direction: self.direction,
            elements,
        });
        for (_, s) in &mut self.subscribers {
            s(&snapshot);
        }
        self.last_snapshot = Some(snapshot.clone());
        Some(snapshot)
    }
}
