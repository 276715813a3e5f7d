use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use parallax_core::Wake;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

type Tick = Box<dyn FnMut(f64) -> Wake>;

struct LoopState {
    raf_id: Cell<Option<i32>>,
    timeout_id: Cell<Option<i32>>,
    disposed: Cell<bool>,
    tick: RefCell<Tick>,
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    timeout_closure: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl LoopState {
    fn request(&self) {
        if self.disposed.get() || self.raf_id.get().is_some() {
            return;
        }
        let closure = self.closure.borrow();
        let (Some(c), Some(w)) = (closure.as_ref(), web::window()) else {
            return;
        };
        match w.request_animation_frame(c.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(e) => log::warn!("[frame] requestAnimationFrame failed: {:?}", e),
        }
    }

    /// Request a frame once `delay_ms` has passed. Replaces an earlier delay.
    fn request_after(&self, delay_ms: f64) {
        self.clear_timeout();
        if self.disposed.get() {
            return;
        }
        let closure = self.timeout_closure.borrow();
        let (Some(c), Some(w)) = (closure.as_ref(), web::window()) else {
            return;
        };
        let delay = delay_ms.clamp(0.0, i32::MAX as f64).ceil() as i32;
        match w.set_timeout_with_callback_and_timeout_and_arguments_0(c.as_ref().unchecked_ref(), delay) {
            Ok(id) => self.timeout_id.set(Some(id)),
            Err(e) => {
                log::warn!("[frame] setTimeout failed: {:?}, polling every frame", e);
                drop(closure);
                self.request();
            }
        }
    }

    fn clear_timeout(&self) {
        if let Some(id) = self.timeout_id.take() {
            if let Some(w) = web::window() {
                w.clear_timeout_with_handle(id);
            }
        }
    }

    fn cancel(&self) {
        self.disposed.set(true);
        self.clear_timeout();
        if let Some(id) = self.raf_id.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(id);
            }
        }
    }
}

/// A `requestAnimationFrame` loop driven by what `tick` returns: another
/// frame, a delayed wake through `setTimeout`, or nothing until `wake`.
/// At most one frame and one delay are ever pending.
pub struct FrameLoop {
    state: Rc<LoopState>,
}

impl FrameLoop {
    pub fn new(tick: impl FnMut(f64) -> Wake + 'static) -> Self {
        let state = Rc::new(LoopState {
            raf_id: Cell::new(None),
            timeout_id: Cell::new(None),
            disposed: Cell::new(false),
            tick: RefCell::new(Box::new(tick)),
            closure: RefCell::new(None),
            timeout_closure: RefCell::new(None),
        });

        let weak = Rc::downgrade(&state);
        let closure = Closure::wrap(Box::new(move |ts: f64| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            state.raf_id.set(None);
            if state.disposed.get() {
                return;
            }
            state.clear_timeout();
            let next = match state.tick.try_borrow_mut() {
                Ok(mut tick) => tick(ts),
                Err(_) => Wake::Idle,
            };
            match next {
                Wake::NextFrame => state.request(),
                Wake::After(ms) => state.request_after(ms),
                Wake::Idle => {}
            }
        }) as Box<dyn FnMut(f64)>);
        *state.closure.borrow_mut() = Some(closure);

        let weak = Rc::downgrade(&state);
        let timeout = Closure::wrap(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.timeout_id.set(None);
                state.request();
            }
        }) as Box<dyn FnMut()>);
        *state.timeout_closure.borrow_mut() = Some(timeout);

        Self { state }
    }

    pub fn wake(&self) {
        self.state.request();
    }

    pub fn waker(&self) -> Waker {
        Waker(Rc::downgrade(&self.state))
    }

    pub fn is_scheduled(&self) -> bool {
        self.state.raf_id.get().is_some() || self.state.timeout_id.get().is_some()
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.state.cancel();
    }
}

/// Restarts a `FrameLoop` from event handlers without keeping it alive.
#[derive(Clone)]
pub struct Waker(Weak<LoopState>);

impl Waker {
    pub fn wake(&self) {
        if let Some(state) = self.0.upgrade() {
            state.request();
        }
    }
}
