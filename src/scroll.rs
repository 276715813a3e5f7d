use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use parallax_core::{DeviceClass, ListenerId, ScrollSource};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::dom::{self, Listener};

/// Window scroll events, plus touch events on touch devices where `scroll`
/// can lag behind the finger.
pub struct NativeScroll {
    events: &'static [&'static str],
    next_id: Cell<ListenerId>,
    listeners: RefCell<BTreeMap<ListenerId, Vec<Listener>>>,
}

impl NativeScroll {
    pub fn new(device: DeviceClass) -> Self {
        let events: &'static [&'static str] = match device {
            DeviceClass::Touch => &["scroll", "touchmove", "touchend"],
            DeviceClass::Pointer => &["scroll"],
        };
        Self {
            events,
            next_id: Cell::new(0),
            listeners: RefCell::new(BTreeMap::new()),
        }
    }
}

impl ScrollSource for NativeScroll {
    fn position(&self) -> Option<f64> {
        dom::native_scroll_y()
    }

    fn on(&self, handler: Box<dyn FnMut(f64)>) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handler = Rc::new(RefCell::new(handler));
        let guards = self
            .events
            .iter()
            .filter_map(|event| {
                let h = handler.clone();
                Listener::on_window(event, move |_| {
                    let Some(y) = dom::native_scroll_y() else {
                        return;
                    };
                    if let Ok(mut h) = h.try_borrow_mut() {
                        h(y);
                    }
                })
            })
            .collect();
        self.listeners.borrow_mut().insert(id, guards);
        id
    }

    fn off(&self, id: ListenerId) {
        // Dropping the guards removes the DOM listeners.
        self.listeners.borrow_mut().remove(&id);
    }
}

/// Adapter for a smooth-scroll engine object exposing `on(event, fn)`,
/// `off(event, fn)` and a numeric `scroll` property. Its `scroll` events carry
/// `{ scroll: number }`.
pub struct SmoothScrollEngine {
    engine: JsValue,
    next_id: Cell<ListenerId>,
    listeners: RefCell<BTreeMap<ListenerId, Closure<dyn FnMut(JsValue)>>>,
}

impl SmoothScrollEngine {
    /// `None` unless `engine` looks like a usable smooth-scroll instance.
    pub fn from_js(engine: JsValue) -> Option<Self> {
        if !engine.is_object() {
            return None;
        }
        let has_method = |name: &str| {
            js_sys::Reflect::get(&engine, &name.into())
                .map(|v| v.is_function())
                .unwrap_or(false)
        };
        if !(has_method("on") && has_method("off")) {
            log::warn!("[scroll] smooth-scroll object lacks on/off, using native scroll");
            return None;
        }
        Some(Self {
            engine,
            next_id: Cell::new(0),
            listeners: RefCell::new(BTreeMap::new()),
        })
    }

    fn call(&self, method: &str, callback: &Closure<dyn FnMut(JsValue)>) -> Result<(), JsValue> {
        let f: js_sys::Function = js_sys::Reflect::get(&self.engine, &method.into())?.dyn_into()?;
        f.call2(&self.engine, &"scroll".into(), callback.as_ref())?;
        Ok(())
    }
}

fn scroll_field(v: &JsValue) -> Option<f64> {
    js_sys::Reflect::get(v, &"scroll".into())
        .ok()
        .and_then(|s| s.as_f64())
}

impl ScrollSource for SmoothScrollEngine {
    fn position(&self) -> Option<f64> {
        scroll_field(&self.engine)
    }

    fn on(&self, mut handler: Box<dyn FnMut(f64)>) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let closure = Closure::wrap(Box::new(move |ev: JsValue| {
            if let Some(y) = scroll_field(&ev) {
                handler(y);
            }
        }) as Box<dyn FnMut(JsValue)>);
        if let Err(e) = self.call("on", &closure) {
            log::warn!("[scroll] smooth-scroll on() failed: {:?}", e);
        }
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn off(&self, id: ListenerId) {
        let removed = self.listeners.borrow_mut().remove(&id);
        if let Some(closure) = removed {
            if let Err(e) = self.call("off", &closure) {
                log::warn!("[scroll] smooth-scroll off() failed: {:?}", e);
            }
        }
    }
}

impl Drop for SmoothScrollEngine {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.listeners.borrow().keys().copied().collect();
        for id in ids {
            self.off(id);
        }
    }
}
