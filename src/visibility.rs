use std::cell::RefCell;
use std::rc::Rc;

use parallax_core::VisibilityEvent;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

use crate::dom;
use crate::geometry;

type EntryCallback = Closure<dyn FnMut(js_sys::Array, web::IntersectionObserver)>;

/// Key an observed element is reported under: the value of `attr`, else its
/// `id`.
fn element_key(el: &web::Element, attr: &str) -> String {
    el.get_attribute(attr)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| el.id())
}

/// Queues `VisibilityEvent`s for a set of elements sharing one root margin
/// and threshold. Events are drained by the frame loop.
///
/// Without `IntersectionObserver` every element is measured on each drain
/// instead.
pub struct VisibilityWatch {
    attr: &'static str,
    margin_px: (f64, f64),
    root_margin: &'static str,
    observer: Option<web::IntersectionObserver>,
    _callback: Option<EntryCallback>,
    fallback: Vec<web::Element>,
    queue: Rc<RefCell<Vec<VisibilityEvent>>>,
}

impl VisibilityWatch {
    /// `wake` runs after new events are queued.
    pub fn new(
        attr: &'static str,
        root_margin: &'static str,
        threshold: f64,
        wake: Rc<dyn Fn()>,
    ) -> Self {
        let margin_px = geometry::parse_root_margin(root_margin, dom::viewport_height());
        let queue: Rc<RefCell<Vec<VisibilityEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let q = queue.clone();
        let callback: EntryCallback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, _obs: web::IntersectionObserver| {
                let mut q = q.borrow_mut();
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<web::IntersectionObserverEntry>() else {
                        continue;
                    };
                    let key = element_key(&entry.target(), attr);
                    let mut ev = VisibilityEvent::new(key, entry.intersection_ratio());
                    ev.is_intersecting = entry.is_intersecting();
                    ev.root_margin_px = margin_px.0;
                    q.push(ev);
                }
                drop(q);
                wake();
            },
        )
            as Box<dyn FnMut(js_sys::Array, web::IntersectionObserver)>);

        let init = web::IntersectionObserverInit::new();
        init.set_root_margin(root_margin);
        init.set_threshold(&JsValue::from_f64(threshold));
        let observer =
            match web::IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
                Ok(o) => Some(o),
                Err(e) => {
                    log::warn!(
                        "[visibility] IntersectionObserver unavailable ({:?}), measuring rects instead",
                        e
                    );
                    None
                }
            };
        Self {
            attr,
            margin_px,
            root_margin,
            _callback: observer.is_some().then_some(callback),
            observer,
            fallback: Vec::new(),
            queue,
        }
    }

    pub fn observe(&mut self, el: &web::Element) {
        match &self.observer {
            Some(o) => o.observe(el),
            None => self.fallback.push(el.clone()),
        }
    }

    pub fn key_of(&self, el: &web::Element) -> String {
        element_key(el, self.attr)
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<VisibilityEvent> {
        if self.observer.is_none() {
            self.margin_px = geometry::parse_root_margin(self.root_margin, dom::viewport_height());
            for el in &self.fallback {
                let fraction = dom::measure_visible_fraction(el, self.margin_px);
                let mut ev = VisibilityEvent::new(element_key(el, self.attr), fraction);
                ev.root_margin_px = self.margin_px.0;
                self.queue.borrow_mut().push(ev);
            }
        }
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    pub fn disconnect(&mut self) {
        if let Some(o) = self.observer.take() {
            o.disconnect();
        }
        self.fallback.clear();
        self.queue.borrow_mut().clear();
    }
}

impl Drop for VisibilityWatch {
    fn drop(&mut self) {
        self.disconnect();
    }
}
