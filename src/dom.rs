use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::geometry;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// `innerHeight`, or 0 when there is no window.
pub fn viewport_height() -> f64 {
    web::window()
        .and_then(|w| w.inner_height().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

pub fn page_height() -> f64 {
    let Some(doc) = window_document() else {
        return 0.0;
    };
    let body = doc.body().map(|b| b.scroll_height()).unwrap_or(0);
    let root = doc
        .document_element()
        .map(|e| e.scroll_height())
        .unwrap_or(0);
    body.max(root) as f64
}

/// Native scroll offset. Hidden scrollbars can leave `scrollY` at 0 while the
/// root element has scrolled, so take the largest reading.
pub fn native_scroll_y() -> Option<f64> {
    let w = web::window()?;
    let mut y = w.scroll_y().unwrap_or(0.0);
    if let Some(doc) = w.document() {
        if let Some(root) = doc.document_element() {
            y = y.max(root.scroll_top() as f64);
        }
        if let Some(body) = doc.body() {
            y = y.max(body.scroll_top() as f64);
        }
    }
    Some(y)
}

pub fn user_agent() -> String {
    web::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

pub fn has_touch() -> bool {
    web::window()
        .map(|w| js_sys::Reflect::has(&w, &"ontouchstart".into()).unwrap_or(false))
        .unwrap_or(false)
}

pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

pub fn local_hour() -> u32 {
    js_sys::Date::new_0().get_hours()
}

pub fn query_all(document: &web::Document, selector: &str) -> Vec<web::Element> {
    let mut out = Vec::new();
    if let Ok(list) = document.query_selector_all(selector) {
        for i in 0..list.length() {
            if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<web::Element>().ok()) {
                out.push(el);
            }
        }
    }
    out
}

pub fn set_translate_y(el: &web::Element, offset_px: f64) {
    if let Some(html) = el.dyn_ref::<web::HtmlElement>() {
        _ = html
            .style()
            .set_property("transform", &geometry::translate_y_css(offset_px));
    }
}

pub fn set_translate_x(el: &web::Element, offset_px: f64) {
    if let Some(html) = el.dyn_ref::<web::HtmlElement>() {
        _ = html
            .style()
            .set_property("transform", &geometry::translate_x_css(offset_px));
    }
}

/// Fraction of `el` inside the viewport grown by `margin` (top, bottom px).
pub fn measure_visible_fraction(el: &web::Element, margin: (f64, f64)) -> f64 {
    let rect = el.get_bounding_client_rect();
    geometry::visible_fraction(rect.top(), rect.height(), viewport_height(), margin)
}

/// An event listener that removes itself when dropped.
pub struct Listener {
    target: web::EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl Listener {
    pub fn new(
        target: &web::EventTarget,
        event: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> Option<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        // Nothing here calls preventDefault, so let the browser scroll freely.
        let options = web::AddEventListenerOptions::new();
        options.set_passive(true);
        match target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            closure.as_ref().unchecked_ref(),
            &options,
        ) {
            Ok(()) => Some(Self {
                target: target.clone(),
                event,
                closure,
            }),
            Err(e) => {
                log::warn!("[dom] could not listen for {}: {:?}", event, e);
                None
            }
        }
    }

    pub fn on_window(event: &'static str, handler: impl FnMut(web::Event) + 'static) -> Option<Self> {
        let w = web::window()?;
        Self::new(&w, event, handler)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}
