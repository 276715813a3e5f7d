#![cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod constants;
mod dom;
mod frame;
mod geometry;
mod page;
mod scroll;
mod storage;
mod visibility;

use page::{PageConfig, PageHandle};

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("parallax-web starting");
    Ok(())
}

/// Scroll animations bound to the current document.
///
/// ```js
/// const page = new ParallaxPage(lenis, true);
/// loader.onDone(() => page.loading_complete());
/// ```
#[wasm_bindgen]
pub struct ParallaxPage {
    handle: PageHandle,
}

#[wasm_bindgen]
impl ParallaxPage {
    /// `smooth_scroll` may be `undefined`; the native scroll position is used
    /// then. With `wait_for_loader`, nothing reveals until `loading_complete`.
    #[wasm_bindgen(constructor)]
    pub fn new(smooth_scroll: JsValue, wait_for_loader: Option<bool>) -> Result<ParallaxPage, JsValue> {
        let config = PageConfig {
            smooth_scroll: (!smooth_scroll.is_undefined() && !smooth_scroll.is_null())
                .then_some(smooth_scroll),
            wait_for_loader: wait_for_loader.unwrap_or(false),
        };
        let handle = PageHandle::mount(config).map_err(|e| {
            log::error!("mount error: {:?}", e);
            JsValue::from_str(&format!("{:?}", e))
        })?;
        Ok(Self { handle })
    }

    pub fn loading_complete(&self) {
        self.handle.loading_complete();
    }

    /// Scroll distance in viewport heights (100 = one screen).
    pub fn scroll_vh(&self) -> f64 {
        self.handle.scroll_metrics().scroll_vh
    }

    pub fn scroll_percentage(&self) -> f64 {
        self.handle.scroll_metrics().scroll_percentage
    }

    pub fn dispose(&self) {
        self.handle.dispose();
    }
}
