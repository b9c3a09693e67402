//! Server Bindings
//!
//! Browser-side transport and the settings handed over by the page.

mod fetch;

use quick_draft::Settings;
use wasm_bindgen::JsValue;

pub use fetch::FetchTransport;

/// Global the host page defines before the app boots
const SETTINGS_GLOBAL: &str = "quickDraftSettings";

/// Read `window.quickDraftSettings`, falling back to defaults when absent or malformed.
pub fn load_settings() -> Settings {
    let Some(window) = web_sys::window() else {
        return Settings::default();
    };
    match js_sys::Reflect::get(&window, &JsValue::from_str(SETTINGS_GLOBAL)) {
        Ok(value) if !value.is_undefined() && !value.is_null() => {
            serde_wasm_bindgen::from_value(value).unwrap_or_else(|e| {
                log::warn!("[settings] ignoring malformed {}: {}", SETTINGS_GLOBAL, e);
                Settings::default()
            })
        }
        _ => {
            log::debug!("[settings] {} not set, using defaults", SETTINGS_GLOBAL);
            Settings::default()
        }
    }
}
