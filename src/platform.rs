//! Browser Adapters
//!
//! DOM and timer implementations of the seams the draft logic runs against.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use gloo_timers::callback::Timeout;
use js_sys::{Array, Date, Intl, Object, Reflect};
use quick_draft::{Announcer, BuiltinTemplates, LocaleDateFormat, Politeness, Scheduler, TaskHandle, TemplateSource};
use wasm_bindgen::JsValue;

// ========================
// Timers
// ========================

/// `setTimeout`-backed scheduler
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let handle = TaskHandle::new();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        // Cancellation goes through the handle, so the timer itself can be released.
        Timeout::new(millis, handle.guard(task)).forget();
        handle
    }
}

// ========================
// Live regions
// ========================

/// Speaks through the `#a11y-speak-polite` / `#a11y-speak-assertive` regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveRegionAnnouncer;

impl LiveRegionAnnouncer {
    pub fn region_id(politeness: Politeness) -> String {
        format!("a11y-speak-{}", politeness.as_str())
    }
}

impl Announcer for LiveRegionAnnouncer {
    fn announce(&self, message: &str, politeness: Politeness) {
        let region = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&Self::region_id(politeness)));
        match region {
            Some(region) => {
                // Clearing first makes repeated messages audible.
                region.set_text_content(None);
                region.set_text_content(Some(message));
            }
            None => log::warn!("[a11y] no live region for {}", politeness.as_str()),
        }
    }
}

// ========================
// Templates
// ========================

/// Looks up `<script type="text/html" id="tmpl-{id}">` blocks, then the built-in set.
#[derive(Debug, Default, Clone)]
pub struct DomTemplates {
    fallback: BuiltinTemplates,
}

impl TemplateSource for DomTemplates {
    fn template_source(&self, id: &str) -> Option<String> {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&format!("tmpl-{}", id)))
            .map(|el| el.inner_html())
            .or_else(|| self.fallback.template_source(id))
    }
}

// ========================
// Dates
// ========================

/// Long dates through `Intl.DateTimeFormat` in the browser's locale
#[derive(Debug, Default, Clone, Copy)]
pub struct IntlDateFormat;

impl LocaleDateFormat for IntlDateFormat {
    fn format_long_date(&self, date: &DateTime<FixedOffset>) -> Option<String> {
        let options = Object::new();
        for (key, value) in [("year", "numeric"), ("month", "long"), ("day", "numeric")] {
            Reflect::set(&options, &JsValue::from_str(key), &JsValue::from_str(value)).ok()?;
        }
        // Render the wall-clock date the server reported, not the viewer's local one.
        Reflect::set(&options, &JsValue::from_str("timeZone"), &JsValue::from_str("UTC")).ok()?;

        let formatter = Intl::DateTimeFormat::new(&Array::new(), &options);
        let wall_clock = date.naive_local().and_utc().timestamp_millis() as f64;
        let js_date = Date::new(&JsValue::from_f64(wall_clock));
        formatter.format().call1(&JsValue::NULL, &js_date).ok()?.as_string()
    }
}
