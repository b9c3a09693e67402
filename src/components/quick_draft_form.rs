//! Quick Draft Form Component
//!
//! Title and content fields driven by the `Composer`. Field values, prompt
//! visibility and the busy/error state live in a store the view renders from.

use std::collections::HashMap;
use std::rc::Rc;

use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use quick_draft::{Composer, FormSurface, FormValues, Submission};

use crate::context::use_quick_draft;

/// Form fields in document order
const FIELDS: &[&str] = &["title", "content"];

/// Window height kept free for browser chrome and the save button
const WINDOW_MARGIN: f64 = 100.0;

/// Top and bottom border of the textarea
const BORDER_HEIGHT: i32 = 2;

/// Everything the form renders, with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct FormUiState {
    pub title: String,
    pub content: String,
    /// Prompt visibility per field name
    pub prompts: HashMap<String, bool>,
    pub busy: bool,
    pub error: Option<String>,
}

/// `FormSurface` writing into the form store
struct StoreFormSurface {
    state: Store<FormUiState>,
    title_ref: NodeRef<html::Input>,
    content_ref: NodeRef<html::Textarea>,
}

impl FormSurface for StoreFormSurface {
    fn serialize(&self) -> FormValues {
        FIELDS.iter().map(|name| (*name, self.field_value(name))).collect()
    }

    fn field_names(&self) -> Vec<String> {
        FIELDS.iter().map(|name| name.to_string()).collect()
    }

    fn field_value(&self, name: &str) -> String {
        match name {
            "title" => self.state.title().get_untracked(),
            "content" => self.state.content().get_untracked(),
            _ => String::new(),
        }
    }

    fn set_prompt_visible(&self, name: &str, visible: bool) {
        self.state.prompts().write().insert(name.to_string(), visible);
    }

    fn set_busy(&self, busy: bool) {
        self.state.busy().set(busy);
    }

    fn show_error(&self, message: Option<&str>) {
        self.state.error().set(message.map(str::to_string));
    }

    fn focus(&self, name: &str) {
        let focused = match name {
            "title" => self.title_ref.get_untracked().map(|el| el.focus()),
            "content" => self.content_ref.get_untracked().map(|el| el.focus()),
            _ => None,
        };
        if let Some(Err(e)) = focused {
            log::debug!("[form] could not focus {}: {:?}", name, e);
        }
    }

    fn clear(&self) {
        self.state.title().set(String::new());
        self.state.content().set(String::new());
    }
}

// ========================
// Content auto-resize
// ========================

/// New textarea height, or `None` when it should stay as it is.
fn next_height(content: i32, current: i32, max: i32) -> Option<i32> {
    if content == current || (content >= max && current >= max) {
        return None;
    }
    Some(content.min(max))
}

/// Grow or shrink the content box with its text, never past the window.
fn auto_resize(textarea: &web_sys::HtmlTextAreaElement) {
    let Some(window_height) = web_sys::window().and_then(|w| w.inner_height().ok()).and_then(|h| h.as_f64()) else {
        return;
    };
    let max = (window_height - WINDOW_MARGIN) as i32;
    let style = web_sys::HtmlElement::style(textarea);
    let current = textarea.offset_height();

    // Collapse first so scroll height reflects the text, not the box.
    let _ = style.set_property("height", "auto");
    let content = textarea.scroll_height() + BORDER_HEIGHT;
    let height = next_height(content, current, max).unwrap_or(current);

    let overflow = if content > max { "auto" } else { "hidden" };
    let _ = style.set_property("overflow-y", overflow);
    let _ = style.set_property("height", &format!("{}px", height));
}

/// Quick Draft form: posts a new draft and feeds it to the recent-drafts list
#[component]
pub fn QuickDraftForm() -> impl IntoView {
    let ctx = use_quick_draft();

    let state = Store::new(FormUiState::default());
    let title_ref = NodeRef::<html::Input>::new();
    let content_ref = NodeRef::<html::Textarea>::new();

    let surface = Rc::new(StoreFormSurface { state, title_ref, content_ref });
    let composer = Composer::new(ctx.composer_deps(), surface);
    composer.render();
    let composer = StoredValue::new_local(composer);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        match composer.with_value(Composer::submit) {
            Submission::Started(save) => spawn_local(save),
            Submission::Invalid(e) => log::debug!("[form] not sent: {}", e),
            Submission::Ignored => {}
        }
    };

    // The browser resets the DOM only; the store is the source of truth
    let on_reset = move |_: web_sys::Event| {
        state.title().set(String::new());
        state.content().set(String::new());
        composer.with_value(Composer::show_all_prompts);
    };

    let prompt_class = move |name: &'static str| {
        move || {
            let visible = state.prompts().read().get(name).copied().unwrap_or(false);
            if visible { "prompt" } else { "prompt screen-reader-text" }
        }
    };

    view! {
        <form
            name="post"
            id="quick-press"
            class=move || if state.busy().get() { "initial-form is-saving" } else { "initial-form" }
            on:submit=on_submit
            on:reset=on_reset
        >
            <div class="input-text-wrap" id="title-wrap">
                <label for="title" id="title-prompt-text" class=prompt_class("title")>"Title"</label>
                <input
                    type="text"
                    name="post_title"
                    id="title"
                    autocomplete="off"
                    node_ref=title_ref
                    prop:value=move || state.title().get()
                    on:input=move |ev| state.title().set(event_target_value(&ev))
                    on:focus=move |_| composer.with_value(|c| c.focus_field("title"))
                    on:blur=move |_| composer.with_value(|c| c.blur_field("title"))
                />
            </div>

            <div class="textarea-wrap" id="description-wrap">
                <label for="content" id="content-prompt-text" class=prompt_class("content")>
                    "What\u{2019}s on your mind?"
                </label>
                <textarea
                    name="content"
                    id="content"
                    class="mceEditor"
                    rows="3"
                    cols="15"
                    autocomplete="off"
                    node_ref=content_ref
                    prop:value=move || state.content().get()
                    on:input=move |ev| {
                        state.content().set(event_target_value(&ev));
                        if let Some(textarea) = content_ref.get_untracked() {
                            auto_resize(&textarea);
                        }
                    }
                    on:focus=move |_| {
                        composer.with_value(|c| c.focus_field("content"));
                        if let Some(textarea) = content_ref.get_untracked() {
                            auto_resize(&textarea);
                        }
                    }
                    on:blur=move |_| composer.with_value(|c| c.blur_field("content"))
                ></textarea>
            </div>

            <div
                class=move || if state.error().read().is_some() { "error inline notice-error notice-alt" } else { "error inline notice-error notice-alt hidden" }
                role="alert"
            >
                {move || state.error().get().map(|message| view! { <p>{message}</p> })}
            </div>

            <p class="submit">
                <input type="submit" name="save" id="save-post" class="button button-primary" value="Save Draft" />
                <br class="clear" />
            </p>
        </form>
    }
}
