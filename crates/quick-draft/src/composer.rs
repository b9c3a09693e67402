//! Draft Composer
//!
//! Submission state machine behind the inline draft form.
//!
//! `Idle → Submitting → Idle` on success, or `Idle + error` on a validation
//! or server failure. While `submitting` is set, further submits are ignored,
//! so at most one save is in flight. The error state is cleared at the start
//! of every attempt.

use futures::future::{AbortHandle, LocalBoxFuture};
use futures::FutureExt;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::announce::{Announcer, Politeness};
use crate::bridge::RpcBridge;
use crate::collection::DraftCollection;
use crate::error::{RpcError, SubmitFailure, ValidationError};
use crate::models::{Draft, FormValues};
use crate::schedule::Scheduler;
use crate::settings::Settings;

/// Field that receives focus once a submission settles
pub const PRIMARY_FIELD: &str = "title";

/// Lets the busy indicator fade out before the caret comes back.
pub const REFOCUS_DELAY: Duration = Duration::from_millis(250);

/// The form as the composer sees it. Implementations own the markup.
pub trait FormSurface {
    /// Current field values, in document order
    fn serialize(&self) -> FormValues;
    fn field_names(&self) -> Vec<String>;
    fn field_value(&self, name: &str) -> String;
    fn set_prompt_visible(&self, name: &str, visible: bool);
    fn set_busy(&self, busy: bool);
    /// Show `message` as plain text in the error region, or hide the region.
    fn show_error(&self, message: Option<&str>);
    fn focus(&self, name: &str);
    /// Empty every field.
    fn clear(&self);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposerState {
    /// Prompt visibility per field
    pub prompts: BTreeMap<String, bool>,
    pub submitting: bool,
    pub error_message: Option<String>,
}

/// Collaborators shared with the rest of the widget
#[derive(Clone)]
pub struct ComposerDeps {
    pub settings: Rc<Settings>,
    pub bridge: RpcBridge,
    pub collection: DraftCollection,
    pub scheduler: Rc<dyn Scheduler>,
    pub announcer: Rc<dyn Announcer>,
}

/// Outcome of a submit call
#[must_use = "a started submission does nothing until its future is spawned"]
pub enum Submission {
    /// A save is already in flight
    Ignored,
    /// Stopped before the network; the error state has been set
    Invalid(ValidationError),
    /// Save issued; drive the future to settle it
    Started(LocalBoxFuture<'static, ()>),
}

impl Submission {
    pub fn is_started(&self) -> bool {
        matches!(self, Submission::Started(_))
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Submission::Ignored => f.write_str("Ignored"),
            Submission::Invalid(error) => f.debug_tuple("Invalid").field(error).finish(),
            Submission::Started(_) => f.write_str("Started(..)"),
        }
    }
}

struct Inner {
    deps: ComposerDeps,
    surface: Rc<dyn FormSurface>,
    state: RefCell<ComposerState>,
    draft: RefCell<Draft>,
    pending: RefCell<Option<AbortHandle>>,
}

#[derive(Clone)]
pub struct Composer {
    inner: Rc<Inner>,
}

impl Composer {
    pub fn new(deps: ComposerDeps, surface: Rc<dyn FormSurface>) -> Self {
        let composer = Self {
            inner: Rc::new(Inner {
                deps,
                surface,
                state: RefCell::new(ComposerState::default()),
                draft: RefCell::new(Draft::new()),
                pending: RefCell::new(None),
            }),
        };
        composer.show_all_prompts();
        composer
    }

    pub fn state(&self) -> ComposerState {
        self.inner.state.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.state.borrow().submitting
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner.state.borrow().error_message.clone()
    }

    /// Copy of the draft the form is currently editing
    pub fn working_draft(&self) -> Draft {
        self.inner.draft.borrow().clone()
    }

    /// Abort handle of the in-flight save, if any. The composer never uses it.
    pub fn pending_request(&self) -> Option<AbortHandle> {
        self.inner.pending.borrow().clone()
    }

    // ========================
    // Prompts
    // ========================

    pub fn focus_field(&self, name: &str) {
        self.toggle_prompt(name, false);
    }

    pub fn blur_field(&self, name: &str) {
        self.toggle_prompt(name, true);
    }

    /// Re-show every prompt on the next tick, after the browser's own reset.
    pub fn show_all_prompts(&self) {
        for name in self.inner.surface.field_names() {
            let composer = self.clone();
            self.inner
                .deps
                .scheduler
                .defer(Box::new(move || composer.toggle_prompt(&name, true)));
        }
    }

    /// A prompt shows only when requested and the field is empty.
    fn toggle_prompt(&self, name: &str, visible: bool) {
        let has_content = !self.inner.surface.field_value(name).is_empty();
        let shown = visible && !has_content;
        self.inner.state.borrow_mut().prompts.insert(name.to_string(), shown);
        self.inner.surface.set_prompt_visible(name, shown);
    }

    // ========================
    // Error state
    // ========================

    pub fn render(&self) {
        let error = self.inner.state.borrow().error_message.clone();
        self.inner.surface.show_error(error.as_deref());
    }

    fn set_error(&self, error: Option<String>) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            let changed = state.error_message != error;
            state.error_message = error.clone();
            changed
        };
        if changed {
            self.render();
        }
        if let Some(message) = error {
            self.inner.deps.announcer.announce(&message, Politeness::Assertive);
        }
    }

    // ========================
    // Submission
    // ========================

    pub fn submit(&self) -> Submission {
        if self.is_submitting() {
            log::debug!("[composer] submit ignored, save already in flight");
            return Submission::Ignored;
        }

        self.set_error(None);

        let values = self.inner.surface.serialize();
        if !values.has_values() {
            return self.reject(ValidationError::EmptyFields);
        }

        let request = {
            let mut draft = self.inner.draft.borrow_mut();
            draft.assign(&values);
            if let Err(error) = draft.validate() {
                drop(draft);
                return self.reject(error);
            }
            draft.save_request(&self.inner.deps.settings)
        };

        self.inner.state.borrow_mut().submitting = true;
        self.inner.surface.set_busy(true);

        let pending = self.inner.deps.bridge.send(request);
        *self.inner.pending.borrow_mut() = Some(pending.abort_handle());

        let composer = self.clone();
        Submission::Started(
            async move {
                let outcome = pending.await;
                composer.settle();
                match outcome {
                    Ok(payload) => composer.on_saved(payload),
                    Err(error) => composer.on_failed(&error),
                }
            }
            .boxed_local(),
        )
    }

    fn reject(&self, error: ValidationError) -> Submission {
        log::warn!("[composer] draft not submitted: {}", error);
        let message = SubmitFailure::Validation(error.clone()).message(&self.inner.deps.settings.messages);
        self.set_error(Some(message));
        Submission::Invalid(error)
    }

    /// Runs on every outcome, before the success or failure handling.
    fn settle(&self) {
        self.inner.surface.set_busy(false);
        self.inner.state.borrow_mut().submitting = false;
        *self.inner.pending.borrow_mut() = None;

        let surface = self.inner.surface.clone();
        self.inner
            .deps
            .scheduler
            .schedule(REFOCUS_DELAY, Box::new(move || surface.focus(PRIMARY_FIELD)));
    }

    fn on_saved(&self, payload: Value) {
        let saved = {
            let mut draft = self.inner.draft.borrow_mut();
            // The post exists server-side either way; an unreadable copy keeps the local one.
            if let Err(error) = draft.apply_server_response(payload) {
                log::warn!("[composer] save succeeded with an unreadable draft, keeping local copy: {}", error);
            }
            draft.clone()
        };

        log::info!("[composer] saved draft {:?}", saved.id);
        self.render();
        self.inner.deps.collection.prepend(saved);
        *self.inner.draft.borrow_mut() = Draft::new();
        self.inner.surface.clear();
        self.show_all_prompts();
    }

    fn on_failed(&self, error: &RpcError) {
        let failure = SubmitFailure::from_rpc(error);
        log::warn!("[composer] save failed: {}", failure);
        self.set_error(Some(failure.message(&self.inner.deps.settings.messages)));
    }
}
