//! Test doubles for the browser-facing seams.

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::announce::{Announcer, Politeness};
use crate::bridge::{Transport, TransportRequest};
use crate::composer::FormSurface;
use crate::draft_list::ListSurface;
use crate::error::TransportError;
use crate::models::FormValues;

type Reply = oneshot::Sender<Result<Value, TransportError>>;

/// Records requests; each one stays pending until `respond` is called.
#[derive(Default)]
pub struct MockTransport {
    requests: RefCell<Vec<TransportRequest>>,
    pending: RefCell<VecDeque<Reply>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle the oldest outstanding request. False if nobody is listening.
    pub fn respond(&self, result: Result<Value, TransportError>) -> bool {
        let reply = self.pending.borrow_mut().pop_front();
        match reply {
            Some(reply) => reply.send(result).is_ok(),
            None => false,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for MockTransport {
    fn request(&self, request: TransportRequest) -> LocalBoxFuture<'static, Result<Value, TransportError>> {
        self.requests.borrow_mut().push(request);
        let (reply, response) = oneshot::channel();
        self.pending.borrow_mut().push_back(reply);
        async move { response.await.unwrap_or(Err(TransportError::Aborted)) }.boxed_local()
    }
}

/// In-memory form with the two quick draft fields.
pub struct RecordingForm {
    pub fields: RefCell<Vec<(String, String)>>,
    pub prompts: RefCell<HashMap<String, bool>>,
    pub busy: Cell<bool>,
    pub busy_changes: Cell<usize>,
    pub error: RefCell<Option<String>>,
    pub error_renders: Cell<usize>,
    pub focused: RefCell<Vec<String>>,
    pub clears: Cell<usize>,
}

impl Default for RecordingForm {
    fn default() -> Self {
        Self {
            fields: RefCell::new(vec![
                ("title".to_string(), String::new()),
                ("content".to_string(), String::new()),
            ]),
            prompts: RefCell::new(HashMap::new()),
            busy: Cell::new(false),
            busy_changes: Cell::new(0),
            error: RefCell::new(None),
            error_renders: Cell::new(0),
            focused: RefCell::new(Vec::new()),
            clears: Cell::new(0),
        }
    }
}

impl RecordingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_into(&self, name: &str, value: &str) {
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn prompt(&self, name: &str) -> Option<bool> {
        self.prompts.borrow().get(name).copied()
    }
}

impl FormSurface for RecordingForm {
    fn serialize(&self) -> FormValues {
        self.fields.borrow().iter().cloned().collect()
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.borrow().iter().map(|(name, _)| name.clone()).collect()
    }

    fn field_value(&self, name: &str) -> String {
        self.fields
            .borrow()
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    fn set_prompt_visible(&self, name: &str, visible: bool) {
        self.prompts.borrow_mut().insert(name.to_string(), visible);
    }

    fn set_busy(&self, busy: bool) {
        self.busy.set(busy);
        self.busy_changes.set(self.busy_changes.get() + 1);
    }

    fn show_error(&self, message: Option<&str>) {
        *self.error.borrow_mut() = message.map(str::to_string);
        self.error_renders.set(self.error_renders.get() + 1);
    }

    fn focus(&self, name: &str) {
        self.focused.borrow_mut().push(name.to_string());
    }

    fn clear(&self) {
        for (_, value) in self.fields.borrow_mut().iter_mut() {
            value.clear();
        }
        self.clears.set(self.clears.get() + 1);
    }
}

#[derive(Default)]
pub struct RecordingList {
    pub visible: Cell<Option<bool>>,
    pub view_more_visible: Cell<Option<bool>>,
    pub bodies: RefCell<Vec<String>>,
    pub highlighted: Cell<bool>,
}

impl RecordingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> String {
        self.bodies.borrow().last().cloned().unwrap_or_default()
    }

    pub fn renders(&self) -> usize {
        self.bodies.borrow().len()
    }
}

impl ListSurface for RecordingList {
    fn set_visible(&self, visible: bool) {
        self.visible.set(Some(visible));
    }

    fn set_view_more_visible(&self, visible: bool) {
        self.view_more_visible.set(Some(visible));
    }

    fn replace_body(&self, html: &str) {
        self.bodies.borrow_mut().push(html.to_string());
    }

    fn set_first_highlighted(&self, highlighted: bool) {
        self.highlighted.set(highlighted);
    }
}

#[derive(Default)]
pub struct RecordingAnnouncer {
    pub spoken: RefCell<Vec<(String, Politeness)>>,
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, message: &str, priority: Politeness) {
        self.spoken.borrow_mut().push((message.to_string(), priority));
    }
}
