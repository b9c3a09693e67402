//! Draft Collection
//!
//! Ordered, most-recent-first list of drafts shared by the composer (writer)
//! and the draft list (reader). Changes are announced through typed events.

use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::bridge::{Method, RequestOptions, RpcBridge};
use crate::error::RpcError;
use crate::events::{EventEmitter, ListenerId};
use crate::models::{Draft, DraftPage, DRAFT_STATUS};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    /// Contents replaced by a load
    Sync,
    /// A draft was inserted at `index`
    Add { index: usize },
}

/// Parameters of the initial draft load
#[derive(Debug, Clone, PartialEq)]
pub struct DraftQuery {
    pub url: String,
    pub status: String,
    pub author: u64,
    pub per_page: usize,
    pub order_by: String,
}

impl DraftQuery {
    /// The current user's most recent drafts, one page deep
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            url: settings.rest_url("wp/v2/posts"),
            status: DRAFT_STATUS.to_string(),
            author: settings.current_user_id,
            per_page: settings.per_page,
            order_by: "date".to_string(),
        }
    }

    pub fn request(&self) -> RequestOptions {
        let mut data = Map::new();
        data.insert("status".to_string(), json!(self.status));
        data.insert("author".to_string(), json!(self.author));
        data.insert("per_page".to_string(), json!(self.per_page));
        data.insert("orderby".to_string(), json!(self.order_by));
        // Lets back-end filters recognise the widget's own query
        data.insert("quick-draft-post-list".to_string(), Value::Bool(true));
        RequestOptions::new(Method::Get).url(self.url.clone()).data(data)
    }
}

struct Inner {
    items: RefCell<Vec<Draft>>,
    has_more: Cell<bool>,
    page_size: usize,
    events: EventEmitter<CollectionEvent>,
}

/// Shared handle; clones see the same drafts.
#[derive(Clone)]
pub struct DraftCollection {
    inner: Rc<Inner>,
}

impl DraftCollection {
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: Rc::new(Inner {
                items: RefCell::new(Vec::new()),
                has_more: Cell::new(false),
                page_size,
                events: EventEmitter::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.inner.has_more.get()
    }

    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    pub fn get(&self, index: usize) -> Option<Draft> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn items(&self) -> Vec<Draft> {
        self.inner.items.borrow().clone()
    }

    /// The drafts that fit the display window (first `page_size`)
    pub fn window(&self) -> Vec<Draft> {
        self.inner.items.borrow().iter().take(self.inner.page_size).cloned().collect()
    }

    pub fn subscribe(&self, listener: impl Fn(&CollectionEvent) + 'static) -> ListenerId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Replace the contents with a freshly loaded page.
    pub fn reset(&self, page: DraftPage) {
        *self.inner.items.borrow_mut() = page.items;
        self.inner.has_more.set(page.has_more);
        self.inner.events.emit(&CollectionEvent::Sync);
    }

    /// Insert the newest draft at the head.
    pub fn prepend(&self, draft: Draft) {
        self.inner.items.borrow_mut().insert(0, draft);
        self.inner.events.emit(&CollectionEvent::Add { index: 0 });
    }

    /// Load one page through `bridge`, resolving with the number of drafts loaded.
    pub fn fetch(&self, bridge: &RpcBridge, query: &DraftQuery) -> impl Future<Output = Result<usize, RpcError>> + 'static {
        let pending = bridge.send(query.request());
        let collection = self.clone();
        async move {
            let payload = pending.await?;
            let page = match DraftPage::from_payload(payload.clone()) {
                Ok(page) => page,
                Err(error) => {
                    log::warn!("[drafts] malformed draft page: {}", error);
                    return Err(RpcError::Unrecognized(payload));
                }
            };
            let loaded = page.items.len();
            log::info!("[drafts] loaded {} drafts (more: {})", loaded, page.has_more);
            collection.reset(page);
            Ok(loaded)
        }
    }
}
