//! Quick Draft Context
//!
//! Shared services provided via Leptos Context API.

use std::rc::Rc;

use leptos::prelude::*;
use quick_draft::{
    Announcer, ComposerDeps, DraftCollection, DraftListDeps, RpcBridge, Scheduler, Settings, TemplateCache,
};

use crate::commands::FetchTransport;
use crate::platform::{DomTemplates, IntlDateFormat, LiveRegionAnnouncer, TimeoutScheduler};

/// Services shared by the form and the draft list
#[derive(Clone)]
pub struct QuickDraftContext {
    pub settings: Rc<Settings>,
    pub bridge: RpcBridge,
    /// Recent drafts, shared between the composer and the list view
    pub collection: DraftCollection,
    pub templates: TemplateCache,
    pub scheduler: Rc<dyn Scheduler>,
    pub announcer: Rc<dyn Announcer>,
}

impl QuickDraftContext {
    pub fn new(settings: Settings) -> Self {
        let bridge = RpcBridge::new(Rc::new(FetchTransport), settings.ajax.url.clone());
        Self {
            collection: DraftCollection::new(settings.per_page),
            settings: Rc::new(settings),
            bridge,
            templates: TemplateCache::new(Rc::new(DomTemplates::default())),
            scheduler: Rc::new(TimeoutScheduler),
            announcer: Rc::new(LiveRegionAnnouncer),
        }
    }

    pub fn composer_deps(&self) -> ComposerDeps {
        ComposerDeps {
            settings: self.settings.clone(),
            bridge: self.bridge.clone(),
            collection: self.collection.clone(),
            scheduler: self.scheduler.clone(),
            announcer: self.announcer.clone(),
        }
    }

    pub fn draft_list_deps(&self) -> DraftListDeps {
        DraftListDeps {
            settings: self.settings.clone(),
            collection: self.collection.clone(),
            templates: self.templates.clone(),
            scheduler: self.scheduler.clone(),
            announcer: self.announcer.clone(),
            date_format: Some(Rc::new(IntlDateFormat)),
        }
    }
}

/// The context holds `Rc`s, so it lives in local storage.
pub type QuickDraftHandle = StoredValue<QuickDraftContext, LocalStorage>;

/// Get the shared services from context
pub fn use_quick_draft() -> QuickDraftContext {
    expect_context::<QuickDraftHandle>().get_value()
}
