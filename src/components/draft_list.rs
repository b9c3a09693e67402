//! Draft List Component
//!
//! Mount point for the recent-drafts list. Rows are rendered from templates by
//! `DraftListView` and written straight into the `<ul>`.

use std::rc::Rc;

use leptos::html;
use leptos::prelude::*;
use quick_draft::{DraftListView, ListSurface};

use crate::context::use_quick_draft;

const VIEW_ALL_URL: &str = "edit.php?post_status=draft";
const HIGHLIGHT_CLASS: &str = "is-new";

/// `ListSurface` over the rendered list elements
struct DomListSurface {
    container: NodeRef<html::Div>,
    view_all: NodeRef<html::P>,
    list: NodeRef<html::Ul>,
}

impl ListSurface for DomListSurface {
    fn set_visible(&self, visible: bool) {
        if let Some(container) = self.container.get_untracked() {
            container.set_hidden(!visible);
        }
    }

    fn set_view_more_visible(&self, visible: bool) {
        if let Some(view_all) = self.view_all.get_untracked() {
            view_all.set_hidden(!visible);
        }
    }

    fn replace_body(&self, html: &str) {
        if let Some(list) = self.list.get_untracked() {
            list.set_inner_html(html);
        }
    }

    fn set_first_highlighted(&self, highlighted: bool) {
        let first = self.list.get_untracked().and_then(|list| list.first_element_child());
        if let Some(first) = first {
            if let Err(e) = first.class_list().toggle_with_force(HIGHLIGHT_CLASS, highlighted) {
                log::debug!("[drafts] could not toggle highlight: {:?}", e);
            }
        }
    }
}

/// Recent drafts, newest first
#[component]
pub fn DraftList() -> impl IntoView {
    let ctx = use_quick_draft();

    let container = NodeRef::<html::Div>::new();
    let view_all = NodeRef::<html::P>::new();
    let list = NodeRef::<html::Ul>::new();

    let surface = Rc::new(DomListSurface { container, view_all, list });
    // The collection only holds weak listeners; the component owns the view
    let _view = StoredValue::new_local(DraftListView::new(ctx.draft_list_deps(), surface));

    view! {
        <div class="drafts" node_ref=container hidden=true>
            <p class="view-all" node_ref=view_all hidden=true>
                <a href=VIEW_ALL_URL>"View all drafts"</a>
            </p>
            <h2 class="hide-if-no-js">"Your Recent Drafts"</h2>
            <ul class="drafts-list" node_ref=list></ul>
        </div>
    }
}
