//! Quick Draft Frontend App
//!
//! Dashboard widget: the draft form above the recent-drafts list.

use leptos::prelude::*;
use leptos::task::spawn_local;
use quick_draft::DraftQuery;

use crate::commands;
use crate::components::{DraftList, QuickDraftForm};
use crate::context::{QuickDraftContext, QuickDraftHandle};

#[component]
pub fn App() -> impl IntoView {
    let ctx = QuickDraftContext::new(commands::load_settings());

    // Load recent drafts; the list view subscribes before the response lands
    let load = ctx.collection.fetch(&ctx.bridge, &DraftQuery::from_settings(&ctx.settings));
    spawn_local(async move {
        match load.await {
            Ok(count) => log::info!("[app] loaded {} drafts", count),
            Err(e) => log::error!("[app] failed to load drafts: {}", e),
        }
    });

    provide_context::<QuickDraftHandle>(StoredValue::new_local(ctx));

    view! {
        <div id="dashboard_quick_press" class="postbox">
            <h2 class="hndle">"Quick Draft"</h2>
            <div class="inside">
                <QuickDraftForm />
                <DraftList />
            </div>
        </div>

        // Screen reader announcements
        <div id="a11y-speak-polite" class="screen-reader-text" aria-live="polite" aria-relevant="additions text" aria-atomic="true"></div>
        <div id="a11y-speak-assertive" class="screen-reader-text" aria-live="assertive" aria-relevant="additions text" aria-atomic="true"></div>
    }
}
