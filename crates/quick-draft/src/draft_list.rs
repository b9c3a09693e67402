//! Draft List
//!
//! Read-only view over the shared [`DraftCollection`]. It renders after the
//! initial load and again (with a short highlight) whenever the composer adds
//! a draft. Every render rebuilds the whole list body.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::announce::{Announcer, Politeness};
use crate::collection::{CollectionEvent, DraftCollection};
use crate::error::TemplateError;
use crate::events::ListenerId;
use crate::models::Draft;
use crate::schedule::{Scheduler, TaskHandle};
use crate::settings::Settings;
use crate::template::{Template, TemplateCache};

pub const DRAFT_ITEM_TEMPLATE_ID: &str = "item-quick-press-draft";

pub const DRAFT_ITEM_TEMPLATE: &str = concat!(
    r#"<div class="draft-title"><a href="{{ data.link }}" aria-label="{{ data.formattedTitle }}">{{ data.formattedTitle }}</a>"#,
    r#"<time datetime="{{ data.date }}">{{ data.formattedDate }}</time></div>"#,
    r#"<# if data.formattedContent #><p>{{ data.formattedContent }}</p><# end #>"#,
);

/// Words kept in a row excerpt
pub const EXCERPT_LENGTH: usize = 10;

pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(1);

/// The list markup as the view sees it.
pub trait ListSurface {
    fn set_visible(&self, visible: bool);
    fn set_view_more_visible(&self, visible: bool);
    /// Replace the list body with `html` (one `<li>` per draft).
    fn replace_body(&self, html: &str);
    fn set_first_highlighted(&self, highlighted: bool);
}

/// Locale-aware long date ("June 1, 2017"). `None` when unavailable.
pub trait LocaleDateFormat {
    fn format_long_date(&self, date: &DateTime<FixedOffset>) -> Option<String>;
}

/// Result of one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct DraftListMarkup {
    pub visible: bool,
    pub view_more_visible: bool,
    pub rows: Vec<String>,
}

impl DraftListMarkup {
    pub fn body_html(&self) -> String {
        self.rows.iter().map(|row| format!("<li>{}</li>", row)).collect()
    }
}

#[derive(Clone)]
pub struct DraftListDeps {
    pub settings: Rc<Settings>,
    pub collection: DraftCollection,
    pub templates: TemplateCache,
    pub scheduler: Rc<dyn Scheduler>,
    pub announcer: Rc<dyn Announcer>,
    pub date_format: Option<Rc<dyn LocaleDateFormat>>,
}

struct Inner {
    deps: DraftListDeps,
    surface: Rc<dyn ListSurface>,
    template: Rc<Template>,
    add_listener: RefCell<Option<TaskHandle>>,
    add_listener_id: Cell<Option<ListenerId>>,
    highlight: RefCell<Option<TaskHandle>>,
}

#[derive(Clone)]
pub struct DraftListView {
    inner: Rc<Inner>,
}

impl DraftListView {
    /// Build the view and wait for the collection's first load.
    pub fn new(deps: DraftListDeps, surface: Rc<dyn ListSurface>) -> Self {
        let template = deps.templates.get_template(DRAFT_ITEM_TEMPLATE_ID);
        let view = Self {
            inner: Rc::new(Inner {
                deps,
                surface,
                template,
                add_listener: RefCell::new(None),
                add_listener_id: Cell::new(None),
                highlight: RefCell::new(None),
            }),
        };

        let weak = Rc::downgrade(&view.inner);
        view.inner.deps.collection.subscribe(move |event| {
            if *event == CollectionEvent::Sync {
                if let Some(view) = upgrade(&weak) {
                    view.on_drafts_loaded();
                }
            }
        });
        view
    }

    fn on_drafts_loaded(&self) {
        let already_listening =
            self.inner.add_listener.borrow().is_some() || self.inner.add_listener_id.get().is_some();
        if !already_listening {
            // Attach on the next tick so drafts present at load time are not announced as new.
            let weak = Rc::downgrade(&self.inner);
            let handle = self.inner.deps.scheduler.defer(Box::new(move || {
                if let Some(view) = upgrade(&weak) {
                    view.listen_for_new_drafts();
                }
            }));
            *self.inner.add_listener.borrow_mut() = Some(handle);
        }
        self.render();
    }

    fn listen_for_new_drafts(&self) {
        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.deps.collection.subscribe(move |event| {
            if let CollectionEvent::Add { .. } = event {
                if let Some(view) = upgrade(&weak) {
                    view.render_new();
                }
            }
        });
        self.inner.add_listener_id.set(Some(id));
        self.inner.add_listener.borrow_mut().take();
    }

    fn render_new(&self) {
        self.render();
        self.inner.surface.set_first_highlighted(true);

        if let Some(previous) = self.inner.highlight.borrow_mut().take() {
            previous.cancel();
        }
        let surface = self.inner.surface.clone();
        let handle = self
            .inner
            .deps
            .scheduler
            .schedule(HIGHLIGHT_DURATION, Box::new(move || surface.set_first_highlighted(false)));
        *self.inner.highlight.borrow_mut() = Some(handle);

        let messages = &self.inner.deps.settings.messages;
        self.inner.deps.announcer.announce(&messages.new_draft_created, Politeness::Assertive);
    }

    /// Rebuild the whole list from the collection.
    pub fn render(&self) {
        match self.markup() {
            Ok(markup) => {
                self.inner.surface.set_visible(markup.visible);
                self.inner.surface.set_view_more_visible(markup.view_more_visible);
                self.inner.surface.replace_body(&markup.body_html());
            }
            Err(error) => log::error!("[drafts] cannot render draft list: {}", error),
        }
    }

    /// Markup for the current collection, without touching the surface
    pub fn markup(&self) -> Result<DraftListMarkup, TemplateError> {
        let collection = &self.inner.deps.collection;
        let rows = collection
            .window()
            .iter()
            .map(|draft| self.inner.template.render(&self.row_attributes(draft)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DraftListMarkup {
            visible: !collection.is_empty(),
            view_more_visible: collection.has_more() || collection.len() > collection.page_size(),
            rows,
        })
    }

    /// Template data for one row: the draft's own attributes plus display fields.
    pub fn row_attributes(&self, draft: &Draft) -> Value {
        let settings = &self.inner.deps.settings;
        let mut attributes = draft.attributes();

        let excerpt = settings.formatting.trim_words(&draft.content, Some(EXCERPT_LENGTH), None);
        let title = if draft.title.is_empty() {
            settings.messages.no_title.clone()
        } else {
            draft.title.clone()
        };
        let date = format_draft_date(
            draft.date.as_deref(),
            &settings.timezone_offset,
            self.inner.deps.date_format.as_deref(),
        );

        attributes.insert("formattedContent".to_string(), Value::String(excerpt));
        attributes.insert("formattedTitle".to_string(), Value::String(title));
        attributes.insert("formattedDate".to_string(), Value::String(date));
        Value::Object(attributes)
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<DraftListView> {
    weak.upgrade().map(|inner| DraftListView { inner })
}

/// Parse a raw draft timestamp in the site's offset and format it for display.
pub fn format_draft_date(raw: Option<&str>, offset: &str, locale: Option<&dyn LocaleDateFormat>) -> String {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return String::new();
    };
    let parsed = DateTime::parse_from_rfc3339(&format!("{}{}", raw, offset))
        .or_else(|_| DateTime::parse_from_rfc3339(raw));
    let date = match parsed {
        Ok(date) => date,
        Err(error) => {
            log::warn!("[drafts] unreadable draft date `{}`: {}", raw, error);
            return String::new();
        }
    };

    locale
        .and_then(|format| format.format_long_date(&date))
        .unwrap_or_else(|| date.format("%-m/%-d/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DraftPage;
    use crate::schedule::ManualScheduler;
    use crate::template::BuiltinTemplates;
    use crate::test_support::{RecordingAnnouncer, RecordingList};

    struct EnglishLongDate;

    impl LocaleDateFormat for EnglishLongDate {
        fn format_long_date(&self, date: &DateTime<FixedOffset>) -> Option<String> {
            Some(date.format("%B %-d, %Y").to_string())
        }
    }

    struct Harness {
        collection: DraftCollection,
        scheduler: Rc<ManualScheduler>,
        announcer: Rc<RecordingAnnouncer>,
        surface: Rc<RecordingList>,
        settings: Rc<Settings>,
        view: DraftListView,
    }

    fn harness() -> Harness {
        let settings = Rc::new(Settings::default());
        let collection = DraftCollection::new(settings.per_page);
        let scheduler = Rc::new(ManualScheduler::new());
        let announcer = Rc::new(RecordingAnnouncer::default());
        let surface = Rc::new(RecordingList::new());
        let deps = DraftListDeps {
            settings: settings.clone(),
            collection: collection.clone(),
            templates: TemplateCache::new(Rc::new(BuiltinTemplates::default())),
            scheduler: scheduler.clone(),
            announcer: announcer.clone(),
            date_format: Some(Rc::new(EnglishLongDate)),
        };
        let view = DraftListView::new(deps, surface.clone());
        Harness { collection, scheduler, announcer, surface, settings, view }
    }

    fn draft(id: u64, title: &str, content: &str) -> Draft {
        Draft {
            id: Some(id),
            title: title.to_string(),
            content: content.to_string(),
            date: Some("2017-06-01T10:20:30".to_string()),
            ..Draft::new()
        }
    }

    #[test]
    fn test_nothing_renders_before_first_load() {
        let h = harness();
        assert_eq!(h.surface.renders(), 0);
        h.collection.prepend(draft(1, "Early", ""));
        h.scheduler.run_until_idle();
        assert_eq!(h.surface.renders(), 0);
    }

    #[test]
    fn test_sync_renders_rows() {
        let h = harness();
        h.collection.reset(DraftPage { items: vec![draft(1, "First", "Body"), draft(2, "", "")], has_more: false });

        assert_eq!(h.surface.visible.get(), Some(true));
        assert_eq!(h.surface.view_more_visible.get(), Some(false));
        assert_eq!(
            h.surface.body(),
            concat!(
                r#"<li><div class="draft-title"><a href="" aria-label="First">First</a><time datetime="2017-06-01T10:20:30">June 1, 2017</time></div><p>Body</p></li>"#,
                r#"<li><div class="draft-title"><a href="" aria-label="(no title)">(no title)</a><time datetime="2017-06-01T10:20:30">June 1, 2017</time></div></li>"#,
            )
        );
    }

    #[test]
    fn test_empty_collection_hides_view() {
        let h = harness();
        h.collection.reset(DraftPage { items: vec![], has_more: true });
        assert_eq!(h.surface.visible.get(), Some(false));
        assert_eq!(h.surface.view_more_visible.get(), Some(true));
        assert_eq!(h.surface.body(), "");
    }

    #[test]
    fn test_render_is_idempotent_and_leaves_drafts_untouched() {
        let h = harness();
        let long = "one two three four five six seven eight nine ten eleven twelve";
        h.collection.reset(DraftPage { items: vec![draft(1, "<Title>", long)], has_more: true });

        h.view.render();
        h.view.render();
        let bodies = h.surface.bodies.borrow();
        assert_eq!(bodies[bodies.len() - 1], bodies[bodies.len() - 2]);
        assert!(bodies[0].contains("<p>one two three four five six seven eight nine ten\u{2026}</p>"));
        assert!(bodies[0].contains("&lt;Title&gt;"));

        let stored = h.collection.get(0).unwrap();
        assert_eq!(stored.content, long);
        assert!(!stored.extra.contains_key("formattedContent"));
    }

    #[test]
    fn test_only_the_display_window_is_rendered() {
        let h = harness();
        let items = (1..=4).map(|i| draft(i, &format!("Draft {}", i), "")).collect();
        h.collection.reset(DraftPage { items, has_more: false });
        h.scheduler.tick();
        h.collection.prepend(draft(9, "Newest", ""));

        let markup = h.view.markup().unwrap();
        assert_eq!(markup.rows.len(), 4);
        assert!(markup.rows[0].contains("Newest"));
        assert!(markup.view_more_visible);
    }

    #[test]
    fn test_new_draft_is_highlighted_and_announced() {
        let h = harness();
        h.collection.reset(DraftPage { items: vec![draft(1, "Old", "")], has_more: false });

        // The add listener attaches a tick after the load.
        h.collection.prepend(draft(2, "Too early", ""));
        assert!(!h.surface.highlighted.get());
        h.scheduler.tick();

        h.collection.prepend(draft(3, "New", ""));
        assert!(h.surface.highlighted.get());
        assert!(h.surface.body().starts_with("<li><div class=\"draft-title\"><a href=\"\" aria-label=\"New\">"));
        assert_eq!(
            *h.announcer.spoken.borrow(),
            vec![(h.settings.messages.new_draft_created.clone(), Politeness::Assertive)]
        );

        h.scheduler.advance(Duration::from_millis(999));
        assert!(h.surface.highlighted.get());
        h.scheduler.advance(Duration::from_millis(1));
        assert!(!h.surface.highlighted.get());
    }

    #[test]
    fn test_repeated_sync_attaches_one_add_listener() {
        let h = harness();
        h.collection.reset(DraftPage::default());
        h.collection.reset(DraftPage::default());
        h.scheduler.tick();
        h.collection.reset(DraftPage::default());
        h.scheduler.tick();

        h.collection.prepend(draft(1, "Once", ""));
        assert_eq!(h.announcer.spoken.borrow().len(), 1);
    }

    #[test]
    fn test_date_formatting() {
        let english: &dyn LocaleDateFormat = &EnglishLongDate;
        assert_eq!(format_draft_date(Some("2017-06-01T23:30:00"), "+02:00", Some(english)), "June 1, 2017");
        assert_eq!(format_draft_date(Some("2017-06-01T23:30:00"), "+02:00", None), "6/1/2017");
        assert_eq!(format_draft_date(Some("2017-06-01T23:30:00Z"), "+02:00", None), "6/1/2017");
        assert_eq!(format_draft_date(Some("yesterday"), "+00:00", None), "");
        assert_eq!(format_draft_date(None, "+00:00", None), "");
    }
}
