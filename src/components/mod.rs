//! UI Components
//!
//! Leptos components hosting the composer and the draft list.

mod quick_draft_form;
mod draft_list;

pub use quick_draft_form::QuickDraftForm;
pub use draft_list::DraftList;
