//! Quick Draft Core
//!
//! DOM-free state for the Quick Draft widget:
//! - bridge: action-based RPC over a pluggable transport
//! - template: memoized template compilation
//! - formatting: word/character truncation
//! - composer: the submission state machine
//! - draft_list: reactive rendering of the recent drafts
//!
//! Browser glue (fetch, timers, DOM) lives in the UI crate behind the traits
//! exported here.

pub mod announce;
pub mod bridge;
pub mod collection;
pub mod composer;
pub mod draft_list;
pub mod error;
pub mod events;
pub mod formatting;
pub mod models;
pub mod schedule;
pub mod settings;
pub mod template;

#[cfg(test)]
mod test_support;

pub use announce::{Announcer, Politeness};
pub use bridge::{Method, PendingRequest, RequestOptions, ResponseShape, RpcBridge, RpcCall, Transport, TransportRequest};
pub use collection::{CollectionEvent, DraftCollection, DraftQuery};
pub use formatting::normalize_whitespace;
pub use composer::{Composer, ComposerDeps, ComposerState, FormSurface, Submission};
pub use draft_list::{format_draft_date, DraftListDeps, DraftListMarkup, DraftListView, ListSurface, LocaleDateFormat};
pub use error::{RpcError, SubmitFailure, TemplateError, TransportError, ValidationError};
pub use events::{EventEmitter, ListenerId};
pub use models::{Draft, DraftPage, FormValues, DRAFT_STATUS};
pub use schedule::{ManualScheduler, Scheduler, TaskHandle};
pub use settings::{FormattingSettings, Messages, Settings};
pub use template::{BuiltinTemplates, Template, TemplateCache, TemplateSource};
