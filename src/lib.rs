//! Client-side widgets for generated admin change forms.
//!
//! Two widgets are attached to the page by a [`Scanner`]:
//! - [`CharCountWidget`] renders a live length hint next to marked text fields.
//! - [`InstantDeleteWidget`] adds a delete button to persisted inline rows that
//!   removes the related record right away instead of on form save.
//!
//! The widgets only talk to the page through the [`Dom`] capability, so the
//! whole attachment protocol runs against `platform::memory::MemoryDom` (feature `memory`) in
//! tests and against the real document in [`platform::browser`].

pub mod char_count;
pub mod config;
pub mod dom;
pub mod hint;
pub mod inline_delete;
pub mod messages;
pub mod notify;
pub mod platform;
pub mod scanner;

pub use char_count::{CharCountConfig, CharCountWidget};
pub use config::{ConfigError, InlineDeletePreset, WidgetsConfig};
pub use dom::{Dom, DomError, NodeSet};
pub use hint::{Hint, LengthBounds};
pub use inline_delete::{InlineDeleteConfig, InstantDeleteWidget};
pub use messages::{Locale, Messages};
pub use notify::{LogNotifier, Notifier};
pub use scanner::{Attachable, ScanReport, Scanner, WidgetError};
