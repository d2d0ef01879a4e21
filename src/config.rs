//! Page-level configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::rc::Rc;

use futures_util::task::LocalSpawn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::char_count::{CharCountConfig, CharCountWidget};
use crate::dom::Dom;
use crate::inline_delete::protocol::DeleteTransport;
use crate::inline_delete::{InlineDeleteConfig, InstantDeleteWidget};
use crate::messages::Locale;
use crate::notify::Notifier;
use crate::scanner::{DEFAULT_INSERTION_EVENT, DEFAULT_TEMPLATE_SELECTOR, Scanner};

/// Id of the `<script type="application/json">` element holding the config.
pub const CONFIG_ELEMENT_ID: &str = "formset-widgets-config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid widgets config: {0}")]
    Json(#[from] serde_json::Error),
}

/// The two known instant-delete setups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InlineDeletePreset {
    #[default]
    Standard,
    EmployeeScoped,
}

impl InlineDeletePreset {
    pub fn config(self) -> InlineDeleteConfig {
        match self {
            Self::Standard => InlineDeleteConfig::standard(),
            Self::EmployeeScoped => InlineDeleteConfig::employee_scoped(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetsConfig {
    pub locale: Locale,
    pub template_selector: String,
    pub insertion_event: String,
    pub char_count: CharCountConfig,
    pub inline_delete_preset: InlineDeletePreset,
    /// Replaces the preset entirely when present.
    pub inline_delete: Option<InlineDeleteConfig>,
    /// `log` level filter name, e.g. `"debug"`.
    pub log_level: String,
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            template_selector: DEFAULT_TEMPLATE_SELECTOR.to_owned(),
            insertion_event: DEFAULT_INSERTION_EVENT.to_owned(),
            char_count: CharCountConfig::default(),
            inline_delete_preset: InlineDeletePreset::default(),
            inline_delete: None,
            log_level: "info".to_owned(),
        }
    }
}

impl WidgetsConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn inline_delete_config(&self) -> InlineDeleteConfig {
        self.inline_delete
            .clone()
            .unwrap_or_else(|| self.inline_delete_preset.config())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Scanner with both widgets registered, character count first.
    pub fn scanner<D: Dom>(
        &self,
        dom: D,
        transport: Rc<dyn DeleteTransport>,
        notifier: Rc<dyn Notifier>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Scanner<D> {
        let messages = self.locale.messages();
        Scanner::new(dom)
            .template_selector(self.template_selector.as_str())
            .insertion_event(self.insertion_event.as_str())
            .widget(CharCountWidget::new(self.char_count.clone(), messages.hint))
            .widget(InstantDeleteWidget::new(
                self.inline_delete_config(),
                messages,
                transport,
                notifier,
                spawner,
            ))
    }
}
