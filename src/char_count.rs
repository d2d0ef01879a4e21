//! Live character-count hint for marked text fields.
//!
//! A field opts in with a `data-charcount` attribute and may declare
//! `data-min` / `data-max`. The hint is re-rendered on every input event and
//! only ever toggles a presentation class; it never blocks input.

use serde::{Deserialize, Serialize};

use crate::dom::Dom;
use crate::hint::{Hint, LengthBounds};
use crate::messages::HintMessages;
use crate::scanner::{Attachable, WidgetError};

pub const KIND: &str = "char-count";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharCountConfig {
    pub field_selector: String,
    /// Containers searched for an existing help element.
    pub wrapper_selector: String,
    pub help_selector: String,
    pub min_attribute: String,
    pub max_attribute: String,
    pub hint_tag: String,
    pub hint_class: String,
    pub invalid_class: String,
    pub input_event: String,
}

impl Default for CharCountConfig {
    fn default() -> Self {
        Self {
            field_selector: "input[data-charcount], textarea[data-charcount]".to_owned(),
            wrapper_selector: ".form-row, .form-group, .field-box, .flex-container, .form-row .fieldBox"
                .to_owned(),
            help_selector: ".help".to_owned(),
            min_attribute: "data-min".to_owned(),
            max_attribute: "data-max".to_owned(),
            hint_tag: "div".to_owned(),
            hint_class: "char-count-hint".to_owned(),
            invalid_class: "is-invalid".to_owned(),
            input_event: "input".to_owned(),
        }
    }
}

pub struct CharCountWidget {
    config: CharCountConfig,
    messages: HintMessages,
}

impl CharCountWidget {
    pub fn new(config: CharCountConfig, messages: HintMessages) -> Self {
        Self { config, messages }
    }

    fn bounds<D: Dom>(&self, dom: &D, field: &D::Node) -> LengthBounds {
        LengthBounds::from_attributes(
            dom.attribute(field, &self.config.min_attribute).as_deref(),
            dom.attribute(field, &self.config.max_attribute).as_deref(),
        )
    }

    /// Appends the hint into an existing help element of the field's wrapper,
    /// or right after the field when there is none.
    fn place_hint<D: Dom>(&self, dom: &D, field: &D::Node, hint: &D::Node) -> Result<(), WidgetError> {
        let wrapper = dom
            .closest(field, &self.config.wrapper_selector)
            .or_else(|| dom.parent(field));
        let help = wrapper.and_then(|wrapper| dom.find_first(&wrapper, &self.config.help_selector));
        match help {
            Some(help) => dom.append_child(&help, hint)?,
            None => dom.insert_after(field, hint)?,
        }
        Ok(())
    }
}

fn render<D: Dom>(
    dom: &D,
    field: &D::Node,
    hint_node: &D::Node,
    bounds: LengthBounds,
    messages: &HintMessages,
    invalid_class: &str,
) {
    let hint = Hint::compute(&dom.value(field), bounds, messages);
    dom.set_text(hint_node, &hint.text);
    if let Err(error) = dom.toggle_class(hint_node, invalid_class, hint.invalid) {
        log::warn!("[CharCount] {error}");
    }
}

impl<D: Dom> Attachable<D> for CharCountWidget {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn selector(&self) -> &str {
        &self.config.field_selector
    }

    fn bind(&self, dom: &D, field: &D::Node) -> Result<(), WidgetError> {
        let bounds = self.bounds(dom, field);

        let hint_node = dom.create_element(&self.config.hint_tag)?;
        dom.toggle_class(&hint_node, &self.config.hint_class, true)?;
        self.place_hint(dom, field, &hint_node)?;

        render(dom, field, &hint_node, bounds, &self.messages, &self.config.invalid_class);

        let handler = {
            let dom = dom.clone();
            let field = field.clone();
            let messages = self.messages;
            let invalid_class = self.config.invalid_class.clone();
            move |_target: D::Node| {
                render(&dom, &field, &hint_node, bounds, &messages, &invalid_class);
            }
        };
        dom.listen(field, &self.config.input_event, Box::new(handler))?;
        Ok(())
    }
}
