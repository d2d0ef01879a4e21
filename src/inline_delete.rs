//! Instant deletion of persisted inline rows.
//!
//! Rows of a tabular inline normally get deleted only when the whole change
//! form is saved. This widget replaces the native "delete" checkbox of every
//! persisted row with a button that calls a dedicated endpoint right away and,
//! once the server acknowledges, checks the hidden checkbox and retires the row.
//! Rows without a persisted id (including the template row) are left alone.

pub mod endpoint;
pub mod protocol;

use std::rc::Rc;

use futures_util::task::{LocalSpawn, LocalSpawnExt};
use serde::{Deserialize, Serialize};

use crate::dom::{Dom, DomError};
use crate::messages::Messages;
use crate::notify::Notifier;
use crate::scanner::{Attachable, WidgetError};

use self::protocol::{DeleteRequest, DeleteTransport};

pub const KIND: &str = "instant-delete";

/// Owning-record id read from the top-level form and sent with the request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryId {
    pub selector: String,
    pub param: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineDeleteConfig {
    pub row_selector: String,
    /// Hidden input holding the persisted record id.
    pub pk_input_selector: String,
    pub delete_cell_selector: String,
    /// Used when the row has no dedicated delete cell; the last match wins.
    pub fallback_cell_selector: String,
    pub checkbox_selector: String,
    pub label_selector: String,
    /// Marker class of the rendered button.
    pub button_class: String,
    pub marked_class: String,
    pub change_event: String,
    pub endpoint_segment: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub secondary_id: Option<SecondaryId>,
    /// Maximum number of response body characters shown on failure.
    pub preview_len: usize,
}

impl InlineDeleteConfig {
    pub fn standard() -> Self {
        Self {
            row_selector: "tr.form-row".to_owned(),
            pk_input_selector: r#"input[type=hidden][name$="-id"]"#.to_owned(),
            delete_cell_selector: "td.delete".to_owned(),
            fallback_cell_selector: "td".to_owned(),
            checkbox_selector: r#"input[type=checkbox][name$="-DELETE"]"#.to_owned(),
            label_selector: "label".to_owned(),
            button_class: "js-inline-delete-now".to_owned(),
            marked_class: "inline-marked-for-delete".to_owned(),
            change_event: "change".to_owned(),
            endpoint_segment: "inline-delete".to_owned(),
            csrf_cookie: "csrftoken".to_owned(),
            csrf_header: "X-CSRFToken".to_owned(),
            secondary_id: None,
            preview_len: 200,
        }
    }

    /// Variant used on pages whose inline rows belong to an employee: the
    /// employee id is posted along with the row id.
    pub fn employee_scoped() -> Self {
        Self {
            button_class: "js-inline-delete-employee".to_owned(),
            secondary_id: Some(SecondaryId {
                selector: r#"input[name="employee"]"#.to_owned(),
                param: "employee_id".to_owned(),
            }),
            ..Self::standard()
        }
    }
}

impl Default for InlineDeleteConfig {
    fn default() -> Self {
        Self::standard()
    }
}

pub struct InstantDeleteWidget {
    config: Rc<InlineDeleteConfig>,
    messages: Messages,
    transport: Rc<dyn DeleteTransport>,
    notifier: Rc<dyn Notifier>,
    spawner: Rc<dyn LocalSpawn>,
}

impl InstantDeleteWidget {
    pub fn new(
        config: InlineDeleteConfig,
        messages: Messages,
        transport: Rc<dyn DeleteTransport>,
        notifier: Rc<dyn Notifier>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            messages,
            transport,
            notifier,
            spawner,
        }
    }

    fn persisted_id<D: Dom>(&self, dom: &D, row: &D::Node) -> Option<String> {
        dom.find_first(row, &self.config.pk_input_selector)
            .map(|input| dom.value(&input))
            .filter(|id| !id.trim().is_empty())
    }

    fn delete_cell<D: Dom>(&self, dom: &D, row: &D::Node) -> Option<D::Node> {
        dom.find_first(row, &self.config.delete_cell_selector)
            .or_else(|| dom.find_all(row, &self.config.fallback_cell_selector).pop())
    }

    /// Hides the native checkbox and its label; both stay in the form.
    fn hide_checkbox<D: Dom>(&self, dom: &D, checkbox: &D::Node) -> Result<(), DomError> {
        if let Some(label) = dom.closest(checkbox, &self.config.label_selector) {
            dom.hide(&label)?;
        }
        dom.hide(checkbox)
    }
}

impl<D: Dom> Attachable<D> for InstantDeleteWidget {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn selector(&self) -> &str {
        &self.config.row_selector
    }

    fn accepts(&self, dom: &D, row: &D::Node) -> bool {
        self.persisted_id(dom, row).is_some()
    }

    fn bind(&self, dom: &D, row: &D::Node) -> Result<(), WidgetError> {
        let row_id = self
            .persisted_id(dom, row)
            .ok_or_else(|| WidgetError::MissingElement(self.config.pk_input_selector.clone()))?;
        let cell = self
            .delete_cell(dom, row)
            .ok_or_else(|| WidgetError::MissingElement(self.config.fallback_cell_selector.clone()))?;

        let checkbox = dom.find_first(row, &self.config.checkbox_selector);

        let existing = format!(".{}", self.config.button_class);
        if dom.find_first(&cell, &existing).is_some() {
            log::debug!("[InlineDelete] Row {row_id} already has a delete button");
            if let Some(checkbox) = &checkbox {
                self.hide_checkbox(dom, checkbox)?;
            }
            return Ok(());
        }

        let button = dom.create_element("button")?;
        dom.set_attribute(&button, "type", "button")?;
        dom.toggle_class(&button, "button", true)?;
        dom.toggle_class(&button, &self.config.button_class, true)?;
        dom.set_text(&button, self.messages.delete_button);

        let context = Rc::new(DeleteContext {
            dom: dom.clone(),
            row: row.clone(),
            checkbox: checkbox.clone(),
            row_id,
            config: Rc::clone(&self.config),
            failure_prefix: self.messages.delete_failed,
            transport: Rc::clone(&self.transport),
            notifier: Rc::clone(&self.notifier),
        });
        let spawner = Rc::clone(&self.spawner);
        dom.listen(
            &button,
            "click",
            Box::new(move |_target: D::Node| {
                let task = Rc::clone(&context).run();
                if let Err(error) = spawner.spawn_local(task) {
                    log::error!("[InlineDelete] Failed to start delete task: {error}");
                }
            }),
        )?;

        dom.append_child(&cell, &button)?;
        // The checkbox stays visible unless the button made it into the cell.
        if let Some(checkbox) = &checkbox {
            self.hide_checkbox(dom, checkbox)?;
        }
        Ok(())
    }
}

/// Everything a click on one row's button needs.
struct DeleteContext<D: Dom> {
    dom: D,
    row: D::Node,
    checkbox: Option<D::Node>,
    row_id: String,
    config: Rc<InlineDeleteConfig>,
    failure_prefix: &'static str,
    transport: Rc<dyn DeleteTransport>,
    notifier: Rc<dyn Notifier>,
}

impl<D: Dom> DeleteContext<D> {
    fn request(&self) -> DeleteRequest {
        let config = &self.config;
        let url = endpoint::delete_url(&self.dom.page_path(), &config.endpoint_segment, &self.row_id);
        let token = endpoint::cookie_value(&self.dom.cookies(), &config.csrf_cookie).unwrap_or_default();
        if token.is_empty() {
            log::warn!("[InlineDelete] Cookie `{}` not found", config.csrf_cookie);
        }

        let mut form = Vec::new();
        if let Some(secondary) = &config.secondary_id {
            let root = self.dom.document_root();
            let value = self
                .dom
                .find_first(&root, &secondary.selector)
                .map(|input| self.dom.value(&input))
                .filter(|value| !value.is_empty());
            if let Some(value) = value {
                form.push((secondary.param.clone(), value));
            }
        }

        DeleteRequest {
            url,
            row_id: self.row_id.clone(),
            token_header: config.csrf_header.clone(),
            token,
            form,
        }
    }

    async fn run(self: Rc<Self>) {
        let request = self.request();
        log::info!("[InlineDelete] Deleting row {} via {}", request.row_id, request.url);
        match protocol::perform(self.transport.as_ref(), &request, self.config.preview_len).await {
            Ok(_) => {
                if let Err(error) = self.mark_deleted() {
                    log::error!("[InlineDelete] Row {} deleted but not retired: {error}", self.row_id);
                }
            }
            Err(error) => {
                log::warn!("[InlineDelete] Row {} not deleted: {error}", self.row_id);
                self.notifier
                    .report_error(&format!("{}: {error}", self.failure_prefix));
            }
        }
    }

    /// Mirrors the deletion into the native checkbox so anything observing it
    /// stays in sync, then hides the row.
    fn mark_deleted(&self) -> Result<(), DomError> {
        if let Some(checkbox) = &self.checkbox {
            self.dom.set_checked(checkbox, true);
            self.dom.dispatch(checkbox, &self.config.change_event)?;
        }
        self.dom.toggle_class(&self.row, &self.config.marked_class, true)?;
        self.dom.hide(&self.row)
    }
}
