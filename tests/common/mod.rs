#![allow(dead_code)]

use std::rc::Rc;

use formset_widgets::inline_delete::protocol::DeleteTransport;
use formset_widgets::platform::memory::{CollectingNotifier, MemoryDom, NodeId, ScriptedTransport};
use formset_widgets::{Dom, Notifier, Scanner, WidgetsConfig};
use futures_executor::LocalPool;
use futures_util::task::LocalSpawn;

pub const CHANGE_PATH: &str = "/admin/content/employee/3/change/";

pub struct Page {
    pub dom: MemoryDom,
    pub scanner: Rc<Scanner<MemoryDom>>,
    pub transport: Rc<ScriptedTransport>,
    pub notifier: Rc<CollectingNotifier>,
    pub pool: LocalPool,
}

impl Page {
    pub fn new(config: &WidgetsConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let dom = MemoryDom::new();
        dom.set_page_path(CHANGE_PATH);
        dom.set_cookies("sessionid=s3ss10n; csrftoken=t0ken");

        let transport = Rc::new(ScriptedTransport::default());
        let notifier = Rc::new(CollectingNotifier::default());
        let pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

        let scanner = Rc::new(config.scanner(
            dom.clone(),
            Rc::clone(&transport) as Rc<dyn DeleteTransport>,
            Rc::clone(&notifier) as Rc<dyn Notifier>,
            spawner,
        ));
        scanner
            .observe_insertions()
            .expect("memory DOM accepts listeners");

        Self {
            dom,
            scanner,
            transport,
            notifier,
            pool,
        }
    }

    pub fn scan_document(&self) -> formset_widgets::ScanReport {
        self.scanner.scan(&self.dom.document_root())
    }

    /// Lets spawned delete tasks run to completion.
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }
}

pub struct InlineRow {
    pub row: NodeId,
    pub id_input: NodeId,
    pub name_field: NodeId,
    pub delete_cell: NodeId,
    pub checkbox: Option<NodeId>,
}

pub struct AdminForm {
    pub form: NodeId,
    pub title_field: NodeId,
    pub title_help: NodeId,
    pub tbody: NodeId,
    pub persisted: InlineRow,
    pub unsaved: InlineRow,
    pub template: InlineRow,
}

/// A change form with one marked top-level field and a tabular inline with a
/// persisted row, an unsaved extra row and the template row.
pub fn admin_form(dom: &MemoryDom) -> AdminForm {
    let root = dom.document_root();
    let body = dom.element(root, "body", &[]);
    let form = dom.element(body, "form", &[("id", "employee_form")]);
    dom.element(form, "input", &[("type", "hidden"), ("name", "employee"), ("value", "3")]);

    let title_row = dom.element(form, "div", &[("class", "form-row field-title")]);
    let title_field = dom.element(
        title_row,
        "input",
        &[
            ("type", "text"),
            ("name", "title"),
            ("data-charcount", ""),
            ("data-min", "5"),
            ("data-max", "10"),
            ("value", "ab"),
        ],
    );
    let title_help = dom.element(title_row, "div", &[("class", "help")]);

    let table = dom.element(form, "table", &[]);
    let tbody = dom.element(table, "tbody", &[]);
    let persisted = inline_row(dom, tbody, "documents-0", "7", &["form-row", "has_original"]);
    let unsaved = inline_row(dom, tbody, "documents-1", "", &["form-row"]);
    let template = inline_row(dom, tbody, "documents-__prefix__", "", &["form-row", "empty-form"]);

    AdminForm {
        form,
        title_field,
        title_help,
        tbody,
        persisted,
        unsaved,
        template,
    }
}

/// Tabular inline row appended to `tbody`.
pub fn inline_row(dom: &MemoryDom, tbody: NodeId, prefix: &str, id: &str, classes: &[&str]) -> InlineRow {
    let class = classes.join(" ");
    let row = dom.detached("tr", &[("class", class.as_str()), ("id", prefix)]);
    let nodes = fill_row(dom, row, prefix, id);
    dom.append_child(&tbody, &row).expect("row appended");
    nodes
}

/// Cells of a tabular inline row: hidden id, a marked name field, delete cell.
pub fn fill_row(dom: &MemoryDom, row: NodeId, prefix: &str, id: &str) -> InlineRow {
    let original = dom.element(row, "td", &[("class", "original")]);
    let id_input = dom.element(
        original,
        "input",
        &[("type", "hidden"), ("name", format!("{prefix}-id").as_str()), ("value", id)],
    );
    let name_cell = dom.element(row, "td", &[("class", "field-name")]);
    let name_field = dom.element(
        name_cell,
        "input",
        &[("type", "text"), ("name", format!("{prefix}-name").as_str()), ("data-charcount", ""), ("data-max", "19")],
    );
    let delete_cell = dom.element(row, "td", &[("class", "delete")]);
    let checkbox = (!id.is_empty()).then(|| {
        dom.element(
            delete_cell,
            "input",
            &[("type", "checkbox"), ("name", format!("{prefix}-DELETE").as_str())],
        )
    });
    InlineRow {
        row,
        id_input,
        name_field,
        delete_cell,
        checkbox,
    }
}

pub fn delete_buttons(dom: &MemoryDom, root: NodeId) -> usize {
    dom.count(root, "button.js-inline-delete-now")
}

pub fn hints(dom: &MemoryDom, root: NodeId) -> usize {
    dom.count(root, ".char-count-hint")
}
