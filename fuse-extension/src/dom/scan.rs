//! Reads the live document into a [`PageSnapshot`].

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlAnchorElement, NodeList};

use super::is_owned_node;
use crate::matcher::{AnchorSnapshot, PageSnapshot};

const LABEL_SELECTOR: &str = "button, a, span, label, p, h1, h2, h3, h4";

/// Snapshot plus the elements controls attach to, index-aligned with it.
pub struct ScannedPage {
    pub snapshot: PageSnapshot,
    /// Trailing-cell container per anchor, `None` when the row has none
    pub cells: Vec<Option<Element>>,
    pub labels: Vec<Element>,
}

pub fn scan_document(document: &Document) -> ScannedPage {
    let mut snapshot = PageSnapshot {
        page_url: document
            .location()
            .and_then(|location| location.href().ok())
            .unwrap_or_default(),
        ..PageSnapshot::default()
    };
    let mut cells = Vec::new();
    let mut labels = Vec::new();

    for element in elements(document.query_selector_all("a[href]").ok()) {
        let Ok(anchor) = element.dyn_into::<HtmlAnchorElement>() else {
            continue;
        };
        if is_owned_node(&anchor) {
            continue;
        }
        let row = anchor.closest("tr").ok().flatten();
        let cell = row.as_ref().and_then(trailing_cell);

        snapshot.anchors.push(AnchorSnapshot {
            href: anchor.href(),
            raw_href: anchor.get_attribute("href").unwrap_or_default(),
            in_table_row: row.is_some(),
            has_trailing_cell: cell.is_some(),
        });
        cells.push(cell);
    }

    for element in elements(document.query_selector_all(LABEL_SELECTOR).ok()) {
        if is_owned_node(&element) {
            continue;
        }
        let text = element.text_content().unwrap_or_default();
        snapshot.labels.push(text.trim().to_string());
        labels.push(element);
    }

    ScannedPage {
        snapshot,
        cells,
        labels,
    }
}

/// The row's last `<td>`, or the `div.cell` wrapper table frameworks put in it.
fn trailing_cell(row: &Element) -> Option<Element> {
    let td = row.query_selector("td:last-child").ok().flatten()?;
    let wrapper = td.query_selector("div.cell").ok().flatten();
    Some(wrapper.unwrap_or(td))
}

fn elements(list: Option<NodeList>) -> Vec<Element> {
    let Some(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}
