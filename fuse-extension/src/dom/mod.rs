//! web-sys side of the extension: everything that touches the live document.

pub mod injector;
pub mod observer;
pub mod scan;
pub mod styles;
pub mod toast;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

/// Every node the extension creates carries this attribute.
pub const OWNER_ATTR: &str = "data-sparc-fuse";
/// Class on every control that a rebuild tears down.
pub const MARKER_CLASS: &str = "sparc-fuse-injected";
pub const FLYOUT_ID: &str = "sparc-fuse-flyout";
pub const TOAST_ID: &str = "sparc-fuse-toast";
pub const STYLE_ID: &str = "sparc-fuse-styles";

/// Create `<tag>` tagged as extension-owned with `role`.
pub(crate) fn owned_element(
    document: &Document,
    tag: &str,
    role: &str,
) -> Result<HtmlElement, JsValue> {
    let element = document.create_element(tag)?;
    element.set_attribute(OWNER_ATTR, role)?;
    element.dyn_into::<HtmlElement>().map_err(JsValue::from)
}

/// True for nodes the extension created, or nodes inside them.
pub(crate) fn is_owned_node(node: &Node) -> bool {
    match node.dyn_ref::<Element>() {
        Some(element) => {
            element.has_attribute(OWNER_ATTR)
                || element
                    .closest(&format!("[{OWNER_ATTR}]"))
                    .ok()
                    .flatten()
                    .is_some()
        }
        None => node
            .parent_element()
            .is_some_and(|parent| is_owned_node(&parent)),
    }
}
