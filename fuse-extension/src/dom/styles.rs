use wasm_bindgen::prelude::*;
use web_sys::Document;

use super::{owned_element, STYLE_ID};

pub const FUSE_STYLES: &str = r#"
/* Per-file control */
.sparc-fuse-control {
    display: inline-flex;
    align-items: center;
    justify-content: center;
    margin-left: 0.5rem;
    padding: 0.125rem 0.5rem;
    font-size: 0.75rem;
    color: #ffffff;
    background: #3498db;
    border: none;
    border-radius: 3px;
    cursor: pointer;
}

.sparc-fuse-control:hover,
.sparc-fuse-control:focus {
    background: #2980b9;
}

/* Whole-dataset format strip */
.sparc-fuse-dataset {
    display: inline-flex;
    gap: 0.25rem;
    margin-left: 0.5rem;
    vertical-align: middle;
}

/* Shared flyout */
.sparc-fuse-flyout {
    display: none;
    position: absolute;
    z-index: 1000;
    min-width: 120px;
    background: #f1f1f1;
    box-shadow: 0 8px 16px 0 rgba(0, 0, 0, 0.2);
}

.sparc-fuse-flyout button {
    display: block;
    width: 100%;
    padding: 0.5rem 1rem;
    text-align: left;
    color: #000000;
    background: transparent;
    border: none;
    cursor: pointer;
}

.sparc-fuse-flyout button:hover {
    background: #dddddd;
}

/* Status toast */
.sparc-fuse-toast {
    position: fixed;
    right: 1rem;
    bottom: 1rem;
    z-index: 1001;
    max-width: 360px;
    padding: 0.75rem 1rem;
    border-radius: 4px;
    color: #ffffff;
    font-size: 0.875rem;
    box-shadow: 0 4px 12px rgba(0, 0, 0, 0.25);
}

.sparc-fuse-toast--success { background: #198754; }
.sparc-fuse-toast--info    { background: #0d6efd; }
.sparc-fuse-toast--warning { background: #b58100; }
.sparc-fuse-toast--danger  { background: #dc3545; }
"#;

/// Add the extension stylesheet to `<head>` unless it is already there.
pub fn install(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }
    let style = owned_element(document, "style", "styles")?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(FUSE_STYLES));

    match document.head() {
        Some(head) => head.append_child(&style)?,
        None => document
            .document_element()
            .ok_or_else(|| JsValue::from_str("document has no root element"))?
            .append_child(&style)?,
    };
    Ok(())
}
