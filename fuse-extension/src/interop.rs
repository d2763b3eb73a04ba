use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Blob, HtmlAnchorElement, Url};

use crate::client::ArtifactSink;
use crate::dom::OWNER_ATTR;
use crate::error::ConversionError;

/// Current page scroll offsets `(x, y)`
pub fn scroll_offsets() -> (f64, f64) {
    let Some(window) = window() else {
        return (0.0, 0.0);
    };
    (
        window.scroll_x().unwrap_or(0.0),
        window.scroll_y().unwrap_or(0.0),
    )
}

/// Offer `bytes` to the user as a download named `filename`.
///
/// Goes through a temporary object URL and a synthetic `<a download>` click;
/// both are released before returning.
pub fn save_bytes(bytes: &[u8], filename: &str) -> Result<(), JsValue> {
    let window = window().ok_or_else(|| JsValue::from_str("no global `window` exists"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;

    let parts = Array::of1(&Uint8Array::from(bytes));
    let blob = Blob::new_with_u8_array_sequence(&parts)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_attribute(OWNER_ATTR, "save")?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();

    Url::revoke_object_url(&url)
}

/// Saves artifacts through the browser's download machinery.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSaver;

impl ArtifactSink for BrowserSaver {
    fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<(), ConversionError> {
        save_bytes(bytes, suggested_name).map_err(|e| ConversionError::Save(format!("{e:?}")))
    }
}
