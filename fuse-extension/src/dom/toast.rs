use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use web_sys::Document;

use super::{owned_element, TOAST_ID};
use crate::notify::{NotificationSlot, Notifier, Toast, ToastKind};

/// Renders the single notification slot as a fixed-position element.
pub struct DomToaster {
    document: Document,
    slot: Rc<RefCell<NotificationSlot>>,
    // Replacing the timer drops, and so cancels, the previous one.
    expiry: RefCell<Option<Timeout>>,
}

impl DomToaster {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            slot: Rc::new(RefCell::new(NotificationSlot::default())),
            expiry: RefCell::new(None),
        }
    }

    fn render(&self, toast: &Toast) -> Result<(), JsValue> {
        remove_toast(&self.document);

        let element = owned_element(&self.document, "div", "toast")?;
        element.set_id(TOAST_ID);
        element.set_class_name(&format!("sparc-fuse-toast {}", toast.kind.css_class()));
        element.set_attribute("role", "status")?;
        element.set_text_content(Some(&toast.message));

        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        body.append_child(&element)?;
        Ok(())
    }
}

impl Notifier for DomToaster {
    fn notify(&self, message: &str, kind: ToastKind, duration_ms: u32) {
        let toast = self.slot.borrow_mut().show(message, kind, duration_ms).clone();

        if let Err(e) = self.render(&toast) {
            log::error!("failed to show notification '{message}': {e:?}");
        }

        let expiry = toast.duration_ms.map(|ms| {
            let slot = self.slot.clone();
            let document = self.document.clone();
            let generation = toast.generation;
            Timeout::new(ms, move || {
                if slot.borrow_mut().expire(generation) {
                    remove_toast(&document);
                }
            })
        });
        *self.expiry.borrow_mut() = expiry;
    }
}

fn remove_toast(document: &Document) {
    if let Some(existing) = document.get_element_by_id(TOAST_ID) {
        existing.remove();
    }
}
