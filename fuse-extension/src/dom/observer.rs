use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, MutationObserver, MutationObserverInit, MutationRecord, Node, NodeList,
};

use super::{is_owned_node, OWNER_ATTR};
use crate::debounce::Debouncer;
use crate::reconcile::HostMutations;

/// Owned nodes that come and go on their own without the host's involvement.
const TRANSIENT_ROLES: [&str; 2] = ["toast", "save"];

type Callback = Rc<RefCell<Option<Box<dyn FnMut()>>>>;

/// Debounced `childList` observation of `document.body`.
pub struct MutationHost {
    document: Document,
    observation: RefCell<Option<Observation>>,
}

struct Observation {
    observer: MutationObserver,
    pending: Rc<RefCell<PendingRebuild>>,
    callback: Callback,
}

#[derive(Default)]
struct PendingRebuild {
    debouncer: Debouncer,
    timer: Option<Timeout>,
}

impl MutationHost {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            observation: RefCell::new(None),
        }
    }

    /// Stop observing and release the registered callback.
    pub fn disconnect(&self) {
        if let Some(observation) = self.observation.borrow_mut().take() {
            observation.observer.disconnect();
            observation.pending.borrow_mut().timer = None;
            observation.callback.borrow_mut().take();
        }
    }

    fn observe(&self, callback: Box<dyn FnMut()>, debounce_ms: u32) -> Result<(), JsValue> {
        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;

        let pending = Rc::new(RefCell::new(PendingRebuild::default()));
        let callback: Callback = Rc::new(RefCell::new(Some(callback)));

        let on_mutations = {
            let pending = pending.clone();
            let callback = callback.clone();
            Closure::wrap(Box::new(move |records: Array, observer: MutationObserver| {
                if !records.iter().any(|record| is_host_record(&record)) {
                    return;
                }

                let generation = pending.borrow_mut().debouncer.touch();
                let pending_for_timer = pending.clone();
                let callback = callback.clone();
                let timer = Timeout::new(debounce_ms, move || {
                    let settled = pending_for_timer.borrow().debouncer.settle(generation);
                    if !settled {
                        return;
                    }
                    if let Some(rebuild) = callback.borrow_mut().as_mut() {
                        rebuild();
                    }
                    // Drop the records the rebuild produced before they are delivered.
                    let discarded = observer.take_records().length();
                    log::trace!("discarded {discarded} self-inflicted mutation records");
                });
                pending.borrow_mut().timer = Some(timer);
            }) as Box<dyn FnMut(Array, MutationObserver)>)
        };

        let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&body, &init)?;

        // Observation lasts for the page lifetime; `disconnect` empties the
        // callback slot instead of freeing the closure.
        on_mutations.forget();
        self.disconnect();
        *self.observation.borrow_mut() = Some(Observation {
            observer,
            pending,
            callback,
        });
        Ok(())
    }
}

impl HostMutations for MutationHost {
    fn on_host_mutation(&self, callback: Box<dyn FnMut()>, debounce_ms: u32) {
        if let Err(e) = self.observe(callback, debounce_ms) {
            log::error!("failed to observe host mutations: {e:?}");
        }
    }
}

/// True when the record may have changed what the controls attach to.
///
/// Changes inside extension-owned nodes never count, and neither do toasts
/// or save anchors appearing and disappearing. Removal of an injected
/// control does count: the host wiped it and it has to come back.
fn is_host_record(record: &JsValue) -> bool {
    let Some(record) = record.dyn_ref::<MutationRecord>() else {
        return false;
    };
    if record.target().is_some_and(|target| is_owned_node(&target)) {
        return false;
    }
    let added = nodes(&record.added_nodes());
    let removed = nodes(&record.removed_nodes());
    if added.is_empty() && removed.is_empty() {
        return true;
    }
    added.iter().any(|node| !is_owned_node(node))
        || removed.iter().any(|node| !is_transient_node(node))
}

fn is_transient_node(node: &Node) -> bool {
    let Some(element) = node.dyn_ref::<Element>() else {
        return node
            .parent_element()
            .is_some_and(|parent| is_transient_node(&parent));
    };
    element
        .closest(&transient_selector())
        .ok()
        .flatten()
        .is_some()
}

fn transient_selector() -> String {
    TRANSIENT_ROLES
        .iter()
        .map(|role| format!("[{OWNER_ATTR}='{role}']"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn nodes(list: &NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}
