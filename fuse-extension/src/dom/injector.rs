//! Attaches conversion controls to the host page.
//!
//! Nothing injected is assumed to survive a host re-render: `rebuild` tears
//! down every marked control and recreates the set from a fresh scan. The
//! shared flyout and the document click handler are created once and reused.

use std::cell::RefCell;
use std::rc::Rc;

use shared_types::DstFormat;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent};

use super::scan::scan_document;
use super::{owned_element, FLYOUT_ID, MARKER_CLASS};
use crate::config::FuseConfig;
use crate::flyout::{anchor_position, AnchorRect, FlyoutState, FlyoutTransition};
use crate::interop::scroll_offsets;
use crate::matcher::match_resources;
use crate::plan::{plan_controls, DatasetControl, FileControl};
use crate::resource::{ConversionRequest, ResourceRef};

/// Starts one conversion round trip; must not block.
pub type Dispatch = Rc<dyn Fn(ConversionRequest)>;

type ClickHandler = Closure<dyn FnMut(MouseEvent)>;

pub struct DomInjector {
    document: Document,
    config: FuseConfig,
    state: Rc<RefCell<FlyoutState>>,
    dispatch: Dispatch,
    /// Listeners of the current control set, dropped on the next rebuild
    control_handlers: RefCell<Vec<ClickHandler>>,
    /// Listeners of the shared flyout's format entries
    flyout_handlers: RefCell<Vec<ClickHandler>>,
    outside_click: ClickHandler,
}

impl DomInjector {
    /// Build the injector and register the document-level click handler.
    pub fn install(
        document: Document,
        config: FuseConfig,
        dispatch: Dispatch,
    ) -> Result<Rc<Self>, JsValue> {
        let state = Rc::new(RefCell::new(FlyoutState::default()));

        let outside_click = {
            let state = state.clone();
            let document = document.clone();
            Closure::wrap(Box::new(move |event: MouseEvent| {
                let inside = event
                    .target()
                    .and_then(|target| target.dyn_into::<Element>().ok())
                    .and_then(|target| {
                        target
                            .closest(&format!(".{MARKER_CLASS}, #{FLYOUT_ID}"))
                            .ok()
                            .flatten()
                    })
                    .is_some();
                if !inside && state.borrow().is_open() {
                    state.borrow_mut().close();
                    hide_flyout(&document);
                }
            }) as Box<dyn FnMut(MouseEvent)>)
        };
        document.add_event_listener_with_callback_and_bool(
            "click",
            outside_click.as_ref().unchecked_ref(),
            true,
        )?;

        Ok(Rc::new(Self {
            document,
            config,
            state,
            dispatch,
            control_handlers: RefCell::new(Vec::new()),
            flyout_handlers: RefCell::new(Vec::new()),
            outside_click,
        }))
    }

    pub fn flyout_state(&self) -> FlyoutState {
        self.state.borrow().clone()
    }

    /// Replace all injected controls with ones matching the current page.
    ///
    /// Returns how many controls were attached. A control that cannot be
    /// attached is logged and skipped; the rest still go in.
    pub fn rebuild(&self) -> usize {
        self.remove_controls();

        if let Err(e) = self.ensure_flyout() {
            log::error!("failed to create flyout: {e:?}");
        }

        let page = scan_document(&self.document);
        let matched = match_resources(&page.snapshot, &self.config);
        let plan = plan_controls(&matched);

        let mut attached = 0;
        if let Some(dataset) = &plan.dataset {
            match page.labels.get(dataset.label_index) {
                Some(label) => match self.attach_dataset_control(label, dataset) {
                    Ok(()) => attached += 1,
                    Err(e) => log::warn!("failed to attach dataset control: {e:?}"),
                },
                None => log::warn!("dataset label {} vanished", dataset.label_index),
            }
        }

        for control in &plan.files {
            let Some(Some(cell)) = page.cells.get(control.anchor_index) else {
                continue;
            };
            match self.attach_file_control(cell, control) {
                Ok(()) => attached += 1,
                Err(e) => log::warn!("failed to attach {}: {e:?}", control.element_id),
            }
        }

        log::debug!(
            "rebuild attached {attached} of {} planned controls",
            plan.len()
        );
        attached
    }

    fn remove_controls(&self) {
        if let Ok(list) = self
            .document
            .query_selector_all(&format!(".{MARKER_CLASS}"))
        {
            for node in (0..list.length()).filter_map(|i| list.item(i)) {
                if let Ok(element) = node.dyn_into::<Element>() {
                    element.remove();
                }
            }
        }
        self.control_handlers.borrow_mut().clear();
    }

    fn attach_dataset_control(
        &self,
        label: &Element,
        control: &DatasetControl,
    ) -> Result<(), JsValue> {
        let strip = owned_element(&self.document, "span", "dataset")?;
        strip.set_class_name(&format!("{MARKER_CLASS} sparc-fuse-dataset"));

        for format in control.formats {
            let button = owned_element(&self.document, "button", "dataset-format")?;
            button.set_class_name("sparc-fuse-control");
            button.set_attribute("type", "button")?;
            button.set_attribute("data-format", format.as_str())?;
            button.set_text_content(Some(format.label()));

            let handler = self.dataset_handler(control.resource.clone(), format);
            button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
            self.control_handlers.borrow_mut().push(handler);
            strip.append_child(&button)?;
        }

        label.insert_adjacent_element("afterend", &strip)?;
        Ok(())
    }

    fn dataset_handler(&self, resource: ResourceRef, format: DstFormat) -> ClickHandler {
        let dispatch = self.dispatch.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            dispatch(ConversionRequest::new(resource.clone(), format));
        }) as Box<dyn FnMut(MouseEvent)>)
    }

    fn attach_file_control(&self, cell: &Element, control: &FileControl) -> Result<(), JsValue> {
        let button = owned_element(&self.document, "button", "file")?;
        button.set_id(&control.element_id);
        button.set_class_name(&format!("{MARKER_CLASS} sparc-fuse-control"));
        button.set_attribute("type", "button")?;
        button.set_attribute("aria-haspopup", "menu")?;
        button.set_title("Convert and download");
        button.set_text_content(Some("Convert"));

        let state = self.state.clone();
        let document = self.document.clone();
        let resource = control.resource.clone();
        let handler = Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            let Some(opener) = event
                .current_target()
                .and_then(|target| target.dyn_into::<Element>().ok())
            else {
                return;
            };
            let transition = state.borrow_mut().toggle(resource.clone());
            match transition {
                FlyoutTransition::Opened => open_flyout_at(&document, &opener),
                FlyoutTransition::Closed => hide_flyout(&document),
            }
        }) as Box<dyn FnMut(MouseEvent)>);

        button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
        self.control_handlers.borrow_mut().push(handler);
        cell.append_child(&button)?;
        Ok(())
    }

    /// Create the shared flyout if the document does not have it.
    ///
    /// A host re-render can wipe it; a fresh flyout starts closed.
    fn ensure_flyout(&self) -> Result<(), JsValue> {
        if self.document.get_element_by_id(FLYOUT_ID).is_some() {
            return Ok(());
        }

        let flyout = owned_element(&self.document, "div", "flyout")?;
        flyout.set_id(FLYOUT_ID);
        flyout.set_class_name("sparc-fuse-flyout");
        flyout.set_attribute("role", "menu")?;

        let mut handlers = Vec::with_capacity(DstFormat::ALL.len());
        for format in DstFormat::ALL {
            let entry = owned_element(&self.document, "button", "flyout-format")?;
            entry.set_attribute("type", "button")?;
            entry.set_attribute("role", "menuitem")?;
            entry.set_attribute("data-format", format.as_str())?;
            entry.set_text_content(Some(format.label()));

            let handler = self.flyout_handler(format);
            entry.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
            handlers.push(handler);
            flyout.append_child(&entry)?;
        }

        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        body.append_child(&flyout)?;

        self.state.borrow_mut().close();
        *self.flyout_handlers.borrow_mut() = handlers;
        Ok(())
    }

    fn flyout_handler(&self, format: DstFormat) -> ClickHandler {
        let state = self.state.clone();
        let document = self.document.clone();
        let dispatch = self.dispatch.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            let request = state.borrow().resolve(format);
            state.borrow_mut().close();
            hide_flyout(&document);
            match request {
                Some(request) => dispatch(request),
                None => log::debug!("{format} chosen with no active resource"),
            }
        }) as Box<dyn FnMut(MouseEvent)>)
    }
}

impl Drop for DomInjector {
    fn drop(&mut self) {
        let _ = self.document.remove_event_listener_with_callback_and_bool(
            "click",
            self.outside_click.as_ref().unchecked_ref(),
            true,
        );
        self.remove_controls();
        if let Some(flyout) = self.document.get_element_by_id(FLYOUT_ID) {
            flyout.remove();
        }
    }
}

fn flyout_element(document: &Document) -> Option<HtmlElement> {
    document
        .get_element_by_id(FLYOUT_ID)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
}

fn open_flyout_at(document: &Document, opener: &Element) {
    let Some(flyout) = flyout_element(document) else {
        log::warn!("flyout missing; waiting for the next rebuild");
        return;
    };
    let rect = opener.get_bounding_client_rect();
    let (scroll_x, scroll_y) = scroll_offsets();
    let position = anchor_position(
        AnchorRect {
            left: rect.left(),
            bottom: rect.bottom(),
        },
        scroll_x,
        scroll_y,
    );

    set_flyout_style(
        &flyout,
        &[
            ("left", &format!("{}px", position.left)),
            ("top", &format!("{}px", position.top)),
            ("display", "block"),
        ],
    );
}

fn hide_flyout(document: &Document) {
    if let Some(flyout) = flyout_element(document) {
        set_flyout_style(&flyout, &[("display", "none")]);
    }
}

fn set_flyout_style(flyout: &HtmlElement, properties: &[(&str, &str)]) {
    let style = flyout.style();
    for (name, value) in properties {
        if let Err(e) = style.set_property(name, value) {
            log::debug!("failed to set flyout {name}: {e:?}");
        }
    }
}
