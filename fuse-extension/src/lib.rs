pub mod api;
pub mod client;
pub mod config;
pub mod debounce;
pub mod dom;
pub mod error;
pub mod flyout;
pub mod interop;
pub mod matcher;
pub mod notify;
pub mod plan;
pub mod reconcile;
pub mod resource;

pub use client::*;
pub use config::*;
pub use error::*;
pub use resource::*;

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::api::HttpTransport;
use crate::dom::injector::{Dispatch, DomInjector};
use crate::dom::observer::MutationHost;
use crate::dom::toast::DomToaster;
use crate::interop::BrowserSaver;
use crate::reconcile::Reconciler;

/// Content-script entry point.
#[cfg_attr(feature = "content-script", wasm_bindgen(start))]
pub fn start() -> Result<(), JsValue> {
    // Initialize logging for WASM
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));

    let config = FuseConfig::from_build_env().unwrap_or_else(|e| {
        log::warn!("Ignoring build-time configuration: {e}");
        FuseConfig::default()
    });

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;

    dom::styles::install(&document)?;

    let toaster = Rc::new(DomToaster::new(document.clone()));
    let client = Rc::new(ConversionClient::new(
        HttpTransport::new(&config),
        toaster,
        BrowserSaver,
        &config,
    ));
    let dispatch: Dispatch = Rc::new(move |request: ConversionRequest| {
        let client = client.clone();
        wasm_bindgen_futures::spawn_local(async move {
            // Outcome is reported through notifications.
            let _ = client.run(request).await;
        });
    });

    let injector = DomInjector::install(document.clone(), config.clone(), dispatch)?;
    let host = MutationHost::new(document);
    Reconciler::start(&host, config.debounce_ms, move || {
        injector.rebuild();
    });

    log::info!(
        "SPARC FUSE controls active (service: {})",
        config.service_base_url
    );
    Ok(())
}
