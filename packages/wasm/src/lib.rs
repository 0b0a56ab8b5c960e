//! Browser binding for `dom-traits`.
//!
//! On load the module observes `document` for `traits` attribute changes and
//! subtree insertions/removals, bootstraps existing elements on
//! `DOMContentLoaded`, and installs `window.defineTrait`:
//!
//! ```js
//! defineTrait("highlight", class {
//!   constructor(element) { element.classList.add("highlighted") }
//!   disconnectedCallback() { console.log("gone") }
//! })
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use dom_traits::{TraitSystem, TraitsConfig};
use js_sys::{Array, Function, Reflect};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MutationObserver, MutationObserverInit};

mod bindings;
mod dom;

pub use dom::{BrowserDocument, BrowserElement};

use bindings::{constructor_from_js, convert_records, report_errors};

type DefineCallback = Closure<dyn Fn(String, Function) -> Result<(), JsValue>>;

struct Runtime {
    system: TraitSystem<BrowserDocument>,
    observer: MutationObserver,
    _on_mutations: Closure<dyn FnMut(Array, MutationObserver)>,
    _define: DefineCallback,
    on_ready: RefCell<Option<Closure<dyn FnMut()>>>,
}

thread_local! {
    static RUNTIME: RefCell<Option<Rc<Runtime>>> = const { RefCell::new(None) };
}

fn runtime() -> Result<Rc<Runtime>, JsValue> {
    RUNTIME
        .with(|slot| slot.borrow().clone())
        .ok_or_else(|| JsValue::from_str("dom-traits is not installed"))
}

impl Runtime {
    fn new(
        window: &web_sys::Window,
        document: &web_sys::Document,
        config: TraitsConfig,
    ) -> Result<Self, JsValue> {
        let system = TraitSystem::new(BrowserDocument::new(document.clone()), config.clone())
            .map_err(|error| JsValue::from(js_sys::Error::new(&error.to_string())))?;

        let on_mutations = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            |records: Array, _observer: MutationObserver| {
                if let Ok(runtime) = runtime() {
                    runtime.deliver(&records);
                }
            },
        );
        let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        options.set_attributes(true);
        options.set_attribute_old_value(true);
        options.set_attribute_filter(&Array::of1(&JsValue::from_str(&config.attribute)));
        observer.observe_with_options(document, &options)?;

        let define: DefineCallback =
            Closure::new(|name: String, class: Function| define_trait(&name, class));
        Reflect::set(window, &JsValue::from_str("defineTrait"), define.as_ref())?;

        debug!(attribute = %config.attribute, "Observing document");

        Ok(Self {
            system,
            observer,
            _on_mutations: on_mutations,
            _define: define,
            on_ready: RefCell::new(None),
        })
    }

    fn deliver(&self, records: &Array) {
        let reports = self.system.deliver(convert_records(records));
        report_errors(&reports);
    }

    fn start(&self) {
        report_errors(&self.system.start());
    }
}

/// Install the observer and `window.defineTrait`. Bootstraps immediately when
/// the document is already parsed, otherwise on `DOMContentLoaded`. Calling it
/// again does nothing.
pub fn install() -> Result<(), JsValue> {
    if RUNTIME.with(|slot| slot.borrow().is_some()) {
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;

    let runtime = Rc::new(Runtime::new(&window, &document, TraitsConfig::default())?);
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime.clone()));

    if document.ready_state() == "loading" {
        let on_ready = Closure::<dyn FnMut()>::new(|| {
            if let Ok(runtime) = crate::runtime() {
                runtime.start();
            }
        });
        document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
        *runtime.on_ready.borrow_mut() = Some(on_ready);
    } else {
        runtime.start();
    }
    Ok(())
}

#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    install()
}

/// Register a trait class under `name`. Throws on an empty or duplicate name.
#[wasm_bindgen(js_name = defineTrait)]
pub fn define_trait(name: &str, class: Function) -> Result<(), JsValue> {
    let runtime = runtime()?;
    runtime
        .system
        .define_trait(name, constructor_from_js(class))
        .map_err(|error| js_sys::Error::new(&error.to_string()).into())
}

/// Process pending mutation records now instead of waiting for the observer
/// callback. Returns the number of records processed.
#[wasm_bindgen(js_name = flushTraits)]
pub fn flush_traits() -> Result<usize, JsValue> {
    let runtime = runtime()?;
    let records = runtime.observer.take_records();
    let count = records.length() as usize;
    runtime.deliver(&records);
    Ok(count)
}
