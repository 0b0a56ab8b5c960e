//! Host trait implementations over `web_sys`

use std::cell::Cell;
use std::fmt;

use dom_traits::{Document, Element, WeakElement};
use js_sys::Reflect;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Node, NodeList};

/// Expando property carrying an element's identity key
const KEY_PROPERTY: &str = "__domTraitsKey";

thread_local! {
    // Keys travel through a JS number, exact up to 2^53
    static NEXT_KEY: Cell<u64> = const { Cell::new(1) };
}

#[derive(Clone)]
pub struct BrowserElement(web_sys::Element);

impl BrowserElement {
    pub fn new(element: web_sys::Element) -> Self {
        Self(element)
    }

    /// `None` for text, comment and other non-element nodes
    pub fn from_node(node: Node) -> Option<Self> {
        node.dyn_into::<web_sys::Element>().ok().map(Self)
    }

    pub fn as_element(&self) -> &web_sys::Element {
        &self.0
    }
}

impl fmt::Debug for BrowserElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0.id();
        if id.is_empty() {
            write!(f, "<{}>", self.0.tag_name().to_lowercase())
        } else {
            write!(f, "<{}#{}>", self.0.tag_name().to_lowercase(), id)
        }
    }
}

/// Browsers give Rust no weak reference usable as a map key, so the store
/// keeps elements alive until a removal record releases them.
#[derive(Clone)]
pub struct RetainedElement(web_sys::Element);

impl WeakElement for RetainedElement {
    type Element = BrowserElement;

    fn upgrade(&self) -> Option<BrowserElement> {
        Some(BrowserElement(self.0.clone()))
    }
}

impl Element for BrowserElement {
    type Key = u64;
    type Weak = RetainedElement;

    fn key(&self) -> u64 {
        let property = JsValue::from_str(KEY_PROPERTY);
        let existing = Reflect::get(&self.0, &property)
            .ok()
            .and_then(|value| value.as_f64());
        if let Some(key) = existing {
            return key as u64;
        }

        let key = NEXT_KEY.with(|next| {
            let key = next.get();
            next.set(key + 1);
            key
        });
        // Elements are ordinary extensible objects; a failed write only costs
        // identity stability for this element
        let _ = Reflect::set(&self.0, &property, &JsValue::from_f64(key as f64));
        key
    }

    fn downgrade(&self) -> RetainedElement {
        RetainedElement(self.0.clone())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }

    fn descendants_with_attribute(&self, name: &str) -> Vec<BrowserElement> {
        let selector = attribute_selector(name);
        query_or_warn(&selector, self.0.query_selector_all(&selector))
    }
}

#[derive(Clone)]
pub struct BrowserDocument(web_sys::Document);

impl BrowserDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self(document)
    }

    pub fn as_document(&self) -> &web_sys::Document {
        &self.0
    }
}

impl Document for BrowserDocument {
    type Element = BrowserElement;

    fn elements_with_attribute(&self, name: &str) -> Vec<BrowserElement> {
        let selector = attribute_selector(name);
        query_or_warn(&selector, self.0.query_selector_all(&selector))
    }
}

/// `[name]`, with the namespace colon escaped so `xlink:traits` still parses
fn attribute_selector(name: &str) -> String {
    format!("[{}]", name.replace(':', "\\:"))
}

/// A rejected selector matches nothing, but is logged instead of dropped
fn query_or_warn(selector: &str, result: Result<NodeList, JsValue>) -> Vec<BrowserElement> {
    match result {
        Ok(list) => elements(list),
        Err(error) => {
            warn!(selector, error = ?error, "Selector query failed");
            Vec::new()
        }
    }
}

/// Element nodes of a `NodeList`, in list order
pub(crate) fn elements(list: NodeList) -> Vec<BrowserElement> {
    (0..list.length())
        .filter_map(|index| list.get(index))
        .filter_map(BrowserElement::from_node)
        .collect()
}
