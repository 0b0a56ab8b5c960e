//! Conversions between JavaScript values and the lifecycle core

use anyhow::anyhow;
use dom_traits::{BatchReport, MutationRecord, TraitInstance};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use crate::dom::{elements, BrowserElement};

/// Instance of a JavaScript trait class
pub struct JsTraitInstance {
    instance: JsValue,
}

impl TraitInstance for JsTraitInstance {
    fn disconnected(self: Box<Self>) -> anyhow::Result<()> {
        let callback = Reflect::get(&self.instance, &JsValue::from_str("disconnectedCallback"))
            .map_err(js_error)?;

        if let Some(callback) = callback.dyn_ref::<Function>() {
            callback.call0(&self.instance).map_err(js_error)?;
        }
        Ok(())
    }
}

/// Constructor calling `new Class(element)`
pub fn constructor_from_js(
    class: Function,
) -> impl Fn(&BrowserElement) -> anyhow::Result<Box<dyn TraitInstance>> + 'static {
    move |element: &BrowserElement| {
        let args = Array::of1(element.as_element());
        let instance = Reflect::construct(&class, &args).map_err(js_error)?;
        Ok(Box::new(JsTraitInstance { instance }) as Box<dyn TraitInstance>)
    }
}

/// Thrown values become `anyhow` errors carrying their message
pub fn js_error(value: JsValue) -> anyhow::Error {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return anyhow!("{}", String::from(error.message()));
    }
    match value.as_string() {
        Some(message) => anyhow!(message),
        None => anyhow!("{:?}", value),
    }
}

/// Translate observer records. A `childList` record yields its added nodes,
/// then its removed nodes; non-element nodes are dropped.
pub fn convert_records(records: &Array) -> Vec<MutationRecord<BrowserElement>> {
    records
        .iter()
        .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
        .flat_map(|record| convert_record(&record))
        .collect()
}

fn convert_record(record: &web_sys::MutationRecord) -> Vec<MutationRecord<BrowserElement>> {
    match record.type_().as_str() {
        "attributes" => record
            .target()
            .and_then(BrowserElement::from_node)
            .map(|target| {
                vec![MutationRecord::AttributeChanged {
                    target,
                    attribute_name: record.attribute_name().unwrap_or_default(),
                    old_value: record.old_value(),
                }]
            })
            .unwrap_or_default(),
        "childList" => {
            let added = elements(record.added_nodes())
                .into_iter()
                .map(MutationRecord::added);
            let removed = elements(record.removed_nodes())
                .into_iter()
                .map(MutationRecord::removed);
            added.chain(removed).collect()
        }
        _ => Vec::new(),
    }
}

/// Report isolated callback failures on the console
pub fn report_errors(reports: &[BatchReport]) {
    for error in reports.iter().flat_map(|report| report.errors.iter()) {
        web_sys::console::error_1(&JsValue::from_str(&error.to_string()));
    }
}
