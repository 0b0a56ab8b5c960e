//! Startup pass over elements that were in the document before observation began

use tracing::{debug, info, instrument};

use crate::engine::InstantiationEngine;
use crate::host::{Document, Element};
use crate::observer::BatchReport;
use crate::tokenize::lists_trait;

/// Instantiate the traits of every element currently carrying `attribute`
#[instrument(skip_all, fields(attribute = %attribute))]
pub fn bootstrap<D: Document>(
    document: &D,
    engine: &mut InstantiationEngine<D::Element>,
    attribute: &str,
) -> BatchReport {
    let mut report = BatchReport::default();

    for element in document.elements_with_attribute(attribute) {
        report.records += 1;
        report.absorb(engine.instantiate_fresh(&element, attribute));
    }

    info!(
        elements = report.records,
        instantiated = report.instantiated,
        errors = report.errors.len(),
        "Bootstrap complete"
    );
    report
}

/// Apply a trait defined after startup to elements that already list it
#[instrument(skip_all, fields(trait_name = %name))]
pub fn apply_retroactively<D: Document>(
    document: &D,
    engine: &mut InstantiationEngine<D::Element>,
    attribute: &str,
    name: &str,
) -> BatchReport {
    let mut report = BatchReport::default();

    for element in document.elements_with_attribute(attribute) {
        if !lists_trait(element.attribute(attribute).as_deref(), name) {
            continue;
        }
        report.records += 1;
        report.absorb(engine.instantiate_fresh(&element, attribute));
    }

    debug!(
        elements = report.records,
        instantiated = report.instantiated,
        "Retroactive definition applied"
    );
    report
}
