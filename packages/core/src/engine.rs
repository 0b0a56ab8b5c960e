//! # Instantiation Engine
//!
//! Computes the instantiate / retain / destroy delta between an element's
//! desired trait names and its live bindings, and applies it.
//!
//! ```text
//! desired:  [highlight, glow]        live: [highlight, fade]
//!                 ↓                            ↓
//!      retain highlight · destroy fade · construct glow
//! ```
//!
//! Callback failures are isolated per (element, trait name): they land in the
//! returned [`ReconcileReport`] and processing continues.

use std::rc::Rc;

use tracing::{trace, warn};

use crate::error::LifecycleError;
use crate::host::Element;
use crate::registry::TraitRegistry;
use crate::store::{InstanceStore, TraitBinding};
use crate::tokenize::parse_trait_names;

/// Outcome of one engine operation
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Names constructed, in construction order
    pub instantiated: Vec<String>,
    /// Names torn down, in teardown order
    pub destroyed: Vec<String>,
    pub errors: Vec<LifecycleError>,
}

impl ReconcileReport {
    /// Nothing was constructed or torn down and nothing failed
    pub fn is_noop(&self) -> bool {
        self.instantiated.is_empty() && self.destroyed.is_empty() && self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ReconcileReport) {
        self.instantiated.extend(other.instantiated);
        self.destroyed.extend(other.destroyed);
        self.errors.extend(other.errors);
    }
}

pub struct InstantiationEngine<E: Element> {
    registry: Rc<TraitRegistry<E>>,
    store: InstanceStore<E>,
}

impl<E: Element> InstantiationEngine<E> {
    pub fn new(registry: Rc<TraitRegistry<E>>) -> Self {
        Self {
            registry,
            store: InstanceStore::new(),
        }
    }

    pub fn store(&self) -> &InstanceStore<E> {
        &self.store
    }

    pub fn registry(&self) -> &Rc<TraitRegistry<E>> {
        &self.registry
    }

    /// Bring the element's bindings in line with `desired`: tear down names no
    /// longer listed, construct listed names that are not yet bound.
    pub fn reconcile(&mut self, element: &E, desired: &[String]) -> ReconcileReport {
        self.apply(element, desired, true)
    }

    /// Construct every trait named by the element's attribute that is not
    /// bound yet. Never tears anything down, so calling it again is a no-op.
    pub fn instantiate_fresh(&mut self, element: &E, attribute: &str) -> ReconcileReport {
        let desired = parse_trait_names(element.attribute(attribute).as_deref());
        self.apply(element, &desired, false)
    }

    /// Tear down every binding of the element and forget it
    pub fn destroy_all(&mut self, element: &E) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for binding in self.store.delete(element) {
            teardown(binding, &mut report);
        }
        report
    }

    /// Tear down bindings of elements that were reclaimed without a removal
    /// notification ever reaching the engine
    pub fn sweep(&mut self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for binding in self.store.sweep() {
            teardown(binding, &mut report);
        }
        report
    }

    /// Tear down every binding in the store
    pub fn destroy_everything(&mut self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for binding in self.store.drain() {
            teardown(binding, &mut report);
        }
        report
    }

    fn apply(&mut self, element: &E, desired: &[String], prune: bool) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut bindings = self.store.delete(element);

        if prune {
            let (keep, stale): (Vec<_>, Vec<_>) = bindings
                .into_iter()
                .partition(|binding| desired.iter().any(|name| name == binding.name()));

            for binding in stale {
                teardown(binding, &mut report);
            }
            bindings = keep;
        }

        for (index, name) in desired.iter().enumerate() {
            if desired[..index].contains(name) {
                continue;
            }
            if bindings.iter().any(|binding| binding.name() == name) {
                continue;
            }

            let Some(constructor) = self.registry.lookup(name) else {
                trace!(trait_name = %name, element = ?element, "Skipping unregistered trait");
                continue;
            };

            match constructor(element) {
                Ok(instance) => {
                    bindings.push(TraitBinding::new(name.as_str(), instance));
                    report.instantiated.push(name.clone());
                }
                Err(cause) => {
                    warn!(trait_name = %name, element = ?element, error = %cause, "Trait constructor failed");
                    report.errors.push(LifecycleError::Construction {
                        trait_name: name.clone(),
                        cause,
                    });
                }
            }
        }

        self.store.put(element, bindings);
        report
    }
}

/// Run the teardown hook. The binding is gone afterwards whether or not the
/// hook succeeds.
fn teardown(binding: TraitBinding, report: &mut ReconcileReport) {
    let (name, instance) = binding.into_parts();

    if let Err(cause) = instance.disconnected() {
        warn!(trait_name = %name, error = %cause, "Trait teardown failed");
        report.errors.push(LifecycleError::Teardown {
            trait_name: name.clone(),
            cause,
        });
    }
    report.destroyed.push(name);
}
