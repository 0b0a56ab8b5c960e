//! # Change Observer
//!
//! Routes batches of mutation records to the instantiation engine.
//!
//! ```text
//!            deliver(batch)
//!                 ↓
//!   ┌──────┐  enqueue   ┌──────────┐
//!   │ Idle │ ─────────→ │ Draining │ ──┐ pop job, run to completion
//!   └──────┘ ←──────────└──────────┘ ←─┘
//!             queue empty
//! ```
//!
//! Draining is not reentrant. A batch delivered while a job runs (for
//! example from inside a trait constructor) waits in the queue and is drained
//! by the loop that is already active.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::{debug, instrument};

use crate::engine::{InstantiationEngine, ReconcileReport};
use crate::error::LifecycleError;
use crate::host::Element;
use crate::tokenize::parse_trait_names;

/// One observed change, in the order the host reported it
#[derive(Debug, Clone)]
pub enum MutationRecord<E> {
    /// An attribute changed on `target`. `old_value` is the value before the
    /// first of possibly several coalesced writes; the current value must be
    /// read from the element.
    AttributeChanged {
        target: E,
        attribute_name: String,
        old_value: Option<String>,
    },

    /// `node` and its subtree were inserted
    NodeAdded { node: E },

    /// `node` and its subtree were detached
    NodeRemoved { node: E },
}

impl<E> MutationRecord<E> {
    pub fn attribute(target: E, attribute_name: impl Into<String>, old_value: Option<&str>) -> Self {
        MutationRecord::AttributeChanged {
            target,
            attribute_name: attribute_name.into(),
            old_value: old_value.map(str::to_string),
        }
    }

    pub fn added(node: E) -> Self {
        MutationRecord::NodeAdded { node }
    }

    pub fn removed(node: E) -> Self {
        MutationRecord::NodeRemoved { node }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Idle,
    Draining,
}

/// Summary of one drained job
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records routed (bootstrap and rescans count elements visited)
    pub records: usize,
    pub instantiated: usize,
    pub destroyed: usize,
    pub errors: Vec<LifecycleError>,
}

impl BatchReport {
    pub fn absorb(&mut self, report: ReconcileReport) {
        self.instantiated += report.instantiated.len();
        self.destroyed += report.destroyed.len();
        self.errors.extend(report.errors);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Work that must not interleave with other engine work
pub(crate) enum Job<E> {
    Batch(Vec<MutationRecord<E>>),
    Bootstrap,
    Retroactive(String),
}

pub struct ChangeObserver<E: Element> {
    attribute: String,
    state: Cell<ObserverState>,
    queue: RefCell<VecDeque<Job<E>>>,
}

impl<E: Element> ChangeObserver<E> {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            state: Cell::new(ObserverState::Idle),
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn state(&self) -> ObserverState {
        self.state.get()
    }

    /// Jobs waiting behind the active one
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Queue `job` and, unless a drain is already active, run every queued job
    /// in arrival order. Returns one report per job drained by this call.
    pub(crate) fn submit(
        &self,
        job: Job<E>,
        mut run: impl FnMut(Job<E>) -> BatchReport,
    ) -> Vec<BatchReport> {
        self.queue.borrow_mut().push_back(job);

        if self.state.get() == ObserverState::Draining {
            debug!(pending = self.pending(), "Queued behind active batch");
            return Vec::new();
        }

        let _draining = DrainGuard::enter(&self.state);
        let mut reports = Vec::new();
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(job) = next else {
                break;
            };
            reports.push(run(job));
        }
        reports
    }

    /// Route every record of a batch, in order
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn process_batch(
        &self,
        engine: &mut InstantiationEngine<E>,
        records: Vec<MutationRecord<E>>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for record in records {
            report.records += 1;
            self.route(engine, record, &mut report);
        }
        report
    }

    fn route(
        &self,
        engine: &mut InstantiationEngine<E>,
        record: MutationRecord<E>,
        report: &mut BatchReport,
    ) {
        match record {
            MutationRecord::AttributeChanged {
                target,
                attribute_name,
                old_value,
            } => {
                if attribute_name != self.attribute {
                    return;
                }
                if !target.is_connected() {
                    // Left the tree after its removal was routed
                    debug!(element = ?target, "Attribute changed on detached element");
                    report.absorb(engine.destroy_all(&target));
                    return;
                }
                let current = target.attribute(&self.attribute);
                debug!(
                    element = ?target,
                    old = ?old_value,
                    new = ?current,
                    "Trait attribute changed"
                );
                let desired = parse_trait_names(current.as_deref());
                report.absorb(engine.reconcile(&target, &desired));
            }

            MutationRecord::NodeAdded { node } => {
                if !node.is_connected() {
                    debug!(element = ?node, "Added node already detached");
                    self.release(engine, &node, report);
                    return;
                }
                if node.attribute(&self.attribute).is_some() {
                    report.absorb(engine.instantiate_fresh(&node, &self.attribute));
                }
                for descendant in node.descendants_with_attribute(&self.attribute) {
                    report.absorb(engine.instantiate_fresh(&descendant, &self.attribute));
                }
            }

            MutationRecord::NodeRemoved { node } => self.release(engine, &node, report),
        }
    }

    /// Tear down the node and every descendant carrying the attribute. The
    /// node itself is checked against the store even when its attribute is
    /// already gone.
    fn release(&self, engine: &mut InstantiationEngine<E>, node: &E, report: &mut BatchReport) {
        report.absorb(engine.destroy_all(node));
        for descendant in node.descendants_with_attribute(&self.attribute) {
            report.absorb(engine.destroy_all(&descendant));
        }
    }
}

/// Holds the observer in `Draining` and restores `Idle` on drop, so a
/// panicking callback does not leave the queue wedged.
struct DrainGuard<'a> {
    state: &'a Cell<ObserverState>,
}

impl<'a> DrainGuard<'a> {
    fn enter(state: &'a Cell<ObserverState>) -> Self {
        state.set(ObserverState::Draining);
        Self { state }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.state.set(ObserverState::Idle);
    }
}
