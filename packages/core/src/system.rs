//! # Trait System
//!
//! Process-scoped service object tying the pieces together:
//!
//! ```text
//! define_trait ──→ TraitRegistry ←── reads ──┐
//!                                            │
//! start / deliver / flush ──→ ChangeObserver ──→ InstantiationEngine ──→ InstanceStore
//!                             (Idle/Draining)
//! ```
//!
//! The registry, engine and job queue live in separate cells so trait
//! callbacks can define traits or deliver batches while a job is running.
//! Such calls are queued and drained by the active loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::bootstrap::{apply_retroactively, bootstrap};
use crate::config::TraitsConfig;
use crate::engine::{InstantiationEngine, ReconcileReport};
use crate::error::{ConfigError, DefineError};
use crate::host::{Document, MutationSource};
use crate::observer::{BatchReport, ChangeObserver, Job, MutationRecord, ObserverState};
use crate::registry::{TraitInstance, TraitRegistry};
use crate::store::InstanceStore;

pub struct TraitSystem<D: Document> {
    document: D,
    config: TraitsConfig,
    registry: Rc<TraitRegistry<D::Element>>,
    engine: RefCell<InstantiationEngine<D::Element>>,
    observer: ChangeObserver<D::Element>,
    started: Cell<bool>,
}

impl<D: Document> TraitSystem<D> {
    /// Build a system over `document`. The attribute name is validated here
    /// because hosts turn it into selectors.
    pub fn new(document: D, config: TraitsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(document, config))
    }

    pub fn with_defaults(document: D) -> Self {
        Self::assemble(document, TraitsConfig::default())
    }

    fn assemble(document: D, config: TraitsConfig) -> Self {
        let registry = Rc::new(TraitRegistry::new());
        let engine = InstantiationEngine::new(registry.clone());
        let observer = ChangeObserver::new(config.attribute.clone());

        Self {
            document,
            config,
            registry,
            engine: RefCell::new(engine),
            observer,
            started: Cell::new(false),
        }
    }

    /// Register a trait. Elements already carrying the name only pick it up
    /// on their next change, unless `retroactive_define` is set.
    pub fn define_trait<F>(&self, name: &str, constructor: F) -> Result<(), DefineError>
    where
        F: Fn(&D::Element) -> anyhow::Result<Box<dyn TraitInstance>> + 'static,
    {
        let name = self.registry.define(name, constructor)?;

        if self.config.retroactive_define && self.started.get() {
            self.run(Job::Retroactive(name));
        }
        Ok(())
    }

    /// Instantiate traits on every element already in the document. Runs once;
    /// later calls do nothing.
    pub fn start(&self) -> Vec<BatchReport> {
        if self.started.replace(true) {
            warn!("Trait system already started");
            return Vec::new();
        }
        self.run(Job::Bootstrap)
    }

    /// Hand a batch of mutation records to the observer. Returns the reports of
    /// every job drained by this call; empty when the batch was queued behind
    /// an active drain.
    pub fn deliver(&self, records: Vec<MutationRecord<D::Element>>) -> Vec<BatchReport> {
        if records.is_empty() {
            return Vec::new();
        }
        self.run(Job::Batch(records))
    }

    /// Tear down instances of elements that were reclaimed without a removal
    /// record. Does nothing while a job is draining.
    pub fn sweep(&self) -> ReconcileReport {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.sweep(),
            Err(_) => {
                debug!("Sweep skipped while draining");
                ReconcileReport::default()
            }
        }
    }

    /// Tear down every live instance. The system keeps observing; elements
    /// pick their traits up again on their next change.
    pub fn shutdown(&self) -> ReconcileReport {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.destroy_everything(),
            Err(_) => {
                warn!("Shutdown requested while draining; ignored");
                ReconcileReport::default()
            }
        }
    }

    /// Names bound to `element`. Empty while a job is draining; see
    /// [`Self::inspect`].
    pub fn trait_names(&self, element: &D::Element) -> Vec<String> {
        self.inspect(|store| store.trait_names(element)).unwrap_or_default()
    }

    /// Total live instances. Zero while a job is draining.
    pub fn instance_count(&self) -> usize {
        self.inspect(InstanceStore::instance_count).unwrap_or_default()
    }

    /// Elements with at least one live instance. Empty while a job is draining.
    pub fn tracked_elements(&self) -> Vec<D::Element> {
        self.inspect(InstanceStore::elements).unwrap_or_default()
    }

    /// Run `f` against the instance store. `None` while a job is draining,
    /// which tells a trait callback apart from a genuinely empty store.
    pub fn inspect<R>(&self, f: impl FnOnce(&InstanceStore<D::Element>) -> R) -> Option<R> {
        self.engine.try_borrow().ok().map(|engine| f(engine.store()))
    }

    pub fn state(&self) -> ObserverState {
        self.observer.state()
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    pub fn registry(&self) -> &TraitRegistry<D::Element> {
        &self.registry
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn config(&self) -> &TraitsConfig {
        &self.config
    }

    fn run(&self, job: Job<D::Element>) -> Vec<BatchReport> {
        self.observer.submit(job, |job| {
            let mut engine = self.engine.borrow_mut();
            let attribute = self.config.attribute.as_str();

            match job {
                Job::Batch(records) => self.observer.process_batch(&mut engine, records),
                Job::Bootstrap => bootstrap(&self.document, &mut engine, attribute),
                Job::Retroactive(name) => {
                    apply_retroactively(&self.document, &mut engine, attribute, &name)
                }
            }
        })
    }
}

impl<D: MutationSource> TraitSystem<D> {
    /// Process the host's pending records, batch by batch, until none remain.
    /// Records produced by trait callbacks along the way form later batches.
    pub fn flush(&self) -> Vec<BatchReport> {
        let mut reports = Vec::new();
        loop {
            let records = self.document.take_records();
            if records.is_empty() {
                break;
            }
            reports.extend(self.deliver(records));
        }
        reports
    }
}
