//! # dom-traits
//!
//! Attach reusable behavior ("traits") to DOM elements through a
//! whitespace-separated attribute, and keep it in step with the document as
//! it mutates.
//!
//! ```html
//! <div traits="highlight tooltip">…</div>
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: elements, documents, mutation records │
//! └─────────────────────────────────────────────┘
//!                     ↓ batches
//! ┌─────────────────────────────────────────────┐
//! │ observer: Idle/Draining queue, routing      │
//! │  - attribute changed → reconcile            │
//! │  - subtree added     → instantiate          │
//! │  - subtree removed   → destroy              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ engine: delta between attribute and store   │
//! │  registry (name → constructor)              │
//! │  store (weak element → trait instances)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! 1. An element holds at most one instance per trait name
//! 2. After each batch an element's instances match its attribute
//! 3. Every instance is torn down exactly once
//! 4. A failing constructor or teardown only affects its own
//!    (element, trait name) pair
//!
//! ## Usage
//!
//! ```rust
//! use dom_traits::{TraitInstance, TraitSystem, VirtualDocument};
//!
//! struct Highlight;
//!
//! impl TraitInstance for Highlight {}
//!
//! let system = TraitSystem::with_defaults(VirtualDocument::new());
//! system
//!     .define_trait("highlight", |_element| Ok(Box::new(Highlight) as Box<dyn TraitInstance>))
//!     .unwrap();
//! system.start();
//!
//! let div = system.document().create_element("div").with_attr("traits", "highlight");
//! system.document().body().append_child(&div).unwrap();
//! system.flush();
//!
//! assert_eq!(system.trait_names(&div), vec!["highlight"]);
//! ```

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod observer;
pub mod registry;
pub mod store;
pub mod system;
pub mod tokenize;
pub mod vdom;


#[cfg(test)]
mod tests_lifecycle;

#[cfg(test)]
mod tests_reentrancy;


pub use config::{TraitsConfig, DEFAULT_TRAIT_ATTRIBUTE};
pub use engine::{InstantiationEngine, ReconcileReport};
pub use error::{ConfigError, DefineError, DomError, LifecycleError};
pub use host::{Document, Element, MutationSource, WeakElement};
pub use observer::{BatchReport, ChangeObserver, MutationRecord, ObserverState};
pub use registry::{TraitConstructor, TraitInstance, TraitRegistry};
pub use store::{InstanceStore, TraitBinding};
pub use system::TraitSystem;
pub use tokenize::parse_trait_names;
pub use vdom::{VElement, VirtualDocument, WeakVElement};
