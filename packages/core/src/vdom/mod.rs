//! # Virtual Document
//!
//! A small reference-identity element tree that behaves like a browser DOM
//! under a `MutationObserver`:
//!
//! - Only changes inside the connected tree are recorded
//! - Records queue up until [`crate::host::MutationSource::take_records`]
//! - Repeated writes to one attribute coalesce into the first record
//! - Detached subtrees keep their children, so removed nodes can still be
//!   searched
//!
//! Parents hold children strongly and children point back weakly, so
//! dropping the last handle to a detached subtree frees it.

mod document;
mod element;

pub use document::VirtualDocument;
pub use element::{VElement, WeakVElement};
