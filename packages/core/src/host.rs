//! # Host Abstraction
//!
//! The lifecycle manager never touches a concrete DOM. A host supplies:
//!
//! - [`Element`]: a reference-identity element handle
//! - [`WeakElement`]: a non-owning handle the instance store keys on
//! - [`Document`]: document-wide attribute queries for bootstrap
//! - [`MutationSource`]: batched mutation records, when the host buffers them
//!
//! [`crate::vdom`] is the in-memory host; the browser binding implements the
//! same traits over `web_sys`.

use std::fmt;
use std::hash::Hash;

use crate::observer::MutationRecord;

/// Element handle with reference identity
pub trait Element: Clone + fmt::Debug + 'static {
    /// Identity key. Two handles to the same element yield the same key, and
    /// the key stays unique for as long as a [`Self::Weak`] to it exists.
    type Key: Copy + Eq + Hash + fmt::Debug;

    type Weak: WeakElement<Element = Self>;

    fn key(&self) -> Self::Key;

    fn downgrade(&self) -> Self::Weak;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Whether the element is in the document tree right now. Records can
    /// still arrive for an element after it left the tree.
    fn is_connected(&self) -> bool;

    /// Descendants (self excluded) carrying `name`, in document order
    fn descendants_with_attribute(&self, name: &str) -> Vec<Self>;
}

/// Non-owning element handle
pub trait WeakElement {
    type Element;

    /// `None` once the element has been reclaimed
    fn upgrade(&self) -> Option<Self::Element>;
}

/// Document-wide queries
pub trait Document {
    type Element: Element;

    /// Every element in the document carrying `name`, in document order
    fn elements_with_attribute(&self, name: &str) -> Vec<Self::Element>;
}

/// Host that buffers mutation records until they are taken as one batch
pub trait MutationSource: Document {
    /// Take every pending record. An empty batch means nothing changed.
    fn take_records(&self) -> Vec<MutationRecord<Self::Element>>;
}
