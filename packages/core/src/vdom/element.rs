use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::error;

use super::document::DocumentShared;
use crate::error::DomError;
use crate::host::{Element, WeakElement};
use crate::observer::MutationRecord;

/// Element of a [`super::VirtualDocument`]. Cloning yields another handle to
/// the same element; identity is the allocation, not the contents.
#[derive(Clone)]
pub struct VElement(Rc<ElementNode>);

/// Non-owning [`VElement`] handle
#[derive(Clone)]
pub struct WeakVElement(Weak<ElementNode>);

pub(super) struct ElementNode {
    tag: String,
    attributes: RefCell<HashMap<String, String>>,
    children: RefCell<Vec<VElement>>,
    parent: RefCell<Weak<ElementNode>>,
    /// Set on a document root only
    document: RefCell<Weak<DocumentShared>>,
    /// Set on a subtree root detached since the last `take_records`; changes
    /// beneath it are still reported to that document
    removed_from: RefCell<Weak<DocumentShared>>,
}

impl VElement {
    /// Create a detached element
    pub fn new(tag: impl Into<String>) -> Self {
        VElement(Rc::new(ElementNode {
            tag: tag.into(),
            attributes: RefCell::new(HashMap::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            document: RefCell::new(Weak::new()),
            removed_from: RefCell::new(Weak::new()),
        }))
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attributes.borrow().contains_key(name)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let old_value = self
            .0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self.record(MutationRecord::AttributeChanged {
            target: self.clone(),
            attribute_name: name.to_string(),
            old_value,
        });
    }

    pub fn remove_attribute(&self, name: &str) {
        let old_value = self.0.attributes.borrow_mut().remove(name);
        if old_value.is_some() {
            self.record(MutationRecord::AttributeChanged {
                target: self.clone(),
                attribute_name: name.to_string(),
                old_value,
            });
        }
    }

    /// Builder form of [`Self::set_attribute`]
    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`Self::append_child`]
    pub fn with_child(self, child: VElement) -> Self {
        if let Err(err) = self.append_child(&child) {
            error!(error = %err, "Failed to append child");
        }
        self
    }

    /// Append `child`, detaching it from its current parent first
    pub fn append_child(&self, child: &VElement) -> Result<(), DomError> {
        if self.inclusive_ancestors().any(|ancestor| ancestor.ptr_eq(child)) {
            return Err(DomError::HierarchyRequest {
                parent: self.tag().to_string(),
                child: child.tag().to_string(),
            });
        }

        child.remove();
        self.attach(child);
        self.record(MutationRecord::NodeAdded { node: child.clone() });
        Ok(())
    }

    pub fn remove_child(&self, child: &VElement) -> Result<(), DomError> {
        let position = self
            .0
            .children
            .borrow()
            .iter()
            .position(|candidate| candidate.ptr_eq(child));

        let Some(index) = position else {
            return Err(DomError::NotAChild {
                parent: self.tag().to_string(),
                child: child.tag().to_string(),
            });
        };

        self.0.children.borrow_mut().remove(index);
        *child.0.parent.borrow_mut() = Weak::new();
        if let Some(document) = self.observing_document() {
            document.enqueue(MutationRecord::NodeRemoved { node: child.clone() });
            document.track_removed(child);
        }
        Ok(())
    }

    /// Detach from the parent, if any
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            // We are listed among the parent's children
            let _ = parent.remove_child(self);
        }
    }

    pub fn parent(&self) -> Option<VElement> {
        self.0.parent.borrow().upgrade().map(VElement)
    }

    pub fn children(&self) -> Vec<VElement> {
        self.0.children.borrow().clone()
    }

    /// Descendants in document order, self excluded
    pub fn descendants(&self) -> Vec<VElement> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    /// Whether `other` is this element or one of its descendants
    pub fn contains(&self, other: &VElement) -> bool {
        other.inclusive_ancestors().any(|ancestor| ancestor.ptr_eq(self))
    }

    /// Whether the element sits in a document's tree
    pub fn is_connected(&self) -> bool {
        self.document().is_some()
    }

    pub fn ptr_eq(&self, other: &VElement) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(super) fn link_document(&self, document: &Rc<DocumentShared>) {
        *self.0.document.borrow_mut() = Rc::downgrade(document);
    }

    pub(super) fn set_removed_from(&self, document: Weak<DocumentShared>) {
        *self.0.removed_from.borrow_mut() = document;
    }

    /// Insert without recording; used while a document is being assembled
    pub(super) fn attach(&self, child: &VElement) {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    fn document(&self) -> Option<Rc<DocumentShared>> {
        let root = self.inclusive_ancestors().last()?;
        let document = root.0.document.borrow().upgrade();
        document
    }

    /// Document receiving this element's records: the one it is connected to,
    /// or the one a detached ancestor was removed from during the pending batch
    fn observing_document(&self) -> Option<Rc<DocumentShared>> {
        if let Some(document) = self.document() {
            return Some(document);
        }
        self.inclusive_ancestors().find_map(|ancestor| {
            let document = ancestor.0.removed_from.borrow().upgrade();
            document
        })
    }

    fn record(&self, record: MutationRecord<VElement>) {
        if let Some(document) = self.observing_document() {
            document.enqueue(record);
        }
    }

    fn inclusive_ancestors(&self) -> impl Iterator<Item = VElement> {
        std::iter::successors(Some(self.clone()), VElement::parent)
    }

    fn collect_descendants(&self, out: &mut Vec<VElement>) {
        for child in self.0.children.borrow().iter() {
            out.push(child.clone());
            child.collect_descendants(out);
        }
    }
}

impl PartialEq for VElement {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for VElement {}

impl fmt::Debug for VElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.0.tag)?;
        let attributes = self.0.attributes.borrow();
        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort();
        for name in names {
            write!(f, " {}=\"{}\"", name, attributes[name])?;
        }
        write!(f, ">")
    }
}

impl Element for VElement {
    type Key = usize;
    type Weak = WeakVElement;

    /// Allocation address. A [`WeakVElement`] keeps the allocation reserved, so
    /// the address cannot be reused while the store holds one.
    fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    fn downgrade(&self) -> WeakVElement {
        WeakVElement(Rc::downgrade(&self.0))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        VElement::attribute(self, name)
    }

    fn is_connected(&self) -> bool {
        VElement::is_connected(self)
    }

    fn descendants_with_attribute(&self, name: &str) -> Vec<VElement> {
        self.descendants()
            .into_iter()
            .filter(|element| element.has_attribute(name))
            .collect()
    }
}

impl WeakElement for WeakVElement {
    type Element = VElement;

    fn upgrade(&self) -> Option<VElement> {
        self.0.upgrade().map(VElement)
    }
}
