use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::element::VElement;
use crate::host::{Document, MutationSource};
use crate::observer::MutationRecord;

/// In-memory document that buffers mutation records for batched delivery
#[derive(Clone)]
pub struct VirtualDocument {
    shared: Rc<DocumentShared>,
    root: VElement,
    body: VElement,
}

pub(crate) struct DocumentShared {
    records: RefCell<Vec<MutationRecord<VElement>>>,
    removed_roots: RefCell<Vec<VElement>>,
}

impl DocumentShared {
    /// Queue a record. Attribute records coalesce per (target, attribute):
    /// a later write to an attribute that already has a pending record is
    /// folded into it, keeping the oldest `old_value`.
    pub(crate) fn enqueue(&self, record: MutationRecord<VElement>) {
        let mut records = self.records.borrow_mut();

        if let MutationRecord::AttributeChanged {
            target,
            attribute_name,
            ..
        } = &record
        {
            let pending = records.iter().any(|queued| {
                matches!(
                    queued,
                    MutationRecord::AttributeChanged {
                        target: queued_target,
                        attribute_name: queued_name,
                        ..
                    } if queued_target.ptr_eq(target) && queued_name == attribute_name
                )
            });
            if pending {
                return;
            }
        }

        records.push(record);
    }

    /// Keep reporting changes under `root` until the pending batch is taken
    pub(crate) fn track_removed(self: &Rc<Self>, root: &VElement) {
        root.set_removed_from(Rc::downgrade(self));
        self.removed_roots.borrow_mut().push(root.clone());
    }

    fn take_records(&self) -> Vec<MutationRecord<VElement>> {
        for root in self.removed_roots.take() {
            root.set_removed_from(Weak::new());
        }
        self.records.take()
    }
}

impl VirtualDocument {
    /// Empty document: `<html><body></body></html>`
    pub fn new() -> Self {
        let shared = Rc::new(DocumentShared {
            records: RefCell::new(Vec::new()),
            removed_roots: RefCell::new(Vec::new()),
        });

        let root = VElement::new("html");
        let body = VElement::new("body");
        root.attach(&body);
        root.link_document(&shared);

        Self { shared, root, body }
    }

    pub fn root(&self) -> &VElement {
        &self.root
    }

    pub fn body(&self) -> &VElement {
        &self.body
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> VElement {
        VElement::new(tag)
    }

    /// Records waiting for the next batch
    pub fn pending_records(&self) -> usize {
        self.shared.records.borrow().len()
    }

    /// Every element in the tree, document order, root included
    pub fn all_elements(&self) -> Vec<VElement> {
        let mut elements = vec![self.root.clone()];
        elements.extend(self.root.descendants());
        elements
    }
}

impl Default for VirtualDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualDocument")
            .field("elements", &self.all_elements().len())
            .field("pending_records", &self.pending_records())
            .finish()
    }
}

impl Document for VirtualDocument {
    type Element = VElement;

    fn elements_with_attribute(&self, name: &str) -> Vec<VElement> {
        self.all_elements()
            .into_iter()
            .filter(|element| element.has_attribute(name))
            .collect()
    }
}

impl MutationSource for VirtualDocument {
    fn take_records(&self) -> Vec<MutationRecord<VElement>> {
        self.shared.take_records()
    }
}
