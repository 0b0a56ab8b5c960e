//! # Instance Store
//!
//! Element → live trait instances. Entries hold a weak handle to their
//! element and own the instances. Only the engine writes to the store.

use std::collections::HashMap;
use std::fmt;

use crate::host::{Element, WeakElement};
use crate::registry::TraitInstance;

/// One live trait instance, tagged with the name it was constructed for
pub struct TraitBinding {
    name: String,
    instance: Box<dyn TraitInstance>,
}

impl TraitBinding {
    pub(crate) fn new(name: impl Into<String>, instance: Box<dyn TraitInstance>) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> &dyn TraitInstance {
        self.instance.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Box<dyn TraitInstance>) {
        (self.name, self.instance)
    }
}

impl fmt::Debug for TraitBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

struct Entry<E: Element> {
    element: E::Weak,
    bindings: Vec<TraitBinding>,
}

pub struct InstanceStore<E: Element> {
    entries: HashMap<E::Key, Entry<E>>,
}

impl<E: Element> InstanceStore<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Bindings for `element`; empty if it has none
    pub fn get(&self, element: &E) -> &[TraitBinding] {
        self.entries
            .get(&element.key())
            .map(|entry| entry.bindings.as_slice())
            .unwrap_or(&[])
    }

    /// Replace the full binding set. An empty set removes the entry.
    pub(crate) fn put(&mut self, element: &E, bindings: Vec<TraitBinding>) {
        if bindings.is_empty() {
            self.entries.remove(&element.key());
            return;
        }

        self.entries.insert(
            element.key(),
            Entry {
                element: element.downgrade(),
                bindings,
            },
        );
    }

    /// Remove the entry, handing its bindings back for teardown
    pub(crate) fn delete(&mut self, element: &E) -> Vec<TraitBinding> {
        self.entries
            .remove(&element.key())
            .map(|entry| entry.bindings)
            .unwrap_or_default()
    }

    /// Remove entries whose element has been reclaimed
    pub(crate) fn sweep(&mut self) -> Vec<TraitBinding> {
        let dead: Vec<E::Key> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.element.upgrade().is_none())
            .map(|(key, _)| *key)
            .collect();

        dead.into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .flat_map(|entry| entry.bindings)
            .collect()
    }

    /// Remove every entry
    pub(crate) fn drain(&mut self) -> Vec<TraitBinding> {
        self.entries
            .drain()
            .flat_map(|(_, entry)| entry.bindings)
            .collect()
    }

    pub fn contains(&self, element: &E) -> bool {
        self.entries.contains_key(&element.key())
    }

    pub fn trait_names(&self, element: &E) -> Vec<String> {
        self.get(element)
            .iter()
            .map(|binding| binding.name().to_string())
            .collect()
    }

    /// Number of elements with at least one live instance
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.entries.values().map(|entry| entry.bindings.len()).sum()
    }

    /// Tracked elements that are still alive
    pub fn elements(&self) -> Vec<E> {
        self.entries
            .values()
            .filter_map(|entry| entry.element.upgrade())
            .collect()
    }
}

impl<E: Element> Default for InstanceStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> fmt::Debug for InstanceStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceStore")
            .field("elements", &self.len())
            .field("instances", &self.instance_count())
            .finish()
    }
}
