//! # Trait Registry
//!
//! Name → constructor mapping. Names are trimmed, must be non-empty and may
//! be registered only once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::DefineError;

/// Behavior attached to one element for one trait name
pub trait TraitInstance: 'static {
    /// Teardown hook, called exactly once when the instance is detached from
    /// its element (element removed, or trait name dropped from the attribute).
    fn disconnected(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Builds a trait instance for an element
pub type TraitConstructor<E> = Rc<dyn Fn(&E) -> anyhow::Result<Box<dyn TraitInstance>>>;

pub struct TraitRegistry<E> {
    traits: RefCell<HashMap<String, TraitConstructor<E>>>,
}

impl<E> TraitRegistry<E> {
    pub fn new() -> Self {
        Self {
            traits: RefCell::new(HashMap::new()),
        }
    }

    /// Register a constructor. Returns the trimmed name it was stored under.
    pub fn define<F>(&self, name: &str, constructor: F) -> Result<String, DefineError>
    where
        F: Fn(&E) -> anyhow::Result<Box<dyn TraitInstance>> + 'static,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(DefineError::InvalidName);
        }

        let mut traits = self.traits.borrow_mut();
        if traits.contains_key(name) {
            return Err(DefineError::DuplicateTrait(name.to_string()));
        }

        debug!(trait_name = %name, "Registering trait");
        traits.insert(name.to_string(), Rc::new(constructor));
        Ok(name.to_string())
    }

    /// Constructor for `name`, if registered. The handle is cloned out so the
    /// caller can run it while other code registers traits.
    pub fn lookup(&self, name: &str) -> Option<TraitConstructor<E>> {
        self.traits.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.traits.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.traits.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.borrow().is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.traits.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl<E> Default for TraitRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for TraitRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitRegistry")
            .field("traits", &self.names())
            .finish()
    }
}
