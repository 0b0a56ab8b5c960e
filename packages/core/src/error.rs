//! Error types for trait registration and the instance lifecycle

use thiserror::Error;

/// Registration failures. Fatal to the `define` call only; already
/// registered traits are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefineError {
    #[error("Trait name cannot be empty")]
    InvalidName,

    #[error("Trait \"{0}\" already defined")]
    DuplicateTrait(String),
}

/// A trait callback failed for one (element, trait name) pair.
///
/// These never abort a batch. The engine collects them into the report of the
/// operation that triggered the callback and keeps going.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Trait \"{trait_name}\" failed to construct: {cause:#}")]
    Construction {
        trait_name: String,
        cause: anyhow::Error,
    },

    #[error("Trait \"{trait_name}\" failed during teardown: {cause:#}")]
    Teardown {
        trait_name: String,
        cause: anyhow::Error,
    },
}

impl LifecycleError {
    pub fn trait_name(&self) -> &str {
        match self {
            LifecycleError::Construction { trait_name, .. }
            | LifecycleError::Teardown { trait_name, .. } => trait_name,
        }
    }

    /// The error returned by the trait callback
    pub fn cause(&self) -> &anyhow::Error {
        match self {
            LifecycleError::Construction { cause, .. } | LifecycleError::Teardown { cause, .. } => {
                cause
            }
        }
    }

    pub fn is_construction(&self) -> bool {
        matches!(self, LifecycleError::Construction { .. })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid trait attribute name: {0:?}")]
    InvalidAttribute(String),
}

/// Misuse of the virtual document tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Cannot insert <{child}> into <{parent}>: the node is an ancestor of the parent")]
    HierarchyRequest { parent: String, child: String },

    #[error("<{child}> is not a child of <{parent}>")]
    NotAChild { parent: String, child: String },
}
