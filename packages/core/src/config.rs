use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TRAIT_ATTRIBUTE: &str = "traits";

/// Runtime configuration for a trait system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitsConfig {
    /// Attribute holding the whitespace-separated trait names
    #[serde(default = "default_attribute")]
    pub attribute: String,

    /// Apply a trait to already-present elements when it is defined after startup
    #[serde(default)]
    pub retroactive_define: bool,
}

fn default_attribute() -> String {
    DEFAULT_TRAIT_ATTRIBUTE.to_string()
}

impl TraitsConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TraitsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The attribute ends up inside CSS attribute selectors (`[traits]`), so
    /// only plain name characters are accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = !self.attribute.is_empty()
            && self
                .attribute
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));

        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidAttribute(self.attribute.clone()))
        }
    }

    /// CSS selector matching every element that carries the attribute. A
    /// namespace colon is escaped.
    pub fn selector(&self) -> String {
        format!("[{}]", self.attribute.replace(':', "\\:"))
    }
}

impl Default for TraitsConfig {
    fn default() -> Self {
        Self {
            attribute: default_attribute(),
            retroactive_define: false,
        }
    }
}
