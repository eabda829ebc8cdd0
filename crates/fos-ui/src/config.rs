//! Runtime configuration

use fos_html::BuilderOptions;
use serde::Deserialize;

/// UI runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Element built for blank templates
    pub empty_tag: String,
    /// Attribute marking bound elements
    pub binding_attribute: String,
    /// Free the discarded side of every top-level patch
    pub free_discarded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            empty_tag: "span".to_string(),
            binding_attribute: "data-bind".to_string(),
            free_discarded: true,
        }
    }
}

impl Config {
    /// Load a configuration from JSON text; missing fields take defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Tree builder options derived from this configuration
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            empty_tag: self.empty_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.empty_tag, "span");
        assert_eq!(config.binding_attribute, "data-bind");
        assert!(config.free_discarded);
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json(r#"{"empty_tag": "div"}"#).unwrap();
        assert_eq!(config.empty_tag, "div");
        assert_eq!(config.binding_attribute, "data-bind");
        assert_eq!(config.builder_options().empty_tag, "div");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(Config::from_json("{\"free_discarded\": \"yes\"}").is_err());
    }
}
