use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time settings, loadable from TOML.
///
/// ```toml
/// entity_table = "cms_entity"
/// attribute_table = "cms_attribute"
/// auto_migrate = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub entity_table: String,
    pub attribute_table: String,
    #[serde(default)]
    pub auto_migrate: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl StoreConfig {
    pub fn new(entity_table: impl Into<String>, attribute_table: impl Into<String>) -> Self {
        Self {
            entity_table: entity_table.into(),
            attribute_table: attribute_table.into(),
            ..Default::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<StoreConfig> {
    Ok(toml::from_str(contents)?)
}

pub fn load_config(path: &Path) -> Result<StoreConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = parse_config(
            r#"
            entity_table = "cms_entity"
            attribute_table = "cms_attribute"
            "#,
        )
        .unwrap();
        assert_eq!(config, StoreConfig::new("cms_entity", "cms_attribute"));
        assert!(!config.auto_migrate);
        assert!(!config.verbose);
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        assert!(parse_config(r#"entity_table = "cms_entity""#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entitystore.toml");
        std::fs::write(
            &path,
            "entity_table = \"e\"\nattribute_table = \"a\"\nauto_migrate = true\nverbose = true\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.auto_migrate);
        assert!(config.verbose);
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
