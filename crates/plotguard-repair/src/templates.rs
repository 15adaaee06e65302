//! Instruction template sets
//!
//! A template set is a YAML file of named handlebars templates. The
//! built-in set is compiled into the crate; a file with the same names
//! can replace it.

use crate::RenderError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Built-in instruction templates
pub const BUILTIN_TEMPLATES: &str = include_str!("../templates/instructions.yaml");

/// Names every template set must define
pub const REQUIRED_TEMPLATES: [&str; 2] = ["batch_instructions", "repair_instructions"];

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_yaml(BUILTIN_TEMPLATES)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RenderError::Template(format!("failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a template set, checking the required names are present
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        let file: TemplatesFile =
            serde_yaml::from_str(yaml).map_err(|e| RenderError::Template(e.to_string()))?;
        let missing: Vec<&str> = REQUIRED_TEMPLATES
            .iter()
            .copied()
            .filter(|name| !file.templates.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(RenderError::Template(format!("missing templates: {}", missing.join(", "))));
        }
        Ok(file)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_parses() {
        let file = TemplatesFile::builtin().unwrap();
        assert_eq!(file.list_templates(), vec!["batch_instructions", "repair_instructions"]);
        assert!(!file.get("batch_instructions").unwrap().description.is_empty());
    }

    #[test]
    fn test_missing_required_template() {
        let yaml = r#"
version: "1.0"
templates:
  batch_instructions:
    template: "Batch {{batch_number}}"
"#;
        let err = TemplatesFile::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("repair_instructions"));
    }
}
