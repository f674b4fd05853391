use super::template::{default_templates, Template};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Templates loaded from a JSON file, or the built-in set
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self {
            templates: default_templates(),
        }
    }
}

impl TemplateStore {
    /// Load a JSON array of templates
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates from {}", path.display()))?;

        let templates: Vec<Template> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid template file {}", path.display()))?;

        Self::validate(&templates)?;

        info!("Loaded {} templates from {}", templates.len(), path.display());
        Ok(Self { templates })
    }

    /// Load from `path` when given, otherwise use the built-in templates
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Case-insensitive lookup by name
    pub fn find(&self, name: &str) -> Option<&Template> {
        self.templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    fn validate(templates: &[Template]) -> Result<()> {
        if templates.is_empty() {
            bail!("Template file contains no templates");
        }

        for template in templates {
            let mut seen = HashSet::new();
            for field in &template.fields {
                if field.identifier.is_empty() {
                    bail!("Template '{}' has a field without identifier", template.name);
                }
                if !seen.insert(field.identifier.as_str()) {
                    bail!(
                        "Template '{}' repeats field '{}'",
                        template.name,
                        field.identifier
                    );
                }
            }
        }

        Ok(())
    }
}
