//! Template interpolation for path conventions
//!
//! Handles `{{ variable }}` interpolation in the raw and optimized root
//! templates, e.g. `s3a://{{ bucket }}/raw/{{ platform }}/{{ dataset }}/{{ date }}`.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable }}
static TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap());

/// Variables every path template may reference
pub const KNOWN_VARIABLES: [&str; 7] = [
    "bucket", "platform", "dataset", "date", "year", "month", "day",
];

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Builder-style variant of [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut errors = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let name = &cap[1];
        if let Some(value) = ctx.get(name) {
            value.to_string()
        } else {
            errors.push(name.to_string());
            String::new()
        }
    });

    if errors.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Fail if a template references anything outside [`KNOWN_VARIABLES`]
pub fn validate(template: &str) -> Result<()> {
    if template.contains("{{") && !has_templates(template) {
        return Err(Error::template(format!("unparseable placeholder in '{template}'")));
    }
    let unknown: Vec<_> = extract_variables(template)
        .into_iter()
        .filter(|v| !KNOWN_VARIABLES.contains(&v.as_str()))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Error::undefined_var(unknown.join(", ")))
    }
}
