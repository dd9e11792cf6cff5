// File: src/config.rs
// Purpose: Form binding configuration from TOML files or JSON/JS option objects

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::RuleError;
use crate::rules::{with_message, Locator, PredicateTable, Rule};

/// Binding configuration for one form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    /// Selector of the form to bind
    #[serde(default)]
    pub form: String,

    /// Marker of the container around each field (default: ".form-group")
    #[serde(default = "default_group_selector", alias = "form_group_selector")]
    pub form_group_selector: String,

    /// Marker of the message slot inside a group (default: ".form-message")
    #[serde(default = "default_error_selector", alias = "error_selector")]
    pub error_selector: String,

    /// Class put on an invalid group (default: "invalid")
    #[serde(default = "default_invalid_class", alias = "invalid_class")]
    pub invalid_class: String,

    /// Attribute holding a field's rule expression (default: "rules")
    #[serde(default = "default_rules_attribute", alias = "rules_attribute")]
    pub rules_attribute: String,

    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// Declarative explicit rule: where it applies and which checks it runs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub selector: Option<String>,

    /// Field name, used when no selector is given
    #[serde(default)]
    pub name: Option<String>,

    /// Rule expression, e.g. "required|email"
    #[serde(default)]
    pub rule: String,

    /// Replaces the default message of every check in `rule`
    #[serde(default)]
    pub message: Option<String>,
}

// Default values
fn default_group_selector() -> String {
    ".form-group".to_string()
}

fn default_error_selector() -> String {
    ".form-message".to_string()
}

fn default_invalid_class() -> String {
    "invalid".to_string()
}

fn default_rules_attribute() -> String {
    "rules".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form: String::new(),
            form_group_selector: default_group_selector(),
            error_selector: default_error_selector(),
            invalid_class: default_invalid_class(),
            rules_attribute: default_rules_attribute(),
            rules: Vec::new(),
        }
    }
}

impl FormConfig {
    /// Defaults bound to `form`
    pub fn for_form(form: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse form config")
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse form config JSON")
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file: defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse form config file: {:?}", path))
    }

    /// Compile every rule spec; a spec that fails is logged and skipped
    pub fn compile_rules(&self, table: &PredicateTable) -> Vec<Rule> {
        let mut rules = Vec::new();
        for spec in &self.rules {
            match spec.compile(table) {
                Ok(compiled) => rules.extend(compiled),
                Err(err) => warn!("Skipping rule {:?}: {}", spec.rule, err),
            }
        }
        rules
    }
}

impl RuleSpec {
    pub fn for_selector(selector: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            rule: rule.into(),
            ..Self::default()
        }
    }

    pub fn for_name(name: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rule: rule.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Locator this spec targets; a selector wins over a name
    pub fn locator(&self) -> Result<Locator, RuleError> {
        match (&self.selector, &self.name) {
            (Some(selector), _) if !selector.is_empty() => Ok(Locator::selector(selector)),
            (_, Some(name)) if !name.is_empty() => Ok(Locator::name(name)),
            _ => Err(RuleError::MissingLocator {
                rule: self.rule.clone(),
            }),
        }
    }

    /// One rule per check in the expression, in expression order
    pub fn compile(&self, table: &PredicateTable) -> Result<Vec<Rule>, RuleError> {
        let locator = self.locator()?;
        let tests = table.compile(&self.rule)?;

        Ok(tests
            .into_iter()
            .map(|test| {
                let test = match &self.message {
                    Some(message) => with_message(test, message.clone()),
                    None => test,
                };
                Rule::from_test(locator.clone(), test)
            })
            .collect())
    }
}
