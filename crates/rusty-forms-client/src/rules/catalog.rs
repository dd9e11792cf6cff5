// File: src/rules/catalog.rs
// Purpose: Ordered per-locator rule sequences for one bound form

use tracing::debug;

use super::{Locator, PredicateTable, Rule, RuleTest};
use crate::error::RuleError;

/// Rule sequences keyed by locator
///
/// Locators keep the order in which they were first registered, and each
/// locator's tests keep insertion order. Duplicates are kept and run every time.
#[derive(Clone, Default)]
pub struct RuleCatalog {
    entries: Vec<(Locator, Vec<RuleTest>)>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `test` to the locator's sequence, creating it if absent
    pub fn register(&mut self, locator: Locator, test: RuleTest) {
        match self.entries.iter_mut().find(|(known, _)| *known == locator) {
            Some((_, tests)) => tests.push(test),
            None => self.entries.push((locator, vec![test])),
        }
    }

    pub fn register_rule(&mut self, rule: Rule) {
        self.register(rule.locator, rule.test);
    }

    /// Parse `expression` and append its checks under the field's name
    ///
    /// The expression is compiled in full first: on error nothing is
    /// registered for this field.
    pub fn register_from_expression(
        &mut self,
        field_name: &str,
        expression: &str,
        table: &PredicateTable,
    ) -> Result<usize, RuleError> {
        let tests = table.compile(expression)?;
        let count = tests.len();
        debug!(
            "Registered {} rule(s) for field {:?} from {:?}",
            count, field_name, expression
        );

        let locator = Locator::name(field_name);
        for test in tests {
            self.register(locator.clone(), test);
        }
        Ok(count)
    }

    /// Tests registered for `locator`, empty when there are none
    pub fn rules_for(&self, locator: &Locator) -> &[RuleTest] {
        self.entries
            .iter()
            .find(|(known, _)| known == locator)
            .map(|(_, tests)| tests.as_slice())
            .unwrap_or(&[])
    }

    /// Locators in first-registration order
    pub fn locators(&self) -> impl Iterator<Item = &Locator> {
        self.entries.iter().map(|(locator, _)| locator)
    }

    /// Number of distinct locators
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Rule> for RuleCatalog {
    fn from_iter<I: IntoIterator<Item = Rule>>(rules: I) -> Self {
        let mut catalog = Self::new();
        for rule in rules {
            catalog.register_rule(rule);
        }
        catalog
    }
}
