// File: src/engine.rs
// Purpose: First-failure-wins evaluation of a field against its rule sequence

use tracing::debug;

use crate::dom::Document;
use crate::extract::ValueExtractor;
use crate::rules::{Locator, RuleCatalog};

/// Result of validating one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome<N> {
    pub field: N,
    pub message: Option<String>,
}

impl<N> ValidationOutcome<N> {
    pub fn is_valid(&self) -> bool {
        self.message.is_none()
    }
}

/// Stateless evaluator over a catalog and the live document
pub struct ValidationEngine<'a, D: Document> {
    catalog: &'a RuleCatalog,
    extractor: ValueExtractor<'a, D>,
}

impl<'a, D: Document> ValidationEngine<'a, D> {
    pub fn new(catalog: &'a RuleCatalog, document: &'a D, form: &'a D::Node) -> Self {
        Self {
            catalog,
            extractor: ValueExtractor::new(document, form),
        }
    }

    /// Validate `field` under `locator`
    ///
    /// Rules run in registration order and evaluation stops at the first
    /// non-empty message. A locator without rules always passes.
    pub fn validate(&self, field: &D::Node, locator: &Locator) -> ValidationOutcome<D::Node> {
        let tests = self.catalog.rules_for(locator);
        let message = if tests.is_empty() {
            None
        } else {
            let raw = self.extractor.extract_raw(field, locator);
            tests
                .iter()
                .find_map(|test| test(&raw).filter(|message| !message.is_empty()))
        };

        if let Some(message) = &message {
            debug!("Field {} failed: {}", locator, message);
        }

        ValidationOutcome {
            field: field.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::dom::{Element, MemoryDocument};
    use crate::rules::Rule;

    #[test]
    fn test_field_without_rules_is_valid() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let field = doc.append(form, Element::input("text").id("free"));

        let catalog = RuleCatalog::new();
        let engine = ValidationEngine::new(&catalog, &doc, &form);
        assert!(engine.validate(&field, &Locator::from("#free")).is_valid());
    }

    #[test]
    fn test_first_failure_wins_and_later_rules_do_not_run() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let field = doc.append(form, Element::input("text").id("code"));

        let later_calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&later_calls);
        let catalog: RuleCatalog = vec![
            Rule::new("#code", |_| Some("A failed".to_string())),
            Rule::new("#code", move |_| {
                counter.set(counter.get() + 1);
                Some("B failed".to_string())
            }),
        ]
        .into_iter()
        .collect();

        let engine = ValidationEngine::new(&catalog, &doc, &form);
        let outcome = engine.validate(&field, &Locator::from("#code"));
        assert_eq!(outcome.message.as_deref(), Some("A failed"));
        assert_eq!(later_calls.get(), 0);
    }

    #[test]
    fn test_empty_message_counts_as_pass() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let field = doc.append(form, Element::input("text").id("x"));

        let catalog: RuleCatalog = vec![
            Rule::new("#x", |_| Some(String::new())),
            Rule::required("#x"),
        ]
        .into_iter()
        .collect();

        let engine = ValidationEngine::new(&catalog, &doc, &form);
        let outcome = engine.validate(&field, &Locator::from("#x"));
        assert_eq!(outcome.message.as_deref(), Some(crate::rules::REQUIRED_MESSAGE));
    }

    #[test]
    fn test_checkbox_group_validated_as_one_field() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let first = doc.append(form, Element::input("checkbox").name("topics").value("rust"));
        let second = doc.append(form, Element::input("checkbox").name("topics").value("go"));

        let catalog: RuleCatalog = vec![Rule::required(Locator::name("topics"))]
            .into_iter()
            .collect();
        let engine = ValidationEngine::new(&catalog, &doc, &form);
        let locator = Locator::name("topics");

        assert!(!engine.validate(&first, &locator).is_valid());
        doc.set_checked(second, true);
        assert!(engine.validate(&first, &locator).is_valid());
    }
}
