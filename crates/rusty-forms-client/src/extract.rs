// File: src/extract.rs
// Purpose: Reconcile text, checkbox, radio and file fields into one value model

use std::collections::btree_map::Entry;

use crate::dom::Document;
use crate::rules::Locator;
use crate::value::{FieldKind, FormValue, FormValues, RawValue};

/// Reads field values out of one bound form
pub struct ValueExtractor<'a, D: Document> {
    document: &'a D,
    form: &'a D::Node,
}

impl<'a, D: Document> ValueExtractor<'a, D> {
    pub fn new(document: &'a D, form: &'a D::Node) -> Self {
        Self { document, form }
    }

    pub fn kind_of(&self, field: &D::Node) -> FieldKind {
        FieldKind::from_type(&self.document.field_type(field))
    }

    /// Raw input for rule tests
    ///
    /// Checkbox and radio fields are validated as a group: the value is the
    /// first checked field among those `locator` matches, not `field` itself.
    pub fn extract_raw(&self, field: &D::Node, locator: &Locator) -> RawValue {
        match self.kind_of(field) {
            FieldKind::Text => RawValue::Text(self.document.value(field)),
            FieldKind::File => RawValue::Files(self.document.files(field)),
            FieldKind::Checkbox | FieldKind::Radio => {
                RawValue::Choice(self.checked_value(&locator.to_selector()))
            }
        }
    }

    /// Normalized values of every enabled, named field, in document order
    pub fn extract_form_values(&self) -> FormValues {
        let mut values = FormValues::new();

        for field in self.document.query_all(self.form, "[name]") {
            if self.document.is_disabled(&field) {
                continue;
            }
            let Some(name) = self
                .document
                .attribute(&field, "name")
                .filter(|name| !name.is_empty())
            else {
                continue;
            };

            match self.kind_of(&field) {
                FieldKind::Checkbox => self.collect_checkbox(&mut values, name, &field),
                FieldKind::Radio => {
                    let value = self.radio_value(&name);
                    values.insert(name, value);
                }
                FieldKind::File => {
                    values.insert(name, FormValue::Files(self.document.files(&field)));
                }
                FieldKind::Text => {
                    values.insert(name, FormValue::Text(self.document.value(&field)));
                }
            }
        }

        values
    }

    /// Checked boxes accumulate into a list; an unchecked box only leaves an
    /// empty string when nothing else in its group has been seen yet.
    fn collect_checkbox(&self, values: &mut FormValues, name: String, field: &D::Node) {
        let checked = self.document.is_checked(field);
        match values.entry(name) {
            Entry::Vacant(slot) => {
                let value = if checked {
                    FormValue::List(vec![self.document.value(field)])
                } else {
                    FormValue::Text(String::new())
                };
                slot.insert(value);
            }
            Entry::Occupied(mut slot) if checked => match slot.get_mut() {
                FormValue::List(list) => list.push(self.document.value(field)),
                other => *other = FormValue::List(vec![self.document.value(field)]),
            },
            Entry::Occupied(_) => {}
        }
    }

    /// Value of the checked radio sharing `name`, or `""` when none is checked
    fn radio_value(&self, name: &str) -> FormValue {
        let selector = format!("input{}", Locator::name(name).to_selector());
        FormValue::Text(self.checked_value(&selector).unwrap_or_default())
    }

    fn checked_value(&self, selector: &str) -> Option<String> {
        self.document
            .query_all(self.form, selector)
            .into_iter()
            .find(|candidate| self.document.is_checked(candidate))
            .map(|checked| self.document.value(&checked))
    }
}
