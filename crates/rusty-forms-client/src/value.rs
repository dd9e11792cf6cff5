// File: src/value.rs
// Purpose: Field kinds and the value model shared by rules and submission

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dom::FileHandle;

/// Kind of a field, derived from its declared type in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    File,
}

impl FieldKind {
    /// Map a declared field type (`type` attribute or tag name) to a kind.
    /// Anything not checkbox, radio or file (text, email, select, textarea...) is text.
    pub fn from_type(field_type: &str) -> Self {
        match field_type.to_ascii_lowercase().as_str() {
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "file" => FieldKind::File,
            _ => FieldKind::Text,
        }
    }
}

/// Raw field input handed to rule tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Current scalar value of a text-like field
    Text(String),
    /// Value of the checked field in a checkbox/radio group, `None` if none is checked
    Choice(Option<String>),
    /// Files selected in a file picker
    Files(Vec<FileHandle>),
}

impl RawValue {
    /// Whether the field holds anything at all
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Text(text) => rusty_forms_validation::is_filled(text),
            RawValue::Choice(choice) => choice.is_some(),
            RawValue::Files(files) => !files.is_empty(),
        }
    }

    /// Textual view used by string rules
    ///
    /// An empty group reads as `""`; a file picker reads as the first file name.
    pub fn as_text(&self) -> &str {
        match self {
            RawValue::Text(text) => text,
            RawValue::Choice(choice) => choice.as_deref().unwrap_or(""),
            RawValue::Files(files) => files.first().map(|f| f.name.as_str()).unwrap_or(""),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

/// Normalized value of one named field at submission time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Scalar value; also the empty string of an unset checkbox or radio group
    Text(String),
    /// Checked values of a same-named checkbox group, in document order
    List(Vec<String>),
    Files(Vec<FileHandle>),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FormValue::List(list) => Some(list),
            _ => None,
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<Vec<&str>> for FormValue {
    fn from(list: Vec<&str>) -> Self {
        FormValue::List(list.into_iter().map(str::to_string).collect())
    }
}

/// Field name to normalized value, built fresh for every successful submission
pub type FormValues = BTreeMap<String, FormValue>;
