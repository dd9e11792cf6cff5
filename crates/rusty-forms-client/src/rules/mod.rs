//! Validation rules
//!
//! A rule pairs a [`Locator`] with a test over the field's [`RawValue`]. Tests
//! return `None` when the value passes and the error message otherwise.
//!
//! ```ignore
//! let rules = vec![
//!     Rule::required("#email"),
//!     Rule::email("#email").with_message("That doesn't look like an email"),
//!     Rule::min_length("#password", 6),
//! ];
//! ```

use std::fmt;
use std::rc::Rc;

use crate::dom::Document;
use crate::value::RawValue;

pub mod catalog;
pub mod expression;

pub use catalog::RuleCatalog;
pub use expression::{PredicateFactory, PredicateTable, RuleCall};

pub const REQUIRED_MESSAGE: &str = "Please enter the value";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const MATCHING_MESSAGE: &str = "Please enter the same value";

/// Test over a field's raw value: `None` on pass, the error message on failure
pub type RuleTest = Rc<dyn Fn(&RawValue) -> Option<String>>;

/// Way of finding one or more fields inside a bound form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Structural selector, e.g. `#email` or `input[name="gender"]`
    Selector(String),
    /// Field name attribute
    Name(String),
}

impl Locator {
    pub fn selector(selector: impl Into<String>) -> Self {
        Locator::Selector(selector.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    /// Selector string this locator resolves through
    pub fn to_selector(&self) -> String {
        match self {
            Locator::Selector(selector) => selector.clone(),
            Locator::Name(name) => format!(r#"[name="{}"]"#, escape_attr_value(name)),
        }
    }

    /// Every field inside `form` this locator matches, in document order
    pub fn resolve<D: Document>(&self, document: &D, form: &D::Node) -> Vec<D::Node> {
        document.query_all(form, &self.to_selector())
    }
}

/// Escape `value` for use inside a double-quoted attribute selector
pub fn escape_attr_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Selector(selector) => write!(f, "{}", selector),
            Locator::Name(name) => write!(f, "name={}", name),
        }
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Locator::Selector(selector.to_string())
    }
}

impl From<String> for Locator {
    fn from(selector: String) -> Self {
        Locator::Selector(selector)
    }
}

/// A test bound to the fields a locator finds
#[derive(Clone)]
pub struct Rule {
    pub locator: Locator,
    pub test: RuleTest,
}

impl Rule {
    /// Custom rule
    pub fn new<F>(locator: impl Into<Locator>, test: F) -> Self
    where
        F: Fn(&RawValue) -> Option<String> + 'static,
    {
        Self {
            locator: locator.into(),
            test: Rc::new(test),
        }
    }

    pub fn from_test(locator: impl Into<Locator>, test: RuleTest) -> Self {
        Self {
            locator: locator.into(),
            test,
        }
    }

    /// Field must hold a value (a checked box/radio, a chosen file, non-empty text)
    pub fn required(locator: impl Into<Locator>) -> Self {
        Self::from_test(locator, required())
    }

    pub fn email(locator: impl Into<Locator>) -> Self {
        Self::from_test(locator, email())
    }

    /// At least `min` characters
    pub fn min_length(locator: impl Into<Locator>, min: usize) -> Self {
        Self::from_test(locator, min_length(min))
    }

    /// Value must equal `confirm_value()`, read each time the rule runs
    pub fn matching<F>(locator: impl Into<Locator>, confirm_value: F) -> Self
    where
        F: Fn() -> String + 'static,
    {
        Self::new(locator, move |value| {
            if rusty_forms_validation::equals(value.as_text(), &confirm_value()) {
                None
            } else {
                Some(MATCHING_MESSAGE.to_string())
            }
        })
    }

    /// Replace the failure message of this rule
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.test = with_message(self.test, message.into());
        self
    }

    /// Run the test against a raw value
    pub fn check(&self, value: &RawValue) -> Option<String> {
        (self.test)(value)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

pub fn required() -> RuleTest {
    Rc::new(|value: &RawValue| {
        if value.is_present() {
            None
        } else {
            Some(REQUIRED_MESSAGE.to_string())
        }
    })
}

pub fn email() -> RuleTest {
    Rc::new(|value: &RawValue| {
        if rusty_forms_validation::is_valid_email(value.as_text()) {
            None
        } else {
            Some(EMAIL_MESSAGE.to_string())
        }
    })
}

pub fn min_length(min: usize) -> RuleTest {
    Rc::new(move |value: &RawValue| {
        rusty_forms_validation::validate_min_length(value.as_text(), min).err()
    })
}

/// Wrap `test` so that any failure reports `message` instead
pub fn with_message(test: RuleTest, message: String) -> RuleTest {
    Rc::new(move |value: &RawValue| test(value).map(|_| message.clone()))
}
