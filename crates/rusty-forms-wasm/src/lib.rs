//! rusty-forms WASM
//!
//! Browser bindings for the rusty-forms validation engine. Exposes a
//! `Validator` class supporting both ways of declaring rules.
//!
//! # Example (JavaScript)
//! ```javascript
//! // Rules read from the markup: <input name="email" rules="required|email">
//! const signup = new Validator('#signup');
//! signup.onSubmit = (values) => console.log(values);
//!
//! // Rules passed explicitly
//! Validator.fromOptions({
//!     form: '#login',
//!     formGroupSelector: '.form-group',
//!     errorSelector: '.form-message',
//!     rules: [
//!         { selector: '#email', rule: 'required|email' },
//!         { selector: '#password', rule: 'min:6', message: 'Six characters or more' },
//!         { name: 'confirm', test: (value) => value === password.value ? undefined : 'No match' },
//!     ],
//!     onSubmit: (values) => fetch('/login', { method: 'POST', body: JSON.stringify(values) }),
//! });
//! ```

use js_sys::{Function, Reflect};
use rusty_forms_client::{
    Document, FormConfig, FormController, FormValue, FormValues, Locator, PredicateTable, RawValue,
    Rule, RuleSpec,
};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod document;
pub mod logging;

pub use document::{WebDocument, WebSubscription};

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Route engine logs to the browser console
///
/// # Example (JavaScript)
/// ```javascript
/// enableLogging('debug');
/// ```
#[wasm_bindgen(js_name = enableLogging)]
pub fn enable_logging(level: Option<String>) -> Result<(), JsValue> {
    logging::init(level.as_deref()).map_err(|err| JsValue::from_str(&err))
}

/// Quick email check with the same grammar the `email` rule uses
#[wasm_bindgen(js_name = isValidEmail)]
pub fn is_valid_email_js(email: &str) -> bool {
    rusty_forms_validation::is_valid_email(email)
}

/// Validation bound to one form in the current document
#[wasm_bindgen]
pub struct Validator {
    document: WebDocument,
    controller: FormController<WebDocument>,
}

#[wasm_bindgen]
impl Validator {
    /// Bind `formSelector`, reading each field's `rules` attribute
    #[wasm_bindgen(constructor)]
    pub fn new(form_selector: &str) -> Result<Validator, JsValue> {
        let document = current_document()?;
        let controller = FormController::from_attributes(document.clone(), form_selector);
        Ok(Validator {
            document,
            controller,
        })
    }

    /// Bind with explicit rules: `{ form, formGroupSelector, errorSelector, rules, onSubmit }`
    #[wasm_bindgen(js_name = fromOptions)]
    pub fn from_options(options: JsValue) -> Result<Validator, JsValue> {
        let document = current_document()?;

        let mut config: FormConfig = serde_wasm_bindgen::from_value(options.clone())
            .map_err(|e| JsValue::from_str(&format!("Failed to parse options: {}", e)))?;
        config.rules.clear();

        let rules = rules_from_options(&options)?;
        let controller = FormController::new(document.clone(), config, rules);

        let validator = Validator {
            document,
            controller,
        };
        if let Some(handler) = get(&options, "onSubmit")?.dyn_ref::<Function>() {
            validator.set_on_submit(handler.clone());
        }
        Ok(validator)
    }

    /// Called with the form values once a submission validates
    #[wasm_bindgen(setter = onSubmit)]
    pub fn set_on_submit(&self, handler: Function) {
        let Some(form) = self.controller.form().cloned() else {
            return;
        };
        let document = self.document.clone();

        self.controller.set_on_submit(move |values| {
            let result = values_to_js(&document, &form, &values)
                .and_then(|object| handler.call1(&JsValue::NULL, &object));
            if let Err(err) = result {
                warn!("onSubmit handler failed: {:?}", err);
            }
        });
    }

    /// Validate every ruled field and update the page, without submitting
    pub fn validate(&self) -> bool {
        self.controller.validate_form()
    }

    /// Current form values as a plain object (`undefined` when unbound)
    pub fn values(&self) -> Result<JsValue, JsValue> {
        match (self.controller.form(), self.controller.form_values()) {
            (Some(form), Some(values)) => values_to_js(&self.document, form, &values),
            _ => Ok(JsValue::UNDEFINED),
        }
    }

    /// Whether the form selector matched an element
    #[wasm_bindgen(getter)]
    pub fn bound(&self) -> bool {
        self.controller.is_bound()
    }
}

#[wasm_bindgen]
extern "C" {
    /// The global `String(value)` conversion
    #[wasm_bindgen(js_name = String, catch)]
    fn coerce_to_string(value: &JsValue) -> Result<String, JsValue>;
}

fn current_document() -> Result<WebDocument, JsValue> {
    WebDocument::from_window().ok_or_else(|| JsValue::from_str("No document available"))
}

fn get(object: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    if object.is_object() {
        Reflect::get(object, &JsValue::from_str(key))
    } else {
        Ok(JsValue::UNDEFINED)
    }
}

/// Explicit rules from `options.rules`; a broken item is logged and skipped
fn rules_from_options(options: &JsValue) -> Result<Vec<Rule>, JsValue> {
    let items = get(options, "rules")?;
    if items.is_undefined() || items.is_null() {
        return Ok(Vec::new());
    }
    let items: js_sys::Array = items
        .dyn_into()
        .map_err(|_| JsValue::from_str("`rules` must be an array"))?;

    let table = PredicateTable::builtin();
    let mut rules = Vec::new();
    for item in items.iter() {
        let spec: RuleSpec = serde_wasm_bindgen::from_value(item.clone())
            .map_err(|e| JsValue::from_str(&format!("Failed to parse rule: {}", e)))?;

        let compiled = match get(&item, "test")?.dyn_into::<Function>() {
            Ok(test) => spec.locator().map(|locator| {
                let rule = Rule::new(locator, move |value| call_test(&test, value));
                vec![match &spec.message {
                    Some(message) => rule.with_message(message.clone()),
                    None => rule,
                }]
            }),
            Err(_) => spec.compile(&table),
        };

        match compiled {
            Ok(compiled) => rules.extend(compiled),
            Err(err) => warn!("Skipping rule {:?}: {}", spec.rule, err),
        }
    }
    Ok(rules)
}

/// Run a JS rule test: any truthy result fails, with `String(result)` as the
/// message
fn call_test(test: &Function, value: &RawValue) -> Option<String> {
    let argument = match value {
        RawValue::Choice(None) => JsValue::UNDEFINED,
        other => JsValue::from_str(other.as_text()),
    };
    match test.call1(&JsValue::NULL, &argument) {
        Ok(result) if result.is_truthy() => Some(
            result
                .as_string()
                .or_else(|| coerce_to_string(&result).ok())
                .unwrap_or_else(|| format!("{:?}", result)),
        ),
        Ok(_) => None,
        Err(err) => {
            warn!("Rule test threw: {:?}", err);
            None
        }
    }
}

/// Plain object of the form values; file fields carry the input's `FileList`
fn values_to_js(
    document: &WebDocument,
    form: &web_sys::Element,
    values: &FormValues,
) -> Result<JsValue, JsValue> {
    let object = values
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to convert values: {}", e)))?;

    for (name, value) in values {
        if !matches!(value, FormValue::Files(_)) {
            continue;
        }
        let selector = format!(r#"input[type="file"]{}"#, Locator::name(name).to_selector());
        let list = document
            .query(form, &selector)
            .and_then(|input| document.file_list(&input));
        if let Some(list) = list {
            Reflect::set(&object, &JsValue::from_str(name), &list)?;
        }
    }
    Ok(object)
}
