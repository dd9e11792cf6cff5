//! Client-side form validation engine
//!
//! Binds to one form in a [`Document`], validates fields against per-field rule
//! sequences on blur and submit, keeps error markers in the document in sync,
//! and only lets a submission through when every ruled field passes.
//!
//! Rules can be declared two ways, both feeding the same [`RuleCatalog`]:
//!
//! - explicit [`Rule`] values (or [`RuleSpec`] records in a [`FormConfig`])
//!   keyed by selector or field name;
//! - a pipe-delimited expression stored on the field itself, e.g.
//!   `<input name="password" rules="required|min:6">`.
//!
//! ```ignore
//! use rusty_forms_client::{FormController, MemoryDocument};
//!
//! let controller = FormController::from_attributes(document, "#signup");
//! controller.set_on_submit(|values| {
//!     // values: BTreeMap<String, FormValue>
//! });
//! ```

pub mod config;
pub mod controller;
pub mod dom;
pub mod engine;
pub mod error;
pub mod extract;
pub mod presenter;
pub mod rules;
pub mod value;

pub use config::{FormConfig, RuleSpec};
pub use controller::{FormController, FormState, SubmitHandler};
pub use dom::{
    Document, DomEvent, Element, EventHandler, EventKind, FileHandle, MemoryDocument,
    MemorySubscription, NodeId,
};
pub use engine::{ValidationEngine, ValidationOutcome};
pub use error::RuleError;
pub use extract::ValueExtractor;
pub use presenter::ErrorPresenter;
pub use rules::{Locator, PredicateTable, Rule, RuleCall, RuleCatalog, RuleTest};
pub use value::{FieldKind, FormValue, FormValues, RawValue};
