// File: src/controller.rs
// Purpose: Bind a form, wire interaction events and gate submission on validation

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::config::FormConfig;
use crate::dom::{DomEvent, Document, EventKind};
use crate::engine::ValidationEngine;
use crate::extract::ValueExtractor;
use crate::presenter::ErrorPresenter;
use crate::rules::{Locator, PredicateTable, Rule, RuleCatalog};
use crate::value::FormValues;

/// Submission state of a bound form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// Success handler receiving the normalized values of a valid form
pub type SubmitHandler = Box<dyn FnMut(FormValues)>;

struct FormBinding<D: Document> {
    document: D,
    form: D::Node,
    config: FormConfig,
    catalog: RuleCatalog,
    state: Cell<FormState>,
    on_submit: RefCell<Option<SubmitHandler>>,
    subscriptions: RefCell<Vec<D::Subscription>>,
}

/// Validation controller for one form
///
/// Construction never fails: when the form selector matches nothing the
/// controller is inert, it subscribes to nothing and every query on it is a
/// no-op. Event handlers only hold a weak reference to the binding, and
/// dropping the last controller handle unsubscribes them.
///
/// ```ignore
/// let controller = FormController::new(
///     document,
///     FormConfig::for_form("#signup"),
///     vec![Rule::required("#email"), Rule::email("#email")],
/// );
/// controller.set_on_submit(|values| println!("{:?}", values));
/// ```
pub struct FormController<D: Document> {
    binding: Option<Rc<FormBinding<D>>>,
}

impl<D: Document> Clone for FormController<D> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<D> FormController<D>
where
    D: Document + 'static,
    D::Node: 'static,
{
    /// Explicit style: bind `config.form` with the given rules
    pub fn new(document: D, config: FormConfig, rules: impl IntoIterator<Item = Rule>) -> Self {
        let catalog: RuleCatalog = rules.into_iter().collect();
        Self::bind(document, config, move |_, _, _| catalog)
    }

    /// Explicit style from the declarative rule specs in `config`
    pub fn from_config(document: D, config: FormConfig) -> Self {
        let rules = config.compile_rules(&PredicateTable::builtin());
        Self::new(document, config, rules)
    }

    /// Expression style with the default markers and predicate table
    pub fn from_attributes(document: D, form_selector: &str) -> Self {
        Self::from_attributes_with(
            document,
            FormConfig::for_form(form_selector),
            &PredicateTable::builtin(),
        )
    }

    /// Expression style: every named field carrying `config.rules_attribute`
    /// contributes the rules its expression compiles to
    ///
    /// Rule specs in `config` are registered first. A field whose expression
    /// fails to compile is logged and left without rules.
    pub fn from_attributes_with(document: D, config: FormConfig, table: &PredicateTable) -> Self {
        Self::bind(document, config, |document, form, config| {
            let mut catalog: RuleCatalog = config.compile_rules(table).into_iter().collect();
            let selector = format!("[name][{}]", config.rules_attribute);

            for field in document.query_all(form, &selector) {
                let name = document.attribute(&field, "name").unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                let expression = document
                    .attribute(&field, &config.rules_attribute)
                    .unwrap_or_default();
                if let Err(err) = catalog.register_from_expression(&name, &expression, table) {
                    warn!("Field {:?} has no rules: {}", name, err);
                }
            }
            catalog
        })
    }

    fn bind<F>(document: D, config: FormConfig, build: F) -> Self
    where
        F: FnOnce(&D, &D::Node, &FormConfig) -> RuleCatalog,
    {
        let Some(form) = document.query_document(&config.form) else {
            warn!("Form {:?} not found; validator is inert", config.form);
            return Self { binding: None };
        };

        let catalog = build(&document, &form, &config);
        let binding = Rc::new(FormBinding {
            document,
            form,
            config,
            catalog,
            state: Cell::new(FormState::Idle),
            on_submit: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
        });
        FormBinding::subscribe(&binding);

        Self {
            binding: Some(binding),
        }
    }

    /// Handler invoked with the form values after a valid submission;
    /// without one the form is submitted natively
    pub fn set_on_submit<F>(&self, handler: F)
    where
        F: FnMut(FormValues) + 'static,
    {
        if let Some(binding) = &self.binding {
            *binding.on_submit.borrow_mut() = Some(Box::new(handler));
        }
    }

    /// Run the full-form pass and update every group, without submitting
    pub fn validate_form(&self) -> bool {
        self.binding
            .as_ref()
            .map_or(true, |binding| binding.validate_all())
    }

    /// Current normalized values of the bound form
    pub fn form_values(&self) -> Option<FormValues> {
        self.binding.as_ref().map(|binding| {
            ValueExtractor::new(&binding.document, &binding.form).extract_form_values()
        })
    }

    pub fn state(&self) -> FormState {
        self.binding
            .as_ref()
            .map_or(FormState::Idle, |binding| binding.state.get())
    }

    /// Whether the form selector resolved at construction
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn form(&self) -> Option<&D::Node> {
        self.binding.as_ref().map(|binding| &binding.form)
    }

    pub fn config(&self) -> Option<&FormConfig> {
        self.binding.as_ref().map(|binding| &binding.config)
    }
}

impl<D> FormBinding<D>
where
    D: Document + 'static,
    D::Node: 'static,
{
    /// Install blur/input handlers once per concrete field and the submit
    /// handler on the form
    fn subscribe(this: &Rc<Self>) {
        let mut fields: Vec<(D::Node, Vec<Locator>)> = Vec::new();
        for locator in this.catalog.locators() {
            let resolved = locator.resolve(&this.document, &this.form);
            if resolved.is_empty() {
                debug!("Locator {} matches no field; its rules are inert", locator);
            }
            for field in resolved {
                match fields.iter_mut().find(|(known, _)| *known == field) {
                    Some((_, locators)) => locators.push(locator.clone()),
                    None => fields.push((field, vec![locator.clone()])),
                }
            }
        }

        info!(
            "Bound form {:?}: {} locator(s), {} field(s)",
            this.config.form,
            this.catalog.len(),
            fields.len()
        );

        let mut subscriptions = Vec::with_capacity(fields.len() * 2 + 1);
        for (field, locators) in fields {
            let weak = Rc::downgrade(this);
            let blurred = field.clone();
            subscriptions.push(this.document.listen(
                &field,
                EventKind::Blur,
                Box::new(move |_event: &mut DomEvent| {
                    if let Some(binding) = weak.upgrade() {
                        binding.validate_field(&blurred, &locators);
                    }
                }),
            ));

            let weak = Rc::downgrade(this);
            let changed = field.clone();
            subscriptions.push(this.document.listen(
                &field,
                EventKind::Input,
                Box::new(move |_event: &mut DomEvent| {
                    if let Some(binding) = weak.upgrade() {
                        binding.presenter().clear_on_input(&changed);
                    }
                }),
            ));
        }

        let weak: Weak<Self> = Rc::downgrade(this);
        subscriptions.push(this.document.listen(
            &this.form,
            EventKind::Submit,
            Box::new(move |event: &mut DomEvent| {
                if let Some(binding) = weak.upgrade() {
                    binding.handle_submit(event);
                }
            }),
        ));

        *this.subscriptions.borrow_mut() = subscriptions;
    }

    fn engine(&self) -> ValidationEngine<'_, D> {
        ValidationEngine::new(&self.catalog, &self.document, &self.form)
    }

    fn presenter(&self) -> ErrorPresenter<'_, D> {
        ErrorPresenter::new(&self.document, &self.form, &self.config)
    }

    /// Blur path: this field alone, under every locator it was bound by
    fn validate_field(&self, field: &D::Node, locators: &[Locator]) {
        let engine = self.engine();
        let message = locators
            .iter()
            .find_map(|locator| engine.validate(field, locator).message);
        self.presenter().present(field, message.as_deref());
    }

    /// Every locator is checked against its first field, and every outcome
    /// is presented, even after a failure
    fn validate_all(&self) -> bool {
        let engine = self.engine();
        let mut outcomes: Vec<(D::Node, Option<String>)> = Vec::new();

        for locator in self.catalog.locators() {
            let Some(field) = self.document.query(&self.form, &locator.to_selector()) else {
                continue;
            };
            let outcome = engine.validate(&field, locator);
            match outcomes.iter_mut().find(|(known, _)| *known == outcome.field) {
                Some((_, message)) => {
                    if message.is_none() {
                        *message = outcome.message;
                    }
                }
                None => outcomes.push((outcome.field, outcome.message)),
            }
        }

        let presenter = self.presenter();
        let mut valid = true;
        for (field, message) in &outcomes {
            presenter.present(field, message.as_deref());
            valid &= message.is_none();
        }
        valid
    }

    fn handle_submit(&self, event: &mut DomEvent) {
        event.prevent_default();

        if self.state.get() != FormState::Idle {
            debug!("Submit ignored while {:?}", self.state.get());
            return;
        }

        self.state.set(FormState::Validating);
        if self.validate_all() {
            self.state.set(FormState::Submitting);
            self.dispatch_success();
        } else {
            debug!("Form {:?} is invalid; submission blocked", self.config.form);
        }
        self.state.set(FormState::Idle);
    }

    fn dispatch_success(&self) {
        // Taken out so the handler may replace itself while running.
        let handler = self.on_submit.borrow_mut().take();
        match handler {
            Some(mut handler) => {
                let values =
                    ValueExtractor::new(&self.document, &self.form).extract_form_values();
                debug!("Submitting {} value(s) to handler", values.len());
                handler(values);

                let mut slot = self.on_submit.borrow_mut();
                if slot.is_none() {
                    *slot = Some(handler);
                }
            }
            None => {
                debug!("No submit handler; submitting {:?} natively", self.config.form);
                self.document.submit(&self.form);
            }
        }
    }
}
