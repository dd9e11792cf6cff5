/// Integration tests for explicitly declared rules
///
/// Each test builds a small form in a MemoryDocument, binds a controller with
/// `Rule` values and drives it through blur, input and submit events.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rusty_forms_client::{
    Document, Element, FileHandle, FormConfig, FormController, FormValue, FormValues, Locator,
    MemoryDocument, NodeId, Rule, RuleSpec,
};
use std::cell::RefCell;
use std::rc::Rc;

struct SignupForm {
    doc: MemoryDocument,
    form: NodeId,
    email: NodeId,
    password: NodeId,
    confirm: NodeId,
    newsletter: NodeId,
    legacy: NodeId,
}

impl SignupForm {
    fn new() -> Self {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form").id("signup"));

        let email = Self::field(&doc, form, Element::input("email").id("email").name("email"));
        let password = Self::field(
            &doc,
            form,
            Element::input("password").id("password").name("password"),
        );
        let confirm = Self::field(
            &doc,
            form,
            Element::input("password").id("confirm").name("confirm"),
        );
        let newsletter = Self::field(
            &doc,
            form,
            Element::input("checkbox").name("newsletter").value("weekly"),
        );
        let legacy = Self::field(
            &doc,
            form,
            Element::input("text").id("legacy").name("legacy").disabled(),
        );
        Self::field(&doc, form, Element::input("text").id("nickname"));

        Self {
            doc,
            form,
            email,
            password,
            confirm,
            newsletter,
            legacy,
        }
    }

    fn field(doc: &MemoryDocument, form: NodeId, input: Element) -> NodeId {
        let group = doc.append(form, Element::new("div").class("form-group"));
        let field = doc.append(group, input);
        doc.append(group, Element::new("span").class("form-message"));
        field
    }

    fn group(&self, field: NodeId) -> NodeId {
        self.doc.parent(&field).unwrap()
    }

    fn message(&self, field: NodeId) -> String {
        let slot = self.doc.query(&self.group(field), ".form-message").unwrap();
        self.doc.text(slot)
    }

    fn is_invalid(&self, field: NodeId) -> bool {
        self.doc.has_class(self.group(field), "invalid")
    }

    fn bind(&self) -> FormController<MemoryDocument> {
        let doc = self.doc.clone();
        let password = self.password;
        FormController::new(
            self.doc.clone(),
            FormConfig::for_form("#signup"),
            vec![
                Rule::required("#email"),
                Rule::email("#email"),
                Rule::required("#password"),
                Rule::min_length("#password", 6),
                Rule::required("#confirm"),
                Rule::matching("#confirm", move || doc.value(&password))
                    .with_message("Passwords do not match"),
                Rule::required("#legacy"),
            ],
        )
    }

    fn fill_valid(&self) {
        self.doc.set_value(self.email, "ada@example.com");
        self.doc.set_value(self.password, "analytical");
        self.doc.set_value(self.confirm, "analytical");
        self.doc.set_value(self.legacy, "ignored");
    }
}

fn capture(controller: &FormController<MemoryDocument>) -> Rc<RefCell<Vec<FormValues>>> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    controller.set_on_submit(move |values| sink.borrow_mut().push(values));
    calls
}

// ============================================================================
// Blur and input
// ============================================================================

#[test]
fn test_blur_shows_first_failing_message() {
    let form = SignupForm::new();
    let _controller = form.bind();

    form.doc.blur(form.email);
    assert_eq!(form.message(form.email), "Please enter the value");
    assert!(form.is_invalid(form.email));

    form.doc.set_value(form.email, "not-an-email");
    form.doc.blur(form.email);
    assert_eq!(form.message(form.email), "Please enter a valid email address");

    form.doc.set_value(form.email, "ada@example.com");
    form.doc.blur(form.email);
    assert_eq!(form.message(form.email), "");
    assert!(!form.is_invalid(form.email));
}

#[test]
fn test_input_clears_error_without_revalidating() {
    let form = SignupForm::new();
    let _controller = form.bind();

    form.doc.blur(form.password);
    assert!(form.is_invalid(form.password));

    // Still too short, but typing clears the error anyway.
    form.doc.type_text(form.password, "abc");
    assert_eq!(form.message(form.password), "");
    assert!(!form.is_invalid(form.password));
}

#[test]
fn test_blur_on_other_field_leaves_siblings_alone() {
    let form = SignupForm::new();
    let _controller = form.bind();

    form.doc.blur(form.password);
    assert!(form.is_invalid(form.password));
    assert!(!form.is_invalid(form.email));
}

#[rstest]
#[case("12345", Some("Please enter at least 6 characters"))]
#[case("123456", None)]
fn test_min_length_on_blur(#[case] password: &str, #[case] expected: Option<&str>) {
    let form = SignupForm::new();
    let _controller = form.bind();

    form.doc.set_value(form.password, password);
    form.doc.blur(form.password);
    assert_eq!(form.message(form.password), expected.unwrap_or(""));
}

#[test]
fn test_matching_reads_other_field_at_validation_time() {
    let form = SignupForm::new();
    let _controller = form.bind();

    form.doc.set_value(form.password, "analytical");
    form.doc.set_value(form.confirm, "analytic");
    form.doc.blur(form.confirm);
    assert_eq!(form.message(form.confirm), "Passwords do not match");

    form.doc.set_value(form.password, "analytic");
    form.doc.blur(form.confirm);
    assert_eq!(form.message(form.confirm), "");
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_invalid_submit_blocks_and_marks_every_failing_group() {
    let form = SignupForm::new();
    let controller = form.bind();
    let calls = capture(&controller);

    form.doc.set_value(form.email, "ada@example.com");
    let event = form.doc.submit_form(form.form);

    assert!(event.default_prevented());
    assert!(calls.borrow().is_empty());
    assert_eq!(form.doc.native_submissions(), 0);
    assert!(!form.is_invalid(form.email));
    assert!(form.is_invalid(form.password));
    assert!(form.is_invalid(form.confirm));
}

#[test]
fn test_valid_submit_invokes_handler_once_with_enabled_named_fields() {
    let form = SignupForm::new();
    let controller = form.bind();
    let calls = capture(&controller);

    form.fill_valid();
    form.doc.set_checked(form.newsletter, true);
    form.doc.submit_form(form.form);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);

    let mut expected = FormValues::new();
    expected.insert("email".into(), "ada@example.com".into());
    expected.insert("password".into(), "analytical".into());
    expected.insert("confirm".into(), "analytical".into());
    expected.insert("newsletter".into(), vec!["weekly"].into());
    assert_eq!(calls[0], expected);
    assert_eq!(form.doc.native_submissions(), 0);
}

#[test]
fn test_valid_submit_without_handler_submits_natively() {
    let form = SignupForm::new();
    let _controller = form.bind();

    form.fill_valid();
    let event = form.doc.submit_form(form.form);

    assert!(event.default_prevented());
    assert_eq!(form.doc.native_submissions(), 1);
}

#[test]
fn test_each_submission_builds_fresh_values() {
    let form = SignupForm::new();
    let controller = form.bind();
    let calls = capture(&controller);

    form.fill_valid();
    form.doc.submit_form(form.form);
    form.doc.set_value(form.email, "grace@example.com");
    form.doc.submit_form(form.form);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["email"], FormValue::from("ada@example.com"));
    assert_eq!(calls[1]["email"], FormValue::from("grace@example.com"));
}

#[test]
fn test_handler_set_after_failed_submit_runs_on_next_valid_submit() {
    let form = SignupForm::new();
    let controller = form.bind();

    form.doc.submit_form(form.form);
    let calls = capture(&controller);
    form.fill_valid();
    form.doc.submit_form(form.form);

    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn test_validate_form_without_submitting() {
    let form = SignupForm::new();
    let controller = form.bind();
    let calls = capture(&controller);

    assert!(!controller.validate_form());
    assert!(form.is_invalid(form.email));

    form.fill_valid();
    assert!(controller.validate_form());
    assert!(!form.is_invalid(form.email));
    assert!(calls.borrow().is_empty());
}

// ============================================================================
// Groups, files and locators
// ============================================================================

#[test]
fn test_required_checkbox_group_by_name() {
    let doc = MemoryDocument::new();
    let form = doc.append(doc.root(), Element::new("form").id("prefs"));
    let group = doc.append(form, Element::new("fieldset").class("form-group"));
    let boxes: Vec<_> = ["red", "green", "blue"]
        .into_iter()
        .map(|color| doc.append(group, Element::input("checkbox").name("colors").value(color)))
        .collect();
    let slot = doc.append(group, Element::new("span").class("form-message"));

    let controller = FormController::new(
        doc.clone(),
        FormConfig::for_form("#prefs"),
        vec![Rule::required(Locator::name("colors")).with_message("Pick a color")],
    );
    let calls = capture(&controller);

    doc.submit_form(form);
    assert_eq!(doc.text(slot), "Pick a color");

    doc.check(boxes[2], true);
    assert_eq!(doc.text(slot), "");
    doc.set_checked(boxes[0], true);
    doc.submit_form(form);

    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(calls.borrow()[0]["colors"], FormValue::from(vec!["red", "blue"]));
}

#[test]
fn test_required_file_field() {
    let doc = MemoryDocument::new();
    let form = doc.append(doc.root(), Element::new("form").id("upload"));
    let group = doc.append(form, Element::new("div").class("form-group"));
    let picker = doc.append(group, Element::input("file").id("avatar").name("avatar"));
    doc.append(group, Element::new("span").class("form-message"));

    let controller = FormController::new(
        doc.clone(),
        FormConfig::for_form("#upload"),
        vec![Rule::required("#avatar")],
    );
    let calls = capture(&controller);

    doc.submit_form(form);
    assert!(doc.has_class(group, "invalid"));

    let avatar = FileHandle::new("me.png", 512, "image/png");
    doc.choose_files(picker, vec![avatar.clone()]);
    assert!(!doc.has_class(group, "invalid"));
    doc.submit_form(form);

    assert_eq!(calls.borrow()[0]["avatar"], FormValue::Files(vec![avatar]));
}

#[test]
fn test_locator_matching_several_fields_shares_rules() {
    let doc = MemoryDocument::new();
    let form = doc.append(doc.root(), Element::new("form").id("team"));
    let mut fields = Vec::new();
    for name in ["first", "second"] {
        let group = doc.append(form, Element::new("div").class("form-group"));
        fields.push(doc.append(group, Element::input("text").class("member").name(name)));
        doc.append(group, Element::new("span").class("form-message"));
    }

    let _controller = FormController::new(
        doc.clone(),
        FormConfig::for_form("#team"),
        vec![Rule::required(".member")],
    );

    doc.blur(fields[1]);
    assert!(doc.has_class(doc.parent(&fields[1]).unwrap(), "invalid"));
    assert!(!doc.has_class(doc.parent(&fields[0]).unwrap(), "invalid"));
}

#[test]
fn test_rule_for_unresolved_locator_is_inert() {
    let form = SignupForm::new();
    let controller = FormController::new(
        form.doc.clone(),
        FormConfig::for_form("#signup"),
        vec![Rule::required("#does-not-exist")],
    );
    let calls = capture(&controller);

    form.doc.submit_form(form.form);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn test_forms_are_independent() {
    let doc = MemoryDocument::new();
    let mut forms = Vec::new();
    for id in ["a", "b"] {
        let form = doc.append(doc.root(), Element::new("form").id(id));
        let group = doc.append(form, Element::new("div").class("form-group"));
        doc.append(group, Element::input("text").class("name").name("name"));
        doc.append(group, Element::new("span").class("form-message"));
        forms.push((form, group));
    }

    let _a = FormController::new(
        doc.clone(),
        FormConfig::for_form("#a"),
        vec![Rule::required(".name")],
    );
    let _b = FormController::new(doc.clone(), FormConfig::for_form("#b"), vec![]);

    doc.submit_form(forms[0].0);
    doc.submit_form(forms[1].0);
    assert!(doc.has_class(forms[0].1, "invalid"));
    assert!(!doc.has_class(forms[1].1, "invalid"));
    assert_eq!(doc.native_submissions(), 1);
}

#[test]
fn test_from_config_rule_specs() {
    let form = SignupForm::new();
    let config = FormConfig {
        rules: vec![
            RuleSpec::for_selector("#email", "required|email"),
            RuleSpec::for_name("password", "min:8").with_message("Eight or more"),
            RuleSpec::for_name("confirm", "required|bogus"),
        ],
        ..FormConfig::for_form("#signup")
    };
    let controller = FormController::from_config(form.doc.clone(), config);

    form.doc.set_value(form.email, "ada@example.com");
    form.doc.set_value(form.password, "short");
    assert!(!controller.validate_form());
    assert_eq!(form.message(form.password), "Eight or more");
    assert!(!form.is_invalid(form.confirm));
}
