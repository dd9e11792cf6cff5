//! In-memory document tree
//!
//! Implements [`Document`] without a browser. Handles are cheap to clone and
//! share one tree, the same way DOM element handles do, so a controller and a
//! test can hold the document at the same time.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::{Document, DomEvent, EventHandler, EventKind, FileHandle};

mod selector;

pub use selector::SelectorError;
use selector::SelectorList;

/// Handle to a node of a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Description of an element to append to the tree
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    checked: bool,
    files: Vec<FileHandle>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// `<input type="...">`
    pub fn input(input_type: &str) -> Self {
        Self::new("input").input_type(input_type)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        for class in class.into().split_whitespace() {
            self.classes.push(class.to_string());
        }
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == "class" {
            return self.class(value);
        }
        self.attrs.insert(name, value);
        self
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.attr("name", name)
    }

    pub fn input_type(self, input_type: impl Into<String>) -> Self {
        self.attr("type", input_type)
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    /// Rule expression attribute read by the expression-style binding
    pub fn rules(self, expression: impl Into<String>) -> Self {
        self.attr("rules", expression)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn disabled(self) -> Self {
        self.attr("disabled", "")
    }

    pub fn files(mut self, files: Vec<FileHandle>) -> Self {
        self.files = files;
        self
    }
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    value: String,
    checked: bool,
    files: Vec<FileHandle>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn from_element(element: Element, parent: NodeId) -> Self {
        let value = element.attrs.get("value").cloned().unwrap_or_default();
        Self {
            tag: element.tag,
            attrs: element.attrs,
            classes: element.classes,
            text: element.text,
            value,
            checked: element.checked,
            files: element.files,
            parent: Some(parent),
            children: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if name == "class" {
            return (!self.classes.is_empty()).then(|| self.classes.join(" "));
        }
        self.attrs.get(name).cloned()
    }

    fn input_type(&self) -> Option<String> {
        (self.tag == "input").then(|| {
            self.attrs
                .get("type")
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string())
        })
    }

    fn is_checkable(&self) -> bool {
        matches!(self.input_type().as_deref(), Some("checkbox" | "radio"))
    }
}

#[derive(Debug)]
struct Tree {
    /// Index 0 is the document node itself, never an element
    nodes: Vec<NodeData>,
    submissions: Vec<NodeId>,
}

impl Tree {
    fn new() -> Self {
        let document = NodeData {
            tag: "#document".to_string(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
            files: Vec::new(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![document],
            submissions: Vec::new(),
        }
    }

    fn element(&self, node: NodeId) -> Option<&NodeData> {
        if node.0 == 0 {
            return None;
        }
        self.nodes.get(node.0)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        if node.0 == 0 {
            return None;
        }
        self.nodes.get_mut(node.0)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|data| data.parent)
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(root.0) {
            for child in &data.children {
                out.push(*child);
                self.descendants(*child, out);
            }
        }
    }

    fn select(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(err) => {
                warn!("Ignoring invalid selector {:?}: {}", selector, err);
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        self.descendants(root, &mut candidates);
        candidates
            .into_iter()
            .filter(|node| list.matches(self, *node))
            .collect()
    }
}

struct Listener {
    id: u64,
    node: NodeId,
    kind: EventKind,
    handler: Rc<EventHandler>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<Listener>,
}

/// Subscription to a [`MemoryDocument`] event; the handler is removed on drop
#[must_use = "dropping the subscription unsubscribes the handler"]
pub struct MemorySubscription {
    listeners: Weak<RefCell<Listeners>>,
    id: u64,
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|listener| listener.id != self.id);
        }
    }
}

/// Shared in-memory document
#[derive(Clone)]
pub struct MemoryDocument {
    tree: Rc<RefCell<Tree>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// The document node; append top-level elements here
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append `element` as the last child of `parent`
    pub fn append(&self, parent: NodeId, element: Element) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = NodeId(tree.nodes.len());
        tree.nodes.push(NodeData::from_element(element, parent));
        if let Some(parent) = tree.nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.query_document(&format!("#{}", id))
    }

    /// Current text content of an element
    pub fn text(&self, node: NodeId) -> String {
        self.tree
            .borrow()
            .element(node)
            .map(|data| data.text.clone())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree
            .borrow()
            .element(node)
            .is_some_and(|data| data.classes.iter().any(|c| c == class))
    }

    /// Set a field's value without dispatching any event
    pub fn set_value(&self, node: NodeId, value: impl Into<String>) {
        if let Some(data) = self.tree.borrow_mut().element_mut(node) {
            data.value = value.into();
        }
    }

    /// Set a checkbox or radio state without dispatching any event
    ///
    /// Checking a radio unchecks the other radios sharing its name.
    pub fn set_checked(&self, node: NodeId, checked: bool) {
        let mut tree = self.tree.borrow_mut();
        let Some(data) = tree.element_mut(node) else {
            return;
        };
        data.checked = checked;

        let is_radio = data.input_type().as_deref() == Some("radio");
        let name = data.attrs.get("name").cloned();
        if !(checked && is_radio) {
            return;
        }
        let Some(name) = name else {
            return;
        };

        for (index, other) in tree.nodes.iter_mut().enumerate() {
            if index != node.0
                && other.input_type().as_deref() == Some("radio")
                && other.attrs.get("name") == Some(&name)
            {
                other.checked = false;
            }
        }
    }

    pub fn set_files(&self, node: NodeId, files: Vec<FileHandle>) {
        if let Some(data) = self.tree.borrow_mut().element_mut(node) {
            data.files = files;
        }
    }

    pub fn set_disabled(&self, node: NodeId, disabled: bool) {
        if let Some(data) = self.tree.borrow_mut().element_mut(node) {
            if disabled {
                data.attrs.insert("disabled".to_string(), String::new());
            } else {
                data.attrs.remove("disabled");
            }
        }
    }

    /// Type into a field: replace its value and dispatch an input event
    pub fn type_text(&self, node: NodeId, value: impl Into<String>) {
        self.set_value(node, value);
        self.dispatch(node, EventKind::Input);
    }

    /// Toggle a checkbox or radio and dispatch an input event
    pub fn check(&self, node: NodeId, checked: bool) {
        self.set_checked(node, checked);
        self.dispatch(node, EventKind::Input);
    }

    /// Pick files in a file picker and dispatch an input event
    pub fn choose_files(&self, node: NodeId, files: Vec<FileHandle>) {
        self.set_files(node, files);
        self.dispatch(node, EventKind::Input);
    }

    pub fn blur(&self, node: NodeId) {
        self.dispatch(node, EventKind::Blur);
    }

    /// Dispatch a submit event on `form`; a submission whose default action
    /// is not prevented is recorded as native
    pub fn submit_form(&self, form: NodeId) -> DomEvent {
        let event = self.dispatch(form, EventKind::Submit);
        if !event.default_prevented() {
            self.tree.borrow_mut().submissions.push(form);
        }
        event
    }

    /// Number of native submissions performed so far
    pub fn native_submissions(&self) -> usize {
        self.tree.borrow().submissions.len()
    }

    /// Run every handler subscribed to `kind` on `node`
    pub fn dispatch(&self, node: NodeId, kind: EventKind) -> DomEvent {
        // Handlers are collected first so they can freely use the document,
        // including dispatching further events.
        let handlers: Vec<_> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .filter(|listener| listener.node == node && listener.kind == kind)
            .map(|listener| Rc::clone(&listener.handler))
            .collect();

        let mut event = DomEvent::new(kind);
        for handler in handlers {
            handler(&mut event);
        }
        event
    }

    /// Number of handlers subscribed on `node`
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners
            .borrow()
            .entries
            .iter()
            .filter(|listener| listener.node == node)
            .count()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;
    type Subscription = MemorySubscription;

    fn query_document(&self, selector: &str) -> Option<NodeId> {
        self.tree
            .borrow()
            .select(self.root(), selector)
            .into_iter()
            .next()
    }

    fn query_all(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        self.tree.borrow().select(*root, selector)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.parent_of(*node)
            .filter(|parent| tree.element(*parent).is_some())
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        match SelectorList::parse(selector) {
            Ok(list) => list.matches(&self.tree.borrow(), *node),
            Err(err) => {
                warn!("Ignoring invalid selector {:?}: {}", selector, err);
                false
            }
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .element(*node)
            .and_then(|data| data.attribute(name))
    }

    fn field_type(&self, node: &NodeId) -> String {
        self.tree
            .borrow()
            .element(*node)
            .map(|data| data.input_type().unwrap_or_else(|| data.tag.clone()))
            .unwrap_or_default()
    }

    fn value(&self, node: &NodeId) -> String {
        let tree = self.tree.borrow();
        let Some(data) = tree.element(*node) else {
            return String::new();
        };
        // Checkboxes and radios without a value attribute report "on".
        if data.is_checkable() && !data.attrs.contains_key("value") {
            return "on".to_string();
        }
        data.value.clone()
    }

    fn is_checked(&self, node: &NodeId) -> bool {
        self.tree
            .borrow()
            .element(*node)
            .is_some_and(|data| data.checked)
    }

    fn is_disabled(&self, node: &NodeId) -> bool {
        self.tree
            .borrow()
            .element(*node)
            .is_some_and(|data| data.attrs.contains_key("disabled"))
    }

    fn files(&self, node: &NodeId) -> Vec<FileHandle> {
        self.tree
            .borrow()
            .element(*node)
            .map(|data| data.files.clone())
            .unwrap_or_default()
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        if let Some(data) = self.tree.borrow_mut().element_mut(*node) {
            data.text = text.to_string();
        }
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        if let Some(data) = self.tree.borrow_mut().element_mut(*node) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        if let Some(data) = self.tree.borrow_mut().element_mut(*node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn listen(&self, node: &NodeId, kind: EventKind, handler: EventHandler) -> MemorySubscription {
        let mut listeners = self.listeners.borrow_mut();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push(Listener {
            id,
            node: *node,
            kind,
            handler: Rc::new(handler),
        });
        MemorySubscription {
            listeners: Rc::downgrade(&self.listeners),
            id,
        }
    }

    fn submit(&self, form: &NodeId) {
        self.tree.borrow_mut().submissions.push(*form);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MemoryDocument, NodeId) {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form").id("signup"));
        let group = doc.append(form, Element::new("div").class("form-group"));
        doc.append(
            group,
            Element::input("email").id("email").name("email").value("a@b.co"),
        );
        doc.append(group, Element::new("span").class("form-message"));
        for color in ["red", "green", "blue"] {
            doc.append(
                form,
                Element::input("checkbox").name("colors").value(color),
            );
        }
        doc.append(form, Element::input("text").name("locked").disabled());
        (doc, form)
    }

    #[test]
    fn test_query_by_id_class_and_attribute() {
        let (doc, form) = sample();
        let email = doc.get_by_id("email").unwrap();

        assert_eq!(doc.query_document("#signup"), Some(form));
        assert_eq!(doc.query(&form, r#"[name="email"]"#), Some(email));
        assert_eq!(doc.query(&form, "input[name=email]"), Some(email));
        assert_eq!(doc.query_all(&form, "[name='colors']").len(), 3);
        assert_eq!(doc.query_all(&form, ".form-group .form-message").len(), 1);
        assert_eq!(doc.query_all(&form, "form > .form-group").len(), 1);
        assert_eq!(doc.query_all(&form, "#email, [name=colors]").len(), 4);
    }

    #[test]
    fn test_checked_and_disabled_pseudo_classes() {
        let (doc, form) = sample();
        let boxes = doc.query_all(&form, "[name=colors]");
        doc.set_checked(boxes[1], true);

        assert_eq!(doc.query_all(&form, "[name=colors]:checked"), vec![boxes[1]]);
        assert_eq!(doc.query_all(&form, "[name]").len(), 5);
        assert_eq!(doc.query_all(&form, "[name]:not([disabled])").len(), 4);
        assert_eq!(doc.query_all(&form, "input:disabled").len(), 1);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let (doc, form) = sample();
        assert!(doc.query_all(&form, "input[").is_empty());
        assert!(!doc.matches(&form, "::before"));
    }

    #[test]
    fn test_radio_check_unchecks_same_name() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let small = doc.append(form, Element::input("radio").name("size").value("small"));
        let large = doc.append(form, Element::input("radio").name("size").value("large"));

        doc.set_checked(small, true);
        doc.set_checked(large, true);

        assert!(!doc.is_checked(&small));
        assert!(doc.is_checked(&large));
    }

    #[test]
    fn test_checkbox_without_value_reports_on() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let terms = doc.append(form, Element::input("checkbox").name("terms"));
        assert_eq!(doc.value(&terms), "on");
        assert_eq!(doc.field_type(&terms), "checkbox");
        assert_eq!(doc.field_type(&form), "form");
    }

    #[test]
    fn test_parent_stops_at_document() {
        let (doc, form) = sample();
        assert_eq!(doc.parent(&form), None);
        let group = doc.query(&form, ".form-group").unwrap();
        assert_eq!(doc.parent(&group), Some(form));
    }

    #[test]
    fn test_dispatch_reaches_listeners_and_records_submission() {
        let (doc, form) = sample();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let _subscription = doc.listen(
            &form,
            EventKind::Submit,
            Box::new(move |_event| *counter.borrow_mut() += 1),
        );

        let event = doc.submit_form(form);

        assert!(!event.default_prevented());
        assert_eq!(*seen.borrow(), 1);
        assert_eq!(doc.native_submissions(), 1);
    }

    #[test]
    fn test_dropping_subscription_removes_listener() {
        let (doc, form) = sample();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let subscription = doc.listen(
            &form,
            EventKind::Submit,
            Box::new(move |_event| *counter.borrow_mut() += 1),
        );
        assert_eq!(doc.listener_count(form), 1);

        drop(subscription);
        doc.submit_form(form);
        assert_eq!(doc.listener_count(form), 0);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_handler_can_dispatch_to_itself() {
        let (doc, form) = sample();
        let depth = Rc::new(RefCell::new(0));
        let inner_doc = doc.clone();
        let counter = Rc::clone(&depth);
        let _subscription = doc.listen(
            &form,
            EventKind::Submit,
            Box::new(move |event| {
                event.prevent_default();
                *counter.borrow_mut() += 1;
                if *counter.borrow() == 1 {
                    inner_doc.submit_form(form);
                }
            }),
        );

        doc.submit_form(form);
        assert_eq!(*depth.borrow(), 2);
        assert_eq!(doc.native_submissions(), 0);
    }
}
