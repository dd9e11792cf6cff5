//! Document capability consumed by the engine
//!
//! The engine never owns a document tree. Everything it needs (element lookup,
//! field state, class markers, event subscription, native submission) goes
//! through [`Document`], implemented over the browser DOM by the wasm crate and
//! in memory by [`MemoryDocument`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::{Element, MemoryDocument, MemorySubscription, NodeId};

/// Interaction events the engine subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Field lost focus
    Blur,
    /// Field value changed (typing, toggling, choosing files)
    Input,
    /// Form submitted
    Submit,
}

impl EventKind {
    /// Host event name for this kind
    pub fn event_name(self) -> &'static str {
        match self {
            EventKind::Blur => "blur",
            EventKind::Input => "input",
            EventKind::Submit => "submit",
        }
    }
}

/// Engine-side view of a dispatched event
#[derive(Debug, Clone)]
pub struct DomEvent {
    kind: EventKind,
    default_prevented: bool,
}

impl DomEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            default_prevented: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Suppress the host's default action (navigation on submit)
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Callback registered through [`Document::listen`]
///
/// Handlers only take `&self` state so that an event dispatched from inside a
/// handler can run the same handler again.
pub type EventHandler = Box<dyn Fn(&mut DomEvent)>;

/// One file selected in a file picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Trait for document trees the engine can bind a form to
///
/// Lookups return `Option`/empty collections instead of failing: a selector that
/// matches nothing is a normal outcome for the engine.
pub trait Document {
    /// Handle to one element of the tree
    type Node: Clone + PartialEq + fmt::Debug;

    /// Guard returned by [`Document::listen`]; dropping it unsubscribes
    type Subscription;

    /// Resolve the first element matching `selector` anywhere in the document
    fn query_document(&self, selector: &str) -> Option<Self::Node>;

    /// Resolve every descendant of `root` matching `selector`, in document order
    fn query_all(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Resolve the first descendant of `root` matching `selector`
    fn query(&self, root: &Self::Node, selector: &str) -> Option<Self::Node> {
        self.query_all(root, selector).into_iter().next()
    }

    /// Parent element, `None` at the top of the tree
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Whether `node` itself matches `selector`
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Declared field type: the `type` of an input, otherwise the lowercase tag name
    fn field_type(&self, node: &Self::Node) -> String;

    /// Current scalar value of a field
    fn value(&self, node: &Self::Node) -> String;

    fn is_checked(&self, node: &Self::Node) -> bool;

    fn is_disabled(&self, node: &Self::Node) -> bool;

    /// Files currently selected in a file picker (empty for other fields)
    fn files(&self, node: &Self::Node) -> Vec<FileHandle>;

    /// Replace the text content of an element
    fn set_text(&self, node: &Self::Node, text: &str);

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    /// Subscribe `handler` to `kind` events dispatched on `node` for as long
    /// as the returned guard lives
    #[must_use = "dropping the subscription unsubscribes the handler"]
    fn listen(
        &self,
        node: &Self::Node,
        kind: EventKind,
        handler: EventHandler,
    ) -> Self::Subscription;

    /// Perform the host's native form submission (no submit event is fired)
    fn submit(&self, form: &Self::Node);
}
