//! `Document` over the browser DOM

use rusty_forms_client::{DomEvent, Document, EventHandler, EventKind, FileHandle};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
};

/// Browser listener registration; removed from its target on drop
#[must_use = "dropping the subscription unsubscribes the handler"]
pub struct WebSubscription {
    target: Element,
    event: &'static str,
    closure: Closure<dyn Fn(Event)>,
}

impl Drop for WebSubscription {
    fn drop(&mut self) {
        // Detach first so the browser never calls a freed closure.
        let _ = self.target.remove_event_listener_with_callback(
            self.event,
            self.closure.as_ref().unchecked_ref(),
        );
    }
}

/// Shared handle to a browser document
#[derive(Clone)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// Document of the current window, if there is one
    pub fn from_window() -> Option<Self> {
        web_sys::window()?.document().map(Self::new)
    }

    pub fn inner(&self) -> &web_sys::Document {
        &self.document
    }

    /// Native file list of a file picker
    pub fn file_list(&self, node: &Element) -> Option<web_sys::FileList> {
        node.dyn_ref::<HtmlInputElement>()?.files()
    }
}

impl Document for WebDocument {
    type Node = Element;
    type Subscription = WebSubscription;

    fn query_document(&self, selector: &str) -> Option<Element> {
        match self.document.query_selector(selector) {
            Ok(found) => found,
            Err(err) => {
                warn!("Invalid selector {:?}: {:?}", selector, err);
                None
            }
        }
    }

    fn query_all(&self, root: &Element, selector: &str) -> Vec<Element> {
        match root.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|index| list.item(index))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(err) => {
                warn!("Invalid selector {:?}: {:?}", selector, err);
                Vec::new()
            }
        }
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn field_type(&self, node: &Element) -> String {
        match node.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.type_(),
            None => node.tag_name().to_ascii_lowercase(),
        }
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn is_checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>()
            .is_some_and(|input| input.checked())
    }

    fn is_disabled(&self, node: &Element) -> bool {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.disabled()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.disabled()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.disabled()
        } else {
            node.has_attribute("disabled")
        }
    }

    fn files(&self, node: &Element) -> Vec<FileHandle> {
        let Some(list) = self.file_list(node) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .map(|file| FileHandle::new(file.name(), file.size() as u64, file.type_()))
            .collect()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().add_1(class) {
            warn!("Cannot add class {:?}: {:?}", class, err);
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().remove_1(class) {
            warn!("Cannot remove class {:?}: {:?}", class, err);
        }
    }

    fn listen(
        &self,
        node: &Element,
        kind: EventKind,
        handler: EventHandler,
    ) -> WebSubscription {
        let closure = Closure::<dyn Fn(Event)>::new(move |event: Event| {
            let mut dom_event = DomEvent::new(kind);
            handler(&mut dom_event);
            if dom_event.default_prevented() {
                event.prevent_default();
            }
        });

        let event = kind.event_name();
        if let Err(err) =
            node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            warn!("Cannot listen for {:?}: {:?}", event, err);
        }

        WebSubscription {
            target: node.clone(),
            event,
            closure,
        }
    }

    fn submit(&self, form: &Element) {
        match form.dyn_ref::<HtmlFormElement>() {
            Some(form) => {
                if let Err(err) = form.submit() {
                    warn!("Native submission failed: {:?}", err);
                }
            }
            None => warn!("Cannot submit {:?}: not a form", form.tag_name()),
        }
    }
}
