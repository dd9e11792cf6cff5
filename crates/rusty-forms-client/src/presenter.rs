// File: src/presenter.rs
// Purpose: Keep group invalid markers and error slots in sync with outcomes

use tracing::{debug, warn};

use crate::config::FormConfig;
use crate::dom::Document;

/// Writes validation results into a field's group
pub struct ErrorPresenter<'a, D: Document> {
    document: &'a D,
    form: &'a D::Node,
    config: &'a FormConfig,
}

impl<'a, D: Document> ErrorPresenter<'a, D> {
    pub fn new(document: &'a D, form: &'a D::Node, config: &'a FormConfig) -> Self {
        Self {
            document,
            form,
            config,
        }
    }

    /// Nearest ancestor of `field` matching the group marker
    ///
    /// The walk stops at the bound form, so a group outside it is never used.
    pub fn group_of(&self, field: &D::Node) -> Option<D::Node> {
        let mut current = self.document.parent(field);
        while let Some(node) = current {
            if self.document.matches(&node, &self.config.form_group_selector) {
                return Some(node);
            }
            if node == *self.form {
                return None;
            }
            current = self.document.parent(&node);
        }
        None
    }

    /// Show `message` on the field's group, or clear it when there is none
    pub fn present(&self, field: &D::Node, message: Option<&str>) {
        match message.filter(|message| !message.is_empty()) {
            Some(message) => self.mark(field, message),
            None => self.clear(field),
        }
    }

    /// Drop the invalid state without re-running any rule
    pub fn clear_on_input(&self, field: &D::Node) {
        self.clear(field);
    }

    fn mark(&self, field: &D::Node, message: &str) {
        let Some(group) = self.group_of(field) else {
            warn!(
                "No {:?} group around {:?}; cannot show {:?}",
                self.config.form_group_selector, field, message
            );
            return;
        };

        match self.document.query(&group, &self.config.error_selector) {
            Some(slot) => self.document.set_text(&slot, message),
            None => warn!(
                "No {:?} slot in group of {:?}; message {:?} not shown",
                self.config.error_selector, field, message
            ),
        }
        self.document.add_class(&group, &self.config.invalid_class);
    }

    fn clear(&self, field: &D::Node) {
        let Some(group) = self.group_of(field) else {
            debug!("No group around {:?} to clear", field);
            return;
        };

        if let Some(slot) = self.document.query(&group, &self.config.error_selector) {
            self.document.set_text(&slot, "");
        }
        self.document.remove_class(&group, &self.config.invalid_class);
    }
}
