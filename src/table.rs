//! The host document the table presenter attaches to.
//!
//! Elements are looked up by selector. A missing table element is fatal; every other missing
//! element turns the update that targets it into a no-op.

use std::collections::HashMap;

use crate::page::Control;
use crate::schema::HeaderCell;

const ATTACHED_TABLE: &str = "#vt-table";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableElement {
    pub headers: Vec<HeaderCell>,
    classes: Vec<String>,
}

impl TableElement {
    pub fn new(headers: Vec<HeaderCell>) -> Self {
        Self {
            headers,
            classes: Vec::new(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn set_class(&mut self, class: &str, enabled: bool) {
        let present = self.has_class(class);
        if enabled && !present {
            self.classes.push(class.to_string());
        } else if !enabled && present {
            self.classes.retain(|c| c != class);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Table(TableElement),
    Text(String),
    Controls(Vec<Control>),
    Input(String),
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: HashMap<String, Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: impl Into<String>, element: Element) -> Self {
        self.insert(selector, element);
        self
    }

    pub fn insert(&mut self, selector: impl Into<String>, element: Element) {
        self.elements.insert(selector.into(), element);
    }

    pub fn get(&self, selector: &str) -> Option<&Element> {
        self.elements.get(selector)
    }

    pub fn table(&self, selector: &str) -> Option<&TableElement> {
        match self.elements.get(selector) {
            Some(Element::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self, selector: &str) -> Option<&mut TableElement> {
        match self.elements.get_mut(selector) {
            Some(Element::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn text(&self, selector: &str) -> Option<&str> {
        match self.elements.get(selector) {
            Some(Element::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn controls(&self, selector: &str) -> Option<&[Control]> {
        match self.elements.get(selector) {
            Some(Element::Controls(controls)) => Some(controls),
            _ => None,
        }
    }

    pub fn is_input(&self, selector: &str) -> bool {
        matches!(self.elements.get(selector), Some(Element::Input(_)))
    }

    pub fn input_value(&self, selector: &str) -> Option<&str> {
        match self.elements.get(selector) {
            Some(Element::Input(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns false when there is no text element at `selector`.
    pub fn set_text(&mut self, selector: &str, content: String) -> bool {
        match self.elements.get_mut(selector) {
            Some(Element::Text(text)) => {
                *text = content;
                true
            }
            _ => false,
        }
    }

    /// Returns false when there is no controls element at `selector`.
    pub fn set_controls(&mut self, selector: &str, controls: Vec<Control>) -> bool {
        match self.elements.get_mut(selector) {
            Some(Element::Controls(slot)) => {
                *slot = controls;
                true
            }
            _ => false,
        }
    }

    pub fn set_input_value(&mut self, selector: &str, content: &str) -> bool {
        match self.elements.get_mut(selector) {
            Some(Element::Input(value)) => {
                *value = content.to_string();
                true
            }
            _ => false,
        }
    }
}

/// What the presenter attaches to: a selector in the document, or a table element handed
/// over directly.
#[derive(Debug, Clone)]
pub enum Target {
    Selector(String),
    Element(TableElement),
}

impl Target {
    /// Selector under which the table lives once attached, if it can be resolved.
    pub fn attach(self, document: &mut Document) -> Option<String> {
        match self {
            Target::Selector(selector) => document.table(&selector).map(|_| selector),
            Target::Element(table) => {
                document.insert(ATTACHED_TABLE, Element::Table(table));
                Some(ATTACHED_TABLE.to_string())
            }
        }
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<TableElement> for Target {
    fn from(table: TableElement) -> Self {
        Target::Element(table)
    }
}
