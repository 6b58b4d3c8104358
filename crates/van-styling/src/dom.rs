//! A minimal in-memory document: just enough element state to observe styling.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::renderer::{ElementId, ProceduralRenderer, StyleFlags};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct StyleDeclaration {
    value: String,
    important: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    class_list: Vec<String>,
    style: BTreeMap<String, StyleDeclaration>,
}

impl DomElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class_list_add(&mut self, name: &str) {
        if !self.has_class(name) {
            self.class_list.push(name.to_string());
        }
    }

    pub fn class_list_remove(&mut self, name: &str) {
        self.class_list.retain(|c| c != name);
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class_list.iter().any(|c| c == name)
    }

    /// Classes in insertion order, space separated.
    pub fn class_name(&self) -> String {
        self.class_list.join(" ")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_list.iter().map(String::as_str)
    }

    /// `style.setProperty(prop, value, priority)`. An empty value removes the property.
    pub fn style_set_property(&mut self, prop: &str, value: &str, important: bool) {
        if value.is_empty() {
            self.style_remove_property(prop);
            return;
        }
        self.style.insert(
            prop.to_string(),
            StyleDeclaration {
                value: value.to_string(),
                important,
            },
        );
    }

    pub fn style_remove_property(&mut self, prop: &str) {
        self.style.remove(prop);
    }

    /// `style[camelCaseProp] = value`.
    pub fn set_style_field(&mut self, prop: &str, value: &str) {
        self.style_set_property(&hyphenate(prop), value, false);
    }

    pub fn style_value(&self, prop: &str) -> Option<&str> {
        self.style.get(prop).map(|d| d.value.as_str())
    }

    /// Serialized inline style, properties in sorted order:
    /// `background-color: red; height: 10px;`.
    pub fn style_text(&self) -> String {
        self.style
            .iter()
            .map(|(prop, decl)| {
                if decl.important {
                    format!("{prop}: {} !important;", decl.value)
                } else {
                    format!("{prop}: {};", decl.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `backgroundColor` -> `background-color`.
pub fn hyphenate(prop: &str) -> String {
    let mut out = String::with_capacity(prop.len() + 4);
    for c in prop.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Owns every element created during a run; [`ElementId`] indexes into it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomDocument {
    elements: Vec<DomElement>,
}

impl DomDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.elements.push(DomElement::new(tag));
        ElementId(self.elements.len() - 1)
    }

    pub fn element(&self, id: ElementId) -> Option<&DomElement> {
        self.elements.get(id.0)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut DomElement> {
        self.elements.get_mut(id.0)
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &DomElement)> {
        self.elements.iter().enumerate().map(|(i, el)| (ElementId(i), el))
    }
}

impl ProceduralRenderer for DomDocument {
    fn create_element(&mut self, tag: &str) -> ElementId {
        DomDocument::create_element(self, tag)
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(element) {
            el.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn add_class(&mut self, element: ElementId, name: &str) {
        if let Some(el) = self.element_mut(element) {
            el.class_list_add(name);
        }
    }

    fn remove_class(&mut self, element: ElementId, name: &str) {
        if let Some(el) = self.element_mut(element) {
            el.class_list_remove(name);
        }
    }

    fn set_style(&mut self, element: ElementId, style: &str, value: &str, flags: StyleFlags) {
        if let Some(el) = self.element_mut(element) {
            let prop = if flags.contains(StyleFlags::DASH_CASE) {
                style.to_string()
            } else {
                hyphenate(style)
            };
            el.style_set_property(&prop, value, flags.contains(StyleFlags::IMPORTANT));
        }
    }

    fn remove_style(&mut self, element: ElementId, style: &str, flags: StyleFlags) {
        if let Some(el) = self.element_mut(element) {
            if flags.contains(StyleFlags::DASH_CASE) {
                el.style_remove_property(style);
            } else {
                el.style_remove_property(&hyphenate(style));
            }
        }
    }
}
