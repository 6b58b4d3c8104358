use serde::{Deserialize, Serialize};

use crate::parser::{class_names, style_declarations};
use crate::value::StylingValue;

/// Markers that split a flat static attribute list into runs.
///
/// Entries before the first marker are implicit `name, value` attribute pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum AttributeMarker {
    ImplicitAttributes = -1,
    NamespaceUri = 0,
    /// Followed by class names.
    Classes = 1,
    /// Followed by `prop, value` pairs.
    Styles = 2,
    Bindings = 3,
    Template = 4,
    ProjectAs = 5,
    I18n = 6,
}

impl TryFrom<i8> for AttributeMarker {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Ok(match value {
            -1 => AttributeMarker::ImplicitAttributes,
            0 => AttributeMarker::NamespaceUri,
            1 => AttributeMarker::Classes,
            2 => AttributeMarker::Styles,
            3 => AttributeMarker::Bindings,
            4 => AttributeMarker::Template,
            5 => AttributeMarker::ProjectAs,
            6 => AttributeMarker::I18n,
            other => return Err(format!("unknown attribute marker {other}")),
        })
    }
}

impl From<AttributeMarker> for i8 {
    fn from(marker: AttributeMarker) -> i8 {
        marker as i8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TAttr {
    Marker(AttributeMarker),
    Str(String),
}

/// Static attributes of an element or of a directive's host, e.g.
/// `["id", "main", Classes, "a", "b", Styles, "color", "red"]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TAttributes(Vec<TAttr>);

impl TAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `class="..."` and `style="..."` attribute text.
    pub fn from_static(class: Option<&str>, style: Option<&str>) -> Self {
        let mut attrs = Self::new();
        if let Some(class) = class {
            attrs = attrs.classes(class_names(class));
        }
        if let Some(style) = style {
            attrs = attrs.styles(style_declarations(style, false).filter_map(Result::ok));
        }
        attrs
    }

    /// Add a plain `name="value"` attribute.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        let at = self
            .0
            .iter()
            .position(|a| matches!(a, TAttr::Marker(_)))
            .unwrap_or(self.0.len());
        self.0.insert(at, TAttr::Str(value.to_string()));
        self.0.insert(at, TAttr::Str(name.to_string()));
        self
    }

    pub fn classes<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.0.push(TAttr::Marker(AttributeMarker::Classes));
        self.0.extend(names.into_iter().map(|n| TAttr::Str(n.to_string())));
        self
    }

    pub fn styles<'a>(mut self, declarations: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.0.push(TAttr::Marker(AttributeMarker::Styles));
        for (prop, value) in declarations {
            self.0.push(TAttr::Str(prop.to_string()));
            self.0.push(TAttr::Str(value.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[TAttr] {
        &self.0
    }

    /// Class names (`is_class`) or style declarations found under their marker, in
    /// list order.
    pub fn static_entries(&self, is_class: bool) -> StaticEntries<'_> {
        StaticEntries {
            attrs: &self.0,
            pos: 0,
            marker: None,
            is_class,
        }
    }
}

impl From<Vec<TAttr>> for TAttributes {
    fn from(attrs: Vec<TAttr>) -> Self {
        Self(attrs)
    }
}

pub struct StaticEntries<'a> {
    attrs: &'a [TAttr],
    pos: usize,
    marker: Option<AttributeMarker>,
    is_class: bool,
}

impl<'a> Iterator for StaticEntries<'a> {
    type Item = (&'a str, StylingValue);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let attr = self.attrs.get(self.pos)?;
            self.pos += 1;
            let name = match attr {
                TAttr::Marker(marker) => {
                    self.marker = Some(*marker);
                    continue;
                }
                TAttr::Str(name) => name.as_str(),
            };
            match (self.marker, self.is_class) {
                (Some(AttributeMarker::Classes), true) => {
                    return Some((name, StylingValue::Bool(true)));
                }
                (Some(AttributeMarker::Styles), false) => {
                    let value = match self.attrs.get(self.pos) {
                        Some(TAttr::Str(value)) => {
                            self.pos += 1;
                            value.clone()
                        }
                        _ => String::new(),
                    };
                    return Some((name, StylingValue::Str(value)));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_entries_by_marker() {
        let attrs = TAttributes::new()
            .classes(["a", "b"])
            .styles([("color", "red"), ("width", "1px")])
            .attr("id", "main");
        let classes: Vec<_> = attrs.static_entries(true).map(|(k, _)| k).collect();
        assert_eq!(classes, vec!["a", "b"]);
        let styles: Vec<_> = attrs.static_entries(false).collect();
        assert_eq!(
            styles,
            vec![("color", StylingValue::from("red")), ("width", StylingValue::from("1px"))]
        );
    }

    #[test]
    fn test_implicit_attrs_are_ignored() {
        let attrs = TAttributes::new().attr("class", "not-a-class").classes(["real"]);
        assert_eq!(attrs.entries()[0], TAttr::Str("class".into()));
        let classes: Vec<_> = attrs.static_entries(true).map(|(k, _)| k).collect();
        assert_eq!(classes, vec!["real"]);
    }

    #[test]
    fn test_from_static_text() {
        let attrs = TAttributes::from_static(Some("x  y"), Some("height:10px"));
        assert_eq!(attrs.static_entries(true).count(), 2);
        let styles: Vec<_> = attrs.static_entries(false).collect();
        assert_eq!(styles, vec![("height", StylingValue::from("10px"))]);
    }

    #[test]
    fn test_json_form() {
        let attrs: TAttributes = serde_json::from_str(r#"["id", "x", 1, "a", 2, "color", "red"]"#).unwrap();
        assert_eq!(
            attrs.entries()[2],
            TAttr::Marker(AttributeMarker::Classes)
        );
        assert_eq!(attrs.static_entries(false).count(), 1);
        assert_eq!(
            serde_json::to_string(&attrs).unwrap(),
            r#"["id","x",1,"a",2,"color","red"]"#
        );
        assert!(serde_json::from_str::<TAttributes>("[9]").is_err());
    }
}
