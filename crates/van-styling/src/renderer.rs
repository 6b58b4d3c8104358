//! The only place that touches the host environment.

use std::ops::BitOr;

use serde::Serialize;
use tracing::trace;

use crate::dom::DomDocument;
use crate::value::StylingValue;

/// Handle of a native element owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleFlags(u8);

impl StyleFlags {
    pub const NONE: StyleFlags = StyleFlags(0);
    /// The property name is dash-cased (`background-color`), not camelCased.
    pub const DASH_CASE: StyleFlags = StyleFlags(1);
    pub const IMPORTANT: StyleFlags = StyleFlags(2);

    pub fn contains(self, other: StyleFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for StyleFlags {
    type Output = StyleFlags;

    fn bitor(self, rhs: StyleFlags) -> StyleFlags {
        StyleFlags(self.0 | rhs.0)
    }
}

/// Element-scoped class and inline-style capability.
pub trait StylingRenderer {
    fn add_class(&mut self, element: ElementId, name: &str);
    fn remove_class(&mut self, element: ElementId, name: &str);
    fn set_style(&mut self, element: ElementId, prop: &str, value: &str, flags: StyleFlags);
    fn remove_style(&mut self, element: ElementId, prop: &str, flags: StyleFlags);
}

impl<R: StylingRenderer + ?Sized> StylingRenderer for &mut R {
    fn add_class(&mut self, element: ElementId, name: &str) {
        (**self).add_class(element, name);
    }

    fn remove_class(&mut self, element: ElementId, name: &str) {
        (**self).remove_class(element, name);
    }

    fn set_style(&mut self, element: ElementId, prop: &str, value: &str, flags: StyleFlags) {
        (**self).set_style(element, prop, value, flags);
    }

    fn remove_style(&mut self, element: ElementId, prop: &str, flags: StyleFlags) {
        (**self).remove_style(element, prop, flags);
    }
}

/// Apply one resolved `(prop, value)` pair.
///
/// Classes are added when the value is truthy and removed otherwise. Styles are
/// removed on `null`/`undefined` and set to the stringified value otherwise; a
/// trailing `!important` is stripped and turned into [`StyleFlags::IMPORTANT`].
pub fn apply_styling(
    renderer: &mut dyn StylingRenderer,
    is_class: bool,
    element: ElementId,
    prop: &str,
    value: &StylingValue,
) {
    trace!(?element, prop, %value, is_class, "apply styling");
    if is_class {
        if value.is_truthy() {
            renderer.add_class(element, prop);
        } else {
            renderer.remove_class(element, prop);
        }
        return;
    }
    let mut flags = if prop.contains('-') {
        StyleFlags::DASH_CASE
    } else {
        StyleFlags::NONE
    };
    match value.to_style_text() {
        None => renderer.remove_style(element, prop, flags),
        Some(text) => match text.strip_suffix("!important") {
            Some(rest) => {
                flags = flags | StyleFlags::IMPORTANT;
                renderer.set_style(element, prop, rest.trim_end(), flags);
            }
            None => renderer.set_style(element, prop, &text, flags),
        },
    }
}

/// A general-purpose renderer that creates and mutates elements through calls.
pub trait ProceduralRenderer {
    fn create_element(&mut self, tag: &str) -> ElementId;
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);
    fn add_class(&mut self, element: ElementId, name: &str);
    fn remove_class(&mut self, element: ElementId, name: &str);
    fn set_style(&mut self, element: ElementId, style: &str, value: &str, flags: StyleFlags);
    fn remove_style(&mut self, element: ElementId, style: &str, flags: StyleFlags);
}

/// Drives styling through a [`ProceduralRenderer`].
pub struct ProceduralAdapter<'a, P: ProceduralRenderer + ?Sized>(pub &'a mut P);

impl<P: ProceduralRenderer + ?Sized> StylingRenderer for ProceduralAdapter<'_, P> {
    fn add_class(&mut self, element: ElementId, name: &str) {
        self.0.add_class(element, name);
    }

    fn remove_class(&mut self, element: ElementId, name: &str) {
        self.0.remove_class(element, name);
    }

    fn set_style(&mut self, element: ElementId, prop: &str, value: &str, flags: StyleFlags) {
        self.0.set_style(element, prop, value, flags);
    }

    fn remove_style(&mut self, element: ElementId, prop: &str, flags: StyleFlags) {
        self.0.remove_style(element, prop, flags);
    }
}

/// Mutates [`DomDocument`] elements directly, the way code holding a native
/// element reference would: `classList` for classes, `style.setProperty` for
/// dash-cased properties and the camelCase style field otherwise.
pub struct DirectAdapter<'a> {
    document: &'a mut DomDocument,
}

impl<'a> DirectAdapter<'a> {
    pub fn new(document: &'a mut DomDocument) -> Self {
        Self { document }
    }
}

impl StylingRenderer for DirectAdapter<'_> {
    fn add_class(&mut self, element: ElementId, name: &str) {
        if let Some(el) = self.document.element_mut(element) {
            el.class_list_add(name);
        }
    }

    fn remove_class(&mut self, element: ElementId, name: &str) {
        if let Some(el) = self.document.element_mut(element) {
            el.class_list_remove(name);
        }
    }

    fn set_style(&mut self, element: ElementId, prop: &str, value: &str, flags: StyleFlags) {
        let Some(el) = self.document.element_mut(element) else {
            return;
        };
        if flags.contains(StyleFlags::DASH_CASE) || flags.contains(StyleFlags::IMPORTANT) {
            el.style_set_property(prop, value, flags.contains(StyleFlags::IMPORTANT));
        } else {
            el.set_style_field(prop, value);
        }
    }

    fn remove_style(&mut self, element: ElementId, prop: &str, flags: StyleFlags) {
        let Some(el) = self.document.element_mut(element) else {
            return;
        };
        if flags.contains(StyleFlags::DASH_CASE) {
            el.style_remove_property(prop);
        } else {
            el.set_style_field(prop, "");
        }
    }
}

/// Renderer that drops every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl StylingRenderer for NullRenderer {
    fn add_class(&mut self, _: ElementId, _: &str) {}
    fn remove_class(&mut self, _: ElementId, _: &str) {}
    fn set_style(&mut self, _: ElementId, _: &str, _: &str, _: StyleFlags) {}
    fn remove_style(&mut self, _: ElementId, _: &str, _: StyleFlags) {}
}

/// One call received by a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RendererCall {
    AddClass {
        element: ElementId,
        name: String,
    },
    RemoveClass {
        element: ElementId,
        name: String,
    },
    SetStyle {
        element: ElementId,
        prop: String,
        value: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        important: bool,
    },
    RemoveStyle {
        element: ElementId,
        prop: String,
    },
}

/// Logs every call, then forwards it to `inner`.
#[derive(Debug, Default)]
pub struct RecordingRenderer<R> {
    inner: R,
    calls: Vec<RendererCall>,
}

impl<R: StylingRenderer> RecordingRenderer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[RendererCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<RendererCall> {
        std::mem::take(&mut self.calls)
    }
}

impl<R: StylingRenderer> StylingRenderer for RecordingRenderer<R> {
    fn add_class(&mut self, element: ElementId, name: &str) {
        self.calls.push(RendererCall::AddClass {
            element,
            name: name.to_string(),
        });
        self.inner.add_class(element, name);
    }

    fn remove_class(&mut self, element: ElementId, name: &str) {
        self.calls.push(RendererCall::RemoveClass {
            element,
            name: name.to_string(),
        });
        self.inner.remove_class(element, name);
    }

    fn set_style(&mut self, element: ElementId, prop: &str, value: &str, flags: StyleFlags) {
        self.calls.push(RendererCall::SetStyle {
            element,
            prop: prop.to_string(),
            value: value.to_string(),
            important: flags.contains(StyleFlags::IMPORTANT),
        });
        self.inner.set_style(element, prop, value, flags);
    }

    fn remove_style(&mut self, element: ElementId, prop: &str, flags: StyleFlags) {
        self.calls.push(RendererCall::RemoveStyle {
            element,
            prop: prop.to_string(),
        });
        self.inner.remove_style(element, prop, flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EL: ElementId = ElementId(0);

    fn record(is_class: bool, prop: &str, value: StylingValue) -> Vec<RendererCall> {
        let mut renderer = RecordingRenderer::new(NullRenderer);
        apply_styling(&mut renderer, is_class, EL, prop, &value);
        renderer.take_calls()
    }

    #[test]
    fn test_class_truthiness() {
        assert_eq!(
            record(true, "on", StylingValue::Bool(true)),
            vec![RendererCall::AddClass { element: EL, name: "on".into() }]
        );
        for falsy in [
            StylingValue::Bool(false),
            StylingValue::Undefined,
            StylingValue::Null,
            StylingValue::from(""),
        ] {
            assert_eq!(
                record(true, "on", falsy),
                vec![RendererCall::RemoveClass { element: EL, name: "on".into() }]
            );
        }
    }

    #[test]
    fn test_style_set_and_remove() {
        assert_eq!(
            record(false, "width", StylingValue::from("10px")),
            vec![RendererCall::SetStyle {
                element: EL,
                prop: "width".into(),
                value: "10px".into(),
                important: false,
            }]
        );
        assert_eq!(
            record(false, "width", StylingValue::Null),
            vec![RendererCall::RemoveStyle { element: EL, prop: "width".into() }]
        );
    }

    #[test]
    fn test_important_suffix_is_stripped() {
        assert_eq!(
            record(false, "color", StylingValue::from("red !important")),
            vec![RendererCall::SetStyle {
                element: EL,
                prop: "color".into(),
                value: "red".into(),
                important: true,
            }]
        );
    }

    #[test]
    fn test_flags() {
        let flags = StyleFlags::DASH_CASE | StyleFlags::IMPORTANT;
        assert!(flags.contains(StyleFlags::DASH_CASE));
        assert!(flags.contains(StyleFlags::IMPORTANT));
        assert!(!StyleFlags::NONE.contains(StyleFlags::DASH_CASE));
    }

    #[test]
    fn test_direct_and_procedural_agree() {
        let mut direct_doc = DomDocument::new();
        let a = direct_doc.create_element("div");
        let mut procedural_doc = DomDocument::new();
        let b = procedural_doc.create_element("div");

        let ops: [(bool, &str, StylingValue); 4] = [
            (false, "backgroundColor", StylingValue::from("red")),
            (false, "font-size", StylingValue::from("12px !important")),
            (true, "active", StylingValue::Bool(true)),
            (false, "backgroundColor", StylingValue::Null),
        ];
        for (is_class, prop, value) in &ops {
            apply_styling(&mut DirectAdapter::new(&mut direct_doc), *is_class, a, prop, value);
            apply_styling(&mut ProceduralAdapter(&mut procedural_doc), *is_class, b, prop, value);
        }
        let direct = direct_doc.element(a).unwrap();
        let procedural = procedural_doc.element(b).unwrap();
        assert_eq!(direct.style_text(), "font-size: 12px !important;");
        assert_eq!(direct.style_text(), procedural.style_text());
        assert_eq!(direct.class_name(), procedural.class_name());
    }
}
