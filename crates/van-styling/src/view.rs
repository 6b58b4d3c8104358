//! Template metadata (`TView`, `TNode`) shared by every instance of a template,
//! and per-instance binding storage (`LView`).

use std::ops::Range;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::array_map::ArrayMap;
use crate::attrs::TAttributes;
use crate::key::{StylingKey, StylingRange};
use crate::renderer::ElementId;
use crate::statics::compute_static_styling;
use crate::value::{StylingInput, StylingValue};

/// Slots below this index are never handed out, so `0` can mean "no link".
pub const HEADER_OFFSET: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TNodeType {
    Element,
    /// `<ng-container>`-like grouping node with no native element.
    ElementContainer,
    /// Structural placeholder (`<ng-template>`).
    Container,
}

/// Static description of a directive as far as styling is concerned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveDef {
    pub name: String,
    /// Static `class`/`style` the directive puts on its host.
    pub host_attrs: Option<TAttributes>,
    /// Binding slots used by the directive's host-binding function.
    pub host_vars: usize,
}

impl DirectiveDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn host_attrs(mut self, attrs: TAttributes) -> Self {
        self.host_attrs = Some(attrs);
        self
    }

    /// Reserve room for `count` styling bindings.
    pub fn styling_bindings(mut self, count: usize) -> Self {
        self.host_vars = count * 2;
        self
    }
}

/// A directive registered on a node of this template.
#[derive(Debug, Clone)]
pub struct DirectiveEntry {
    pub def: DirectiveDef,
    pub node: usize,
    /// First slot of the directive's host-binding block.
    pub host_binding_root: usize,
}

/// Lowest-priority static values not folded into any binding key.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Residual {
    /// No styling instruction has run yet.
    #[default]
    Unset,
    /// A template binding folded every static value into its key.
    Empty,
    Map(ArrayMap),
}

#[derive(Debug, Clone)]
pub struct TNode {
    pub index: usize,
    pub kind: TNodeType,
    pub tag: String,
    pub attrs: Option<TAttributes>,
    pub directive_start: usize,
    pub directive_end: usize,
    /// Last directive whose static classes were folded into a binding key.
    pub class_styling_last: Option<usize>,
    pub style_styling_last: Option<usize>,
    /// `prev` is the first template binding (or the top host binding when the
    /// template has none), `next` the last template binding.
    pub class_bindings: StylingRange,
    pub style_bindings: StylingRange,
    pub residual_classes: Residual,
    pub residual_styles: Residual,
    /// Static class/style text including directive host statics.
    pub classes: Option<String>,
    pub styles: Option<String>,
    /// Static class/style text of the element alone.
    pub classes_without_host: Option<String>,
    pub styles_without_host: Option<String>,
    /// A directive on this node declares an input named `class`.
    pub has_class_input: bool,
    pub has_style_input: bool,
}

impl TNode {
    fn new(index: usize, kind: TNodeType, tag: &str, attrs: Option<TAttributes>) -> Self {
        Self {
            index,
            kind,
            tag: tag.to_string(),
            attrs,
            directive_start: 0,
            directive_end: 0,
            class_styling_last: None,
            style_styling_last: None,
            class_bindings: StylingRange::EMPTY,
            style_bindings: StylingRange::EMPTY,
            residual_classes: Residual::Unset,
            residual_styles: Residual::Unset,
            classes: None,
            styles: None,
            classes_without_host: None,
            styles_without_host: None,
            has_class_input: false,
            has_style_input: false,
        }
    }

    pub fn directives(&self) -> Range<usize> {
        self.directive_start..self.directive_end
    }

    pub fn bindings(&self, is_class: bool) -> StylingRange {
        if is_class {
            self.class_bindings
        } else {
            self.style_bindings
        }
    }

    pub fn set_bindings(&mut self, is_class: bool, range: StylingRange) {
        if is_class {
            self.class_bindings = range;
        } else {
            self.style_bindings = range;
        }
    }

    pub fn residual(&self, is_class: bool) -> &Residual {
        if is_class {
            &self.residual_classes
        } else {
            &self.residual_styles
        }
    }

    pub fn set_residual(&mut self, is_class: bool, residual: Residual) {
        if is_class {
            self.residual_classes = residual;
        } else {
            self.residual_styles = residual;
        }
    }

    pub fn styling_cursor(&self, is_class: bool) -> Option<usize> {
        if is_class {
            self.class_styling_last
        } else {
            self.style_styling_last
        }
    }

    pub fn set_styling_cursor(&mut self, is_class: bool, cursor: Option<usize>) {
        if is_class {
            self.class_styling_last = cursor;
        } else {
            self.style_styling_last = cursor;
        }
    }

    pub fn has_input_shadow(&self, is_class: bool) -> bool {
        if is_class {
            self.has_class_input
        } else {
            self.has_style_input
        }
    }
}

/// Priority-list entry stored at a binding's slot index.
#[derive(Debug, Clone, PartialEq)]
pub struct TStylingBinding {
    pub key: StylingKey,
    pub range: StylingRange,
}

/// Template metadata shared by all instances of one template.
#[derive(Debug, Clone)]
pub struct TView {
    pub nodes: Vec<TNode>,
    pub directives: Vec<DirectiveEntry>,
    /// Indexed by binding slot; `Some` once the binding joined its priority list.
    pub data: Vec<Option<TStylingBinding>>,
    /// First slot of the host-binding region.
    pub host_bindings_start: usize,
    /// Cleared by [`UpdatePass::finish`](crate::UpdatePass::finish); the priority
    /// lists are built while it is set and only read afterwards.
    pub first_update_pass: bool,
}

impl TView {
    pub fn node(&self, index: usize) -> Option<&TNode> {
        self.nodes.get(index)
    }

    pub fn binding(&self, index: usize) -> Option<&TStylingBinding> {
        self.data.get(index).and_then(Option::as_ref)
    }

    /// Index into [`TView::directives`] of the `nth` directive on `node`.
    pub fn directive_of(&self, node: usize, nth: usize) -> Option<usize> {
        let tnode = self.nodes.get(node)?;
        let index = tnode.directive_start + nth;
        (index < tnode.directive_end).then_some(index)
    }

    /// Bindings of `node` from lowest to highest priority.
    pub fn priority_list(&self, node: usize, is_class: bool) -> Vec<usize> {
        let Some(tnode) = self.nodes.get(node) else {
            return Vec::new();
        };
        let bindings = tnode.bindings(is_class);
        let mut cursor = if bindings.next() != 0 {
            bindings.next()
        } else {
            bindings.prev()
        };
        let mut list = Vec::new();
        while let Some(binding) = self.binding(cursor) {
            list.push(cursor);
            cursor = binding.range.prev();
        }
        list.reverse();
        list
    }
}

/// Per-instance binding slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LSlot {
    #[default]
    NoChange,
    /// Last raw input, for dirty checking.
    Raw(StylingInput),
    /// Normalized value of a single-property binding.
    Value(StylingValue),
    /// Normalized value of a map binding; the "old" side of the next diff.
    Map(Rc<ArrayMap>),
}

/// A `[class]`/`[style]` value routed to a directive input instead of the element.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowedInput {
    pub node: usize,
    pub input: &'static str,
    pub value: StylingInput,
}

/// Per-instance state of one template.
#[derive(Debug, Clone, Default)]
pub struct LView {
    pub slots: Vec<LSlot>,
    natives: Vec<Option<ElementId>>,
    pub shadowed_inputs: Vec<ShadowedInput>,
}

impl LView {
    pub fn new(tview: &TView) -> Self {
        Self {
            slots: vec![LSlot::NoChange; tview.data.len()],
            natives: vec![None; tview.nodes.len()],
            shadowed_inputs: Vec::new(),
        }
    }

    pub fn slot(&self, index: usize) -> Option<&LSlot> {
        self.slots.get(index)
    }

    pub fn native(&self, node: usize) -> Option<ElementId> {
        self.natives.get(node).copied().flatten()
    }

    pub(crate) fn set_native(&mut self, node: usize, element: ElementId) {
        if let Some(slot) = self.natives.get_mut(node) {
            *slot = Some(element);
        }
    }
}

struct NodeSpec {
    kind: TNodeType,
    tag: String,
    attrs: Option<TAttributes>,
    directives: Vec<DirectiveDef>,
    class_input: bool,
    style_input: bool,
}

/// Lays out a [`TView`]: template binding slots first, then one host-binding
/// block per directive in registration order.
#[derive(Default)]
pub struct TViewBuilder {
    nodes: Vec<NodeSpec>,
    template_vars: usize,
}

impl TViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&mut self, tag: &str, attrs: Option<TAttributes>) -> usize {
        self.node(TNodeType::Element, tag, attrs, Vec::new())
    }

    pub fn element_with_directives(
        &mut self,
        tag: &str,
        attrs: Option<TAttributes>,
        directives: Vec<DirectiveDef>,
    ) -> usize {
        self.node(TNodeType::Element, tag, attrs, directives)
    }

    pub fn container(&mut self, kind: TNodeType) -> usize {
        self.node(kind, "", None, Vec::new())
    }

    pub fn node(
        &mut self,
        kind: TNodeType,
        tag: &str,
        attrs: Option<TAttributes>,
        directives: Vec<DirectiveDef>,
    ) -> usize {
        self.nodes.push(NodeSpec {
            kind,
            tag: tag.to_string(),
            attrs,
            directives,
            class_input: false,
            style_input: false,
        });
        self.nodes.len() - 1
    }

    /// Mark `node` as having a directive input named `class` (or `style`).
    pub fn shadow_input(&mut self, node: usize, is_class: bool) -> &mut Self {
        if let Some(spec) = self.nodes.get_mut(node) {
            if is_class {
                spec.class_input = true;
            } else {
                spec.style_input = true;
            }
        }
        self
    }

    /// Slots used by the template's own update function (two per styling binding).
    pub fn template_vars(&mut self, vars: usize) -> &mut Self {
        self.template_vars = vars;
        self
    }

    pub fn build(self) -> TView {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut directives = Vec::new();
        let host_bindings_start = HEADER_OFFSET + self.template_vars;
        let mut cursor = host_bindings_start;
        for (index, spec) in self.nodes.into_iter().enumerate() {
            let mut tnode = TNode::new(index, spec.kind, &spec.tag, spec.attrs);
            tnode.has_class_input = spec.class_input;
            tnode.has_style_input = spec.style_input;
            tnode.directive_start = directives.len();
            for def in spec.directives {
                let host_vars = def.host_vars;
                directives.push(DirectiveEntry {
                    def,
                    node: index,
                    host_binding_root: cursor,
                });
                cursor += host_vars;
            }
            tnode.directive_end = directives.len();
            nodes.push(tnode);
        }
        let mut tview = TView {
            nodes,
            directives,
            data: vec![None; cursor],
            host_bindings_start,
            first_update_pass: true,
        };
        compute_static_styling(&mut tview);
        tview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_lays_out_host_blocks() {
        let mut builder = TViewBuilder::new();
        builder.element("p", None);
        let div = builder.element_with_directives(
            "div",
            None,
            vec![
                DirectiveDef::new("a").styling_bindings(1),
                DirectiveDef::new("b").styling_bindings(2),
            ],
        );
        builder.template_vars(4);
        let tview = builder.build();

        assert_eq!(tview.host_bindings_start, HEADER_OFFSET + 4);
        let a = tview.directive_of(div, 0).unwrap();
        let b = tview.directive_of(div, 1).unwrap();
        assert_eq!(tview.directives[a].host_binding_root, 6);
        assert_eq!(tview.directives[b].host_binding_root, 8);
        assert_eq!(tview.data.len(), 12);
        assert_eq!(tview.directive_of(div, 2), None);
        assert!(tview.first_update_pass);
    }

    #[test]
    fn test_lview_matches_tview() {
        let mut builder = TViewBuilder::new();
        builder.element("div", None);
        builder.template_vars(2);
        let tview = builder.build();
        let lview = LView::new(&tview);
        assert_eq!(lview.slots.len(), tview.data.len());
        assert_eq!(lview.native(0), None);
        assert_eq!(lview.slot(99), None);
        assert_eq!(lview.slot(HEADER_OFFSET), Some(&LSlot::NoChange));
    }

    #[test]
    fn test_shadow_input_flags() {
        let mut builder = TViewBuilder::new();
        let node = builder.element("div", None);
        builder.shadow_input(node, true);
        let tview = builder.build();
        assert!(tview.nodes[node].has_input_shadow(true));
        assert!(!tview.nodes[node].has_input_shadow(false));
    }
}
