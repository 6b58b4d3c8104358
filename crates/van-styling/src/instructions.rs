//! Instruction entry points called by generated update code.
//!
//! ```ignore
//! let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);
//! pass.select(0)?;
//! pass.style_prop("width", "10", Some(&StyleSuffix::unit("px")))?;
//! pass.class_map("a b")?;
//! pass.enter_host_bindings(0)?;
//! pass.style_prop("color", "red", None)?;
//! pass.finish();
//! ```

use std::rc::Rc;

use tracing::debug;

use crate::array_map::EMPTY_ARRAY_MAP;
use crate::binding_list::insert_binding;
use crate::config::StylingConfig;
use crate::diff::diff_array_maps;
use crate::error::{Result, StylingError};
use crate::key::KeyPrimitive;
use crate::normalize::{normalize_prop_value, to_array_map, StyleSuffix};
use crate::renderer::{ElementId, StylingRenderer};
use crate::resolve::resolve_and_apply;
use crate::statics::{wrap_in_static_styling_key, write_static_styling};
use crate::value::StylingInput;
use crate::view::{LSlot, LView, ShadowedInput, TNodeType, TView, HEADER_OFFSET};

/// Attach a freshly created native element to `node` and write its static
/// classes and styles.
pub fn element_create(
    tview: &TView,
    lview: &mut LView,
    renderer: &mut dyn StylingRenderer,
    node: usize,
    element: ElementId,
) -> Result<()> {
    let tnode = tview.node(node).ok_or(StylingError::UnknownNode(node))?;
    lview.set_native(node, element);
    if tnode.kind == TNodeType::Element {
        write_static_styling(renderer, element, tnode);
    }
    Ok(())
}

/// One evaluation of a template's update function and its directives' host
/// bindings against one view instance.
pub struct UpdatePass<'a> {
    tview: &'a mut TView,
    lview: &'a mut LView,
    renderer: &'a mut dyn StylingRenderer,
    config: &'a StylingConfig,
    selected: Option<usize>,
    binding_index: usize,
    /// Template cursor saved while a host-binding block is active.
    template_index: usize,
    last_slot: Option<usize>,
    current_directive: Option<usize>,
}

impl<'a> UpdatePass<'a> {
    pub fn new(
        tview: &'a mut TView,
        lview: &'a mut LView,
        renderer: &'a mut dyn StylingRenderer,
        config: &'a StylingConfig,
    ) -> Self {
        Self {
            tview,
            lview,
            renderer,
            config,
            selected: None,
            binding_index: HEADER_OFFSET,
            template_index: HEADER_OFFSET,
            last_slot: None,
            current_directive: None,
        }
    }

    /// Make `node` the target of the following styling instructions.
    ///
    /// Selecting from inside a host-binding block returns to the template's own
    /// bindings and slot cursor.
    pub fn select(&mut self, node: usize) -> Result<()> {
        if node >= self.tview.nodes.len() {
            return Err(StylingError::UnknownNode(node));
        }
        if self.current_directive.take().is_some() {
            self.binding_index = self.template_index;
            self.last_slot = None;
        }
        self.selected = Some(node);
        Ok(())
    }

    /// Switch to the host-binding function of `directive`: its host becomes the
    /// selected node and binding slots come from its host-binding block.
    pub fn enter_host_bindings(&mut self, directive: usize) -> Result<()> {
        let entry = self
            .tview
            .directives
            .get(directive)
            .ok_or(StylingError::UnknownDirective(directive))?;
        let root = entry.host_binding_root;
        self.selected = Some(entry.node);
        if self.current_directive.is_none() {
            self.template_index = self.binding_index;
        }
        self.binding_index = root;
        self.last_slot = None;
        self.current_directive = Some(directive);
        Ok(())
    }

    /// Reserve the raw/normalized slot pair of the next styling binding.
    pub fn allocate_styling_slot(&mut self) -> usize {
        let index = self.binding_index;
        debug_assert!(index >= HEADER_OFFSET);
        debug_assert!(
            !matches!(self.last_slot, Some(last) if index <= last),
            "styling slots must be allocated in increasing order"
        );
        self.last_slot = Some(index);
        self.binding_index += 2;
        index
    }

    /// `[style.prop]="value"`, optionally with a unit (`[style.width.px]`) or a
    /// custom sanitizer.
    pub fn style_prop(
        &mut self,
        prop: &str,
        value: impl Into<StylingInput>,
        suffix: Option<&StyleSuffix>,
    ) -> Result<()> {
        self.check_styling_property(prop, value.into(), suffix, false)
    }

    /// `[class.name]="value"`.
    pub fn class_prop(&mut self, class: &str, value: impl Into<StylingInput>) -> Result<()> {
        self.check_styling_property(class, value.into(), None, true)
    }

    /// `[style]="value"`.
    pub fn style_map(&mut self, value: impl Into<StylingInput>) -> Result<()> {
        self.check_styling_map(value.into(), false)
    }

    /// `[class]="value"`.
    pub fn class_map(&mut self, value: impl Into<StylingInput>) -> Result<()> {
        self.check_styling_map(value.into(), true)
    }

    /// End the pass. After the first pass the priority lists are frozen.
    pub fn finish(self) {
        if self.tview.first_update_pass {
            debug!(bindings = self.tview.data.iter().flatten().count(), "first update pass complete");
        }
        self.tview.first_update_pass = false;
    }

    fn begin_binding(&mut self, key: KeyPrimitive, is_class: bool) -> Result<(usize, usize)> {
        let node = self.selected.ok_or(StylingError::NoElementSelected)?;
        let index = self.allocate_styling_slot();
        if index + 1 >= self.tview.data.len() {
            return Err(StylingError::BindingOutOfBounds {
                index,
                len: self.tview.data.len(),
            });
        }
        if self.tview.first_update_pass {
            self.first_update_pass(node, key, index, is_class)?;
        }
        Ok((node, index))
    }

    fn first_update_pass(&mut self, node: usize, key: KeyPrimitive, index: usize, is_class: bool) -> Result<()> {
        if self.tview.data[index].is_some() {
            return Ok(());
        }
        let is_host = self.current_directive.is_some();
        let shadowed = !is_host && self.tview.nodes[node].has_input_shadow(is_class);
        let key = match key {
            KeyPrimitive::Map if shadowed => KeyPrimitive::Neutralized,
            key => key,
        };
        let key = wrap_in_static_styling_key(self.tview, node, key, is_class, self.current_directive);
        insert_binding(self.tview, node, key, index, is_host, is_class, self.config)
    }

    /// Store `value` in the raw slot; `false` when it equals the previous value.
    fn binding_updated(&mut self, index: usize, value: &StylingInput) -> bool {
        if matches!(&self.lview.slots[index], LSlot::Raw(previous) if previous.same_value(value)) {
            return false;
        }
        self.lview.slots[index] = LSlot::Raw(value.clone());
        true
    }

    fn check_styling_property(
        &mut self,
        prop: &str,
        value: StylingInput,
        suffix: Option<&StyleSuffix>,
        is_class: bool,
    ) -> Result<()> {
        let (node, index) = self.begin_binding(KeyPrimitive::Prop(prop.to_string()), is_class)?;
        if !self.binding_updated(index, &value) {
            return Ok(());
        }
        let normalized = normalize_prop_value(&value, suffix, prop, is_class, self.config)?;
        self.lview.slots[index + 1] = LSlot::Value(normalized.clone());
        resolve_and_apply(self.tview, self.lview, self.renderer, node, prop, normalized, is_class, index);
        Ok(())
    }

    fn check_styling_map(&mut self, value: StylingInput, is_class: bool) -> Result<()> {
        let (node, index) = self.begin_binding(KeyPrimitive::Map, is_class)?;
        if !self.binding_updated(index, &value) {
            return Ok(());
        }
        let neutralized = self
            .tview
            .binding(index)
            .is_some_and(|b| *b.key.primitive() == KeyPrimitive::Neutralized);
        if neutralized {
            self.forward_to_shadowed_input(node, value, is_class);
            return Ok(());
        }

        let new_map = Rc::new(to_array_map(&value, is_class, self.config)?);
        let old = std::mem::replace(&mut self.lview.slots[index + 1], LSlot::Map(Rc::clone(&new_map)));
        let old_map = match &old {
            LSlot::Map(map) => map.as_ref(),
            _ => &EMPTY_ARRAY_MAP,
        };
        let tview = &*self.tview;
        let lview = &*self.lview;
        let renderer = &mut *self.renderer;
        diff_array_maps(old_map, &new_map, |key, value| {
            resolve_and_apply(tview, lview, renderer, node, key, value, is_class, index);
        });
        Ok(())
    }

    /// A directive input named `class`/`style` receives the template value,
    /// prefixed with the element's own static text.
    fn forward_to_shadowed_input(&mut self, node: usize, value: StylingInput, is_class: bool) {
        let tnode = &self.tview.nodes[node];
        let prefix = if is_class {
            tnode.classes_without_host.as_deref()
        } else {
            tnode.styles_without_host.as_deref()
        };
        let value = match (prefix, value) {
            (Some(prefix), StylingInput::Str(text)) if !text.is_empty() => {
                StylingInput::Str(format!("{prefix} {text}"))
            }
            (Some(prefix), value) if value.is_nullish() || value == StylingInput::from("") => {
                StylingInput::Str(prefix.to_string())
            }
            (_, value) => value,
        };
        debug!(node, is_class, "styling value forwarded to shadowing input");
        self.lview.shadowed_inputs.push(ShadowedInput {
            node,
            input: if is_class { "class" } else { "style" },
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::TAttributes;
    use crate::dom::DomDocument;
    use crate::renderer::{DirectAdapter, NullRenderer, RecordingRenderer};
    use crate::view::{DirectiveDef, TViewBuilder};

    struct Fixture {
        tview: TView,
        lview: LView,
        doc: DomDocument,
        element: ElementId,
        config: StylingConfig,
    }

    impl Fixture {
        fn new(attrs: Option<TAttributes>, directives: Vec<DirectiveDef>, template_bindings: usize) -> Self {
            let mut builder = TViewBuilder::new();
            builder.element_with_directives("div", attrs, directives);
            builder.template_vars(template_bindings * 2);
            let tview = builder.build();
            let mut lview = LView::new(&tview);
            let mut doc = DomDocument::new();
            let element = doc.create_element("div");
            element_create(&tview, &mut lview, &mut DirectAdapter::new(&mut doc), 0, element).unwrap();
            Self {
                tview,
                lview,
                doc,
                element,
                config: StylingConfig::development(),
            }
        }

        fn pass(&mut self, f: impl FnOnce(&mut UpdatePass<'_>) -> Result<()>) {
            let mut renderer = DirectAdapter::new(&mut self.doc);
            let mut pass = UpdatePass::new(&mut self.tview, &mut self.lview, &mut renderer, &self.config);
            f(&mut pass).unwrap();
            pass.finish();
        }

        fn style(&self) -> String {
            self.doc.element(self.element).unwrap().style_text()
        }

        fn class(&self) -> String {
            self.doc.element(self.element).unwrap().class_name()
        }
    }

    #[test]
    fn test_style_prop_with_unit() {
        let mut fx = Fixture::new(None, vec![], 1);
        let px = StyleSuffix::unit("px");
        fx.pass(|p| {
            p.select(0)?;
            p.style_prop("width", 10, Some(&px))
        });
        assert_eq!(fx.style(), "width: 10px;");
        fx.pass(|p| {
            p.select(0)?;
            p.style_prop("width", StylingInput::Null, Some(&px))
        });
        assert_eq!(fx.style(), "");
    }

    #[test]
    fn test_class_map_and_prop() {
        let mut fx = Fixture::new(Some(TAttributes::new().classes(["static"])), vec![], 2);
        fx.pass(|p| {
            p.select(0)?;
            p.class_map("a b")?;
            p.class_prop("c", true)
        });
        assert_eq!(fx.class(), "static a b c");
        fx.pass(|p| {
            p.select(0)?;
            p.class_map("b")?;
            p.class_prop("c", false)
        });
        assert_eq!(fx.class(), "static b");
    }

    #[test]
    fn test_map_removal_restores_static() {
        let attrs = TAttributes::new().styles([("height", "10px")]);
        let mut fx = Fixture::new(Some(attrs), vec![], 1);
        fx.pass(|p| {
            p.select(0)?;
            p.style_map(StylingInput::map([("height", "20px")]))
        });
        assert_eq!(fx.style(), "height: 20px;");
        fx.pass(|p| {
            p.select(0)?;
            p.style_map(StylingInput::Null)
        });
        assert_eq!(fx.style(), "height: 10px;");
    }

    #[test]
    fn test_unchanged_values_skip_renderer() {
        let mut builder = TViewBuilder::new();
        builder.element("div", None);
        builder.template_vars(4);
        let mut tview = builder.build();
        let mut lview = LView::new(&tview);
        let mut renderer = RecordingRenderer::new(NullRenderer);
        element_create(&tview, &mut lview, &mut renderer, 0, ElementId(0)).unwrap();
        let config = StylingConfig::development();

        for _ in 0..3 {
            let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);
            pass.select(0).unwrap();
            pass.style_prop("color", "red", None).unwrap();
            pass.class_map(StylingInput::list(["x", "y"])).unwrap();
            pass.finish();
        }
        assert_eq!(renderer.calls().len(), 3);
    }

    #[test]
    fn test_unchanged_nan_reaches_renderer_once() {
        let mut builder = TViewBuilder::new();
        builder.element("div", None);
        builder.template_vars(4);
        let mut tview = builder.build();
        let mut lview = LView::new(&tview);
        let mut renderer = RecordingRenderer::new(NullRenderer);
        element_create(&tview, &mut lview, &mut renderer, 0, ElementId(0)).unwrap();
        let config = StylingConfig::development();

        for _ in 0..3 {
            let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);
            pass.select(0).unwrap();
            pass.style_prop("opacity", f64::NAN, None).unwrap();
            pass.style_map(StylingInput::map([("zIndex", f64::NAN)])).unwrap();
            pass.finish();
        }
        assert_eq!(renderer.calls().len(), 2);
    }

    #[test]
    fn test_select_leaves_host_bindings() {
        let mut builder = TViewBuilder::new();
        builder.element_with_directives("div", None, vec![DirectiveDef::new("dir").styling_bindings(1)]);
        builder.element("span", None);
        builder.template_vars(2);
        let mut tview = builder.build();
        let mut lview = LView::new(&tview);
        let mut doc = DomDocument::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        let config = StylingConfig::development();
        {
            let mut renderer = DirectAdapter::new(&mut doc);
            element_create(&tview, &mut lview, &mut renderer, 0, div).unwrap();
            element_create(&tview, &mut lview, &mut renderer, 1, span).unwrap();
        }

        let root = tview.directives[0].host_binding_root;
        let mut renderer = DirectAdapter::new(&mut doc);
        let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);
        pass.enter_host_bindings(0).unwrap();
        assert_eq!(pass.allocate_styling_slot(), root);
        pass.select(1).unwrap();
        pass.style_prop("color", "red", None).unwrap();
        pass.finish();

        let span_binding = tview.binding(HEADER_OFFSET).unwrap();
        assert_eq!(span_binding.key.primitive().prop(), Some("color"));
        assert_eq!(tview.nodes[1].style_bindings.prev(), HEADER_OFFSET);
        assert_eq!(tview.nodes[1].style_bindings.next(), HEADER_OFFSET);
        assert!(tview.binding(root).is_none());
        assert_eq!(doc.element(span).unwrap().style_text(), "color: red;");
        assert_eq!(doc.element(div).unwrap().style_text(), "");
    }

    #[test]
    fn test_slots_increase_within_a_block() {
        let directive = DirectiveDef::new("dir").styling_bindings(2);
        let mut fx = Fixture::new(None, vec![directive], 2);
        let root = fx.tview.directives[0].host_binding_root;
        let mut renderer = NullRenderer;
        let mut pass = UpdatePass::new(&mut fx.tview, &mut fx.lview, &mut renderer, &fx.config);
        assert_eq!(pass.allocate_styling_slot(), HEADER_OFFSET);
        pass.enter_host_bindings(0).unwrap();
        assert_eq!(pass.allocate_styling_slot(), root);
        assert_eq!(pass.allocate_styling_slot(), root + 2);
        pass.select(0).unwrap();
        assert_eq!(pass.allocate_styling_slot(), HEADER_OFFSET + 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "increasing order")]
    fn test_slot_going_backwards_is_caught() {
        let mut fx = Fixture::new(None, vec![], 2);
        let mut renderer = NullRenderer;
        let mut pass = UpdatePass::new(&mut fx.tview, &mut fx.lview, &mut renderer, &fx.config);
        pass.last_slot = Some(HEADER_OFFSET + 2);
        pass.allocate_styling_slot();
    }

    #[test]
    fn test_host_binding_below_template() {
        let directive = DirectiveDef::new("dir").styling_bindings(1);
        let mut fx = Fixture::new(None, vec![directive], 1);
        fx.pass(|p| {
            p.select(0)?;
            p.style_prop("color", "blue", None)?;
            p.enter_host_bindings(0)?;
            p.style_prop("color", "red", None)
        });
        assert_eq!(fx.style(), "color: blue;");
        fx.pass(|p| {
            p.select(0)?;
            p.style_prop("color", StylingInput::Undefined, None)?;
            p.enter_host_bindings(0)?;
            p.style_prop("color", "red", None)
        });
        assert_eq!(fx.style(), "color: red;");
    }

    #[test]
    fn test_input_shadowing_forwards_value() {
        let mut builder = TViewBuilder::new();
        let node = builder.element("div", Some(TAttributes::new().classes(["own"])));
        builder.shadow_input(node, true);
        builder.template_vars(2);
        let mut tview = builder.build();
        let mut lview = LView::new(&tview);
        let mut renderer = RecordingRenderer::new(NullRenderer);
        element_create(&tview, &mut lview, &mut renderer, 0, ElementId(0)).unwrap();
        renderer.take_calls();
        let config = StylingConfig::development();

        let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);
        pass.select(0).unwrap();
        pass.class_map("dyn").unwrap();
        pass.finish();

        assert!(renderer.calls().is_empty());
        assert_eq!(
            lview.shadowed_inputs,
            vec![ShadowedInput {
                node: 0,
                input: "class",
                value: StylingInput::from("own dyn"),
            }]
        );
    }

    #[test]
    fn test_container_nodes_are_inert() {
        let mut builder = TViewBuilder::new();
        builder.container(TNodeType::ElementContainer);
        builder.template_vars(2);
        let mut tview = builder.build();
        let mut lview = LView::new(&tview);
        let mut renderer = RecordingRenderer::new(NullRenderer);
        element_create(&tview, &mut lview, &mut renderer, 0, ElementId(0)).unwrap();
        let config = StylingConfig::development();

        let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);
        pass.select(0).unwrap();
        pass.style_prop("color", "red", None).unwrap();
        pass.finish();
        assert!(renderer.calls().is_empty());
        assert!(tview.binding(HEADER_OFFSET).is_some());
    }

    #[test]
    fn test_errors() {
        let mut builder = TViewBuilder::new();
        builder.element("div", None);
        builder.template_vars(2);
        let mut tview = builder.build();
        let mut lview = LView::new(&tview);
        let mut renderer = NullRenderer;
        let config = StylingConfig::development();
        let mut pass = UpdatePass::new(&mut tview, &mut lview, &mut renderer, &config);

        assert_eq!(pass.style_prop("a", "b", None), Err(StylingError::NoElementSelected));
        assert_eq!(pass.select(5), Err(StylingError::UnknownNode(5)));
        assert_eq!(pass.enter_host_bindings(0), Err(StylingError::UnknownDirective(0)));
        pass.select(0).unwrap();
        pass.style_prop("a", "b", None).unwrap();
        assert_eq!(
            pass.style_map("c: d"),
            Err(StylingError::BindingOutOfBounds { index: 4, len: 4 })
        );
    }
}
