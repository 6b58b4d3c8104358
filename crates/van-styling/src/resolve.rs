use tracing::trace;

use crate::key::KeyPrimitive;
use crate::renderer::{apply_styling, StylingRenderer};
use crate::statics::static_value;
use crate::value::StylingValue;
use crate::view::{LSlot, LView, TNodeType, TView};

/// Value binding `index` currently contributes for `prop`: the map entry for a
/// map binding, the stored value for a matching property binding, `Undefined`
/// for anything else (including bindings that have not run yet).
fn binding_value(tview: &TView, lview: &LView, index: usize, prop: &str) -> StylingValue {
    let Some(binding) = tview.binding(index) else {
        return StylingValue::Undefined;
    };
    match (binding.key.primitive(), lview.slot(index + 1)) {
        (KeyPrimitive::Map, Some(LSlot::Map(map))) => map.value_of(prop),
        (KeyPrimitive::Prop(key), Some(LSlot::Value(value))) if key == prop => value.clone(),
        _ => StylingValue::Undefined,
    }
}

/// Walk the priority list from `index` (inclusive) towards higher priority
/// (`forward`) or lower priority, returning the first value present for `prop`.
pub fn find_binding_value(
    tview: &TView,
    lview: &LView,
    prop: &str,
    mut index: usize,
    forward: bool,
) -> StylingValue {
    while let Some(binding) = tview.binding(index) {
        let value = binding_value(tview, lview, index, prop);
        if value.is_present() {
            return value;
        }
        index = if forward {
            binding.range.next()
        } else {
            binding.range.prev()
        };
    }
    StylingValue::Undefined
}

/// Decide what `prop` should be on the element after binding `binding_index`
/// produced `value`, and apply it.
///
/// 1. A higher-priority duplicate holding a value owns the property: do nothing.
/// 2. An `Undefined` value falls back to the nearest lower-priority duplicate.
/// 3. Still `Undefined`: fall back to the static values.
///
/// Non-element nodes and nodes without a native element are left alone.
#[allow(clippy::too_many_arguments)]
pub fn resolve_and_apply(
    tview: &TView,
    lview: &LView,
    renderer: &mut dyn StylingRenderer,
    node: usize,
    prop: &str,
    value: StylingValue,
    is_class: bool,
    binding_index: usize,
) {
    let Some(tnode) = tview.node(node) else {
        return;
    };
    if tnode.kind != TNodeType::Element {
        return;
    }
    let Some(element) = lview.native(node) else {
        return;
    };
    let Some(binding) = tview.binding(binding_index) else {
        return;
    };
    let range = binding.range;
    if range.next_duplicate() {
        let higher = find_binding_value(tview, lview, prop, range.next(), true);
        if higher.is_present() {
            trace!(prop, binding_index, "shadowed by higher-priority binding");
            return;
        }
    }
    let mut value = value;
    if !value.is_present() && range.prev_duplicate() {
        value = find_binding_value(tview, lview, prop, range.prev(), false);
    }
    if !value.is_present() {
        value = static_value(tview, tnode, prop, is_class);
    }
    apply_styling(renderer, is_class, element, prop, &value);
}
