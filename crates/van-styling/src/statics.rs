//! Static class/style collection: folding attribute and directive host statics
//! into binding keys and residual maps during the first update pass.

use tracing::debug;

use crate::array_map::ArrayMap;
use crate::attrs::TAttributes;
use crate::key::{KeyPrimitive, StylingKey, StylingRange};
use crate::renderer::{apply_styling, ElementId, StylingRenderer};
use crate::value::StylingValue;
use crate::view::{DirectiveEntry, Residual, TNode, TStylingBinding, TView};

/// Fold the class (or style) entries of `attrs` into `map`; later entries win.
pub fn collect_static_map(map: &mut ArrayMap, attrs: Option<&TAttributes>, is_class: bool) {
    if let Some(attrs) = attrs {
        for (key, value) in attrs.static_entries(is_class) {
            map.set(key, value);
        }
    }
}

/// Fold the statics of `attrs` into the wrapper of `key`, creating the wrapper
/// on first use.
pub fn collect_static_from_attributes(
    key: StylingKey,
    attrs: Option<&TAttributes>,
    is_class: bool,
) -> StylingKey {
    let Some(attrs) = attrs else {
        return key;
    };
    if attrs.static_entries(is_class).next().is_none() {
        return key;
    }
    let (mut statics, primitive) = match key {
        StylingKey::Primitive(primitive) => (ArrayMap::new(), primitive),
        StylingKey::WithStatics { statics, key } => (statics, key),
    };
    collect_static_map(&mut statics, Some(attrs), is_class);
    StylingKey::with_statics(primitive, statics)
}

/// Fold host statics of the node's directives, starting after the styling cursor.
///
/// With `host = Some(d)` the walk stops at directive `d` and the cursor moves
/// there; with `None` it runs to the last directive and the cursor is untouched.
pub fn collect_from_directives(
    directives: &[DirectiveEntry],
    tnode: &mut TNode,
    host: Option<usize>,
    mut key: StylingKey,
    is_class: bool,
) -> StylingKey {
    let mut cursor = match tnode.styling_cursor(is_class) {
        None => tnode.directive_start,
        Some(last) => last + 1,
    };
    while cursor < tnode.directive_end {
        let host_attrs = directives
            .get(cursor)
            .and_then(|entry| entry.def.host_attrs.as_ref());
        key = collect_static_from_attributes(key, host_attrs, is_class);
        if Some(cursor) == host {
            break;
        }
        cursor += 1;
    }
    if host.is_some() {
        tnode.set_styling_cursor(is_class, Some(cursor));
    }
    key
}

/// Statics of the directives after the cursor plus the element's own attributes.
pub fn collect_residual(directives: &[DirectiveEntry], tnode: &TNode, is_class: bool) -> ArrayMap {
    let start = tnode
        .styling_cursor(is_class)
        .map_or(tnode.directive_start, |last| last + 1);
    let mut residual = ArrayMap::new();
    for entry in directives.get(start..tnode.directive_end).unwrap_or_default() {
        collect_static_map(&mut residual, entry.def.host_attrs.as_ref(), is_class);
    }
    collect_static_map(&mut residual, tnode.attrs.as_ref(), is_class);
    residual
}

/// Key of the first template binding, if the template has any.
pub fn template_head_key<'a>(
    data: &'a [Option<TStylingBinding>],
    tnode: &TNode,
    is_class: bool,
) -> Option<&'a StylingKey> {
    let bindings = tnode.bindings(is_class);
    if bindings.next() == 0 {
        return None;
    }
    data.get(bindings.prev())?.as_ref().map(|binding| &binding.key)
}

pub fn set_template_head_key(
    data: &mut [Option<TStylingBinding>],
    tnode: &TNode,
    is_class: bool,
    key: StylingKey,
) {
    let bindings = tnode.bindings(is_class);
    if bindings.next() == 0 {
        return;
    }
    if let Some(Some(binding)) = data.get_mut(bindings.prev()) {
        binding.key = key;
    }
}

/// Attach the static values that belong to the binding being inserted.
///
/// - The first template binding takes every static value (all directives, then
///   the element's own attributes) and the residual becomes empty.
/// - The first binding of each directive's host function takes the statics of
///   the directives up to and including its own. The remaining statics either
///   move back onto the template head key or, without template bindings, into
///   the residual map.
pub fn wrap_in_static_styling_key(
    tview: &mut TView,
    node: usize,
    key: KeyPrimitive,
    is_class: bool,
    host: Option<usize>,
) -> StylingKey {
    let TView {
        nodes,
        directives,
        data,
        ..
    } = tview;
    let key = StylingKey::Primitive(key);
    let Some(tnode) = nodes.get_mut(node) else {
        return key;
    };
    match host {
        None => {
            if tnode.bindings(is_class) != StylingRange::EMPTY {
                return key;
            }
            let key = collect_from_directives(directives, tnode, None, key, is_class);
            let key = collect_static_from_attributes(key, tnode.attrs.as_ref(), is_class);
            tnode.set_residual(is_class, Residual::Empty);
            key
        }
        Some(directive) => {
            if tnode.styling_cursor(is_class) == Some(directive) {
                return key;
            }
            let key = collect_from_directives(directives, tnode, Some(directive), key, is_class);
            if matches!(tnode.residual(is_class), Residual::Empty) {
                let head = template_head_key(data, tnode, is_class);
                if let Some(StylingKey::WithStatics { key: primitive, .. }) = head {
                    let primitive = StylingKey::Primitive(primitive.clone());
                    let head = collect_from_directives(directives, tnode, None, primitive, is_class);
                    let head = collect_static_from_attributes(head, tnode.attrs.as_ref(), is_class);
                    debug!(node, directive, is_class, "recomputed template head statics");
                    set_template_head_key(data, tnode, is_class, head);
                }
            } else {
                let residual = collect_residual(directives, tnode, is_class);
                debug!(node, directive, is_class, entries = residual.len(), "recomputed residual statics");
                tnode.set_residual(is_class, Residual::Map(residual));
            }
            key
        }
    }
}

/// Static value of `prop` for `node`: the residual first, then the statics folded
/// into binding keys from the highest-priority binding down.
pub fn static_value(tview: &TView, tnode: &TNode, prop: &str, is_class: bool) -> StylingValue {
    if let Residual::Map(residual) = tnode.residual(is_class) {
        if let Some(value) = residual.get(prop) {
            return value.clone();
        }
    }
    let bindings = tnode.bindings(is_class);
    let mut cursor = if bindings.next() != 0 {
        bindings.next()
    } else {
        bindings.prev()
    };
    while let Some(binding) = tview.binding(cursor) {
        if let Some(value) = binding.key.statics().and_then(|statics| statics.get(prop)) {
            return value.clone();
        }
        cursor = binding.range.prev();
    }
    StylingValue::Undefined
}

fn concat_with_space(acc: Option<String>, value: &str) -> Option<String> {
    Some(match acc {
        None => value.to_string(),
        Some(acc) if acc.is_empty() => value.to_string(),
        Some(acc) => format!("{acc} {value}"),
    })
}

fn static_text(
    mut classes: Option<String>,
    mut styles: Option<String>,
    attrs: Option<&TAttributes>,
) -> (Option<String>, Option<String>) {
    if let Some(attrs) = attrs {
        for (name, _) in attrs.static_entries(true) {
            classes = concat_with_space(classes, name);
        }
        for (prop, value) in attrs.static_entries(false) {
            styles = concat_with_space(styles, &format!("{prop}: {value};"));
        }
    }
    (classes, styles)
}

/// Fill in the static class/style text of every node: the element's own statics
/// alone, and combined with directive host statics (directives first).
pub fn compute_static_styling(tview: &mut TView) {
    let TView {
        nodes, directives, ..
    } = tview;
    for tnode in nodes.iter_mut() {
        let (classes, styles) = static_text(None, None, tnode.attrs.as_ref());
        tnode.classes_without_host = classes;
        tnode.styles_without_host = styles;

        let mut combined = (None, None);
        for entry in directives.get(tnode.directives()).unwrap_or_default() {
            combined = static_text(combined.0, combined.1, entry.def.host_attrs.as_ref());
        }
        let (classes, styles) = static_text(combined.0, combined.1, tnode.attrs.as_ref());
        tnode.classes = classes;
        tnode.styles = styles;
    }
}

/// Write the static classes and styles of `tnode` to a freshly created element.
pub fn write_static_styling(renderer: &mut dyn StylingRenderer, element: ElementId, tnode: &TNode) {
    if let Some(classes) = &tnode.classes {
        for name in crate::parser::class_names(classes) {
            apply_styling(renderer, true, element, name, &StylingValue::Bool(true));
        }
    }
    if let Some(styles) = &tnode.styles {
        for (prop, value) in crate::parser::style_declarations(styles, false).flatten() {
            apply_styling(renderer, false, element, prop, &StylingValue::from(value));
        }
    }
}
