//! The per-element styling priority list.
//!
//! Bindings are linked through the `prev`/`next` indices of their
//! [`StylingRange`], lowest priority first:
//!
//! ```text
//! host(dir 0) <-> host(dir 1) <-> ... <-> template(1st) <-> ... <-> template(last)
//! ```
//!
//! The node keeps `(template head, template tail)`; host bindings are spliced in
//! right below the template head, template bindings are appended at the tail.

use tracing::trace;

use crate::config::StylingConfig;
use crate::error::{Result, StylingError};
use crate::key::{KeyPrimitive, StylingKey, StylingRange};
use crate::view::{TStylingBinding, TView};

/// Whether two binding keys can produce a value for the same property. A map
/// binding matches everything; a neutralized binding never produces values.
pub fn keys_match(a: &KeyPrimitive, b: &KeyPrimitive) -> bool {
    match (a, b) {
        (KeyPrimitive::Neutralized, _) | (_, KeyPrimitive::Neutralized) => false,
        (KeyPrimitive::Map, _) | (_, KeyPrimitive::Map) => true,
        (KeyPrimitive::Prop(a), KeyPrimitive::Prop(b)) => a == b,
    }
}

fn update_range(data: &mut [Option<TStylingBinding>], index: usize, f: impl FnOnce(StylingRange) -> StylingRange) {
    if let Some(Some(binding)) = data.get_mut(index) {
        binding.range = f(binding.range);
    }
}

fn range_at(data: &[Option<TStylingBinding>], index: usize) -> StylingRange {
    match data.get(index) {
        Some(Some(binding)) => binding.range,
        _ => StylingRange::EMPTY,
    }
}

/// Link binding `index` into the class (or style) priority list of `node` and
/// update the duplicate flags of every binding sharing its key.
///
/// Runs once per binding, during the first update pass.
pub fn insert_binding(
    tview: &mut TView,
    node: usize,
    key: StylingKey,
    index: usize,
    is_host: bool,
    is_class: bool,
    config: &StylingConfig,
) -> Result<()> {
    if index > StylingRange::MAX_INDEX {
        return Err(StylingError::BindingOutOfBounds {
            index,
            len: StylingRange::MAX_INDEX + 1,
        });
    }
    if index + 1 >= tview.data.len() {
        return Err(StylingError::BindingOutOfBounds {
            index,
            len: tview.data.len(),
        });
    }
    if config.dev_mode && tview.data[index].is_some() {
        return Err(StylingError::AlreadyInserted { index });
    }
    let TView { nodes, data, .. } = tview;
    let tnode = nodes.get_mut(node).ok_or(StylingError::UnknownNode(node))?;
    let bindings = tnode.bindings(is_class);
    let mut head = bindings.prev();
    let mut tail = bindings.next();

    let range = if is_host {
        if tail != 0 {
            let previous = range_at(data, head).prev();
            if previous != 0 {
                update_range(data, previous, |r| r.with_next(index));
            }
            update_range(data, head, |r| r.with_prev(index));
            StylingRange::new(previous, head)
        } else {
            if head != 0 {
                update_range(data, head, |r| r.with_next(index));
            }
            let range = StylingRange::new(head, 0);
            head = index;
            range
        }
    } else {
        let range = if head != 0 && tail == 0 {
            if config.dev_mode {
                return Err(StylingError::TemplateAfterHostBindings { index });
            }
            // Host bindings ran first: stack the template on top of them.
            update_range(data, head, |r| r.with_next(index));
            let range = StylingRange::new(head, 0);
            head = index;
            range
        } else {
            if head == 0 {
                head = index;
            } else {
                update_range(data, tail, |r| r.with_next(index));
            }
            StylingRange::new(tail, 0)
        };
        tail = index;
        range
    };

    let primitive = key.primitive().clone();
    data[index] = Some(TStylingBinding { key, range });
    mark_duplicates(data, &primitive, index, true);
    mark_duplicates(data, &primitive, index, false);
    tnode.set_bindings(is_class, StylingRange::new(head, tail));
    trace!(index, node, is_host, is_class, ?primitive, "inserted styling binding");
    Ok(())
}

/// Walk from `index` towards lower (`is_prev_dir`) or higher priority and flag
/// every binding whose key matches.
///
/// A property key stops at the first match: anything beyond it already carries
/// the flag relative to that match. A map key matches everything and walks the
/// whole list.
pub fn mark_duplicates(
    data: &mut [Option<TStylingBinding>],
    key: &KeyPrimitive,
    index: usize,
    is_prev_dir: bool,
) {
    let own = range_at(data, index);
    let is_map = matches!(key, KeyPrimitive::Map);
    let mut cursor = if is_prev_dir { own.prev() } else { own.next() };
    let mut found = false;
    while cursor != 0 && (!found || is_map) {
        let Some(Some(binding)) = data.get_mut(cursor) else {
            break;
        };
        if keys_match(binding.key.primitive(), key) {
            found = true;
            binding.range = if is_prev_dir {
                binding.range.with_next_duplicate()
            } else {
                binding.range.with_prev_duplicate()
            };
        }
        cursor = if is_prev_dir {
            binding.range.prev()
        } else {
            binding.range.next()
        };
    }
    if found {
        update_range(data, index, |r| {
            if is_prev_dir {
                r.with_prev_duplicate()
            } else {
                r.with_next_duplicate()
            }
        });
    }
}
