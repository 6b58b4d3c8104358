//! Incremental class/style resolution for rendered elements.
//!
//! Every element gathers styling from several sources: static `class`/`style`
//! attributes, static host attributes of its directives, directive host bindings
//! and template bindings. Each class or style property ends up with one value,
//! picked by priority:
//!
//! ```text
//! template bindings > later directive host bindings > earlier ones > statics
//! ```
//!
//! Bindings are linked into a per-element priority list the first time they run
//! ([`insert_binding`]). After that, every changed value is resolved against the
//! list ([`resolve_and_apply`]) and only the winner reaches the renderer. Map
//! bindings (`[style]`, `[class]`) are normalized into sorted [`ArrayMap`]s and
//! diffed against their previous value ([`diff_array_maps`]).

mod array_map;
mod attrs;
mod binding_list;
mod config;
mod diff;
pub mod dom;
mod error;
mod instructions;
mod key;
mod normalize;
pub mod parser;
pub mod renderer;
mod resolve;
pub mod sanitize;
mod statics;
mod value;
mod view;

pub use array_map::{ArrayMap, EMPTY_ARRAY_MAP};
pub use attrs::{AttributeMarker, TAttr, TAttributes};
pub use binding_list::{insert_binding, keys_match, mark_duplicates};
pub use config::{StylingConfig, UnsupportedInputPolicy};
pub use diff::diff_array_maps;
pub use dom::{DomDocument, DomElement};
pub use error::{Result, StylingError};
pub use instructions::{element_create, UpdatePass};
pub use key::{KeyPrimitive, StylingKey, StylingRange};
pub use normalize::{normalize_prop_value, to_array_map, StyleSuffix};
pub use renderer::{
    apply_styling, DirectAdapter, ElementId, NullRenderer, ProceduralAdapter, ProceduralRenderer,
    RecordingRenderer, RendererCall, StyleFlags, StylingRenderer,
};
pub use resolve::{find_binding_value, resolve_and_apply};
pub use sanitize::{sanitize_style, sanitize_url};
pub use statics::{
    collect_from_directives, collect_residual, collect_static_from_attributes, collect_static_map,
    compute_static_styling, static_value, template_head_key, wrap_in_static_styling_key,
    write_static_styling,
};
pub use value::{StylingInput, StylingValue, TrustedStyle};
pub use view::{
    DirectiveDef, DirectiveEntry, LSlot, LView, Residual, ShadowedInput, TNode, TNodeType,
    TStylingBinding, TView, TViewBuilder, HEADER_OFFSET,
};
