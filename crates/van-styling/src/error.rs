use thiserror::Error;

/// Errors surfaced by the styling engine.
///
/// Contract violations (`AlreadyInserted`, `TemplateAfterHostBindings`, ...) are only
/// reported when [`StylingConfig::dev_mode`](crate::StylingConfig) is on; the other
/// variants depend on the configured input policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StylingError {
    #[error("Unsupported styling type {kind}: {value}")]
    UnsupportedInput { kind: &'static str, value: String },

    #[error("Malformed style at location {index} in string '{text}'. Expecting '{expected}'.")]
    MalformedStyle {
        text: String,
        expected: char,
        index: usize,
    },

    #[error("Unterminated quote {quote} in style '{text}'")]
    UnterminatedQuote { text: String, quote: char },

    #[error("No element is selected; call `select` before a styling instruction")]
    NoElementSelected,

    #[error("Node {0} does not exist in this template")]
    UnknownNode(usize),

    #[error("Directive {0} is not registered in this template")]
    UnknownDirective(usize),

    #[error("Styling binding at index {index} was already inserted")]
    AlreadyInserted { index: usize },

    #[error("Adding template bindings after host bindings is not allowed (binding {index})")]
    TemplateAfterHostBindings { index: usize },

    #[error("Binding index {index} is out of bounds (view has {len} slots)")]
    BindingOutOfBounds { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, StylingError>;
