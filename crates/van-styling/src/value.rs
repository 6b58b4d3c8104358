use std::fmt;

/// A style value the application has explicitly marked as safe.
///
/// Trusted values skip the style sanitizer and are applied verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedStyle(pub String);

impl TrustedStyle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The raw value a template expression hands to a styling instruction.
///
/// `Undefined` means "this binding has no opinion" and lets lower-priority
/// sources show through; `Null` removes the property.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StylingInput {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Trusted(TrustedStyle),
    /// A list of class names.
    List(Vec<String>),
    /// A key-ordered object, e.g. `{ color: 'red', width: '10px' }`.
    Map(Vec<(String, StylingInput)>),
}

impl StylingInput {
    /// Build a `Map` input from `(key, value)` pairs, keeping their order.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<StylingInput>,
        I: IntoIterator<Item = (K, V)>,
    {
        StylingInput::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a `List` input of class names.
    pub fn list<S, I>(names: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        StylingInput::List(names.into_iter().map(Into::into).collect())
    }

    pub fn trusted(value: impl Into<String>) -> Self {
        StylingInput::Trusted(TrustedStyle::new(value))
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            StylingInput::Undefined => "undefined",
            StylingInput::Null => "null",
            StylingInput::Bool(_) => "boolean",
            StylingInput::Number(_) => "number",
            StylingInput::Str(_) => "string",
            StylingInput::Trusted(_) => "trusted style",
            StylingInput::List(_) => "list",
            StylingInput::Map(_) => "object",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, StylingInput::Undefined | StylingInput::Null)
    }

    /// Equality for change detection: `NaN` is the same value as `NaN`.
    pub fn same_value(&self, other: &StylingInput) -> bool {
        match (self, other) {
            (StylingInput::Number(a), StylingInput::Number(b)) => same_number(*a, *b),
            (StylingInput::Map(a), StylingInput::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_value(vb))
            }
            _ => self == other,
        }
    }
}

fn same_number(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl From<&str> for StylingInput {
    fn from(value: &str) -> Self {
        StylingInput::Str(value.to_string())
    }
}

impl From<String> for StylingInput {
    fn from(value: String) -> Self {
        StylingInput::Str(value)
    }
}

impl From<bool> for StylingInput {
    fn from(value: bool) -> Self {
        StylingInput::Bool(value)
    }
}

impl From<f64> for StylingInput {
    fn from(value: f64) -> Self {
        StylingInput::Number(value)
    }
}

impl From<i32> for StylingInput {
    fn from(value: i32) -> Self {
        StylingInput::Number(f64::from(value))
    }
}

impl From<TrustedStyle> for StylingInput {
    fn from(value: TrustedStyle) -> Self {
        StylingInput::Trusted(value)
    }
}

impl<T: Into<StylingInput>> From<Option<T>> for StylingInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(StylingInput::Undefined, Into::into)
    }
}

/// A normalized value stored per binding and handed to the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StylingValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl StylingValue {
    /// Only `Undefined` means "no opinion"; every other value, `Null` included, wins
    /// over lower-priority sources.
    pub fn is_present(&self) -> bool {
        !matches!(self, StylingValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, StylingValue::Undefined | StylingValue::Null)
    }

    /// Class toggles follow the usual truthiness rules: empty strings, `0`, `NaN`,
    /// `false`, null and undefined remove the class.
    pub fn is_truthy(&self) -> bool {
        match self {
            StylingValue::Undefined | StylingValue::Null => false,
            StylingValue::Bool(b) => *b,
            StylingValue::Number(n) => *n != 0.0 && !n.is_nan(),
            StylingValue::Str(s) => !s.is_empty(),
        }
    }

    /// Equality for change detection: `NaN` is the same value as `NaN`.
    pub fn same_value(&self, other: &StylingValue) -> bool {
        match (self, other) {
            (StylingValue::Number(a), StylingValue::Number(b)) => same_number(*a, *b),
            _ => self == other,
        }
    }

    /// Text written to an inline style, or `None` when the property should be removed.
    pub fn to_style_text(&self) -> Option<String> {
        match self {
            StylingValue::Undefined | StylingValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for StylingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StylingValue::Undefined => f.write_str("undefined"),
            StylingValue::Null => f.write_str("null"),
            StylingValue::Bool(b) => write!(f, "{b}"),
            StylingValue::Number(n) => write!(f, "{n}"),
            StylingValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for StylingValue {
    fn from(value: &str) -> Self {
        StylingValue::Str(value.to_string())
    }
}

impl From<String> for StylingValue {
    fn from(value: String) -> Self {
        StylingValue::Str(value)
    }
}

impl From<bool> for StylingValue {
    fn from(value: bool) -> Self {
        StylingValue::Bool(value)
    }
}
