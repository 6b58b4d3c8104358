use std::fmt;

use tracing::warn;

use crate::array_map::ArrayMap;
use crate::config::{StylingConfig, UnsupportedInputPolicy};
use crate::error::{Result, StylingError};
use crate::parser::{class_names, style_declarations};
use crate::sanitize::{sanitize_style, style_prop_needs_sanitization};
use crate::value::{StylingInput, StylingValue};

/// Post-processing attached to a single `[style.prop]` binding.
#[derive(Clone)]
pub enum StyleSuffix {
    /// Appended to non-empty values, e.g. `[style.width.px]`.
    Unit(String),
    /// Replaces the default sanitizer for this binding.
    Sanitizer(fn(&str) -> String),
}

impl StyleSuffix {
    pub fn unit(unit: impl Into<String>) -> Self {
        StyleSuffix::Unit(unit.into())
    }
}

impl fmt::Debug for StyleSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleSuffix::Unit(unit) => f.debug_tuple("Unit").field(unit).finish(),
            StyleSuffix::Sanitizer(_) => f.write_str("Sanitizer(..)"),
        }
    }
}

/// Convert a `[class]` / `[style]` input into a sorted [`ArrayMap`].
///
/// - `undefined`, `null` and `""` produce an empty map.
/// - Strings are tokenized (`"a b"` for classes, `"color: red"` for styles).
/// - Class lists map every name to `true`.
/// - Objects map each key to its value, sanitizing url-bearing style properties.
///
/// Any other shape follows [`StylingConfig::unsupported_input`].
pub fn to_array_map(input: &StylingInput, is_class: bool, config: &StylingConfig) -> Result<ArrayMap> {
    let mut map = ArrayMap::new();
    match input {
        StylingInput::Undefined | StylingInput::Null => {}
        StylingInput::Str(text) if is_class => {
            for name in class_names(text) {
                map.set(name, StylingValue::Bool(true));
            }
        }
        StylingInput::Str(text) => {
            parse_style_into(&mut map, text, config, config.sanitize_styles)?;
        }
        StylingInput::Trusted(trusted) if is_class => {
            for name in class_names(trusted.as_str()) {
                map.set(name, StylingValue::Bool(true));
            }
        }
        StylingInput::Trusted(trusted) => {
            parse_style_into(&mut map, trusted.as_str(), config, false)?;
        }
        StylingInput::List(names) if is_class => {
            for name in names {
                map.set(name.as_str(), StylingValue::Bool(true));
            }
        }
        StylingInput::Map(entries) => {
            for (key, value) in entries {
                let value = if is_class {
                    class_value(value)
                } else {
                    normalize_prop_value(value, None, key, false, config)?
                };
                map.set(key.as_str(), value);
            }
        }
        other => return unsupported(other, config).map(|()| map),
    }
    Ok(map)
}

fn parse_style_into(
    map: &mut ArrayMap,
    text: &str,
    config: &StylingConfig,
    sanitize: bool,
) -> Result<()> {
    for declaration in style_declarations(text, config.dev_mode) {
        let (prop, value) = declaration?;
        if prop.is_empty() {
            continue;
        }
        let value = if sanitize && style_prop_needs_sanitization(prop) {
            sanitize_style(value)
        } else {
            value.to_string()
        };
        map.set(prop, StylingValue::Str(value));
    }
    Ok(())
}

/// Normalize the value of a single-property binding (`[class.x]`, `[style.x]`, or
/// one entry of a map).
///
/// Null and empty values never receive a unit suffix. Trusted values bypass every
/// sanitizer.
pub fn normalize_prop_value(
    value: &StylingInput,
    suffix: Option<&StyleSuffix>,
    prop: &str,
    is_class: bool,
    config: &StylingConfig,
) -> Result<StylingValue> {
    if is_class {
        return Ok(class_value(value));
    }
    let text = match value {
        StylingInput::Undefined => return Ok(StylingValue::Undefined),
        StylingInput::Null => return Ok(StylingValue::Null),
        StylingInput::Str(s) if s.is_empty() => return Ok(StylingValue::Str(String::new())),
        StylingInput::Trusted(trusted) => {
            return Ok(match suffix {
                Some(StyleSuffix::Unit(unit)) => StylingValue::Str(format!("{}{unit}", trusted.as_str())),
                _ => StylingValue::Str(trusted.as_str().to_string()),
            });
        }
        StylingInput::Str(s) => s.clone(),
        StylingInput::Number(n) if suffix.is_none() => return Ok(StylingValue::Number(*n)),
        StylingInput::Bool(b) if suffix.is_none() => return Ok(StylingValue::Bool(*b)),
        StylingInput::Number(n) => StylingValue::Number(*n).to_string(),
        StylingInput::Bool(b) => b.to_string(),
        other => {
            unsupported(other, config)?;
            return Ok(StylingValue::Undefined);
        }
    };
    let text = match suffix {
        Some(StyleSuffix::Unit(unit)) => format!("{text}{unit}"),
        Some(StyleSuffix::Sanitizer(sanitizer)) => sanitizer(&text),
        None if config.sanitize_styles && style_prop_needs_sanitization(prop) => sanitize_style(&text),
        None => text,
    };
    Ok(StylingValue::Str(text))
}

/// Class toggles keep their raw value; truthiness is evaluated when applied.
fn class_value(value: &StylingInput) -> StylingValue {
    match value {
        StylingInput::Undefined => StylingValue::Undefined,
        StylingInput::Null => StylingValue::Null,
        StylingInput::Bool(b) => StylingValue::Bool(*b),
        StylingInput::Number(n) => StylingValue::Number(*n),
        StylingInput::Str(s) => StylingValue::Str(s.clone()),
        StylingInput::Trusted(t) => StylingValue::Str(t.as_str().to_string()),
        // Objects and lists are always truthy.
        StylingInput::List(_) | StylingInput::Map(_) => StylingValue::Bool(true),
    }
}

fn unsupported(input: &StylingInput, config: &StylingConfig) -> Result<()> {
    match config.unsupported_input {
        UnsupportedInputPolicy::Error => Err(StylingError::UnsupportedInput {
            kind: input.kind(),
            value: format!("{input:?}"),
        }),
        UnsupportedInputPolicy::Empty => {
            warn!(kind = input.kind(), "unsupported styling input treated as empty");
            Ok(())
        }
    }
}
