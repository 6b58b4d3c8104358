use serde::{Deserialize, Serialize};

/// What the map normalizer does with an input shape it cannot interpret
/// (a number passed to `[style]`, a list passed to `[style]`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedInputPolicy {
    /// Return [`StylingError::UnsupportedInput`](crate::StylingError).
    Error,
    /// Log a warning and treat the input as an empty map.
    Empty,
}

/// Runtime switches for the styling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylingConfig {
    /// Run the contract checks (double insertion, template-after-host, ...).
    pub dev_mode: bool,
    pub unsupported_input: UnsupportedInputPolicy,
    /// Route url-bearing style properties through the default sanitizer.
    pub sanitize_styles: bool,
}

impl StylingConfig {
    /// Development defaults: every check on, unsupported input is an error.
    pub fn development() -> Self {
        Self {
            dev_mode: true,
            unsupported_input: UnsupportedInputPolicy::Error,
            sanitize_styles: true,
        }
    }

    /// Production defaults: checks off, unsupported input degrades to an empty map.
    pub fn production() -> Self {
        Self {
            dev_mode: false,
            unsupported_input: UnsupportedInputPolicy::Empty,
            sanitize_styles: true,
        }
    }
}

impl Default for StylingConfig {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::development()
        } else {
            Self::production()
        }
    }
}
