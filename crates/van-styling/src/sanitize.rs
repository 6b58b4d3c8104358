//! Default sanitizer for url-bearing style properties.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Plain values: keywords, lengths, colors, quoted strings.
const VALUES: &str = r#"[-,."'%_!# a-zA-Z0-9]+"#;
const TRANSFORMATION_FNS: &str = "(?:matrix|translate|scale|rotate|skew|perspective)(?:X|Y|Z|3d)?";
const COLOR_FNS: &str = "(?:rgb|hsl)a?";
const GRADIENTS: &str = "(?:repeating-)?(?:linear|radial)-gradient";
const CSS3_FNS: &str = "(?:attr|calc|var)";
const FN_ARGS: &str = r"\([-0-9.%, #a-zA-Z]+\)";

static SAFE_STYLE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "^({VALUES}|(?:{TRANSFORMATION_FNS}|{COLOR_FNS}|{GRADIENTS}|{CSS3_FNS}){FN_ARGS})$"
    ))
    .unwrap()
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^url\(([^)]+)\)$").unwrap());

static SAFE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:https?|mailto|ftp|tel|file|sms):|[^&:/?#]*(?:[/?#]|$))").unwrap()
});

static DATA_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^data:(?:image/(?:bmp|gif|jpeg|jpg|png|tiff|webp)|video/(?:mpeg|mp4|ogg|webm)|audio/(?:mp3|oga|ogg|opus));base64,[a-z0-9+/]+=*$",
    )
    .unwrap()
});

/// Placeholder written instead of a rejected style value.
pub const UNSAFE_STYLE: &str = "unsafe";

/// Properties whose values can carry a URL and must be sanitized.
/// `width`, `color` and friends are left alone.
pub fn style_prop_needs_sanitization(prop: &str) -> bool {
    matches!(
        prop,
        "background-image"
            | "backgroundImage"
            | "background"
            | "border-image"
            | "borderImage"
            | "border-image-source"
            | "borderImageSource"
            | "filter"
            | "list-style"
            | "listStyle"
            | "list-style-image"
            | "listStyleImage"
            | "clip-path"
            | "clipPath"
    )
}

/// Keep `value` when it is a plain value, a whitelisted CSS function call, or a
/// `url(...)` pointing at a safe URL. Anything else becomes [`UNSAFE_STYLE`].
pub fn sanitize_style(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    let safe = match URL_RE.captures(value) {
        Some(caps) => is_safe_url(&caps[1]),
        None => SAFE_STYLE_VALUE.is_match(value) && has_balanced_quotes(value),
    };
    if safe {
        return value.to_string();
    }
    warn!(value, "sanitizing unsafe style value");
    UNSAFE_STYLE.to_string()
}

/// Prefix URLs with an unsafe scheme (or malformed data URLs) with `unsafe:`.
pub fn sanitize_url(url: &str) -> String {
    if is_safe_url(url) {
        return url.to_string();
    }
    warn!(url, "sanitizing unsafe URL value");
    format!("unsafe:{url}")
}

fn is_safe_url(url: &str) -> bool {
    SAFE_URL_PATTERN.is_match(url) || DATA_URL_PATTERN.is_match(url)
}

/// Quotes inside a value must pair up; an open quote could escape the declaration.
fn has_balanced_quotes(value: &str) -> bool {
    let mut outside_single = true;
    let mut outside_double = true;
    for c in value.chars() {
        if c == '\'' && outside_double {
            outside_single = !outside_single;
        } else if c == '"' && outside_single {
            outside_double = !outside_double;
        }
    }
    outside_single && outside_double
}
