use serde::{Deserialize, Deserializer};
use serde_json::Value;
use van_styling::{DirectiveDef, StyleSuffix, StylingConfig, StylingInput, TAttributes, TNodeType};

/// A self-contained styling run: a template of nodes plus the update passes
/// executed against one instance of it.
///
/// ```json
/// {
///   "config": { "dev_mode": true },
///   "nodes": [{ "tag": "div", "style": "height: 10px", "directives": [{ "name": "dir" }] }],
///   "passes": [[
///     { "select": 0 },
///     { "style_map": { "value": { "background-color": "red" } } }
///   ]]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: StylingConfig,
    #[serde(default)]
    pub renderer: RendererKind,
    pub nodes: Vec<NodeSpec>,
    /// Template binding slots. Counted from the passes when omitted.
    #[serde(default)]
    pub template_vars: Option<usize>,
    #[serde(default)]
    pub passes: Vec<Vec<Instruction>>,
}

/// How styling reaches the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    #[default]
    Direct,
    Procedural,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default = "default_kind")]
    pub kind: TNodeType,
    /// Static `class="..."` text.
    #[serde(default)]
    pub class: Option<String>,
    /// Static `style="..."` text.
    #[serde(default)]
    pub style: Option<String>,
    /// Raw attribute array; takes precedence over `class`/`style`.
    #[serde(default)]
    pub attrs: Option<TAttributes>,
    #[serde(default)]
    pub directives: Vec<DirectiveDef>,
    #[serde(default)]
    pub class_input: bool,
    #[serde(default)]
    pub style_input: bool,
}

fn default_tag() -> String {
    "div".to_string()
}

fn default_kind() -> TNodeType {
    TNodeType::Element
}

impl NodeSpec {
    pub fn static_attrs(&self) -> Option<TAttributes> {
        if self.attrs.is_some() {
            return self.attrs.clone();
        }
        if self.class.is_none() && self.style.is_none() {
            return None;
        }
        Some(TAttributes::from_static(self.class.as_deref(), self.style.as_deref()))
    }
}

/// One instruction of an update pass. A missing `value` is `undefined`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Select(usize),
    HostBindings(usize),
    StyleProp {
        name: String,
        #[serde(default, deserialize_with = "present")]
        value: Option<Value>,
        #[serde(default)]
        unit: Option<String>,
    },
    ClassProp {
        name: String,
        #[serde(default, deserialize_with = "present")]
        value: Option<Value>,
    },
    StyleMap {
        #[serde(default, deserialize_with = "present")]
        value: Option<Value>,
    },
    ClassMap {
        #[serde(default, deserialize_with = "present")]
        value: Option<Value>,
    },
}

impl Instruction {
    pub fn is_binding(&self) -> bool {
        !matches!(self, Instruction::Select(_) | Instruction::HostBindings(_))
    }

    pub fn suffix(&self) -> Option<StyleSuffix> {
        match self {
            Instruction::StyleProp { unit: Some(unit), .. } => Some(StyleSuffix::unit(unit.as_str())),
            _ => None,
        }
    }

    pub fn input(&self) -> StylingInput {
        match self {
            Instruction::StyleProp { value, .. }
            | Instruction::ClassProp { value, .. }
            | Instruction::StyleMap { value }
            | Instruction::ClassMap { value } => value.as_ref().map_or(StylingInput::Undefined, to_input),
            Instruction::Select(_) | Instruction::HostBindings(_) => StylingInput::Undefined,
        }
    }
}

/// Keeps an explicit `null` apart from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON to styling input. `{"$trusted": "..."}` is a trusted style and
/// `{"$undefined": true}` stands for `undefined` inside maps.
pub fn to_input(value: &Value) -> StylingInput {
    match value {
        Value::Null => StylingInput::Null,
        Value::Bool(b) => StylingInput::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(StylingInput::Null, StylingInput::Number),
        Value::String(s) => StylingInput::Str(s.clone()),
        Value::Array(items) => StylingInput::list(items.iter().map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
        Value::Object(entries) => {
            if let Some(Value::String(trusted)) = entries.get("$trusted") {
                return StylingInput::trusted(trusted.as_str());
            }
            if entries.contains_key("$undefined") {
                return StylingInput::Undefined;
            }
            StylingInput::map(entries.iter().map(|(k, v)| (k.as_str(), to_input(v))))
        }
    }
}

/// Styling input back to JSON, for traces.
pub fn from_input(input: &StylingInput) -> Value {
    match input {
        StylingInput::Undefined => serde_json::json!({ "$undefined": true }),
        StylingInput::Null => Value::Null,
        StylingInput::Bool(b) => Value::Bool(*b),
        StylingInput::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        StylingInput::Str(s) => Value::String(s.clone()),
        StylingInput::Trusted(t) => serde_json::json!({ "$trusted": t.as_str() }),
        StylingInput::List(names) => Value::Array(names.iter().cloned().map(Value::String).collect()),
        StylingInput::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), from_input(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_is_undefined_and_null_is_null() {
        let passes: Vec<Instruction> = serde_json::from_str(
            r#"[
                {"style_prop": {"name": "width"}},
                {"style_prop": {"name": "width", "value": null, "unit": "px"}},
                {"class_map": {"value": ["a", "b"]}}
            ]"#,
        )
        .unwrap();
        assert_eq!(passes[0].input(), StylingInput::Undefined);
        assert_eq!(passes[1].input(), StylingInput::Null);
        assert!(passes[1].suffix().is_some());
        assert_eq!(passes[2].input(), StylingInput::list(["a", "b"]));
        assert!(passes.iter().all(Instruction::is_binding));
    }

    #[test]
    fn test_special_objects() {
        let value = serde_json::json!({"color": {"$undefined": true}, "background": {"$trusted": "url(x)"}});
        assert_eq!(
            to_input(&value),
            StylingInput::map([
                ("background", StylingInput::trusted("url(x)")),
                ("color", StylingInput::Undefined),
            ])
        );
    }

    #[test]
    fn test_node_defaults() {
        let node: NodeSpec = serde_json::from_str(r#"{"class": "a b"}"#).unwrap();
        assert_eq!(node.tag, "div");
        assert_eq!(node.kind, TNodeType::Element);
        assert_eq!(node.static_attrs(), Some(TAttributes::from_static(Some("a b"), None)));

        let bare: NodeSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.static_attrs(), None);
    }

    #[test]
    fn test_from_input() {
        let input = StylingInput::map([("a", StylingInput::Number(1.0)), ("b", StylingInput::Null)]);
        assert_eq!(from_input(&input), serde_json::json!({"a": 1.0, "b": null}));
    }
}
