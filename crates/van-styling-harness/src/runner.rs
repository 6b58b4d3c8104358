use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use van_styling::{
    element_create, DirectAdapter, DomDocument, ElementId, LView, ProceduralAdapter,
    RecordingRenderer, RendererCall, StylingRenderer, TNodeType, TView, TViewBuilder, UpdatePass,
};

use crate::scenario::{from_input, Instruction, RendererKind, Scenario};

/// Everything observable about a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioTrace {
    /// Renderer calls made while writing static styling at creation.
    pub creation: Vec<RendererCall>,
    /// Renderer calls made by each update pass.
    pub passes: Vec<Vec<RendererCall>>,
    /// Final state of every element node.
    pub elements: Vec<ElementSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shadowed_inputs: Vec<ForwardedInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSnapshot {
    pub node: usize,
    pub tag: String,
    pub class: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardedInput {
    pub node: usize,
    pub input: &'static str,
    pub value: Value,
}

/// Binding slots the passes need: `(template, per directive)`.
fn count_vars(scenario: &Scenario, directives: usize) -> (usize, Vec<usize>) {
    let mut template = 0;
    let mut host = vec![0; directives];
    for pass in &scenario.passes {
        // A host block restarts at its root each time it is entered.
        let mut current: Option<(usize, usize)> = None;
        let mut in_template = 0;
        for instruction in pass {
            match instruction {
                Instruction::HostBindings(directive) => current = Some((*directive, 0)),
                Instruction::Select(_) => current = None,
                i if i.is_binding() => match current.as_mut() {
                    None => in_template += 1,
                    Some((d, run)) => {
                        *run += 1;
                        if let Some(max) = host.get_mut(*d) {
                            *max = (*max).max(*run);
                        }
                    }
                },
                _ => {}
            }
        }
        template = template.max(in_template);
    }
    (template * 2, host.into_iter().map(|count| count * 2).collect())
}

fn build_tview(scenario: &Scenario) -> TView {
    let directive_count = scenario.nodes.iter().map(|n| n.directives.len()).sum();
    let (template_vars, host_vars) = count_vars(scenario, directive_count);

    let mut builder = TViewBuilder::new();
    let mut directive = 0;
    for spec in &scenario.nodes {
        let mut directives = Vec::with_capacity(spec.directives.len());
        for def in &spec.directives {
            let mut def = def.clone();
            if def.host_vars == 0 {
                def.host_vars = host_vars[directive];
            }
            directives.push(def);
            directive += 1;
        }
        let node = builder.node(spec.kind, &spec.tag, spec.static_attrs(), directives);
        if spec.class_input {
            builder.shadow_input(node, true);
        }
        if spec.style_input {
            builder.shadow_input(node, false);
        }
    }
    builder.template_vars(scenario.template_vars.unwrap_or(template_vars));
    builder.build()
}

/// Run `f` against the configured adapter over `doc`, returning the calls it made.
fn record<F>(doc: &mut DomDocument, kind: RendererKind, f: F) -> van_styling::Result<Vec<RendererCall>>
where
    F: FnOnce(&mut dyn StylingRenderer) -> van_styling::Result<()>,
{
    let mut direct;
    let mut procedural;
    let inner: &mut dyn StylingRenderer = match kind {
        RendererKind::Direct => {
            direct = DirectAdapter::new(doc);
            &mut direct
        }
        RendererKind::Procedural => {
            procedural = ProceduralAdapter(doc);
            &mut procedural
        }
    };
    let mut recorder = RecordingRenderer::new(inner);
    f(&mut recorder)?;
    Ok(recorder.take_calls())
}

fn execute(pass: &mut UpdatePass<'_>, instruction: &Instruction) -> van_styling::Result<()> {
    match instruction {
        Instruction::Select(node) => pass.select(*node),
        Instruction::HostBindings(directive) => pass.enter_host_bindings(*directive),
        Instruction::StyleProp { name, .. } => {
            let suffix = instruction.suffix();
            pass.style_prop(name, instruction.input(), suffix.as_ref())
        }
        Instruction::ClassProp { name, .. } => pass.class_prop(name, instruction.input()),
        Instruction::StyleMap { .. } => pass.style_map(instruction.input()),
        Instruction::ClassMap { .. } => pass.class_map(instruction.input()),
    }
}

/// Build the template, create one element per node and run every pass.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioTrace, String> {
    debug!(
        nodes = scenario.nodes.len(),
        passes = scenario.passes.len(),
        "running styling scenario"
    );
    let mut tview = build_tview(scenario);
    let mut lview = LView::new(&tview);
    let mut doc = DomDocument::new();

    let natives: Vec<ElementId> = tview
        .nodes
        .iter()
        .map(|node| match node.kind {
            TNodeType::Element => doc.create_element(&node.tag),
            TNodeType::ElementContainer | TNodeType::Container => doc.create_element("#comment"),
        })
        .collect();

    let creation = record(&mut doc, scenario.renderer, |renderer| {
        for (node, element) in natives.iter().enumerate() {
            element_create(&tview, &mut lview, renderer, node, *element)?;
        }
        Ok(())
    })
    .map_err(|e| format!("Element creation failed: {e}"))?;

    let mut passes = Vec::with_capacity(scenario.passes.len());
    for (n, instructions) in scenario.passes.iter().enumerate() {
        let calls = record(&mut doc, scenario.renderer, |renderer| {
            let mut pass = UpdatePass::new(&mut tview, &mut lview, renderer, &scenario.config);
            for instruction in instructions {
                execute(&mut pass, instruction)?;
            }
            pass.finish();
            Ok(())
        })
        .map_err(|e| format!("Update pass {n} failed: {e}"))?;
        passes.push(calls);
    }

    let elements = tview
        .nodes
        .iter()
        .filter(|node| node.kind == TNodeType::Element)
        .filter_map(|node| {
            let element = doc.element(natives[node.index])?;
            Some(ElementSnapshot {
                node: node.index,
                tag: element.tag.clone(),
                class: element.class_name(),
                style: element.style_text(),
            })
        })
        .collect();

    let shadowed_inputs = lview
        .shadowed_inputs
        .iter()
        .map(|s| ForwardedInput {
            node: s.node,
            input: s.input,
            value: from_input(&s.value),
        })
        .collect();

    Ok(ScenarioTrace {
        creation,
        passes,
        elements,
        shadowed_inputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> ScenarioTrace {
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        run_scenario(&scenario).unwrap()
    }

    #[test]
    fn test_static_and_map_binding() {
        let trace = run(r#"{
            "nodes": [{"style": "height: 10px"}],
            "passes": [[
                {"select": 0},
                {"style_map": {"value": {"background-color": "red"}}}
            ]]
        }"#);
        assert_eq!(trace.elements[0].style, "background-color: red; height: 10px;");
        assert_eq!(trace.creation.len(), 1);
        assert_eq!(trace.passes[0].len(), 1);
    }

    #[test]
    fn test_host_vars_are_counted() {
        let trace = run(r#"{
            "nodes": [{"directives": [{"name": "a"}, {"name": "b"}]}],
            "passes": [[
                {"host_bindings": 0},
                {"style_prop": {"name": "color", "value": "red"}},
                {"host_bindings": 1},
                {"style_prop": {"name": "color", "value": "blue"}}
            ]]
        }"#);
        assert_eq!(trace.elements[0].style, "color: blue;");
    }

    #[test]
    fn test_select_returns_to_template_slots() {
        let trace = run(r#"{
            "nodes": [{"directives": [{"name": "a"}]}, {"tag": "span"}],
            "passes": [[
                {"host_bindings": 0},
                {"style_prop": {"name": "color", "value": "red"}},
                {"select": 1},
                {"style_prop": {"name": "color", "value": "blue"}}
            ]]
        }"#);
        assert_eq!(trace.elements[0].style, "color: red;");
        assert_eq!(trace.elements[1].style, "color: blue;");
    }

    #[test]
    fn test_procedural_renderer_matches_direct() {
        let passes = r#"[[
            {"select": 0},
            {"style_prop": {"name": "fontSize", "value": 12, "unit": "px"}},
            {"class_map": {"value": "a b"}}
        ]]"#;
        let direct = run(&format!(r#"{{"nodes": [{{}}], "passes": {passes}}}"#));
        let procedural = run(&format!(r#"{{"renderer": "procedural", "nodes": [{{}}], "passes": {passes}}}"#));
        assert_eq!(direct.elements, procedural.elements);
        assert_eq!(direct.elements[0].style, "font-size: 12px;");
        assert_eq!(direct.elements[0].class, "a b");
    }

    #[test]
    fn test_shadowed_input_is_reported() {
        let trace = run(r#"{
            "nodes": [{"class": "own", "class_input": true}],
            "passes": [[{"select": 0}, {"class_map": {"value": "dyn"}}]]
        }"#);
        assert!(trace.passes[0].is_empty());
        assert_eq!(
            trace.shadowed_inputs,
            vec![ForwardedInput {
                node: 0,
                input: "class",
                value: Value::String("own dyn".into()),
            }]
        );
    }

    #[test]
    fn test_errors_name_the_pass() {
        let scenario: Scenario = serde_json::from_str(
            r#"{"nodes": [{}], "passes": [[], [{"select": 3}]]}"#,
        )
        .unwrap();
        let err = run_scenario(&scenario).unwrap_err();
        assert!(err.starts_with("Update pass 1 failed"), "{err}");
    }

    #[test]
    fn test_containers_have_no_snapshot() {
        let trace = run(r#"{
            "nodes": [{"kind": "element_container"}, {"tag": "span"}],
            "passes": [[
                {"select": 0},
                {"style_prop": {"name": "color", "value": "red"}},
                {"select": 1},
                {"style_prop": {"name": "color", "value": "red"}}
            ]]
        }"#);
        assert_eq!(trace.elements.len(), 1);
        assert_eq!(trace.elements[0].tag, "span");
        assert_eq!(trace.passes[0].len(), 1);
    }
}
