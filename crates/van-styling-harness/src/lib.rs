//! JSON scenarios for the Van styling engine.
//!
//! A scenario describes a template (nodes, static attributes, directives) and a
//! list of update passes. Running it drives [`van_styling`] against an in-memory
//! document and returns a serializable trace of renderer calls and final element
//! state.

mod runner;
mod scenario;

pub use runner::{run_scenario, ElementSnapshot, ForwardedInput, ScenarioTrace};
pub use scenario::{from_input, to_input, Instruction, NodeSpec, RendererKind, Scenario};

/// Parse a scenario, run it and serialize the trace.
pub fn run_scenario_json(scenario_json: &str) -> Result<String, String> {
    let scenario: Scenario =
        serde_json::from_str(scenario_json).map_err(|e| format!("Invalid scenario JSON: {e}"))?;
    let trace = run_scenario(&scenario)?;
    serde_json::to_string(&trace).map_err(|e| format!("Failed to serialize trace: {e}"))
}

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn run_styling_scenario(scenario_json: &str) -> Result<String, JsValue> {
    run_scenario_json(scenario_json).map_err(|e| JsValue::from_str(&e))
}
