use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;
use van_styling_harness::{run_scenario, Scenario, ScenarioTrace};

use crate::Overrides;

#[derive(Serialize)]
struct Response {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<ScenarioTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn handle(line: &str, overrides: Overrides) -> Response {
    debug!(bytes = line.len(), "scenario received");
    let outcome = serde_json::from_str::<Scenario>(line)
        .map_err(|e| format!("Invalid scenario JSON: {e}"))
        .and_then(|mut scenario| {
            overrides.apply(&mut scenario.config);
            run_scenario(&scenario)
        });
    match outcome {
        Ok(trace) => Response {
            ok: true,
            trace: Some(trace),
            error: None,
        },
        Err(e) => Response {
            ok: false,
            trace: None,
            error: Some(e),
        },
    }
}

/// JSON Lines loop: one scenario in, one response out. Exits at EOF.
pub fn run(overrides: Overrides) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = serde_json::to_string(&handle(line, overrides))?;
        out.write_all(response.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_ok_and_error() {
        let ok = handle(
            r#"{"nodes": [{}], "passes": [[{"select": 0}, {"style_prop": {"name": "color", "value": "red"}}]]}"#,
            Overrides::default(),
        );
        assert!(ok.ok);
        assert_eq!(ok.trace.unwrap().elements[0].style, "color: red;");

        let err = handle("not json", Overrides::default());
        assert!(!err.ok);
        assert!(err.error.unwrap().starts_with("Invalid scenario JSON"));
    }

    #[test]
    fn test_lenient_override() {
        let line = r#"{"config": {"unsupported_input": "error"}, "nodes": [{}], "passes": [[{"select": 0}, {"style_map": {"value": 5}}]]}"#;
        assert!(!handle(line, Overrides::default()).ok);
        let lenient = Overrides {
            lenient: true,
            ..Overrides::default()
        };
        assert!(handle(line, lenient).ok);
    }
}
