use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use van_styling_harness::{run_scenario, Scenario};

use crate::Overrides;

pub fn run(file: &Path, pretty: bool, overrides: Overrides) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut scenario: Scenario = serde_json::from_str(&source)
        .with_context(|| format!("Invalid scenario in {}", file.display()))?;
    overrides.apply(&mut scenario.config);

    let trace = run_scenario(&scenario).map_err(anyhow::Error::msg)?;
    let out = if pretty {
        serde_json::to_string_pretty(&trace)?
    } else {
        serde_json::to_string(&trace)?
    };
    println!("{out}");
    Ok(())
}
