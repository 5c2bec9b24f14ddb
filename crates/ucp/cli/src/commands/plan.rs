//! Plan command

use anyhow::Result;
use std::process::ExitCode;
use ucp_engine::PolicyEngine;

use super::load_policy;
use crate::output::{print_plan, print_single, OutputFormat};

pub fn execute(
    engine: &PolicyEngine,
    policy: &str,
    scope: &str,
    format: OutputFormat,
) -> Result<ExitCode> {
    let policy = load_policy(policy)?;
    let plan = engine.plan(&policy, scope);

    match format {
        OutputFormat::Text => print_plan(&plan),
        OutputFormat::Json | OutputFormat::Yaml => print_single(&plan, format)?,
    }
    Ok(ExitCode::SUCCESS)
}
