//! Evaluate command

use anyhow::{Context, Result};
use std::fs;
use std::process::ExitCode;
use ucp_engine::functions::{Claims, RequestScope};
use ucp_engine::{PolicyContext, PolicyEngine};

use super::load_policy;
use crate::output::{print_result, print_single, OutputFormat};

pub fn execute(
    engine: &PolicyEngine,
    policy: &str,
    scope: &str,
    claims: Option<&str>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let policy = load_policy(policy)?;
    let mut context = PolicyContext::new();
    if let Some(path) = claims {
        context.put_data(load_claims(path)?);
    }

    let result = engine.evaluate(&policy, scope, &mut context);

    match format {
        OutputFormat::Text => {
            print_result(&result);
            if let Some(request_scope) = context.data::<RequestScope>() {
                let scopes: Vec<_> = request_scope.scopes().iter().map(String::as_str).collect();
                if !scopes.is_empty() {
                    println!("  request scopes: {}", scopes.join(" "));
                }
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => print_single(&result, format)?,
    }

    Ok(if result.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_claims(path: &str) -> Result<Claims> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read claims file {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse claims file {}", path))
}
