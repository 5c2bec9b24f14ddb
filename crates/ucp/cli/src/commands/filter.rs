//! Filter command

use anyhow::Result;
use std::process::ExitCode;
use tracing::debug;
use ucp_engine::PolicyEngine;

use super::load_policy;
use crate::output::{print_single, OutputFormat};

pub fn execute(engine: &PolicyEngine, policy: &str, scope: &str) -> Result<ExitCode> {
    let policy = load_policy(policy)?;
    let filtered = engine.filter().apply_scope(&policy, scope);
    debug!(
        before = policy.rule_count(),
        after = filtered.rule_count(),
        scope,
        "Policy filtered"
    );

    print_single(&filtered, OutputFormat::Json)?;
    Ok(ExitCode::SUCCESS)
}
