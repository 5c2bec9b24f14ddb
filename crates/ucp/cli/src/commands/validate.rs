//! Validate command

use anyhow::Result;
use std::process::ExitCode;
use ucp_engine::{EngineError, PolicyEngine};

use super::load_policy;
use crate::output::{print_error, print_success};

pub fn execute(engine: &PolicyEngine, policy: &str) -> Result<ExitCode> {
    let policy = load_policy(policy)?;

    match engine.validate(&policy) {
        Ok(()) => {
            print_success(&format!("policy '{}' is valid", policy.id));
            Ok(ExitCode::SUCCESS)
        }
        Err(EngineError::InvalidPolicy { problems }) => {
            print_error(&format!("policy '{}' is invalid", policy.id));
            for problem in &problems {
                eprintln!("  - {}", problem);
            }
            Ok(ExitCode::FAILURE)
        }
        Err(other) => Err(other.into()),
    }
}
