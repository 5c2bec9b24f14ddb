//! CLI command implementations

use anyhow::{Context, Result};
use std::fs;
use ucp_model::Policy;

pub mod evaluate;
pub mod filter;
pub mod plan;
pub mod validate;

/// Read a policy from a JSON file
pub fn load_policy(path: &str) -> Result<Policy> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse policy file {}", path))
}
