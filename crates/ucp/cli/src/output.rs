//! Output formatting utilities

use anyhow::Result;
use colored::*;
use serde::Serialize;
use ucp_engine::{ConstraintStep, PolicyEvaluationPlan, PolicyEvaluationResult, RuleStep};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a serializable value as JSON or YAML; text falls back to JSON
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(data)?);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn print_result(result: &PolicyEvaluationResult) {
    if result.succeeded {
        print_success(&format!(
            "policy '{}' satisfied in scope '{}'",
            result.policy_id, result.scope
        ));
    } else {
        print_error(&format!(
            "policy '{}' not satisfied in scope '{}'",
            result.policy_id, result.scope
        ));
        for problem in &result.problems {
            eprintln!("  - {}", problem);
        }
    }
}

pub fn print_plan(plan: &PolicyEvaluationPlan) {
    println!(
        "Plan for policy '{}' in scope '{}'",
        plan.policy_id.bold(),
        plan.scope.bold()
    );
    print_validators("pre-validators", plan.pre_validators.iter().map(|v| v.name.as_str()));
    for step in plan.rule_steps() {
        print_rule(step, 1);
    }
    print_validators("post-validators", plan.post_validators.iter().map(|v| v.name.as_str()));
}

fn print_validators<'a>(label: &str, names: impl Iterator<Item = &'a str>) {
    let names: Vec<_> = names.collect();
    if !names.is_empty() {
        println!("  {}: {}", label, names.join(", "));
    }
}

fn print_rule(step: &RuleStep, depth: usize) {
    let indent = "  ".repeat(depth);
    let action = step.action.as_deref().unwrap_or("<no action>");
    println!("{}{} {} {}", indent, marker(step.filtered), step.kind, action);
    for reason in &step.filtering_reasons {
        println!("{}    {}", indent, reason.dimmed());
    }
    for function in &step.rule_functions {
        println!("{}    rule function {}", indent, function.name);
    }
    for constraint in &step.constraint_steps {
        print_constraint(constraint, depth + 2);
    }
    for duty in &step.duty_steps {
        print_rule(duty, depth + 2);
    }
}

fn print_constraint(step: &ConstraintStep, depth: usize) {
    let indent = "  ".repeat(depth);
    match step {
        ConstraintStep::Atomic(atomic) => {
            let function = atomic.function_name.as_deref().unwrap_or("-");
            println!(
                "{}{} {} {} {} [{}]",
                indent,
                marker(atomic.filtered),
                atomic.left_operand,
                atomic.operator,
                atomic.right_operand,
                function
            );
            for reason in &atomic.filtering_reasons {
                println!("{}    {}", indent, reason.dimmed());
            }
        }
        ConstraintStep::And(children)
        | ConstraintStep::Or(children)
        | ConstraintStep::Xone(children) => {
            let label = match step {
                ConstraintStep::And(_) => "and",
                ConstraintStep::Or(_) => "or",
                _ => "xone",
            };
            println!("{}{}", indent, label);
            for child in &children.constraint_steps {
                print_constraint(child, depth + 1);
            }
        }
    }
}

fn marker(filtered: bool) -> ColoredString {
    if filtered {
        "✗".red()
    } else {
        "✓".green()
    }
}
