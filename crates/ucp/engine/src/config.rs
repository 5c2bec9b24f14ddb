//! Configuration for the policy engine

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use ucp_model::RuleKind;

use crate::bindings::RuleBindingRegistry;
use crate::engine::PolicyEngineBuilder;
use crate::error::Result;
use crate::functions::{ActionScopeExtractor, ClaimConstraintFunction, DefaultScopeInjector};
use crate::scope::ALL_SCOPES;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Scope used when a caller does not name one
    #[serde(default = "default_scope")]
    pub default_scope: String,

    /// Static rule bindings
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,

    /// Claim functions to register
    #[serde(default)]
    pub claim_functions: Vec<ClaimFunctionConfig>,

    /// Request scope extraction
    #[serde(default)]
    pub request_scope: RequestScopeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_scope: default_scope(),
            bindings: Vec::new(),
            claim_functions: Vec::new(),
            request_scope: RequestScopeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// A key and the scopes it is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub key: String,
    pub scopes: Vec<String>,
}

/// Registration of a [`ClaimConstraintFunction`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimFunctionConfig {
    #[serde(default = "default_claim_function_name")]
    pub name: String,

    /// Scope the function is registered at
    #[serde(default = "default_all_scopes")]
    pub scope: String,

    /// Rule kinds the function evaluates constraints for
    #[serde(default = "default_rule_kinds")]
    pub rule_kinds: Vec<RuleKind>,

    /// Claim names handled by the function
    pub keys: Vec<String>,
}

/// Request scope extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestScopeConfig {
    /// Scope the extractors are registered at
    #[serde(default = "default_all_scopes")]
    pub scope: String,

    /// Scopes added to every request
    #[serde(default)]
    pub default_scopes: Vec<String>,

    /// Action prefix marking a request scope, e.g. `scope:`
    #[serde(default)]
    pub action_prefix: Option<String>,
}

impl Default for RequestScopeConfig {
    fn default() -> Self {
        Self {
            scope: default_all_scopes(),
            default_scopes: Vec::new(),
            action_prefix: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_scope() -> String {
    "default".to_string()
}

fn default_all_scopes() -> String {
    ALL_SCOPES.to_string()
}

fn default_claim_function_name() -> String {
    "claims".to_string()
}

fn default_rule_kinds() -> Vec<RuleKind> {
    RuleKind::ALL.to_vec()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from defaults, a file and `UCP__*` environment
    /// variables, in increasing priority. A named file must exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("UCP")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Build the rule binding registry described by `bindings`
    pub fn rule_bindings(&self) -> RuleBindingRegistry {
        let registry = RuleBindingRegistry::new();
        for binding in &self.bindings {
            for scope in &binding.scopes {
                registry.bind(binding.key.clone(), scope.clone());
            }
        }
        info!(keys = self.bindings.len(), "Rule bindings configured");
        registry
    }

    /// Register the configured built-in functions on `builder`
    pub fn configure(&self, mut builder: PolicyEngineBuilder) -> PolicyEngineBuilder {
        for claims in &self.claim_functions {
            let function = ClaimConstraintFunction::new(claims.name.clone(), claims.keys.clone());
            for kind in &claims.rule_kinds {
                builder = builder.register_dynamic_function(
                    claims.scope.clone(),
                    *kind,
                    function.clone(),
                );
            }
        }

        let request_scope = &self.request_scope;
        if !request_scope.default_scopes.is_empty() {
            builder = builder.register_pre_validator(
                request_scope.scope.clone(),
                DefaultScopeInjector::new(request_scope.default_scopes.clone()),
            );
        }
        if let Some(prefix) = &request_scope.action_prefix {
            for kind in RuleKind::ALL {
                builder = builder.register_rule_function(
                    request_scope.scope.clone(),
                    kind,
                    ActionScopeExtractor::new(prefix.clone()),
                );
            }
        }
        builder
    }

    /// Engine builder with the configured bindings and functions
    pub fn engine_builder(&self) -> PolicyEngineBuilder {
        self.configure(
            PolicyEngineBuilder::new().with_rule_bindings(Arc::new(self.rule_bindings())),
        )
    }
}
