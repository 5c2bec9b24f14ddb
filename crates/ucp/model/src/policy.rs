use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::rule::{Duty, Permission, Prohibition, RuleRef};

/// What a policy is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    #[default]
    Set,
    Offer,
    Contract,
}

/// A usage-control policy.
///
/// Policies are value objects: two policies are equal when their trees and
/// metadata are equal. They are not mutated after construction; scope
/// filtering builds a new policy instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "generate_policy_id")]
    pub id: String,

    #[serde(default, rename = "type")]
    pub policy_type: PolicyType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prohibitions: Vec<Prohibition>,

    /// Top-level duties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Duty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Id of the policy this one refines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensible_properties: BTreeMap<String, Value>,
}

fn generate_policy_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Policy {
    /// Create an empty `Set` policy with a generated id
    pub fn new() -> Self {
        Self {
            id: generate_policy_id(),
            policy_type: PolicyType::Set,
            permissions: Vec::new(),
            prohibitions: Vec::new(),
            obligations: Vec::new(),
            assignee: None,
            assigner: None,
            target: None,
            inherits_from: None,
            extensible_properties: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn with_prohibition(mut self, prohibition: Prohibition) -> Self {
        self.prohibitions.push(prohibition);
        self
    }

    pub fn with_obligation(mut self, duty: Duty) -> Self {
        self.obligations.push(duty);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_assigner(mut self, assigner: impl Into<String>) -> Self {
        self.assigner = Some(assigner.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_inherits_from(mut self, parent: impl Into<String>) -> Self {
        self.inherits_from = Some(parent.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensible_properties.insert(key.into(), value.into());
        self
    }

    /// Copy of this policy's id and metadata carrying the given rules.
    pub fn with_rules(
        &self,
        permissions: Vec<Permission>,
        prohibitions: Vec<Prohibition>,
        obligations: Vec<Duty>,
    ) -> Self {
        Self {
            id: self.id.clone(),
            policy_type: self.policy_type,
            permissions,
            prohibitions,
            obligations,
            assignee: self.assignee.clone(),
            assigner: self.assigner.clone(),
            target: self.target.clone(),
            inherits_from: self.inherits_from.clone(),
            extensible_properties: self.extensible_properties.clone(),
        }
    }

    /// Top-level rules in permission, prohibition, obligation order
    pub fn rules(&self) -> impl Iterator<Item = RuleRef<'_>> {
        self.permissions
            .iter()
            .map(RuleRef::Permission)
            .chain(self.prohibitions.iter().map(RuleRef::Prohibition))
            .chain(self.obligations.iter().map(RuleRef::Duty))
    }

    /// Number of top-level rules
    pub fn rule_count(&self) -> usize {
        self.permissions.len() + self.prohibitions.len() + self.obligations.len()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}
