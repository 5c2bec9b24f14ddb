use serde::{Deserialize, Serialize};

/// The operation a rule is about, e.g. `use` or `transfer`.
///
/// The action type doubles as the rule's binding key: a rule whose action
/// type is not bound to the evaluation scope is dropped from that scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Action type
    #[serde(rename = "type")]
    pub action_type: String,

    /// Broader action this one is a specialisation of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_in: Option<String>,
}

impl Action {
    /// Create an action of the given type
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            included_in: None,
        }
    }

    /// Set the broader action
    pub fn with_included_in(mut self, included_in: impl Into<String>) -> Self {
        self.included_in = Some(included_in.into());
        self
    }
}
