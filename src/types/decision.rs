//! Authorization decisions and their diagnostics.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::token::Position;

/// The outcome of one authorization. Serializes as `"allow"` / `"deny"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

/// A policy that fired: its index in the policy set and its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reason {
    pub policy: usize,
    pub position: Position,
}

/// An evaluation error attributed to one policy: index, source position,
/// and the rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PolicyError {
    pub policy: usize,
    pub position: Position,
    pub message: String,
}

impl Display for PolicyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "while evaluating policy `policy{}`: {}",
            self.policy, self.message
        )
    }
}

/// Why a decision came out the way it did: the policies that fired and the
/// policies that failed to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<Reason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<PolicyError>,
}

/// A decision together with its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Response {
    pub decision: Decision,
    pub diagnostic: Diagnostic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_display_and_json() {
        assert_eq!(Decision::Allow.to_string(), "allow");
        assert_eq!(Decision::Deny.to_string(), "deny");
        assert_eq!(serde_json::to_string(&Decision::Allow).unwrap(), "\"allow\"");
        assert_eq!(
            serde_json::from_str::<Decision>("\"deny\"").unwrap(),
            Decision::Deny
        );
    }

    #[test]
    fn test_policy_error_display() {
        let err = PolicyError {
            policy: 2,
            position: Position::default(),
            message: "attribute `age` does not exist".into(),
        };
        assert_eq!(
            err.to_string(),
            "while evaluating policy `policy2`: attribute `age` does not exist"
        );
    }

    #[test]
    fn test_empty_diagnostic_serializes_compactly() {
        let json = serde_json::to_value(Diagnostic::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_diagnostic_round_trip() {
        let diag = Diagnostic {
            reasons: vec![Reason {
                policy: 0,
                position: Position {
                    offset: 0,
                    line: 1,
                    column: 1,
                },
            }],
            errors: vec![],
        };
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diag);
    }
}
