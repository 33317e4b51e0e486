use tracing::{debug, info};

use crate::ast::{Effect, Expr, PolicySet};
use crate::error::ParseError;
use crate::eval::{compile_policy, Evaluator};
use crate::types::{Decision, Diagnostic, Entities, PolicyError, Reason, Request, Response};

/// The authorization engine: a compiled, immutable policy set.
///
/// Construction compiles each policy's scope and conditions into a single
/// condition expression; after that the engine only hands out `&self`, so
/// one engine (plus one entity store) can serve any number of threads
/// without locks.
pub struct PolicyEngine {
    policies: PolicySet,
    compiled: Vec<Expr>,
}

impl PolicyEngine {
    pub fn new(policies: PolicySet) -> Self {
        let compiled = policies.iter().map(compile_policy).collect();
        PolicyEngine { policies, compiled }
    }

    pub fn new_from_str(policy_text: &str) -> Result<Self, ParseError> {
        Ok(PolicyEngine::new(PolicySet::parse(policy_text)?))
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Decide one request against the full policy set.
    ///
    /// Every policy runs; there is no short-circuit even after a forbid
    /// fires, so the diagnostic carries the complete reason and error
    /// lists. A policy that fails to evaluate contributes an error entry
    /// and nothing else.
    pub fn is_authorized(&self, entities: &Entities, request: &Request) -> Response {
        debug!(
            event = "Authorize",
            phase = "Request",
            principal = %request.principal,
            action = %request.action,
            resource = %request.resource,
        );

        let evaluator = Evaluator::new(entities, request);
        let mut errors = Vec::new();
        let mut permit_reasons = Vec::new();
        let mut forbid_reasons = Vec::new();

        for (n, (policy, condition)) in self.policies.iter().zip(&self.compiled).enumerate() {
            let fired = match evaluator.eval(condition) {
                Ok(value) => match value.as_bool() {
                    Ok(b) => b,
                    Err(err) => {
                        errors.push(PolicyError {
                            policy: n,
                            position: policy.position,
                            message: err.to_string(),
                        });
                        continue;
                    }
                },
                Err(err) => {
                    errors.push(PolicyError {
                        policy: n,
                        position: policy.position,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            if !fired {
                continue;
            }
            info!(
                event = "Authorize",
                phase = "Policy",
                policy = n,
                effect = %policy.effect,
            );
            let reason = Reason {
                policy: n,
                position: policy.position,
            };
            match policy.effect {
                Effect::Permit => permit_reasons.push(reason),
                Effect::Forbid => forbid_reasons.push(reason),
            }
        }

        let got_permit = !permit_reasons.is_empty();
        let got_forbid = !forbid_reasons.is_empty();
        let decision = if got_permit && !got_forbid {
            Decision::Allow
        } else {
            Decision::Deny
        };
        let reasons = if got_forbid {
            forbid_reasons
        } else {
            permit_reasons
        };

        debug!(event = "Authorize", phase = "Result", decision = %decision);

        Response {
            decision,
            diagnostic: Diagnostic { reasons, errors },
        }
    }
}
