//! Core of a policy-based authorization engine for the Cedar policy
//! language: a lexer and parser for the textual policy syntax, an evaluator
//! over an entity store, and an authorizer that combines per-policy results
//! under Cedar's "explicit forbid overrides permit" rule.
//!
//! Usage example:
//!
//! Here we permit members of the `admins` group to view documents, and
//! check a request from "alice", who is a member:
//!
//! ```rust
//! use canopy_core::{Decision, Entities, Entity, EntityUID, PolicyEngine, Record, Request};
//!
//! let policies = r#"
//! permit (
//!     principal in Group::"admins",
//!     action == Action::"view",
//!     resource
//! );
//! "#;
//!
//! let engine = PolicyEngine::new_from_str(policies).unwrap();
//!
//! let alice = EntityUID::new("User", "alice");
//! let admins = EntityUID::new("Group", "admins");
//! let entities: Entities = [Entity::new(alice.clone()).with_parent(admins)]
//!     .into_iter()
//!     .collect();
//!
//! let request = Request {
//!     principal: alice,
//!     action: EntityUID::new("Action", "view"),
//!     resource: EntityUID::new("Document", "doc1"),
//!     context: Record::new(),
//! };
//!
//! let response = engine.is_authorized(&entities, &request);
//! assert_eq!(response.decision, Decision::Allow);
//!
//! // The diagnostic names the policy that fired; it serializes to JSON.
//! assert_eq!(response.diagnostic.reasons[0].policy, 0);
//! let json = serde_json::to_string(&response).unwrap();
//! assert!(json.contains("\"allow\""));
//! ```
//!
//! ## Thread-safe sharing
//!
//! A `PolicyEngine` and an `Entities` store are immutable after
//! construction, so both can be shared across threads behind `Arc` with no
//! locking:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! # use canopy_core::{Entities, EntityUID, PolicyEngine, Record, Request};
//! # let engine_base = PolicyEngine::new_from_str("permit ( principal, action, resource );").unwrap();
//!
//! let engine = Arc::new(engine_base);
//! let entities = Arc::new(Entities::new());
//! let engine_clone = Arc::clone(&engine);
//! let entities_clone = Arc::clone(&entities);
//!
//! let handle = thread::spawn(move || {
//!     let request = Request {
//!         principal: EntityUID::new("User", "worker"),
//!         action: EntityUID::new("Action", "read"),
//!         resource: EntityUID::new("Document", "doc1"),
//!         context: Record::new(),
//!     };
//!     let _response = engine_clone.is_authorized(&entities_clone, &request);
//! });
//!
//! handle.join().unwrap();
//! ```

pub use ast::{
    ActionScope, Annotation, Condition, ConditionKind, Effect, EntityScope, Expr, Policy,
    PolicySet,
};
pub use engine::PolicyEngine;
pub use error::{EvalError, ParseError};
pub use eval::Evaluator;
pub use token::Position;
pub use types::{
    Decimal, Decision, Diagnostic, Entities, Entity, EntityUID, IPAddr, Pattern, PolicyError,
    Reason, Record, Request, Response, Set, Value,
};

mod ast;
mod display;
mod engine;
mod error;
mod eval;
mod parser;
mod token;
pub mod types;
