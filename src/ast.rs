//! Typed abstract syntax for Cedar policies.

use std::ops::Deref;

use crate::error::ParseError;
use crate::parser;
use crate::token::Position;
use crate::types::{EntityUID, Pattern, Value};

/// What a policy contributes when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Effect {
    Permit,
    Forbid,
}

/// An `@key("value")` line. Order is preserved and duplicates are kept so
/// the canonical form round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub key: String,
    pub value: String,
}

/// Scope template for `principal` and `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntityScope {
    #[default]
    All,
    Eq(EntityUID),
    In(EntityUID),
    Is(String),
    IsIn(String, EntityUID),
}

/// Scope template for `action`, which additionally allows a UID list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionScope {
    #[default]
    All,
    Eq(EntityUID),
    In(EntityUID),
    InSet(Vec<EntityUID>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConditionKind {
    When,
    Unless,
}

/// A `when { … }` or `unless { … }` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ConditionKind,
    pub body: Expr,
}

/// One parsed policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub effect: Effect,
    pub annotations: Vec<Annotation>,
    pub principal: EntityScope,
    pub action: ActionScope,
    pub resource: EntityScope,
    pub conditions: Vec<Condition>,
    /// Position of the policy's first token, annotations included.
    pub position: Position,
}

impl Policy {
    pub(crate) fn new(effect: Effect) -> Self {
        Policy {
            effect,
            annotations: Vec::new(),
            principal: EntityScope::All,
            action: ActionScope::All,
            resource: EntityScope::All,
            conditions: Vec::new(),
            position: Position::default(),
        }
    }
}

/// A condition expression. One variant per operator so evaluation is a
/// single exhaustive match.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // literals
    Lit(Value),
    SetLit(Vec<Expr>),
    /// Entries in source order; the parser rejects duplicate keys.
    RecordLit(Vec<(String, Expr)>),

    // request variables
    Principal,
    Action,
    Resource,
    Context,

    // unary
    Not(Box<Expr>),
    Negate(Box<Expr>),

    // arithmetic
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),

    // relational
    Less(Box<Expr>, Box<Expr>),
    LessEq(Box<Expr>, Box<Expr>),
    Greater(Box<Expr>, Box<Expr>),
    GreaterEq(Box<Expr>, Box<Expr>),
    Equals(Box<Expr>, Box<Expr>),
    NotEquals(Box<Expr>, Box<Expr>),

    // logical (short-circuiting)
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),

    // hierarchy and type tests
    In(Box<Expr>, Box<Expr>),
    Has(Box<Expr>, String),
    Like(Box<Expr>, Pattern),
    Is(Box<Expr>, String),
    IsIn(Box<Expr>, String, Box<Expr>),

    // attribute and set membership
    Access(Box<Expr>, String),
    Contains(Box<Expr>, Box<Expr>),
    ContainsAll(Box<Expr>, Box<Expr>),
    ContainsAny(Box<Expr>, Box<Expr>),

    // calls
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    ExtensionCall(String, Vec<Expr>),
    ExtensionMethod(Box<Expr>, String, Vec<Expr>),
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Lit(value.into())
    }
}

/// An ordered set of policies. Index positions are stable and referenced by
/// authorization diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicySet(pub Vec<Policy>);

impl PolicySet {
    /// Parse a policy document. Fail-fast: the first error aborts.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parser::parse_policy_set(text)
    }
}

impl Deref for PolicySet {
    type Target = [Policy];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for PolicySet {
    type Item = Policy;
    type IntoIter = std::vec::IntoIter<Policy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PolicySet {
    type Item = &'a Policy;
    type IntoIter = std::slice::Iter<'a, Policy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
