//! Canonical Cedar text for the AST.
//!
//! The layout here is the round-trip inverse of the parser: lowercase
//! keywords, one space around binary operators, a single-line scope when all
//! three clauses are unconstrained, one clause per line otherwise, and each
//! `when`/`unless` on its own line. Parentheses are emitted exactly where
//! precedence requires them, so canonical text survives a parse/serialize
//! cycle unchanged.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;

use crate::ast::{ActionScope, Annotation, EntityScope, Expr, Policy, PolicySet};
use crate::types::Value;

impl Display for PolicySet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut first = true;
        for policy in self {
            if !first {
                write!(f, "\n\n")?;
            }
            first = false;
            write!(f, "{policy}")?;
        }
        Ok(())
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "@{}(", self.key)?;
        write_quoted(f, &self.value)?;
        write!(f, ")")
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for annotation in &self.annotations {
            writeln!(f, "{annotation}")?;
        }
        write!(f, "{}", self.effect)?;
        let unconstrained = self.principal == EntityScope::All
            && self.action == ActionScope::All
            && self.resource == EntityScope::All;
        if unconstrained {
            write!(f, " ( principal, action, resource )")?;
        } else {
            write!(f, " (\n    ")?;
            fmt_entity_scope(f, "principal", &self.principal)?;
            write!(f, ",\n    ")?;
            fmt_action_scope(f, &self.action)?;
            write!(f, ",\n    ")?;
            fmt_entity_scope(f, "resource", &self.resource)?;
            write!(f, "\n)")?;
        }
        for condition in &self.conditions {
            write!(f, "\n{} {{ {} }}", condition.kind, condition.body)?;
        }
        write!(f, ";")
    }
}

fn fmt_entity_scope(f: &mut Formatter<'_>, keyword: &str, scope: &EntityScope) -> FmtResult {
    match scope {
        EntityScope::All => write!(f, "{keyword}"),
        EntityScope::Eq(uid) => write!(f, "{keyword} == {uid}"),
        EntityScope::In(uid) => write!(f, "{keyword} in {uid}"),
        EntityScope::Is(path) => write!(f, "{keyword} is {path}"),
        EntityScope::IsIn(path, uid) => write!(f, "{keyword} is {path} in {uid}"),
    }
}

fn fmt_action_scope(f: &mut Formatter<'_>, scope: &ActionScope) -> FmtResult {
    match scope {
        ActionScope::All => write!(f, "action"),
        ActionScope::Eq(uid) => write!(f, "action == {uid}"),
        ActionScope::In(uid) => write!(f, "action in {uid}"),
        ActionScope::InSet(uids) => {
            write!(f, "action in [{}]", uids.iter().join(", "))
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        fmt_expr(self, f, 0)
    }
}

/// Precedence levels, lowest binding first. Relations share one
/// non-associative level.
fn level(expr: &Expr) -> u8 {
    match expr {
        Expr::If(..) => 0,
        Expr::Or(..) => 1,
        Expr::And(..) => 2,
        Expr::Less(..)
        | Expr::LessEq(..)
        | Expr::Greater(..)
        | Expr::GreaterEq(..)
        | Expr::Equals(..)
        | Expr::NotEquals(..)
        | Expr::In(..)
        | Expr::Has(..)
        | Expr::Like(..)
        | Expr::Is(..)
        | Expr::IsIn(..) => 3,
        Expr::Add(..) | Expr::Sub(..) => 4,
        Expr::Mul(..) => 5,
        Expr::Not(..) | Expr::Negate(..) => 6,
        _ => 7,
    }
}

fn fmt_expr(expr: &Expr, f: &mut Formatter<'_>, min: u8) -> FmtResult {
    if level(expr) < min {
        write!(f, "(")?;
        fmt_expr(expr, f, 0)?;
        return write!(f, ")");
    }
    match expr {
        Expr::Lit(value) => fmt_literal(value, f),
        Expr::SetLit(items) => {
            write!(f, "[")?;
            fmt_args(items, f)?;
            write!(f, "]")
        }
        Expr::RecordLit(entries) => {
            write!(f, "{{")?;
            let mut first = true;
            for (key, value) in entries {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                fmt_attr_name(f, key)?;
                write!(f, ": ")?;
                fmt_expr(value, f, 0)?;
            }
            write!(f, "}}")
        }
        Expr::Principal => write!(f, "principal"),
        Expr::Action => write!(f, "action"),
        Expr::Resource => write!(f, "resource"),
        Expr::Context => write!(f, "context"),
        Expr::Not(operand) => {
            write!(f, "!")?;
            fmt_expr(operand, f, 6)
        }
        Expr::Negate(operand) => {
            write!(f, "-")?;
            fmt_expr(operand, f, 6)
        }
        Expr::Add(lhs, rhs) => fmt_binary(f, lhs, " + ", rhs, 4, 5),
        Expr::Sub(lhs, rhs) => fmt_binary(f, lhs, " - ", rhs, 4, 5),
        Expr::Mul(lhs, rhs) => fmt_binary(f, lhs, " * ", rhs, 5, 6),
        Expr::Less(lhs, rhs) => fmt_binary(f, lhs, " < ", rhs, 4, 4),
        Expr::LessEq(lhs, rhs) => fmt_binary(f, lhs, " <= ", rhs, 4, 4),
        Expr::Greater(lhs, rhs) => fmt_binary(f, lhs, " > ", rhs, 4, 4),
        Expr::GreaterEq(lhs, rhs) => fmt_binary(f, lhs, " >= ", rhs, 4, 4),
        Expr::Equals(lhs, rhs) => fmt_binary(f, lhs, " == ", rhs, 4, 4),
        Expr::NotEquals(lhs, rhs) => fmt_binary(f, lhs, " != ", rhs, 4, 4),
        Expr::In(lhs, rhs) => fmt_binary(f, lhs, " in ", rhs, 4, 4),
        Expr::And(lhs, rhs) => fmt_binary(f, lhs, " && ", rhs, 2, 3),
        Expr::Or(lhs, rhs) => fmt_binary(f, lhs, " || ", rhs, 1, 2),
        Expr::Has(lhs, attr) => {
            fmt_expr(lhs, f, 4)?;
            write!(f, " has ")?;
            fmt_attr_name(f, attr)
        }
        Expr::Like(lhs, pattern) => {
            fmt_expr(lhs, f, 4)?;
            write!(f, " like \"{pattern}\"")
        }
        Expr::Is(lhs, path) => {
            fmt_expr(lhs, f, 4)?;
            write!(f, " is {path}")
        }
        Expr::IsIn(lhs, path, rhs) => {
            fmt_expr(lhs, f, 4)?;
            write!(f, " is {path} in ")?;
            fmt_expr(rhs, f, 4)
        }
        Expr::Access(lhs, attr) => {
            fmt_expr(lhs, f, 7)?;
            if is_identifier(attr) {
                write!(f, ".{attr}")
            } else {
                write!(f, "[")?;
                write_quoted(f, attr)?;
                write!(f, "]")
            }
        }
        Expr::Contains(lhs, arg) => fmt_method(f, lhs, "contains", std::slice::from_ref(&**arg)),
        Expr::ContainsAll(lhs, arg) => {
            fmt_method(f, lhs, "containsAll", std::slice::from_ref(&**arg))
        }
        Expr::ContainsAny(lhs, arg) => {
            fmt_method(f, lhs, "containsAny", std::slice::from_ref(&**arg))
        }
        Expr::ExtensionMethod(lhs, name, args) => fmt_method(f, lhs, name, args),
        Expr::ExtensionCall(name, args) => {
            write!(f, "{name}(")?;
            fmt_args(args, f)?;
            write!(f, ")")
        }
        Expr::If(cond, then, els) => {
            write!(f, "if ")?;
            fmt_expr(cond, f, 0)?;
            write!(f, " then ")?;
            fmt_expr(then, f, 0)?;
            write!(f, " else ")?;
            fmt_expr(els, f, 0)
        }
    }
}

fn fmt_binary(
    f: &mut Formatter<'_>,
    lhs: &Expr,
    op: &str,
    rhs: &Expr,
    lhs_min: u8,
    rhs_min: u8,
) -> FmtResult {
    fmt_expr(lhs, f, lhs_min)?;
    write!(f, "{op}")?;
    fmt_expr(rhs, f, rhs_min)
}

fn fmt_method(f: &mut Formatter<'_>, lhs: &Expr, name: &str, args: &[Expr]) -> FmtResult {
    fmt_expr(lhs, f, 7)?;
    write!(f, ".{name}(")?;
    fmt_args(args, f)?;
    write!(f, ")")
}

fn fmt_args(args: &[Expr], f: &mut Formatter<'_>) -> FmtResult {
    let mut first = true;
    for arg in args {
        if !first {
            write!(f, ", ")?;
        }
        first = false;
        fmt_expr(arg, f, 0)?;
    }
    Ok(())
}

fn fmt_literal(value: &Value, f: &mut Formatter<'_>) -> FmtResult {
    match value {
        Value::Bool(b) => write!(f, "{b}"),
        Value::Long(n) => write!(f, "{n}"),
        Value::String(s) => write_quoted(f, s),
        Value::EntityUID(uid) => write!(f, "{uid}"),
        Value::IPAddr(ip) => write!(f, "ip(\"{ip}\")"),
        Value::Decimal(d) => write!(f, "decimal(\"{d}\")"),
        Value::Set(_) | Value::Record(_) => write!(f, "{value}"),
    }
}

fn fmt_attr_name(f: &mut Formatter<'_>, name: &str) -> FmtResult {
    if is_identifier(name) {
        write!(f, "{name}")
    } else {
        write_quoted(f, name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_quoted(f: &mut Formatter<'_>, s: &str) -> FmtResult {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\0' => write!(f, "\\0")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}
