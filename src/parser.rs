//! Recursive-descent parser for the Cedar policy grammar.
//!
//! One-token lookahead, fail-fast: the first error aborts the input with a
//! position and the offending token text. Precedence, lowest to highest:
//! `if`, `||`, `&&`, relations (non-associative), `+`/`-`, `*`, unary
//! `!`/`-`, member access, primary.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::{
    ActionScope, Annotation, Condition, ConditionKind, Effect, EntityScope, Expr, Policy,
    PolicySet,
};
use crate::error::ParseError;
use crate::token::{tokenize, Token};
use crate::types::{Decimal, EntityUID, IPAddr, Pattern, Value};

/// Nesting bound for condition expressions. Evaluation recurses over the
/// parsed tree, so this bounds the evaluator as well.
const MAX_EXPR_DEPTH: usize = 200;

/// Extension functions callable at primary position, by arity.
static EXT_FUNCTIONS: Lazy<HashMap<&'static str, usize>> =
    Lazy::new(|| HashMap::from([("ip", 1), ("decimal", 1)]));

/// Extension methods callable after `.`, by arity.
static EXT_METHODS: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    HashMap::from([
        ("isIpv4", 0),
        ("isIpv6", 0),
        ("isLoopback", 0),
        ("isMulticast", 0),
        ("isInRange", 1),
        ("lessThan", 1),
        ("lessThanOrEqual", 1),
        ("greaterThan", 1),
        ("greaterThanOrEqual", 1),
    ])
});

pub(crate) fn parse_policy_set(text: &str) -> Result<PolicySet, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
        depth: 0,
    };
    let mut policies = Vec::new();
    while !parser.peek().is_eof() {
        policies.push(parser.policy()?);
    }
    Ok(PolicySet(policies))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// Build an error pointing at the current token.
    fn error(&self, message: impl Into<String>) -> ParseError {
        let t = self.peek();
        ParseError::new(t.pos, t.text.clone(), message)
    }

    fn exact(&mut self, want: &str) -> Result<(), ParseError> {
        let t = self.advance();
        if t.text != want {
            return Err(self.error(format!("got {} want {}", t.text, want)));
        }
        Ok(())
    }

    fn string_value(&self, t: &Token) -> Result<String, ParseError> {
        t.string_value().map_err(|msg| self.error(msg))
    }

    fn policy(&mut self) -> Result<Policy, ParseError> {
        let position = self.peek().pos;
        let annotations = self.annotations()?;
        let mut policy = self.effect()?;
        policy.annotations = annotations;
        policy.position = position;
        self.exact("(")?;
        policy.principal = self.entity_scope("principal")?;
        self.exact(",")?;
        policy.action = self.action_scope()?;
        self.exact(",")?;
        policy.resource = self.entity_scope("resource")?;
        self.exact(")")?;
        self.conditions(&mut policy)?;
        self.exact(";")?;
        Ok(policy)
    }

    fn annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut res = Vec::new();
        while self.peek().text == "@" {
            self.advance();
            let t = self.advance();
            if !t.is_ident() {
                return Err(self.error("expected ident"));
            }
            let key = t.text;
            self.exact("(")?;
            let t = self.advance();
            if !t.is_string() {
                return Err(self.error("expected string"));
            }
            let value = self.string_value(&t)?;
            self.exact(")")?;
            res.push(Annotation { key, value });
        }
        Ok(res)
    }

    fn effect(&mut self) -> Result<Policy, ParseError> {
        let t = self.advance();
        match t.text.as_str() {
            "permit" => Ok(Policy::new(Effect::Permit)),
            "forbid" => Ok(Policy::new(Effect::Forbid)),
            _ => Err(self.error(format!("unexpected effect: {}", t.text))),
        }
    }

    /// Scope clause for `principal` or `resource` (they share a grammar).
    fn entity_scope(&mut self, keyword: &str) -> Result<EntityScope, ParseError> {
        self.exact(keyword)?;
        match self.peek().text.as_str() {
            "==" => {
                self.advance();
                Ok(EntityScope::Eq(self.entity()?))
            }
            "is" => {
                self.advance();
                let path = self.path()?;
                if self.peek().text == "in" {
                    self.advance();
                    Ok(EntityScope::IsIn(path, self.entity()?))
                } else {
                    Ok(EntityScope::Is(path))
                }
            }
            "in" => {
                self.advance();
                Ok(EntityScope::In(self.entity()?))
            }
            _ => Ok(EntityScope::All),
        }
    }

    fn action_scope(&mut self) -> Result<ActionScope, ParseError> {
        self.exact("action")?;
        match self.peek().text.as_str() {
            "==" => {
                self.advance();
                Ok(ActionScope::Eq(self.entity()?))
            }
            "in" => {
                self.advance();
                if self.peek().text == "[" {
                    self.advance();
                    let entities = self.entity_list()?;
                    self.advance(); // entity_list leaves "]" current
                    Ok(ActionScope::InSet(entities))
                } else {
                    Ok(ActionScope::In(self.entity()?))
                }
            }
            _ => Ok(ActionScope::All),
        }
    }

    fn entity_list(&mut self) -> Result<Vec<EntityUID>, ParseError> {
        let mut res = Vec::new();
        while self.peek().text != "]" {
            if !res.is_empty() {
                self.exact(",")?;
            }
            res.push(self.entity()?);
        }
        Ok(res)
    }

    fn entity(&mut self) -> Result<EntityUID, ParseError> {
        let t = self.advance();
        if !t.is_ident() {
            return Err(self.error("expected ident"));
        }
        self.entity_with_path_prefix(t.text)
    }

    /// Continue an entity UID whose first path segment is already consumed:
    /// `(:: ident)* :: "id"`.
    fn entity_with_path_prefix(&mut self, first: String) -> Result<EntityUID, ParseError> {
        let mut type_name = first;
        loop {
            self.exact("::")?;
            let t = self.advance();
            if t.is_ident() {
                type_name = format!("{type_name}::{}", t.text);
            } else if t.is_string() {
                let id = self.string_value(&t)?;
                return Ok(EntityUID::new(type_name, id));
            } else {
                return Err(self.error("unexpected token"));
            }
        }
    }

    /// A `::`-joined type path with no trailing id.
    fn path(&mut self) -> Result<String, ParseError> {
        let t = self.advance();
        if !t.is_ident() {
            return Err(self.error("expected ident"));
        }
        let mut res = t.text;
        while self.peek().text == "::" {
            self.advance();
            let t = self.advance();
            if !t.is_ident() {
                return Err(self.error("unexpected token"));
            }
            res = format!("{res}::{}", t.text);
        }
        Ok(res)
    }

    fn conditions(&mut self, policy: &mut Policy) -> Result<(), ParseError> {
        loop {
            let kind = match self.peek().text.as_str() {
                "when" => ConditionKind::When,
                "unless" => ConditionKind::Unless,
                _ => return Ok(()),
            };
            self.advance();
            self.exact("{")?;
            let body = self.expression()?;
            self.exact("}")?;
            policy.conditions.push(Condition { kind, body });
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(self.error("expression too deeply nested"));
        }
        self.depth += 1;
        let res = self.expression_inner();
        self.depth -= 1;
        res
    }

    fn expression_inner(&mut self) -> Result<Expr, ParseError> {
        if self.peek().text == "if" {
            self.advance();
            let cond = self.expression()?;
            self.exact("then")?;
            let then = self.expression()?;
            self.exact("else")?;
            let els = self.expression()?;
            return Ok(Expr::If(cond.into(), then.into(), els.into()));
        }
        self.or()
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and()?;
        while self.peek().text == "||" {
            self.advance();
            let rhs = self.and()?;
            lhs = Expr::Or(lhs.into(), rhs.into());
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.relation()?;
        while self.peek().text == "&&" {
            self.advance();
            let rhs = self.relation()?;
            lhs = Expr::And(lhs.into(), rhs.into());
        }
        Ok(lhs)
    }

    /// Relations are non-associative: at most one per level.
    fn relation(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.add()?;
        let op = self.peek().text.clone();
        match op.as_str() {
            "<" | "<=" | ">" | ">=" | "==" | "!=" | "in" => {
                self.advance();
                let rhs = self.add()?;
                let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
                Ok(match op.as_str() {
                    "<" => Expr::Less(lhs, rhs),
                    "<=" => Expr::LessEq(lhs, rhs),
                    ">" => Expr::Greater(lhs, rhs),
                    ">=" => Expr::GreaterEq(lhs, rhs),
                    "==" => Expr::Equals(lhs, rhs),
                    "!=" => Expr::NotEquals(lhs, rhs),
                    _ => Expr::In(lhs, rhs),
                })
            }
            "has" => {
                self.advance();
                let t = self.advance();
                let attr = if t.is_ident() {
                    t.text
                } else if t.is_string() {
                    self.string_value(&t)?
                } else {
                    return Err(self.error("expected ident or string"));
                };
                Ok(Expr::Has(lhs.into(), attr))
            }
            "like" => {
                self.advance();
                let t = self.advance();
                if !t.is_string() {
                    return Err(self.error("expected string"));
                }
                let pattern =
                    Pattern::from_raw(t.raw_string_body()).map_err(|msg| self.error(msg))?;
                Ok(Expr::Like(lhs.into(), pattern))
            }
            "is" => {
                self.advance();
                let path = self.path()?;
                if self.peek().text == "in" {
                    self.advance();
                    let rhs = self.add()?;
                    Ok(Expr::IsIn(lhs.into(), path, rhs.into()))
                } else {
                    Ok(Expr::Is(lhs.into(), path))
                }
            }
            _ => Ok(lhs),
        }
    }

    fn add(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.mult()?;
        loop {
            let op = self.peek().text.clone();
            if op != "+" && op != "-" {
                return Ok(lhs);
            }
            self.advance();
            let rhs = self.mult()?;
            lhs = if op == "+" {
                Expr::Add(lhs.into(), rhs.into())
            } else {
                Expr::Sub(lhs.into(), rhs.into())
            };
        }
    }

    fn mult(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while self.peek().text == "*" {
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Mul(lhs.into(), rhs.into());
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        #[derive(PartialEq)]
        enum Op {
            Not,
            Neg,
        }
        let mut ops = Vec::new();
        loop {
            match self.peek().text.as_str() {
                "!" => {
                    self.advance();
                    ops.push(Op::Not);
                }
                "-" => {
                    self.advance();
                    ops.push(Op::Neg);
                }
                _ => break,
            }
        }
        // A minus directly before an integer literal folds into a negative
        // long, so `-1` is a literal and `--1` is `Negate(Long(-1))`.
        let mut res = if ops.last() == Some(&Op::Neg) && self.peek().is_int() {
            ops.pop();
            let t = self.advance();
            let value = format!("-{}", t.text)
                .parse::<i64>()
                .map_err(|_| self.error(format!("invalid integer literal `-{}`", t.text)))?;
            let mut expr = Expr::Lit(Value::Long(value));
            loop {
                match self.access(expr)? {
                    (r, true) => expr = r,
                    (r, false) => break r,
                }
            }
        } else {
            self.member()?
        };
        for op in ops.into_iter().rev() {
            res = match op {
                Op::Not => Expr::Not(res.into()),
                Op::Neg => Expr::Negate(res.into()),
            };
        }
        Ok(res)
    }

    fn member(&mut self) -> Result<Expr, ParseError> {
        let mut res = self.primary()?;
        loop {
            match self.access(res)? {
                (r, true) => res = r,
                (r, false) => return Ok(r),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.advance();
        if t.is_int() {
            let value = t.int_value().map_err(|msg| self.error(msg))?;
            return Ok(Expr::Lit(Value::Long(value)));
        }
        if t.is_string() {
            return Ok(Expr::Lit(Value::String(self.string_value(&t)?)));
        }
        match t.text.as_str() {
            "true" => Ok(Expr::Lit(Value::Bool(true))),
            "false" => Ok(Expr::Lit(Value::Bool(false))),
            "principal" => Ok(Expr::Principal),
            "action" => Ok(Expr::Action),
            "resource" => Ok(Expr::Resource),
            "context" => Ok(Expr::Context),
            "(" => {
                let expr = self.expression()?;
                self.exact(")")?;
                Ok(expr)
            }
            "[" => {
                let items = self.expressions("]")?;
                self.advance(); // expressions leaves "]" current
                Ok(Expr::SetLit(items))
            }
            "{" => self.record(),
            _ if t.is_ident() => self.entity_or_ext_fun(t.text),
            _ => Err(self.error("invalid primary")),
        }
    }

    /// An identifier at primary position is either an entity UID or one of
    /// the two extension functions. Only `ip` and `decimal` exist and
    /// neither takes a path prefix, so a following `(` settles it.
    fn entity_or_ext_fun(&mut self, ident: String) -> Result<Expr, ParseError> {
        if self.peek().text != "(" {
            let uid = self.entity_with_path_prefix(ident)?;
            return Ok(Expr::Lit(Value::EntityUID(uid)));
        }
        self.advance();
        let args = self.expressions(")")?;
        // Callee checks run before ")" is consumed so errors point at it.
        if EXT_FUNCTIONS.contains_key(ident.as_str()) {
            let literal = match args.as_slice() {
                [Expr::Lit(Value::String(s))] => s.clone(),
                _ => {
                    return Err(
                        self.error(format!("`{ident}` expects a single string literal argument"))
                    )
                }
            };
            if ident == "ip" {
                IPAddr::parse(&literal).map_err(|e| self.error(e.to_string()))?;
            } else {
                Decimal::parse(&literal).map_err(|e| self.error(e.to_string()))?;
            }
            self.advance(); // consume ")"
            return Ok(Expr::ExtensionCall(ident, args));
        }
        if EXT_METHODS.contains_key(ident.as_str()) {
            return Err(self.error(format!("`{ident}` is a method, not a function")));
        }
        Err(self.error(format!("`{ident}` is not a function")))
    }

    /// Comma-separated expressions up to (and not consuming) `end`.
    fn expressions(&mut self, end: &str) -> Result<Vec<Expr>, ParseError> {
        let mut res = Vec::new();
        while self.peek().text != end {
            if !res.is_empty() {
                self.exact(",")?;
            }
            res.push(self.expression()?);
        }
        Ok(res)
    }

    fn record(&mut self) -> Result<Expr, ParseError> {
        let mut entries: Vec<(String, Expr)> = Vec::new();
        loop {
            if self.peek().text == "}" {
                self.advance();
                return Ok(Expr::RecordLit(entries));
            }
            if !entries.is_empty() {
                self.exact(",")?;
            }
            let t = self.advance();
            let key = if t.is_ident() {
                t.text
            } else if t.is_string() {
                self.string_value(&t)?
            } else {
                return Err(self.error("unexpected token"));
            };
            self.exact(":")?;
            let value = self.expression()?;
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(self.error(format!("duplicate key: {key}")));
            }
            entries.push((key, value));
        }
    }

    /// One trailing access step: `.attr`, `.method(args)`, or `["attr"]`.
    /// Returns `(expr, false)` when no step applies.
    fn access(&mut self, lhs: Expr) -> Result<(Expr, bool), ParseError> {
        match self.peek().text.as_str() {
            "." => {
                self.advance();
                let t = self.advance();
                if !t.is_ident() {
                    return Err(self.error("unexpected token"));
                }
                if self.peek().text != "(" {
                    return Ok((Expr::Access(lhs.into(), t.text), true));
                }
                let method = t.text;
                self.advance();
                let args = self.expressions(")")?;
                self.advance(); // expressions leaves ")" current
                let expr = self.method_call(lhs, method, args)?;
                Ok((expr, true))
            }
            "[" => {
                self.advance();
                let t = self.advance();
                if !t.is_string() {
                    return Err(self.error("unexpected token"));
                }
                let name = self.string_value(&t)?;
                self.exact("]")?;
                Ok((Expr::Access(lhs.into(), name), true))
            }
            _ => Ok((lhs, false)),
        }
    }

    fn method_call(&self, lhs: Expr, method: String, args: Vec<Expr>) -> Result<Expr, ParseError> {
        match method.as_str() {
            "contains" | "containsAll" | "containsAny" => {
                let mut args = args.into_iter();
                let (Some(arg), None) = (args.next(), args.next()) else {
                    return Err(self.error(format!("`{method}` expects one argument")));
                };
                let (lhs, arg) = (Box::new(lhs), Box::new(arg));
                Ok(match method.as_str() {
                    "contains" => Expr::Contains(lhs, arg),
                    "containsAll" => Expr::ContainsAll(lhs, arg),
                    _ => Expr::ContainsAny(lhs, arg),
                })
            }
            _ if EXT_METHODS.contains_key(method.as_str()) => {
                let arity = EXT_METHODS[method.as_str()];
                if args.len() != arity {
                    let want = if arity == 0 { "no arguments" } else { "one argument" };
                    return Err(self.error(format!("`{method}` expects {want}")));
                }
                Ok(Expr::ExtensionMethod(lhs.into(), method, args))
            }
            _ if EXT_FUNCTIONS.contains_key(method.as_str()) => {
                Err(self.error(format!("`{method}` is a function, not a method")))
            }
            _ => Err(self.error(format!("`{method}` is not a method"))),
        }
    }
}
