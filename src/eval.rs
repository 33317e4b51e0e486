//! Expression evaluation against an entity store and a request.

use crate::ast::{ActionScope, ConditionKind, EntityScope, Expr, Policy};
use crate::error::EvalError;
use crate::types::{Decimal, Entities, EntityUID, IPAddr, Record, Request, Set, Value};

/// Evaluates expressions for one request. Borrows the store and the request
/// immutably, so one pair can back any number of evaluators concurrently.
pub struct Evaluator<'a> {
    entities: &'a Entities,
    request: &'a Request,
}

fn type_error(expected: &'static str, got: &Value) -> EvalError {
    EvalError::TypeError {
        expected,
        got: got.type_name(),
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(entities: &'a Entities, request: &'a Request) -> Self {
        Evaluator { entities, request }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Lit(value) => Ok(value.clone()),
            Expr::SetLit(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Set(Set::new(values)))
            }
            Expr::RecordLit(entries) => {
                let mut record = Record::new();
                for (key, value) in entries {
                    record.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::Record(record))
            }

            Expr::Principal => Ok(Value::EntityUID(self.request.principal.clone())),
            Expr::Action => Ok(Value::EntityUID(self.request.action.clone())),
            Expr::Resource => Ok(Value::EntityUID(self.request.resource.clone())),
            Expr::Context => Ok(Value::Record(self.request.context.clone())),

            Expr::Not(operand) => Ok(Value::Bool(!self.eval_bool(operand)?)),
            Expr::Negate(operand) => {
                let n = self.eval_long(operand)?;
                n.checked_neg()
                    .map(Value::Long)
                    .ok_or(EvalError::ArithmeticOverflow)
            }

            Expr::Add(lhs, rhs) => self.arith(lhs, rhs, i64::checked_add),
            Expr::Sub(lhs, rhs) => self.arith(lhs, rhs, i64::checked_sub),
            Expr::Mul(lhs, rhs) => self.arith(lhs, rhs, i64::checked_mul),

            Expr::Less(lhs, rhs) => self.compare(lhs, rhs, |a, b| a < b),
            Expr::LessEq(lhs, rhs) => self.compare(lhs, rhs, |a, b| a <= b),
            Expr::Greater(lhs, rhs) => self.compare(lhs, rhs, |a, b| a > b),
            Expr::GreaterEq(lhs, rhs) => self.compare(lhs, rhs, |a, b| a >= b),

            Expr::Equals(lhs, rhs) => Ok(Value::Bool(self.eval(lhs)? == self.eval(rhs)?)),
            Expr::NotEquals(lhs, rhs) => Ok(Value::Bool(self.eval(lhs)? != self.eval(rhs)?)),

            Expr::And(lhs, rhs) => {
                if !self.eval_bool(lhs)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_bool(rhs)?))
            }
            Expr::Or(lhs, rhs) => {
                if self.eval_bool(lhs)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_bool(rhs)?))
            }

            Expr::In(lhs, rhs) => self.eval_in(lhs, rhs),
            Expr::Has(lhs, attr) => self.eval_has(lhs, attr),
            Expr::Like(lhs, pattern) => {
                let text = self.eval_string(lhs)?;
                Ok(Value::Bool(pattern.matches(&text)))
            }
            Expr::Is(lhs, path) => {
                let uid = self.eval_entity(lhs)?;
                Ok(Value::Bool(uid.type_name == *path))
            }
            Expr::IsIn(lhs, path, rhs) => {
                let uid = self.eval_entity(lhs)?;
                if uid.type_name != *path {
                    return Ok(Value::Bool(false));
                }
                self.eval_in(lhs, rhs)
            }

            Expr::Access(lhs, attr) => self.eval_access(lhs, attr),
            Expr::Contains(lhs, arg) => {
                let set = self.eval_set(lhs)?;
                let needle = self.eval(arg)?;
                Ok(Value::Bool(set.contains(&needle)))
            }
            Expr::ContainsAll(lhs, arg) => {
                let set = self.eval_set(lhs)?;
                let other = self.eval_set(arg)?;
                Ok(Value::Bool(other.is_subset(&set)))
            }
            Expr::ContainsAny(lhs, arg) => {
                let set = self.eval_set(lhs)?;
                let other = self.eval_set(arg)?;
                Ok(Value::Bool(set.intersects(&other)))
            }

            Expr::If(cond, then, els) => {
                if self.eval_bool(cond)? {
                    self.eval(then)
                } else {
                    self.eval(els)
                }
            }
            Expr::ExtensionCall(name, args) => self.eval_call(name, args),
            Expr::ExtensionMethod(receiver, name, args) => self.eval_method(receiver, name, args),
        }
    }

    fn eval_bool(&self, expr: &Expr) -> Result<bool, EvalError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            v => Err(type_error("bool", &v)),
        }
    }

    fn eval_long(&self, expr: &Expr) -> Result<i64, EvalError> {
        match self.eval(expr)? {
            Value::Long(n) => Ok(n),
            v => Err(type_error("long", &v)),
        }
    }

    fn eval_string(&self, expr: &Expr) -> Result<String, EvalError> {
        match self.eval(expr)? {
            Value::String(s) => Ok(s),
            v => Err(type_error("string", &v)),
        }
    }

    fn eval_set(&self, expr: &Expr) -> Result<Set, EvalError> {
        match self.eval(expr)? {
            Value::Set(s) => Ok(s),
            v => Err(type_error("set", &v)),
        }
    }

    fn eval_entity(&self, expr: &Expr) -> Result<EntityUID, EvalError> {
        match self.eval(expr)? {
            Value::EntityUID(uid) => Ok(uid),
            v => Err(type_error("entity", &v)),
        }
    }

    fn eval_ip(&self, expr: &Expr) -> Result<IPAddr, EvalError> {
        match self.eval(expr)? {
            Value::IPAddr(ip) => Ok(ip),
            v => Err(type_error("ip", &v)),
        }
    }

    fn eval_decimal(&self, expr: &Expr) -> Result<Decimal, EvalError> {
        match self.eval(expr)? {
            Value::Decimal(d) => Ok(d),
            v => Err(type_error("decimal", &v)),
        }
    }

    fn arith(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        op: fn(i64, i64) -> Option<i64>,
    ) -> Result<Value, EvalError> {
        let a = self.eval_long(lhs)?;
        let b = self.eval_long(rhs)?;
        op(a, b)
            .map(Value::Long)
            .ok_or(EvalError::ArithmeticOverflow)
    }

    fn compare(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        op: fn(i64, i64) -> bool,
    ) -> Result<Value, EvalError> {
        let a = self.eval_long(lhs)?;
        let b = self.eval_long(rhs)?;
        Ok(Value::Bool(op(a, b)))
    }

    /// `a in b`: hierarchy membership. `a` must be an entity; `b` is an
    /// entity or a set of entities. Ancestry is the reflexive-transitive
    /// closure of parent edges, so missing entities just have no parents.
    fn eval_in(&self, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        let child = self.eval_entity(lhs)?;
        let ancestors = self.entities.ancestors_of(&child);
        let found = match self.eval(rhs)? {
            Value::EntityUID(uid) => ancestors.contains(&uid),
            Value::Set(set) => {
                let mut found = false;
                for member in set.iter() {
                    match member {
                        Value::EntityUID(uid) => found = found || ancestors.contains(uid),
                        v => return Err(type_error("entity", v)),
                    }
                }
                found
            }
            v => return Err(type_error("entity or set of entities", &v)),
        };
        Ok(Value::Bool(found))
    }

    /// `a has attr`. A UID missing from the store is `false`, not an error.
    fn eval_has(&self, lhs: &Expr, attr: &str) -> Result<Value, EvalError> {
        match self.eval(lhs)? {
            Value::Record(record) => Ok(Value::Bool(record.contains_key(attr))),
            Value::EntityUID(uid) => Ok(Value::Bool(
                self.entities
                    .get(&uid)
                    .is_some_and(|e| e.attrs.contains_key(attr)),
            )),
            v => Err(type_error("record or entity", &v)),
        }
    }

    fn eval_access(&self, lhs: &Expr, attr: &str) -> Result<Value, EvalError> {
        match self.eval(lhs)? {
            Value::Record(record) => record
                .get(attr)
                .cloned()
                .ok_or_else(|| EvalError::AttributeDoesNotExist(attr.to_string())),
            Value::EntityUID(uid) => {
                let entity = self
                    .entities
                    .get(&uid)
                    .ok_or(EvalError::EntityDoesNotExist(uid))?;
                entity
                    .attrs
                    .get(attr)
                    .cloned()
                    .ok_or_else(|| EvalError::AttributeDoesNotExist(attr.to_string()))
            }
            v => Err(type_error("record or entity", &v)),
        }
    }

    fn eval_call(&self, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
        let [arg] = args else {
            return Err(EvalError::InvalidValue(format!(
                "`{name}` expects one argument"
            )));
        };
        let literal = self.eval_string(arg)?;
        match name {
            "ip" => IPAddr::parse(&literal)
                .map(Value::IPAddr)
                .map_err(|e| EvalError::InvalidValue(e.to_string())),
            "decimal" => Decimal::parse(&literal)
                .map(Value::Decimal)
                .map_err(|e| EvalError::InvalidValue(e.to_string())),
            _ => Err(EvalError::UnknownExtensionFunction(name.to_string())),
        }
    }

    fn eval_method(&self, receiver: &Expr, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
        let result = match name {
            "isIpv4" => self.eval_ip(receiver)?.is_ipv4(),
            "isIpv6" => self.eval_ip(receiver)?.is_ipv6(),
            "isLoopback" => self.eval_ip(receiver)?.is_loopback(),
            "isMulticast" => self.eval_ip(receiver)?.is_multicast(),
            "isInRange" => {
                let ip = self.eval_ip(receiver)?;
                let range = self.single_ip_arg(name, args)?;
                ip.in_range(&range)
            }
            "lessThan" => self.decimal_cmp(receiver, name, args)? == std::cmp::Ordering::Less,
            "lessThanOrEqual" => {
                self.decimal_cmp(receiver, name, args)? != std::cmp::Ordering::Greater
            }
            "greaterThan" => self.decimal_cmp(receiver, name, args)? == std::cmp::Ordering::Greater,
            "greaterThanOrEqual" => {
                self.decimal_cmp(receiver, name, args)? != std::cmp::Ordering::Less
            }
            _ => return Err(EvalError::UnknownExtensionMethod(name.to_string())),
        };
        Ok(Value::Bool(result))
    }

    fn single_ip_arg(&self, name: &str, args: &[Expr]) -> Result<IPAddr, EvalError> {
        let [arg] = args else {
            return Err(EvalError::InvalidValue(format!(
                "`{name}` expects one argument"
            )));
        };
        self.eval_ip(arg)
    }

    fn decimal_cmp(
        &self,
        receiver: &Expr,
        name: &str,
        args: &[Expr],
    ) -> Result<std::cmp::Ordering, EvalError> {
        let [arg] = args else {
            return Err(EvalError::InvalidValue(format!(
                "`{name}` expects one argument"
            )));
        };
        let lhs = self.eval_decimal(receiver)?;
        let rhs = self.eval_decimal(arg)?;
        Ok(lhs.cmp(&rhs))
    }
}

/// Lower a policy to the single condition expression that is true exactly
/// when the policy fires: scope constraints, then `when` bodies, then
/// negated `unless` bodies, all joined with `&&`.
pub(crate) fn compile_policy(policy: &Policy) -> Expr {
    let mut terms: Vec<Expr> = Vec::new();
    entity_scope_terms(Expr::Principal, &policy.principal, &mut terms);
    match &policy.action {
        ActionScope::All => {}
        ActionScope::Eq(uid) => terms.push(Expr::Equals(
            Expr::Action.into(),
            Expr::Lit(Value::EntityUID(uid.clone())).into(),
        )),
        ActionScope::In(uid) => terms.push(Expr::In(
            Expr::Action.into(),
            Expr::Lit(Value::EntityUID(uid.clone())).into(),
        )),
        ActionScope::InSet(uids) => {
            let set = Set::new(uids.iter().cloned().map(Value::EntityUID).collect());
            terms.push(Expr::In(
                Expr::Action.into(),
                Expr::Lit(Value::Set(set)).into(),
            ));
        }
    }
    entity_scope_terms(Expr::Resource, &policy.resource, &mut terms);
    for condition in &policy.conditions {
        match condition.kind {
            ConditionKind::When => terms.push(condition.body.clone()),
            ConditionKind::Unless => terms.push(Expr::Not(condition.body.clone().into())),
        }
    }
    terms
        .into_iter()
        .reduce(|acc, term| Expr::And(acc.into(), term.into()))
        .unwrap_or(Expr::Lit(Value::Bool(true)))
}

fn entity_scope_terms(var: Expr, scope: &EntityScope, terms: &mut Vec<Expr>) {
    let uid_lit = |uid: &EntityUID| Expr::Lit(Value::EntityUID(uid.clone()));
    match scope {
        EntityScope::All => {}
        EntityScope::Eq(uid) => terms.push(Expr::Equals(var.into(), uid_lit(uid).into())),
        EntityScope::In(uid) => terms.push(Expr::In(var.into(), uid_lit(uid).into())),
        EntityScope::Is(path) => terms.push(Expr::Is(var.into(), path.clone())),
        EntityScope::IsIn(path, uid) => {
            terms.push(Expr::Is(var.clone().into(), path.clone()));
            terms.push(Expr::In(var.into(), uid_lit(uid).into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PolicySet;
    use crate::types::Entity;
    use yare::parameterized;

    fn fixture_entities() -> Entities {
        let alice = EntityUID::new("User", "alice");
        let admins = EntityUID::new("Group", "admins");
        let root = EntityUID::new("Group", "root");
        [
            Entity::new(alice)
                .with_attr("age", 30i64)
                .with_attr("name", "alice")
                .with_parent(admins.clone()),
            Entity::new(admins).with_parent(root.clone()),
            Entity::new(root),
            Entity::new(EntityUID::new("Document", "doc1")).with_attr("owner", "alice"),
        ]
        .into_iter()
        .collect()
    }

    fn fixture_request() -> Request {
        let mut context = Record::new();
        context.insert("mfa".into(), Value::Bool(true));
        context.insert("count".into(), Value::Long(3));
        context.insert(
            "src".into(),
            Value::IPAddr(IPAddr::parse("10.1.2.3").unwrap()),
        );
        context.insert(
            "score".into(),
            Value::Decimal(Decimal::parse("2.5").unwrap()),
        );
        context.insert(
            "tags".into(),
            Value::Set(Set::new(vec![
                Value::String("red".into()),
                Value::String("blue".into()),
            ])),
        );
        Request {
            principal: EntityUID::new("User", "alice"),
            action: EntityUID::new("Action", "view"),
            resource: EntityUID::new("Document", "doc1"),
            context,
        }
    }

    fn eval_expr(text: &str) -> Result<Value, EvalError> {
        let source = format!("permit ( principal, action, resource )\nwhen {{ {text} }};");
        let set = PolicySet::parse(&source).unwrap();
        let body = set[0].conditions[0].body.clone();
        let entities = fixture_entities();
        let request = fixture_request();
        Evaluator::new(&entities, &request).eval(&body)
    }

    fn eval_ok(text: &str) -> Value {
        eval_expr(text).unwrap()
    }

    #[parameterized(
        add_mult = { "1 + 2 * 3 == 7" },
        unary_mult = { "-2 * 3 == -6" },
        or_and = { "true || false && false" },
        parens = { "(2 + 3) * 4 == 20" },
        sub_chain = { "10 - 2 - 3 == 5" },
        if_branch = { "(if 1 < 2 then 10 else 20) == 10" },
        string_eq = { "\"a\" == \"a\"" },
        ne = { "1 != 2" },
        not = { "!false" },
        rel = { "2 <= 2 && 3 > 1 && 1 >= 1 && 0 < 1" },
    )]
    fn test_boolean_properties(text: &str) {
        assert_eq!(eval_ok(text), Value::Bool(true), "{text}");
    }

    #[test]
    fn test_set_semantics() {
        assert_eq!(eval_ok("[1, 2, 3] == [3, 2, 1, 2]"), Value::Bool(true));
        assert_eq!(eval_ok("[1, 1].containsAll([1])"), Value::Bool(true));
        assert_eq!(eval_ok("[[1], [2]] == [[2], [1]]"), Value::Bool(true));
        assert_eq!(eval_ok("[1] == [2]"), Value::Bool(false));
    }

    #[test]
    fn test_record_semantics() {
        assert_eq!(eval_ok("{a: 1, b: 2} == {b: 2, a: 1}"), Value::Bool(true));
        assert_eq!(eval_ok("{a: 1} == {a: 2}"), Value::Bool(false));
        assert_eq!(eval_ok("{a: 1} has a"), Value::Bool(true));
        assert_eq!(eval_ok("{a: 1} has b"), Value::Bool(false));
        assert_eq!(eval_ok("{a: 41}.a + 1"), Value::Long(42));
    }

    #[test]
    fn test_short_circuit() {
        // The right operand would type-error; short-circuiting must skip it.
        assert_eq!(eval_ok("false && (1 < true)"), Value::Bool(false));
        assert_eq!(eval_ok("true || (1 < true)"), Value::Bool(true));
        assert!(matches!(
            eval_expr("(1 < true) && true"),
            Err(EvalError::TypeError { .. })
        ));
        assert!(matches!(
            eval_expr("1 && true"),
            Err(EvalError::TypeError { expected: "bool", .. })
        ));
    }

    #[test]
    fn test_if_evaluates_one_branch() {
        assert_eq!(eval_ok("if true then 1 else (1 < true)"), Value::Long(1));
        assert_eq!(eval_ok("if false then (1 < true) else 2"), Value::Long(2));
        assert!(matches!(
            eval_expr("if 1 then 2 else 3"),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_arithmetic_overflow() {
        assert!(matches!(
            eval_expr("9223372036854775807 + 1"),
            Err(EvalError::ArithmeticOverflow)
        ));
        assert!(matches!(
            eval_expr("--9223372036854775808"),
            Err(EvalError::ArithmeticOverflow)
        ));
        assert!(matches!(
            eval_expr("-9223372036854775808 - 1"),
            Err(EvalError::ArithmeticOverflow)
        ));
        assert!(matches!(
            eval_expr("4611686018427387904 * 2"),
            Err(EvalError::ArithmeticOverflow)
        ));
    }

    #[test]
    fn test_variables() {
        assert_eq!(eval_ok("principal == User::\"alice\""), Value::Bool(true));
        assert_eq!(eval_ok("action == Action::\"view\""), Value::Bool(true));
        assert_eq!(eval_ok("resource == Document::\"doc1\""), Value::Bool(true));
        assert_eq!(eval_ok("context.mfa"), Value::Bool(true));
        assert_eq!(eval_ok("context.count + 1"), Value::Long(4));
    }

    #[test]
    fn test_hierarchy_in() {
        assert_eq!(eval_ok("principal in Group::\"admins\""), Value::Bool(true));
        // Transitive: alice -> admins -> root.
        assert_eq!(eval_ok("principal in Group::\"root\""), Value::Bool(true));
        // Reflexive.
        assert_eq!(eval_ok("principal in User::\"alice\""), Value::Bool(true));
        assert_eq!(eval_ok("principal in Group::\"others\""), Value::Bool(false));
        assert_eq!(
            eval_ok("principal in [Group::\"others\", Group::\"root\"]"),
            Value::Bool(true)
        );
        assert!(matches!(
            eval_expr("1 in Group::\"admins\""),
            Err(EvalError::TypeError { .. })
        ));
        assert!(matches!(
            eval_expr("principal in [1]"),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_in_on_missing_entity_is_false() {
        assert_eq!(
            eval_ok("User::\"ghost\" in Group::\"admins\""),
            Value::Bool(false)
        );
        assert_eq!(eval_ok("User::\"ghost\" in User::\"ghost\""), Value::Bool(true));
    }

    #[test]
    fn test_has_on_entities() {
        assert_eq!(eval_ok("principal has age"), Value::Bool(true));
        assert_eq!(eval_ok("principal has salary"), Value::Bool(false));
        // Missing entity: false, not an error.
        assert_eq!(eval_ok("User::\"ghost\" has age"), Value::Bool(false));
        assert!(matches!(
            eval_expr("1 has age"),
            Err(EvalError::TypeError { .. })
        ));
    }

    #[test]
    fn test_attribute_access() {
        assert_eq!(eval_ok("principal.age"), Value::Long(30));
        assert_eq!(eval_ok("principal[\"age\"]"), Value::Long(30));
        assert_eq!(eval_ok("resource.owner == principal.name"), Value::Bool(true));
        assert_eq!(
            eval_expr("principal.salary"),
            Err(EvalError::AttributeDoesNotExist("salary".into()))
        );
        assert_eq!(
            eval_expr("User::\"ghost\".age"),
            Err(EvalError::EntityDoesNotExist(EntityUID::new("User", "ghost")))
        );
    }

    #[test]
    fn test_set_methods() {
        assert_eq!(eval_ok("context.tags.contains(\"red\")"), Value::Bool(true));
        assert_eq!(eval_ok("context.tags.contains(\"green\")"), Value::Bool(false));
        assert_eq!(
            eval_ok("context.tags.containsAll([\"red\", \"blue\"])"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("context.tags.containsAny([\"green\", \"blue\"])"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("context.tags.containsAny([\"green\"])"),
            Value::Bool(false)
        );
        assert!(matches!(
            eval_expr("1 .contains(2)"),
            Err(EvalError::TypeError { expected: "set", .. })
        ));
    }

    #[parameterized(
        prefix = { "principal.name like \"a*\"", true },
        exact = { "principal.name like \"alice\"", true },
        miss = { "principal.name like \"j*\"", false },
        infix = { "principal.name like \"*lic*\"", true },
    )]
    fn test_like(text: &str, expected: bool) {
        assert_eq!(eval_ok(text), Value::Bool(expected), "{text}");
    }

    #[test]
    fn test_like_requires_string() {
        assert!(matches!(
            eval_expr("context.count like \"3\""),
            Err(EvalError::TypeError { expected: "string", .. })
        ));
    }

    #[test]
    fn test_is_and_is_in() {
        assert_eq!(eval_ok("principal is User"), Value::Bool(true));
        assert_eq!(eval_ok("principal is Robot"), Value::Bool(false));
        assert_eq!(
            eval_ok("principal is User in Group::\"admins\""),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("principal is Robot in Group::\"admins\""),
            Value::Bool(false)
        );
        assert_eq!(
            eval_ok("principal is User in Group::\"others\""),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_ip_methods() {
        assert_eq!(
            eval_ok("context.src.isInRange(ip(\"10.0.0.0/8\"))"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("context.src.isInRange(ip(\"192.168.0.0/16\"))"),
            Value::Bool(false)
        );
        assert_eq!(eval_ok("context.src.isIpv4()"), Value::Bool(true));
        assert_eq!(eval_ok("context.src.isIpv6()"), Value::Bool(false));
        assert_eq!(eval_ok("ip(\"127.0.0.1\").isLoopback()"), Value::Bool(true));
        assert_eq!(eval_ok("ip(\"224.0.0.1\").isMulticast()"), Value::Bool(true));
        assert_eq!(eval_ok("ip(\"10.0.0.1\") == ip(\"10.0.0.1\")"), Value::Bool(true));
        assert!(matches!(
            eval_expr("context.count.isIpv4()"),
            Err(EvalError::TypeError { expected: "ip", .. })
        ));
    }

    #[test]
    fn test_decimal_methods() {
        assert_eq!(
            eval_ok("context.score.lessThan(decimal(\"3.0\"))"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("context.score.lessThanOrEqual(decimal(\"2.5\"))"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("context.score.greaterThan(decimal(\"3.0\"))"),
            Value::Bool(false)
        );
        assert_eq!(
            eval_ok("context.score.greaterThanOrEqual(decimal(\"2.5\"))"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_ok("decimal(\"2.50\") == decimal(\"2.5\")"),
            Value::Bool(true)
        );
        assert!(matches!(
            eval_expr("context.count.lessThan(decimal(\"1.0\"))"),
            Err(EvalError::TypeError { expected: "decimal", .. })
        ));
    }

    #[test]
    fn test_cross_type_equality_is_false_not_error() {
        assert_eq!(eval_ok("1 == \"1\""), Value::Bool(false));
        assert_eq!(eval_ok("true != 1"), Value::Bool(true));
    }

    #[test]
    fn test_compile_policy_scope_lowering() {
        let set = PolicySet::parse(
            "permit (\n    principal is User in Group::\"admins\",\n    action in [Action::\"view\", Action::\"edit\"],\n    resource == Document::\"doc1\"\n)\nwhen { context.mfa }\nunless { context.count > 10 };",
        )
        .unwrap();
        let condition = compile_policy(&set[0]);
        let entities = fixture_entities();
        let request = fixture_request();
        assert_eq!(
            Evaluator::new(&entities, &request).eval(&condition).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_compile_policy_empty_scope_is_true() {
        let set = PolicySet::parse("permit ( principal, action, resource );").unwrap();
        assert_eq!(compile_policy(&set[0]), Expr::Lit(Value::Bool(true)));
    }

    #[test]
    fn test_compile_policy_unless_negates() {
        let set = PolicySet::parse(
            "permit ( principal, action, resource )\nunless { context.mfa };",
        )
        .unwrap();
        let condition = compile_policy(&set[0]);
        let entities = fixture_entities();
        let request = fixture_request();
        // mfa is true in the fixture, so the unless knocks the policy out.
        assert_eq!(
            Evaluator::new(&entities, &request).eval(&condition).unwrap(),
            Value::Bool(false)
        );
    }
}
