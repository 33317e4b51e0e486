//! The Cedar runtime value model.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;

use crate::error::EvalError;

use super::decimal::Decimal;
use super::entity_uid::EntityUID;
use super::ipaddr::IPAddr;

/// A record value: attribute name to value. Key order is irrelevant to
/// equality; the map form makes that structural.
pub type Record = BTreeMap<String, Value>;

/// Every value a Cedar expression can evaluate to.
///
/// The variant set is closed and small, so operators dispatch with a single
/// exhaustive `match` rather than any open-world polymorphism. Values are
/// immutable once constructed.
///
/// The derived `Ord` compares by variant tag first and then structurally,
/// which is the total order `Set` canonicalization relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Bool(bool),
    Long(i64),
    String(String),
    Set(Set),
    Record(Record),
    EntityUID(EntityUID),
    IPAddr(IPAddr),
    Decimal(Decimal),
}

impl Value {
    /// Coerce to bool; the authorizer applies this to each policy's
    /// condition result.
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            v => Err(EvalError::TypeError {
                expected: "bool",
                got: v.type_name(),
            }),
        }
    }

    /// Short type name used in `type error: expected …, got …` messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Long(_) => "long",
            Value::String(_) => "string",
            Value::Set(_) => "set",
            Value::Record(_) => "record",
            Value::EntityUID(_) => "entity",
            Value::IPAddr(_) => "ip",
            Value::Decimal(_) => "decimal",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Set(s) => write!(f, "{s}"),
            Value::Record(r) => {
                write!(f, "{{")?;
                write!(
                    f,
                    "{}",
                    r.iter().map(|(k, v)| format!("\"{k}\": {v}")).join(", ")
                )?;
                write!(f, "}}")
            }
            Value::EntityUID(uid) => write!(f, "{uid}"),
            Value::IPAddr(ip) => write!(f, "{ip}"),
            Value::Decimal(d) => write!(f, "{d}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<EntityUID> for Value {
    fn from(uid: EntityUID) -> Self {
        Value::EntityUID(uid)
    }
}

/// A semantic set of values.
///
/// Construction sorts and deduplicates, so equality is order- and
/// multiplicity-insensitive for free, and iteration is deterministic.
/// Taking the input by value means later mutation of the source cannot
/// reach into the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Set(Vec<Value>);

impl Set {
    pub fn new(mut items: Vec<Value>) -> Self {
        items.sort();
        items.dedup();
        Set(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.binary_search(value).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// True iff every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Set) -> bool {
        self.iter().all(|v| other.contains(v))
    }

    /// True iff some element of `self` is in `other`.
    pub fn intersects(&self, other: &Set) -> bool {
        self.iter().any(|v| other.contains(v))
    }
}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Set::new(iter.into_iter().collect())
    }
}

impl Display for Set {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: Vec<Value>) -> Value {
        Value::Set(Set::new(items))
    }

    #[test]
    fn test_set_equality_ignores_order_and_multiplicity() {
        let a = Value::Long(1);
        let b = Value::Long(2);
        let c = Value::Long(3);
        assert_eq!(
            set(vec![a.clone(), b.clone(), c.clone()]),
            set(vec![c, b.clone(), a, b])
        );
    }

    #[test]
    fn test_set_dedup() {
        let s = Set::new(vec![Value::Long(42), Value::Long(42)]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_nested_set_equality() {
        let empty = Set::new(vec![]);
        let one_true = Set::new(vec![Value::Bool(true)]);
        let one_false = Set::new(vec![Value::Bool(false)]);
        let nested = Set::new(vec![
            Value::Set(empty.clone()),
            Value::Set(one_true.clone()),
            Value::Set(one_false.clone()),
        ]);
        let nested2 = Set::new(vec![
            Value::Set(one_false),
            Value::Set(one_true),
            Value::Set(empty),
        ]);
        assert_eq!(nested, nested2);
    }

    #[test]
    fn test_set_inequality() {
        assert_ne!(set(vec![]), set(vec![Value::Bool(false)]));
        assert_ne!(set(vec![Value::Bool(true)]), set(vec![Value::Bool(false)]));
    }

    #[test]
    fn test_set_contains_and_subset() {
        let s = Set::new(vec![Value::Long(1), Value::Long(2)]);
        assert!(s.contains(&Value::Long(1)));
        assert!(!s.contains(&Value::Long(3)));

        let sub = Set::new(vec![Value::Long(2)]);
        assert!(sub.is_subset(&s));
        assert!(!s.is_subset(&sub));
        assert!(s.intersects(&sub));
        assert!(!s.intersects(&Set::new(vec![Value::Long(9)])));
        assert!(Set::new(vec![]).is_subset(&s));
    }

    #[test]
    fn test_record_equality_ignores_insertion_order() {
        let mut r1 = Record::new();
        r1.insert("a".into(), Value::Long(1));
        r1.insert("b".into(), Value::Long(2));
        let mut r2 = Record::new();
        r2.insert("b".into(), Value::Long(2));
        r2.insert("a".into(), Value::Long(1));
        assert_eq!(Value::Record(r1), Value::Record(r2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Set::new(vec![]).to_string(), "[]");
        assert_eq!(
            Set::new(vec![Value::Bool(true), Value::Long(1)]).to_string(),
            "[true, 1]"
        );
        let mut r = Record::new();
        r.insert("k".into(), Value::Long(7));
        assert_eq!(Value::Record(r).to_string(), "{\"k\": 7}");
    }

    #[test]
    fn test_cross_variant_order_is_total() {
        let mut vals = vec![
            Value::String("z".into()),
            Value::Bool(true),
            Value::Long(-5),
            Value::EntityUID(EntityUID::new("User", "a")),
        ];
        vals.sort();
        // Tag order: Bool < Long < String < EntityUID.
        assert_eq!(vals[0], Value::Bool(true));
        assert_eq!(vals[1], Value::Long(-5));
        assert_eq!(vals[2], Value::String("z".into()));
    }
}
