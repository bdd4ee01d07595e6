//! Filter-expression evaluator (spec.md §4.5), grounded on
//! `examples/original_source/src/query/codegen/filter_expression.cpp`'s
//! token/predicate set.
//!
//! `Expr` is a tree rather than a flat token list, so evaluating it by
//! recursing into children before combining them is already the "post-order
//! walk producing an operand stack" the original describes — there is no
//! separate stack object, but the evaluation order is identical.

use chrono::{DateTime, Utc};
use graphdb_core::{Cell, DictCode, Error, GraphStore, PropertyValue, Result, Tuple, TupleExt};

/// An operand value produced while evaluating an `Expr`. A superset of
/// `PropertyValue` with a `Bool` variant for predicate results.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    UInt(u64),
    Str(String),
    Time(DateTime<Utc>),
    Bool(bool),
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Int(v) => *v != 0,
            Value::UInt(v) => *v != 0,
            Value::Double(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Time(_) => true,
        }
    }
}

/// Resolves `v` to a `Value`, interning `PropertyValue::String`'s dict code
/// back to its real string via `store` (mirroring `plan::coerce_property`).
/// Not a `From` impl because that resolution needs the store in scope.
fn value_of(v: PropertyValue, store: &dyn GraphStore) -> Value {
    match v {
        PropertyValue::Null => Value::Null,
        PropertyValue::Int(i) => Value::Int(i),
        PropertyValue::Double(d) => Value::Double(d),
        PropertyValue::UInt(u) => Value::UInt(u),
        PropertyValue::Bool(b) => Value::Bool(b),
        PropertyValue::String(code) => Value::Str(store.get_string(code).unwrap_or_default()),
        PropertyValue::DateTime(dt) => Value::Time(dt),
    }
}

/// Leaves: number/string/time/property-key/function-ref tokens. Predicates:
/// `eq/le/lt/ge/gt`, `and/or`, `not` (supplementing spec.md — present in the
/// original's token set alongside the binary comparators), `in_set`
/// (supplementing spec.md — the original grammar's `within` form, needed by
/// the same membership reasoning `Projection`'s `conditional` item implies),
/// and a user-function-call node.
#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(i64),
    DoubleLit(f64),
    StringLit(String),
    TimeLit(DateTime<Utc>),
    /// Resolves to the property `key` on the entity at tuple position `pos`.
    PropertyKey { pos: usize, key: DictCode },
    Eq(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    InSet(Box<Expr>, Vec<Expr>),
    /// A user-function call; resolved by the embedder-supplied `udf` table.
    Call(String, Vec<Expr>),
}

/// A user function referenced by `Expr::Call`, resolved by name.
pub type Udf<'a> = dyn Fn(&[Value]) -> Value + 'a;

fn property_of(tuple: &Tuple, pos: usize, key: DictCode, store: &dyn GraphStore) -> Result<Value> {
    let cell = tuple.get_cell(pos).ok_or_else(|| Error::UnknownProperty {
        operator_id: -1,
        key: format!("{key}"),
    })?;
    let value = match cell {
        Cell::Node(id) => store
            .get_node_description(*id)?
            .properties
            .get(&key)
            .cloned()
            .unwrap_or(PropertyValue::Null),
        Cell::Relationship(id) => store
            .get_rship_description(*id)?
            .properties
            .get(&key)
            .cloned()
            .unwrap_or(PropertyValue::Null),
        _ => {
            return Err(Error::TypeMismatch {
                operator_id: -1,
                expected: "node or relationship".to_string(),
                found: cell.type_tag().to_string(),
            })
        }
    };
    Ok(value_of(value, store))
}

fn numeric_cmp(lhs: &Value, rhs: &Value) -> Result<std::cmp::Ordering> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(l), Some(r)) => Ok(l.partial_cmp(&r).unwrap_or(std::cmp::Ordering::Equal)),
        _ => match (lhs, rhs) {
            (Value::Str(l), Value::Str(r)) => Ok(l.cmp(r)),
            (Value::Time(l), Value::Time(r)) => Ok(l.cmp(r)),
            _ => Err(Error::TypeMismatch {
                operator_id: -1,
                expected: "comparable operands".to_string(),
                found: "mismatched types".to_string(),
            }),
        },
    }
}

fn eval_value(
    expr: &Expr,
    tuple: &Tuple,
    store: &dyn GraphStore,
    udf: &dyn Fn(&str, &[Value]) -> Value,
) -> Result<Value> {
    Ok(match expr {
        Expr::IntLit(v) => Value::Int(*v),
        Expr::DoubleLit(v) => Value::Double(*v),
        Expr::StringLit(v) => Value::Str(v.clone()),
        Expr::TimeLit(v) => Value::Time(*v),
        Expr::PropertyKey { pos, key } => property_of(tuple, *pos, *key, store)?,
        Expr::Eq(l, r) => {
            let (lv, rv) = (eval_value(l, tuple, store, udf)?, eval_value(r, tuple, store, udf)?);
            Value::Bool(lv == rv || numeric_cmp(&lv, &rv).map(|o| o.is_eq()).unwrap_or(false))
        }
        Expr::Le(l, r) => Value::Bool(
            numeric_cmp(&eval_value(l, tuple, store, udf)?, &eval_value(r, tuple, store, udf)?)?.is_le(),
        ),
        Expr::Lt(l, r) => Value::Bool(
            numeric_cmp(&eval_value(l, tuple, store, udf)?, &eval_value(r, tuple, store, udf)?)?.is_lt(),
        ),
        Expr::Ge(l, r) => Value::Bool(
            numeric_cmp(&eval_value(l, tuple, store, udf)?, &eval_value(r, tuple, store, udf)?)?.is_ge(),
        ),
        Expr::Gt(l, r) => Value::Bool(
            numeric_cmp(&eval_value(l, tuple, store, udf)?, &eval_value(r, tuple, store, udf)?)?.is_gt(),
        ),
        Expr::And(l, r) => Value::Bool(
            eval_value(l, tuple, store, udf)?.truthy() && eval_value(r, tuple, store, udf)?.truthy(),
        ),
        Expr::Or(l, r) => Value::Bool(
            eval_value(l, tuple, store, udf)?.truthy() || eval_value(r, tuple, store, udf)?.truthy(),
        ),
        Expr::Not(e) => Value::Bool(!eval_value(e, tuple, store, udf)?.truthy()),
        Expr::InSet(needle, set) => {
            let needle_v = eval_value(needle, tuple, store, udf)?;
            let mut found = false;
            for item in set {
                if eval_value(item, tuple, store, udf)? == needle_v {
                    found = true;
                    break;
                }
            }
            Value::Bool(found)
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push(eval_value(a, tuple, store, udf)?);
            }
            udf(name, &values)
        }
    })
}

/// Evaluates `expr` over `tuple`, returning the resulting boolean (spec.md
/// §4.5). Non-boolean results are coerced via [`Value::truthy`].
pub fn eval(expr: &Expr, tuple: &Tuple, store: &dyn GraphStore) -> Result<bool> {
    eval_with_udf(expr, tuple, store, &|_, _| Value::Bool(false))
}

pub fn eval_with_udf(
    expr: &Expr,
    tuple: &Tuple,
    store: &dyn GraphStore,
    udf: &dyn Fn(&str, &[Value]) -> Value,
) -> Result<bool> {
    Ok(eval_value(expr, tuple, store, udf)?.truthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdb_core::TxnFlag;
    use graphdb_txn::{InMemoryTxnManager, MemoryGraphStore, GENESIS};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn comparators_and_boolean_combinators() {
        let store = MemoryGraphStore::new(Arc::new(InMemoryTxnManager::new()));
        let p = store.get_code("Person");
        let age = store.get_code("age");
        let mut props = HashMap::new();
        props.insert(age, PropertyValue::Int(30));
        let n = store.add_node(p, props, TxnFlag::Committed, GENESIS).unwrap();
        let tuple: Tuple = vec![Cell::Node(n)];

        let expr = Expr::And(
            Box::new(Expr::Ge(Box::new(Expr::PropertyKey { pos: 0, key: age }), Box::new(Expr::IntLit(18)))),
            Box::new(Expr::Lt(Box::new(Expr::PropertyKey { pos: 0, key: age }), Box::new(Expr::IntLit(65)))),
        );
        assert!(eval(&expr, &tuple, &store).unwrap());

        let blocked = Expr::Not(Box::new(Expr::Eq(
            Box::new(Expr::PropertyKey { pos: 0, key: age }),
            Box::new(Expr::IntLit(30)),
        )));
        assert!(!eval(&blocked, &tuple, &store).unwrap());
    }

    #[test]
    fn in_set_checks_membership() {
        let store = MemoryGraphStore::new(Arc::new(InMemoryTxnManager::new()));
        let tuple: Tuple = vec![];
        let expr = Expr::InSet(
            Box::new(Expr::IntLit(2)),
            vec![Expr::IntLit(1), Expr::IntLit(2), Expr::IntLit(3)],
        );
        assert!(eval(&expr, &tuple, &store).unwrap());
    }

    #[test]
    fn missing_property_resolves_to_null_not_error() {
        let store = MemoryGraphStore::new(Arc::new(InMemoryTxnManager::new()));
        let p = store.get_code("Person");
        let missing_key = store.get_code("nickname");
        let n = store.add_node(p, HashMap::new(), TxnFlag::Committed, GENESIS).unwrap();
        let tuple: Tuple = vec![Cell::Node(n)];
        let expr = Expr::Eq(
            Box::new(Expr::PropertyKey { pos: 0, key: missing_key }),
            Box::new(Expr::StringLit("x".into())),
        );
        assert!(!eval(&expr, &tuple, &store).unwrap());
    }
}
