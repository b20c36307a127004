//! Staged field operations
//!
//! Mutations on a [`RemoteObject`](crate::RemoteObject) are recorded as
//! operations and flushed on save. Each operation can also be applied locally
//! so that reads see the estimated value before the round-trip.

use crate::value::AttrValue;
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperation {
    Set(AttrValue),
    Delete,
    Increment(i64),
    Add(Vec<AttrValue>),
    AddUnique(Vec<AttrValue>),
    Remove(Vec<AttrValue>),
}

impl FieldOperation {
    /// Estimated value of the field after this operation
    pub fn apply(&self, current: Option<&AttrValue>) -> Option<AttrValue> {
        match self {
            FieldOperation::Set(value) => Some(value.clone()),
            FieldOperation::Delete => None,
            FieldOperation::Increment(amount) => Some(increment_value(current, *amount)),
            FieldOperation::Add(items) => {
                let mut array = current_array(current);
                array.extend(items.iter().cloned());
                Some(AttrValue::Array(array))
            }
            FieldOperation::AddUnique(items) => {
                let mut array = current_array(current);
                for item in items {
                    if !array.contains(item) {
                        array.push(item.clone());
                    }
                }
                Some(AttrValue::Array(array))
            }
            FieldOperation::Remove(items) => {
                let mut array = current_array(current);
                array.retain(|existing| !items.contains(existing));
                Some(AttrValue::Array(array))
            }
        }
    }

    /// Combine an already staged operation with a newer one on the same field.
    ///
    /// `estimated` is the field value after both operations were applied; it
    /// is used whenever the two kinds cannot be expressed as one operation.
    pub fn merge(self, next: FieldOperation, estimated: Option<&AttrValue>) -> FieldOperation {
        match (self, next) {
            (_, FieldOperation::Set(value)) => FieldOperation::Set(value),
            (_, FieldOperation::Delete) => FieldOperation::Delete,
            (FieldOperation::Increment(a), FieldOperation::Increment(b)) => match a.checked_add(b) {
                Some(amount) => FieldOperation::Increment(amount),
                None => match estimated {
                    Some(value) => FieldOperation::Set(value.clone()),
                    None => FieldOperation::Delete,
                },
            },
            (FieldOperation::Add(mut a), FieldOperation::Add(b)) => {
                a.extend(b);
                FieldOperation::Add(a)
            }
            (FieldOperation::AddUnique(mut a), FieldOperation::AddUnique(b)) => {
                for item in b {
                    if !a.contains(&item) {
                        a.push(item);
                    }
                }
                FieldOperation::AddUnique(a)
            }
            (FieldOperation::Remove(mut a), FieldOperation::Remove(b)) => {
                a.extend(b);
                FieldOperation::Remove(a)
            }
            _ => match estimated {
                Some(value) => FieldOperation::Set(value.clone()),
                None => FieldOperation::Delete,
            },
        }
    }

    /// Wire encoding
    pub fn encode(&self) -> Value {
        match self {
            FieldOperation::Set(value) => value.encode(),
            FieldOperation::Delete => op_json("Delete", None),
            FieldOperation::Increment(amount) => {
                op_json("Increment", Some(("amount", Value::from(*amount))))
            }
            FieldOperation::Add(items) => op_json("Add", Some(("objects", encode_all(items)))),
            FieldOperation::AddUnique(items) => {
                op_json("AddUnique", Some(("objects", encode_all(items))))
            }
            FieldOperation::Remove(items) => {
                op_json("Remove", Some(("objects", encode_all(items))))
            }
        }
    }
}

fn op_json(name: &str, argument: Option<(&str, Value)>) -> Value {
    let mut map = Map::new();
    map.insert("__op".to_string(), Value::from(name));
    if let Some((key, value)) = argument {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

fn encode_all(items: &[AttrValue]) -> Value {
    Value::Array(items.iter().map(AttrValue::encode).collect())
}

fn current_array(current: Option<&AttrValue>) -> Vec<AttrValue> {
    current
        .and_then(AttrValue::as_array)
        .cloned()
        .unwrap_or_default()
}

fn increment_value(current: Option<&AttrValue>, amount: i64) -> AttrValue {
    match current {
        Some(AttrValue::Number(n)) => match n.as_i64().and_then(|i| i.checked_add(amount)) {
            Some(sum) => AttrValue::Number(Number::from(sum)),
            // out of i64 range: continue in floating point
            None => AttrValue::from(n.as_f64().unwrap_or(0.0) + amount as f64),
        },
        _ => AttrValue::Number(Number::from(amount)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_increment_merges_and_estimates() {
        let op = FieldOperation::Increment(2).merge(FieldOperation::Increment(-3), None);
        assert_eq!(op, FieldOperation::Increment(-1));
        assert_eq!(op.apply(Some(&AttrValue::from(10))), Some(AttrValue::from(9)));
        assert_eq!(op.apply(None), Some(AttrValue::from(-1)));
    }

    #[test]
    fn test_increment_past_i64_range_falls_back_to_float() {
        let current = AttrValue::from(i64::MAX);
        let estimated = FieldOperation::Increment(1).apply(Some(&current));
        assert_eq!(estimated, Some(AttrValue::from(i64::MAX as f64 + 1.0)));

        let estimated = AttrValue::from(-1.0);
        let op = FieldOperation::Increment(i64::MAX)
            .merge(FieldOperation::Increment(i64::MAX), Some(&estimated));
        assert_eq!(op, FieldOperation::Set(estimated));
    }

    #[test]
    fn test_add_unique_skips_existing_members() {
        let current = AttrValue::from(vec!["a", "b"]);
        let op = FieldOperation::AddUnique(vec!["b".into(), "c".into()]);
        assert_eq!(op.apply(Some(&current)), Some(AttrValue::from(vec!["a", "b", "c"])));
    }

    #[test]
    fn test_mixed_kinds_collapse_to_set() {
        let estimated = AttrValue::from(vec!["x"]);
        let op = FieldOperation::Add(vec!["x".into()]).merge(
            FieldOperation::Remove(vec!["y".into()]),
            Some(&estimated),
        );
        assert_eq!(op, FieldOperation::Set(estimated));
    }

    #[test]
    fn test_encoding() {
        assert_eq!(FieldOperation::Delete.encode(), json!({"__op": "Delete"}));
        assert_eq!(
            FieldOperation::Increment(5).encode(),
            json!({"__op": "Increment", "amount": 5})
        );
        assert_eq!(
            FieldOperation::AddUnique(vec![1.into()]).encode(),
            json!({"__op": "AddUnique", "objects": [1]})
        );
    }
}
