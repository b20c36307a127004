//! Evaluation of `where` documents against stored rows

use crate::store::JsonMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

pub(crate) type Classes = HashMap<String, Vec<JsonMap>>;

/// True when `row` satisfies every constraint in `where_`
pub(crate) fn matches(row: &JsonMap, where_: &JsonMap, classes: &Classes) -> bool {
    where_.iter().all(|(key, constraint)| {
        if key == "$or" {
            return match constraint {
                Value::Array(branches) => branches.iter().any(|branch| match branch {
                    Value::Object(branch) => matches(row, branch, classes),
                    _ => false,
                }),
                _ => false,
            };
        }
        matches_field(row.get(key), constraint, classes)
    })
}

fn is_operator_map(constraint: &Value) -> bool {
    match constraint {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_field(field: Option<&Value>, constraint: &Value, classes: &Classes) -> bool {
    if !is_operator_map(constraint) {
        return field.map(|value| equals_or_contains(value, constraint)).unwrap_or(false);
    }

    let Value::Object(conditions) = constraint else {
        return false;
    };
    conditions
        .iter()
        .all(|(op, argument)| matches_condition(field, op, argument, classes))
}

fn matches_condition(field: Option<&Value>, op: &str, argument: &Value, classes: &Classes) -> bool {
    match op {
        "$ne" => !field.map(|v| equals_or_contains(v, argument)).unwrap_or(false),
        "$gt" => compare_field(field, argument, |o| o == Ordering::Greater),
        "$gte" => compare_field(field, argument, |o| o != Ordering::Less),
        "$lt" => compare_field(field, argument, |o| o == Ordering::Less),
        "$lte" => compare_field(field, argument, |o| o != Ordering::Greater),
        "$in" => in_list(field, argument),
        "$nin" => !in_list(field, argument),
        "$all" => match (field, argument) {
            (Some(Value::Array(items)), Value::Array(required)) => required
                .iter()
                .all(|needle| items.iter().any(|item| values_equal(item, needle))),
            _ => false,
        },
        "$exists" => {
            let present = matches!(field, Some(value) if !value.is_null());
            present == argument.as_bool().unwrap_or(true)
        }
        "$regex" => match (field, argument) {
            (Some(Value::String(text)), Value::String(pattern)) => regex_match(text, pattern),
            _ => false,
        },
        "$inQuery" => in_query(field, argument, classes),
        "$notInQuery" => !in_query(field, argument, classes),
        "$select" => in_selected(field, argument, classes),
        "$dontSelect" => !in_selected(field, argument, classes),
        // store-side options with no effect on matching
        "$options" => true,
        _ => false,
    }
}

fn equals_or_contains(value: &Value, expected: &Value) -> bool {
    if values_equal(value, expected) {
        return true;
    }
    match value {
        Value::Array(items) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        _ => false,
    }
}

/// Structural equality with pointer identity and numeric comparison
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (pointer_identity(a), pointer_identity(b)) {
        return x == y;
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        _ => a == b,
    }
}

fn pointer_identity(value: &Value) -> Option<(&str, &str)> {
    let map = value.as_object()?;
    match map.get("__type").and_then(Value::as_str) {
        Some("Pointer") | Some("Object") => Some((
            map.get("className")?.as_str()?,
            map.get("objectId")?.as_str()?,
        )),
        _ => None,
    }
}

fn date_iso(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.get("__type").and_then(Value::as_str) == Some("Date") {
        map.get("iso").and_then(Value::as_str)
    } else {
        None
    }
}

pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => match (date_iso(a), date_iso(b)) {
            (Some(x), Some(y)) => Some(x.cmp(y)),
            // timestamps are stored as bare strings, comparisons may use a Date
            (None, Some(y)) => a.as_str().map(|x| x.cmp(y)),
            (Some(x), None) => b.as_str().map(|y| x.cmp(y)),
            (None, None) => None,
        },
    }
}

fn compare_field(field: Option<&Value>, argument: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    field
        .and_then(|value| compare_values(value, argument))
        .map(accept)
        .unwrap_or(false)
}

fn in_list(field: Option<&Value>, argument: &Value) -> bool {
    let (Some(value), Value::Array(list)) = (field, argument) else {
        return false;
    };
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| list.iter().any(|candidate| values_equal(item, candidate))),
        single => list.iter().any(|candidate| values_equal(single, candidate)),
    }
}

fn regex_match(text: &str, pattern: &str) -> bool {
    let (anchored_start, rest) = match pattern.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (anchored_end, rest) = match rest.strip_suffix('$') {
        Some(rest) if !rest.ends_with('\\') => (true, rest),
        _ => (false, rest),
    };
    let literal = match rest.strip_prefix("\\Q").and_then(|r| r.strip_suffix("\\E")) {
        Some(inner) => inner.replace("\\E\\\\E\\Q", "\\E"),
        None => rest.to_string(),
    };

    match (anchored_start, anchored_end) {
        (true, true) => text == literal,
        (true, false) => text.starts_with(&literal),
        (false, true) => text.ends_with(&literal),
        (false, false) => text.contains(&literal),
    }
}

fn sub_query(argument: &Value) -> Option<(&str, &JsonMap)> {
    let class_name = argument.get("className")?.as_str()?;
    let where_ = argument.get("where")?.as_object()?;
    Some((class_name, where_))
}

fn in_query(field: Option<&Value>, argument: &Value, classes: &Classes) -> bool {
    let (Some(field), Some((class_name, where_))) = (field, sub_query(argument)) else {
        return false;
    };
    let Some(rows) = classes.get(class_name) else {
        return false;
    };

    let hit = |candidate: &Value| {
        pointer_identity(candidate)
            .filter(|(class, _)| *class == class_name)
            .map(|(_, id)| {
                rows.iter().any(|row| {
                    row.get("objectId").and_then(Value::as_str) == Some(id)
                        && matches(row, where_, classes)
                })
            })
            .unwrap_or(false)
    };

    match field {
        Value::Array(items) => items.iter().any(hit),
        single => hit(single),
    }
}

fn in_selected(field: Option<&Value>, argument: &Value, classes: &Classes) -> bool {
    let Some(field) = field else {
        return false;
    };
    let Some(key) = argument.get("key").and_then(Value::as_str) else {
        return false;
    };
    let Some((class_name, where_)) = argument.get("query").and_then(sub_query) else {
        return false;
    };

    classes
        .get(class_name)
        .map(|rows| {
            rows.iter()
                .filter(|row| matches(row, where_, classes))
                .filter_map(|row| row.get(key))
                .any(|selected| values_equal(field, selected))
        })
        .unwrap_or(false)
}

/// Sort rows by an `order` list; keys prefixed with `-` sort descending
pub(crate) fn sort_rows(rows: &mut [JsonMap], order: &[String]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in order {
            let (field, descending) = match key.strip_prefix('-') {
                Some(field) => (field, true),
                None => (key.as_str(), false),
            };
            let ordering = match (a.get(field), b.get(field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            };
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
