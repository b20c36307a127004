//! Remote query builder
//!
//! Builds the REST `where` document for one class. Constraint methods take
//! `&mut self` and return it for chaining; execution goes through an
//! [`ObjectStore`].

use crate::errors::{ClientError, ClientResult};
use crate::object::RemoteObject;
use crate::store::{JsonMap, ObjectStore, QueryParams};
use crate::value::AttrValue;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteQuery {
    class_name: String,
    where_: JsonMap,
    order: Vec<String>,
    limit: Option<usize>,
    skip: Option<usize>,
    keys: Vec<String>,
    includes: Vec<String>,
}

impl RemoteQuery {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            where_: JsonMap::new(),
            order: Vec::new(),
            limit: None,
            skip: None,
            keys: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Disjunction of several queries on the same class
    pub fn or_queries(queries: Vec<RemoteQuery>) -> ClientResult<Self> {
        let first = queries
            .first()
            .ok_or_else(|| ClientError::InvalidQuery("$or needs at least one query".into()))?;
        let class_name = first.class_name.clone();

        let mut branches = Vec::with_capacity(queries.len());
        for query in &queries {
            if query.class_name != class_name {
                return Err(ClientError::InvalidQuery(format!(
                    "all $or queries must be for the same class, got {} and {}",
                    class_name, query.class_name
                )));
            }
            branches.push(Value::Object(query.where_.clone()));
        }

        let mut query = Self::new(class_name);
        query.where_.insert("$or".to_string(), Value::Array(branches));
        Ok(query)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The `where` document built so far
    pub fn where_json(&self) -> &JsonMap {
        &self.where_
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn selected_keys(&self) -> &[String] {
        &self.keys
    }

    fn add_condition(&mut self, key: &str, condition: &str, value: Value) -> &mut Self {
        let entry = self
            .where_
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        // an earlier equality constraint is replaced by the operator form
        if !entry.is_object() || is_typed(entry) {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(condition.to_string(), value);
        }
        self
    }

    pub fn equal_to(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.where_.insert(key.to_string(), value.into().encode());
        self
    }

    pub fn not_equal_to(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.add_condition(key, "$ne", value.into().encode())
    }

    pub fn greater_than(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.add_condition(key, "$gt", value.into().encode())
    }

    pub fn greater_than_or_equal_to(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.add_condition(key, "$gte", value.into().encode())
    }

    pub fn less_than(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.add_condition(key, "$lt", value.into().encode())
    }

    pub fn less_than_or_equal_to(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.add_condition(key, "$lte", value.into().encode())
    }

    pub fn contained_in(&mut self, key: &str, values: Vec<AttrValue>) -> &mut Self {
        self.add_condition(key, "$in", encode_list(&values))
    }

    pub fn not_contained_in(&mut self, key: &str, values: Vec<AttrValue>) -> &mut Self {
        self.add_condition(key, "$nin", encode_list(&values))
    }

    pub fn contains_all(&mut self, key: &str, values: Vec<AttrValue>) -> &mut Self {
        self.add_condition(key, "$all", encode_list(&values))
    }

    pub fn exists(&mut self, key: &str) -> &mut Self {
        self.add_condition(key, "$exists", Value::Bool(true))
    }

    pub fn does_not_exist(&mut self, key: &str) -> &mut Self {
        self.add_condition(key, "$exists", Value::Bool(false))
    }

    pub fn starts_with(&mut self, key: &str, prefix: &str) -> &mut Self {
        self.add_condition(key, "$regex", Value::from(format!("^{}", quote(prefix))))
    }

    pub fn ends_with(&mut self, key: &str, suffix: &str) -> &mut Self {
        self.add_condition(key, "$regex", Value::from(format!("{}$", quote(suffix))))
    }

    pub fn contains(&mut self, key: &str, needle: &str) -> &mut Self {
        self.add_condition(key, "$regex", Value::from(quote(needle)))
    }

    pub fn matches_query(&mut self, key: &str, query: &RemoteQuery) -> &mut Self {
        self.add_condition(key, "$inQuery", query.sub_query_json())
    }

    pub fn does_not_match_query(&mut self, key: &str, query: &RemoteQuery) -> &mut Self {
        self.add_condition(key, "$notInQuery", query.sub_query_json())
    }

    pub fn matches_key_in_query(&mut self, key: &str, query_key: &str, query: &RemoteQuery) -> &mut Self {
        let select = select_json(query_key, query);
        self.add_condition(key, "$select", select)
    }

    pub fn does_not_match_key_in_query(
        &mut self,
        key: &str,
        query_key: &str,
        query: &RemoteQuery,
    ) -> &mut Self {
        let select = select_json(query_key, query);
        self.add_condition(key, "$dontSelect", select)
    }

    /// Sort ascending by `key`, replacing any previous order
    pub fn ascending(&mut self, key: &str) -> &mut Self {
        self.order = vec![key.to_string()];
        self
    }

    /// Sort descending by `key`, replacing any previous order
    pub fn descending(&mut self, key: &str) -> &mut Self {
        self.order = vec![format!("-{}", key)];
        self
    }

    pub fn add_ascending(&mut self, key: &str) -> &mut Self {
        self.order.push(key.to_string());
        self
    }

    pub fn add_descending(&mut self, key: &str) -> &mut Self {
        self.order.push(format!("-{}", key));
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(&mut self, skip: usize) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    /// Restrict the returned attributes
    pub fn select<S: AsRef<str>>(&mut self, keys: &[S]) -> &mut Self {
        for key in keys {
            let key = key.as_ref().to_string();
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
        self
    }

    /// Return the object behind `key` instead of a pointer
    pub fn include_key<S: AsRef<str>>(&mut self, keys: &[S]) -> &mut Self {
        for key in keys {
            let key = key.as_ref().to_string();
            if !self.includes.contains(&key) {
                self.includes.push(key);
            }
        }
        self
    }

    fn sub_query_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("where".to_string(), Value::Object(self.where_.clone()));
        map.insert("className".to_string(), Value::from(self.class_name.clone()));
        Value::Object(map)
    }

    pub fn to_params(&self) -> QueryParams {
        QueryParams {
            where_: self.where_.clone(),
            order: self.order.clone(),
            limit: self.limit,
            skip: self.skip,
            keys: self.keys.clone(),
            include: self.includes.clone(),
        }
    }

    pub async fn find(&self, store: &dyn ObjectStore, use_master_key: bool) -> ClientResult<Vec<RemoteObject>> {
        crate::trace_log!("Running query on {}: {:?}", self.class_name, self.where_);
        let rows = store
            .find(&self.class_name, &self.to_params(), use_master_key)
            .await?;
        rows.iter()
            .map(|row| RemoteObject::from_json(self.class_name.clone(), row))
            .collect()
    }

    /// First matching object, if any
    pub async fn first(&self, store: &dyn ObjectStore, use_master_key: bool) -> ClientResult<Option<RemoteObject>> {
        let mut params = self.to_params();
        params.limit = Some(1);
        crate::trace_log!("Running first() on {}: {:?}", self.class_name, self.where_);
        let rows = store.find(&self.class_name, &params, use_master_key).await?;
        rows.first()
            .map(|row| RemoteObject::from_json(self.class_name.clone(), row))
            .transpose()
    }

    pub async fn count(&self, store: &dyn ObjectStore, use_master_key: bool) -> ClientResult<u64> {
        let mut params = self.to_params();
        params.limit = None;
        params.skip = None;
        store.count(&self.class_name, &params, use_master_key).await
    }
}

fn encode_list(values: &[AttrValue]) -> Value {
    Value::Array(values.iter().map(AttrValue::encode).collect())
}

fn select_json(query_key: &str, query: &RemoteQuery) -> Value {
    let mut inner = Map::new();
    inner.insert("className".to_string(), Value::from(query.class_name.clone()));
    inner.insert("where".to_string(), Value::Object(query.where_.clone()));

    let mut map = Map::new();
    map.insert("query".to_string(), Value::Object(inner));
    map.insert("key".to_string(), Value::from(query_key));
    Value::Object(map)
}

/// Literal regex block
fn quote(text: &str) -> String {
    format!("\\Q{}\\E", text.replace("\\E", "\\E\\\\E\\Q"))
}

fn is_typed(value: &Value) -> bool {
    value.get("__type").is_some()
}
