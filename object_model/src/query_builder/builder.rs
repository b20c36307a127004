//! Entity query builder
//!
//! Translates ORM-style filters into a [`RemoteQuery`] for the entity's class
//! and wraps results back into [`ObjectModel`]s.

use super::keys::IntoKeys;
use super::operator::Operator;
use super::or_query::{AsRemoteQuery, OrOperand};
use crate::context::ModelContext;
use crate::entity::Entity;
use crate::errors::{ObjectModelError, ObjectModelResult};
use crate::model::ObjectModel;
use remote_client::{AttrValue, RemoteObject, RemoteQuery};
use std::fmt;
use std::marker::PhantomData;

const OBJECT_ID_KEY: &str = "objectId";

/// Query builder bound to one entity type
pub struct Query<E: Entity> {
    remote: RemoteQuery,
    context: ModelContext,
    include_keys: Vec<String>,
    _entity: PhantomData<fn() -> E>,
}

fn as_items(value: AttrValue) -> Vec<AttrValue> {
    match value {
        AttrValue::Array(items) => items,
        single => vec![single],
    }
}

impl<E: Entity> Query<E> {
    pub fn new(context: ModelContext) -> Self {
        Self {
            remote: RemoteQuery::new(E::CLASS_NAME),
            context,
            include_keys: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// A query with the same context and no constraints
    pub fn fresh(&self) -> Self {
        Self::new(self.context.clone())
    }

    pub fn class_name(&self) -> &'static str {
        E::CLASS_NAME
    }

    pub fn remote(&self) -> &RemoteQuery {
        &self.remote
    }

    pub fn into_remote(self) -> RemoteQuery {
        self.remote
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn include_keys(&self) -> &[String] {
        &self.include_keys
    }

    pub fn uses_master_key(&self) -> bool {
        self.context.use_master_key()
    }

    pub fn use_master_key(mut self, use_master_key: bool) -> Self {
        self.context.set_use_master_key(use_master_key);
        self
    }

    /// Equality filter
    pub fn where_eq(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.remote.equal_to(key, value);
        self
    }

    /// Filter with an operator token: `=`, `!=`, `>`, `>=`, `<`, `<=` or `in`
    pub fn where_op(self, key: &str, operator: &str, value: impl Into<AttrValue>) -> ObjectModelResult<Self> {
        let operator: Operator = operator.parse()?;
        Ok(self.where_operator(key, operator, value))
    }

    pub fn where_operator(self, key: &str, operator: Operator, value: impl Into<AttrValue>) -> Self {
        match operator {
            Operator::Eq => self.where_eq(key, value),
            Operator::Ne => self.not_equal_to(key, value),
            Operator::Gt => self.greater_than(key, value),
            Operator::Gte => self.greater_than_or_equal_to(key, value),
            Operator::Lt => self.less_than(key, value),
            Operator::Lte => self.less_than_or_equal_to(key, value),
            Operator::In => self.contained_in(key, value),
        }
    }

    /// Equality filter for every pair
    pub fn where_all<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        for (key, value) in data {
            self.remote.equal_to(key.as_ref(), value);
        }
        self
    }

    pub fn not_equal_to(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.remote.not_equal_to(key, value);
        self
    }

    pub fn greater_than(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.remote.greater_than(key, value);
        self
    }

    pub fn greater_than_or_equal_to(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.remote.greater_than_or_equal_to(key, value);
        self
    }

    pub fn less_than(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.remote.less_than(key, value);
        self
    }

    pub fn less_than_or_equal_to(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.remote.less_than_or_equal_to(key, value);
        self
    }

    /// Field value is one of `values`; a single value is treated as a list of one
    pub fn contained_in(mut self, key: &str, values: impl Into<AttrValue>) -> Self {
        self.remote.contained_in(key, as_items(values.into()));
        self
    }

    pub fn where_in(self, key: &str, values: impl Into<AttrValue>) -> Self {
        self.contained_in(key, values)
    }

    pub fn not_contained_in(mut self, key: &str, values: impl Into<AttrValue>) -> Self {
        self.remote.not_contained_in(key, as_items(values.into()));
        self
    }

    pub fn contains_all(mut self, key: &str, values: impl Into<AttrValue>) -> Self {
        self.remote.contains_all(key, as_items(values.into()));
        self
    }

    pub fn exists(mut self, key: &str) -> Self {
        self.remote.exists(key);
        self
    }

    pub fn where_not_exists(mut self, key: &str) -> Self {
        self.remote.does_not_exist(key);
        self
    }

    pub fn starts_with(mut self, key: &str, prefix: &str) -> Self {
        self.remote.starts_with(key, prefix);
        self
    }

    pub fn ends_with(mut self, key: &str, suffix: &str) -> Self {
        self.remote.ends_with(key, suffix);
        self
    }

    pub fn contains(mut self, key: &str, needle: &str) -> Self {
        self.remote.contains(key, needle);
        self
    }

    /// Pointer at `key` references an object matched by `query`
    pub fn matches_query(mut self, key: &str, query: &impl AsRemoteQuery) -> Self {
        self.remote.matches_query(key, query.as_remote_query());
        self
    }

    pub fn does_not_match_query(mut self, key: &str, query: &impl AsRemoteQuery) -> Self {
        self.remote.does_not_match_query(key, query.as_remote_query());
        self
    }

    /// Value at `key` equals `query_key` of some object matched by `query`
    pub fn matches_key_in_query(mut self, key: &str, query_key: &str, query: &impl AsRemoteQuery) -> Self {
        self.remote
            .matches_key_in_query(key, query_key, query.as_remote_query());
        self
    }

    pub fn does_not_match_key_in_query(
        mut self,
        key: &str,
        query_key: &str,
        query: &impl AsRemoteQuery,
    ) -> Self {
        self.remote
            .does_not_match_key_in_query(key, query_key, query.as_remote_query());
        self
    }

    /// Sort by `key`, replacing the current order
    pub fn order_by(mut self, key: &str, ascending: bool) -> Self {
        if ascending {
            self.remote.ascending(key);
        } else {
            self.remote.descending(key);
        }
        self
    }

    pub fn add_ascending(mut self, key: &str) -> Self {
        self.remote.add_ascending(key);
        self
    }

    pub fn add_descending(mut self, key: &str) -> Self {
        self.remote.add_descending(key);
        self
    }

    /// Return the objects behind these pointer keys with the results
    pub fn with(mut self, keys: impl IntoKeys) -> Self {
        for key in keys.into_keys() {
            if !self.include_keys.contains(&key) {
                self.include_keys.push(key);
            }
        }
        self.remote.include_key(&self.include_keys);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.remote.limit(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.remote.skip(skip);
        self
    }

    pub fn select(mut self, keys: impl IntoKeys) -> Self {
        self.remote.select(&keys.into_keys());
        self
    }

    /// Disjunction of this query and every operand.
    ///
    /// Builders get a fresh query with this query's context. The result is a
    /// new query carrying only the `$or`.
    pub fn or_query(self, operands: Vec<OrOperand<E>>) -> ObjectModelResult<Self> {
        let mut remotes = Vec::with_capacity(operands.len() + 1);
        let context = self.context.clone();
        remotes.push(self.remote);

        for operand in operands {
            let remote = match operand {
                OrOperand::Query(query) => query.remote,
                OrOperand::Remote(remote) => remote,
                OrOperand::Builder(build) => build(Self::new(context.clone()))?.remote,
            };
            remotes.push(remote);
        }

        let mut query = Self::new(context);
        query.remote = RemoteQuery::or_queries(remotes)?;
        Ok(query)
    }

    /// `first OR rest...`
    pub fn or_queries(first: Self, rest: Vec<OrOperand<E>>) -> ObjectModelResult<Self> {
        first.or_query(rest)
    }

    fn wrap(&self, object: RemoteObject) -> ObjectModel<E> {
        ObjectModel::from_remote(object, &self.context)
    }

    fn projected(&self, select_keys: Option<&[&str]>) -> RemoteQuery {
        let mut remote = self.remote.clone();
        if let Some(keys) = select_keys {
            remote.select(keys);
        }
        remote
    }

    pub async fn count(&self) -> ObjectModelResult<u64> {
        tracing::debug!(class = E::CLASS_NAME, "Counting objects");
        Ok(self
            .remote
            .count(self.context.store(), self.context.use_master_key())
            .await?)
    }

    /// Every match, in store order
    pub async fn get(&self, select_keys: Option<&[&str]>) -> ObjectModelResult<Vec<ObjectModel<E>>> {
        tracing::debug!(class = E::CLASS_NAME, "Executing query");
        let objects = self
            .projected(select_keys)
            .find(self.context.store(), self.context.use_master_key())
            .await?;
        Ok(objects.into_iter().map(|object| self.wrap(object)).collect())
    }

    pub async fn first(&self, select_keys: Option<&[&str]>) -> ObjectModelResult<Option<ObjectModel<E>>> {
        tracing::debug!(class = E::CLASS_NAME, "Executing query for first result");
        let object = self
            .projected(select_keys)
            .first(self.context.store(), self.context.use_master_key())
            .await?;
        Ok(object.map(|object| self.wrap(object)))
    }

    pub async fn first_or_fail(&self, select_keys: Option<&[&str]>) -> ObjectModelResult<ObjectModel<E>> {
        self.first(select_keys)
            .await?
            .ok_or_else(ObjectModelError::not_found::<E>)
    }

    /// First object equal to `data` on every key, or a fresh unsaved model
    /// filled with it
    pub async fn first_or_new<I, K, V>(&self, data: I) -> ObjectModelResult<ObjectModel<E>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let data: Vec<(String, AttrValue)> = data
            .into_iter()
            .map(|(key, value)| (key.as_ref().to_string(), value.into()))
            .collect();

        let mut query = self.clone();
        for (key, value) in &data {
            query.remote.equal_to(key, value.clone());
        }

        match query.first(None).await? {
            Some(model) => Ok(model),
            None => Ok(ObjectModel::with_data(&self.context, data)),
        }
    }

    /// Like [`first_or_new`](Self::first_or_new), saving the new model
    pub async fn first_or_create<I, K, V>(&self, data: I) -> ObjectModelResult<ObjectModel<E>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let mut model = self.first_or_new(data).await?;
        if model.id().is_none() {
            model.save().await?;
        }
        Ok(model)
    }

    pub async fn find(&self, id: &str, select_keys: Option<&[&str]>) -> ObjectModelResult<Option<ObjectModel<E>>> {
        let mut query = self.clone();
        query.remote.equal_to(OBJECT_ID_KEY, id);
        query.first(select_keys).await
    }

    pub async fn find_or_fail(&self, id: &str, select_keys: Option<&[&str]>) -> ObjectModelResult<ObjectModel<E>> {
        self.find(id, select_keys)
            .await?
            .ok_or_else(ObjectModelError::not_found::<E>)
    }

    /// The object with `id`, or a fresh unsaved model
    pub async fn find_or_new(&self, id: &str, select_keys: Option<&[&str]>) -> ObjectModelResult<ObjectModel<E>> {
        Ok(match self.find(id, select_keys).await? {
            Some(model) => model,
            None => ObjectModel::new(&self.context),
        })
    }
}

impl<E: Entity> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            context: self.context.clone(),
            include_keys: self.include_keys.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("class_name", &E::CLASS_NAME)
            .field("remote", &self.remote)
            .field("use_master_key", &self.uses_master_key())
            .field("include_keys", &self.include_keys)
            .finish()
    }
}
