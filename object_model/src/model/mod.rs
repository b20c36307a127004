//! Entity models
//!
//! [`ObjectModel`] wraps one [`RemoteObject`] of an entity's class. Attribute
//! writes are staged on the remote object and flushed by `save`; relation
//! results are resolved on first access and kept until explicitly cleared.

mod attributes;
mod persistence;
mod serialize;
mod user;

pub use attributes::Attribute;

use crate::context::ModelContext;
use crate::entity::Entity;
use crate::errors::{ObjectModelError, ObjectModelResult};
use crate::relations::RelationValue;
use chrono::{DateTime, Utc};
use remote_client::{AttrValue, RemoteObject};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

pub struct ObjectModel<E: Entity> {
    object: RemoteObject,
    context: ModelContext,
    fetched: bool,
    relations: HashMap<String, RelationValue>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> ObjectModel<E> {
    /// A fresh, unsaved model using the context's privilege flag
    pub fn new(context: &ModelContext) -> Self {
        Self::from_remote(RemoteObject::new(E::CLASS_NAME), context)
    }

    /// A fresh model filled with `data`
    pub fn with_data<I, K, V>(context: &ModelContext, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let mut model = Self::new(context);
        model.fill(data);
        model
    }

    /// Wrap an existing remote object
    pub fn from_remote(object: RemoteObject, context: &ModelContext) -> Self {
        let fetched = object.is_data_available();
        Self {
            object,
            context: context.clone(),
            fetched,
            relations: HashMap::new(),
            _entity: PhantomData,
        }
    }

    /// A reference to a stored object; its data is loaded by `fetch`
    pub fn pointer(context: &ModelContext, object_id: &str) -> Self {
        Self::from_remote(RemoteObject::pointer(E::CLASS_NAME, object_id), context)
    }

    /// Build from JSON: `null` gives a fresh model, a `__type` object of this
    /// entity's class is wrapped as is, any other mapping fills a fresh model.
    pub fn from_value(context: &ModelContext, value: &Value) -> ObjectModelResult<Self> {
        let map = match value {
            Value::Null => return Ok(Self::new(context)),
            Value::Object(map) => map,
            other => {
                return Err(ObjectModelError::MalformedArgument(format!(
                    "{} can only be built from an object or a mapping, got {}",
                    E::CLASS_NAME,
                    other
                )))
            }
        };

        if map.contains_key("__type") {
            let object = match AttrValue::from_json(value)? {
                AttrValue::Pointer(object) if object.class_name() == E::CLASS_NAME => *object,
                decoded => {
                    return Err(ObjectModelError::MalformedArgument(format!(
                        "expected a {} object, got {}",
                        E::CLASS_NAME,
                        describe(&decoded)
                    )))
                }
            };
            return Ok(Self::from_remote(object, context));
        }

        let mut model = Self::new(context);
        for (key, value) in map {
            model.set(key, AttrValue::from_json(value)?);
        }
        Ok(model)
    }

    pub fn id(&self) -> Option<&str> {
        self.object.object_id()
    }

    pub fn class_name(&self) -> &'static str {
        E::CLASS_NAME
    }

    pub fn created_at(&self) -> Option<&DateTime<Utc>> {
        self.object.created_at()
    }

    pub fn updated_at(&self) -> Option<&DateTime<Utc>> {
        self.object.updated_at()
    }

    /// The wrapped remote object
    pub fn remote(&self) -> &RemoteObject {
        &self.object
    }

    pub fn remote_mut(&mut self) -> &mut RemoteObject {
        &mut self.object
    }

    pub fn into_remote(self) -> RemoteObject {
        self.object
    }

    /// Context carrying this instance's privilege flag
    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn uses_master_key(&self) -> bool {
        self.context.use_master_key()
    }

    pub fn use_master_key(&mut self, use_master_key: bool) -> &mut Self {
        self.context.set_use_master_key(use_master_key);
        self
    }

    pub fn has_been_fetched(&self) -> bool {
        self.fetched
    }

    /// True for names declared in the entity's relation registry
    pub fn is_relation(&self, name: &str) -> bool {
        E::relation(name).is_some()
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Cached result of a relation, without resolving it
    pub fn loaded_relation(&self, name: &str) -> Option<&RelationValue> {
        self.relations.get(name)
    }

    pub fn set_relation(&mut self, name: &str, value: RelationValue) -> &mut Self {
        self.relations.insert(name.to_string(), value);
        self
    }

    /// Drop one cached relation result so the next access resolves it again
    pub fn forget_relation(&mut self, name: &str) -> &mut Self {
        self.relations.remove(name);
        self
    }

    pub fn clear_relations(&mut self) -> &mut Self {
        self.relations.clear();
        self
    }

    pub(crate) fn loaded_relations(&self) -> &HashMap<String, RelationValue> {
        &self.relations
    }

    /// Resolve a declared relation, using the cached result when present.
    ///
    /// Undeclared names give `None`.
    pub async fn relation_value(&mut self, name: &str) -> ObjectModelResult<Option<&RelationValue>> {
        if !self.relations.contains_key(name) {
            let Some(def) = E::relation(name) else {
                return Ok(None);
            };
            let factory = def.factory;
            tracing::debug!(model = E::CLASS_NAME, relation = name, "Resolving relation");
            let value = {
                let mut relation = factory(self);
                relation.get_results().await?
            };
            self.relations.insert(name.to_string(), value);
        }
        Ok(self.relations.get(name))
    }
}

fn describe(value: &AttrValue) -> String {
    match value {
        AttrValue::Pointer(object) => format!("a {} object", object.class_name()),
        other => other.type_name().to_string(),
    }
}

impl<E: Entity> Clone for ObjectModel<E> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            context: self.context.clone(),
            fetched: self.fetched,
            relations: self.relations.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for ObjectModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectModel")
            .field("class_name", &E::CLASS_NAME)
            .field("object_id", &self.object.object_id())
            .field("attributes", self.object.all_keys())
            .field("use_master_key", &self.uses_master_key())
            .field("fetched", &self.fetched)
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E: Entity> From<&ObjectModel<E>> for AttrValue {
    fn from(model: &ObjectModel<E>) -> Self {
        AttrValue::Pointer(Box::new(model.object.clone()))
    }
}

impl<E: Entity> From<ObjectModel<E>> for AttrValue {
    fn from(model: ObjectModel<E>) -> Self {
        AttrValue::Pointer(Box::new(model.object))
    }
}
