use super::ObjectModel;
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use crate::relations::RelationValue;
use remote_client::AttrValue;

const ID_KEY: &str = "id";
const ACL_KEY: &str = "acl";

/// Result of [`ObjectModel::get`]
#[derive(Debug, Clone, Copy)]
pub enum Attribute<'a> {
    Id(Option<&'a str>),
    Relation(&'a RelationValue),
    Value(Option<&'a AttrValue>),
}

impl<'a> Attribute<'a> {
    pub fn as_id(&self) -> Option<&'a str> {
        match self {
            Attribute::Id(id) => *id,
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&'a RelationValue> {
        match self {
            Attribute::Relation(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&'a AttrValue> {
        match self {
            Attribute::Value(value) => *value,
            _ => None,
        }
    }
}

fn as_items(value: AttrValue) -> Vec<AttrValue> {
    match value {
        AttrValue::Array(items) => items,
        single => vec![single],
    }
}

impl<E: Entity> ObjectModel<E> {
    /// `id`, a declared relation, or a plain attribute, in that order
    pub async fn get(&mut self, key: &str) -> ObjectModelResult<Attribute<'_>> {
        if key == ID_KEY {
            return Ok(Attribute::Id(self.object.object_id()));
        }
        if self.is_relation(key) {
            return Ok(match self.relation_value(key).await? {
                Some(value) => Attribute::Relation(value),
                None => Attribute::Value(None),
            });
        }
        Ok(Attribute::Value(self.object.get(key)))
    }

    /// Plain attribute, never a relation
    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.object.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        (key == ID_KEY && self.object.object_id().is_some())
            || self.object.has(key)
            || self.relations.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        match value.into() {
            AttrValue::Array(items) => self.object.set_array(key, items),
            AttrValue::Object(map) => self.object.set_associative_array(key, map),
            AttrValue::Acl(acl) if key == ACL_KEY => self.object.set_acl(acl),
            other => self.object.set(key, other),
        }
        self
    }

    pub fn fill<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        for (key, value) in data {
            self.set(key.as_ref(), value);
        }
        self
    }

    pub fn remove_key(&mut self, key: &str) -> &mut Self {
        self.object.delete(key);
        self
    }

    pub fn increment(&mut self, key: &str, amount: i64) -> &mut Self {
        self.object.increment(key, amount);
        self
    }

    pub fn decrement(&mut self, key: &str, amount: i64) -> &mut Self {
        self.increment(key, amount.saturating_neg())
    }

    /// Append to an array attribute; a single value is appended as one item
    pub fn add(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.object.add(key, as_items(value.into()));
        self
    }

    /// Like [`add`](Self::add), skipping items already present
    pub fn add_unique(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.object.add_unique(key, as_items(value.into()));
        self
    }

    pub fn remove(&mut self, key: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.object.remove(key, as_items(value.into()));
        self
    }
}
