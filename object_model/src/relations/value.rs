//! Resolved relation results
//!
//! Results of different relations on one parent have different entity types,
//! so the cache holds them type-erased behind [`Model`] and hands them back
//! through typed downcasts.

use crate::entity::Entity;
use crate::model::ObjectModel;
use remote_client::{JsonMap, RemoteObject};
use serde_json::Value;
use std::any::Any;
use std::fmt::Debug;

/// Object-safe view of an [`ObjectModel`] of any entity type
pub trait Model: Send + Sync + Debug + Any {
    fn class_name(&self) -> &str;
    fn object_id(&self) -> Option<&str>;
    fn remote_object(&self) -> &RemoteObject;
    fn to_array(&self) -> JsonMap;
    fn clone_box(&self) -> Box<dyn Model>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Entity> Model for ObjectModel<E> {
    fn class_name(&self) -> &str {
        self.remote().class_name()
    }

    fn object_id(&self) -> Option<&str> {
        self.id()
    }

    fn remote_object(&self) -> &RemoteObject {
        self.remote()
    }

    fn to_array(&self) -> JsonMap {
        ObjectModel::to_array(self)
    }

    fn clone_box(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn Model> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone)]
pub enum RelationValue {
    /// Nothing to resolve, e.g. an unset pointer
    Empty,
    One(Box<dyn Model>),
    Many(Vec<Box<dyn Model>>),
}

impl RelationValue {
    pub fn one_of<T: Entity>(model: ObjectModel<T>) -> Self {
        RelationValue::One(Box::new(model))
    }

    pub fn many_of<T: Entity>(models: Vec<ObjectModel<T>>) -> Self {
        RelationValue::Many(
            models
                .into_iter()
                .map(|model| Box::new(model) as Box<dyn Model>)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RelationValue::Empty => true,
            RelationValue::One(_) => false,
            RelationValue::Many(models) => models.is_empty(),
        }
    }

    /// Number of related models
    pub fn len(&self) -> usize {
        match self {
            RelationValue::Empty => 0,
            RelationValue::One(_) => 1,
            RelationValue::Many(models) => models.len(),
        }
    }

    /// The single related model, if it is a `T`
    pub fn one<T: Entity>(&self) -> Option<&ObjectModel<T>> {
        match self {
            RelationValue::One(model) => model.as_any().downcast_ref(),
            _ => None,
        }
    }

    pub fn one_mut<T: Entity>(&mut self) -> Option<&mut ObjectModel<T>> {
        match self {
            RelationValue::One(model) => model.as_any_mut().downcast_mut(),
            _ => None,
        }
    }

    /// Every related model that is a `T`, in result order
    pub fn many<T: Entity>(&self) -> Vec<&ObjectModel<T>> {
        match self {
            RelationValue::Many(models) => models
                .iter()
                .filter_map(|model| model.as_any().downcast_ref())
                .collect(),
            RelationValue::One(model) => model.as_any().downcast_ref().into_iter().collect(),
            RelationValue::Empty => Vec::new(),
        }
    }

    pub fn models(&self) -> Vec<&dyn Model> {
        match self {
            RelationValue::Empty => Vec::new(),
            RelationValue::One(model) => vec![model.as_ref()],
            RelationValue::Many(models) => models.iter().map(|model| model.as_ref()).collect(),
        }
    }

    /// Plain form used when the parent is serialized
    pub fn to_array_value(&self) -> Value {
        match self {
            RelationValue::Empty => Value::Null,
            RelationValue::One(model) => Value::Object(model.to_array()),
            RelationValue::Many(models) => Value::Array(
                models
                    .iter()
                    .map(|model| Value::Object(model.to_array()))
                    .collect(),
            ),
        }
    }
}
