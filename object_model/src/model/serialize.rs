//! Plain-mapping form of a model
//!
//! Nested objects with loaded data are expanded recursively. A reference back
//! to the model being serialized (same class and id) is left out, which keeps
//! self-referencing objects finite.

use super::ObjectModel;
use crate::entity::Entity;
use remote_client::value::format_date;
use remote_client::{AttrValue, JsonMap, RemoteObject};
use serde::{Serialize, Serializer};
use serde_json::Value;

fn is_same_object(value: &RemoteObject, root: &RemoteObject) -> bool {
    root.object_id().is_some()
        && value.class_name() == root.class_name()
        && value.object_id() == root.object_id()
}

fn value_to_array(value: &AttrValue, root: &RemoteObject) -> Option<Value> {
    match value {
        AttrValue::Pointer(object) if is_same_object(object, root) => None,
        AttrValue::Pointer(object) if object.is_data_available() => {
            Some(Value::Object(object_to_array(object, root)))
        }
        AttrValue::Pointer(object) => Some(object.pointer_json()),
        AttrValue::Date(date) => Some(Value::from(format_date(date))),
        AttrValue::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| value_to_array(item, root))
                .collect(),
        )),
        AttrValue::Object(map) => Some(Value::Object(
            map.iter()
                .filter_map(|(key, item)| Some((key.clone(), value_to_array(item, root)?)))
                .collect(),
        )),
        other => Some(other.encode()),
    }
}

fn object_to_array(object: &RemoteObject, root: &RemoteObject) -> JsonMap {
    let mut array = JsonMap::new();
    for (key, value) in object.all_keys() {
        if let Some(value) = value_to_array(value, root) {
            array.insert(key.clone(), value);
        }
    }

    array.insert(
        "objectId".to_string(),
        object.object_id().map(Value::from).unwrap_or(Value::Null),
    );
    if let Some(created_at) = object.created_at() {
        array.insert("createdAt".to_string(), Value::from(format_date(created_at)));
    }
    if let Some(updated_at) = object.updated_at() {
        array.insert("updatedAt".to_string(), Value::from(format_date(updated_at)));
    }
    if let Some(acl) = object.acl() {
        array.insert("ACL".to_string(), acl.encode());
    }
    array
}

impl<E: Entity> ObjectModel<E> {
    /// Attributes, identity, timestamps and ACL, followed by every loaded
    /// relation whose name is not already an attribute
    pub fn to_array(&self) -> JsonMap {
        let mut array = object_to_array(&self.object, &self.object);

        let mut names: Vec<&String> = self.loaded_relations().keys().collect();
        names.sort();
        for name in names {
            if array.contains_key(name.as_str()) {
                continue;
            }
            if let Some(value) = self.loaded_relations().get(name) {
                array.insert(name.clone(), value.to_array_value());
            }
        }
        array
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.to_array()).to_string()
    }
}

impl<E: Entity> Serialize for ObjectModel<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::ModelContext;
    use crate::entity::Entity;
    use crate::model::ObjectModel;
    use crate::relations::RelationValue;
    use remote_client::MemoryStore;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Post;

    impl Entity for Post {
        const CLASS_NAME: &'static str = "Post";
    }

    fn context() -> ModelContext {
        ModelContext::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_unsaved_model_has_null_id() {
        let post = ObjectModel::<Post>::with_data(&context(), [("title", "Draft")]);
        let array = post.to_array();

        assert_eq!(array["title"], json!("Draft"));
        assert_eq!(array["objectId"], Value::Null);
        assert!(!array.contains_key("createdAt"));
    }

    #[test]
    fn test_self_reference_is_omitted() {
        let value = json!({
            "__type": "Object",
            "className": "Post",
            "objectId": "p1",
            "title": "Loop",
            "related": {"__type": "Object", "className": "Post", "objectId": "p1", "title": "Loop"},
            "links": [
                {"__type": "Object", "className": "Post", "objectId": "p1"},
                {"__type": "Pointer", "className": "Post", "objectId": "p2"}
            ]
        });
        let post = ObjectModel::<Post>::from_value(&context(), &value).unwrap();
        let array = post.to_array();

        assert_eq!(array["objectId"], json!("p1"));
        assert!(!array.contains_key("related"));
        assert_eq!(
            array["links"],
            json!([{"__type": "Pointer", "className": "Post", "objectId": "p2"}])
        );
    }

    #[test]
    fn test_nested_objects_expand() {
        let value = json!({
            "__type": "Object",
            "className": "Post",
            "objectId": "p1",
            "author": {"__type": "Object", "className": "_User", "objectId": "u1", "name": "Ada"},
            "published": {"__type": "Date", "iso": "2024-05-01T10:00:00.000Z"},
            "meta": {"words": 120}
        });
        let post = ObjectModel::<Post>::from_value(&context(), &value).unwrap();
        let array = post.to_array();

        assert_eq!(array["author"], json!({"name": "Ada", "objectId": "u1"}));
        assert_eq!(array["published"], json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(array["meta"], json!({"words": 120}));
    }

    #[test]
    fn test_loaded_relations_follow_attributes() {
        let ctx = context();
        let mut post = ObjectModel::<Post>::with_data(&ctx, [("title", "Hi")]);
        let other = ObjectModel::<Post>::with_data(&ctx, [("title", "Other")]);
        post.set_relation("zeta", RelationValue::Empty);
        post.set_relation("alpha", RelationValue::many_of(vec![other]));
        // attribute names win over relation names
        post.set_relation("title", RelationValue::Empty);

        let array = post.to_array();
        assert_eq!(array["title"], json!("Hi"));
        assert_eq!(array["zeta"], Value::Null);
        assert_eq!(array["alpha"][0]["title"], json!("Other"));

        let keys: Vec<&String> = array.keys().collect();
        let alpha = keys.iter().position(|key| *key == "alpha").unwrap();
        let zeta = keys.iter().position(|key| *key == "zeta").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let post = ObjectModel::<Post>::with_data(&context(), [("votes", 3)]);
        let serialized = serde_json::to_value(&post).unwrap();
        assert_eq!(serialized, serde_json::from_str::<Value>(&post.to_json()).unwrap());
    }
}
