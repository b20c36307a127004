//! Remote objects
//!
//! A [`RemoteObject`] is one row of a remote class: server-assigned identity,
//! timestamps, an ACL and the attribute map. Local mutations are staged as
//! [`FieldOperation`]s and flushed by [`RemoteObject::save`].

use crate::acl::Acl;
use crate::errors::{ClientError, ClientResult};
use crate::operation::FieldOperation;
use crate::store::{JsonMap, ObjectStore, SaveResponse};
use crate::value::{parse_date, AttrValue};
use crate::USER_CLASS;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys the server manages itself; never part of the attribute map
const RESERVED_KEYS: &[&str] = &[
    "__type",
    "className",
    "objectId",
    "createdAt",
    "updatedAt",
    "ACL",
    "sessionToken",
];

#[derive(Debug, Clone)]
pub struct RemoteObject {
    class_name: String,
    object_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    data: BTreeMap<String, AttrValue>,
    operations: BTreeMap<String, FieldOperation>,
    acl: Option<Acl>,
    acl_dirty: bool,
    data_available: bool,
    session_token: Option<String>,
}

impl RemoteObject {
    /// A fresh object that exists only locally
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            created_at: None,
            updated_at: None,
            data: BTreeMap::new(),
            operations: BTreeMap::new(),
            acl: None,
            acl_dirty: false,
            data_available: true,
            session_token: None,
        }
    }

    /// A reference to an existing object whose data has not been fetched
    pub fn pointer(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            data_available: false,
            ..Self::new(class_name)
        }
    }

    /// Build from a full object as returned by the store
    pub fn from_json(class_name: impl Into<String>, json: &JsonMap) -> ClientResult<Self> {
        let mut object = Self::new(class_name);
        object.merge_server_data(json)?;
        Ok(object)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn created_at(&self) -> Option<&DateTime<Utc>> {
        self.created_at.as_ref()
    }

    pub fn updated_at(&self) -> Option<&DateTime<Utc>> {
        self.updated_at.as_ref()
    }

    pub fn is_data_available(&self) -> bool {
        self.data_available
    }

    /// True when there are staged changes not yet saved
    pub fn is_dirty(&self) -> bool {
        self.object_id.is_none() || !self.operations.is_empty() || self.acl_dirty
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.data.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Current attribute map, staged operations included
    pub fn all_keys(&self) -> &BTreeMap<String, AttrValue> {
        &self.data
    }

    pub fn operations(&self) -> &BTreeMap<String, FieldOperation> {
        &self.operations
    }

    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.stage(key, FieldOperation::Set(value.into()));
    }

    pub fn set_array(&mut self, key: &str, values: Vec<AttrValue>) {
        self.stage(key, FieldOperation::Set(AttrValue::Array(values)));
    }

    pub fn set_associative_array(&mut self, key: &str, values: BTreeMap<String, AttrValue>) {
        self.stage(key, FieldOperation::Set(AttrValue::Object(values)));
    }

    /// Remove a single attribute
    pub fn delete(&mut self, key: &str) {
        self.stage(key, FieldOperation::Delete);
    }

    pub fn increment(&mut self, key: &str, amount: i64) {
        self.stage(key, FieldOperation::Increment(amount));
    }

    pub fn add(&mut self, key: &str, values: Vec<AttrValue>) {
        self.stage(key, FieldOperation::Add(values));
    }

    pub fn add_unique(&mut self, key: &str, values: Vec<AttrValue>) {
        self.stage(key, FieldOperation::AddUnique(values));
    }

    pub fn remove(&mut self, key: &str, values: Vec<AttrValue>) {
        self.stage(key, FieldOperation::Remove(values));
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl = Some(acl);
        self.acl_dirty = true;
    }

    fn stage(&mut self, key: &str, op: FieldOperation) {
        match op.apply(self.data.get(key)) {
            Some(value) => {
                self.data.insert(key.to_string(), value);
            }
            None => {
                self.data.remove(key);
            }
        }

        let merged = match self.operations.remove(key) {
            Some(previous) => previous.merge(op, self.data.get(key)),
            None => op,
        };
        self.operations.insert(key.to_string(), merged);
    }

    /// `{"__type": "Pointer", ...}` form of this object
    pub fn pointer_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("__type".to_string(), Value::from("Pointer"));
        map.insert("className".to_string(), Value::from(self.class_name.clone()));
        map.insert(
            "objectId".to_string(),
            self.object_id.clone().map(Value::from).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }

    /// Pointer encoding, failing for objects that were never saved
    pub fn encode_pointer(&self) -> ClientResult<Value> {
        if self.object_id.is_none() {
            return Err(ClientError::MissingObjectId(self.class_name.clone()));
        }
        Ok(self.pointer_json())
    }

    /// Body of the next create or update call
    pub fn build_save_body(&self) -> ClientResult<JsonMap> {
        let mut body = JsonMap::new();
        for (key, op) in &self.operations {
            check_saved_pointers(op)?;
            body.insert(key.clone(), op.encode());
        }
        if self.acl_dirty {
            if let Some(acl) = &self.acl {
                body.insert("ACL".to_string(), acl.encode());
            }
        }
        Ok(body)
    }

    /// Replace local state with what the server returned
    pub fn merge_server_data(&mut self, json: &JsonMap) -> ClientResult<()> {
        if let Some(id) = json.get("objectId").and_then(Value::as_str) {
            self.object_id = Some(id.to_string());
        }
        if let Some(date) = json.get("createdAt") {
            self.created_at = Some(decode_timestamp(date)?);
        }
        if let Some(date) = json.get("updatedAt") {
            self.updated_at = Some(decode_timestamp(date)?);
        }
        if let Some(acl) = json.get("ACL") {
            self.acl = Some(Acl::decode(acl)?);
            self.acl_dirty = false;
        }
        if let Some(token) = json.get("sessionToken").and_then(Value::as_str) {
            self.session_token = Some(token.to_string());
        }

        let mut data = BTreeMap::new();
        for (key, value) in json {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            data.insert(key.clone(), AttrValue::from_json(value)?);
        }
        // local staged changes win over the server copy
        for (key, op) in &self.operations {
            match op.apply(data.get(key)) {
                Some(value) => {
                    data.insert(key.clone(), value);
                }
                None => {
                    data.remove(key);
                }
            }
        }
        self.data = data;
        self.data_available = true;
        Ok(())
    }

    fn apply_save_response(&mut self, response: SaveResponse) -> ClientResult<()> {
        if let Some(id) = response.object_id {
            self.object_id = Some(id);
        }
        if let Some(created_at) = response.created_at {
            let date = parse_date(&created_at)?;
            self.created_at = Some(date);
            if self.updated_at.is_none() || response.updated_at.is_none() {
                self.updated_at = Some(date);
            }
        }
        if let Some(updated_at) = response.updated_at {
            self.updated_at = Some(parse_date(&updated_at)?);
        }
        if let Some(token) = response.session_token {
            self.session_token = Some(token);
        }
        self.operations.clear();
        self.acl_dirty = false;
        self.data_available = true;
        Ok(())
    }

    /// Create or update, depending on whether the object has an id
    pub async fn save(&mut self, store: &dyn ObjectStore, use_master_key: bool) -> ClientResult<()> {
        let body = self.build_save_body()?;
        let response = match self.object_id.clone() {
            None => {
                crate::debug_log!("Creating {} object", self.class_name);
                store.create(&self.class_name, &body, use_master_key).await?
            }
            Some(id) => {
                if body.is_empty() {
                    return Ok(());
                }
                crate::debug_log!("Updating {} object {}", self.class_name, id);
                store.update(&self.class_name, &id, &body, use_master_key).await?
            }
        };
        self.apply_save_response(response)
    }

    /// Load the stored attributes. Staged operations are kept.
    pub async fn fetch(&mut self, store: &dyn ObjectStore, use_master_key: bool) -> ClientResult<()> {
        let id = self
            .object_id
            .clone()
            .ok_or_else(|| ClientError::MissingObjectId(self.class_name.clone()))?;
        crate::debug_log!("Fetching {} object {}", self.class_name, id);
        let json = store.get(&self.class_name, &id, use_master_key).await?;
        self.merge_server_data(&json)
    }

    /// Delete the whole object remotely
    pub async fn destroy(&self, store: &dyn ObjectStore, use_master_key: bool) -> ClientResult<()> {
        let id = self
            .object_id
            .as_deref()
            .ok_or_else(|| ClientError::MissingObjectId(self.class_name.clone()))?;
        crate::debug_log!("Destroying {} object {}", self.class_name, id);
        store.delete(&self.class_name, id, use_master_key).await
    }

    pub fn is_user(&self) -> bool {
        self.class_name == USER_CLASS
    }
}

fn decode_timestamp(value: &Value) -> ClientResult<DateTime<Utc>> {
    match value {
        Value::String(iso) => parse_date(iso),
        other => match AttrValue::from_json(other)? {
            AttrValue::Date(date) => Ok(date),
            decoded => Err(ClientError::Decode(format!(
                "expected a timestamp, got {}",
                decoded.type_name()
            ))),
        },
    }
}

fn check_saved_pointers(op: &FieldOperation) -> ClientResult<()> {
    fn walk(value: &AttrValue) -> ClientResult<()> {
        match value {
            AttrValue::Pointer(object) => object.encode_pointer().map(|_| ()),
            AttrValue::Array(items) => items.iter().try_for_each(walk),
            AttrValue::Object(map) => map.values().try_for_each(walk),
            _ => Ok(()),
        }
    }

    match op {
        FieldOperation::Set(value) => walk(value),
        FieldOperation::Add(items)
        | FieldOperation::AddUnique(items)
        | FieldOperation::Remove(items) => items.iter().try_for_each(walk),
        FieldOperation::Delete | FieldOperation::Increment(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server_json() -> JsonMap {
        json!({
            "objectId": "p1",
            "createdAt": "2020-05-01T10:00:00.000Z",
            "updatedAt": "2020-05-02T10:00:00.000Z",
            "title": "Hello",
            "views": 3,
            "ACL": {"*": {"read": true}}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_from_json_separates_reserved_keys() {
        let object = RemoteObject::from_json("Post", &server_json()).unwrap();
        assert_eq!(object.object_id(), Some("p1"));
        assert!(object.acl().unwrap().public_read_access());
        assert!(!object.has("objectId"));
        assert!(!object.has("ACL"));
        assert_eq!(object.get("title"), Some(&AttrValue::from("Hello")));
        assert!(!object.is_dirty());
    }

    #[test]
    fn test_staged_operations_build_body() {
        let mut object = RemoteObject::from_json("Post", &server_json()).unwrap();
        object.increment("views", 2);
        object.delete("title");
        object.set_acl(Acl::for_user("u1"));

        assert_eq!(object.get("views"), Some(&AttrValue::from(5)));
        assert!(!object.has("title"));
        let body = object.build_save_body().unwrap();
        assert_eq!(
            Value::Object(body),
            json!({
                "views": {"__op": "Increment", "amount": 2},
                "title": {"__op": "Delete"},
                "ACL": {"u1": {"read": true, "write": true}}
            })
        );
    }

    #[test]
    fn test_unsaved_pointer_cannot_be_saved() {
        let mut object = RemoteObject::new("Post");
        object.set("user", RemoteObject::new("_User"));
        assert!(matches!(
            object.build_save_body(),
            Err(ClientError::MissingObjectId(class)) if class == "_User"
        ));
    }

    #[test]
    fn test_server_data_keeps_pending_changes() {
        let mut object = RemoteObject::pointer("Post", "p1");
        assert!(!object.is_data_available());
        object.set("title", "Draft");
        object.merge_server_data(&server_json()).unwrap();
        assert!(object.is_data_available());
        assert_eq!(object.get("title"), Some(&AttrValue::from("Draft")));
        assert_eq!(object.get("views"), Some(&AttrValue::from(3)));
    }
}
