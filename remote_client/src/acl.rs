//! Access control lists
//!
//! The wire form is a mapping from a principal (`*`, a user id, or
//! `role:<name>`) to `{"read": bool, "write": bool}`, with false entries left
//! out.

use crate::errors::{ClientError, ClientResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const PUBLIC: &str = "*";
const ROLE_PREFIX: &str = "role:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    entries: BTreeMap<String, Permissions>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// ACL granting read and write to a single user
    pub fn for_user(user_id: &str) -> Self {
        let mut acl = Self::new();
        acl.set_read_access(user_id, true);
        acl.set_write_access(user_id, true);
        acl
    }

    pub fn set_public_read_access(&mut self, allowed: bool) -> &mut Self {
        self.set_read_access(PUBLIC, allowed)
    }

    pub fn set_public_write_access(&mut self, allowed: bool) -> &mut Self {
        self.set_write_access(PUBLIC, allowed)
    }

    pub fn set_read_access(&mut self, principal: &str, allowed: bool) -> &mut Self {
        self.update(principal, |p| p.read = allowed);
        self
    }

    pub fn set_write_access(&mut self, principal: &str, allowed: bool) -> &mut Self {
        self.update(principal, |p| p.write = allowed);
        self
    }

    pub fn set_role_read_access(&mut self, role: &str, allowed: bool) -> &mut Self {
        self.set_read_access(&format!("{}{}", ROLE_PREFIX, role), allowed)
    }

    pub fn set_role_write_access(&mut self, role: &str, allowed: bool) -> &mut Self {
        self.set_write_access(&format!("{}{}", ROLE_PREFIX, role), allowed)
    }

    pub fn public_read_access(&self) -> bool {
        self.read_access(PUBLIC)
    }

    pub fn public_write_access(&self) -> bool {
        self.write_access(PUBLIC)
    }

    pub fn read_access(&self, principal: &str) -> bool {
        self.entries.get(principal).map(|p| p.read).unwrap_or(false)
    }

    pub fn write_access(&self, principal: &str) -> bool {
        self.entries.get(principal).map(|p| p.write).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn update(&mut self, principal: &str, apply: impl FnOnce(&mut Permissions)) {
        let entry = self.entries.entry(principal.to_string()).or_default();
        apply(entry);
        if !entry.read && !entry.write {
            self.entries.remove(principal);
        }
    }

    /// Wire encoding
    pub fn encode(&self) -> Value {
        let mut map = Map::new();
        for (principal, perms) in &self.entries {
            let mut entry = Map::new();
            if perms.read {
                entry.insert("read".to_string(), Value::Bool(true));
            }
            if perms.write {
                entry.insert("write".to_string(), Value::Bool(true));
            }
            map.insert(principal.clone(), Value::Object(entry));
        }
        Value::Object(map)
    }

    pub fn decode(value: &Value) -> ClientResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ClientError::Decode(format!("ACL must be an object, got {}", value)))?;

        let mut acl = Self::new();
        for (principal, perms) in map {
            let perms = perms.as_object().ok_or_else(|| {
                ClientError::Decode(format!("ACL entry for '{}' must be an object", principal))
            })?;
            let flag = |name: &str| perms.get(name).and_then(Value::as_bool).unwrap_or(false);
            acl.set_read_access(principal, flag("read"));
            acl.set_write_access(principal, flag("write"));
        }
        Ok(acl)
    }
}
