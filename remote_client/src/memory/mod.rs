//! In-process [`ObjectStore`]
//!
//! Rows are kept as wire JSON per class in insertion order. Queries, field
//! operations and user sessions behave like the REST server closely enough for
//! tests and demos; ACLs are stored but never enforced.
//!
//! Every call is appended to a request log for assertions. The log is never
//! trimmed on its own; call [`MemoryStore::clear_requests`] between phases of
//! a long-running test or demo.

mod matcher;

use crate::errors::{ClientError, ClientResult};
use crate::store::{JsonMap, ObjectStore, QueryParams, SaveResponse};
use crate::value::format_date;
use crate::USER_CLASS;
use async_trait::async_trait;
use chrono::Utc;
use matcher::{matches, sort_rows, values_equal, Classes};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const ID_LENGTH: usize = 10;
const SESSION_TOKEN_LENGTH: usize = 24;
const USERNAME_TAKEN: i64 = 202;
const INVALID_SESSION_TOKEN: i64 = 209;
const INCORRECT_TYPE: i64 = 111;
const PROTECTED_KEYS: &[&str] = &["objectId", "createdAt", "updatedAt", "sessionToken"];

/// One call made against a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: &'static str,
    pub class_name: String,
    pub use_master_key: bool,
}

#[derive(Default)]
struct State {
    classes: Classes,
    sessions: HashMap<String, String>,
    requests: Vec<RequestRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every request received since the last [`clear_requests`](Self::clear_requests),
    /// oldest first
    pub fn requests(&self) -> Vec<RequestRecord> {
        self.read().requests.clone()
    }

    /// Number of recorded requests with the given method name
    pub fn request_count(&self, method: &str) -> usize {
        self.read()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// Empty the request log; stored rows and sessions are kept
    pub fn clear_requests(&self) {
        self.write().requests.clear();
    }

    /// Raw stored rows of a class, as the server would hold them
    pub fn objects(&self, class_name: &str) -> Vec<JsonMap> {
        self.read()
            .classes
            .get(class_name)
            .cloned()
            .unwrap_or_default()
    }

    fn record(state: &mut State, method: &'static str, class_name: &str, use_master_key: bool) {
        crate::trace_log!("memory store {} {} (master: {})", method, class_name, use_master_key);
        state.requests.push(RequestRecord {
            method,
            class_name: class_name.to_string(),
            use_master_key,
        });
    }

    fn matching_rows(state: &State, class_name: &str, params: &QueryParams) -> Vec<JsonMap> {
        state
            .classes
            .get(class_name)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &params.where_, &state.classes))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn new_session(state: &mut State, user_id: &str) -> String {
        let token = format!("r:{}", random_string(SESSION_TOKEN_LENGTH));
        state.sessions.insert(token.clone(), user_id.to_string());
        token
    }

    fn user_view(state: &State, user_id: &str) -> Option<JsonMap> {
        state
            .classes
            .get(USER_CLASS)?
            .iter()
            .find(|row| object_id(row) == Some(user_id))
            .map(|row| public_view(USER_CLASS, row))
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let objects: usize = state.classes.values().map(Vec::len).sum();
        f.debug_struct("MemoryStore")
            .field("classes", &state.classes.len())
            .field("objects", &objects)
            .field("requests", &state.requests.len())
            .finish()
    }
}

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn now() -> String {
    format_date(&Utc::now())
}

fn object_id(row: &JsonMap) -> Option<&str> {
    row.get("objectId").and_then(Value::as_str)
}

/// Stored row as handed to clients
fn public_view(class_name: &str, row: &JsonMap) -> JsonMap {
    let mut view = row.clone();
    if class_name == USER_CLASS {
        view.remove("password");
    }
    view
}

fn apply_body(row: &mut JsonMap, body: &JsonMap) -> ClientResult<()> {
    for (key, value) in body {
        if PROTECTED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let op = value
            .as_object()
            .and_then(|map| map.get("__op"))
            .and_then(Value::as_str);
        let Some(op) = op else {
            row.insert(key.clone(), value.clone());
            continue;
        };

        match op {
            "Delete" => {
                row.remove(key);
            }
            "Increment" => {
                let amount = value.get("amount").cloned().unwrap_or(Value::from(1));
                let sum = match (row.get(key), amount.as_i64()) {
                    (Some(Value::Number(n)), Some(amount)) => {
                        n.as_i64().and_then(|i| i.checked_add(amount))
                    }
                    _ => None,
                };
                let next = match (row.get(key), sum) {
                    (Some(Value::Number(_)), Some(sum)) => Value::from(sum),
                    (Some(Value::Number(n)), None) => {
                        Value::from(n.as_f64().unwrap_or(0.0) + amount.as_f64().unwrap_or(0.0))
                    }
                    (None, _) | (Some(Value::Null), _) => amount,
                    (Some(other), _) => {
                        return Err(ClientError::server(
                            INCORRECT_TYPE,
                            format!("cannot increment a non-number field '{}': {}", key, other),
                        ))
                    }
                };
                row.insert(key.clone(), next);
            }
            "Add" | "AddUnique" | "Remove" => {
                let objects = value
                    .get("objects")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let mut current = match row.get(key) {
                    Some(Value::Array(items)) => items.clone(),
                    None | Some(Value::Null) => Vec::new(),
                    Some(other) => {
                        return Err(ClientError::server(
                            INCORRECT_TYPE,
                            format!("field '{}' is not an array: {}", key, other),
                        ))
                    }
                };
                match op {
                    "Add" => current.extend(objects),
                    "AddUnique" => {
                        for object in objects {
                            if !current.iter().any(|item| values_equal(item, &object)) {
                                current.push(object);
                            }
                        }
                    }
                    _ => current.retain(|item| !objects.iter().any(|o| values_equal(item, o))),
                }
                row.insert(key.clone(), Value::Array(current));
            }
            other => {
                return Err(ClientError::server(
                    INCORRECT_TYPE,
                    format!("unknown field operation '{}'", other),
                ))
            }
        }
    }
    Ok(())
}

/// Swap pointers along a dotted include path for the objects they reference
fn resolve_include(value: &mut Value, path: &[&str], classes: &Classes) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    let Some(field) = value.as_object_mut().and_then(|map| map.get_mut(*head)) else {
        return;
    };

    let targets: Vec<&mut Value> = if field.is_array() {
        field.as_array_mut().into_iter().flatten().collect()
    } else {
        vec![field]
    };
    for target in targets {
        expand_pointer(target, classes);
        resolve_include(target, rest, classes);
    }
}

fn expand_pointer(value: &mut Value, classes: &Classes) {
    let Some(map) = value.as_object() else {
        return;
    };
    if map.get("__type").and_then(Value::as_str) != Some("Pointer") {
        return;
    }
    let (Some(class_name), Some(id)) = (
        map.get("className").and_then(Value::as_str),
        map.get("objectId").and_then(Value::as_str),
    ) else {
        return;
    };

    let found = classes
        .get(class_name)
        .and_then(|rows| rows.iter().find(|row| object_id(row) == Some(id)))
        .map(|row| public_view(class_name, row));
    if let Some(mut object) = found {
        object.insert("__type".to_string(), Value::from("Object"));
        object.insert("className".to_string(), Value::from(class_name));
        *value = Value::Object(object);
    }
}

fn project(row: JsonMap, keys: &[String]) -> JsonMap {
    if keys.is_empty() {
        return row;
    }
    let wanted: Vec<&str> = keys
        .iter()
        .map(|key| key.split('.').next().unwrap_or(key))
        .collect();
    row.into_iter()
        .filter(|(key, _)| {
            matches!(key.as_str(), "objectId" | "createdAt" | "updatedAt")
                || wanted.contains(&key.as_str())
        })
        .collect()
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn find(
        &self,
        class_name: &str,
        params: &QueryParams,
        use_master_key: bool,
    ) -> ClientResult<Vec<JsonMap>> {
        let mut state = self.write();
        Self::record(&mut state, "find", class_name, use_master_key);

        let mut rows = Self::matching_rows(&state, class_name, params);
        sort_rows(&mut rows, &params.order);

        let skip = params.skip.unwrap_or(0);
        let limit = params.limit.unwrap_or(usize::MAX);
        let results = rows
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|row| {
                let mut value = Value::Object(public_view(class_name, &row));
                for include in &params.include {
                    let path: Vec<&str> = include.split('.').collect();
                    resolve_include(&mut value, &path, &state.classes);
                }
                match value {
                    Value::Object(map) => project(map, &params.keys),
                    _ => row,
                }
            })
            .collect();
        Ok(results)
    }

    async fn count(
        &self,
        class_name: &str,
        params: &QueryParams,
        use_master_key: bool,
    ) -> ClientResult<u64> {
        let mut state = self.write();
        Self::record(&mut state, "count", class_name, use_master_key);
        Ok(Self::matching_rows(&state, class_name, params).len() as u64)
    }

    async fn get(
        &self,
        class_name: &str,
        id: &str,
        use_master_key: bool,
    ) -> ClientResult<JsonMap> {
        let mut state = self.write();
        Self::record(&mut state, "get", class_name, use_master_key);
        state
            .classes
            .get(class_name)
            .and_then(|rows| rows.iter().find(|row| object_id(row) == Some(id)))
            .map(|row| public_view(class_name, row))
            .ok_or_else(ClientError::object_not_found)
    }

    async fn create(
        &self,
        class_name: &str,
        body: &JsonMap,
        use_master_key: bool,
    ) -> ClientResult<SaveResponse> {
        let mut state = self.write();
        Self::record(&mut state, "create", class_name, use_master_key);

        let mut row = JsonMap::new();
        apply_body(&mut row, body)?;

        if class_name == USER_CLASS {
            let username = row.get("username").and_then(Value::as_str);
            let Some(username) = username else {
                return Err(ClientError::server(200, "bad or missing username"));
            };
            if !row.get("password").map(Value::is_string).unwrap_or(false) {
                return Err(ClientError::server(201, "password is required"));
            }
            let taken = state
                .classes
                .get(USER_CLASS)
                .map(|rows| {
                    rows.iter()
                        .any(|r| r.get("username").and_then(Value::as_str) == Some(username))
                })
                .unwrap_or(false);
            if taken {
                return Err(ClientError::server(
                    USERNAME_TAKEN,
                    "Account already exists for this username.",
                ));
            }
        }

        let rows = state.classes.entry(class_name.to_string()).or_default();
        let id = loop {
            let candidate = random_string(ID_LENGTH);
            if !rows.iter().any(|row| object_id(row) == Some(candidate.as_str())) {
                break candidate;
            }
        };
        let created_at = now();
        row.insert("objectId".to_string(), Value::from(id.clone()));
        row.insert("createdAt".to_string(), Value::from(created_at.clone()));
        row.insert("updatedAt".to_string(), Value::from(created_at.clone()));
        rows.push(row);

        let session_token = if class_name == USER_CLASS {
            Some(Self::new_session(&mut state, &id))
        } else {
            None
        };

        Ok(SaveResponse {
            object_id: Some(id),
            created_at: Some(created_at),
            updated_at: None,
            session_token,
        })
    }

    async fn update(
        &self,
        class_name: &str,
        id: &str,
        body: &JsonMap,
        use_master_key: bool,
    ) -> ClientResult<SaveResponse> {
        let mut state = self.write();
        Self::record(&mut state, "update", class_name, use_master_key);

        let row = state
            .classes
            .get_mut(class_name)
            .and_then(|rows| rows.iter_mut().find(|row| object_id(row) == Some(id)))
            .ok_or_else(ClientError::object_not_found)?;

        let mut updated = row.clone();
        apply_body(&mut updated, body)?;
        let updated_at = now();
        updated.insert("updatedAt".to_string(), Value::from(updated_at.clone()));
        *row = updated;

        Ok(SaveResponse {
            updated_at: Some(updated_at),
            ..Default::default()
        })
    }

    async fn delete(
        &self,
        class_name: &str,
        id: &str,
        use_master_key: bool,
    ) -> ClientResult<()> {
        let mut state = self.write();
        Self::record(&mut state, "delete", class_name, use_master_key);

        let rows = state
            .classes
            .get_mut(class_name)
            .ok_or_else(ClientError::object_not_found)?;
        let before = rows.len();
        rows.retain(|row| object_id(row) != Some(id));
        if rows.len() == before {
            return Err(ClientError::object_not_found());
        }
        if class_name == USER_CLASS {
            state.sessions.retain(|_, user| user.as_str() != id);
        }
        Ok(())
    }

    async fn log_in(&self, username: &str, password: &str) -> ClientResult<JsonMap> {
        let mut state = self.write();
        Self::record(&mut state, "log_in", USER_CLASS, false);

        let user_id = state
            .classes
            .get(USER_CLASS)
            .and_then(|rows| {
                rows.iter().find(|row| {
                    row.get("username").and_then(Value::as_str) == Some(username)
                        && row.get("password").and_then(Value::as_str) == Some(password)
                })
            })
            .and_then(object_id)
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::server(crate::errors::OBJECT_NOT_FOUND, "Invalid username/password.")
            })?;

        let token = Self::new_session(&mut state, &user_id);
        let mut user = Self::user_view(&state, &user_id).ok_or_else(ClientError::object_not_found)?;
        user.insert("sessionToken".to_string(), Value::from(token));
        Ok(user)
    }

    async fn current_user(&self, session_token: &str) -> ClientResult<JsonMap> {
        let mut state = self.write();
        Self::record(&mut state, "current_user", USER_CLASS, false);

        let invalid = || ClientError::server(INVALID_SESSION_TOKEN, "Invalid session token");
        let user_id = state.sessions.get(session_token).cloned().ok_or_else(invalid)?;
        let mut user = Self::user_view(&state, &user_id).ok_or_else(invalid)?;
        user.insert("sessionToken".to_string(), Value::from(session_token));
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let saved = store
            .create("Post", &body(json!({"title": "Hello"})), false)
            .await
            .unwrap();
        let id = saved.object_id.unwrap();
        assert_eq!(id.len(), ID_LENGTH);

        let row = store.get("Post", &id, true).await.unwrap();
        assert_eq!(row["title"], json!("Hello"));
        assert_eq!(row["createdAt"], row["updatedAt"]);
        assert_eq!(
            store.requests().last(),
            Some(&RequestRecord {
                method: "get",
                class_name: "Post".to_string(),
                use_master_key: true,
            })
        );
    }

    #[tokio::test]
    async fn test_missing_object_is_code_101() {
        let store = MemoryStore::new();
        let err = store.get("Post", "nope", false).await.unwrap_err();
        assert_eq!(err.code(), Some(crate::errors::OBJECT_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_field_operations_on_update() {
        let store = MemoryStore::new();
        let id = store
            .create("Post", &body(json!({"views": 1, "tags": ["a"]})), false)
            .await
            .unwrap()
            .object_id
            .unwrap();

        store
            .update(
                "Post",
                &id,
                &body(json!({
                    "views": {"__op": "Increment", "amount": 4},
                    "tags": {"__op": "AddUnique", "objects": ["a", "b"]},
                    "title": "T"
                })),
                false,
            )
            .await
            .unwrap();

        let row = store.get("Post", &id, false).await.unwrap();
        assert_eq!(row["views"], json!(5));
        assert_eq!(row["tags"], json!(["a", "b"]));
        assert_eq!(row["title"], json!("T"));
    }

    #[tokio::test]
    async fn test_increment_past_i64_range() {
        let store = MemoryStore::new();
        let id = store
            .create("Post", &body(json!({"views": i64::MAX})), false)
            .await
            .unwrap()
            .object_id
            .unwrap();

        let increment = body(json!({"views": {"__op": "Increment", "amount": 1}}));
        store.update("Post", &id, &increment, false).await.unwrap();

        let row = store.get("Post", &id, false).await.unwrap();
        assert_eq!(row["views"].as_f64(), Some(i64::MAX as f64 + 1.0));
    }

    #[tokio::test]
    async fn test_request_log_until_cleared() {
        let store = MemoryStore::new();
        let id = store
            .create("Post", &body(json!({"title": "a"})), false)
            .await
            .unwrap()
            .object_id
            .unwrap();
        store.get("Post", &id, true).await.unwrap();
        store.get("Post", &id, false).await.unwrap();
        assert_eq!(store.requests().len(), 3);
        assert_eq!(store.request_count("get"), 2);

        store.clear_requests();
        assert!(store.requests().is_empty());
        assert_eq!(store.objects("Post").len(), 1);

        store.get("Post", &id, false).await.unwrap();
        assert_eq!(store.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_find_orders_limits_and_projects() {
        let store = MemoryStore::new();
        for (title, views) in [("a", 3), ("b", 1), ("c", 2)] {
            store
                .create("Post", &body(json!({"title": title, "views": views})), false)
                .await
                .unwrap();
        }

        let params = QueryParams {
            order: vec!["-views".to_string()],
            limit: Some(2),
            keys: vec!["title".to_string()],
            ..Default::default()
        };
        let rows = store.find("Post", &params, false).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r["title"].clone()).collect();
        assert_eq!(titles, vec![json!("a"), json!("c")]);
        assert!(!rows[0].contains_key("views"));
        assert!(rows[0].contains_key("objectId"));
        assert_eq!(store.count("Post", &params, false).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_include_expands_pointers() {
        let store = MemoryStore::new();
        let user_id = store
            .create("Author", &body(json!({"name": "Ada"})), false)
            .await
            .unwrap()
            .object_id
            .unwrap();
        store
            .create(
                "Post",
                &body(json!({"author": {"__type": "Pointer", "className": "Author", "objectId": user_id}})),
                false,
            )
            .await
            .unwrap();

        let params = QueryParams {
            include: vec!["author".to_string()],
            ..Default::default()
        };
        let rows = store.find("Post", &params, false).await.unwrap();
        assert_eq!(rows[0]["author"]["__type"], json!("Object"));
        assert_eq!(rows[0]["author"]["name"], json!("Ada"));
    }

    #[tokio::test]
    async fn test_users_sign_up_and_log_in() {
        let store = MemoryStore::new();
        let signed_up = store
            .create(USER_CLASS, &body(json!({"username": "ada", "password": "pw"})), false)
            .await
            .unwrap();
        assert!(signed_up.session_token.unwrap().starts_with("r:"));

        let duplicate = store
            .create(USER_CLASS, &body(json!({"username": "ada", "password": "x"})), false)
            .await
            .unwrap_err();
        assert_eq!(duplicate.code(), Some(USERNAME_TAKEN));

        let user = store.log_in("ada", "pw").await.unwrap();
        assert!(!user.contains_key("password"));
        let token = user["sessionToken"].as_str().unwrap().to_string();

        let me = store.current_user(&token).await.unwrap();
        assert_eq!(me["username"], json!("ada"));
        assert!(store.log_in("ada", "wrong").await.is_err());
    }
}
