//! The object store capability
//!
//! Everything above this trait speaks in classes, ids and wire JSON. An
//! implementation only has to move that JSON to a backend and back.

use crate::errors::ClientResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

pub type JsonMap = serde_json::Map<String, Value>;

/// Query parameters as sent to the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParams {
    #[serde(rename = "where", skip_serializing_if = "JsonMap::is_empty")]
    pub where_: JsonMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

impl QueryParams {
    /// URL query pairs in the REST encoding
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.where_.is_empty() {
            pairs.push(("where".to_string(), Value::Object(self.where_.clone()).to_string()));
        }
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if !self.keys.is_empty() {
            pairs.push(("keys".to_string(), self.keys.join(",")));
        }
        if !self.include.is_empty() {
            pairs.push(("include".to_string(), self.include.join(",")));
        }
        pairs
    }
}

/// Body returned by create and update calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Run a query and return the raw result objects in store order
    async fn find(
        &self,
        class_name: &str,
        params: &QueryParams,
        use_master_key: bool,
    ) -> ClientResult<Vec<JsonMap>>;

    /// Count the objects matching `params`, ignoring limit and skip
    async fn count(
        &self,
        class_name: &str,
        params: &QueryParams,
        use_master_key: bool,
    ) -> ClientResult<u64>;

    /// Fetch one object by id. A missing object is a server error with code 101.
    async fn get(
        &self,
        class_name: &str,
        object_id: &str,
        use_master_key: bool,
    ) -> ClientResult<JsonMap>;

    async fn create(
        &self,
        class_name: &str,
        body: &JsonMap,
        use_master_key: bool,
    ) -> ClientResult<SaveResponse>;

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        body: &JsonMap,
        use_master_key: bool,
    ) -> ClientResult<SaveResponse>;

    async fn delete(
        &self,
        class_name: &str,
        object_id: &str,
        use_master_key: bool,
    ) -> ClientResult<()>;

    /// Returns the user object including its `sessionToken`
    async fn log_in(&self, username: &str, password: &str) -> ClientResult<JsonMap>;

    /// Resolve a session token to its user
    async fn current_user(&self, session_token: &str) -> ClientResult<JsonMap>;

    async fn health(&self) -> ClientResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_encode_lists_with_commas() {
        let mut params = QueryParams {
            order: vec!["-createdAt".into(), "title".into()],
            limit: Some(1),
            include: vec!["user".into()],
            ..Default::default()
        };
        params.where_.insert("title".into(), json!("hello"));

        let pairs = params.to_pairs();
        assert_eq!(pairs[0], ("where".to_string(), r#"{"title":"hello"}"#.to_string()));
        assert_eq!(pairs[1], ("order".to_string(), "-createdAt,title".to_string()));
        assert_eq!(pairs[2], ("limit".to_string(), "1".to_string()));
        assert_eq!(pairs[3], ("include".to_string(), "user".to_string()));
    }

    #[test]
    fn test_save_response_reads_camel_case() {
        let response: SaveResponse =
            serde_json::from_value(json!({"objectId": "abc", "createdAt": "2020-01-01T00:00:00.000Z"}))
                .unwrap();
        assert_eq!(response.object_id.as_deref(), Some("abc"));
        assert!(response.updated_at.is_none());
    }
}
