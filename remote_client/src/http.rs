//! REST implementation of [`ObjectStore`]

use crate::errors::{ClientError, ClientResult};
use crate::store::{JsonMap, ObjectStore, QueryParams, SaveResponse};
use crate::USER_CLASS;
use async_trait::async_trait;
use config::ServerConfig;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

const APPLICATION_ID_HEADER: &str = "X-Parse-Application-Id";
const REST_KEY_HEADER: &str = "X-Parse-REST-API-Key";
const MASTER_KEY_HEADER: &str = "X-Parse-Master-Key";
const SESSION_TOKEN_HEADER: &str = "X-Parse-Session-Token";

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    error: String,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    results: Vec<JsonMap>,
    #[serde(default)]
    count: Option<u64>,
}

pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    rest_key: Option<String>,
    master_key: Option<String>,
}

impl HttpStore {
    pub fn new(config: &ServerConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            app_id: config.app_id.clone(),
            rest_key: config.rest_key.clone(),
            master_key: config.master_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn class_path(class_name: &str) -> String {
        if class_name == USER_CLASS {
            "users".to_string()
        } else {
            format!("classes/{}", class_name)
        }
    }

    fn object_path(class_name: &str, object_id: &str) -> String {
        format!("{}/{}", Self::class_path(class_name), object_id)
    }

    fn request(&self, method: Method, path: &str, use_master_key: bool) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(APPLICATION_ID_HEADER, &self.app_id);
        if let Some(key) = &self.rest_key {
            builder = builder.header(REST_KEY_HEADER, key);
        }
        if use_master_key {
            match &self.master_key {
                Some(key) => builder = builder.header(MASTER_KEY_HEADER, key),
                None => tracing::warn!("master key requested but none is configured"),
            }
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Value> {
        let response = builder.send().await?;
        Self::parse(response).await
    }

    async fn parse(response: Response) -> ClientResult<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => ClientError::server(err.code, err.error),
                Err(_) => ClientError::server(i64::from(status.as_u16()), body),
            });
        }

        if body.is_empty() {
            return Ok(Value::Object(JsonMap::new()));
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(format!("{}: {}", e, body)))
    }

    fn into_map(value: Value) -> ClientResult<JsonMap> {
        match value {
            Value::Object(map) => Ok(map),
            other => Err(ClientError::Decode(format!("expected an object, got {}", other))),
        }
    }
}

impl fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("master_key", &self.master_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn find(
        &self,
        class_name: &str,
        params: &QueryParams,
        use_master_key: bool,
    ) -> ClientResult<Vec<JsonMap>> {
        tracing::debug!(class = class_name, "GET {}", Self::class_path(class_name));
        let builder = self
            .request(Method::GET, &Self::class_path(class_name), use_master_key)
            .query(&params.to_pairs());
        let response: FindResponse = serde_json::from_value(self.send(builder).await?)?;
        Ok(response.results)
    }

    async fn count(
        &self,
        class_name: &str,
        params: &QueryParams,
        use_master_key: bool,
    ) -> ClientResult<u64> {
        let mut pairs = params.to_pairs();
        pairs.retain(|(key, _)| key == "where");
        pairs.push(("limit".to_string(), "0".to_string()));
        pairs.push(("count".to_string(), "1".to_string()));

        let builder = self
            .request(Method::GET, &Self::class_path(class_name), use_master_key)
            .query(&pairs);
        let response: FindResponse = serde_json::from_value(self.send(builder).await?)?;
        response
            .count
            .ok_or_else(|| ClientError::Decode("count missing from response".into()))
    }

    async fn get(
        &self,
        class_name: &str,
        object_id: &str,
        use_master_key: bool,
    ) -> ClientResult<JsonMap> {
        let builder = self.request(
            Method::GET,
            &Self::object_path(class_name, object_id),
            use_master_key,
        );
        Self::into_map(self.send(builder).await?)
    }

    async fn create(
        &self,
        class_name: &str,
        body: &JsonMap,
        use_master_key: bool,
    ) -> ClientResult<SaveResponse> {
        tracing::debug!(class = class_name, "POST {}", Self::class_path(class_name));
        let builder = self
            .request(Method::POST, &Self::class_path(class_name), use_master_key)
            .json(body);
        Ok(serde_json::from_value(self.send(builder).await?)?)
    }

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        body: &JsonMap,
        use_master_key: bool,
    ) -> ClientResult<SaveResponse> {
        tracing::debug!(class = class_name, object_id, "PUT");
        let builder = self
            .request(
                Method::PUT,
                &Self::object_path(class_name, object_id),
                use_master_key,
            )
            .json(body);
        Ok(serde_json::from_value(self.send(builder).await?)?)
    }

    async fn delete(
        &self,
        class_name: &str,
        object_id: &str,
        use_master_key: bool,
    ) -> ClientResult<()> {
        tracing::debug!(class = class_name, object_id, "DELETE");
        let builder = self.request(
            Method::DELETE,
            &Self::object_path(class_name, object_id),
            use_master_key,
        );
        self.send(builder).await.map(|_| ())
    }

    async fn log_in(&self, username: &str, password: &str) -> ClientResult<JsonMap> {
        let builder = self
            .request(Method::GET, "login", false)
            .query(&[("username", username), ("password", password)]);
        Self::into_map(self.send(builder).await?)
    }

    async fn current_user(&self, session_token: &str) -> ClientResult<JsonMap> {
        let builder = self
            .request(Method::GET, "users/me", false)
            .header(SESSION_TOKEN_HEADER, session_token);
        Self::into_map(self.send(builder).await?)
    }

    async fn health(&self) -> ClientResult<()> {
        let builder = self.request(Method::GET, "health", false);
        self.send(builder).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_config() -> ServerConfig {
        ServerConfig::new(
            "app".to_string(),
            Some("rest".to_string()),
            None,
            "https://example.com/".to_string(),
            "/parse/".to_string(),
        )
    }

    #[test]
    fn test_routes() {
        assert_eq!(HttpStore::class_path("Post"), "classes/Post");
        assert_eq!(HttpStore::class_path(USER_CLASS), "users");
        assert_eq!(HttpStore::object_path(USER_CLASS, "u1"), "users/u1");
    }

    #[test]
    fn test_base_url_comes_from_config() {
        let store = HttpStore::new(&server_config()).unwrap();
        assert_eq!(store.base_url(), "https://example.com/parse/");
    }

    #[test]
    fn test_debug_hides_master_key() {
        let mut config = server_config();
        config.master_key = Some("secret".to_string());
        let store = HttpStore::new(&config).unwrap();
        let printed = format!("{:?}", store);
        assert!(!printed.contains("secret"));
    }
}
