mod common;

use common::{setup, sign_up, Post, User};
use parsehaus::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_save_find_and_serialize() {
    let (_store, ctx) = setup();
    let mut post = ObjectModel::<Post>::with_data(&ctx, [("title", "Hello")]);
    assert!(post.id().is_none());
    post.save().await.unwrap();
    let id = post.id().unwrap().to_string();

    let found = Post::query(&ctx).find_or_fail(&id, None).await.unwrap();
    let array = found.to_array();
    assert_eq!(array["objectId"], json!(id));
    assert_eq!(array["title"], json!("Hello"));
    assert!(array.contains_key("createdAt"));
    assert!(array.contains_key("updatedAt"));
    assert_eq!(found.created_at(), post.created_at());
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

#[tokio::test]
async fn test_models_serialize_through_facade() {
    let (_store, ctx) = setup();
    let post = ObjectModel::<Post>::create(&ctx, [("title", "Hello")]).await.unwrap();

    let value = to_json(&post);
    assert_eq!(value["title"], json!("Hello"));
    assert_eq!(value["objectId"], json!(post.id().unwrap()));
    assert_eq!(value, serde_json::Value::Object(post.to_array()));
}

#[tokio::test]
async fn test_extreme_amounts_do_not_overflow() {
    let (store, ctx) = setup();
    let mut post = ObjectModel::<Post>::create(&ctx, [("votes", 0)]).await.unwrap();

    post.decrement("votes", i64::MIN);
    assert_eq!(post.attribute("votes").and_then(AttrValue::as_i64), Some(i64::MAX));
    post.save().await.unwrap();
    assert_eq!(store.objects("Post")[0]["votes"], json!(i64::MAX));

    post.increment("votes", 1);
    let votes = post.attribute("votes").and_then(AttrValue::as_f64);
    assert_eq!(votes, Some(i64::MAX as f64 + 1.0));
}

#[tokio::test]
async fn test_staged_operations_reach_the_store() {
    let (store, ctx) = setup();
    let mut post = ObjectModel::<Post>::create(
        &ctx,
        [("votes", AttrValue::from(1)), ("tags", AttrValue::from(vec!["a"]))],
    )
    .await
    .unwrap();

    post.increment("votes", 4)
        .decrement("votes", 2)
        .add_unique("tags", vec!["a", "b"])
        .add("tags", "c")
        .remove("tags", "a");
    assert_eq!(post.attribute("votes").and_then(AttrValue::as_i64), Some(3));
    post.save().await.unwrap();

    let row = store.objects("Post").remove(0);
    assert_eq!(row["votes"], json!(3));
    assert_eq!(row["tags"], json!(["b", "c"]));
}

#[tokio::test]
async fn test_update_fetch_and_delete() {
    let (store, ctx) = setup();
    let mut post = ObjectModel::<Post>::create(&ctx, [("title", "Draft")]).await.unwrap();
    post.update([("title", "Final")]).await.unwrap();

    let mut pointer = ObjectModel::<Post>::pointer(&ctx, post.id().unwrap());
    assert!(!pointer.has_been_fetched());
    pointer.fetch(false).await.unwrap();
    assert_eq!(pointer.attribute("title"), Some(&AttrValue::from("Final")));

    store.clear_requests();
    pointer.fetch(false).await.unwrap();
    assert!(store.requests().is_empty());
    pointer.fetch(true).await.unwrap();
    assert_eq!(store.request_count("get"), 1);

    post.remove_key("title").save().await.unwrap();
    assert!(!store.objects("Post")[0].contains_key("title"));

    post.delete().await.unwrap();
    assert!(ObjectModel::<Post>::all(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_master_key_flag_reaches_store() {
    let (store, ctx) = setup();
    let admin = ctx.with_master_key(true);

    ObjectModel::<Post>::create(&admin, [("title", "Secret")]).await.unwrap();
    Post::query(&ctx).count().await.unwrap();

    let requests = store.requests();
    assert_eq!(requests[0].method, "create");
    assert!(requests[0].use_master_key);
    assert_eq!(requests[1].method, "count");
    assert!(!requests[1].use_master_key);
}

#[tokio::test]
async fn test_acl_is_saved() {
    let (store, ctx) = setup();
    let mut acl = Acl::new();
    acl.set_public_read_access(true);

    let mut post = ObjectModel::<Post>::with_data(&ctx, [("title", "Public")]);
    post.set("acl", acl);
    post.save().await.unwrap();

    assert_eq!(store.objects("Post")[0]["ACL"], json!({"*": {"read": true}}));
    assert_eq!(post.to_array()["ACL"], json!({"*": {"read": true}}));
}

#[tokio::test]
async fn test_user_sign_up_requires_credentials() {
    let (_store, ctx) = setup();
    let mut user = ObjectModel::<User>::with_data(&ctx, [("username", "nopass")]);
    let result = user.sign_up().await;
    assert!(matches!(result, Err(ObjectModelError::MalformedArgument(_))));
    assert!(user.id().is_none());
}

#[tokio::test]
async fn test_user_log_in_and_become() {
    let (_store, ctx) = setup();
    let user = sign_up(&ctx, "ada").await;
    assert!(user.session_token().is_some());

    let logged_in = ObjectModel::<User>::log_in(&ctx, "ada", "secret").await.unwrap();
    assert_eq!(logged_in.id(), user.id());
    assert!(logged_in.attribute("password").is_none());
    let token = logged_in.session_token().unwrap().to_string();

    let current = ObjectModel::<User>::become_user(&ctx, &token).await.unwrap();
    assert_eq!(current.id(), user.id());

    match ObjectModel::<User>::log_in(&ctx, "ada", "wrong").await {
        Err(ObjectModelError::RemoteService(err)) => assert_eq!(err.code(), Some(101)),
        other => panic!("expected a server error, got {:?}", other.map(|u| u.id().map(str::to_string))),
    }
}

#[tokio::test]
async fn test_parsehaus_with_memory_store() {
    let config = AppConfig::new(
        ServerConfig::new(
            "app".to_string(),
            None,
            None,
            "https://example.com".to_string(),
            "parse".to_string(),
        ),
        ModelConfig::new(true),
    );
    let store = std::sync::Arc::new(MemoryStore::new());
    let parsehaus = ParseHaus::with_store(config, store.clone());

    assert!(parsehaus.context().use_master_key());
    parsehaus.health().await.unwrap();

    ObjectModel::<Post>::create(parsehaus.context(), [("title", "Hi")]).await.unwrap();
    assert!(store.requests()[0].use_master_key);
    assert_eq!(parsehaus.config().server.base_url(), "https://example.com/parse/");
}

#[tokio::test]
async fn test_or_queries_execute() {
    let (_store, ctx) = setup();
    for (title, status) in [("a", "draft"), ("b", "published"), ("c", "archived"), ("d", "published")] {
        ObjectModel::<Post>::create(&ctx, [("title", title), ("status", status)])
            .await
            .unwrap();
    }

    let first = Post::query(&ctx).where_eq("title", "a");
    let query = Query::or_queries(
        first,
        vec![OrOperand::builder(|query: Query<Post>| {
            query.where_op("status", "=", "published")
        })],
    )
    .unwrap()
    .order_by("title", false);

    let titles: Vec<String> = query
        .get(None)
        .await
        .unwrap()
        .iter()
        .filter_map(|post| post.attribute("title").and_then(AttrValue::as_str).map(str::to_string))
        .collect();
    assert_eq!(titles, ["d", "b", "a"]);
    assert_eq!(query.count().await.unwrap(), 3);
}
