//! Query builder tests
//!
//! Filters are checked against the wire JSON they produce; execution runs
//! against the in-memory store.

#[cfg(test)]
mod tests {
    use crate::context::ModelContext;
    use crate::entity::Entity;
    use crate::errors::ObjectModelError;
    use crate::query_builder::{Operator, OrOperand, Query};
    use remote_client::{AttrValue, MemoryStore, RemoteQuery};
    use serde_json::json;
    use std::sync::Arc;

    struct Post;

    impl Entity for Post {
        const CLASS_NAME: &'static str = "Post";
    }

    struct Comment;

    impl Entity for Comment {
        const CLASS_NAME: &'static str = "Comment";
    }

    fn context() -> ModelContext {
        ModelContext::new(Arc::new(MemoryStore::default()))
    }

    // ========================================
    // Operators
    // ========================================

    #[test]
    fn test_operator_tokens_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.token().parse::<Operator>().unwrap(), op);
            assert_eq!(op.to_string(), op.token());
        }
    }

    #[test]
    fn test_where_op_matches_named_methods() {
        let ctx = context();
        let cases: Vec<(&str, Query<Post>)> = vec![
            ("=", Query::new(ctx.clone()).where_eq("votes", 3)),
            ("!=", Query::new(ctx.clone()).not_equal_to("votes", 3)),
            (">", Query::new(ctx.clone()).greater_than("votes", 3)),
            (">=", Query::new(ctx.clone()).greater_than_or_equal_to("votes", 3)),
            ("<", Query::new(ctx.clone()).less_than("votes", 3)),
            ("<=", Query::new(ctx.clone()).less_than_or_equal_to("votes", 3)),
            ("in", Query::new(ctx.clone()).contained_in("votes", 3)),
        ];

        for (token, expected) in cases {
            let query = Query::<Post>::new(ctx.clone())
                .where_op("votes", token, 3)
                .unwrap();
            assert_eq!(
                query.remote().where_json(),
                expected.remote().where_json(),
                "operator {}",
                token
            );
        }
    }

    #[test]
    fn test_invalid_operator() {
        let result = Query::<Post>::new(context()).where_op("votes", "<>", 3);
        match result {
            Err(ObjectModelError::InvalidOperator(token)) => assert_eq!(token, "<>"),
            other => panic!("expected InvalidOperator, got {:?}", other),
        }
    }

    // ========================================
    // Filters
    // ========================================

    #[test]
    fn test_where_eq_and_all() {
        let query = Query::<Post>::new(context())
            .where_eq("title", "Hello")
            .where_all([("status", "draft"), ("lang", "en")]);

        let where_ = query.remote().where_json();
        assert_eq!(where_["title"], json!("Hello"));
        assert_eq!(where_["status"], json!("draft"));
        assert_eq!(where_["lang"], json!("en"));
    }

    #[test]
    fn test_operator_replaces_equality() {
        let query = Query::<Post>::new(context())
            .where_eq("votes", 1)
            .greater_than("votes", 5)
            .less_than("votes", 10);

        assert_eq!(
            query.remote().where_json()["votes"],
            json!({"$gt": 5, "$lt": 10})
        );
    }

    #[test]
    fn test_contained_in_accepts_single_value() {
        let single = Query::<Post>::new(context()).contained_in("tags", "rust");
        assert_eq!(
            single.remote().where_json()["tags"],
            json!({"$in": ["rust"]})
        );

        let many = Query::<Post>::new(context()).where_in("tags", vec!["rust", "orm"]);
        assert_eq!(
            many.remote().where_json()["tags"],
            json!({"$in": ["rust", "orm"]})
        );
    }

    #[test]
    fn test_existence_and_string_filters() {
        let query = Query::<Post>::new(context())
            .exists("cover")
            .where_not_exists("deletedAt")
            .starts_with("title", "How");

        let where_ = query.remote().where_json();
        assert_eq!(where_["cover"], json!({"$exists": true}));
        assert_eq!(where_["deletedAt"], json!({"$exists": false}));
        assert_eq!(where_["title"], json!({"$regex": "^\\QHow\\E"}));
    }

    #[test]
    fn test_matches_query() {
        let ctx = context();
        let mut authors = RemoteQuery::new("_User");
        authors.equal_to("name", "Ada");

        let query = Query::<Post>::new(ctx.clone()).matches_query("author", &authors);
        assert_eq!(
            query.remote().where_json()["author"],
            json!({"$inQuery": {"where": {"name": "Ada"}, "className": "_User"}})
        );

        let comments = Query::<Comment>::new(ctx).where_eq("flagged", true);
        let query = Query::<Post>::new(context()).does_not_match_key_in_query(
            "objectId",
            "postId",
            &comments,
        );
        assert_eq!(
            query.remote().where_json()["objectId"],
            json!({"$dontSelect": {
                "query": {"className": "Comment", "where": {"flagged": true}},
                "key": "postId"
            }})
        );
    }

    // ========================================
    // Ordering, includes and projection
    // ========================================

    #[test]
    fn test_order_by_replaces_and_add_appends() {
        let query = Query::<Post>::new(context())
            .order_by("createdAt", true)
            .order_by("title", false);
        assert_eq!(query.remote().order(), ["-title".to_string()]);

        let query = query.add_ascending("createdAt").add_descending("votes");
        assert_eq!(
            query.remote().order(),
            ["-title".to_string(), "createdAt".to_string(), "-votes".to_string()]
        );
    }

    #[test]
    fn test_with_accumulates_keys() {
        let query = Query::<Post>::new(context())
            .with("author")
            .with(vec!["author", "category"])
            .with(["category.parent"]);

        assert_eq!(query.include_keys(), ["author", "category", "category.parent"]);
        assert_eq!(query.remote().includes(), query.include_keys());
    }

    #[test]
    fn test_limit_skip_select() {
        let params = Query::<Post>::new(context())
            .limit(10)
            .skip(20)
            .select(["title", "votes", "title"])
            .remote()
            .to_params();

        assert_eq!(params.limit, Some(10));
        assert_eq!(params.skip, Some(20));
        assert_eq!(params.keys, vec!["title".to_string(), "votes".to_string()]);
    }

    #[test]
    fn test_master_key_flag_follows_query() {
        let ctx = context();
        let query = Query::<Post>::new(ctx.clone());
        assert!(!query.uses_master_key());

        let query = query.use_master_key(true);
        assert!(query.uses_master_key());
        // the context the query was built from is untouched
        assert!(!ctx.use_master_key());
    }

    // ========================================
    // $or composition
    // ========================================

    #[test]
    fn test_or_query_with_builder_and_query() {
        let ctx = context().with_master_key(true);
        let first = Query::<Post>::new(ctx.clone()).where_eq("status", "draft");
        let second = Query::<Post>::new(ctx.clone()).greater_than("votes", 10);

        let query = Query::or_queries(
            first,
            vec![
                second.into(),
                OrOperand::builder(|query: Query<Post>| Ok(query.where_eq("pinned", true))),
            ],
        )
        .unwrap();

        assert!(query.uses_master_key());
        assert_eq!(
            query.remote().where_json(),
            json!({"$or": [
                {"status": "draft"},
                {"votes": {"$gt": 10}},
                {"pinned": true}
            ]})
            .as_object()
            .unwrap()
        );
    }

    #[test]
    fn test_or_query_builder_error_propagates() {
        let result = Query::<Post>::new(context()).or_query(vec![OrOperand::builder(
            |query: Query<Post>| query.where_op("votes", "like", 1),
        )]);
        assert!(matches!(result, Err(ObjectModelError::InvalidOperator(_))));
    }

    #[test]
    fn test_or_query_rejects_other_class() {
        let result = Query::<Post>::new(context())
            .or_query(vec![OrOperand::Remote(RemoteQuery::new("Comment"))]);
        assert!(matches!(result, Err(ObjectModelError::RemoteService(_))));
    }

    // ========================================
    // Execution
    // ========================================

    #[tokio::test]
    async fn test_first_or_fail_not_found() {
        let result = Query::<Post>::new(context())
            .where_eq("title", "missing")
            .first_or_fail(None)
            .await;

        match result {
            Err(err @ ObjectModelError::NotFound { .. }) => {
                assert!(err.to_string().starts_with("No query results for model ["));
                assert!(err.to_string().contains("Post"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_or_new_and_create() {
        let ctx = context();
        let query = Query::<Post>::new(ctx.clone());

        let fresh = query.first_or_new([("title", "Hello")]).await.unwrap();
        assert!(fresh.id().is_none());
        assert_eq!(fresh.attribute("title"), Some(&AttrValue::from("Hello")));

        let created = query.first_or_create([("title", "Hello")]).await.unwrap();
        assert!(created.id().is_some());

        let found = query.first_or_create([("title", "Hello")]).await.unwrap();
        assert_eq!(found.id(), created.id());
        assert_eq!(query.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_variants() {
        let ctx = context();
        let mut post = crate::model::ObjectModel::<Post>::with_data(&ctx, [("title", "Hi")]);
        post.save().await.unwrap();
        let id = post.id().unwrap().to_string();

        let query = Query::<Post>::new(ctx.clone());
        let found = query.find_or_fail(&id, None).await.unwrap();
        assert_eq!(found.attribute("title"), Some(&AttrValue::from("Hi")));

        assert!(query.find("nope", None).await.unwrap().is_none());
        let fresh = query.find_or_new("nope", None).await.unwrap();
        assert!(fresh.id().is_none());
        assert!(matches!(
            query.find_or_fail("nope", None).await,
            Err(ObjectModelError::NotFound { .. })
        ));
    }
}
