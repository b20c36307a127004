//! Blog entities shared by the integration tests

#![allow(dead_code)]

use parsehaus::prelude::*;
use std::sync::Arc;

pub struct User;

impl Entity for User {
    const CLASS_NAME: &'static str = USER_CLASS;
    const RELATIONS: &'static [RelationDef<Self>] = &[RelationDef::new("posts", user_posts)];
}

impl UserEntity for User {}

pub struct Post;

impl Entity for Post {
    const CLASS_NAME: &'static str = "Post";
    const RELATIONS: &'static [RelationDef<Self>] = &[
        RelationDef::new("user", post_user),
        RelationDef::new("categories", post_categories),
        RelationDef::new("comments", post_comments),
    ];
}

pub struct Category;

impl Entity for Category {
    const CLASS_NAME: &'static str = "Category";
    const RELATIONS: &'static [RelationDef<Self>] = &[RelationDef::new("posts", category_posts)];
}

pub struct Comment;

impl Entity for Comment {
    const CLASS_NAME: &'static str = "Comment";
}

pub fn categories(post: &mut ObjectModel<Post>) -> BelongsToMany<'_, Post, Category> {
    post.belongs_to_many("categories")
}

fn user_posts(user: &mut ObjectModel<User>) -> Box<dyn Relation + '_> {
    user.has_many::<Post>(Some("user")).boxed()
}

fn post_user(post: &mut ObjectModel<Post>) -> Box<dyn Relation + '_> {
    post.belongs_to::<User>("user").boxed()
}

fn post_categories(post: &mut ObjectModel<Post>) -> Box<dyn Relation + '_> {
    categories(post).boxed()
}

fn post_comments(post: &mut ObjectModel<Post>) -> Box<dyn Relation + '_> {
    post.has_many::<Comment>(None).boxed()
}

fn category_posts(category: &mut ObjectModel<Category>) -> Box<dyn Relation + '_> {
    category.has_many_array::<Post>(None).boxed()
}

/// A fresh store and a context on it
pub fn setup() -> (Arc<MemoryStore>, ModelContext) {
    let store = Arc::new(MemoryStore::new());
    let context = ModelContext::new(store.clone());
    (store, context)
}

pub async fn sign_up(context: &ModelContext, username: &str) -> ObjectModel<User> {
    let mut user = ObjectModel::<User>::with_data(
        context,
        [("username", username), ("password", "secret"), ("name", username)],
    );
    user.sign_up().await.unwrap();
    user
}

pub async fn category(context: &ModelContext, name: &str) -> ObjectModel<Category> {
    ObjectModel::<Category>::create(context, [("name", name)]).await.unwrap()
}
