//! Blog walkthrough against the in-memory store
//!
//! Run with: cargo run --example blog

use parsehaus::prelude::*;
use std::sync::Arc;

struct Author;

impl Entity for Author {
    const CLASS_NAME: &'static str = USER_CLASS;
    const RELATIONS: &'static [RelationDef<Self>] = &[RelationDef::new("articles", author_articles)];
}

impl UserEntity for Author {}

struct Article;

impl Entity for Article {
    const CLASS_NAME: &'static str = "Article";
    const RELATIONS: &'static [RelationDef<Self>] = &[
        RelationDef::new("author", article_author),
        RelationDef::new("tags", article_tags),
        RelationDef::new("comments", article_comments),
    ];
}

struct Tag;

impl Entity for Tag {
    const CLASS_NAME: &'static str = "Tag";
    const RELATIONS: &'static [RelationDef<Self>] = &[RelationDef::new("articles", tag_articles)];
}

struct Comment;

impl Entity for Comment {
    const CLASS_NAME: &'static str = "Comment";
}

fn tags(article: &mut ObjectModel<Article>) -> BelongsToMany<'_, Article, Tag> {
    article.belongs_to_many("tags")
}

fn author_articles(author: &mut ObjectModel<Author>) -> Box<dyn Relation + '_> {
    author.has_many::<Article>(Some("author")).boxed()
}

fn article_author(article: &mut ObjectModel<Article>) -> Box<dyn Relation + '_> {
    article.belongs_to::<Author>("author").boxed()
}

fn article_tags(article: &mut ObjectModel<Article>) -> Box<dyn Relation + '_> {
    tags(article).boxed()
}

fn article_comments(article: &mut ObjectModel<Article>) -> Box<dyn Relation + '_> {
    article.has_many::<Comment>(None).boxed()
}

fn tag_articles(tag: &mut ObjectModel<Tag>) -> Box<dyn Relation + '_> {
    tag.has_many_array::<Article>(None).boxed()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("📝 ParseHaus blog walkthrough");
    println!("=============================\n");

    let config = AppConfig::new(
        ServerConfig::new(
            "blog".to_string(),
            Some("rest-key".to_string()),
            None,
            "http://localhost:1337".to_string(),
            "parse".to_string(),
        ),
        ModelConfig::default(),
    );
    let store = Arc::new(MemoryStore::new());
    let parsehaus = ParseHaus::with_store(config, store.clone());
    let ctx = parsehaus.context();

    // Accounts
    let mut author = ObjectModel::<Author>::with_data(
        ctx,
        [("username", "ada"), ("password", "analytical"), ("name", "Ada")],
    );
    author.sign_up().await?;
    println!("✅ Signed up ada ({:?})", author.id());

    let session = ObjectModel::<Author>::log_in(ctx, "ada", "analytical").await?;
    println!("✅ Logged in, session token present: {}", session.session_token().is_some());

    // Articles and tags
    let mut article = ObjectModel::<Article>::create(
        ctx,
        [
            ("title", AttrValue::from("Notes on the engine")),
            ("author", AttrValue::from(&author)),
            ("views", AttrValue::from(0)),
        ],
    )
    .await?;

    let rust = ObjectModel::<Tag>::create(ctx, [("name", "rust")]).await?;
    let history = ObjectModel::<Tag>::with_data(ctx, [("name", "history")]);
    tags(&mut article).save(vec![rust.clone(), history], true).await?;
    tags(&mut article).save(vec![rust.clone()], true).await?;
    println!(
        "✅ Article tagged {} times",
        article.attribute("tags").map(AttrValue::array_len).unwrap_or(0)
    );

    let comments = article.has_many::<Comment>(None);
    comments.create([("body", "Fascinating")]).await?;
    comments.create([("body", "More please")]).await?;

    article.increment("views", 3).save().await?;

    // Queries
    let popular = Article::query(ctx)
        .where_op("views", ">=", 1)?
        .with("author")
        .order_by("createdAt", false)
        .get(None)
        .await?;
    println!("🔍 {} popular article(s)", popular.len());

    let either = Article::query(ctx)
        .where_eq("title", "Missing")
        .or_query(vec![OrOperand::builder(|query: Query<Article>| {
            Ok(query.starts_with("title", "Notes"))
        })])?;
    println!("🔍 $or query matched {} article(s)", either.count().await?);

    match Article::query(ctx).where_eq("title", "Nope").first_or_fail(None).await {
        Err(err) => println!("⚠️  {}", err),
        Ok(_) => println!("unexpected match"),
    }

    // Relations
    store.clear_requests();
    let mut article = Article::query(ctx).first_or_fail(None).await?;
    for _ in 0..3 {
        article.get("author").await?;
    }
    println!(
        "🔗 Author resolved with {} fetch(es) for three reads",
        store.request_count("get")
    );

    let mut rust = rust;
    let tagged = rust.get("articles").await?;
    println!(
        "🔗 Articles tagged rust: {}",
        tagged.as_relation().map(RelationValue::len).unwrap_or(0)
    );

    article.get("comments").await?;
    article.get("tags").await?;
    println!("\n📦 Serialized article:");
    println!("{}", serde_json::to_string_pretty(&article)?);

    Ok(())
}
