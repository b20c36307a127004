//! Entity declarations
//!
//! An entity type names one remote class and lists the relations its models
//! can resolve. Relation lookup goes through the registry only, so an
//! undeclared name never resolves as a relation.
//!
//! ```ignore
//! struct Post;
//!
//! fn post_user(post: &mut ObjectModel<Post>) -> Box<dyn Relation + '_> {
//!     post.belongs_to::<User>("user").boxed()
//! }
//!
//! impl Entity for Post {
//!     const CLASS_NAME: &'static str = "Post";
//!     const RELATIONS: &'static [RelationDef<Self>] = &[RelationDef::new("user", post_user)];
//! }
//! ```

use crate::context::ModelContext;
use crate::model::ObjectModel;
use crate::query_builder::Query;
use crate::relations::Relation;
use remote_client::USER_CLASS;

/// Builds the relation bound to a parent model
pub type RelationFactory<E> = for<'a> fn(&'a mut ObjectModel<E>) -> Box<dyn Relation + 'a>;

pub struct RelationDef<E: Entity> {
    pub name: &'static str,
    pub factory: RelationFactory<E>,
}

impl<E: Entity> RelationDef<E> {
    pub const fn new(name: &'static str, factory: RelationFactory<E>) -> Self {
        Self { name, factory }
    }
}

pub trait Entity: Send + Sync + Sized + 'static {
    /// Remote class the entity lives in
    const CLASS_NAME: &'static str;

    const RELATIONS: &'static [RelationDef<Self>] = &[];

    fn query(context: &ModelContext) -> Query<Self> {
        Query::new(context.clone())
    }

    fn relation(name: &str) -> Option<&'static RelationDef<Self>> {
        Self::RELATIONS.iter().find(|def| def.name == name)
    }
}

/// Entities stored in the user class
pub trait UserEntity: Entity {}

/// The built-in user entity
#[derive(Debug)]
pub struct ParseUser;

impl Entity for ParseUser {
    const CLASS_NAME: &'static str = USER_CLASS;
}

impl UserEntity for ParseUser {}
