//! SeaORM Entity for forum_posts

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "forum_posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub author_name: String,
    pub author_email: Option<String>,
    /// Advisory link. Deleting the category detaches the post instead of removing it.
    pub category_id: Option<i32>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forum_categories::Entity",
        from = "Column::CategoryId",
        to = "super::forum_categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_many = "super::forum_replies::Entity")]
    ForumReplies,
}

impl Related<super::forum_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::forum_replies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumReplies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
