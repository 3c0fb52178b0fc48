//! SeaORM Entity for admins

use sea_orm::entity::prelude::*;

/// Administrator identity. The hash is a PHC string and is never serialized.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::admin_sessions::Entity")]
    AdminSessions,
}

impl Related<super::admin_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
