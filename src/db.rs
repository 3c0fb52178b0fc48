//! Database connection and schema bootstrap.
//!
//! Tables are created from the entity definitions with `IF NOT EXISTS`, parents
//! before children so foreign keys resolve on every backend.

use crate::app_config::DatabaseConfig;
use crate::orm::{
    achievements, admin_sessions, admins, alumni, blog_posts, forum_categories, forum_posts,
    forum_replies, initiatives, projects, workshops,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

/// Opens a pooled connection. In-memory SQLite is pinned to a single
/// connection, otherwise every pooled connection would see its own database.
pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    if url.starts_with("sqlite::memory:") || url.contains("mode=memory") {
        opt.max_connections(1);
    } else {
        opt.max_connections(config.max_connections);
    }
    opt.sqlx_logging(false);

    Database::connect(opt).await
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

/// Creates every table that does not exist yet.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, admins::Entity).await?;
    create_table(db, &schema, admin_sessions::Entity).await?;
    create_table(db, &schema, forum_categories::Entity).await?;
    create_table(db, &schema, forum_posts::Entity).await?;
    create_table(db, &schema, forum_replies::Entity).await?;
    create_table(db, &schema, achievements::Entity).await?;
    create_table(db, &schema, initiatives::Entity).await?;
    create_table(db, &schema, workshops::Entity).await?;
    create_table(db, &schema, alumni::Entity).await?;
    create_table(db, &schema, projects::Entity).await?;
    create_table(db, &schema, blog_posts::Entity).await?;

    log::debug!("Database schema ready");
    Ok(())
}

/// Connect and make sure the schema exists.
pub async fn init_db(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let db = connect(url, config).await?;
    create_schema(&db).await?;
    log::info!("Connected to database ({:?})", db.get_database_backend());
    Ok(db)
}
