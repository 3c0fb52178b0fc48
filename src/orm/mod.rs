//! SeaORM entities. One module per table.

pub mod achievements;
pub mod admin_sessions;
pub mod admins;
pub mod alumni;
pub mod blog_posts;
pub mod forum_categories;
pub mod forum_posts;
pub mod forum_replies;
pub mod initiatives;
pub mod projects;
pub mod workshops;
