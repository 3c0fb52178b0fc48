//! Creates an administrator account, or resets the password of an existing one.
//!
//! Admins are never created over HTTP; this is the way to add more than the
//! one bootstrapped at first start.

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use robosust::app_config;
use robosust::credentials::{create_admin, set_password};
use robosust::db::init_db;
use robosust::orm::admins;
use sea_orm::{entity::*, query::*};

#[derive(Parser)]
#[command(name = "create-admin")]
#[command(about = "Create an administrator or reset an administrator's password")]
struct Cli {
    /// Database connection URL. Defaults to DATABASE_URL, then the configured URL.
    #[arg(long)]
    database_url: Option<String>,

    #[arg(short, long)]
    username: String,

    /// Generated and printed when omitted.
    #[arg(short, long)]
    password: Option<String>,

    /// Replace the password when the admin already exists.
    #[arg(long)]
    reset: bool,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = app_config::get_config();

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| config.database.url.clone());
    let db = init_db(&database_url, &config.database)
        .await
        .context("Failed to connect to the database")?;

    let generated = cli.password.is_none();
    let password = cli.password.unwrap_or_else(|| {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(20)
            .map(char::from)
            .collect()
    });

    let existing = admins::Entity::find()
        .filter(admins::Column::Username.eq(cli.username.trim()))
        .one(&db)
        .await?;

    match existing {
        Some(admin) if cli.reset => {
            set_password(&db, admin.id, &password).await?;
            println!("Password reset for admin {:?}.", admin.username);
        }
        Some(admin) => bail!(
            "Admin {:?} already exists. Pass --reset to replace the password.",
            admin.username
        ),
        None => {
            let admin = create_admin(&db, &cli.username, &password).await?;
            println!("Created admin {:?} (id {}).", admin.username, admin.id);
        }
    }

    if generated {
        println!("Password: {}", password);
    }
    Ok(())
}
