pub mod error;
pub mod loader;
pub mod models;
pub mod persister;
pub mod requests;
pub mod result;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
