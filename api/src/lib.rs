use sqlx::{Pool, Postgres};

pub mod config;
pub mod discussion;
pub mod error;
pub mod identity;
pub mod json;

#[derive(Clone)]
pub struct App {
    pub pool: Pool<Postgres>,
}
