pub mod config;
pub mod database;
pub mod entity;
pub mod models;
pub mod redis;
pub mod templates;

pub use config::{CloudinaryConfig, Config, GeminiConfig, SmtpConfig};
pub use database::get_db_connection;
pub use redis::{get_redis_client, get_redis_connection, Redis};
pub use models::*;
pub use templates::{PasswordResetEmail, WelcomeEmail};
