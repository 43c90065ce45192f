//! `SeaORM` entities for every table created by the `migration` crate.

pub mod chat_messages;
pub mod comments;
pub mod habits;
pub mod notes;
pub mod portfolios;
pub mod post_likes;
pub mod posts;
pub mod strategies;
pub mod trades;
pub mod users;
pub mod watchlist;

pub use crate::models::{HabitCompletion, HabitLog, StringList};
