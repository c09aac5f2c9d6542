//! Core data model types for links_db

mod auth;
mod link;
mod menu;

pub use auth::{PasswordRecord, TokenRecord, UserRecord};
pub use link::Link;
pub use menu::{strip_children, MenuNode, CHILDREN_FIELD};

pub(crate) use auth::now_millis;
