pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod pagination;
pub mod routes;

pub use routes::{app, AppState};
