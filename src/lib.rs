pub mod aggregate;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod state;
pub mod types;

pub use routes::app;
pub use state::AppState;
