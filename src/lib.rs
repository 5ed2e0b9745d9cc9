pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod marker;
pub mod models;
pub mod stats;
pub mod store;
pub mod validate;
