pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod commerce;
pub mod config;
pub mod db;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod transport;
