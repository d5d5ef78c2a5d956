// Library exports for directory-server
pub mod config;
pub mod errors;
pub mod models;
pub mod server;
