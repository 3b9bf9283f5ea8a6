pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod provider;
pub mod server;
pub mod source;
