// Host-facing API surface exposed through flutter_rust_bridge.

pub mod cache_api;
pub mod simple;
