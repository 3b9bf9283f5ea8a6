// Content provider bridge: packaged files exposed as pipes with cooperative cancellation.

pub mod content_provider;
pub mod pipe;
pub mod resources;
pub mod transfer;
pub mod uri;
