// Engine plumbing: host context, transport cache, load orchestration and transfer stats.

pub mod context;
pub mod http_cache;
pub mod loader;
pub mod stats;
