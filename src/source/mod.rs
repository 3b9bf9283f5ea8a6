// Image sources: pluggable fetch backends for network, content-provider and packaged-resource models.

pub mod http_source;
pub mod model;
pub mod provider_source;
pub mod resource_source;
pub mod traits;
