// Disk cache admission: which fetched payloads get written to the disk cache tiers.

pub mod request;
pub mod strategy;
pub mod types;
