mod catalog;
mod models;

pub use catalog::{RewardCatalog, DEFAULT_CATALOG_SIZE};
pub use models::{epoch, Entity, EntityCheckpoint, RewardId};
