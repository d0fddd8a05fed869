use super::models::RewardId;
use anyhow::{bail, Result};
use rand::Rng;

pub const DEFAULT_CATALOG_SIZE: u32 = 150;

/// Fixed enumeration of reward identifiers `1..=size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardCatalog {
    size: u32,
}

impl RewardCatalog {
    pub fn new(size: u32) -> Result<Self> {
        if size == 0 {
            bail!("Reward catalog must contain at least one reward");
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn contains(&self, reward: RewardId) -> bool {
        (1..=self.size).contains(&reward)
    }

    /// Draws one reward uniformly at random. Draws are independent, so the
    /// same reward can come up more than once.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> RewardId {
        rng.random_range(1..=self.size)
    }

    /// Draws `count` independent rewards.
    pub fn draw_many<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<RewardId> {
        (0..count).map(|_| self.draw(rng)).collect()
    }
}

impl Default for RewardCatalog {
    fn default() -> Self {
        Self {
            size: DEFAULT_CATALOG_SIZE,
        }
    }
}
