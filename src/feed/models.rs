use serde::Deserialize;

/// Action kind of a story acceptance, the only activity that earns a reward.
pub const QUALIFYING_ACTION: &str = "acceptance";

/// One notification from the tracker feed. Only the action kind matters
/// here, every other field of the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityRecord {
    pub action: String,
}

impl ActivityRecord {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    pub fn is_qualifying(&self) -> bool {
        self.action == QUALIFYING_ACTION
    }
}

/// Number of records that each earn one reward.
pub fn count_qualifying(records: &[ActivityRecord]) -> usize {
    records.iter().filter(|r| r.is_qualifying()).count()
}
