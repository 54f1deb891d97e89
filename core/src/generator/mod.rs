use crate::*;
pub use random::*;

mod random;

/// Strategy for distributing fire cells over the playable region.
pub trait FireFieldGenerator {
    fn generate(self, config: GameConfig) -> Result<FireField>;
}
