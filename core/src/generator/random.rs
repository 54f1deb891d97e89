use ndarray::Array2;

use super::*;

/// Attempts allowed per cell before placement gives up. Rejection sampling
/// with far fewer fires than playable cells settles well below this.
const ATTEMPTS_PER_CELL: u32 = 64;

/// Places fires by uniform rejection sampling over the square index space,
/// skipping non-playable cells and duplicates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomFireFieldGenerator {
    seed: u64,
}

impl RandomFireFieldGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl FireFieldGenerator for RandomFireFieldGenerator {
    fn generate(self, config: GameConfig) -> Result<FireField> {
        use rand::prelude::*;

        let playable = config.playable_mask();
        let playable_count: CellCount = playable
            .iter()
            .filter(|&&is_playable| is_playable)
            .count()
            .try_into()
            .unwrap();

        if config.fires > playable_count {
            log::warn!(
                "Requested {} fires but only {} playable cells",
                config.fires,
                playable_count
            );
            return Err(GameError::TooManyFires);
        }

        let mut fires: Array2<bool> = Array2::default(playable.dim());
        let mut placed: CellCount = 0;
        let max_attempts = u32::from(config.total_cells()) * ATTEMPTS_PER_CELL;
        let mut attempts = 0;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        while placed < config.fires {
            if attempts >= max_attempts {
                log::warn!(
                    "Fire placement stalled after {} attempts, placed {} of {}",
                    attempts,
                    placed,
                    config.fires
                );
                return Err(GameError::PlacementFailed);
            }
            attempts += 1;

            let row = rng.random_range(0..config.size);
            let col = rng.random_range(0..config.size);
            let coords: Coord2 = (row, col);

            if playable[coords.to_nd_index()] && !fires[coords.to_nd_index()] {
                fires[coords.to_nd_index()] = true;
                placed += 1;
            }
        }

        log::debug!("Placed {} fires in {} attempts", placed, attempts);
        Ok(FireField::from_parts(playable, fires))
    }
}
