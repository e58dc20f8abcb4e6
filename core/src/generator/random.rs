use alloc::vec::Vec;
use ndarray::Array2;

use super::*;

/// Deals the value multiset `{1..pairs}` twice over, uniformly shuffled with
/// a seeded RNG so the same seed always deals the same board.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> Result<PairLayout> {
        use rand::prelude::*;

        let total = config.total_cells();
        if total == 0 || total % 2 != 0 {
            return Err(GameError::OddCellCount);
        }

        let mut values: Vec<CardValue> = (1..=config.pair_count())
            .flat_map(|value| [value, value])
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        values.shuffle(&mut rng);

        let size = config.size as usize;
        let values =
            Array2::from_shape_vec((size, size), values).expect("shuffled deal fills the grid");
        log::debug!(
            "dealt {} pairs on a {size}x{size} board, seed {}",
            config.pair_count(),
            self.seed
        );
        PairLayout::from_values(values)
    }
}
