#![no_std]

extern crate alloc;

use alloc::collections::BTreeMap;
use core::ops::Index;
use core::time::Duration;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod generator;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord,
    pub mismatch_wait: Duration,
}

impl GameConfig {
    pub const DEFAULT_SIZE: Coord = 6;
    pub const DEFAULT_MISMATCH_WAIT: Duration = Duration::from_millis(1000);

    pub const fn new_unchecked(size: Coord, mismatch_wait: Duration) -> Self {
        Self {
            size,
            mismatch_wait,
        }
    }

    /// The board must deal complete pairs: a zero or odd `size * size` cell
    /// count is rejected before any game can start.
    pub fn new(size: Coord, mismatch_wait: Duration) -> Result<Self> {
        let total = mult(size, size);
        if total == 0 || total % 2 != 0 {
            return Err(GameError::OddCellCount);
        }
        Ok(Self::new_unchecked(size, mismatch_wait))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size, self.size)
    }

    pub const fn pair_count(&self) -> CellCount {
        self.total_cells() / 2
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(Self::DEFAULT_SIZE, Self::DEFAULT_MISMATCH_WAIT)
    }
}

/// Immutable square grid of card values dealt once per game. Every value
/// occurs on exactly two cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairLayout {
    values: Array2<CardValue>,
    pair_count: CellCount,
}

impl PairLayout {
    pub fn from_values(values: Array2<CardValue>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols || rows > usize::from(Coord::MAX) {
            return Err(GameError::InvalidBoardShape);
        }

        let total = values.len();
        if total == 0 || total % 2 != 0 {
            return Err(GameError::OddCellCount);
        }

        let mut occurrences: BTreeMap<CardValue, u8> = BTreeMap::new();
        for &value in values.iter() {
            *occurrences.entry(value).or_insert(0) += 1;
        }
        if occurrences.values().any(|&count| count != 2) {
            return Err(GameError::UnpairedValues);
        }

        let pair_count = (total / 2).try_into().unwrap();
        Ok(Self { values, pair_count })
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size && coords.1 < size {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord {
        self.values.dim().0.try_into().unwrap()
    }

    pub fn total_cells(&self) -> CellCount {
        self.values.len().try_into().unwrap()
    }

    pub fn pair_count(&self) -> CellCount {
        self.pair_count
    }

    pub fn value_at(&self, coords: Coord2) -> CardValue {
        self[coords]
    }
}

impl Index<Coord2> for PairLayout {
    type Output = CardValue;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.values[(x as usize, y as usize)]
    }
}

/// Side-effect signal for the host: the card at `coords` was just turned
/// face-up. Drives the flip sound and the renderer's pulse animation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlipEvent {
    pub coords: Coord2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlipOutcome {
    Ignored,
    FirstFlipped(FlipEvent),
    Matched(FlipEvent),
    Mismatched(FlipEvent),
}

impl FlipOutcome {
    pub const fn has_update(self) -> bool {
        use FlipOutcome::*;
        match self {
            Ignored => false,
            FirstFlipped(_) => true,
            Matched(_) => true,
            Mismatched(_) => true,
        }
    }

    pub const fn flip_event(self) -> Option<FlipEvent> {
        use FlipOutcome::*;
        match self {
            Ignored => None,
            FirstFlipped(event) => Some(event),
            Matched(event) => Some(event),
            Mismatched(event) => Some(event),
        }
    }

    /// A completed turn is a second card coming up, match or not.
    pub const fn completes_turn(self) -> bool {
        matches!(self, Self::Matched(_) | Self::Mismatched(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TickOutcome {
    NoChange,
    CardsHidden,
}

impl TickOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::CardsHidden => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn config_rejects_odd_cell_counts() {
        assert!(GameConfig::new(6, GameConfig::DEFAULT_MISMATCH_WAIT).is_ok());
        for size in [0, 3, 5] {
            assert_eq!(
                GameConfig::new(size, GameConfig::DEFAULT_MISMATCH_WAIT),
                Err(GameError::OddCellCount)
            );
        }
    }

    #[test]
    fn layout_requires_a_square_grid_of_paired_values() {
        let rect = Array2::from_shape_vec((1, 2), vec![1, 1]).unwrap();
        assert_eq!(
            PairLayout::from_values(rect),
            Err(GameError::InvalidBoardShape)
        );

        let lone = Array2::from_shape_vec((1, 1), vec![1]).unwrap();
        assert_eq!(PairLayout::from_values(lone), Err(GameError::OddCellCount));

        let unpaired = Array2::from_shape_vec((2, 2), vec![1, 1, 1, 2]).unwrap();
        assert_eq!(
            PairLayout::from_values(unpaired),
            Err(GameError::UnpairedValues)
        );

        let paired = Array2::from_shape_vec((2, 2), vec![1, 2, 2, 1]).unwrap();
        let layout = PairLayout::from_values(paired).unwrap();
        assert_eq!(layout.pair_count(), 2);
        assert_eq!(layout.value_at((0, 1)), 2);
        assert_eq!(layout.validate_coords((2, 0)), Err(GameError::InvalidCoords));
    }
}
