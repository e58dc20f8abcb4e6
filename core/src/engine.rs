use core::num::Saturating;
use core::time::Duration;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::InProgress
    }
}

/// Valid transitions:
/// - Idle -> OneRevealed
/// - OneRevealed -> Idle (second card matched)
/// - OneRevealed -> MismatchWait (second card differed)
/// - MismatchWait -> Idle (countdown lapsed, both cards hidden again)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Selection {
    Idle,
    OneRevealed(Coord2),
    MismatchWait {
        first: Coord2,
        second: Coord2,
        remaining: Duration,
    },
}

impl Default for Selection {
    fn default() -> Self {
        Self::Idle
    }
}

/// Represents a game from deal to win. Mutates only through [`Self::flip`]
/// and [`Self::tick`]; the host owns the clock and feeds elapsed time in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairEngine {
    layout: PairLayout,
    board: Array2<EngineCell>,
    selection: Selection,
    mismatch_wait: Duration,
    matched_count: Saturating<CellCount>,
    move_count: u32,
    status: GameStatus,
}

impl PairEngine {
    pub fn new(layout: PairLayout, mismatch_wait: Duration) -> Self {
        let size = layout.size();
        Self {
            layout,
            board: Array2::default((size, size).to_nd_index()),
            selection: Default::default(),
            mismatch_wait,
            matched_count: Saturating(0),
            move_count: 0,
            status: Default::default(),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn size(&self) -> Coord {
        self.layout.size()
    }

    pub fn total_pairs(&self) -> CellCount {
        self.layout.pair_count()
    }

    /// How many pairs are still face-down.
    pub fn pairs_left(&self) -> CellCount {
        self.layout.pair_count() - self.matched_count.0 / 2
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn cell_at(&self, coords: Coord2) -> EngineCell {
        self.board[coords.to_nd_index()]
    }

    /// Whether two mismatched cards are face-up waiting to be hidden again.
    pub fn is_waiting(&self) -> bool {
        matches!(self.selection, Selection::MismatchWait { .. })
    }

    pub fn can_interact_at(&self, coords: Coord2) -> bool {
        !self.is_finished()
            && !self.is_waiting()
            && self.layout.validate_coords(coords).is_ok()
            && self.board[coords.to_nd_index()].is_hidden()
    }

    /// Turn the card at `coords` face-up. Disallowed clicks (out of bounds,
    /// card already face-up, mismatch wait active) are dropped as `Ignored`
    /// so the host never has to pre-validate input.
    pub fn flip(&mut self, coords: Coord2) -> FlipOutcome {
        use FlipOutcome::*;

        if self.layout.validate_coords(coords).is_err() {
            return Ignored;
        }
        if !self.board[coords.to_nd_index()].is_hidden() {
            return Ignored;
        }

        match self.selection {
            Selection::MismatchWait { .. } => Ignored,
            Selection::Idle => {
                self.board[coords.to_nd_index()] = EngineCell::Revealed;
                self.selection = Selection::OneRevealed(coords);
                FirstFlipped(FlipEvent { coords })
            }
            Selection::OneRevealed(first) => {
                self.board[coords.to_nd_index()] = EngineCell::Revealed;
                self.move_count = self.move_count.saturating_add(1);

                if self.layout[first] == self.layout[coords] {
                    self.finish_match(first, coords);
                    Matched(FlipEvent { coords })
                } else {
                    self.selection = Selection::MismatchWait {
                        first,
                        second: coords,
                        remaining: self.mismatch_wait,
                    };
                    Mismatched(FlipEvent { coords })
                }
            }
        }
    }

    /// Advance the mismatch countdown. The only time-driven transition: once
    /// the wait lapses both selected cards go face-down and input unlocks.
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        let Selection::MismatchWait {
            first,
            second,
            remaining,
        } = self.selection
        else {
            return TickOutcome::NoChange;
        };

        match remaining.checked_sub(elapsed) {
            Some(left) if !left.is_zero() => {
                self.selection = Selection::MismatchWait {
                    first,
                    second,
                    remaining: left,
                };
                TickOutcome::NoChange
            }
            _ => {
                self.board[first.to_nd_index()] = EngineCell::Hidden;
                self.board[second.to_nd_index()] = EngineCell::Hidden;
                self.selection = Selection::Idle;
                TickOutcome::CardsHidden
            }
        }
    }

    /// Pure read projection for the renderer. Face-down cells carry no value.
    pub fn snapshot(&self) -> Array2<CellView> {
        Array2::from_shape_fn(self.board.dim(), |(x, y)| {
            let coords = (x as Coord, y as Coord);
            CellView::new(self.board[(x, y)], self.layout[coords])
        })
    }

    fn finish_match(&mut self, first: Coord2, second: Coord2) {
        self.board[first.to_nd_index()] = EngineCell::Matched;
        self.board[second.to_nd_index()] = EngineCell::Matched;
        self.matched_count += 2;
        self.selection = Selection::Idle;

        if self.matched_count == Saturating(self.layout.total_cells()) {
            self.status = GameStatus::Won;
            log::debug!(
                "all {} pairs found in {} moves",
                self.layout.pair_count(),
                self.move_count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const WAIT: Duration = Duration::from_millis(1000);

    fn layout(size: Coord, values: &[CardValue]) -> PairLayout {
        let values =
            Array2::from_shape_vec((size as usize, size as usize), Vec::from(values)).unwrap();
        PairLayout::from_values(values).unwrap()
    }

    // (0,0)=5 (1,0)=7 / (0,1)=7 (1,1)=5, indexed as (x, y)
    fn engine_2x2() -> PairEngine {
        PairEngine::new(layout(2, &[5, 7, 7, 5]), WAIT)
    }

    #[test]
    fn first_flip_reveals_without_counting_a_move() {
        let mut engine = engine_2x2();

        let outcome = engine.flip((0, 0));

        assert_eq!(
            outcome,
            FlipOutcome::FirstFlipped(FlipEvent { coords: (0, 0) })
        );
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Revealed);
        assert_eq!(engine.move_count(), 0);
    }

    #[test]
    fn matching_pair_locks_both_cells() {
        let mut engine = engine_2x2();

        engine.flip((0, 0));
        let outcome = engine.flip((1, 1));

        assert_eq!(outcome, FlipOutcome::Matched(FlipEvent { coords: (1, 1) }));
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Matched);
        assert!(engine.cell_at((1, 1)).is_matched());
        assert_eq!(engine.move_count(), 1);
        assert_eq!(engine.total_pairs(), 2);
        assert_eq!(engine.pairs_left(), 1);
        assert_eq!(engine.flip((0, 0)), FlipOutcome::Ignored);
    }

    #[test]
    fn mismatch_keeps_cards_up_until_the_wait_lapses() {
        let mut engine = engine_2x2();

        engine.flip((0, 0));
        let outcome = engine.flip((1, 0));

        assert_eq!(
            outcome,
            FlipOutcome::Mismatched(FlipEvent { coords: (1, 0) })
        );
        assert!(engine.is_waiting());

        assert_eq!(engine.tick(Duration::from_millis(400)), TickOutcome::NoChange);
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Revealed);
        assert!(engine.cell_at((1, 0)).is_face_up());

        assert_eq!(
            engine.tick(Duration::from_millis(700)),
            TickOutcome::CardsHidden
        );
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Hidden);
        assert_eq!(engine.cell_at((1, 0)), EngineCell::Hidden);
        assert!(!engine.is_waiting());
        assert_eq!(
            engine.flip((0, 0)),
            FlipOutcome::FirstFlipped(FlipEvent { coords: (0, 0) })
        );
    }

    #[test]
    fn exact_wait_duration_lapses() {
        let mut engine = engine_2x2();

        engine.flip((0, 0));
        engine.flip((1, 0));

        assert_eq!(engine.tick(WAIT), TickOutcome::CardsHidden);
    }

    #[test]
    fn clicks_are_ignored_while_the_mismatch_wait_is_active() {
        let mut engine = engine_2x2();

        engine.flip((0, 0));
        engine.flip((1, 0));

        assert_eq!(engine.flip((1, 1)), FlipOutcome::Ignored);
        assert_eq!(engine.cell_at((1, 1)), EngineCell::Hidden);
        assert_eq!(engine.move_count(), 1);
        assert!(!engine.can_interact_at((1, 1)));
    }

    #[test]
    fn revealed_and_out_of_bounds_clicks_are_ignored() {
        let mut engine = engine_2x2();

        engine.flip((0, 0));

        assert_eq!(engine.flip((0, 0)), FlipOutcome::Ignored);
        assert_eq!(engine.flip((5, 5)), FlipOutcome::Ignored);
        assert_eq!(engine.move_count(), 0);
    }

    #[test]
    fn move_counter_only_counts_completed_turns() {
        let mut engine = engine_2x2();

        assert!(!engine.flip((0, 0)).completes_turn());
        assert_eq!(engine.move_count(), 0);
        assert!(engine.flip((1, 0)).completes_turn());
        assert_eq!(engine.move_count(), 1);

        engine.tick(WAIT);
        engine.flip((0, 0));
        assert_eq!(engine.move_count(), 1);
        assert!(engine.flip((1, 1)).completes_turn());
        assert_eq!(engine.move_count(), 2);
    }

    #[test]
    fn two_pair_board_is_won_after_a_mismatch_and_two_matches() {
        let mut engine = engine_2x2();

        engine.flip((0, 0));
        assert_eq!(engine.flip((1, 0)), FlipOutcome::Mismatched(FlipEvent { coords: (1, 0) }));
        engine.tick(Duration::from_millis(1001));

        engine.flip((0, 0));
        assert_eq!(engine.flip((1, 1)), FlipOutcome::Matched(FlipEvent { coords: (1, 1) }));
        assert_eq!(engine.status(), GameStatus::InProgress);

        engine.flip((1, 0));
        assert_eq!(engine.flip((0, 1)), FlipOutcome::Matched(FlipEvent { coords: (0, 1) }));

        assert_eq!(engine.status(), GameStatus::Won);
        assert!(engine.is_finished());
        assert_eq!(engine.move_count(), 3);
        assert_eq!(engine.pairs_left(), 0);
    }

    #[test]
    fn clean_two_match_game_is_won_in_two_moves() {
        let mut engine = PairEngine::new(layout(2, &[1, 2, 2, 1]), WAIT);

        engine.flip((0, 0));
        engine.flip((1, 1));
        engine.flip((1, 0));
        engine.flip((0, 1));

        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(engine.move_count(), 2);
    }

    #[test]
    fn snapshot_never_exposes_face_down_values() {
        let mut engine = engine_2x2();
        engine.flip((0, 0));

        let snapshot = engine.snapshot();

        assert_eq!(
            snapshot[(0, 0)],
            CellView {
                value: Some(5),
                revealed: true,
                matched: false,
            }
        );
        for coords in [(1, 0), (0, 1), (1, 1)] {
            assert_eq!(snapshot[coords].value, None);
            assert!(!snapshot[coords].revealed);
        }
    }

    #[test]
    fn tick_without_an_active_wait_changes_nothing() {
        let mut engine = engine_2x2();

        assert_eq!(engine.tick(WAIT), TickOutcome::NoChange);

        engine.flip((0, 0));
        assert_eq!(engine.tick(WAIT), TickOutcome::NoChange);
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Revealed);
    }
}
