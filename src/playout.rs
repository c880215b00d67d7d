//! Random-policy playouts.
//!
//! A playout plays random legal actions on a private copy of the board until
//! the game is decided. The policy always takes a capture when one exists.
//!
//! Randomness comes from a caller-supplied [`fastrand::Rng`], so a seeded
//! generator makes playouts, and therefore whole searches, reproducible.

use fastrand::Rng;
use log::trace;

use crate::action::Action;
use crate::board::Board;
use crate::constants::MAX_PLAYOUT_PLIES;
use crate::rules::Phase;

/// Result of a playout relative to the target phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The target phase was reached
    Win,
    /// The opposite phase was reached
    Loss,
    /// The side to move had no action, or the ply limit ran out
    Undetermined,
}

/// Pick a random legal action for the side to move.
///
/// Captures are preferred: if any piece can capture, the result is drawn
/// uniformly from all (piece, target) capture pairs. Otherwise it is drawn
/// uniformly from all (piece, direction) moves. Returns `None` when the game
/// is over or the side to move is stuck.
pub fn choose_random_action(board: &Board, rng: &mut Rng) -> Option<Action> {
    let captures = board.capture_actions();
    if !captures.is_empty() {
        return Some(captures[rng.usize(..captures.len())]);
    }
    let moves = board.move_actions();
    if moves.is_empty() {
        return None;
    }
    Some(moves[rng.usize(..moves.len())])
}

/// Play random actions from `board` until `target` or its opposite is reached.
///
/// The given board is not modified.
pub fn playout(board: &Board, target: Phase, rng: &mut Rng) -> Outcome {
    let mut b = board.clone();
    let opposite = target.opposite();

    for ply in 0..MAX_PLAYOUT_PLIES {
        let phase = b.phase();
        if phase == target {
            return Outcome::Win;
        }
        if phase == opposite {
            return Outcome::Loss;
        }
        let Some(action) = choose_random_action(&b, rng) else {
            trace!("playout stuck after {ply} plies in phase {phase:?}");
            return Outcome::Undetermined;
        };
        b.apply(&action);
    }

    // The last action may have ended the game.
    match b.phase() {
        p if p == target => Outcome::Win,
        p if p == opposite => Outcome::Loss,
        _ => {
            trace!("playout hit the {MAX_PLAYOUT_PLIES} ply limit");
            Outcome::Undetermined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Color;

    #[test]
    fn test_random_action_is_legal() {
        let board = Board::new();
        let mut rng = Rng::with_seed(7);
        for _ in 0..50 {
            let action = choose_random_action(&board, &mut rng).unwrap();
            let mut b = board.clone();
            assert!(b.apply(&action), "{action}");
        }
    }

    #[test]
    fn test_capture_preferred_over_move() {
        let mut board = Board::empty(Phase::RedToMove);
        board.set(1, 4, Some(Color::Red));
        board.set(4, 1, Some(Color::Black));
        board.set(5, 5, Some(Color::Black));
        let mut rng = Rng::with_seed(1);
        for _ in 0..20 {
            let action = choose_random_action(&board, &mut rng).unwrap();
            assert_eq!(
                action,
                Action::Capture {
                    x: 1,
                    y: 4,
                    to_x: 4,
                    to_y: 1
                }
            );
        }
    }

    #[test]
    fn test_no_action_when_terminal() {
        let mut board = Board::empty(Phase::RedWon);
        board.set(2, 2, Some(Color::Red));
        let mut rng = Rng::with_seed(3);
        assert_eq!(choose_random_action(&board, &mut rng), None);
    }

    #[test]
    fn test_no_action_when_stuck() {
        // a lone red piece in the corner boxed in by black pieces
        let mut board = Board::empty(Phase::RedToMove);
        board.set(0, 0, Some(Color::Red));
        board.set(1, 0, Some(Color::Black));
        board.set(0, 1, Some(Color::Black));
        board.set(1, 1, Some(Color::Black));
        let mut rng = Rng::with_seed(3);
        assert_eq!(choose_random_action(&board, &mut rng), None);
        assert_eq!(
            playout(&board, Phase::RedWon, &mut rng),
            Outcome::Undetermined
        );
    }

    #[test]
    fn test_playout_already_decided() {
        let board = Board::empty(Phase::BlackWon);
        let mut rng = Rng::with_seed(5);
        assert_eq!(playout(&board, Phase::BlackWon, &mut rng), Outcome::Win);
        assert_eq!(playout(&board, Phase::RedWon, &mut rng), Outcome::Loss);
    }

    #[test]
    fn test_playout_forced_win() {
        let mut board = Board::empty(Phase::RedToMove);
        board.set(1, 4, Some(Color::Red));
        board.set(4, 1, Some(Color::Black));
        let mut rng = Rng::with_seed(11);
        assert_eq!(playout(&board, Phase::RedWon, &mut rng), Outcome::Win);
        // playing for the other side, the same line is a loss
        assert_eq!(playout(&board, Phase::BlackWon, &mut rng), Outcome::Loss);
    }

    #[test]
    fn test_playout_leaves_board_untouched() {
        let board = Board::new();
        let before = board.clone();
        let mut rng = Rng::with_seed(42);
        let _ = playout(&board, Phase::RedWon, &mut rng);
        assert_eq!(board, before);
    }
}
