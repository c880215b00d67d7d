//! Constants for board geometry and search parameters.
//!
//! Surakarta is only played on a 6x6 board, so the geometry is fixed here
//! rather than selected through features.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
pub const N: usize = 6;

/// The four corner squares. No circular track passes through a corner, so a
/// capture ray that reaches one stops there.
pub const CORNERS: [(usize, usize); 4] = [(0, 0), (0, N - 1), (N - 1, 0), (N - 1, N - 1)];

/// Pieces per side at the start of a game (two full rows).
pub const PIECES_PER_SIDE: usize = 2 * N;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of select/expand/playout/backpropagate cycles per move.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Default number of distinct actions drawn when a node is expanded.
pub const DEFAULT_BREADTH: usize = 10;

/// Smoothing term in the UCT formula. Keeps unvisited children finite and
/// scales the random tie-break jitter.
pub const UCT_EPSILON: f64 = f64::EPSILON;

/// Maximum plies in one random playout before it is scored as undetermined.
pub const MAX_PLAYOUT_PLIES: usize = 2000;
