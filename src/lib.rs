//! Surakarta-MCTS: a Surakarta engine driven by Monte Carlo Tree Search.
//!
//! Surakarta is a 6x6 capture game in which pieces capture by travelling
//! along the circular tracks drawn around the board edge. This crate pairs an
//! exact rules engine with a plain UCT search that uses it as its state
//! transition oracle.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry and search defaults
//! - [`rules`] - Colors, game phases and directions
//! - [`board`] - Rules engine (moves, arc captures, win detection)
//! - [`action`] - Actions and their text form
//! - [`playout`] - Random policy and playouts
//! - [`mcts`] - Search tree with UCT selection
//! - [`console`] - Text console for human vs engine games
//!
//! ## Example
//!
//! ```
//! use surakarta_mcts::board::Board;
//! use surakarta_mcts::mcts::SearchTree;
//!
//! let mut board = Board::new();
//!
//! // Search for the side to move with a fixed seed
//! let mut tree = SearchTree::with_seed(&board, 42);
//! let best = tree.search(50, 5).expect("the opening has legal actions");
//! println!("Best action: {best}");
//!
//! assert!(board.apply(&best));
//! ```

pub mod action;
pub mod board;
pub mod console;
pub mod constants;
pub mod mcts;
pub mod playout;
pub mod rules;
