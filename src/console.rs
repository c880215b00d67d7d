//! Text console for playing against the engine.
//!
//! The session prints the board with coordinate headers, reads human actions
//! in the canonical text form, and answers with the engine's action on its
//! turn.
//!
//! ## Commands
//!
//! - `m <x> <y> <dir>` - Move the piece at (x, y) one step
//! - `e <x> <y> <to_x> <to_y>` - Capture with the piece at (x, y)
//! - `l <x> <y>` - List the squares the piece at (x, y) can capture
//!
//! ## Example
//!
//! ```no_run
//! use surakarta_mcts::console::GameSession;
//! use surakarta_mcts::rules::Color;
//!
//! let mut session = GameSession::new(Color::Black).with_search(50, 10);
//! let stdin = std::io::stdin();
//! session.run(stdin.lock(), std::io::stdout()).unwrap();
//! ```

use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use fastrand::Rng;
use log::{debug, info};

use crate::action::Action;
use crate::board::Board;
use crate::constants::{DEFAULT_BREADTH, DEFAULT_ITERATIONS, N};
use crate::mcts::SearchTree;
use crate::rules::{Color, Phase};

/// A game between a human at the console and the engine.
pub struct GameSession {
    /// Current game position
    board: Board,
    /// Color played by the engine
    ai_color: Color,
    /// Search cycles per engine move
    iterations: usize,
    /// Expansion breadth per engine move
    breadth: usize,
    /// File that receives each engine action, if any
    action_file: Option<PathBuf>,
    rng: Rng,
}

impl GameSession {
    /// Create a session with default search settings.
    pub fn new(ai_color: Color) -> Self {
        Self {
            board: Board::new(),
            ai_color,
            iterations: DEFAULT_ITERATIONS,
            breadth: DEFAULT_BREADTH,
            action_file: None,
            rng: Rng::new(),
        }
    }

    pub fn with_search(mut self, iterations: usize, breadth: usize) -> Self {
        self.iterations = iterations.max(1);
        self.breadth = breadth.max(1);
        self
    }

    /// Make engine moves reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self
    }

    pub fn with_action_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.action_file = Some(path.into());
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Run the game loop until the game ends or the input is exhausted.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        let mut lines = input.lines();

        while !self.board.is_terminal() {
            print_board(&self.board, &mut output)?;

            if self.board.side_to_move() == Some(self.ai_color) {
                if !self.engine_turn(&mut output)? {
                    break;
                }
                continue;
            }

            if self.board.legal_actions().is_empty() {
                writeln!(output, "no legal action")?;
                break;
            }
            let Some(line) = lines.next() else {
                return Ok(());
            };
            let line = line.context("failed to read input")?;
            self.human_turn(line.trim(), &mut output)?;
        }

        print_board(&self.board, &mut output)?;
        write!(output, "game over")?;
        match self.board.phase() {
            Phase::RedWon => write!(output, ", red won")?,
            Phase::BlackWon => write!(output, ", black won")?,
            _ => {}
        }
        writeln!(output)?;
        Ok(())
    }

    /// Search and play the engine's action. Returns `false` if it has none.
    fn engine_turn<W: Write>(&mut self, output: &mut W) -> Result<bool> {
        let mut tree = SearchTree::with_rng(&self.board, self.rng.fork());
        let Some(action) = tree.search(self.iterations, self.breadth) else {
            writeln!(output, "no legal action")?;
            return Ok(false);
        };
        self.board.apply(&action);
        info!("engine plays {action}");

        writeln!(output, "{action}")?;
        writeln!(
            output,
            "winning probability: {:.2}%\n",
            100.0 * tree.winrate().unwrap_or(0.0)
        )?;
        if let Some(path) = &self.action_file {
            fs::write(path, action.to_string())
                .with_context(|| format!("failed to write action to {}", path.display()))?;
        }
        Ok(true)
    }

    fn human_turn<W: Write>(&mut self, line: &str, output: &mut W) -> Result<()> {
        if let Some(targets) = self.list_captures(line) {
            if targets.is_empty() {
                writeln!(output, "can not capture any piece")?;
            } else {
                let list: Vec<String> = targets.iter().map(|(x, y)| format!("({x}, {y})")).collect();
                writeln!(output, "{}", list.join(" "))?;
            }
            return Ok(());
        }

        match line.parse::<Action>() {
            Ok(action) => match self.board.try_apply(&action) {
                Ok(()) => debug!("human plays {action}"),
                Err(e) => {
                    debug!("rejected {action}: {e}");
                    writeln!(output, "invalid command")?;
                }
            },
            Err(e) => {
                debug!("unparsable input '{line}': {e}");
                writeln!(output, "invalid command")?;
            }
        }
        Ok(())
    }

    /// Handle `l <x> <y>`, returning `None` if the line is not a list command.
    fn list_captures(&self, line: &str) -> Option<Vec<(usize, usize)>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [verb, x, y] if verb.eq_ignore_ascii_case("l") => {
                let x = x.parse().ok()?;
                let y = y.parse().ok()?;
                Some(self.board.legal_captures(x, y))
            }
            _ => None,
        }
    }
}

/// Print the board with column and row numbers and the current phase.
pub fn print_board<W: Write>(board: &Board, output: &mut W) -> Result<()> {
    let header: Vec<String> = (0..N).map(|x| x.to_string()).collect();
    writeln!(output, "  {}", header.join(" "))?;
    for (y, row) in board.to_string().lines().enumerate() {
        writeln!(output, "{y} {row}")?;
    }
    writeln!(output, "status: {}\n", board.phase())?;
    Ok(())
}

/// Play the engine against itself from `board`.
///
/// Stops when the game is decided, when the side to move has no action, or
/// after `max_plies` actions. Each action is written to `output`. Returns the
/// final phase.
pub fn self_play<W: Write>(
    board: &mut Board,
    iterations: usize,
    breadth: usize,
    max_plies: usize,
    rng: &mut Rng,
    output: &mut W,
) -> Result<Phase> {
    for ply in 0..max_plies {
        if board.is_terminal() {
            break;
        }
        let mut tree = SearchTree::with_rng(board, rng.fork());
        let Some(action) = tree.search(iterations, breadth) else {
            info!("no legal action at ply {ply}");
            break;
        };
        board.apply(&action);
        writeln!(
            output,
            "{:>3}. {action}  ({})",
            ply + 1,
            board.phase()
        )?;
    }
    Ok(board.phase())
}
