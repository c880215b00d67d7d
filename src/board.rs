//! Surakarta board and rules engine.
//!
//! The board owns the 6x6 grid and the current [`Phase`]. It answers
//! legal-move and legal-capture queries, applies actions, and recomputes the
//! phase (including win detection) after every successful action.
//!
//! Captures travel along the circular tracks drawn around the board edge.
//! A ray leaves the grid, follows one of the arcs in [`CONNECTORS`], and
//! re-enters on a different edge heading a new way. A ray may only capture
//! after it has followed at least one arc.

use std::fmt;

use crate::action::Action;
use crate::constants::{CORNERS, N};
use crate::rules::{Color, Direction, Phase, Piece};

/// One circular track joining two board edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Connector {
    /// Off-board square a ray steps onto when it leaves the grid.
    pub exit: (isize, isize),
    /// Off-board square the ray continues from at the other end of the arc.
    pub entry: (isize, isize),
    /// Heading after the arc.
    pub heading: Direction,
}

const fn arc(exit: (isize, isize), entry: (isize, isize), heading: Direction) -> Connector {
    Connector {
        exit,
        entry,
        heading,
    }
}

/// The 16 arc endpoints, keyed by exit square (edge + offset).
///
/// Rows and columns 1 and 4 form the inner track, 2 and 3 the outer track.
/// Each arc is listed once from each end, so following an arc from `entry`
/// leads back to `exit`.
pub const CONNECTORS: [Connector; 16] = [
    // left edge
    arc((-1, 1), (1, -1), Direction::Down),
    arc((-1, 2), (2, -1), Direction::Down),
    arc((-1, 3), (2, 6), Direction::Up),
    arc((-1, 4), (1, 6), Direction::Up),
    // right edge
    arc((6, 1), (4, -1), Direction::Down),
    arc((6, 2), (3, -1), Direction::Down),
    arc((6, 3), (3, 6), Direction::Up),
    arc((6, 4), (4, 6), Direction::Up),
    // top edge
    arc((1, -1), (-1, 1), Direction::Right),
    arc((2, -1), (-1, 2), Direction::Right),
    arc((3, -1), (6, 2), Direction::Left),
    arc((4, -1), (6, 1), Direction::Left),
    // bottom edge
    arc((1, 6), (-1, 4), Direction::Right),
    arc((2, 6), (-1, 3), Direction::Right),
    arc((3, 6), (6, 3), Direction::Left),
    arc((4, 6), (6, 4), Direction::Left),
];

/// Look up the arc a ray follows after stepping off the grid onto `exit`.
pub fn connector(exit: (isize, isize)) -> Option<&'static Connector> {
    CONNECTORS.iter().find(|c| c.exit == exit)
}

#[inline]
fn on_board(x: isize, y: isize) -> bool {
    (0..N as isize).contains(&x) && (0..N as isize).contains(&y)
}

#[inline]
fn is_corner(x: isize, y: isize) -> bool {
    CORNERS
        .iter()
        .any(|&(cx, cy)| cx as isize == x && cy as isize == y)
}

/// Reason an action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalAction {
    /// The game is already won
    GameOver,
    /// Source coordinates are outside the board
    OutOfRange,
    /// No piece on the source square
    EmptySquare,
    /// The piece does not belong to the side to move
    WrongTurn,
    /// The step would leave the board
    OffBoard,
    /// The destination square is occupied
    Occupied,
    /// The target is not reachable along an arc
    NotCapturable,
}

impl fmt::Display for IllegalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            IllegalAction::GameOver => "game is over",
            IllegalAction::OutOfRange => "square out of range",
            IllegalAction::EmptySquare => "no piece to move",
            IllegalAction::WrongTurn => "not this piece's turn",
            IllegalAction::OffBoard => "step leaves the board",
            IllegalAction::Occupied => "destination occupied",
            IllegalAction::NotCapturable => "target cannot be captured",
        };
        write!(f, "illegal action: {reason}")
    }
}

impl std::error::Error for IllegalAction {}

/// A Surakarta position: the grid plus the current phase.
///
/// Cheap to clone; the search keeps an independent copy in every node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Piece; N]; N],
    phase: Phase,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Starting position: Black on rows 0-1, Red on rows 4-5, Red to move.
    pub fn new() -> Self {
        let mut board = Self::empty(Phase::RedToMove);
        board.new_game();
        board
    }

    /// A board with no pieces in the given phase. Used to set up positions.
    pub fn empty(phase: Phase) -> Self {
        Self {
            cells: [[None; N]; N],
            phase,
        }
    }

    /// Reset to the starting position.
    pub fn new_game(&mut self) {
        for (y, row) in self.cells.iter_mut().enumerate() {
            let piece = match y {
                0 | 1 => Some(Color::Black),
                4 | 5 => Some(Color::Red),
                _ => None,
            };
            *row = [piece; N];
        }
        self.phase = Phase::RedToMove;
    }

    /// Piece at `(x, y)`. Out-of-range squares read as empty.
    pub fn get(&self, x: usize, y: usize) -> Piece {
        if x >= N || y >= N {
            return None;
        }
        self.cells[y][x]
    }

    /// Place (or clear) a piece without any rule checks. Out-of-range
    /// squares are ignored.
    pub fn set(&mut self, x: usize, y: usize, piece: Piece) {
        if let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = piece;
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn side_to_move(&self) -> Option<Color> {
        self.phase.to_move()
    }

    /// Number of pieces of `color` on the board.
    pub fn count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&p| p == Some(color))
            .count()
    }

    /// Squares holding a piece of `color`, row by row.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..N)
            .flat_map(|y| (0..N).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.cells[y][x] == Some(color))
    }

    /// Check that the piece at `(x, y)` may act now, returning its color.
    fn check_movable(&self, x: usize, y: usize) -> Result<Color, IllegalAction> {
        if self.phase.is_terminal() {
            return Err(IllegalAction::GameOver);
        }
        if x >= N || y >= N {
            return Err(IllegalAction::OutOfRange);
        }
        let color = self.cells[y][x].ok_or(IllegalAction::EmptySquare)?;
        if self.phase.to_move() != Some(color) {
            return Err(IllegalAction::WrongTurn);
        }
        Ok(color)
    }

    /// Destination of a one-step move, validated against the board.
    fn move_target(
        &self,
        x: usize,
        y: usize,
        direction: Direction,
    ) -> Result<(usize, usize), IllegalAction> {
        self.check_movable(x, y)?;
        let (dx, dy) = direction.delta();
        let (nx, ny) = (x as isize + dx, y as isize + dy);
        if !on_board(nx, ny) {
            return Err(IllegalAction::OffBoard);
        }
        let (nx, ny) = (nx as usize, ny as usize);
        if self.cells[ny][nx].is_some() {
            return Err(IllegalAction::Occupied);
        }
        Ok((nx, ny))
    }

    /// Whether the piece at `(x, y)` may step one square in `direction`.
    pub fn can_move(&self, x: usize, y: usize, direction: Direction) -> bool {
        self.move_target(x, y, direction).is_ok()
    }

    /// All directions the piece at `(x, y)` may step in.
    pub fn legal_moves(&self, x: usize, y: usize) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&d| self.can_move(x, y, d))
            .collect()
    }

    /// All squares the piece at `(x, y)` may capture, without duplicates.
    ///
    /// Each of the four orthogonal directions yields at most one target.
    pub fn legal_captures(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let Ok(color) = self.check_movable(x, y) else {
            return Vec::new();
        };
        let mut targets = Vec::with_capacity(4);
        for dir in Direction::ORTHOGONAL {
            if let Some(t) = self.capture_target(x, y, dir, color) {
                if !targets.contains(&t) {
                    targets.push(t);
                }
            }
        }
        targets
    }

    /// Follow a capture ray from `(x, y)` starting in `start`.
    ///
    /// Empty squares are passed through, an own piece blocks the ray, and an
    /// enemy piece ends it. The enemy is a target only if the ray has followed
    /// at least one arc. Corners are never on a track and stop the ray.
    fn capture_target(
        &self,
        x: usize,
        y: usize,
        start: Direction,
        color: Color,
    ) -> Option<(usize, usize)> {
        let (mut cx, mut cy) = (x as isize, y as isize);
        let mut dir = start;
        let mut arcs = 0u32;
        // Directions already walked out of each square.
        let mut seen = [[0u8; N]; N];

        loop {
            if is_corner(cx, cy) {
                return None;
            }
            if on_board(cx, cy) {
                let mark = &mut seen[cy as usize][cx as usize];
                if *mark & dir.bits() != 0 {
                    return None;
                }
                *mark |= dir.bits();
            }

            let (dx, dy) = dir.delta();
            let (nx, ny) = (cx + dx, cy + dy);
            if !on_board(nx, ny) {
                let link = connector((nx, ny))?;
                (cx, cy) = link.entry;
                dir = link.heading;
                arcs += 1;
                continue;
            }

            match self.cells[ny as usize][nx as usize] {
                None => (cx, cy) = (nx, ny),
                Some(c) if c == color => return None,
                Some(_) => return (arcs > 0).then_some((nx as usize, ny as usize)),
            }
        }
    }

    /// Every capture available to the side to move, row by row.
    pub fn capture_actions(&self) -> Vec<Action> {
        let Some(color) = self.side_to_move() else {
            return Vec::new();
        };
        self.pieces(color)
            .flat_map(|(x, y)| {
                self.legal_captures(x, y)
                    .into_iter()
                    .map(move |(to_x, to_y)| Action::Capture { x, y, to_x, to_y })
            })
            .collect()
    }

    /// Every one-step move available to the side to move, row by row.
    pub fn move_actions(&self) -> Vec<Action> {
        let Some(color) = self.side_to_move() else {
            return Vec::new();
        };
        self.pieces(color)
            .flat_map(|(x, y)| {
                self.legal_moves(x, y)
                    .into_iter()
                    .map(move |direction| Action::Move { x, y, direction })
            })
            .collect()
    }

    /// Every legal action for the side to move, captures first.
    pub fn legal_actions(&self) -> Vec<Action> {
        let mut actions = self.capture_actions();
        actions.extend(self.move_actions());
        actions
    }

    /// Apply an action, reporting why it was rejected.
    ///
    /// A rejected action leaves the board untouched.
    pub fn try_apply(&mut self, action: &Action) -> Result<(), IllegalAction> {
        match *action {
            Action::Move { x, y, direction } => {
                let (nx, ny) = self.move_target(x, y, direction)?;
                self.cells[ny][nx] = self.cells[y][x].take();
            }
            Action::Capture { x, y, to_x, to_y } => {
                self.check_movable(x, y)?;
                if !self.legal_captures(x, y).contains(&(to_x, to_y)) {
                    return Err(IllegalAction::NotCapturable);
                }
                self.cells[to_y][to_x] = self.cells[y][x].take();
            }
        }
        self.recompute_phase();
        Ok(())
    }

    /// Apply an action. Returns `false`, without mutating, if it is illegal.
    pub fn apply(&mut self, action: &Action) -> bool {
        self.try_apply(action).is_ok()
    }

    /// Declare a winner if one side has no pieces left, otherwise pass the
    /// turn to the other side.
    fn recompute_phase(&mut self) {
        if self.count(Color::Red) == 0 {
            self.phase = Phase::BlackWon;
        } else if self.count(Color::Black) == 0 {
            self.phase = Phase::RedWon;
        } else if !self.phase.is_terminal() {
            self.phase = self.phase.opposite();
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let ch = match cell {
                    Some(Color::Red) => 'R',
                    Some(Color::Black) => 'B',
                    None => '-',
                };
                if x > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{ch}")?;
            }
            if y + 1 < N {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PIECES_PER_SIDE;

    fn setpos(phase: Phase, red: &[(usize, usize)], black: &[(usize, usize)]) -> Board {
        let mut board = Board::empty(phase);
        for &(x, y) in red {
            board.set(x, y, Some(Color::Red));
        }
        for &(x, y) in black {
            board.set(x, y, Some(Color::Black));
        }
        board
    }

    #[test]
    fn test_initial_layout() {
        let board = Board::new();
        assert_eq!(board.phase(), Phase::RedToMove);
        assert_eq!(board.count(Color::Red), PIECES_PER_SIDE);
        assert_eq!(board.count(Color::Black), PIECES_PER_SIDE);
        assert_eq!(board.get(3, 0), Some(Color::Black));
        assert_eq!(board.get(3, 2), None);
        assert_eq!(board.get(3, 5), Some(Color::Red));
    }

    #[test]
    fn test_get_out_of_range_is_empty() {
        let board = Board::new();
        assert_eq!(board.get(6, 0), None);
        assert_eq!(board.get(0, 6), None);
        assert_eq!(board.get(usize::MAX, usize::MAX), None);
    }

    #[test]
    fn test_display() {
        let board = Board::new();
        let text = board.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "B B B B B B");
        assert_eq!(lines[2], "- - - - - -");
        assert_eq!(lines[5], "R R R R R R");
    }

    #[test]
    fn test_initial_moves() {
        let board = Board::new();
        assert_eq!(
            board.legal_moves(0, 4),
            vec![Direction::Up, Direction::RightUp]
        );
        assert_eq!(
            board.legal_moves(2, 4),
            vec![Direction::Up, Direction::LeftUp, Direction::RightUp]
        );
        // back row is boxed in
        assert!(board.legal_moves(2, 5).is_empty());
        // wrong side
        assert!(board.legal_moves(2, 1).is_empty());
        // empty square
        assert!(board.legal_moves(2, 2).is_empty());
    }

    #[test]
    fn test_no_captures_at_start() {
        let board = Board::new();
        assert!(board.capture_actions().is_empty());
        assert_eq!(board.move_actions().len(), board.legal_actions().len());
    }

    #[test]
    fn test_connector_table_is_consistent() {
        let mut exits: Vec<_> = CONNECTORS.iter().map(|c| c.exit).collect();
        exits.sort();
        exits.dedup();
        assert_eq!(exits.len(), 16);

        for c in &CONNECTORS {
            let (ex, ey) = c.exit;
            assert!(!on_board(ex, ey));
            // exits sit just outside an edge, at offsets 1..=4
            let offset = if ex == -1 || ex == N as isize { ey } else { ex };
            assert!((1..=4).contains(&offset), "bad exit {:?}", c.exit);

            // the arc is walked back the same way
            let back = connector(c.entry).expect("entry is another exit");
            assert_eq!(back.entry, c.exit);

            // one step from the entry lands on a non-corner board square
            let (dx, dy) = c.heading.delta();
            let (nx, ny) = (c.entry.0 + dx, c.entry.1 + dy);
            assert!(on_board(nx, ny));
            assert!(!is_corner(nx, ny));
            assert!(c.heading.is_orthogonal());
        }
    }

    #[test]
    fn test_connector_lookup_misses() {
        assert!(connector((0, -1)).is_none());
        assert!(connector((-1, 0)).is_none());
        assert!(connector((2, 2)).is_none());
    }

    #[test]
    fn test_capture_along_arc() {
        let board = setpos(Phase::RedToMove, &[(1, 4)], &[(4, 1)]);
        assert_eq!(board.legal_captures(1, 4), vec![(4, 1)]);
    }

    #[test]
    fn test_adjacent_enemy_without_arc_is_not_captured() {
        let board = setpos(Phase::RedToMove, &[(2, 4)], &[(2, 3)]);
        // straight up hits (2,3) with no arc followed
        let up = board.capture_target(2, 4, Direction::Up, Color::Red);
        assert_eq!(up, None);
    }

    #[test]
    fn test_adjacent_enemy_via_loop() {
        // going down wraps through the bottom-left arc back onto row 4
        let board = setpos(Phase::RedToMove, &[(1, 4)], &[(0, 4)]);
        assert_eq!(board.legal_captures(1, 4), vec![(0, 4)]);
        assert_eq!(
            board.capture_target(1, 4, Direction::Left, Color::Red),
            None
        );
    }

    #[test]
    fn test_own_piece_blocks() {
        let board = setpos(Phase::RedToMove, &[(1, 4), (3, 1), (4, 3)], &[(4, 1)]);
        assert!(board.legal_captures(1, 4).is_empty());
    }

    #[test]
    fn test_ray_returning_to_start_is_blocked() {
        let board = setpos(Phase::RedToMove, &[(2, 3)], &[(5, 5)]);
        for dir in Direction::ORTHOGONAL {
            assert_eq!(board.capture_target(2, 3, dir, Color::Red), None);
        }
    }

    #[test]
    fn test_corner_piece_never_captures() {
        let board = setpos(Phase::RedToMove, &[(0, 0)], &[(1, 1), (0, 3), (3, 0)]);
        assert!(board.legal_captures(0, 0).is_empty());
    }

    #[test]
    fn test_corner_stops_ray() {
        // up column 0 reaches the empty corner and stops
        let board = setpos(Phase::RedToMove, &[(0, 3)], &[(5, 5)]);
        assert_eq!(board.capture_target(0, 3, Direction::Up, Color::Red), None);
    }

    #[test]
    fn test_capture_requires_turn() {
        let board = setpos(Phase::BlackToMove, &[(1, 4)], &[(4, 1)]);
        assert!(board.legal_captures(1, 4).is_empty());
        // black captures red along the same track
        assert_eq!(board.legal_captures(4, 1), vec![(1, 4)]);
    }

    #[test]
    fn test_apply_move() {
        let mut board = Board::new();
        let mv = Action::Move {
            x: 0,
            y: 4,
            direction: Direction::Up,
        };
        assert!(board.apply(&mv));
        assert_eq!(board.get(0, 4), None);
        assert_eq!(board.get(0, 3), Some(Color::Red));
        assert_eq!(board.phase(), Phase::BlackToMove);
        assert_eq!(board.count(Color::Red), PIECES_PER_SIDE);
    }

    #[test]
    fn test_apply_rejections() {
        let mut board = Board::new();
        let before = board.clone();
        let cases = [
            (
                Action::Move {
                    x: 0,
                    y: 4,
                    direction: Direction::Down,
                },
                IllegalAction::Occupied,
            ),
            (
                Action::Move {
                    x: 0,
                    y: 1,
                    direction: Direction::Down,
                },
                IllegalAction::WrongTurn,
            ),
            (
                Action::Move {
                    x: 3,
                    y: 3,
                    direction: Direction::Up,
                },
                IllegalAction::EmptySquare,
            ),
            (
                Action::Move {
                    x: 9,
                    y: 3,
                    direction: Direction::Up,
                },
                IllegalAction::OutOfRange,
            ),
            (
                Action::Capture {
                    x: 1,
                    y: 4,
                    to_x: 1,
                    to_y: 1,
                },
                IllegalAction::NotCapturable,
            ),
        ];
        for (action, expected) in cases {
            assert_eq!(board.try_apply(&action), Err(expected), "{action}");
            assert_eq!(board, before);
        }
    }

    #[test]
    fn test_move_off_board() {
        let mut board = setpos(Phase::RedToMove, &[(0, 5)], &[(3, 0)]);
        let mv = Action::Move {
            x: 0,
            y: 5,
            direction: Direction::LeftDown,
        };
        assert_eq!(board.try_apply(&mv), Err(IllegalAction::OffBoard));
    }

    #[test]
    fn test_capture_wins_game() {
        let mut board = setpos(Phase::RedToMove, &[(1, 4)], &[(4, 1)]);
        let cap = Action::Capture {
            x: 1,
            y: 4,
            to_x: 4,
            to_y: 1,
        };
        assert!(board.apply(&cap));
        assert_eq!(board.get(4, 1), Some(Color::Red));
        assert_eq!(board.get(1, 4), None);
        assert_eq!(board.phase(), Phase::RedWon);
        assert!(board.is_terminal());

        let after = board.clone();
        let mv = Action::Move {
            x: 4,
            y: 1,
            direction: Direction::Up,
        };
        assert_eq!(board.try_apply(&mv), Err(IllegalAction::GameOver));
        assert_eq!(board, after);
        assert!(board.legal_actions().is_empty());
    }

    #[test]
    fn test_capture_reduces_count_and_flips_turn() {
        let mut board = setpos(Phase::RedToMove, &[(1, 4)], &[(4, 1), (5, 5)]);
        assert!(board.apply(&Action::Capture {
            x: 1,
            y: 4,
            to_x: 4,
            to_y: 1
        }));
        assert_eq!(board.count(Color::Black), 1);
        assert_eq!(board.count(Color::Red), 1);
        assert_eq!(board.phase(), Phase::BlackToMove);
    }

    #[test]
    fn test_pieces_iterator() {
        let board = setpos(Phase::RedToMove, &[(3, 2), (1, 4)], &[(0, 0)]);
        let red: Vec<_> = board.pieces(Color::Red).collect();
        assert_eq!(red, vec![(3, 2), (1, 4)]);
    }

    #[test]
    fn test_new_game_resets() {
        let mut board = setpos(Phase::BlackWon, &[], &[(2, 2)]);
        board.new_game();
        assert_eq!(board, Board::new());
    }
}
