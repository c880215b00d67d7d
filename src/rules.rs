//! Rules primitives: piece colors, game phases and movement directions.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Piece color. Red moves first and starts on the two bottom rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}

/// Content of a square. `None` is an empty square.
pub type Piece = Option<Color>;

/// Game phase. Exactly one holds at a time; the `Won` phases are terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    RedToMove,
    BlackToMove,
    RedWon,
    BlackWon,
}

impl Phase {
    /// The phase that the other side would be in. This is an involution:
    /// the two `ToMove` phases pair up, and so do the two `Won` phases.
    pub fn opposite(self) -> Phase {
        match self {
            Phase::RedToMove => Phase::BlackToMove,
            Phase::BlackToMove => Phase::RedToMove,
            Phase::RedWon => Phase::BlackWon,
            Phase::BlackWon => Phase::RedWon,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::RedWon | Phase::BlackWon)
    }

    /// The color whose turn it is, or `None` once the game is over.
    pub fn to_move(self) -> Option<Color> {
        match self {
            Phase::RedToMove => Some(Color::Red),
            Phase::BlackToMove => Some(Color::Black),
            _ => None,
        }
    }

    /// The `Won` phase the side to move is playing for.
    pub fn won_phase(self) -> Option<Phase> {
        self.to_move().map(Phase::won_by)
    }

    pub fn won_by(color: Color) -> Phase {
        match color {
            Color::Red => Phase::RedWon,
            Color::Black => Phase::BlackWon,
        }
    }

    pub fn moving(color: Color) -> Phase {
        match color {
            Color::Red => Phase::RedToMove,
            Color::Black => Phase::BlackToMove,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::RedToMove => "red's turn",
            Phase::BlackToMove => "black's turn",
            Phase::RedWon => "red won",
            Phase::BlackWon => "black won",
        };
        f.write_str(s)
    }
}

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

/// One-step movement direction.
///
/// The orthogonal directions are single bits; each diagonal is the union of
/// one vertical and one horizontal bit, so a diagonal step decomposes into
/// independent horizontal and vertical deltas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = UP,
    Down = DOWN,
    Left = LEFT,
    Right = RIGHT,
    LeftUp = LEFT | UP,
    LeftDown = LEFT | DOWN,
    RightUp = RIGHT | UP,
    RightDown = RIGHT | DOWN,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::LeftUp,
        Direction::LeftDown,
        Direction::RightUp,
        Direction::RightDown,
    ];

    /// Directions a capture ray may start in.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Build a direction from its bit pattern. Opposing bits (up with down,
    /// left with right) and the empty set are not directions.
    pub fn from_bits(bits: u8) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.bits() == bits)
    }

    /// Column and row delta of one step. Rows grow downwards.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        let b = self.bits();
        let dx = if b & LEFT != 0 {
            -1
        } else if b & RIGHT != 0 {
            1
        } else {
            0
        };
        let dy = if b & UP != 0 {
            -1
        } else if b & DOWN != 0 {
            1
        } else {
            0
        };
        (dx, dy)
    }

    pub fn is_orthogonal(self) -> bool {
        self.bits().count_ones() == 1
    }

    /// Short name used by the action text format.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "u",
            Direction::Down => "d",
            Direction::Left => "l",
            Direction::Right => "r",
            Direction::LeftUp => "lu",
            Direction::LeftDown => "ld",
            Direction::RightUp => "ru",
            Direction::RightDown => "rd",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a direction name cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid direction '{0}'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    /// Letters are OR-ed together, so `ul` and `lu` name the same diagonal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDirectionError(s.to_string());
        if s.is_empty() || s.len() > 2 {
            return Err(err());
        }
        let mut bits = 0u8;
        for c in s.chars() {
            let bit = match c.to_ascii_lowercase() {
                'u' => UP,
                'd' => DOWN,
                'l' => LEFT,
                'r' => RIGHT,
                _ => return Err(err()),
            };
            if bits & bit != 0 {
                return Err(err());
            }
            bits |= bit;
        }
        Direction::from_bits(bits).ok_or_else(err)
    }
}
