//! Actions and their canonical text form.
//!
//! A move encodes as `m <x> <y> <dir>` and a capture as
//! `e <x> <y> <to_x> <to_y>`. Coordinates are 0-based, `x` is the column and
//! `y` the row, with the origin at the top-left square.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

use crate::rules::{Direction, ParseDirectionError};

/// A single player action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Step the piece at `(x, y)` one square in `direction`.
    Move {
        x: usize,
        y: usize,
        direction: Direction,
    },
    /// The piece at `(x, y)` captures whatever stands on `(to_x, to_y)`.
    Capture {
        x: usize,
        y: usize,
        to_x: usize,
        to_y: usize,
    },
}

impl Action {
    /// Square of the piece performing the action.
    pub fn source(&self) -> (usize, usize) {
        match *self {
            Action::Move { x, y, .. } | Action::Capture { x, y, .. } => (x, y),
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, Action::Capture { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { x, y, direction } => write!(f, "m {x} {y} {direction}"),
            Action::Capture { x, y, to_x, to_y } => write!(f, "e {x} {y} {to_x} {to_y}"),
        }
    }
}

/// Error returned when action text cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseActionError {
    #[error("empty action")]
    Empty,

    #[error("unknown action '{0}' (expected 'm' or 'e')")]
    UnknownVerb(String),

    #[error("expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("invalid coordinate: {0}")]
    Coordinate(#[from] ParseIntError),

    #[error(transparent)]
    Direction(#[from] ParseDirectionError),
}

impl FromStr for Action {
    type Err = ParseActionError;

    /// The verb is recognised by its first letter, so `move 1 4 u` and
    /// `eat 1 4 1 1` are accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let parts: Vec<&str> = lower.split_whitespace().collect();
        let (verb, args) = parts.split_first().ok_or(ParseActionError::Empty)?;

        match verb.chars().next() {
            Some('m') => {
                if args.len() != 3 {
                    return Err(ParseActionError::Arity {
                        expected: 3,
                        got: args.len(),
                    });
                }
                Ok(Action::Move {
                    x: args[0].parse()?,
                    y: args[1].parse()?,
                    direction: args[2].parse()?,
                })
            }
            Some('e') => {
                if args.len() != 4 {
                    return Err(ParseActionError::Arity {
                        expected: 4,
                        got: args.len(),
                    });
                }
                Ok(Action::Capture {
                    x: args[0].parse()?,
                    y: args[1].parse()?,
                    to_x: args[2].parse()?,
                    to_y: args[3].parse()?,
                })
            }
            _ => Err(ParseActionError::UnknownVerb(verb.to_string())),
        }
    }
}
