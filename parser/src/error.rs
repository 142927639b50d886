
use thiserror::Error;

use lexer::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {message}")]
pub struct ParseError<'a> {
    pub pos: Position<'a>,
    pub message: String,
}

impl<'a> ParseError<'a> {
    /* True when `self` was raised further into the source than `other`. */
    pub fn is_after(&self, other: &Position<'_>) -> bool {
        (self.pos.line, self.pos.column) > (other.line, other.column)
    }
}

impl<'a> From<(Position<'a>, String)> for ParseError<'a> {
    fn from(desc: (Position<'a>, String)) -> Self {
        ParseError {
            pos: desc.0,
            message: desc.1,
        }
    }
}

impl<'a> From<(Position<'a>, &str)> for ParseError<'a> {
    fn from(desc: (Position<'a>, &str)) -> Self {
        (desc.0, desc.1.to_string()).into()
    }
}
