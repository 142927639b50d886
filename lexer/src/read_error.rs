
use thiserror::Error;

use super::line_counter::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {message}")]
pub struct LexError<'a> {
    pub pos: Position<'a>,
    pub message: String,
}

impl<'a> From<(Position<'a>, String)> for LexError<'a> {
    fn from(desc: (Position<'a>, String)) -> Self {
        LexError {
            pos: desc.0,
            message: desc.1,
        }
    }
}
