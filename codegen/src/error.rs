
use std::fmt;

use thiserror::Error;

use lexer::{LexError, Position};
use parser::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{pos}: {message}")]
pub struct GenError<'a> {
    pub pos: Position<'a>,
    pub message: String,
}

impl<'a> From<(Position<'a>, String)> for GenError<'a> {
    fn from(desc: (Position<'a>, String)) -> Self {
        GenError {
            pos: desc.0,
            message: desc.1,
        }
    }
}

impl<'a> From<(Position<'a>, &str)> for GenError<'a> {
    fn from(desc: (Position<'a>, &str)) -> Self {
        (desc.0, desc.1.to_string()).into()
    }
}

/*
 * Writing into a `String` cannot fail, but `writeln!` still hands back a
 * `fmt::Result`. There is no source position to attach, so the error
 * points at an anonymous start of file.
 */
impl<'a> From<fmt::Error> for GenError<'a> {
    fn from(error: fmt::Error) -> Self {
        (Position::start("<output>"), format!("{}", error)).into()
    }
}

pub type GenResult<'a, T> = Result<T, GenError<'a>>;

#[derive(Debug, Error)]
pub enum CompileError<'a> {
    #[error(transparent)]
    Lex(LexError<'a>),
    #[error(transparent)]
    Parse(ParseError<'a>),
    #[error(transparent)]
    Gen(GenError<'a>),
}

impl<'a> From<LexError<'a>> for CompileError<'a> {
    fn from(error: LexError<'a>) -> Self {
        CompileError::Lex(error)
    }
}

impl<'a> From<ParseError<'a>> for CompileError<'a> {
    fn from(error: ParseError<'a>) -> Self {
        CompileError::Parse(error)
    }
}

impl<'a> From<GenError<'a>> for CompileError<'a> {
    fn from(error: GenError<'a>) -> Self {
        CompileError::Gen(error)
    }
}

impl<'a> CompileError<'a> {
    pub fn pos(&self) -> Position<'a> {
        match self {
            CompileError::Lex(e) => e.pos,
            CompileError::Parse(e) => e.pos,
            CompileError::Gen(e) => e.pos,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Lex(e) => &e.message,
            CompileError::Parse(e) => &e.message,
            CompileError::Gen(e) => &e.message,
        }
    }
}
