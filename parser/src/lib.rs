pub mod ast;
pub mod error;

mod parse;
mod printing;

pub use error::ParseError;
pub use parse::{parse, ParseResult, MAX_SYSCALL_ARGS};
