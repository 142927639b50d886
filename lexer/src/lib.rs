
pub mod line_counter;
pub mod read_error;
pub mod tokens;
pub mod tokenizer;

pub use line_counter::Position;
pub use read_error::LexError;
pub use tokens::{Token, TokenKind};
pub use tokenizer::tokenize;
