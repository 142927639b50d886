
use lexer::TokenKind;

use super::{Parser, ParseResult};
use crate::ast::{BaseType, Type};

impl<'a, 't> Parser<'a, 't> {
    /* `*`-prefixed pointer levels around one of the base type keywords. */
    pub(super) fn parse_type(&mut self) -> ParseResult<'a, Type> {
        if self.try_consume(TokenKind::Asterisk).is_some() {
            return Ok(Type::pointer_to(self.parse_type()?));
        }

        let base = match self.peek_kind(0) {
            Some(TokenKind::TypeBool) => BaseType::Bool,
            Some(TokenKind::TypeInt) => BaseType::Int,
            Some(TokenKind::TypeChar) => BaseType::Char,
            _ => return Err(self.error("expected base type")),
        };
        self.consume();

        Ok(Type::Pure(base))
    }
}
