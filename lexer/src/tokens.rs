
use std::fmt;

use super::line_counter::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Var,
    If,
    Else,
    While,
    Break,
    Continue,
    Func,
    Return,
    Syscall,
    TypeBool,
    TypeInt,
    TypeChar,

    // Literals
    IntLiteral,
    Identifier,

    // Punctuation
    SemiColon,
    Comma,
    OpenRoundBracket,
    CloseRoundBracket,
    OpenCurlyBracket,
    CloseCurlyBracket,

    // Operators
    Equals,
    Plus,
    Minus,
    Asterisk,
    FSlash,
    Percent,
    Ampersand,
    Pipe,
    Exclamation,
    OpenTriangleBracket,
    CloseTriangleBracket,
    DoubleEquals,
    NotEquals,
    LessEquals,
    GreaterEquals,
    DoubleAmpersand,
    DoublePipe,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "var" => Some(TokenKind::Var),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "func" => Some(TokenKind::Func),
            "return" => Some(TokenKind::Return),
            "syscall" => Some(TokenKind::Syscall),
            "bool" => Some(TokenKind::TypeBool),
            "int" => Some(TokenKind::TypeInt),
            "char" => Some(TokenKind::TypeChar),
            _ => None,
        }
    }

    /* Precedence tier of a binary integer operator, if it is one. */
    pub fn int_bin_prec(self) -> Option<usize> {
        match self {
            TokenKind::Plus | TokenKind::Minus => Some(0),
            TokenKind::Asterisk | TokenKind::FSlash | TokenKind::Percent => Some(1),
            _ => None,
        }
    }

    /*
     * Precedence tier of a binary boolean operator. The single-character
     * forms get a tier too so that the parser can reject them with a
     * useful message instead of silently stopping.
     */
    pub fn bool_bin_prec(self) -> Option<usize> {
        match self {
            TokenKind::DoublePipe | TokenKind::Pipe => Some(0),
            TokenKind::DoubleAmpersand | TokenKind::Ampersand => Some(1),
            _ => None,
        }
    }

    pub fn is_relative_operator(self) -> bool {
        matches!(self,
            TokenKind::DoubleEquals | TokenKind::NotEquals
            | TokenKind::OpenTriangleBracket | TokenKind::CloseTriangleBracket
            | TokenKind::LessEquals | TokenKind::GreaterEquals)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Var => "var",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Func => "func",
            TokenKind::Return => "return",
            TokenKind::Syscall => "syscall",
            TokenKind::TypeBool => "bool",
            TokenKind::TypeInt => "int",
            TokenKind::TypeChar => "char",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::Identifier => "identifier",
            TokenKind::SemiColon => ";",
            TokenKind::Comma => ",",
            TokenKind::OpenRoundBracket => "(",
            TokenKind::CloseRoundBracket => ")",
            TokenKind::OpenCurlyBracket => "{",
            TokenKind::CloseCurlyBracket => "}",
            TokenKind::Equals => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::FSlash => "/",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Exclamation => "!",
            TokenKind::OpenTriangleBracket => "<",
            TokenKind::CloseTriangleBracket => ">",
            TokenKind::DoubleEquals => "==",
            TokenKind::NotEquals => "!=",
            TokenKind::LessEquals => "<=",
            TokenKind::GreaterEquals => ">=",
            TokenKind::DoubleAmpersand => "&&",
            TokenKind::DoublePipe => "||",
        };

        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: Option<String>,
    pub pos: Position<'a>,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, pos: Position<'a>) -> Self {
        Token {kind, value: None, pos}
    }

    pub fn with_value(kind: TokenKind, value: String, pos: Position<'a>) -> Self {
        Token {kind, value: Some(value), pos}
    }

    /* Source text of a literal/identifier, or the operator spelling. */
    pub fn text(&self) -> String {
        match &self.value {
            Some(v) => v.clone(),
            None => self.kind.to_string(),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "'{}'", v),
            None => write!(f, "'{}'", self.kind),
        }
    }
}
