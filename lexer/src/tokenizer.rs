
use std::iter::Peekable;

use tracing::debug;

use super::line_counter::{CountingIter, Position};
use super::read_error::LexError;
use super::tokens::{Token, TokenKind};

pub type LexResult<'a> = Result<Vec<Token<'a>>, LexError<'a>>;

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Tokenizer<'a, 's> {
    file: &'a str,
    chars: Peekable<CountingIter<'s>>,
    tokens: Vec<Token<'a>>,
}

impl<'a, 's> Tokenizer<'a, 's> {
    fn new(file: &'a str, src: &'s str) -> Self {
        Tokenizer {
            file,
            chars: CountingIter::new(src).peekable(),
            tokens: Vec::new(),
        }
    }

    fn pos(&self, loc: (usize, usize)) -> Position<'a> {
        Position::new(self.file, loc.0, loc.1)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(c, _)| *c)
    }

    /* Consumes the next character if it is `expected`. */
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn push(&mut self, kind: TokenKind, loc: (usize, usize)) {
        let pos = self.pos(loc);
        self.tokens.push(Token::new(kind, pos));
    }

    /* Reads characters while `pred` holds, starting with `first`. */
    fn take_while<F: Fn(char) -> bool>(&mut self, first: char, pred: F) -> String {
        let mut buf = String::new();
        buf.push(first);

        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            buf.push(c);
            self.chars.next();
        }

        buf
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn skip_block_comment(&mut self, start: (usize, usize)) -> Result<(), LexError<'a>> {
        loop {
            match self.chars.next() {
                None => {
                    return Err((
                        self.pos(start),
                        "unterminated block comment: terminate it with '*/'".to_string()
                    ).into());
                },
                Some(('*', _)) => {
                    if self.eat('/') {
                        return Ok(());
                    }
                },
                Some(_) => (),
            }
        }
    }

    /*
     * Picks between a one-character operator and its two-character
     * extension, e.g. `=` and `==`.
     */
    fn one_or_two(&mut self, second: char, double: TokenKind, single: TokenKind, loc: (usize, usize)) {
        if self.eat(second) {
            self.push(double, loc);
        } else {
            self.push(single, loc);
        }
    }

    fn run(mut self) -> LexResult<'a> {
        while let Some((c, loc)) = self.chars.next() {
            match c {
                c if c.is_whitespace() => (),

                ';' => self.push(TokenKind::SemiColon, loc),
                ',' => self.push(TokenKind::Comma, loc),
                '(' => self.push(TokenKind::OpenRoundBracket, loc),
                ')' => self.push(TokenKind::CloseRoundBracket, loc),
                '{' => self.push(TokenKind::OpenCurlyBracket, loc),
                '}' => self.push(TokenKind::CloseCurlyBracket, loc),
                '+' => self.push(TokenKind::Plus, loc),
                '-' => self.push(TokenKind::Minus, loc),
                '*' => self.push(TokenKind::Asterisk, loc),
                '%' => self.push(TokenKind::Percent, loc),

                '=' => self.one_or_two('=', TokenKind::DoubleEquals, TokenKind::Equals, loc),
                '!' => self.one_or_two('=', TokenKind::NotEquals, TokenKind::Exclamation, loc),
                '<' => self.one_or_two('=', TokenKind::LessEquals, TokenKind::OpenTriangleBracket, loc),
                '>' => self.one_or_two('=', TokenKind::GreaterEquals, TokenKind::CloseTriangleBracket, loc),
                '&' => self.one_or_two('&', TokenKind::DoubleAmpersand, TokenKind::Ampersand, loc),
                '|' => self.one_or_two('|', TokenKind::DoublePipe, TokenKind::Pipe, loc),

                '/' => {
                    if self.eat('/') {
                        self.skip_line_comment();
                    } else if self.eat('*') {
                        self.skip_block_comment(loc)?;
                    } else {
                        self.push(TokenKind::FSlash, loc);
                    }
                },

                c if is_ident_start(c) => {
                    let word = self.take_while(c, is_ident_continue);
                    let pos = self.pos(loc);

                    match TokenKind::keyword(&word) {
                        Some(kind) => self.tokens.push(Token::new(kind, pos)),
                        None => self.tokens.push(Token::with_value(TokenKind::Identifier, word, pos)),
                    }
                },

                c if c.is_ascii_digit() => {
                    let digits = self.take_while(c, |d| d.is_ascii_digit());
                    let pos = self.pos(loc);
                    self.tokens.push(Token::with_value(TokenKind::IntLiteral, digits, pos));
                },

                c => {
                    return Err((self.pos(loc), format!("unknown token: '{}'", c)).into());
                },
            }
        }

        Ok(self.tokens)
    }
}

/*
 * Splits `src` into tokens. `file` is only used to tag positions for
 * diagnostics.
 */
pub fn tokenize<'a>(file: &'a str, src: &str) -> LexResult<'a> {
    let tokens = Tokenizer::new(file, src).run()?;
    debug!(source = file, count = tokens.len(), "tokenized source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize("test.mltn", src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = tokenize("test.mltn", "var x int; func return $ret_1 whiles").unwrap();
        let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.value.clone())).collect();
        assert_eq!(got, vec![
            (TokenKind::Var, None),
            (TokenKind::Identifier, Some("x".to_string())),
            (TokenKind::TypeInt, None),
            (TokenKind::SemiColon, None),
            (TokenKind::Func, None),
            (TokenKind::Return, None),
            (TokenKind::Identifier, Some("$ret_1".to_string())),
            (TokenKind::Identifier, Some("whiles".to_string())),
        ]);
    }

    #[test]
    fn integer_literals_are_maximal_digit_runs() {
        let tokens = tokenize("test.mltn", "1234+5").unwrap();
        assert_eq!(tokens[0].value.as_deref(), Some("1234"));
        assert_eq!(tokens[1].kind, TokenKind::Plus);
        assert_eq!(tokens[2].value.as_deref(), Some("5"));
    }

    #[test]
    fn identifiers_cannot_start_with_a_digit() {
        assert_eq!(kinds("9lives"), vec![TokenKind::IntLiteral, TokenKind::Identifier]);
    }

    #[test]
    fn two_character_operators_are_not_split() {
        assert_eq!(kinds("== != <= >= && || = ! < > & |"), vec![
            TokenKind::DoubleEquals,
            TokenKind::NotEquals,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::DoubleAmpersand,
            TokenKind::DoublePipe,
            TokenKind::Equals,
            TokenKind::Exclamation,
            TokenKind::OpenTriangleBracket,
            TokenKind::CloseTriangleBracket,
            TokenKind::Ampersand,
            TokenKind::Pipe,
        ]);
    }

    #[test]
    fn comments_are_skipped_but_counted() {
        let src = "// line comment\n/* block\n comment */ x";
        let tokens = tokenize("test.mltn", src).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].pos, Position::new("test.mltn", 3, 13));
    }

    #[test]
    fn division_is_not_a_comment() {
        assert_eq!(kinds("a / b"), vec![TokenKind::Identifier, TokenKind::FSlash, TokenKind::Identifier]);
    }

    #[test]
    fn tracks_positions() {
        let tokens = tokenize("test.mltn", "var\n  x").unwrap();
        assert_eq!((tokens[0].pos.line, tokens[0].pos.column), (1, 1));
        assert_eq!((tokens[1].pos.line, tokens[1].pos.column), (2, 3));
    }

    #[test]
    fn rejects_unknown_character() {
        let err = tokenize("test.mltn", "var x int;\n  @").unwrap_err();
        assert_eq!(err.pos, Position::new("test.mltn", 2, 3));
        assert_eq!(err.to_string(), "test.mltn:2:3: unknown token: '@'");
    }

    #[test]
    fn rejects_unterminated_block_comment() {
        let err = tokenize("test.mltn", "x /* never closed *").unwrap_err();
        assert_eq!(err.pos, Position::new("test.mltn", 1, 3));
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn block_comments_do_not_nest() {
        assert_eq!(kinds("/* /* */ x */"), vec![TokenKind::Identifier, TokenKind::Asterisk, TokenKind::FSlash]);
    }
}
