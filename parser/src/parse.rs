
use std::collections::HashMap;

use tracing::debug;

use lexer::{Position, Token, TokenKind};

use super::ast::*;
use super::error::ParseError;

mod expr;
mod types;

pub type ParseResult<'a, T> = Result<T, ParseError<'a>>;

// Syscall arguments go in rax, rdi, rsi, rdx, r10, r8 and r9.
pub const MAX_SYSCALL_ARGS: usize = 7;

pub struct Parser<'a, 't> {
    file: &'a str,
    tokens: &'t [Token<'a>],
    current: usize,
    // Function calls already parsed, by starting token, with the token
    // following them.
    calls: HashMap<usize, (ParseResult<'a, FuncCall<'a>>, usize)>,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(file: &'a str, tokens: &'t [Token<'a>]) -> Self {
        Parser {file, tokens, current: 0, calls: HashMap::new()}
    }

    fn peek(&self, offset: usize) -> Option<&'t Token<'a>> {
        self.tokens.get(self.current + offset)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.peek(offset).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind(0) == Some(kind)
    }

    fn consume(&mut self) -> Option<Token<'a>> {
        let tok = self.tokens.get(self.current)?.clone();
        self.current += 1;
        Some(tok)
    }

    /* Consumes the next token only if it has the given kind. */
    fn try_consume(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        if self.at(kind) {
            self.consume()
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> ParseResult<'a, Token<'a>> {
        match self.try_consume(kind) {
            Some(tok) => Ok(tok),
            None => Err(self.error(msg)),
        }
    }

    /*
     * Where the next token is, or right after the last one once the input
     * is exhausted.
     */
    fn pos(&self) -> Position<'a> {
        if let Some(tok) = self.tokens.get(self.current) {
            return tok.pos;
        }
        match self.tokens.last() {
            Some(tok) => {
                let mut end = tok.pos;
                end.column += tok.text().chars().count();
                end
            },
            None => Position::start(self.file),
        }
    }

    fn error(&self, msg: &str) -> ParseError<'a> {
        let found = match self.peek(0) {
            Some(tok) => format!("{}", tok),
            None => "end of input".to_string(),
        };
        (self.pos(), format!("{} (found {})", msg, found)).into()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn parse_program(&mut self) -> ParseResult<'a, Program<'a>> {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            match self.parse_stmt()? {
                Some(stmt) => stmts.push(stmt),
                None => return Err(self.error("expected statement")),
            }
        }

        Ok(Program {stmts})
    }

    /* Returns `None` without consuming anything when no statement starts here. */
    fn parse_stmt(&mut self) -> ParseResult<'a, Option<Stmt<'a>>> {
        let kind = match self.peek_kind(0) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let stmt = match kind {
            TokenKind::Var => {
                self.consume();
                let ident = self.expect(TokenKind::Identifier, "expected variable identifier after 'var'")?;
                let ty = self.parse_type()?;
                self.expect(TokenKind::SemiColon, "missing ';'")?;
                Stmt::VarDeclare(TypedIdent {ident, ty})
            },
            TokenKind::Identifier => match self.peek_kind(1) {
                Some(TokenKind::Equals) => {
                    let ident = self.expect(TokenKind::Identifier, "expected identifier")?;
                    self.consume();
                    let expr = self.parse_required_expr("expected expression after '='")?;
                    self.expect(TokenKind::SemiColon, "missing ';'")?;
                    Stmt::VarAssign(ident, expr)
                },
                Some(TokenKind::OpenRoundBracket) => {
                    let call = self.parse_func_call()?;
                    self.expect(TokenKind::SemiColon, "missing ';'")?;
                    Stmt::Call(call)
                },
                _ => {
                    self.consume();
                    return Err(self.error("expected '=' or '(' after identifier for variable assignment or function call"));
                },
            },
            TokenKind::Asterisk => {
                self.consume();
                let ident = self.expect(TokenKind::Identifier, "expected variable identifier after '*'")?;
                self.expect(TokenKind::Equals, "expected '=' after identifier for pointer assignment")?;
                let expr = self.parse_required_expr("expected expression after '='")?;
                self.expect(TokenKind::SemiColon, "missing ';'")?;
                Stmt::PointerAssign(ident, expr)
            },
            TokenKind::OpenCurlyBracket => Stmt::Scope(self.parse_scope()?),
            TokenKind::If => Stmt::If(self.parse_if()?),
            TokenKind::While => {
                self.consume();
                self.expect(TokenKind::OpenRoundBracket, "expected '(' after 'while'")?;
                let cond = self.parse_required_expr("expected loop condition")?;
                self.expect(TokenKind::CloseRoundBracket, "expected ')' after loop condition")?;
                let scope = self.parse_scope()?;
                Stmt::While(cond, scope)
            },
            TokenKind::Break => {
                let tok = self.expect(TokenKind::Break, "expected 'break'")?;
                self.expect(TokenKind::SemiColon, "missing ';'")?;
                Stmt::Break(tok)
            },
            TokenKind::Continue => {
                let tok = self.expect(TokenKind::Continue, "expected 'continue'")?;
                self.expect(TokenKind::SemiColon, "missing ';'")?;
                Stmt::Continue(tok)
            },
            TokenKind::Func => Stmt::FuncDefinition(self.parse_func_definition()?),
            TokenKind::Return => {
                let tok = self.expect(TokenKind::Return, "expected 'return'")?;
                let values = if self.at(TokenKind::SemiColon) {
                    vec![]
                } else {
                    self.parse_expr_list()?
                };
                self.expect(TokenKind::SemiColon, "missing ';'")?;
                Stmt::Return(tok, values)
            },
            TokenKind::Syscall => {
                let tok = self.expect(TokenKind::Syscall, "expected 'syscall'")?;
                self.expect(TokenKind::OpenRoundBracket, "expected '(' after 'syscall'")?;
                let args = if self.at(TokenKind::CloseRoundBracket) {
                    vec![]
                } else {
                    self.parse_expr_list()?
                };
                if args.len() > MAX_SYSCALL_ARGS {
                    return Err((tok.pos, format!(
                        "too many arguments: syscalls can't have more than {} arguments, found {}",
                        MAX_SYSCALL_ARGS, args.len()
                    )).into());
                }
                self.expect(TokenKind::CloseRoundBracket, "missing ')'")?;
                self.expect(TokenKind::SemiColon, "missing ';'")?;
                Stmt::Syscall(tok, args)
            },
            _ => return Ok(None),
        };

        Ok(Some(stmt))
    }

    fn parse_scope(&mut self) -> ParseResult<'a, Scope<'a>> {
        self.expect(TokenKind::OpenCurlyBracket, "expected '{'")?;

        let mut stmts = Vec::new();
        while let Some(stmt) = self.parse_stmt()? {
            stmts.push(stmt);
        }

        self.expect(TokenKind::CloseCurlyBracket, "expected '}'")?;
        Ok(Scope {stmts})
    }

    fn parse_if(&mut self) -> ParseResult<'a, If<'a>> {
        self.expect(TokenKind::If, "expected 'if'")?;
        self.expect(TokenKind::OpenRoundBracket, "expected '(' after 'if'")?;
        let cond = self.parse_required_expr("expected condition")?;
        self.expect(TokenKind::CloseRoundBracket, "expected ')' after condition")?;
        let scope = self.parse_scope()?;
        let else_branch = self.parse_else()?;

        Ok(If {cond, scope, else_branch})
    }

    fn parse_else(&mut self) -> ParseResult<'a, Option<Else<'a>>> {
        if self.try_consume(TokenKind::Else).is_none() {
            return Ok(None);
        }

        match self.peek_kind(0) {
            Some(TokenKind::If) => Ok(Some(Else::ElseIf(Box::new(self.parse_if()?)))),
            Some(TokenKind::OpenCurlyBracket) => Ok(Some(Else::Scope(self.parse_scope()?))),
            _ => Err(self.error("expected scope or else-if statement following 'else'")),
        }
    }

    fn parse_func_definition(&mut self) -> ParseResult<'a, FuncDefinition<'a>> {
        self.expect(TokenKind::Func, "expected 'func'")?;

        let count = self.expect(TokenKind::IntLiteral, "expected an int for the number of returns")?;
        let returns = count.text().parse::<usize>()
            .map_err(|_| ParseError::from((count.pos, "invalid number of returns")))?;

        let ident = self.expect(TokenKind::Identifier, "expected function identifier after return count")?;
        self.expect(TokenKind::OpenRoundBracket, "missing '('")?;

        let mut params = Vec::new();
        if !self.at(TokenKind::CloseRoundBracket) {
            loop {
                let ident = self.expect(TokenKind::Identifier, "expected parameter identifier")?;
                let ty = self.parse_type()?;
                params.push(TypedIdent {ident, ty});

                if self.try_consume(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::CloseRoundBracket, "missing ')'")?;
        let body = self.parse_scope()?;

        Ok(FuncDefinition {ident, returns, params, body})
    }

    /*
     * The expression grammars may try the same call more than once; it is
     * parsed the first time and replayed afterwards, so nested calls cost
     * linear time.
     */
    fn parse_func_call(&mut self) -> ParseResult<'a, FuncCall<'a>> {
        let start = self.current;
        if let Some((call, end)) = self.calls.get(&start) {
            self.current = *end;
            return call.clone();
        }

        let call = self.parse_func_call_args();
        self.calls.insert(start, (call.clone(), self.current));
        call
    }

    fn parse_func_call_args(&mut self) -> ParseResult<'a, FuncCall<'a>> {
        let ident = self.expect(TokenKind::Identifier, "expected function identifier")?;
        self.expect(TokenKind::OpenRoundBracket, "missing '('")?;

        let args = if self.at(TokenKind::CloseRoundBracket) {
            vec![]
        } else {
            self.parse_expr_list()?
        };

        self.expect(TokenKind::CloseRoundBracket, "missing ')'")?;
        Ok(FuncCall {ident, args})
    }

    /* One or more comma-separated expressions. */
    fn parse_expr_list(&mut self) -> ParseResult<'a, Vec<Expr<'a>>> {
        let mut exprs = vec![self.parse_required_expr("expected expression")?];

        while self.try_consume(TokenKind::Comma).is_some() {
            exprs.push(self.parse_required_expr("expected expression after ','")?);
        }

        Ok(exprs)
    }
}

pub fn parse<'a>(file: &'a str, tokens: &[Token<'a>]) -> ParseResult<'a, Program<'a>> {
    let program = Parser::new(file, tokens).parse_program()?;
    debug!(source = file, stmts = program.stmts.len(), "parsed program");
    Ok(program)
}
