
// Both expression grammars are parsed by precedence climbing, see
// https://eli.thegreenplace.net/2012/08/02/parsing-expressions-by-precedence-climbing

use tracing::trace;

use lexer::TokenKind;

use super::{Parser, ParseResult};
use crate::ast::*;

fn int_bin_op(kind: TokenKind) -> Option<IntBinOp> {
    match kind {
        TokenKind::Plus => Some(IntBinOp::Add),
        TokenKind::Minus => Some(IntBinOp::Subtract),
        TokenKind::Asterisk => Some(IntBinOp::Multiply),
        TokenKind::FSlash => Some(IntBinOp::Divide),
        TokenKind::Percent => Some(IntBinOp::Modulo),
        _ => None,
    }
}

fn relative_operator(kind: TokenKind) -> Option<RelOp> {
    match kind {
        TokenKind::DoubleEquals => Some(RelOp::Equal),
        TokenKind::NotEquals => Some(RelOp::NotEqual),
        TokenKind::OpenTriangleBracket => Some(RelOp::LessThan),
        TokenKind::LessEquals => Some(RelOp::LessThanOrEqual),
        TokenKind::CloseTriangleBracket => Some(RelOp::GreaterThan),
        TokenKind::GreaterEquals => Some(RelOp::GreaterThanOrEqual),
        _ => None,
    }
}

impl<'a, 't> Parser<'a, 't> {
    /*
     * An expression is first tried as a boolean expression, then as an
     * integer one. A boolean parse is only kept when the integer grammar
     * could not have gone further (e.g. `x` in `x + 1` is a valid boolean
     * term, but the `+` says otherwise).
     */
    pub(super) fn parse_expr(&mut self) -> ParseResult<'a, Option<Expr<'a>>> {
        let start = self.current;

        let as_bool = self.parse_bool_expr(0);
        if let Ok(Some(_)) = &as_bool {
            let continues_as_int = self.peek_kind(0)
                .map_or(false, |k| k.int_bin_prec().is_some());
            if !continues_as_int {
                return as_bool.map(|e| e.map(Expr::Bool));
            }
        }

        trace!(at = %self.pos(), "falling back to the integer grammar");
        self.current = start;
        let as_int = self.parse_int_expr(0);

        match (as_bool, as_int) {
            (as_bool, Ok(Some(e))) => {
                if self.peek_kind(0).map_or(false, TokenKind::is_relative_operator) {
                    self.consume();
                    return Err(self.error("found a relative operator but no term following it"));
                }
                // The boolean attempt got stuck on something the integer
                // grammar stops in front of, e.g. a single `&`.
                if let Err(bool_err) = as_bool {
                    let stop = self.pos();
                    if !self.is_at_end() && (bool_err.pos == stop || bool_err.is_after(&stop)) {
                        return Err(bool_err);
                    }
                }
                Ok(Some(Expr::Int(e)))
            },
            (Ok(_), Ok(None)) => Ok(None),
            (Ok(_), Err(int_err)) => Err(int_err),
            (Err(bool_err), Ok(None)) => Err(bool_err),
            (Err(bool_err), Err(int_err)) => {
                if int_err.is_after(&bool_err.pos) {
                    Err(int_err)
                } else {
                    Err(bool_err)
                }
            },
        }
    }

    pub(super) fn parse_required_expr(&mut self, msg: &str) -> ParseResult<'a, Expr<'a>> {
        match self.parse_expr()? {
            Some(e) => Ok(e),
            None => Err(self.error(msg)),
        }
    }

    pub(super) fn parse_int_expr(&mut self, min_prec: usize) -> ParseResult<'a, Option<IntExpr<'a>>> {
        let mut lhs = match self.parse_int_term()? {
            Some(term) => IntExpr::Term(term),
            None => return Ok(None),
        };

        loop {
            let (op, prec) = match self.peek_kind(0) {
                Some(kind) => match (int_bin_op(kind), kind.int_bin_prec()) {
                    (Some(op), Some(prec)) => (op, prec),
                    _ => break,
                },
                None => break,
            };
            if prec < min_prec {
                break;
            }
            let op_tok = self.consume();

            let rhs = match self.parse_int_expr(prec + 1)? {
                Some(rhs) => rhs,
                None => {
                    let spelled = op_tok.map(|t| t.text()).unwrap_or_default();
                    return Err(self.error(&format!("expected integer expression after '{}'", spelled)));
                },
            };

            lhs = IntExpr::BinOp(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(Some(lhs))
    }

    fn parse_int_term(&mut self) -> ParseResult<'a, Option<IntTerm<'a>>> {
        let kind = match self.peek_kind(0) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let term = match kind {
            TokenKind::Minus => {
                self.consume();
                match self.parse_int_term()? {
                    Some(term) => IntTerm::Negative(Box::new(term)),
                    None => return Err(self.error("expected integer term after '-'")),
                }
            },
            TokenKind::IntLiteral => {
                let tok = self.expect(TokenKind::IntLiteral, "expected integer literal")?;
                if tok.text().parse::<i64>().is_err() {
                    return Err((tok.pos, format!("integer literal out of range: {}", tok.text())).into());
                }
                IntTerm::Literal(tok)
            },
            TokenKind::Identifier => {
                if self.peek_kind(1) == Some(TokenKind::OpenRoundBracket) {
                    IntTerm::Call(self.parse_func_call()?)
                } else {
                    IntTerm::Identifier(self.expect(TokenKind::Identifier, "expected identifier")?)
                }
            },
            TokenKind::OpenRoundBracket => {
                self.consume();
                let expr = match self.parse_int_expr(0)? {
                    Some(expr) => expr,
                    None => return Err(self.error("expected integer expression after '('")),
                };
                self.expect(TokenKind::CloseRoundBracket, "expected ')'")?;
                IntTerm::Bracketed(Box::new(expr))
            },
            TokenKind::Ampersand => {
                self.consume();
                IntTerm::AddressOf(self.expect(TokenKind::Identifier, "expected variable identifier after '&'")?)
            },
            TokenKind::Asterisk => {
                self.consume();
                IntTerm::Dereference(self.expect(TokenKind::Identifier, "expected variable identifier after '*'")?)
            },
            _ => return Ok(None),
        };

        Ok(Some(term))
    }

    pub(super) fn parse_bool_expr(&mut self, min_prec: usize) -> ParseResult<'a, Option<BoolExpr<'a>>> {
        let mut lhs = match self.parse_bool_term()? {
            Some(term) => BoolExpr::Term(term),
            None => return Ok(None),
        };

        loop {
            let (kind, prec) = match self.peek_kind(0) {
                Some(kind) => match kind.bool_bin_prec() {
                    Some(prec) => (kind, prec),
                    None => break,
                },
                None => break,
            };
            if prec < min_prec {
                break;
            }

            let op = match kind {
                TokenKind::DoubleAmpersand => BoolBinOp::And,
                TokenKind::DoublePipe => BoolBinOp::Or,
                _ => return Err(self.error("boolean expressions must use a doubled operator (&&, ||)")),
            };
            self.consume();

            let rhs = match self.parse_bool_expr(prec + 1)? {
                Some(rhs) => rhs,
                None => return Err(self.error(&format!("expected boolean expression after '{}'", kind))),
            };

            lhs = BoolExpr::BinOp(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(Some(lhs))
    }

    /*
     * A comparison of two integer expressions is tried first, with
     * backtracking; then a single boolean operand, optionally compared to
     * a second one.
     */
    fn parse_bool_term(&mut self) -> ParseResult<'a, Option<BoolTerm<'a>>> {
        let start = self.current;
        if let Ok(Some(cmp)) = self.parse_int_comparison() {
            return Ok(Some(cmp));
        }
        self.current = start;

        let lhs = match self.parse_bool_operand()? {
            Some(term) => term,
            None => return Ok(None),
        };

        let op = match self.peek_kind(0).and_then(relative_operator) {
            Some(op) => op,
            None => return Ok(Some(lhs)),
        };
        self.consume();

        match self.parse_bool_operand()? {
            Some(rhs) => Ok(Some(BoolTerm::CompareBool(op, Box::new(lhs), Box::new(rhs)))),
            None => Err(self.error("found a relative operator but no term following it")),
        }
    }

    fn parse_int_comparison(&mut self) -> ParseResult<'a, Option<BoolTerm<'a>>> {
        let lhs = match self.parse_int_expr(0)? {
            Some(lhs) => lhs,
            None => return Ok(None),
        };

        let op = match self.peek_kind(0).and_then(relative_operator) {
            Some(op) => op,
            None => return Ok(None),
        };
        self.consume();

        match self.parse_int_expr(0)? {
            Some(rhs) => Ok(Some(BoolTerm::CompareInt(op, lhs, rhs))),
            None => Ok(None),
        }
    }

    fn parse_bool_operand(&mut self) -> ParseResult<'a, Option<BoolTerm<'a>>> {
        let kind = match self.peek_kind(0) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let term = match kind {
            TokenKind::Exclamation => {
                self.consume();
                match self.parse_bool_term()? {
                    Some(term) => BoolTerm::Not(Box::new(term)),
                    None => return Err(self.error("expected boolean term after '!'")),
                }
            },
            TokenKind::Identifier => {
                if self.peek_kind(1) == Some(TokenKind::OpenRoundBracket) {
                    BoolTerm::Call(self.parse_func_call()?)
                } else {
                    BoolTerm::Identifier(self.expect(TokenKind::Identifier, "expected identifier")?)
                }
            },
            TokenKind::OpenRoundBracket => {
                self.consume();
                let expr = match self.parse_bool_expr(0)? {
                    Some(expr) => expr,
                    None => return Err(self.error("expected boolean expression after '('")),
                };
                self.expect(TokenKind::CloseRoundBracket, "expected ')'")?;
                BoolTerm::Bracketed(Box::new(expr))
            },
            TokenKind::Asterisk => {
                self.consume();
                BoolTerm::Dereference(self.expect(TokenKind::Identifier, "expected variable identifier after '*'")?)
            },
            _ => return Ok(None),
        };

        Ok(Some(term))
    }
}
