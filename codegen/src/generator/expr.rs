
// Every expression leaves exactly one quadword on the stack.

use std::fmt::Write;

use tracing::trace;

use lexer::Token;
use parser::ast::*;

use super::context::{lookup_or_fail, Context};
use super::Generator;
use crate::error::GenResult;

fn condition_code(op: RelOp) -> &'static str {
    match op {
        RelOp::Equal => "e",
        RelOp::NotEqual => "ne",
        RelOp::LessThan => "l",
        RelOp::LessThanOrEqual => "le",
        RelOp::GreaterThan => "g",
        RelOp::GreaterThanOrEqual => "ge",
    }
}

/*
 * Type of an argument as far as overload resolution is concerned. Calls
 * have no declared result type and give `None`, so do undefined variables
 * (their use fails later with a proper diagnostic).
 */
pub(super) fn static_type(ctx: &Context, expr: &Expr<'_>) -> Option<Type> {
    match expr {
        Expr::Int(e) => int_static_type(ctx, e),
        Expr::Bool(e) => bool_static_type(ctx, e),
    }
}

fn variable_type(ctx: &Context, tok: &Token<'_>) -> Option<Type> {
    ctx.lookup(&tok.text()).map(|v| v.ty.clone())
}

fn pointee_type(ctx: &Context, tok: &Token<'_>) -> Option<Type> {
    variable_type(ctx, tok).and_then(|ty| ty.pointee().cloned())
}

fn int_static_type(ctx: &Context, expr: &IntExpr<'_>) -> Option<Type> {
    let int = Some(Type::Pure(BaseType::Int));
    match expr {
        IntExpr::BinOp(..) => int,
        IntExpr::Term(term) => match term {
            IntTerm::Negative(_) | IntTerm::Literal(_) => int,
            IntTerm::Identifier(tok) => variable_type(ctx, tok),
            IntTerm::Bracketed(e) => int_static_type(ctx, e),
            IntTerm::AddressOf(tok) => variable_type(ctx, tok).map(Type::pointer_to),
            IntTerm::Dereference(tok) => pointee_type(ctx, tok),
            IntTerm::Call(_) => None,
        },
    }
}

fn bool_static_type(ctx: &Context, expr: &BoolExpr<'_>) -> Option<Type> {
    match expr {
        BoolExpr::Term(BoolTerm::Identifier(tok)) => variable_type(ctx, tok),
        BoolExpr::Term(BoolTerm::Dereference(tok)) => pointee_type(ctx, tok),
        BoolExpr::Term(BoolTerm::Bracketed(e)) => bool_static_type(ctx, e),
        BoolExpr::Term(BoolTerm::Call(_)) => None,
        _ => Some(Type::Pure(BaseType::Bool)),
    }
}

impl Generator {
    pub(super) fn gen_expr<'a>(&mut self, ctx: &mut Context, expr: &Expr<'a>) -> GenResult<'a, ()> {
        match expr {
            Expr::Int(e) => self.gen_int_expr(ctx, e),
            Expr::Bool(e) => self.gen_bool_expr(ctx, e),
        }
    }

    /*
     * Pushes the return slots, then the arguments from last to first, and
     * drops the arguments once the callee is done. Returns how many result
     * slots are left on the stack.
     */
    pub(super) fn gen_call<'a>(&mut self, ctx: &mut Context, call: &FuncCall<'a>) -> GenResult<'a, usize> {
        let function = {
            let ctx = &*ctx;
            self.functions.resolve(&call.ident, call.args.len(), || {
                call.args.iter().map(|arg| static_type(ctx, arg)).collect()
            })?.clone()
        };

        for _ in 0..function.returns {
            self.push(ctx, "QWORD 0")?;
        }
        for arg in call.args.iter().rev() {
            self.gen_expr(ctx, arg)?;
        }

        writeln!(self.asm, "\tcall {}", function.label)?;
        self.release(call.args.len())?;
        ctx.popped(call.args.len());

        trace!(label = %function.label, depth = ctx.depth(), "emitted call");
        Ok(function.returns)
    }

    fn gen_value_call<'a>(&mut self, ctx: &mut Context, call: &FuncCall<'a>) -> GenResult<'a, ()> {
        let returns = self.gen_call(ctx, call)?;
        if returns != 1 {
            return Err((call.ident.pos, format!(
                "function '{}' returns {} values and can't be used as a term",
                call.ident.text(), returns
            )).into());
        }
        Ok(())
    }

    fn gen_variable<'a>(&mut self, ctx: &mut Context, tok: &Token<'a>) -> GenResult<'a, ()> {
        let var = lookup_or_fail(ctx, tok)?;
        let operand = format!("QWORD {}", ctx.address(var));
        self.push(ctx, &operand)
    }

    fn gen_dereference<'a>(&mut self, ctx: &mut Context, tok: &Token<'a>) -> GenResult<'a, ()> {
        let var = lookup_or_fail(ctx, tok)?;
        writeln!(self.asm, "\tmov rax, QWORD {}", ctx.address(var))?;
        writeln!(self.asm, "\tmov rax, QWORD [rax]")?;
        self.push(ctx, "rax")
    }

    /* Pops both operands into `rax` (left) and `rbx` (right). */
    fn pop_operands<'a>(&mut self, ctx: &mut Context) -> GenResult<'a, ()> {
        self.pop(ctx, "rbx")?;
        self.pop(ctx, "rax")
    }

    fn gen_int_expr<'a>(&mut self, ctx: &mut Context, expr: &IntExpr<'a>) -> GenResult<'a, ()> {
        let (op, lhs, rhs) = match expr {
            IntExpr::Term(term) => return self.gen_int_term(ctx, term),
            IntExpr::BinOp(op, lhs, rhs) => (op, lhs, rhs),
        };

        self.gen_int_expr(ctx, lhs)?;
        self.gen_int_expr(ctx, rhs)?;
        self.pop_operands(ctx)?;

        match op {
            IntBinOp::Add => writeln!(self.asm, "\tadd rax, rbx")?,
            IntBinOp::Subtract => writeln!(self.asm, "\tsub rax, rbx")?,
            IntBinOp::Multiply => writeln!(self.asm, "\timul rax, rbx")?,
            IntBinOp::Divide | IntBinOp::Modulo => {
                writeln!(self.asm, "\tcqo")?;
                writeln!(self.asm, "\tidiv rbx")?;
            },
        }

        match op {
            IntBinOp::Modulo => self.push(ctx, "rdx"),
            _ => self.push(ctx, "rax"),
        }
    }

    fn gen_int_term<'a>(&mut self, ctx: &mut Context, term: &IntTerm<'a>) -> GenResult<'a, ()> {
        match term {
            IntTerm::Negative(sub) => {
                self.gen_int_term(ctx, sub)?;
                self.pop(ctx, "rax")?;
                writeln!(self.asm, "\tneg rax")?;
                self.push(ctx, "rax")
            },
            IntTerm::Literal(tok) => {
                writeln!(self.asm, "\tmov rax, {}", tok.text())?;
                self.push(ctx, "rax")
            },
            IntTerm::Identifier(tok) => self.gen_variable(ctx, tok),
            IntTerm::Bracketed(e) => self.gen_int_expr(ctx, e),
            IntTerm::AddressOf(tok) => {
                let var = lookup_or_fail(ctx, tok)?;
                writeln!(self.asm, "\tlea rax, {}", ctx.address(var))?;
                self.push(ctx, "rax")
            },
            IntTerm::Dereference(tok) => self.gen_dereference(ctx, tok),
            IntTerm::Call(call) => self.gen_value_call(ctx, call),
        }
    }

    /* Both operands are normalised to 0/1 before being combined. */
    fn gen_bool_expr<'a>(&mut self, ctx: &mut Context, expr: &BoolExpr<'a>) -> GenResult<'a, ()> {
        let (op, lhs, rhs) = match expr {
            BoolExpr::Term(term) => return self.gen_bool_term(ctx, term),
            BoolExpr::BinOp(op, lhs, rhs) => (op, lhs, rhs),
        };

        self.gen_bool_expr(ctx, lhs)?;
        self.gen_bool_expr(ctx, rhs)?;
        self.pop_operands(ctx)?;

        writeln!(self.asm, "\ttest rax, rax")?;
        writeln!(self.asm, "\tsetne al")?;
        writeln!(self.asm, "\ttest rbx, rbx")?;
        writeln!(self.asm, "\tsetne bl")?;
        match op {
            BoolBinOp::And => writeln!(self.asm, "\tand al, bl")?,
            BoolBinOp::Or => writeln!(self.asm, "\tor al, bl")?,
        }
        writeln!(self.asm, "\tmovzx rax, al")?;
        self.push(ctx, "rax")
    }

    fn gen_comparison<'a>(&mut self, ctx: &mut Context, op: RelOp) -> GenResult<'a, ()> {
        self.pop_operands(ctx)?;
        writeln!(self.asm, "\tcmp rax, rbx")?;
        writeln!(self.asm, "\tset{} al", condition_code(op))?;
        writeln!(self.asm, "\tmovzx rax, al")?;
        self.push(ctx, "rax")
    }

    fn gen_bool_term<'a>(&mut self, ctx: &mut Context, term: &BoolTerm<'a>) -> GenResult<'a, ()> {
        match term {
            BoolTerm::Not(sub) => {
                self.gen_bool_term(ctx, sub)?;
                self.pop(ctx, "rax")?;
                writeln!(self.asm, "\ttest rax, rax")?;
                writeln!(self.asm, "\tsete al")?;
                writeln!(self.asm, "\tmovzx rax, al")?;
                self.push(ctx, "rax")
            },
            BoolTerm::Identifier(tok) => self.gen_variable(ctx, tok),
            BoolTerm::Bracketed(e) => self.gen_bool_expr(ctx, e),
            BoolTerm::Dereference(tok) => self.gen_dereference(ctx, tok),
            BoolTerm::Call(call) => self.gen_value_call(ctx, call),
            BoolTerm::CompareInt(op, lhs, rhs) => {
                self.gen_int_expr(ctx, lhs)?;
                self.gen_int_expr(ctx, rhs)?;
                self.gen_comparison(ctx, *op)
            },
            BoolTerm::CompareBool(op, lhs, rhs) => {
                self.gen_bool_term(ctx, lhs)?;
                self.gen_bool_term(ctx, rhs)?;
                self.gen_comparison(ctx, *op)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorOptions;
    use lexer::tokenize;

    fn generate_src(src: &str) -> GenResult<'static, String> {
        let tokens = tokenize("test.mltn", src).unwrap();
        let program = parser::parse("test.mltn", &tokens).unwrap();
        Generator::new(GeneratorOptions {comments: false}).generate(&program)
    }

    #[test]
    fn signed_division_and_modulo() {
        let asm = generate_src("var x int; x = 7 / 2; x = 7 % 2;").unwrap();
        assert!(asm.contains("\tcqo\n\tidiv rbx\n\tpush rax\n"));
        assert!(asm.contains("\tcqo\n\tidiv rbx\n\tpush rdx\n"));
    }

    #[test]
    fn operands_are_popped_right_first() {
        let asm = generate_src("var x int; x = 1 - 2;").unwrap();
        assert!(asm.contains("\
\tmov rax, 1
\tpush rax
\tmov rax, 2
\tpush rax
\tpop rbx
\tpop rax
\tsub rax, rbx
\tpush rax
"));
    }

    #[test]
    fn variable_offsets_follow_the_stack_depth() {
        // `a` is one slot below `b`; one temporary is already pushed when
        // `a` is read on the right of the `+`.
        let asm = generate_src("var a int; var b int; b = b + a;").unwrap();
        assert!(asm.contains("\tpush QWORD [rsp + 0]\n\tpush QWORD [rsp + 16]\n"));
    }

    #[test]
    fn comparison_uses_signed_condition_codes() {
        let asm = generate_src("var c bool; c = 1 <= 2;").unwrap();
        assert!(asm.contains("\tcmp rax, rbx\n\tsetle al\n\tmovzx rax, al\n"));
    }

    #[test]
    fn logical_operators_normalise_their_operands() {
        let asm = generate_src("var a bool; var b bool; a = !a || b;").unwrap();
        assert!(asm.contains("\tsete al\n"));
        assert!(asm.contains("\tsetne bl\n\tor al, bl\n"));
    }

    #[test]
    fn undefined_variable() {
        let err = generate_src("var x int;\nx = y + 1;").unwrap_err();
        assert_eq!(err.message, "undefined variable: 'y'");
        assert_eq!((err.pos.line, err.pos.column), (2, 5));
    }

    #[test]
    fn call_without_result_in_expression() {
        let err = generate_src("func 0 f() { } var x int; x = f() + 1;").unwrap_err();
        assert_eq!(err.message, "function 'f' returns 0 values and can't be used as a term");
    }

    #[test]
    fn argument_types_select_the_overload() {
        let src = "\
func 1 f(x int) { return x; }
func 1 f(x bool) { return 0; }
var b bool;
var n int;
n = f(b);
n = f(n);
n = f(&n == &n);
";
        let asm = generate_src(src).unwrap();
        let calls: Vec<&str> = asm.lines().filter(|l| l.starts_with("\tcall")).collect();
        assert_eq!(calls, vec!["\tcall f_B.", "\tcall f_I.", "\tcall f_B."]);
    }
}
