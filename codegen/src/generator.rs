
use std::fmt::Write;

use tracing::debug;

use parser::ast::*;
use parser::MAX_SYSCALL_ARGS;

use crate::error::GenResult;

mod context;
mod expr;
mod functions;
mod labels;

use context::{lookup_or_fail, Context};
use functions::FunctionTable;
use labels::LabelGenerator;

// Registers receiving the syscall number and its arguments, in order.
const SYSCALL_REGISTERS: [&str; MAX_SYSCALL_ARGS] = ["rax", "rdi", "rsi", "rdx", "r10", "r8", "r9"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    /* Annotate function prologues/epilogues and scope boundaries. */
    pub comments: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {comments: true}
    }
}

pub(crate) struct Generator {
    options: GeneratorOptions,
    asm: String,
    labels: LabelGenerator,
    functions: FunctionTable,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Generator {
            options,
            asm: String::new(),
            labels: LabelGenerator::new(),
            functions: FunctionTable::new(),
        }
    }

    /*
     * Functions come first, in source order, then the entry point with
     * the remaining top-level statements and a fallback `exit(0)`.
     */
    pub fn generate<'a>(mut self, program: &Program<'a>) -> GenResult<'a, String> {
        writeln!(self.asm, "global _start")?;
        writeln!(self.asm)?;

        for stmt in &program.stmts {
            if let Stmt::FuncDefinition(def) = stmt {
                self.gen_function(def)?;
            }
        }

        writeln!(self.asm, "_start:")?;
        let mut ctx = Context::top_level();
        for stmt in &program.stmts {
            match stmt {
                Stmt::FuncDefinition(_) => (),
                _ => self.gen_stmt(&mut ctx, stmt)?,
            }
        }

        writeln!(self.asm, "\tmov rax, 60")?;
        writeln!(self.asm, "\tmov rdi, 0")?;
        writeln!(self.asm, "\tsyscall")?;

        debug!(bytes = self.asm.len(), "generated assembly");
        Ok(self.asm)
    }

    fn comment<'a>(&mut self, text: &str) -> GenResult<'a, ()> {
        if self.options.comments {
            writeln!(self.asm, "\t;{}", text)?;
        }
        Ok(())
    }

    fn push<'a>(&mut self, ctx: &mut Context, operand: &str) -> GenResult<'a, ()> {
        writeln!(self.asm, "\tpush {}", operand)?;
        ctx.pushed(1);
        Ok(())
    }

    fn pop<'a>(&mut self, ctx: &mut Context, operand: &str) -> GenResult<'a, ()> {
        writeln!(self.asm, "\tpop {}", operand)?;
        ctx.popped(1);
        Ok(())
    }

    /* Drops `count` slots without touching the bookkeeping. */
    fn release<'a>(&mut self, count: usize) -> GenResult<'a, ()> {
        if count > 0 {
            writeln!(self.asm, "\tadd rsp, {}", count * 8)?;
        }
        Ok(())
    }

    fn gen_function<'a>(&mut self, def: &FuncDefinition<'a>) -> GenResult<'a, ()> {
        let params = def.params.iter().map(|p| p.ty.clone()).collect();
        let function = self.functions.define(&def.ident, params, def.returns)?;
        debug!(label = %function.label, returns = function.returns, "generating function");

        let mut ctx = Context::for_function(&def.params, def.returns)?;

        writeln!(self.asm, "{}:", function.label)?;
        self.comment("=====FUNCTION SETUP=====")?;
        writeln!(self.asm, "\tpush rbp")?;
        writeln!(self.asm, "\tmov rbp, rsp")?;

        self.comment("=====FUNCTION BODY=====")?;
        self.gen_scope(&mut ctx, &def.body)?;

        self.comment("=====FUNCTION CLEANUP=====")?;
        writeln!(self.asm, "\tpop rbp")?;
        writeln!(self.asm, "\tret")?;
        writeln!(self.asm)?;

        Ok(())
    }

    fn gen_scope<'a>(&mut self, ctx: &mut Context, scope: &Scope<'a>) -> GenResult<'a, ()> {
        self.comment("---start_scope---")?;
        ctx.begin_scope();

        for stmt in &scope.stmts {
            self.gen_stmt(ctx, stmt)?;
        }

        let released = ctx.end_scope();
        self.release(released)?;
        self.comment("---end_scope---")
    }

    fn gen_stmt<'a>(&mut self, ctx: &mut Context, stmt: &Stmt<'a>) -> GenResult<'a, ()> {
        match stmt {
            Stmt::VarDeclare(typed) => {
                ctx.declare(typed)?;
                writeln!(self.asm, "\tmov rax, 0")?;
                self.push(ctx, "rax")?;
            },
            Stmt::VarAssign(ident, expr) => {
                let var = lookup_or_fail(ctx, ident)?.clone();
                self.gen_expr(ctx, expr)?;
                self.pop(ctx, "rax")?;
                writeln!(self.asm, "\tmov QWORD {}, rax", ctx.address(&var))?;
            },
            Stmt::PointerAssign(ident, expr) => {
                let var = lookup_or_fail(ctx, ident)?.clone();
                self.gen_expr(ctx, expr)?;
                self.pop(ctx, "rax")?;
                writeln!(self.asm, "\tmov rbx, QWORD {}", ctx.address(&var))?;
                writeln!(self.asm, "\tmov QWORD [rbx], rax")?;
            },
            Stmt::Scope(scope) => self.gen_scope(ctx, scope)?,
            Stmt::If(if_stmt) => self.gen_if(ctx, if_stmt)?,
            Stmt::While(cond, body) => {
                let start = self.labels.new_label("startWhile");
                let end = self.labels.new_label("endWhile");

                writeln!(self.asm, "{}:", start)?;
                self.gen_expr(ctx, cond)?;
                self.pop(ctx, "rax")?;
                writeln!(self.asm, "\ttest rax, rax")?;
                writeln!(self.asm, "\tjz {}", end)?;

                ctx.enter_loop(start.clone(), end.clone());
                self.gen_scope(ctx, body)?;
                ctx.exit_loop();

                writeln!(self.asm, "\tjmp {}", start)?;
                writeln!(self.asm, "{}:", end)?;
            },
            Stmt::Break(tok) => {
                let (target, released) = match ctx.innermost_loop() {
                    Some(l) => (l.end.clone(), ctx.locals_since(l.mark)),
                    None => return Err((tok.pos, "can't break when not in a loop").into()),
                };
                self.release(released)?;
                writeln!(self.asm, "\tjmp {}", target)?;
            },
            Stmt::Continue(tok) => {
                let (target, released) = match ctx.innermost_loop() {
                    Some(l) => (l.start.clone(), ctx.locals_since(l.mark)),
                    None => return Err((tok.pos, "can't continue when not in a loop").into()),
                };
                self.release(released)?;
                writeln!(self.asm, "\tjmp {}", target)?;
            },
            Stmt::FuncDefinition(def) => {
                return Err((def.ident.pos, format!(
                    "function '{}' must be defined at the top level", def.ident.text()
                )).into());
            },
            Stmt::Return(tok, values) => {
                let frame = match ctx.frame() {
                    Some(frame) => frame,
                    None => return Err((tok.pos, "can only return when in a function").into()),
                };
                if values.len() != frame.returns {
                    return Err((tok.pos, format!(
                        "incorrect number of values returned: expected {}, found {}",
                        frame.returns, values.len()
                    )).into());
                }

                for (i, value) in values.iter().enumerate() {
                    self.gen_expr(ctx, value)?;
                    let slot = (frame.params + i + 2) * 8;
                    self.pop(ctx, &format!("QWORD [rbp + {}]", slot))?;
                }

                self.release(ctx.locals())?;
                writeln!(self.asm, "\tpop rbp")?;
                writeln!(self.asm, "\tret")?;
            },
            Stmt::Syscall(_, args) => {
                // The parser caps the argument count to the register count.
                let used: Vec<_> = args.iter().zip(SYSCALL_REGISTERS.iter()).collect();
                for (arg, _) in &used {
                    self.gen_expr(ctx, arg)?;
                }
                for (_, reg) in used.iter().rev() {
                    self.pop(ctx, reg)?;
                }
                writeln!(self.asm, "\tsyscall")?;
            },
            Stmt::Call(call) => {
                // The results are not stored anywhere.
                let returns = self.gen_call(ctx, call)?;
                self.release(returns)?;
                ctx.popped(returns);
            },
        }

        Ok(())
    }

    fn gen_if<'a>(&mut self, ctx: &mut Context, if_stmt: &If<'a>) -> GenResult<'a, ()> {
        self.gen_expr(ctx, &if_stmt.cond)?;
        self.pop(ctx, "rax")?;

        let else_label = self.labels.new_label("else");
        writeln!(self.asm, "\ttest rax, rax")?;
        writeln!(self.asm, "\tjz {}", else_label)?;
        self.gen_scope(ctx, &if_stmt.scope)?;

        match &if_stmt.else_branch {
            None => writeln!(self.asm, "{}:", else_label)?,
            Some(branch) => {
                let end_label = self.labels.new_label("endIf");
                writeln!(self.asm, "\tjmp {}", end_label)?;
                writeln!(self.asm, "{}:", else_label)?;

                match branch {
                    Else::ElseIf(elif) => self.gen_if(ctx, elif)?,
                    Else::Scope(scope) => self.gen_scope(ctx, scope)?,
                }

                writeln!(self.asm, "{}:", end_label)?;
            },
        }

        Ok(())
    }
}
