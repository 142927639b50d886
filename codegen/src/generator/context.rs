
use tracing::trace;

use lexer::Token;
use parser::ast::{Type, TypedIdent};

use crate::error::GenResult;

#[derive(Debug, Clone)]
pub(crate) struct Variable {
    pub name: String,
    pub ty: Type,
    /*
     * Locals: depth of the stack when the variable was pushed.
     * Parameters: offset in quadwords above the frame base.
     */
    pub slot: usize,
    pub is_param: bool,
}

pub(crate) struct Loop {
    pub start: String,
    pub end: String,
    // Number of variables alive when the loop was entered.
    pub mark: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub params: usize,
    pub returns: usize,
}

/*
 * Everything the emitter tracks while walking one body of code: the
 * top-level statements, or a single function. A fresh context is built for
 * each function so that no depth or variable leaks from one to the other.
 *
 * At every statement boundary `depth` is the number of live locals; inside
 * an expression it also counts the temporaries pushed so far.
 */
pub(crate) struct Context {
    depth: usize,
    variables: Vec<Variable>,
    scopes: Vec<usize>,
    loops: Vec<Loop>,
    frame: Option<Frame>,
}

impl Context {
    pub fn top_level() -> Self {
        Context {
            depth: 0,
            variables: Vec::new(),
            scopes: Vec::new(),
            loops: Vec::new(),
            frame: None,
        }
    }

    /*
     * Parameter `i` sits right above the saved frame base and the return
     * address, the caller having pushed the arguments in reverse order.
     */
    pub fn for_function<'a>(params: &[TypedIdent<'a>], returns: usize) -> GenResult<'a, Self> {
        let mut variables: Vec<Variable> = Vec::new();
        for (i, param) in params.iter().enumerate() {
            let name = param.name();
            if variables.iter().any(|v| v.name == name) {
                return Err((param.ident.pos, format!("variable identifier already used: {}", name)).into());
            }
            variables.push(Variable {
                name,
                ty: param.ty.clone(),
                slot: i + 2,
                is_param: true,
            });
        }

        Ok(Context {
            depth: 0,
            variables,
            scopes: Vec::new(),
            loops: Vec::new(),
            frame: Some(Frame {params: params.len(), returns}),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn pushed(&mut self, count: usize) {
        self.depth += count;
    }

    pub fn popped(&mut self, count: usize) {
        self.depth -= count;
    }

    pub fn frame(&self) -> Option<Frame> {
        self.frame
    }

    /* Most recent declaration wins. */
    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().rev().find(|v| v.name == name)
    }

    pub fn address(&self, var: &Variable) -> String {
        if var.is_param {
            format!("[rbp + {}]", var.slot * 8)
        } else {
            format!("[rsp + {}]", (self.depth - var.slot - 1) * 8)
        }
    }

    /*
     * Registers a local that the caller is about to push. Names must be
     * unique among every variable still alive.
     */
    pub fn declare<'a>(&mut self, typed: &TypedIdent<'a>) -> GenResult<'a, ()> {
        let name = typed.name();
        if self.lookup(&name).is_some() {
            return Err((typed.ident.pos, format!("variable identifier already used: {}", name)).into());
        }

        trace!(%name, slot = self.depth, "declared variable");
        self.variables.push(Variable {
            name,
            ty: typed.ty.clone(),
            slot: self.depth,
            is_param: false,
        });
        Ok(())
    }

    pub fn begin_scope(&mut self) {
        self.scopes.push(self.variables.len());
    }

    /* Forgets the variables of the innermost scope, returning how many slots they used. */
    pub fn end_scope(&mut self) -> usize {
        let mark = self.scopes.pop().unwrap_or(self.variables.len());
        let released = self.variables.len() - mark;

        self.variables.truncate(mark);
        self.depth -= released;
        trace!(released, depth = self.depth, "left scope");
        released
    }

    pub fn enter_loop(&mut self, start: String, end: String) {
        let mark = self.variables.len();
        self.loops.push(Loop {start, end, mark});
    }

    pub fn exit_loop(&mut self) {
        self.loops.pop();
    }

    pub fn innermost_loop(&self) -> Option<&Loop> {
        self.loops.last()
    }

    /* Slots taken by the variables declared since `mark`. */
    pub fn locals_since(&self, mark: usize) -> usize {
        self.variables.len() - mark
    }

    /* Slots taken by every local of the current body, parameters excluded. */
    pub fn locals(&self) -> usize {
        let params = self.frame.map_or(0, |f| f.params);
        self.variables.len() - params
    }
}

/* Fails with the position of `tok` when `name` is not a live variable. */
pub(crate) fn lookup_or_fail<'a, 'c>(ctx: &'c Context, tok: &Token<'a>) -> GenResult<'a, &'c Variable> {
    let name = tok.text();
    ctx.lookup(&name)
        .ok_or_else(|| (tok.pos, format!("undefined variable: '{}'", name)).into())
}
