
// Canonical source text. Brackets are only printed where the source had
// them, so parsing the output gives back the same tree.

use std::fmt;

use super::ast::*;

const INDENT: usize = 4;

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Bool => write!(f, "bool"),
            BaseType::Int => write!(f, "int"),
            BaseType::Char => write!(f, "char"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Pure(base) => write!(f, "{}", base),
            Type::Pointer(sub) => write!(f, "*{}", sub),
        }
    }
}

impl fmt::Display for TypedIdent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.ty)
    }
}

impl fmt::Display for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.stmts {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/* Writes the braces and body; the caller has already written the header. */
fn write_scope(f: &mut fmt::Formatter<'_>, scope: &Scope<'_>, indent: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for stmt in &scope.stmts {
        write_stmt(f, stmt, indent + INDENT)?;
    }
    write!(f, "{:indent$}}}", "", indent = indent)
}

fn write_if(f: &mut fmt::Formatter<'_>, if_stmt: &If<'_>, indent: usize) -> fmt::Result {
    write!(f, "if ({}) ", if_stmt.cond)?;
    write_scope(f, &if_stmt.scope, indent)?;
    match &if_stmt.else_branch {
        Some(Else::ElseIf(elif)) => {
            write!(f, " else ")?;
            write_if(f, elif, indent)
        },
        Some(Else::Scope(scope)) => {
            write!(f, " else ")?;
            write_scope(f, scope, indent)
        },
        None => Ok(()),
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt<'_>, indent: usize) -> fmt::Result {
    write!(f, "{:indent$}", "", indent = indent)?;

    match stmt {
        Stmt::VarDeclare(typed) => write!(f, "var {};", typed)?,
        Stmt::VarAssign(ident, expr) => write!(f, "{} = {};", ident.text(), expr)?,
        Stmt::PointerAssign(ident, expr) => write!(f, "*{} = {};", ident.text(), expr)?,
        Stmt::Scope(scope) => write_scope(f, scope, indent)?,
        Stmt::If(if_stmt) => write_if(f, if_stmt, indent)?,
        Stmt::While(cond, scope) => {
            write!(f, "while ({}) ", cond)?;
            write_scope(f, scope, indent)?;
        },
        Stmt::Break(_) => write!(f, "break;")?,
        Stmt::Continue(_) => write!(f, "continue;")?,
        Stmt::FuncDefinition(def) => {
            write!(f, "func {} {}(", def.returns, def.ident.text())?;
            write_list(f, &def.params)?;
            write!(f, ") ")?;
            write_scope(f, &def.body, indent)?;
        },
        Stmt::Return(_, values) => {
            write!(f, "return")?;
            if !values.is_empty() {
                write!(f, " ")?;
                write_list(f, values)?;
            }
            write!(f, ";")?;
        },
        Stmt::Syscall(_, args) => {
            write!(f, "syscall(")?;
            write_list(f, args)?;
            write!(f, ");")?;
        },
        Stmt::Call(call) => write!(f, "{};", call)?,
    }

    writeln!(f)
}

impl fmt::Display for Stmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl fmt::Display for FuncCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ident.text())?;
        write_list(f, &self.args)?;
        write!(f, ")")
    }
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(e) => write!(f, "{}", e),
            Expr::Bool(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for IntBinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            IntBinOp::Add => "+",
            IntBinOp::Subtract => "-",
            IntBinOp::Multiply => "*",
            IntBinOp::Divide => "/",
            IntBinOp::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for IntExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntExpr::BinOp(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
            IntExpr::Term(term) => write!(f, "{}", term),
        }
    }
}

impl fmt::Display for IntTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntTerm::Negative(term) => write!(f, "-{}", term),
            IntTerm::Literal(tok) | IntTerm::Identifier(tok) => write!(f, "{}", tok.text()),
            IntTerm::Bracketed(e) => write!(f, "({})", e),
            IntTerm::AddressOf(tok) => write!(f, "&{}", tok.text()),
            IntTerm::Dereference(tok) => write!(f, "*{}", tok.text()),
            IntTerm::Call(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for BoolBinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolBinOp::And => write!(f, "&&"),
            BoolBinOp::Or => write!(f, "||"),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            RelOp::Equal => "==",
            RelOp::NotEqual => "!=",
            RelOp::LessThan => "<",
            RelOp::LessThanOrEqual => "<=",
            RelOp::GreaterThan => ">",
            RelOp::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for BoolExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::BinOp(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
            BoolExpr::Term(term) => write!(f, "{}", term),
        }
    }
}

impl fmt::Display for BoolTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolTerm::Not(term) => write!(f, "!{}", term),
            BoolTerm::Identifier(tok) => write!(f, "{}", tok.text()),
            BoolTerm::Bracketed(e) => write!(f, "({})", e),
            BoolTerm::Dereference(tok) => write!(f, "*{}", tok.text()),
            BoolTerm::Call(call) => write!(f, "{}", call),
            BoolTerm::CompareInt(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
            BoolTerm::CompareBool(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}
