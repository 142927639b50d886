
use lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Bool,
    Int,
    Char,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Pure(BaseType),
    Pointer(Box<Type>),
}

impl Type {
    pub fn pointer_to(ty: Type) -> Self {
        Type::Pointer(Box::new(ty))
    }

    /*
     * Encoding used in function signatures: one letter per base type,
     * prefixed by one `P` per level of indirection.
     */
    pub fn code(&self) -> String {
        match self {
            Type::Pure(BaseType::Bool) => "B".to_string(),
            Type::Pure(BaseType::Int) => "I".to_string(),
            Type::Pure(BaseType::Char) => "C".to_string(),
            Type::Pointer(sub) => format!("P{}", sub.code()),
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(sub) => Some(sub),
            Type::Pure(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedIdent<'a> {
    pub ident: Token<'a>,
    pub ty: Type,
}

impl TypedIdent<'_> {
    pub fn name(&self) -> String {
        self.ident.text()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program<'a> {
    pub stmts: Vec<Stmt<'a>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope<'a> {
    pub stmts: Vec<Stmt<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    VarDeclare(TypedIdent<'a>),
    VarAssign(Token<'a>, Expr<'a>),
    // `*name = expr`
    PointerAssign(Token<'a>, Expr<'a>),
    Scope(Scope<'a>),
    If(If<'a>),
    While(Expr<'a>, Scope<'a>),
    Break(Token<'a>),
    Continue(Token<'a>),
    FuncDefinition(FuncDefinition<'a>),
    Return(Token<'a>, Vec<Expr<'a>>),
    Syscall(Token<'a>, Vec<Expr<'a>>),
    Call(FuncCall<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct If<'a> {
    pub cond: Expr<'a>,
    pub scope: Scope<'a>,
    pub else_branch: Option<Else<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Else<'a> {
    ElseIf(Box<If<'a>>),
    Scope(Scope<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDefinition<'a> {
    pub ident: Token<'a>,
    pub returns: usize,
    pub params: Vec<TypedIdent<'a>>,
    pub body: Scope<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall<'a> {
    pub ident: Token<'a>,
    pub args: Vec<Expr<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Int(IntExpr<'a>),
    Bool(BoolExpr<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntExpr<'a> {
    BinOp(IntBinOp, Box<IntExpr<'a>>, Box<IntExpr<'a>>),
    Term(IntTerm<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntTerm<'a> {
    Negative(Box<IntTerm<'a>>),
    Literal(Token<'a>),
    Identifier(Token<'a>),
    Bracketed(Box<IntExpr<'a>>),
    // `&name`
    AddressOf(Token<'a>),
    // `*name`
    Dereference(Token<'a>),
    Call(FuncCall<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolBinOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr<'a> {
    BinOp(BoolBinOp, Box<BoolExpr<'a>>, Box<BoolExpr<'a>>),
    Term(BoolTerm<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoolTerm<'a> {
    Not(Box<BoolTerm<'a>>),
    Identifier(Token<'a>),
    Bracketed(Box<BoolExpr<'a>>),
    Dereference(Token<'a>),
    Call(FuncCall<'a>),
    CompareInt(RelOp, IntExpr<'a>, IntExpr<'a>),
    CompareBool(RelOp, Box<BoolTerm<'a>>, Box<BoolTerm<'a>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes() {
        assert_eq!(Type::Pure(BaseType::Bool).code(), "B");
        assert_eq!(Type::Pure(BaseType::Char).code(), "C");
        let ptr = Type::pointer_to(Type::pointer_to(Type::Pure(BaseType::Int)));
        assert_eq!(ptr.code(), "PPI");
        assert_eq!(ptr.pointee().map(Type::code), Some("PI".to_string()));
        assert_eq!(Type::Pure(BaseType::Int).pointee(), None);
    }
}
