use crate::diagnostics::SourceSpan;

/// Leaf literals keep their raw source text for numbers so fractions can
/// be derived from the literal's textual digits rather than a parsed
/// float.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    Bool(bool),
    Char(char),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

/// `=` plus the compound forms that dispatch to the corresponding value
/// capability on the existing binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Factorial,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Assign {
        name: String,
        op: AssignOp,
        value: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    /// `|x|`: absolute value for numbers, length for sequence-derived
    /// values.
    Pipe(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Anonymous single-expression function literal.
    Closure {
        params: Vec<String>,
        body: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    MatrixLiteral(Vec<Vec<Expr>>),
    Group(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub default: Option<Expr>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    /// Conditional block: yields the block's value when the guard is
    /// true, nothing otherwise.
    When {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        bindings: Vec<String>,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Function {
        name: String,
        params: Vec<ParamDecl>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone)]
pub struct Program {
    pub items: Vec<Stmt>,
}
