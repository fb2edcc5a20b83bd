use crate::literal::Literal;
use crate::token::Token;

/// Stable node identity for a parsed expression, distinct from structural
/// equality. Assigned once by the parser; the resolver's `locals` side-table
/// keys on this, never on a name or lexeme, since two occurrences of the same
/// identifier are distinct nodes that may resolve to different scope depths.
pub type ExprId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Unary(UnaryData),
    Binary(BinaryData),
    Logical(LogicalData),
    Grouping(GroupingData),
    Variable(VariableData),
    Assign(AssignData),
    Call(CallData),
    Get(GetData),
    Set(SetData),
    This(ThisData),
    Super(SuperData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryData {
    pub operator: Token,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingData {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableData {
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignData {
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub callee: Box<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetData {
    pub object: Box<Expr>,
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetData {
    pub object: Box<Expr>,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThisData {
    pub keyword: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperData {
    pub keyword: Token,
    pub method: Token,
}
