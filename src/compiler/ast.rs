use crate::common::span::Spanned;

/// Represents a node in the parsed `AST`.
/// Each syntax-level construct of Zen has its own variant here;
/// every child is owned exclusively (the `AST` is a tree, never a DAG).
/// A node's variant determines exactly which fields are meaningful --
/// nothing else should be read off of it.
#[derive(Debug, Clone, PartialEq)]
pub enum AST {
    Number(f64),
    Boolean(bool),
    String(String),
    Null,
    Undecidable,

    Variable(String),

    VariableDefinition {
        name: String,
        value: Box<Spanned<AST>>,
    },

    Assignment {
        lvalue: Box<Spanned<AST>>,
        rvalue: Box<Spanned<AST>>,
    },

    BinaryOp {
        op: BinOp,
        left: Box<Spanned<AST>>,
        right: Box<Spanned<AST>>,
    },

    UnaryOp {
        op: UnOp,
        operand: Box<Spanned<AST>>,
    },

    FunctionDefinition {
        name: Option<String>,
        params: Vec<Param>,
        body: Box<Spanned<AST>>,
    },

    FunctionCall {
        callee: Box<Spanned<AST>>,
        args: Vec<Spanned<AST>>,
    },

    Lambda {
        params: Vec<Param>,
        body: Box<Spanned<AST>>,
    },

    Spread(Box<Spanned<AST>>),

    Array(Vec<Spanned<AST>>),

    Object(Vec<(String, Spanned<AST>)>),

    PropertyAccess {
        object: Box<Spanned<AST>>,
        property: String,
    },

    If {
        condition: Box<Spanned<AST>>,
        then_branch: Box<Spanned<AST>>,
        else_branch: Option<Box<Spanned<AST>>>,
    },

    While {
        condition: Box<Spanned<AST>>,
        body: Box<Spanned<AST>>,
    },

    For {
        variable: String,
        iterable: Box<Spanned<AST>>,
        body: Box<Spanned<AST>>,
    },

    Return(Option<Box<Spanned<AST>>>),

    Throw(Box<Spanned<AST>>),

    TryCatch {
        try_body: Box<Spanned<AST>>,
        exception_var: String,
        catch_body: Box<Spanned<AST>>,
    },

    ClassDefinition {
        name: String,
        parent: Option<String>,
        methods: Vec<Spanned<AST>>, // each a FunctionDefinition
    },

    New {
        class_name: String,
        args: Vec<Spanned<AST>>,
    },

    Import {
        path: String,
        bindings: Vec<String>,
    },

    Export {
        name: String,
    },

    Compound(Vec<Spanned<AST>>),

    LogicalQuantifier {
        kind: QuantifierKind,
        variable: String,
        domain: Option<Box<Spanned<AST>>>,
        body: Box<Spanned<AST>>,
    },

    LogicalPredicate {
        name: String,
        args: Vec<Spanned<AST>>,
    },

    LogicalConnective {
        kind: ConnectiveKind,
        operands: Vec<Spanned<AST>>,
    },

    MathEquation {
        relation: Relation,
        left: Box<Spanned<AST>>,
        right: Box<Spanned<AST>>,
    },

    FileReference {
        path: String,
        property_path: Vec<String>,
    },

    FileGet {
        path: Box<Spanned<AST>>,
        property_path: Vec<String>,
    },

    FilePut {
        path: Box<Spanned<AST>>,
        property_path: Vec<String>,
        value: Box<Spanned<AST>>,
    },
}

/// A formal function parameter: either an ordinary binding name,
/// or a trailing `...rest` spread that collects remaining arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Named(String),
    Spread(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    Universal,
    Existential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectiveKind {
    And,
    Or,
    Implies,
    Iff,
    Not,
}

/// The relation named by a `MathEquation`/`MathInequality` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl AST {
    /// Shortcut for building a `Compound` of statements, as produced at the
    /// root of every parse and inside every block.
    pub fn compound(statements: Vec<Spanned<AST>>) -> AST {
        AST::Compound(statements)
    }
}
