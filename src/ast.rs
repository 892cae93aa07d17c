// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolved syntax tree.
//!
//! The tree is produced and annotated upstream: every declaration names the
//! symbol it introduces and every expression carries the keys of the symbol
//! and type the resolver bound to it. Keys are looked up in the
//! [`SemanticModel`](crate::semantic::SemanticModel) of the same unit. Nodes
//! are never mutated once built.

use crate::Rc;

use core::{cmp, fmt, ops::Deref};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> cmp::Ord for NodeRef<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Rc::as_ptr(&self.r).cmp(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::PartialOrd for NodeRef<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

impl<T: Serialize> Serialize for NodeRef<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.r.as_ref().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NodeRef<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

pub type Ref<T> = NodeRef<T>;

/// Source range of a node. Lines and columns are 1-based; an all-zero span
/// means the producer did not supply a location.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(default)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub const fn new(line: u32, col: u32) -> Self {
        Self {
            line,
            col,
            end_line: line,
            end_col: col,
        }
    }

    pub const fn start(&self) -> (u32, u32) {
        (self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CompilationUnit {
    #[serde(default)]
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub types: Vec<Ref<ClassDecl>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassDecl {
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub kind: ClassKind,
    /// `None` for anonymous class bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl ClassDecl {
    pub fn methods(&self) -> impl Iterator<Item = &Ref<MethodDecl>> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Field(Ref<VarDecl>),
    Method(Ref<MethodDecl>),
    Class(Ref<ClassDecl>),
    Initializer(Ref<Block>),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MethodDecl {
    #[serde(default)]
    pub span: Span,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub params: Vec<Ref<VarDecl>>,
    /// `None` for abstract and native methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Ref<Block>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VarDecl {
    #[serde(default)]
    pub span: Span,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<ExprRef>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub stmts: Vec<Ref<Stmt>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr {
        #[serde(default)]
        span: Span,
        expr: ExprRef,
    },
    Local(Ref<VarDecl>),
    Return {
        #[serde(default)]
        span: Span,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<ExprRef>,
    },
    If {
        #[serde(default)]
        span: Span,
        cond: ExprRef,
        then: Ref<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Ref<Stmt>>,
    },
    While {
        #[serde(default)]
        span: Span,
        cond: ExprRef,
        body: Ref<Stmt>,
    },
    Block(Ref<Block>),
    Class(Ref<ClassDecl>),
    Throw {
        #[serde(default)]
        span: Span,
        value: ExprRef,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Self::Expr { span, .. }
            | Self::Return { span, .. }
            | Self::If { span, .. }
            | Self::While { span, .. }
            | Self::Throw { span, .. } => *span,
            Self::Local(decl) => decl.span,
            Self::Block(block) => block.span,
            Self::Class(class) => class.span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    String,
    Char,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Null,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    #[default]
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    EqualTo,
    NotEqualTo,
    Plus,
    Minus,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
    BitAnd,
    BitOr,
    Xor,
    ShiftLeft,
    ShiftRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Complement,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        #[serde(default)]
        span: Span,
        literal: LiteralKind,
        #[serde(default)]
        value: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Ident {
        #[serde(default)]
        span: Span,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    // target.name
    Select {
        #[serde(default)]
        span: Span,
        target: ExprRef,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    // The callee is an `Ident` for unqualified calls and a `Select` otherwise.
    // `symbol` is the resolved method.
    Call {
        #[serde(default)]
        span: Span,
        callee: ExprRef,
        #[serde(default)]
        args: Vec<ExprRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    New {
        #[serde(default)]
        span: Span,
        #[serde(default)]
        args: Vec<ExprRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Ref<ClassDecl>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Assign {
        #[serde(default)]
        span: Span,
        #[serde(default)]
        op: AssignOp,
        target: ExprRef,
        value: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Binary {
        #[serde(default)]
        span: Span,
        op: BinaryOp,
        lhs: ExprRef,
        rhs: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Unary {
        #[serde(default)]
        span: Span,
        op: UnaryOp,
        operand: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Paren {
        #[serde(default)]
        span: Span,
        inner: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Cast {
        #[serde(default)]
        span: Span,
        operand: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Conditional {
        #[serde(default)]
        span: Span,
        cond: ExprRef,
        then: ExprRef,
        otherwise: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },

    Index {
        #[serde(default)]
        span: Span,
        target: ExprRef,
        index: ExprRef,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },
}

impl Expr {
    pub const fn span(&self) -> &Span {
        match *self {
            Self::Literal { ref span, .. }
            | Self::Ident { ref span, .. }
            | Self::Select { ref span, .. }
            | Self::Call { ref span, .. }
            | Self::New { ref span, .. }
            | Self::Assign { ref span, .. }
            | Self::Binary { ref span, .. }
            | Self::Unary { ref span, .. }
            | Self::Paren { ref span, .. }
            | Self::Cast { ref span, .. }
            | Self::Conditional { ref span, .. }
            | Self::Index { ref span, .. } => span,
        }
    }

    /// Key of the resolved type of this expression, if the resolver produced one.
    pub fn ty(&self) -> Option<&str> {
        match self {
            Self::Literal { ty, .. }
            | Self::Ident { ty, .. }
            | Self::Select { ty, .. }
            | Self::Call { ty, .. }
            | Self::New { ty, .. }
            | Self::Assign { ty, .. }
            | Self::Binary { ty, .. }
            | Self::Unary { ty, .. }
            | Self::Paren { ty, .. }
            | Self::Cast { ty, .. }
            | Self::Conditional { ty, .. }
            | Self::Index { ty, .. } => ty.as_deref(),
        }
    }

    /// Key of the symbol bound to this expression, if any.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Ident { symbol, .. }
            | Self::Select { symbol, .. }
            | Self::Call { symbol, .. }
            | Self::New { symbol, .. } => symbol.as_deref(),
            _ => None,
        }
    }

    /// Simple name of an identifier, a selected member, or an invoked method.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Ident { name, .. } | Self::Select { name, .. } => Some(name),
            Self::Call { callee, .. } => callee.name(),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(
            self,
            Self::Literal {
                literal: LiteralKind::Null,
                ..
            }
        )
    }

    pub fn is_this(&self) -> bool {
        matches!(self, Self::Ident { name, .. } if name == "this")
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Literal {
                literal: LiteralKind::Null,
                ..
            } => NodeKind::NullLiteral,
            Self::Literal { .. } => NodeKind::Literal,
            Self::Ident { .. } => NodeKind::Identifier,
            Self::Select { .. } => NodeKind::MemberSelect,
            Self::Call { .. } => NodeKind::MethodInvocation,
            Self::New { .. } => NodeKind::NewClass,
            Self::Assign { .. } => NodeKind::Assignment,
            Self::Binary { op, .. } => match op {
                BinaryOp::EqualTo => NodeKind::EqualTo,
                BinaryOp::NotEqualTo => NodeKind::NotEqualTo,
                BinaryOp::Plus => NodeKind::Plus,
                _ => NodeKind::Binary,
            },
            Self::Unary { .. } => NodeKind::Unary,
            Self::Paren { .. } => NodeKind::Parenthesized,
            Self::Cast { .. } => NodeKind::TypeCast,
            Self::Conditional { .. } => NodeKind::Conditional,
            Self::Index { .. } => NodeKind::ArrayAccess,
        }
    }
}

pub type ExprRef = Ref<Expr>;

/// Tag used to subscribe checks to nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    CompilationUnit,
    Class,
    Interface,
    Enum,
    Annotation,
    Method,
    Variable,
    Block,
    ExpressionStatement,
    Return,
    If,
    While,
    Throw,
    Literal,
    NullLiteral,
    Identifier,
    MemberSelect,
    MethodInvocation,
    NewClass,
    Assignment,
    EqualTo,
    NotEqualTo,
    Plus,
    Binary,
    Unary,
    Parenthesized,
    TypeCast,
    Conditional,
    ArrayAccess,
}

impl NodeKind {
    pub const ALL: [NodeKind; 29] = [
        NodeKind::CompilationUnit,
        NodeKind::Class,
        NodeKind::Interface,
        NodeKind::Enum,
        NodeKind::Annotation,
        NodeKind::Method,
        NodeKind::Variable,
        NodeKind::Block,
        NodeKind::ExpressionStatement,
        NodeKind::Return,
        NodeKind::If,
        NodeKind::While,
        NodeKind::Throw,
        NodeKind::Literal,
        NodeKind::NullLiteral,
        NodeKind::Identifier,
        NodeKind::MemberSelect,
        NodeKind::MethodInvocation,
        NodeKind::NewClass,
        NodeKind::Assignment,
        NodeKind::EqualTo,
        NodeKind::NotEqualTo,
        NodeKind::Plus,
        NodeKind::Binary,
        NodeKind::Unary,
        NodeKind::Parenthesized,
        NodeKind::TypeCast,
        NodeKind::Conditional,
        NodeKind::ArrayAccess,
    ];

    pub const fn is_type_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::Class | NodeKind::Interface | NodeKind::Enum | NodeKind::Annotation
        )
    }
}

impl From<ClassKind> for NodeKind {
    fn from(kind: ClassKind) -> Self {
        match kind {
            ClassKind::Class => NodeKind::Class,
            ClassKind::Interface => NodeKind::Interface,
            ClassKind::Enum => NodeKind::Enum,
            ClassKind::Annotation => NodeKind::Annotation,
        }
    }
}

/// Borrowed view of any tree node, as handed to traversal callbacks.
///
/// Wrapper statements are never surfaced: a local variable statement is
/// visited as [`Node::Variable`], a nested block as [`Node::Block`] and a
/// local class as [`Node::Class`].
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Unit(&'a CompilationUnit),
    Class(&'a Ref<ClassDecl>),
    Method(&'a Ref<MethodDecl>),
    Variable(&'a Ref<VarDecl>),
    Block(&'a Ref<Block>),
    Stmt(&'a Ref<Stmt>),
    Expr(&'a ExprRef),
}

impl<'a> Node<'a> {
    pub fn from_stmt(stmt: &'a Ref<Stmt>) -> Node<'a> {
        match stmt.as_ref() {
            Stmt::Local(decl) => Node::Variable(decl),
            Stmt::Block(block) => Node::Block(block),
            Stmt::Class(class) => Node::Class(class),
            _ => Node::Stmt(stmt),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Unit(_) => NodeKind::CompilationUnit,
            Node::Class(class) => class.kind.into(),
            Node::Method(_) => NodeKind::Method,
            Node::Variable(_) => NodeKind::Variable,
            Node::Block(_) => NodeKind::Block,
            Node::Stmt(stmt) => match stmt.as_ref() {
                Stmt::Expr { .. } => NodeKind::ExpressionStatement,
                Stmt::Local(_) => NodeKind::Variable,
                Stmt::Return { .. } => NodeKind::Return,
                Stmt::If { .. } => NodeKind::If,
                Stmt::While { .. } => NodeKind::While,
                Stmt::Block(_) => NodeKind::Block,
                Stmt::Class(class) => class.kind.into(),
                Stmt::Throw { .. } => NodeKind::Throw,
            },
            Node::Expr(expr) => expr.kind(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Unit(_) => Span::default(),
            Node::Class(class) => class.span,
            Node::Method(method) => method.span,
            Node::Variable(var) => var.span,
            Node::Block(block) => block.span,
            Node::Stmt(stmt) => stmt.span(),
            Node::Expr(expr) => *expr.span(),
        }
    }
}
