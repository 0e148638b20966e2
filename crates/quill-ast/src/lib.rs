//! The AST node set delivered by the parser.
//!
//! The semantic middle-end only ever reads these structures; it never
//! mutates or extends them. Node variants mirror the language surface:
//! names, member references, specialization, literals, operators, calls,
//! imports, and the declaration forms.

use quill_identity::{NodeId, Span, Symbol};

pub mod decl;

pub use decl::{
    Declaration, FunctionDecl, ImportDecl, ModuleAst, NamespaceDecl, ParamFlags, ParameterDecl,
    PropertyDecl, TypeDecl, TypeDeclKind, TypeParamDecl, VarDecl, VarDeclKind,
};

/// A reference-counted AST subtree handed over by the parser.
pub type AstPtr = std::rc::Rc<Node>;

/// One AST node: a variant plus its source extent.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, span: Span) -> Self {
        Self { id, kind, span }
    }

    /// Shorthand used when synthesizing nodes in tests.
    pub fn ident(id: NodeId, name: Symbol, span: Span) -> AstPtr {
        std::rc::Rc::new(Self::new(id, NodeKind::Ident(name), span))
    }
}

/// The closed set of expression/type-expression node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A bare name: `Point`
    Ident(Symbol),
    /// A qualified member reference: `geom.Point`
    MemberRef { qualifier: AstPtr, member: Symbol },
    /// Template specialization: `Array[int32]`
    Specialize { base: AstPtr, args: Vec<AstPtr> },
    /// A compiler-provided definition spliced directly into the tree.
    BuiltIn(quill_identity::DefnId),
    /// `T | U` — in type position this is a union type.
    LogicalOr(Vec<AstPtr>),
    /// `T[]` — array-of-element in type position.
    Array(AstPtr),
    /// An anonymous function signature: `fn (x: int32) -> bool`
    AnonFn {
        params: Vec<ParameterDecl>,
        return_type: Option<AstPtr>,
    },

    LitInt(i64),
    LitFloat(f64),
    LitChar(u32),
    LitString(String),
    LitBool(bool),
    LitNull,

    /// A unary operator application.
    Unary { op: UnaryOp, arg: AstPtr },
    /// An n-ary operator application (logical and/or, comparison chains).
    Oper { op: OperKind, args: Vec<AstPtr> },
    /// A call: `f(a, b, key = c)`
    Call { callee: AstPtr, args: Vec<AstPtr> },
    /// A keyword argument inside a call.
    KeywordArg { name: Symbol, value: AstPtr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Complement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperKind {
    LogicalAnd,
    LogicalOr,
    Equal,
    NotEqual,
    Less,
    Greater,
}

/// Modifier flags carried on declarations, as parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub flags: u32,
}

impl Modifiers {
    pub const FINAL: u32 = 1 << 0;
    pub const ABSTRACT: u32 = 1 << 1;
    pub const UNDEF: u32 = 1 << 2;
    pub const READONLY: u32 = 1 << 3;
    pub const STATIC: u32 = 1 << 4;
    pub const OVERRIDE: u32 = 1 << 5;
    pub const EXTERN: u32 = 1 << 6;

    pub fn contains(self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn with(mut self, flag: u32) -> Self {
        self.flags |= flag;
        self
    }
}

/// Declared visibility, defaulting to public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}
