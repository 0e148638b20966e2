// decl.rs
//
// Declaration nodes: modules, type declarations, functions, variables,
// properties, parameters and imports.

use quill_identity::{NodeId, Span, Symbol};

use crate::{AstPtr, Modifiers, Visibility};

/// A parsed module: the unit the parser hands to the analyzer.
#[derive(Debug, Clone)]
pub struct ModuleAst {
    /// Module path, e.g. `geom.shapes`
    pub path: String,
    pub file: String,
    pub imports: Vec<ImportDecl>,
    pub declarations: Vec<Declaration>,
    /// One past the highest NodeId used by the parser.
    pub next_node_id: u32,
}

/// Top-level and member declarations.
#[derive(Debug, Clone)]
pub enum Declaration {
    Type(TypeDecl),
    Function(FunctionDecl),
    Var(VarDecl),
    Property(PropertyDecl),
    Namespace(NamespaceDecl),
}

impl Declaration {
    pub fn name(&self) -> Symbol {
        match self {
            Declaration::Type(d) => d.name,
            Declaration::Function(d) => d.name,
            Declaration::Var(d) => d.name,
            Declaration::Property(d) => d.name,
            Declaration::Namespace(d) => d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Type(d) => d.span,
            Declaration::Function(d) => d.span,
            Declaration::Var(d) => d.span,
            Declaration::Property(d) => d.span,
            Declaration::Namespace(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Protocol,
    Enum,
    Alias,
}

/// A type declaration: class/struct/interface/protocol/enum/alias.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: NodeId,
    pub kind: TypeDeclKind,
    pub name: Symbol,
    pub modifiers: Modifiers,
    pub visibility: Visibility,
    /// Template parameters, empty for plain types.
    pub type_params: Vec<TypeParamDecl>,
    /// Base type expressions, in declaration order.
    pub bases: Vec<AstPtr>,
    pub members: Vec<Declaration>,
    /// Attribute expressions attached to the declaration.
    pub attributes: Vec<AstPtr>,
    /// For aliases: the aliased type expression.
    pub target: Option<AstPtr>,
    pub span: Span,
}

/// A template parameter: `T` or `T <: Bound`.
#[derive(Debug, Clone)]
pub struct TypeParamDecl {
    pub name: Symbol,
    pub upper_bound: Option<AstPtr>,
    pub span: Span,
}

/// A function or macro declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: Symbol,
    pub modifiers: Modifiers,
    pub visibility: Visibility,
    pub is_macro: bool,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<ParameterDecl>,
    pub return_type: Option<AstPtr>,
    /// Body expression nodes; None for abstract/interface methods.
    pub body: Option<Vec<AstPtr>>,
    pub attributes: Vec<AstPtr>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Per-parameter flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamFlags {
    pub variadic: bool,
    pub by_ref: bool,
    pub keyword_only: bool,
}

/// A parameter declaration.
#[derive(Debug, Clone)]
pub struct ParameterDecl {
    pub name: Symbol,
    pub ty: Option<AstPtr>,
    pub default_value: Option<AstPtr>,
    pub flags: ParamFlags,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDeclKind {
    /// Mutable field or global.
    Var,
    /// Single-assignment binding; constant-foldable lets need no storage.
    Let,
}

/// A var/let declaration (field, static or global).
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: NodeId,
    pub kind: VarDeclKind,
    pub name: Symbol,
    pub modifiers: Modifiers,
    pub visibility: Visibility,
    pub ty: Option<AstPtr>,
    pub init: Option<AstPtr>,
    pub attributes: Vec<AstPtr>,
    pub span: Span,
}

/// A property or indexer declaration with optional accessors.
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub id: NodeId,
    pub name: Symbol,
    pub modifiers: Modifiers,
    pub visibility: Visibility,
    pub is_indexer: bool,
    pub ty: Option<AstPtr>,
    pub getter: Option<FunctionDecl>,
    pub setter: Option<FunctionDecl>,
    pub span: Span,
}

/// A namespace declaration.
#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub id: NodeId,
    pub name: Symbol,
    pub members: Vec<Declaration>,
    pub span: Span,
}

/// An explicit import: `import geom.Point` or `import geom.Point as P`.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub id: NodeId,
    pub target: AstPtr,
    pub alias: Option<Symbol>,
    /// Import every member of the target namespace.
    pub unpack: bool,
    pub span: Span,
}
