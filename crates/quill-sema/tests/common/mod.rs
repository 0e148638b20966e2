// tests/common/mod.rs
//
// AST construction helpers for the end-to-end analysis tests. The
// builders hand-assemble what the parser would normally produce.
// Not every test binary uses every helper.
#![allow(dead_code)]

use std::rc::Rc;

use quill_ast::{
    AstPtr, Declaration, FunctionDecl, Modifiers, ModuleAst, Node, NodeKind, ParameterDecl,
    TypeDecl, TypeDeclKind, VarDecl, VarDeclKind, Visibility,
};
use quill_identity::{NodeId, Span, Symbol};
use quill_sema::{Analyzer, CompilerOptions};

pub struct AstBuilder {
    next_id: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    fn id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn node(&mut self, kind: NodeKind) -> AstPtr {
        Rc::new(Node::new(self.id(), kind, Span::default()))
    }

    pub fn ident(&mut self, sym: Symbol) -> AstPtr {
        self.node(NodeKind::Ident(sym))
    }

    pub fn specialize(&mut self, base: AstPtr, args: Vec<AstPtr>) -> AstPtr {
        self.node(NodeKind::Specialize { base, args })
    }

    pub fn int_lit(&mut self, value: i64) -> AstPtr {
        self.node(NodeKind::LitInt(value))
    }

    pub fn union_of(&mut self, members: Vec<AstPtr>) -> AstPtr {
        self.node(NodeKind::LogicalOr(members))
    }

    pub fn class(&mut self, name: Symbol, bases: Vec<AstPtr>, members: Vec<Declaration>) -> TypeDecl {
        self.type_decl(TypeDeclKind::Class, name, bases, members)
    }

    pub fn type_decl(
        &mut self,
        kind: TypeDeclKind,
        name: Symbol,
        bases: Vec<AstPtr>,
        members: Vec<Declaration>,
    ) -> TypeDecl {
        TypeDecl {
            id: self.id(),
            kind,
            name,
            modifiers: Modifiers::default(),
            visibility: Visibility::Public,
            type_params: Vec::new(),
            bases,
            members,
            attributes: Vec::new(),
            target: None,
            span: Span::default(),
        }
    }

    pub fn method(
        &mut self,
        name: Symbol,
        params: Vec<(Symbol, AstPtr)>,
        return_type: Option<AstPtr>,
        has_body: bool,
    ) -> FunctionDecl {
        FunctionDecl {
            id: self.id(),
            name,
            modifiers: Modifiers::default(),
            visibility: Visibility::Public,
            is_macro: false,
            type_params: Vec::new(),
            params: params
                .into_iter()
                .map(|(name, ty)| ParameterDecl {
                    name,
                    ty: Some(ty),
                    default_value: None,
                    flags: Default::default(),
                    span: Span::default(),
                })
                .collect(),
            return_type,
            body: if has_body { Some(Vec::new()) } else { None },
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn var(&mut self, name: Symbol, ty: AstPtr, init: Option<AstPtr>) -> VarDecl {
        VarDecl {
            id: self.id(),
            kind: VarDeclKind::Var,
            name,
            modifiers: Modifiers::default(),
            visibility: Visibility::Public,
            ty: Some(ty),
            init,
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn module(&mut self, path: &str, declarations: Vec<Declaration>) -> ModuleAst {
        self.module_with_imports(path, Vec::new(), declarations)
    }

    pub fn module_with_imports(
        &mut self,
        path: &str,
        imports: Vec<quill_ast::ImportDecl>,
        declarations: Vec<Declaration>,
    ) -> ModuleAst {
        ModuleAst {
            path: path.to_string(),
            file: format!("{path}.qu"),
            imports,
            declarations,
            next_node_id: self.next_id,
        }
    }

    pub fn import(&mut self, target: AstPtr, unpack: bool) -> quill_ast::ImportDecl {
        quill_ast::ImportDecl {
            id: self.id(),
            target,
            alias: None,
            unpack,
            span: Span::default(),
        }
    }

    pub fn member_ref(&mut self, qualifier: AstPtr, member: Symbol) -> AstPtr {
        self.node(NodeKind::MemberRef { qualifier, member })
    }
}

pub fn analyzer() -> Analyzer {
    Analyzer::new(CompilerOptions::default())
}

/// Intern a batch of names up front so declarations can refer to them.
pub fn syms<const N: usize>(analyzer: &mut Analyzer, names: [&str; N]) -> [Symbol; N] {
    names.map(|n| analyzer.ctx.interner.intern(n))
}
