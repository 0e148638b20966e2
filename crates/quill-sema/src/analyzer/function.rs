// analyzer/function.rs
//
// Signature resolution for functions, values and properties, plus the
// signature predicates the class analyzer builds on: structural signature
// equality and override compatibility.

use quill_ast::{Declaration, Node, NodeKind};
use quill_identity::DefnId;
use smallvec::SmallVec;

use crate::defs::{Defn, DefnDetail, DefnKind, StorageClass, Traits, ValueData, Visibility};
use crate::ir::{Expr, ExprKind};
use crate::passes::AnalysisTask;
use crate::types::{relation, FunctionSignature, ParamSig, TypeId};

use super::Analyzer;

impl Analyzer {
    /// Resolve a function's signature: parameter types, return type, self
    /// parameter. Idempotent; later tasks are satisfied by the same work.
    pub(crate) fn prepare_function(&mut self, defn: DefnId, _task: AnalysisTask) -> bool {
        if self.ctx.defs.function_type(defn).is_some() {
            return true;
        }
        let Some(ast) = self.ctx.defs.get(defn).ast.clone() else {
            // Synthesized functions are born with their signature.
            return true;
        };
        let Declaration::Function(decl) = &*ast else {
            return true;
        };

        let scope = self.enclosing_scope(defn);
        let mut params: SmallVec<[ParamSig; 4]> = SmallVec::new();
        let mut param_defns = Vec::with_capacity(decl.params.len());
        for p in &decl.params {
            let ty = match &p.ty {
                Some(node) => self.type_from_ast(scope, node),
                None => TypeId::BAD,
            };
            let init = p
                .default_value
                .as_deref()
                .and_then(|n| self.fold_literal(n, ty));
            let module = self.ctx.defs.get(defn).module;
            let param_defn = self.ctx.defs.alloc(|id| Defn {
                id,
                kind: DefnKind::Parameter,
                name: p.name,
                module,
                parent: Some(defn),
                span: p.span,
                traits: Traits::default().with(Traits::SINGULAR),
                visibility: Visibility::Public,
                storage: StorageClass::Local,
                ast: None,
                attributes: Vec::new(),
                passes: Default::default(),
                template: None,
                template_instance: None,
                linkage_name: None,
                detail: DefnDetail::Value(ValueData {
                    ty: Some(ty),
                    init,
                    param_flags: p.flags,
                    ..Default::default()
                }),
            });
            param_defns.push(param_defn);
            params.push(ParamSig {
                name: Some(p.name),
                ty,
                variadic: p.flags.variadic,
                by_ref: p.flags.by_ref,
                keyword_only: p.flags.keyword_only,
            });
        }

        let return_type = match &decl.return_type {
            Some(node) => self.type_from_ast(scope, node),
            None => TypeId::VOID,
        };

        let is_instance = self.ctx.defs.get(defn).storage == StorageClass::Instance;
        let self_param = if is_instance {
            self.ctx
                .defs
                .enclosing_type(defn)
                .and_then(|t| self.ctx.defs.type_of(t))
        } else {
            None
        };

        let ftype = self.ctx.registry.function(FunctionSignature {
            params,
            return_type,
            self_param,
            is_static: !is_instance,
        });

        let data = self.ctx.defs.get_mut(defn).as_function_mut().expect("function");
        data.ftype = Some(ftype);
        data.params = param_defns;
        true
    }

    /// Resolve the declared type of a Var/Let/Parameter, folding a
    /// constant initializer alongside.
    pub(crate) fn resolve_value_type(&mut self, defn: DefnId) -> bool {
        if self.ctx.defs.value_type(defn).is_some() {
            return true;
        }
        let Some(ast) = self.ctx.defs.get(defn).ast.clone() else {
            return true;
        };
        let Declaration::Var(decl) = &*ast else {
            return true;
        };
        let scope = self.enclosing_scope(defn);
        let ty = match &decl.ty {
            Some(node) => self.type_from_ast(scope, node),
            None => TypeId::BAD,
        };
        let init = decl.init.as_deref().and_then(|n| self.fold_literal(n, ty));
        if let Some(data) = self.ctx.defs.get_mut(defn).as_value_mut() {
            data.ty = Some(ty);
            data.init = init;
        }
        !ty.is_bad()
    }

    pub(crate) fn resolve_property_type(&mut self, defn: DefnId) -> bool {
        if self
            .ctx
            .defs
            .get(defn)
            .as_property()
            .and_then(|p| p.ty)
            .is_some()
        {
            return true;
        }
        let Some(ast) = self.ctx.defs.get(defn).ast.clone() else {
            return true;
        };
        let Declaration::Property(decl) = &*ast else {
            return true;
        };
        let scope = self.enclosing_scope(defn);
        let ty = match &decl.ty {
            Some(node) => self.type_from_ast(scope, node),
            None => TypeId::BAD,
        };
        if let Some(data) = self.ctx.defs.get_mut(defn).as_property_mut() {
            data.ty = Some(ty);
        }
        !ty.is_bad()
    }

    /// Enums and aliases: resolve the target type.
    pub(crate) fn resolve_non_composite_type(&mut self, defn: DefnId) -> bool {
        if self.ctx.defs.get(defn).as_type().map(|d| d.aliased).flatten().is_some() {
            return true;
        }
        let Some(ast) = self.ctx.defs.get(defn).ast.clone() else {
            return true;
        };
        let Declaration::Type(decl) = &*ast else {
            return true;
        };
        let Some(target) = &decl.target else {
            return true;
        };
        let scope = self.enclosing_scope(defn);
        let ty = self.type_from_ast(scope, target);
        match decl.kind {
            quill_ast::TypeDeclKind::Alias => {
                if let Some(data) = self.ctx.defs.get_mut(defn).as_type_mut() {
                    data.aliased = Some(ty);
                }
            }
            quill_ast::TypeDeclKind::Enum => {
                let base = if ty.is_integer() { ty } else { TypeId::INT32 };
                let enum_ty = self.ctx.registry.enum_type(defn, base);
                if let Some(data) = self.ctx.defs.get_mut(defn).as_type_mut() {
                    data.ty = Some(enum_ty);
                }
            }
            _ => {}
        }
        !ty.is_bad()
    }

    /// Fold a literal AST node into a constant IR expression. Non-constant
    /// initializers fold to None and keep their storage requirement.
    pub(crate) fn fold_literal(&mut self, node: &Node, ty: TypeId) -> Option<Expr> {
        let kind = match &node.kind {
            NodeKind::LitInt(v) => ExprKind::ConstInt(*v),
            NodeKind::LitFloat(v) => ExprKind::ConstFloat(*v),
            NodeKind::LitBool(v) => ExprKind::ConstBool(*v),
            NodeKind::LitChar(v) => ExprKind::ConstChar(*v),
            NodeKind::LitString(v) => ExprKind::ConstString(v.clone()),
            NodeKind::LitNull => ExprKind::ConstNull,
            _ => return None,
        };
        let ty = if ty.is_bad() {
            self.literal_type(&kind)
        } else {
            ty
        };
        Some(Expr::new(kind, ty, node.span))
    }

    fn literal_type(&self, kind: &ExprKind) -> TypeId {
        match kind {
            ExprKind::ConstInt(_) => TypeId::UNSIZED_INT,
            ExprKind::ConstFloat(_) => TypeId::DOUBLE,
            ExprKind::ConstBool(_) => TypeId::BOOL,
            ExprKind::ConstChar(_) => TypeId::CHAR,
            ExprKind::ConstString(_) => self
                .ctx
                .defs
                .type_of(self.ctx.builtins.string_defn)
                .unwrap_or(TypeId::BAD),
            ExprKind::ConstNull => TypeId::NULL,
            _ => TypeId::BAD,
        }
    }

    /// Structural signature equality on the parameter tuple, ignoring the
    /// self parameter. Used by the Method pass's conflict check.
    pub(crate) fn same_signature(&self, a: DefnId, b: DefnId) -> bool {
        let (Some(fa), Some(fb)) = (self.ctx.defs.function_type(a), self.ctx.defs.function_type(b))
        else {
            return false;
        };
        let (Some(sa), Some(sb)) = (
            self.ctx.registry.as_function(fa),
            self.ctx.registry.as_function(fb),
        ) else {
            return false;
        };
        if sa.params.len() != sb.params.len() || sa.is_static != sb.is_static {
            return false;
        }
        sa.params
            .iter()
            .zip(sb.params.iter())
            .all(|(pa, pb)| pa.ty == pb.ty)
    }

    /// Can `candidate` fill a dispatch slot declared by `base_method`?
    /// Parameter types are invariant, the return type may be covariant,
    /// and a more specific self type is what overriding means.
    pub(crate) fn can_override(&self, candidate: DefnId, base_method: DefnId) -> bool {
        if self.ctx.defs.get(candidate).name != self.ctx.defs.get(base_method).name {
            return false;
        }
        let (Some(fc), Some(fb)) = (
            self.ctx.defs.function_type(candidate),
            self.ctx.defs.function_type(base_method),
        ) else {
            return false;
        };
        let (Some(sc), Some(sb)) = (
            self.ctx.registry.as_function(fc),
            self.ctx.registry.as_function(fb),
        ) else {
            return false;
        };
        if sc.params.len() != sb.params.len() {
            return false;
        }
        for (pc, pb) in sc.params.iter().zip(sb.params.iter()) {
            if !relation::is_equal(&self.ctx.registry, &self.ctx.defs, pc.ty, pb.ty) {
                return false;
            }
        }
        relation::is_subtype(
            &self.ctx.registry,
            &self.ctx.defs,
            sc.return_type,
            sb.return_type,
        )
    }
}
