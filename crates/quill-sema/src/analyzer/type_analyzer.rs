// analyzer/type_analyzer.rs
//
// Translation of AST type expressions into registry handles. Name-shaped
// nodes go through the resolver; `T | U` builds unions; `T[]` instantiates
// the Array template; anonymous function signatures build Function types.

use quill_ast::{Node, NodeKind};
use quill_identity::ScopeId;
use smallvec::SmallVec;

use crate::defs::DefnKind;
use crate::errors::SemanticError;
use crate::passes::AnalysisTask;
use crate::templates::TemplateEnv;
use crate::types::{FunctionSignature, ParamSig, TypeId, TypeIdVec};

use super::Analyzer;

impl Analyzer {
    /// Convert a type expression to a type handle. Failures are reported
    /// and yield `Bad`, so dependents keep analyzing.
    pub(crate) fn type_from_ast(&mut self, scope: ScopeId, node: &Node) -> TypeId {
        match &node.kind {
            NodeKind::Ident(_) | NodeKind::MemberRef { .. } | NodeKind::Specialize { .. }
            | NodeKind::BuiltIn(_) => {
                let candidates = self.resolve_node(scope, node);
                let types: Vec<quill_identity::DefnId> = candidates
                    .into_iter()
                    .filter(|&d| self.ctx.defs.get(d).kind == DefnKind::TypeDef)
                    .collect();
                match types.as_slice() {
                    [] => {
                        self.ctx.diagnostics.error(
                            SemanticError::UnresolvedName {
                                name: self.node_display(node),
                                span: node.span.into(),
                            },
                            node.span,
                        );
                        TypeId::BAD
                    }
                    [single] => {
                        let defn = *single;
                        self.prepare(defn, AnalysisTask::PrepTypeComparison);
                        match self.ctx.defs.type_of(defn) {
                            Some(ty) => ty,
                            None => {
                                self.ctx.diagnostics.error(
                                    SemanticError::NotAType {
                                        name: self.defn_display(defn),
                                        span: node.span.into(),
                                    },
                                    node.span,
                                );
                                TypeId::BAD
                            }
                        }
                    }
                    many => {
                        self.ctx.diagnostics.error(
                            SemanticError::AmbiguousType {
                                name: self.node_display(node),
                                count: many.len(),
                                span: node.span.into(),
                            },
                            node.span,
                        );
                        TypeId::BAD
                    }
                }
            }

            NodeKind::Array(element) => {
                let element_ty = self.type_from_ast(scope, element);
                if element_ty.is_bad() {
                    return TypeId::BAD;
                }
                self.array_type_for_element(element_ty)
            }

            NodeKind::LogicalOr(operands) => {
                let mut members: TypeIdVec = TypeIdVec::new();
                for operand in operands {
                    let ty = self.type_from_ast(scope, operand);
                    if ty.is_bad() {
                        return TypeId::BAD;
                    }
                    members.push(ty);
                }
                self.ctx.registry.union(&self.ctx.defs, members)
            }

            NodeKind::AnonFn {
                params,
                return_type,
            } => {
                let mut sig_params: SmallVec<[ParamSig; 4]> = SmallVec::new();
                for param in params {
                    let ty = match &param.ty {
                        Some(t) => self.type_from_ast(scope, t),
                        // Untyped parameters pick their type up from the
                        // default value; absent both, the signature is bad.
                        None => TypeId::BAD,
                    };
                    sig_params.push(ParamSig {
                        name: Some(param.name),
                        ty,
                        variadic: param.flags.variadic,
                        by_ref: param.flags.by_ref,
                        keyword_only: param.flags.keyword_only,
                    });
                }
                let return_type = match return_type {
                    Some(node) => self.type_from_ast(scope, node),
                    None => TypeId::VOID,
                };
                self.ctx.registry.function(FunctionSignature {
                    params: sig_params,
                    return_type,
                    self_param: None,
                    is_static: false,
                })
            }

            _ => {
                self.ctx.diagnostics.error(
                    SemanticError::NotAType {
                        name: self.node_display(node),
                        span: node.span.into(),
                    },
                    node.span,
                );
                TypeId::BAD
            }
        }
    }

    /// `T[]` sugar: instantiate the builtin Array template.
    pub(crate) fn array_type_for_element(&mut self, element: TypeId) -> TypeId {
        let array_defn = self.ctx.builtins.array_defn;
        let template_id = self.ctx.defs.get(array_defn).template.expect("Array");
        let env = {
            let sig = self.ctx.templates.get(template_id);
            TemplateEnv::from_args(sig, &[element]).expect("one parameter")
        };
        match crate::templates::instantiate(
            &mut self.ctx.registry,
            &mut self.ctx.defs,
            &mut self.ctx.scopes,
            &mut self.ctx.templates,
            array_defn,
            &env,
        ) {
            Ok(instance) => self.ctx.defs.type_of(instance).unwrap_or(TypeId::BAD),
            Err(_) => TypeId::BAD,
        }
    }
}
