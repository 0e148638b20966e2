// analyzer/class/bases.rs
//
// BaseTypes: resolve base ASTs to composite types, validate kind
// compatibility, pick the primary base and move it to the front of the
// base list. Re-entry here is circular inheritance.

use quill_ast::Declaration;
use quill_identity::DefnId;

use crate::defs::Traits;
use crate::errors::SemanticError;
use crate::passes::{AnalysisTask, Pass};
use crate::types::{CompositeKind, TypeId};

use super::Analyzer;

impl Analyzer {
    pub(crate) fn pass_base_types(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::BaseTypes) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        let result = self.analyze_base_types(defn);
        if result {
            self.ctx.defs.get_mut(defn).passes.finish(Pass::BaseTypes);
        } else {
            self.ctx.defs.get_mut(defn).passes.finish_failed(Pass::BaseTypes);
        }
        result
    }

    fn analyze_base_types(&mut self, defn: DefnId) -> bool {
        // Bounds on template parameters resolve here too: both name the
        // same scopes and both gate type comparison.
        self.resolve_template_bounds(defn);

        let Some(kind) = self.ctx.defs.composite_kind(&self.ctx.registry, defn) else {
            return true;
        };
        let span = self.ctx.defs.get(defn).span;

        // Interfaces and protocols cannot be final.
        if self.ctx.defs.get(defn).is_final()
            && matches!(kind, CompositeKind::Interface | CompositeKind::Protocol)
        {
            self.ctx
                .diagnostics
                .error(SemanticError::FinalInterface { span: span.into() }, span);
        }

        // No AST means a compiler-synthesized type whose base list was set
        // up by whoever created it.
        let Some(ast) = self.ctx.defs.get(defn).ast.clone() else {
            return true;
        };
        let Declaration::Type(decl) = &*ast else {
            return true;
        };

        let scope = self.defining_scope(defn);
        let mut primary: Option<TypeId> = None;
        let mut others: Vec<TypeId> = Vec::new();

        for base_ast in &decl.bases {
            let base_ty = self.type_from_ast(scope, base_ast);
            if base_ty.is_bad() {
                return false;
            }
            let Some((base_kind, base_defn)) = self.ctx.registry.as_composite(base_ty) else {
                self.ctx.diagnostics.error(
                    SemanticError::IllegalBase {
                        name: self.defn_display(defn),
                        base: self.type_display(base_ty),
                        kind: kind_name(kind).to_string(),
                        span: base_ast.span.into(),
                    },
                    base_ast.span,
                );
                return false;
            };

            if self.ctx.defs.get(base_defn).is_final() {
                self.ctx.diagnostics.error(
                    SemanticError::FinalBase {
                        base: self.defn_display(base_defn),
                        span: base_ast.span.into(),
                    },
                    base_ast.span,
                );
            }

            // Analyze the base's own bases before using it.
            if !self.prepare(base_defn, AnalysisTask::PrepMemberLookup) {
                return false;
            }

            // Kind rules: classes take at most one class base plus
            // interfaces; structs take one struct plus protocols;
            // interfaces and protocols take interfaces/protocols, the
            // first becoming primary.
            let concrete = matches!(
                (kind, base_kind),
                (CompositeKind::Class, CompositeKind::Class)
                    | (CompositeKind::Struct, CompositeKind::Struct)
                    | (CompositeKind::Interface | CompositeKind::Protocol, _)
            );
            let legal = match kind {
                CompositeKind::Class => {
                    matches!(base_kind, CompositeKind::Class | CompositeKind::Interface)
                }
                CompositeKind::Struct => {
                    matches!(base_kind, CompositeKind::Struct | CompositeKind::Protocol)
                }
                CompositeKind::Interface | CompositeKind::Protocol => {
                    matches!(base_kind, CompositeKind::Interface | CompositeKind::Protocol)
                }
            };
            if !legal || (concrete && primary.is_some() && kind != CompositeKind::Interface
                && kind != CompositeKind::Protocol)
            {
                self.ctx.diagnostics.error(
                    SemanticError::IllegalBase {
                        name: self.defn_display(defn),
                        base: self.defn_display(base_defn),
                        kind: kind_name(kind).to_string(),
                        span: base_ast.span.into(),
                    },
                    base_ast.span,
                );
                continue;
            }
            let is_primary = concrete && primary.is_none();

            if is_primary {
                primary = Some(base_ty);
            } else {
                others.push(base_ty);
            }
        }

        // Classes without an explicit class base derive Object.
        if kind == CompositeKind::Class
            && primary.is_none()
            && defn != self.ctx.builtins.object_defn
        {
            primary = Some(self.ctx.builtins.object_type);
        }

        // The primary base goes first in the base list.
        let mut bases = Vec::with_capacity(others.len() + 1);
        if let Some(p) = primary {
            bases.push(p);
        }
        bases.extend(others);

        if let Some(p) = primary {
            if let Some((_, super_defn)) = self.ctx.registry.as_composite(p) {
                let inherit_nonreflective =
                    self.ctx.defs.get(super_defn).has_trait(Traits::NONREFLECTIVE);
                if inherit_nonreflective {
                    self.ctx.defs.get_mut(defn).add_trait(Traits::NONREFLECTIVE);
                }
            }
        }

        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.bases = bases;
            info.primary_base = primary;
        }
        true
    }

    /// Resolve declared upper bounds on a template's parameters.
    fn resolve_template_bounds(&mut self, defn: DefnId) {
        let Some(template_id) = self.ctx.defs.get(defn).template else {
            return;
        };
        let Some(ast) = self.ctx.defs.get(defn).ast.clone() else {
            return;
        };
        let Declaration::Type(decl) = &*ast else {
            return;
        };
        let param_scope = self.ctx.templates.get(template_id).param_scope;
        let params = self.ctx.templates.get(template_id).params.clone();
        for (var, tp) in params.iter().zip(decl.type_params.iter()) {
            let Some(bound_ast) = &tp.upper_bound else {
                continue;
            };
            let bound = self.type_from_ast(param_scope, bound_ast);
            if bound.is_bad() {
                continue;
            }
            if let Some(var_id) = self.ctx.registry.as_type_variable(*var) {
                self.ctx.registry.type_var_mut(var_id).upper_bound = Some(bound);
            }
        }
    }
}

fn kind_name(kind: CompositeKind) -> &'static str {
    match kind {
        CompositeKind::Class => "class",
        CompositeKind::Struct => "struct",
        CompositeKind::Interface => "interface",
        CompositeKind::Protocol => "protocol",
    }
}
