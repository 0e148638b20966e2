// analyzer/class/constructors.rs
//
// Constructor gathering and default-constructor synthesis. `construct`
// members become constructors; static `create` members are factories;
// with neither present a default constructor is synthesized from the
// public fields.

use quill_ast::ParamFlags;
use quill_identity::DefnId;
use smallvec::SmallVec;

use crate::defs::{
    Defn, DefnDetail, DefnKind, FunctionData, StorageClass, Traits, ValueData, Visibility,
};
use crate::errors::SemanticError;
use crate::ir::{Expr, ExprKind};
use crate::passes::{AnalysisTask, Pass};
use crate::types::{CompositeKind, FunctionSignature, ParamSig, Type, TypeId};

use super::Analyzer;

impl Analyzer {
    pub(crate) fn pass_constructor(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::Constructor) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }

        let kind = self.ctx.defs.composite_kind(&self.ctx.registry, defn);
        if !matches!(kind, Some(CompositeKind::Class | CompositeKind::Struct)) {
            self.ctx.defs.get_mut(defn).passes.finish(Pass::Constructor);
            return true;
        }

        // The super's constructors come first; default synthesis needs to
        // know whether the super has a zero-argument constructor.
        if let Some(super_defn) = self.primary_base_defn(defn) {
            let state = &self.ctx.defs.get(super_defn).passes;
            if !state.is_finished(Pass::Constructor) && !state.is_running(Pass::Constructor) {
                if !self.run_pass_set(super_defn, AnalysisTask::PrepConstruction.passes()) {
                    self.ctx
                        .defs
                        .get_mut(defn)
                        .passes
                        .finish_failed(Pass::Constructor);
                    return false;
                }
            }
        }

        let mut has_constructors = false;
        let mut constructors: Vec<DefnId> = Vec::new();

        for ctor in self.local_members(defn, "construct") {
            if self.ctx.defs.get(ctor).kind != DefnKind::Function {
                let span = self.ctx.defs.get(ctor).span;
                self.ctx.diagnostics.error(
                    SemanticError::CtorNotInstance { span: span.into() },
                    span,
                );
                continue;
            }
            has_constructors = true;
            self.ctx.defs.get_mut(ctor).add_trait(Traits::CTOR);
            self.prepare_function(ctor, AnalysisTask::PrepTypeComparison);

            let span = self.ctx.defs.get(ctor).span;
            let ftype = self.ctx.defs.function_type(ctor);
            let returns_value = ftype
                .and_then(|f| self.ctx.registry.as_function(f))
                .map(|sig| !sig.return_type.is_void())
                .unwrap_or(false);
            if returns_value {
                self.ctx
                    .diagnostics
                    .error(SemanticError::CtorReturnType { span: span.into() }, span);
                continue;
            }
            if self.ctx.defs.get(ctor).storage != StorageClass::Instance {
                self.ctx
                    .diagnostics
                    .error(SemanticError::CtorNotInstance { span: span.into() }, span);
                continue;
            }
            if self.ctx.defs.get(defn).is_singular() {
                self.ctx.defs.get_mut(ctor).add_trait(Traits::SINGULAR);
            }
            constructors.push(ctor);
        }

        // Static `create` factories also count as user constructors.
        for create in self.local_members(defn, "create") {
            if self.ctx.defs.get(create).kind == DefnKind::Function {
                if self.ctx.defs.get(create).storage == StorageClass::Static {
                    has_constructors = true;
                }
                self.prepare_function(create, AnalysisTask::PrepTypeComparison);
            }
        }

        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.constructors = constructors.clone();
            // A declared zero-required-argument constructor is the
            // default constructor.
            info.default_constructor = None;
        }
        if let Some(&first_default) = constructors
            .iter()
            .find(|&&c| self.required_param_count(c) == 0)
        {
            if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
                info.default_constructor = Some(first_default);
            }
        }

        let ok = if has_constructors {
            true
        } else {
            self.create_default_constructor(defn)
        };
        if ok {
            self.ctx.defs.get_mut(defn).passes.finish(Pass::Constructor);
        } else {
            self.ctx
                .defs
                .get_mut(defn)
                .passes
                .finish_failed(Pass::Constructor);
        }
        ok
    }

    fn primary_base_defn(&self, defn: DefnId) -> Option<DefnId> {
        self.ctx
            .defs
            .composite_info(defn)
            .and_then(|info| info.primary_base)
            .and_then(|ty| self.ctx.registry.as_composite(ty))
            .map(|(_, d)| d)
    }

    fn required_param_count(&self, func: DefnId) -> usize {
        let Some(data) = self.ctx.defs.get(func).as_function() else {
            return 0;
        };
        data.params
            .iter()
            .filter(|&&p| {
                self.ctx
                    .defs
                    .get(p)
                    .as_value()
                    .map(|v| v.init.is_none())
                    .unwrap_or(true)
            })
            .count()
    }

    /// Synthesize `construct` from the type's fields: required parameters
    /// for public fields without defaults, optional parameters after them
    /// for public fields with defaults, and a body of field assignments.
    fn create_default_constructor(&mut self, defn: DefnId) -> bool {
        let span = self.ctx.defs.get(defn).span;
        let name = self.defn_display(defn);

        // The super type must itself be default-constructible.
        if let Some(super_defn) = self.primary_base_defn(defn) {
            let has_default = self
                .ctx
                .defs
                .composite_info(super_defn)
                .and_then(|info| info.default_constructor)
                .is_some();
            if !has_default {
                let base = self.defn_display(super_defn);
                self.ctx.diagnostics.error(
                    SemanticError::NoSuperDefaultCtor {
                        name,
                        base,
                        span: span.into(),
                    },
                    span,
                );
                return false;
            }
        }

        let self_ty = self.ctx.defs.type_of(defn).unwrap_or(TypeId::BAD);
        let fields: Vec<DefnId> = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|info| info.instance_fields.iter().flatten().copied().collect())
            .unwrap_or_default();

        struct FieldParam {
            field: DefnId,
            ty: TypeId,
            default: Option<Expr>,
            required: bool,
        }
        let mut params: Vec<FieldParam> = Vec::new();
        let mut private_inits: Vec<(DefnId, Expr)> = Vec::new();
        let mut ok = true;

        for field in fields {
            if self.ctx.defs.get(field).kind != DefnKind::Var {
                // Non-constant lets were counted as fields; they behave
                // like final vars and require an initializer, which the
                // declaration itself supplies.
                continue;
            }
            self.resolve_value_type(field);
            let field_ty = self.ctx.defs.value_type(field).unwrap_or(TypeId::BAD);
            // Native arrays must be initialized by a user constructor.
            if matches!(self.ctx.registry.get(field_ty), Type::NativeArray { .. }) {
                continue;
            }
            let default = self
                .ctx
                .defs
                .get(field)
                .as_value()
                .and_then(|v| v.init.clone())
                .filter(|init| init.is_constant());

            if self.ctx.defs.get(field).visibility == Visibility::Public {
                let required = default.is_none();
                params.push(FieldParam {
                    field,
                    ty: field_ty,
                    default,
                    required,
                });
            } else if let Some(default) = default {
                private_inits.push((field, default));
            } else {
                let field_name = self.defn_display(field);
                let field_span = self.ctx.defs.get(field).span;
                self.ctx.diagnostics.error(
                    SemanticError::MissingInit {
                        field: field_name,
                        span: field_span.into(),
                    },
                    field_span,
                );
                ok = false;
            }
        }
        if !ok {
            return false;
        }

        // Optional parameters go after required ones.
        params.sort_by_key(|p| !p.required);

        let construct_sym = self.ctx.interner.intern("construct");
        let module = self.ctx.defs.get(defn).module;
        let type_traits = self.ctx.defs.get(defn).traits;

        let ctor = self.ctx.defs.alloc(|id| {
            let mut traits = Traits::default().with(Traits::CTOR).with(Traits::SYNTHETIC);
            if type_traits.contains(Traits::SINGULAR) {
                traits.add(Traits::SINGULAR);
            }
            Defn {
                id,
                kind: DefnKind::Function,
                name: construct_sym,
                module,
                parent: Some(defn),
                span,
                traits,
                visibility: Visibility::Public,
                storage: StorageClass::Instance,
                ast: None,
                attributes: Vec::new(),
                passes: Default::default(),
                template: None,
                template_instance: None,
                linkage_name: None,
                detail: DefnDetail::Function(FunctionData::default()),
            }
        });

        // Parameter definitions mirror the fields.
        let mut param_defns = Vec::with_capacity(params.len());
        let mut sig_params: SmallVec<[ParamSig; 4]> = SmallVec::new();
        for p in &params {
            let field_name = self.ctx.defs.get(p.field).name;
            let init = p.default.clone();
            let ty = p.ty;
            let param = self.ctx.defs.alloc(|id| Defn {
                id,
                kind: DefnKind::Parameter,
                name: field_name,
                module,
                parent: Some(ctor),
                span,
                traits: Traits::default().with(Traits::SINGULAR).with(Traits::SYNTHETIC),
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
                    param_flags: ParamFlags::default(),
                    ..Default::default()
                }),
            });
            param_defns.push(param);
            sig_params.push(ParamSig::positional(Some(field_name), ty));
        }

        // The receiver parameter, referenced by every assignment.
        let self_sym = self.ctx.interner.intern("self");
        let self_param = self.ctx.defs.alloc(|id| Defn {
            id,
            kind: DefnKind::Parameter,
            name: self_sym,
            module,
            parent: Some(ctor),
            span,
            traits: Traits::default().with(Traits::SINGULAR).with(Traits::SYNTHETIC),
            visibility: Visibility::Public,
            storage: StorageClass::Local,
            ast: None,
            attributes: Vec::new(),
            passes: Default::default(),
            template: None,
            template_instance: None,
            linkage_name: None,
            detail: DefnDetail::Value(ValueData {
                ty: Some(self_ty),
                param_flags: ParamFlags {
                    by_ref: true,
                    ..Default::default()
                },
                ..Default::default()
            }),
        });

        // Body: `self.field = param` for each parameter, then the private
        // fields with defaults.
        let mut body: Vec<Expr> = Vec::new();
        let self_expr = Expr::new(ExprKind::LValue(self_param), self_ty, span);
        for (p, &param_defn) in params.iter().zip(param_defns.iter()) {
            let member = Expr::new(
                ExprKind::Member {
                    base: Box::new(self_expr.clone()),
                    field: p.field,
                },
                p.ty,
                span,
            );
            let value = Expr::new(ExprKind::LValue(param_defn), p.ty, span);
            body.push(Expr::new(
                ExprKind::Assign {
                    lhs: Box::new(member),
                    rhs: Box::new(value),
                },
                TypeId::VOID,
                span,
            ));
        }
        for (field, default) in private_inits {
            let field_ty = default.ty;
            let member = Expr::new(
                ExprKind::Member {
                    base: Box::new(self_expr.clone()),
                    field,
                },
                field_ty,
                span,
            );
            body.push(Expr::new(
                ExprKind::Assign {
                    lhs: Box::new(member),
                    rhs: Box::new(default),
                },
                TypeId::VOID,
                span,
            ));
        }
        body.push(Expr::new(ExprKind::Return(None), TypeId::VOID, span));

        let ftype = self.ctx.registry.function(FunctionSignature {
            params: sig_params,
            return_type: TypeId::VOID,
            self_param: Some(self_ty),
            is_static: false,
        });
        {
            let data = self.ctx.defs.get_mut(ctor).as_function_mut().unwrap();
            data.ftype = Some(ftype);
            data.params = param_defns;
            data.body = Some(body);
        }
        // Born analyzed: there is nothing left to run on it.
        self.ctx
            .defs
            .get_mut(ctor)
            .passes
            .mark_finished(AnalysisTask::PrepCodeGeneration.passes());

        if let Some(scope) = self.ctx.defs.member_scope(defn) {
            self.ctx.scopes.get_mut(scope).define(construct_sym, ctor);
        }
        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.constructors.push(ctor);
            info.default_constructor = Some(ctor);
        }
        true
    }
}
