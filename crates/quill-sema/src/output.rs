// output.rs
//
// The emitter-facing view of a finished analysis: exported and referenced
// definitions per module, field/method/interface layouts per composite,
// and a layout plan per union type.

use quill_identity::DefnId;
use rustc_hash::FxHashMap;

use crate::analyzer::Analyzer;
use crate::defs::{DefnKind, Visibility};
use crate::errors::SemanticError;
use crate::ir::Expr;
use crate::types::{plan_union_layout, LayoutError, Type, TypeId, UnionLayout};

/// One instance-field slot in a composite layout.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    /// None marks slot 0, reserved for the super instance.
    pub field: Option<DefnId>,
    pub ty: Option<TypeId>,
}

/// Layout of one composite type.
#[derive(Debug, Clone)]
pub struct CompositeLayout {
    pub defn: DefnId,
    pub fields: Vec<FieldSlot>,
    pub instance_methods: Vec<DefnId>,
    pub interfaces: Vec<(TypeId, Vec<DefnId>)>,
}

/// Resolved data for one function.
#[derive(Debug, Clone)]
pub struct FunctionOutput {
    pub defn: DefnId,
    pub function_type: TypeId,
    pub linkage_name: String,
    pub body: Option<Vec<Expr>>,
}

/// Resolved data for one global or field.
#[derive(Debug, Clone)]
pub struct ValueOutput {
    pub defn: DefnId,
    pub ty: TypeId,
    pub constant_init: Option<Expr>,
}

/// Everything one module hands the emitter.
#[derive(Debug, Clone, Default)]
pub struct ModuleOutput {
    pub exported: Vec<DefnId>,
    pub composites: Vec<CompositeLayout>,
    pub functions: Vec<FunctionOutput>,
    pub values: Vec<ValueOutput>,
}

/// The full program view.
#[derive(Debug, Clone, Default)]
pub struct CompilationOutput {
    pub modules: Vec<ModuleOutput>,
    /// Layout plan per union type in the registry.
    pub union_layouts: FxHashMap<TypeId, UnionLayout>,
}

impl Analyzer {
    /// Assemble the emitter-facing output. Union layout conflicts surface
    /// here as diagnostics; everything else is a read-only walk.
    pub fn build_output(&mut self) -> CompilationOutput {
        let mut output = CompilationOutput::default();

        for &module in &self.modules().to_vec() {
            let mut mod_out = ModuleOutput::default();
            let Some(scope) = self.ctx.defs.member_scope(module) else {
                continue;
            };
            let members: Vec<DefnId> = self.ctx.scopes.get(scope).members().collect();
            for member in members {
                self.collect_defn(&mut mod_out, member);
            }
            output.modules.push(mod_out);
        }

        // Plan every union the compilation interned.
        let unions: Vec<TypeId> = self
            .ctx
            .registry
            .iter()
            .filter(|(_, t)| matches!(t, Type::Union(_)))
            .map(|(id, _)| id)
            .collect();
        for ty in unions {
            match plan_union_layout(&self.ctx.registry, &self.ctx.defs, ty) {
                Ok(layout) => {
                    output.union_layouts.insert(ty, layout);
                }
                Err(LayoutError::Conflict {
                    largest32,
                    largest64,
                }) => {
                    let span = quill_identity::Span::default();
                    let largest32 = self.type_display(largest32);
                    let largest64 = self.type_display(largest64);
                    self.ctx.diagnostics.error(
                        SemanticError::LayoutConflict {
                            largest32,
                            largest64,
                            span: span.into(),
                        },
                        span,
                    );
                }
                Err(LayoutError::NotAUnion(_)) => {}
            }
        }

        output
    }

    fn collect_defn(&mut self, out: &mut ModuleOutput, defn: DefnId) {
        let d = self.ctx.defs.get(defn);
        if d.visibility == Visibility::Public {
            out.exported.push(defn);
        }
        match d.kind {
            DefnKind::TypeDef => {
                if let Some(info) = self.ctx.defs.composite_info(defn) {
                    let fields = info
                        .instance_fields
                        .iter()
                        .map(|slot| FieldSlot {
                            field: *slot,
                            ty: slot.and_then(|f| self.ctx.defs.value_type(f)),
                        })
                        .collect();
                    let layout = CompositeLayout {
                        defn,
                        fields,
                        instance_methods: info.instance_methods.clone(),
                        interfaces: info
                            .interfaces
                            .iter()
                            .map(|t| (t.interface, t.methods.clone()))
                            .collect(),
                    };
                    out.composites.push(layout);

                    // Members surface through the type's scope.
                    let members: Vec<DefnId> = self
                        .ctx
                        .defs
                        .member_scope(defn)
                        .map(|s| self.ctx.scopes.get(s).members().collect())
                        .unwrap_or_default();
                    for member in members {
                        self.collect_defn(out, member);
                    }
                }
            }
            DefnKind::Function | DefnKind::Macro => {
                if let Some(function_type) = self.ctx.defs.function_type(defn) {
                    let linkage_name = crate::types::defn_linkage_name(
                        &self.ctx.registry,
                        &self.ctx.defs,
                        &self.ctx.interner,
                        &self.ctx.names,
                        defn,
                    );
                    let body = self
                        .ctx
                        .defs
                        .get(defn)
                        .as_function()
                        .and_then(|f| f.body.clone());
                    out.functions.push(FunctionOutput {
                        defn,
                        function_type,
                        linkage_name,
                        body,
                    });
                }
            }
            DefnKind::Var | DefnKind::Let => {
                if let Some(ty) = self.ctx.defs.value_type(defn) {
                    let constant_init = self
                        .ctx
                        .defs
                        .get(defn)
                        .as_value()
                        .and_then(|v| v.init.clone())
                        .filter(|e| e.is_constant());
                    out.values.push(ValueOutput {
                        defn,
                        ty,
                        constant_init,
                    });
                }
            }
            DefnKind::Namespace => {
                let members: Vec<DefnId> = self
                    .ctx
                    .defs
                    .member_scope(defn)
                    .map(|s| self.ctx.scopes.get(s).members().collect())
                    .unwrap_or_default();
                for member in members {
                    self.collect_defn(out, member);
                }
            }
            _ => {}
        }
    }
}
