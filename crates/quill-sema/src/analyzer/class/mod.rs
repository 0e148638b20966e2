// analyzer/class/mod.rs
//
// The per-composite analysis pipeline. Passes run on demand in dependency
// order; each pass guards itself with the definition's pass state so the
// mutually recursive analyses terminate.

mod bases;
mod constructors;
mod fields;
mod members;
mod overloading;

use quill_ast::NodeKind;
use quill_identity::DefnId;

use crate::defs::Traits;
use crate::errors::SemanticError;
use crate::passes::{AnalysisTask, BeginError, Pass, PassSet};

use super::Analyzer;

impl Analyzer {
    /// Entry point for composite analysis: run whatever passes the task
    /// still needs.
    pub(crate) fn run_class_passes(&mut self, defn: DefnId, task: AnalysisTask) -> bool {
        // Code generation needs a fully monomorphized type.
        if task == AnalysisTask::PrepCodeGeneration
            && !self.ctx.defs.get(defn).is_singular()
            && !self.ctx.defs.get(defn).is_template()
            && !self.ctx.defs.is_template_member(defn)
        {
            let name = self.defn_display(defn);
            let span = self.ctx.defs.get(defn).span;
            self.ctx.diagnostics.error(
                SemanticError::NotSingular {
                    name,
                    span: span.into(),
                },
                span,
            );
            return false;
        }
        self.run_pass_set(defn, task.passes())
    }

    /// Run the subset of `passes` not already finished on the definition.
    pub(crate) fn run_pass_set(&mut self, defn: DefnId, passes: PassSet) -> bool {
        let mut to_run = passes;
        to_run.remove_all(self.ctx.defs.get(defn).passes.finished());
        if to_run.is_empty() {
            return true;
        }

        // Template definitions with unbound parameters only create their
        // scope and resolve their bases; members of templates run nothing.
        if self.ctx.defs.get(defn).is_template() {
            let mut ok = true;
            if to_run.contains(Pass::ScopeCreation) {
                ok &= self.pass_scope_creation(defn);
            }
            if to_run.contains(Pass::BaseTypes) {
                ok &= self.pass_base_types(defn);
            }
            return ok;
        }
        if self.ctx.defs.is_template_member(defn) {
            return true;
        }

        tracing::debug!(defn = ?defn, "running class passes");
        for pass in to_run.iter() {
            let ok = match pass {
                Pass::ScopeCreation => self.pass_scope_creation(defn),
                Pass::BaseTypes => self.pass_base_types(defn),
                Pass::Attribute => self.pass_attribute(defn),
                Pass::NamingConflict => self.pass_naming_conflict(defn),
                Pass::Converter => self.pass_converter(defn),
                Pass::MemberType => self.pass_member_type(defn),
                Pass::Field => self.pass_field(defn),
                Pass::Constructor => self.pass_constructor(defn),
                Pass::Method => self.pass_method(defn),
                Pass::Overloading => self.pass_overloading(defn),
                Pass::FieldType => self.pass_field_type(defn),
                Pass::Completion => self.pass_completion(defn),
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Standard begin: skip when finished, diagnose re-entry as a
    /// circular dependency.
    pub(crate) fn begin_pass(&mut self, defn: DefnId, pass: Pass) -> Option<bool> {
        match self.ctx.defs.get_mut(defn).passes.begin(pass, false) {
            Ok(run) => Some(run),
            Err(BeginError::Circular) => {
                self.report_circular(defn, pass);
                None
            }
        }
    }

    fn pass_scope_creation(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::ScopeCreation) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        self.create_type_scope(defn);
        self.ctx.defs.get_mut(defn).passes.finish(Pass::ScopeCreation);
        true
    }

    /// Attribute resolution. The attribute set the middle-end interprets
    /// itself is small; anything else is recorded for the emitter.
    fn pass_attribute(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::Attribute) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        let attributes = self.ctx.defs.get(defn).attributes.clone();
        for attr in &attributes {
            if let NodeKind::Ident(sym) = &attr.kind {
                if self.ctx.interner.resolve(*sym) == "Nonreflective" {
                    self.ctx.defs.get_mut(defn).add_trait(Traits::NONREFLECTIVE);
                }
            }
        }
        self.ctx.defs.get_mut(defn).passes.finish(Pass::Attribute);
        true
    }

    /// Propagate attributes that inherit to enclosed type definitions.
    fn pass_member_type(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::MemberType) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        let nonreflective = self.ctx.defs.get(defn).has_trait(Traits::NONREFLECTIVE);
        if nonreflective {
            if let Some(scope) = self.ctx.defs.member_scope(defn) {
                let members: Vec<DefnId> = self.ctx.scopes.get(scope).members().collect();
                for member in members {
                    if self.ctx.defs.get(member).kind == crate::defs::DefnKind::TypeDef {
                        self.ctx
                            .defs
                            .get_mut(member)
                            .add_trait(Traits::NONREFLECTIVE);
                    }
                }
            }
        }
        self.ctx.defs.get_mut(defn).passes.finish(Pass::MemberType);
        true
    }

    /// FieldType: make sure every instance field's type is itself ready
    /// for type generation.
    fn pass_field_type(&mut self, defn: DefnId) -> bool {
        match self.ctx.defs.get_mut(defn).passes.begin(Pass::FieldType, true) {
            Ok(true) => {}
            Ok(false) => return true,
            Err(_) => return true,
        }
        if let Some(super_ty) = self
            .ctx
            .defs
            .composite_info(defn)
            .and_then(|info| info.primary_base)
        {
            if let Some((_, super_defn)) = self.ctx.registry.as_composite(super_ty) {
                self.run_pass_set(super_defn, AnalysisTask::PrepTypeGeneration.passes());
            }
        }
        let fields: Vec<DefnId> = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|info| info.instance_fields.iter().flatten().copied().collect())
            .unwrap_or_default();
        for field in fields {
            if let Some(field_ty) = self.ctx.defs.value_type(field) {
                if let Some((_, field_defn)) = self.ctx.registry.as_composite(field_ty) {
                    self.run_pass_set(field_defn, AnalysisTask::PrepTypeGeneration.passes());
                }
            }
        }
        self.ctx.defs.get_mut(defn).passes.finish(Pass::FieldType);
        true
    }

    /// Completion: recursively analyze every member to code generation.
    /// Re-entry is fine here; all that matters is eventual completion.
    fn pass_completion(&mut self, defn: DefnId) -> bool {
        match self.ctx.defs.get_mut(defn).passes.begin(Pass::Completion, true) {
            Ok(true) => {}
            Ok(false) => return true,
            Err(_) => return true,
        }
        if let Some(super_ty) = self
            .ctx
            .defs
            .composite_info(defn)
            .and_then(|info| info.primary_base)
        {
            if let Some((_, super_defn)) = self.ctx.registry.as_composite(super_ty) {
                self.prepare(super_defn, AnalysisTask::PrepCodeGeneration);
            }
        }
        if let Some(scope) = self.ctx.defs.member_scope(defn) {
            let members: Vec<DefnId> = self.ctx.scopes.get(scope).members().collect();
            for member in members {
                self.prepare(member, AnalysisTask::PrepCodeGeneration);
            }
        }
        self.ctx.defs.get_mut(defn).passes.finish(Pass::Completion);
        true
    }

    // ====================================================================
    // Small shared lookups
    // ====================================================================

    /// Members bound to `name` in the type's own scope, no inheritance.
    pub(crate) fn local_members(&mut self, defn: DefnId, name: &str) -> Vec<DefnId> {
        let Some(sym) = self.ctx.interner.lookup(name) else {
            return Vec::new();
        };
        let Some(scope) = self.ctx.defs.member_scope(defn) else {
            return Vec::new();
        };
        self.ctx.scopes.get(scope).get(sym).to_vec()
    }
}
