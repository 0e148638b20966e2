// analyzer/class/fields.rs
//
// Field layout: slot assignment in declaration order, with slot 0
// reserved for the super instance. A Let whose initializer folds to a
// constant needs no storage.

use quill_identity::DefnId;

use crate::defs::{DefnKind, StorageClass, Traits};
use crate::errors::SemanticError;
use crate::passes::{AnalysisTask, Pass};
use crate::types::CompositeKind;

use super::Analyzer;

impl Analyzer {
    pub(crate) fn pass_field(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::Field) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }

        let kind = self.ctx.defs.composite_kind(&self.ctx.registry, defn);
        let super_defn = self
            .ctx
            .defs
            .composite_info(defn)
            .and_then(|info| info.primary_base)
            .and_then(|ty| self.ctx.registry.as_composite(ty))
            .map(|(_, d)| d);

        // The super's layout must exist before ours: its recursive count
        // seeds our numbering.
        let mut field_count = 0usize;
        let mut recursive_count = 0usize;
        let mut slots: Vec<Option<DefnId>> = Vec::new();
        if let Some(super_defn) = super_defn {
            if !self.ctx.defs.get(super_defn).passes.is_finished(Pass::Field) {
                self.run_pass_set(super_defn, AnalysisTask::PrepConstruction.passes());
            }
            // Reserve slot 0 for the superclass instance.
            slots.push(None);
            field_count = 1;
            recursive_count = self
                .ctx
                .defs
                .composite_info(super_defn)
                .map(|info| info.recursive_field_count())
                .unwrap_or(0);
        }

        let mut static_fields: Vec<DefnId> = Vec::new();
        let members: Vec<DefnId> = self
            .ctx
            .defs
            .member_scope(defn)
            .map(|scope| self.ctx.scopes.get(scope).members().collect())
            .unwrap_or_default();

        for member in members {
            let member_kind = self.ctx.defs.get(member).kind;
            if !matches!(member_kind, DefnKind::Var | DefnKind::Let) {
                continue;
            }

            // Fields of a final type are final.
            let type_is_final = self.ctx.defs.get(defn).is_final();
            if type_is_final {
                self.ctx.defs.get_mut(member).add_trait(Traits::FINAL);
            }

            self.resolve_value_type(member);

            // A constant-foldable Let needs no storage slot.
            let storage_required = if member_kind == DefnKind::Let {
                let constant = self
                    .ctx
                    .defs
                    .get(member)
                    .as_value()
                    .and_then(|v| v.init.as_ref())
                    .map(|init| init.is_constant())
                    .unwrap_or(false);
                !constant
            } else {
                true
            };
            if !storage_required {
                continue;
            }

            if kind == Some(CompositeKind::Interface) {
                let span = self.ctx.defs.get(member).span;
                let name = self.defn_display(member);
                self.ctx.diagnostics.error(
                    SemanticError::InterfaceStorage {
                        name,
                        span: span.into(),
                    },
                    span,
                );
            }

            match self.ctx.defs.get(member).storage {
                StorageClass::Instance => {
                    if let Some(value) = self.ctx.defs.get_mut(member).as_value_mut() {
                        value.member_index = field_count as i32;
                        value.recursive_index = recursive_count as i32;
                    }
                    field_count += 1;
                    recursive_count += 1;
                    slots.push(Some(member));
                }
                StorageClass::Static => static_fields.push(member),
                _ => {}
            }
        }

        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.instance_fields = slots;
            info.static_fields = static_fields;
        }
        self.ctx.defs.get_mut(defn).passes.finish(Pass::Field);
        true
    }
}
