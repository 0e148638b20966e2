// analyzer/class/overloading.rs
//
// The Overloading pass: inherit the super's instance-method table, build
// one dispatch table per implemented interface, substitute overrides into
// every table, append genuinely new methods, and finally require that a
// concrete type leaves no slot unfilled.

use quill_identity::DefnId;

use crate::defs::{DefnKind, InterfaceTable, StorageClass, Traits};
use crate::errors::SemanticError;
use crate::passes::{AnalysisTask, Pass};
use crate::types::{relation, CompositeKind, TypeId};

use super::Analyzer;

impl Analyzer {
    pub(crate) fn pass_overloading(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::Overloading) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }

        // Every base must have finished its own overload analysis first.
        let bases: Vec<TypeId> = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|info| info.bases.clone())
            .unwrap_or_default();
        for base in bases {
            if let Some((_, base_defn)) = self.ctx.registry.as_composite(base) {
                self.run_pass_set(base_defn, AnalysisTask::PrepEvaluation.passes());
            }
        }

        self.copy_base_class_methods(defn);
        self.create_interface_tables(defn);
        self.override_members(defn);
        self.add_new_methods(defn);
        let ok = self.check_required_methods(defn);

        if ok {
            self.ctx.defs.get_mut(defn).passes.finish(Pass::Overloading);
        } else {
            self.ctx
                .defs
                .get_mut(defn)
                .passes
                .finish_failed(Pass::Overloading);
        }
        ok
    }

    /// Seed the instance-method table with a copy of the super's, so every
    /// inherited method keeps its dispatch index in this subclass.
    fn copy_base_class_methods(&mut self, defn: DefnId) {
        let kind = self.ctx.defs.composite_kind(&self.ctx.registry, defn);
        let info = self.ctx.defs.composite_info(defn);
        let super_ty = info.and_then(|i| i.primary_base).or_else(|| {
            // Interfaces and structs inherit through their first base even
            // without a concrete super.
            if matches!(
                kind,
                Some(CompositeKind::Interface | CompositeKind::Struct | CompositeKind::Protocol)
            ) {
                info.and_then(|i| i.bases.first().copied())
            } else {
                None
            }
        });
        let Some(super_ty) = super_ty else { return };
        let Some((_, super_defn)) = self.ctx.registry.as_composite(super_ty) else {
            return;
        };
        let inherited: Vec<DefnId> = self
            .ctx
            .defs
            .composite_info(super_defn)
            .map(|i| i.instance_methods.clone())
            .unwrap_or_default();
        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.instance_methods = inherited;
        }
    }

    /// One dispatch table per implemented interface, except interfaces
    /// that are the primary base of another ancestor: those share the
    /// parent's table.
    fn create_interface_tables(&mut self, defn: DefnId) {
        let Some(own_ty) = self.ctx.defs.type_of(defn) else {
            return;
        };
        let ancestors = relation::ancestors(&self.ctx.registry, &self.ctx.defs, own_ty);

        // Drop every ancestor that is the first base of some ancestor (or
        // of this type): its table is a prefix of the inheritor's.
        let mut candidates: Vec<TypeId> = ancestors.clone();
        let mut around: Vec<TypeId> = ancestors.clone();
        around.push(own_ty);
        for ty in around {
            let Some((_, d)) = self.ctx.registry.as_composite(ty) else {
                continue;
            };
            if let Some(first) = self
                .ctx
                .defs
                .composite_info(d)
                .and_then(|i| i.bases.first().copied())
            {
                candidates.retain(|&c| c != first);
            }
        }

        for interface_ty in candidates {
            let Some((kind, interface_defn)) = self.ctx.registry.as_composite(interface_ty) else {
                continue;
            };
            if kind != CompositeKind::Interface {
                continue;
            }

            // A parent class that already implements this interface hands
            // its table down as the starting point.
            let methods = match self.find_base_implementation(defn, interface_ty) {
                Some(parent_table) => parent_table,
                None => self
                    .ctx
                    .defs
                    .composite_info(interface_defn)
                    .map(|i| i.instance_methods.clone())
                    .unwrap_or_default(),
            };
            if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
                info.interfaces.push(InterfaceTable {
                    interface: interface_ty,
                    methods,
                });
            }
        }
    }

    /// Walk the primary-base chain for an existing dispatch table.
    fn find_base_implementation(&self, defn: DefnId, interface: TypeId) -> Option<Vec<DefnId>> {
        let mut current = self
            .ctx
            .defs
            .composite_info(defn)
            .and_then(|i| i.primary_base);
        while let Some(ty) = current {
            let (_, d) = self.ctx.registry.as_composite(ty)?;
            if let Some(info) = self.ctx.defs.composite_info(d) {
                if let Some(table) = info.find_itable(interface) {
                    return Some(table.methods.clone());
                }
                current = info.primary_base;
            } else {
                return None;
            }
        }
        None
    }

    /// Substitute this type's declarations into every inherited slot with
    /// a compatible signature.
    fn override_members(&mut self, defn: DefnId) {
        let entries: Vec<Vec<DefnId>> = self
            .ctx
            .defs
            .member_scope(defn)
            .map(|scope| {
                self.ctx
                    .scopes
                    .get(scope)
                    .entries()
                    .map(|(_, defns)| defns.to_vec())
                    .collect()
            })
            .unwrap_or_default();

        for defns in entries {
            let mut methods: Vec<DefnId> = Vec::new();
            let mut getters: Vec<DefnId> = Vec::new();
            let mut setters: Vec<DefnId> = Vec::new();
            let mut property: Option<DefnId> = None;

            for &member in &defns {
                let d = self.ctx.defs.get(member);
                match d.kind {
                    DefnKind::Function => {
                        if d.storage == StorageClass::Instance
                            && d.is_singular()
                            && !d.is_ctor()
                        {
                            methods.push(member);
                        }
                    }
                    DefnKind::Property | DefnKind::Indexer => {
                        if d.storage == StorageClass::Instance && d.is_singular() {
                            property = Some(member);
                            if let Some(p) = d.as_property() {
                                if let Some(g) = p.getter {
                                    getters.push(g);
                                }
                                if let Some(s) = p.setter {
                                    setters.push(s);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            if !methods.is_empty() {
                self.override_into_tables(defn, &methods, None);
            }
            if let Some(property) = property {
                if !getters.is_empty() {
                    self.override_into_tables(defn, &getters, Some(property));
                }
                if !setters.is_empty() {
                    self.override_into_tables(defn, &setters, Some(property));
                }
            }
        }
    }

    /// Run one override group against the class table and all interface
    /// tables. `property` keys accessor matching to the owning property.
    fn override_into_tables(&mut self, defn: DefnId, overrides: &[DefnId], property: Option<DefnId>) {
        let mut class_table = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|i| i.instance_methods.clone())
            .unwrap_or_default();
        self.override_methods(&mut class_table, overrides, property, true);
        let itable_count = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|i| i.interfaces.len())
            .unwrap_or(0);
        let mut itables: Vec<Vec<DefnId>> = Vec::with_capacity(itable_count);
        for index in 0..itable_count {
            let mut table = self.ctx.defs.composite_info(defn).unwrap().interfaces[index]
                .methods
                .clone();
            self.override_methods(&mut table, overrides, property, false);
            itables.push(table);
        }
        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.instance_methods = class_table;
            for (index, table) in itables.into_iter().enumerate() {
                info.interfaces[index].methods = table;
            }
        }
    }

    /// The slot-substitution engine shared by the class table and the
    /// interface tables.
    fn override_methods(
        &mut self,
        table: &mut [DefnId],
        overrides: &[DefnId],
        property: Option<DefnId>,
        can_hide: bool,
    ) {
        let Some(&first) = overrides.first() else { return };
        let name = self.ctx.defs.get(first).name;

        for i in 0..table.len() {
            let slot = table[i];
            if self.ctx.defs.get(slot).name != name {
                continue;
            }
            // Accessors only override accessors of the same property name.
            if let Some(property) = property {
                let slot_property = self
                    .ctx
                    .defs
                    .get(slot)
                    .as_function()
                    .and_then(|f| f.property);
                let matches = slot_property
                    .map(|p| self.ctx.defs.get(p).name == self.ctx.defs.get(property).name)
                    .unwrap_or(false);
                if !matches {
                    continue;
                }
            }

            let replacement = overrides
                .iter()
                .copied()
                .find(|&candidate| self.can_override(candidate, slot));
            match replacement {
                Some(new_method) => {
                    table[i] = new_method;
                    let dispatch_unset = self
                        .ctx
                        .defs
                        .get(new_method)
                        .as_function()
                        .map(|f| f.dispatch_index < 0)
                        .unwrap_or(false);
                    if can_hide && dispatch_unset {
                        if let Some(f) = self.ctx.defs.get_mut(new_method).as_function_mut() {
                            f.dispatch_index = i as i32;
                        }
                    }

                    let base_has_body = self
                        .ctx
                        .defs
                        .get(slot)
                        .as_function()
                        .map(|f| f.has_body())
                        .unwrap_or(false);
                    if base_has_body && !self.ctx.defs.get(new_method).has_trait(Traits::OVERRIDE)
                    {
                        let method_name = self.defn_display(new_method);
                        let base = self.defn_display(slot);
                        let span = self.ctx.defs.get(new_method).span;
                        self.ctx.diagnostics.warn(
                            SemanticError::MissingOverrideModifier {
                                name: method_name,
                                base,
                                span: span.into(),
                            },
                            span,
                        );
                    }
                    if let Some(f) = self.ctx.defs.get_mut(new_method).as_function_mut() {
                        if !f.overridden.contains(&slot) {
                            f.overridden.push(slot);
                        }
                    }
                }
                None if can_hide && property.is_none() => {
                    let slot_name = self.defn_display(slot);
                    let span = self.ctx.defs.get(first).span;
                    self.ctx.diagnostics.warn(
                        SemanticError::MemberHidden {
                            name: slot_name,
                            span: span.into(),
                        },
                        span,
                    );
                }
                None => {}
            }
        }
    }

    /// Append declared methods that consumed no inherited slot, assigning
    /// fresh dispatch indices. Final methods never enter the table.
    fn add_new_methods(&mut self, defn: DefnId) {
        let members: Vec<DefnId> = self
            .ctx
            .defs
            .member_scope(defn)
            .map(|scope| self.ctx.scopes.get(scope).members().collect())
            .unwrap_or_default();

        for member in members {
            let d = self.ctx.defs.get(member);
            if d.storage != StorageClass::Instance || !d.is_singular() {
                continue;
            }
            match d.kind {
                DefnKind::Function => {
                    let undef = d.has_trait(Traits::UNDEF);
                    let no_base = d
                        .as_function()
                        .map(|f| f.overridden.is_empty())
                        .unwrap_or(true);
                    if undef && no_base {
                        let name = self.defn_display(member);
                        let span = d.span;
                        self.ctx.diagnostics.error(
                            SemanticError::UndefWithoutBase {
                                name,
                                span: span.into(),
                            },
                            span,
                        );
                    }
                    self.append_if_new(defn, member);
                }
                DefnKind::Property | DefnKind::Indexer => {
                    let accessors: Vec<DefnId> = d
                        .as_property()
                        .map(|p| p.getter.into_iter().chain(p.setter).collect())
                        .unwrap_or_default();
                    for accessor in accessors {
                        self.append_if_new(defn, accessor);
                    }
                }
                _ => {}
            }
        }
    }

    fn append_if_new(&mut self, defn: DefnId, method: DefnId) {
        let d = self.ctx.defs.get(method);
        if d.is_ctor() || d.is_final() {
            return;
        }
        let unset = d
            .as_function()
            .map(|f| f.dispatch_index < 0)
            .unwrap_or(false);
        if !unset {
            return;
        }
        let index = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|i| i.instance_methods.len())
            .unwrap_or(0);
        if let Some(f) = self.ctx.defs.get_mut(method).as_function_mut() {
            f.dispatch_index = index as i32;
        }
        if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
            info.instance_methods.push(method);
        }
    }

    /// A concrete type must fill every slot with a method that has a body
    /// or an extern/intrinsic marker.
    fn check_required_methods(&mut self, defn: DefnId) -> bool {
        if self.ctx.defs.get(defn).is_abstract() {
            return true;
        }
        let kind = self.ctx.defs.composite_kind(&self.ctx.registry, defn);
        let span = self.ctx.defs.get(defn).span;
        let name = self.defn_display(defn);

        let is_implemented = |an: &Analyzer, method: DefnId| {
            let d = an.ctx.defs.get(method);
            d.has_trait(Traits::EXTERN)
                || d.has_trait(Traits::INTRINSIC)
                || d.has_trait(Traits::UNDEF)
                || d.as_function().map(|f| f.has_body()).unwrap_or(false)
        };

        if matches!(kind, Some(CompositeKind::Class | CompositeKind::Struct)) {
            let unimplemented: Vec<DefnId> = self
                .ctx
                .defs
                .composite_info(defn)
                .map(|i| {
                    i.instance_methods
                        .iter()
                        .copied()
                        .filter(|&m| !is_implemented(self, m))
                        .collect()
                })
                .unwrap_or_default();
            if !unimplemented.is_empty() {
                for method in unimplemented {
                    let method_name = self.defn_display(method);
                    self.ctx.diagnostics.error_with_related(
                        SemanticError::MissingImplementation {
                            name: name.clone(),
                            method: method_name,
                            span: span.into(),
                        },
                        span,
                        vec![method],
                    );
                }
                return false;
            }
        }

        let itable_count = self
            .ctx
            .defs
            .composite_info(defn)
            .map(|i| i.interfaces.len())
            .unwrap_or(0);
        for index in 0..itable_count {
            let unimplemented: Vec<DefnId> = {
                let info = self.ctx.defs.composite_info(defn).unwrap();
                info.interfaces[index]
                    .methods
                    .iter()
                    .copied()
                    .filter(|&m| !is_implemented(self, m))
                    .collect()
            };
            if !unimplemented.is_empty() {
                for method in unimplemented {
                    let method_name = self.defn_display(method);
                    self.ctx.diagnostics.error_with_related(
                        SemanticError::MissingImplementation {
                            name: name.clone(),
                            method: method_name,
                            span: span.into(),
                        },
                        span,
                        vec![method],
                    );
                }
                return false;
            }
        }
        true
    }
}
