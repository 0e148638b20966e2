// analyzer/class/members.rs
//
// NamingConflict, Converter and Method passes: per-name kind consistency,
// coercer collection, signature resolution and duplicate detection.

use quill_identity::DefnId;

use crate::defs::{DefnKind, StorageClass, Traits, Visibility};
use crate::errors::SemanticError;
use crate::passes::{AnalysisTask, Pass};
use crate::types::CompositeKind;

use super::Analyzer;

impl Analyzer {
    /// Every name in the member table must bind to definitions of a
    /// single kind, and only overloadable kinds may bind more than one.
    pub(crate) fn pass_naming_conflict(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::NamingConflict) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        let mut success = true;
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
            let Some(&first) = defns.first() else { continue };
            let first_kind = self.ctx.defs.get(first).kind;
            for &other in &defns[1..] {
                let other_kind = self.ctx.defs.get(other).kind;
                let conflict = other_kind != first_kind
                    || (!first_kind.is_overloadable() && defns.len() > 1);
                if conflict {
                    let name = self.defn_display(other);
                    let span = self.ctx.defs.get(other).span;
                    let previous = self.ctx.defs.get(first).span;
                    self.ctx.diagnostics.error_with_related(
                        SemanticError::DuplicateDefinition {
                            name,
                            span: span.into(),
                            previous: previous.into(),
                        },
                        span,
                        vec![first],
                    );
                    success = false;
                    break;
                }
            }
        }

        if success {
            self.ctx
                .defs
                .get_mut(defn)
                .passes
                .finish(Pass::NamingConflict);
        } else {
            self.ctx
                .defs
                .get_mut(defn)
                .passes
                .finish_failed(Pass::NamingConflict);
        }
        success
    }

    /// Gather static `coerce` methods usable as implicit converters.
    /// Coercers are not inherited.
    pub(crate) fn pass_converter(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::Converter) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        let kind = self.ctx.defs.composite_kind(&self.ctx.registry, defn);
        if matches!(kind, Some(CompositeKind::Class | CompositeKind::Struct)) {
            let mut coercers = Vec::new();
            for candidate in self.local_members(defn, "coerce") {
                if self.ctx.defs.get(candidate).kind != DefnKind::Function {
                    continue;
                }
                self.prepare_function(candidate, AnalysisTask::PrepTypeComparison);
                let usable = self.ctx.defs.get(candidate).storage == StorageClass::Static
                    && self
                        .ctx
                        .defs
                        .function_type(candidate)
                        .and_then(|f| self.ctx.registry.as_function(f))
                        .map(|sig| sig.params.len() == 1 && !sig.return_type.is_void())
                        .unwrap_or(false);
                if usable {
                    if self.ctx.defs.get(defn).is_singular() {
                        self.ctx.defs.get_mut(candidate).add_trait(Traits::SINGULAR);
                    }
                    coercers.push(candidate);
                }
            }
            if let Some(info) = self.ctx.defs.composite_info_mut(defn) {
                info.coercers = coercers;
            }
        }
        self.ctx.defs.get_mut(defn).passes.finish(Pass::Converter);
        true
    }

    /// Resolve every method and property signature, then require distinct
    /// signatures among same-named members.
    pub(crate) fn pass_method(&mut self, defn: DefnId) -> bool {
        match self.begin_pass(defn, Pass::Method) {
            Some(true) => {}
            Some(false) => return true,
            None => return false,
        }
        let kind = self.ctx.defs.composite_kind(&self.ctx.registry, defn);
        let abstract_kind = matches!(
            kind,
            Some(CompositeKind::Interface | CompositeKind::Protocol)
        );

        let members: Vec<DefnId> = self
            .ctx
            .defs
            .member_scope(defn)
            .map(|scope| self.ctx.scopes.get(scope).members().collect())
            .unwrap_or_default();

        for member in members {
            let member_kind = self.ctx.defs.get(member).kind;
            match member_kind {
                DefnKind::Function | DefnKind::Macro => {
                    if self.ctx.defs.get(member).is_template() {
                        continue;
                    }
                    if abstract_kind
                        && (self.ctx.defs.get(member).is_final()
                            || self.ctx.defs.get(member).visibility != Visibility::Public)
                    {
                        let name = self.defn_display(member);
                        let span = self.ctx.defs.get(member).span;
                        self.ctx.diagnostics.error(
                            SemanticError::BadInterfaceMethod {
                                name,
                                span: span.into(),
                            },
                            span,
                        );
                    }
                    self.prepare_function(member, AnalysisTask::PrepTypeComparison);
                }
                DefnKind::Property | DefnKind::Indexer => {
                    self.prepare(member, AnalysisTask::PrepTypeComparison);
                }
                _ => {}
            }
        }

        // Same-named members need distinct signatures.
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
            let functions: Vec<DefnId> = defns
                .iter()
                .copied()
                .filter(|&d| {
                    matches!(self.ctx.defs.get(d).kind, DefnKind::Function | DefnKind::Macro)
                        && !self.ctx.defs.get(d).is_template()
                })
                .collect();
            for (i, &f) in functions.iter().enumerate() {
                for &earlier in &functions[..i] {
                    if self.same_signature(f, earlier) {
                        let name = self.defn_display(f);
                        let span = self.ctx.defs.get(f).span;
                        let previous = self.ctx.defs.get(earlier).span;
                        self.ctx.diagnostics.error_with_related(
                            SemanticError::SignatureConflict {
                                name,
                                span: span.into(),
                                previous: previous.into(),
                            },
                            span,
                            vec![earlier],
                        );
                    }
                }
            }
        }

        self.ctx.defs.get_mut(defn).passes.finish(Pass::Method);
        true
    }
}
