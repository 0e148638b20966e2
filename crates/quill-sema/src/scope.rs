// scope.rs
//
// Nested, ordered name-to-definition multimaps. Iteration order is
// insertion order: field numbering and constructor synthesis depend on
// declaration order, so the entry list is the source of truth and the
// hash map is only an index into it.

use quill_identity::{DefnId, ScopeId, Symbol};
use rustc_hash::FxHashMap;

use crate::defs::DefGraph;
use crate::types::{relation, TypeRegistry};

/// What a scope belongs to; controls how lookup escalates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Module,
    Namespace,
    /// Member scope of a composite type; lookup may inherit through bases.
    Members,
    /// A template signature's parameter scope.
    TemplateParams,
    Local,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// The definition that owns this scope, when one does.
    pub owner: Option<DefnId>,
    entries: Vec<(Symbol, Vec<DefnId>)>,
    index: FxHashMap<Symbol, usize>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: Option<DefnId>) -> Self {
        Self {
            kind,
            parent,
            owner,
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Add a definition under a name. Names are multimaps: overloaded
    /// functions pile up under one entry.
    pub fn define(&mut self, name: Symbol, defn: DefnId) {
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1.push(defn),
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push((name, vec![defn]));
            }
        }
    }

    /// All definitions bound to a name in this scope only.
    pub fn get(&self, name: Symbol) -> &[DefnId] {
        match self.index.get(&name) {
            Some(&slot) => &self.entries[slot].1,
            None => &[],
        }
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (Symbol, &[DefnId])> {
        self.entries.iter().map(|(name, defns)| (*name, defns.as_slice()))
    }

    /// Every member definition in insertion order, flattened.
    pub fn members(&self) -> impl Iterator<Item = DefnId> + '_ {
        self.entries.iter().flat_map(|(_, defns)| defns.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Arena of scopes, addressed by ScopeId.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        owner: Option<DefnId>,
    ) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent, owner));
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index() as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index() as usize]
    }

    /// Look a name up in one scope. With `inherit` set and the scope being
    /// a composite member scope, the search continues through the owner's
    /// bases, primary base first, breadth-first.
    pub fn lookup(
        &self,
        registry: &TypeRegistry,
        defs: &DefGraph,
        scope: ScopeId,
        name: Symbol,
        inherit: bool,
    ) -> Vec<DefnId> {
        let local = self.get(scope);
        let found = local.get(name);
        if !found.is_empty() {
            return found.to_vec();
        }
        if !inherit || local.kind != ScopeKind::Members {
            return Vec::new();
        }
        let Some(owner) = local.owner else {
            return Vec::new();
        };
        let Some(owner_ty) = defs.type_of(owner) else {
            return Vec::new();
        };

        // Breadth-first through the base graph; bases() is already
        // primary-first after the BaseTypes pass.
        for base in relation::ancestors(registry, defs, owner_ty) {
            let Some((_, base_defn)) = registry.as_composite(base) else {
                continue;
            };
            let Some(base_scope) = defs.member_scope(base_defn) else {
                continue;
            };
            let found = self.get(base_scope).get(name);
            if !found.is_empty() {
                return found.to_vec();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_identity::Symbol;

    #[test]
    fn define_preserves_insertion_order() {
        let mut table = ScopeTable::new();
        let scope = table.alloc(ScopeKind::Members, None, None);
        let a = Symbol::new_for_test(1);
        let b = Symbol::new_for_test(2);
        let s = table.get_mut(scope);
        s.define(b, DefnId::new(10));
        s.define(a, DefnId::new(11));
        s.define(b, DefnId::new(12));

        let names: Vec<Symbol> = table.get(scope).entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec![b, a]);
        assert_eq!(table.get(scope).get(b), &[DefnId::new(10), DefnId::new(12)]);

        let members: Vec<DefnId> = table.get(scope).members().collect();
        assert_eq!(
            members,
            vec![DefnId::new(10), DefnId::new(12), DefnId::new(11)]
        );
    }

    #[test]
    fn lookup_without_inherit_stops_locally() {
        let registry = TypeRegistry::new();
        let defs = DefGraph::new();
        let mut table = ScopeTable::new();
        let scope = table.alloc(ScopeKind::Members, None, None);
        let missing = Symbol::new_for_test(9);
        assert!(table
            .lookup(&registry, &defs, scope, missing, true)
            .is_empty());
    }
}
