// types/registry.rs
//
// TypeRegistry: per-compilation type storage with interning, pre-interned
// primitives, and compound type builders. Everything else in the
// middle-end identifies types by the registry's stable TypeId handles.

use quill_identity::{DefnId, ScopeId, Symbol};
use rustc_hash::FxHashMap;

use crate::defs::DefGraph;
use crate::infer::Constraint;

use super::ordering::union_sort_key;
use super::relation;
use super::ty::*;
use super::type_id::{AssignmentId, TypeId, TypeIdVec, TypeVarId};

/// Macro for defining primitive TypeId accessors with a single source of
/// truth. Each entry pairs an accessor name with its reserved TypeId.
macro_rules! define_primitive_accessors {
    ($(($name:ident, $konst:ident)),* $(,)?) => {
        impl TypeRegistry {
            $(
                pub fn $name(&self) -> TypeId {
                    TypeId::$konst
                }
            )*
        }
    };
}

define_primitive_accessors!(
    (bad, BAD),
    (void, VOID),
    (bool_type, BOOL),
    (char_type, CHAR),
    (int8, INT8),
    (int16, INT16),
    (int32, INT32),
    (int64, INT64),
    (uint8, UINT8),
    (uint16, UINT16),
    (uint32, UINT32),
    (uint64, UINT64),
    (float, FLOAT),
    (double, DOUBLE),
    (null_type, NULL),
    (unsized_int, UNSIZED_INT),
);

/// Per-compilation type store with automatic interning/deduplication.
///
/// Append-only for the life of the compilation. Construction is
/// side-effect free apart from interning: repeated calls with structurally
/// equal inputs return the same handle.
pub struct TypeRegistry {
    /// Interned types, indexed by TypeId
    types: Vec<Type>,
    /// Deduplication map for structurally-interned variants
    intern_map: FxHashMap<Type, TypeId>,
    /// Side records for identity-interned type variables
    type_vars: Vec<TypeVarData>,
    /// Side records for identity-interned inference assignments
    assignments: Vec<AssignmentData>,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types_count", &self.types.len())
            .finish_non_exhaustive()
    }
}

impl TypeRegistry {
    /// Create a new registry with pre-interned primitive types.
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            intern_map: FxHashMap::default(),
            type_vars: Vec::new(),
            assignments: Vec::new(),
        };

        // Pre-intern primitives in the order fixed by the TypeId constants.
        // The debug_asserts verify the constants match the interned indices.
        let bad = registry.intern(Type::Primitive(PrimitiveKind::Bad));
        debug_assert_eq!(bad, TypeId::BAD);
        let void = registry.intern(Type::Primitive(PrimitiveKind::Void));
        debug_assert_eq!(void, TypeId::VOID);
        let b = registry.intern(Type::Primitive(PrimitiveKind::Bool));
        debug_assert_eq!(b, TypeId::BOOL);
        let c = registry.intern(Type::Primitive(PrimitiveKind::Char));
        debug_assert_eq!(c, TypeId::CHAR);

        let i8_ = registry.intern(Type::Primitive(PrimitiveKind::Int8));
        debug_assert_eq!(i8_, TypeId::INT8);
        let i16_ = registry.intern(Type::Primitive(PrimitiveKind::Int16));
        debug_assert_eq!(i16_, TypeId::INT16);
        let i32_ = registry.intern(Type::Primitive(PrimitiveKind::Int32));
        debug_assert_eq!(i32_, TypeId::INT32);
        let i64_ = registry.intern(Type::Primitive(PrimitiveKind::Int64));
        debug_assert_eq!(i64_, TypeId::INT64);

        let u8_ = registry.intern(Type::Primitive(PrimitiveKind::UInt8));
        debug_assert_eq!(u8_, TypeId::UINT8);
        let u16_ = registry.intern(Type::Primitive(PrimitiveKind::UInt16));
        debug_assert_eq!(u16_, TypeId::UINT16);
        let u32_ = registry.intern(Type::Primitive(PrimitiveKind::UInt32));
        debug_assert_eq!(u32_, TypeId::UINT32);
        let u64_ = registry.intern(Type::Primitive(PrimitiveKind::UInt64));
        debug_assert_eq!(u64_, TypeId::UINT64);

        let f = registry.intern(Type::Primitive(PrimitiveKind::Float));
        debug_assert_eq!(f, TypeId::FLOAT);
        let d = registry.intern(Type::Primitive(PrimitiveKind::Double));
        debug_assert_eq!(d, TypeId::DOUBLE);

        let n = registry.intern(Type::Primitive(PrimitiveKind::Null));
        debug_assert_eq!(n, TypeId::NULL);
        let ui = registry.intern(Type::Primitive(PrimitiveKind::UnsizedInt));
        debug_assert_eq!(ui, TypeId::UNSIZED_INT);

        registry
    }

    /// Intern a type, returning the existing TypeId if already interned.
    fn intern(&mut self, ty: Type) -> TypeId {
        let next_id = TypeId::from_raw(self.types.len() as u32);
        *self.intern_map.entry(ty.clone()).or_insert_with(|| {
            self.types.push(ty);
            next_id
        })
    }

    /// Push without deduplication; used for identity-interned variants.
    fn push_identity(&mut self, ty: Type) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Get the Type for a TypeId
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index() as usize]
    }

    /// Iterate every interned handle with its type, in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId::from_raw(i as u32), t))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> TypeId {
        match kind {
            PrimitiveKind::Bad => TypeId::BAD,
            PrimitiveKind::Void => TypeId::VOID,
            PrimitiveKind::Bool => TypeId::BOOL,
            PrimitiveKind::Char => TypeId::CHAR,
            PrimitiveKind::Int8 => TypeId::INT8,
            PrimitiveKind::Int16 => TypeId::INT16,
            PrimitiveKind::Int32 => TypeId::INT32,
            PrimitiveKind::Int64 => TypeId::INT64,
            PrimitiveKind::UInt8 => TypeId::UINT8,
            PrimitiveKind::UInt16 => TypeId::UINT16,
            PrimitiveKind::UInt32 => TypeId::UINT32,
            PrimitiveKind::UInt64 => TypeId::UINT64,
            PrimitiveKind::Float => TypeId::FLOAT,
            PrimitiveKind::Double => TypeId::DOUBLE,
            PrimitiveKind::Null => TypeId::NULL,
            PrimitiveKind::UnsizedInt => TypeId::UNSIZED_INT,
        }
    }

    // ========================================================================
    // Compound type builders - intern on construction
    // ========================================================================

    /// Create (or fetch) the composite type owned by a definition.
    pub fn composite(&mut self, kind: CompositeKind, defn: DefnId) -> TypeId {
        self.intern(Type::Composite { kind, defn })
    }

    /// Create (or fetch) the enum type owned by a definition.
    pub fn enum_type(&mut self, defn: DefnId, base: TypeId) -> TypeId {
        self.intern(Type::Enum { defn, base })
    }

    /// Create a function type from its full signature tuple.
    /// Returns Bad if any component is Bad.
    pub fn function(&mut self, sig: FunctionSignature) -> TypeId {
        if sig.return_type.is_bad() || sig.params.iter().any(|p| p.ty.is_bad()) {
            return self.bad();
        }
        self.intern(Type::Function(Box::new(sig)))
    }

    /// Create a tuple type from ordered members.
    pub fn tuple(&mut self, members: impl Into<TypeIdVec>) -> TypeId {
        let members = members.into();
        if members.iter().any(|m| m.is_bad()) {
            return self.bad();
        }
        self.intern(Type::Tuple(members))
    }

    /// Create an address-of (pointer) type.
    pub fn address(&mut self, pointee: TypeId) -> TypeId {
        if pointee.is_bad() {
            return self.bad();
        }
        self.intern(Type::Address(pointee))
    }

    /// Create a fixed-length native array type.
    pub fn native_array(&mut self, element: TypeId, length: u64) -> TypeId {
        if element.is_bad() {
            return self.bad();
        }
        self.intern(Type::NativeArray { element, length })
    }

    /// Create a type-literal type.
    pub fn type_literal(&mut self, referent: TypeId) -> TypeId {
        if referent.is_bad() {
            return self.bad();
        }
        self.intern(Type::TypeLiteral(referent))
    }

    /// Create (or fetch) the alias type for a defining symbol. The target
    /// resolves lazily through the definition graph.
    pub fn alias(&mut self, defn: DefnId) -> TypeId {
        self.intern(Type::Alias { defn })
    }

    /// Create a fresh type variable for a template. Never deduplicated:
    /// two variables are distinct types even with the same name.
    pub fn type_variable(&mut self, template: DefnId, name: Symbol) -> TypeId {
        let var_id = TypeVarId(self.type_vars.len() as u32);
        self.type_vars.push(TypeVarData {
            template,
            name,
            upper_bound: None,
        });
        self.push_identity(Type::TypeVariable(var_id))
    }

    /// Create a fresh assignment for a variable under inference. Never
    /// deduplicated.
    pub fn type_assignment(&mut self, target: TypeId, scope: ScopeId) -> TypeId {
        debug_assert!(matches!(self.get(target), Type::TypeVariable(_)));
        let sequence = self.assignments.len() as u32;
        let id = AssignmentId(sequence);
        self.assignments.push(AssignmentData {
            target,
            scope,
            sequence,
            value: None,
            constraints: Vec::new(),
        });
        self.push_identity(Type::Assignment(id))
    }

    // ========================================================================
    // Side-record access
    // ========================================================================

    pub fn type_var(&self, id: TypeVarId) -> &TypeVarData {
        &self.type_vars[id.index() as usize]
    }

    pub fn type_var_mut(&mut self, id: TypeVarId) -> &mut TypeVarData {
        &mut self.type_vars[id.index() as usize]
    }

    pub fn assignment(&self, id: AssignmentId) -> &AssignmentData {
        &self.assignments[id.index() as usize]
    }

    pub fn assignment_mut(&mut self, id: AssignmentId) -> &mut AssignmentData {
        &mut self.assignments[id.index() as usize]
    }

    /// Add a constraint to an assignment under inference.
    pub fn add_constraint(&mut self, id: AssignmentId, constraint: Constraint) {
        self.assignments[id.index() as usize].constraints.push(constraint);
    }

    // ========================================================================
    // Unions
    // ========================================================================

    /// Create a union type from members, canonicalising first:
    /// dereference aliases, drop members equal to or subsumed by another
    /// member, sort by the lexical type ordering, count categories.
    /// A single survivor collapses to itself; Bad propagates.
    pub fn union(&mut self, defs: &DefGraph, members: impl Into<TypeIdVec>) -> TypeId {
        let members = members.into();
        if members.is_empty() || members.iter().any(|m| m.is_bad()) {
            return self.bad();
        }

        // Flatten nested unions and dealias before the disjointness check.
        let mut flattened: Vec<TypeId> = Vec::new();
        for &m in &members {
            let m = relation::deref(self, defs, m);
            if let Type::Union(u) = self.get(m) {
                flattened.extend(u.members.iter().copied());
            } else {
                flattened.push(m);
            }
        }

        // Make the member set disjoint: drop a candidate if an existing
        // member is equal or a supertype of it; drop existing members that
        // are subtypes of the candidate.
        let mut combined: Vec<TypeId> = Vec::new();
        for ty in flattened {
            let mut add_new = true;
            combined.retain(|&m| {
                if relation::is_equal(self, defs, m, ty) || relation::is_subtype(self, defs, ty, m)
                {
                    add_new = false;
                    true
                } else {
                    // Keep m unless it is subsumed by the candidate.
                    !relation::is_subtype(self, defs, m, ty)
                }
            });
            if add_new {
                combined.push(ty);
            }
        }

        combined.sort_by_cached_key(|&m| union_sort_key(self, m));
        combined.dedup();

        if combined.len() == 1 {
            return combined[0];
        }

        let mut num_value: u16 = 0;
        let mut num_reference: u16 = 0;
        let mut has_void = false;
        let mut has_null = false;
        for &m in &combined {
            if m.is_void() {
                has_void = true;
            } else if m.is_null() {
                has_null = true;
            } else if self.get(m).is_reference_kind() {
                num_reference += 1;
            } else {
                num_value += 1;
            }
        }

        self.intern(Type::Union(Box::new(UnionData {
            members: combined.into_iter().collect(),
            num_value,
            num_reference,
            has_void,
            has_null,
        })))
    }

    // ========================================================================
    // Unwrap helpers
    // ========================================================================

    pub fn as_union(&self, id: TypeId) -> Option<&UnionData> {
        match self.get(id) {
            Type::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_function(&self, id: TypeId) -> Option<&FunctionSignature> {
        match self.get(id) {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_composite(&self, id: TypeId) -> Option<(CompositeKind, DefnId)> {
        match self.get(id) {
            Type::Composite { kind, defn } => Some((*kind, *defn)),
            _ => None,
        }
    }

    pub fn as_type_variable(&self, id: TypeId) -> Option<TypeVarId> {
        match self.get(id) {
            Type::TypeVariable(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_assignment(&self, id: TypeId) -> Option<AssignmentId> {
        match self.get(id) {
            Type::Assignment(a) => Some(*a),
            _ => None,
        }
    }

    /// A type is singular when no unbound type variables remain in it.
    pub fn is_singular(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Primitive(_) | Type::Enum { .. } | Type::Composite { .. } | Type::Alias { .. } => {
                true
            }
            Type::Function(f) => {
                self.is_singular(f.return_type)
                    && f.params.iter().all(|p| self.is_singular(p.ty))
                    && f.self_param.map_or(true, |s| self.is_singular(s))
            }
            Type::Tuple(members) => members.iter().all(|&m| self.is_singular(m)),
            Type::Union(u) => u.members.iter().all(|&m| self.is_singular(m)),
            Type::Address(p) => self.is_singular(*p),
            Type::NativeArray { element, .. } => self.is_singular(*element),
            Type::TypeLiteral(t) => self.is_singular(*t),
            Type::TypeVariable(_) => false,
            Type::Assignment(a) => match self.assignment(*a).value {
                Some(v) => self.is_singular(v),
                None => false,
            },
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
