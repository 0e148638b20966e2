// types/relation.rs
//
// Type identity and subtyping over registry handles. All comparisons
// dereference aliases and solved inference assignments first, so handle
// equality on the results implies semantic equality.

use quill_identity::DefnId;

use crate::defs::DefGraph;

use super::registry::TypeRegistry;
use super::ty::{CompositeKind, Type};
use super::type_id::TypeId;

/// Follow alias targets and solved assignments to the underlying type.
/// Unresolved aliases and unsolved assignments stay as-is.
pub fn deref(registry: &TypeRegistry, defs: &DefGraph, ty: TypeId) -> TypeId {
    let mut current = ty;
    loop {
        match registry.get(current) {
            Type::Alias { defn } => match defs.alias_target(*defn) {
                Some(target) if target != current => current = target,
                _ => return current,
            },
            Type::Assignment(a) => match registry.assignment(*a).value {
                Some(value) if value != current => current = value,
                _ => return current,
            },
            _ => return current,
        }
    }
}

/// Semantic equality. Handles are canonical, so after dereferencing this
/// is a handle compare.
pub fn is_equal(registry: &TypeRegistry, defs: &DefGraph, a: TypeId, b: TypeId) -> bool {
    deref(registry, defs, a) == deref(registry, defs, b)
}

/// Transitive base types of a composite, primary base first,
/// breadth-first. The receiver itself is not included.
pub fn ancestors(registry: &TypeRegistry, defs: &DefGraph, ty: TypeId) -> Vec<TypeId> {
    let mut out = Vec::new();
    let mut queue: Vec<TypeId> = vec![ty];
    let mut cursor = 0;
    while cursor < queue.len() {
        let current = queue[cursor];
        cursor += 1;
        if let Some((_, defn)) = registry.as_composite(current) {
            if let Some(info) = defs.composite_info(defn) {
                for &base in &info.bases {
                    if !out.contains(&base) {
                        out.push(base);
                        queue.push(base);
                    }
                }
            }
        }
    }
    out
}

/// Nominal subtype test. Reflexive; composites relate through their base
/// lists, unions relate by member inclusion, type variables through their
/// upper bound.
pub fn is_subtype(registry: &TypeRegistry, defs: &DefGraph, sub: TypeId, sup: TypeId) -> bool {
    let sub = deref(registry, defs, sub);
    let sup = deref(registry, defs, sup);
    if sub == sup {
        return true;
    }

    match (registry.get(sub), registry.get(sup)) {
        (Type::Composite { .. }, Type::Composite { .. }) => {
            ancestors(registry, defs, sub).contains(&sup)
        }
        // A union is a subtype when every member fits the supertype.
        (Type::Union(u), _) => {
            let members: Vec<TypeId> = u.members.iter().copied().collect();
            members
                .iter()
                .all(|&m| is_subtype(registry, defs, m, sup))
        }
        // A non-union fits a union when some member includes it.
        (_, Type::Union(u)) => {
            let members: Vec<TypeId> = u.members.iter().copied().collect();
            members
                .iter()
                .any(|&m| is_subtype(registry, defs, sub, m))
        }
        (Type::TypeVariable(v), _) => match registry.type_var(*v).upper_bound {
            Some(bound) => is_subtype(registry, defs, bound, sup),
            None => false,
        },
        (Type::Enum { base, .. }, _) => *base == sup,
        _ => false,
    }
}

/// Find the closest type both inputs are subtypes of.
///
/// Used when folding LOWER_BOUND constraints: the solution must be a
/// supertype of every lower bound. For composites this walks the first
/// input's ancestor list in breadth-first order; for sized numerics it
/// picks the wider of two same-signedness integers or the wider float.
pub fn common_base(
    registry: &TypeRegistry,
    defs: &DefGraph,
    a: TypeId,
    b: TypeId,
) -> Option<TypeId> {
    let a = deref(registry, defs, a);
    let b = deref(registry, defs, b);
    if is_subtype(registry, defs, a, b) {
        return Some(b);
    }
    if is_subtype(registry, defs, b, a) {
        return Some(a);
    }

    if a.is_signed_int() && b.is_signed_int() || a.is_unsigned_int() && b.is_unsigned_int() {
        return Some(if a.integer_bit_width() >= b.integer_bit_width() {
            a
        } else {
            b
        });
    }
    if a.is_float() && b.is_float() {
        return Some(TypeId::DOUBLE);
    }
    if a == TypeId::UNSIZED_INT && b.is_integer() {
        return Some(b);
    }
    if b == TypeId::UNSIZED_INT && a.is_integer() {
        return Some(a);
    }

    for ancestor in ancestors(registry, defs, a) {
        if is_subtype(registry, defs, b, ancestor) {
            return Some(ancestor);
        }
    }
    None
}

/// True when the composite is an interface.
pub fn is_interface(registry: &TypeRegistry, ty: TypeId) -> bool {
    matches!(
        registry.as_composite(ty),
        Some((CompositeKind::Interface, _))
    )
}

/// The defining definition of a nominal type, if it has one.
pub fn defining_defn(registry: &TypeRegistry, ty: TypeId) -> Option<DefnId> {
    match registry.get(ty) {
        Type::Composite { defn, .. } | Type::Enum { defn, .. } | Type::Alias { defn } => {
            Some(*defn)
        }
        Type::TypeVariable(v) => Some(registry.type_var(*v).template),
        _ => None,
    }
}
