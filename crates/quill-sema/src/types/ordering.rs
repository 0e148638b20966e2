// types/ordering.rs
//
// The lexical type ordering used for union canonicalisation. Union member
// lists are sorted with this key, which makes union identity independent
// of the order members were written in source.

use super::registry::TypeRegistry;
use super::ty::Type;
use super::type_id::TypeId;

/// Stable sort key for union members.
///
/// Category first (value types before reference types before the Null and
/// Void sentinels), then a deterministic discriminator within the
/// category. Nominal types order by their defining definition's index so
/// the ordering does not depend on interning order of unrelated types.
pub fn union_sort_key(registry: &TypeRegistry, ty: TypeId) -> (u32, u64) {
    match registry.get(ty) {
        Type::Primitive(_) => {
            if ty.is_void() {
                (90, 0)
            } else if ty.is_null() {
                (91, 0)
            } else {
                (0, ty.index() as u64)
            }
        }
        Type::Enum { defn, .. } => (10, defn.index() as u64),
        Type::Tuple(_) => (20, ty.index() as u64),
        Type::NativeArray { .. } => (25, ty.index() as u64),
        Type::Function(_) => (30, ty.index() as u64),
        Type::Address(_) => (35, ty.index() as u64),
        Type::TypeLiteral(_) => (40, ty.index() as u64),
        Type::Composite { defn, .. } => (50, defn.index() as u64),
        Type::Alias { defn } => (55, defn.index() as u64),
        Type::TypeVariable(_) | Type::Assignment(_) => (60, ty.index() as u64),
        // Unions are flattened before sorting; treat defensively anyway.
        Type::Union(_) => (70, ty.index() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_sort_before_sentinels() {
        let registry = TypeRegistry::new();
        let int_key = union_sort_key(&registry, TypeId::INT32);
        let null_key = union_sort_key(&registry, TypeId::NULL);
        let void_key = union_sort_key(&registry, TypeId::VOID);
        assert!(int_key < void_key);
        assert!(void_key < null_key);
    }
}
