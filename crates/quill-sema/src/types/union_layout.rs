// types/union_layout.rs
//
// Storage planning for union types, independent of target pointer size.
// The plan is computed once per canonical union and handed to the emitter;
// nothing here touches IR.

use crate::defs::DefGraph;

use super::registry::TypeRegistry;
use super::relation;
use super::ty::Type;
use super::type_id::TypeId;

/// Storage category of a planned union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionShape {
    /// All members are reference types (plus optionally Null): the union
    /// IS a bare pointer and member tests are subclass tests.
    Pointer,
    /// A (discriminator, payload) pair.
    Discriminated,
}

/// The emitter-facing layout plan for one union type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionLayout {
    pub shape: UnionShape,
    /// Discriminator width in bits; None for pointer-shaped unions.
    pub discriminator_bits: Option<u8>,
    /// The member whose storage the payload uses; None for pointer shapes.
    pub largest_member: Option<TypeId>,
    /// Large value-type members make the whole union pass by pointer.
    pub large_value: bool,
}

/// Layout planning failure: the largest member differs between pointer
/// widths, so no single plan serves both targets.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LayoutError {
    #[error("union layout differs between 32-bit and 64-bit targets")]
    Conflict {
        largest32: TypeId,
        largest64: TypeId,
    },
    #[error("layout requested for a non-union type")]
    NotAUnion(TypeId),
}

/// Estimated storage of a type as (pointer count, non-pointer bits).
/// Concrete byte sizes follow once a pointer width is chosen.
fn estimate(registry: &TypeRegistry, defs: &DefGraph, ty: TypeId) -> (u64, u64) {
    let ty = relation::deref(registry, defs, ty);
    match registry.get(ty) {
        Type::Primitive(kind) => {
            if ty.is_null() {
                (1, 0)
            } else {
                (0, kind.bit_width() as u64)
            }
        }
        Type::Enum { base, .. } => estimate(registry, defs, *base),
        Type::Composite { kind, defn } => {
            if kind.is_reference() {
                (1, 0)
            } else {
                // Value composites: sum over instance field storage.
                let mut pointers = 0;
                let mut bits = 0;
                if let Some(info) = defs.composite_info(*defn) {
                    for field in info.instance_fields.iter().flatten() {
                        if let Some(field_ty) = defs.value_type(*field) {
                            let (p, b) = estimate(registry, defs, field_ty);
                            pointers += p;
                            bits += b;
                        }
                    }
                }
                (pointers, bits)
            }
        }
        Type::Tuple(members) => {
            let mut pointers = 0;
            let mut bits = 0;
            for &m in members {
                let (p, b) = estimate(registry, defs, m);
                pointers += p;
                bits += b;
            }
            (pointers, bits)
        }
        Type::NativeArray { element, length } => {
            let (p, b) = estimate(registry, defs, *element);
            (p * length, b * length)
        }
        Type::Union(u) => {
            // Nested unions are flattened away during canonicalisation;
            // estimate defensively as discriminator plus widest member.
            let mut pointers = 0;
            let mut bits = 8;
            for &m in &u.members {
                let (p, b) = estimate(registry, defs, m);
                pointers = pointers.max(p);
                bits = bits.max(b);
            }
            (pointers, bits)
        }
        Type::Function(_) | Type::Address(_) | Type::TypeLiteral(_) => (1, 0),
        Type::Alias { .. } | Type::TypeVariable(_) | Type::Assignment(_) => (0, 0),
    }
}

fn size_at(pointers: u64, bits: u64, ptr_bits: u64) -> u64 {
    pointers * ptr_bits + bits
}

/// A member is "large" when it would not travel well in registers.
fn is_large(pointers: u64, bits: u64) -> bool {
    pointers > 2 || bits > 64 || (pointers > 0 && bits > 32)
}

/// Smallest discriminator width that enumerates `states`.
fn discriminator_bits(states: u64) -> u8 {
    if states <= 2 {
        1
    } else if states < 256 {
        8
    } else if states < 0x10000 {
        16
    } else {
        32
    }
}

/// Plan storage for a canonical union.
///
/// The "largest member" is chosen per pointer width; a winner that differs
/// between 32- and 64-bit models is a hard `LayoutError::Conflict` (a
/// future design may instead pick per target).
pub fn plan(
    registry: &TypeRegistry,
    defs: &DefGraph,
    union_ty: TypeId,
) -> Result<UnionLayout, LayoutError> {
    let Some(data) = registry.as_union(union_ty) else {
        return Err(LayoutError::NotAUnion(union_ty));
    };

    if data.has_ref_types_only() {
        // Reference-only unions (with or without Null) are bare pointers,
        // as is the single-reference-or-Null optional.
        return Ok(UnionLayout {
            shape: UnionShape::Pointer,
            discriminator_bits: None,
            largest_member: None,
            large_value: false,
        });
    }

    let members: Vec<TypeId> = data.members.iter().copied().collect();
    let num_value = data.num_value as u64;
    let shared_state =
        data.num_reference > 0 || data.has_void || data.has_null;

    let mut largest32: Option<(TypeId, u64, u64)> = None;
    let mut largest64: Option<(TypeId, u64, u64)> = None;
    let mut large_value = false;

    for &member in &members {
        let (pointers, bits) = estimate(registry, defs, member);
        if is_large(pointers, bits) {
            large_value = true;
        }
        let size32 = size_at(pointers, bits, 32);
        let size64 = size_at(pointers, bits, 64);

        let better32 = match largest32 {
            None => true,
            Some((_, best32, best64)) => size32 > best32 || (size32 == best32 && size64 > best64),
        };
        if better32 {
            largest32 = Some((member, size32, size64));
        }

        let better64 = match largest64 {
            None => true,
            Some((_, best64, best32)) => size64 > best64 || (size64 == best64 && size32 > best32),
        };
        if better64 {
            largest64 = Some((member, size64, size32));
        }
    }

    let largest32 = largest32.map(|(t, ..)| t);
    let largest64 = largest64.map(|(t, ..)| t);
    if largest32 != largest64 {
        return Err(LayoutError::Conflict {
            largest32: largest32.unwrap_or(TypeId::BAD),
            largest64: largest64.unwrap_or(TypeId::BAD),
        });
    }

    let states = num_value + if shared_state { 1 } else { 0 };
    Ok(UnionLayout {
        shape: UnionShape::Discriminated,
        discriminator_bits: Some(discriminator_bits(states)),
        largest_member: largest32,
        large_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (TypeRegistry, DefGraph) {
        (TypeRegistry::new(), DefGraph::new())
    }

    #[test]
    fn value_union_gets_discriminator() {
        let (mut registry, defs) = fixture();
        let u = registry.union(&defs, vec![TypeId::INT32, TypeId::BOOL]);
        let layout = plan(&registry, &defs, u).unwrap();
        assert_eq!(layout.shape, UnionShape::Discriminated);
        // Two states enumerate in one bit.
        assert_eq!(layout.discriminator_bits, Some(1));
        assert_eq!(layout.largest_member, Some(TypeId::INT32));
        assert!(!layout.large_value);
    }

    #[test]
    fn discriminator_width_grows_with_members() {
        let (mut registry, defs) = fixture();
        let u = registry.union(
            &defs,
            vec![TypeId::INT32, TypeId::BOOL, TypeId::DOUBLE, TypeId::CHAR],
        );
        let layout = plan(&registry, &defs, u).unwrap();
        assert_eq!(layout.discriminator_bits, Some(8));
        assert_eq!(layout.largest_member, Some(TypeId::DOUBLE));
    }

    #[test]
    fn value_plus_void_counts_shared_state() {
        let (mut registry, defs) = fixture();
        let u = registry.union(&defs, vec![TypeId::INT64, TypeId::VOID]);
        let layout = plan(&registry, &defs, u).unwrap();
        assert_eq!(layout.shape, UnionShape::Discriminated);
        assert_eq!(layout.discriminator_bits, Some(1));
    }

    #[test]
    fn pointer_sized_members_conflict_across_widths() {
        let (mut registry, defs) = fixture();
        // An address is 32 bits on 32-bit targets but 64 on 64-bit ones.
        // Against a fixed 48-bit member the winner flips between widths.
        let addr = registry.address(TypeId::UINT8);
        let bits48 = registry.native_array(TypeId::INT16, 3);
        let u = registry.union(&defs, vec![addr, bits48]);
        let err = plan(&registry, &defs, u).unwrap_err();
        assert!(matches!(err, LayoutError::Conflict { .. }));
    }

    #[test]
    fn large_member_marks_union_large() {
        let (mut registry, defs) = fixture();
        let big = registry.native_array(TypeId::INT64, 4);
        let u = registry.union(&defs, vec![big, TypeId::INT32]);
        let layout = plan(&registry, &defs, u).unwrap();
        assert!(layout.large_value);
        assert_eq!(layout.largest_member, Some(big));
    }
}
