// types/tests.rs
//
// Registry-level invariants: interning identity, union canonicalisation
// algebra, alias dereferencing.

use quill_identity::{DefnId, ModuleId, Span, Symbol};
use smallvec::smallvec;

use crate::defs::{
    CompositeInfo, DefGraph, Defn, DefnDetail, DefnKind, StorageClass, Traits, TypeDefData,
    Visibility,
};
use crate::passes::PassState;

use super::*;

fn type_defn(defs: &mut DefGraph, name: u32, bases: Vec<TypeId>) -> DefnId {
    defs.alloc(|id| Defn {
        id,
        kind: DefnKind::TypeDef,
        name: Symbol::new_for_test(name),
        module: ModuleId::default(),
        parent: None,
        span: Span::default(),
        traits: Traits::default().with(Traits::SINGULAR),
        visibility: Visibility::Public,
        storage: StorageClass::Global,
        ast: None,
        attributes: Vec::new(),
        passes: PassState::new(),
        template: None,
        template_instance: None,
        linkage_name: None,
        detail: DefnDetail::Type(TypeDefData {
            ty: None,
            scope: None,
            composite: Some(CompositeInfo {
                bases,
                ..CompositeInfo::default()
            }),
            aliased: None,
        }),
    })
}

fn make_class(defs: &mut DefGraph, registry: &mut TypeRegistry, name: u32, bases: Vec<TypeId>) -> TypeId {
    let defn = type_defn(defs, name, bases);
    let ty = registry.composite(CompositeKind::Class, defn);
    defs.get_mut(defn).as_type_mut().unwrap().ty = Some(ty);
    ty
}

#[test]
fn structural_interning_returns_same_handle() {
    let mut registry = TypeRegistry::new();
    let t1 = registry.tuple(smallvec![TypeId::INT32, TypeId::BOOL]);
    let t2 = registry.tuple(smallvec![TypeId::INT32, TypeId::BOOL]);
    let t3 = registry.tuple(smallvec![TypeId::BOOL, TypeId::INT32]);
    assert_eq!(t1, t2);
    assert_ne!(t1, t3);

    let a1 = registry.address(TypeId::INT8);
    let a2 = registry.address(TypeId::INT8);
    assert_eq!(a1, a2);

    let n1 = registry.native_array(TypeId::CHAR, 16);
    let n2 = registry.native_array(TypeId::CHAR, 16);
    let n3 = registry.native_array(TypeId::CHAR, 17);
    assert_eq!(n1, n2);
    assert_ne!(n1, n3);
}

#[test]
fn function_types_intern_by_signature() {
    let mut registry = TypeRegistry::new();
    let sig = |is_static: bool| FunctionSignature {
        params: smallvec![ParamSig::positional(None, TypeId::INT32)],
        return_type: TypeId::BOOL,
        self_param: None,
        is_static,
    };
    let f1 = registry.function(sig(false));
    let f2 = registry.function(sig(false));
    let f3 = registry.function(sig(true));
    assert_eq!(f1, f2);
    // The static flag is part of the signature tuple.
    assert_ne!(f1, f3);
}

#[test]
fn type_variables_are_identity_interned() {
    let mut defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let owner = type_defn(&mut defs, 1, Vec::new());
    let name = Symbol::new_for_test(7);
    let v1 = registry.type_variable(owner, name);
    let v2 = registry.type_variable(owner, name);
    assert_ne!(v1, v2);
}

#[test]
fn union_is_idempotent() {
    let defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let u = registry.union(&defs, vec![TypeId::INT32, TypeId::INT32]);
    assert_eq!(u, TypeId::INT32);
}

#[test]
fn union_is_commutative() {
    let defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let ab = registry.union(&defs, vec![TypeId::INT32, TypeId::BOOL]);
    let ba = registry.union(&defs, vec![TypeId::BOOL, TypeId::INT32]);
    assert_eq!(ab, ba);
}

#[test]
fn union_is_associative_through_flattening() {
    let defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let ab = registry.union(&defs, vec![TypeId::INT32, TypeId::BOOL]);
    let ab_c = registry.union(&defs, vec![ab, TypeId::DOUBLE]);
    let abc = registry.union(&defs, vec![TypeId::INT32, TypeId::BOOL, TypeId::DOUBLE]);
    assert_eq!(ab_c, abc);
}

#[test]
fn union_drops_subsumed_members() {
    let mut defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let base = make_class(&mut defs, &mut registry, 1, Vec::new());
    let derived = make_class(&mut defs, &mut registry, 2, vec![base]);

    // Derived is a subtype of Base, so the union collapses to Base.
    let u = registry.union(&defs, vec![derived, base]);
    assert_eq!(u, base);
    let u = registry.union(&defs, vec![base, derived]);
    assert_eq!(u, base);
}

#[test]
fn union_counts_categories() {
    let mut defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let object = make_class(&mut defs, &mut registry, 1, Vec::new());
    let string = make_class(&mut defs, &mut registry, 2, vec![object]);

    // Two unrelated-by-subtyping references plus Null.
    let other = make_class(&mut defs, &mut registry, 3, Vec::new());
    let u = registry.union(&defs, vec![string, other, TypeId::NULL]);
    let data = registry.as_union(u).expect("union");
    assert_eq!(data.num_reference, 2);
    assert!(data.has_null);
    assert!(!data.has_void);
    assert_eq!(data.num_value, 0);
    assert_eq!(
        data.num_value as usize
            + data.num_reference as usize
            + usize::from(data.has_void)
            + usize::from(data.has_null),
        data.members.len()
    );
    // Reference-only plus Null keeps the bare-pointer representation.
    assert!(data.has_ref_types_only());
}

#[test]
fn union_sorts_members_canonically() {
    let mut defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let object = make_class(&mut defs, &mut registry, 1, Vec::new());
    let string = make_class(&mut defs, &mut registry, 2, Vec::new());

    // Written as String | Object | Null; canonical order puts Object
    // (earlier definition) first and Null last.
    let u = registry.union(&defs, vec![string, object, TypeId::NULL]);
    let data = registry.as_union(u).expect("union");
    let members: Vec<TypeId> = data.members.iter().copied().collect();
    assert_eq!(members, vec![object, string, TypeId::NULL]);
}

#[test]
fn deref_follows_alias_chain() {
    let mut defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let alias_defn = defs.alloc(|id| Defn {
        id,
        kind: DefnKind::TypeDef,
        name: Symbol::new_for_test(5),
        module: ModuleId::default(),
        parent: None,
        span: Span::default(),
        traits: Traits::default(),
        visibility: Visibility::Public,
        storage: StorageClass::Global,
        ast: None,
        attributes: Vec::new(),
        passes: PassState::new(),
        template: None,
        template_instance: None,
        linkage_name: None,
        detail: DefnDetail::Type(TypeDefData {
            ty: None,
            scope: None,
            composite: None,
            aliased: Some(TypeId::INT64),
        }),
    });
    let alias_ty = registry.alias(alias_defn);
    assert_eq!(relation::deref(&registry, &defs, alias_ty), TypeId::INT64);
    assert!(relation::is_equal(&registry, &defs, alias_ty, TypeId::INT64));

    // Unions see through aliases during canonicalisation.
    let u = registry.union(&defs, vec![alias_ty, TypeId::INT64]);
    assert_eq!(u, TypeId::INT64);
}

#[test]
fn singularity_follows_variables() {
    let mut defs = DefGraph::new();
    let mut registry = TypeRegistry::new();
    let owner = type_defn(&mut defs, 1, Vec::new());
    let var = registry.type_variable(owner, Symbol::new_for_test(2));
    assert!(!registry.is_singular(var));

    let arr = registry.native_array(var, 3);
    assert!(!registry.is_singular(arr));
    assert!(registry.is_singular(TypeId::INT32));

    let tup = registry.tuple(smallvec![TypeId::INT32, TypeId::BOOL]);
    assert!(registry.is_singular(tup));
}
