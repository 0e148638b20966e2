// tests/type_semantics.rs
//
// End-to-end type construction: union canonicalisation and layout through
// the analyzer, template instantiation identity, linkage-name stability.

mod common;

use common::{analyzer, syms, AstBuilder};
use quill_ast::Declaration;
use quill_sema::types::{defn_linkage_name, plan_union_layout, relation};
use quill_sema::{AnalysisTask, TypeId, UnionShape};

#[test]
fn union_of_references_and_null_canonicalises() {
    let mut an = analyzer();
    let mut ast = AstBuilder::new();
    let module = ast.module("main", Vec::new());
    let module_defn = an.add_module(&module);

    let string_sym = an.ctx.interner.intern("String");
    let object_sym = an.ctx.interner.intern("Object");

    // Written as `String or Object or Null`.
    let string_ref = ast.ident(string_sym);
    let object_ref = ast.ident(object_sym);
    let string_ty = an.type_in_module(module_defn, &string_ref);
    let object_ty = an.type_in_module(module_defn, &object_ref);
    assert!(!string_ty.is_bad());
    assert!(!object_ty.is_bad());

    // String <: Object, so the union collapses to Object | Null.
    let u = an
        .ctx
        .registry
        .union(&an.ctx.defs, vec![string_ty, object_ty, TypeId::NULL]);
    let data = an.ctx.registry.as_union(u).expect("union");
    assert_eq!(data.members.as_slice(), &[object_ty, TypeId::NULL]);
    assert!(data.has_null);
    assert_eq!(data.num_reference, 1);

    // Reference members plus Null: represented as a bare pointer.
    let layout = plan_union_layout(&an.ctx.registry, &an.ctx.defs, u).unwrap();
    assert_eq!(layout.shape, UnionShape::Pointer);
    assert_eq!(layout.discriminator_bits, None);
}

#[test]
fn union_of_unrelated_references_stays_wide() {
    let mut an = analyzer();
    let [a_sym, b_sym] = syms(&mut an, ["Alpha", "Beta"]);
    let mut ast = AstBuilder::new();
    let a_decl = ast.class(a_sym, Vec::new(), Vec::new());
    let b_decl = ast.class(b_sym, Vec::new(), Vec::new());
    let module = ast.module(
        "main",
        vec![Declaration::Type(a_decl), Declaration::Type(b_decl)],
    );
    let module_defn = an.add_module(&module);

    let a_ident = ast.ident(a_sym);
    let b_ident = ast.ident(b_sym);
    let union_expr = ast.union_of(vec![a_ident, b_ident]);
    let u = an.type_in_module(module_defn, &union_expr);

    let data = an.ctx.registry.as_union(u).expect("two unrelated classes");
    assert_eq!(data.num_reference, 2);
    assert!(data.has_ref_types_only());

    let layout = plan_union_layout(&an.ctx.registry, &an.ctx.defs, u).unwrap();
    assert_eq!(layout.shape, UnionShape::Pointer);
}

#[test]
fn mixed_union_gets_discriminator_and_largest_member() {
    let mut an = analyzer();
    let mut ast = AstBuilder::new();
    let module = ast.module("main", Vec::new());
    let module_defn = an.add_module(&module);

    let int32 = an.ctx.interner.intern("int32");
    let double = an.ctx.interner.intern("double");
    let i = ast.ident(int32);
    let d = ast.ident(double);
    let union_expr = ast.union_of(vec![i, d]);
    let u = an.type_in_module(module_defn, &union_expr);

    let layout = plan_union_layout(&an.ctx.registry, &an.ctx.defs, u).unwrap();
    assert_eq!(layout.shape, UnionShape::Discriminated);
    assert_eq!(layout.discriminator_bits, Some(1));
    assert_eq!(layout.largest_member, Some(TypeId::DOUBLE));
}

#[test]
fn array_instantiation_returns_cached_definition() {
    let mut an = analyzer();
    let mut ast = AstBuilder::new();
    let module = ast.module("main", Vec::new());
    let module_defn = an.add_module(&module);

    let array_sym = an.ctx.interner.intern("Array");
    let int32_sym = an.ctx.interner.intern("int32");

    let base = ast.ident(array_sym);
    let arg = ast.ident(int32_sym);
    let spec = ast.specialize(base, vec![arg]);
    let first = an.type_in_module(module_defn, &spec);
    assert!(!first.is_bad());

    let base = ast.ident(array_sym);
    let arg = ast.ident(int32_sym);
    let spec = ast.specialize(base, vec![arg]);
    let second = an.type_in_module(module_defn, &spec);

    // Equal environments yield the identical definition handle.
    assert_eq!(first, second);

    let (_, instance_defn) = an.ctx.registry.as_composite(first).expect("composite");
    let record = an
        .ctx
        .defs
        .get(instance_defn)
        .template_instance
        .as_ref()
        .expect("instance record");
    assert_eq!(record.args.as_slice(), &[TypeId::INT32]);

    // Linkage name embeds the bracketed argument and is stable.
    let name = defn_linkage_name(
        &an.ctx.registry,
        &an.ctx.defs,
        &an.ctx.interner,
        &an.ctx.names,
        instance_defn,
    );
    assert_eq!(name, "Array[int32]");
    let again = defn_linkage_name(
        &an.ctx.registry,
        &an.ctx.defs,
        &an.ctx.interner,
        &an.ctx.names,
        instance_defn,
    );
    assert_eq!(name, again);

    // The element_type member resolved to the bound argument.
    let scope = an.ctx.defs.member_scope(instance_defn).unwrap();
    let elem_sym = an.ctx.interner.intern("element_type");
    let members = an.ctx.scopes.get(scope).get(elem_sym).to_vec();
    assert_eq!(members.len(), 1);
    assert_eq!(an.ctx.defs.value_type(members[0]), Some(TypeId::INT32));
}

#[test]
fn array_sugar_matches_explicit_specialization() {
    let mut an = analyzer();
    let mut ast = AstBuilder::new();
    let module = ast.module("main", Vec::new());
    let module_defn = an.add_module(&module);

    let array_sym = an.ctx.interner.intern("Array");
    let int32_sym = an.ctx.interner.intern("int32");

    let elem = ast.ident(int32_sym);
    let sugar = ast.node(quill_ast::NodeKind::Array(elem));
    let sugared = an.type_in_module(module_defn, &sugar);

    let base = ast.ident(array_sym);
    let arg = ast.ident(int32_sym);
    let spec = ast.specialize(base, vec![arg]);
    let explicit = an.type_in_module(module_defn, &spec);

    assert_eq!(sugared, explicit);
}

#[test]
fn distinct_arguments_make_distinct_instances() {
    let mut an = analyzer();
    let mut ast = AstBuilder::new();
    let module = ast.module("main", Vec::new());
    let module_defn = an.add_module(&module);

    let array_sym = an.ctx.interner.intern("Array");
    let int32_sym = an.ctx.interner.intern("int32");
    let double_sym = an.ctx.interner.intern("double");

    let base = ast.ident(array_sym);
    let arg = ast.ident(int32_sym);
    let spec = ast.specialize(base, vec![arg]);
    let of_int = an.type_in_module(module_defn, &spec);

    let base = ast.ident(array_sym);
    let arg = ast.ident(double_sym);
    let spec = ast.specialize(base, vec![arg]);
    let of_double = an.type_in_module(module_defn, &spec);

    assert_ne!(of_int, of_double);
}

#[test]
fn unresolved_names_yield_bad_and_a_diagnostic() {
    let mut an = analyzer();
    let mut ast = AstBuilder::new();
    let module = ast.module("main", Vec::new());
    let module_defn = an.add_module(&module);

    let ghost = an.ctx.interner.intern("Ghost");
    let node = ast.ident(ghost);
    let ty = an.type_in_module(module_defn, &node);
    assert!(ty.is_bad());
    assert!(an.ctx.diagnostics.has_errors());

    // Downstream constructions stay analyzable: Bad propagates quietly.
    let u = an.ctx.registry.union(&an.ctx.defs, vec![ty, TypeId::INT32]);
    assert!(u.is_bad());
}

#[test]
fn subtype_relation_follows_base_chain() {
    let mut an = analyzer();
    let [animal_sym, cat_sym] = syms(&mut an, ["Animal", "Cat"]);
    let mut ast = AstBuilder::new();
    let animal_decl = ast.class(animal_sym, Vec::new(), Vec::new());
    let animal_ref = ast.ident(animal_sym);
    let cat_decl = ast.class(cat_sym, vec![animal_ref], Vec::new());
    let module = ast.module(
        "main",
        vec![
            Declaration::Type(animal_decl),
            Declaration::Type(cat_decl),
        ],
    );
    let module_defn = an.add_module(&module);

    let cat_ident = ast.ident(cat_sym);
    let cat_defn = an.resolve_in_module(module_defn, &cat_ident)[0];
    an.prepare(cat_defn, AnalysisTask::PrepTypeComparison);

    let animal_ident = ast.ident(animal_sym);
    let animal_ty = an.type_in_module(module_defn, &animal_ident);
    let cat_ident = ast.ident(cat_sym);
    let cat_ty = an.type_in_module(module_defn, &cat_ident);

    assert!(relation::is_subtype(
        &an.ctx.registry,
        &an.ctx.defs,
        cat_ty,
        animal_ty
    ));
    assert!(!relation::is_subtype(
        &an.ctx.registry,
        &an.ctx.defs,
        animal_ty,
        cat_ty
    ));
    // Everything derives Object.
    assert!(relation::is_subtype(
        &an.ctx.registry,
        &an.ctx.defs,
        cat_ty,
        an.ctx.builtins.object_type
    ));
}
