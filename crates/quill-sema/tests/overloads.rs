// tests/overloads.rs
//
// Overload resolution through the analyzer: rank-based selection,
// ambiguity and no-match diagnostics.

mod common;

use common::{analyzer, syms, AstBuilder};
use quill_ast::Declaration;
use quill_identity::Span;
use quill_sema::{SemanticError, TypeId};

#[test]
fn best_conversion_rank_selects_the_overload() {
    let mut an = analyzer();
    let [f_sym, x_sym] = syms(&mut an, ["f", "x"]);
    let mut ast = AstBuilder::new();
    let int64 = an.ctx.interner.intern("int64");
    let int16 = an.ctx.interner.intern("int16");

    let wide_ty = ast.ident(int64);
    let wide = ast.method(f_sym, vec![(x_sym, wide_ty)], None, true);
    let narrow_ty = ast.ident(int16);
    let narrow = ast.method(f_sym, vec![(x_sym, narrow_ty)], None, true);
    let module = ast.module(
        "main",
        vec![Declaration::Function(wide), Declaration::Function(narrow)],
    );
    let module_defn = an.add_module(&module);

    let f_ident = ast.ident(f_sym);
    let candidates = an.resolve_in_module(module_defn, &f_ident);
    assert_eq!(candidates.len(), 2);

    // int32 widens exactly into int64 but truncates into int16.
    let selected = an
        .resolve_overloaded_call("f", &candidates, &[TypeId::INT32], Span::default())
        .expect("one best overload");
    let sig = an.ctx.defs.function_type(selected).unwrap();
    let params = an.ctx.registry.as_function(sig).unwrap().param_types();
    assert_eq!(params.as_slice(), &[TypeId::INT64]);
    assert!(!an.ctx.diagnostics.has_errors());
}

#[test]
fn identical_argument_beats_widening() {
    let mut an = analyzer();
    let [f_sym, x_sym] = syms(&mut an, ["f", "x"]);
    let mut ast = AstBuilder::new();
    let int32 = an.ctx.interner.intern("int32");
    let int64 = an.ctx.interner.intern("int64");

    let exact_ty = ast.ident(int32);
    let exact = ast.method(f_sym, vec![(x_sym, exact_ty)], None, true);
    let wide_ty = ast.ident(int64);
    let wide = ast.method(f_sym, vec![(x_sym, wide_ty)], None, true);
    let module = ast.module(
        "main",
        vec![Declaration::Function(exact), Declaration::Function(wide)],
    );
    let module_defn = an.add_module(&module);

    let f_ident = ast.ident(f_sym);
    let candidates = an.resolve_in_module(module_defn, &f_ident);
    let selected = an
        .resolve_overloaded_call("f", &candidates, &[TypeId::INT32], Span::default())
        .expect("identical parameter wins");
    let sig = an.ctx.defs.function_type(selected).unwrap();
    let params = an.ctx.registry.as_function(sig).unwrap().param_types();
    assert_eq!(params.as_slice(), &[TypeId::INT32]);
}

#[test]
fn equal_ranks_are_ambiguous() {
    let mut an = analyzer();
    let [f_sym, x_sym] = syms(&mut an, ["f", "x"]);
    let mut ast = AstBuilder::new();
    let int64 = an.ctx.interner.intern("int64");
    let double = an.ctx.interner.intern("double");

    let a_ty = ast.ident(int64);
    let a = ast.method(f_sym, vec![(x_sym, a_ty)], None, true);
    let b_ty = ast.ident(double);
    let b = ast.method(f_sym, vec![(x_sym, b_ty)], None, true);
    let module = ast.module(
        "main",
        vec![Declaration::Function(a), Declaration::Function(b)],
    );
    let module_defn = an.add_module(&module);

    let f_ident = ast.ident(f_sym);
    let candidates = an.resolve_in_module(module_defn, &f_ident);
    // int16 converts exactly into both int64 and double.
    let selected =
        an.resolve_overloaded_call("f", &candidates, &[TypeId::INT16], Span::default());
    assert!(selected.is_none());
    assert!(an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .any(|d| matches!(d.error, SemanticError::AmbiguousCall { .. })));
}

#[test]
fn incompatible_arguments_report_no_match() {
    let mut an = analyzer();
    let [f_sym, x_sym] = syms(&mut an, ["f", "x"]);
    let mut ast = AstBuilder::new();
    let bool_sym = an.ctx.interner.intern("bool");

    let ty = ast.ident(bool_sym);
    let only = ast.method(f_sym, vec![(x_sym, ty)], None, true);
    let module = ast.module("main", vec![Declaration::Function(only)]);
    let module_defn = an.add_module(&module);

    let f_ident = ast.ident(f_sym);
    let candidates = an.resolve_in_module(module_defn, &f_ident);
    let selected =
        an.resolve_overloaded_call("f", &candidates, &[TypeId::DOUBLE], Span::default());
    assert!(selected.is_none());
    assert!(an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .any(|d| matches!(d.error, SemanticError::ConversionError { .. })));
}

#[test]
fn wrong_arity_candidates_drop_out() {
    let mut an = analyzer();
    let [f_sym, x_sym, y_sym] = syms(&mut an, ["f", "x", "y"]);
    let mut ast = AstBuilder::new();
    let int32 = an.ctx.interner.intern("int32");

    let one_ty = ast.ident(int32);
    let one = ast.method(f_sym, vec![(x_sym, one_ty)], None, true);
    let two_x = ast.ident(int32);
    let two_y = ast.ident(int32);
    let two = ast.method(f_sym, vec![(x_sym, two_x), (y_sym, two_y)], None, true);
    let module = ast.module(
        "main",
        vec![Declaration::Function(one), Declaration::Function(two)],
    );
    let module_defn = an.add_module(&module);

    let f_ident = ast.ident(f_sym);
    let candidates = an.resolve_in_module(module_defn, &f_ident);
    let selected = an
        .resolve_overloaded_call(
            "f",
            &candidates,
            &[TypeId::INT32, TypeId::INT32],
            Span::default(),
        )
        .expect("only the two-parameter overload fits");
    let sig = an.ctx.defs.function_type(selected).unwrap();
    let params = an.ctx.registry.as_function(sig).unwrap().param_types();
    assert_eq!(params.len(), 2);
}
