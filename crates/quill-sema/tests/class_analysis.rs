// tests/class_analysis.rs
//
// End-to-end scenarios driven through the public analyzer API: base
// placement, override detection, required-method checking and default
// constructor synthesis.

mod common;

use common::{analyzer, syms, AstBuilder};
use quill_ast::{Declaration, Modifiers, TypeDeclKind};
use quill_sema::defs::DefnKind;
use quill_sema::ir::ExprKind;
use quill_sema::{AnalysisTask, SemanticError};

#[test]
fn primary_base_moves_to_front() {
    let mut an = analyzer();
    let [i_sym, b_sym, a_sym] = syms(&mut an, ["I", "B", "A"]);
    let mut ast = AstBuilder::new();

    let i_decl = ast.type_decl(TypeDeclKind::Interface, i_sym, Vec::new(), Vec::new());
    let b_decl = ast.class(b_sym, Vec::new(), Vec::new());
    let i_base = ast.ident(i_sym);
    let b_base = ast.ident(b_sym);
    // A declares bases [I, B]; B is the concrete one.
    let a_decl = ast.class(a_sym, vec![i_base, b_base], Vec::new());

    let module = ast.module(
        "main",
        vec![
            Declaration::Type(i_decl),
            Declaration::Type(b_decl),
            Declaration::Type(a_decl),
        ],
    );
    let module_defn = an.add_module(&module);

    let a_ident = ast.ident(a_sym);
    let candidates = an.resolve_in_module(module_defn, &a_ident);
    assert_eq!(candidates.len(), 1);
    let a_defn = candidates[0];
    assert!(an.prepare(a_defn, AnalysisTask::PrepTypeComparison));

    let b_ident = ast.ident(b_sym);
    let b_ty = an.type_in_module(module_defn, &b_ident);
    let i_ident = ast.ident(i_sym);
    let i_ty = an.type_in_module(module_defn, &i_ident);

    let info = an.ctx.defs.composite_info(a_defn).unwrap();
    assert_eq!(info.primary_base, Some(b_ty));
    assert_eq!(info.bases, vec![b_ty, i_ty]);
    assert!(!an.ctx.diagnostics.has_errors());
}

#[test]
fn class_without_class_base_derives_object() {
    let mut an = analyzer();
    let [a_sym] = syms(&mut an, ["A"]);
    let mut ast = AstBuilder::new();
    let a_decl = ast.class(a_sym, Vec::new(), Vec::new());
    let module = ast.module("main", vec![Declaration::Type(a_decl)]);
    let module_defn = an.add_module(&module);

    let a_ident = ast.ident(a_sym);
    let a_defn = an.resolve_in_module(module_defn, &a_ident)[0];
    an.prepare(a_defn, AnalysisTask::PrepTypeComparison);

    let object = an.ctx.builtins.object_type;
    let info = an.ctx.defs.composite_info(a_defn).unwrap();
    assert_eq!(info.primary_base, Some(object));
    assert_eq!(info.bases, vec![object]);
}

#[test]
fn circular_inheritance_is_diagnosed() {
    let mut an = analyzer();
    let [a_sym, b_sym] = syms(&mut an, ["A", "B"]);
    let mut ast = AstBuilder::new();
    let b_base = ast.ident(b_sym);
    let a_decl = ast.class(a_sym, vec![b_base], Vec::new());
    let a_base = ast.ident(a_sym);
    let b_decl = ast.class(b_sym, vec![a_base], Vec::new());
    let module = ast.module(
        "main",
        vec![Declaration::Type(a_decl), Declaration::Type(b_decl)],
    );
    let module_defn = an.add_module(&module);

    let a_ident = ast.ident(a_sym);
    let a_defn = an.resolve_in_module(module_defn, &a_ident)[0];
    an.prepare(a_defn, AnalysisTask::PrepTypeComparison);

    assert!(an.ctx.diagnostics.has_errors());
    assert!(an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .any(|d| matches!(d.error, SemanticError::CircularDependency { .. })));
}

#[test]
fn override_replaces_base_slot() {
    let mut an = analyzer();
    let [base_sym, derived_sym, f_sym, x_sym] = syms(&mut an, ["Base", "Derived", "f", "x"]);
    let mut ast = AstBuilder::new();

    let int32 = an.ctx.interner.intern("int32");
    let param_ty = ast.ident(int32);
    let ret_ty = ast.ident(int32);
    let base_f = ast.method(f_sym, vec![(x_sym, param_ty)], Some(ret_ty), true);
    let base_decl = ast.class(base_sym, Vec::new(), vec![Declaration::Function(base_f)]);

    let param_ty = ast.ident(int32);
    let ret_ty = ast.ident(int32);
    let mut derived_f = ast.method(f_sym, vec![(x_sym, param_ty)], Some(ret_ty), true);
    derived_f.modifiers = Modifiers::default().with(Modifiers::OVERRIDE);
    let base_ref = ast.ident(base_sym);
    let derived_decl = ast.class(
        derived_sym,
        vec![base_ref],
        vec![Declaration::Function(derived_f)],
    );

    let module = ast.module(
        "main",
        vec![
            Declaration::Type(base_decl),
            Declaration::Type(derived_decl),
        ],
    );
    let module_defn = an.add_module(&module);

    let base_ident = ast.ident(base_sym);
    let base_defn = an.resolve_in_module(module_defn, &base_ident)[0];
    let derived_ident = ast.ident(derived_sym);
    let derived_defn = an.resolve_in_module(module_defn, &derived_ident)[0];

    assert!(an.prepare(derived_defn, AnalysisTask::PrepEvaluation));
    assert!(!an.ctx.diagnostics.has_errors());

    let base_info = an.ctx.defs.composite_info(base_defn).unwrap();
    let derived_info = an.ctx.defs.composite_info(derived_defn).unwrap();
    assert_eq!(
        base_info.instance_methods.len(),
        derived_info.instance_methods.len()
    );

    let base_f_defn = base_info.instance_methods[0];
    let derived_f_defn = derived_info.instance_methods[0];
    assert_ne!(base_f_defn, derived_f_defn);
    assert_eq!(an.ctx.defs.get(derived_f_defn).name, f_sym);

    // Dispatch indices line up, and the override relation is recorded.
    let base_index = an
        .ctx
        .defs
        .get(base_f_defn)
        .as_function()
        .unwrap()
        .dispatch_index;
    let derived_index = an
        .ctx
        .defs
        .get(derived_f_defn)
        .as_function()
        .unwrap()
        .dispatch_index;
    assert_eq!(base_index, 0);
    assert_eq!(derived_index, 0);
    assert_eq!(
        an.ctx
            .defs
            .get(derived_f_defn)
            .as_function()
            .unwrap()
            .overridden,
        vec![base_f_defn]
    );
}

#[test]
fn override_without_modifier_warns() {
    let mut an = analyzer();
    let [base_sym, derived_sym, f_sym, x_sym] = syms(&mut an, ["Base", "Derived", "f", "x"]);
    let mut ast = AstBuilder::new();
    let int32 = an.ctx.interner.intern("int32");

    let param_ty = ast.ident(int32);
    let base_f = ast.method(f_sym, vec![(x_sym, param_ty)], None, true);
    let base_decl = ast.class(base_sym, Vec::new(), vec![Declaration::Function(base_f)]);

    let param_ty = ast.ident(int32);
    let derived_f = ast.method(f_sym, vec![(x_sym, param_ty)], None, true);
    let base_ref = ast.ident(base_sym);
    let derived_decl = ast.class(
        derived_sym,
        vec![base_ref],
        vec![Declaration::Function(derived_f)],
    );

    let module = ast.module(
        "main",
        vec![
            Declaration::Type(base_decl),
            Declaration::Type(derived_decl),
        ],
    );
    let module_defn = an.add_module(&module);
    let derived_ident = ast.ident(derived_sym);
    let derived_defn = an.resolve_in_module(module_defn, &derived_ident)[0];
    an.prepare(derived_defn, AnalysisTask::PrepEvaluation);

    assert!(an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .any(|d| matches!(d.error, SemanticError::MissingOverrideModifier { .. })));
}

#[test]
fn missing_interface_implementation_is_reported() {
    let mut an = analyzer();
    let [i_sym, c_sym, g_sym] = syms(&mut an, ["I", "C", "g"]);
    let mut ast = AstBuilder::new();

    // interface I { def g() -> void }  (no body)
    let g_decl = ast.method(g_sym, Vec::new(), None, false);
    let i_decl = ast.type_decl(
        TypeDeclKind::Interface,
        i_sym,
        Vec::new(),
        vec![Declaration::Function(g_decl)],
    );
    // class C bases [I], provides no g.
    let i_ref = ast.ident(i_sym);
    let c_decl = ast.class(c_sym, vec![i_ref], Vec::new());

    let module = ast.module(
        "main",
        vec![Declaration::Type(i_decl), Declaration::Type(c_decl)],
    );
    let module_defn = an.add_module(&module);
    let c_ident = ast.ident(c_sym);
    let c_defn = an.resolve_in_module(module_defn, &c_ident)[0];

    assert!(!an.prepare(c_defn, AnalysisTask::PrepEvaluation));
    let missing: Vec<&SemanticError> = an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .map(|d| &d.error)
        .filter(|e| matches!(e, SemanticError::MissingImplementation { .. }))
        .collect();
    assert_eq!(missing.len(), 1);
    if let SemanticError::MissingImplementation { method, .. } = missing[0] {
        assert_eq!(method, "g");
    }

    // The dispatch table for I still parallels I's method list.
    let info = an.ctx.defs.composite_info(c_defn).unwrap();
    assert_eq!(info.interfaces.len(), 1);
    assert_eq!(info.interfaces[0].methods.len(), 1);
}

#[test]
fn implemented_interface_passes_required_check() {
    let mut an = analyzer();
    let [i_sym, c_sym, g_sym] = syms(&mut an, ["I", "C", "g"]);
    let mut ast = AstBuilder::new();

    let g_abstract = ast.method(g_sym, Vec::new(), None, false);
    let i_decl = ast.type_decl(
        TypeDeclKind::Interface,
        i_sym,
        Vec::new(),
        vec![Declaration::Function(g_abstract)],
    );
    let g_impl = ast.method(g_sym, Vec::new(), None, true);
    let i_ref = ast.ident(i_sym);
    let c_decl = ast.class(c_sym, vec![i_ref], vec![Declaration::Function(g_impl)]);

    let module = ast.module(
        "main",
        vec![Declaration::Type(i_decl), Declaration::Type(c_decl)],
    );
    let module_defn = an.add_module(&module);
    let c_ident = ast.ident(c_sym);
    let c_defn = an.resolve_in_module(module_defn, &c_ident)[0];

    assert!(an.prepare(c_defn, AnalysisTask::PrepEvaluation));
    assert!(!an.ctx.diagnostics.has_errors());

    // The itable slot now points at C's g.
    let info = an.ctx.defs.composite_info(c_defn).unwrap();
    let slot = info.interfaces[0].methods[0];
    assert_eq!(an.ctx.defs.get(slot).name, g_sym);
    let parent = an.ctx.defs.get(slot).parent.unwrap();
    assert_eq!(parent, c_defn);
}

#[test]
fn default_constructor_synthesis_orders_parameters() {
    let mut an = analyzer();
    let [p_sym, x_sym, y_sym] = syms(&mut an, ["P", "x", "y"]);
    let mut ast = AstBuilder::new();
    let int32 = an.ctx.interner.intern("int32");

    // struct P { var x: int32; var y: int32 = 0 }
    let x_ty = ast.ident(int32);
    let x_decl = ast.var(x_sym, x_ty, None);
    let y_ty = ast.ident(int32);
    let zero = ast.int_lit(0);
    let y_decl = ast.var(y_sym, y_ty, Some(zero));
    let p_decl = ast.type_decl(
        TypeDeclKind::Struct,
        p_sym,
        Vec::new(),
        vec![Declaration::Var(x_decl), Declaration::Var(y_decl)],
    );

    let module = ast.module("main", vec![Declaration::Type(p_decl)]);
    let module_defn = an.add_module(&module);
    let p_ident = ast.ident(p_sym);
    let p_defn = an.resolve_in_module(module_defn, &p_ident)[0];

    assert!(an.prepare(p_defn, AnalysisTask::PrepConstruction));
    assert!(!an.ctx.diagnostics.has_errors());

    let info = an.ctx.defs.composite_info(p_defn).unwrap();
    let ctor = info.default_constructor.expect("synthesized constructor");
    assert!(an.ctx.defs.get(ctor).is_ctor());
    assert_eq!(an.ctx.defs.get(ctor).kind, DefnKind::Function);

    let data = an.ctx.defs.get(ctor).as_function().unwrap();
    assert_eq!(data.params.len(), 2);
    // Required x first, optional y after.
    let p0 = an.ctx.defs.get(data.params[0]);
    let p1 = an.ctx.defs.get(data.params[1]);
    assert_eq!(p0.name, x_sym);
    assert!(p0.as_value().unwrap().init.is_none());
    assert_eq!(p1.name, y_sym);
    assert!(p1.as_value().unwrap().init.is_some());

    // Body: one assignment per field, then the return.
    let body = data.body.as_ref().unwrap();
    assert_eq!(body.len(), 3);
    assert!(matches!(body[0].kind, ExprKind::Assign { .. }));
    assert!(matches!(body[1].kind, ExprKind::Assign { .. }));
    assert!(matches!(body[2].kind, ExprKind::Return(None)));
}

#[test]
fn class_with_no_fields_gets_zero_arg_constructor() {
    let mut an = analyzer();
    let [c_sym] = syms(&mut an, ["C"]);
    let mut ast = AstBuilder::new();
    let c_decl = ast.class(c_sym, Vec::new(), Vec::new());
    let module = ast.module("main", vec![Declaration::Type(c_decl)]);
    let module_defn = an.add_module(&module);
    let c_ident = ast.ident(c_sym);
    let c_defn = an.resolve_in_module(module_defn, &c_ident)[0];

    assert!(an.prepare(c_defn, AnalysisTask::PrepConstruction));
    let info = an.ctx.defs.composite_info(c_defn).unwrap();
    let ctor = info.default_constructor.expect("default constructor");
    let data = an.ctx.defs.get(ctor).as_function().unwrap();
    assert!(data.params.is_empty());
}

#[test]
fn private_field_without_default_fails_synthesis() {
    let mut an = analyzer();
    let [c_sym, secret_sym] = syms(&mut an, ["C", "secret"]);
    let mut ast = AstBuilder::new();
    let int32 = an.ctx.interner.intern("int32");
    let ty = ast.ident(int32);
    let mut field = ast.var(secret_sym, ty, None);
    field.visibility = quill_ast::Visibility::Private;
    let c_decl = ast.class(c_sym, Vec::new(), vec![Declaration::Var(field)]);
    let module = ast.module("main", vec![Declaration::Type(c_decl)]);
    let module_defn = an.add_module(&module);
    let c_ident = ast.ident(c_sym);
    let c_defn = an.resolve_in_module(module_defn, &c_ident)[0];

    assert!(!an.prepare(c_defn, AnalysisTask::PrepConstruction));
    assert!(an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .any(|d| matches!(d.error, SemanticError::MissingInit { .. })));
}

#[test]
fn primary_base_interface_shares_parent_dispatch_table() {
    let mut an = analyzer();
    let [i1_sym, i2_sym, c_sym, f_sym, g_sym] = syms(&mut an, ["I1", "I2", "C", "f", "g"]);
    let mut ast = AstBuilder::new();

    // interface I1 { def f() }  interface I2 : I1 { def g() }
    let f_decl = ast.method(f_sym, Vec::new(), None, false);
    let i1_decl = ast.type_decl(
        TypeDeclKind::Interface,
        i1_sym,
        Vec::new(),
        vec![Declaration::Function(f_decl)],
    );
    let g_decl = ast.method(g_sym, Vec::new(), None, false);
    let i1_ref = ast.ident(i1_sym);
    let i2_decl = ast.type_decl(
        TypeDeclKind::Interface,
        i2_sym,
        vec![i1_ref],
        vec![Declaration::Function(g_decl)],
    );

    // class C : I2 implements both methods.
    let f_impl = ast.method(f_sym, Vec::new(), None, true);
    let g_impl = ast.method(g_sym, Vec::new(), None, true);
    let i2_ref = ast.ident(i2_sym);
    let c_decl = ast.class(
        c_sym,
        vec![i2_ref],
        vec![
            Declaration::Function(f_impl),
            Declaration::Function(g_impl),
        ],
    );

    let module = ast.module(
        "main",
        vec![
            Declaration::Type(i1_decl),
            Declaration::Type(i2_decl),
            Declaration::Type(c_decl),
        ],
    );
    let module_defn = an.add_module(&module);
    let c_ident = ast.ident(c_sym);
    let c_defn = an.resolve_in_module(module_defn, &c_ident)[0];
    let i2_ident = ast.ident(i2_sym);
    let i2_ty = an.type_in_module(module_defn, &i2_ident);

    assert!(an.prepare(c_defn, AnalysisTask::PrepEvaluation));
    assert!(!an.ctx.diagnostics.has_errors());

    // I1 is the primary base of ancestor I2, so its table is elided as
    // redundant: C carries exactly one dispatch table, for I2, parallel
    // in length to I2's method list (f inherited from I1, then g).
    let info = an.ctx.defs.composite_info(c_defn).unwrap();
    assert_eq!(info.interfaces.len(), 1);
    assert_eq!(info.interfaces[0].interface, i2_ty);
    assert_eq!(info.interfaces[0].methods.len(), 2);
    for &slot in &info.interfaces[0].methods {
        assert_eq!(an.ctx.defs.get(slot).parent, Some(c_defn));
    }
}

#[test]
fn duplicate_member_kinds_conflict() {
    let mut an = analyzer();
    let [c_sym, n_sym] = syms(&mut an, ["C", "n"]);
    let mut ast = AstBuilder::new();
    let int32 = an.ctx.interner.intern("int32");

    let ty = ast.ident(int32);
    let var = ast.var(n_sym, ty, None);
    let func = ast.method(n_sym, Vec::new(), None, true);
    let c_decl = ast.class(
        c_sym,
        Vec::new(),
        vec![Declaration::Var(var), Declaration::Function(func)],
    );
    let module = ast.module("main", vec![Declaration::Type(c_decl)]);
    let module_defn = an.add_module(&module);
    let c_ident = ast.ident(c_sym);
    let c_defn = an.resolve_in_module(module_defn, &c_ident)[0];

    an.prepare(c_defn, AnalysisTask::PrepConstruction);
    assert!(an
        .ctx
        .diagnostics
        .diagnostics()
        .iter()
        .any(|d| matches!(d.error, SemanticError::DuplicateDefinition { .. })));
}
