// well_known.rs
//
// The builtin module: Object at the root of the class hierarchy, the
// Array[T] template, String, and TypeDef definitions for every primitive
// so name resolution treats them uniformly.

use quill_identity::{DefnId, Interner, ModuleId, NameTable, ScopeId, Span, Symbol};
use smallvec::smallvec;

use crate::defs::{
    CompositeInfo, DefGraph, Defn, DefnDetail, DefnKind, FunctionData, StorageClass, Traits,
    TypeDefData, ValueData, Visibility,
};
use crate::passes::{AnalysisTask, Pass, PassSet};
use crate::scope::{ScopeKind, ScopeTable};
use crate::templates::TemplateTable;
use crate::types::{CompositeKind, FunctionSignature, TypeId, TypeRegistry};

/// Handles to the compiler-provided definitions.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub root_scope: ScopeId,
    pub object_defn: DefnId,
    pub object_type: TypeId,
    pub string_defn: DefnId,
    pub string_type: TypeId,
    /// The `Array[T]` template definition.
    pub array_defn: DefnId,
}

fn fully_analyzed() -> PassSet {
    AnalysisTask::PrepCodeGeneration.passes()
}

fn builtin_defn(
    defs: &mut DefGraph,
    module: ModuleId,
    kind: DefnKind,
    name: Symbol,
    detail: DefnDetail,
    finished: PassSet,
) -> DefnId {
    defs.alloc(|id| {
        let mut passes = crate::passes::PassState::new();
        passes.mark_finished(finished);
        Defn {
            id,
            kind,
            name,
            module,
            parent: None,
            span: Span::default(),
            traits: Traits::default()
                .with(Traits::SINGULAR)
                .with(Traits::SYNTHETIC),
            visibility: Visibility::Public,
            storage: StorageClass::Global,
            ast: None,
            attributes: Vec::new(),
            passes,
            template: None,
            template_instance: None,
            linkage_name: None,
            detail,
        }
    })
}

impl Builtins {
    pub fn install(
        interner: &mut Interner,
        names: &mut NameTable,
        registry: &mut TypeRegistry,
        defs: &mut DefGraph,
        scopes: &mut ScopeTable,
        templates: &mut TemplateTable,
    ) -> Builtins {
        let builtin_module = names.builtin_module();
        let root_scope = scopes.alloc(ScopeKind::Root, None, None);

        // Primitive type names resolve like any other TypeDef.
        for (name, ty) in [
            ("void", TypeId::VOID),
            ("bool", TypeId::BOOL),
            ("char", TypeId::CHAR),
            ("int8", TypeId::INT8),
            ("int16", TypeId::INT16),
            ("int32", TypeId::INT32),
            ("int64", TypeId::INT64),
            ("uint8", TypeId::UINT8),
            ("uint16", TypeId::UINT16),
            ("uint32", TypeId::UINT32),
            ("uint64", TypeId::UINT64),
            ("float", TypeId::FLOAT),
            ("double", TypeId::DOUBLE),
        ] {
            let sym = interner.intern(name);
            let defn = builtin_defn(
                defs,
                builtin_module,
                DefnKind::TypeDef,
                sym,
                DefnDetail::Type(TypeDefData {
                    ty: Some(ty),
                    scope: None,
                    composite: None,
                    aliased: None,
                }),
                fully_analyzed(),
            );
            scopes.get_mut(root_scope).define(sym, defn);
        }

        // Object: the implicit root of every class hierarchy.
        let object_sym = interner.intern("Object");
        let object_scope = scopes.alloc(ScopeKind::Members, Some(root_scope), None);
        let object_defn = builtin_defn(
            defs,
            builtin_module,
            DefnKind::TypeDef,
            object_sym,
            DefnDetail::Type(TypeDefData {
                ty: None,
                scope: Some(object_scope),
                composite: Some(CompositeInfo::default()),
                aliased: None,
            }),
            fully_analyzed(),
        );
        scopes.get_mut(object_scope).owner = Some(object_defn);
        let object_type = registry.composite(CompositeKind::Class, object_defn);
        defs.get_mut(object_defn).as_type_mut().unwrap().ty = Some(object_type);
        scopes.get_mut(root_scope).define(object_sym, object_defn);

        // Object's zero-argument constructor, so derived classes can
        // synthesize their own defaults.
        let construct_sym = interner.intern("construct");
        let object_ctor_type = registry.function(FunctionSignature {
            params: smallvec![],
            return_type: TypeId::VOID,
            self_param: Some(object_type),
            is_static: false,
        });
        let object_ctor = builtin_defn(
            defs,
            builtin_module,
            DefnKind::Function,
            construct_sym,
            DefnDetail::Function(FunctionData {
                ftype: Some(object_ctor_type),
                params: Vec::new(),
                body: Some(Vec::new()),
                dispatch_index: -1,
                overridden: Vec::new(),
                property: None,
            }),
            fully_analyzed(),
        );
        {
            let ctor = defs.get_mut(object_ctor);
            ctor.parent = Some(object_defn);
            ctor.storage = StorageClass::Instance;
            ctor.add_trait(Traits::CTOR);
        }
        scopes.get_mut(object_scope).define(construct_sym, object_ctor);
        {
            let info = defs.composite_info_mut(object_defn).unwrap();
            info.constructors.push(object_ctor);
            info.default_constructor = Some(object_ctor);
        }

        // String.
        let string_sym = interner.intern("String");
        let string_scope = scopes.alloc(ScopeKind::Members, Some(root_scope), None);
        let string_defn = builtin_defn(
            defs,
            builtin_module,
            DefnKind::TypeDef,
            string_sym,
            DefnDetail::Type(TypeDefData {
                ty: None,
                scope: Some(string_scope),
                composite: Some(CompositeInfo {
                    bases: vec![object_type],
                    primary_base: Some(object_type),
                    ..Default::default()
                }),
                aliased: None,
            }),
            fully_analyzed(),
        );
        scopes.get_mut(string_scope).owner = Some(string_defn);
        let string_type = registry.composite(CompositeKind::Class, string_defn);
        defs.get_mut(string_defn).as_type_mut().unwrap().ty = Some(string_type);
        scopes.get_mut(root_scope).define(string_sym, string_defn);

        // The Array[T] template. Its single member exposes the bound
        // element type to member lookup on instances.
        let array_sym = interner.intern("Array");
        let array_scope = scopes.alloc(ScopeKind::Members, Some(root_scope), None);
        let array_defn = builtin_defn(
            defs,
            builtin_module,
            DefnKind::TypeDef,
            array_sym,
            DefnDetail::Type(TypeDefData {
                ty: None,
                scope: Some(array_scope),
                composite: Some(CompositeInfo {
                    bases: vec![object_type],
                    primary_base: Some(object_type),
                    ..Default::default()
                }),
                aliased: None,
            }),
            PassSet::of(&[Pass::ScopeCreation, Pass::BaseTypes]),
        );
        scopes.get_mut(array_scope).owner = Some(array_defn);
        // Templates are not singular.
        defs.get_mut(array_defn).traits = Traits::default().with(Traits::SYNTHETIC);
        let array_type = registry.composite(CompositeKind::Class, array_defn);
        defs.get_mut(array_defn).as_type_mut().unwrap().ty = Some(array_type);
        scopes.get_mut(root_scope).define(array_sym, array_defn);

        let elem_var_sym = interner.intern("ElementType");
        let elem_var = registry.type_variable(array_defn, elem_var_sym);
        let param_scope = scopes.alloc(ScopeKind::TemplateParams, Some(root_scope), Some(array_defn));
        let template_id = templates.alloc(array_defn, vec![elem_var], param_scope);
        defs.get_mut(array_defn).template = Some(template_id);

        let elem_member_sym = interner.intern("element_type");
        let elem_member = builtin_defn(
            defs,
            builtin_module,
            DefnKind::Let,
            elem_member_sym,
            DefnDetail::Value(ValueData {
                ty: Some(elem_var),
                ..Default::default()
            }),
            fully_analyzed(),
        );
        {
            let member = defs.get_mut(elem_member);
            member.parent = Some(array_defn);
            member.storage = StorageClass::Static;
        }
        scopes.get_mut(array_scope).define(elem_member_sym, elem_member);

        Builtins {
            root_scope,
            object_defn,
            object_type,
            string_defn,
            string_type,
            array_defn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_provides_the_core_types() {
        let mut interner = Interner::new();
        let mut names = NameTable::new();
        let mut registry = TypeRegistry::new();
        let mut defs = DefGraph::new();
        let mut scopes = ScopeTable::new();
        let mut templates = TemplateTable::new();
        let builtins = Builtins::install(
            &mut interner,
            &mut names,
            &mut registry,
            &mut defs,
            &mut scopes,
            &mut templates,
        );

        // Object analyzed through, with a default constructor.
        let info = defs.composite_info(builtins.object_defn).unwrap();
        assert!(info.default_constructor.is_some());
        assert!(info.bases.is_empty());

        // String derives Object.
        let info = defs.composite_info(builtins.string_defn).unwrap();
        assert_eq!(info.primary_base, Some(builtins.object_type));

        // Array is a one-parameter template.
        let template = defs.get(builtins.array_defn).template.unwrap();
        assert_eq!(templates.get(template).arity(), 1);

        // Primitive names resolve in the root scope.
        let int32_sym = interner.intern("int32");
        let found = scopes.get(builtins.root_scope).get(int32_sym);
        assert_eq!(found.len(), 1);
        assert_eq!(defs.type_of(found[0]), Some(TypeId::INT32));
    }
}
