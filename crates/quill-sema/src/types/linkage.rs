// types/linkage.rs
//
// Linkage names: the stable, human-readable mangling the emitter and the
// reflection stream use to identify definitions and types. Template
// instances embed their arguments in brackets: `base[int32,double]`.

use quill_identity::{DefnId, Interner};

use crate::defs::{DefGraph, DefnKind};

use super::registry::TypeRegistry;
use super::ty::Type;
use super::type_id::TypeId;

/// Compute the linkage name of a definition: enclosing definitions joined
/// with dots, rooted at the module path, with template-instance arguments
/// appended in bracketed form.
pub fn defn_linkage_name(
    registry: &TypeRegistry,
    defs: &DefGraph,
    interner: &Interner,
    names: &quill_identity::NameTable,
    defn: DefnId,
) -> String {
    let d = defs.get(defn);
    let mut out = match d.parent {
        Some(parent) if defs.get(parent).kind != DefnKind::Module => {
            let mut prefix = defn_linkage_name(registry, defs, interner, names, parent);
            prefix.push('.');
            prefix.push_str(interner.resolve(d.name));
            prefix
        }
        _ => {
            let module_path = names.module_path(d.module);
            if module_path.is_empty() {
                interner.resolve(d.name).to_string()
            } else {
                format!("{}.{}", module_path, interner.resolve(d.name))
            }
        }
    };

    if let Some(instance) = &d.template_instance {
        out.push('[');
        for (i, &arg) in instance.args.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            type_linkage_name(&mut out, registry, defs, interner, names, arg);
        }
        out.push(']');
    }

    out
}

/// Append the linkage name of a type to the output buffer.
pub fn type_linkage_name(
    out: &mut String,
    registry: &TypeRegistry,
    defs: &DefGraph,
    interner: &Interner,
    names: &quill_identity::NameTable,
    ty: TypeId,
) {
    let ty = super::relation::deref(registry, defs, ty);
    match registry.get(ty) {
        Type::Primitive(_) => out.push_str(primitive_name(ty)),
        Type::Composite { defn, .. } | Type::Enum { defn, .. } | Type::Alias { defn } => {
            out.push_str(&defn_linkage_name(registry, defs, interner, names, *defn))
        }
        Type::Function(sig) => {
            out.push_str("fn");
            if let Some(self_ty) = sig.self_param {
                out.push(':');
                type_linkage_name(out, registry, defs, interner, names, self_ty);
            }
            if !sig.params.is_empty() {
                out.push('(');
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    type_linkage_name(out, registry, defs, interner, names, param.ty);
                    if param.variadic {
                        out.push_str("...");
                    }
                }
                out.push(')');
            }
            if !sig.return_type.is_void() {
                out.push_str("->");
                type_linkage_name(out, registry, defs, interner, names, sig.return_type);
            }
        }
        Type::Tuple(members) => {
            out.push('(');
            for (i, &m) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                type_linkage_name(out, registry, defs, interner, names, m);
            }
            out.push(')');
        }
        Type::Union(u) => {
            for (i, &m) in u.members.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                type_linkage_name(out, registry, defs, interner, names, m);
            }
        }
        Type::Address(pointee) => {
            type_linkage_name(out, registry, defs, interner, names, *pointee);
            out.push('^');
        }
        Type::NativeArray { element, length } => {
            out.push_str("NativeArray[");
            type_linkage_name(out, registry, defs, interner, names, *element);
            out.push(',');
            out.push_str(&length.to_string());
            out.push(']');
        }
        Type::TypeLiteral(_) => out.push_str("quill.reflect.Type"),
        Type::TypeVariable(v) => out.push_str(interner.resolve(registry.type_var(*v).name)),
        Type::Assignment(_) => out.push_str("<unsolved>"),
    }
}

fn primitive_name(ty: TypeId) -> &'static str {
    match ty {
        TypeId::VOID => "void",
        TypeId::BOOL => "bool",
        TypeId::CHAR => "char",
        TypeId::INT8 => "int8",
        TypeId::INT16 => "int16",
        TypeId::INT32 => "int32",
        TypeId::INT64 => "int64",
        TypeId::UINT8 => "uint8",
        TypeId::UINT16 => "uint16",
        TypeId::UINT32 => "uint32",
        TypeId::UINT64 => "uint64",
        TypeId::FLOAT => "float",
        TypeId::DOUBLE => "double",
        TypeId::NULL => "Null",
        TypeId::UNSIZED_INT => "int",
        _ => "<bad>",
    }
}
