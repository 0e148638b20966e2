// templates.rs
//
// Generic signatures and their instantiation. A template signature owns an
// ordered list of type variables and a pattern (the templated definition);
// an environment binds variables to concrete types; instantiation
// synthesizes a definition per distinct binding tuple, cached so equal
// environments yield the identical definition handle.

use quill_identity::{DefnId, ScopeId, Symbol, TemplateId};
use rustc_hash::FxHashMap;

use crate::defs::{DefGraph, Defn, DefnDetail, DefnKind, TemplateInstanceRecord, Traits, TypeDefData};
use crate::passes::{Pass, PassSet};
use crate::scope::{ScopeKind, ScopeTable};
use crate::types::{relation, Type, TypeId, TypeIdVec, TypeRegistry};

/// A template's signature: its ordered pattern variables and their scope.
#[derive(Debug)]
pub struct TemplateSignature {
    pub owner: DefnId,
    /// TypeVariable handles, in declaration order.
    pub params: Vec<TypeId>,
    pub param_scope: ScopeId,
    /// Instance cache keyed by the tuple of bound types.
    instances: FxHashMap<TypeIdVec, DefnId>,
}

impl TemplateSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Arena of template signatures.
#[derive(Debug, Default)]
pub struct TemplateTable {
    signatures: Vec<TemplateSignature>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, owner: DefnId, params: Vec<TypeId>, param_scope: ScopeId) -> TemplateId {
        let id = TemplateId::new(self.signatures.len() as u32);
        self.signatures.push(TemplateSignature {
            owner,
            params,
            param_scope,
            instances: FxHashMap::default(),
        });
        id
    }

    pub fn get(&self, id: TemplateId) -> &TemplateSignature {
        &self.signatures[id.index() as usize]
    }

    pub fn get_mut(&mut self, id: TemplateId) -> &mut TemplateSignature {
        &mut self.signatures[id.index() as usize]
    }
}

/// A binding of template variables to types.
#[derive(Debug, Clone, Default)]
pub struct TemplateEnv {
    bindings: FxHashMap<TypeId, TypeId>,
}

impl TemplateEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: TypeId, value: TypeId) {
        self.bindings.insert(var, value);
    }

    pub fn lookup(&self, var: TypeId) -> Option<TypeId> {
        self.bindings.get(&var).copied()
    }

    /// Build an environment by pairing a signature's variables with
    /// positional arguments.
    pub fn from_args(sig: &TemplateSignature, args: &[TypeId]) -> Option<Self> {
        if args.len() != sig.params.len() {
            return None;
        }
        let mut env = Self::new();
        for (&var, &arg) in sig.params.iter().zip(args.iter()) {
            env.bind(var, arg);
        }
        Some(env)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum InstantiateError {
    #[error("definition is not a template")]
    NotATemplate(DefnId),
    #[error("template variable is not bound")]
    UnboundVariable { template: DefnId, var: Symbol },
}

/// Rebuild a type with template variables replaced per the environment.
/// Solved assignments substitute through their value. `self_map` rewrites
/// the template's own composite type to the instance's.
pub fn substitute(
    registry: &mut TypeRegistry,
    defs: &DefGraph,
    env: &TemplateEnv,
    self_map: Option<(TypeId, TypeId)>,
    ty: TypeId,
) -> TypeId {
    if let Some((from, to)) = self_map {
        if ty == from {
            return to;
        }
    }
    match registry.get(ty).clone() {
        Type::TypeVariable(_) => env.lookup(ty).unwrap_or(ty),
        Type::Assignment(a) => match registry.assignment(a).value {
            Some(value) => substitute(registry, defs, env, self_map, value),
            None => ty,
        },
        Type::Tuple(members) => {
            let members: TypeIdVec = members
                .iter()
                .map(|&m| substitute(registry, defs, env, self_map, m))
                .collect();
            registry.tuple(members)
        }
        Type::Union(u) => {
            let members: TypeIdVec = u
                .members
                .iter()
                .map(|&m| substitute(registry, defs, env, self_map, m))
                .collect();
            registry.union(defs, members)
        }
        Type::Address(p) => {
            let p = substitute(registry, defs, env, self_map, p);
            registry.address(p)
        }
        Type::NativeArray { element, length } => {
            let element = substitute(registry, defs, env, self_map, element);
            registry.native_array(element, length)
        }
        Type::TypeLiteral(t) => {
            let t = substitute(registry, defs, env, self_map, t);
            registry.type_literal(t)
        }
        Type::Function(sig) => {
            let mut sig = (*sig).clone();
            sig.return_type = substitute(registry, defs, env, self_map, sig.return_type);
            for param in sig.params.iter_mut() {
                param.ty = substitute(registry, defs, env, self_map, param.ty);
            }
            sig.self_param = sig
                .self_param
                .map(|s| substitute(registry, defs, env, self_map, s));
            registry.function(sig)
        }
        _ => ty,
    }
}

/// Instantiate a template with an environment.
///
/// Requires every pattern variable bound; walks the pattern substituting
/// variables; consults the per-template instance cache; otherwise
/// synthesizes a fresh definition sharing the template's AST with its
/// template-instance record set to the binding tuple.
pub fn instantiate(
    registry: &mut TypeRegistry,
    defs: &mut DefGraph,
    scopes: &mut ScopeTable,
    templates: &mut TemplateTable,
    template_defn: DefnId,
    env: &TemplateEnv,
) -> Result<DefnId, InstantiateError> {
    let Some(template_id) = defs.get(template_defn).template else {
        return Err(InstantiateError::NotATemplate(template_defn));
    };

    // Resolve the binding tuple, dereferencing solved assignments.
    let params = templates.get(template_id).params.clone();
    let mut args: TypeIdVec = TypeIdVec::new();
    for &var in &params {
        let Some(bound) = env.lookup(var) else {
            let name = registry
                .as_type_variable(var)
                .map(|v| registry.type_var(v).name)
                .unwrap_or(Symbol::UNKNOWN);
            return Err(InstantiateError::UnboundVariable {
                template: template_defn,
                var: name,
            });
        };
        args.push(relation::deref(registry, defs, bound));
    }

    if let Some(&cached) = templates.get(template_id).instances.get(&args) {
        return Ok(cached);
    }

    tracing::debug!(template = ?template_defn, ?args, "instantiating template");

    let singular = args.iter().all(|&a| registry.is_singular(a));
    let source = defs.get(template_defn).clone();

    let instance = defs.alloc(|id| {
        let mut traits = source.traits.with(Traits::SYNTHETIC);
        if singular {
            traits.add(Traits::SINGULAR);
        }
        Defn {
            id,
            kind: source.kind,
            name: source.name,
            module: source.module,
            parent: source.parent,
            span: source.span,
            traits,
            visibility: source.visibility,
            storage: source.storage,
            ast: source.ast.clone(),
            attributes: source.attributes.clone(),
            passes: Default::default(),
            template: None,
            template_instance: Some(TemplateInstanceRecord {
                template: template_defn,
                args: args.clone(),
            }),
            linkage_name: None,
            detail: match &source.detail {
                DefnDetail::Type(_) => DefnDetail::Type(TypeDefData::default()),
                other => other.clone(),
            },
        }
    });
    templates
        .get_mut(template_id)
        .instances
        .insert(args.clone(), instance);

    match source.kind {
        DefnKind::TypeDef => {
            instantiate_type(registry, defs, scopes, template_defn, instance, env)
        }
        DefnKind::Function | DefnKind::Macro => {
            instantiate_function(registry, defs, template_defn, instance, env)
        }
        _ => {}
    }

    Ok(instance)
}

/// Materialize a composite instance: its own type, a member scope with
/// substituted clones of the template's members, and substituted bases.
fn instantiate_type(
    registry: &mut TypeRegistry,
    defs: &mut DefGraph,
    scopes: &mut ScopeTable,
    template_defn: DefnId,
    instance: DefnId,
    env: &TemplateEnv,
) {
    let template_ty = defs.type_of(template_defn);
    let kind = template_ty
        .and_then(|t| registry.as_composite(t))
        .map(|(k, _)| k);

    let instance_ty = match kind {
        Some(kind) => Some(registry.composite(kind, instance)),
        None => None,
    };
    let self_map = match (template_ty, instance_ty) {
        (Some(from), Some(to)) => Some((from, to)),
        _ => None,
    };

    let scope = scopes.alloc(ScopeKind::Members, None, Some(instance));

    // Clone members with substituted value/function types.
    let template_scope = defs.member_scope(template_defn);
    let mut cloned: Vec<(Symbol, DefnId)> = Vec::new();
    if let Some(template_scope) = template_scope {
        let members: Vec<DefnId> = scopes.get(template_scope).members().collect();
        for member in members {
            let source = defs.get(member).clone();
            let mut detail = source.detail.clone();
            match &mut detail {
                DefnDetail::Value(v) => {
                    v.ty = v.ty.map(|t| substitute(registry, defs, env, self_map, t));
                }
                DefnDetail::Function(f) => {
                    f.ftype = f.ftype.map(|t| substitute(registry, defs, env, self_map, t));
                }
                DefnDetail::Property(p) => {
                    p.ty = p.ty.map(|t| substitute(registry, defs, env, self_map, t));
                }
                _ => {}
            }
            let clone = defs.alloc(|id| Defn {
                id,
                parent: Some(instance),
                traits: source.traits.with(Traits::SYNTHETIC),
                detail,
                linkage_name: None,
                passes: Default::default(),
                ..source
            });
            cloned.push((defs.get(clone).name, clone));
        }
    }
    for (name, clone) in cloned {
        scopes.get_mut(scope).define(name, clone);
    }

    // Substitute base types resolved on the template.
    let bases: Vec<TypeId> = defs
        .composite_info(template_defn)
        .map(|info| info.bases.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|b| substitute(registry, defs, env, self_map, b))
        .collect();
    let primary = defs
        .composite_info(template_defn)
        .and_then(|info| info.primary_base)
        .map(|b| substitute(registry, defs, env, self_map, b));

    let data = defs.get_mut(instance).as_type_mut().expect("type instance");
    data.ty = instance_ty;
    data.scope = Some(scope);
    if defs.composite_info(template_defn).is_some() {
        let info = crate::defs::CompositeInfo {
            bases,
            primary_base: primary,
            ..Default::default()
        };
        defs.get_mut(instance).as_type_mut().unwrap().composite = Some(info);
    }

    // Scope and bases came ready-made from the template's own passes.
    defs.get_mut(instance)
        .passes
        .mark_finished(PassSet::of(&[Pass::ScopeCreation, Pass::BaseTypes]));
}

fn instantiate_function(
    registry: &mut TypeRegistry,
    defs: &mut DefGraph,
    template_defn: DefnId,
    instance: DefnId,
    env: &TemplateEnv,
) {
    let ftype = defs.function_type(template_defn);
    let substituted = ftype.map(|t| substitute(registry, defs, env, None, t));
    if let Some(f) = defs.get_mut(instance).as_function_mut() {
        f.ftype = substituted;
    }
}
