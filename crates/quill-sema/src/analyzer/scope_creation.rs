// analyzer/scope_creation.rs
//
// First-phase definition creation: walk declaration lists and populate
// scopes. Only names and shells are created here; types and signatures
// resolve in later passes.

use std::rc::Rc;

use quill_ast::{
    Declaration, FunctionDecl, ImportDecl, Modifiers, PropertyDecl, TypeDecl, TypeDeclKind,
    VarDecl, VarDeclKind,
};
use quill_identity::{DefnId, ModuleId, ScopeId};

use crate::defs::{
    Defn, DefnDetail, DefnKind, FunctionData, ImportData, PropertyData, SpaceData, StorageClass,
    Traits, TypeDefData, ValueData, Visibility,
};
use crate::scope::ScopeKind;
use crate::types::CompositeKind;

use super::Analyzer;

fn traits_from_modifiers(modifiers: Modifiers) -> Traits {
    let mut traits = Traits::default();
    if modifiers.contains(Modifiers::FINAL) {
        traits.add(Traits::FINAL);
    }
    if modifiers.contains(Modifiers::ABSTRACT) {
        traits.add(Traits::ABSTRACT);
    }
    if modifiers.contains(Modifiers::UNDEF) {
        traits.add(Traits::UNDEF);
    }
    if modifiers.contains(Modifiers::READONLY) {
        traits.add(Traits::READONLY);
    }
    if modifiers.contains(Modifiers::OVERRIDE) {
        traits.add(Traits::OVERRIDE);
    }
    if modifiers.contains(Modifiers::EXTERN) {
        traits.add(Traits::EXTERN);
    }
    traits
}

impl Analyzer {
    /// Create definitions for explicit imports. Each import binds its
    /// alias (or the target's last segment) in the module scope; the
    /// target resolves lazily on first lookup.
    pub(crate) fn create_imports(
        &mut self,
        module_defn: DefnId,
        scope: ScopeId,
        imports: &[ImportDecl],
    ) {
        for import in imports {
            let name = import.alias.unwrap_or_else(|| {
                // The last segment of the target path names the binding.
                let mut node = &import.target;
                loop {
                    match &node.kind {
                        quill_ast::NodeKind::MemberRef { member, .. } => break *member,
                        quill_ast::NodeKind::Ident(sym) => break *sym,
                        quill_ast::NodeKind::Specialize { base, .. } => node = base,
                        _ => break quill_identity::Symbol::UNKNOWN,
                    }
                }
            });
            let module = self.ctx.defs.get(module_defn).module;
            let defn = self.ctx.defs.alloc(|id| Defn {
                id,
                kind: DefnKind::ExplicitImport,
                name,
                module,
                parent: Some(module_defn),
                span: import.span,
                traits: Traits::default().with(Traits::SINGULAR),
                visibility: Visibility::Private,
                storage: StorageClass::Global,
                ast: None,
                attributes: Vec::new(),
                passes: Default::default(),
                template: None,
                template_instance: None,
                linkage_name: None,
                detail: DefnDetail::Import(ImportData {
                    target: import.target.clone(),
                    resolved: None,
                    unpack: import.unpack,
                }),
            });
            self.ctx.scopes.get_mut(scope).define(name, defn);
        }
    }

    /// Create a definition per declaration and bind each in the scope.
    pub(crate) fn create_members(
        &mut self,
        parent: DefnId,
        scope: ScopeId,
        module: ModuleId,
        decls: &[Declaration],
    ) {
        for decl in decls {
            let defn = self.create_defn(parent, module, decl);
            self.ctx
                .scopes
                .get_mut(scope)
                .define(decl.name(), defn);
        }
    }

    fn create_defn(&mut self, parent: DefnId, module: ModuleId, decl: &Declaration) -> DefnId {
        match decl {
            Declaration::Type(d) => self.create_type_defn(parent, module, decl, d),
            Declaration::Function(d) => self.create_function_defn(parent, module, decl, d, None),
            Declaration::Var(d) => self.create_var_defn(parent, module, decl, d),
            Declaration::Property(d) => self.create_property_defn(parent, module, decl, d),
            Declaration::Namespace(d) => {
                let defn = self.ctx.defs.alloc(|id| Defn {
                    id,
                    kind: DefnKind::Namespace,
                    name: d.name,
                    module,
                    parent: Some(parent),
                    span: d.span,
                    traits: Traits::default().with(Traits::SINGULAR),
                    visibility: Visibility::Public,
                    storage: StorageClass::Global,
                    ast: Some(Rc::new(decl.clone())),
                    attributes: Vec::new(),
                    passes: Default::default(),
                    template: None,
                    template_instance: None,
                    linkage_name: None,
                    detail: DefnDetail::Space(SpaceData {
                        scope: None,
                        path: String::new(),
                    }),
                });
                let parent_scope = self.defining_scope(parent);
                let scope =
                    self.ctx
                        .scopes
                        .alloc(ScopeKind::Namespace, Some(parent_scope), Some(defn));
                if let DefnDetail::Space(space) = &mut self.ctx.defs.get_mut(defn).detail {
                    space.scope = Some(scope);
                }
                self.create_members(defn, scope, module, &d.members);
                defn
            }
        }
    }

    fn create_type_defn(
        &mut self,
        parent: DefnId,
        module: ModuleId,
        decl: &Declaration,
        d: &TypeDecl,
    ) -> DefnId {
        let composite_kind = match d.kind {
            TypeDeclKind::Class => Some(CompositeKind::Class),
            TypeDeclKind::Struct => Some(CompositeKind::Struct),
            TypeDeclKind::Interface => Some(CompositeKind::Interface),
            TypeDeclKind::Protocol => Some(CompositeKind::Protocol),
            TypeDeclKind::Enum | TypeDeclKind::Alias => None,
        };
        let is_template = !d.type_params.is_empty();
        let inside_template = self.ctx.defs.get(parent).is_template()
            || self.ctx.defs.is_template_member(parent);

        let defn = self.ctx.defs.alloc(|id| {
            let mut traits = traits_from_modifiers(d.modifiers);
            if !is_template && !inside_template {
                traits.add(Traits::SINGULAR);
            }
            Defn {
                id,
                kind: DefnKind::TypeDef,
                name: d.name,
                module,
                parent: Some(parent),
                span: d.span,
                traits,
                visibility: d.visibility.into(),
                storage: StorageClass::Global,
                ast: Some(Rc::new(decl.clone())),
                attributes: d.attributes.clone(),
                passes: Default::default(),
                template: None,
                template_instance: None,
                linkage_name: None,
                detail: DefnDetail::Type(TypeDefData {
                    ty: None,
                    scope: None,
                    composite: composite_kind.map(|_| Default::default()),
                    aliased: None,
                }),
            }
        });

        if let Some(kind) = composite_kind {
            let ty = self.ctx.registry.composite(kind, defn);
            self.ctx.defs.get_mut(defn).as_type_mut().unwrap().ty = Some(ty);
        } else if d.kind == TypeDeclKind::Alias {
            let ty = self.ctx.registry.alias(defn);
            self.ctx.defs.get_mut(defn).as_type_mut().unwrap().ty = Some(ty);
        }

        // Template signature: one type variable per declared parameter.
        // Upper bounds resolve during the template's BaseTypes pass.
        if is_template {
            let parent_scope = self.defining_scope(parent);
            let param_scope =
                self.ctx
                    .scopes
                    .alloc(ScopeKind::TemplateParams, Some(parent_scope), Some(defn));
            let mut params = Vec::with_capacity(d.type_params.len());
            for tp in &d.type_params {
                let var = self.ctx.registry.type_variable(defn, tp.name);
                // Bind the variable's name so member signatures resolve it.
                let var_defn = self.ctx.defs.alloc(|id| Defn {
                    id,
                    kind: DefnKind::TypeDef,
                    name: tp.name,
                    module,
                    parent: Some(defn),
                    span: tp.span,
                    traits: Traits::default().with(Traits::SYNTHETIC),
                    visibility: Visibility::Public,
                    storage: StorageClass::Global,
                    ast: None,
                    attributes: Vec::new(),
                    passes: Default::default(),
                    template: None,
                    template_instance: None,
                    linkage_name: None,
                    detail: DefnDetail::Type(TypeDefData {
                        ty: Some(var),
                        scope: None,
                        composite: None,
                        aliased: None,
                    }),
                });
                self.ctx.scopes.get_mut(param_scope).define(tp.name, var_defn);
                params.push(var);
            }
            let template_id = self.ctx.templates.alloc(defn, params, param_scope);
            self.ctx.defs.get_mut(defn).template = Some(template_id);
        }

        defn
    }

    fn create_function_defn(
        &mut self,
        parent: DefnId,
        module: ModuleId,
        decl: &Declaration,
        d: &FunctionDecl,
        property: Option<DefnId>,
    ) -> DefnId {
        let parent_is_type = self.ctx.defs.get(parent).kind == DefnKind::TypeDef;
        let storage = if parent_is_type && !d.modifiers.contains(Modifiers::STATIC) {
            StorageClass::Instance
        } else if parent_is_type {
            StorageClass::Static
        } else {
            StorageClass::Global
        };
        let inside_template = self.ctx.defs.get(parent).is_template()
            || self.ctx.defs.is_template_member(parent);

        self.ctx.defs.alloc(|id| {
            let mut traits = traits_from_modifiers(d.modifiers);
            if d.type_params.is_empty() && !inside_template {
                traits.add(Traits::SINGULAR);
            }
            Defn {
                id,
                kind: if d.is_macro {
                    DefnKind::Macro
                } else {
                    DefnKind::Function
                },
                name: d.name,
                module,
                parent: Some(parent),
                span: d.span,
                traits,
                visibility: d.visibility.into(),
                storage,
                ast: Some(Rc::new(decl.clone())),
                attributes: d.attributes.clone(),
                passes: Default::default(),
                template: None,
                template_instance: None,
                linkage_name: None,
                detail: DefnDetail::Function(FunctionData {
                    property,
                    ..Default::default()
                }),
            }
        })
    }

    fn create_var_defn(
        &mut self,
        parent: DefnId,
        module: ModuleId,
        decl: &Declaration,
        d: &VarDecl,
    ) -> DefnId {
        let parent_is_type = self.ctx.defs.get(parent).kind == DefnKind::TypeDef;
        let storage = if parent_is_type && !d.modifiers.contains(Modifiers::STATIC) {
            StorageClass::Instance
        } else if parent_is_type {
            StorageClass::Static
        } else {
            StorageClass::Global
        };
        self.ctx.defs.alloc(|id| Defn {
            id,
            kind: match d.kind {
                VarDeclKind::Var => DefnKind::Var,
                VarDeclKind::Let => DefnKind::Let,
            },
            name: d.name,
            module,
            parent: Some(parent),
            span: d.span,
            traits: traits_from_modifiers(d.modifiers).with(Traits::SINGULAR),
            visibility: d.visibility.into(),
            storage,
            ast: Some(Rc::new(decl.clone())),
            attributes: d.attributes.clone(),
            passes: Default::default(),
            template: None,
            template_instance: None,
            linkage_name: None,
            detail: DefnDetail::Value(ValueData::default()),
        })
    }

    fn create_property_defn(
        &mut self,
        parent: DefnId,
        module: ModuleId,
        decl: &Declaration,
        d: &PropertyDecl,
    ) -> DefnId {
        let defn = self.ctx.defs.alloc(|id| Defn {
            id,
            kind: if d.is_indexer {
                DefnKind::Indexer
            } else {
                DefnKind::Property
            },
            name: d.name,
            module,
            parent: Some(parent),
            span: d.span,
            traits: traits_from_modifiers(d.modifiers).with(Traits::SINGULAR),
            visibility: d.visibility.into(),
            storage: if d.modifiers.contains(Modifiers::STATIC) {
                StorageClass::Static
            } else {
                StorageClass::Instance
            },
            ast: Some(Rc::new(decl.clone())),
            attributes: Vec::new(),
            passes: Default::default(),
            template: None,
            template_instance: None,
            linkage_name: None,
            detail: DefnDetail::Property(PropertyData::default()),
        });

        // Accessors share the property's storage class.
        let storage = self.ctx.defs.get(defn).storage;
        let getter = d.getter.as_ref().map(|g| {
            let f = self.create_function_defn(
                defn,
                module,
                &Declaration::Function(g.clone()),
                g,
                Some(defn),
            );
            self.ctx.defs.get_mut(f).storage = storage;
            f
        });
        let setter = d.setter.as_ref().map(|s| {
            let f = self.create_function_defn(
                defn,
                module,
                &Declaration::Function(s.clone()),
                s,
                Some(defn),
            );
            self.ctx.defs.get_mut(f).storage = storage;
            f
        });
        let data = self.ctx.defs.get_mut(defn).as_property_mut().unwrap();
        data.getter = getter;
        data.setter = setter;
        defn
    }

    /// ScopeCreation pass for a composite: build the member scope and
    /// populate it from the declaration's member list.
    pub(crate) fn create_type_scope(&mut self, defn: DefnId) {
        if self.ctx.defs.member_scope(defn).is_some() {
            return;
        }
        let parent_scope = self.enclosing_scope(defn);
        // Members of a template see its parameter scope between
        // themselves and the enclosing scope.
        let parent_scope = match self.ctx.defs.get(defn).template {
            Some(template) => self.ctx.templates.get(template).param_scope,
            None => parent_scope,
        };
        let scope = self
            .ctx
            .scopes
            .alloc(ScopeKind::Members, Some(parent_scope), Some(defn));
        if let Some(data) = self.ctx.defs.get_mut(defn).as_type_mut() {
            data.scope = Some(scope);
        }

        let ast = self.ctx.defs.get(defn).ast.clone();
        let module = self.ctx.defs.get(defn).module;
        if let Some(decl) = ast {
            if let Declaration::Type(type_decl) = &*decl {
                self.create_members(defn, scope, module, &type_decl.members);
            }
        }
    }
}
