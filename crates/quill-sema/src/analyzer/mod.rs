// analyzer/mod.rs
//
// The analysis orchestrator. Requests for any semantic property of a
// definition route through `prepare`, which maps the request onto the
// definition's pass state and runs whatever is missing, in dependency
// order. The mutually recursive resolver / type analyzer / template
// engine / unifier all live behind this struct; the pass-state
// bookkeeping is what keeps their recursion from running away.

mod calls;
mod class;
mod function;
mod resolve;
mod scope_creation;
mod type_analyzer;

use quill_ast::ModuleAst;
use quill_identity::{DefnId, Span};

use crate::config::CompilerOptions;
use crate::context::AnalysisContext;
use crate::defs::{DefnKind, SpaceData, Traits};
use crate::errors::SemanticError;
use crate::passes::{AnalysisTask, Pass};

pub struct Analyzer {
    pub ctx: AnalysisContext,
    /// Modules registered for analysis, in arrival order.
    modules: Vec<DefnId>,
}

impl Analyzer {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            ctx: AnalysisContext::new(options),
            modules: Vec::new(),
        }
    }

    pub fn modules(&self) -> &[DefnId] {
        &self.modules
    }

    /// Register a parsed module: create its definition, its scope, and the
    /// definitions for everything it declares.
    pub fn add_module(&mut self, ast: &ModuleAst) -> DefnId {
        let module_id = self.ctx.names.module_id(&ast.path);
        let name = self.ctx.interner.intern(
            ast.path
                .rsplit('.')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("main"),
        );

        let root = self.ctx.builtins.root_scope;
        let scope = self
            .ctx
            .scopes
            .alloc(crate::scope::ScopeKind::Module, Some(root), None);

        let defn = self.ctx.defs.alloc(|id| crate::defs::Defn {
            id,
            kind: DefnKind::Module,
            name,
            module: module_id,
            parent: None,
            span: Span::default(),
            traits: Traits::default().with(Traits::SINGULAR),
            visibility: crate::defs::Visibility::Public,
            storage: crate::defs::StorageClass::Global,
            ast: None,
            attributes: Vec::new(),
            passes: Default::default(),
            template: None,
            template_instance: None,
            linkage_name: None,
            detail: crate::defs::DefnDetail::Space(SpaceData {
                scope: Some(scope),
                path: ast.path.clone(),
            }),
        });
        self.ctx.scopes.get_mut(scope).owner = Some(defn);
        // Modules are discoverable by their last path segment, so imports
        // from sibling modules can resolve through the root scope.
        self.ctx.scopes.get_mut(root).define(name, defn);

        self.create_imports(defn, scope, &ast.imports);
        self.create_members(defn, scope, module_id, &ast.declarations);
        self.modules.push(defn);
        tracing::debug!(path = %ast.path, ?defn, "module registered");
        defn
    }

    /// Run every pass the task needs on one definition. Returns false when
    /// a pass failed; the failure is already in the diagnostic sink.
    pub fn prepare(&mut self, defn: DefnId, task: AnalysisTask) -> bool {
        let d = self.ctx.defs.get(defn);
        match d.kind {
            DefnKind::TypeDef => self.prepare_type(defn, task),
            DefnKind::Function | DefnKind::Macro => self.prepare_function(defn, task),
            DefnKind::Var | DefnKind::Let | DefnKind::Parameter => {
                self.prepare_value(defn, task)
            }
            DefnKind::Property | DefnKind::Indexer => self.prepare_property(defn, task),
            DefnKind::Module | DefnKind::Namespace => self.prepare_space(defn, task),
            DefnKind::ExplicitImport => true,
        }
    }

    /// Analyze every registered module to code-generation readiness.
    pub fn analyze_all(&mut self) {
        let modules = self.modules.clone();
        for module in modules {
            self.prepare(module, AnalysisTask::PrepCodeGeneration);
        }
    }

    /// Translate a type expression in a module's scope. The public entry
    /// used by embedders (and tests) to ask type-level questions.
    pub fn type_in_module(&mut self, module: DefnId, node: &quill_ast::Node) -> crate::types::TypeId {
        let scope = self
            .ctx
            .defs
            .member_scope(module)
            .unwrap_or(self.ctx.builtins.root_scope);
        self.type_from_ast(scope, node)
    }

    /// Resolve a name in a module's scope to definitions. Public wrapper
    /// over the resolver for embedders and tests.
    pub fn resolve_in_module(
        &mut self,
        module: DefnId,
        node: &quill_ast::Node,
    ) -> Vec<DefnId> {
        let scope = self
            .ctx
            .defs
            .member_scope(module)
            .unwrap_or(self.ctx.builtins.root_scope);
        self.resolve_node(scope, node)
    }

    fn prepare_type(&mut self, defn: DefnId, task: AnalysisTask) -> bool {
        let d = self.ctx.defs.get(defn);
        if d.as_type().map(|t| t.composite.is_some()) == Some(true) {
            return self.run_class_passes(defn, task);
        }
        // Enums and aliases: resolving the target is the whole analysis.
        self.resolve_non_composite_type(defn)
    }

    fn prepare_value(&mut self, defn: DefnId, _task: AnalysisTask) -> bool {
        self.resolve_value_type(defn)
    }

    fn prepare_property(&mut self, defn: DefnId, task: AnalysisTask) -> bool {
        let (getter, setter) = {
            let data = self.ctx.defs.get(defn).as_property();
            match data {
                Some(p) => (p.getter, p.setter),
                None => return true,
            }
        };
        let mut ok = self.resolve_property_type(defn);
        if let Some(getter) = getter {
            ok &= self.prepare_function(getter, task);
        }
        if let Some(setter) = setter {
            ok &= self.prepare_function(setter, task);
        }
        ok
    }

    fn prepare_space(&mut self, defn: DefnId, task: AnalysisTask) -> bool {
        let Some(scope) = self.ctx.defs.member_scope(defn) else {
            return true;
        };
        let members: Vec<DefnId> = self.ctx.scopes.get(scope).members().collect();
        let mut ok = true;
        for member in members {
            // Code generation is only requested on singular definitions;
            // templates contribute through their instances.
            if task == AnalysisTask::PrepCodeGeneration && self.ctx.defs.get(member).is_template()
            {
                self.prepare(member, AnalysisTask::PrepTypeComparison);
                continue;
            }
            ok &= self.prepare(member, task);
        }
        ok
    }

    // ====================================================================
    // Shared helpers
    // ====================================================================

    /// The scope a definition's own names resolve in: its member scope if
    /// it has one, else the nearest enclosing scope.
    pub(crate) fn defining_scope(&self, defn: DefnId) -> quill_identity::ScopeId {
        let mut current = Some(defn);
        while let Some(d) = current {
            // A template's members resolve through its parameter scope.
            if let Some(template) = self.ctx.defs.get(d).template {
                return self.ctx.templates.get(template).param_scope;
            }
            if let Some(scope) = self.ctx.defs.member_scope(d) {
                return scope;
            }
            current = self.ctx.defs.get(d).parent;
        }
        self.ctx.builtins.root_scope
    }

    /// The scope in which a definition's *siblings* live.
    pub(crate) fn enclosing_scope(&self, defn: DefnId) -> quill_identity::ScopeId {
        match self.ctx.defs.get(defn).parent {
            Some(parent) => self.defining_scope(parent),
            None => self.ctx.builtins.root_scope,
        }
    }

    pub(crate) fn defn_display(&self, defn: DefnId) -> String {
        self.ctx
            .interner
            .resolve(self.ctx.defs.get(defn).name)
            .to_string()
    }

    pub(crate) fn type_display(&self, ty: crate::types::TypeId) -> String {
        let mut out = String::new();
        crate::types::type_linkage_name(
            &mut out,
            &self.ctx.registry,
            &self.ctx.defs,
            &self.ctx.interner,
            &self.ctx.names,
            ty,
        );
        out
    }

    /// Report a circular-dependency failure for a pass.
    pub(crate) fn report_circular(&mut self, defn: DefnId, pass: Pass) {
        let name = self.defn_display(defn);
        let span = self.ctx.defs.get(defn).span;
        self.ctx.diagnostics.error(
            SemanticError::CircularDependency {
                name,
                pass: pass.to_string(),
                span: span.into(),
            },
            span,
        );
    }
}
