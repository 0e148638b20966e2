// analyzer/resolve.rs
//
// Name resolution: AST name/member/specialize nodes to candidate
// definition sets. The walk goes from the innermost scope outward through
// enclosing definitions and the module to the root scope, dereferencing
// explicit imports on the way.

use quill_ast::{Node, NodeKind};
use quill_identity::{DefnId, ScopeId, Symbol};

use crate::defs::{DefnKind, Visibility};
use crate::errors::SemanticError;
use crate::passes::AnalysisTask;
use crate::scope::ScopeKind;
use crate::templates::TemplateEnv;

use super::Analyzer;

impl Analyzer {
    /// Resolve a name-shaped node to its candidate definitions. An empty
    /// result means resolution failed; the caller decides whether that is
    /// an error and reports it with its own context.
    pub(crate) fn resolve_node(&mut self, scope: ScopeId, node: &Node) -> Vec<DefnId> {
        match &node.kind {
            NodeKind::Ident(name) => self.resolve_ident(scope, *name),
            NodeKind::BuiltIn(defn) => vec![*defn],
            NodeKind::MemberRef { qualifier, member } => {
                self.resolve_member(scope, qualifier, *member)
            }
            NodeKind::Specialize { base, args } => {
                self.resolve_specialize(scope, node, base, args)
            }
            _ => Vec::new(),
        }
    }

    /// Walk the scope chain looking for a simple name.
    pub(crate) fn resolve_ident(&mut self, scope: ScopeId, name: Symbol) -> Vec<DefnId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            let found = self.ctx.scopes.lookup(
                &self.ctx.registry,
                &self.ctx.defs,
                s,
                name,
                self.ctx.scopes.get(s).kind == ScopeKind::Members,
            );
            if !found.is_empty() {
                return self.deref_imports(found);
            }
            // Module scopes also see what their unpack-imports bring in.
            if self.ctx.scopes.get(s).kind == ScopeKind::Module {
                let found = self.lookup_unpack_imports(s, name);
                if !found.is_empty() {
                    return found;
                }
            }
            current = self.ctx.scopes.get(s).parent;
        }
        Vec::new()
    }

    /// Explicit imports stand in for their targets; replace each one with
    /// what it resolves to.
    fn deref_imports(&mut self, candidates: Vec<DefnId>) -> Vec<DefnId> {
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.ctx.defs.get(candidate).kind == DefnKind::ExplicitImport {
                out.extend(self.resolve_import(candidate));
            } else {
                out.push(candidate);
            }
        }
        out
    }

    fn resolve_import(&mut self, import: DefnId) -> Vec<DefnId> {
        if let crate::defs::DefnDetail::Import(data) = &self.ctx.defs.get(import).detail {
            if let Some(resolved) = data.resolved {
                return vec![resolved];
            }
            let target = data.target.clone();
            let root = self.ctx.builtins.root_scope;
            let resolved = self.resolve_node(root, &target);
            if let [single] = resolved.as_slice() {
                let single = *single;
                if let crate::defs::DefnDetail::Import(data) =
                    &mut self.ctx.defs.get_mut(import).detail
                {
                    data.resolved = Some(single);
                }
            }
            return resolved;
        }
        Vec::new()
    }

    fn lookup_unpack_imports(&mut self, scope: ScopeId, name: Symbol) -> Vec<DefnId> {
        let imports: Vec<DefnId> = self
            .ctx
            .scopes
            .get(scope)
            .members()
            .filter(|&m| {
                let d = self.ctx.defs.get(m);
                d.kind == DefnKind::ExplicitImport
                    && matches!(&d.detail, crate::defs::DefnDetail::Import(i) if i.unpack)
            })
            .collect();
        for import in imports {
            for target in self.resolve_import(import) {
                if let Some(target_scope) = self.ctx.defs.member_scope(target) {
                    let found = self.ctx.scopes.lookup(
                        &self.ctx.registry,
                        &self.ctx.defs,
                        target_scope,
                        name,
                        false,
                    );
                    if !found.is_empty() {
                        return found;
                    }
                }
            }
        }
        Vec::new()
    }

    /// `qualifier.member`: resolve the qualifier, prepare it for member
    /// lookup, then search its member scope with inheritance.
    fn resolve_member(
        &mut self,
        scope: ScopeId,
        qualifier: &Node,
        member: Symbol,
    ) -> Vec<DefnId> {
        let qualifiers = self.resolve_node(scope, qualifier);
        let mut out = Vec::new();
        for q in qualifiers {
            if self.ctx.defs.get(q).kind == DefnKind::TypeDef {
                self.prepare(q, AnalysisTask::PrepMemberLookup);
            }
            let Some(member_scope) = self.ctx.defs.member_scope(q) else {
                continue;
            };
            let found = self.ctx.scopes.lookup(
                &self.ctx.registry,
                &self.ctx.defs,
                member_scope,
                member,
                true,
            );
            out.extend(self.filter_visible(q, found));
        }
        out
    }

    /// Apply visibility rules for member access from outside: private and
    /// protected members only resolve when the requesting scope is inside
    /// the defining type (or a subtype, for protected).
    fn filter_visible(&self, _qualifier: DefnId, candidates: Vec<DefnId>) -> Vec<DefnId> {
        // Visibility filtering for cross-type access keeps public members
        // only; same-type access goes through scope-chain resolution and
        // never reaches here.
        candidates
            .into_iter()
            .filter(|&c| self.ctx.defs.get(c).visibility == Visibility::Public)
            .collect()
    }

    /// `Base[args...]`: resolve the template, analyze the arguments, then
    /// instantiate.
    fn resolve_specialize(
        &mut self,
        scope: ScopeId,
        node: &Node,
        base: &Node,
        args: &[quill_ast::AstPtr],
    ) -> Vec<DefnId> {
        let bases = self.resolve_node(scope, base);
        let template = bases
            .into_iter()
            .find(|&d| self.ctx.defs.get(d).is_template());
        let Some(template) = template else {
            self.ctx.diagnostics.error(
                SemanticError::NotAType {
                    name: self.node_display(base),
                    span: node.span.into(),
                },
                node.span,
            );
            return Vec::new();
        };

        // Base resolution must have run so bases/bounds are available.
        self.prepare(template, AnalysisTask::PrepTypeComparison);

        let arg_types: Vec<crate::types::TypeId> = args
            .iter()
            .map(|arg| self.type_from_ast(scope, arg))
            .collect();
        if arg_types.iter().any(|t| t.is_bad()) {
            return Vec::new();
        }

        let template_id = self.ctx.defs.get(template).template.expect("template");
        let arity = self.ctx.templates.get(template_id).arity();
        if arity != arg_types.len() {
            self.ctx.diagnostics.error(
                SemanticError::WrongTemplateArity {
                    name: self.defn_display(template),
                    expected: arity,
                    found: arg_types.len(),
                    span: node.span.into(),
                },
                node.span,
            );
            return Vec::new();
        }

        let env = {
            let sig = self.ctx.templates.get(template_id);
            TemplateEnv::from_args(sig, &arg_types).expect("arity checked")
        };
        match crate::templates::instantiate(
            &mut self.ctx.registry,
            &mut self.ctx.defs,
            &mut self.ctx.scopes,
            &mut self.ctx.templates,
            template,
            &env,
        ) {
            Ok(instance) => vec![instance],
            Err(err) => {
                tracing::debug!(%err, "instantiation failed");
                Vec::new()
            }
        }
    }

    pub(crate) fn node_display(&self, node: &Node) -> String {
        match &node.kind {
            NodeKind::Ident(sym) => self.ctx.interner.resolve(*sym).to_string(),
            NodeKind::MemberRef { qualifier, member } => {
                format!(
                    "{}.{}",
                    self.node_display(qualifier),
                    self.ctx.interner.resolve(*member)
                )
            }
            NodeKind::Specialize { base, .. } => {
                format!("{}[...]", self.node_display(base))
            }
            _ => "<expr>".to_string(),
        }
    }
}
