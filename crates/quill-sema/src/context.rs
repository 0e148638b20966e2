// context.rs
//
// The per-compilation analysis context. The registry, name table,
// definition graph, scopes and diagnostic sink are owned here and passed
// explicitly; nothing in the middle-end lives in process globals.

use quill_identity::{Interner, NameTable};

use crate::config::CompilerOptions;
use crate::defs::DefGraph;
use crate::diagnostics::DiagnosticSink;
use crate::scope::ScopeTable;
use crate::templates::TemplateTable;
use crate::types::TypeRegistry;
use crate::well_known::Builtins;

pub struct AnalysisContext {
    pub interner: Interner,
    pub names: NameTable,
    pub registry: TypeRegistry,
    pub defs: DefGraph,
    pub scopes: ScopeTable,
    pub templates: TemplateTable,
    pub diagnostics: DiagnosticSink,
    pub options: CompilerOptions,
    pub builtins: Builtins,
}

impl AnalysisContext {
    pub fn new(options: CompilerOptions) -> Self {
        let mut interner = Interner::new();
        interner.seed_builtin_symbols();
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

        Self {
            interner,
            names,
            registry,
            defs,
            scopes,
            templates,
            diagnostics: DiagnosticSink::new(),
            options,
            builtins,
        }
    }
}
