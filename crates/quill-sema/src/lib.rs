//! Quill semantic analysis: name resolution, type construction and
//! interning, template instantiation with constraint-based inference,
//! class hierarchy analysis, and union layout planning.
//!
//! The entry point is [`Analyzer`]: feed it parsed modules, ask it to
//! prepare definitions (or everything) for code generation, then take the
//! emitter-facing [`output::CompilationOutput`] and the collected
//! diagnostics.

pub mod analyzer;
pub mod config;
pub mod context;
pub mod defs;
pub mod diagnostics;
pub mod errors;
pub mod infer;
pub mod ir;
pub mod output;
pub mod passes;
pub mod scope;
pub mod templates;
pub mod types;
pub mod well_known;

pub use analyzer::Analyzer;
pub use config::CompilerOptions;
pub use context::AnalysisContext;
pub use defs::{CompositeInfo, DefGraph, Defn, DefnKind, InterfaceTable, StorageClass, Traits};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use errors::SemanticError;
pub use infer::{Constraint, ConstraintKind, OverloadCandidate, OverloadResolution, ProvisionSet};
pub use output::{CompilationOutput, CompositeLayout, ModuleOutput};
pub use passes::{AnalysisTask, Pass, PassSet, PassState};
pub use types::{
    ConversionRank, ConvertOptions, Type, TypeId, TypeRegistry, UnionLayout, UnionShape,
};
