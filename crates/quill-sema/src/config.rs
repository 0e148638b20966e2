// config.rs
//
// Host-facing compiler options. The embedder fills this in; the middle-end
// only reads it.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Where the emitter writes its artifacts.
    pub output_directory: PathBuf,
    /// Dump analyzed IR after completion.
    pub dump_ir: bool,
    /// Show synthesized definitions (default constructors, template
    /// instances) in dumps.
    pub show_generated: bool,
    /// Ask the emitter to attach debug info.
    pub debug_info: bool,
    /// Emit the reflection name stream.
    pub reflection_enabled: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            dump_ir: false,
            show_generated: false,
            debug_info: false,
            reflection_enabled: true,
        }
    }
}
