//! Shared name interning for fully-qualified item identities.
//!
//! The `NameTable` uniques dotted qualified names per module and records
//! where each name was defined, backing both symbol lookup and the linkage
//! name stream consumed by the emitter.

use rustc_hash::FxHashMap;

mod entities;
mod intern;
mod span;
mod symbol;

pub use entities::{DefnId, NodeId, ScopeId, TemplateId};
pub use intern::Interner;
pub use span::Span;
pub use symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameId(u32);

impl NameId {
    /// Create a NameId for testing purposes only.
    /// Production code should use NameTable::intern() instead.
    #[doc(hidden)]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}

/// A dotted, module-qualified name such as `geom.Point.x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    module: ModuleId,
    segments: Vec<String>,
}

impl QualifiedName {
    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NameKey {
    module: ModuleId,
    segments: Vec<String>,
}

/// Source location where a name was defined (for diagnostics)
#[derive(Debug, Clone)]
pub struct DefLocation {
    pub file: String,
    pub span: Span,
}

/// Macro for defining name-based primitives with a single source of truth.
/// Each entry defines the field name (which is also used as the string key
/// for by_name lookup).
macro_rules! define_name_primitives {
    ($($name:ident),* $(,)?) => {
        /// Cached NameIds for language primitives.
        /// Registered at NameTable creation, always available.
        #[derive(Debug, Clone)]
        pub struct Primitives {
            $(pub $name: NameId),*
        }

        impl Primitives {
            /// Look up a primitive by name
            pub fn by_name(&self, name: &str) -> Option<NameId> {
                match name {
                    $(stringify!($name) => Some(self.$name)),*,
                    _ => None,
                }
            }

            fn placeholder(placeholder: NameId) -> Self {
                Self {
                    $($name: placeholder),*
                }
            }

            /// Register all primitives, interning via the provided closure.
            fn register<F>(mut intern: F) -> Self
            where
                F: FnMut(&str) -> NameId,
            {
                Self {
                    $($name: intern(stringify!($name))),*
                }
            }

            /// Iterate over all primitive NameIds.
            pub fn iter(&self) -> impl Iterator<Item = NameId> + '_ {
                [$(self.$name),*].into_iter()
            }
        }
    };
}

// The names of every sized primitive type in the surface language.
define_name_primitives!(
    void, bool, char, int8, int16, int32, int64, uint8, uint16, uint32, uint64, float, double,
);

#[derive(Debug, Clone)]
pub struct NameTable {
    modules: Vec<String>,
    module_lookup: FxHashMap<String, ModuleId>,
    names: Vec<QualifiedName>,
    name_lookup: FxHashMap<NameKey, NameId>,
    main_module: ModuleId,
    locations: FxHashMap<NameId, DefLocation>,
    pub primitives: Primitives,
}

impl NameTable {
    pub fn new() -> Self {
        // Placeholder NameIds are overwritten before new() returns.
        let mut table = Self {
            modules: Vec::new(),
            module_lookup: FxHashMap::default(),
            names: Vec::new(),
            name_lookup: FxHashMap::default(),
            main_module: ModuleId(0),
            locations: FxHashMap::default(),
            primitives: Primitives::placeholder(NameId(0)),
        };
        let main_module = table.module_id("main");
        table.main_module = main_module;
        let _ = table.module_id("");

        table.primitives = table.register_primitives();
        table
    }

    fn register_primitives(&mut self) -> Primitives {
        let builtin = self.builtin_module();
        Primitives::register(|name| self.intern_raw(builtin, &[name]))
    }

    pub fn main_module(&self) -> ModuleId {
        self.main_module
    }

    pub fn module_id(&mut self, path: &str) -> ModuleId {
        if let Some(id) = self.module_lookup.get(path) {
            return *id;
        }
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(path.to_string());
        self.module_lookup.insert(path.to_string(), id);
        id
    }

    pub fn module_id_if_known(&self, path: &str) -> Option<ModuleId> {
        self.module_lookup.get(path).copied()
    }

    pub fn builtin_module(&mut self) -> ModuleId {
        self.module_id("")
    }

    pub fn builtin_module_id(&self) -> Option<ModuleId> {
        self.module_id_if_known("")
    }

    pub fn module_path(&self, module: ModuleId) -> &str {
        &self.modules[module.0 as usize]
    }

    pub fn intern(&mut self, module: ModuleId, segments: &[Symbol], interner: &Interner) -> NameId {
        let string_segments: Vec<&str> = segments.iter().map(|s| interner.resolve(*s)).collect();
        self.intern_raw(module, &string_segments)
    }

    pub fn intern_raw(&mut self, module: ModuleId, segments: &[&str]) -> NameId {
        let key = NameKey {
            module,
            segments: segments.iter().map(|s| (*s).to_string()).collect(),
        };
        if let Some(id) = self.name_lookup.get(&key) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(QualifiedName {
            module,
            segments: key.segments.clone(),
        });
        self.name_lookup.insert(key, id);
        id
    }

    /// Intern a name built from a prefix NameId plus one extra segment.
    pub fn intern_member(&mut self, prefix: NameId, symbol: Symbol, interner: &Interner) -> NameId {
        let name = self.name(prefix);
        let module = name.module;
        let mut segments = name.segments.clone();
        segments.push(interner.resolve(symbol).to_string());
        let key = NameKey {
            module,
            segments: segments.clone(),
        };
        if let Some(id) = self.name_lookup.get(&key) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(QualifiedName { module, segments });
        self.name_lookup.insert(key, id);
        id
    }

    pub fn name_id(
        &self,
        module: ModuleId,
        segments: &[Symbol],
        interner: &Interner,
    ) -> Option<NameId> {
        let string_segments: Vec<&str> = segments.iter().map(|s| interner.resolve(*s)).collect();
        self.name_id_raw(module, &string_segments)
    }

    pub fn name_id_raw(&self, module: ModuleId, segments: &[&str]) -> Option<NameId> {
        let key = NameKey {
            module,
            segments: segments.iter().map(|s| (*s).to_string()).collect(),
        };
        self.name_lookup.get(&key).copied()
    }

    pub fn name(&self, id: NameId) -> &QualifiedName {
        &self.names[id.0 as usize]
    }

    pub fn module_of(&self, id: NameId) -> ModuleId {
        self.name(id).module
    }

    /// Render a name with dotted segments, prefixed by its module path.
    pub fn display(&self, id: NameId) -> String {
        let name = self.name(id);
        let module = self.module_path(name.module);
        let mut out = String::new();
        if !module.is_empty() {
            out.push_str(module);
        }
        for segment in name.segments.iter() {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    pub fn last_segment_str(&self, id: NameId) -> Option<String> {
        self.name(id).segments.last().cloned()
    }

    /// Record where a name was defined (for error messages)
    pub fn set_location(&mut self, id: NameId, file: &str, span: Span) {
        self.locations.insert(
            id,
            DefLocation {
                file: file.to_string(),
                span,
            },
        );
    }

    /// Get the definition location for a name (if recorded)
    pub fn location(&self, id: NameId) -> Option<&DefLocation> {
        self.locations.get(&id)
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_table_displays_module_and_segments() {
        let mut interner = Interner::new();
        let geom = interner.intern("geom");
        let point = interner.intern("Point");

        let mut names = NameTable::new();
        let module = names.module_id("shapes");
        let name_id = names.intern(module, &[geom, point], &interner);

        assert_eq!(names.display(name_id), "shapes.geom.Point");
    }

    #[test]
    fn primitives_registered_at_creation() {
        let names = NameTable::new();

        assert_eq!(names.display(names.primitives.int32), "int32");
        assert_eq!(names.display(names.primitives.double), "double");
        assert_eq!(names.display(names.primitives.bool), "bool");
    }

    #[test]
    fn primitives_by_name_lookup() {
        let names = NameTable::new();

        assert_eq!(
            names.primitives.by_name("int32"),
            Some(names.primitives.int32)
        );
        assert_eq!(
            names.primitives.by_name("uint64"),
            Some(names.primitives.uint64)
        );
        assert_eq!(names.primitives.by_name("int"), None);
    }

    #[test]
    fn member_names_extend_prefix() {
        let mut interner = Interner::new();
        let point = interner.intern("Point");
        let x = interner.intern("x");

        let mut names = NameTable::new();
        let main = names.main_module();
        let point_id = names.intern(main, &[point], &interner);
        let x_id = names.intern_member(point_id, x, &interner);

        assert_eq!(names.display(x_id), "Point.x");
        assert_eq!(names.intern_member(point_id, x, &interner), x_id);
    }
}
