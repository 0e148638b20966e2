//! First-class identity types for language entities.
//!
//! These types provide type-safe identifiers for definitions, scopes, AST
//! nodes and templates, eliminating string-based lookups and preventing
//! mix-ups between different entity kinds.

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u32);

        impl $name {
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> u32 {
                self.0
            }
        }
    };
}

define_entity_id! {
    /// Identity for a definition in the definition graph (type definition,
    /// function, variable, namespace, module member, parameter, import).
    pub struct DefnId;
}

define_entity_id! {
    /// Identity for a scope (module scope, type member scope, template
    /// parameter scope, local block scope).
    pub struct ScopeId;
}

define_entity_id! {
    /// Identity for a template signature.
    pub struct TemplateId;
}

define_entity_id! {
    /// Identity for an AST node handed over by the parser.
    pub struct NodeId;
}
