// errors.rs
//! Semantic analysis errors (E3xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("undefined name '{name}'")]
    #[diagnostic(code(E3001))]
    UnresolvedName {
        name: String,
        #[label("not found in any enclosing scope")]
        span: SourceSpan,
    },

    #[error("'{name}' is ambiguous: {count} definitions match")]
    #[diagnostic(code(E3002), help("qualify the name or remove one of the definitions"))]
    AmbiguousType {
        name: String,
        count: usize,
        #[label("ambiguous in type context")]
        span: SourceSpan,
    },

    #[error("ambiguous call to '{name}': no best overload")]
    #[diagnostic(code(E3003))]
    AmbiguousCall {
        name: String,
        #[label("candidates rank equally")]
        span: SourceSpan,
    },

    #[error("circular dependency while running {pass} of '{name}'")]
    #[diagnostic(code(E3004))]
    CircularDependency {
        name: String,
        pass: String,
        #[label("analysis re-entered itself here")]
        span: SourceSpan,
    },

    #[error("'{base}' is not a legal base for {kind} '{name}'")]
    #[diagnostic(code(E3005))]
    IllegalBase {
        name: String,
        base: String,
        kind: String,
        #[label("incompatible base kind")]
        span: SourceSpan,
    },

    #[error("base type '{base}' is final")]
    #[diagnostic(code(E3006))]
    FinalBase {
        base: String,
        #[label("cannot inherit from a final type")]
        span: SourceSpan,
    },

    #[error("definition of '{name}' conflicts with an earlier definition of a different kind")]
    #[diagnostic(code(E3007))]
    DuplicateDefinition {
        name: String,
        #[label("conflicting definition")]
        span: SourceSpan,
        #[label("earlier definition here")]
        previous: SourceSpan,
    },

    #[error("member '{name}' repeats the signature of an earlier overload")]
    #[diagnostic(code(E3008))]
    SignatureConflict {
        name: String,
        #[label("same parameter types")]
        span: SourceSpan,
        #[label("earlier overload here")]
        previous: SourceSpan,
    },

    #[error("concrete type '{name}' lacks an implementation for '{method}'")]
    #[diagnostic(
        code(E3009),
        help("implement the method or declare the type abstract")
    )]
    MissingImplementation {
        name: String,
        method: String,
        #[label("unfilled dispatch slot")]
        span: SourceSpan,
    },

    #[error("private field '{field}' has no default and cannot be initialized")]
    #[diagnostic(code(E3010))]
    MissingInit {
        field: String,
        #[label("needs a default value")]
        span: SourceSpan,
    },

    #[error("cannot convert from '{from}' to '{to}'")]
    #[diagnostic(code(E3011))]
    ConversionError {
        from: String,
        to: String,
        #[label("no implicit conversion")]
        span: SourceSpan,
    },

    #[error("union layout differs between 32-bit and 64-bit targets")]
    #[diagnostic(
        code(E3012),
        help("reorder or resize the union members so one member is largest on both targets")
    )]
    LayoutConflict {
        largest32: String,
        largest64: String,
        #[label("largest member is '{largest32}' on 32-bit but '{largest64}' on 64-bit")]
        span: SourceSpan,
    },

    #[error("'{name}' still has unbound type variables")]
    #[diagnostic(code(E3013))]
    NotSingular {
        name: String,
        #[label("code generation requires a fully monomorphized type")]
        span: SourceSpan,
    },

    #[error("interface or protocol type cannot be final")]
    #[diagnostic(code(E3014))]
    FinalInterface {
        #[label("remove 'final'")]
        span: SourceSpan,
    },

    #[error("data member '{name}' not allowed in interface")]
    #[diagnostic(code(E3015))]
    InterfaceStorage {
        name: String,
        #[label("interfaces declare no storage")]
        span: SourceSpan,
    },

    #[error("constructor cannot declare a return type")]
    #[diagnostic(code(E3016))]
    CtorReturnType {
        #[label("remove the return type")]
        span: SourceSpan,
    },

    #[error("constructor must be an instance method")]
    #[diagnostic(code(E3017))]
    CtorNotInstance {
        #[label("declared static")]
        span: SourceSpan,
    },

    #[error("method '{name}' overrides a base method and should be declared 'override'")]
    #[diagnostic(code(E3018), severity(warning))]
    MissingOverrideModifier {
        name: String,
        base: String,
        #[label("overrides '{base}'")]
        span: SourceSpan,
    },

    #[error("'undef' method '{name}' does not override a base class method")]
    #[diagnostic(code(E3019))]
    UndefWithoutBase {
        name: String,
        #[label("nothing to undefine")]
        span: SourceSpan,
    },

    #[error("definition of '{name}' is hidden by a same-named member")]
    #[diagnostic(code(E3020), severity(warning))]
    MemberHidden {
        name: String,
        #[label("hidden here")]
        span: SourceSpan,
    },

    #[error("interface or protocol method '{name}' cannot be final or non-public")]
    #[diagnostic(code(E3021))]
    BadInterfaceMethod {
        name: String,
        #[label("interface methods are public and overridable")]
        span: SourceSpan,
    },

    #[error("'{name}' is not a type")]
    #[diagnostic(code(E3022))]
    NotAType {
        name: String,
        #[label("a type expression is required here")]
        span: SourceSpan,
    },

    #[error("template '{name}' expects {expected} arguments, found {found}")]
    #[diagnostic(code(E3023))]
    WrongTemplateArity {
        name: String,
        expected: usize,
        found: usize,
        #[label("wrong number of type arguments")]
        span: SourceSpan,
    },

    #[error("no solution satisfies the constraints on '{var}'")]
    #[diagnostic(code(E3024))]
    NoSolution {
        var: String,
        #[label("constraints are contradictory")]
        span: SourceSpan,
    },

    #[error("coercion requested before the converter pass ran on '{name}'")]
    #[diagnostic(code(E3025))]
    ConverterPassNotRun {
        name: String,
        #[label("internal ordering bug")]
        span: SourceSpan,
    },

    #[error("cannot create a default constructor for '{name}': super type '{base}' has none")]
    #[diagnostic(code(E3026))]
    NoSuperDefaultCtor {
        name: String,
        base: String,
        #[label("super type needs a zero-argument constructor")]
        span: SourceSpan,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_their_context() {
        let err = SemanticError::UnresolvedName {
            name: "Widget".into(),
            span: (0, 6).into(),
        };
        assert_eq!(err.to_string(), "undefined name 'Widget'");

        let err = SemanticError::MissingImplementation {
            name: "C".into(),
            method: "g".into(),
            span: (0, 1).into(),
        };
        assert!(err.to_string().contains("lacks an implementation"));
    }
}
