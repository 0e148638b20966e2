// ir.rs
//
// Minimal typed expression IR. The middle-end produces these for constant
// initializers, synthesized constructor bodies and conversion results; the
// emitter consumes them alongside the analyzed definitions.

use quill_identity::{DefnId, Span};

use crate::types::TypeId;

/// A typed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeId, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// Constant-foldability decides whether a `Let` member needs storage.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::ConstInt(_)
            | ExprKind::ConstFloat(_)
            | ExprKind::ConstBool(_)
            | ExprKind::ConstChar(_)
            | ExprKind::ConstString(_)
            | ExprKind::ConstNull => true,
            ExprKind::Cast { arg, .. } => arg.is_constant(),
            _ => false,
        }
    }
}

/// How a cast expression transforms its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    /// Wrap a member value into a union; carries the member's type index.
    UnionCtor(u32),
    /// Extract a member from a union with a runtime check.
    CheckedUnionMember,
    Truncate,
    SignExtend,
    ZeroExtend,
    IntToFloat,
    FloatToFloat,
    IntToBool,
    /// Conversion through a user-declared static `coerce` method.
    Coerce,
    /// Upcast along the class hierarchy; always safe.
    Upcast,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Reference to a definition's storage (field, parameter, variable).
    LValue(DefnId),
    /// `base.field`
    Member { base: Box<Expr>, field: DefnId },
    /// `lhs = rhs`
    Assign { lhs: Box<Expr>, rhs: Box<Expr> },
    /// `callee(args...)`
    Call { callee: DefnId, args: Vec<Expr> },
    Cast { kind: CastKind, arg: Box<Expr> },
    /// Return from the enclosing function; None for void returns.
    Return(Option<Box<Expr>>),
    /// Sequential evaluation; the body of synthesized constructors.
    Seq(Vec<Expr>),

    ConstInt(i64),
    ConstFloat(f64),
    ConstBool(bool),
    ConstChar(u32),
    ConstString(String),
    ConstNull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_constant() {
        let e = Expr::new(ExprKind::ConstInt(42), TypeId::INT32, Span::default());
        assert!(e.is_constant());
    }

    #[test]
    fn casts_preserve_constness() {
        let inner = Expr::new(ExprKind::ConstInt(1), TypeId::INT32, Span::default());
        let cast = Expr::new(
            ExprKind::Cast {
                kind: CastKind::SignExtend,
                arg: Box::new(inner),
            },
            TypeId::INT64,
            Span::default(),
        );
        assert!(cast.is_constant());

        let lval = Expr::new(
            ExprKind::LValue(quill_identity::DefnId::new(0)),
            TypeId::INT32,
            Span::default(),
        );
        assert!(!lval.is_constant());
    }
}
