// infer/constraint.rs
//
// Constraints on type assignments. Each constraint carries a provision
// set: guards that must hold for the constraint to apply, used to model
// "this only matters if overload candidate K is chosen". Provisions are a
// single-word bitset over candidate choices, so guard checking is one AND.

use crate::types::TypeId;

/// How a constraint bounds the assignment's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// The value must equal the constraint type.
    Exact,
    /// The value must be a supertype of the constraint type (the
    /// constraint is below the solution).
    LowerBound,
    /// The value must be a subtype of the constraint type.
    UpperBound,
}

/// A set of overload-candidate guards, one bit per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProvisionSet(u64);

impl ProvisionSet {
    /// The empty set: the constraint always applies.
    pub const ALWAYS: ProvisionSet = ProvisionSet(0);

    pub fn of_candidate(index: u32) -> Self {
        debug_assert!(index < 64);
        ProvisionSet(1 << index)
    }

    pub fn insert(&mut self, index: u32) {
        debug_assert!(index < 64);
        self.0 |= 1 << index;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every guard in this set is live in `live_candidates`.
    pub fn check(self, live_candidates: u64) -> bool {
        self.0 & live_candidates == self.0
    }
}

/// One constraint on a type assignment.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub kind: ConstraintKind,
    /// The bounding type; may itself contain assignments.
    pub value: TypeId,
    pub provisions: ProvisionSet,
}

impl Constraint {
    pub fn exact(value: TypeId) -> Self {
        Self {
            kind: ConstraintKind::Exact,
            value,
            provisions: ProvisionSet::ALWAYS,
        }
    }

    pub fn lower_bound(value: TypeId) -> Self {
        Self {
            kind: ConstraintKind::LowerBound,
            value,
            provisions: ProvisionSet::ALWAYS,
        }
    }

    pub fn upper_bound(value: TypeId) -> Self {
        Self {
            kind: ConstraintKind::UpperBound,
            value,
            provisions: ProvisionSet::ALWAYS,
        }
    }

    pub fn with_provisions(mut self, provisions: ProvisionSet) -> Self {
        self.provisions = provisions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_provisions_always_apply() {
        assert!(ProvisionSet::ALWAYS.check(0));
        assert!(ProvisionSet::ALWAYS.check(u64::MAX));
    }

    #[test]
    fn provisions_require_live_candidates() {
        let p = ProvisionSet::of_candidate(3);
        assert!(p.check(0b1000));
        assert!(p.check(0b1100));
        assert!(!p.check(0b0100));

        let mut both = ProvisionSet::of_candidate(1);
        both.insert(2);
        assert!(both.check(0b0110));
        assert!(!both.check(0b0010));
    }
}
