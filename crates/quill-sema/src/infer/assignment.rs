// infer/assignment.rs
//
// Solving a constraint system for one type assignment, and structural
// unification of pattern types against concrete types.

use crate::defs::DefGraph;
use crate::types::{relation, AssignmentId, Type, TypeId, TypeRegistry};

use super::constraint::{Constraint, ConstraintKind};

/// Unification failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UnifyError {
    #[error("types have incompatible shapes")]
    ShapeMismatch { pattern: TypeId, concrete: TypeId },
}

/// Does a candidate value satisfy one constraint?
fn accepts(
    registry: &TypeRegistry,
    defs: &DefGraph,
    constraint: &Constraint,
    value: TypeId,
) -> bool {
    let bound = relation::deref(registry, defs, constraint.value);
    match constraint.kind {
        ConstraintKind::Exact => relation::is_equal(registry, defs, value, bound),
        ConstraintKind::LowerBound => relation::is_subtype(registry, defs, bound, value),
        ConstraintKind::UpperBound => relation::is_subtype(registry, defs, value, bound),
    }
}

/// Solve the assignment's constraint system to a single type, or None.
///
/// Pass 1 intersects the enabled EXACT constraints; disagreement is
/// failure. Pass 2 folds LOWER_BOUND constraints upward through pairwise
/// common bases. Pass 3, reached only when nothing else bound the
/// variable, takes the tightest UPPER_BOUND. Whatever survives is checked
/// against every other enabled constraint before it becomes the value.
pub fn find_singular_solution(
    registry: &mut TypeRegistry,
    defs: &DefGraph,
    assignment: AssignmentId,
    live_candidates: u64,
) -> Option<TypeId> {
    let constraints: Vec<Constraint> = registry.assignment(assignment).constraints.clone();
    let enabled: Vec<&Constraint> = constraints
        .iter()
        .filter(|c| c.provisions.check(live_candidates))
        .collect();

    registry.assignment_mut(assignment).value = None;

    // Pass 1: EXACT constraints must agree.
    let mut value: Option<TypeId> = None;
    for c in enabled.iter().filter(|c| c.kind == ConstraintKind::Exact) {
        let ty = relation::deref(registry, defs, c.value);
        match value {
            None => value = Some(ty),
            Some(existing) => {
                if !relation::is_equal(registry, defs, existing, ty) {
                    return None;
                }
            }
        }
    }

    if let Some(candidate) = value {
        for c in enabled.iter().filter(|c| c.kind != ConstraintKind::Exact) {
            if !accepts(registry, defs, c, candidate) {
                return None;
            }
        }
        registry.assignment_mut(assignment).value = Some(candidate);
        return Some(candidate);
    }

    // Pass 2: fold lower bounds; the solution must sit above all of them.
    for c in enabled
        .iter()
        .filter(|c| c.kind == ConstraintKind::LowerBound)
    {
        let ty = relation::deref(registry, defs, c.value);
        match value {
            None => value = Some(ty),
            Some(existing) => {
                if relation::is_subtype(registry, defs, ty, existing) {
                    continue;
                } else if relation::is_subtype(registry, defs, existing, ty) {
                    value = Some(ty);
                } else {
                    value = relation::common_base(registry, defs, existing, ty);
                    value?;
                }
            }
        }
    }

    if let Some(candidate) = value {
        for c in enabled
            .iter()
            .filter(|c| c.kind == ConstraintKind::UpperBound)
        {
            // An upper bound that is itself unsolved cannot veto yet.
            if registry.as_assignment(c.value).is_some() {
                continue;
            }
            if !accepts(registry, defs, c, candidate) {
                return None;
            }
        }
        registry.assignment_mut(assignment).value = Some(candidate);
        return Some(candidate);
    }

    // Pass 3: only upper bounds remain; take the tightest.
    for c in enabled
        .iter()
        .filter(|c| c.kind == ConstraintKind::UpperBound)
    {
        let ty = relation::deref(registry, defs, c.value);
        match value {
            None => value = Some(ty),
            Some(existing) => {
                if relation::is_subtype(registry, defs, ty, existing) {
                    value = Some(ty);
                } else if relation::is_subtype(registry, defs, existing, ty) {
                    continue;
                } else {
                    return None;
                }
            }
        }
    }

    registry.assignment_mut(assignment).value = value;
    value
}

/// Structurally unify a pattern type (possibly containing assignments)
/// with a concrete type, accumulating constraints on the assignments.
///
/// `exact` selects EXACT constraints (invariant positions: type arguments,
/// by-ref parameters); otherwise the concrete type becomes a LOWER_BOUND,
/// letting the solver widen over several call sites.
pub fn unify(
    registry: &mut TypeRegistry,
    defs: &DefGraph,
    pattern: TypeId,
    concrete: TypeId,
    exact: bool,
    provisions: super::ProvisionSet,
) -> Result<(), UnifyError> {
    let pattern = relation::deref(registry, defs, pattern);
    let concrete = relation::deref(registry, defs, concrete);
    if pattern == concrete {
        return Ok(());
    }

    tracing::trace!(?pattern, ?concrete, exact, "unify");

    if let Some(assignment) = registry.as_assignment(pattern) {
        let constraint = if exact {
            Constraint::exact(concrete)
        } else {
            Constraint::lower_bound(concrete)
        };
        registry.add_constraint(assignment, constraint.with_provisions(provisions));
        return Ok(());
    }

    let mismatch = || UnifyError::ShapeMismatch { pattern, concrete };

    match (registry.get(pattern).clone(), registry.get(concrete).clone()) {
        (Type::Tuple(ps), Type::Tuple(cs)) if ps.len() == cs.len() => {
            for (p, c) in ps.iter().zip(cs.iter()) {
                unify(registry, defs, *p, *c, exact, provisions)?;
            }
            Ok(())
        }
        (Type::Address(p), Type::Address(c)) => unify(registry, defs, p, c, true, provisions),
        (
            Type::NativeArray {
                element: p,
                length: pl,
            },
            Type::NativeArray {
                element: c,
                length: cl,
            },
        ) if pl == cl => unify(registry, defs, p, c, true, provisions),
        (Type::Function(pf), Type::Function(cf)) if pf.params.len() == cf.params.len() => {
            for (p, c) in pf.params.iter().zip(cf.params.iter()) {
                // Parameter positions are invariant.
                unify(registry, defs, p.ty, c.ty, true, provisions)?;
            }
            unify(registry, defs, pf.return_type, cf.return_type, exact, provisions)
        }
        (Type::Union(pu), Type::Union(cu)) if pu.members.len() == cu.members.len() => {
            for (p, c) in pu.members.iter().zip(cu.members.iter()) {
                unify(registry, defs, *p, *c, exact, provisions)?;
            }
            Ok(())
        }
        (Type::TypeLiteral(p), Type::TypeLiteral(c)) => {
            unify(registry, defs, p, c, true, provisions)
        }
        // Composite patterns only match the same definition; template
        // instances resolve through their own definitions.
        (Type::Composite { defn: pd, .. }, Type::Composite { defn: cd, .. }) if pd == cd => Ok(()),
        _ => {
            // A non-variable pattern against a convertible concrete type is
            // not unification's business; the conversion ranker decides.
            if relation::is_subtype(registry, defs, concrete, pattern) {
                Ok(())
            } else {
                Err(mismatch())
            }
        }
    }
}
