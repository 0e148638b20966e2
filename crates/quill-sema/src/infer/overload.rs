// infer/overload.rs
//
// Overload selection. Each candidate call derives one conversion per
// argument; a candidate's score is the pointwise minimum rank. Higher
// minima win; equal minima break on the count of identical/exact
// positions, then on specificity of the parameter tuple.

use crate::defs::DefGraph;
use crate::types::{relation, ConversionRank, TypeId, TypeIdVec, TypeRegistry};

/// One callable under consideration.
#[derive(Debug, Clone)]
pub struct OverloadCandidate {
    pub defn: quill_identity::DefnId,
    /// One rank per argument position.
    pub conversion_ranks: Vec<ConversionRank>,
    /// The candidate's parameter types, for the specificity tiebreak.
    pub param_types: TypeIdVec,
}

impl OverloadCandidate {
    /// Pointwise minimum over the argument conversions. A zero-argument
    /// call scores as identical.
    fn score(&self) -> ConversionRank {
        self.conversion_ranks
            .iter()
            .copied()
            .min()
            .unwrap_or(ConversionRank::IdenticalTypes)
    }

    fn exact_positions(&self) -> usize {
        self.conversion_ranks
            .iter()
            .filter(|&&r| r >= ConversionRank::ExactConversion)
            .count()
    }
}

/// The outcome of ranking a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverloadResolution {
    /// Index of the single best candidate.
    Selected(usize),
    /// No candidate is callable with the given arguments.
    NoMatch,
    /// Several candidates survive every tiebreak.
    Ambiguous(Vec<usize>),
}

/// Is `a` more specific than `b`: is a's parameter tuple a subtype of b's?
fn more_specific(
    registry: &TypeRegistry,
    defs: &DefGraph,
    a: &OverloadCandidate,
    b: &OverloadCandidate,
) -> bool {
    if a.param_types.len() != b.param_types.len() {
        return false;
    }
    let mut strictly = false;
    for (&pa, &pb) in a.param_types.iter().zip(b.param_types.iter()) {
        if !relation::is_subtype(registry, defs, pa, pb) {
            return false;
        }
        if !relation::is_equal(registry, defs, pa, pb) {
            strictly = true;
        }
    }
    strictly
}

/// Pick the best candidate, if one exists.
pub fn select_overload(
    registry: &TypeRegistry,
    defs: &DefGraph,
    candidates: &[OverloadCandidate],
) -> OverloadResolution {
    // Drop anything with an incompatible argument.
    let callable: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.score() > ConversionRank::Incompatible)
        .map(|(i, _)| i)
        .collect();
    if callable.is_empty() {
        return OverloadResolution::NoMatch;
    }
    if callable.len() == 1 {
        return OverloadResolution::Selected(callable[0]);
    }

    // Highest minimum rank wins.
    let best_score = callable
        .iter()
        .map(|&i| candidates[i].score())
        .max()
        .expect("non-empty");
    let mut survivors: Vec<usize> = callable
        .into_iter()
        .filter(|&i| candidates[i].score() == best_score)
        .collect();
    if survivors.len() == 1 {
        return OverloadResolution::Selected(survivors[0]);
    }

    // Cardinality of identical/exact positions.
    let best_exact = survivors
        .iter()
        .map(|&i| candidates[i].exact_positions())
        .max()
        .expect("non-empty");
    survivors.retain(|&i| candidates[i].exact_positions() == best_exact);
    if survivors.len() == 1 {
        return OverloadResolution::Selected(survivors[0]);
    }

    // Specificity: keep candidates not strictly beaten by another survivor.
    let beaten: Vec<usize> = survivors
        .iter()
        .copied()
        .filter(|&i| {
            survivors.iter().any(|&j| {
                j != i && more_specific(registry, defs, &candidates[j], &candidates[i])
            })
        })
        .collect();
    survivors.retain(|i| !beaten.contains(i));

    match survivors.len() {
        0 => OverloadResolution::NoMatch,
        1 => OverloadResolution::Selected(survivors[0]),
        _ => OverloadResolution::Ambiguous(survivors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_identity::DefnId;
    use smallvec::smallvec;

    fn candidate(ranks: Vec<ConversionRank>, params: TypeIdVec) -> OverloadCandidate {
        OverloadCandidate {
            defn: DefnId::new(0),
            conversion_ranks: ranks,
            param_types: params,
        }
    }

    #[test]
    fn higher_minimum_rank_wins() {
        let registry = TypeRegistry::new();
        let defs = DefGraph::new();
        let candidates = vec![
            candidate(
                vec![ConversionRank::ExactConversion, ConversionRank::Truncation],
                smallvec![TypeId::INT32, TypeId::INT8],
            ),
            candidate(
                vec![
                    ConversionRank::ExactConversion,
                    ConversionRank::ExactConversion,
                ],
                smallvec![TypeId::INT64, TypeId::INT64],
            ),
        ];
        assert_eq!(
            select_overload(&registry, &defs, &candidates),
            OverloadResolution::Selected(1)
        );
    }

    #[test]
    fn exact_position_count_breaks_ties() {
        let registry = TypeRegistry::new();
        let defs = DefGraph::new();
        let candidates = vec![
            candidate(
                vec![
                    ConversionRank::IdenticalTypes,
                    ConversionRank::ExactConversion,
                ],
                smallvec![TypeId::INT32, TypeId::INT64],
            ),
            candidate(
                vec![ConversionRank::NonPreferred, ConversionRank::ExactConversion],
                smallvec![TypeId::CHAR, TypeId::INT64],
            ),
        ];
        // Scores: min = Exact vs NonPreferred; first wins on score alone.
        assert_eq!(
            select_overload(&registry, &defs, &candidates),
            OverloadResolution::Selected(0)
        );
    }

    #[test]
    fn specificity_breaks_remaining_ties() {
        let mut registry = TypeRegistry::new();
        let defs = DefGraph::new();
        // Equal ranks and exact counts; int32 is a subtype of the union,
        // so the int32 candidate is strictly more specific.
        let wide = registry.union(&defs, vec![TypeId::INT32, TypeId::BOOL]);
        let candidates = vec![
            candidate(
                vec![ConversionRank::IdenticalTypes],
                smallvec![TypeId::INT32],
            ),
            candidate(vec![ConversionRank::IdenticalTypes], smallvec![wide]),
        ];
        assert_eq!(
            select_overload(&registry, &defs, &candidates),
            OverloadResolution::Selected(0)
        );
    }

    #[test]
    fn unresolvable_tie_is_ambiguous() {
        let registry = TypeRegistry::new();
        let defs = DefGraph::new();
        let candidates = vec![
            candidate(
                vec![ConversionRank::ExactConversion],
                smallvec![TypeId::INT64],
            ),
            candidate(
                vec![ConversionRank::ExactConversion],
                smallvec![TypeId::DOUBLE],
            ),
        ];
        assert_eq!(
            select_overload(&registry, &defs, &candidates),
            OverloadResolution::Ambiguous(vec![0, 1])
        );
    }

    #[test]
    fn incompatible_candidates_drop_out() {
        let registry = TypeRegistry::new();
        let defs = DefGraph::new();
        let candidates = vec![
            candidate(
                vec![ConversionRank::Incompatible],
                smallvec![TypeId::INT32],
            ),
            candidate(
                vec![ConversionRank::Incompatible],
                smallvec![TypeId::BOOL],
            ),
        ];
        assert_eq!(
            select_overload(&registry, &defs, &candidates),
            OverloadResolution::NoMatch
        );
    }
}
