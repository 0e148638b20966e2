// analyzer/calls.rs
//
// Overloaded-call resolution: derive one conversion per argument for each
// candidate, hand the ranked set to the overload selector, and report
// ambiguity or no-match as diagnostics.

use quill_identity::{DefnId, Span};

use crate::errors::SemanticError;
use crate::infer::{select_overload, OverloadCandidate, OverloadResolution};
use crate::passes::AnalysisTask;
use crate::types::{convert, ConvertOptions, TypeId, TypeIdVec};

use super::Analyzer;

impl Analyzer {
    /// Pick the best callable among `candidates` for the argument types.
    /// Candidates with the wrong arity drop out; ties and empty matches
    /// are diagnosed and yield None.
    pub fn resolve_overloaded_call(
        &mut self,
        name: &str,
        candidates: &[DefnId],
        args: &[TypeId],
        span: Span,
    ) -> Option<DefnId> {
        let mut overloads: Vec<OverloadCandidate> = Vec::new();

        for &candidate in candidates {
            self.prepare_function(candidate, AnalysisTask::PrepTypeComparison);
            let Some(ftype) = self.ctx.defs.function_type(candidate) else {
                continue;
            };
            let param_types: TypeIdVec = match self.ctx.registry.as_function(ftype) {
                Some(sig) => sig.param_types(),
                None => continue,
            };

            // Arity: missing trailing arguments must have defaults.
            let required = self.required_params(candidate);
            if args.len() < required || args.len() > param_types.len() {
                continue;
            }

            let mut ranks = Vec::with_capacity(args.len());
            for (&arg, &param) in args.iter().zip(param_types.iter()) {
                let rank = match convert(
                    &self.ctx.registry,
                    &self.ctx.defs,
                    arg,
                    param,
                    ConvertOptions::default(),
                    None,
                ) {
                    Ok(conversion) => conversion.rank,
                    Err(_) => crate::types::ConversionRank::Incompatible,
                };
                ranks.push(rank);
            }
            overloads.push(OverloadCandidate {
                defn: candidate,
                conversion_ranks: ranks,
                param_types,
            });
        }

        match select_overload(&self.ctx.registry, &self.ctx.defs, &overloads) {
            OverloadResolution::Selected(index) => Some(overloads[index].defn),
            OverloadResolution::NoMatch => {
                let from = args
                    .iter()
                    .map(|&a| self.type_display(a))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.ctx.diagnostics.error(
                    SemanticError::ConversionError {
                        from: format!("({from})"),
                        to: name.to_string(),
                        span: span.into(),
                    },
                    span,
                );
                None
            }
            OverloadResolution::Ambiguous(_) => {
                self.ctx.diagnostics.error(
                    SemanticError::AmbiguousCall {
                        name: name.to_string(),
                        span: span.into(),
                    },
                    span,
                );
                None
            }
        }
    }

    fn required_params(&self, func: DefnId) -> usize {
        self.ctx
            .defs
            .get(func)
            .as_function()
            .map(|data| {
                data.params
                    .iter()
                    .filter(|&&p| {
                        self.ctx
                            .defs
                            .get(p)
                            .as_value()
                            .map(|v| v.init.is_none())
                            .unwrap_or(true)
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}
