// types/convert.rs
//
// Implicit conversion ranking. Conversion dispatches first to the source
// type (a union converting out produces a checked member cast), then to
// the destination, and finally through user-declared coercers when the
// caller opted in.

use crate::defs::DefGraph;
use crate::ir::{CastKind, Expr, ExprKind};

use super::registry::TypeRegistry;
use super::relation;
use super::ty::{PrimitiveKind, Type};
use super::type_id::TypeId;

/// How good an implicit conversion is. Overload ranking compares these;
/// anything above `Incompatible` is admissible, anything below
/// `NonPreferred` warns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionRank {
    Incompatible,
    Truncation,
    IntegerToBool,
    PrecisionLoss,
    SignedUnsigned,
    NonPreferred,
    ExactConversion,
    IdenticalTypes,
}

impl ConversionRank {
    pub fn is_warning(self) -> bool {
        self > ConversionRank::Incompatible && self < ConversionRank::NonPreferred
    }
}

/// Caller-selected conversion behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    /// Try declared static `coerce` methods when direct conversion fails.
    pub coerce: bool,
    /// Explicit cast context: checked union member casts are allowed.
    pub explicit: bool,
}

/// A ranked conversion, optionally with the cast expression that realizes
/// it when a source expression was supplied.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub rank: ConversionRank,
    pub result: Option<Expr>,
}

impl Conversion {
    fn incompatible() -> Self {
        Self {
            rank: ConversionRank::Incompatible,
            result: None,
        }
    }

    fn rank_only(rank: ConversionRank) -> Self {
        Self { rank, result: None }
    }
}

/// Conversion queries can fail structurally: asking for the coercer path
/// before the Converter pass has recorded coercers is a caller bug, and is
/// reported instead of silently mis-ranking.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    #[error("coercion requested before converter pass ran on the target type")]
    ConverterPassNotRun(quill_identity::DefnId),
}

/// Rank the implicit conversion `from -> to`, producing the realizing cast
/// when `source` is given.
pub fn convert(
    registry: &TypeRegistry,
    defs: &DefGraph,
    from: TypeId,
    to: TypeId,
    options: ConvertOptions,
    source: Option<&Expr>,
) -> Result<Conversion, ConvertError> {
    let from = relation::deref(registry, defs, from);
    let to = relation::deref(registry, defs, to);

    if from == to {
        return Ok(Conversion {
            rank: ConversionRank::IdenticalTypes,
            result: source.cloned(),
        });
    }
    if from.is_bad() || to.is_bad() {
        // Error recovery: pretend compatibility so diagnostics don't cascade.
        return Ok(Conversion {
            rank: ConversionRank::IdenticalTypes,
            result: source.cloned(),
        });
    }

    // Source-directed conversions first.
    let out = convert_to(registry, defs, from, to, options, source)?;
    if out.rank != ConversionRank::Incompatible {
        return Ok(out);
    }

    // Destination-directed conversions.
    let out = convert_impl(registry, defs, from, to, options, source)?;
    if out.rank != ConversionRank::Incompatible {
        return Ok(out);
    }

    // Last resort: declared coercers on a composite destination.
    if options.coerce {
        if let Some((_, defn)) = registry.as_composite(to) {
            if !defs.converter_pass_finished(defn) {
                return Err(ConvertError::ConverterPassNotRun(defn));
            }
            let mut best = ConversionRank::Incompatible;
            let inner = ConvertOptions::default();
            for &coercer in defs.coercers(defn) {
                let Some(sig_ty) = defs.function_type(coercer) else {
                    continue;
                };
                let Some(sig) = registry.as_function(sig_ty) else {
                    continue;
                };
                let Some(param) = sig.params.first() else {
                    continue;
                };
                // Two hops: from -> parameter, return -> destination.
                let hop_in = convert(registry, defs, from, param.ty, inner, None)?.rank;
                let hop_out = convert(registry, defs, sig.return_type, to, inner, None)?.rank;
                best = best.max(hop_in.min(hop_out));
            }
            if best != ConversionRank::Incompatible {
                let result = source.map(|expr| {
                    Expr::new(
                        ExprKind::Cast {
                            kind: CastKind::Coerce,
                            arg: Box::new(expr.clone()),
                        },
                        to,
                        expr.span,
                    )
                });
                return Ok(Conversion { rank: best, result });
            }
        }
    }

    Ok(Conversion::incompatible())
}

/// Conversions the source type knows about the destination.
fn convert_to(
    registry: &TypeRegistry,
    defs: &DefGraph,
    from: TypeId,
    to: TypeId,
    _options: ConvertOptions,
    source: Option<&Expr>,
) -> Result<Conversion, ConvertError> {
    if let Type::Union(u) = registry.get(from) {
        // `T or Null -> T` style extraction: a single-optional union may
        // convert to its sole non-sentinel member with a checked cast.
        if u.is_single_optional() && registry.get(to).is_reference_kind() {
            let member = u
                .members
                .iter()
                .copied()
                .find(|m| !m.is_void() && !m.is_null());
            if let Some(member) = member {
                let rank = convert(registry, defs, member, to, ConvertOptions::default(), None)?
                    .rank;
                if rank != ConversionRank::Incompatible {
                    let rank = if rank == ConversionRank::IdenticalTypes {
                        ConversionRank::ExactConversion
                    } else {
                        rank
                    };
                    let result = source.map(|expr| {
                        Expr::new(
                            ExprKind::Cast {
                                kind: CastKind::CheckedUnionMember,
                                arg: Box::new(expr.clone()),
                            },
                            to,
                            expr.span,
                        )
                    });
                    return Ok(Conversion { rank, result });
                }
            }
        }
    }
    Ok(Conversion::incompatible())
}

/// Conversions the destination type accepts.
fn convert_impl(
    registry: &TypeRegistry,
    defs: &DefGraph,
    from: TypeId,
    to: TypeId,
    options: ConvertOptions,
    source: Option<&Expr>,
) -> Result<Conversion, ConvertError> {
    match registry.get(to) {
        Type::Primitive(to_kind) => {
            let from_kind = match registry.get(from) {
                Type::Primitive(k) => *k,
                Type::Enum { base, .. } => {
                    // Enums convert out through their base integer type.
                    let base = *base;
                    let mut out =
                        convert_impl(registry, defs, base, to, options, source)?;
                    out.rank = out.rank.min(ConversionRank::NonPreferred);
                    return Ok(out);
                }
                _ => return Ok(Conversion::incompatible()),
            };
            Ok(primitive_convert(from_kind, *to_kind, from, to, source))
        }

        Type::Union(u) => {
            // Find the best member to convert into, then wrap.
            let members: Vec<TypeId> = u.members.iter().copied().collect();
            let mut best_rank = ConversionRank::Incompatible;
            let mut best_member = None;
            for &member in &members {
                let rank = convert(registry, defs, from, member, ConvertOptions::default(), None)?
                    .rank;
                if rank > best_rank {
                    best_rank = rank;
                    best_member = Some(member);
                }
            }
            let Some(best_member) = best_member else {
                return Ok(Conversion::incompatible());
            };
            if best_rank == ConversionRank::Incompatible {
                return Ok(Conversion::incompatible());
            }
            let result = match source {
                Some(expr) => {
                    let converted =
                        convert(registry, defs, from, best_member, ConvertOptions::default(),
                            Some(expr))?;
                    let index = registry
                        .as_union(to)
                        .and_then(|u| u.type_index(best_member))
                        .unwrap_or(0) as u32;
                    converted.result.map(|inner| {
                        Expr::new(
                            ExprKind::Cast {
                                kind: CastKind::UnionCtor(index),
                                arg: Box::new(inner),
                            },
                            to,
                            expr.span,
                        )
                    })
                }
                None => None,
            };
            Ok(Conversion {
                rank: best_rank,
                result,
            })
        }

        Type::Composite { kind, .. } => {
            // Null converts to any reference composite.
            if from.is_null() && kind.is_reference() {
                let result = source.map(|expr| {
                    Expr::new(
                        ExprKind::Cast {
                            kind: CastKind::Upcast,
                            arg: Box::new(expr.clone()),
                        },
                        to,
                        expr.span,
                    )
                });
                return Ok(Conversion {
                    rank: ConversionRank::ExactConversion,
                    result,
                });
            }
            // Upcast along the hierarchy.
            if relation::is_subtype(registry, defs, from, to) {
                let result = source.map(|expr| {
                    Expr::new(
                        ExprKind::Cast {
                            kind: CastKind::Upcast,
                            arg: Box::new(expr.clone()),
                        },
                        to,
                        expr.span,
                    )
                });
                return Ok(Conversion {
                    rank: ConversionRank::ExactConversion,
                    result,
                });
            }
            Ok(Conversion::incompatible())
        }

        Type::Tuple(to_members) => {
            let Type::Tuple(from_members) = registry.get(from) else {
                return Ok(Conversion::incompatible());
            };
            if from_members.len() != to_members.len() {
                return Ok(Conversion::incompatible());
            }
            let pairs: Vec<(TypeId, TypeId)> = from_members
                .iter()
                .copied()
                .zip(to_members.iter().copied())
                .collect();
            let mut rank = ConversionRank::IdenticalTypes;
            for (f, t) in pairs {
                let member_rank =
                    convert(registry, defs, f, t, ConvertOptions::default(), None)?.rank;
                rank = rank.min(member_rank);
                if rank == ConversionRank::Incompatible {
                    break;
                }
            }
            // Not the same tuple handle, so it cannot be identical.
            Ok(Conversion::rank_only(
                rank.min(ConversionRank::ExactConversion),
            ))
        }

        _ => Ok(Conversion::incompatible()),
    }
}

/// The primitive-to-primitive rank table.
fn primitive_convert(
    from_kind: PrimitiveKind,
    to_kind: PrimitiveKind,
    _from: TypeId,
    to: TypeId,
    source: Option<&Expr>,
) -> Conversion {
    use PrimitiveKind::*;

    let (rank, cast) = match (from_kind, to_kind) {
        // Unsized integer literals take the size the context asks for.
        (UnsizedInt, k) if k.is_integer() => (ConversionRank::ExactConversion, None),
        (UnsizedInt, Float | Double) => {
            (ConversionRank::ExactConversion, Some(CastKind::IntToFloat))
        }

        (f, t) if f.is_integer() && t.is_integer() => integer_convert(f, t),

        (f, Float | Double) if f.is_integer() => {
            // Exact when the mantissa can hold every value of the source.
            let mantissa = if to_kind == Float { 24 } else { 53 };
            let rank = if f.bit_width() <= mantissa {
                ConversionRank::ExactConversion
            } else {
                ConversionRank::PrecisionLoss
            };
            (rank, Some(CastKind::IntToFloat))
        }

        (Float, Double) => (ConversionRank::ExactConversion, Some(CastKind::FloatToFloat)),
        (Double, Float) => (ConversionRank::PrecisionLoss, Some(CastKind::FloatToFloat)),
        (f, t) if f.is_float() && t.is_integer() => {
            (ConversionRank::Truncation, Some(CastKind::Truncate))
        }

        (f, Bool) if f.is_integer() => (ConversionRank::IntegerToBool, Some(CastKind::IntToBool)),

        // Char widens into integers that can hold all code points.
        (Char, UInt32 | UInt64 | Int64) => (ConversionRank::NonPreferred, Some(CastKind::ZeroExtend)),

        _ => (ConversionRank::Incompatible, None),
    };

    if rank == ConversionRank::Incompatible {
        return Conversion::incompatible();
    }
    let result = source.map(|expr| match cast {
        Some(kind) => Expr::new(
            ExprKind::Cast {
                kind,
                arg: Box::new(expr.clone()),
            },
            to,
            expr.span,
        ),
        None => expr.clone(),
    });
    Conversion { rank, result }
}

fn integer_convert(from: PrimitiveKind, to: PrimitiveKind) -> (ConversionRank, Option<CastKind>) {
    let from_bits = from.bit_width();
    let to_bits = to.bit_width();
    let widen_cast = if from.is_signed() {
        CastKind::SignExtend
    } else {
        CastKind::ZeroExtend
    };

    if from.is_signed() == to.is_signed() {
        if to_bits > from_bits {
            (ConversionRank::ExactConversion, Some(widen_cast))
        } else {
            (ConversionRank::Truncation, Some(CastKind::Truncate))
        }
    } else if !from.is_signed() && to.is_signed() {
        // Unsigned fits in a strictly wider signed type.
        if to_bits > from_bits {
            (ConversionRank::ExactConversion, Some(CastKind::ZeroExtend))
        } else {
            (ConversionRank::SignedUnsigned, Some(CastKind::ZeroExtend))
        }
    } else {
        // Signed to unsigned always risks the sign.
        if to_bits >= from_bits {
            (ConversionRank::SignedUnsigned, Some(widen_cast))
        } else {
            (ConversionRank::Truncation, Some(CastKind::Truncate))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::DefGraph;

    fn fixture() -> (TypeRegistry, DefGraph) {
        (TypeRegistry::new(), DefGraph::new())
    }

    fn rank(registry: &TypeRegistry, defs: &DefGraph, from: TypeId, to: TypeId) -> ConversionRank {
        convert(registry, defs, from, to, ConvertOptions::default(), None)
            .unwrap()
            .rank
    }

    #[test]
    fn identical_types_rank_identical() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::INT32, TypeId::INT32),
            ConversionRank::IdenticalTypes
        );
    }

    #[test]
    fn integer_widening_is_exact() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::INT32, TypeId::INT64),
            ConversionRank::ExactConversion
        );
        assert_eq!(
            rank(&registry, &defs, TypeId::UINT8, TypeId::INT16),
            ConversionRank::ExactConversion
        );
    }

    #[test]
    fn integer_narrowing_truncates() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::INT64, TypeId::INT32),
            ConversionRank::Truncation
        );
    }

    #[test]
    fn signed_unsigned_mismatch() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::INT32, TypeId::UINT32),
            ConversionRank::SignedUnsigned
        );
        assert_eq!(
            rank(&registry, &defs, TypeId::UINT32, TypeId::INT32),
            ConversionRank::SignedUnsigned
        );
    }

    #[test]
    fn int_to_float_precision() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::INT16, TypeId::FLOAT),
            ConversionRank::ExactConversion
        );
        assert_eq!(
            rank(&registry, &defs, TypeId::INT64, TypeId::DOUBLE),
            ConversionRank::PrecisionLoss
        );
        assert_eq!(
            rank(&registry, &defs, TypeId::DOUBLE, TypeId::INT64),
            ConversionRank::Truncation
        );
    }

    #[test]
    fn int_to_bool_is_flagged() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::INT32, TypeId::BOOL),
            ConversionRank::IntegerToBool
        );
        assert!(ConversionRank::IntegerToBool.is_warning());
    }

    #[test]
    fn union_accepts_member_with_ctor_cast() {
        let (mut registry, defs) = fixture();
        let u = registry.union(&defs, vec![TypeId::INT32, TypeId::BOOL]);
        let source = Expr::new(ExprKind::ConstInt(5), TypeId::INT32, Default::default());
        let conv = convert(
            &registry,
            &defs,
            TypeId::INT32,
            u,
            ConvertOptions::default(),
            Some(&source),
        )
        .unwrap();
        assert_eq!(conv.rank, ConversionRank::IdenticalTypes);
        let result = conv.result.expect("cast expression");
        assert!(matches!(
            result.kind,
            ExprKind::Cast {
                kind: CastKind::UnionCtor(_),
                ..
            }
        ));
        assert_eq!(result.ty, u);
    }

    #[test]
    fn incompatible_types_do_not_convert() {
        let (registry, defs) = fixture();
        assert_eq!(
            rank(&registry, &defs, TypeId::BOOL, TypeId::DOUBLE),
            ConversionRank::Incompatible
        );
    }
}
