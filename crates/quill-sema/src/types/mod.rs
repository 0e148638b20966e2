// types/mod.rs
//
// The type registry and everything that operates on interned type handles.

mod convert;
mod linkage;
mod ordering;
mod registry;
pub mod relation;
mod ty;
mod type_id;
mod union_layout;

pub use convert::{convert, Conversion, ConversionRank, ConvertError, ConvertOptions};
pub use linkage::{defn_linkage_name, type_linkage_name};
pub use registry::TypeRegistry;
pub use ty::{
    AssignmentData, CompositeKind, FunctionSignature, ParamSig, PrimitiveKind, Type, TypeVarData,
    UnionData,
};
pub use type_id::{AssignmentId, TypeId, TypeIdVec, TypeVarId};
pub use union_layout::{plan as plan_union_layout, LayoutError, UnionLayout, UnionShape};

#[cfg(test)]
mod tests;
