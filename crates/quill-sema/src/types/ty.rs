// types/ty.rs
//
// Type: the canonical interned type representation and associated data.

use quill_identity::{DefnId, ScopeId, Symbol};
use smallvec::SmallVec;

use super::type_id::{AssignmentId, TypeId, TypeIdVec, TypeVarId};

/// The closed set of primitive kinds. One singleton per kind lives at a
/// reserved TypeId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bad,
    Void,
    Bool,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Null,
    UnsizedInt,
}

impl PrimitiveKind {
    /// Storage width in bits. Null is pointer-sized (reported as 0 here,
    /// the layout planner substitutes the pointer width). UnsizedInt and
    /// Bad have no storage.
    pub fn bit_width(self) -> u32 {
        match self {
            PrimitiveKind::Bad | PrimitiveKind::Void | PrimitiveKind::UnsizedInt => 0,
            PrimitiveKind::Bool => 1,
            PrimitiveKind::Char => 32,
            PrimitiveKind::Int8 | PrimitiveKind::UInt8 => 8,
            PrimitiveKind::Int16 | PrimitiveKind::UInt16 => 16,
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 => 32,
            PrimitiveKind::Int64 | PrimitiveKind::UInt64 => 64,
            PrimitiveKind::Float => 32,
            PrimitiveKind::Double => 64,
            PrimitiveKind::Null => 0,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt8
                | PrimitiveKind::UInt16
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
                | PrimitiveKind::UnsizedInt
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8 | PrimitiveKind::Int16 | PrimitiveKind::Int32 | PrimitiveKind::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }
}

/// Which flavor of composite a type is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Class,
    Struct,
    Interface,
    Protocol,
}

impl CompositeKind {
    /// Classes and interfaces are reference types; structs and protocols
    /// are value types.
    pub fn is_reference(self) -> bool {
        matches!(self, CompositeKind::Class | CompositeKind::Interface)
    }
}

/// Per-parameter portion of a function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSig {
    pub name: Option<Symbol>,
    pub ty: TypeId,
    pub variadic: bool,
    pub by_ref: bool,
    pub keyword_only: bool,
}

impl ParamSig {
    pub fn positional(name: Option<Symbol>, ty: TypeId) -> Self {
        Self {
            name,
            ty,
            variadic: false,
            by_ref: false,
            keyword_only: false,
        }
    }
}

/// A function type's identity: the full signature tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub params: SmallVec<[ParamSig; 4]>,
    pub return_type: TypeId,
    /// Type of the receiver for instance methods.
    pub self_param: Option<TypeId>,
    pub is_static: bool,
}

impl FunctionSignature {
    pub fn param_types(&self) -> TypeIdVec {
        self.params.iter().map(|p| p.ty).collect()
    }
}

/// Canonical union payload. Members are sorted by the lexical type
/// ordering, deduplicated, and contain no member that is a subtype of
/// another member. The category counts always satisfy
/// `num_value + num_reference + has_void + has_null == members.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionData {
    pub members: TypeIdVec,
    pub num_value: u16,
    pub num_reference: u16,
    pub has_void: bool,
    pub has_null: bool,
}

impl UnionData {
    /// True when every member is a reference type (Null permitted, Void
    /// not): the union is represented as a bare pointer.
    pub fn has_ref_types_only(&self) -> bool {
        self.num_value == 0 && !self.has_void
    }

    /// `T or Null` for a single reference T, or `T or Void` for a single
    /// value T.
    pub fn is_single_optional(&self) -> bool {
        if self.num_value == 0 {
            self.has_null && !self.has_void && self.num_reference == 1
        } else if self.num_reference == 0 {
            self.has_void && !self.has_null && self.num_value == 1
        } else {
            false
        }
    }

    /// Position of `ty` in the canonical member list.
    pub fn type_index(&self, ty: TypeId) -> Option<usize> {
        self.members.iter().position(|&m| m == ty)
    }
}

/// The canonical type representation.
///
/// Interned in the TypeRegistry; use TypeId handles for O(1) equality and
/// pass-by-copy. Composite analysis results (bases, fields, dispatch
/// tables) live on the owning definition, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),

    /// Class, struct, interface or protocol. Identity is the definition.
    Composite { kind: CompositeKind, defn: DefnId },

    /// Enumeration over a base integer type. Identity is the definition.
    Enum { defn: DefnId, base: TypeId },

    Function(Box<FunctionSignature>),

    Tuple(TypeIdVec),

    Union(Box<UnionData>),

    /// Address of a pointee (native pointer).
    Address(TypeId),

    /// Fixed-length native array.
    NativeArray { element: TypeId, length: u64 },

    /// The type of a type-valued expression.
    TypeLiteral(TypeId),

    /// Named alias; the target resolves lazily through the definition.
    Alias { defn: DefnId },

    /// A template's pattern variable. Identity-interned: two variables are
    /// never the same type even when they share a name.
    TypeVariable(TypeVarId),

    /// A variable in the process of being solved. Identity-interned.
    Assignment(AssignmentId),
}

impl Type {
    /// Is a value of this type represented as a pointer to heap storage?
    /// Used by union canonicalisation counts and layout planning.
    pub fn is_reference_kind(&self) -> bool {
        match self {
            Type::Composite { kind, .. } => kind.is_reference(),
            Type::Primitive(PrimitiveKind::Null) => true,
            Type::Address(_) => true,
            _ => false,
        }
    }
}

/// Side record for a TypeVariable: its owning template, name and
/// constraints. Stored outside the interned value so bounds can be added
/// while the owning template signature is being analyzed.
#[derive(Debug, Clone)]
pub struct TypeVarData {
    pub template: DefnId,
    pub name: Symbol,
    pub upper_bound: Option<TypeId>,
}

/// Side record for a TypeAssignment: the variable being solved, the scope
/// owning the inference, and the evolving solution. Constraints accumulate
/// during unification and are examined by `find_singular_solution`.
#[derive(Debug, Clone)]
pub struct AssignmentData {
    pub target: TypeId,
    pub scope: ScopeId,
    pub sequence: u32,
    pub value: Option<TypeId>,
    pub constraints: Vec<crate::infer::Constraint>,
}
