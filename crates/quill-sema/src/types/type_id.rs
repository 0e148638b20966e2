// types/type_id.rs
//
// TypeId: interned type handle with reserved constants for primitives.

use smallvec::SmallVec;

/// Handle to an interned type in the `TypeRegistry`.
///
/// Handle equality implies semantic equality after canonicalisation:
/// structurally equal constructions return the same `TypeId`, so type
/// comparison is a u32 compare. Aliases and inference assignments must be
/// dereferenced (`relation::deref`) before comparing handles.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u32);

impl TypeId {
    // ========================================================================
    // Reserved TypeIds for primitives.
    // These are guaranteed to be interned at these indices by
    // TypeRegistry::new().
    // ========================================================================

    // Error sentinel (must be 0 for is_bad() check). Definitions that fail
    // an early pass produce this so dependents keep analyzing.
    pub const BAD: TypeId = TypeId(0);

    pub const VOID: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const CHAR: TypeId = TypeId(3);

    // Signed integers
    pub const INT8: TypeId = TypeId(4);
    pub const INT16: TypeId = TypeId(5);
    pub const INT32: TypeId = TypeId(6);
    pub const INT64: TypeId = TypeId(7);

    // Unsigned integers
    pub const UINT8: TypeId = TypeId(8);
    pub const UINT16: TypeId = TypeId(9);
    pub const UINT32: TypeId = TypeId(10);
    pub const UINT64: TypeId = TypeId(11);

    // Floating point
    pub const FLOAT: TypeId = TypeId(12);
    pub const DOUBLE: TypeId = TypeId(13);

    // The type of the null literal
    pub const NULL: TypeId = TypeId(14);
    // Integer literals before a sized type has been chosen
    pub const UNSIZED_INT: TypeId = TypeId(15);

    /// First non-reserved TypeId index (for dynamic types)
    pub const FIRST_DYNAMIC: u32 = 16;

    /// Get the raw index (for debugging/serialization)
    pub fn index(self) -> u32 {
        self.0
    }

    /// Create a TypeId from a raw index (for internal use by TypeRegistry)
    pub(super) fn from_raw(index: u32) -> Self {
        TypeId(index)
    }

    /// Check if this is the error sentinel (no registry needed)
    #[inline]
    pub fn is_bad(self) -> bool {
        self == Self::BAD
    }

    #[inline]
    pub fn is_void(self) -> bool {
        self == Self::VOID
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Check if this is a signed integer type (no registry needed)
    #[inline]
    pub fn is_signed_int(self) -> bool {
        matches!(self, Self::INT8 | Self::INT16 | Self::INT32 | Self::INT64)
    }

    /// Check if this is an unsigned integer type (no registry needed)
    #[inline]
    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Self::UINT8 | Self::UINT16 | Self::UINT32 | Self::UINT64
        )
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int() || self == Self::UNSIZED_INT
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Self::FLOAT | Self::DOUBLE)
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Check if this is any reserved primitive (no registry needed)
    #[inline]
    pub fn is_primitive(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    /// Bit width of this integer type; u16::MAX for non-integers so they
    /// sort last.
    #[inline]
    pub fn integer_bit_width(self) -> u16 {
        match self {
            Self::INT8 | Self::UINT8 => 8,
            Self::INT16 | Self::UINT16 => 16,
            Self::INT32 | Self::UINT32 => 32,
            Self::INT64 | Self::UINT64 => 64,
            _ => u16::MAX,
        }
    }

    /// Check if an integer literal fits within this type's range.
    #[inline]
    pub fn fits_literal(self, value: i64) -> bool {
        match self {
            Self::INT8 => value >= i8::MIN as i64 && value <= i8::MAX as i64,
            Self::INT16 => value >= i16::MIN as i64 && value <= i16::MAX as i64,
            Self::INT32 => value >= i32::MIN as i64 && value <= i32::MAX as i64,
            Self::INT64 => true,
            Self::UINT8 => (0..=u8::MAX as i64).contains(&value),
            Self::UINT16 => (0..=u16::MAX as i64).contains(&value),
            Self::UINT32 => (0..=u32::MAX as i64).contains(&value),
            Self::UINT64 => value >= 0,
            Self::FLOAT | Self::DOUBLE => true,
            _ => false,
        }
    }
}

/// SmallVec for type children - inline up to 4 (covers most unions, tuples
/// and parameter lists)
pub type TypeIdVec = SmallVec<[TypeId; 4]>;

/// Identity handle for a type variable's side record in the registry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeVarId(pub(super) u32);

impl TypeVarId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Identity handle for an inference assignment's side record.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct AssignmentId(pub(super) u32);

impl AssignmentId {
    pub fn index(self) -> u32 {
        self.0
    }
}
