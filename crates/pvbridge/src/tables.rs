// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type code tables between Generic Type element codes and structured wire tags.
//!
//! Scalar tags and array tags come from two independent tables because the
//! protocol encodes "array of T" as its own tag, not as a flag on T.
//!
//! ## Character alias
//!
//! `Char8` and `UInt8` both map to [`WireTag::UByte`]. The reverse direction
//! resolves `UByte` to `UInt8`, so character semantics do not survive a round
//! trip through the structured protocol; the byte value does.

use crate::error::{Error, Result};
use crate::generic::{GenericType, Scalar, ScalarKind};
use crate::structured::{WireScalar, WireTag};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------
//
// Written as exhaustive matches so a new `ScalarKind` or `WireTag` cannot be
// left out of a table.

/// Structured tag of a scalar code.
pub const fn scalar_tag(kind: ScalarKind) -> WireTag {
    match kind {
        ScalarKind::Bool => WireTag::Boolean,
        ScalarKind::Char8 | ScalarKind::UInt8 => WireTag::UByte,
        ScalarKind::Int8 => WireTag::Byte,
        ScalarKind::Int16 => WireTag::Short,
        ScalarKind::UInt16 => WireTag::UShort,
        ScalarKind::Int32 => WireTag::Int,
        ScalarKind::UInt32 => WireTag::UInt,
        ScalarKind::Int64 => WireTag::Long,
        ScalarKind::UInt64 => WireTag::ULong,
        ScalarKind::Float32 => WireTag::Float,
        ScalarKind::Float64 => WireTag::Double,
        ScalarKind::String => WireTag::String,
    }
}

/// Structured array tag for arrays of a scalar code.
pub const fn array_tag(kind: ScalarKind) -> WireTag {
    match kind {
        ScalarKind::Bool => WireTag::BooleanArray,
        ScalarKind::Char8 | ScalarKind::UInt8 => WireTag::UByteArray,
        ScalarKind::Int8 => WireTag::ByteArray,
        ScalarKind::Int16 => WireTag::ShortArray,
        ScalarKind::UInt16 => WireTag::UShortArray,
        ScalarKind::Int32 => WireTag::IntArray,
        ScalarKind::UInt32 => WireTag::UIntArray,
        ScalarKind::Int64 => WireTag::LongArray,
        ScalarKind::UInt64 => WireTag::ULongArray,
        ScalarKind::Float32 => WireTag::FloatArray,
        ScalarKind::Float64 => WireTag::DoubleArray,
        ScalarKind::String => WireTag::StringArray,
    }
}

/// Generic scalar code carried by a scalar or scalar-array tag.
///
/// `UByte` and `UByteArray` resolve to `UInt8`.
pub const fn scalar_kind_of(tag: WireTag) -> Option<ScalarKind> {
    Some(match tag {
        WireTag::Boolean | WireTag::BooleanArray => ScalarKind::Bool,
        WireTag::Byte | WireTag::ByteArray => ScalarKind::Int8,
        WireTag::UByte | WireTag::UByteArray => ScalarKind::UInt8,
        WireTag::Short | WireTag::ShortArray => ScalarKind::Int16,
        WireTag::UShort | WireTag::UShortArray => ScalarKind::UInt16,
        WireTag::Int | WireTag::IntArray => ScalarKind::Int32,
        WireTag::UInt | WireTag::UIntArray => ScalarKind::UInt32,
        WireTag::Long | WireTag::LongArray => ScalarKind::Int64,
        WireTag::ULong | WireTag::ULongArray => ScalarKind::UInt64,
        WireTag::Float | WireTag::FloatArray => ScalarKind::Float32,
        WireTag::Double | WireTag::DoubleArray => ScalarKind::Float64,
        WireTag::String | WireTag::StringArray => ScalarKind::String,
        WireTag::Structure
        | WireTag::StructureArray
        | WireTag::Union
        | WireTag::UnionArray => return None,
    })
}

/// Structured tag for a Generic Type.
///
/// Scalars use the base table, arrays of scalars the array table, structs map
/// to `Structure` and arrays of structs to `StructureArray`. Anything else
/// (empty types, arrays of arrays) has no tag.
pub fn structured_tag(ty: &GenericType) -> Result<WireTag> {
    match ty {
        GenericType::Scalar(kind) => Ok(scalar_tag(*kind)),
        GenericType::Struct(_) => Ok(WireTag::Structure),
        GenericType::Array(array) => match array.element.as_ref() {
            GenericType::Scalar(kind) => Ok(array_tag(*kind)),
            GenericType::Struct(_) => Ok(WireTag::StructureArray),
            other => Err(Error::UnknownType(format!("array of {}", other.describe()))),
        },
        GenericType::Empty => Err(Error::UnknownType(ty.describe())),
    }
}

// ---------------------------------------------------------------------------
// Scalar data
// ---------------------------------------------------------------------------

/// Wire datum for a Generic scalar. The result's tag is `scalar_tag(kind)`.
pub fn wire_scalar(scalar: &Scalar) -> WireScalar {
    match scalar {
        Scalar::Bool(v) => WireScalar::Boolean(*v),
        Scalar::Char8(v) | Scalar::UInt8(v) => WireScalar::UByte(*v),
        Scalar::Int8(v) => WireScalar::Byte(*v),
        Scalar::Int16(v) => WireScalar::Short(*v),
        Scalar::UInt16(v) => WireScalar::UShort(*v),
        Scalar::Int32(v) => WireScalar::Int(*v),
        Scalar::UInt32(v) => WireScalar::UInt(*v),
        Scalar::Int64(v) => WireScalar::Long(*v),
        Scalar::UInt64(v) => WireScalar::ULong(*v),
        Scalar::Float32(v) => WireScalar::Float(*v),
        Scalar::Float64(v) => WireScalar::Double(*v),
        Scalar::String(v) => WireScalar::String(v.clone()),
    }
}

/// Generic scalar for a wire datum. `UByte` yields `UInt8`.
pub fn generic_scalar(scalar: &WireScalar) -> Scalar {
    match scalar {
        WireScalar::Boolean(v) => Scalar::Bool(*v),
        WireScalar::Byte(v) => Scalar::Int8(*v),
        WireScalar::UByte(v) => Scalar::UInt8(*v),
        WireScalar::Short(v) => Scalar::Int16(*v),
        WireScalar::UShort(v) => Scalar::UInt16(*v),
        WireScalar::Int(v) => Scalar::Int32(*v),
        WireScalar::UInt(v) => Scalar::UInt32(*v),
        WireScalar::Long(v) => Scalar::Int64(*v),
        WireScalar::ULong(v) => Scalar::UInt64(*v),
        WireScalar::Float(v) => Scalar::Float32(*v),
        WireScalar::Double(v) => Scalar::Float64(*v),
        WireScalar::String(v) => Scalar::String(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_round_trips_except_char() {
        for kind in ScalarKind::ALL {
            let back = scalar_kind_of(scalar_tag(kind));
            if kind == ScalarKind::Char8 {
                assert_eq!(back, Some(ScalarKind::UInt8));
            } else {
                assert_eq!(back, Some(kind), "scalar {}", kind);
            }
            let back = scalar_kind_of(array_tag(kind));
            assert!(back.is_some(), "array {}", kind);
        }
    }

    #[test]
    fn test_array_tags_are_distinct() {
        for kind in ScalarKind::ALL {
            assert_ne!(scalar_tag(kind), array_tag(kind));
            assert!(array_tag(kind).is_scalar_array());
            assert!(scalar_tag(kind).is_scalar());
        }
    }

    #[test]
    fn test_structured_tag() {
        assert_eq!(
            structured_tag(&GenericType::Scalar(ScalarKind::Float64)).ok(),
            Some(WireTag::Double)
        );
        assert_eq!(
            structured_tag(&GenericType::scalar_array(ScalarKind::Int16)).ok(),
            Some(WireTag::ShortArray)
        );
        assert_eq!(
            structured_tag(&GenericType::array_of(GenericType::Struct(Default::default()))).ok(),
            Some(WireTag::StructureArray)
        );
    }

    #[test]
    fn test_scalar_data_follow_tables() {
        for kind in ScalarKind::ALL {
            let wire = wire_scalar(&Scalar::default_of(kind));
            assert_eq!(wire.tag(), scalar_tag(kind));
        }
        assert_eq!(generic_scalar(&wire_scalar(&Scalar::Char8(b'A'))), Scalar::UInt8(65));
    }

    #[test]
    fn test_unmapped_types() {
        assert!(matches!(
            structured_tag(&GenericType::Empty),
            Err(Error::UnknownType(_))
        ));
        let nested = GenericType::array_of(GenericType::scalar_array(ScalarKind::Int32));
        assert!(matches!(structured_tag(&nested), Err(Error::UnknownType(_))));
        assert_eq!(scalar_kind_of(WireTag::Structure), None);
        assert_eq!(scalar_kind_of(WireTag::UnionArray), None);
    }

    #[test]
    fn test_array_tag_element_matches_scalar_tag() {
        for kind in ScalarKind::ALL {
            assert_eq!(array_tag(kind).element_tag(), Some(scalar_tag(kind)), "{}", kind);
        }
    }
}
