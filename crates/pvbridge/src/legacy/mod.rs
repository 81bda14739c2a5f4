// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Legacy-protocol byte buffer codec.
//!
//! The legacy protocol carries fixed-width records of a small closed set of
//! element tags. It has no unsigned or 64-bit types, so those travel
//! approximated:
//!
//! | Generic                    | Legacy tag | Slot width        |
//! |----------------------------|------------|-------------------|
//! | Bool, Char8, Int8          | Char       | 1                 |
//! | Int16                      | Short      | 2                 |
//! | Int32                      | Long       | 4                 |
//! | Float32                    | Float      | 4                 |
//! | Float64                    | Double     | 8                 |
//! | UInt8, UInt16, UInt32      | Enum       | 2                 |
//! | String, Int64, UInt64      | String     | configured (40)   |
//!
//! Arrays use the tag of their element. Numeric slots are raw native-endian
//! copies.

mod codec;

pub use codec::{ByteBufferCodec, LegacyBuffer};

use crate::config::LegacyConfig;
use crate::error::{Error, Result};
use crate::generic::{GenericType, ScalarKind};
use std::fmt;

/// Default width of a string slot in bytes.
pub const DEFAULT_STRING_SLOT_WIDTH: usize = 40;

/// Width of an enumerated-choice slot in bytes.
pub const ENUM_SLOT_WIDTH: usize = 2;

/// Legacy-protocol element tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyTag {
    String,
    Short,
    Float,
    Enum,
    Char,
    Long,
    Double,
}

impl fmt::Display for LegacyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Legacy tag for a scalar code.
pub fn legacy_scalar_tag(kind: ScalarKind) -> LegacyTag {
    match kind {
        ScalarKind::Bool | ScalarKind::Char8 | ScalarKind::Int8 => LegacyTag::Char,
        ScalarKind::Int16 => LegacyTag::Short,
        ScalarKind::Int32 => LegacyTag::Long,
        ScalarKind::Float32 => LegacyTag::Float,
        ScalarKind::Float64 => LegacyTag::Double,
        ScalarKind::UInt8 | ScalarKind::UInt16 | ScalarKind::UInt32 => LegacyTag::Enum,
        ScalarKind::String | ScalarKind::Int64 | ScalarKind::UInt64 => LegacyTag::String,
    }
}

/// Legacy tag for a Generic Type. Structs, empty types and arrays of
/// non-scalars fail with `UnknownType`.
pub fn legacy_tag(ty: &GenericType) -> Result<LegacyTag> {
    ty.element_kind()
        .map(legacy_scalar_tag)
        .ok_or_else(|| Error::UnknownType(format!("{} has no legacy tag", ty)))
}

/// Per-tag element widths, in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWidths {
    table: [(LegacyTag, usize); 7],
}

impl SlotWidths {
    /// Widths with the given string slot width.
    pub fn new(string_width: usize) -> Self {
        Self {
            table: [
                (LegacyTag::String, string_width),
                (LegacyTag::Short, 2),
                (LegacyTag::Float, 4),
                (LegacyTag::Enum, ENUM_SLOT_WIDTH),
                (LegacyTag::Char, 1),
                (LegacyTag::Long, 4),
                (LegacyTag::Double, 8),
            ],
        }
    }

    pub fn from_config(config: &LegacyConfig) -> Self {
        Self::new(config.string_slot_width)
    }

    pub fn width(&self, tag: LegacyTag) -> usize {
        self.table
            .iter()
            .find(|(t, _)| *t == tag)
            .map_or(0, |(_, width)| *width)
    }
}

impl Default for SlotWidths {
    fn default() -> Self {
        Self::new(DEFAULT_STRING_SLOT_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping() {
        let cases = [
            (ScalarKind::Bool, LegacyTag::Char),
            (ScalarKind::Char8, LegacyTag::Char),
            (ScalarKind::Int8, LegacyTag::Char),
            (ScalarKind::Int16, LegacyTag::Short),
            (ScalarKind::Int32, LegacyTag::Long),
            (ScalarKind::Float32, LegacyTag::Float),
            (ScalarKind::Float64, LegacyTag::Double),
            (ScalarKind::String, LegacyTag::String),
            (ScalarKind::UInt8, LegacyTag::Enum),
            (ScalarKind::UInt16, LegacyTag::Enum),
            (ScalarKind::UInt32, LegacyTag::Enum),
            (ScalarKind::Int64, LegacyTag::String),
            (ScalarKind::UInt64, LegacyTag::String),
        ];
        for (kind, tag) in cases {
            assert_eq!(legacy_tag(&GenericType::Scalar(kind)).ok(), Some(tag), "{}", kind);
            assert_eq!(legacy_tag(&GenericType::scalar_array(kind)).ok(), Some(tag));
        }
    }

    #[test]
    fn test_unmapped() {
        assert!(matches!(
            legacy_tag(&GenericType::Struct(Default::default())),
            Err(Error::UnknownType(_))
        ));
        assert!(legacy_tag(&GenericType::Empty).is_err());
    }

    #[test]
    fn test_widths() {
        let widths = SlotWidths::default();
        assert_eq!(widths.width(LegacyTag::String), 40);
        assert_eq!(widths.width(LegacyTag::Enum), 2);
        assert_eq!(widths.width(LegacyTag::Double), 8);
        assert_eq!(SlotWidths::new(26).width(LegacyTag::String), 26);
    }
}
