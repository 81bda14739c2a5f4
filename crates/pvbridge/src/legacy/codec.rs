// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte buffer parse and build.
//!
//! [`ByteBufferCodec::parse`] and [`ByteBufferCodec::build_update_buffer`]
//! share one [`SlotWidths`] table so both directions agree on every slot.

use crate::config::LegacyConfig;
use crate::error::Result;
use crate::generic::{ArrayValue, GenericType, GenericValue, Scalar, ScalarKind};
use crate::legacy::{legacy_tag, LegacyTag, SlotWidths};

/// Encoded legacy update.
///
/// An empty buffer (`count == 0`, no bytes) means the value could not be
/// converted to the destination type and no update should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyBuffer {
    pub tag: LegacyTag,
    /// Number of elements.
    pub count: usize,
    pub bytes: Vec<u8>,
    /// True when at least one string was cut to the slot width.
    ///
    /// The cut counts bytes, not characters: a multi-byte UTF-8 character
    /// straddling the slot edge is split, and reads back as U+FFFD.
    pub truncated: bool,
}

impl LegacyBuffer {
    pub fn empty(tag: LegacyTag) -> Self {
        Self {
            tag,
            count: 0,
            bytes: Vec::new(),
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Legacy byte buffer codec.
#[derive(Debug, Clone, Default)]
pub struct ByteBufferCodec {
    widths: SlotWidths,
}

impl ByteBufferCodec {
    pub fn new(widths: SlotWidths) -> Self {
        Self { widths }
    }

    pub fn from_config(config: &LegacyConfig) -> Self {
        Self::new(SlotWidths::from_config(config))
    }

    pub fn widths(&self) -> &SlotWidths {
        &self.widths
    }

    /// Decode `count` elements of `ty` from `buffer`.
    ///
    /// A missing buffer means "not yet valid" and yields `Empty`. A buffer
    /// shorter than `count` slots is read up to its last whole slot. Text
    /// that does not parse as the destination number also yields `Empty`.
    pub fn parse(
        &self,
        buffer: Option<&[u8]>,
        ty: &GenericType,
        count: usize,
    ) -> Result<GenericValue> {
        let Some(buffer) = buffer else {
            return Ok(GenericValue::Empty);
        };
        let tag = legacy_tag(ty)?;
        let Some(kind) = ty.element_kind() else {
            return Ok(GenericValue::Empty);
        };
        let width = self.widths.width(tag);
        if width == 0 {
            return Ok(GenericValue::Empty);
        }

        let available = buffer.len() / width;
        let count = if available < count {
            log::debug!(
                "[legacy] buffer holds {} of {} {} slots",
                available,
                count,
                tag
            );
            available
        } else {
            count
        };

        let mut elements = Vec::with_capacity(count);
        for slot in buffer.chunks_exact(width).take(count) {
            match read_slot(tag, kind, slot) {
                Some(scalar) => elements.push(GenericValue::Scalar(scalar)),
                None => {
                    log::debug!("[legacy] {} slot does not convert to {}", tag, kind);
                    return Ok(GenericValue::Empty);
                }
            }
        }

        Ok(match ty {
            GenericType::Array(array) => GenericValue::Array(ArrayValue {
                name: array.name.clone(),
                element_type: array.element.clone(),
                length: array.length,
                elements,
            }),
            _ => elements.into_iter().next().unwrap_or_default(),
        })
    }

    /// Encode `value` for a write to a variable of type `ty`.
    ///
    /// The value is first coerced into `ty`; when that fails the returned
    /// buffer is empty. Over-long text is cut to exactly the slot width with no
    /// terminator, and the buffer's `truncated` flag is raised.
    pub fn build_update_buffer(
        &self,
        value: &GenericValue,
        ty: &GenericType,
    ) -> Result<LegacyBuffer> {
        let tag = legacy_tag(ty)?;
        let Some(kind) = ty.element_kind() else {
            return Ok(LegacyBuffer::empty(tag));
        };
        let Some(coerced) = value.coerce_to(ty) else {
            log::warn!("[legacy] cannot convert {} to {}", value.type_of(), ty);
            return Ok(LegacyBuffer::empty(tag));
        };

        let scalars: Vec<&Scalar> = match &coerced {
            GenericValue::Scalar(s) => vec![s],
            GenericValue::Array(array) => array
                .elements
                .iter()
                .filter_map(GenericValue::as_scalar)
                .collect(),
            _ => Vec::new(),
        };

        let width = self.widths.width(tag);
        let mut buffer = LegacyBuffer {
            tag,
            count: scalars.len(),
            bytes: Vec::with_capacity(width * scalars.len()),
            truncated: false,
        };
        for scalar in scalars {
            match write_slot(tag, kind, width, scalar, &mut buffer.bytes) {
                Some(truncated) => buffer.truncated |= truncated,
                None => {
                    log::warn!("[legacy] {} does not fit a {} slot", scalar.to_text(), tag);
                    return Ok(LegacyBuffer::empty(tag));
                }
            }
        }
        if buffer.truncated {
            log::warn!(
                "[legacy] string truncated to {} bytes for {} update",
                width,
                ty
            );
        }
        Ok(buffer)
    }
}

fn read_slot(tag: LegacyTag, kind: ScalarKind, slot: &[u8]) -> Option<Scalar> {
    match tag {
        LegacyTag::String => {
            let end = slot.iter().position(|b| *b == 0).unwrap_or(slot.len());
            let text = String::from_utf8_lossy(&slot[..end]).into_owned();
            Scalar::String(text).convert_to(kind)
        }
        LegacyTag::Enum => {
            let raw = u16::from_ne_bytes([*slot.first()?, *slot.get(1)?]);
            Scalar::UInt16(raw).convert_to(kind)
        }
        LegacyTag::Char => Some(match kind {
            ScalarKind::Bool => Scalar::Bool(slot[0] != 0),
            ScalarKind::Char8 => Scalar::Char8(slot[0]),
            _ => Scalar::Int8(i8::from_ne_bytes([slot[0]])),
        }),
        LegacyTag::Short => Some(Scalar::Int16(i16::from_ne_bytes(slot.try_into().ok()?))),
        LegacyTag::Long => Some(Scalar::Int32(i32::from_ne_bytes(slot.try_into().ok()?))),
        LegacyTag::Float => Some(Scalar::Float32(f32::from_ne_bytes(slot.try_into().ok()?))),
        LegacyTag::Double => Some(Scalar::Float64(f64::from_ne_bytes(slot.try_into().ok()?))),
    }
}

/// Append one slot. Returns whether text was truncated, or None when the
/// datum cannot be represented in the slot.
fn write_slot(
    tag: LegacyTag,
    kind: ScalarKind,
    width: usize,
    scalar: &Scalar,
    out: &mut Vec<u8>,
) -> Option<bool> {
    let start = out.len();
    let mut truncated = false;
    match tag {
        LegacyTag::String => {
            let text = scalar.to_text();
            let bytes = text.as_bytes();
            truncated = bytes.len() > width;
            out.extend_from_slice(&bytes[..bytes.len().min(width)]);
        }
        LegacyTag::Enum => match scalar.convert_to(ScalarKind::UInt16)? {
            Scalar::UInt16(v) => out.extend_from_slice(&v.to_ne_bytes()),
            _ => return None,
        },
        LegacyTag::Char => out.push(match scalar {
            Scalar::Bool(v) => u8::from(*v),
            Scalar::Char8(v) => *v,
            Scalar::Int8(v) => v.to_ne_bytes()[0],
            _ => return None,
        }),
        _ => match scalar.convert_to(kind)? {
            Scalar::Int16(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Scalar::Int32(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Scalar::Float32(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Scalar::Float64(v) => out.extend_from_slice(&v.to_ne_bytes()),
            _ => return None,
        },
    }
    out.resize(start + width, 0);
    Some(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> ByteBufferCodec {
        ByteBufferCodec::default()
    }

    #[test]
    fn test_null_buffer_is_empty() {
        for kind in ScalarKind::ALL {
            for ty in [GenericType::Scalar(kind), GenericType::scalar_array(kind)] {
                for count in [0, 1, 5] {
                    assert_eq!(
                        codec().parse(None, &ty, count).ok(),
                        Some(GenericValue::Empty),
                        "{} x{}",
                        ty,
                        count
                    );
                }
            }
        }
    }

    #[test]
    fn test_numeric_round_trip() {
        let values = [
            GenericValue::from(-7i8),
            GenericValue::from(true),
            GenericValue::from(-1234i16),
            GenericValue::from(-123_456i32),
            GenericValue::from(1.25f32),
            GenericValue::from(6.2f64),
            GenericValue::from(200u8),
            GenericValue::from(65_535u16),
            GenericValue::from(i64::MIN),
            GenericValue::from(u64::MAX),
            GenericValue::from(vec![1.5f64, -2.5, 1e300]),
            GenericValue::from(vec![3i32, -4]),
        ];
        for value in values {
            let ty = value.type_of();
            let buffer = codec().build_update_buffer(&value, &ty).expect("build");
            assert!(!buffer.is_empty(), "{}", ty);
            let parsed = codec()
                .parse(Some(buffer.bytes.as_slice()), &ty, buffer.count)
                .expect("parse");
            assert_eq!(parsed, value, "{}", ty);
        }
    }

    #[test]
    fn test_string_truncates_to_slot_width() {
        let text = "x".repeat(55);
        let ty = GenericType::Scalar(ScalarKind::String);
        let buffer = codec()
            .build_update_buffer(&GenericValue::from(text.as_str()), &ty)
            .expect("build");

        assert!(buffer.truncated);
        assert_eq!(buffer.bytes.len(), 40);
        assert_eq!(buffer.count, 1);
        let parsed = codec().parse(Some(buffer.bytes.as_slice()), &ty, 1).expect("parse");
        assert_eq!(parsed.as_str().map(str::len), Some(40));
    }

    #[test]
    fn test_truncation_splits_multibyte_character() {
        // 1 + 20 * 2 = 41 bytes; the cut lands inside the last 'é'.
        let text = format!("a{}", "é".repeat(20));
        let ty = GenericType::Scalar(ScalarKind::String);
        let buffer = codec()
            .build_update_buffer(&GenericValue::from(text.as_str()), &ty)
            .expect("build");
        assert!(buffer.truncated);
        assert_eq!(buffer.bytes.len(), 40);
        assert_eq!(&buffer.bytes[..40], &text.as_bytes()[..40]);

        let parsed = codec().parse(Some(buffer.bytes.as_slice()), &ty, 1).expect("parse");
        let expected = format!("a{}\u{FFFD}", "é".repeat(19));
        assert_eq!(parsed.as_str(), Some(expected.as_str()));
    }

    #[test]
    fn test_short_string_is_padded() {
        let ty = GenericType::Scalar(ScalarKind::String);
        let buffer = codec()
            .build_update_buffer(&GenericValue::from("pump"), &ty)
            .expect("build");
        assert!(!buffer.truncated);
        assert_eq!(buffer.bytes.len(), 40);
        assert_eq!(&buffer.bytes[..5], b"pump\0");
    }

    #[test]
    fn test_configured_string_width() {
        let codec = ByteBufferCodec::new(SlotWidths::new(8));
        let ty = GenericType::Scalar(ScalarKind::String);
        let buffer = codec
            .build_update_buffer(&GenericValue::from("12345678"), &ty)
            .expect("build");
        assert!(!buffer.truncated);
        assert_eq!(buffer.bytes, b"12345678");
    }

    #[test]
    fn test_unconvertible_value_gives_empty_buffer() {
        let ty = GenericType::Scalar(ScalarKind::Int16);
        let buffer = codec()
            .build_update_buffer(&GenericValue::from("not a number"), &ty)
            .expect("build");
        assert!(buffer.is_empty());

        let ty = GenericType::Scalar(ScalarKind::UInt32);
        let buffer = codec()
            .build_update_buffer(&GenericValue::from(70_000u32), &ty)
            .expect("build");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_float_slot_rejects_out_of_range() {
        let ty = GenericType::Scalar(ScalarKind::Float32);
        let buffer = codec()
            .build_update_buffer(&GenericValue::from(1e300f64), &ty)
            .expect("build");
        assert!(buffer.is_empty());
        assert_eq!(buffer.count, 0);

        let buffer = codec()
            .build_update_buffer(&GenericValue::from(1e30f64), &ty)
            .expect("build");
        assert_eq!(buffer.tag, LegacyTag::Float);
        assert_eq!(buffer.bytes, (1e30f64 as f32).to_ne_bytes().to_vec());
    }

    #[test]
    fn test_text_slot_into_number() {
        let ty = GenericType::Scalar(ScalarKind::Int64);
        let mut slot = b"-42".to_vec();
        slot.resize(40, 0);
        assert_eq!(
            codec().parse(Some(slot.as_slice()), &ty, 1).ok(),
            Some(GenericValue::from(-42i64))
        );

        let mut slot = b"forty-two".to_vec();
        slot.resize(40, 0);
        assert_eq!(
            codec().parse(Some(slot.as_slice()), &ty, 1).ok(),
            Some(GenericValue::Empty)
        );
    }

    #[test]
    fn test_enum_slot_narrows() {
        let ty = GenericType::Scalar(ScalarKind::UInt8);
        assert_eq!(
            codec().parse(Some(&300u16.to_ne_bytes()[..]), &ty, 1).ok(),
            Some(GenericValue::Empty)
        );
        assert_eq!(
            codec().parse(Some(&17u16.to_ne_bytes()[..]), &ty, 1).ok(),
            Some(GenericValue::from(17u8))
        );
    }

    #[test]
    fn test_short_buffer_clamps_count() {
        let ty = GenericType::scalar_array(ScalarKind::Int16);
        let mut bytes = Vec::new();
        for v in [1i16, 2, 3] {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        bytes.push(0xff);
        let parsed = codec().parse(Some(bytes.as_slice()), &ty, 10).expect("parse");
        assert_eq!(parsed, GenericValue::from(vec![1i16, 2, 3]));
    }

    #[test]
    fn test_struct_has_no_legacy_form() {
        let ty = GenericType::Struct(Default::default());
        assert!(codec().build_update_buffer(&GenericValue::Empty, &ty).is_err());
        assert!(codec().parse(Some(&[0u8; 4][..]), &ty, 1).is_err());
    }
}
