// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar conversion and value coercion.
//!
//! Conversions are range-checked: a number that does not fit the target kind
//! yields `None` instead of wrapping. Floats convert to integers by truncation
//! toward zero. Text is parsed with surrounding whitespace ignored.

use crate::generic::{ArrayValue, GenericType, GenericValue, Scalar, ScalarKind, StructValue};

impl Scalar {
    /// Convert this datum to another scalar kind.
    pub fn convert_to(&self, kind: ScalarKind) -> Option<Scalar> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        match kind {
            ScalarKind::String => Some(Scalar::String(self.to_text())),
            ScalarKind::Bool => match self {
                Scalar::String(text) => parse_bool(text).map(Scalar::Bool),
                other => other.as_f64().map(|v| Scalar::Bool(v != 0.0)),
            },
            ScalarKind::Float32 => self.numeric().and_then(narrow_f32).map(Scalar::Float32),
            ScalarKind::Float64 => self.numeric().map(Scalar::Float64),
            _ => integer_scalar(kind, self.integral()?),
        }
    }

    fn numeric(&self) -> Option<f64> {
        match self {
            Scalar::String(text) => text.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        }
    }

    fn integral(&self) -> Option<i128> {
        match self {
            Scalar::String(text) => {
                let text = text.trim();
                text.parse::<i128>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(truncate))
            }
            Scalar::Float32(v) => truncate(f64::from(*v)),
            Scalar::Float64(v) => truncate(*v),
            other => other.as_i128(),
        }
    }
}

fn truncate(v: f64) -> Option<i128> {
    if v.is_finite() && v.abs() < 1.0e38 {
        Some(v.trunc() as i128)
    } else {
        None
    }
}

/// Finite values beyond the `f32` range do not fit; infinities and NaN pass.
fn narrow_f32(v: f64) -> Option<f32> {
    if v.is_finite() && v.abs() > f64::from(f32::MAX) {
        None
    } else {
        Some(v as f32)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "TRUE" | "True" | "1" => Some(true),
        "false" | "FALSE" | "False" | "0" => Some(false),
        other => other.parse::<f64>().ok().map(|v| v != 0.0),
    }
}

fn integer_scalar(kind: ScalarKind, v: i128) -> Option<Scalar> {
    Some(match kind {
        ScalarKind::Char8 => Scalar::Char8(u8::try_from(v).ok()?),
        ScalarKind::Int8 => Scalar::Int8(i8::try_from(v).ok()?),
        ScalarKind::UInt8 => Scalar::UInt8(u8::try_from(v).ok()?),
        ScalarKind::Int16 => Scalar::Int16(i16::try_from(v).ok()?),
        ScalarKind::UInt16 => Scalar::UInt16(u16::try_from(v).ok()?),
        ScalarKind::Int32 => Scalar::Int32(i32::try_from(v).ok()?),
        ScalarKind::UInt32 => Scalar::UInt32(u32::try_from(v).ok()?),
        ScalarKind::Int64 => Scalar::Int64(i64::try_from(v).ok()?),
        ScalarKind::UInt64 => Scalar::UInt64(u64::try_from(v).ok()?),
        ScalarKind::Bool | ScalarKind::Float32 | ScalarKind::Float64 | ScalarKind::String => {
            return None
        }
    })
}

impl GenericValue {
    /// Coerce this value into `ty`.
    ///
    /// Scalars convert between kinds, a scalar becomes a one-element array and
    /// a one-element array becomes a scalar. Structs are matched field by field
    /// by name; the result follows the target's field order. Returns `None`
    /// when any part cannot be converted.
    pub fn coerce_to(&self, ty: &GenericType) -> Option<GenericValue> {
        match ty {
            GenericType::Empty => self.is_empty().then_some(GenericValue::Empty),
            GenericType::Scalar(kind) => match self {
                GenericValue::Scalar(s) => s.convert_to(*kind).map(GenericValue::Scalar),
                GenericValue::Array(a) if a.elements.len() == 1 => a.elements[0].coerce_to(ty),
                _ => None,
            },
            GenericType::Array(target) => {
                let source: Vec<&GenericValue> = match self {
                    GenericValue::Array(a) => a.elements.iter().collect(),
                    GenericValue::Scalar(_) => vec![self],
                    _ => return None,
                };
                if let Some(len) = target.length {
                    if source.len() > len {
                        return None;
                    }
                }
                let elements = source
                    .into_iter()
                    .map(|e| e.coerce_to(&target.element))
                    .collect::<Option<Vec<_>>>()?;
                Some(GenericValue::Array(ArrayValue {
                    name: target.name.clone(),
                    element_type: target.element.clone(),
                    length: target.length,
                    elements,
                }))
            }
            GenericType::Struct(target) => {
                let source = self.as_struct()?;
                let fields = target
                    .fields
                    .iter()
                    .map(|f| {
                        let value = source.field(&f.name)?.coerce_to(&f.ty)?;
                        Some((f.name.clone(), value))
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(GenericValue::Struct(StructValue {
                    name: target.name.clone(),
                    fields,
                }))
            }
        }
    }
}
