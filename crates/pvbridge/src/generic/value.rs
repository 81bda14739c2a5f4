// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic Value: the dynamically-typed value model application code works with.

use crate::generic::{ArrayType, FieldType, GenericType, ScalarKind, StructType};
use std::sync::Arc;

/// A single scalar datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Char8(u8),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Scalar {
    /// Element code of this datum.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::Char8(_) => ScalarKind::Char8,
            Self::Int8(_) => ScalarKind::Int8,
            Self::UInt8(_) => ScalarKind::UInt8,
            Self::Int16(_) => ScalarKind::Int16,
            Self::UInt16(_) => ScalarKind::UInt16,
            Self::Int32(_) => ScalarKind::Int32,
            Self::UInt32(_) => ScalarKind::UInt32,
            Self::Int64(_) => ScalarKind::Int64,
            Self::UInt64(_) => ScalarKind::UInt64,
            Self::Float32(_) => ScalarKind::Float32,
            Self::Float64(_) => ScalarKind::Float64,
            Self::String(_) => ScalarKind::String,
        }
    }

    /// Zero value of a kind (false, 0, 0.0, "").
    pub fn default_of(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Self::Bool(false),
            ScalarKind::Char8 => Self::Char8(0),
            ScalarKind::Int8 => Self::Int8(0),
            ScalarKind::UInt8 => Self::UInt8(0),
            ScalarKind::Int16 => Self::Int16(0),
            ScalarKind::UInt16 => Self::UInt16(0),
            ScalarKind::Int32 => Self::Int32(0),
            ScalarKind::UInt32 => Self::UInt32(0),
            ScalarKind::Int64 => Self::Int64(0),
            ScalarKind::UInt64 => Self::UInt64(0),
            ScalarKind::Float32 => Self::Float32(0.0),
            ScalarKind::Float64 => Self::Float64(0.0),
            ScalarKind::String => Self::String(String::new()),
        }
    }

    /// Numeric view as f64 (bools map to 0/1, strings to None).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Char8(v) | Self::UInt8(v) => Some(f64::from(*v)),
            Self::Int8(v) => Some(f64::from(*v)),
            Self::Int16(v) => Some(f64::from(*v)),
            Self::UInt16(v) => Some(f64::from(*v)),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::UInt32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            Self::UInt64(v) => Some(*v as f64),
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Float64(v) => Some(*v),
            Self::String(_) => None,
        }
    }

    /// Integer view (None for floats with a fractional part and for strings).
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Bool(v) => Some(i128::from(*v)),
            Self::Char8(v) | Self::UInt8(v) => Some(i128::from(*v)),
            Self::Int8(v) => Some(i128::from(*v)),
            Self::Int16(v) => Some(i128::from(*v)),
            Self::UInt16(v) => Some(i128::from(*v)),
            Self::Int32(v) => Some(i128::from(*v)),
            Self::UInt32(v) => Some(i128::from(*v)),
            Self::Int64(v) => Some(i128::from(*v)),
            Self::UInt64(v) => Some(i128::from(*v)),
            Self::Float32(v) => float_to_i128(f64::from(*v)),
            Self::Float64(v) => float_to_i128(*v),
            Self::String(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Text rendering used when a number travels as a string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(v) => (if *v { "1" } else { "0" }).to_string(),
            Self::Char8(v) | Self::UInt8(v) => v.to_string(),
            Self::Int8(v) => v.to_string(),
            Self::Int16(v) => v.to_string(),
            Self::UInt16(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::UInt32(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::UInt64(v) => v.to_string(),
            Self::Float32(v) => v.to_string(),
            Self::Float64(v) => v.to_string(),
            Self::String(v) => v.clone(),
        }
    }
}

fn float_to_i128(v: f64) -> Option<i128> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1.0e38 {
        Some(v as i128)
    } else {
        None
    }
}

/// Array payload. Keeps its element type so that empty arrays stay typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub name: Option<String>,
    pub element_type: Arc<GenericType>,
    pub length: Option<usize>,
    pub elements: Vec<GenericValue>,
}

impl ArrayValue {
    pub fn new(element_type: impl Into<Arc<GenericType>>, elements: Vec<GenericValue>) -> Self {
        Self {
            name: None,
            element_type: element_type.into(),
            length: None,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Struct payload: ordered named fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    pub name: Option<String>,
    pub fields: Vec<(String, GenericValue)>,
}

impl StructValue {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<GenericValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&GenericValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut GenericValue> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// A dynamically-typed value: Empty, Scalar, Array or Struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GenericValue {
    #[default]
    Empty,
    Scalar(Scalar),
    Array(ArrayValue),
    Struct(StructValue),
}

impl GenericValue {
    /// Scalar array built from homogeneous data.
    pub fn scalar_array(kind: ScalarKind, elements: Vec<Scalar>) -> Self {
        Self::Array(ArrayValue::new(
            GenericType::Scalar(kind),
            elements.into_iter().map(GenericValue::Scalar).collect(),
        ))
    }

    /// Default-valued instance of a type (zeros, empty strings, empty or
    /// fixed-length arrays of defaults).
    pub fn default_for(ty: &GenericType) -> Self {
        match ty {
            GenericType::Empty => Self::Empty,
            GenericType::Scalar(kind) => Self::Scalar(Scalar::default_of(*kind)),
            GenericType::Struct(s) => Self::Struct(StructValue {
                name: s.name.clone(),
                fields: s
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), Self::default_for(&f.ty)))
                    .collect(),
            }),
            GenericType::Array(a) => {
                let count = a.length.unwrap_or(0);
                Self::Array(ArrayValue {
                    name: a.name.clone(),
                    element_type: a.element.clone(),
                    length: a.length,
                    elements: (0..count).map(|_| Self::default_for(&a.element)).collect(),
                })
            }
        }
    }

    /// Exact Generic Type of this value.
    pub fn type_of(&self) -> GenericType {
        match self {
            Self::Empty => GenericType::Empty,
            Self::Scalar(s) => GenericType::Scalar(s.kind()),
            Self::Array(a) => GenericType::Array(ArrayType {
                name: a.name.clone(),
                element: a.element_type.clone(),
                length: a.length,
            }),
            Self::Struct(s) => GenericType::Struct(StructType {
                name: s.name.clone(),
                fields: s
                    .fields
                    .iter()
                    .map(|(name, v)| FieldType::new(name.clone(), v.type_of()))
                    .collect(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar()?.as_f64()
    }

    /// Integer view; None for fractional floats and values outside i64.
    pub fn as_i64(&self) -> Option<i64> {
        i64::try_from(self.as_scalar()?.as_i128()?).ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar()?.as_bool()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar()?.as_str()
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Array elements as a slice.
    pub fn elements(&self) -> Option<&[GenericValue]> {
        self.as_array().map(|a| a.elements.as_slice())
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Struct field by name.
    pub fn field(&self, name: &str) -> Option<&GenericValue> {
        self.as_struct()?.field(name)
    }

    /// Replace (or append) a struct field. Returns false for non-structs.
    pub fn set_field(&mut self, name: impl Into<String>, value: GenericValue) -> bool {
        match self {
            Self::Struct(s) => {
                let name = name.into();
                match s.field_mut(&name) {
                    Some(slot) => *slot = value,
                    None => s.fields.push((name, value)),
                }
                true
            }
            _ => false,
        }
    }

    /// Value at a dot-separated field path (`""` is the value itself).
    pub fn get_path(&self, path: &str) -> Option<&GenericValue> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.')
            .try_fold(self, |current, segment| current.field(segment))
    }

    /// Replace the value at an existing dot-separated field path.
    pub fn set_path(&mut self, path: &str, value: GenericValue) -> bool {
        if path.is_empty() {
            *self = value;
            return true;
        }
        let mut current = self;
        for segment in path.split('.') {
            current = match current {
                Self::Struct(s) => match s.field_mut(segment) {
                    Some(next) => next,
                    None => return false,
                },
                _ => return false,
            };
        }
        *current = value;
        true
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }

            impl From<$ty> for GenericValue {
                fn from(v: $ty) -> Self {
                    GenericValue::Scalar(Scalar::$variant(v))
                }
            }

            impl From<Vec<$ty>> for GenericValue {
                fn from(v: Vec<$ty>) -> Self {
                    GenericValue::scalar_array(
                        ScalarKind::$variant,
                        v.into_iter().map(Scalar::$variant).collect(),
                    )
                }
            }
        )*
    };
}

impl_scalar_from! {
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<&str> for GenericValue {
    fn from(v: &str) -> Self {
        GenericValue::Scalar(Scalar::String(v.to_string()))
    }
}

impl From<Scalar> for GenericValue {
    fn from(v: Scalar) -> Self {
        GenericValue::Scalar(v)
    }
}

impl From<StructValue> for GenericValue {
    fn from(v: StructValue) -> Self {
        GenericValue::Struct(v)
    }
}

impl From<ArrayValue> for GenericValue {
    fn from(v: ArrayValue) -> Self {
        GenericValue::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_values() {
        let v = GenericValue::from(42u32);
        assert_eq!(v.type_of(), GenericType::Scalar(ScalarKind::UInt32));
        assert_eq!(v.as_f64(), Some(42.0));

        let v = GenericValue::from("hello");
        assert_eq!(v.as_str(), Some("hello"));
        assert_eq!(v.as_f64(), None);
    }

    #[test]
    fn test_struct_value_type() {
        let v: GenericValue = StructValue::new(Some("Motor".into()))
            .with_field("setpoint", 4.0f64)
            .with_field("enabled", false)
            .into();

        let ty = v.type_of();
        assert_eq!(ty.name(), Some("Motor"));
        assert_eq!(ty.field("enabled"), Some(&GenericType::Scalar(ScalarKind::Bool)));
        assert_eq!(v.field("setpoint").and_then(GenericValue::as_f64), Some(4.0));
    }

    #[test]
    fn test_empty_array_keeps_type() {
        let v = GenericValue::from(Vec::<i16>::new());
        assert_eq!(v.type_of(), GenericType::scalar_array(ScalarKind::Int16));
        assert_eq!(v.elements().map(<[GenericValue]>::len), Some(0));
    }

    #[test]
    fn test_paths() {
        let inner: GenericValue = StructValue::default().with_field("low", 1.5f64).into();
        let mut v: GenericValue = StructValue::default()
            .with_field("limits", inner)
            .with_field("name", "pump")
            .into();

        assert_eq!(v.get_path("limits.low").and_then(GenericValue::as_f64), Some(1.5));
        assert!(v.set_path("limits.low", 2.5f64.into()));
        assert_eq!(v.get_path("limits.low").and_then(GenericValue::as_f64), Some(2.5));
        assert!(!v.set_path("limits.high", 1.0f64.into()));
        assert!(v.get_path("name.x").is_none());
    }

    #[test]
    fn test_default_for_fixed_array() {
        let ty = GenericType::fixed_array_of(GenericType::Scalar(ScalarKind::Float32), 3);
        let v = GenericValue::default_for(&ty);
        assert_eq!(v.elements().map(<[GenericValue]>::len), Some(3));
        assert_eq!(v.type_of(), ty);
    }
}
