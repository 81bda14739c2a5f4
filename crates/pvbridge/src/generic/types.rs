// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic Type schema.

use std::fmt;
use std::sync::Arc;

/// Scalar element codes of the Generic Type model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char8,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
}

impl ScalarKind {
    /// All scalar kinds, in declaration order.
    pub const ALL: [ScalarKind; 13] = [
        Self::Bool,
        Self::Char8,
        Self::Int8,
        Self::UInt8,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
        Self::String,
    ];

    /// Native size in bytes (None for strings).
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::Char8 | Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            Self::String => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Char8
                | Self::Int8
                | Self::UInt8
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Char8 | Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Lower-case name used in diagnostics and `Display`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char8 => "char8",
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema of a Generic Value.
///
/// Types are immutable once built; nested types are shared through `Arc`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GenericType {
    /// No value (the state of a variable that never received data).
    #[default]
    Empty,
    /// Single scalar element.
    Scalar(ScalarKind),
    /// Ordered named fields.
    Struct(StructType),
    /// Homogeneous elements, optionally of fixed length.
    Array(ArrayType),
}

/// Struct member: name plus type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub name: String,
    pub ty: Arc<GenericType>,
}

impl FieldType {
    pub fn new(name: impl Into<String>, ty: impl Into<Arc<GenericType>>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Struct type descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructType {
    /// Optional type name (preserved across the structured protocol).
    pub name: Option<String>,
    pub fields: Vec<FieldType>,
}

impl StructType {
    pub fn new(name: Option<String>, fields: Vec<FieldType>) -> Self {
        Self { name, fields }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Array type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// Optional type name.
    pub name: Option<String>,
    pub element: Arc<GenericType>,
    /// Fixed length (None = variable).
    pub length: Option<usize>,
}

impl ArrayType {
    pub fn new(element: impl Into<Arc<GenericType>>, length: Option<usize>) -> Self {
        Self {
            name: None,
            element: element.into(),
            length,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl GenericType {
    /// Scalar type.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    /// Variable-length array of `element`.
    pub fn array_of(element: impl Into<Arc<GenericType>>) -> Self {
        Self::Array(ArrayType::new(element, None))
    }

    /// Fixed-length array of `element`.
    pub fn fixed_array_of(element: impl Into<Arc<GenericType>>, length: usize) -> Self {
        Self::Array(ArrayType::new(element, Some(length)))
    }

    /// Variable-length array of a scalar kind.
    pub fn scalar_array(kind: ScalarKind) -> Self {
        Self::array_of(GenericType::Scalar(kind))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Scalar kind of a scalar type.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Scalar kind of a scalar type or of the elements of a scalar array.
    pub fn element_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind) => Some(*kind),
            Self::Array(arr) => arr.element.scalar_kind(),
            _ => None,
        }
    }

    /// Optional type name carried by structs and arrays.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Struct(s) => s.name.as_deref(),
            Self::Array(a) => a.name.as_deref(),
            _ => None,
        }
    }

    /// Get fields if this is a struct.
    pub fn fields(&self) -> Option<&[FieldType]> {
        match self {
            Self::Struct(s) => Some(&s.fields),
            _ => None,
        }
    }

    /// Get field type by name.
    pub fn field(&self, name: &str) -> Option<&GenericType> {
        self.fields()?
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.ty.as_ref())
    }

    /// Get field index by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields()?.iter().position(|f| f.name == name)
    }

    /// Element type if this is an array.
    pub fn element_type(&self) -> Option<&GenericType> {
        match self {
            Self::Array(a) => Some(&a.element),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Empty => "empty".to_string(),
            Self::Scalar(kind) => kind.name().to_string(),
            Self::Struct(s) => match &s.name {
                Some(name) => format!("struct {}", name),
                None => "struct".to_string(),
            },
            Self::Array(a) => format!("{}[]", a.element.describe()),
        }
    }
}

impl From<ScalarKind> for GenericType {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

impl From<StructType> for GenericType {
    fn from(s: StructType) -> Self {
        Self::Struct(s)
    }
}

impl From<ArrayType> for GenericType {
    fn from(a: ArrayType) -> Self {
        Self::Array(a)
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::Struct(s) => {
                f.write_str("struct")?;
                if let Some(name) = &s.name {
                    write!(f, " {}", name)?;
                }
                f.write_str(" {")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {}", field.name, field.ty)?;
                }
                f.write_str(" }")
            }
            Self::Array(a) => match a.length {
                Some(len) => write!(f, "{}[{}]", a.element, len),
                None => write!(f, "{}[]", a.element),
            },
        }
    }
}
