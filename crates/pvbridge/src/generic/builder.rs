// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for struct Generic Types.

use crate::generic::{ArrayType, FieldType, GenericType, ScalarKind, StructType};
use std::sync::Arc;

/// Builder for struct [`GenericType`] instances.
#[derive(Debug, Default)]
pub struct GenericTypeBuilder {
    name: Option<String>,
    fields: Vec<FieldType>,
}

impl GenericTypeBuilder {
    /// Create a builder for an anonymous struct.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for a named struct.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Vec::new(),
        }
    }

    /// Add a scalar field.
    pub fn field(mut self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.fields.push(FieldType::new(name, GenericType::Scalar(kind)));
        self
    }

    /// Add a field with an arbitrary type.
    pub fn field_with_type(
        mut self,
        name: impl Into<String>,
        ty: impl Into<Arc<GenericType>>,
    ) -> Self {
        self.fields.push(FieldType::new(name, ty));
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, ScalarKind::String)
    }

    /// Add a variable-length scalar array field.
    pub fn array_field(mut self, name: impl Into<String>, element_kind: ScalarKind) -> Self {
        self.fields.push(FieldType::new(
            name,
            GenericType::scalar_array(element_kind),
        ));
        self
    }

    /// Add a fixed-length scalar array field.
    pub fn fixed_array_field(
        mut self,
        name: impl Into<String>,
        element_kind: ScalarKind,
        length: usize,
    ) -> Self {
        let arr = ArrayType::new(GenericType::Scalar(element_kind), Some(length));
        self.fields.push(FieldType::new(name, GenericType::Array(arr)));
        self
    }

    /// Add a nested struct field.
    pub fn nested_field(mut self, name: impl Into<String>, nested: GenericType) -> Self {
        self.fields.push(FieldType::new(name, nested));
        self
    }

    /// Add a variable-length array of structs.
    pub fn struct_array_field(mut self, name: impl Into<String>, element: GenericType) -> Self {
        self.fields.push(FieldType::new(name, GenericType::array_of(element)));
        self
    }

    /// Build the struct type.
    pub fn build(self) -> GenericType {
        GenericType::Struct(StructType::new(self.name, self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_builder() {
        let ty = GenericTypeBuilder::named("Setpoint")
            .field("setpoint", ScalarKind::Float64)
            .field("enabled", ScalarKind::Bool)
            .string_field("units")
            .build();

        assert_eq!(ty.name(), Some("Setpoint"));
        assert_eq!(ty.fields().map(<[FieldType]>::len), Some(3));
        assert_eq!(ty.field("units"), Some(&GenericType::Scalar(ScalarKind::String)));
    }

    #[test]
    fn test_struct_with_arrays() {
        let ty = GenericTypeBuilder::new()
            .array_field("waveform", ScalarKind::Float32)
            .fixed_array_field("matrix", ScalarKind::Float64, 9)
            .build();

        match ty.field("matrix") {
            Some(GenericType::Array(arr)) => assert_eq!(arr.length, Some(9)),
            other => panic!("Expected array, got {:?}", other),
        }
        match ty.field("waveform") {
            Some(GenericType::Array(arr)) => assert_eq!(arr.length, None),
            other => panic!("Expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_struct() {
        let limits = GenericTypeBuilder::named("Limits")
            .field("low", ScalarKind::Float64)
            .field("high", ScalarKind::Float64)
            .build();

        let ty = GenericTypeBuilder::named("Channel")
            .nested_field("display", limits.clone())
            .struct_array_field("history", limits)
            .build();

        assert!(ty.field("display").is_some_and(GenericType::is_struct));
        assert!(ty
            .field("history")
            .and_then(GenericType::element_type)
            .is_some_and(GenericType::is_struct));
    }
}
