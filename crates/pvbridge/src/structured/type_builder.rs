// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic Type -> wire schema.
//!
//! The walk is depth-first with an explicit frame stack: struct fields in
//! declared order, array element types once. Each open struct accumulates its
//! members in a [`FieldBuilder`]; closing a frame hands the finished structure
//! to its parent.

use crate::error::{Error, Result};
use crate::generic::{ArrayType, FieldType, GenericType, ScalarKind, StructType};
use crate::structured::wire::{WireField, WireSchema, WireStructure, WireTag};
use crate::tables;
use std::sync::Arc;

/// Incremental builder for structure introspection.
#[derive(Debug, Default)]
pub struct FieldBuilder {
    id: Option<String>,
    fields: Vec<(String, Arc<WireField>)>,
}

impl FieldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the structure type id.
    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a scalar member.
    pub fn add(self, name: impl Into<String>, tag: WireTag) -> Self {
        self.add_field(name, Arc::new(WireField::Scalar(tag)))
    }

    /// Add a variable-length scalar array member.
    pub fn add_array(self, name: impl Into<String>, tag: WireTag) -> Self {
        self.add_field(
            name,
            Arc::new(WireField::ScalarArray {
                tag,
                name: None,
                fixed_length: None,
            }),
        )
    }

    /// Add a member with prebuilt introspection.
    pub fn add_field(mut self, name: impl Into<String>, field: Arc<WireField>) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn create_structure(self) -> WireStructure {
        WireStructure {
            id: self.id,
            fields: self.fields,
        }
    }
}

/// How a finished struct frame is wrapped before it reaches its parent.
enum Wrap {
    Structure,
    Array {
        name: Option<String>,
        fixed_length: Option<usize>,
    },
}

struct Frame<'a> {
    ty: &'a StructType,
    builder: FieldBuilder,
    next: usize,
    /// Member name in the parent frame (None for the root).
    member: Option<String>,
    wrap: Wrap,
}

impl<'a> Frame<'a> {
    fn new(ty: &'a StructType, member: Option<String>, wrap: Wrap) -> Self {
        let builder = match &ty.name {
            Some(id) => FieldBuilder::new().set_id(id.clone()),
            None => FieldBuilder::new(),
        };
        Self {
            ty,
            builder,
            next: 0,
            member,
            wrap,
        }
    }

    fn finish(self) -> (Option<String>, Arc<WireField>) {
        let structure = self.builder.create_structure();
        let field = match self.wrap {
            Wrap::Structure => WireField::Structure(structure),
            Wrap::Array { name, fixed_length } => WireField::StructureArray {
                element: Arc::new(structure),
                name,
                fixed_length,
            },
        };
        (self.member, Arc::new(field))
    }
}

fn scalar_array(array: &ArrayType, kind: ScalarKind) -> Arc<WireField> {
    Arc::new(WireField::ScalarArray {
        tag: tables::array_tag(kind),
        name: array.name.clone(),
        fixed_length: array.length,
    })
}

fn array_wrap(array: &ArrayType) -> Wrap {
    Wrap::Array {
        name: array.name.clone(),
        fixed_length: array.length,
    }
}

/// Build the wire schema matching a Generic Type.
///
/// Type names are kept as structure ids and array names. Empty types and
/// arrays of arrays have no wire form and fail with `UnknownType`.
pub fn build_schema(ty: &GenericType) -> Result<WireSchema> {
    let root = match ty {
        GenericType::Scalar(kind) => {
            return Ok(Arc::new(WireField::Scalar(tables::scalar_tag(*kind))))
        }
        GenericType::Struct(s) => Frame::new(s, None, Wrap::Structure),
        GenericType::Array(array) => match array.element.as_ref() {
            GenericType::Scalar(kind) => return Ok(scalar_array(array, *kind)),
            GenericType::Struct(s) => Frame::new(s, None, array_wrap(array)),
            _ => return Err(Error::UnknownType(ty.describe())),
        },
        GenericType::Empty => return Err(Error::UnknownType(ty.describe())),
    };

    let mut frames = vec![root];
    loop {
        let Some(top) = frames.last_mut() else {
            return Err(Error::InvalidSequence("schema frame stack underflow".into()));
        };

        let ty = top.ty;
        if let Some(FieldType { name, ty: field_ty }) = ty.fields.get(top.next) {
            top.next += 1;
            let child = match field_ty.as_ref() {
                GenericType::Scalar(kind) => {
                    let tag = tables::scalar_tag(*kind);
                    top.builder = std::mem::take(&mut top.builder).add(name.clone(), tag);
                    continue;
                }
                GenericType::Struct(s) => Frame::new(s, Some(name.clone()), Wrap::Structure),
                GenericType::Array(array) => match array.element.as_ref() {
                    GenericType::Scalar(kind) => {
                        let field = scalar_array(array, *kind);
                        top.builder =
                            std::mem::take(&mut top.builder).add_field(name.clone(), field);
                        continue;
                    }
                    GenericType::Struct(s) => Frame::new(s, Some(name.clone()), array_wrap(array)),
                    other => {
                        return Err(Error::UnknownType(format!(
                            "field '{}': array of {}",
                            name,
                            other.describe()
                        )))
                    }
                },
                GenericType::Empty => {
                    return Err(Error::UnknownType(format!("field '{}': empty", name)))
                }
            };
            frames.push(child);
            continue;
        }

        let Some(done) = frames.pop() else {
            continue;
        };
        let (member, field) = done.finish();
        match (frames.last_mut(), member) {
            (Some(parent), Some(member)) => {
                parent.builder = std::mem::take(&mut parent.builder).add_field(member, field);
            }
            _ => return Ok(field),
        }
    }
}

/// Generic Type described by a wire schema (inverse of [`build_schema`]).
///
/// `UByte` resolves to `UInt8`. Unions have no Generic form.
pub fn generic_type_of(field: &WireField) -> Result<GenericType> {
    match field {
        WireField::Scalar(tag) => tables::scalar_kind_of(*tag)
            .map(GenericType::Scalar)
            .ok_or_else(|| Error::UnknownType(tag.to_string())),
        WireField::ScalarArray {
            tag,
            name,
            fixed_length,
        } => {
            let kind = tables::scalar_kind_of(*tag)
                .ok_or_else(|| Error::UnknownType(tag.to_string()))?;
            Ok(GenericType::Array(ArrayType {
                name: name.clone(),
                element: Arc::new(GenericType::Scalar(kind)),
                length: *fixed_length,
            }))
        }
        WireField::Structure(s) => struct_type_of(s),
        WireField::StructureArray {
            element,
            name,
            fixed_length,
        } => Ok(GenericType::Array(ArrayType {
            name: name.clone(),
            element: Arc::new(struct_type_of(element)?),
            length: *fixed_length,
        })),
        WireField::Union(_) | WireField::UnionArray(_) => {
            Err(Error::UnsupportedShape(field.tag().to_string()))
        }
    }
}

pub(crate) fn struct_type_of(structure: &WireStructure) -> Result<GenericType> {
    let fields = structure
        .fields
        .iter()
        .map(|(name, f)| Ok(FieldType::new(name.clone(), generic_type_of(f)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(GenericType::Struct(StructType::new(structure.id.clone(), fields)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::GenericTypeBuilder;

    #[test]
    fn test_scalar_schema() {
        let schema = build_schema(&GenericType::Scalar(ScalarKind::UInt16)).expect("schema");
        assert_eq!(schema.as_ref(), &WireField::Scalar(WireTag::UShort));
    }

    #[test]
    fn test_struct_schema_preserves_order_and_names() {
        let limits = GenericTypeBuilder::named("Limits")
            .field("low", ScalarKind::Float64)
            .field("high", ScalarKind::Float64)
            .build();
        let ty = GenericTypeBuilder::named("Motor")
            .field("setpoint", ScalarKind::Float64)
            .fixed_array_field("samples", ScalarKind::Int16, 4)
            .nested_field("limits", limits)
            .struct_array_field(
                "history",
                GenericTypeBuilder::new().field("t", ScalarKind::Int64).build(),
            )
            .build();

        let schema = build_schema(&ty).expect("schema");
        let structure = schema.as_structure().expect("structure");
        assert_eq!(structure.id.as_deref(), Some("Motor"));
        let names: Vec<&str> = structure.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["setpoint", "samples", "limits", "history"]);

        assert_eq!(
            structure.field("samples").map(|f| f.as_ref()),
            Some(&WireField::ScalarArray {
                tag: WireTag::ShortArray,
                name: None,
                fixed_length: Some(4),
            })
        );
        let limits = structure.field("limits").and_then(|f| f.as_structure());
        assert_eq!(limits.and_then(|l| l.id.as_deref()), Some("Limits"));
        assert_eq!(
            structure.field("history").map(|f| f.tag()),
            Some(WireTag::StructureArray)
        );

        assert_eq!(generic_type_of(&schema).expect("inverse"), ty);
    }

    #[test]
    fn test_deep_nesting() {
        let mut ty = GenericTypeBuilder::new().field("leaf", ScalarKind::Int32).build();
        for _ in 0..200 {
            ty = GenericTypeBuilder::new().nested_field("inner", ty).build();
        }
        let schema = build_schema(&ty).expect("schema");
        assert_eq!(schema.tag(), WireTag::Structure);
    }

    #[test]
    fn test_unmapped_field() {
        let ty = GenericTypeBuilder::new()
            .field_with_type(
                "matrix",
                GenericType::array_of(GenericType::scalar_array(ScalarKind::Int32)),
            )
            .build();
        assert!(matches!(build_schema(&ty), Err(Error::UnknownType(_))));
        assert!(matches!(
            build_schema(&GenericType::Empty),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn test_char_alias_in_inverse() {
        let schema = build_schema(&GenericType::scalar_array(ScalarKind::Char8)).expect("schema");
        assert_eq!(
            generic_type_of(&schema).expect("inverse"),
            GenericType::scalar_array(ScalarKind::UInt8)
        );
    }

    #[test]
    fn test_hand_built_structure() {
        let field = WireField::Structure(
            FieldBuilder::new()
                .set_id("Pump")
                .add("speed", WireTag::Double)
                .add_array("history", WireTag::IntArray)
                .create_structure(),
        );
        let expected = GenericTypeBuilder::named("Pump")
            .field("speed", ScalarKind::Float64)
            .field_with_type("history", GenericType::scalar_array(ScalarKind::Int32))
            .build();
        assert_eq!(generic_type_of(&field).expect("type"), expected);
    }

    #[test]
    fn test_union_has_no_generic_type() {
        let field = WireField::Union(Default::default());
        assert!(matches!(
            generic_type_of(&field),
            Err(Error::UnsupportedShape(_))
        ));
    }
}
