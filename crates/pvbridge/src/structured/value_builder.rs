// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic Value -> populated wire value.
//!
//! The target wire value must already be allocated from the schema
//! [`build_schema`] produces for the value's type. Both trees are walked in
//! lock-step; any disagreement between a datum and its slot is a
//! `TypeMismatch`. Nothing is coerced here.

use crate::error::{Error, Result};
use crate::generic::{GenericValue, StructValue};
use crate::structured::type_builder::build_schema;
use crate::structured::wire::{NodeId, WireField, WireScalarArray, WireValue};
use crate::tables;

/// Assign `value` into `wire`, node by node.
pub fn build_value(value: &GenericValue, wire: &mut WireValue) -> Result<()> {
    let Some(root) = wire.root() else {
        return if value.is_empty() {
            Ok(())
        } else {
            Err(Error::mismatch(value.type_of(), "empty wire value"))
        };
    };

    let mut pending: Vec<(&GenericValue, NodeId)> = vec![(value, root)];
    while let Some((value, id)) = pending.pop() {
        let field = match wire.node(id) {
            Some(node) => node.field().clone(),
            None => return Err(Error::InvalidSequence(format!("no wire node {}", id))),
        };

        match (value, field.as_ref()) {
            (GenericValue::Scalar(scalar), WireField::Scalar(tag)) => {
                let datum = tables::wire_scalar(scalar);
                if datum.tag() != *tag {
                    return Err(Error::mismatch(tag, datum.tag()));
                }
                wire.put_scalar(id, datum)?;
            }
            (GenericValue::Array(array), WireField::ScalarArray { tag, .. }) => {
                let kind = array
                    .element_type
                    .scalar_kind()
                    .ok_or_else(|| Error::mismatch(tag, value.type_of()))?;
                if tables::array_tag(kind) != *tag {
                    return Err(Error::mismatch(tag, tables::array_tag(kind)));
                }
                let items = array
                    .elements
                    .iter()
                    .map(|element| match element {
                        GenericValue::Scalar(s) if s.kind() == kind => Ok(tables::wire_scalar(s)),
                        other => Err(Error::mismatch(kind, other.type_of())),
                    })
                    .collect::<Result<Vec<_>>>()?;
                wire.put_scalar_array(id, WireScalarArray::new(*tag, items)?)?;
            }
            (GenericValue::Struct(s), WireField::Structure(_)) => {
                let members = wire.members(id);
                check_members(s, members.iter().map(|(name, _)| *name))?;
                let children: Vec<NodeId> = members.iter().map(|(_, child)| *child).collect();
                for ((_, field_value), child) in s.fields.iter().zip(children).rev() {
                    pending.push((field_value, child));
                }
            }
            (GenericValue::Array(array), WireField::StructureArray { fixed_length, .. }) => {
                if let Some(len) = fixed_length {
                    if array.len() != *len {
                        return Err(Error::mismatch(
                            format!("{} elements", len),
                            format!("{} elements", array.len()),
                        ));
                    }
                }
                let elements = wire.resize_structure_array(id, array.len())?;
                for (element, child) in array.elements.iter().zip(elements).rev() {
                    pending.push((element, child));
                }
            }
            (value, field) => return Err(Error::mismatch(field.tag(), value.type_of())),
        }
    }
    Ok(())
}

fn check_members<'a>(value: &StructValue, members: impl Iterator<Item = &'a str>) -> Result<()> {
    let members: Vec<&str> = members.collect();
    let fields: Vec<&str> = value.fields.iter().map(|(n, _)| n.as_str()).collect();
    if members == fields {
        Ok(())
    } else {
        Err(Error::mismatch(
            format!("members {:?}", members),
            format!("fields {:?}", fields),
        ))
    }
}

/// Encode a Generic Value as a fresh wire value (schema, allocate, assign).
///
/// The whole value is marked changed. `Empty` encodes as the empty wire value.
pub fn to_wire(value: &GenericValue) -> Result<WireValue> {
    if value.is_empty() {
        return Ok(WireValue::empty());
    }
    let schema = build_schema(&value.type_of())?;
    let mut wire = schema.instantiate();
    build_value(value, &mut wire)?;
    wire.mark_all_changed();
    log::debug!("[structured] encoded {} into {} wire tag", value.type_of(), schema.tag());
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{GenericType, GenericTypeBuilder, ScalarKind};
    use crate::structured::wire::{WireData, WireScalar};

    fn setpoint_type() -> GenericType {
        GenericTypeBuilder::new()
            .field("setpoint", ScalarKind::Float64)
            .field("enabled", ScalarKind::Bool)
            .build()
    }

    #[test]
    fn test_build_struct() {
        let mut wire = build_schema(&setpoint_type()).expect("schema").instantiate();
        let value: GenericValue = StructValue::default()
            .with_field("setpoint", 4.0f64)
            .with_field("enabled", true)
            .into();
        build_value(&value, &mut wire).expect("build");

        let enabled = wire.sub_field("enabled").expect("field");
        assert_eq!(
            wire.node(enabled).map(|n| n.data()),
            Some(&WireData::Scalar(WireScalar::Boolean(true)))
        );
    }

    #[test]
    fn test_scalar_slot_mismatch_is_not_coerced() {
        let mut wire = build_schema(&setpoint_type()).expect("schema").instantiate();
        let value: GenericValue = StructValue::default()
            .with_field("setpoint", 4i32)
            .with_field("enabled", true)
            .into();
        assert!(matches!(
            build_value(&value, &mut wire),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_member_names_must_match() {
        let mut wire = build_schema(&setpoint_type()).expect("schema").instantiate();
        let value: GenericValue = StructValue::default()
            .with_field("enabled", true)
            .with_field("setpoint", 4.0f64)
            .into();
        assert!(build_value(&value, &mut wire).is_err());
    }

    #[test]
    fn test_struct_array_elements() {
        let point = GenericTypeBuilder::new().field("x", ScalarKind::Int32).build();
        let point_value = |x: i32| GenericValue::from(StructValue::default().with_field("x", x));
        let value = GenericValue::Array(crate::generic::ArrayValue::new(
            point,
            vec![point_value(1), point_value(2)],
        ));

        let wire = to_wire(&value).expect("wire");
        let root = wire.root().expect("root");
        match wire.node(root).map(|n| n.data()) {
            Some(WireData::StructureArray(elements)) => assert_eq!(elements.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(wire.changed_paths(), vec![String::new()]);
    }

    #[test]
    fn test_empty_value() {
        assert!(to_wire(&GenericValue::Empty).expect("wire").is_empty());
        let mut wire = WireValue::empty();
        assert!(build_value(&GenericValue::from(1u8), &mut wire).is_err());
    }
}
