// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire value -> Generic Value.
//!
//! Non-recursive: an explicit frame stack walks the wire tree and drives a
//! [`ValueStateMachine`], so depth and width are bounded only by memory.
//!
//! Structures and structure arrays are visited twice: the first visit opens
//! them and pushes their children in reverse (so they pop in order), the
//! second closes them. Scalar and scalar-array leaves convert in one step.

use crate::error::{Error, Result};
use crate::generic::{ArrayValue, GenericType, GenericValue};
use crate::state_machine::ValueStateMachine;
use crate::structured::type_builder::struct_type_of;
use crate::structured::wire::{NodeId, WireData, WireField, WireValue};
use crate::tables;
use std::sync::Arc;

/// Where a node sits relative to its parent.
#[derive(Debug, Clone)]
enum Context {
    Root,
    StructField(String),
    ArrayElement,
}

#[derive(Debug)]
struct Frame {
    id: NodeId,
    context: Context,
    visited: bool,
}

fn open(machine: &mut ValueStateMachine, context: &Context) -> Result<()> {
    match context {
        Context::Root => Ok(()),
        Context::StructField(name) => machine.start_field(name.clone()),
        Context::ArrayElement => machine.start_array_element(),
    }
}

fn close(machine: &mut ValueStateMachine, context: &Context) -> Result<()> {
    match context {
        Context::Root => Ok(()),
        Context::StructField(_) => machine.end_field(),
        Context::ArrayElement => machine.end_array_element(),
    }
}

/// Convert a wire value into a Generic Value.
///
/// `None` and the empty wire value both yield `Empty`. Unions fail with
/// `UnsupportedShape`.
pub fn parse(wire: Option<&WireValue>) -> Result<GenericValue> {
    let Some(wire) = wire else {
        return Ok(GenericValue::Empty);
    };
    let Some(root) = wire.root() else {
        return Ok(GenericValue::Empty);
    };

    let mut machine = ValueStateMachine::new();
    let mut frames = vec![Frame {
        id: root,
        context: Context::Root,
        visited: false,
    }];

    while let Some(frame) = frames.last_mut() {
        let node = wire
            .node(frame.id)
            .ok_or_else(|| Error::InvalidSequence(format!("no wire node {}", frame.id)))?;

        match (node.data(), node.field().as_ref()) {
            (WireData::Structure(_), WireField::Structure(structure)) => {
                if frame.visited {
                    let context = frame.context.clone();
                    frames.pop();
                    machine.end_struct()?;
                    close(&mut machine, &context)?;
                    continue;
                }
                frame.visited = true;
                let id = frame.id;
                open(&mut machine, &frame.context)?;
                machine.start_struct(structure.id.clone())?;
                for (name, child) in wire.members(id).into_iter().rev() {
                    frames.push(Frame {
                        id: child,
                        context: Context::StructField(name.to_string()),
                        visited: false,
                    });
                }
            }
            (
                WireData::StructureArray(elements),
                WireField::StructureArray {
                    element,
                    name,
                    fixed_length,
                },
            ) => {
                if frame.visited {
                    let context = frame.context.clone();
                    frames.pop();
                    machine.end_array()?;
                    close(&mut machine, &context)?;
                    continue;
                }
                frame.visited = true;
                open(&mut machine, &frame.context)?;
                let hint = Arc::new(struct_type_of(element)?);
                machine.start_fixed_array(name.clone(), Some(hint), *fixed_length)?;
                for child in elements.iter().rev() {
                    frames.push(Frame {
                        id: *child,
                        context: Context::ArrayElement,
                        visited: false,
                    });
                }
            }
            (WireData::Scalar(scalar), _) => {
                let context = frame.context.clone();
                frames.pop();
                open(&mut machine, &context)?;
                machine.push_value(GenericValue::Scalar(tables::generic_scalar(scalar)))?;
                close(&mut machine, &context)?;
            }
            (
                WireData::ScalarArray(array),
                WireField::ScalarArray {
                    name, fixed_length, ..
                },
            ) => {
                let context = frame.context.clone();
                frames.pop();
                let kind = tables::scalar_kind_of(array.tag())
                    .ok_or_else(|| Error::UnknownType(array.tag().to_string()))?;
                let value = GenericValue::Array(ArrayValue {
                    name: name.clone(),
                    element_type: Arc::new(GenericType::Scalar(kind)),
                    length: *fixed_length,
                    elements: array
                        .items()
                        .iter()
                        .map(|item| GenericValue::Scalar(tables::generic_scalar(item)))
                        .collect(),
                });
                open(&mut machine, &context)?;
                machine.push_value(value)?;
                close(&mut machine, &context)?;
            }
            (WireData::Union(_) | WireData::UnionArray(_), field) => {
                return Err(Error::UnsupportedShape(format!(
                    "{} at node {}",
                    field.tag(),
                    frame.id
                )));
            }
            (_, field) => {
                return Err(Error::UnsupportedShape(format!(
                    "inconsistent {} node {}",
                    field.tag(),
                    frame.id
                )));
            }
        }
    }

    machine.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{GenericTypeBuilder, ScalarKind, StructValue};
    use crate::structured::to_wire;
    use crate::structured::wire::{WireScalar, WireStructure, WireTag, WireUnion};

    #[test]
    fn test_absent_and_empty() {
        assert_eq!(parse(None).ok(), Some(GenericValue::Empty));
        assert_eq!(parse(Some(&WireValue::empty())).ok(), Some(GenericValue::Empty));
    }

    #[test]
    fn test_nested_round_trip() {
        let limits: GenericValue = StructValue::new(Some("Limits".into()))
            .with_field("low", -1.0f64)
            .with_field("high", 1.0f64)
            .into();
        let value: GenericValue = StructValue::new(Some("Motor".into()))
            .with_field("name", "pump-1")
            .with_field("limits", limits)
            .with_field("samples", vec![1i16, 2, 3])
            .with_field("raw", vec![0xffu64])
            .into();

        let wire = to_wire(&value).expect("wire");
        assert_eq!(parse(Some(&wire)).expect("parse"), value);
    }

    #[test]
    fn test_empty_struct_array_is_typed() {
        let element = GenericTypeBuilder::new().field("x", ScalarKind::Int32).build();
        let value = GenericValue::Array(ArrayValue::new(element.clone(), Vec::new()));

        let parsed = parse(Some(&to_wire(&value).expect("wire"))).expect("parse");
        assert_eq!(parsed, value);
        assert_eq!(parsed.type_of(), GenericType::array_of(element));
    }

    #[test]
    fn test_char_alias() {
        let value = GenericValue::Scalar(crate::generic::Scalar::Char8(b'Z'));
        let parsed = parse(Some(&to_wire(&value).expect("wire"))).expect("parse");
        assert_ne!(parsed, value);
        assert_eq!(parsed, GenericValue::from(b'Z'));
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut value: GenericValue = StructValue::default().with_field("leaf", 7i32).into();
        for _ in 0..150 {
            value = StructValue::default().with_field("inner", value).into();
        }
        let wire = to_wire(&value).expect("wire");
        assert_eq!(parse(Some(&wire)).expect("parse"), value);
    }

    #[test]
    fn test_union_rejected() {
        let schema = Arc::new(WireField::Structure(WireStructure {
            id: None,
            fields: vec![(
                "choice".into(),
                Arc::new(WireField::Union(WireUnion {
                    id: None,
                    fields: vec![("a".into(), Arc::new(WireField::Scalar(WireTag::Int)))],
                })),
            )],
        }));
        let mut wire = schema.instantiate();
        assert!(matches!(
            parse(Some(&wire)),
            Err(Error::UnsupportedShape(_))
        ));

        wire.clear_changes();
        let choice = wire.sub_field("choice").expect("choice");
        let member = wire.select_union(choice, "a").expect("select");
        wire.put_scalar(member, WireScalar::Int(3)).expect("put");
        assert_eq!(wire.changed_paths(), vec!["choice".to_string()]);
        assert!(wire.select_union(choice, "b").is_err());
        assert!(matches!(
            parse(Some(&wire)),
            Err(Error::UnsupportedShape(_))
        ));
    }
}
