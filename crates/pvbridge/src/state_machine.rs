// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stack-based builder automaton for Generic Value trees.
//!
//! Nine operations construct a tree. The grammar is:
//!
//! ```text
//! value   := Value | struct | array
//! struct  := StartStruct (StartField value EndField)* EndStruct
//! array   := StartArray (StartArrayElement value EndArrayElement)* EndArray
//! ```
//!
//! A value may only be opened on an empty stack or directly under a pending
//! `StartField` / `StartArrayElement`. Every other sequence fails with
//! [`Error::InvalidSequence`] and leaves the stack untouched.

use crate::error::{Error, Result};
use crate::generic::{ArrayValue, GenericType, GenericValue, StructValue};
use std::fmt;
use std::sync::Arc;

/// Builder event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Value,
    StartStruct,
    EndStruct,
    StartField,
    EndField,
    StartArray,
    EndArray,
    StartArrayElement,
    EndArrayElement,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Pending node on the builder stack.
#[derive(Debug)]
enum Pending {
    /// Completed value.
    Value(GenericValue),
    /// Open struct with the members appended so far.
    Struct(StructValue),
    /// Open field awaiting its value.
    Field(String),
    /// Open array with the elements appended so far.
    Array {
        name: Option<String>,
        element_type: Option<Arc<GenericType>>,
        length: Option<usize>,
        elements: Vec<GenericValue>,
    },
    /// Open array element awaiting its value.
    Element,
}

impl Pending {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Value(_) => NodeKind::Value,
            Self::Struct(_) => NodeKind::StartStruct,
            Self::Field(_) => NodeKind::StartField,
            Self::Array { .. } => NodeKind::StartArray,
            Self::Element => NodeKind::StartArrayElement,
        }
    }
}

/// Builds one Generic Value from a sequence of builder events.
#[derive(Debug, Default)]
pub struct ValueStateMachine {
    stack: Vec<Pending>,
}

impl ValueStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending nodes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn top_kind(&self) -> Option<NodeKind> {
        self.stack.last().map(Pending::kind)
    }

    /// Kinds of the top `n` nodes, top first.
    fn top_kinds(&self, n: usize) -> Vec<NodeKind> {
        self.stack.iter().rev().take(n).map(Pending::kind).collect()
    }

    fn reject(&self, op: NodeKind) -> Error {
        let top = self
            .top_kind()
            .map_or_else(|| "empty stack".to_string(), |k| k.to_string());
        Error::InvalidSequence(format!("{} not allowed on {}", op, top))
    }

    fn check_open(&self, op: NodeKind) -> Result<()> {
        match self.top_kind() {
            None | Some(NodeKind::StartField) | Some(NodeKind::StartArrayElement) => Ok(()),
            Some(_) => Err(self.reject(op)),
        }
    }

    fn check_top(&self, op: NodeKind, expected: NodeKind) -> Result<()> {
        if self.top_kind() == Some(expected) {
            Ok(())
        } else {
            Err(self.reject(op))
        }
    }

    /// Push a completed value (scalar, scalar array or any prebuilt tree).
    pub fn push_value(&mut self, value: GenericValue) -> Result<()> {
        self.check_open(NodeKind::Value)?;
        self.stack.push(Pending::Value(value));
        Ok(())
    }

    pub fn start_struct(&mut self, name: Option<String>) -> Result<()> {
        self.check_open(NodeKind::StartStruct)?;
        self.stack.push(Pending::Struct(StructValue::new(name)));
        Ok(())
    }

    pub fn end_struct(&mut self) -> Result<()> {
        self.check_top(NodeKind::EndStruct, NodeKind::StartStruct)?;
        if let Some(Pending::Struct(s)) = self.stack.pop() {
            self.stack.push(Pending::Value(GenericValue::Struct(s)));
        }
        Ok(())
    }

    pub fn start_field(&mut self, name: impl Into<String>) -> Result<()> {
        self.check_top(NodeKind::StartField, NodeKind::StartStruct)?;
        self.stack.push(Pending::Field(name.into()));
        Ok(())
    }

    pub fn end_field(&mut self) -> Result<()> {
        let expected = [NodeKind::Value, NodeKind::StartField, NodeKind::StartStruct];
        if self.top_kinds(3) != expected {
            return Err(self.reject(NodeKind::EndField));
        }
        let len = self.stack.len();
        if let (Some(Pending::Field(name)), Some(Pending::Struct(s))) =
            (self.stack.get(len - 2), self.stack.get(len - 3))
        {
            if s.field(name).is_some() {
                return Err(Error::InvalidSequence(format!("duplicate field '{}'", name)));
            }
        }
        let (Some(Pending::Value(value)), Some(Pending::Field(name))) =
            (self.stack.pop(), self.stack.pop())
        else {
            return Err(Error::InvalidSequence("corrupt field frame".into()));
        };
        match self.stack.last_mut() {
            Some(Pending::Struct(s)) => {
                s.fields.push((name, value));
                Ok(())
            }
            _ => Err(Error::InvalidSequence("corrupt field frame".into())),
        }
    }

    /// Open an array. `element_hint` types the array when it ends up empty
    /// and fixes the element type before the first element arrives.
    pub fn start_array(
        &mut self,
        name: Option<String>,
        element_hint: Option<Arc<GenericType>>,
    ) -> Result<()> {
        self.start_fixed_array(name, element_hint, None)
    }

    /// Open an array that records a fixed length in its type.
    pub fn start_fixed_array(
        &mut self,
        name: Option<String>,
        element_hint: Option<Arc<GenericType>>,
        length: Option<usize>,
    ) -> Result<()> {
        self.check_open(NodeKind::StartArray)?;
        self.stack.push(Pending::Array {
            name,
            element_type: element_hint,
            length,
            elements: Vec::new(),
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.check_top(NodeKind::EndArray, NodeKind::StartArray)?;
        if let Some(Pending::Array {
            name,
            element_type,
            length,
            elements,
        }) = self.stack.pop()
        {
            self.stack.push(Pending::Value(GenericValue::Array(ArrayValue {
                name,
                element_type: element_type.unwrap_or_default(),
                length,
                elements,
            })));
        }
        Ok(())
    }

    pub fn start_array_element(&mut self) -> Result<()> {
        self.check_top(NodeKind::StartArrayElement, NodeKind::StartArray)?;
        self.stack.push(Pending::Element);
        Ok(())
    }

    /// Append the completed value as the next element.
    ///
    /// The first element fixes the element type (unless a hint already did);
    /// later elements are converted to it, failing with `TypeMismatch`.
    pub fn end_array_element(&mut self) -> Result<()> {
        let expected = [
            NodeKind::Value,
            NodeKind::StartArrayElement,
            NodeKind::StartArray,
        ];
        if self.top_kinds(3) != expected {
            return Err(self.reject(NodeKind::EndArrayElement));
        }
        let Some(Pending::Array { element_type, .. }) = self.stack.get(self.stack.len() - 3) else {
            return Err(Error::InvalidSequence("corrupt element frame".into()));
        };
        let conformed = match (element_type, self.stack.last()) {
            (Some(ty), Some(Pending::Value(value))) if value.type_of() != **ty => Some(
                value
                    .coerce_to(ty)
                    .ok_or_else(|| Error::mismatch(ty.as_ref(), value.type_of()))?,
            ),
            _ => None,
        };

        let Some(Pending::Value(value)) = self.stack.pop() else {
            return Err(Error::InvalidSequence("corrupt element frame".into()));
        };
        self.stack.pop();
        let value = conformed.unwrap_or(value);
        match self.stack.last_mut() {
            Some(Pending::Array {
                element_type,
                elements,
                ..
            }) => {
                if element_type.is_none() {
                    *element_type = Some(Arc::new(value.type_of()));
                }
                elements.push(value);
                Ok(())
            }
            _ => Err(Error::InvalidSequence("corrupt element frame".into())),
        }
    }

    /// Take the finished tree.
    ///
    /// An untouched machine finishes as `Empty`; otherwise exactly one
    /// completed value must remain.
    pub fn finish(mut self) -> Result<GenericValue> {
        match self.stack.len() {
            0 => Ok(GenericValue::Empty),
            1 => match self.stack.pop() {
                Some(Pending::Value(value)) => Ok(value),
                Some(other) => Err(Error::InvalidSequence(format!(
                    "unterminated {}",
                    other.kind()
                ))),
                None => Ok(GenericValue::Empty),
            },
            n => Err(Error::InvalidSequence(format!("{} nodes still pending", n))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::ScalarKind;

    fn is_invalid<T: fmt::Debug>(result: Result<T>) -> bool {
        matches!(result, Err(Error::InvalidSequence(_)))
    }

    #[test]
    fn test_closers_on_empty_stack() {
        let mut sm = ValueStateMachine::new();
        assert!(is_invalid(sm.end_field()));
        assert!(is_invalid(sm.end_array_element()));
        assert!(is_invalid(sm.end_struct()));
        assert!(is_invalid(sm.end_array()));
        assert_eq!(sm.depth(), 0);
    }

    #[test]
    fn test_value_directly_in_struct_rejected() {
        let mut sm = ValueStateMachine::new();
        sm.start_struct(None).expect("start");
        assert!(is_invalid(sm.push_value(1i32.into())));
        assert!(is_invalid(sm.start_struct(None)));
        assert_eq!(sm.depth(), 1);
    }

    #[test]
    fn test_field_requires_struct() {
        let mut sm = ValueStateMachine::new();
        assert!(is_invalid(sm.start_field("x")));
        sm.start_array(None, None).expect("array");
        assert!(is_invalid(sm.start_field("x")));
        assert!(is_invalid(sm.start_array_element().and_then(|_| sm.end_array_element())));
    }

    #[test]
    fn test_struct_build() {
        let mut sm = ValueStateMachine::new();
        sm.start_struct(Some("Motor".into())).expect("start");
        sm.start_field("setpoint").expect("field");
        sm.push_value(4.0f64.into()).expect("value");
        sm.end_field().expect("end field");
        sm.start_field("enabled").expect("field");
        sm.push_value(false.into()).expect("value");
        sm.end_field().expect("end field");
        sm.end_struct().expect("end struct");

        let expected: GenericValue = StructValue::new(Some("Motor".into()))
            .with_field("setpoint", 4.0f64)
            .with_field("enabled", false)
            .into();
        assert_eq!(sm.finish().expect("finish"), expected);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut sm = ValueStateMachine::new();
        sm.start_struct(None).expect("start");
        sm.start_field("a").expect("field");
        sm.push_value(1i32.into()).expect("value");
        sm.end_field().expect("end field");
        sm.start_field("a").expect("field");
        sm.push_value(2i32.into()).expect("value");
        assert!(is_invalid(sm.end_field()));
    }

    #[test]
    fn test_array_elements_conform_to_first() {
        let mut sm = ValueStateMachine::new();
        sm.start_array(None, None).expect("array");
        for v in [GenericValue::from(1.5f64), GenericValue::from(2i32)] {
            sm.start_array_element().expect("element");
            sm.push_value(v).expect("value");
            sm.end_array_element().expect("end element");
        }
        sm.end_array().expect("end array");

        assert_eq!(sm.finish().expect("finish"), GenericValue::from(vec![1.5f64, 2.0]));
    }

    #[test]
    fn test_array_element_mismatch() {
        let mut sm = ValueStateMachine::new();
        sm.start_array(None, None).expect("array");
        sm.start_array_element().expect("element");
        sm.push_value(1i32.into()).expect("value");
        sm.end_array_element().expect("end element");
        sm.start_array_element().expect("element");
        sm.push_value("not a number".into()).expect("value");
        assert!(matches!(
            sm.end_array_element(),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_array_uses_hint() {
        let mut sm = ValueStateMachine::new();
        let hint = Arc::new(GenericType::Scalar(ScalarKind::Int16));
        sm.start_array(Some("samples".into()), Some(hint.clone())).expect("array");
        sm.end_array().expect("end");

        let value = sm.finish().expect("finish");
        let array = value.as_array().expect("array");
        assert!(array.is_empty());
        assert_eq!(array.element_type, hint);
        assert_eq!(array.name.as_deref(), Some("samples"));
    }

    #[test]
    fn test_finish() {
        assert_eq!(ValueStateMachine::new().finish().ok(), Some(GenericValue::Empty));

        let mut sm = ValueStateMachine::new();
        sm.start_struct(None).expect("start");
        assert!(is_invalid(sm.finish()));

        let mut sm = ValueStateMachine::new();
        sm.push_value(3u8.into()).expect("value");
        assert!(is_invalid(sm.push_value(4u8.into())));
        assert_eq!(sm.finish().ok(), Some(GenericValue::from(3u8)));
    }
}
