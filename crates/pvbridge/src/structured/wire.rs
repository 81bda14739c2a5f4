// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured-protocol wire representation.
//!
//! A [`WireValue`] owns its whole tree in an arena; nodes are addressed by
//! [`NodeId`]. Codec calls hand wire trees over by move and `Clone` is a deep
//! copy, so two values never alias the same node.
//!
//! ```text
//! WireValue
//! +-- nodes: [N0 root struct][N1 double][N2 boolean][N3 struct[] ...]
//! |            |  members: [1, 2, 3]
//! +-- root: N0
//! ```
//!
//! Every node carries its introspection ([`WireField`]) and a changed bit that
//! setters raise. Monitor deliveries use the changed bits to describe partial
//! updates.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Structured-protocol type tags.
///
/// Array tags are distinct codes, not a flag on the element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireTag {
    Boolean,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    String,
    BooleanArray,
    ByteArray,
    UByteArray,
    ShortArray,
    UShortArray,
    IntArray,
    UIntArray,
    LongArray,
    ULongArray,
    FloatArray,
    DoubleArray,
    StringArray,
    Structure,
    StructureArray,
    Union,
    UnionArray,
}

impl WireTag {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Byte
                | Self::UByte
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
                | Self::Float
                | Self::Double
                | Self::String
        )
    }

    pub fn is_scalar_array(&self) -> bool {
        self.element_tag().is_some()
    }

    /// Element tag of a scalar-array tag.
    pub fn element_tag(&self) -> Option<WireTag> {
        Some(match self {
            Self::BooleanArray => Self::Boolean,
            Self::ByteArray => Self::Byte,
            Self::UByteArray => Self::UByte,
            Self::ShortArray => Self::Short,
            Self::UShortArray => Self::UShort,
            Self::IntArray => Self::Int,
            Self::UIntArray => Self::UInt,
            Self::LongArray => Self::Long,
            Self::ULongArray => Self::ULong,
            Self::FloatArray => Self::Float,
            Self::DoubleArray => Self::Double,
            Self::StringArray => Self::String,
            _ => return None,
        })
    }
}

impl fmt::Display for WireTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Scalar datum as carried on the structured protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum WireScalar {
    Boolean(bool),
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
}

impl WireScalar {
    pub fn tag(&self) -> WireTag {
        match self {
            Self::Boolean(_) => WireTag::Boolean,
            Self::Byte(_) => WireTag::Byte,
            Self::UByte(_) => WireTag::UByte,
            Self::Short(_) => WireTag::Short,
            Self::UShort(_) => WireTag::UShort,
            Self::Int(_) => WireTag::Int,
            Self::UInt(_) => WireTag::UInt,
            Self::Long(_) => WireTag::Long,
            Self::ULong(_) => WireTag::ULong,
            Self::Float(_) => WireTag::Float,
            Self::Double(_) => WireTag::Double,
            Self::String(_) => WireTag::String,
        }
    }

    /// Default datum for a scalar tag.
    pub fn default_for(tag: WireTag) -> Option<Self> {
        Some(match tag {
            WireTag::Boolean => Self::Boolean(false),
            WireTag::Byte => Self::Byte(0),
            WireTag::UByte => Self::UByte(0),
            WireTag::Short => Self::Short(0),
            WireTag::UShort => Self::UShort(0),
            WireTag::Int => Self::Int(0),
            WireTag::UInt => Self::UInt(0),
            WireTag::Long => Self::Long(0),
            WireTag::ULong => Self::ULong(0),
            WireTag::Float => Self::Float(0.0),
            WireTag::Double => Self::Double(0.0),
            WireTag::String => Self::String(String::new()),
            _ => return None,
        })
    }
}

/// Homogeneous scalar array. All items carry the array's element tag.
#[derive(Debug, Clone, PartialEq)]
pub struct WireScalarArray {
    tag: WireTag,
    items: Vec<WireScalar>,
}

impl WireScalarArray {
    /// Create an empty array for an array tag.
    pub fn empty(tag: WireTag) -> Result<Self> {
        if !tag.is_scalar_array() {
            return Err(Error::mismatch("scalar array tag", tag));
        }
        Ok(Self {
            tag,
            items: Vec::new(),
        })
    }

    /// Create an array, checking every item against the element tag.
    pub fn new(tag: WireTag, items: Vec<WireScalar>) -> Result<Self> {
        let element = tag
            .element_tag()
            .ok_or_else(|| Error::mismatch("scalar array tag", tag))?;
        if let Some(bad) = items.iter().find(|item| item.tag() != element) {
            return Err(Error::mismatch(element, bad.tag()));
        }
        Ok(Self { tag, items })
    }

    pub fn tag(&self) -> WireTag {
        self.tag
    }

    pub fn items(&self) -> &[WireScalar] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Structure introspection: optional type id plus ordered members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireStructure {
    pub id: Option<String>,
    pub fields: Vec<(String, Arc<WireField>)>,
}

impl WireStructure {
    pub fn field(&self, name: &str) -> Option<&Arc<WireField>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}

/// Union introspection. Unions can be carried but are not translated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireUnion {
    pub id: Option<String>,
    pub fields: Vec<(String, Arc<WireField>)>,
}

/// Introspection node of the structured protocol (the wire schema).
#[derive(Debug, Clone, PartialEq)]
pub enum WireField {
    Scalar(WireTag),
    ScalarArray {
        tag: WireTag,
        name: Option<String>,
        fixed_length: Option<usize>,
    },
    Structure(WireStructure),
    StructureArray {
        element: Arc<WireStructure>,
        name: Option<String>,
        fixed_length: Option<usize>,
    },
    Union(WireUnion),
    UnionArray(Arc<WireUnion>),
}

impl WireField {
    pub fn tag(&self) -> WireTag {
        match self {
            Self::Scalar(tag) | Self::ScalarArray { tag, .. } => *tag,
            Self::Structure(_) => WireTag::Structure,
            Self::StructureArray { .. } => WireTag::StructureArray,
            Self::Union(_) => WireTag::Union,
            Self::UnionArray(_) => WireTag::UnionArray,
        }
    }

    pub fn as_structure(&self) -> Option<&WireStructure> {
        match self {
            Self::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// Allocate a default-valued wire value with this schema.
    pub fn instantiate(self: &Arc<Self>) -> WireValue {
        let mut value = WireValue::empty();
        let root = value.alloc(self);
        value.root = Some(root);
        value
    }
}

/// Shared wire schema, as produced by the type builder.
pub type WireSchema = Arc<WireField>;

/// Index of a node inside its [`WireValue`].
pub type NodeId = usize;

/// Payload of one wire node.
#[derive(Debug, Clone, PartialEq)]
pub enum WireData {
    Scalar(WireScalar),
    ScalarArray(WireScalarArray),
    /// Member nodes, in introspection order.
    Structure(Vec<NodeId>),
    StructureArray(Vec<NodeId>),
    /// Selected member index and its node.
    Union(Option<(usize, NodeId)>),
    UnionArray(Vec<NodeId>),
}

/// One node of a wire tree.
#[derive(Debug, Clone)]
pub struct WireNode {
    field: Arc<WireField>,
    data: WireData,
    changed: bool,
}

impl WireNode {
    pub fn field(&self) -> &Arc<WireField> {
        &self.field
    }

    pub fn data(&self) -> &WireData {
        &self.data
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Owned wire value tree.
#[derive(Debug, Clone, Default)]
pub struct WireValue {
    nodes: Vec<WireNode>,
    root: Option<NodeId>,
}

impl WireValue {
    /// Canonical absent value (no root).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Introspection of the root node.
    pub fn schema(&self) -> Option<&Arc<WireField>> {
        self.root.map(|id| &self.nodes[id].field)
    }

    pub fn node(&self, id: NodeId) -> Option<&WireNode> {
        self.nodes.get(id)
    }

    fn node_checked(&self, id: NodeId) -> Result<&WireNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::InvalidSequence(format!("no wire node {}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut WireNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::InvalidSequence(format!("no wire node {}", id)))
    }

    fn alloc(&mut self, field: &Arc<WireField>) -> NodeId {
        let data = match field.as_ref() {
            WireField::Scalar(tag) => WireData::Scalar(
                WireScalar::default_for(*tag).unwrap_or(WireScalar::Boolean(false)),
            ),
            WireField::ScalarArray {
                tag, fixed_length, ..
            } => {
                let element = tag.element_tag().and_then(WireScalar::default_for);
                let items = match (element, fixed_length) {
                    (Some(item), Some(len)) => vec![item; *len],
                    _ => Vec::new(),
                };
                WireData::ScalarArray(WireScalarArray { tag: *tag, items })
            }
            WireField::Structure(s) => {
                let members = s.fields.iter().map(|(_, f)| self.alloc(f)).collect();
                WireData::Structure(members)
            }
            WireField::StructureArray { .. } => WireData::StructureArray(Vec::new()),
            WireField::Union(_) => WireData::Union(None),
            WireField::UnionArray(_) => WireData::UnionArray(Vec::new()),
        };
        self.nodes.push(WireNode {
            field: field.clone(),
            data,
            changed: false,
        });
        self.nodes.len() - 1
    }

    /// Members of a structure node with their names.
    pub fn members(&self, id: NodeId) -> Vec<(&str, NodeId)> {
        match self.nodes.get(id) {
            Some(WireNode {
                field,
                data: WireData::Structure(members),
                ..
            }) => match field.as_ref() {
                WireField::Structure(s) => s
                    .fields
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .zip(members.iter().copied())
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Member of a structure node by name.
    pub fn member(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.members(id)
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, child)| child)
    }

    /// Node at a dot-separated path from the root (`""` is the root).
    pub fn sub_field(&self, path: &str) -> Option<NodeId> {
        let root = self.root?;
        if path.is_empty() {
            return Some(root);
        }
        path.split('.')
            .try_fold(root, |id, segment| self.member(id, segment))
    }

    /// Assign a scalar. The datum's tag must equal the slot's tag.
    pub fn put_scalar(&mut self, id: NodeId, value: WireScalar) -> Result<()> {
        let node = self.node_mut(id)?;
        let fits = matches!(&node.data, WireData::Scalar(current) if current.tag() == value.tag());
        if !fits {
            return Err(Error::mismatch(node.field.tag(), value.tag()));
        }
        node.data = WireData::Scalar(value);
        node.changed = true;
        Ok(())
    }

    /// Assign a scalar array. Tags must match and fixed lengths must hold.
    pub fn put_scalar_array(&mut self, id: NodeId, value: WireScalarArray) -> Result<()> {
        let node = self.node_mut(id)?;
        let fixed = match node.field.as_ref() {
            WireField::ScalarArray {
                tag, fixed_length, ..
            } if *tag == value.tag() => *fixed_length,
            other => return Err(Error::mismatch(other.tag(), value.tag())),
        };
        if let Some(len) = fixed {
            if value.len() != len {
                return Err(Error::mismatch(
                    format!("{} elements", len),
                    format!("{} elements", value.len()),
                ));
            }
        }
        node.data = WireData::ScalarArray(value);
        node.changed = true;
        Ok(())
    }

    /// Resize a structure array, allocating default elements as needed.
    /// Returns the element node ids.
    pub fn resize_structure_array(&mut self, id: NodeId, len: usize) -> Result<Vec<NodeId>> {
        let (element, current) = match self.node_checked(id)? {
            WireNode {
                field,
                data: WireData::StructureArray(current),
                ..
            } => match field.as_ref() {
                WireField::StructureArray { element, .. } => (element.clone(), current.clone()),
                other => return Err(Error::mismatch(WireTag::StructureArray, other.tag())),
            },
            other => return Err(Error::mismatch(WireTag::StructureArray, other.field.tag())),
        };
        let element_field = Arc::new(WireField::Structure(element.as_ref().clone()));
        let mut elements = current;
        elements.truncate(len);
        while elements.len() < len {
            elements.push(self.alloc(&element_field));
        }
        let node = self.node_mut(id)?;
        node.data = WireData::StructureArray(elements.clone());
        node.changed = true;
        Ok(elements)
    }

    /// Select a union member by name, allocating its node.
    pub fn select_union(&mut self, id: NodeId, name: &str) -> Result<NodeId> {
        let (index, member) = match self.node_checked(id)?.field.as_ref() {
            WireField::Union(u) => u
                .fields
                .iter()
                .enumerate()
                .find(|(_, (n, _))| n == name)
                .map(|(i, (_, f))| (i, f.clone()))
                .ok_or_else(|| Error::mismatch("union member", name))?,
            other => return Err(Error::mismatch(WireTag::Union, other.tag())),
        };
        let child = self.alloc(&member);
        let node = self.node_mut(id)?;
        node.data = WireData::Union(Some((index, child)));
        node.changed = true;
        Ok(child)
    }

    pub fn mark_changed(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.changed = true;
        }
    }

    /// Mark the root (and therefore the whole value) changed.
    pub fn mark_all_changed(&mut self) {
        if let Some(root) = self.root {
            self.mark_changed(root);
        }
    }

    pub fn clear_changes(&mut self) {
        for node in &mut self.nodes {
            node.changed = false;
        }
    }

    fn subtree_changed(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if node.changed {
                return true;
            }
            match &node.data {
                WireData::Structure(children)
                | WireData::StructureArray(children)
                | WireData::UnionArray(children) => stack.extend(children.iter().copied()),
                WireData::Union(Some((_, child))) => stack.push(*child),
                _ => {}
            }
        }
        false
    }

    /// Minimal set of changed field paths.
    ///
    /// A changed node hides its descendants. Changes inside array elements are
    /// reported at the array field, since paths only address struct members.
    /// The root reports as `""`.
    pub fn changed_paths(&self) -> Vec<String> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let mut paths = Vec::new();
        let mut stack = vec![(root, String::new())];
        while let Some((id, path)) = stack.pop() {
            let node = &self.nodes[id];
            if node.changed {
                paths.push(path);
                continue;
            }
            match &node.data {
                WireData::Structure(_) => {
                    for (name, child) in self.members(id).into_iter().rev() {
                        let child_path = if path.is_empty() {
                            name.to_string()
                        } else {
                            format!("{}.{}", path, name)
                        };
                        stack.push((child, child_path));
                    }
                }
                _ => {
                    if self.subtree_changed(id) {
                        paths.push(path);
                    }
                }
            }
        }
        paths
    }
}
