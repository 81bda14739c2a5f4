// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured-protocol value codec.
//!
//! # Pipeline
//!
//! ```text
//! GenericType --build_schema--> WireSchema --instantiate--> WireValue
//! GenericValue ------------------build_value-----------------^  |
//! GenericValue <-----------------parse--------------------------+
//! ```
//!
//! For every value whose type uses only mapped codes,
//! `parse(to_wire(v)) == v`, except that `Char8` data comes back as `UInt8`.

mod parser;
mod type_builder;
mod value_builder;
mod wire;

pub use parser::parse;
pub use type_builder::{build_schema, generic_type_of, FieldBuilder};
pub use value_builder::{build_value, to_wire};
pub use wire::{
    NodeId, WireData, WireField, WireNode, WireScalar, WireScalarArray, WireSchema,
    WireStructure, WireTag, WireUnion, WireValue,
};
