// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic Value model.
//!
//! The dynamically-typed value model application code works against,
//! independent of which network protocol carries the data.
//!
//! # Features
//!
//! - **GenericType**: Runtime schema (scalars, structs, arrays)
//! - **GenericValue**: Tagged union holding data of a GenericType
//! - **Builder API**: Fluent interface for building struct types
//! - **Conversions**: Range-checked scalar conversion and value coercion
//!
//! # Example
//!
//! ```rust
//! use pvbridge::generic::{GenericTypeBuilder, GenericValue, ScalarKind, StructValue};
//!
//! let ty = GenericTypeBuilder::new()
//!     .field("setpoint", ScalarKind::Float64)
//!     .field("enabled", ScalarKind::Bool)
//!     .build();
//!
//! let value: GenericValue = StructValue::default()
//!     .with_field("setpoint", 4.0f64)
//!     .with_field("enabled", false)
//!     .into();
//!
//! assert_eq!(value.type_of(), ty);
//! assert_eq!(value.field("setpoint").and_then(GenericValue::as_f64), Some(4.0));
//! ```

mod builder;
mod convert;
mod types;
mod value;

pub use builder::GenericTypeBuilder;
pub use types::{ArrayType, FieldType, GenericType, ScalarKind, StructType};
pub use value::{ArrayValue, GenericValue, Scalar, StructValue};
