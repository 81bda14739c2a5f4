// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # pvbridge - Process variable value bridge
//!
//! Translates control-system process variables between a protocol-neutral
//! Generic Value model and the two wire representations used by channel
//! providers: a self-describing structured tree and a legacy fixed-width
//! byte buffer. On top of the codecs, [`ProcessVariable`] keeps a
//! thread-safe cache of the latest remote value.
//!
//! ## Quick Start
//!
//! ```rust
//! use pvbridge::{
//!     structured, BridgeConfig, GenericTypeBuilder, GenericValue, LoopbackProvider,
//!     ProcessVariable, Protocol, ScalarKind, StructValue,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let ty = GenericTypeBuilder::new()
//!     .field("setpoint", ScalarKind::Float64)
//!     .field("enabled", ScalarKind::Bool)
//!     .build();
//!
//! let provider = Arc::new(LoopbackProvider::new(Protocol::Structured));
//! let pv = ProcessVariable::new("PUMP:CTRL", ty, provider.clone(), &BridgeConfig::default())?;
//! provider.connect("PUMP:CTRL");
//!
//! let value: GenericValue = StructValue::default()
//!     .with_field("setpoint", 4.0f64)
//!     .with_field("enabled", true)
//!     .into();
//! assert!(pv.set_value(&value));
//! assert!(pv.wait_for_valid_value(Duration::from_millis(100)));
//! assert_eq!(pv.get_value(), value);
//!
//! // The codecs are usable on their own.
//! let wire = structured::to_wire(&value)?;
//! assert_eq!(structured::parse(Some(&wire))?, value);
//! # Ok::<(), pvbridge::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                      Application threads                            |
//! |   ProcessVariable: get_value | wait_for_* | set_value | callbacks    |
//! +---------------------------------------------------------------------+
//! |                        VariableCache                                |
//! |   Mutex + Condvar snapshot | partial merges | callback fan-out       |
//! +---------------------------------------------------------------------+
//! |                           Codecs                                    |
//! |   structured: TypeBuilder | ValueBuilder | ValueParser             |
//! |   legacy:     ByteBufferCodec                                       |
//! |   shared:     TypeCodeTables | ValueStateMachine                    |
//! +---------------------------------------------------------------------+
//! |                      ChannelProvider (trait)                        |
//! |   network I/O on provider threads | LoopbackProvider in-process     |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`generic`] - Generic Type and Generic Value model (start here)
//! - [`structured`] - Structured wire model and codec
//! - [`legacy`] - Legacy byte buffer codec
//! - [`cache`] - Thread-safe latest-value cache
//! - [`provider`] - Provider traits and the loopback provider
//! - [`config`] - TOML configuration

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

/// Latest-value cache shared between provider and application threads.
pub mod cache;

/// Bridge configuration (TOML).
pub mod config;

mod error;

/// Generic Type / Generic Value model.
pub mod generic;

/// Legacy fixed-width byte buffer codec.
pub mod legacy;

mod process_variable;

/// Channel provider traits.
pub mod provider;

/// Incremental construction of Generic Values from traversal events.
pub mod state_machine;

/// Structured wire model and codec.
pub mod structured;

/// Mappings between scalar codes and protocol tags.
pub mod tables;

pub use cache::{AlarmSeverity, CallbackId, ExtendedValue, UpdateMetadata, VariableCache};
pub use config::{BridgeConfig, LegacyConfig};
pub use error::{Error, Result};
pub use generic::{
    ArrayType, ArrayValue, FieldType, GenericType, GenericTypeBuilder, GenericValue, Scalar,
    ScalarKind, StructType, StructValue,
};
pub use legacy::{ByteBufferCodec, LegacyBuffer, LegacyTag};
pub use process_variable::ProcessVariable;
pub use provider::{
    ChannelEvent, ChannelListener, ChannelProvider, LoopbackProvider, MonitorUpdate, Payload,
    Protocol, WriteMode, WriteOutcome,
};
pub use state_machine::{NodeKind, ValueStateMachine};
pub use structured::{WireTag, WireValue};

/// pvbridge version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
