// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the codecs, the cache layer and configuration.
//!
//! Only conversion and programming errors are represented here. Transient
//! network conditions (disconnected channel, write timeout, null buffer) are
//! reported as values by the operations that encounter them.

use thiserror::Error;

/// Errors returned by pvbridge operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No wire tag exists for the given Generic Type.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A scalar or container does not match the slot it is assigned to.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A value tree builder received an operation its grammar forbids.
    #[error("Invalid builder sequence: {0}")]
    InvalidSequence(String),

    /// The wire tree contains a shape the parser does not translate (unions).
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    /// The channel provider refused a subscription or write.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Convenient alias for results using the crate [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
