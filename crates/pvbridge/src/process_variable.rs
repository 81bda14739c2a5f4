// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process variable: one remote variable bound to a channel provider.
//!
//! # Example
//!
//! ```rust
//! use pvbridge::{
//!     BridgeConfig, GenericType, GenericValue, LoopbackProvider, ProcessVariable, Protocol,
//!     ScalarKind,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let provider = Arc::new(LoopbackProvider::new(Protocol::Legacy));
//! let pv = ProcessVariable::new(
//!     "PUMP:SPEED",
//!     GenericType::Scalar(ScalarKind::Float64),
//!     provider.clone(),
//!     &BridgeConfig::default(),
//! )?;
//!
//! provider.connect("PUMP:SPEED");
//! assert!(pv.set_value(&GenericValue::from(12.5f64)));
//! assert!(pv.wait_for_valid_value(Duration::from_millis(100)));
//! assert_eq!(pv.get_value().as_f64(), Some(12.5));
//! # Ok::<(), pvbridge::Error>(())
//! ```

use crate::cache::{CallbackId, ExtendedValue, VariableCache};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::generic::{GenericType, GenericValue};
use crate::legacy::{legacy_tag, ByteBufferCodec};
use crate::provider::{
    ChannelEvent, ChannelListener, ChannelProvider, MonitorUpdate, Payload, Protocol,
    Subscription, WriteOutcome,
};
use crate::structured;
use std::sync::Arc;
use std::time::Duration;

/// Decodes provider events into the cache. Runs on the provider thread;
/// all codec work happens here, before the cache lock is taken.
struct CacheListener {
    name: String,
    ty: GenericType,
    codec: ByteBufferCodec,
    cache: Arc<VariableCache>,
}

impl CacheListener {
    fn decode(&self, update: &MonitorUpdate) -> Result<(GenericValue, Vec<String>)> {
        match &update.payload {
            Payload::Structured(wire) => {
                let value = structured::parse(Some(wire))?;
                Ok((value, wire.changed_paths()))
            }
            Payload::Legacy(raw) => {
                let value = self.codec.parse(raw.bytes.as_deref(), &self.ty, raw.count)?;
                Ok((value, Vec::new()))
            }
        }
    }
}

impl ChannelListener for CacheListener {
    fn on_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => self.cache.on_connected(),
            ChannelEvent::Disconnected => self.cache.on_disconnected(),
            ChannelEvent::Cleared => self.cache.on_clear(),
            ChannelEvent::Update(update) => match self.decode(&update) {
                Ok((value, changed)) => {
                    log::debug!(
                        "[pv] {} update ({} changed paths)",
                        self.name,
                        changed.len()
                    );
                    self.cache.on_update(value, &changed, update.metadata());
                }
                Err(e) => log::error!("[pv] {} dropped undecodable update: {}", self.name, e),
            },
        }
    }
}

/// Remote variable with a provider-fed cache.
///
/// The visible value only changes when the provider reports it; writes never
/// update the cache optimistically.
pub struct ProcessVariable {
    name: String,
    ty: GenericType,
    provider: Arc<dyn ChannelProvider>,
    cache: Arc<VariableCache>,
    codec: ByteBufferCodec,
    write_timeout: Duration,
    connect_timeout: Duration,
    _subscription: Box<dyn Subscription>,
}

impl std::fmt::Debug for ProcessVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessVariable")
            .field("name", &self.name)
            .field("type", &self.ty)
            .field("protocol", &self.provider.protocol())
            .field("cache", &self.cache)
            .finish()
    }
}

impl ProcessVariable {
    /// Create the variable and subscribe to `name` on `provider`.
    ///
    /// `ty` is the destination type of writes and, on the legacy protocol,
    /// the decoding type of updates. It may be `Empty` on the structured
    /// protocol, in which case writes keep the type of the written value.
    pub fn new(
        name: impl Into<String>,
        ty: GenericType,
        provider: Arc<dyn ChannelProvider>,
        config: &BridgeConfig,
    ) -> Result<Self> {
        let name = name.into();
        config.validate()?;
        if provider.protocol() == Protocol::Legacy {
            legacy_tag(&ty)?;
        }

        let cache = Arc::new(VariableCache::new());
        let codec = ByteBufferCodec::from_config(&config.legacy);
        let listener = Arc::new(CacheListener {
            name: name.clone(),
            ty: ty.clone(),
            codec: codec.clone(),
            cache: Arc::clone(&cache),
        });
        let subscription = provider.subscribe(&name, listener)?;
        log::debug!("[pv] {} subscribed as {}", name, ty);

        Ok(Self {
            name,
            ty,
            provider,
            cache,
            codec,
            write_timeout: config.write_timeout(),
            connect_timeout: config.connect_timeout(),
            _subscription: subscription,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generic_type(&self) -> &GenericType {
        &self.ty
    }

    pub fn protocol(&self) -> Protocol {
        self.provider.protocol()
    }

    pub fn is_connected(&self) -> bool {
        self.cache.is_connected()
    }

    /// Current value; `Empty` while disconnected.
    pub fn get_value(&self) -> GenericValue {
        self.cache.get_value()
    }

    pub fn get_extended_value(&self) -> ExtendedValue {
        self.cache.get_extended_value()
    }

    pub fn has_valid_value(&self) -> bool {
        self.cache.has_valid_value()
    }

    pub fn wait_for_connected(&self, timeout: Duration) -> bool {
        self.cache.wait_for_connected(timeout)
    }

    /// Wait for the connection with the configured connect timeout.
    pub fn wait_for_connection(&self) -> bool {
        self.wait_for_connected(self.connect_timeout)
    }

    pub fn wait_for_valid_value(&self, timeout: Duration) -> bool {
        self.cache.wait_for_valid_value(timeout)
    }

    /// Register a callback run (outside the cache lock) after every change.
    pub fn on_update(
        &self,
        callback: impl Fn(&ExtendedValue) + Send + Sync + 'static,
    ) -> CallbackId {
        self.cache.subscribe(callback)
    }

    pub fn remove_callback(&self, id: CallbackId) -> bool {
        self.cache.unsubscribe(id)
    }

    /// Write with the configured timeout. Any failure, including conversion
    /// errors, is reported as `false`.
    pub fn set_value(&self, value: &GenericValue) -> bool {
        self.set_value_timeout(value, self.write_timeout)
    }

    /// Write and wait up to `timeout` for the provider to confirm.
    pub fn set_value_timeout(&self, value: &GenericValue, timeout: Duration) -> bool {
        match self.write(value, timeout) {
            Ok(done) => done,
            Err(e) => {
                log::error!("[pv] {} write failed: {}", self.name, e);
                false
            }
        }
    }

    /// Like [`set_value`](Self::set_value) but conversion and schema errors
    /// are returned instead of folded into `false`.
    pub fn try_set_value(&self, value: &GenericValue) -> Result<bool> {
        self.write(value, self.write_timeout)
    }

    fn write(&self, value: &GenericValue, timeout: Duration) -> Result<bool> {
        if !self.cache.is_connected() {
            log::debug!("[pv] {} not connected, write skipped", self.name);
            return Ok(false);
        }
        let Some(payload) = self.encode(value)? else {
            return Ok(false);
        };

        let pending = match self.provider.write(&self.name, payload) {
            Ok(pending) => pending,
            Err(e) => {
                log::warn!("[pv] {} write refused: {}", self.name, e);
                return Ok(false);
            }
        };
        match pending.wait(timeout) {
            WriteOutcome::Success => Ok(true),
            outcome => {
                log::warn!("[pv] {} write ended with {:?}", self.name, outcome);
                Ok(false)
            }
        }
    }

    /// Encode for the provider's protocol. `None` means the value cannot be
    /// represented on the legacy wire.
    fn encode(&self, value: &GenericValue) -> Result<Option<Payload>> {
        match self.provider.protocol() {
            Protocol::Structured => {
                let value = if self.ty.is_empty() {
                    value.clone()
                } else {
                    value
                        .coerce_to(&self.ty)
                        .ok_or_else(|| Error::mismatch(&self.ty, value.type_of()))?
                };
                Ok(Some(Payload::Structured(structured::to_wire(&value)?)))
            }
            Protocol::Legacy => {
                let buffer = self.codec.build_update_buffer(value, &self.ty)?;
                if buffer.is_empty() {
                    return Ok(None);
                }
                Ok(Some(Payload::Legacy(buffer.into())))
            }
        }
    }
}
