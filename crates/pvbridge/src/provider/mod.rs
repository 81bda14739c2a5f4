// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Channel provider interface.
//!
//! A provider owns the network side: it performs wire I/O and delivers
//! channel events on its own thread(s). This crate only consumes the traits
//! below; [`LoopbackProvider`] is an in-process implementation for embedding
//! and tests.
//!
//! # Thread Safety
//!
//! Listeners are called from provider threads concurrently with application
//! threads. They must be `Send + Sync` and should not block.

mod loopback;

pub use loopback::{LoopbackProvider, WriteMode};

use crate::cache::{AlarmSeverity, UpdateMetadata};
use crate::error::Result;
use crate::legacy::{LegacyBuffer, LegacyTag};
use crate::structured::WireValue;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Network protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Structured,
    Legacy,
}

/// Raw legacy record as carried by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPayload {
    pub tag: LegacyTag,
    pub count: usize,
    /// `None` is a null buffer ("not yet valid").
    pub bytes: Option<Vec<u8>>,
}

impl From<LegacyBuffer> for LegacyPayload {
    fn from(buffer: LegacyBuffer) -> Self {
        Self {
            tag: buffer.tag,
            count: buffer.count,
            bytes: Some(buffer.bytes),
        }
    }
}

/// Data travelling to or from a provider.
#[derive(Debug, Clone)]
pub enum Payload {
    Structured(WireValue),
    Legacy(LegacyPayload),
}

/// Value notification for a subscribed channel.
#[derive(Debug, Clone)]
pub struct MonitorUpdate {
    pub payload: Payload,
    pub timestamp: Option<SystemTime>,
    pub status: Option<u16>,
    pub severity: Option<AlarmSeverity>,
}

impl MonitorUpdate {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            timestamp: None,
            status: None,
            severity: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_alarm(mut self, status: u16, severity: AlarmSeverity) -> Self {
        self.status = Some(status);
        self.severity = Some(severity);
        self
    }

    pub(crate) fn metadata(&self) -> UpdateMetadata {
        UpdateMetadata {
            timestamp: self.timestamp,
            status: self.status,
            severity: self.severity,
        }
    }
}

/// Event delivered to a channel listener.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    /// Full or partial value update.
    Update(MonitorUpdate),
    /// The provider dropped the channel's value.
    Cleared,
}

/// Receives channel events on a provider thread.
pub trait ChannelListener: Send + Sync {
    fn on_event(&self, event: ChannelEvent);
}

/// Closure-based listener.
pub struct ClosureListener<F: Fn(ChannelEvent) + Send + Sync> {
    callback: F,
}

impl<F: Fn(ChannelEvent) + Send + Sync> ClosureListener<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: Fn(ChannelEvent) + Send + Sync> ChannelListener for ClosureListener<F> {
    fn on_event(&self, event: ChannelEvent) {
        (self.callback)(event);
    }
}

/// Live subscription handle. Dropping it stops event delivery.
pub trait Subscription: Send + Sync {
    fn channel(&self) -> &str;
}

/// Result of waiting on a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    Timeout,
    Interrupted,
}

/// In-flight write issued through a provider.
pub trait PendingWrite: Send {
    /// Block up to `timeout` for completion. A timed-out write may still
    /// complete at the provider later.
    fn wait(&self, timeout: Duration) -> WriteOutcome;
}

/// Network client context for one protocol.
pub trait ChannelProvider: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Start delivering events for `channel` to `listener`.
    fn subscribe(
        &self,
        channel: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Result<Box<dyn Subscription>>;

    /// Issue an asynchronous write.
    fn write(&self, channel: &str, payload: Payload) -> Result<Box<dyn PendingWrite>>;
}
