// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process channel provider.
//!
//! Channels exist on first use. The owner drives them with [`connect`],
//! [`disconnect`], [`post`] and [`clear`]; events are delivered synchronously
//! on the calling thread, which plays the role of the provider thread.
//!
//! Writes follow the provider's [`WriteMode`]:
//!
//! - `Echo`: complete immediately and post the written payload back as a
//!   monitor update (a server that accepts every put)
//! - `Hold`: never complete until [`release_held`] is called
//! - `Reject`: complete as interrupted
//!
//! [`connect`]: LoopbackProvider::connect
//! [`disconnect`]: LoopbackProvider::disconnect
//! [`post`]: LoopbackProvider::post
//! [`clear`]: LoopbackProvider::clear
//! [`release_held`]: LoopbackProvider::release_held

use crate::error::{Error, Result};
use crate::provider::{
    ChannelEvent, ChannelListener, ChannelProvider, MonitorUpdate, Payload, PendingWrite,
    Protocol, Subscription, WriteOutcome,
};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// How the loopback provider answers writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Echo,
    Hold,
    Reject,
}

#[derive(Default)]
struct Channel {
    listeners: Vec<(u64, Arc<dyn ChannelListener>)>,
    connected: bool,
    /// Last posted update, replayed to late subscribers.
    last: Option<MonitorUpdate>,
}

#[derive(Default)]
struct Inner {
    channels: Mutex<HashMap<String, Channel>>,
    mode: Mutex<WriteMode>,
    held: Mutex<Vec<Sender<WriteOutcome>>>,
    writes: Mutex<Vec<(String, Payload)>>,
    next_id: AtomicU64,
}

impl Inner {
    fn listeners(&self, channel: &str) -> Vec<Arc<dyn ChannelListener>> {
        self.channels
            .lock()
            .get(channel)
            .map(|c| c.listeners.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Update channel state under the lock, then deliver outside it.
    fn dispatch(&self, channel: &str, event: ChannelEvent, update: impl FnOnce(&mut Channel)) {
        update(self.channels.lock().entry(channel.to_string()).or_default());
        for listener in self.listeners(channel) {
            listener.on_event(event.clone());
        }
    }
}

/// In-process [`ChannelProvider`].
#[derive(Clone)]
pub struct LoopbackProvider {
    protocol: Protocol,
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LoopbackProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackProvider")
            .field("protocol", &self.protocol)
            .field("channels", &self.inner.channels.lock().len())
            .field("mode", &*self.inner.mode.lock())
            .finish()
    }
}

impl LoopbackProvider {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            inner: Arc::new(Inner::default()),
        }
    }

    pub fn set_write_mode(&self, mode: WriteMode) {
        *self.inner.mode.lock() = mode;
    }

    pub fn connect(&self, channel: &str) {
        log::debug!("[loopback] {} connected", channel);
        self.inner
            .dispatch(channel, ChannelEvent::Connected, |c| c.connected = true);
    }

    pub fn disconnect(&self, channel: &str) {
        log::debug!("[loopback] {} disconnected", channel);
        self.inner
            .dispatch(channel, ChannelEvent::Disconnected, |c| c.connected = false);
    }

    /// Deliver a monitor update to every subscriber of `channel`.
    pub fn post(&self, channel: &str, update: MonitorUpdate) {
        let last = update.clone();
        self.inner
            .dispatch(channel, ChannelEvent::Update(update), |c| c.last = Some(last));
    }

    pub fn clear(&self, channel: &str) {
        self.inner
            .dispatch(channel, ChannelEvent::Cleared, |c| c.last = None);
    }

    pub fn is_connected(&self, channel: &str) -> bool {
        self.inner
            .channels
            .lock()
            .get(channel)
            .is_some_and(|c| c.connected)
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .lock()
            .get(channel)
            .map_or(0, |c| c.listeners.len())
    }

    /// Writes received so far, oldest first.
    pub fn writes(&self) -> Vec<(String, Payload)> {
        self.inner.writes.lock().clone()
    }

    /// Complete every held write with `outcome`. Returns how many were held.
    pub fn release_held(&self, outcome: WriteOutcome) -> usize {
        let held: Vec<_> = self.inner.held.lock().drain(..).collect();
        for tx in &held {
            let _ = tx.send(outcome);
        }
        held.len()
    }
}

impl ChannelProvider for LoopbackProvider {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn subscribe(
        &self,
        channel: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Result<Box<dyn Subscription>> {
        if channel.is_empty() {
            return Err(Error::Provider("empty channel name".into()));
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (connected, last) = {
            let mut channels = self.inner.channels.lock();
            let entry = channels.entry(channel.to_string()).or_default();
            entry.listeners.push((id, Arc::clone(&listener)));
            (entry.connected, entry.last.clone())
        };

        if connected {
            listener.on_event(ChannelEvent::Connected);
            if let Some(update) = last {
                listener.on_event(ChannelEvent::Update(update));
            }
        }

        Ok(Box::new(LoopbackSubscription {
            inner: Arc::downgrade(&self.inner),
            channel: channel.to_string(),
            id,
        }))
    }

    fn write(&self, channel: &str, payload: Payload) -> Result<Box<dyn PendingWrite>> {
        if !self.is_connected(channel) {
            return Err(Error::Provider(format!("{} is not connected", channel)));
        }
        self.inner
            .writes
            .lock()
            .push((channel.to_string(), payload.clone()));

        let (tx, rx) = bounded(1);
        let mode = *self.inner.mode.lock();
        match mode {
            WriteMode::Echo => {
                let _ = tx.send(WriteOutcome::Success);
                self.post(channel, MonitorUpdate::new(payload));
            }
            WriteMode::Hold => self.inner.held.lock().push(tx),
            WriteMode::Reject => {
                log::warn!("[loopback] write to {} rejected", channel);
                let _ = tx.send(WriteOutcome::Interrupted);
            }
        }
        Ok(Box::new(LoopbackWrite { rx }))
    }
}

struct LoopbackSubscription {
    inner: Weak<Inner>,
    channel: String,
    id: u64,
}

impl Subscription for LoopbackSubscription {
    fn channel(&self) -> &str {
        &self.channel
    }
}

impl Drop for LoopbackSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Some(channel) = inner.channels.lock().get_mut(&self.channel) {
                channel.listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

struct LoopbackWrite {
    rx: Receiver<WriteOutcome>,
}

impl PendingWrite for LoopbackWrite {
    fn wait(&self, timeout: Duration) -> WriteOutcome {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => WriteOutcome::Timeout,
            Err(RecvTimeoutError::Disconnected) => WriteOutcome::Interrupted,
        }
    }
}
