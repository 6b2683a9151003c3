// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Cluster backend plugin contract.
//!
//! A plugin owns the backend protocol (list-then-watch, offer stream) and
//! pushes `HostEvent`/`PodEvent` into the senders created at bootstrap; the
//! cache consumes the paired receivers. The cache makes no assumptions
//! about the backend beyond the event shapes.

use tokio::sync::mpsc;

use hostmgr_common::status::HostCacheResult;

use crate::events::{HostEvent, PodEvent};

pub type HostEventSender = mpsc::UnboundedSender<HostEvent>;
pub type HostEventReceiver = mpsc::UnboundedReceiver<HostEvent>;
pub type PodEventSender = mpsc::UnboundedSender<PodEvent>;
pub type PodEventReceiver = mpsc::UnboundedReceiver<PodEvent>;

/// Create the host and pod event channel pairs shared between a plugin and
/// the cache.
pub fn event_channels() -> (
    (HostEventSender, HostEventReceiver),
    (PodEventSender, PodEventReceiver),
) {
    (mpsc::unbounded_channel(), mpsc::unbounded_channel())
}

/// A cluster backend attached to the cache.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Backend-initiated list-and-resync; re-emits AddHost events which the
    /// cache merges by resource version.
    fn reconcile(&self) -> HostCacheResult<()> {
        Ok(())
    }
}

/// Plugin that never emits events. Used by the daemon when no backend is
/// configured, and by tests that drive the channels directly.
pub struct NoopPlugin;

impl Plugin for NoopPlugin {
    fn name(&self) -> &str {
        "noop"
    }
}
