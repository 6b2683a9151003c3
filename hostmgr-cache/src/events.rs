// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Host and pod lifecycle events pushed by cluster backend plugins.

use std::collections::HashMap;

use hostmgr_common::resources::Resources;

/// Type of host event sent by a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEventType {
    AddHost,
    UpdateHostSpec,
    DeleteHost,
    /// Mesos-style only: the backend reports free resources directly.
    UpdateHostAvailableRes,
}

/// Host-specific information carried by a host event.
#[derive(Debug, Clone, Default)]
pub struct HostInfo {
    pub hostname: String,
    /// Total advertised resources.
    pub capacity: Resources,
    /// Backend-supplied free resources (UpdateHostAvailableRes only).
    pub available: Resources,
    /// Opaque monotonic token used to reject stale events.
    pub resource_version: String,
    pub labels: HashMap<String, String>,
}

/// A host lifecycle event.
#[derive(Debug, Clone)]
pub struct HostEvent {
    pub event_type: HostEventType,
    pub host_info: HostInfo,
}

impl HostEvent {
    pub fn new(event_type: HostEventType, host_info: HostInfo) -> Self {
        Self {
            event_type,
            host_info,
        }
    }

    /// Build an add/update event from a node's advertised capacity.
    ///
    /// Backends without a disk resource advertise zero disk; those hosts get
    /// the configured per-host default so disk constraints stay satisfiable.
    pub fn from_node_capacity(
        hostname: impl Into<String>,
        mut capacity: Resources,
        resource_version: impl Into<String>,
        labels: HashMap<String, String>,
        default_disk_mb: u64,
        event_type: HostEventType,
    ) -> Self {
        if capacity.disk_mb == 0 {
            capacity.disk_mb = default_disk_mb;
        }
        Self {
            event_type,
            host_info: HostInfo {
                hostname: hostname.into(),
                capacity,
                available: Resources::default(),
                resource_version: resource_version.into(),
                labels,
            },
        }
    }

    /// Build an UpdateHostAvailableRes event from an offer-style stream.
    pub fn from_available(
        hostname: impl Into<String>,
        available: Resources,
        resource_version: impl Into<String>,
    ) -> Self {
        Self {
            event_type: HostEventType::UpdateHostAvailableRes,
            host_info: HostInfo {
                hostname: hostname.into(),
                capacity: Resources::default(),
                available,
                resource_version: resource_version.into(),
                labels: HashMap::new(),
            },
        }
    }
}

/// Type of pod event sent by a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodEventType {
    Launch,
    Update,
    Kill,
    Evict,
}

/// A pod lifecycle event on a specific host.
#[derive(Debug, Clone)]
pub struct PodEvent {
    pub hostname: String,
    pub pod_id: String,
    pub event_type: PodEventType,
    pub resources: Resources,
}

impl PodEvent {
    pub fn new(
        hostname: impl Into<String>,
        pod_id: impl Into<String>,
        event_type: PodEventType,
        resources: Resources,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            pod_id: pod_id.into(),
            event_type,
            resources,
        }
    }
}

/// Check whether `new` is an older resource version than `old`.
///
/// Versions that parse as unsigned integers compare numerically; anything
/// else compares as strings. Equal versions are not old, so re-delivered
/// events apply idempotently.
pub fn is_old_version(old: &str, new: &str) -> bool {
    match (old.parse::<u64>(), new.parse::<u64>()) {
        (Ok(old_v), Ok(new_v)) => new_v < old_v,
        _ => new < old,
    }
}
