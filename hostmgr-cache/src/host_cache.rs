// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! The host cache façade: process-wide index of host summaries plus the
//! pod-held lookup index, fed by two background event loops.
//!
//! Lock discipline: the cache lock guards the index structure only; each
//! summary guards its own fields. Lock order is cache then summary, never
//! the reverse. Placement queries iterate under the cache read lock and
//! take per-summary locks briefly for the acquire step; the per-summary
//! lock is what makes a lease acquisition atomic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use hostmgr_common::config::{HostCacheConfig, Ranker};
use hostmgr_common::id::LeaseID;
use hostmgr_common::resources::Resources;
use hostmgr_common::status::{HostCacheError, HostCacheResult};
use hostmgr_util::time::Clock;

use crate::events::{is_old_version, HostEvent, HostEventType, PodEvent};
use crate::host_summary::{HostLease, HostSummary};
use crate::lifecycle::LifeCycle;
use crate::matcher::{HostFilter, Matcher};
use crate::plugin::{HostEventReceiver, Plugin, PodEventReceiver};

#[derive(Default)]
struct CacheIndex {
    /// hostname -> summary.
    hosts: HashMap<String, Arc<HostSummary>>,
    /// podID -> hostname holding it. Derived accelerator; the per-summary
    /// hold maps are authoritative.
    pod_held: HashMap<String, String>,
}

pub struct HostCache {
    config: HostCacheConfig,
    clock: Arc<dyn Clock>,
    index: RwLock<CacheIndex>,
    host_event_rx: Mutex<Option<HostEventReceiver>>,
    pod_event_rx: Mutex<Option<PodEventReceiver>>,
    plugin: Arc<dyn Plugin>,
    lifecycle: LifeCycle,
    /// Events dropped for carrying an old resource version.
    stale_host_events: AtomicU64,
}

impl HostCache {
    pub fn new(
        config: HostCacheConfig,
        clock: Arc<dyn Clock>,
        host_event_rx: HostEventReceiver,
        pod_event_rx: PodEventReceiver,
        plugin: Arc<dyn Plugin>,
    ) -> Self {
        Self {
            config,
            clock,
            index: RwLock::new(CacheIndex::default()),
            host_event_rx: Mutex::new(Some(host_event_rx)),
            pod_event_rx: Mutex::new(Some(pod_event_rx)),
            plugin,
            lifecycle: LifeCycle::new(),
            stale_host_events: AtomicU64::new(0),
        }
    }

    /// Acquire leases on hosts matching the filter.
    ///
    /// Hint hosts are tried first in order, then the rest of the index in
    /// lexicographic hostname order. Returns the leases plus per-reason
    /// match counts for the placement engine's debugging. Returning fewer
    /// than the requested number of hosts is not an error.
    pub fn acquire_leases(&self, filter: &HostFilter) -> (Vec<HostLease>, HashMap<String, u32>) {
        let now_ms = self.clock.now_ms();
        let index = self.index.read();
        let mut matcher = Matcher::new(filter, self.config.max_match_hosts, now_ms);

        for hostname in &filter.hint_hosts {
            if let Some(summary) = index.hosts.get(hostname) {
                if !matcher.try_match_host(summary) {
                    break;
                }
            }
        }

        if !matcher.host_limit_reached() {
            // First-fit is the only ranker; the match is the plug point for
            // defrag/best-fit orderings.
            let hostnames = match self.config.ranker {
                Ranker::FirstFit => {
                    let mut hostnames: Vec<&String> = index.hosts.keys().collect();
                    hostnames.sort();
                    hostnames
                }
            };
            for hostname in hostnames {
                if !matcher.try_match_host(&index.hosts[hostname]) {
                    break;
                }
            }
        }

        let matched = matcher.host_names().to_vec();
        let mut leases = Vec::with_capacity(matched.len());
        for hostname in matched {
            let Some(summary) = index.hosts.get(&hostname) else {
                matcher.record_acquire_failed();
                continue;
            };
            match summary.acquire_lease(filter, now_ms) {
                Ok(lease) => {
                    matcher.record_acquired();
                    leases.push(lease);
                }
                Err(err) => {
                    // Status changed between match and acquire.
                    tracing::debug!(hostname = %hostname, error = %err, "acquire after match failed");
                    matcher.record_acquire_failed();
                }
            }
        }

        let filter_counts = matcher.into_filter_counts();
        if leases.is_empty() {
            tracing::debug!(?filter_counts, "no hosts matched filter");
        }
        (leases, filter_counts)
    }

    /// Release a previously acquired lease without launching anything.
    pub fn terminate_lease(&self, hostname: &str, lease_id: &LeaseID) -> HostCacheResult<()> {
        let index = self.index.read();
        let summary = Self::get_summary_in(&index, hostname)?;
        summary.terminate_lease(lease_id, self.clock.now_ms())
    }

    /// Launch pods against a previously acquired lease.
    ///
    /// Takes the write lock: consuming a hold as part of the launch prunes
    /// the derived pod-held index.
    pub fn complete_lease(
        &self,
        hostname: &str,
        lease_id: &LeaseID,
        pod_to_resources: &HashMap<String, Resources>,
    ) -> HostCacheResult<()> {
        let mut index = self.index.write();
        let summary = Self::get_summary_in(&index, hostname)?;
        let released = summary.complete_lease(lease_id, pod_to_resources, self.clock.now_ms())?;
        for pod_id in released {
            index.pod_held.remove(&pod_id);
        }
        Ok(())
    }

    /// Pin a host for the given pods.
    ///
    /// Holds are applied per pod; failures are collected and reported in a
    /// single error while successful holds stay in place.
    pub fn hold_for_pods(&self, hostname: &str, pod_ids: &[String]) -> HostCacheResult<()> {
        let now_ms = self.clock.now_ms();
        let mut index = self.index.write();
        let summary = Self::get_summary_in(&index, hostname)?;

        let mut failures = Vec::new();
        for pod_id in pod_ids {
            if let Err(err) = summary.hold_for_pod(pod_id, now_ms) {
                failures.push(format!("{pod_id}: {err}"));
                continue;
            }
            if let Some(previous) = index
                .pod_held
                .insert(pod_id.clone(), hostname.to_string())
            {
                if previous != hostname {
                    tracing::warn!(
                        pod_id = %pod_id,
                        old_host = %previous,
                        new_host = %hostname,
                        "pod hold moved to a different host"
                    );
                }
            }
        }

        if !failures.is_empty() {
            return Err(HostCacheError::internal(format!(
                "failed to hold pods: {}",
                failures.join("; ")
            )));
        }
        Ok(())
    }

    /// Drop holds for the given pods.
    pub fn release_hold_for_pods(&self, hostname: &str, pod_ids: &[String]) -> HostCacheResult<()> {
        let mut index = self.index.write();
        let summary = Self::get_summary_in(&index, hostname)?;
        for pod_id in pod_ids {
            summary.release_hold_for_pod(pod_id);
            index.pod_held.remove(pod_id);
        }
        Ok(())
    }

    /// Host currently held for the pod, if any.
    pub fn get_host_held_for_pod(&self, pod_id: &str) -> Option<String> {
        self.index.read().pod_held.get(pod_id).cloned()
    }

    /// Total capacity and allocation across the cluster, as one consistent
    /// snapshot pair.
    pub fn get_cluster_capacity(&self) -> (Resources, Resources) {
        let index = self.index.read();
        let mut capacity = Resources::default();
        let mut allocation = Resources::default();
        for summary in index.hosts.values() {
            capacity = capacity.add(&summary.capacity());
            allocation = allocation.add(&summary.allocated());
        }
        (capacity, allocation)
    }

    /// All summaries. Callers must treat them as read-only.
    pub fn get_summaries(&self) -> Vec<Arc<HostSummary>> {
        self.index.read().hosts.values().cloned().collect()
    }

    pub fn get_summary(&self, hostname: &str) -> HostCacheResult<Arc<HostSummary>> {
        Self::get_summary_in(&self.index.read(), hostname)
    }

    pub fn num_hosts(&self) -> usize {
        self.index.read().hosts.len()
    }

    /// Expire overdue holds across every summary. Returns the hostnames
    /// that left Held, in lexicographic order. Invoked by the periodic
    /// sweeper; calling it twice with the same deadline is a no-op the
    /// second time.
    pub fn reset_expired_held_host_summaries(&self, now_ms: u64) -> Vec<String> {
        let mut index = self.index.write();
        let mut freed_hosts = Vec::new();

        let mut hostnames: Vec<String> = index.hosts.keys().cloned().collect();
        hostnames.sort();
        for hostname in hostnames {
            let summary = index.hosts[&hostname].clone();
            let (freed, expired) = summary.delete_expired_holds(now_ms);
            if freed {
                freed_hosts.push(hostname);
            }
            for pod_id in expired {
                index.pod_held.remove(&pod_id);
            }
        }
        freed_hosts
    }

    /// Ask the backend plugin to re-list and resync.
    pub fn reconcile(&self) -> HostCacheResult<()> {
        tracing::info!(plugin = self.plugin.name(), "reconcile requested");
        self.plugin.reconcile()
    }

    /// Events dropped for stale resource versions (observability hook).
    pub fn num_stale_host_events(&self) -> u64 {
        self.stale_host_events.load(Ordering::Relaxed)
    }

    // ── event ingest ────────────────────────────────────────────────

    fn apply_host_event(&self, event: HostEvent) {
        match event.event_type {
            HostEventType::AddHost => self.add_host(event),
            HostEventType::UpdateHostSpec => self.update_host_spec(event),
            HostEventType::DeleteHost => self.delete_host(event),
            HostEventType::UpdateHostAvailableRes => self.update_host_available(event),
        }
    }

    fn add_host(&self, event: HostEvent) {
        let info = event.host_info;
        let mut index = self.index.write();

        if let Some(existing) = index.hosts.get(&info.hostname).cloned() {
            if is_old_version(&existing.version(), &info.resource_version) {
                self.count_stale_event(&info.hostname, &info.resource_version);
                return;
            }
            // Replacing a summary abandons its holds; drop their index
            // entries so the two stay in agreement.
            for pod_id in existing.held_pods() {
                index.pod_held.remove(&pod_id);
            }
        }

        tracing::debug!(
            hostname = %info.hostname,
            capacity = %info.capacity,
            version = %info.resource_version,
            "add host to cache"
        );
        let summary = Arc::new(HostSummary::new_kubelet(
            info.hostname.clone(),
            info.capacity,
            info.resource_version,
            info.labels,
            self.config.lease_ttl_ms,
            self.config.hold_ttl_ms,
        ));
        index.hosts.insert(info.hostname, summary);
    }

    fn update_host_spec(&self, event: HostEvent) {
        let info = event.host_info;
        let index = self.index.read();

        let Some(summary) = index.hosts.get(&info.hostname) else {
            // Possibly an out-of-order event during host maintenance; a
            // missing host comes back via reconciliation.
            tracing::debug!(
                hostname = %info.hostname,
                version = %info.resource_version,
                "ignore update event, host not found in cache"
            );
            return;
        };
        if is_old_version(&summary.version(), &info.resource_version) {
            self.count_stale_event(&info.hostname, &info.resource_version);
            return;
        }

        tracing::debug!(
            hostname = %info.hostname,
            capacity = %info.capacity,
            version = %info.resource_version,
            "update host in cache"
        );
        summary.set_capacity(info.capacity);
        if !info.labels.is_empty() {
            summary.set_labels(info.labels);
        }
        summary.set_version(info.resource_version);
    }

    fn delete_host(&self, event: HostEvent) {
        let info = event.host_info;
        let mut index = self.index.write();

        let Some(existing) = index.hosts.get(&info.hostname).cloned() else {
            return;
        };
        if is_old_version(&existing.version(), &info.resource_version) {
            self.count_stale_event(&info.hostname, &info.resource_version);
            return;
        }

        // Any lease or hold on the host is abandoned with it.
        for pod_id in existing.held_pods() {
            index.pod_held.remove(&pod_id);
        }
        index.hosts.remove(&info.hostname);
        tracing::debug!(
            hostname = %info.hostname,
            version = %info.resource_version,
            "delete host from cache"
        );
    }

    fn update_host_available(&self, event: HostEvent) {
        let info = event.host_info;
        let mut index = self.index.write();

        let summary = match index.hosts.get(&info.hostname) {
            Some(summary) => {
                if is_old_version(&summary.version(), &info.resource_version) {
                    self.count_stale_event(&info.hostname, &info.resource_version);
                    return;
                }
                summary.clone()
            }
            None => {
                let summary = Arc::new(HostSummary::new_mesos(
                    info.hostname.clone(),
                    "",
                    self.config.lease_ttl_ms,
                    self.config.hold_ttl_ms,
                ));
                index.hosts.insert(info.hostname.clone(), summary.clone());
                summary
            }
        };

        tracing::debug!(
            hostname = %info.hostname,
            available = %info.available,
            version = %info.resource_version,
            "update host available in cache"
        );
        summary.set_available(info.available);
        summary.set_version(info.resource_version);
    }

    fn apply_pod_event(&self, event: PodEvent) {
        let mut index = self.index.write();

        let Some(summary) = index.hosts.get(&event.hostname).cloned() else {
            // Event ordering across host/pod streams is not guaranteed;
            // reconciliation reconstructs anything dropped here.
            tracing::error!(
                hostname = %event.hostname,
                pod_id = %event.pod_id,
                "pod event ignored: host summary not found"
            );
            return;
        };

        match summary.handle_pod_event(&event) {
            Ok(released) => {
                for pod_id in released {
                    index.pod_held.remove(&pod_id);
                }
            }
            Err(err) => {
                tracing::error!(
                    hostname = %event.hostname,
                    pod_id = %event.pod_id,
                    error = %err,
                    "handle pod event"
                );
            }
        }
    }

    fn count_stale_event(&self, hostname: &str, version: &str) {
        self.stale_host_events.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(hostname, version, "ignore stale host event");
    }

    fn get_summary_in(index: &CacheIndex, hostname: &str) -> HostCacheResult<Arc<HostSummary>> {
        index
            .hosts
            .get(hostname)
            .cloned()
            .ok_or_else(|| HostCacheError::not_found(format!("cannot find host {hostname} in cache")))
    }

    // ── lifecycle ───────────────────────────────────────────────────

    /// Spawn the host and pod event loops. Idempotent; returns false when
    /// already started or stopped.
    pub fn start(self: &Arc<Self>) -> bool {
        if !self.lifecycle.start() {
            return false;
        }

        let mut host_rx = match self.host_event_rx.lock().take() {
            Some(rx) => rx,
            None => {
                tracing::error!("host event channel already consumed");
                return false;
            }
        };
        let mut pod_rx = match self.pod_event_rx.lock().take() {
            Some(rx) => rx,
            None => {
                tracing::error!("pod event channel already consumed");
                return false;
            }
        };

        let cache = Arc::clone(self);
        let mut stop_rx = self.lifecycle.subscribe_stop();
        self.lifecycle.register(tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = host_rx.recv() => match event {
                        Some(event) => cache.apply_host_event(event),
                        None => break,
                    },
                    _ = stop_rx.changed() => break,
                }
            }
            tracing::debug!("host event loop drained");
        }));

        let cache = Arc::clone(self);
        let mut stop_rx = self.lifecycle.subscribe_stop();
        self.lifecycle.register(tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = pod_rx.recv() => match event {
                        Some(event) => cache.apply_pod_event(event),
                        None => break,
                    },
                    _ = stop_rx.changed() => break,
                }
            }
            tracing::debug!("pod event loop drained");
        }));

        tracing::info!(plugin = self.plugin.name(), "host cache started");
        true
    }

    /// Signal the event loops and wait for both to acknowledge.
    pub async fn stop(&self) {
        if !self.lifecycle.stop() {
            return;
        }
        self.lifecycle.wait().await;
        tracing::info!("host cache stopped");
    }
}
