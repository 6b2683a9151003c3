// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Per-host summary: state machine, resource accounting, lease lifecycle,
//! and pod holds.
//!
//! A summary owns its own lock; the cache index lock is always taken before
//! a summary lock, never after.

use std::collections::HashMap;

use parking_lot::Mutex;

use hostmgr_common::id::LeaseID;
use hostmgr_common::resources::Resources;
use hostmgr_common::status::{HostCacheError, HostCacheResult};

use crate::events::{PodEvent, PodEventType};
use crate::matcher::{FilterReason, HostFilter};

/// Which backend flavor feeds this host.
///
/// Kubelet hosts derive free resources as `capacity - allocated`; Mesos
/// hosts take `available` verbatim from the offer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Kubelet,
    Mesos,
}

/// Operational status of a host with respect to placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// Open for placement.
    Ready,
    /// Exclusively leased to a placement engine.
    Placing,
    /// Pinned for one or more specific pods.
    Held,
}

/// Snapshot of an acquired lease, returned to callers. Opaque beyond the
/// lease ID, which must be presented verbatim to complete or terminate.
#[derive(Debug, Clone)]
pub struct HostLease {
    pub hostname: String,
    pub lease_id: LeaseID,
    pub offered: Resources,
    pub expires_at_ms: u64,
}

#[derive(Debug)]
struct State {
    capacity: Resources,
    allocated: Resources,
    available: Resources,
    version: String,
    status: HostStatus,
    lease_id: Option<LeaseID>,
    lease_expiry_ms: u64,
    /// podID -> resources reserved by that running pod.
    pods: HashMap<String, Resources>,
    /// podID -> hold expiry (ms). Authoritative; the cache-level held index
    /// is derived from these maps.
    holds: HashMap<String, u64>,
    labels: HashMap<String, String>,
}

/// One per known hostname.
#[derive(Debug)]
pub struct HostSummary {
    hostname: String,
    kind: HostKind,
    lease_ttl_ms: u64,
    hold_ttl_ms: u64,
    state: Mutex<State>,
}

impl HostSummary {
    /// Create a summary for a Kubernetes-style host with known capacity.
    pub fn new_kubelet(
        hostname: impl Into<String>,
        capacity: Resources,
        version: impl Into<String>,
        labels: HashMap<String, String>,
        lease_ttl_ms: u64,
        hold_ttl_ms: u64,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            kind: HostKind::Kubelet,
            lease_ttl_ms,
            hold_ttl_ms,
            state: Mutex::new(State {
                available: capacity.clone(),
                capacity,
                allocated: Resources::default(),
                version: version.into(),
                status: HostStatus::Ready,
                lease_id: None,
                lease_expiry_ms: 0,
                pods: HashMap::new(),
                holds: HashMap::new(),
                labels,
            }),
        }
    }

    /// Create a summary for a Mesos-style host. Capacity is derived once
    /// the offer stream reports available resources.
    pub fn new_mesos(
        hostname: impl Into<String>,
        version: impl Into<String>,
        lease_ttl_ms: u64,
        hold_ttl_ms: u64,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            kind: HostKind::Mesos,
            lease_ttl_ms,
            hold_ttl_ms,
            state: Mutex::new(State {
                capacity: Resources::default(),
                allocated: Resources::default(),
                available: Resources::default(),
                version: version.into(),
                status: HostStatus::Ready,
                lease_id: None,
                lease_expiry_ms: 0,
                pods: HashMap::new(),
                holds: HashMap::new(),
                labels: HashMap::new(),
            }),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn kind(&self) -> HostKind {
        self.kind
    }

    pub fn status(&self) -> HostStatus {
        self.state.lock().status
    }

    pub fn version(&self) -> String {
        self.state.lock().version.clone()
    }

    pub fn capacity(&self) -> Resources {
        self.state.lock().capacity.clone()
    }

    pub fn allocated(&self) -> Resources {
        self.state.lock().allocated.clone()
    }

    pub fn available(&self) -> Resources {
        self.state.lock().available.clone()
    }

    pub fn labels(&self) -> HashMap<String, String> {
        self.state.lock().labels.clone()
    }

    /// Running pods and their reserved resources.
    pub fn pods(&self) -> HashMap<String, Resources> {
        self.state.lock().pods.clone()
    }

    /// Pod IDs currently holding this host.
    pub fn held_pods(&self) -> Vec<String> {
        self.state.lock().holds.keys().cloned().collect()
    }

    /// Read-only feasibility test of a filter against this host.
    ///
    /// A Placing host whose lease has already expired counts as matchable:
    /// the acquire step reclaims the stale lease before re-leasing.
    pub fn try_match(&self, filter: &HostFilter, now_ms: u64) -> Result<(), FilterReason> {
        let state = self.state.lock();
        Self::filter_check(&state, filter, now_ms)
    }

    /// Acquire an exclusive lease on this host.
    ///
    /// Only valid from Ready or Held with the filter satisfied. Transitions
    /// to Placing and mints a fresh lease ID.
    pub fn acquire_lease(&self, filter: &HostFilter, now_ms: u64) -> HostCacheResult<HostLease> {
        let mut state = self.state.lock();
        self.expire_stale_lease(&mut state, now_ms);

        if let Err(reason) = Self::filter_check(&state, filter, now_ms) {
            return Err(match reason {
                FilterReason::InsufficientResources => HostCacheError::insufficient_resources(
                    format!("host {} cannot fit {}", self.hostname, filter.min_resources),
                ),
                _ => HostCacheError::conflicting_status(format!(
                    "cannot acquire lease on host {}: {}",
                    self.hostname,
                    reason.as_str()
                )),
            });
        }

        let lease_id = LeaseID::from_random();
        state.status = HostStatus::Placing;
        state.lease_id = Some(lease_id);
        state.lease_expiry_ms = now_ms + self.lease_ttl_ms;

        let lease = HostLease {
            hostname: self.hostname.clone(),
            lease_id,
            offered: state.available.clone(),
            expires_at_ms: state.lease_expiry_ms,
        };
        self.assert_invariants(&state);
        Ok(lease)
    }

    /// Release an unused lease, returning the host to placement rotation.
    pub fn terminate_lease(&self, lease_id: &LeaseID, now_ms: u64) -> HostCacheResult<()> {
        let mut state = self.state.lock();
        self.expire_stale_lease(&mut state, now_ms);

        self.verify_lease(&state, lease_id)?;
        state.lease_id = None;
        state.status = if state.holds.is_empty() {
            HostStatus::Ready
        } else {
            HostStatus::Held
        };
        self.assert_invariants(&state);
        Ok(())
    }

    /// Consume a lease by launching pods on the host.
    ///
    /// Verifies the lease and that the pods fit in `capacity - allocated`;
    /// on success the pods are recorded, matching holds are consumed, and
    /// the host leaves Placing. Returns the pod IDs whose holds were
    /// consumed so the cache can prune its held index.
    pub fn complete_lease(
        &self,
        lease_id: &LeaseID,
        pod_to_resources: &HashMap<String, Resources>,
        now_ms: u64,
    ) -> HostCacheResult<Vec<String>> {
        let mut state = self.state.lock();
        self.expire_stale_lease(&mut state, now_ms);

        self.verify_lease(&state, lease_id)?;

        let needed = pod_to_resources
            .values()
            .fold(Resources::default(), |acc, r| acc.add(r));
        if !state.available.contains(&needed) {
            return Err(HostCacheError::insufficient_resources(format!(
                "host {} has {} free, pods need {}",
                self.hostname, state.available, needed
            )));
        }

        let mut released = Vec::new();
        for (pod_id, resources) in pod_to_resources {
            if state.holds.remove(pod_id).is_some() {
                released.push(pod_id.clone());
            }
            if let Some(previous) = state.pods.insert(pod_id.clone(), resources.clone()) {
                // Re-delivered launch: back out the stale reservation first.
                let (allocated, underflow) = state.allocated.subtract(&previous);
                if underflow {
                    tracing::error!(
                        hostname = %self.hostname,
                        pod_id = %pod_id,
                        "allocation underflow while replacing pod reservation"
                    );
                }
                state.allocated = allocated;
            }
            state.allocated = state.allocated.add(resources);
        }

        state.lease_id = None;
        state.status = if state.holds.is_empty() {
            HostStatus::Ready
        } else {
            HostStatus::Held
        };
        self.recompute_derived(&mut state);
        self.assert_invariants(&state);
        Ok(released)
    }

    /// Pin this host for a specific pod until the hold expires.
    pub fn hold_for_pod(&self, pod_id: &str, now_ms: u64) -> HostCacheResult<()> {
        let mut state = self.state.lock();
        self.expire_stale_lease(&mut state, now_ms);

        if state.status == HostStatus::Placing {
            return Err(HostCacheError::conflicting_status(format!(
                "cannot hold host {} for pod {pod_id}: host is placing",
                self.hostname
            )));
        }
        if state.pods.contains_key(pod_id) {
            return Err(HostCacheError::conflicting_status(format!(
                "cannot hold host {} for pod {pod_id}: pod already running",
                self.hostname
            )));
        }

        // Re-holding refreshes the expiry.
        state.holds.insert(pod_id.to_string(), now_ms + self.hold_ttl_ms);
        state.status = HostStatus::Held;
        self.assert_invariants(&state);
        Ok(())
    }

    /// Drop the hold for a pod. A hold that does not exist is a no-op.
    pub fn release_hold_for_pod(&self, pod_id: &str) {
        let mut state = self.state.lock();
        state.holds.remove(pod_id);
        if state.holds.is_empty() && state.status == HostStatus::Held {
            state.status = HostStatus::Ready;
        }
        self.assert_invariants(&state);
    }

    /// Remove every hold whose expiry has passed.
    ///
    /// Returns whether the host left Held, and the expired pod IDs.
    pub fn delete_expired_holds(&self, now_ms: u64) -> (bool, Vec<String>) {
        let mut state = self.state.lock();

        let expired: Vec<String> = state
            .holds
            .iter()
            .filter(|(_, expiry)| **expiry <= now_ms)
            .map(|(pod_id, _)| pod_id.clone())
            .collect();
        for pod_id in &expired {
            state.holds.remove(pod_id);
        }

        let mut freed = false;
        if state.holds.is_empty() && state.status == HostStatus::Held {
            state.status = HostStatus::Ready;
            freed = true;
        }
        self.assert_invariants(&state);
        (freed, expired)
    }

    /// Apply a pod lifecycle event to the running-pod set and allocation.
    ///
    /// Returns the pod IDs whose holds were consumed (a launch of a held
    /// pod consumes its hold).
    pub fn handle_pod_event(&self, event: &PodEvent) -> HostCacheResult<Vec<String>> {
        let mut state = self.state.lock();
        let pod_id = event.pod_id.as_str();
        let mut released = Vec::new();

        match event.event_type {
            PodEventType::Launch => {
                if state.holds.remove(pod_id).is_some() {
                    released.push(pod_id.to_string());
                    if state.holds.is_empty() && state.status == HostStatus::Held {
                        state.status = HostStatus::Ready;
                    }
                }
                if let Some(previous) = state.pods.insert(pod_id.to_string(), event.resources.clone())
                {
                    if previous == event.resources {
                        // Re-delivered launch; nothing to do.
                        self.assert_invariants(&state);
                        return Ok(released);
                    }
                    let (allocated, underflow) = state.allocated.subtract(&previous);
                    if underflow {
                        tracing::error!(
                            hostname = %self.hostname,
                            pod_id,
                            "allocation underflow while replacing pod reservation"
                        );
                    }
                    state.allocated = allocated;
                }
                state.allocated = state.allocated.add(&event.resources);
            }
            PodEventType::Update => match state.pods.insert(pod_id.to_string(), event.resources.clone()) {
                Some(previous) => {
                    let (allocated, underflow) = state.allocated.subtract(&previous);
                    if underflow {
                        tracing::error!(
                            hostname = %self.hostname,
                            pod_id,
                            "allocation underflow while updating pod reservation"
                        );
                    }
                    state.allocated = allocated.add(&event.resources);
                }
                None => {
                    tracing::debug!(
                        hostname = %self.hostname,
                        pod_id,
                        "update for unknown pod treated as launch"
                    );
                    state.allocated = state.allocated.add(&event.resources);
                }
            },
            PodEventType::Kill | PodEventType::Evict => match state.pods.remove(pod_id) {
                Some(resources) => {
                    let (allocated, underflow) = state.allocated.subtract(&resources);
                    if underflow {
                        tracing::error!(
                            hostname = %self.hostname,
                            pod_id,
                            "allocation underflow while removing pod"
                        );
                    }
                    state.allocated = allocated;
                }
                None => {
                    tracing::debug!(
                        hostname = %self.hostname,
                        pod_id,
                        "drop pod event: pod not tracked on host"
                    );
                    return Ok(released);
                }
            },
        }

        self.recompute_derived(&mut state);
        self.assert_invariants(&state);
        Ok(released)
    }

    /// Unconditional capacity update; version monotonicity is enforced by
    /// event ingest before calling.
    pub fn set_capacity(&self, capacity: Resources) {
        let mut state = self.state.lock();
        state.capacity = capacity;
        self.recompute_derived(&mut state);
    }

    /// Unconditional available update (Mesos-style flows).
    pub fn set_available(&self, available: Resources) {
        let mut state = self.state.lock();
        state.available = available;
        self.recompute_derived(&mut state);
    }

    pub fn set_version(&self, version: impl Into<String>) {
        self.state.lock().version = version.into();
    }

    pub fn set_labels(&self, labels: HashMap<String, String>) {
        self.state.lock().labels = labels;
    }

    /// Copy of the current lease view, if the host is leased.
    pub fn get_host_lease(&self) -> Option<HostLease> {
        let state = self.state.lock();
        state.lease_id.map(|lease_id| HostLease {
            hostname: self.hostname.clone(),
            lease_id,
            offered: state.available.clone(),
            expires_at_ms: state.lease_expiry_ms,
        })
    }

    // ── internal ────────────────────────────────────────────────────

    fn filter_check(state: &State, filter: &HostFilter, now_ms: u64) -> Result<(), FilterReason> {
        let matchable_status = match state.status {
            HostStatus::Ready | HostStatus::Held => true,
            HostStatus::Placing => state.lease_expiry_ms <= now_ms,
        };
        if !matchable_status {
            return Err(FilterReason::MismatchStatus);
        }
        if !filter
            .labels
            .iter()
            .all(|(key, value)| state.labels.get(key) == Some(value))
        {
            return Err(FilterReason::MismatchLabels);
        }
        if !filter.constraints.matches(&state.labels) {
            return Err(FilterReason::MismatchConstraints);
        }
        if !state.available.contains(&filter.min_resources) {
            return Err(FilterReason::InsufficientResources);
        }
        Ok(())
    }

    /// Lazily reclaim a lease whose TTL has elapsed.
    fn expire_stale_lease(&self, state: &mut State, now_ms: u64) {
        if state.status != HostStatus::Placing || state.lease_expiry_ms > now_ms {
            return;
        }
        tracing::warn!(
            hostname = %self.hostname,
            lease_id = %state.lease_id.unwrap_or_else(LeaseID::nil),
            "reclaiming expired lease"
        );
        state.lease_id = None;
        state.status = if state.holds.is_empty() {
            HostStatus::Ready
        } else {
            HostStatus::Held
        };
    }

    fn verify_lease(&self, state: &State, lease_id: &LeaseID) -> HostCacheResult<()> {
        if state.status != HostStatus::Placing {
            return Err(HostCacheError::invalid_lease(format!(
                "host {} has no active lease",
                self.hostname
            )));
        }
        if state.lease_id.as_ref() != Some(lease_id) {
            return Err(HostCacheError::invalid_lease(format!(
                "lease id mismatch on host {}",
                self.hostname
            )));
        }
        Ok(())
    }

    /// Keep the derived resource fields consistent after any mutation.
    fn recompute_derived(&self, state: &mut State) {
        match self.kind {
            HostKind::Kubelet => {
                let (available, underflow) = state.capacity.subtract(&state.allocated);
                if underflow {
                    tracing::warn!(
                        hostname = %self.hostname,
                        capacity = %state.capacity,
                        allocated = %state.allocated,
                        "allocation exceeds capacity; clamping available to zero"
                    );
                }
                state.available = available;
            }
            HostKind::Mesos => {
                state.capacity = state.allocated.add(&state.available);
            }
        }
    }

    fn assert_invariants(&self, state: &State) {
        if cfg!(debug_assertions) {
            let total = state
                .pods
                .values()
                .fold(Resources::default(), |acc, r| acc.add(r));
            debug_assert!(
                state.allocated == total,
                "host {}: allocated {} != pod total {}",
                self.hostname,
                state.allocated,
                total
            );
            debug_assert_eq!(
                state.status == HostStatus::Placing,
                state.lease_id.is_some(),
                "host {}: status/lease mismatch",
                self.hostname
            );
            debug_assert!(
                state.holds.keys().all(|pod| !state.pods.contains_key(pod)),
                "host {}: holds and pods overlap",
                self.hostname
            );
            debug_assert!(
                state.holds.is_empty() || state.status != HostStatus::Ready,
                "host {}: holds present while Ready",
                self.hostname
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{LabelConstraint, LabelOperator, LabelSelector};

    const LEASE_TTL: u64 = 120_000;
    const HOLD_TTL: u64 = 300_000;

    fn make_summary() -> HostSummary {
        HostSummary::new_kubelet(
            "h1",
            Resources::new(4.0, 8192, 10000, 0.0),
            "1",
            HashMap::new(),
            LEASE_TTL,
            HOLD_TTL,
        )
    }

    fn filter(cpu: f64, mem_mb: u64) -> HostFilter {
        HostFilter {
            min_resources: Resources::new(cpu, mem_mb, 0, 0.0),
            ..HostFilter::default()
        }
    }

    #[test]
    fn test_acquire_and_complete_lease() {
        let hs = make_summary();
        let lease = hs.acquire_lease(&filter(2.0, 4096), 0).unwrap();
        assert_eq!(hs.status(), HostStatus::Placing);
        assert_eq!(lease.offered, Resources::new(4.0, 8192, 10000, 0.0));

        let mut pods = HashMap::new();
        pods.insert("p1".to_string(), Resources::new(2.0, 4096, 0, 0.0));
        let released = hs.complete_lease(&lease.lease_id, &pods, 0).unwrap();
        assert!(released.is_empty());

        assert_eq!(hs.status(), HostStatus::Ready);
        assert_eq!(hs.allocated(), Resources::new(2.0, 4096, 0, 0.0));
        assert_eq!(hs.available(), Resources::new(2.0, 4096, 10000, 0.0));
        assert!(hs.pods().contains_key("p1"));
    }

    #[test]
    fn test_terminate_lease_restores_prior_state() {
        let hs = make_summary();
        let before = hs.allocated();
        let lease = hs.acquire_lease(&filter(2.0, 4096), 0).unwrap();

        hs.terminate_lease(&lease.lease_id, 0).unwrap();
        assert_eq!(hs.status(), HostStatus::Ready);
        assert_eq!(hs.allocated(), before);

        // The lease is gone; terminating again is invalid.
        let err = hs.terminate_lease(&lease.lease_id, 0).unwrap_err();
        assert!(err.is_invalid_lease());
    }

    #[test]
    fn test_terminate_lease_id_mismatch() {
        let hs = make_summary();
        hs.acquire_lease(&filter(1.0, 0), 0).unwrap();
        let err = hs.terminate_lease(&LeaseID::from_random(), 0).unwrap_err();
        assert!(err.is_invalid_lease());
        assert_eq!(hs.status(), HostStatus::Placing);
    }

    #[test]
    fn test_acquire_while_placing_fails() {
        let hs = make_summary();
        hs.acquire_lease(&filter(1.0, 0), 0).unwrap();
        let err = hs.acquire_lease(&filter(1.0, 0), 0).unwrap_err();
        assert!(err.is_conflicting_status());
    }

    #[test]
    fn test_complete_lease_insufficient_resources() {
        let hs = make_summary();
        let lease = hs.acquire_lease(&filter(1.0, 0), 0).unwrap();

        let mut pods = HashMap::new();
        pods.insert("p1".to_string(), Resources::new(8.0, 0, 0, 0.0));
        let err = hs.complete_lease(&lease.lease_id, &pods, 0).unwrap_err();
        assert!(err.is_insufficient_resources());

        // State unchanged: still placing, nothing allocated.
        assert_eq!(hs.status(), HostStatus::Placing);
        assert!(hs.allocated().is_empty());
        assert!(hs.pods().is_empty());
    }

    #[test]
    fn test_lease_expires_lazily() {
        let hs = make_summary();
        let lease = hs.acquire_lease(&filter(1.0, 0), 0).unwrap();

        // Past the TTL the host matches again and a new acquire succeeds.
        let later = LEASE_TTL + 1;
        assert!(hs.try_match(&filter(1.0, 0), later).is_ok());
        let second = hs.acquire_lease(&filter(1.0, 0), later).unwrap();
        assert_ne!(lease.lease_id, second.lease_id);

        // The stale lease can no longer be completed.
        let err = hs
            .complete_lease(&lease.lease_id, &HashMap::new(), later)
            .unwrap_err();
        assert!(err.is_invalid_lease());
    }

    #[test]
    fn test_hold_and_release() {
        let hs = make_summary();
        hs.hold_for_pod("p1", 0).unwrap();
        assert_eq!(hs.status(), HostStatus::Held);
        hs.hold_for_pod("p2", 0).unwrap();

        hs.release_hold_for_pod("p1");
        assert_eq!(hs.status(), HostStatus::Held);
        hs.release_hold_for_pod("p2");
        assert_eq!(hs.status(), HostStatus::Ready);
    }

    #[test]
    fn test_hold_while_placing_fails() {
        let hs = make_summary();
        hs.acquire_lease(&filter(1.0, 0), 0).unwrap();
        let err = hs.hold_for_pod("p1", 0).unwrap_err();
        assert!(err.is_conflicting_status());
    }

    #[test]
    fn test_acquire_from_held_and_complete_consumes_hold() {
        let hs = make_summary();
        hs.hold_for_pod("p1", 0).unwrap();
        hs.hold_for_pod("p2", 0).unwrap();

        // Held hosts are matchable.
        let lease = hs.acquire_lease(&filter(1.0, 0), 0).unwrap();

        let mut pods = HashMap::new();
        pods.insert("p1".to_string(), Resources::new(1.0, 0, 0, 0.0));
        let released = hs.complete_lease(&lease.lease_id, &pods, 0).unwrap();
        assert_eq!(released, vec!["p1".to_string()]);

        // p2's hold remains, so the host goes back to Held.
        assert_eq!(hs.status(), HostStatus::Held);
        assert_eq!(hs.held_pods(), vec!["p2".to_string()]);
    }

    #[test]
    fn test_delete_expired_holds() {
        let hs = make_summary();
        hs.hold_for_pod("p1", 0).unwrap();
        hs.hold_for_pod("p2", 1000).unwrap();

        // Nothing expired yet.
        let (freed, expired) = hs.delete_expired_holds(HOLD_TTL - 1);
        assert!(!freed);
        assert!(expired.is_empty());

        // p1 expires first.
        let (freed, expired) = hs.delete_expired_holds(HOLD_TTL);
        assert!(!freed);
        assert_eq!(expired, vec!["p1".to_string()]);

        let (freed, mut expired) = hs.delete_expired_holds(HOLD_TTL + 1000);
        assert!(freed);
        expired.sort();
        assert_eq!(expired, vec!["p2".to_string()]);
        assert_eq!(hs.status(), HostStatus::Ready);
    }

    #[test]
    fn test_pod_events_drive_allocation() {
        let hs = make_summary();
        let launch = PodEvent::new(
            "h1",
            "p1",
            PodEventType::Launch,
            Resources::new(2.0, 4096, 0, 0.0),
        );
        hs.handle_pod_event(&launch).unwrap();
        assert_eq!(hs.allocated(), Resources::new(2.0, 4096, 0, 0.0));

        // Idempotent on re-delivery.
        hs.handle_pod_event(&launch).unwrap();
        assert_eq!(hs.allocated(), Resources::new(2.0, 4096, 0, 0.0));

        let update = PodEvent::new(
            "h1",
            "p1",
            PodEventType::Update,
            Resources::new(1.0, 2048, 0, 0.0),
        );
        hs.handle_pod_event(&update).unwrap();
        assert_eq!(hs.allocated(), Resources::new(1.0, 2048, 0, 0.0));
        assert_eq!(hs.available(), Resources::new(3.0, 6144, 10000, 0.0));

        let kill = PodEvent::new("h1", "p1", PodEventType::Kill, Resources::default());
        // Kill events may omit resources; the summary uses its own record.
        hs.handle_pod_event(&kill).unwrap();
        assert!(hs.allocated().is_empty());
        assert!(hs.pods().is_empty());
    }

    #[test]
    fn test_launch_consumes_hold() {
        let hs = make_summary();
        hs.hold_for_pod("p1", 0).unwrap();

        let launch = PodEvent::new(
            "h1",
            "p1",
            PodEventType::Launch,
            Resources::new(1.0, 0, 0, 0.0),
        );
        let released = hs.handle_pod_event(&launch).unwrap();
        assert_eq!(released, vec!["p1".to_string()]);
        assert_eq!(hs.status(), HostStatus::Ready);
    }

    #[test]
    fn test_kill_unknown_pod_is_dropped() {
        let hs = make_summary();
        let kill = PodEvent::new("h1", "px", PodEventType::Kill, Resources::default());
        let released = hs.handle_pod_event(&kill).unwrap();
        assert!(released.is_empty());
        assert!(hs.allocated().is_empty());
    }

    #[test]
    fn test_mesos_summary_derives_capacity() {
        let hs = HostSummary::new_mesos("m1", "1", LEASE_TTL, HOLD_TTL);
        hs.set_available(Resources::new(8.0, 16384, 0, 0.0));
        assert_eq!(hs.capacity(), Resources::new(8.0, 16384, 0, 0.0));

        let launch = PodEvent::new(
            "m1",
            "p1",
            PodEventType::Launch,
            Resources::new(2.0, 4096, 0, 0.0),
        );
        hs.handle_pod_event(&launch).unwrap();
        assert_eq!(hs.allocated(), Resources::new(2.0, 4096, 0, 0.0));
        // Offer stream still reports 8 cpu free until the next event lands.
        assert_eq!(hs.capacity(), Resources::new(10.0, 20480, 0, 0.0));

        hs.set_available(Resources::new(6.0, 12288, 0, 0.0));
        assert_eq!(hs.capacity(), Resources::new(8.0, 16384, 0, 0.0));
    }

    #[test]
    fn test_filter_labels_and_constraints() {
        let mut labels = HashMap::new();
        labels.insert("zone".to_string(), "us-east-1".to_string());
        labels.insert("pool".to_string(), "batch".to_string());
        let hs = HostSummary::new_kubelet(
            "h1",
            Resources::new(4.0, 8192, 10000, 0.0),
            "1",
            labels,
            LEASE_TTL,
            HOLD_TTL,
        );

        let mut f = filter(1.0, 0);
        f.labels = vec![("pool".to_string(), "batch".to_string())];
        assert!(hs.try_match(&f, 0).is_ok());

        f.labels = vec![("pool".to_string(), "stateless".to_string())];
        assert_eq!(hs.try_match(&f, 0), Err(FilterReason::MismatchLabels));

        let mut f = filter(1.0, 0);
        f.constraints = LabelSelector {
            constraints: vec![LabelConstraint {
                key: "zone".to_string(),
                operator: LabelOperator::NotIn,
                values: vec!["us-east-1".to_string()],
            }],
        };
        assert_eq!(hs.try_match(&f, 0), Err(FilterReason::MismatchConstraints));
    }

    #[test]
    fn test_get_host_lease() {
        let hs = make_summary();
        assert!(hs.get_host_lease().is_none());

        let lease = hs.acquire_lease(&filter(1.0, 0), 0).unwrap();
        let view = hs.get_host_lease().unwrap();
        assert_eq!(view.lease_id, lease.lease_id);
        assert_eq!(view.hostname, "h1");
    }
}
