// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Filter matching over candidate host summaries.
//!
//! A matcher is built per placement query. It walks hint hosts first, then
//! the rest of the index in lexicographic hostname order (the first-fit
//! ranker), tallying a reason for every host it examines.

use std::collections::{HashMap, HashSet};

use hostmgr_common::resources::Resources;
use hostmgr_util::counter_map::CounterMap;

use crate::host_summary::HostSummary;

/// Outcome tag for one examined host. The tags are the debugging currency
/// handed back to the placement engine alongside the leases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterReason {
    Match,
    MismatchStatus,
    InsufficientResources,
    MismatchLabels,
    MismatchConstraints,
    MatchMaxHostLimit,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::MismatchStatus => "MISMATCH_STATUS",
            Self::InsufficientResources => "INSUFFICIENT_RESOURCES",
            Self::MismatchLabels => "MISMATCH_LABELS",
            Self::MismatchConstraints => "MISMATCH_CONSTRAINTS",
            Self::MatchMaxHostLimit => "MATCH_MAX_HOST_LIMIT",
        }
    }
}

/// Label constraint operators for affinity/anti-affinity predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOperator {
    In,
    NotIn,
}

/// A single affinity/anti-affinity predicate over host labels.
#[derive(Debug, Clone)]
pub struct LabelConstraint {
    pub key: String,
    pub operator: LabelOperator,
    pub values: Vec<String>,
}

/// A set of label constraints that all must match.
#[derive(Debug, Clone, Default)]
pub struct LabelSelector {
    pub constraints: Vec<LabelConstraint>,
}

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if labels satisfy all constraints.
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.constraints.iter().all(|c| {
            let value = labels.get(&c.key);
            match c.operator {
                LabelOperator::In => match value {
                    Some(v) => c.values.iter().any(|allowed| allowed == v),
                    None => false,
                },
                LabelOperator::NotIn => match value {
                    Some(v) => !c.values.iter().any(|disallowed| disallowed == v),
                    // Key not present satisfies NotIn.
                    None => true,
                },
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// A placement query: the predicate a host must satisfy to be leased.
#[derive(Debug, Clone, Default)]
pub struct HostFilter {
    /// Minimum resources per host.
    pub min_resources: Resources,
    /// Required label key/values; all must appear on the host.
    pub labels: Vec<(String, String)>,
    /// Affinity/anti-affinity predicates.
    pub constraints: LabelSelector,
    /// Preferred hostnames, tried first in order.
    pub hint_hosts: Vec<String>,
    /// Cap on matched hosts; 0 means unlimited.
    pub max_hosts: u32,
}

/// Per-query match state.
pub struct Matcher<'a> {
    filter: &'a HostFilter,
    host_limit: u32,
    now_ms: u64,
    host_names: Vec<String>,
    visited: HashSet<String>,
    filter_counts: CounterMap<FilterReason>,
}

impl<'a> Matcher<'a> {
    /// `config_max_hosts` is the process-wide cap; the effective limit is
    /// the smaller of it and the filter's own cap.
    pub fn new(filter: &'a HostFilter, config_max_hosts: u32, now_ms: u64) -> Self {
        let filter_cap = if filter.max_hosts == 0 {
            u32::MAX
        } else {
            filter.max_hosts
        };
        Self {
            filter,
            host_limit: filter_cap.min(config_max_hosts),
            now_ms,
            host_names: Vec::new(),
            visited: HashSet::new(),
            filter_counts: CounterMap::new(),
        }
    }

    /// Examine one host. Returns false once the host cap is reached, which
    /// tells the caller to stop iterating. A host already examined (e.g. via
    /// the hint pass) is skipped without a second tally.
    pub fn try_match_host(&mut self, summary: &HostSummary) -> bool {
        if self.host_limit_reached() {
            self.filter_counts.increment(FilterReason::MatchMaxHostLimit);
            return false;
        }
        if !self.visited.insert(summary.hostname().to_string()) {
            return true;
        }
        match summary.try_match(self.filter, self.now_ms) {
            // Matches are tallied later, once the acquire step confirms them.
            Ok(()) => self.host_names.push(summary.hostname().to_string()),
            Err(reason) => {
                self.filter_counts.increment(reason);
            }
        }
        true
    }

    pub fn host_limit_reached(&self) -> bool {
        self.host_names.len() as u32 >= self.host_limit
    }

    /// Hostnames that passed the filter, in examination order.
    pub fn host_names(&self) -> &[String] {
        &self.host_names
    }

    /// Record that a matched host was successfully converted to a lease.
    pub fn record_acquired(&mut self) {
        self.filter_counts.increment(FilterReason::Match);
    }

    /// Record that a matched host could not be leased after all (its status
    /// changed between match and acquire).
    pub fn record_acquire_failed(&mut self) {
        self.filter_counts.increment(FilterReason::MismatchStatus);
    }

    /// Consume the matcher into the stringly-tagged counts returned to the
    /// placement engine.
    pub fn into_filter_counts(self) -> HashMap<String, u32> {
        self.filter_counts
            .into_iter()
            .map(|(reason, count)| (reason.as_str().to_string(), count))
            .collect()
    }
}
