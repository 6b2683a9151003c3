// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Host cache configuration.
//!
//! A plain struct with defaults, deserializable from a JSON string or the
//! base64-wrapped JSON that process launchers pass on the command line.

use base64::Engine as _;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_DISK_MB_PER_HOST, DEFAULT_HOLD_SWEEP_INTERVAL_MS, DEFAULT_HOLD_TTL_MS,
    DEFAULT_LEASE_TTL_MS,
};

/// Host ranking strategy for the matcher. First-fit is the only strategy
/// implemented; the enum is the plug point for defrag/best-fit rankers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranker {
    FirstFit,
}

/// Host cache configuration parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostCacheConfig {
    /// How long an acquired lease stays valid before lazy reclamation.
    pub lease_ttl_ms: u64,
    /// How long a pod hold pins a host.
    pub hold_ttl_ms: u64,
    /// Period of the expired-hold sweeper.
    pub hold_sweep_interval_ms: u64,
    /// Disk assumed for backends that do not advertise disk capacity.
    pub default_disk_mb_per_host: u64,
    /// Upper bound on hosts matched per placement query.
    pub max_match_hosts: u32,
    pub ranker: Ranker,
}

impl Default for HostCacheConfig {
    fn default() -> Self {
        Self {
            lease_ttl_ms: DEFAULT_LEASE_TTL_MS,
            hold_ttl_ms: DEFAULT_HOLD_TTL_MS,
            hold_sweep_interval_ms: DEFAULT_HOLD_SWEEP_INTERVAL_MS,
            default_disk_mb_per_host: DEFAULT_DISK_MB_PER_HOST,
            max_match_hosts: u32::MAX,
            ranker: Ranker::FirstFit,
        }
    }
}

impl HostCacheConfig {
    /// Parse from a JSON object string. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid config JSON: {e}"))
    }

    /// Parse from a base64-encoded JSON string.
    pub fn from_base64_json(encoded: &str) -> Result<Self, String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| format!("invalid base64 config: {e}"))?;
        let json = String::from_utf8(bytes).map_err(|e| format!("config is not UTF-8: {e}"))?;
        Self::from_json(&json)
    }
}
