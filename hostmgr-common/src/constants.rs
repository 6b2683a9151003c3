// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Process-wide constants.

/// Absolute tolerance for fractional resource comparisons (cpu, gpu).
pub const RESOURCE_EPSILON: f64 = 1e-6;

/// Length of a lease ID in bytes.
pub const LEASE_ID_SIZE: usize = 16;

/// How long an acquired lease stays valid before it is reclaimed.
pub const DEFAULT_LEASE_TTL_MS: u64 = 120_000;

/// How long a pod hold pins a host before it expires.
pub const DEFAULT_HOLD_TTL_MS: u64 = 300_000;

/// How often the hold sweeper runs.
pub const DEFAULT_HOLD_SWEEP_INTERVAL_MS: u64 = 30_000;

/// Disk capacity assumed for backends that do not advertise disk (1 TiB).
pub const DEFAULT_DISK_MB_PER_HOST: u64 = 1_048_576;
