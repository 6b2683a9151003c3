// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! In-memory host cache for the workload manager.
//!
//! The cache is the process-local index of every worker host known to the
//! manager. It ingests host and pod lifecycle events from a cluster backend
//! plugin, tracks each host's capacity, allocation, lease, and pod holds,
//! and serves placement queries that match a filter against candidate hosts
//! and hand back exclusive leases.

pub mod events;
pub mod host_cache;
pub mod host_summary;
pub mod lifecycle;
pub mod matcher;
pub mod plugin;
