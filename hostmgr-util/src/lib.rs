// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Utility library for the host manager.
//!
//! Provides logging setup, clock abstraction, and small data structures.

pub mod counter_map;
pub mod logging;
pub mod time;
