// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Scalar resource vector: cpu, memory, disk, gpu plus named extras.

use std::collections::BTreeMap;
use std::fmt;

use crate::constants::RESOURCE_EPSILON;

/// A fixed-shape non-negative resource vector.
///
/// `cpu` and `gpu` are fractional and compared with an absolute epsilon;
/// `mem_mb` and `disk_mb` are exact integers. `custom` holds named scalars
/// for backends that advertise extra resource types.
///
/// `add` and `subtract` return new instances; the vector itself is a pure
/// value object.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub cpu: f64,
    pub mem_mb: u64,
    pub disk_mb: u64,
    pub gpu: f64,
    pub custom: BTreeMap<String, f64>,
}

impl Resources {
    pub fn new(cpu: f64, mem_mb: u64, disk_mb: u64, gpu: f64) -> Self {
        Self {
            cpu,
            mem_mb,
            disk_mb,
            gpu,
            custom: BTreeMap::new(),
        }
    }

    /// Attach a named scalar, consuming and returning self for chaining.
    pub fn with_custom(mut self, name: impl Into<String>, value: f64) -> Self {
        self.custom.insert(name.into(), value);
        self
    }

    /// Quantity of a named scalar (0 if absent).
    pub fn get_custom(&self, name: &str) -> f64 {
        self.custom.get(name).copied().unwrap_or(0.0)
    }

    /// Component-wise sum.
    pub fn add(&self, other: &Resources) -> Resources {
        let mut custom = self.custom.clone();
        for (name, value) in &other.custom {
            *custom.entry(name.clone()).or_insert(0.0) += value;
        }
        Resources {
            cpu: self.cpu + other.cpu,
            mem_mb: self.mem_mb + other.mem_mb,
            disk_mb: self.disk_mb + other.disk_mb,
            gpu: self.gpu + other.gpu,
            custom,
        }
    }

    /// Component-wise difference, clamped at zero.
    ///
    /// The flag is true when any component would have gone negative.
    /// Callers treat underflow as a programming error; the clamped value is
    /// still returned so the caller can keep running.
    pub fn subtract(&self, other: &Resources) -> (Resources, bool) {
        let mut underflow = false;

        let cpu = clamp_sub_f64(self.cpu, other.cpu, &mut underflow);
        let gpu = clamp_sub_f64(self.gpu, other.gpu, &mut underflow);
        let mem_mb = clamp_sub_u64(self.mem_mb, other.mem_mb, &mut underflow);
        let disk_mb = clamp_sub_u64(self.disk_mb, other.disk_mb, &mut underflow);

        let mut custom = self.custom.clone();
        for (name, value) in &other.custom {
            let have = custom.entry(name.clone()).or_insert(0.0);
            *have = clamp_sub_f64(*have, *value, &mut underflow);
        }
        custom.retain(|_, v| *v > RESOURCE_EPSILON);

        (
            Resources {
                cpu,
                mem_mb,
                disk_mb,
                gpu,
                custom,
            },
            underflow,
        )
    }

    /// Check that every component is at least `other`'s. This is the primary
    /// feasibility test when matching a filter against a host.
    pub fn contains(&self, other: &Resources) -> bool {
        self.cpu + RESOURCE_EPSILON >= other.cpu
            && self.mem_mb >= other.mem_mb
            && self.disk_mb >= other.disk_mb
            && self.gpu + RESOURCE_EPSILON >= other.gpu
            && other
                .custom
                .iter()
                .all(|(name, value)| self.get_custom(name) + RESOURCE_EPSILON >= *value)
    }

    /// True if every component is zero.
    pub fn is_empty(&self) -> bool {
        self.cpu.abs() <= RESOURCE_EPSILON
            && self.mem_mb == 0
            && self.disk_mb == 0
            && self.gpu.abs() <= RESOURCE_EPSILON
            && self.custom.values().all(|v| v.abs() <= RESOURCE_EPSILON)
    }

    pub fn non_empty(&self) -> bool {
        !self.is_empty()
    }
}

impl PartialEq for Resources {
    fn eq(&self, other: &Self) -> bool {
        self.contains(other) && other.contains(self)
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu:{} mem_mb:{} disk_mb:{} gpu:{}",
            self.cpu, self.mem_mb, self.disk_mb, self.gpu
        )?;
        for (name, value) in &self.custom {
            write!(f, " {name}:{value}")?;
        }
        Ok(())
    }
}

fn clamp_sub_f64(a: f64, b: f64, underflow: &mut bool) -> f64 {
    let diff = a - b;
    if diff < -RESOURCE_EPSILON {
        *underflow = true;
        0.0
    } else {
        diff.max(0.0)
    }
}

fn clamp_sub_u64(a: u64, b: u64, underflow: &mut bool) -> u64 {
    if b > a {
        *underflow = true;
        0
    } else {
        a - b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let a = Resources::new(2.0, 4096, 10000, 1.0);
        let b = Resources::new(1.5, 1024, 0, 0.0);
        let sum = a.add(&b);
        assert_eq!(sum, Resources::new(3.5, 5120, 10000, 1.0));
    }

    #[test]
    fn test_subtract() {
        let a = Resources::new(4.0, 8192, 10000, 2.0);
        let b = Resources::new(1.0, 2048, 0, 2.0);
        let (diff, underflow) = a.subtract(&b);
        assert!(!underflow);
        assert_eq!(diff, Resources::new(3.0, 6144, 10000, 0.0));
    }

    #[test]
    fn test_subtract_underflow_clamps_to_zero() {
        let a = Resources::new(1.0, 1024, 0, 0.0);
        let b = Resources::new(2.0, 4096, 0, 0.0);
        let (diff, underflow) = a.subtract(&b);
        assert!(underflow);
        assert_eq!(diff, Resources::default());
    }

    #[test]
    fn test_contains() {
        let host = Resources::new(4.0, 8192, 10000, 0.0);
        assert!(host.contains(&Resources::new(2.0, 4096, 0, 0.0)));
        assert!(!host.contains(&Resources::new(5.0, 4096, 0, 0.0)));
        assert!(!host.contains(&Resources::new(2.0, 8193, 0, 0.0)));
    }

    #[test]
    fn test_contains_epsilon_on_fractional_components() {
        let host = Resources::new(0.1 + 0.2, 0, 0, 0.0);
        // 0.1 + 0.2 != 0.3 in floating point, but is within epsilon.
        assert!(host.contains(&Resources::new(0.3, 0, 0, 0.0)));
    }

    #[test]
    fn test_custom_resources() {
        let a = Resources::new(1.0, 0, 0, 0.0).with_custom("fpga", 2.0);
        let b = Resources::new(0.0, 0, 0, 0.0).with_custom("fpga", 1.0);

        assert!(a.contains(&b));
        assert!(!b.contains(&a));

        let (diff, underflow) = a.subtract(&b);
        assert!(!underflow);
        assert_eq!(diff.get_custom("fpga"), 1.0);

        // Subtracting a scalar the host never had underflows.
        let c = Resources::new(0.0, 0, 0, 0.0).with_custom("nic", 1.0);
        let (_, underflow) = a.subtract(&c);
        assert!(underflow);
    }

    #[test]
    fn test_equality_is_epsilon_aware() {
        let a = Resources::new(1.0, 2048, 0, 0.0);
        let b = Resources::new(1.0 + 1e-9, 2048, 0, 0.0);
        assert_eq!(a, b);

        let c = Resources::new(1.1, 2048, 0, 0.0);
        assert_ne!(a, c);
    }

    #[test]
    fn test_is_empty() {
        assert!(Resources::default().is_empty());
        assert!(Resources::new(0.0, 0, 0, 0.0).is_empty());
        assert!(Resources::new(0.5, 0, 0, 0.0).non_empty());
    }
}
