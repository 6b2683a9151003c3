// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Lease identifier.
//!
//! A lease ID is a 128-bit random token minted when a host transitions to
//! `Placing`. It is opaque to callers, who present it verbatim back to
//! complete or terminate the lease.

use std::fmt;

use rand::Rng;

use crate::constants::LEASE_ID_SIZE;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaseID {
    data: [u8; LEASE_ID_SIZE],
}

impl LeaseID {
    /// The nil ID (all 0xFF bytes). No minted lease ever equals it.
    pub const fn nil() -> Self {
        Self {
            data: [0xFF; LEASE_ID_SIZE],
        }
    }

    /// Mint a fresh random ID. Uniqueness within process lifetime follows
    /// from 128 bits of randomness.
    pub fn from_random() -> Self {
        let mut data = [0u8; LEASE_ID_SIZE];
        rand::thread_rng().fill(&mut data[..]);
        Self { data }
    }

    /// Parse from a hex string, as presented by callers over the wire.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != LEASE_ID_SIZE * 2 {
            return None;
        }
        let mut data = [0u8; LEASE_ID_SIZE];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self { data })
    }

    /// Hex encoding, the wire representation.
    pub fn hex(&self) -> String {
        let mut s = String::with_capacity(LEASE_ID_SIZE * 2);
        for byte in &self.data {
            s.push_str(&format!("{byte:02x}"));
        }
        s
    }

    pub fn is_nil(&self) -> bool {
        self.data == [0xFF; LEASE_ID_SIZE]
    }
}

impl fmt::Display for LeaseID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl fmt::Debug for LeaseID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LeaseID({})", self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_distinct() {
        let a = LeaseID::from_random();
        let b = LeaseID::from_random();
        assert_ne!(a, b);
        assert!(!a.is_nil());
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = LeaseID::from_random();
        let parsed = LeaseID::from_hex(&id.hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_from_hex_rejects_malformed() {
        assert!(LeaseID::from_hex("").is_none());
        assert!(LeaseID::from_hex("abc").is_none());
        assert!(LeaseID::from_hex(&"zz".repeat(LEASE_ID_SIZE)).is_none());
    }

    #[test]
    fn test_nil() {
        assert!(LeaseID::nil().is_nil());
        assert_eq!(LeaseID::nil().hex(), "ff".repeat(LEASE_ID_SIZE));
    }
}
