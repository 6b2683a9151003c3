// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Host cache error types.
//!
//! The cache returns at most one tag per call, drawn from a closed set.
//! The RPC handler layer maps these onto standard RPC codes; the cache
//! itself only logs structured reasons.

use std::fmt;

/// Closed set of error tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Hostname absent from the index, or pod ID absent from the hold index.
    NotFound,
    /// Presented lease ID does not match the current lease, or the host is
    /// not in Placing.
    InvalidLease,
    /// Requested pod resources exceed what the host has free.
    InsufficientResources,
    /// Operation not permitted in the host's current status.
    ConflictingStatus,
    /// Ingest-side: event carries an older resource version. Never surfaced
    /// to callers.
    OldEventVersion,
    /// Invariant violation, surfaced as opaque.
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::InvalidLease => "InvalidLease",
            Self::InsufficientResources => "InsufficientResources",
            Self::ConflictingStatus => "ConflictingStatus",
            Self::OldEventVersion => "OldEventVersion",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The error type for host cache operations.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct HostCacheError {
    pub code: ErrorCode,
    pub message: String,
}

impl HostCacheError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }
    pub fn invalid_lease(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidLease, msg)
    }
    pub fn insufficient_resources(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientResources, msg)
    }
    pub fn conflicting_status(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConflictingStatus, msg)
    }
    pub fn old_event_version(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OldEventVersion, msg)
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
    pub fn is_invalid_lease(&self) -> bool {
        self.code == ErrorCode::InvalidLease
    }
    pub fn is_insufficient_resources(&self) -> bool {
        self.code == ErrorCode::InsufficientResources
    }
    pub fn is_conflicting_status(&self) -> bool {
        self.code == ErrorCode::ConflictingStatus
    }
    pub fn is_internal(&self) -> bool {
        self.code == ErrorCode::Internal
    }
}

/// Convenience alias for host cache results.
pub type HostCacheResult<T> = Result<T, HostCacheError>;
