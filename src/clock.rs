// ABOUTME: Injectable wall clock used by token expiry checks and the admission window gate
// ABOUTME: SystemClock reads real time; FixedClock is a settable clock for deterministic tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a whole-second instant that tests move explicitly
#[derive(Debug)]
pub struct FixedClock {
    unix_seconds: AtomicI64,
}

impl FixedClock {
    /// Create a clock pinned at `instant` (sub-second precision is dropped)
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            unix_seconds: AtomicI64::new(instant.timestamp()),
        }
    }

    /// Create a clock pinned at the given Unix timestamp
    #[must_use]
    pub const fn from_timestamp(unix_seconds: i64) -> Self {
        Self {
            unix_seconds: AtomicI64::new(unix_seconds),
        }
    }

    /// Move the clock to `instant`
    pub fn set(&self, instant: DateTime<Utc>) {
        self.unix_seconds
            .store(instant.timestamp(), Ordering::SeqCst);
    }

    /// Move the clock forward (or backward, for negative values)
    pub fn advance(&self, by: Duration) {
        self.unix_seconds
            .fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.unix_seconds.load(Ordering::SeqCst), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
