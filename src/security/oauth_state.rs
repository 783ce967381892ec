// ABOUTME: Per-login anti-forgery state generation and constant-time verification
// ABOUTME: The state travels to the provider in the URL and back, and is pinned in a cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tenchi Geolocation

use rand::Rng;
use subtle::ConstantTimeEq;
use tenchi_core::constants::oauth::STATE_BYTES;

/// Generate a fresh hex-encoded random state for one login round trip
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: Vec<u8> = (0..STATE_BYTES)
        .map(|_| rand::thread_rng().gen())
        .collect();
    hex::encode(random_bytes)
}

/// Compare the state echoed by the provider with the one pinned in the cookie
///
/// Empty values never match.
#[must_use]
pub fn states_match(returned: &str, expected: &str) -> bool {
    if returned.is_empty() || expected.is_empty() {
        return false;
    }
    returned.as_bytes().ct_eq(expected.as_bytes()).into()
}
