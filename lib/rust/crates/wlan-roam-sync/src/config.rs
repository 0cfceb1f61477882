// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {anyhow::Context, serde::Deserialize};

pub const DEFAULT_WAIT_FOR_KEY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_CONNECT_RSP_BYTES: usize = 64 * 1024;

/// Optional firmware extensions the host was built to understand. Fields belonging to a
/// disabled extension are still bounds-checked when an indication is decoded, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// FILS HLP payload and ERP sequence numbers.
    pub fils: bool,
    /// ESE TSPEC IE following the RIC data.
    pub ese: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { fils: true, ese: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoamSyncConfig {
    pub capabilities: Capabilities,
    pub wait_for_key_timeout_ms: u64,
    pub sae_single_pmk_enabled: bool,
    /// Upper bound on the bytes held by the IE buffers of in-flight connect responses.
    pub max_connect_rsp_bytes: usize,
}

impl Default for RoamSyncConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            wait_for_key_timeout_ms: DEFAULT_WAIT_FOR_KEY_TIMEOUT_MS,
            sae_single_pmk_enabled: true,
            max_connect_rsp_bytes: DEFAULT_MAX_CONNECT_RSP_BYTES,
        }
    }
}

impl RoamSyncConfig {
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        serde_json::from_str(json).context("failed to parse roam sync config")
    }
}
