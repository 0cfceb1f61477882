// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {bitflags::bitflags, std::fmt, zeroize::Zeroize};

/// Authentication state the firmware reached with the new AP before handing the roam off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Associated, the 4-way handshake is still pending on the host.
    Connected,
    /// Keys were installed by the firmware.
    Authenticated,
}

impl AuthStatus {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(AuthStatus::Connected),
            2 => Some(AuthStatus::Authenticated),
            _ => None,
        }
    }

    pub fn into_raw(self) -> u8 {
        match self {
            AuthStatus::Connected => 1,
            AuthStatus::Authenticated => 2,
        }
    }
}

bitflags! {
    /// Key management suites negotiated on a vdev.
    pub struct KeyMgmt: u32 {
        const PSK = 1 << 0;
        const IEEE8021X = 1 << 1;
        const FT_PSK = 1 << 2;
        const FT_IEEE8021X = 1 << 3;
        const FT_IEEE8021X_SHA384 = 1 << 4;
        const SAE = 1 << 5;
        const FT_SAE = 1 << 6;
        const OWE = 1 << 7;
        const FILS_SHA256 = 1 << 8;
        const FILS_SHA384 = 1 << 9;
        const FT_FILS_SHA256 = 1 << 10;
        const FT_FILS_SHA384 = 1 << 11;
        const CCKM = 1 << 12;
        const IEEE8021X_SUITE_B = 1 << 13;
        const IEEE8021X_SUITE_B_192 = 1 << 14;
    }
}

impl KeyMgmt {
    const FT: KeyMgmt = KeyMgmt::from_bits_truncate(
        KeyMgmt::FT_PSK.bits
            | KeyMgmt::FT_IEEE8021X.bits
            | KeyMgmt::FT_IEEE8021X_SHA384.bits
            | KeyMgmt::FT_SAE.bits
            | KeyMgmt::FT_FILS_SHA256.bits
            | KeyMgmt::FT_FILS_SHA384.bits,
    );

    pub fn is_ft(&self) -> bool {
        self.intersects(Self::FT)
    }

    /// SAE and OWE derive the PMK during association, so the firmware never needs the
    /// host to finish a handshake after roaming.
    pub fn is_sae_or_owe(&self) -> bool {
        self.intersects(KeyMgmt::SAE | KeyMgmt::OWE)
    }
}

/// Fixed-capacity key buffer. Contents are wiped when the buffer is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyBuf<const N: usize> {
    len: usize,
    bytes: [u8; N],
}

impl<const N: usize> KeyBuf<N> {
    /// Returns None if `key` does not fit.
    pub fn new(key: &[u8]) -> Option<Self> {
        if key.len() > N {
            return None;
        }
        let mut bytes = [0u8; N];
        bytes[..key.len()].copy_from_slice(key);
        Some(Self { len: key.len(), bytes })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for KeyBuf<N> {
    fn default() -> Self {
        Self { len: 0, bytes: [0u8; N] }
    }
}

impl<const N: usize> fmt::Debug for KeyBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyBuf {{ len: {} }}", self.len)
    }
}

impl<const N: usize> Drop for KeyBuf<N> {
    fn drop(&mut self) {
        self.bytes.zeroize();
        self.len = 0;
    }
}
