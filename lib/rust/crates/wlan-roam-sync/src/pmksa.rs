// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        indication::{MAX_PMK_LEN, PMKID_LEN},
        security::KeyBuf,
        VdevId,
    },
    parking_lot::Mutex,
    std::collections::HashMap,
    wlan_common::Bssid,
};

/// A cached PMK security association. The PMK is wiped when the entry is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmksaCacheEntry {
    pub bssid: Bssid,
    pub pmk: KeyBuf<MAX_PMK_LEN>,
    pub pmkid: [u8; PMKID_LEN],
}

pub trait PmksaCache: Send + Sync {
    fn lookup(&self, vdev_id: VdevId, bssid: &Bssid) -> Option<PmksaCacheEntry>;
    /// Inserts `entry`, replacing any entry for the same BSSID.
    fn set_pmksa(&self, vdev_id: VdevId, entry: PmksaCacheEntry);
    /// Makes `pmk` the PMK used for the vdev's current PSK association.
    fn set_psk_pmk(&self, vdev_id: VdevId, pmk: &[u8]);
}

#[derive(Debug, Default)]
pub struct InMemoryPmksaCache {
    entries: Mutex<HashMap<(VdevId, Bssid), PmksaCacheEntry>>,
    psk_pmk: Mutex<HashMap<VdevId, KeyBuf<MAX_PMK_LEN>>>,
}

impl InMemoryPmksaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn psk_pmk(&self, vdev_id: VdevId) -> Option<Vec<u8>> {
        self.psk_pmk.lock().get(&vdev_id).map(|pmk| pmk.as_slice().to_vec())
    }
}

impl PmksaCache for InMemoryPmksaCache {
    fn lookup(&self, vdev_id: VdevId, bssid: &Bssid) -> Option<PmksaCacheEntry> {
        self.entries.lock().get(&(vdev_id, *bssid)).cloned()
    }

    fn set_pmksa(&self, vdev_id: VdevId, entry: PmksaCacheEntry) {
        self.entries.lock().insert((vdev_id, entry.bssid), entry);
    }

    fn set_psk_pmk(&self, vdev_id: VdevId, pmk: &[u8]) {
        match KeyBuf::new(pmk) {
            Some(pmk) => {
                self.psk_pmk.lock().insert(vdev_id, pmk);
            }
            None => log::warn!("vdev:{} PMK of {} bytes exceeds capacity", vdev_id, pmk.len()),
        }
    }
}
