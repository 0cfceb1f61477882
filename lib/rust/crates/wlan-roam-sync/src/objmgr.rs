// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{security::KeyMgmt, Ssid, VdevId},
    parking_lot::{Mutex, MutexGuard},
    std::{
        collections::HashMap,
        ops::Deref,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    },
    wlan_common::Bssid,
};

pub type PdevId = u8;
pub type PsocId = u8;

/// Connection state of a vdev that roaming reads and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdevState {
    pub bssid: Bssid,
    pub ssid: Ssid,
    pub chan_freq: u32,
    pub key_mgmt: KeyMgmt,
    /// The current AP advertised a mobility domain element.
    pub mobility_domain_present: bool,
    pub sae_single_pmk_ap: bool,
}

#[derive(Debug)]
pub struct Vdev {
    id: VdevId,
    pdev: Option<PdevId>,
    psoc: Option<PsocId>,
    refs: AtomicUsize,
    state: Mutex<VdevState>,
}

impl Vdev {
    pub fn id(&self) -> VdevId {
        self.id
    }

    pub fn pdev(&self) -> Option<PdevId> {
        self.pdev
    }

    pub fn psoc(&self) -> Option<PsocId> {
        self.psoc
    }

    pub fn state(&self) -> MutexGuard<'_, VdevState> {
        self.state.lock()
    }
}

/// A counted reference to a vdev. The count drops when the guard does.
#[derive(Debug)]
pub struct VdevRef {
    vdev: Arc<Vdev>,
}

impl Deref for VdevRef {
    type Target = Vdev;

    fn deref(&self) -> &Vdev {
        &self.vdev
    }
}

impl Drop for VdevRef {
    fn drop(&mut self) {
        self.vdev.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Default)]
pub struct ObjectManager {
    vdevs: Mutex<HashMap<VdevId, Arc<Vdev>>>,
}

impl ObjectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vdev. `pdev` and `psoc` are None while the parent objects are being torn
    /// down.
    pub fn add_vdev(
        &self,
        id: VdevId,
        pdev: Option<PdevId>,
        psoc: Option<PsocId>,
        state: VdevState,
    ) {
        let vdev = Arc::new(Vdev {
            id,
            pdev,
            psoc,
            refs: AtomicUsize::new(0),
            state: Mutex::new(state),
        });
        self.vdevs.lock().insert(id, vdev);
    }

    pub fn get_vdev_by_id(&self, id: VdevId) -> Option<VdevRef> {
        let vdev = Arc::clone(self.vdevs.lock().get(&id)?);
        vdev.refs.fetch_add(1, Ordering::AcqRel);
        Some(VdevRef { vdev })
    }

    /// Number of outstanding `VdevRef`s for the vdev, or None if it does not exist.
    pub fn ref_count(&self, id: VdevId) -> Option<usize> {
        self.vdevs.lock().get(&id).map(|v| v.refs.load(Ordering::Acquire))
    }
}
