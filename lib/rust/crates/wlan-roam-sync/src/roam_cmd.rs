// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{error::Error, VdevId},
    parking_lot::Mutex,
    std::{
        collections::{hash_map::Entry, HashMap},
        sync::atomic::{AtomicU32, Ordering},
    },
};

/// Identifies one connection manager command across its lifetime.
pub type CmId = u32;

const CM_ID_ROAM_PREFIX: CmId = 0x0800_0000;
const CM_ID_VDEV_SHIFT: u32 = 16;
const CM_ID_SEQ_MASK: CmId = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoamRequestRecord {
    pub vdev_id: VdevId,
    pub cm_id: CmId,
}

/// Outstanding roam commands. A vdev holds at most one.
#[derive(Debug, Default)]
pub struct RoamCommandQueue {
    seq: AtomicU32,
    records: Mutex<HashMap<VdevId, RoamRequestRecord>>,
}

impl RoamCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new roam command. Fails if the vdev already has one outstanding.
    pub fn enqueue(&self, vdev_id: VdevId) -> Result<CmId, Error> {
        match self.records.lock().entry(vdev_id) {
            Entry::Occupied(e) => {
                Err(Error::RoamRequestPending { vdev_id, cm_id: e.get().cm_id })
            }
            Entry::Vacant(e) => {
                let seq =
                    self.seq.fetch_add(1, Ordering::Relaxed).wrapping_add(1) & CM_ID_SEQ_MASK;
                let cm_id = CM_ID_ROAM_PREFIX | (CmId::from(vdev_id) << CM_ID_VDEV_SHIFT) | seq;
                e.insert(RoamRequestRecord { vdev_id, cm_id });
                Ok(cm_id)
            }
        }
    }

    pub fn first_roam_command(&self, vdev_id: VdevId) -> Option<RoamRequestRecord> {
        self.records.lock().get(&vdev_id).copied()
    }

    /// Returns false if no such record is outstanding.
    pub fn remove(&self, vdev_id: VdevId, cm_id: CmId) -> bool {
        let mut records = self.records.lock();
        match records.get(&vdev_id) {
            Some(record) if record.cm_id == cm_id => records.remove(&vdev_id).is_some(),
            _ => false,
        }
    }

    pub fn is_pending(&self, vdev_id: VdevId) -> bool {
        self.records.lock().contains_key(&vdev_id)
    }
}
