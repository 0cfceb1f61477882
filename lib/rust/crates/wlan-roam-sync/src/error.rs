// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        indication::DecodeError, roam_cmd::CmId, roam_sync::CycleState, sm::DeliveryError,
        VdevId,
    },
    thiserror::Error,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("vdev {0} does not exist")]
    NullReference(VdevId),
    #[error("vdev {vdev_id}: failed to resolve {object}")]
    ObjectLookup { vdev_id: VdevId, object: &'static str },
    #[error("error decoding roam sync indication: {0}")]
    Decode(#[from] DecodeError),
    #[error("out of buffers; requested {0} bytes")]
    NoResources(usize),
    #[error("state machine delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("roamed to disabled channel {0} MHz")]
    DisabledChannel(u32),
    #[error("vdev {vdev_id}: {object} unavailable for key reconciliation")]
    Lookup { vdev_id: VdevId, object: &'static str },
    #[error("vdev {0}: no roam request outstanding")]
    NoRoamRequest(VdevId),
    #[error("vdev {vdev_id}: roam request {cm_id:#x} already outstanding")]
    RoamRequestPending { vdev_id: VdevId, cm_id: CmId },
    #[error("vdev {vdev_id}: roam sync indication unexpected in {state:?}")]
    UnexpectedIndication { vdev_id: VdevId, state: CycleState },
    #[error("vdev {vdev_id}: no key installed within {timeout_ms} ms of roaming")]
    WaitForKeyTimeout { vdev_id: VdevId, timeout_ms: u64 },
}

impl Error {
    /// Fatal errors end the roam cycle. Non-fatal errors are logged and the cycle continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Lookup { .. })
    }
}
