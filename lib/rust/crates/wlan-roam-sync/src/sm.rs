// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Connection manager and vdev MLME state machines as seen by roam synchronization.

use {
    crate::{roam_cmd::CmId, VdevId},
    log::debug,
    parking_lot::Mutex,
    std::collections::HashMap,
    thiserror::Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmEvent {
    RoamSync { cm_id: CmId },
    RoamDone { cm_id: CmId },
    RoamAbort { cm_id: CmId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdevEvent {
    Roam,
    RoamDone,
    RoamAbort,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmState {
    Init,
    Connected,
    Roaming,
    Disconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MlmeState {
    Init,
    Up,
    Roaming,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("vdev {vdev_id}: connection manager in {state:?} rejected {event:?}")]
    ConnectionManager { vdev_id: VdevId, state: CmState, event: CmEvent },
    #[error("vdev {vdev_id}: mlme in {state:?} rejected {event:?}")]
    Vdev { vdev_id: VdevId, state: MlmeState, event: VdevEvent },
}

impl CmState {
    /// Returns None if the event is not accepted in this state.
    fn on_event(self, event: CmEvent) -> Option<Self> {
        match (self, event) {
            (CmState::Connected, CmEvent::RoamSync { .. }) => Some(CmState::Roaming),
            (CmState::Roaming, CmEvent::RoamDone { .. }) => Some(CmState::Connected),
            (CmState::Roaming, CmEvent::RoamAbort { .. }) => Some(CmState::Disconnecting),
            // Aborts race with disconnects. Nothing left to undo.
            (state, CmEvent::RoamAbort { .. }) => Some(state),
            _ => None,
        }
    }
}

impl MlmeState {
    fn on_event(self, event: VdevEvent) -> Option<Self> {
        match (self, event) {
            (_, VdevEvent::Down) => Some(MlmeState::Init),
            (MlmeState::Up, VdevEvent::Roam) => Some(MlmeState::Roaming),
            (MlmeState::Roaming, VdevEvent::RoamDone) => Some(MlmeState::Up),
            (MlmeState::Roaming, VdevEvent::RoamAbort) => Some(MlmeState::Up),
            (state, VdevEvent::RoamAbort) => Some(state),
            _ => None,
        }
    }
}

/// Delivers roam events to the connection manager and vdev MLME state machines. Each call
/// either applies the event or reports the rejection without changing state.
pub trait StateMachineDelivery: Send + Sync {
    fn deliver_cm_event(&self, vdev_id: VdevId, event: CmEvent) -> Result<(), DeliveryError>;
    fn deliver_vdev_event(&self, vdev_id: VdevId, event: VdevEvent) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy)]
struct Machines {
    cm: CmState,
    mlme: MlmeState,
}

impl Default for Machines {
    fn default() -> Self {
        Self { cm: CmState::Init, mlme: MlmeState::Init }
    }
}

/// In-process state machines, one pair per vdev. Unknown vdevs are in `Init`.
#[derive(Debug, Default)]
pub struct LocalStateMachines {
    machines: Mutex<HashMap<VdevId, Machines>>,
}

impl LocalStateMachines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts the vdev into the associated state a roam starts from.
    pub fn set_connected(&self, vdev_id: VdevId) {
        let machines = Machines { cm: CmState::Connected, mlme: MlmeState::Up };
        self.machines.lock().insert(vdev_id, machines);
    }

    pub fn cm_state(&self, vdev_id: VdevId) -> CmState {
        self.machines.lock().get(&vdev_id).map_or(CmState::Init, |m| m.cm)
    }

    pub fn mlme_state(&self, vdev_id: VdevId) -> MlmeState {
        self.machines.lock().get(&vdev_id).map_or(MlmeState::Init, |m| m.mlme)
    }
}

impl StateMachineDelivery for LocalStateMachines {
    fn deliver_cm_event(&self, vdev_id: VdevId, event: CmEvent) -> Result<(), DeliveryError> {
        let mut machines = self.machines.lock();
        let m = machines.entry(vdev_id).or_default();
        let state = m.cm;
        let next = state
            .on_event(event)
            .ok_or(DeliveryError::ConnectionManager { vdev_id, state, event })?;
        debug!("vdev:{} cm {:?} -> {:?} on {:?}", vdev_id, state, next, event);
        m.cm = next;
        Ok(())
    }

    fn deliver_vdev_event(&self, vdev_id: VdevId, event: VdevEvent) -> Result<(), DeliveryError> {
        let mut machines = self.machines.lock();
        let m = machines.entry(vdev_id).or_default();
        let state = m.mlme;
        let next = state.on_event(event).ok_or(DeliveryError::Vdev { vdev_id, state, event })?;
        debug!("vdev:{} mlme {:?} -> {:?} on {:?}", vdev_id, state, next, event);
        m.mlme = next;
        Ok(())
    }
}
