// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Ends a roam cycle. A failed cycle stops the firmware roam once, aborts its roam command
//! once and drops everything the cycle allocated. A successful cycle only removes its command.

use {
    crate::{
        connect_response::{ConnectResponse, ConnectStatus},
        error::Error,
        objmgr::{Vdev, VdevRef},
        roam_cmd::{CmId, RoamCommandQueue},
        sink::{CmSink, InfoSink},
        sm::{CmEvent, StateMachineDelivery, VdevEvent},
        CmRequest, DisconnectReason, InfoEvent, RoamStopReason, VdevId,
    },
    log::{error, info, warn},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Disconnect from the new AP, then stop and abort the roam.
    DisconnectAndAbort,
    /// Stop the firmware roam and abort the roam command.
    AbortOnly,
    /// Nothing to undo. The error is only reported to the caller.
    PropagateOnly,
}

impl Disposition {
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::DisabledChannel(_) => Disposition::DisconnectAndAbort,
            Error::ObjectLookup { .. }
            | Error::Decode(_)
            | Error::NoResources(_)
            | Error::Delivery(_)
            | Error::UnexpectedIndication { .. } => Disposition::AbortOnly,
            // The wait-for-key timer outlives its cycle. The timeout disconnects on its own.
            Error::NullReference(_)
            | Error::NoRoamRequest(_)
            | Error::RoamRequestPending { .. }
            | Error::Lookup { .. }
            | Error::WaitForKeyTimeout { .. } => Disposition::PropagateOnly,
        }
    }
}

/// Where a cycle reports its outcome.
pub struct Finalizer<'a> {
    pub cm_sink: &'a CmSink,
    pub info_sink: &'a InfoSink,
    pub sm: &'a dyn StateMachineDelivery,
    pub commands: &'a RoamCommandQueue,
}

impl Finalizer<'_> {
    fn stop_and_abort(&self, vdev_id: VdevId, cm_id: CmId, reason: RoamStopReason) {
        self.cm_sink.send(CmRequest::RoamStop { vdev_id, reason });
        // The state machines may already have left the roaming state.
        if let Err(e) = self.sm.deliver_cm_event(vdev_id, CmEvent::RoamAbort { cm_id }) {
            warn!("vdev:{} cm_id:{} {}", vdev_id, cm_id, e);
        }
        if let Err(e) = self.sm.deliver_vdev_event(vdev_id, VdevEvent::RoamAbort) {
            warn!("vdev:{} cm_id:{} {}", vdev_id, cm_id, e);
        }
        self.remove_command(vdev_id, cm_id);
    }

    fn remove_command(&self, vdev_id: VdevId, cm_id: CmId) {
        if self.commands.remove(vdev_id, cm_id) {
            self.info_sink.send(InfoEvent::RoamCommandRemoved { vdev_id, cm_id });
        } else {
            error!("vdev:{} cm_id:{} roam command already removed", vdev_id, cm_id);
        }
    }
}

/// Resources held by one roam cycle. Released exactly once, by `fail` or `complete`.
pub struct RoamCycle {
    vdev_id: VdevId,
    cm_id: CmId,
    vdev: Option<VdevRef>,
    response: Option<Box<ConnectResponse>>,
}

impl RoamCycle {
    pub fn new(vdev: VdevRef, cm_id: CmId) -> Self {
        Self { vdev_id: vdev.id(), cm_id, vdev: Some(vdev), response: None }
    }

    pub fn vdev_id(&self) -> VdevId {
        self.vdev_id
    }

    pub fn cm_id(&self) -> CmId {
        self.cm_id
    }

    pub fn set_response(&mut self, response: Box<ConnectResponse>) {
        self.response = Some(response);
    }

    /// The vdev and the response slot, borrowed together. None once the cycle is released.
    pub fn resources(&mut self) -> Option<(&Vdev, &mut Option<Box<ConnectResponse>>)> {
        let vdev = self.vdev.as_deref()?;
        Some((vdev, &mut self.response))
    }

    pub fn is_released(&self) -> bool {
        self.vdev.is_none()
    }

    /// Drops the vdev reference and leaves the roam command outstanding for the next
    /// indication of the cycle.
    pub fn detach(&mut self) -> bool {
        self.response.take();
        self.vdev.take().is_some()
    }

    /// Undoes the cycle as `disposition` requires. Returns false if the cycle was already
    /// released.
    pub fn fail(
        &mut self,
        fin: &Finalizer<'_>,
        disposition: Disposition,
        reason: RoamStopReason,
    ) -> bool {
        let vdev = match self.vdev.take() {
            Some(vdev) => vdev,
            None => return false,
        };
        if let Some(mut response) = self.response.take() {
            response.resolve(ConnectStatus::Failure);
        }
        let (vdev_id, cm_id) = (self.vdev_id, self.cm_id);
        info!("vdev:{} cm_id:{} roam failed: {:?} {:?}", vdev_id, cm_id, disposition, reason);
        match disposition {
            Disposition::DisconnectAndAbort => {
                fin.cm_sink.send(CmRequest::Disconnect {
                    vdev_id,
                    reason: DisconnectReason::OperChannelBandChange,
                });
                fin.stop_and_abort(vdev_id, cm_id, reason);
            }
            Disposition::AbortOnly => fin.stop_and_abort(vdev_id, cm_id, reason),
            Disposition::PropagateOnly => {}
        }
        drop(vdev);
        true
    }

    /// Ends a successful cycle. Returns false if the cycle was already released.
    pub fn complete(&mut self, fin: &Finalizer<'_>) -> bool {
        let vdev = match self.vdev.take() {
            Some(vdev) => vdev,
            None => return false,
        };
        self.response.take();
        fin.remove_command(self.vdev_id, self.cm_id);
        drop(vdev);
        true
    }
}

impl Drop for RoamCycle {
    fn drop(&mut self) {
        if !self.is_released() {
            error!("vdev:{} cm_id:{} roam cycle dropped unresolved", self.vdev_id, self.cm_id);
        }
    }
}
