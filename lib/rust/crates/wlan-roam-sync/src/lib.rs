// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Roam synchronization for firmware-driven roaming.
//!
//! When the firmware roams on its own it reports the new association in a single indication.
//! This crate decodes that indication, rebuilds the connect response the host would have
//! produced for a host-driven reassociation, reconciles key state, and brings the connection
//! manager, the vdev MLME and the surrounding subsystems in line with the new AP. Once a roam
//! command is resolved, every failure ends in a stopped roam and an aborted roam command.

pub mod buffer;
pub mod config;
pub mod connect_response;
pub mod error;
pub mod finalize;
pub mod indication;
pub mod objmgr;
pub mod pmksa;
pub mod reconcile;
pub mod roam_cmd;
pub mod roam_sync;
pub mod security;
pub mod services;
pub mod sink;
pub mod sm;
pub mod timer;

#[cfg(test)]
mod test_utils;

use {
    crate::{connect_response::ConnectStatus, indication::VdevMacMapping, roam_cmd::CmId},
    futures::channel::mpsc,
};

pub use {
    crate::{config::RoamSyncConfig, error::Error, roam_sync::RoamSync},
    wlan_common::{Bssid, MacAddr},
};

pub type VdevId = u8;
pub type Ssid = Vec<u8>;

/// Why the roam state of a vdev changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoamStateReason {
    HandoffDone,
    Connect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoamState {
    Init,
    RsoEnabled,
    SynchInProgress,
}

/// The stage of a roam cycle that failed and forced the firmware roam to be stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoamStopReason {
    SyncStartFailed,
    SyncCompleteFailed,
    DisabledChannel,
    AbortRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    StaKickout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectSource {
    Driver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanConnectionState {
    None,
    Associated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    OperChannelBandChange,
    KeyTimeout,
}

/// Requests to the subsystems surrounding the connection manager. None of them are
/// acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub enum CmRequest {
    BlocklistMarkDisconnected { bssid: Bssid },
    BlocklistAddReject { bssid: Bssid, reason: RejectReason, source: RejectSource },
    BlocklistConnectComplete { bssid: Bssid },
    ScanInformBeacon { bssid: Bssid, freq: u32, rssi: i8, frame: Vec<u8> },
    /// `ssid` and `freq` identify the scan entry along with `bssid`.
    ScanUpdateConnectionState {
        bssid: Bssid,
        ssid: Ssid,
        freq: u32,
        state: ScanConnectionState,
    },
    PolicyUpdateConnectionTable { vdev_id: VdevId, freq: u32 },
    PolicyHwModeTransition {
        old_hw_mode_index: u32,
        new_hw_mode_index: u32,
        vdev_mac_map: Vec<VdevMacMapping>,
    },
    SetSaeSinglePmkCap { vdev_id: VdevId, enabled: bool },
    PktCaptureRecordChannel { vdev_id: VdevId, freq: u32 },
    SetDisableHiRssi { vdev_id: VdevId, disable: bool },
    RoamStateChange { vdev_id: VdevId, state: RoamState, reason: RoamStateReason },
    RoamStop { vdev_id: VdevId, reason: RoamStopReason },
    RoamSyncCompleteCmd { vdev_id: VdevId },
    Disconnect { vdev_id: VdevId, reason: DisconnectReason },
}

/// Notifications for the layers above the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoEvent {
    RoamSyncStarted { vdev_id: VdevId, cm_id: CmId },
    ConnectComplete {
        vdev_id: VdevId,
        cm_id: CmId,
        bssid: Bssid,
        ssid: Ssid,
        freq: u32,
        status: ConnectStatus,
    },
    LinkUp { vdev_id: VdevId, bssid: Bssid },
    TdlsConnect { vdev_id: VdevId },
    P2pConnect { vdev_id: VdevId },
    RoamComplete { vdev_id: VdevId, cm_id: CmId },
    RoamCommandRemoved { vdev_id: VdevId, cm_id: CmId },
}

pub type CmStream = mpsc::UnboundedReceiver<CmRequest>;
pub type InfoStream = mpsc::UnboundedReceiver<InfoEvent>;
