// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        buffer::{BufferProvider, IeBuf},
        error::Error,
        indication::{
            RoamSyncIndication, MAX_KCK_LEN, MAX_KEK_LEN, MAX_PMK_LEN, PMKID_LEN, REPLAY_CTR_LEN,
        },
        roam_cmd::CmId,
        security::{AuthStatus, KeyBuf},
        Ssid, VdevId,
    },
    wlan_common::{Bssid, MacAddr},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    Pending,
    Success,
    Failure,
}

/// Security and roam context handed to the upper layers with a roamed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoamingInfo {
    pub auth_status: AuthStatus,
    pub kck: KeyBuf<MAX_KCK_LEN>,
    pub kek: KeyBuf<MAX_KEK_LEN>,
    pub replay_ctr: [u8; REPLAY_CTR_LEN],
    /// Roam trigger, masked.
    pub roam_reason: u32,
    pub subnet_change_status: u8,
    pub pmk: KeyBuf<MAX_PMK_LEN>,
    pub pmkid: [u8; PMKID_LEN],
    pub update_erp_next_seq_num: bool,
    pub next_erp_seq_num: u16,
}

#[derive(Debug, PartialEq)]
pub struct FilsIes {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    pub hlp: IeBuf,
}

#[derive(Debug, PartialEq)]
pub struct ConnectIes {
    pub bcn_probe_rsp: IeBuf,
    pub assoc_req: IeBuf,
    pub assoc_rsp: IeBuf,
    pub fils: Option<FilsIes>,
}

/// Connect response for a roamed connection, shaped like one produced by a host-driven
/// reassociation.
#[derive(Debug, PartialEq)]
pub struct ConnectResponse {
    pub vdev_id: VdevId,
    pub cm_id: CmId,
    pub bssid: Bssid,
    pub ssid: Ssid,
    pub freq: u32,
    pub is_reassoc: bool,
    pub is_ft: bool,
    pub nss: u8,
    pub roaming_info: RoamingInfo,
    pub ies: ConnectIes,
    pub ric_resp_ie: IeBuf,
    pub tspec_ie: IeBuf,
    status: ConnectStatus,
}

impl ConnectResponse {
    /// Builds a response for `vdev_id` from a decoded indication. Either every IE buffer is
    /// allocated or none is held once this returns.
    pub fn assemble(
        ind: &RoamSyncIndication,
        vdev_id: VdevId,
        cm_id: CmId,
        ssid: Ssid,
        buffers: &BufferProvider,
    ) -> Result<Box<Self>, Error> {
        let ies = &ind.ies;
        let bcn_probe_rsp = buffers.copy_from(&ies.beacon_probe_resp[..])?;
        let assoc_req = buffers.copy_from(&ies.reassoc_req[..])?;
        let assoc_rsp = buffers.copy_from(&ies.reassoc_resp[..])?;
        let fils = match ies.hlp.as_ref() {
            Some(hlp) => Some(FilsIes {
                dst_mac: hlp.dst_mac,
                src_mac: hlp.src_mac,
                hlp: buffers.copy_from(&hlp.data[..])?,
            }),
            None => None,
        };
        let ric_resp_ie = buffers.copy_from(&ies.ric_data[..])?;
        let tspec_ie = buffers.copy_from(&ies.tspec_data[..])?;

        let keys = &ind.keys;
        Ok(Box::new(ConnectResponse {
            vdev_id,
            cm_id,
            bssid: ind.bssid,
            ssid,
            freq: ind.chan_freq,
            is_reassoc: true,
            is_ft: ind.is_ft_im_roam,
            nss: ind.nss,
            roaming_info: RoamingInfo {
                auth_status: ind.auth_status,
                kck: keys.kck.clone(),
                kek: keys.kek.clone(),
                replay_ctr: keys.replay_ctr,
                roam_reason: ind.masked_roam_reason(),
                subnet_change_status: ind.subnet_change_status(),
                pmk: keys.pmk.clone(),
                pmkid: keys.pmkid,
                update_erp_next_seq_num: ind.fils.update_erp_next_seq_num,
                next_erp_seq_num: ind.fils.next_erp_seq_num,
            },
            ies: ConnectIes { bcn_probe_rsp, assoc_req, assoc_rsp, fils },
            ric_resp_ie,
            tspec_ie,
            status: ConnectStatus::Pending,
        }))
    }

    pub fn status(&self) -> ConnectStatus {
        self.status
    }

    /// Resolves a pending response. Returns false and leaves the status alone if the
    /// response was already resolved.
    pub fn resolve(&mut self, status: ConnectStatus) -> bool {
        if self.status != ConnectStatus::Pending || status == ConnectStatus::Pending {
            return false;
        }
        self.status = status;
        true
    }
}
