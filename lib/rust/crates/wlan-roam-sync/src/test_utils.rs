// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        indication::{
            FilsParams, HlpInfo, HwModeTransition, IndicationIes, KeyMaterial,
            RoamSyncIndication, VdevMacMapping,
        },
        objmgr::VdevState,
        security::{AuthStatus, KeyBuf, KeyMgmt},
        services::PacketCapture,
    },
    std::sync::atomic::{AtomicBool, Ordering},
    wlan_common::Bssid,
};

pub const BSSID_A: Bssid = Bssid([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa]);
pub const BSSID_B: Bssid = Bssid([0xbb, 0xbb, 0xbb, 0xbb, 0xbb, 0xbb]);
pub const SSID: &[u8] = b"roam-ssid";

pub fn fake_vdev_state() -> VdevState {
    VdevState {
        bssid: BSSID_A,
        ssid: SSID.to_vec(),
        chan_freq: 2437,
        key_mgmt: KeyMgmt::PSK,
        mobility_domain_present: false,
        sae_single_pmk_ap: false,
    }
}

pub fn fake_indication(
    bssid: Bssid,
    chan_freq: u32,
    auth_status: AuthStatus,
) -> RoamSyncIndication {
    RoamSyncIndication {
        roamed_vdev_id: 0,
        bssid,
        chan_freq,
        rssi: -55,
        nss: 2,
        roam_reason: 0x03,
        auth_status,
        is_ft_im_roam: false,
        keys: KeyMaterial {
            kck: KeyBuf::new(&[0x11; 16]).expect("kck fits"),
            kek: KeyBuf::new(&[0x22; 16]).expect("kek fits"),
            pmk: KeyBuf::new(&[0x33; 32]).expect("pmk fits"),
            pmkid: [0x44; 16],
            replay_ctr: [0, 0, 0, 0, 0, 0, 0, 9],
        },
        ies: IndicationIes {
            beacon_probe_resp: fake_beacon(),
            reassoc_req: vec![
                0x31, 0x04, 0x0a, 0x00, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x00, 0x09,
            ]
            .into_iter()
            .chain(SSID.iter().copied())
            .collect(),
            reassoc_resp: vec![0x31, 0x04, 0x00, 0x00, 0x01, 0xc0, 0x01, 0x08, 0x82, 0x84, 0x8b],
            ric_data: vec![0x39, 0x04, 0x01, 0x00, 0x00, 0x00],
            tspec_data: vec![0xdd, 0x06, 0x00, 0x40, 0x96, 0x03, 0x01, 0x02],
            hlp: Some(HlpInfo {
                dst_mac: [0xff; 6],
                src_mac: [0x02, 0x00, 0x00, 0x00, 0x00, 0x01],
                data: vec![0x45, 0x00, 0x00, 0x1c, 0x00, 0x01, 0x00, 0x00, 0x40, 0x11],
            }),
        },
        fils: FilsParams { update_erp_next_seq_num: true, next_erp_seq_num: 7 },
        hw_mode_transition: HwModeTransition {
            old_hw_mode_index: 1,
            new_hw_mode_index: 2,
            vdev_mac_map: vec![
                VdevMacMapping { vdev_id: 0, mac_id: 0 },
                VdevMacMapping { vdev_id: 1, mac_id: 1 },
            ],
        },
    }
}

fn fake_beacon() -> Vec<u8> {
    #[rustfmt::skip]
    let mut beacon = vec![
        // timestamp
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        // beacon interval, capabilities
        0x64, 0x00, 0x11, 0x04,
        // ssid
        0x00, SSID.len() as u8,
    ];
    beacon.extend_from_slice(SSID);
    // supported rates
    beacon.extend_from_slice(&[0x01, 0x04, 0x82, 0x84, 0x8b, 0x96]);
    beacon
}

#[derive(Debug, Default)]
pub struct FakePacketCapture {
    pub active: AtomicBool,
}

impl PacketCapture for FakePacketCapture {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}
