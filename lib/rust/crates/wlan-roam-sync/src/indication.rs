// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Decoding of the roam synchronization indication the firmware emits once it has
//! reassociated with a new AP on its own.
//!
//! The indication is a fixed little-endian header followed by variable length regions. Each
//! region is described in the header by an `(offset, len)` pair relative to the start of the
//! buffer. The decoded [`RoamSyncIndication`] owns copies of every region so the raw buffer
//! can be released as soon as decoding finishes.

use {
    crate::{
        config::Capabilities,
        security::{AuthStatus, KeyBuf},
        VdevId,
    },
    std::mem::size_of,
    thiserror::Error,
    wlan_common::{
        buffer_reader::BufferReader,
        mac::{MacAddr, MgmtHdr, MGMT_HDR_LEN},
        Bssid,
    },
    zerocopy::{
        byteorder::{LittleEndian, U16, U32},
        AsBytes, FromBytes, FromZeroes, Unaligned,
    },
};

pub const MAX_KCK_LEN: usize = 32;
pub const MAX_KEK_LEN: usize = 64;
pub const MAX_PMK_LEN: usize = 64;
pub const PMKID_LEN: usize = 16;
pub const REPLAY_CTR_LEN: usize = 8;
pub const MAX_VDEV_MAC_ENTRIES: usize = 8;
pub const MAX_HLP_DATA_LEN: usize = 2048;

pub const ROAM_REASON_MASK: u32 = 0x0F;
pub const ROAM_REASON_STA_KICKOUT: u32 = 0x0F;
const ROAM_SUBNET_STATUS_MASK: u32 = 0x30;
const ROAM_SUBNET_STATUS_SHIFT: u32 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("indication of {have} bytes is shorter than its {need} byte header")]
    Truncated { need: usize, have: usize },
    #[error(
        "{field} region at offset {offset} with length {len} exceeds buffer of {buf_len} bytes"
    )]
    RegionOutOfBounds { field: &'static str, offset: usize, len: usize, buf_len: usize },
    #[error("{field} length {len} exceeds capacity {max}")]
    LengthOverflow { field: &'static str, len: usize, max: usize },
    #[error("mandatory field {0} is zero")]
    MissingField(&'static str),
    #[error("unsupported {field} value {value}")]
    UnsupportedValue { field: &'static str, value: u32 },
}

#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C)]
pub struct Region {
    pub offset: U32<LittleEndian>,
    pub len: U32<LittleEndian>,
}

impl Region {
    fn new(offset: usize, len: usize) -> Self {
        Self { offset: U32::new(offset as u32), len: U32::new(len as u32) }
    }
}

/// Fixed portion of the indication.
#[derive(FromZeroes, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct RoamSyncHeader {
    pub roamed_vdev_id: u8,
    pub auth_status: u8,
    pub is_ft_im_roam: u8,
    pub nss: u8,
    pub roam_reason: U32<LittleEndian>,
    pub bssid: Bssid,
    pub rssi: i8,
    pub update_erp_next_seq_num: u8,
    pub chan_freq: U32<LittleEndian>,
    pub kck_len: u8,
    pub kek_len: u8,
    pub pmk_len: u8,
    pub reserved0: u8,
    pub kck: [u8; MAX_KCK_LEN],
    pub kek: [u8; MAX_KEK_LEN],
    pub pmk: [u8; MAX_PMK_LEN],
    pub pmkid: [u8; PMKID_LEN],
    pub replay_ctr: [u8; REPLAY_CTR_LEN],
    pub next_erp_seq_num: U16<LittleEndian>,
    pub reserved1: [u8; 2],
    pub old_hw_mode_index: U32<LittleEndian>,
    pub new_hw_mode_index: U32<LittleEndian>,
    pub num_vdev_mac_entries: U32<LittleEndian>,
    pub vdev_mac_map_offset: U32<LittleEndian>,
    pub beacon_probe_resp: Region,
    pub reassoc_resp: Region,
    pub reassoc_req: Region,
    /// RIC data immediately followed by the TSPEC IE.
    pub ric_tspec_offset: U32<LittleEndian>,
    pub ric_data_len: U32<LittleEndian>,
    pub tspec_len: U32<LittleEndian>,
    pub hlp_dst_mac: MacAddr,
    pub hlp_src_mac: MacAddr,
    pub hlp: Region,
}

pub const ROAM_SYNC_HEADER_LEN: usize = size_of::<RoamSyncHeader>();

#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C)]
pub struct VdevMacMapEntry {
    pub vdev_id: U32<LittleEndian>,
    pub mac_id: U32<LittleEndian>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdevMacMapping {
    pub vdev_id: u32,
    pub mac_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HwModeTransition {
    pub old_hw_mode_index: u32,
    pub new_hw_mode_index: u32,
    pub vdev_mac_map: Vec<VdevMacMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlpInfo {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilsParams {
    pub update_erp_next_seq_num: bool,
    pub next_erp_seq_num: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub kck: KeyBuf<MAX_KCK_LEN>,
    pub kek: KeyBuf<MAX_KEK_LEN>,
    pub pmk: KeyBuf<MAX_PMK_LEN>,
    pub pmkid: [u8; PMKID_LEN],
    pub replay_ctr: [u8; REPLAY_CTR_LEN],
}

/// Information elements carried by the indication. Reassociation frames have their
/// management header stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicationIes {
    pub beacon_probe_resp: Vec<u8>,
    pub reassoc_req: Vec<u8>,
    pub reassoc_resp: Vec<u8>,
    pub ric_data: Vec<u8>,
    pub tspec_data: Vec<u8>,
    pub hlp: Option<HlpInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoamSyncIndication {
    pub roamed_vdev_id: VdevId,
    pub bssid: Bssid,
    pub chan_freq: u32,
    pub rssi: i8,
    pub nss: u8,
    pub roam_reason: u32,
    pub auth_status: AuthStatus,
    pub is_ft_im_roam: bool,
    pub keys: KeyMaterial,
    pub ies: IndicationIes,
    pub fils: FilsParams,
    pub hw_mode_transition: HwModeTransition,
}

impl RoamSyncIndication {
    pub fn parse(buf: &[u8], caps: &Capabilities) -> Result<Self, DecodeError> {
        let mut reader = BufferReader::new(buf);
        let hdr = reader
            .read::<RoamSyncHeader>()
            .ok_or(DecodeError::Truncated { need: ROAM_SYNC_HEADER_LEN, have: buf.len() })?
            .into_ref();

        let bssid = hdr.bssid;
        if bssid.is_zero() {
            return Err(DecodeError::MissingField("bssid"));
        }
        let chan_freq = hdr.chan_freq.get();
        if chan_freq == 0 {
            return Err(DecodeError::MissingField("chan_freq"));
        }
        let auth_status = AuthStatus::from_raw(hdr.auth_status).ok_or(
            DecodeError::UnsupportedValue { field: "auth_status", value: hdr.auth_status.into() },
        )?;

        let keys = KeyMaterial {
            kck: key_buf("kck", &hdr.kck, hdr.kck_len)?,
            kek: key_buf("kek", &hdr.kek, hdr.kek_len)?,
            pmk: key_buf("pmk", &hdr.pmk, hdr.pmk_len)?,
            pmkid: hdr.pmkid,
            replay_ctr: hdr.replay_ctr,
        };

        let beacon_probe_resp = region(buf, "beacon_probe_resp", hdr.beacon_probe_resp)?.to_vec();
        let reassoc_resp = reassoc_frame_body(buf, "reassoc_resp", hdr.reassoc_resp)?;
        let reassoc_req = reassoc_frame_body(buf, "reassoc_req", hdr.reassoc_req)?;

        let ric_len = hdr.ric_data_len.get() as usize;
        let tspec_len = hdr.tspec_len.get() as usize;
        let ric_tspec_len = ric_len.checked_add(tspec_len).ok_or(DecodeError::LengthOverflow {
            field: "ric_tspec",
            len: usize::MAX,
            max: buf.len(),
        })?;
        let ric_tspec_offset = hdr.ric_tspec_offset.get() as usize;
        let ric_tspec = bounded(buf, "ric_tspec", ric_tspec_offset, ric_tspec_len)?;
        let (ric, tspec) = ric_tspec.split_at(ric_len);
        let ric_data = ric.to_vec();
        let tspec_data = if caps.ese { tspec.to_vec() } else { Vec::new() };

        let hlp_len = hdr.hlp.len.get() as usize;
        if hlp_len > MAX_HLP_DATA_LEN {
            return Err(DecodeError::LengthOverflow {
                field: "hlp",
                len: hlp_len,
                max: MAX_HLP_DATA_LEN,
            });
        }
        let hlp_data = region(buf, "hlp", hdr.hlp)?;
        let hlp = if caps.fils && !hlp_data.is_empty() {
            Some(HlpInfo {
                dst_mac: hdr.hlp_dst_mac,
                src_mac: hdr.hlp_src_mac,
                data: hlp_data.to_vec(),
            })
        } else {
            None
        };
        let fils = if caps.fils {
            FilsParams {
                update_erp_next_seq_num: hdr.update_erp_next_seq_num != 0,
                next_erp_seq_num: hdr.next_erp_seq_num.get(),
            }
        } else {
            FilsParams::default()
        };

        let hw_mode_transition = HwModeTransition {
            old_hw_mode_index: hdr.old_hw_mode_index.get(),
            new_hw_mode_index: hdr.new_hw_mode_index.get(),
            vdev_mac_map: vdev_mac_map(
                buf,
                hdr.vdev_mac_map_offset.get() as usize,
                hdr.num_vdev_mac_entries.get() as usize,
            )?,
        };

        Ok(Self {
            roamed_vdev_id: hdr.roamed_vdev_id,
            bssid,
            chan_freq,
            rssi: hdr.rssi,
            nss: hdr.nss,
            roam_reason: hdr.roam_reason.get(),
            auth_status,
            is_ft_im_roam: hdr.is_ft_im_roam != 0,
            keys,
            ies: IndicationIes {
                beacon_probe_resp,
                reassoc_req,
                reassoc_resp,
                ric_data,
                tspec_data,
                hlp,
            },
            fils,
            hw_mode_transition,
        })
    }

    /// Serializes the indication into the layout `parse` accepts. Reassociation frames are
    /// written back behind a zeroed management header.
    pub fn encode(&self) -> Vec<u8> {
        let mut hdr = RoamSyncHeader::new_zeroed();
        hdr.roamed_vdev_id = self.roamed_vdev_id;
        hdr.auth_status = self.auth_status.into_raw();
        hdr.is_ft_im_roam = self.is_ft_im_roam.into();
        hdr.nss = self.nss;
        hdr.roam_reason = U32::new(self.roam_reason);
        hdr.bssid = self.bssid;
        hdr.rssi = self.rssi;
        hdr.update_erp_next_seq_num = self.fils.update_erp_next_seq_num.into();
        hdr.chan_freq = U32::new(self.chan_freq);
        hdr.kck_len = self.keys.kck.len() as u8;
        hdr.kek_len = self.keys.kek.len() as u8;
        hdr.pmk_len = self.keys.pmk.len() as u8;
        hdr.kck[..self.keys.kck.len()].copy_from_slice(self.keys.kck.as_slice());
        hdr.kek[..self.keys.kek.len()].copy_from_slice(self.keys.kek.as_slice());
        hdr.pmk[..self.keys.pmk.len()].copy_from_slice(self.keys.pmk.as_slice());
        hdr.pmkid = self.keys.pmkid;
        hdr.replay_ctr = self.keys.replay_ctr;
        hdr.next_erp_seq_num = U16::new(self.fils.next_erp_seq_num);
        hdr.old_hw_mode_index = U32::new(self.hw_mode_transition.old_hw_mode_index);
        hdr.new_hw_mode_index = U32::new(self.hw_mode_transition.new_hw_mode_index);

        let mut body = Vec::new();
        let mut append = |bytes: &[u8]| {
            let offset = ROAM_SYNC_HEADER_LEN + body.len();
            body.extend_from_slice(bytes);
            offset
        };

        let ies = &self.ies;
        hdr.beacon_probe_resp =
            Region::new(append(&ies.beacon_probe_resp[..]), ies.beacon_probe_resp.len());
        hdr.reassoc_resp = reassoc_region(&mut append, &ies.reassoc_resp[..]);
        hdr.reassoc_req = reassoc_region(&mut append, &ies.reassoc_req[..]);
        let ric_offset = append(&ies.ric_data[..]);
        append(&ies.tspec_data[..]);
        hdr.ric_tspec_offset = U32::new(ric_offset as u32);
        hdr.ric_data_len = U32::new(ies.ric_data.len() as u32);
        hdr.tspec_len = U32::new(ies.tspec_data.len() as u32);
        if let Some(hlp) = ies.hlp.as_ref() {
            hdr.hlp_dst_mac = hlp.dst_mac;
            hdr.hlp_src_mac = hlp.src_mac;
            hdr.hlp = Region::new(append(&hlp.data[..]), hlp.data.len());
        }
        let map = &self.hw_mode_transition.vdev_mac_map;
        let raw_map: Vec<u8> = map
            .iter()
            .flat_map(|entry| {
                VdevMacMapEntry { vdev_id: U32::new(entry.vdev_id), mac_id: U32::new(entry.mac_id) }
                    .as_bytes()
                    .to_vec()
            })
            .collect();
        let map_offset = append(&raw_map[..]);
        hdr.num_vdev_mac_entries = U32::new(map.len() as u32);
        hdr.vdev_mac_map_offset = U32::new(map_offset as u32);

        let mut buf = Vec::with_capacity(ROAM_SYNC_HEADER_LEN + body.len());
        buf.extend_from_slice(hdr.as_bytes());
        buf.extend_from_slice(&body[..]);
        buf
    }

    /// Roam trigger with the subnet status bits masked off.
    pub fn masked_roam_reason(&self) -> u32 {
        self.roam_reason & ROAM_REASON_MASK
    }

    pub fn is_sta_kickout(&self) -> bool {
        self.masked_roam_reason() == ROAM_REASON_STA_KICKOUT
    }

    pub fn subnet_change_status(&self) -> u8 {
        ((self.roam_reason & ROAM_SUBNET_STATUS_MASK) >> ROAM_SUBNET_STATUS_SHIFT) as u8
    }
}

fn key_buf<const N: usize>(
    field: &'static str,
    raw: &[u8; N],
    len: u8,
) -> Result<KeyBuf<N>, DecodeError> {
    let len = len as usize;
    if len > N {
        return Err(DecodeError::LengthOverflow { field, len, max: N });
    }
    KeyBuf::new(&raw[..len]).ok_or(DecodeError::LengthOverflow { field, len, max: N })
}

fn region<'a>(buf: &'a [u8], field: &'static str, r: Region) -> Result<&'a [u8], DecodeError> {
    bounded(buf, field, r.offset.get() as usize, r.len.get() as usize)
}

fn bounded<'a>(
    buf: &'a [u8],
    field: &'static str,
    offset: usize,
    len: usize,
) -> Result<&'a [u8], DecodeError> {
    if len == 0 {
        return Ok(&[]);
    }
    let out_of_bounds = DecodeError::RegionOutOfBounds { field, offset, len, buf_len: buf.len() };
    let end = offset.checked_add(len).ok_or(out_of_bounds.clone())?;
    buf.get(offset..end).ok_or(out_of_bounds)
}

fn reassoc_frame_body(buf: &[u8], field: &'static str, r: Region) -> Result<Vec<u8>, DecodeError> {
    if r.len.get() as usize <= MGMT_HDR_LEN {
        return Ok(Vec::new());
    }
    let frame = region(buf, field, r)?;
    Ok(frame[MGMT_HDR_LEN..].to_vec())
}

fn reassoc_region(append: &mut impl FnMut(&[u8]) -> usize, body: &[u8]) -> Region {
    if body.is_empty() {
        return Region::new(0, 0);
    }
    let offset = append(MgmtHdr::new_zeroed().as_bytes());
    append(body);
    Region::new(offset, MGMT_HDR_LEN + body.len())
}

fn vdev_mac_map(
    buf: &[u8],
    offset: usize,
    num_entries: usize,
) -> Result<Vec<VdevMacMapping>, DecodeError> {
    if num_entries > MAX_VDEV_MAC_ENTRIES {
        return Err(DecodeError::LengthOverflow {
            field: "vdev_mac_map",
            len: num_entries,
            max: MAX_VDEV_MAC_ENTRIES,
        });
    }
    let bytes = bounded(buf, "vdev_mac_map", offset, num_entries * size_of::<VdevMacMapEntry>())?;
    let mut reader = BufferReader::new(bytes);
    let entries = match reader.read_array::<VdevMacMapEntry>(num_entries) {
        Some(entries) => entries.into_slice(),
        None => &[],
    };
    Ok(entries
        .iter()
        .map(|e| VdevMacMapping { vdev_id: e.vdev_id.get(), mac_id: e.mac_id.get() })
        .collect())
}
