// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::format::MacFmt,
    std::fmt,
    zerocopy::{
        byteorder::{LittleEndian, U16},
        AsBytes, FromBytes, FromZeroes, Unaligned,
    },
};

pub type MacAddr = [u8; 6];
pub const ZERO_ADDR: MacAddr = [0x00; 6];

#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[repr(C)]
pub struct Bssid(pub MacAddr);

impl Bssid {
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDR
    }
}

impl fmt::Debug for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bssid({})", self.0.to_mac_string())
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_mac_string())
    }
}

// IEEE Std 802.11-2016, 9.3.3.2
#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C)]
pub struct MgmtHdr {
    pub frame_ctrl: U16<LittleEndian>,
    pub duration: U16<LittleEndian>,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: U16<LittleEndian>,
}

/// Length of the fixed management frame header which precedes the body of (re)association
/// request and response frames.
pub const MGMT_HDR_LEN: usize = std::mem::size_of::<MgmtHdr>();
