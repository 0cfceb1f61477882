// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::mac::MacAddr;

pub trait MacFmt {
    fn to_mac_string(&self) -> String;
}

impl MacFmt for MacAddr {
    fn to_mac_string(&self) -> String {
        format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self[0], self[1], self[2], self[3], self[4], self[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mac_addr() {
        let mac: MacAddr = [0x00, 0x12, 0x48, 0x9a, 0xbc, 0xdf];
        assert_eq!(mac.to_mac_string(), "00:12:48:9a:bc:df");
    }
}
