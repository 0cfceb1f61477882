// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {parking_lot::Mutex, std::collections::HashSet};

pub trait Regulatory: Send + Sync {
    fn is_disabled_for_freq(&self, freq: u32) -> bool;
}

pub trait PacketCapture: Send + Sync {
    fn is_active(&self) -> bool;
}

/// Regulatory view backed by an explicit list of disabled channel center frequencies.
#[derive(Debug, Default)]
pub struct ChannelList {
    disabled: Mutex<HashSet<u32>>,
}

impl ChannelList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(&self, freq: u32) {
        self.disabled.lock().insert(freq);
    }

    pub fn enable(&self, freq: u32) {
        self.disabled.lock().remove(&freq);
    }
}

impl Regulatory for ChannelList {
    fn is_disabled_for_freq(&self, freq: u32) -> bool {
        self.disabled.lock().contains(&freq)
    }
}
