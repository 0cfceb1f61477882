// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Types and helpers shared by the WLAN connection-manager crates.

pub mod buffer_reader;
pub mod channel;
pub mod format;
pub mod mac;

pub use mac::{Bssid, MacAddr};
