// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Band classification of channel center frequencies, in MHz.

const BAND_2GHZ_MIN_FREQ: u32 = 2412;
const BAND_2GHZ_MAX_FREQ: u32 = 2484;
const BAND_5GHZ_MIN_FREQ: u32 = 4910;
const BAND_5GHZ_MAX_FREQ: u32 = 5885;
const BAND_6GHZ_MIN_FREQ: u32 = 5935;
const BAND_6GHZ_MAX_FREQ: u32 = 7115;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    TwoGhz,
    FiveGhz,
    SixGhz,
}

pub fn band_for_freq(freq: u32) -> Option<Band> {
    match freq {
        BAND_2GHZ_MIN_FREQ..=BAND_2GHZ_MAX_FREQ => Some(Band::TwoGhz),
        BAND_5GHZ_MIN_FREQ..=BAND_5GHZ_MAX_FREQ => Some(Band::FiveGhz),
        BAND_6GHZ_MIN_FREQ..=BAND_6GHZ_MAX_FREQ => Some(Band::SixGhz),
        _ => None,
    }
}

pub fn is_5ghz_freq(freq: u32) -> bool {
    band_for_freq(freq) == Some(Band::FiveGhz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_frequencies() {
        assert_eq!(band_for_freq(2437), Some(Band::TwoGhz));
        assert_eq!(band_for_freq(5180), Some(Band::FiveGhz));
        assert_eq!(band_for_freq(5955), Some(Band::SixGhz));
        assert_eq!(band_for_freq(0), None);
        assert!(is_5ghz_freq(5745));
        assert!(!is_5ghz_freq(2462));
        assert!(!is_5ghz_freq(6115));
    }
}
