// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Brings the PMKSA cache and the vdev's active PMK in line with the AP the firmware roamed
//! to, or arms the wait-for-key timer when the host still has to run the handshake.

use {
    crate::{
        connect_response::RoamingInfo,
        error::Error,
        objmgr::Vdev,
        pmksa::{PmksaCache, PmksaCacheEntry},
        roam_cmd::CmId,
        security::AuthStatus,
        timer::{EventId, Timer},
        VdevId,
    },
    log::{debug, error, info},
    parking_lot::Mutex,
    std::time::Duration,
    wlan_common::{format::MacFmt, Bssid},
};

/// Events scheduled on the roam sync timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEvent {
    WaitForKey { vdev_id: VdevId, cm_id: CmId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A cached PMKSA for the new AP became the active PMK.
    CachedPmk,
    /// The PMK carried by the indication became the active PMK and was cached.
    InsertedPmk,
    /// Keys are in place and no PMK needed updating.
    Ready,
    /// The host supplicant still has to install keys.
    WaitForKey(EventId),
}

pub struct KeyReconciler<'a> {
    pub pmksa: &'a dyn PmksaCache,
    pub timer: &'a Mutex<Timer<TimedEvent>>,
    pub wait_for_key_timeout: Duration,
}

impl KeyReconciler<'_> {
    /// `wait_for_key` holds the vdev's pending wait-for-key timer, if any, and is updated to
    /// match the outcome.
    pub fn reconcile_keys(
        &self,
        vdev: &Vdev,
        bssid: &Bssid,
        info: &RoamingInfo,
        cm_id: CmId,
        wait_for_key: &mut Option<EventId>,
    ) -> Result<KeyOutcome, Error> {
        let vdev_id = vdev.id();
        if vdev.pdev().is_none() {
            error!("vdev:{} cm_id:{} failed to find pdev", vdev_id, cm_id);
            return Err(Error::Lookup { vdev_id, object: "pdev" });
        }
        if vdev.psoc().is_none() {
            error!("vdev:{} cm_id:{} failed to find psoc", vdev_id, cm_id);
            return Err(Error::Lookup { vdev_id, object: "psoc" });
        }

        let (key_mgmt, mobility_domain_present) = {
            let state = vdev.state();
            (state.key_mgmt, state.mobility_domain_present)
        };

        // SAE and OWE roams cache the PMKSA before the indication arrives, so the cache is
        // consulted even if the handshake is not finished.
        if info.auth_status != AuthStatus::Authenticated && !key_mgmt.is_sae_or_owe() {
            if let Some(stale) = wait_for_key.take() {
                self.timer.lock().cancel_event(stale);
            }
            let event = TimedEvent::WaitForKey { vdev_id, cm_id };
            let event_id = self.timer.lock().schedule_after(self.wait_for_key_timeout, event);
            info!(
                "vdev:{} cm_id:{} waiting {:?} for keys from the supplicant",
                vdev_id, cm_id, self.wait_for_key_timeout
            );
            *wait_for_key = Some(event_id);
            return Ok(KeyOutcome::WaitForKey(event_id));
        }

        if let Some(pending) = wait_for_key.take() {
            self.timer.lock().cancel_event(pending);
        }

        debug!(
            "vdev:{} cm_id:{} looking up PMKID for {} akm {:?} mdie {}",
            vdev_id,
            cm_id,
            bssid.0.to_mac_string(),
            key_mgmt,
            mobility_domain_present
        );
        if let Some(cached) = self.pmksa.lookup(vdev_id, bssid) {
            debug!(
                "vdev:{} cm_id:{} PMKID found for {} len {}",
                vdev_id,
                cm_id,
                bssid.0.to_mac_string(),
                cached.pmk.len()
            );
            self.pmksa.set_psk_pmk(vdev_id, cached.pmk.as_slice());
            return Ok(KeyOutcome::CachedPmk);
        }
        debug!("vdev:{} cm_id:{} PMKID not found for {}", vdev_id, cm_id, bssid.0.to_mac_string());

        // FT roams share one PMK-R0 per mobility domain. Caching per BSSID would leave
        // duplicates behind.
        if key_mgmt.is_ft() || info.pmk.is_empty() {
            return Ok(KeyOutcome::Ready);
        }
        self.pmksa.set_psk_pmk(vdev_id, info.pmk.as_slice());
        self.pmksa.set_pmksa(
            vdev_id,
            PmksaCacheEntry { bssid: *bssid, pmk: info.pmk.clone(), pmkid: info.pmkid },
        );
        Ok(KeyOutcome::InsertedPmk)
    }
}
