// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Drives a firmware roam through the host.
//!
//! A roam cycle spans two indications. The sync start indication tells the host the firmware
//! has left the current AP. The sync complete indication carries the new association, which
//! is turned into a connect response and committed to every subsystem that tracks the
//! connection. Each vdev runs at most one cycle at a time and its entry points are serialized
//! on the vdev's context lock. Different vdevs are independent.

use {
    crate::{
        buffer::BufferProvider,
        config::RoamSyncConfig,
        connect_response::{ConnectResponse, ConnectStatus},
        error::Error,
        finalize::{Disposition, Finalizer, RoamCycle},
        indication::RoamSyncIndication,
        objmgr::{ObjectManager, Vdev, VdevRef},
        pmksa::PmksaCache,
        reconcile::{KeyOutcome, KeyReconciler, TimedEvent},
        roam_cmd::{CmId, RoamCommandQueue},
        security::AuthStatus,
        services::{PacketCapture, Regulatory},
        sink::{CmSink, InfoSink, UnboundedSink},
        sm::{CmEvent, StateMachineDelivery, VdevEvent},
        timer::{EventId, Scheduler, Timer},
        CmRequest, CmStream, DisconnectReason, InfoEvent, InfoStream, RejectReason, RejectSource,
        RoamState, RoamStateReason, RoamStopReason, ScanConnectionState, VdevId,
    },
    futures::channel::mpsc,
    log::{debug, error, info, warn},
    parking_lot::Mutex,
    std::{collections::HashMap, sync::Arc, time::Duration},
    wlan_common::{channel::is_5ghz_freq, format::MacFmt},
};

/// Progress of a vdev's roam cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    SyncRequested,
    SyncInProgress,
    KeysReconciled,
    StatePropagated,
    RsoRearmPending,
    Complete,
    Aborted,
}

impl CycleState {
    fn is_terminal(self) -> bool {
        matches!(self, CycleState::Complete | CycleState::Aborted)
    }

    fn can_transition_to(self, next: CycleState) -> bool {
        use CycleState::*;
        match (self, next) {
            (Idle, SyncRequested)
            | (SyncRequested, SyncInProgress)
            | (SyncInProgress, KeysReconciled)
            | (KeysReconciled, StatePropagated)
            | (StatePropagated, RsoRearmPending)
            | (RsoRearmPending, Complete) => true,
            (state, SyncRequested) => state.is_terminal(),
            // A roam command can be aborted at any point, including between cycles.
            (_, Aborted) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct VdevRoamCtx {
    state: CycleState,
    /// Pending wait-for-key timer. Set while the host supplicant owes the vdev its keys.
    wait_for_key: Option<EventId>,
}

impl VdevRoamCtx {
    fn advance(&mut self, vdev_id: VdevId, next: CycleState) -> Result<(), Error> {
        if !self.state.can_transition_to(next) {
            return Err(Error::UnexpectedIndication { vdev_id, state: self.state });
        }
        debug!("vdev:{} roam cycle {:?} -> {:?}", vdev_id, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Collaborators the roam sync core queries synchronously.
pub struct Services {
    pub objmgr: Arc<ObjectManager>,
    pub sm: Arc<dyn StateMachineDelivery>,
    pub pmksa: Arc<dyn PmksaCache>,
    pub regulatory: Arc<dyn Regulatory>,
    pub pkt_capture: Arc<dyn PacketCapture>,
    pub scheduler: Arc<dyn Scheduler>,
}

pub struct RoamSync {
    config: RoamSyncConfig,
    objmgr: Arc<ObjectManager>,
    sm: Arc<dyn StateMachineDelivery>,
    pmksa: Arc<dyn PmksaCache>,
    regulatory: Arc<dyn Regulatory>,
    pkt_capture: Arc<dyn PacketCapture>,
    commands: RoamCommandQueue,
    buffers: BufferProvider,
    timer: Mutex<Timer<TimedEvent>>,
    contexts: Mutex<HashMap<VdevId, Arc<Mutex<VdevRoamCtx>>>>,
    cm_sink: CmSink,
    info_sink: InfoSink,
}

impl RoamSync {
    pub fn new(config: RoamSyncConfig, services: Services) -> (Self, CmStream, InfoStream) {
        let (cm_sink, cm_stream) = mpsc::unbounded();
        let (info_sink, info_stream) = mpsc::unbounded();
        let buffers = BufferProvider::new(config.max_connect_rsp_bytes);
        (
            RoamSync {
                config,
                objmgr: services.objmgr,
                sm: services.sm,
                pmksa: services.pmksa,
                regulatory: services.regulatory,
                pkt_capture: services.pkt_capture,
                commands: RoamCommandQueue::new(),
                buffers,
                timer: Mutex::new(Timer::new(services.scheduler)),
                contexts: Mutex::new(HashMap::new()),
                cm_sink: UnboundedSink::new(cm_sink),
                info_sink: UnboundedSink::new(info_sink),
            },
            cm_stream,
            info_stream,
        )
    }

    /// Issues a roam command for the vdev. The firmware indications that follow resolve it.
    /// Refused while the vdev still has a command outstanding.
    pub fn enqueue_roam_command(&self, vdev_id: VdevId) -> Result<CmId, Error> {
        let cm_id = self.commands.enqueue(vdev_id).map_err(|e| {
            error!("vdev:{} {}", vdev_id, e);
            e
        })?;
        info!("vdev:{} cm_id:{} roam command queued", vdev_id, cm_id);
        Ok(cm_id)
    }

    pub fn cycle_state(&self, vdev_id: VdevId) -> CycleState {
        let ctx = self.contexts.lock().get(&vdev_id).cloned();
        ctx.map_or(CycleState::Idle, |ctx| ctx.lock().state)
    }

    pub fn is_waiting_for_key(&self, vdev_id: VdevId) -> bool {
        let ctx = self.contexts.lock().get(&vdev_id).cloned();
        ctx.map_or(false, |ctx| ctx.lock().wait_for_key.is_some())
    }

    pub fn buffers(&self) -> &BufferProvider {
        &self.buffers
    }

    /// The firmware has started a roam on its own.
    pub fn on_roam_sync_start(&self, vdev_id: VdevId, buf: &[u8]) -> Result<(), Error> {
        let vdev = self.resolve_vdev(vdev_id)?;
        let ctx = self.context(vdev_id);
        let mut ctx = ctx.lock();
        let cm_id = self.first_roam_cm_id(vdev_id)?;
        let mut cycle = RoamCycle::new(vdev, cm_id);
        let result = self.roam_sync_start(&mut ctx, &mut cycle, buf);
        self.conclude(&mut ctx, cycle, result, RoamStopReason::SyncStartFailed)
    }

    /// The firmware has reassociated and reports the new connection.
    pub fn on_roam_sync_complete(&self, vdev_id: VdevId, buf: &[u8]) -> Result<(), Error> {
        let vdev = self.resolve_vdev(vdev_id)?;
        let ctx = self.context(vdev_id);
        let mut ctx = ctx.lock();
        let cm_id = self.first_roam_cm_id(vdev_id)?;
        let mut cycle = RoamCycle::new(vdev, cm_id);
        let result = self.roam_sync_complete(&mut ctx, &mut cycle, buf);
        self.conclude(&mut ctx, cycle, result, RoamStopReason::SyncCompleteFailed)
    }

    /// The firmware gave up on a roam it had started, or the host wants it cancelled.
    pub fn on_roam_sync_abort_requested(&self, vdev_id: VdevId) -> Result<(), Error> {
        let vdev = self.resolve_vdev(vdev_id)?;
        let ctx = self.context(vdev_id);
        let mut ctx = ctx.lock();
        let cm_id = self.first_roam_cm_id(vdev_id)?;
        let mut cycle = RoamCycle::new(vdev, cm_id);
        info!("vdev:{} cm_id:{} roam abort requested in {:?}", vdev_id, cm_id, ctx.state);
        let reason = RoamStopReason::AbortRequested;
        self.abort_cycle(&mut ctx, &mut cycle, Disposition::AbortOnly, reason);
        Ok(())
    }

    /// The host supplicant installed the keys for the roamed connection.
    pub fn on_keys_installed(&self, vdev_id: VdevId) -> Result<(), Error> {
        let vdev = self.resolve_vdev(vdev_id)?;
        let ctx = self.context(vdev_id);
        let mut ctx = ctx.lock();
        let event_id = match ctx.wait_for_key.take() {
            Some(event_id) => event_id,
            None => {
                debug!("vdev:{} keys installed while not waiting for them", vdev_id);
                return Ok(());
            }
        };
        self.timer.lock().cancel_event(event_id);
        let bssid = vdev.state().bssid;
        info!("vdev:{} keys installed, link up with {}", vdev_id, bssid.0.to_mac_string());
        self.cm_sink.send(CmRequest::RoamStateChange {
            vdev_id,
            state: RoamState::RsoEnabled,
            reason: RoamStateReason::Connect,
        });
        self.info_sink.send(InfoEvent::LinkUp { vdev_id, bssid });
        Ok(())
    }

    /// A timer scheduled through the injected scheduler fired.
    pub fn on_timeout(&self, event_id: EventId) -> Result<(), Error> {
        let event = self.timer.lock().triggered(&event_id);
        match event {
            None => Ok(()),
            Some(TimedEvent::WaitForKey { vdev_id, cm_id }) => {
                let ctx = self.context(vdev_id);
                let mut ctx = ctx.lock();
                if ctx.wait_for_key != Some(event_id) {
                    return Ok(());
                }
                ctx.wait_for_key = None;
                let err = Error::WaitForKeyTimeout {
                    vdev_id,
                    timeout_ms: self.config.wait_for_key_timeout_ms,
                };
                error!("vdev:{} cm_id:{} {}", vdev_id, cm_id, err);
                self.cm_sink
                    .send(CmRequest::Disconnect { vdev_id, reason: DisconnectReason::KeyTimeout });
                Err(err)
            }
        }
    }

    fn resolve_vdev(&self, vdev_id: VdevId) -> Result<VdevRef, Error> {
        self.objmgr.get_vdev_by_id(vdev_id).ok_or_else(|| {
            error!("vdev:{} vdev object is null", vdev_id);
            Error::NullReference(vdev_id)
        })
    }

    fn first_roam_cm_id(&self, vdev_id: VdevId) -> Result<CmId, Error> {
        match self.commands.first_roam_command(vdev_id) {
            Some(record) => Ok(record.cm_id),
            None => {
                error!("vdev:{} failed to find roam req from list", vdev_id);
                Err(Error::NoRoamRequest(vdev_id))
            }
        }
    }

    fn context(&self, vdev_id: VdevId) -> Arc<Mutex<VdevRoamCtx>> {
        let mut contexts = self.contexts.lock();
        let ctx = contexts.entry(vdev_id).or_insert_with(|| {
            Arc::new(Mutex::new(VdevRoamCtx { state: CycleState::Idle, wait_for_key: None }))
        });
        Arc::clone(ctx)
    }

    fn finalizer(&self) -> Finalizer<'_> {
        Finalizer {
            cm_sink: &self.cm_sink,
            info_sink: &self.info_sink,
            sm: self.sm.as_ref(),
            commands: &self.commands,
        }
    }

    fn conclude(
        &self,
        ctx: &mut VdevRoamCtx,
        mut cycle: RoamCycle,
        result: Result<(), Error>,
        stop_reason: RoamStopReason,
    ) -> Result<(), Error> {
        let err = match result {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        error!("vdev:{} cm_id:{} {}", cycle.vdev_id(), cycle.cm_id(), err);
        let disposition = Disposition::for_error(&err);
        let stop_reason = match err {
            Error::DisabledChannel(_) => RoamStopReason::DisabledChannel,
            _ => stop_reason,
        };
        self.abort_cycle(ctx, &mut cycle, disposition, stop_reason);
        Err(err)
    }

    fn abort_cycle(
        &self,
        ctx: &mut VdevRoamCtx,
        cycle: &mut RoamCycle,
        disposition: Disposition,
        stop_reason: RoamStopReason,
    ) {
        if disposition != Disposition::PropagateOnly {
            if let Some(event_id) = ctx.wait_for_key.take() {
                self.timer.lock().cancel_event(event_id);
            }
            if let Err(e) = ctx.advance(cycle.vdev_id(), CycleState::Aborted) {
                warn!("vdev:{} cm_id:{} {}", cycle.vdev_id(), cycle.cm_id(), e);
            }
        }
        cycle.fail(&self.finalizer(), disposition, stop_reason);
    }

    fn roam_sync_start(
        &self,
        ctx: &mut VdevRoamCtx,
        cycle: &mut RoamCycle,
        buf: &[u8],
    ) -> Result<(), Error> {
        let (vdev_id, cm_id) = (cycle.vdev_id(), cycle.cm_id());
        ctx.advance(vdev_id, CycleState::SyncRequested)?;
        let (vdev, _) = cycle.resources().ok_or(Error::NullReference(vdev_id))?;
        check_parents(vdev)?;
        let ind = RoamSyncIndication::parse(buf, &self.config.capabilities)?;
        if ind.roamed_vdev_id != vdev_id {
            warn!("vdev:{} cm_id:{} indication names vdev {}", vdev_id, cm_id, ind.roamed_vdev_id);
        }

        self.sm.deliver_cm_event(vdev_id, CmEvent::RoamSync { cm_id })?;
        ctx.advance(vdev_id, CycleState::SyncInProgress)?;

        let (old_bssid, old_ssid, old_freq) = {
            let state = vdev.state();
            (state.bssid, state.ssid.clone(), state.chan_freq)
        };
        info!(
            "vdev:{} cm_id:{} roam sync started from {} reason {:#x}",
            vdev_id,
            cm_id,
            old_bssid.0.to_mac_string(),
            ind.masked_roam_reason()
        );
        self.cm_sink.send(CmRequest::BlocklistMarkDisconnected { bssid: old_bssid });
        if ind.is_sta_kickout() {
            self.cm_sink.send(CmRequest::BlocklistAddReject {
                bssid: old_bssid,
                reason: RejectReason::StaKickout,
                source: RejectSource::Driver,
            });
        }
        self.cm_sink.send(CmRequest::ScanUpdateConnectionState {
            bssid: old_bssid,
            ssid: old_ssid,
            freq: old_freq,
            state: ScanConnectionState::None,
        });
        self.cm_sink.send(CmRequest::RoamStateChange {
            vdev_id,
            state: RoamState::SynchInProgress,
            reason: RoamStateReason::HandoffDone,
        });
        self.info_sink.send(InfoEvent::RoamSyncStarted { vdev_id, cm_id });

        self.sm.deliver_vdev_event(vdev_id, VdevEvent::Roam)?;
        cycle.detach();
        Ok(())
    }

    fn roam_sync_complete(
        &self,
        ctx: &mut VdevRoamCtx,
        cycle: &mut RoamCycle,
        buf: &[u8],
    ) -> Result<(), Error> {
        let (vdev_id, cm_id) = (cycle.vdev_id(), cycle.cm_id());
        if ctx.state != CycleState::SyncInProgress {
            return Err(Error::UnexpectedIndication { vdev_id, state: ctx.state });
        }
        let (vdev, slot) = cycle.resources().ok_or(Error::NullReference(vdev_id))?;
        check_parents(vdev)?;
        let ind = RoamSyncIndication::parse(buf, &self.config.capabilities)?;
        // The band may have been disabled after the firmware picked its candidate.
        if self.regulatory.is_disabled_for_freq(ind.chan_freq) {
            return Err(Error::DisabledChannel(ind.chan_freq));
        }

        let ssid = vdev.state().ssid.clone();
        let rsp =
            slot.insert(ConnectResponse::assemble(&ind, vdev_id, cm_id, ssid, &self.buffers)?);
        let bssid = rsp.bssid;

        self.cm_sink.send(CmRequest::ScanInformBeacon {
            bssid,
            freq: rsp.freq,
            rssi: ind.rssi,
            frame: rsp.ies.bcn_probe_rsp.to_vec(),
        });
        self.cm_sink.send(CmRequest::ScanUpdateConnectionState {
            bssid,
            ssid: rsp.ssid.clone(),
            freq: rsp.freq,
            state: ScanConnectionState::Associated,
        });

        let reconciler = KeyReconciler {
            pmksa: self.pmksa.as_ref(),
            timer: &self.timer,
            wait_for_key_timeout: Duration::from_millis(self.config.wait_for_key_timeout_ms),
        };
        let roaming_info = &rsp.roaming_info;
        match reconciler.reconcile_keys(vdev, &bssid, roaming_info, cm_id, &mut ctx.wait_for_key) {
            Ok(KeyOutcome::WaitForKey(_)) => {
                info!("vdev:{} cm_id:{} waiting for keys", vdev_id, cm_id)
            }
            Ok(outcome) => debug!("vdev:{} cm_id:{} keys {:?}", vdev_id, cm_id, outcome),
            Err(e) if !e.is_fatal() => warn!("vdev:{} cm_id:{} {}", vdev_id, cm_id, e),
            Err(e) => return Err(e),
        }
        ctx.advance(vdev_id, CycleState::KeysReconciled)?;

        self.propagate(vdev, rsp, &ind);
        ctx.advance(vdev_id, CycleState::StatePropagated)?;

        self.cm_sink.send(CmRequest::RoamSyncCompleteCmd { vdev_id });
        // The connection manager only leaves roaming once the vdev has, so a rejected vdev
        // event still aborts the roam.
        self.sm.deliver_vdev_event(vdev_id, VdevEvent::RoamDone)?;
        self.sm.deliver_cm_event(vdev_id, CmEvent::RoamDone { cm_id })?;
        ctx.advance(vdev_id, CycleState::RsoRearmPending)?;

        // Without keys the RSO is enabled once the supplicant finishes the handshake.
        let rso_state = match rsp.roaming_info.auth_status {
            AuthStatus::Authenticated => RoamState::RsoEnabled,
            AuthStatus::Connected => RoamState::Init,
        };
        self.cm_sink.send(CmRequest::RoamStateChange {
            vdev_id,
            state: rso_state,
            reason: RoamStateReason::Connect,
        });

        rsp.resolve(ConnectStatus::Success);
        self.info_sink.send(InfoEvent::ConnectComplete {
            vdev_id,
            cm_id,
            bssid,
            ssid: rsp.ssid.clone(),
            freq: rsp.freq,
            status: rsp.status(),
        });
        self.cm_sink.send(CmRequest::BlocklistConnectComplete { bssid });
        self.info_sink.send(InfoEvent::TdlsConnect { vdev_id });
        self.info_sink.send(InfoEvent::P2pConnect { vdev_id });
        if ctx.wait_for_key.is_none() {
            info!("vdev:{} cm_id:{} link up with {}", vdev_id, cm_id, bssid.0.to_mac_string());
            self.info_sink.send(InfoEvent::LinkUp { vdev_id, bssid });
        }
        self.info_sink.send(InfoEvent::RoamComplete { vdev_id, cm_id });

        ctx.advance(vdev_id, CycleState::Complete)?;
        cycle.complete(&self.finalizer());
        Ok(())
    }

    /// Commits the new association to the vdev and the connection tracking subsystems.
    fn propagate(&self, vdev: &Vdev, rsp: &ConnectResponse, ind: &RoamSyncIndication) {
        let vdev_id = vdev.id();
        let sae_single_pmk_ap = {
            let mut state = vdev.state();
            state.bssid = rsp.bssid;
            state.chan_freq = rsp.freq;
            state.sae_single_pmk_ap
        };

        self.cm_sink.send(CmRequest::PolicyUpdateConnectionTable { vdev_id, freq: rsp.freq });
        let hw = &ind.hw_mode_transition;
        self.cm_sink.send(CmRequest::PolicyHwModeTransition {
            old_hw_mode_index: hw.old_hw_mode_index,
            new_hw_mode_index: hw.new_hw_mode_index,
            vdev_mac_map: hw.vdev_mac_map.clone(),
        });
        self.cm_sink.send(CmRequest::SetSaeSinglePmkCap {
            vdev_id,
            enabled: self.config.sae_single_pmk_enabled && sae_single_pmk_ap,
        });
        if self.pkt_capture.is_active() {
            self.cm_sink.send(CmRequest::PktCaptureRecordChannel { vdev_id, freq: rsp.freq });
        }
        let disable_hi_rssi = is_5ghz_freq(rsp.freq);
        if disable_hi_rssi {
            debug!("vdev:{} disabling hi rssi, freq {} rssi {}", vdev_id, rsp.freq, ind.rssi);
        }
        self.cm_sink.send(CmRequest::SetDisableHiRssi { vdev_id, disable: disable_hi_rssi });
    }
}

fn check_parents(vdev: &Vdev) -> Result<(), Error> {
    if vdev.pdev().is_none() {
        return Err(Error::ObjectLookup { vdev_id: vdev.id(), object: "pdev" });
    }
    if vdev.psoc().is_none() {
        return Err(Error::ObjectLookup { vdev_id: vdev.id(), object: "psoc" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            config::Capabilities,
            indication::{DecodeError, VdevMacMapping},
            objmgr::VdevState,
            pmksa::InMemoryPmksaCache,
            security::KeyMgmt,
            services::ChannelList,
            sm::{CmState, DeliveryError, LocalStateMachines, MlmeState},
            test_utils::{
                fake_indication, fake_vdev_state, FakePacketCapture, BSSID_A, BSSID_B, SSID,
            },
            timer::FakeScheduler,
            Bssid,
        },
        assert_matches::assert_matches,
        std::sync::atomic::Ordering,
        test_case::test_case,
    };

    struct TestHelper {
        roam_sync: RoamSync,
        cm_stream: CmStream,
        info_stream: InfoStream,
        objmgr: Arc<ObjectManager>,
        sm: Arc<LocalStateMachines>,
        pmksa: Arc<InMemoryPmksaCache>,
        channels: Arc<ChannelList>,
        pkt_capture: Arc<FakePacketCapture>,
        scheduler: Arc<FakeScheduler>,
    }

    impl TestHelper {
        fn new() -> Self {
            Self::with_config(RoamSyncConfig::default())
        }

        fn with_config(config: RoamSyncConfig) -> Self {
            let objmgr = Arc::new(ObjectManager::new());
            objmgr.add_vdev(0, Some(0), Some(0), fake_vdev_state());
            let sm = Arc::new(LocalStateMachines::new());
            sm.set_connected(0);
            let pmksa = Arc::new(InMemoryPmksaCache::new());
            let channels = Arc::new(ChannelList::new());
            let pkt_capture = Arc::new(FakePacketCapture::default());
            let scheduler = FakeScheduler::new();
            let (roam_sync, cm_stream, info_stream) = RoamSync::new(
                config,
                Services {
                    objmgr: objmgr.clone(),
                    sm: sm.clone(),
                    pmksa: pmksa.clone(),
                    regulatory: channels.clone(),
                    pkt_capture: pkt_capture.clone(),
                    scheduler: scheduler.clone(),
                },
            );
            Self {
                roam_sync,
                cm_stream,
                info_stream,
                objmgr,
                sm,
                pmksa,
                channels,
                pkt_capture,
                scheduler,
            }
        }

        fn set_key_mgmt(&self, key_mgmt: KeyMgmt) {
            let vdev = self.objmgr.get_vdev_by_id(0).expect("vdev 0");
            vdev.state().key_mgmt = key_mgmt;
        }

        fn start(&self) -> Result<(), Error> {
            let ind = fake_indication(BSSID_B, 5180, AuthStatus::Authenticated);
            self.roam_sync.on_roam_sync_start(0, &ind.encode()[..])
        }

        fn complete(&self, ind: &RoamSyncIndication) -> Result<(), Error> {
            self.roam_sync.on_roam_sync_complete(0, &ind.encode()[..])
        }

        fn drain_cm_requests(&mut self) -> Vec<CmRequest> {
            std::iter::from_fn(|| self.cm_stream.try_next().ok().flatten()).collect()
        }

        fn drain_info_events(&mut self) -> Vec<InfoEvent> {
            std::iter::from_fn(|| self.info_stream.try_next().ok().flatten()).collect()
        }

        fn assert_released(&self) {
            assert_eq!(self.objmgr.ref_count(0), Some(0));
            assert_eq!(self.roam_sync.buffers().in_use(), 0);
        }
    }

    fn count<T>(items: &[T], pred: impl Fn(&T) -> bool) -> usize {
        items.iter().filter(|item| pred(item)).count()
    }

    #[test]
    fn cycle_state_transitions() {
        use CycleState::*;
        assert!(Idle.can_transition_to(SyncRequested));
        assert!(Complete.can_transition_to(SyncRequested));
        assert!(Aborted.can_transition_to(SyncRequested));
        assert!(!SyncInProgress.can_transition_to(SyncRequested));
        assert!(!SyncRequested.can_transition_to(KeysReconciled));
        assert!(!Complete.can_transition_to(KeysReconciled));
        assert!(KeysReconciled.can_transition_to(Aborted));
        assert!(Aborted.can_transition_to(Aborted));
    }

    #[test]
    fn sync_start_side_effects() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");

        assert_eq!(h.roam_sync.cycle_state(0), CycleState::SyncInProgress);
        assert_eq!(h.sm.cm_state(0), CmState::Roaming);
        assert_eq!(h.sm.mlme_state(0), MlmeState::Roaming);
        assert_eq!(
            h.drain_cm_requests(),
            vec![
                CmRequest::BlocklistMarkDisconnected { bssid: BSSID_A },
                CmRequest::ScanUpdateConnectionState {
                    bssid: BSSID_A,
                    ssid: SSID.to_vec(),
                    freq: 2437,
                    state: ScanConnectionState::None,
                },
                CmRequest::RoamStateChange {
                    vdev_id: 0,
                    state: RoamState::SynchInProgress,
                    reason: RoamStateReason::HandoffDone,
                },
            ]
        );
        assert_eq!(h.drain_info_events(), vec![InfoEvent::RoamSyncStarted { vdev_id: 0, cm_id }]);
        // The command stays queued for the completion.
        assert!(h.roam_sync.commands.is_pending(0));
        h.assert_released();
    }

    #[test]
    fn kickout_adds_old_ap_to_reject_list() {
        let mut h = TestHelper::new();
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        let mut ind = fake_indication(BSSID_B, 5180, AuthStatus::Authenticated);
        ind.roam_reason = 0x1F;
        h.roam_sync.on_roam_sync_start(0, &ind.encode()[..]).expect("roam sync start");
        let requests = h.drain_cm_requests();
        assert_eq!(requests[0], CmRequest::BlocklistMarkDisconnected { bssid: BSSID_A });
        assert_eq!(
            requests[1],
            CmRequest::BlocklistAddReject {
                bssid: BSSID_A,
                reason: RejectReason::StaKickout,
                source: RejectSource::Driver,
            }
        );
    }

    #[test]
    fn authenticated_roam_completes() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();
        h.drain_info_events();

        let ind = fake_indication(BSSID_B, 5180, AuthStatus::Authenticated);
        h.complete(&ind).expect("roam sync complete");

        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Complete);
        assert_eq!(h.sm.cm_state(0), CmState::Connected);
        assert_eq!(h.sm.mlme_state(0), MlmeState::Up);
        assert!(!h.roam_sync.is_waiting_for_key(0));
        assert!(h.scheduler.scheduled.lock().is_empty());
        assert!(!h.roam_sync.commands.is_pending(0));
        {
            let vdev = h.objmgr.get_vdev_by_id(0).expect("vdev 0");
            assert_eq!(vdev.state().bssid, BSSID_B);
            assert_eq!(vdev.state().chan_freq, 5180);
        }
        assert!(h.pmksa.lookup(0, &BSSID_B).is_some());

        assert_eq!(
            h.drain_cm_requests(),
            vec![
                CmRequest::ScanInformBeacon {
                    bssid: BSSID_B,
                    freq: 5180,
                    rssi: -55,
                    frame: ind.ies.beacon_probe_resp.clone(),
                },
                CmRequest::ScanUpdateConnectionState {
                    bssid: BSSID_B,
                    ssid: SSID.to_vec(),
                    freq: 5180,
                    state: ScanConnectionState::Associated,
                },
                CmRequest::PolicyUpdateConnectionTable { vdev_id: 0, freq: 5180 },
                CmRequest::PolicyHwModeTransition {
                    old_hw_mode_index: 1,
                    new_hw_mode_index: 2,
                    vdev_mac_map: vec![
                        VdevMacMapping { vdev_id: 0, mac_id: 0 },
                        VdevMacMapping { vdev_id: 1, mac_id: 1 },
                    ],
                },
                CmRequest::SetSaeSinglePmkCap { vdev_id: 0, enabled: false },
                CmRequest::SetDisableHiRssi { vdev_id: 0, disable: true },
                CmRequest::RoamSyncCompleteCmd { vdev_id: 0 },
                CmRequest::RoamStateChange {
                    vdev_id: 0,
                    state: RoamState::RsoEnabled,
                    reason: RoamStateReason::Connect,
                },
                CmRequest::BlocklistConnectComplete { bssid: BSSID_B },
            ]
        );
        assert_eq!(
            h.drain_info_events(),
            vec![
                InfoEvent::ConnectComplete {
                    vdev_id: 0,
                    cm_id,
                    bssid: BSSID_B,
                    ssid: SSID.to_vec(),
                    freq: 5180,
                    status: ConnectStatus::Success,
                },
                InfoEvent::TdlsConnect { vdev_id: 0 },
                InfoEvent::P2pConnect { vdev_id: 0 },
                InfoEvent::LinkUp { vdev_id: 0, bssid: BSSID_B },
                InfoEvent::RoamComplete { vdev_id: 0, cm_id },
                InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id },
            ]
        );
        h.assert_released();
    }

    #[test]
    fn unauthenticated_roam_waits_for_key() {
        let mut h = TestHelper::new();
        h.set_key_mgmt(KeyMgmt::IEEE8021X);
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();
        h.drain_info_events();

        let ind = fake_indication(BSSID_B, 2462, AuthStatus::Connected);
        h.complete(&ind).expect("roam sync complete");

        assert!(h.roam_sync.is_waiting_for_key(0));
        assert_eq!(h.scheduler.scheduled.lock().len(), 1);
        assert_eq!(h.scheduler.scheduled.lock()[0].1, Duration::from_millis(5000));
        let requests = h.drain_cm_requests();
        assert!(requests.contains(&CmRequest::RoamStateChange {
            vdev_id: 0,
            state: RoamState::Init,
            reason: RoamStateReason::Connect,
        }));
        assert!(requests.contains(&CmRequest::SetDisableHiRssi { vdev_id: 0, disable: false }));
        let events = h.drain_info_events();
        assert_eq!(count(&events, |e| matches!(e, InfoEvent::LinkUp { .. })), 0);
        assert!(h.pmksa.is_empty());
        h.assert_released();
    }

    #[test]
    fn keys_installed_after_wait_for_key() {
        let mut h = TestHelper::new();
        h.set_key_mgmt(KeyMgmt::IEEE8021X);
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 2462, AuthStatus::Connected))
            .expect("roam sync complete");
        h.drain_cm_requests();
        h.drain_info_events();
        let event_id = h.scheduler.scheduled.lock()[0].0;

        h.roam_sync.on_keys_installed(0).expect("keys installed");
        assert!(!h.roam_sync.is_waiting_for_key(0));
        assert_eq!(*h.scheduler.canceled.lock(), vec![event_id]);
        assert_eq!(
            h.drain_cm_requests(),
            vec![CmRequest::RoamStateChange {
                vdev_id: 0,
                state: RoamState::RsoEnabled,
                reason: RoamStateReason::Connect,
            }]
        );
        assert_eq!(h.drain_info_events(), vec![InfoEvent::LinkUp { vdev_id: 0, bssid: BSSID_B }]);

        // The canceled timer firing late is ignored.
        assert_eq!(h.roam_sync.on_timeout(event_id), Ok(()));
        assert!(h.drain_cm_requests().is_empty());
    }

    #[test]
    fn wait_for_key_timeout_disconnects() {
        let mut h = TestHelper::new();
        h.set_key_mgmt(KeyMgmt::IEEE8021X);
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 2462, AuthStatus::Connected))
            .expect("roam sync complete");
        h.drain_cm_requests();
        let event_id = h.scheduler.scheduled.lock()[0].0;

        assert_eq!(
            h.roam_sync.on_timeout(event_id),
            Err(Error::WaitForKeyTimeout { vdev_id: 0, timeout_ms: 5000 })
        );
        assert!(!h.roam_sync.is_waiting_for_key(0));
        assert_eq!(
            h.drain_cm_requests(),
            vec![CmRequest::Disconnect { vdev_id: 0, reason: DisconnectReason::KeyTimeout }]
        );
        // Fires at most once.
        assert_eq!(h.roam_sync.on_timeout(event_id), Ok(()));
    }

    #[test]
    fn scan_cache_old_bssid_cleared_before_new_associated() {
        let mut h = TestHelper::new();
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated))
            .expect("roam sync complete");
        let scan_updates: Vec<_> = h
            .drain_cm_requests()
            .into_iter()
            .filter(|r| matches!(r, CmRequest::ScanUpdateConnectionState { .. }))
            .collect();
        assert_eq!(
            scan_updates,
            vec![
                CmRequest::ScanUpdateConnectionState {
                    bssid: BSSID_A,
                    ssid: SSID.to_vec(),
                    freq: 2437,
                    state: ScanConnectionState::None,
                },
                CmRequest::ScanUpdateConnectionState {
                    bssid: BSSID_B,
                    ssid: SSID.to_vec(),
                    freq: 5180,
                    state: ScanConnectionState::Associated,
                },
            ]
        );
    }

    #[test]
    fn disabled_channel_disconnects_without_reconciling() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();
        h.drain_info_events();
        h.channels.disable(5500);

        let result = h.complete(&fake_indication(BSSID_B, 5500, AuthStatus::Authenticated));
        assert_eq!(result, Err(Error::DisabledChannel(5500)));

        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Aborted);
        assert!(h.pmksa.is_empty());
        assert!(h.scheduler.scheduled.lock().is_empty());
        assert_eq!(h.sm.cm_state(0), CmState::Disconnecting);
        assert_eq!(
            h.drain_cm_requests(),
            vec![
                CmRequest::Disconnect {
                    vdev_id: 0,
                    reason: DisconnectReason::OperChannelBandChange
                },
                CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::DisabledChannel },
            ]
        );
        assert_eq!(
            h.drain_info_events(),
            vec![InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id }]
        );
        h.assert_released();
    }

    #[test]
    fn missing_roam_request_is_distinguishable() {
        let mut h = TestHelper::new();
        let ind = fake_indication(BSSID_B, 5180, AuthStatus::Authenticated);
        assert_eq!(
            h.roam_sync.on_roam_sync_start(0, &ind.encode()[..]),
            Err(Error::NoRoamRequest(0))
        );
        assert_eq!(h.complete(&ind), Err(Error::NoRoamRequest(0)));
        assert_eq!(h.roam_sync.on_roam_sync_abort_requested(0), Err(Error::NoRoamRequest(0)));
        assert!(h.drain_cm_requests().is_empty());
        assert!(h.drain_info_events().is_empty());
        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Idle);
        h.assert_released();
    }

    #[test]
    fn unknown_vdev_is_null_reference() {
        let mut h = TestHelper::new();
        h.roam_sync.enqueue_roam_command(5).expect("enqueue");
        let ind = fake_indication(BSSID_B, 5180, AuthStatus::Authenticated);
        assert_eq!(
            h.roam_sync.on_roam_sync_start(5, &ind.encode()[..]),
            Err(Error::NullReference(5))
        );
        assert_eq!(h.roam_sync.on_keys_installed(5), Err(Error::NullReference(5)));
        assert!(h.drain_cm_requests().is_empty());
        assert!(h.roam_sync.commands.is_pending(5));
    }

    #[test]
    fn malformed_indication_aborts() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();
        h.drain_info_events();

        let result = h.roam_sync.on_roam_sync_complete(0, &[0u8; 10]);
        assert_matches!(result, Err(Error::Decode(DecodeError::Truncated { .. })));
        assert_eq!(
            h.drain_cm_requests(),
            vec![CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::SyncCompleteFailed }]
        );
        assert_eq!(
            h.drain_info_events(),
            vec![InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id }]
        );
        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Aborted);
        h.assert_released();
    }

    #[test]
    fn allocation_failure_aborts_and_frees() {
        let mut config = RoamSyncConfig::default();
        config.max_connect_rsp_bytes = 16;
        let mut h = TestHelper::with_config(config);
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();

        let result = h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated));
        assert_matches!(result, Err(Error::NoResources(_)));
        let requests = h.drain_cm_requests();
        assert_eq!(count(&requests, |r| matches!(r, CmRequest::RoamStop { .. })), 1);
        assert_eq!(
            count(&requests, |r| matches!(r, CmRequest::ScanUpdateConnectionState { .. })),
            0
        );
        assert!(!h.roam_sync.commands.is_pending(0));
        h.assert_released();
    }

    #[test]
    fn complete_without_start_is_unexpected() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        let result = h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated));
        assert_eq!(
            result,
            Err(Error::UnexpectedIndication { vdev_id: 0, state: CycleState::Idle })
        );
        assert_eq!(
            h.drain_cm_requests(),
            vec![CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::SyncCompleteFailed }]
        );
        assert_eq!(
            h.drain_info_events(),
            vec![InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id }]
        );
    }

    #[test]
    fn second_roam_command_is_refused() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        assert_eq!(
            h.roam_sync.enqueue_roam_command(0),
            Err(Error::RoamRequestPending { vdev_id: 0, cm_id })
        );
        assert!(h.drain_cm_requests().is_empty());

        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated))
            .expect("roam sync complete");
        let removed: Vec<_> = h
            .drain_info_events()
            .into_iter()
            .filter(|e| matches!(e, InfoEvent::RoamCommandRemoved { .. }))
            .collect();
        assert_eq!(removed, vec![InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id }]);
        assert!(!h.roam_sync.commands.is_pending(0));
        h.assert_released();
    }

    #[test]
    fn vdev_rejecting_roam_done_aborts_complete() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();
        h.drain_info_events();
        h.sm.deliver_vdev_event(0, VdevEvent::Down).expect("vdev down");

        let result = h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated));
        assert_matches!(
            result,
            Err(Error::Delivery(DeliveryError::Vdev { event: VdevEvent::RoamDone, .. }))
        );

        let requests = h.drain_cm_requests();
        assert_eq!(count(&requests, |r| matches!(r, CmRequest::RoamStop { .. })), 1);
        let complete_cmd = requests
            .iter()
            .position(|r| *r == CmRequest::RoamSyncCompleteCmd { vdev_id: 0 })
            .expect("roam sync complete command");
        let roam_stop =
            CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::SyncCompleteFailed };
        let stop = requests.iter().position(|r| *r == roam_stop).expect("roam stop");
        assert!(complete_cmd < stop);
        let events = h.drain_info_events();
        assert_eq!(count(&events, |e| matches!(e, InfoEvent::RoamCommandRemoved { .. })), 1);
        assert!(events.contains(&InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id }));
        assert_eq!(count(&events, |e| matches!(e, InfoEvent::RoamComplete { .. })), 0);

        // The connection manager never saw the roam finish, so the abort disconnects it.
        assert_eq!(h.sm.cm_state(0), CmState::Disconnecting);
        assert_eq!(h.sm.mlme_state(0), MlmeState::Init);
        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Aborted);
        h.assert_released();
    }

    #[test]
    fn state_machine_rejection_aborts_start() {
        let mut h = TestHelper::new();
        h.sm.deliver_vdev_event(0, VdevEvent::Down).expect("vdev down");
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");

        assert_matches!(h.start(), Err(Error::Delivery(_)));
        let requests = h.drain_cm_requests();
        assert_eq!(
            requests.last(),
            Some(&CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::SyncStartFailed })
        );
        assert_eq!(count(&requests, |r| matches!(r, CmRequest::RoamStop { .. })), 1);
        assert_eq!(
            h.drain_info_events(),
            vec![
                InfoEvent::RoamSyncStarted { vdev_id: 0, cm_id },
                InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id },
            ]
        );
        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Aborted);
        h.assert_released();
    }

    #[test]
    fn missing_pdev_aborts() {
        let mut h = TestHelper::new();
        h.objmgr.add_vdev(0, None, Some(0), fake_vdev_state());
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        assert_eq!(h.start(), Err(Error::ObjectLookup { vdev_id: 0, object: "pdev" }));
        assert_eq!(
            h.drain_cm_requests(),
            vec![CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::SyncStartFailed }]
        );
    }

    #[test]
    fn abort_requested_mid_cycle() {
        let mut h = TestHelper::new();
        let cm_id = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.drain_cm_requests();
        h.drain_info_events();

        h.roam_sync.on_roam_sync_abort_requested(0).expect("abort");
        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Aborted);
        assert_eq!(h.sm.cm_state(0), CmState::Disconnecting);
        assert_eq!(h.sm.mlme_state(0), MlmeState::Up);
        assert_eq!(
            h.drain_cm_requests(),
            vec![CmRequest::RoamStop { vdev_id: 0, reason: RoamStopReason::AbortRequested }]
        );
        assert_eq!(
            h.drain_info_events(),
            vec![InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id }]
        );
        // The late completion no longer has a command to resolve.
        assert_eq!(
            h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Connected)),
            Err(Error::NoRoamRequest(0))
        );
        h.assert_released();
    }

    #[test]
    fn new_cycle_after_complete() {
        let mut h = TestHelper::new();
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated))
            .expect("roam sync complete");
        h.drain_cm_requests();

        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        let ind = fake_indication(BSSID_A, 2412, AuthStatus::Authenticated);
        h.roam_sync.on_roam_sync_start(0, &ind.encode()[..]).expect("second roam sync start");
        // The previous target is now the AP being left.
        assert_eq!(
            h.drain_cm_requests()[0],
            CmRequest::BlocklistMarkDisconnected { bssid: BSSID_B }
        );
        h.complete(&ind).expect("second roam sync complete");
        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Complete);
        h.assert_released();
    }

    #[test]
    fn packet_capture_records_channel() {
        let mut h = TestHelper::new();
        h.pkt_capture.active.store(true, Ordering::Relaxed);
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated))
            .expect("roam sync complete");
        assert!(h
            .drain_cm_requests()
            .contains(&CmRequest::PktCaptureRecordChannel { vdev_id: 0, freq: 5180 }));
    }

    #[test_case(true, true, true ; "ap and config")]
    #[test_case(true, false, false ; "config disabled")]
    #[test_case(false, true, false ; "ap without single pmk")]
    fn sae_single_pmk(ap: bool, enabled: bool, expected: bool) {
        let mut config = RoamSyncConfig::default();
        config.sae_single_pmk_enabled = enabled;
        let mut h = TestHelper::with_config(config);
        h.objmgr.add_vdev(
            0,
            Some(0),
            Some(0),
            VdevState { sae_single_pmk_ap: ap, key_mgmt: KeyMgmt::SAE, ..fake_vdev_state() },
        );
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated))
            .expect("roam sync complete");
        assert!(h
            .drain_cm_requests()
            .contains(&CmRequest::SetSaeSinglePmkCap { vdev_id: 0, enabled: expected }));
    }

    #[test]
    fn disabled_capabilities_drop_optional_ies() {
        let mut config = RoamSyncConfig::default();
        config.capabilities = Capabilities { fils: false, ese: false };
        let h = TestHelper::with_config(config);
        h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        h.start().expect("roam sync start");
        let ind = fake_indication(BSSID_B, 5180, AuthStatus::Authenticated);
        h.complete(&ind).expect("roam sync complete");
        h.assert_released();
    }

    #[test]
    fn vdevs_roam_independently() {
        let mut h = TestHelper::new();
        h.objmgr.add_vdev(1, Some(0), Some(0), fake_vdev_state());
        h.sm.set_connected(1);
        let cm_id_0 = h.roam_sync.enqueue_roam_command(0).expect("enqueue");
        let cm_id_1 = h.roam_sync.enqueue_roam_command(1).expect("enqueue");

        let mut ind_1 = fake_indication(Bssid([0xcc; 6]), 2412, AuthStatus::Authenticated);
        ind_1.roamed_vdev_id = 1;
        h.start().expect("vdev 0 start");
        h.roam_sync.on_roam_sync_start(1, &ind_1.encode()[..]).expect("vdev 1 start");
        h.roam_sync.on_roam_sync_abort_requested(1).expect("vdev 1 abort");
        h.complete(&fake_indication(BSSID_B, 5180, AuthStatus::Authenticated))
            .expect("vdev 0 complete");

        assert_eq!(h.roam_sync.cycle_state(0), CycleState::Complete);
        assert_eq!(h.roam_sync.cycle_state(1), CycleState::Aborted);
        let removed: Vec<_> = h
            .drain_info_events()
            .into_iter()
            .filter(|e| matches!(e, InfoEvent::RoamCommandRemoved { .. }))
            .collect();
        assert_eq!(
            removed,
            vec![
                InfoEvent::RoamCommandRemoved { vdev_id: 1, cm_id: cm_id_1 },
                InfoEvent::RoamCommandRemoved { vdev_id: 0, cm_id: cm_id_0 },
            ]
        );
        assert_eq!(h.objmgr.ref_count(1), Some(0));
    }
}
