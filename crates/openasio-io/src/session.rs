//! Driver session: the lifecycle state machine that owns one device.
//!
//! All control operations run on the caller's thread. While `Running`, the
//! session keeps only a join handle and shared atomics; the backend stream,
//! host callback and buffers belong to the dispatcher until the run ends.
//!
//! A run can end without a control call: the host callback returned `false`
//! or the device failed. [`Session::state`] reports `Stopped` as soon as the
//! dispatcher has exited. A device failure is surfaced once, as
//! [`Error::Device`], from the next control call, after the host has received
//! [`HostProcess::reset_request`].

use std::sync::Arc;

use openasio_core::{
    Capabilities, Error, Operation, Result, SessionState, StreamConfig, XrunCounters, XrunTotals,
    ensure_allowed,
};

use crate::backend::{AudioBackend, DeviceInfo, Latency};
use crate::dispatcher::{
    DispatchOutcome, DispatchShared, Dispatcher, DispatcherHandle, ExitReason, SpawnError,
};
use crate::host::HostProcess;

/// One driver instance bound to a backend and a host callback.
pub struct Session {
    backend: Box<dyn AudioBackend>,
    host: Option<Box<dyn HostProcess>>,
    state: SessionState,
    device: Option<DeviceInfo>,
    caps: Capabilities,
    config: Option<StreamConfig>,
    dispatcher: Option<DispatcherHandle>,
    shared: Arc<DispatchShared>,
    xruns: Arc<XrunCounters>,
    pending_fault: Option<Error>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.backend.name())
            .field("state", &self.state())
            .field("device", &self.device.as_ref().map(|d| d.name.as_str()))
            .field("caps", &self.caps)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// New session in [`SessionState::Created`].
    pub fn new(backend: Box<dyn AudioBackend>, host: Box<dyn HostProcess>) -> Self {
        Self {
            backend,
            host: Some(host),
            state: SessionState::Created,
            device: None,
            caps: Capabilities::NONE,
            config: None,
            dispatcher: None,
            shared: Arc::new(DispatchShared::default()),
            xruns: Arc::new(XrunCounters::new()),
            pending_fault: None,
        }
    }

    /// Current lifecycle state.
    ///
    /// Reports `Stopped` once a run has ended on its own, even before the
    /// next control call.
    pub fn state(&self) -> SessionState {
        if self.state == SessionState::Running && !self.shared.is_active() {
            SessionState::Stopped
        } else {
            self.state
        }
    }

    /// Description of the open device.
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Name of the backend this session drives.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Configuration of the current or last run, or the pending one.
    pub fn config(&self) -> Option<StreamConfig> {
        self.config
    }

    /// Cumulative xrun counts since the last `start`.
    pub fn xrun_totals(&self) -> XrunTotals {
        self.xruns.totals()
    }

    /// Periods delivered to the host since the last `start`.
    pub fn periods_processed(&self) -> u64 {
        self.shared.periods()
    }

    // ------------------------------------------------------------------
    // Control operations
    // ------------------------------------------------------------------

    /// Names of every device the backend can open.
    pub fn query_devices(&mut self) -> Result<Vec<String>> {
        self.enter(Operation::QueryDevices)?;
        Ok(self
            .backend
            .list_devices()?
            .into_iter()
            .map(|d| d.name)
            .collect())
    }

    /// Claims a device and fixes the session's capabilities.
    ///
    /// `None`, `""` and `"default"` select the default device.
    pub fn open(&mut self, name: Option<&str>) -> Result<u32> {
        self.enter(Operation::Open)?;
        let info = self.backend.open_device(name)?;
        self.caps = info.capabilities();
        tracing::info!(
            backend = self.backend.name(),
            device = %info.name,
            id = info.id,
            caps = %self.caps,
            "device opened"
        );
        let id = info.id;
        self.device = Some(info);
        self.state = self.state.after(Operation::Open);
        Ok(id)
    }

    /// Releases the device. Terminal.
    pub fn close(&mut self) -> Result<()> {
        self.enter(Operation::Close)?;
        self.release_device();
        self.state = self.state.after(Operation::Close);
        Ok(())
    }

    /// Capabilities of the open device. Fixed for the session's lifetime.
    pub fn get_caps(&self) -> Result<Capabilities> {
        ensure_allowed(Operation::GetCaps, self.state())?;
        Ok(self.caps)
    }

    /// Configuration the device would run without customization.
    pub fn get_default_config(&self) -> Result<StreamConfig> {
        ensure_allowed(Operation::GetDefaultConfig, self.state())?;
        Ok(self.open_device()?.default_config())
    }

    /// Negotiated configuration.
    pub fn get_config(&self) -> Result<StreamConfig> {
        ensure_allowed(Operation::GetConfig, self.state())?;
        self.config
            .ok_or_else(|| Error::Generic("no configuration recorded".into()))
    }

    /// Validates and records `config` without starting.
    pub fn configure(&mut self, config: &StreamConfig) -> Result<()> {
        self.enter(Operation::Configure)?;
        let negotiated = self.open_device()?.negotiate(config)?;
        self.apply_config(negotiated);
        Ok(())
    }

    /// Negotiates `config` and launches the dispatcher.
    ///
    /// On error the state, recorded config, xrun totals, period count and
    /// host callback are left as they were.
    pub fn start(&mut self, config: &StreamConfig) -> Result<()> {
        self.enter(Operation::Start)?;
        let device = self.open_device()?.clone();
        let negotiated = device.negotiate(config)?;
        if negotiated != *config {
            tracing::debug!(requested = ?config, actual = ?negotiated, "config adjusted");
        }
        if self.host.is_none() {
            return Err(Error::backend("host callback is no longer available"));
        }

        let stream = self.backend.build_stream(&device, &negotiated)?;
        let Some(host) = self.host.take() else {
            return Err(Error::backend("host callback is no longer available"));
        };
        let dispatcher = Dispatcher::new(
            stream,
            host,
            negotiated,
            Arc::clone(&self.xruns),
            Arc::clone(&self.shared),
        );
        match dispatcher.spawn() {
            Ok(handle) => self.dispatcher = Some(handle),
            Err(SpawnError { error, host }) => {
                self.host = Some(host);
                return Err(error);
            }
        }
        self.config = Some(negotiated);
        self.state = self.state.after(Operation::Start);

        tracing::info!(
            device = %device.name,
            sample_rate = negotiated.sample_rate,
            buffer_frames = negotiated.buffer_frames,
            in_channels = negotiated.in_channels,
            out_channels = negotiated.out_channels,
            format = %negotiated.format,
            layout = %negotiated.layout,
            "stream started"
        );
        Ok(())
    }

    /// Signals the dispatcher and waits for it to exit.
    ///
    /// No host callback runs after this returns.
    pub fn stop(&mut self) -> Result<()> {
        self.enter(Operation::Stop)?;
        self.shared.request_stop();
        self.finish_run()?;
        self.take_fault()
    }

    /// Current latency.
    pub fn get_latency(&mut self) -> Result<Latency> {
        self.enter(Operation::GetLatency)?;
        let device = self.open_device()?;
        let config = self.config.unwrap_or_else(|| device.default_config());
        Ok(self.backend.latency(device, &config))
    }

    /// Changes the sample rate between runs.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        self.enter(Operation::SetSampleRate)?;
        if !self.caps.can_set_sample_rate() {
            return Err(Error::unsupported("device cannot change its sample rate"));
        }
        if sample_rate == 0 {
            return Err(Error::invalid_arg("sample rate must be non-zero"));
        }
        self.reconfigure(|cfg| cfg.with_sample_rate(sample_rate))
    }

    /// Changes the period size between runs. Out-of-range values are clamped.
    pub fn set_buffer_frames(&mut self, frames: u32) -> Result<()> {
        self.enter(Operation::SetBufferFrames)?;
        if !self.caps.can_set_buffer_frames() {
            return Err(Error::unsupported("device cannot change its period size"));
        }
        if frames == 0 {
            return Err(Error::invalid_arg("buffer frames must be non-zero"));
        }
        self.reconfigure(|cfg| cfg.with_buffer_frames(frames))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Reaps a finished run, surfaces a pending fault, then checks legality.
    fn enter(&mut self, op: Operation) -> Result<()> {
        if self.state == SessionState::Running && !self.shared.is_active() {
            self.finish_run()?;
        }
        self.take_fault()?;
        ensure_allowed(op, self.state)
    }

    fn take_fault(&mut self) -> Result<()> {
        match self.pending_fault.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Joins the dispatcher, reclaims the host and moves to `Stopped`.
    fn finish_run(&mut self) -> Result<()> {
        self.state = self.state.after(Operation::Stop);
        let Some(handle) = self.dispatcher.take() else {
            return Ok(());
        };
        let DispatchOutcome {
            mut host,
            reason,
            periods,
        } = handle.join()?;
        let totals = self.xruns.totals();

        match reason {
            ExitReason::DeviceFault(msg) => {
                tracing::warn!(periods, reason = msg, "stream stopped by device fault");
                host.reset_request();
                self.pending_fault = Some(Error::device(msg));
            }
            ExitReason::HostHalted => {
                tracing::info!(
                    periods,
                    underruns = totals.underruns,
                    overruns = totals.overruns,
                    "stream stopped by host"
                );
            }
            ExitReason::StopRequested => {
                tracing::info!(
                    periods,
                    underruns = totals.underruns,
                    overruns = totals.overruns,
                    "stream stopped"
                );
            }
        }
        self.host = Some(host);
        Ok(())
    }

    fn open_device(&self) -> Result<&DeviceInfo> {
        self.device
            .as_ref()
            .ok_or_else(|| Error::Generic("no device is open".into()))
    }

    fn apply_config(&mut self, config: StreamConfig) {
        let before = self.latency_for(self.config);
        self.config = Some(config);
        self.state = self.state.after(Operation::Configure);
        let after = self.latency_for(self.config);
        tracing::debug!(
            sample_rate = config.sample_rate,
            buffer_frames = config.buffer_frames,
            "configuration recorded"
        );
        match (self.host.as_mut(), after) {
            (Some(host), Some(latency)) if before != after => {
                host.latency_changed(latency.input_frames, latency.output_frames);
            }
            _ => {}
        }
    }

    fn reconfigure(&mut self, change: impl FnOnce(StreamConfig) -> StreamConfig) -> Result<()> {
        let device = self.open_device()?;
        let base = self.config.unwrap_or_else(|| device.default_config());
        let negotiated = device.negotiate(&change(base))?;
        self.apply_config(negotiated);
        Ok(())
    }

    fn latency_for(&self, config: Option<StreamConfig>) -> Option<Latency> {
        let device = self.device.as_ref()?;
        let config = config.unwrap_or_else(|| device.default_config());
        Some(self.backend.latency(device, &config))
    }

    fn release_device(&mut self) {
        if let Some(device) = self.device.take() {
            match self.backend.close_device(device.id) {
                Ok(()) => tracing::info!(device = %device.name, "device closed"),
                Err(e) => tracing::warn!(device = %device.name, error = %e, "device close failed"),
            }
        }
        self.config = None;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.dispatcher.is_some() {
            self.shared.request_stop();
            if let Err(e) = self.finish_run() {
                tracing::warn!(error = %e, "dispatcher did not shut down cleanly");
            }
        }
        self.release_device();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AudioInput, AudioOutput, host_fn};
    use crate::simulated::{FaultPlan, Pacing, SimulatedBackend, SimulatedDevice};
    use std::sync::Mutex;

    fn silent_host() -> Box<dyn HostProcess> {
        Box::new(host_fn(
            |_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| true,
        ))
    }

    fn session(devices: Vec<SimulatedDevice>) -> Session {
        let backend = SimulatedBackend::new(devices).with_pacing(Pacing::Freewheel);
        Session::new(Box::new(backend), silent_host())
    }

    #[derive(Default)]
    struct Events {
        latency: Vec<(u32, u32)>,
        resets: u32,
    }

    struct Recorder(Arc<Mutex<Events>>);

    impl HostProcess for Recorder {
        fn process(
            &mut self,
            _: &AudioInput<'_>,
            _: &mut AudioOutput<'_>,
            _: u32,
            _: &openasio_core::TimeInfo,
            _: &StreamConfig,
        ) -> bool {
            true
        }

        fn latency_changed(&mut self, input_frames: u32, output_frames: u32) {
            self.0.lock().unwrap().latency.push((input_frames, output_frames));
        }

        fn reset_request(&mut self) {
            self.0.lock().unwrap().resets += 1;
        }
    }

    #[test]
    fn open_fixes_capabilities() {
        let mut s = session(vec![SimulatedDevice::duplex()]);
        assert!(matches!(s.get_caps(), Err(Error::State { .. })));
        assert_eq!(s.open(None).unwrap(), 0);
        let caps = s.get_caps().unwrap();
        assert!(caps.supports_full_duplex());
        assert!(caps.can_set_sample_rate());
        assert!(!caps.can_set_buffer_frames());
    }

    #[test]
    fn failed_open_leaves_state() {
        let mut s = session(vec![SimulatedDevice::output().busy()]);
        assert!(matches!(s.open(None), Err(Error::Device(_))));
        assert_eq!(s.state(), SessionState::Created);
    }

    #[test]
    fn configure_records_negotiated_config() {
        let mut s = session(vec![SimulatedDevice::output()]);
        s.open(None).unwrap();
        assert!(matches!(s.get_config(), Err(Error::State { .. })));
        let cfg = s.get_default_config().unwrap().with_buffer_frames(1 << 20);
        s.configure(&cfg).unwrap();
        assert_eq!(s.state(), SessionState::Configured);
        assert_eq!(s.get_config().unwrap().buffer_frames, 4096);
    }

    #[test]
    fn latency_is_period_plus_safety_offset() {
        let mut s = session(vec![SimulatedDevice::output()]);
        s.open(None).unwrap();
        let latency = s.get_latency().unwrap();
        assert_eq!(latency, Latency { input_frames: 0, output_frames: 256 + 32 });
    }

    #[test]
    fn set_buffer_frames_notifies_latency_change() {
        let events = Arc::new(Mutex::new(Events::default()));
        let backend = SimulatedBackend::with_default_devices().with_pacing(Pacing::Freewheel);
        let mut s = Session::new(Box::new(backend), Box::new(Recorder(Arc::clone(&events))));
        s.open(None).unwrap();
        s.set_buffer_frames(128).unwrap();
        s.set_sample_rate(44100).unwrap();
        assert_eq!(s.state(), SessionState::Configured);
        let cfg = s.get_config().unwrap();
        assert_eq!((cfg.sample_rate, cfg.buffer_frames), (44100, 128));
        assert_eq!(events.lock().unwrap().latency, vec![(0, 160)]);
    }

    #[test]
    fn unsupported_rate_is_rejected_without_side_effects() {
        let mut s = session(vec![SimulatedDevice::output()]);
        s.open(None).unwrap();
        assert!(matches!(s.set_sample_rate(12345), Err(Error::Unsupported(_))));
        assert_eq!(s.state(), SessionState::Opened);
    }

    #[test]
    fn device_fault_surfaces_once() {
        let events = Arc::new(Mutex::new(Events::default()));
        let device = SimulatedDevice::output().with_faults(FaultPlan::none().with_fatal_at(2));
        let backend = SimulatedBackend::new(vec![device]).with_pacing(Pacing::Freewheel);
        let mut s = Session::new(Box::new(backend), Box::new(Recorder(Arc::clone(&events))));
        s.open(None).unwrap();
        let cfg = s.get_default_config().unwrap();
        s.start(&cfg).unwrap();

        while s.state() == SessionState::Running {
            std::thread::yield_now();
        }
        assert!(matches!(s.get_latency(), Err(Error::Device(_))));
        assert_eq!(events.lock().unwrap().resets, 1);
        assert_eq!(s.periods_processed(), 2);
        assert!(s.get_latency().is_ok());
        assert!(matches!(s.stop(), Err(Error::State { .. })));
    }

    #[test]
    fn failed_start_keeps_previous_run() {
        let device = SimulatedDevice::duplex().with_faults(FaultPlan::none().with_input_overruns([0]));
        let backend = SimulatedBackend::new(vec![device]).with_pacing(Pacing::Freewheel);
        let mut calls = 0u32;
        let host = host_fn(move |_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| {
            calls += 1;
            calls < 3
        });
        let mut s = Session::new(Box::new(backend), Box::new(host));
        s.open(None).unwrap();
        let cfg = s.get_default_config().unwrap();
        s.start(&cfg).unwrap();
        while s.state() == SessionState::Running {
            std::thread::yield_now();
        }

        let bad = cfg.with_sample_rate(12345);
        assert!(matches!(s.start(&bad), Err(Error::Unsupported(_))));
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.periods_processed(), 3);
        assert_eq!(s.xrun_totals().overruns, 1);
        assert_eq!(s.get_config().unwrap(), cfg);

        // Same host: its fourth call halts the second run at once.
        s.start(&cfg).unwrap();
        while s.state() == SessionState::Running {
            std::thread::yield_now();
        }
        assert_eq!(s.periods_processed(), 1);
    }

    #[test]
    fn close_is_terminal() {
        let mut s = session(vec![SimulatedDevice::output()]);
        s.open(None).unwrap();
        s.close().unwrap();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(matches!(s.query_devices(), Err(Error::State { .. })));
        assert!(matches!(s.close(), Err(Error::State { .. })));
    }

    #[test]
    fn drop_while_running_releases_everything() {
        let backend = SimulatedBackend::with_default_devices().with_pacing(Pacing::Freewheel);
        let stats = backend.stats();
        let mut s = Session::new(Box::new(backend), silent_host());
        s.open(None).unwrap();
        let cfg = s.get_default_config().unwrap();
        s.start(&cfg).unwrap();
        drop(s);
        let periods = stats.periods();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(stats.periods(), periods);
    }
}
