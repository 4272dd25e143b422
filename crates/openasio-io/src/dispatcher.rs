//! Real-time dispatcher.
//!
//! One dedicated thread per run. Each period it waits on the backend stream,
//! converts captured audio into the host's format and layout, invokes the host
//! callback, converts the result back and submits it.
//!
//! ## Real-Time Safety
//!
//! Every buffer is allocated in [`Dispatcher::new`] on the control thread.
//! The period loop does no allocation, locking, or logging; it communicates
//! with the session only through atomics in [`DispatchShared`] and
//! [`XrunCounters`].
//!
//! The stop flag is read before each wait and again just before the host
//! callback, so a stop requested while the thread sleeps in
//! [`BackendStream::wait_period`] never yields another callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

use openasio_core::{
    BufferAdapter, Error, Result, SampleBuffer, StreamConfig, TimingTracker, XrunCounters,
};

use crate::backend::{BackendStream, StreamError};
use crate::host::{AudioInput, AudioOutput, HostProcess};

/// Name of the dispatcher thread.
pub const THREAD_NAME: &str = "openasio-rt";

/// Flags shared between a session and its dispatcher.
#[derive(Debug, Default)]
pub struct DispatchShared {
    stop_requested: AtomicBool,
    active: AtomicBool,
    periods: AtomicU64,
}

impl DispatchShared {
    /// Asks the dispatcher to exit before its next period.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// True while the dispatcher loop is running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Periods delivered to the host in the current or last run.
    pub fn periods(&self) -> u64 {
        self.periods.load(Ordering::Relaxed)
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    fn arm(&self) {
        self.stop_requested.store(false, Ordering::Relaxed);
        self.periods.store(0, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }
}

/// Why a dispatcher run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The session asked it to stop.
    StopRequested,
    /// The host callback returned `false`.
    HostHalted,
    /// The backend reported an unrecoverable error.
    DeviceFault(&'static str),
}

/// What a finished run hands back to the session.
pub struct DispatchOutcome {
    /// The host callback, returned for the next run.
    pub host: Box<dyn HostProcess>,
    /// Why the loop exited.
    pub reason: ExitReason,
    /// Periods delivered to the host.
    pub periods: u64,
}

impl core::fmt::Debug for DispatchOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DispatchOutcome")
            .field("reason", &self.reason)
            .field("periods", &self.periods)
            .finish_non_exhaustive()
    }
}

/// A dispatcher thread that could not be started.
///
/// Carries the host callback back so the session can retry.
pub struct SpawnError {
    /// Why the thread could not be started.
    pub error: Error,
    /// The host callback, untouched.
    pub host: Box<dyn HostProcess>,
}

impl core::fmt::Debug for SpawnError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpawnError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

enum Period {
    Continue,
    Stop,
    Halt,
    Fault(&'static str),
}

/// Per-run state owned by the real-time thread.
pub struct Dispatcher {
    stream: Box<dyn BackendStream>,
    host: Box<dyn HostProcess>,
    config: StreamConfig,
    input: BufferAdapter,
    output: BufferAdapter,
    device_in: Vec<f32>,
    device_out: Vec<f32>,
    host_in: SampleBuffer,
    host_out: SampleBuffer,
    timing: TimingTracker,
    shared: Arc<DispatchShared>,
}

impl Dispatcher {
    /// Preallocates every buffer the run needs.
    ///
    /// Neither `xruns` nor `shared` is touched until [`Dispatcher::spawn`]
    /// succeeds.
    pub fn new(
        stream: Box<dyn BackendStream>,
        host: Box<dyn HostProcess>,
        config: StreamConfig,
        xruns: Arc<XrunCounters>,
        shared: Arc<DispatchShared>,
    ) -> Self {
        let input = BufferAdapter::for_input(&config);
        let output = BufferAdapter::for_output(&config);
        Self {
            stream,
            host,
            config,
            device_in: input.allocate_device_buffer(),
            device_out: output.allocate_device_buffer(),
            host_in: input.allocate_host_buffer(),
            host_out: output.allocate_host_buffer(),
            input,
            output,
            timing: TimingTracker::monotonic(xruns),
            shared,
        }
    }

    /// Runs the loop on a new [`THREAD_NAME`] thread.
    ///
    /// The thread is created first and receives the dispatcher once it
    /// exists. Counters are reset and `shared` is armed only then, so a
    /// failed spawn leaves both as they were and returns the host.
    pub fn spawn(self) -> core::result::Result<DispatcherHandle, SpawnError> {
        let (tx, rx) = mpsc::sync_channel::<Self>(1);
        let spawned = std::thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || rx.recv().ok().map(Self::run));
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                return Err(SpawnError {
                    error: Error::backend(format!("failed to spawn dispatcher thread: {e}")),
                    host: self.host,
                });
            }
        };

        self.timing.xruns().reset();
        self.shared.arm();
        let shared = Arc::clone(&self.shared);
        match tx.send(self) {
            Ok(()) => Ok(DispatcherHandle { thread }),
            Err(mpsc::SendError(dispatcher)) => {
                shared.active.store(false, Ordering::Release);
                Err(SpawnError {
                    error: Error::backend("dispatcher thread exited before starting"),
                    host: dispatcher.host,
                })
            }
        }
    }

    /// Runs periods until a stop request, a host halt, or a device fault.
    pub fn run(mut self) -> DispatchOutcome {
        let reason = loop {
            if self.shared.stop_requested() {
                break ExitReason::StopRequested;
            }
            match self.run_period() {
                Period::Continue => {}
                Period::Stop => break ExitReason::StopRequested,
                Period::Halt => break ExitReason::HostHalted,
                Period::Fault(msg) => break ExitReason::DeviceFault(msg),
            }
        };
        self.shared.active.store(false, Ordering::Release);
        DispatchOutcome {
            host: self.host,
            reason,
            periods: self.shared.periods(),
        }
    }

    #[inline]
    fn run_period(&mut self) -> Period {
        match self.stream.wait_period() {
            Ok(()) => {}
            Err(StreamError::Xrun) => self.timing.xruns().record_underrun(),
            Err(StreamError::Fatal(msg)) => return Period::Fault(msg),
        }

        if !self.input.is_empty() {
            match self.stream.read_input(&mut self.device_in) {
                Ok(()) => {}
                Err(StreamError::Xrun) => {
                    self.timing.xruns().record_overrun();
                    self.device_in.fill(0.0);
                }
                Err(StreamError::Fatal(msg)) => return Period::Fault(msg),
            }
            self.input
                .device_to_host(&self.device_in, self.host_in.as_samples_mut());
        }

        self.host_out.fill_silence();
        if self.shared.stop_requested() {
            return Period::Stop;
        }
        let time = self.timing.stamp(self.stream.device_time_ns());
        let frames = self.config.buffer_frames;

        let keep_going = {
            let input = AudioInput::new(
                self.host_in.as_samples(),
                self.input.channels(),
                self.input.frames(),
                self.input.layout(),
            );
            let mut output = AudioOutput::new(
                self.host_out.as_samples_mut(),
                self.output.channels(),
                self.output.frames(),
                self.output.layout(),
            );
            self.host
                .process(&input, &mut output, frames, &time, &self.config)
        };
        self.shared.periods.fetch_add(1, Ordering::Relaxed);

        if !keep_going {
            return Period::Halt;
        }

        if !self.output.is_empty() {
            self.output
                .host_to_device(self.host_out.as_samples(), &mut self.device_out);
            match self.stream.write_output(&self.device_out) {
                Ok(()) => {}
                Err(StreamError::Xrun) => self.timing.xruns().record_underrun(),
                Err(StreamError::Fatal(msg)) => return Period::Fault(msg),
            }
        }
        Period::Continue
    }
}

/// Join handle for a spawned dispatcher.
#[derive(Debug)]
pub struct DispatcherHandle {
    thread: JoinHandle<Option<DispatchOutcome>>,
}

impl DispatcherHandle {
    /// Waits for the thread and returns its outcome.
    pub fn join(self) -> Result<DispatchOutcome> {
        self.thread
            .join()
            .map_err(|_| Error::backend("dispatcher thread panicked"))?
            .ok_or_else(|| Error::backend("dispatcher thread never received its stream"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioBackend, DeviceInfo};
    use crate::host::host_fn;
    use crate::simulated::{FaultPlan, Pacing, SimulatedBackend, SimulatedDevice, ramp_sample};
    use openasio_core::{BufferLayout, SampleFormat, TimeInfo};
    use std::sync::Mutex;

    fn stream_for(
        device: SimulatedDevice,
        config: impl FnOnce(&DeviceInfo) -> StreamConfig,
    ) -> (Box<dyn BackendStream>, StreamConfig) {
        let mut backend = SimulatedBackend::new(vec![device]).with_pacing(Pacing::Freewheel);
        let info = backend.open_device(None).unwrap();
        let cfg = info.negotiate(&config(&info)).unwrap();
        (backend.build_stream(&info, &cfg).unwrap(), cfg)
    }

    fn dispatcher(
        stream: Box<dyn BackendStream>,
        host: Box<dyn HostProcess>,
        cfg: StreamConfig,
    ) -> (Dispatcher, Arc<XrunCounters>, Arc<DispatchShared>) {
        let xruns = Arc::new(XrunCounters::new());
        let shared = Arc::new(DispatchShared::default());
        let d = Dispatcher::new(stream, host, cfg, Arc::clone(&xruns), Arc::clone(&shared));
        (d, xruns, shared)
    }

    #[test]
    fn host_halt_ends_run_after_that_period() {
        let (stream, cfg) = stream_for(SimulatedDevice::output(), DeviceInfo::default_config);
        let mut calls = 0u64;
        let host = host_fn(move |_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| {
            calls += 1;
            calls < 5
        });
        let (d, _, shared) = dispatcher(stream, Box::new(host), cfg);
        let outcome = d.run();
        assert_eq!(outcome.reason, ExitReason::HostHalted);
        assert_eq!(outcome.periods, 5);
        assert!(!shared.is_active());
    }

    #[test]
    fn stop_request_is_seen_before_next_period() {
        let (stream, cfg) = stream_for(SimulatedDevice::output(), DeviceInfo::default_config);
        let xruns = Arc::new(XrunCounters::new());
        let shared = Arc::new(DispatchShared::default());
        let stopper = Arc::clone(&shared);
        let host = host_fn(move |_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| {
            stopper.request_stop();
            true
        });
        let d = Dispatcher::new(stream, Box::new(host), cfg, xruns, Arc::clone(&shared));
        let outcome = d.run();
        assert_eq!(outcome.reason, ExitReason::StopRequested);
        assert_eq!(outcome.periods, 1);
    }

    /// Stream that raises the stop flag while "asleep" in a given wait.
    struct StopDuringWait {
        inner: Box<dyn BackendStream>,
        shared: Arc<DispatchShared>,
        waits: u64,
        stop_on_wait: u64,
    }

    impl BackendStream for StopDuringWait {
        fn wait_period(&mut self) -> core::result::Result<(), StreamError> {
            self.waits += 1;
            let result = self.inner.wait_period();
            if self.waits == self.stop_on_wait {
                self.shared.request_stop();
            }
            result
        }

        fn read_input(&mut self, buffer: &mut [f32]) -> core::result::Result<(), StreamError> {
            self.inner.read_input(buffer)
        }

        fn write_output(&mut self, buffer: &[f32]) -> core::result::Result<(), StreamError> {
            self.inner.write_output(buffer)
        }
    }

    #[test]
    fn stop_during_wait_skips_that_period() {
        let (inner, cfg) = stream_for(SimulatedDevice::duplex(), DeviceInfo::default_config);
        let xruns = Arc::new(XrunCounters::new());
        let shared = Arc::new(DispatchShared::default());
        let stream = StopDuringWait {
            inner,
            shared: Arc::clone(&shared),
            waits: 0,
            stop_on_wait: 4,
        };
        let host = host_fn(|_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| true);
        let d = Dispatcher::new(Box::new(stream), Box::new(host), cfg, xruns, shared);
        let outcome = d.run();
        assert_eq!(outcome.reason, ExitReason::StopRequested);
        assert_eq!(outcome.periods, 3);
    }

    #[test]
    fn counters_untouched_until_spawn() {
        let (stream, cfg) = stream_for(SimulatedDevice::output(), DeviceInfo::default_config);
        let host = host_fn(|_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| false);
        let xruns = Arc::new(XrunCounters::new());
        let shared = Arc::new(DispatchShared::default());
        xruns.record_underrun();
        shared.periods.store(7, Ordering::Relaxed);
        shared.request_stop();

        let d = Dispatcher::new(stream, Box::new(host), cfg, Arc::clone(&xruns), Arc::clone(&shared));
        assert_eq!(xruns.totals().underruns, 1);
        assert_eq!(shared.periods(), 7);
        assert!(!shared.is_active());

        let outcome = d.spawn().unwrap().join().unwrap();
        assert_eq!(outcome.reason, ExitReason::HostHalted);
        assert_eq!(outcome.periods, 1);
        assert_eq!(xruns.totals().underruns, 0);
    }

    #[test]
    fn planar_i16_input_reaches_host() {
        let (stream, cfg) = stream_for(SimulatedDevice::duplex(), |info| {
            info.default_config()
                .with_buffer_frames(16)
                .with_format(SampleFormat::I16)
                .with_layout(BufferLayout::NonInterleaved)
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let host = host_fn(move |input: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| {
            sink.lock().unwrap().extend_from_slice(input.channel::<i16>(1).unwrap());
            false
        });
        let (d, _, _) = dispatcher(stream, Box::new(host), cfg);
        d.run();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 16);
        for (frame, &s) in seen.iter().enumerate() {
            assert_eq!(s, <i16 as openasio_core::Sample>::from_f32(ramp_sample(1, frame as u64)));
        }
    }

    #[test]
    fn xruns_are_reported_in_time_info() {
        let faults = FaultPlan::none()
            .with_input_overruns([0])
            .with_output_underruns([1]);
        let (stream, cfg) = stream_for(
            SimulatedDevice::duplex().with_faults(faults),
            DeviceInfo::default_config,
        );
        let times = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&times);
        let host = host_fn(
            move |input: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, time: &TimeInfo, _| {
                let silent = input.typed::<f32>().unwrap().iter().all(|&s| s == 0.0);
                let mut t = sink.lock().unwrap();
                t.push((*time, silent));
                t.len() < 4
            },
        );
        let (d, xruns, _) = dispatcher(stream, Box::new(host), cfg);
        d.run();

        let times = times.lock().unwrap();
        assert_eq!((times[0].0.overruns, times[0].1), (1, true));
        assert_eq!((times[1].0.underruns, times[1].0.overruns, times[1].1), (0, 0, false));
        assert_eq!(times[2].0.underruns, 1);
        assert!(!times[3].0.had_xrun());
        let totals = xruns.totals();
        assert_eq!((totals.underruns, totals.overruns), (1, 1));
        assert!(times.windows(2).all(|w| w[1].0.host_time_ns > w[0].0.host_time_ns));
    }

    #[test]
    fn device_fault_ends_run() {
        let (stream, cfg) = stream_for(
            SimulatedDevice::output().with_faults(FaultPlan::none().with_fatal_at(3)),
            DeviceInfo::default_config,
        );
        let host = host_fn(|_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| true);
        let (d, _, _) = dispatcher(stream, Box::new(host), cfg);
        let outcome = d.run();
        assert!(matches!(outcome.reason, ExitReason::DeviceFault(_)));
        assert_eq!(outcome.periods, 3);
    }

    #[test]
    fn spawned_dispatcher_joins() {
        let (stream, cfg) = stream_for(SimulatedDevice::output(), DeviceInfo::default_config);
        let on_rt_thread = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&on_rt_thread);
        let host = host_fn(move |_: &AudioInput<'_>, _: &mut AudioOutput<'_>, _, _, _| {
            flag.store(
                std::thread::current().name() == Some(THREAD_NAME),
                Ordering::Relaxed,
            );
            false
        });
        let (d, _, _) = dispatcher(stream, Box::new(host), cfg);
        let outcome = d.spawn().unwrap().join().unwrap();
        assert_eq!(outcome.reason, ExitReason::HostHalted);
        assert_eq!(outcome.periods, 1);
        assert!(on_rt_thread.load(Ordering::Relaxed));
    }
}
