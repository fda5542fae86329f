//! The half-duplex audio channel.
//!
//! [`Channel`] is the exclusive owner of the audio device. Every other
//! layer touches audio only through its operations, and the channel
//! enforces the discipline that makes a single acoustic path usable:
//!
//! - **Transmit gating** — while playing, captured samples are discarded
//!   so self-capture never bleeds into received data.
//! - **Echo guard** — for a window after any transmission ends, capture
//!   is still discarded, tolerating speaker ringing and the AD/DA
//!   pipeline's residual delay.
//! - **Silence-terminated receive** — a receive call returns once enough
//!   samples have arrived and the capture has gone quiet, bounding
//!   turnaround latency without cutting frames short.
//!
//! The capture callback never blocks and never calls protocol code: it
//! gates, then forwards chunks over a bounded queue (dropping on overflow
//! with a counter). The playback callback drains a shared sample queue
//! and emits silence on underrun. Glitches on either path corrupt
//! samples, corrupted samples fail CRC, and the transport retransmits —
//! the channel itself never tries to recover.

use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::resample::{LinearResampler, resample_linear};
use crate::wav::WavTap;
use crate::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Bounded capacity of the capture queue, in chunks.
const CAPTURE_QUEUE_CHUNKS: usize = 256;

/// Pad after the playback queue drains, covering device buffer latency.
const DRAIN_PAD: Duration = Duration::from_millis(50);

/// Poll interval while waiting for playback to drain or samples to arrive.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Timing and detection parameters of the channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelParams {
    /// Window after a transmission during which capture is discarded.
    pub echo_guard: Duration,
    /// Quiet time that terminates a receive.
    pub silence_duration: Duration,
    /// Minimum captured samples before a receive may return.
    pub min_samples: usize,
    /// RMS level below which the capture tail counts as silent.
    pub silence_threshold: f32,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            echo_guard: Duration::from_millis(80),
            silence_duration: Duration::from_millis(300),
            min_samples: 10_000,
            silence_threshold: 0.02,
        }
    }
}

/// Device selection and rates for opening a hardware channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    /// Timing and detection parameters.
    pub params: ChannelParams,
    /// Input device index, or `None` for the system default.
    pub input_device: Option<usize>,
    /// Output device index, or `None` for the system default.
    pub output_device: Option<usize>,
}

/// State shared with the real-time audio callbacks. All access is atomic;
/// the callbacks never lock.
#[derive(Debug)]
struct Shared {
    /// Raised for the duration of a playback.
    transmitting: AtomicBool,
    /// Echo-guard deadline, microseconds since `epoch`.
    guard_until_us: AtomicU64,
    /// Capture chunks dropped because the queue was full.
    overruns: AtomicU64,
    /// Playback callbacks that ran dry mid-transmission.
    underruns: AtomicU64,
    /// Process-local time origin for the atomic timestamps.
    epoch: Instant,
}

impl Shared {
    fn new() -> Self {
        Self {
            transmitting: AtomicBool::new(false),
            guard_until_us: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}

/// Whether a captured chunk may enter the receive buffer: not while
/// transmitting, and not inside the echo-guard window.
fn admit_capture(transmitting: bool, now_us: u64, guard_until_us: u64) -> bool {
    !transmitting && now_us >= guard_until_us
}

/// Push samples onto the playback queue and block until the output
/// callback has drained it, then pad for the device's own buffer.
fn push_and_drain(tx_queue: &Arc<Mutex<VecDeque<f32>>>, samples: Vec<f32>) {
    {
        let mut queue = tx_queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        queue.extend(samples);
    }
    loop {
        let remaining = tx_queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        if remaining == 0 {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    std::thread::sleep(DRAIN_PAD);
}

/// RMS level of a sample slice.
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

enum Mode {
    /// Real device: playback queue feeding the output stream, both stream
    /// handles kept alive.
    Hardware {
        tx_queue: Arc<Mutex<VecDeque<f32>>>,
        output_rate: u32,
        _streams: (StreamHandle, StreamHandle),
    },
    /// TX samples routed straight into our own capture buffer. With
    /// `audible`, also played on the real device.
    Loopback {
        audible: Option<(Arc<Mutex<VecDeque<f32>>>, u32, StreamHandle)>,
    },
    /// TX samples routed into a peer channel's capture buffer.
    Paired { peer: SyncSender<Vec<f32>> },
}

impl std::fmt::Debug for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Hardware { .. } => f.write_str("Hardware"),
            Mode::Loopback { audible } => {
                write!(f, "Loopback {{ audible: {} }}", audible.is_some())
            }
            Mode::Paired { .. } => f.write_str("Paired"),
        }
    }
}

/// The single owner of the audio path.
#[derive(Debug)]
pub struct Channel {
    mode: Mode,
    shared: Arc<Shared>,
    params: ChannelParams,
    /// Nominal modem sample rate; everything above the channel works at
    /// this rate regardless of the device's native rate.
    nominal_rate: u32,
    rx: Receiver<Vec<f32>>,
    /// Injection side of the capture queue (loopback and pairing).
    inject: SyncSender<Vec<f32>>,
    /// Capture-path resampler, device rate → nominal rate.
    rx_resampler: Option<LinearResampler>,
    /// Samples drained from the queue but not yet returned.
    pending: Vec<f32>,
    tap: Option<WavTap>,
}

impl Channel {
    /// Open a channel on real audio hardware.
    ///
    /// Capture starts immediately and runs continuously; playback is on
    /// demand. Fails if either stream cannot be built — the one fatal
    /// error class this layer has.
    pub fn open(backend: &dyn AudioBackend, config: &ChannelConfig, nominal_rate: u32) -> Result<Self> {
        let (inject, rx) = sync_channel(CAPTURE_QUEUE_CHUNKS);
        let shared = Arc::new(Shared::new());

        let in_cfg = BackendStreamConfig {
            sample_rate: nominal_rate,
            device_index: config.input_device,
            ..BackendStreamConfig::default()
        };
        let out_cfg = BackendStreamConfig {
            sample_rate: nominal_rate,
            device_index: config.output_device,
            ..BackendStreamConfig::default()
        };

        let input_rate = backend.actual_input_rate(&in_cfg)?;
        let output_rate = backend.actual_output_rate(&out_cfg)?;
        if input_rate != nominal_rate || output_rate != nominal_rate {
            tracing::info!(
                input_rate,
                output_rate,
                nominal_rate,
                "device rate differs from nominal, resampling"
            );
        }

        let capture_tx = inject.clone();
        let capture_shared = Arc::clone(&shared);
        let input_stream = backend.build_input_stream(
            &in_cfg,
            Box::new(move |data: &[f32]| {
                let now = capture_shared.now_us();
                let transmitting = capture_shared.transmitting.load(Ordering::Acquire);
                let guard = capture_shared.guard_until_us.load(Ordering::Acquire);
                if !admit_capture(transmitting, now, guard) {
                    return;
                }
                if capture_tx.try_send(data.to_vec()).is_err() {
                    capture_shared.overruns.fetch_add(1, Ordering::Relaxed);
                }
            }),
            Box::new(|err| tracing::warn!(error = err, "input stream error")),
        )?;

        let tx_queue: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let playback_queue = Arc::clone(&tx_queue);
        let playback_shared = Arc::clone(&shared);
        let output_stream = backend.build_output_stream(
            &out_cfg,
            Box::new(move |data: &mut [f32]| {
                let mut queue = playback_queue
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let mut ran_dry = false;
                for slot in data.iter_mut() {
                    *slot = match queue.pop_front() {
                        Some(sample) => sample,
                        None => {
                            ran_dry = true;
                            0.0
                        }
                    };
                }
                drop(queue);
                if ran_dry && playback_shared.transmitting.load(Ordering::Acquire) {
                    playback_shared.underruns.fetch_add(1, Ordering::Relaxed);
                }
            }),
            Box::new(|err| tracing::warn!(error = err, "output stream error")),
        )?;

        let rx_resampler = (input_rate != nominal_rate)
            .then(|| LinearResampler::new(input_rate, nominal_rate));

        Ok(Self {
            mode: Mode::Hardware {
                tx_queue,
                output_rate,
                _streams: (input_stream, output_stream),
            },
            shared,
            params: config.params,
            nominal_rate,
            rx,
            inject,
            rx_resampler,
            pending: Vec::new(),
            tap: None,
        })
    }

    /// Open a software loopback channel: `play` routes samples directly
    /// into this channel's own capture buffer, bypassing the transmit
    /// gate and echo guard. No audio hardware is touched.
    pub fn loopback(params: ChannelParams, nominal_rate: u32) -> Self {
        let (inject, rx) = sync_channel(CAPTURE_QUEUE_CHUNKS);
        Self {
            mode: Mode::Loopback { audible: None },
            shared: Arc::new(Shared::new()),
            params,
            nominal_rate,
            rx,
            inject,
            rx_resampler: None,
            pending: Vec::new(),
            tap: None,
        }
    }

    /// Loopback that additionally plays the samples on a real output
    /// device, so the transfer is audible while still being captured
    /// digitally.
    pub fn loopback_audible(
        backend: &dyn AudioBackend,
        config: &ChannelConfig,
        nominal_rate: u32,
    ) -> Result<Self> {
        let mut channel = Self::loopback(config.params, nominal_rate);

        let out_cfg = BackendStreamConfig {
            sample_rate: nominal_rate,
            device_index: config.output_device,
            ..BackendStreamConfig::default()
        };
        let output_rate = backend.actual_output_rate(&out_cfg)?;

        let tx_queue: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let playback_queue = Arc::clone(&tx_queue);
        let stream = backend.build_output_stream(
            &out_cfg,
            Box::new(move |data: &mut [f32]| {
                let mut queue = playback_queue
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                for slot in data.iter_mut() {
                    *slot = queue.pop_front().unwrap_or(0.0);
                }
            }),
            Box::new(|err| tracing::warn!(error = err, "output stream error")),
        )?;

        channel.mode = Mode::Loopback {
            audible: Some((tx_queue, output_rate, stream)),
        };
        Ok(channel)
    }

    /// Create two cross-connected software channels: what one plays, the
    /// other captures. This is the loopback harness for two-party tests
    /// without hardware.
    pub fn pair(params: ChannelParams, nominal_rate: u32) -> (Self, Self) {
        let mut a = Self::loopback(params, nominal_rate);
        let mut b = Self::loopback(params, nominal_rate);
        a.mode = Mode::Paired {
            peer: b.inject.clone(),
        };
        b.mode = Mode::Paired {
            peer: a.inject.clone(),
        };
        (a, b)
    }

    /// Attach a diagnostic WAV tap recording all TX and RX samples.
    pub fn set_tap(&mut self, tap: WavTap) {
        self.tap = Some(tap);
    }

    /// Detach the tap, returning it so the caller can finalize the files.
    pub fn take_tap(&mut self) -> Option<WavTap> {
        self.tap.take()
    }

    /// The nominal sample rate the protocol layers work at.
    pub fn sample_rate(&self) -> u32 {
        self.nominal_rate
    }

    /// The channel's timing parameters.
    pub fn params(&self) -> &ChannelParams {
        &self.params
    }

    /// Whether a playback is currently in progress.
    pub fn is_transmitting(&self) -> bool {
        self.shared.transmitting.load(Ordering::Acquire)
    }

    /// Capture chunks dropped due to queue overflow since open.
    pub fn overruns(&self) -> u64 {
        self.shared.overruns.load(Ordering::Relaxed)
    }

    /// Playback underruns observed since open.
    pub fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }

    /// Play samples, blocking until the last sample has left the device.
    ///
    /// In hardware mode the receive buffer is cleared before playback and
    /// again after, and the echo-guard deadline is stamped on completion.
    /// In loopback mode the samples go straight into the capture buffer;
    /// in paired mode, into the peer's.
    pub fn play(&mut self, samples: &[f32]) -> Result<()> {
        enum Plan {
            Hardware(Arc<Mutex<VecDeque<f32>>>, u32),
            Loopback(Option<(Arc<Mutex<VecDeque<f32>>>, u32)>),
            Paired(SyncSender<Vec<f32>>),
        }

        if let Some(tap) = &mut self.tap {
            tap.record_tx(samples)?;
        }

        let plan = match &self.mode {
            Mode::Hardware {
                tx_queue,
                output_rate,
                ..
            } => Plan::Hardware(Arc::clone(tx_queue), *output_rate),
            Mode::Loopback { audible } => Plan::Loopback(
                audible
                    .as_ref()
                    .map(|(queue, rate, _)| (Arc::clone(queue), *rate)),
            ),
            Mode::Paired { peer } => Plan::Paired(peer.clone()),
        };

        match plan {
            Plan::Hardware(tx_queue, output_rate) => {
                self.clear_receive_buffer();
                self.shared.transmitting.store(true, Ordering::Release);

                let device_samples = resample_linear(samples, self.nominal_rate, output_rate);
                push_and_drain(&tx_queue, device_samples);

                let guard_end =
                    self.shared.now_us() + self.params.echo_guard.as_micros() as u64;
                self.shared.guard_until_us.store(guard_end, Ordering::Release);
                self.shared.transmitting.store(false, Ordering::Release);
                self.clear_receive_buffer();
            }
            Plan::Loopback(audible) => {
                self.clear_receive_buffer();
                // Route TX samples into our own capture buffer instead of
                // the device; no gate, no guard, or we would discard our
                // own signal.
                let _ = self.inject.try_send(samples.to_vec());

                if let Some((tx_queue, output_rate)) = audible {
                    let device_samples =
                        resample_linear(samples, self.nominal_rate, output_rate);
                    push_and_drain(&tx_queue, device_samples);
                }
            }
            Plan::Paired(peer) => {
                let _ = peer.try_send(samples.to_vec());
            }
        }
        Ok(())
    }

    /// Discard everything captured so far.
    pub fn clear_receive_buffer(&mut self) {
        self.pending.clear();
        while self.rx.try_recv().is_ok() {}
    }

    /// Receive until the capture goes silent, using the channel's default
    /// minimum-sample and silence-duration parameters.
    pub fn receive_until_silence(&mut self, timeout: Duration) -> Result<Vec<f32>> {
        let min_samples = self.params.min_samples;
        let silence = self.params.silence_duration;
        self.receive_with(timeout, min_samples, silence)
    }

    /// Receive with explicit termination parameters.
    ///
    /// Returns once at least `min_samples` have been captured **and** the
    /// capture has gone quiet — either the trailing `silence_duration` of
    /// samples is below the silence threshold, or no new samples have
    /// arrived for that long (the loopback case, where the stream simply
    /// stops). When `timeout` elapses first, returns whatever arrived.
    pub fn receive_with(
        &mut self,
        timeout: Duration,
        min_samples: usize,
        silence_duration: Duration,
    ) -> Result<Vec<f32>> {
        let deadline = Instant::now() + timeout;
        let mut buf = std::mem::take(&mut self.pending);
        let mut last_arrival = Instant::now();
        let silence_samples =
            (silence_duration.as_secs_f64() * f64::from(self.nominal_rate)) as usize;

        loop {
            let mut arrived = false;
            while let Ok(chunk) = self.rx.try_recv() {
                self.absorb(chunk, &mut buf)?;
                arrived = true;
            }
            if arrived {
                last_arrival = Instant::now();
            }

            if buf.len() >= min_samples {
                let tail_quiet = buf.len() >= silence_samples
                    && rms(&buf[buf.len() - silence_samples..]) < self.params.silence_threshold;
                let stream_quiet = last_arrival.elapsed() >= silence_duration;
                if tail_quiet || stream_quiet {
                    return Ok(buf);
                }
            }

            if Instant::now() >= deadline {
                return Ok(buf);
            }

            if let Ok(chunk) = self.rx.recv_timeout(POLL_INTERVAL) {
                self.absorb(chunk, &mut buf)?;
                last_arrival = Instant::now();
            }
        }
    }

    /// Resample, tap, and append one captured chunk.
    fn absorb(&mut self, chunk: Vec<f32>, buf: &mut Vec<f32>) -> Result<()> {
        let chunk = match &mut self.rx_resampler {
            Some(resampler) => resampler.process(&chunk),
            None => chunk,
        };
        if let Some(tap) = &mut self.tap {
            tap.record_rx(&chunk)?;
        }
        buf.extend(chunk);
        Ok(())
    }
}
