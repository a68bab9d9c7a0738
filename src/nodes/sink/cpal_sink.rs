//! CPAL audio output sink

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfig};
use dasp_graph::{Buffer, Input};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::{EngineError, Result};
use crate::node::{sum_inputs, AudioNode, ProcessContext};

/// Playback progress shared between a [`CpalSink`] and its owner.
///
/// The device callback counts frames as it consumes them, which lets the
/// control thread render just far enough ahead of the speaker.
#[derive(Clone, Debug, Default)]
pub struct SinkMonitor {
    frames_consumed: Arc<AtomicU64>,
    had_underrun: Arc<AtomicBool>,
}

impl SinkMonitor {
    #[inline]
    pub fn frames_consumed(&self) -> u64 {
        self.frames_consumed.load(Ordering::Relaxed)
    }

    /// Check and clear the underrun flag
    pub fn check_underrun(&self) -> bool {
        self.had_underrun.swap(false, Ordering::Relaxed)
    }
}

/// A sink that outputs audio to a CPAL device
///
/// The CPAL stream runs on its own thread; this node feeds samples
/// into a ring buffer that the stream consumes.
pub struct CpalSink {
    buffer: Producer<f32>,
    channels: usize,
    monitor: SinkMonitor,
    closed: Arc<AtomicBool>,
    output_thread: std::thread::Thread,
}

impl CpalSink {
    /// Open an output stream on `device` and return the sink feeding it.
    ///
    /// Fails if the stream cannot be built or started.
    pub fn new(device: &cpal::Device, config: &SupportedStreamConfig) -> Result<Self> {
        let channels = config.channels() as usize;
        let sample_format = config.sample_format();
        let stream_config = config.config();
        let sample_rate = stream_config.sample_rate.0;

        // Ring buffer sized for ~100ms of audio to handle scheduling jitter
        let buffer_samples = ((sample_rate as f32 * 0.1) as usize) * channels;
        let buffer_size = buffer_samples.next_power_of_two().max(8192);
        let (producer, consumer) = RingBuffer::<f32>::new(buffer_size);

        let monitor = SinkMonitor::default();
        let stream_monitor = monitor.clone();

        // cpal streams are not Send on every platform, so the stream is built
        // and kept alive on a dedicated thread
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let device = device.clone();
        let closed = Arc::new(AtomicBool::new(false));
        let thread_closed = closed.clone();
        let output_thread = std::thread::Builder::new()
            .name("soundscape-output".into())
            .spawn(move || {
                let stream = match build_stream(&device, sample_format, &stream_config, consumer, stream_monitor) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(EngineError::Stream(e.to_string())));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(EngineError::Stream(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // The stream lives as long as this thread
                while !thread_closed.load(Ordering::Acquire) {
                    std::thread::park();
                }
                tracing::debug!("output stream closed");
            })?;

        ready_rx
            .recv()
            .map_err(|_| EngineError::Stream("output thread exited before the stream started".into()))??;

        tracing::info!(channels, sample_rate, ?sample_format, "output stream started");

        Ok(Self {
            buffer: producer,
            channels,
            monitor,
            closed,
            output_thread: output_thread.thread().clone(),
        })
    }

    /// Shared playback progress for pacing the graph.
    pub fn monitor(&self) -> SinkMonitor {
        self.monitor.clone()
    }

    /// Returns available space in the buffer (in samples)
    #[inline]
    pub fn buffer_available(&self) -> usize {
        self.buffer.slots()
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.output_thread.unpark();
    }
}

fn build_stream(
    device: &cpal::Device,
    sample_format: SampleFormat,
    stream_config: &cpal::StreamConfig,
    mut consumer: Consumer<f32>,
    monitor: SinkMonitor,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
    let channels = stream_config.channels.max(1) as u64;
    let on_error = |err: cpal::StreamError| tracing::error!("CPAL stream error: {:?}", err);

    macro_rules! output_stream {
        ($t:ty, $convert:expr) => {
            device.build_output_stream(
                stream_config,
                move |data: &mut [$t], _| {
                    let mut underrun = false;
                    for sample in data.iter_mut() {
                        let s = consumer.pop().unwrap_or_else(|_| {
                            underrun = true;
                            0.0
                        });
                        *sample = $convert(s);
                    }
                    if underrun {
                        monitor.had_underrun.store(true, Ordering::Relaxed);
                    }
                    monitor.frames_consumed.fetch_add(data.len() as u64 / channels, Ordering::Relaxed);
                },
                on_error,
                None,
            )
        };
    }

    match sample_format {
        SampleFormat::F32 => output_stream!(f32, |s: f32| s),
        SampleFormat::I16 => output_stream!(i16, |s: f32| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
        SampleFormat::U16 => output_stream!(u16, |s: f32| ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16),
        _ => Err(cpal::BuildStreamError::StreamConfigNotSupported),
    }
}

impl AudioNode for CpalSink {
    type Message = (); // No control messages

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let samples_needed = Buffer::LEN * self.channels;

        // Check for overrun (generating faster than consuming)
        if self.buffer.slots() < samples_needed {
            // Skip this block rather than partially write
            return;
        }

        let mut mixed = [Buffer::SILENT; 2];
        sum_inputs(inputs, &mut mixed);

        // Interleave channels into ring buffer; extra device channels repeat the right channel
        for i in 0..Buffer::LEN {
            for ch in 0..self.channels {
                let _ = self.buffer.push(mixed[ch.min(1)][i]);
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 0 }
}
