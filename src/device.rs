//! CPAL device discovery and sink creation.
//!
//! This module provides [`CpalDevice`] for discovering and selecting audio output
//! devices. Without the `cpal_sink` feature there is no realtime backend: the
//! default device lookup fails with [`EngineError::BackendUnavailable`] and the
//! device list is empty.
//!
//! # Example: List Devices
//!
//! ```no_run
//! use soundscape::CpalDevice;
//!
//! for (i, device) in CpalDevice::list_outputs().iter().enumerate() {
//!     println!("[{}] {} ({} Hz, {} ch)",
//!         i, device.name(), device.sample_rate(), device.channels());
//! }
//! ```

use crate::error::{EngineError, Result};

#[cfg(feature = "cpal_sink")]
use cpal::traits::{DeviceTrait, HostTrait};

/// A discovered audio output device.
///
/// Use [`CpalDevice::default_output`] to get the system default, or
/// [`CpalDevice::list_outputs`] to enumerate all available devices.
pub struct CpalDevice {
    #[cfg(feature = "cpal_sink")]
    device: cpal::Device,
    #[cfg(feature = "cpal_sink")]
    config: cpal::SupportedStreamConfig,

    name: String,
    sample_rate: u32,
    channels: u16,
}

impl CpalDevice {
    /// Get the system's default output device.
    #[cfg(feature = "cpal_sink")]
    pub fn default_output() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::BackendUnavailable(format!("no default output device on {:?}", host.id())))?;
        let config = device
            .default_output_config()
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
        let name = device.name().unwrap_or_else(|_| "Unknown".into());

        tracing::debug!(%name, sample_rate = config.sample_rate().0, channels = config.channels(), "found default output");

        Ok(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            name,
            device,
            config,
        })
    }

    #[cfg(not(feature = "cpal_sink"))]
    pub fn default_output() -> Result<Self> {
        Err(EngineError::BackendUnavailable(
            "built without the `cpal_sink` feature".into(),
        ))
    }

    /// List all available audio output devices.
    ///
    /// Returns an empty list if no devices are found or if enumeration fails.
    #[cfg(feature = "cpal_sink")]
    pub fn list_outputs() -> Vec<Self> {
        let host = cpal::default_host();
        host.output_devices()
            .map(|devices| {
                devices.filter_map(|device| {
                    let config = device.default_output_config().ok()?;
                    let name = device.name().unwrap_or_else(|_| "Unknown".into());
                    Some(Self {
                        sample_rate: config.sample_rate().0,
                        channels: config.channels(),
                        name,
                        device,
                        config,
                    })
                }).collect()
            })
            .unwrap_or_default()
    }

    #[cfg(not(feature = "cpal_sink"))]
    pub fn list_outputs() -> Vec<Self> {
        Vec::new()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of output channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Open a stream on this device and return the sink node feeding it.
    #[cfg(feature = "cpal_sink")]
    pub fn create_sink(&self) -> Result<crate::nodes::CpalSink> {
        crate::nodes::CpalSink::new(&self.device, &self.config)
    }
}
