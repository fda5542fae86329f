//! Audio device enumeration.
//!
//! The modem selects devices by index into the enumeration order below,
//! matching the configuration surface (`input_device` / `output_device`).

use crate::Result;
use cpal::traits::{DeviceTrait, HostTrait};

/// Audio device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Device name as reported by the platform.
    pub name: String,
    /// Index into the input-device enumeration, if this device captures.
    pub input_index: Option<usize>,
    /// Index into the output-device enumeration, if this device plays.
    pub output_index: Option<usize>,
    /// The device's default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// List all available audio devices with their selection indices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for (index, device) in inputs.enumerate() {
            if let Ok(name) = device.name() {
                let sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48_000);
                devices.push(AudioDevice {
                    name,
                    input_index: Some(index),
                    output_index: None,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for (index, device) in outputs.enumerate() {
            if let Ok(name) = device.name() {
                let sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48_000);

                if let Some(existing) = devices.iter_mut().find(|d| d.name == name) {
                    existing.output_index = Some(index);
                } else {
                    devices.push(AudioDevice {
                        name,
                        input_index: None,
                        output_index: Some(index),
                        default_sample_rate: sample_rate,
                    });
                }
            }
        }
    }

    Ok(devices)
}

/// Names of the system default input and output devices, if any.
pub fn default_devices() -> Result<(Option<String>, Option<String>)> {
    let host = cpal::default_host();
    let input = host.default_input_device().and_then(|d| d.name().ok());
    let output = host.default_output_device().and_then(|d| d.name().ok());
    Ok((input, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_devices_does_not_panic() {
        // Device availability depends on the system; only check the call
        // succeeds.
        assert!(list_devices().is_ok());
    }

    #[test]
    fn default_devices_does_not_panic() {
        assert!(default_devices().is_ok());
    }
}
