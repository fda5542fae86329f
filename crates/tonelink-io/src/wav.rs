//! Mono WAV reading/writing and the diagnostic channel tap.
//!
//! The modem's signals are mono f32 by construction; these helpers exist
//! for offline inspection — dumping a modulated frame to disk, replaying
//! a capture through the demodulator, and the [`WavTap`] that records
//! everything a live channel sends and receives.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

fn mono_f32_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Write mono f32 samples to a WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let mut writer = WavWriter::create(path, mono_f32_spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a WAV file as mono f32 samples, returning `(samples, sample_rate)`.
///
/// Multi-channel files are mixed down by averaging; integer formats are
/// normalized to [-1, 1].
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok((samples, spec.sample_rate))
}

/// Diagnostic tap recording everything a channel transmits and receives.
///
/// Creates `<prefix>-tx.wav` and `<prefix>-rx.wav`. Purely observational:
/// the tap never alters the sample path, and a tap write failure is the
/// caller's to ignore or surface.
pub struct WavTap {
    tx: WavWriter<BufWriter<File>>,
    rx: WavWriter<BufWriter<File>>,
}

impl std::fmt::Debug for WavTap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavTap").finish_non_exhaustive()
    }
}

impl WavTap {
    /// Create tap files next to `prefix` at the given sample rate.
    pub fn create<P: AsRef<Path>>(prefix: P, sample_rate: u32) -> Result<Self> {
        let prefix = prefix.as_ref();
        let spec = mono_f32_spec(sample_rate);
        let tx = WavWriter::create(tap_path(prefix, "tx"), spec)?;
        let rx = WavWriter::create(tap_path(prefix, "rx"), spec)?;
        Ok(Self { tx, rx })
    }

    /// Record transmitted samples.
    pub fn record_tx(&mut self, samples: &[f32]) -> Result<()> {
        for &sample in samples {
            self.tx.write_sample(sample)?;
        }
        Ok(())
    }

    /// Record received samples.
    pub fn record_rx(&mut self, samples: &[f32]) -> Result<()> {
        for &sample in samples {
            self.rx.write_sample(sample)?;
        }
        Ok(())
    }

    /// Flush and close both files.
    pub fn finalize(self) -> Result<()> {
        self.tx.finalize()?;
        self.rx.finalize()?;
        Ok(())
    }
}

fn tap_path(prefix: &Path, suffix: &str) -> std::path::PathBuf {
    let stem = prefix.to_string_lossy();
    std::path::PathBuf::from(format!("{stem}-{suffix}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wav_roundtrip_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..4800)
            .map(|i| (2.0 * std::f32::consts::PI * 1200.0 * i as f32 / 48_000.0).sin() * 0.1)
            .collect();
        write_wav(&path, &samples, 48_000).unwrap();

        let (loaded, rate) = read_wav(&path).unwrap();
        assert_eq!(rate, 48_000);
        assert_eq!(loaded.len(), samples.len());
        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn tap_creates_both_files() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("session");

        let mut tap = WavTap::create(&prefix, 48_000).unwrap();
        tap.record_tx(&[0.1, 0.2, 0.3]).unwrap();
        tap.record_rx(&[0.4, 0.5]).unwrap();
        tap.finalize().unwrap();

        let (tx, _) = read_wav(dir.path().join("session-tx.wav")).unwrap();
        let (rx, _) = read_wav(dir.path().join("session-rx.wav")).unwrap();
        assert_eq!(tx.len(), 3);
        assert_eq!(rx.len(), 2);
    }
}
